use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use errors::LookupError;
use hr_core::{
    EntityLookup, Employee, MemberRole, Organization, OrganizationId, OrganizationMember, Role,
    RoleClaim, TenantId, User, UserId,
};

/// `EntityLookup` backed by in-memory maps.
///
/// [`InMemoryDirectory::set_unavailable`] makes every lookup fail, which is
/// how tests exercise fail-closed behaviour.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: DashMap<UserId, User>,
    employees: DashMap<UserId, Employee>,
    organizations: DashMap<OrganizationId, Organization>,
    memberships: DashMap<(UserId, OrganizationId), OrganizationMember>,
    unavailable: AtomicBool,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: User) -> &Self {
        self.users.insert(user.id.clone(), user);
        self
    }

    pub fn add_employee(&self, employee: Employee) -> &Self {
        self.employees.insert(employee.user_id.clone(), employee);
        self
    }

    pub fn add_organization(&self, organization: Organization) -> &Self {
        self.organizations
            .insert(organization.id.clone(), organization);
        self
    }

    pub fn add_membership(&self, member: OrganizationMember) -> &Self {
        self.memberships.insert(
            (member.user_id.clone(), member.organization_id.clone()),
            member,
        );
        self
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn available(&self) -> Result<(), LookupError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(LookupError::Unavailable {
                backend: "in-memory".to_string(),
                reason: "failure injected".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl EntityLookup for InMemoryDirectory {
    fn user_by_id(&self, id: &UserId) -> Result<Option<User>, LookupError> {
        self.available()?;
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    fn user_by_email(&self, email: &str) -> Result<Option<User>, LookupError> {
        self.available()?;
        Ok(self
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .map(|u| u.clone()))
    }

    fn employee_by_user_id(&self, user_id: &UserId) -> Result<Option<Employee>, LookupError> {
        self.available()?;
        Ok(self.employees.get(user_id).map(|e| e.clone()))
    }

    fn membership(
        &self,
        user_id: &UserId,
        organization_id: &OrganizationId,
    ) -> Result<Option<OrganizationMember>, LookupError> {
        self.available()?;
        Ok(self
            .memberships
            .get(&(user_id.clone(), organization_id.clone()))
            .map(|m| m.clone()))
    }

    fn organization_by_id(
        &self,
        id: &OrganizationId,
    ) -> Result<Option<Organization>, LookupError> {
        self.available()?;
        Ok(self.organizations.get(id).map(|o| o.clone()))
    }
}

/// Test identifiers. Panics on an invalid id, which only a broken test
/// can produce.
pub fn user_id(id: &str) -> UserId {
    UserId::new(id).unwrap_or_else(|| panic!("invalid test user id {id:?}"))
}

pub fn tenant_id(id: &str) -> TenantId {
    TenantId::new(id).unwrap_or_else(|| panic!("invalid test tenant id {id:?}"))
}

pub fn organization_id(id: &str) -> OrganizationId {
    OrganizationId::new(id).unwrap_or_else(|| panic!("invalid test organization id {id:?}"))
}

pub fn user(id: &str, role: Role, tenant: &str, organization: &str) -> User {
    User {
        id: user_id(id),
        email: format!("{id}@example.com"),
        role: RoleClaim::Known(role),
        tenant_id: Some(tenant_id(tenant)),
        organization_id: Some(organization_id(organization)),
    }
}

pub fn employee(user: &str, manager: Option<&str>, tenant: &str, organization: &str) -> Employee {
    Employee {
        id: format!("emp-{user}"),
        user_id: user_id(user),
        manager_id: manager.map(user_id),
        tenant_id: Some(tenant_id(tenant)),
        organization_id: Some(organization_id(organization)),
    }
}

pub fn member(user: &str, organization: &str, role: MemberRole) -> OrganizationMember {
    OrganizationMember {
        organization_id: organization_id(organization),
        user_id: user_id(user),
        role,
    }
}
