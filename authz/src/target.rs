use hr_core::{Employee, OrganizationId, TenantId, User, UserId};
use serde::{Deserialize, Serialize};

/// The object a permission check is about.
///
/// Every field is optional: a target may be a user, an organization, or a
/// record known only by its tenant. A pre-resolved employee record saves
/// the manager rule a lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub user_id: Option<UserId>,
    pub tenant_id: Option<TenantId>,
    pub organization_id: Option<OrganizationId>,
    #[serde(default)]
    pub employee: Option<Employee>,
}

impl Target {
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn organization(organization_id: OrganizationId) -> Self {
        Self {
            organization_id: Some(organization_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    #[must_use]
    pub fn with_organization(mut self, organization_id: OrganizationId) -> Self {
        self.organization_id = Some(organization_id);
        self
    }

    #[must_use]
    pub fn with_employee(mut self, employee: Employee) -> Self {
        if self.user_id.is_none() {
            self.user_id = Some(employee.user_id.clone());
        }
        if self.tenant_id.is_none() {
            self.tenant_id = employee.tenant_id.clone();
        }
        if self.organization_id.is_none() {
            self.organization_id = employee.organization_id.clone();
        }
        self.employee = Some(employee);
        self
    }

    /// Identifier used in audit records and results.
    pub fn label(&self) -> Option<String> {
        self.user_id
            .as_ref()
            .map(|id| id.to_string())
            .or_else(|| self.organization_id.as_ref().map(|id| format!("org:{id}")))
            .or_else(|| self.tenant_id.as_ref().map(|id| format!("tenant:{id}")))
    }
}

impl From<&User> for Target {
    fn from(user: &User) -> Self {
        Self {
            user_id: Some(user.id.clone()),
            tenant_id: user.tenant_id.clone(),
            organization_id: user.organization_id.clone(),
            employee: None,
        }
    }
}

impl From<Employee> for Target {
    fn from(employee: Employee) -> Self {
        Self::default().with_employee(employee)
    }
}

/// Per-check switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOptions {
    /// Treat the check as crossing tenants regardless of the target.
    #[serde(default)]
    pub cross_tenant: bool,
}

impl CheckOptions {
    pub fn cross_tenant() -> Self {
        Self { cross_tenant: true }
    }
}
