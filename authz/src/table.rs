//! Role → resource permission lattice.

use std::collections::HashMap;

use hr_core::{PermissionLevel, Resource, Role, RoleClaim};

/// Base permission level per `(role, resource)`, with a per-role wildcard.
///
/// Lookup order: exact entry, then the role's wildcard, then
/// [`PermissionLevel::None`]. Unrecognised roles always get `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionTable {
    entries: HashMap<(Role, Resource), PermissionLevel>,
    wildcards: HashMap<Role, PermissionLevel>,
}

impl PermissionTable {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            wildcards: HashMap::new(),
        }
    }

    #[must_use]
    pub fn grant(mut self, role: Role, resource: Resource, level: PermissionLevel) -> Self {
        self.entries.insert((role, resource), level);
        self
    }

    #[must_use]
    pub fn grant_all(mut self, role: Role, level: PermissionLevel) -> Self {
        self.wildcards.insert(role, level);
        self
    }

    pub fn level(&self, role: Role, resource: Resource) -> PermissionLevel {
        self.entries
            .get(&(role, resource))
            .or_else(|| self.wildcards.get(&role))
            .copied()
            .unwrap_or(PermissionLevel::None)
    }

    pub fn level_for_claim(&self, claim: &RoleClaim, resource: Resource) -> PermissionLevel {
        match claim.known() {
            Some(role) => self.level(role, resource),
            None => PermissionLevel::None,
        }
    }
}

impl Default for PermissionTable {
    fn default() -> Self {
        use PermissionLevel as L;
        use Resource as R;

        Self::empty()
            .grant_all(Role::SystemAdmin, L::Sysadmin)
            .grant_all(Role::Admin, L::Admin)
            // HR
            .grant(Role::Hr, R::UserFolder, L::WriteTeam)
            .grant(Role::Hr, R::LeaveRequest, L::WriteTeam)
            .grant(Role::Hr, R::EmployeeManagement, L::WriteOrganization)
            .grant(Role::Hr, R::OrganizationManagement, L::ReadOrganization)
            .grant(Role::Hr, R::Configuration, L::ReadOrganization)
            .grant(Role::Hr, R::AuditLog, L::ReadOrganization)
            .grant(Role::Hr, R::Reports, L::ReadOrganization)
            .grant(Role::Hr, R::CvParsing, L::WriteOrganization)
            .grant(Role::Hr, R::ChatAssistant, L::WriteOwn)
            .grant(Role::Hr, R::TenantManagement, L::None)
            .grant_all(Role::Hr, L::ReadOwn)
            // Manager
            .grant(Role::Manager, R::UserFolder, L::WriteTeam)
            .grant(Role::Manager, R::LeaveRequest, L::WriteTeam)
            .grant(Role::Manager, R::EmployeeManagement, L::WriteOwn)
            .grant(Role::Manager, R::Reports, L::ReadTeam)
            .grant(Role::Manager, R::CvParsing, L::WriteTeam)
            .grant(Role::Manager, R::ChatAssistant, L::WriteOwn)
            .grant(Role::Manager, R::Configuration, L::ReadOwn)
            // Employee
            .grant(Role::Employee, R::UserFolder, L::WriteOwn)
            .grant(Role::Employee, R::LeaveRequest, L::WriteOwn)
            .grant(Role::Employee, R::EmployeeManagement, L::ReadOwn)
            .grant(Role::Employee, R::ChatAssistant, L::WriteOwn)
            .grant(Role::Employee, R::Configuration, L::ReadOwn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_exact_entry_then_wildcard_then_none() {
        let table = PermissionTable::default();
        assert_eq!(
            table.level(Role::Hr, Resource::UserFolder),
            PermissionLevel::WriteTeam
        );
        assert_eq!(
            table.level(Role::Hr, Resource::TenantManagement),
            PermissionLevel::None
        );
        assert_eq!(
            table.level(Role::Hr, Resource::CvParsing),
            PermissionLevel::WriteOrganization
        );
        assert_eq!(
            table.level(Role::Employee, Resource::AuditLog),
            PermissionLevel::None
        );
    }

    #[test]
    fn test_employee_leave_request_is_write_own() {
        assert_eq!(
            PermissionTable::default().level(Role::Employee, Resource::LeaveRequest),
            PermissionLevel::WriteOwn
        );
    }

    #[test]
    fn test_admin_roles_cover_every_resource() {
        let table = PermissionTable::default();
        for resource in Resource::iter() {
            assert_eq!(table.level(Role::Admin, resource), PermissionLevel::Admin);
            assert_eq!(
                table.level(Role::SystemAdmin, resource),
                PermissionLevel::Sysadmin
            );
        }
    }

    #[test]
    fn test_unrecognised_role_gets_none() {
        let table = PermissionTable::default();
        for resource in Resource::iter() {
            assert_eq!(
                table.level_for_claim(&RoleClaim::parse("bogus"), resource),
                PermissionLevel::None
            );
        }
    }

    #[test]
    fn test_custom_table() {
        let table = PermissionTable::empty().grant(
            Role::Employee,
            Resource::Reports,
            PermissionLevel::ReadTeam,
        );
        assert_eq!(
            table.level(Role::Employee, Resource::Reports),
            PermissionLevel::ReadTeam
        );
        assert_eq!(
            table.level(Role::Admin, Resource::Reports),
            PermissionLevel::None
        );
    }
}
