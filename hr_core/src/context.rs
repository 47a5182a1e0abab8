use serde::{Deserialize, Serialize};

use crate::types::{AccessScope, OrganizationId, Role, RoleClaim, TenantId, UserId};

/// Per-request identity and hierarchy address.
///
/// Serves both as the resolution key for configuration and as the subject of
/// authorization. Built fresh for every operation and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub user_id: UserId,
    pub user_role: RoleClaim,
    pub tenant_id: Option<TenantId>,
    pub tenant_slug: Option<String>,
    pub organization_id: Option<OrganizationId>,
    pub organization_slug: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl RequestContext {
    pub fn new(user_id: UserId, user_role: impl Into<RoleClaim>) -> Self {
        Self {
            user_id,
            user_role: user_role.into(),
            tenant_id: None,
            tenant_slug: None,
            organization_id: None,
            organization_slug: None,
            permissions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_tenant(mut self, tenant_id: TenantId, slug: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id);
        self.tenant_slug = Some(slug.into());
        self
    }

    #[must_use]
    pub fn with_organization(
        mut self,
        organization_id: OrganizationId,
        slug: impl Into<String>,
    ) -> Self {
        self.organization_id = Some(organization_id);
        self.organization_slug = Some(slug.into());
        self
    }

    #[must_use]
    pub fn with_permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn role(&self) -> Option<Role> {
        self.user_role.known()
    }

    /// Administrative reach of this identity, see [`AccessScope::of`].
    pub fn access_scope(&self) -> AccessScope {
        AccessScope::of(
            &self.user_role,
            self.tenant_id.is_some() || self.tenant_slug.is_some(),
            self.organization_id.is_some() || self.organization_slug.is_some(),
        )
    }

    pub fn is_system_admin(&self) -> bool {
        self.user_role.is(Role::SystemAdmin)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}
