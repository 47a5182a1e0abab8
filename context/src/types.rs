use hr_core::{OrganizationId, RequestContext, RoleClaim, TenantId, UserId};

/// Where a context field got its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextSource {
    Token,
    Header(String),
    PathParam(String),
    Unset,
}

impl std::fmt::Display for ContextSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextSource::Token => write!(f, "token"),
            ContextSource::Header(name) => write!(f, "header:{name}"),
            ContextSource::PathParam(name) => write!(f, "path:{name}"),
            ContextSource::Unset => write!(f, "unset"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue<T> {
    pub value: T,
    pub source: ContextSource,
}

impl<T> ResolvedValue<T> {
    pub fn new(value: T, source: ContextSource) -> Self {
        Self { value, source }
    }

    pub fn token(value: T) -> Self {
        Self::new(value, ContextSource::Token)
    }
}

/// A built request context together with the provenance of each field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContext {
    pub user_id: ResolvedValue<UserId>,
    pub user_role: ResolvedValue<RoleClaim>,
    pub tenant_id: Option<ResolvedValue<TenantId>>,
    pub tenant_slug: Option<ResolvedValue<String>>,
    pub organization_id: Option<ResolvedValue<OrganizationId>>,
    pub organization_slug: Option<ResolvedValue<String>>,
    pub permissions: Vec<String>,
    pub jti: Option<String>,
}

impl ResolvedContext {
    pub fn to_request_context(&self) -> RequestContext {
        RequestContext {
            user_id: self.user_id.value.clone(),
            user_role: self.user_role.value.clone(),
            tenant_id: self.tenant_id.as_ref().map(|v| v.value.clone()),
            tenant_slug: self.tenant_slug.as_ref().map(|v| v.value.clone()),
            organization_id: self.organization_id.as_ref().map(|v| v.value.clone()),
            organization_slug: self.organization_slug.as_ref().map(|v| v.value.clone()),
            permissions: self.permissions.clone(),
        }
    }

    /// `(field, value, source)` for every field, in a fixed order.
    ///
    /// Absent optional fields are listed with value `-` and source `unset`.
    pub fn explain(&self) -> Vec<(String, String, String)> {
        fn row<T: ToString>(
            field: &str,
            value: Option<&ResolvedValue<T>>,
        ) -> (String, String, String) {
            match value {
                Some(v) => (field.to_string(), v.value.to_string(), v.source.to_string()),
                None => (
                    field.to_string(),
                    "-".to_string(),
                    ContextSource::Unset.to_string(),
                ),
            }
        }

        let permission_source = if self.permissions.is_empty() {
            ContextSource::Unset
        } else {
            ContextSource::Token
        };

        vec![
            row("user_id", Some(&self.user_id)),
            row("user_role", Some(&self.user_role)),
            row("tenant_id", self.tenant_id.as_ref()),
            row("tenant_slug", self.tenant_slug.as_ref()),
            row("organization_id", self.organization_id.as_ref()),
            row("organization_slug", self.organization_slug.as_ref()),
            (
                "permissions".to_string(),
                if self.permissions.is_empty() {
                    "-".to_string()
                } else {
                    self.permissions.join(",")
                },
                permission_source.to_string(),
            ),
        ]
    }
}

impl From<&ResolvedContext> for RequestContext {
    fn from(resolved: &ResolvedContext) -> Self {
        resolved.to_request_context()
    }
}
