use serde::{Deserialize, Serialize};

/// Decoded payload of a verified access token.
///
/// Everything is optional at this layer; the builder decides which claims
/// are mandatory. Empty strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    #[serde(default, alias = "userId")]
    pub sub: Option<String>,

    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub tenant_id: Option<String>,

    #[serde(default)]
    pub tenant_slug: Option<String>,

    #[serde(default)]
    pub organization_id: Option<String>,

    #[serde(default)]
    pub organization_slug: Option<String>,

    #[serde(default)]
    pub permissions: Vec<String>,

    /// Token id, checked against the blacklist.
    #[serde(default)]
    pub jti: Option<String>,

    /// Expiry as unix seconds.
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    pub fn new(sub: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            sub: Some(sub.into()),
            role: Some(role.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_tenant(mut self, id: impl Into<String>, slug: impl Into<String>) -> Self {
        self.tenant_id = Some(id.into());
        self.tenant_slug = Some(slug.into());
        self
    }

    #[must_use]
    pub fn with_organization(mut self, id: impl Into<String>, slug: impl Into<String>) -> Self {
        self.organization_id = Some(id.into());
        self.organization_slug = Some(slug.into());
        self
    }

    #[must_use]
    pub fn with_permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = permissions;
        self
    }

    #[must_use]
    pub fn with_jti(mut self, jti: impl Into<String>, exp: i64) -> Self {
        self.jti = Some(jti.into());
        self.exp = Some(exp);
        self
    }
}

pub(crate) fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}
