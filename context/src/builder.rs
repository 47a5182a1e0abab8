//! Builds a [`ResolvedContext`] from token claims plus request overrides.

use std::collections::HashMap;
use std::sync::Arc;

use errors::ContextError;
use hr_core::{AccessScope, OrganizationId, RoleClaim, TenantId, UserId, is_valid_slug};
use tracing::{debug, trace, warn};

use crate::blacklist::TokenBlacklist;
use crate::claims::{TokenClaims, present};
use crate::types::{ContextSource, ResolvedContext, ResolvedValue};

pub const HEADER_TENANT_ID: &str = "x-tenant-id";
pub const HEADER_TENANT_SLUG: &str = "x-tenant-slug";
pub const HEADER_ORGANIZATION_ID: &str = "x-organization-id";
pub const HEADER_ORGANIZATION_SLUG: &str = "x-organization-slug";

pub const PARAM_TENANT_ID: &str = "tenant_id";
pub const PARAM_TENANT_SLUG: &str = "tenant_slug";
pub const PARAM_ORGANIZATION_ID: &str = "organization_id";
pub const PARAM_ORGANIZATION_SLUG: &str = "organization_slug";

/// Collects the overrides of one request and builds its context.
///
/// # Precedence (highest to lowest)
///
/// 1. Path parameters
/// 2. Headers (names are case-insensitive)
/// 3. Token claims
///
/// Only platform-scoped identities may point a request at another tenant or
/// organization. Anyone else may repeat the value their token already
/// carries; a different value is rejected with
/// [`ContextError::OverrideNotPermitted`].
///
/// # Example
///
/// ```rust
/// use context::{ContextBuilder, TokenClaims};
///
/// let claims = TokenClaims::new("root", "admin");
/// let ctx = ContextBuilder::new()
///     .with_header("X-Tenant-Slug", "acme")
///     .build(&claims)
///     .unwrap();
/// assert_eq!(ctx.tenant_slug.unwrap().value, "acme");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    headers: HashMap<String, String>,
    path_params: HashMap<String, String>,
    blacklist: Option<Arc<TokenBlacklist>>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_blacklist(mut self, blacklist: Arc<TokenBlacklist>) -> Self {
        self.blacklist = Some(blacklist);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.headers
                .insert(name.as_ref().to_ascii_lowercase(), value.into());
        }
        self
    }

    #[must_use]
    pub fn with_path_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.path_params.insert(name.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn with_path_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.path_params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Build the context, checking revocation against the current time.
    pub fn build(&self, claims: &TokenClaims) -> Result<ResolvedContext, ContextError> {
        self.build_at(claims, chrono::Utc::now().timestamp())
    }

    pub fn build_at(
        &self,
        claims: &TokenClaims,
        now: i64,
    ) -> Result<ResolvedContext, ContextError> {
        if let (Some(blacklist), Some(jti)) = (&self.blacklist, present(claims.jti.as_ref())) {
            if blacklist.is_revoked(jti, now) {
                warn!(jti, "Rejected revoked token");
                return Err(ContextError::TokenRevoked {
                    jti: jti.to_string(),
                });
            }
        }

        let sub = present(claims.sub.as_ref()).ok_or_else(|| ContextError::MissingClaim {
            claim: "sub".to_string(),
        })?;
        let user_id = UserId::new(sub).ok_or_else(|| invalid("user id", sub))?;
        let role = present(claims.role.as_ref()).ok_or_else(|| ContextError::MissingClaim {
            claim: "role".to_string(),
        })?;
        let user_role = RoleClaim::parse(role);

        let token_tenant = present(claims.tenant_id.as_ref());
        let token_organization = present(claims.organization_id.as_ref());
        let platform_scoped = AccessScope::of(
            &user_role,
            token_tenant.is_some(),
            token_organization.is_some(),
        )
        .is_platform_admin();

        let tenant_id = self
            .pick_bound(
                "tenant id",
                token_tenant,
                PARAM_TENANT_ID,
                HEADER_TENANT_ID,
                platform_scoped,
                &user_id,
            )?
            .map(|v| to_id(v, "tenant id", |id| TenantId::new(id)))
            .transpose()?;
        let organization_id = self
            .pick_bound(
                "organization id",
                token_organization,
                PARAM_ORGANIZATION_ID,
                HEADER_ORGANIZATION_ID,
                platform_scoped,
                &user_id,
            )?
            .map(|v| to_id(v, "organization id", |id| OrganizationId::new(id)))
            .transpose()?;

        let tenant_slug = self
            .pick_bound(
                "tenant slug",
                present(claims.tenant_slug.as_ref()),
                PARAM_TENANT_SLUG,
                HEADER_TENANT_SLUG,
                platform_scoped,
                &user_id,
            )?
            .map(|v| checked_slug("tenant slug", v))
            .transpose()?;
        let organization_slug = self
            .pick_bound(
                "organization slug",
                present(claims.organization_slug.as_ref()),
                PARAM_ORGANIZATION_SLUG,
                HEADER_ORGANIZATION_SLUG,
                platform_scoped,
                &user_id,
            )?
            .map(|v| checked_slug("organization slug", v))
            .transpose()?;

        let resolved = ResolvedContext {
            user_id: ResolvedValue::token(user_id),
            user_role: ResolvedValue::token(user_role),
            tenant_id,
            tenant_slug,
            organization_id,
            organization_slug,
            permissions: claims.permissions.clone(),
            jti: present(claims.jti.as_ref()).map(String::from),
        };

        debug!(
            user_id = %resolved.user_id.value,
            role = %resolved.user_role.value,
            tenant_slug = ?resolved.tenant_slug.as_ref().map(|v| &v.value),
            organization_slug = ?resolved.organization_slug.as_ref().map(|v| &v.value),
            "Built request context"
        );
        Ok(resolved)
    }

    /// Highest-precedence value for one field.
    fn pick(
        &self,
        token: Option<&str>,
        param: &str,
        header: &str,
    ) -> Option<ResolvedValue<String>> {
        if let Some(value) = present(self.path_params.get(param)) {
            trace!(param, value, "Context field from path parameter");
            return Some(ResolvedValue::new(
                value.to_string(),
                ContextSource::PathParam(param.to_string()),
            ));
        }
        if let Some(value) = present(self.headers.get(header)) {
            trace!(header, value, "Context field from header");
            return Some(ResolvedValue::new(
                value.to_string(),
                ContextSource::Header(header.to_string()),
            ));
        }
        token.map(|value| ResolvedValue::token(value.to_string()))
    }

    /// [`Self::pick`], bound to the token for callers without platform scope.
    fn pick_bound(
        &self,
        field: &str,
        token: Option<&str>,
        param: &str,
        header: &str,
        platform_scoped: bool,
        user_id: &UserId,
    ) -> Result<Option<ResolvedValue<String>>, ContextError> {
        let Some(picked) = self.pick(token, param, header) else {
            return Ok(None);
        };
        if platform_scoped
            || picked.source == ContextSource::Token
            || token == Some(picked.value.as_str())
        {
            return Ok(Some(picked));
        }
        warn!(
            user_id = %user_id,
            field,
            source = %picked.source,
            requested = %picked.value,
            "Rejected override from a caller without platform scope"
        );
        Err(ContextError::OverrideNotPermitted {
            field: field.to_string(),
            value: picked.value,
        })
    }
}

fn invalid(field: &str, value: &str) -> ContextError {
    ContextError::InvalidSlug {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn to_id<T>(
    resolved: ResolvedValue<String>,
    field: &str,
    make: impl FnOnce(String) -> Option<T>,
) -> Result<ResolvedValue<T>, ContextError> {
    let ResolvedValue { value, source } = resolved;
    match make(value.clone()) {
        Some(id) => Ok(ResolvedValue::new(id, source)),
        None => Err(invalid(field, &value)),
    }
}

fn checked_slug(
    field: &str,
    resolved: ResolvedValue<String>,
) -> Result<ResolvedValue<String>, ContextError> {
    if is_valid_slug(&resolved.value) {
        Ok(resolved)
    } else {
        Err(invalid(field, &resolved.value))
    }
}
