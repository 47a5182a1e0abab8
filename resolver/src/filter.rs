//! # Security Filter
//!
//! Strips keys a viewer is not entitled to see from a resolved
//! configuration. Two passes, always both applied:
//!
//! 1. Secret-classified keys are removed unless the viewer's
//!    [`AccessScope`] covers the secret's level.
//! 2. Non-admin roles get a fixed allow or deny list of key prefixes.
//!
//! The filter is pure and idempotent.

use hr_core::{AccessScope, RequestContext, Role, RoleClaim};
use tracing::warn;

use crate::merge::ConfigMap;

const PLATFORM_SECRET_PREFIXES: &[&str] = &[
    "PLATFORM_SECRET_",
    "DATABASE_",
    "JWT_",
    "ENCRYPTION_",
    "MASTER_",
];
const TENANT_SECRET_PREFIXES: &[&str] = &["TENANT_SECRET_", "BILLING_", "SUBSCRIPTION_"];
const TENANT_SECRET_KEYS: &[&str] = &["SMTP_PASSWORD"];
const ORGANIZATION_SECRET_PREFIXES: &[&str] = &["ORG_SECRET_", "PAYROLL_"];
const ORGANIZATION_SECRET_SUFFIXES: &[&str] = &["_API_KEY"];

const EMPLOYEE_ALLOWED_PREFIXES: &[&str] = &["UI_", "NOTIFICATION_", "DASHBOARD_"];
const HR_DENIED_PREFIXES: &[&str] = &["PLATFORM_", "DATABASE_", "BILLING_"];
const MANAGER_DENIED_PREFIXES: &[&str] = &[
    "PLATFORM_",
    "DATABASE_",
    "BILLING_",
    "TENANT_",
    "SUBSCRIPTION_",
];

/// Hierarchy level a secret belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretClass {
    Platform,
    Tenant,
    Organization,
}

impl SecretClass {
    /// The narrowest scope still allowed to read this secret.
    pub fn required_scope(self) -> AccessScope {
        match self {
            SecretClass::Platform => AccessScope::Platform,
            SecretClass::Tenant => AccessScope::Tenant,
            SecretClass::Organization => AccessScope::Organization,
        }
    }
}

/// Classify a key as a secret of some level, or `None` for ordinary keys.
pub fn classify(key: &str) -> Option<SecretClass> {
    if PLATFORM_SECRET_PREFIXES.iter().any(|p| key.starts_with(p)) {
        Some(SecretClass::Platform)
    } else if TENANT_SECRET_PREFIXES.iter().any(|p| key.starts_with(p))
        || TENANT_SECRET_KEYS.contains(&key)
    {
        Some(SecretClass::Tenant)
    } else if ORGANIZATION_SECRET_PREFIXES.iter().any(|p| key.starts_with(p))
        || ORGANIZATION_SECRET_SUFFIXES.iter().any(|s| key.ends_with(s))
    {
        Some(SecretClass::Organization)
    } else {
        None
    }
}

/// The identity a configuration is filtered for.
///
/// A viewer built from a request context is bound to the tenant and
/// organization it belongs to. Looking at any other tenant or organization
/// drops its administrative scope to [`AccessScope::User`]; see
/// [`Viewer::at`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Viewer {
    pub role: RoleClaim,
    pub scope: AccessScope,
    home: Option<Home>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Home {
    tenant: Option<String>,
    organization: Option<String>,
}

impl Viewer {
    /// An unbound viewer whose scope applies wherever it looks.
    pub fn new(role: RoleClaim, has_tenant: bool, has_organization: bool) -> Self {
        let scope = AccessScope::of(&role, has_tenant, has_organization);
        Self {
            role,
            scope,
            home: None,
        }
    }

    /// Bind the viewer to the tenant and organization slugs it belongs to.
    #[must_use]
    pub fn with_home(mut self, tenant: Option<String>, organization: Option<String>) -> Self {
        self.home = Some(Home {
            tenant,
            organization,
        });
        self
    }

    /// The viewer as it applies to the given address.
    #[must_use]
    pub fn at(&self, tenant: Option<&str>, organization: Option<&str>) -> Self {
        let Some(home) = &self.home else {
            return self.clone();
        };
        let foreign = |own: &Option<String>, addressed: Option<&str>| {
            addressed.is_some_and(|slug| own.as_deref() != Some(slug))
        };
        let outside = match self.scope {
            AccessScope::Platform | AccessScope::User => false,
            AccessScope::Tenant => foreign(&home.tenant, tenant),
            AccessScope::Organization => {
                foreign(&home.tenant, tenant) || foreign(&home.organization, organization)
            }
        };
        if !outside {
            return self.clone();
        }
        warn!(
            role = %self.role,
            scope = %self.scope,
            tenant = ?tenant,
            organization = ?organization,
            "Viewer addresses configuration outside its own scope"
        );
        Self {
            scope: AccessScope::User,
            ..self.clone()
        }
    }
}

impl From<&RequestContext> for Viewer {
    fn from(ctx: &RequestContext) -> Self {
        Self {
            role: ctx.user_role.clone(),
            scope: ctx.access_scope(),
            home: None,
        }
        .with_home(ctx.tenant_slug.clone(), ctx.organization_slug.clone())
    }
}

enum KeyRule {
    Unrestricted,
    AllowOnly(&'static [&'static str]),
    Deny(&'static [&'static str]),
}

impl KeyRule {
    fn for_role(role: &RoleClaim) -> Self {
        match role.known() {
            Some(Role::SystemAdmin | Role::Admin) => KeyRule::Unrestricted,
            Some(Role::Hr) => KeyRule::Deny(HR_DENIED_PREFIXES),
            Some(Role::Manager) => KeyRule::Deny(MANAGER_DENIED_PREFIXES),
            // Unrecognised roles get the most restrictive list.
            Some(Role::Employee) | None => KeyRule::AllowOnly(EMPLOYEE_ALLOWED_PREFIXES),
        }
    }

    fn keeps(&self, key: &str) -> bool {
        match self {
            KeyRule::Unrestricted => true,
            KeyRule::AllowOnly(prefixes) => prefixes.iter().any(|p| key.starts_with(p)),
            KeyRule::Deny(prefixes) => !prefixes.iter().any(|p| key.starts_with(p)),
        }
    }
}

/// Return a copy of `config` holding only what `viewer` may see.
pub fn filter(config: &ConfigMap, viewer: &Viewer) -> ConfigMap {
    let rule = KeyRule::for_role(&viewer.role);

    config
        .iter()
        .filter(|(key, _)| {
            classify(key).is_none_or(|class| viewer.scope.covers(class.required_scope()))
        })
        .filter(|(key, _)| rule.keeps(key))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// [`filter`] for the identity carried by a request context.
pub fn filter_for_context(config: &ConfigMap, ctx: &RequestContext) -> ConfigMap {
    filter(config, &Viewer::from(ctx))
}
