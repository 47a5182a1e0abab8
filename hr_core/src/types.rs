use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Option<Self> {
                let id = id.into();
                if id.is_empty() || id.len() > 100 {
                    None
                } else {
                    Some(Self(id))
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s).ok_or_else(|| format!("Invalid {}: {s:?}", stringify!($name)))
            }
        }
    };
}

string_id!(
    /// Identifier of an authenticated user.
    UserId
);
string_id!(
    /// Identifier of a tenant (a customer company on the platform).
    TenantId
);
string_id!(
    /// Identifier of an organization inside a tenant.
    OrganizationId
);

static SLUG_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]{0,62}$").ok());

/// Whether `value` may name a tenant or organization directory.
///
/// Lowercase alphanumerics, `-` and `_`, at most 63 characters, never
/// starting with a separator. Rules out `..`, `/` and every other way of
/// leaving the configuration root.
pub fn is_valid_slug(value: &str) -> bool {
    SLUG_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(value))
}

/// The closed set of roles a user may carry.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    SystemAdmin,
    Admin,
    Hr,
    Manager,
    Employee,
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::SystemAdmin => "System Administrator",
            Role::Admin => "Administrator",
            Role::Hr => "HR",
            Role::Manager => "Manager",
            Role::Employee => "Employee",
        }
    }
}

/// A role as it was claimed by the identity layer.
///
/// Unknown role strings are kept verbatim instead of being coerced to a
/// default role, so every consumer decides explicitly how to treat them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoleClaim {
    Known(Role),
    Unrecognized(String),
}

impl RoleClaim {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<Role>() {
            Ok(role) => RoleClaim::Known(role),
            Err(_) => RoleClaim::Unrecognized(raw.to_string()),
        }
    }

    #[must_use]
    pub fn known(&self) -> Option<Role> {
        match self {
            RoleClaim::Known(role) => Some(*role),
            RoleClaim::Unrecognized(_) => None,
        }
    }

    #[must_use]
    pub fn is(&self, role: Role) -> bool {
        self.known() == Some(role)
    }

    pub fn as_str(&self) -> &str {
        match self {
            RoleClaim::Known(role) => role.as_str(),
            RoleClaim::Unrecognized(raw) => raw,
        }
    }
}

impl From<Role> for RoleClaim {
    fn from(role: Role) -> Self {
        RoleClaim::Known(role)
    }
}

impl From<String> for RoleClaim {
    fn from(raw: String) -> Self {
        RoleClaim::parse(&raw)
    }
}

impl From<RoleClaim> for String {
    fn from(claim: RoleClaim) -> Self {
        claim.as_str().to_string()
    }
}

impl std::fmt::Display for RoleClaim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resource types guarded by the permission evaluator.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Resource {
    UserFolder,
    LeaveRequest,
    EmployeeManagement,
    OrganizationManagement,
    TenantManagement,
    Configuration,
    AuditLog,
    Reports,
    ChatAssistant,
    CvParsing,
}

impl Resource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Resources whose records belong to a single user, so reading or
    /// writing someone else's record needs team-level access.
    #[must_use]
    pub fn is_personal(&self) -> bool {
        matches!(
            self,
            Resource::UserFolder | Resource::LeaveRequest | Resource::EmployeeManagement
        )
    }
}

/// Operations a requestor may attempt on a resource.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    Read,
    Create,
    Write,
    Delete,
    Approve,
    Reject,
    Admin,
}

impl Action {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Totally ordered permission lattice.
///
/// Variants are declared in ascending order so the derived `Ord` agrees
/// with [`PermissionLevel::value`]; sufficiency is always `>=`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[serde(into = "u16", try_from = "u16")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u16)]
pub enum PermissionLevel {
    None = 0,
    ReadOwn = 1,
    ReadTeam = 2,
    ReadOrganization = 3,
    WriteOwn = 10,
    WriteTeam = 20,
    WriteOrganization = 30,
    Admin = 100,
    Sysadmin = 999,
}

impl PermissionLevel {
    #[must_use]
    pub fn value(self) -> u16 {
        self as u16
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }

    #[must_use]
    pub fn satisfies(self, required: PermissionLevel) -> bool {
        self >= required
    }
}

impl From<PermissionLevel> for u16 {
    fn from(level: PermissionLevel) -> Self {
        level.value()
    }
}

impl TryFrom<u16> for PermissionLevel {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        use strum::IntoEnumIterator;
        PermissionLevel::iter()
            .find(|level| level.value() == value)
            .ok_or_else(|| format!("Unknown permission level: {value}"))
    }
}

/// Levels of the configuration hierarchy, in merge order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum HierarchyLevel {
    Platform,
    Tenant,
    Organization,
    UserRole,
}

/// How far an identity's administrative reach extends.
///
/// Also used by routes to declare the scope they operate on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AccessScope {
    Platform,
    Tenant,
    Organization,
    User,
}

impl AccessScope {
    /// The single admin-scoping rule shared by the filter, the evaluator and
    /// the middleware.
    ///
    /// `system_admin` is always platform-wide. `admin` is narrowed by the
    /// most specific hierarchy address attached to the identity. Every
    /// other role, including unrecognised ones, is user-scoped.
    pub fn of(role: &RoleClaim, has_tenant: bool, has_organization: bool) -> Self {
        match role.known() {
            Some(Role::SystemAdmin) => AccessScope::Platform,
            Some(Role::Admin) if !has_tenant => AccessScope::Platform,
            Some(Role::Admin) if !has_organization => AccessScope::Tenant,
            Some(Role::Admin) => AccessScope::Organization,
            _ => AccessScope::User,
        }
    }

    fn breadth(self) -> u8 {
        match self {
            AccessScope::Platform => 3,
            AccessScope::Tenant => 2,
            AccessScope::Organization => 1,
            AccessScope::User => 0,
        }
    }

    /// Whether an identity with this scope may operate on `required`.
    #[must_use]
    pub fn covers(self, required: AccessScope) -> bool {
        self.breadth() >= required.breadth()
    }

    #[must_use]
    pub fn is_platform_admin(self) -> bool {
        self == AccessScope::Platform
    }

    #[must_use]
    pub fn is_tenant_admin(self) -> bool {
        self.covers(AccessScope::Tenant)
    }

    #[must_use]
    pub fn is_organization_admin(self) -> bool {
        self.covers(AccessScope::Organization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_role_claim_parsing() {
        assert_eq!(RoleClaim::parse("hr"), RoleClaim::Known(Role::Hr));
        assert_eq!(
            RoleClaim::parse("system_admin"),
            RoleClaim::Known(Role::SystemAdmin)
        );
        assert_eq!(
            RoleClaim::parse("bogus"),
            RoleClaim::Unrecognized("bogus".to_string())
        );
        assert_eq!(RoleClaim::parse("bogus").as_str(), "bogus");
    }

    #[test]
    fn test_role_claim_serde_roundtrips_unknown_values() {
        let claim: RoleClaim = serde_json::from_str("\"auditor\"").unwrap();
        assert_eq!(claim.known(), None);
        assert_eq!(serde_json::to_string(&claim).unwrap(), "\"auditor\"");
    }

    #[test]
    fn test_resource_names_are_kebab_case() {
        assert_eq!(Resource::UserFolder.as_str(), "user-folder");
        assert_eq!(
            "organization-management".parse::<Resource>().unwrap(),
            Resource::OrganizationManagement
        );
        assert!("payroll".parse::<Resource>().is_err());
    }

    #[test]
    fn test_permission_levels_are_totally_ordered_by_value() {
        let levels: Vec<_> = PermissionLevel::iter().collect();
        for pair in levels.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].value() < pair[1].value());
        }
        assert_eq!(PermissionLevel::WriteOwn.value(), 10);
        assert_eq!(PermissionLevel::WriteTeam.value(), 20);
        assert_eq!(PermissionLevel::Sysadmin.value(), 999);
    }

    #[test]
    fn test_permission_level_serializes_as_number() {
        assert_eq!(
            serde_json::to_string(&PermissionLevel::WriteTeam).unwrap(),
            "20"
        );
        let level: PermissionLevel = serde_json::from_str("100").unwrap();
        assert_eq!(level, PermissionLevel::Admin);
        assert!(serde_json::from_str::<PermissionLevel>("7").is_err());
    }

    #[test]
    fn test_access_scope_of() {
        let admin = RoleClaim::Known(Role::Admin);
        assert_eq!(AccessScope::of(&admin, false, false), AccessScope::Platform);
        assert_eq!(AccessScope::of(&admin, true, false), AccessScope::Tenant);
        assert_eq!(AccessScope::of(&admin, true, true), AccessScope::Organization);
        assert_eq!(
            AccessScope::of(&RoleClaim::Known(Role::SystemAdmin), true, true),
            AccessScope::Platform
        );
        assert_eq!(
            AccessScope::of(&RoleClaim::Known(Role::Hr), false, false),
            AccessScope::User
        );
        assert_eq!(
            AccessScope::of(&RoleClaim::parse("root"), false, false),
            AccessScope::User
        );
    }

    #[test]
    fn test_access_scope_covers() {
        assert!(AccessScope::Platform.covers(AccessScope::Tenant));
        assert!(AccessScope::Tenant.covers(AccessScope::Organization));
        assert!(!AccessScope::Organization.covers(AccessScope::Tenant));
        assert!(!AccessScope::User.covers(AccessScope::Organization));
        assert!(AccessScope::User.covers(AccessScope::User));
    }

    #[test]
    fn test_slug_rules() {
        assert!(is_valid_slug("acme"));
        assert!(is_valid_slug("acme-corp_2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("-acme"));
        assert!(!is_valid_slug("Acme"));
        assert!(!is_valid_slug("../etc"));
        assert!(!is_valid_slug(&"a".repeat(64)));
    }
}
