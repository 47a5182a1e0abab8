//! # Configuration Structures
//!
//! Settings of the engine itself, as opposed to the layered tenant
//! configuration the engine resolves.
//!
//! All configuration structures:
//! - Use `serde` for serialization/deserialization
//! - Use `validator` for input validation
//! - Fall back to field-level defaults when a section is omitted

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

/// Top-level engine configuration.
///
/// ## Usage
/// ```rust,no_run
/// use config::EngineConfig;
///
/// let config = EngineConfig::default();
/// println!("Fragments under {}", config.resolver.config_root.display());
/// ```
///
/// ## Fields
/// - `resolver`: where fragments live and how long resolutions are cached
/// - `authz`: permission evaluator limits
/// - `schema`: required keys per hierarchy level
/// - `secret_policy`: weak-secret detection rules
/// - `observability`: log level and audit switch
/// - `gateway`: public routes that bypass access checks
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    #[validate(nested)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    #[validate(nested)]
    pub authz: AuthzConfig,

    #[serde(default)]
    #[validate(nested)]
    pub schema: SchemaConfig,

    #[serde(default)]
    #[validate(nested)]
    pub secret_policy: SecretPolicyConfig,

    #[serde(default)]
    #[validate(nested)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    #[validate(nested)]
    pub gateway: GatewayConfig,
}

/// Layered configuration resolver settings.
///
/// ## Fields
/// - `config_root`: directory holding `platform/` and `tenants/` (default: `./config`)
/// - `cache_ttl_seconds`: lifetime of a cached resolution (default: 300, 1-86400)
/// - `cache_enabled`: cache resolutions at all (default: true)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ResolverConfig {
    #[serde(default = "default_config_root")]
    pub config_root: PathBuf,

    #[serde(default = "default_cache_ttl_seconds")]
    #[validate(range(min = 1, max = 86400))]
    pub cache_ttl_seconds: u64,

    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
}

fn default_config_root() -> PathBuf {
    PathBuf::from("./config")
}

fn default_cache_ttl_seconds() -> u64 {
    300
}

fn default_cache_enabled() -> bool {
    true
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            config_root: default_config_root(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
            cache_enabled: default_cache_enabled(),
        }
    }
}

impl ResolverConfig {
    pub fn cache_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cache_ttl_seconds)
    }
}

/// Permission evaluator settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct AuthzConfig {
    /// Upper bound on manager-chain hops walked by the manager rule.
    #[serde(default = "default_max_manager_chain_depth")]
    #[validate(range(min = 1, max = 256))]
    pub max_manager_chain_depth: usize,
}

fn default_max_manager_chain_depth() -> usize {
    32
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            max_manager_chain_depth: default_max_manager_chain_depth(),
        }
    }
}

/// Keys that must be present after merging, per requested hierarchy level.
///
/// A level's keys are only enforced when resolution reaches that level.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct SchemaConfig {
    #[serde(default = "default_platform_keys")]
    #[validate(custom(function = "validate_key_names"))]
    pub platform: Vec<String>,

    #[serde(default = "default_tenant_keys")]
    #[validate(custom(function = "validate_key_names"))]
    pub tenant: Vec<String>,

    #[serde(default = "default_organization_keys")]
    #[validate(custom(function = "validate_key_names"))]
    pub organization: Vec<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_key_names"))]
    pub user_role: Vec<String>,
}

fn default_platform_keys() -> Vec<String> {
    vec!["PLATFORM_NAME".to_string()]
}

fn default_tenant_keys() -> Vec<String> {
    vec!["TENANT_ID".to_string()]
}

fn default_organization_keys() -> Vec<String> {
    vec!["ORGANIZATION_ID".to_string()]
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            platform: default_platform_keys(),
            tenant: default_tenant_keys(),
            organization: default_organization_keys(),
            user_role: Vec::new(),
        }
    }
}

fn validate_key_names(keys: &Vec<String>) -> Result<(), validator::ValidationError> {
    let valid = keys.iter().all(|key| {
        let mut chars = key.chars();
        chars.next().is_some_and(|c| c.is_ascii_uppercase())
            && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    });
    if valid {
        Ok(())
    } else {
        Err(validator::ValidationError::new("Invalid configuration key name"))
    }
}

/// Rules applied to secret-classified keys after merging.
///
/// Violations are reported, never fatal.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct SecretPolicyConfig {
    #[serde(default = "default_min_secret_length")]
    #[validate(range(min = 1, max = 1024))]
    pub min_secret_length: usize,

    #[serde(default = "default_forbidden_values")]
    pub forbidden_values: Vec<String>,
}

fn default_min_secret_length() -> usize {
    12
}

fn default_forbidden_values() -> Vec<String> {
    ["password", "changeme", "secret", "admin", "123456"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for SecretPolicyConfig {
    fn default() -> Self {
        Self {
            min_secret_length: default_min_secret_length(),
            forbidden_values: default_forbidden_values(),
        }
    }
}

/// Observability configuration.
///
/// ## Fields
/// - `log_level`: one of trace/debug/info/warn/error (default: "info")
/// - `audit_enabled`: emit audit records for decisions and resolutions (default: true)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    #[validate(custom(function = "validate_log_level"))]
    pub log_level: String,

    #[serde(default = "default_audit_enabled")]
    pub audit_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_audit_enabled() -> bool {
    true
}

fn validate_log_level(value: &str) -> Result<(), validator::ValidationError> {
    match value {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(validator::ValidationError::new("Invalid logging level")),
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            audit_enabled: default_audit_enabled(),
        }
    }
}

/// Access middleware settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct GatewayConfig {
    /// Path prefixes served without authentication.
    #[serde(default = "default_public_paths")]
    #[validate(custom(function = "validate_public_paths"))]
    pub public_paths: Vec<String>,
}

fn default_public_paths() -> Vec<String> {
    vec!["/health".to_string(), "/login".to_string()]
}

fn validate_public_paths(paths: &Vec<String>) -> Result<(), validator::ValidationError> {
    if paths.iter().all(|p| p.starts_with('/')) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("Public paths must start with '/'"))
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            public_paths: default_public_paths(),
        }
    }
}
