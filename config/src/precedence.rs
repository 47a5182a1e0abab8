//! # Configuration Precedence
//!
//! Merges engine settings from multiple sources with precedence rules.
//!
//! # Precedence Order
//! 1. CLI arguments (highest priority)
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values (lowest priority)
//!
//! Every source except the defaults is a [`SettingsLayer`]: each field is
//! optional, and only the fields a source actually sets are applied.

use std::fmt::Debug;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

/// Settings as provided by one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsLayer {
    pub resolver: ResolverLayer,
    pub authz: AuthzLayer,
    pub schema: SchemaLayer,
    pub secret_policy: SecretPolicyLayer,
    pub observability: ObservabilityLayer,
    pub gateway: GatewayLayer,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverLayer {
    pub config_root: Option<PathBuf>,
    pub cache_ttl_seconds: Option<u64>,
    pub cache_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthzLayer {
    pub max_manager_chain_depth: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaLayer {
    pub platform: Option<Vec<String>>,
    pub tenant: Option<Vec<String>>,
    pub organization: Option<Vec<String>>,
    pub user_role: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretPolicyLayer {
    pub min_secret_length: Option<usize>,
    pub forbidden_values: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityLayer {
    pub log_level: Option<String>,
    pub audit_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayLayer {
    pub public_paths: Option<Vec<String>>,
}

impl From<EngineConfig> for SettingsLayer {
    /// A layer that sets every field.
    fn from(config: EngineConfig) -> Self {
        Self {
            resolver: ResolverLayer {
                config_root: Some(config.resolver.config_root),
                cache_ttl_seconds: Some(config.resolver.cache_ttl_seconds),
                cache_enabled: Some(config.resolver.cache_enabled),
            },
            authz: AuthzLayer {
                max_manager_chain_depth: Some(config.authz.max_manager_chain_depth),
            },
            schema: SchemaLayer {
                platform: Some(config.schema.platform),
                tenant: Some(config.schema.tenant),
                organization: Some(config.schema.organization),
                user_role: Some(config.schema.user_role),
            },
            secret_policy: SecretPolicyLayer {
                min_secret_length: Some(config.secret_policy.min_secret_length),
                forbidden_values: Some(config.secret_policy.forbidden_values),
            },
            observability: ObservabilityLayer {
                log_level: Some(config.observability.log_level),
                audit_enabled: Some(config.observability.audit_enabled),
            },
            gateway: GatewayLayer {
                public_paths: Some(config.gateway.public_paths),
            },
        }
    }
}

/// Merge multiple configuration sources with precedence.
///
/// ## Usage
/// ```rust,no_run
/// use config::{EngineConfig, load_from_env, load_from_file, merge_configs};
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let from_file = load_from_file(Path::new("engine.toml"))?;
///     let from_env = load_from_env()?;
///
///     let _config = merge_configs(
///         EngineConfig::default(),
///         from_file,
///         "file",
///         from_env,
///         "env",
///         None,
///         "cli",
///     );
///     Ok(())
/// }
/// ```
pub fn merge_configs(
    defaults: EngineConfig,
    file_config: SettingsLayer,
    file_source_name: &str,
    env_config: SettingsLayer,
    env_source_name: &str,
    cli_config: Option<SettingsLayer>,
    cli_source_name: &str,
) -> EngineConfig {
    let mut config = defaults;

    apply_layer(&mut config, file_config, file_source_name);
    apply_layer(&mut config, env_config, env_source_name);

    if let Some(cli) = cli_config {
        apply_layer(&mut config, cli, cli_source_name);
    }

    config
}

fn apply_layer(base: &mut EngineConfig, layer: SettingsLayer, source_name: &str) {
    let mut changes = Vec::new();

    let resolver = layer.resolver;
    set(&mut base.resolver.config_root, resolver.config_root, "resolver.config_root", &mut changes);
    set(
        &mut base.resolver.cache_ttl_seconds,
        resolver.cache_ttl_seconds,
        "resolver.cache_ttl_seconds",
        &mut changes,
    );
    set(
        &mut base.resolver.cache_enabled,
        resolver.cache_enabled,
        "resolver.cache_enabled",
        &mut changes,
    );

    set(
        &mut base.authz.max_manager_chain_depth,
        layer.authz.max_manager_chain_depth,
        "authz.max_manager_chain_depth",
        &mut changes,
    );

    let schema = layer.schema;
    set(&mut base.schema.platform, schema.platform, "schema.platform", &mut changes);
    set(&mut base.schema.tenant, schema.tenant, "schema.tenant", &mut changes);
    set(
        &mut base.schema.organization,
        schema.organization,
        "schema.organization",
        &mut changes,
    );
    set(&mut base.schema.user_role, schema.user_role, "schema.user_role", &mut changes);

    set(
        &mut base.secret_policy.min_secret_length,
        layer.secret_policy.min_secret_length,
        "secret_policy.min_secret_length",
        &mut changes,
    );
    if let Some(values) = layer.secret_policy.forbidden_values {
        changes.push("secret_policy.forbidden_values = ***".to_string());
        base.secret_policy.forbidden_values = values;
    }

    set(
        &mut base.observability.log_level,
        layer.observability.log_level,
        "observability.log_level",
        &mut changes,
    );
    set(
        &mut base.observability.audit_enabled,
        layer.observability.audit_enabled,
        "observability.audit_enabled",
        &mut changes,
    );

    set(
        &mut base.gateway.public_paths,
        layer.gateway.public_paths,
        "gateway.public_paths",
        &mut changes,
    );

    if !changes.is_empty() {
        tracing::info!("Configuration from {}: {:?}", source_name, changes);
    }
}

fn set<T: Debug>(target: &mut T, value: Option<T>, name: &str, changes: &mut Vec<String>) {
    if let Some(value) = value {
        changes.push(format!("{name} = {value:?}"));
        *target = value;
    }
}
