//! # Engine Settings
//!
//! Configuration of the configuration engine itself: where fragments live,
//! how long resolutions are cached, which keys each hierarchy level must
//! provide, and how the surrounding middleware behaves.
//!
//! This crate provides:
//! - Settings structures with `validator` rules
//! - Environment variable loading (`HRG_*`)
//! - Settings file loading (TOML/YAML)
//! - Precedence merging (CLI > env > file > defaults)
//! - Fragment-root watching for early cache invalidation

pub mod config;
pub mod error;
pub mod file_loader;
pub mod hot_reload;
pub mod loader;
pub mod precedence;
pub mod validator;

pub use config::{
    AuthzConfig, EngineConfig, GatewayConfig, ObservabilityConfig, ResolverConfig, SchemaConfig,
    SecretPolicyConfig,
};
pub use error::SettingsError;
pub use file_loader::{load_from_file, load_from_toml, load_from_yaml};
pub use hot_reload::{ConfigRootEvent, watch_config_root};
pub use loader::load_from_env;
pub use precedence::{
    AuthzLayer, GatewayLayer, ObservabilityLayer, ResolverLayer, SchemaLayer, SecretPolicyLayer,
    SettingsLayer, merge_configs,
};
pub use validator::validate;

/// Load settings from an optional file and the environment, merge them over
/// the defaults and validate the result.
pub fn load(
    file: Option<&std::path::Path>,
    cli: Option<SettingsLayer>,
) -> Result<EngineConfig, SettingsError> {
    let from_file = match file {
        Some(path) => load_from_file(path)?,
        None => SettingsLayer::default(),
    };
    let from_env = load_from_env()?;

    let merged = merge_configs(
        EngineConfig::default(),
        from_file,
        "file",
        from_env,
        "env",
        cli,
        "cli",
    );
    validate(&merged)?;
    Ok(merged)
}
