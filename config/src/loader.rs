//! # Environment Variable Loader
//!
//! Loads engine settings from environment variables following 12-factor app
//! principles.
//!
//! # Naming Convention
//! All variables share the `HRG_` prefix.

use crate::error::SettingsError;
use crate::precedence::{
    AuthzLayer, GatewayLayer, ObservabilityLayer, ResolverLayer, SecretPolicyLayer, SettingsLayer,
};
use std::env;
use std::path::PathBuf;

const ENV_PREFIX: &str = "HRG_";

/// Load engine settings from environment variables.
///
/// Unset variables leave their field unset in the returned layer; a
/// variable that is set but cannot be parsed is an error rather than a
/// silent fallback.
///
/// ## Environment Variables
/// - `HRG_CONFIG_ROOT`: fragment root directory
/// - `HRG_CACHE_TTL_SECONDS`: resolution cache TTL
/// - `HRG_CACHE_ENABLED`: enable the resolution cache
/// - `HRG_MAX_MANAGER_CHAIN_DEPTH`: manager-chain walk bound
/// - `HRG_MIN_SECRET_LENGTH`: secret policy minimum length
/// - `HRG_LOG_LEVEL`: trace/debug/info/warn/error
/// - `HRG_AUDIT_ENABLED`: emit config-access and route audit records
/// - `HRG_PUBLIC_PATHS`: comma-separated public path prefixes
pub fn load_from_env() -> Result<SettingsLayer, SettingsError> {
    Ok(SettingsLayer {
        resolver: ResolverLayer {
            config_root: env_string("CONFIG_ROOT").map(PathBuf::from),
            cache_ttl_seconds: parse_env("CACHE_TTL_SECONDS")?,
            cache_enabled: parse_env("CACHE_ENABLED")?,
        },
        authz: AuthzLayer {
            max_manager_chain_depth: parse_env("MAX_MANAGER_CHAIN_DEPTH")?,
        },
        secret_policy: SecretPolicyLayer {
            min_secret_length: parse_env("MIN_SECRET_LENGTH")?,
            ..Default::default()
        },
        observability: ObservabilityLayer {
            log_level: env_string("LOG_LEVEL"),
            audit_enabled: parse_env("AUDIT_ENABLED")?,
        },
        gateway: GatewayLayer {
            public_paths: env_string("PUBLIC_PATHS").map(|raw| split_list(&raw)),
        },
        ..Default::default()
    })
}

fn env_string(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}{name}"))
        .ok()
        .filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(name: &str) -> Result<Option<T>, SettingsError>
where
    T: std::str::FromStr,
{
    match env_string(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| SettingsError::InvalidEnv {
                key: format!("{ENV_PREFIX}{name}"),
                value: raw,
            }),
        None => Ok(None),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 8] = [
        "HRG_CONFIG_ROOT",
        "HRG_CACHE_TTL_SECONDS",
        "HRG_CACHE_ENABLED",
        "HRG_MAX_MANAGER_CHAIN_DEPTH",
        "HRG_MIN_SECRET_LENGTH",
        "HRG_LOG_LEVEL",
        "HRG_AUDIT_ENABLED",
        "HRG_PUBLIC_PATHS",
    ];

    fn clear_env() {
        for var in VARS {
            unsafe {
                env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_load_from_env_defaults() {
        clear_env();
        let layer = load_from_env().unwrap();
        assert_eq!(layer, SettingsLayer::default());
    }

    #[test]
    #[serial]
    fn test_load_from_env_overrides() {
        clear_env();
        unsafe {
            env::set_var("HRG_CONFIG_ROOT", "/etc/hr");
            env::set_var("HRG_CACHE_TTL_SECONDS", "30");
            env::set_var("HRG_CACHE_ENABLED", "false");
            env::set_var("HRG_PUBLIC_PATHS", "/health, /status ,");
        }

        let layer = load_from_env().unwrap();
        assert_eq!(layer.resolver.config_root, Some(PathBuf::from("/etc/hr")));
        assert_eq!(layer.resolver.cache_ttl_seconds, Some(30));
        assert_eq!(layer.resolver.cache_enabled, Some(false));
        assert_eq!(
            layer.gateway.public_paths,
            Some(vec!["/health".to_string(), "/status".to_string()])
        );
        assert_eq!(layer.observability.log_level, None);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_set_to_default_still_overrides_file() {
        clear_env();
        unsafe {
            env::set_var("HRG_CACHE_ENABLED", "true");
            env::set_var("HRG_CACHE_TTL_SECONDS", "300");
        }
        let file = SettingsLayer {
            resolver: ResolverLayer {
                cache_enabled: Some(false),
                cache_ttl_seconds: Some(60),
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = crate::merge_configs(
            crate::EngineConfig::default(),
            file,
            "file",
            load_from_env().unwrap(),
            "env",
            None,
            "cli",
        );
        assert!(merged.resolver.cache_enabled);
        assert_eq!(merged.resolver.cache_ttl_seconds, 300);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_from_env_rejects_garbage() {
        clear_env();
        unsafe {
            env::set_var("HRG_CACHE_TTL_SECONDS", "five minutes");
        }

        let err = load_from_env().unwrap_err();
        assert!(matches!(
            err,
            SettingsError::InvalidEnv { ref key, .. } if key == "HRG_CACHE_TTL_SECONDS"
        ));

        clear_env();
    }
}
