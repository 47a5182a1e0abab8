//! # Configuration Validation
//!
//! Validates engine settings using the `validator` crate.

use crate::config::EngineConfig;
use validator::Validate;

/// Validate the engine configuration, including every nested section.
///
/// ## Validation Rules
/// - `resolver.cache_ttl_seconds`: 1-86400
/// - `authz.max_manager_chain_depth`: 1-256
/// - `schema.*`: upper-case `A-Z0-9_` key names
/// - `secret_policy.min_secret_length`: 1-1024
/// - `observability.log_level`: trace/debug/info/warn/error
/// - `gateway.public_paths`: every entry starts with `/`
pub fn validate(config: &EngineConfig) -> Result<(), validator::ValidationErrors> {
    config.validate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_config() {
        assert!(validate(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_ttl() {
        let mut config = EngineConfig::default();
        config.resolver.cache_ttl_seconds = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_ttl_above_one_day() {
        let mut config = EngineConfig::default();
        config.resolver.cache_ttl_seconds = 86_401;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_manager_chain_depth() {
        let mut config = EngineConfig::default();
        config.authz.max_manager_chain_depth = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_schema_key_names() {
        let mut config = EngineConfig::default();
        config.schema.tenant = vec!["tenant-id".to_string()];
        assert!(validate(&config).is_err());

        config.schema.tenant = vec!["TENANT_ID".to_string(), "TENANT_NAME2".to_string()];
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_logging_levels() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            let mut config = EngineConfig::default();
            config.observability.log_level = level.to_string();
            assert!(validate(&config).is_ok());
        }

        let mut config = EngineConfig::default();
        config.observability.log_level = "verbose".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_public_paths() {
        let mut config = EngineConfig::default();
        config.gateway.public_paths = vec!["health".to_string()];
        assert!(validate(&config).is_err());
    }
}
