//! Weak-secret detection for secret-classified keys.
//!
//! Violations are reported, never fatal: resolution still succeeds.

use config::SecretPolicyConfig;
use serde::Serialize;

use crate::filter::classify;
use crate::merge::ConfigMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum PolicyRule {
    Empty,
    TooShort { min: usize },
    ForbiddenValue,
}

impl std::fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyRule::Empty => write!(f, "secret is empty"),
            PolicyRule::TooShort { min } => write!(f, "secret shorter than {min} characters"),
            PolicyRule::ForbiddenValue => write!(f, "secret uses a well-known value"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyViolation {
    pub key: String,
    #[serde(flatten)]
    pub rule: PolicyRule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretPolicy {
    min_length: usize,
    forbidden_values: Vec<String>,
}

impl Default for SecretPolicy {
    fn default() -> Self {
        Self::from(&SecretPolicyConfig::default())
    }
}

impl From<&SecretPolicyConfig> for SecretPolicy {
    fn from(config: &SecretPolicyConfig) -> Self {
        Self {
            min_length: config.min_secret_length,
            forbidden_values: config
                .forbidden_values
                .iter()
                .map(|v| v.to_lowercase())
                .collect(),
        }
    }
}

impl SecretPolicy {
    /// At most one violation per key; the first matching rule wins.
    pub fn evaluate(&self, config: &ConfigMap) -> Vec<PolicyViolation> {
        config
            .iter()
            .filter(|(key, _)| classify(key).is_some())
            .filter_map(|(key, value)| {
                self.check_value(value).map(|rule| PolicyViolation {
                    key: key.clone(),
                    rule,
                })
            })
            .collect()
    }

    fn check_value(&self, value: &str) -> Option<PolicyRule> {
        if value.is_empty() {
            Some(PolicyRule::Empty)
        } else if self.forbidden_values.contains(&value.to_lowercase()) {
            Some(PolicyRule::ForbiddenValue)
        } else if value.chars().count() < self.min_length {
            Some(PolicyRule::TooShort {
                min: self.min_length,
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> ConfigMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_only_secret_keys_are_checked() {
        let violations = SecretPolicy::default().evaluate(&config(&[
            ("UI_THEME", "x"),
            ("JWT_SECRET", "short"),
            ("AI_OPENAI_API_KEY", "sk-abcdefghijklmnop"),
        ]));
        assert_eq!(
            violations,
            vec![PolicyViolation {
                key: "JWT_SECRET".to_string(),
                rule: PolicyRule::TooShort { min: 12 },
            }]
        );
    }

    #[test]
    fn test_forbidden_values_are_case_insensitive() {
        let violations =
            SecretPolicy::default().evaluate(&config(&[("DATABASE_PASSWORD", "ChangeMe")]));
        assert_eq!(violations[0].rule, PolicyRule::ForbiddenValue);
    }

    #[test]
    fn test_empty_secret() {
        let violations = SecretPolicy::default().evaluate(&config(&[("SMTP_PASSWORD", "")]));
        assert_eq!(violations[0].rule, PolicyRule::Empty);
    }

    #[test]
    fn test_configured_minimum() {
        let policy = SecretPolicy::from(&SecretPolicyConfig {
            min_secret_length: 4,
            forbidden_values: Vec::new(),
        });
        assert!(policy.evaluate(&config(&[("JWT_SECRET", "abcd")])).is_empty());
        assert!(PolicyRule::TooShort { min: 4 }.to_string().contains('4'));
    }
}
