use config::SchemaConfig;
use errors::ResolutionError;
use hr_core::HierarchyLevel;
use strum::IntoEnumIterator;

use crate::merge::ConfigMap;

/// Keys that must be present after merging, per hierarchy level.
///
/// Resolving at a level enforces the keys of that level and of every level
/// above it. A key with a blank value counts as missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredKeys {
    platform: Vec<String>,
    tenant: Vec<String>,
    organization: Vec<String>,
    user_role: Vec<String>,
}

impl Default for RequiredKeys {
    fn default() -> Self {
        Self::from(&SchemaConfig::default())
    }
}

impl From<&SchemaConfig> for RequiredKeys {
    fn from(schema: &SchemaConfig) -> Self {
        Self {
            platform: schema.platform.clone(),
            tenant: schema.tenant.clone(),
            organization: schema.organization.clone(),
            user_role: schema.user_role.clone(),
        }
    }
}

impl RequiredKeys {
    pub fn none() -> Self {
        Self {
            platform: Vec::new(),
            tenant: Vec::new(),
            organization: Vec::new(),
            user_role: Vec::new(),
        }
    }

    pub fn for_level(&self, level: HierarchyLevel) -> &[String] {
        match level {
            HierarchyLevel::Platform => &self.platform,
            HierarchyLevel::Tenant => &self.tenant,
            HierarchyLevel::Organization => &self.organization,
            HierarchyLevel::UserRole => &self.user_role,
        }
    }

    pub fn check(
        &self,
        config: &ConfigMap,
        deepest: HierarchyLevel,
    ) -> Result<(), ResolutionError> {
        for level in HierarchyLevel::iter().take_while(|level| *level <= deepest) {
            let missing = self
                .for_level(level)
                .iter()
                .find(|key| config.get(*key).is_none_or(|v| v.trim().is_empty()));
            if let Some(key) = missing {
                return Err(ResolutionError::IncompleteConfiguration {
                    key: key.clone(),
                    level: level.to_string(),
                });
            }
        }
        Ok(())
    }
}
