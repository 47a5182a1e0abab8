use std::path::PathBuf;

use errors::ContextError;
use hr_core::{HierarchyLevel, RequestContext, Role, RoleClaim, is_valid_slug};
use serde::{Deserialize, Serialize};

use crate::filter::Viewer;

fn checked_slug(field: &str, value: &str) -> Result<String, ContextError> {
    if is_valid_slug(value) {
        Ok(value.to_string())
    } else {
        Err(ContextError::InvalidSlug {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

/// What a caller asks the resolver for.
///
/// `tenant_slug`, `organization_slug` and `user_role` address the hierarchy;
/// `viewer` is the identity the result is filtered for. Without a viewer the
/// result is filtered for the addressed role, which is the most restrictive
/// role when no role is addressed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionRequest {
    pub tenant_slug: Option<String>,
    pub organization_slug: Option<String>,
    pub user_role: Option<String>,
    #[serde(default)]
    pub bypass_cache: bool,
    /// Only set in code; a deserialized request is filtered for the role
    /// it addresses.
    #[serde(skip)]
    pub viewer: Option<Viewer>,
}

impl ResolutionRequest {
    /// Platform level only.
    pub fn platform() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tenant(mut self, slug: impl Into<String>) -> Self {
        self.tenant_slug = Some(slug.into());
        self
    }

    #[must_use]
    pub fn with_organization(mut self, slug: impl Into<String>) -> Self {
        self.organization_slug = Some(slug.into());
        self
    }

    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.user_role = Some(role.into());
        self
    }

    #[must_use]
    pub fn with_viewer(mut self, viewer: Viewer) -> Self {
        self.viewer = Some(viewer);
        self
    }

    #[must_use]
    pub fn bypassing_cache(mut self) -> Self {
        self.bypass_cache = true;
        self
    }

    /// Address the deepest level a request context can reach and filter
    /// for that context's identity.
    ///
    /// The role level is only addressed when both slugs are present, so a
    /// well-formed context never trips the hierarchy rule.
    pub fn for_context(ctx: &RequestContext) -> Self {
        let mut request = Self {
            tenant_slug: ctx.tenant_slug.clone(),
            viewer: Some(Viewer::from(ctx)),
            ..Self::default()
        };
        if request.tenant_slug.is_some() {
            request.organization_slug = ctx.organization_slug.clone();
        }
        if request.organization_slug.is_some() {
            request.user_role = Some(ctx.user_role.as_str().to_string());
        }
        request
    }

    /// Check the hierarchy-dependency rule, the closed role set and slug
    /// syntax.
    pub fn validate(&self) -> Result<LevelAddress, ContextError> {
        if self.organization_slug.is_some() && self.tenant_slug.is_none() {
            return Err(ContextError::InvalidHierarchy {
                level: HierarchyLevel::Organization.to_string(),
                missing: "tenant slug".to_string(),
            });
        }
        if self.user_role.is_some() {
            if self.tenant_slug.is_none() {
                return Err(ContextError::InvalidHierarchy {
                    level: HierarchyLevel::UserRole.to_string(),
                    missing: "tenant slug".to_string(),
                });
            }
            if self.organization_slug.is_none() {
                return Err(ContextError::InvalidHierarchy {
                    level: HierarchyLevel::UserRole.to_string(),
                    missing: "organization slug".to_string(),
                });
            }
        }

        let tenant = self
            .tenant_slug
            .as_deref()
            .map(|s| checked_slug("tenant slug", s))
            .transpose()?;
        let organization = self
            .organization_slug
            .as_deref()
            .map(|s| checked_slug("organization slug", s))
            .transpose()?;
        let role = self
            .user_role
            .as_deref()
            .map(|raw| {
                RoleClaim::parse(raw)
                    .known()
                    .ok_or_else(|| ContextError::UnknownRole {
                        role: raw.to_string(),
                    })
            })
            .transpose()?;

        let viewer = match &self.viewer {
            Some(viewer) => viewer.at(tenant.as_deref(), organization.as_deref()),
            None => {
                let claim = role.map_or_else(|| RoleClaim::parse(""), RoleClaim::Known);
                Viewer::new(claim, tenant.is_some(), organization.is_some())
            }
        };

        Ok(LevelAddress {
            tenant,
            organization,
            role,
            viewer,
        })
    }
}

/// A validated position in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelAddress {
    pub tenant: Option<String>,
    pub organization: Option<String>,
    pub role: Option<Role>,
    pub viewer: Viewer,
}

impl LevelAddress {
    pub fn deepest(&self) -> HierarchyLevel {
        match (&self.tenant, &self.organization, &self.role) {
            (Some(_), Some(_), Some(_)) => HierarchyLevel::UserRole,
            (Some(_), Some(_), None) => HierarchyLevel::Organization,
            (Some(_), None, _) => HierarchyLevel::Tenant,
            _ => HierarchyLevel::Platform,
        }
    }

    /// Level directories to load, relative to the root, in merge order.
    pub fn level_dirs(&self) -> Vec<(HierarchyLevel, PathBuf)> {
        let mut dirs = vec![(HierarchyLevel::Platform, PathBuf::from("platform"))];

        let Some(tenant) = &self.tenant else {
            return dirs;
        };
        let tenant_dir = PathBuf::from("tenants").join(tenant);
        dirs.push((HierarchyLevel::Tenant, tenant_dir.clone()));

        let Some(organization) = &self.organization else {
            return dirs;
        };
        let org_dir = tenant_dir.join("organizations").join(organization);
        dirs.push((HierarchyLevel::Organization, org_dir.clone()));

        if let Some(role) = self.role {
            dirs.push((
                HierarchyLevel::UserRole,
                org_dir.join("users").join(role.as_str()),
            ));
        }
        dirs
    }
}
