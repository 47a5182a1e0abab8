use hr_core::{Action, PermissionLevel, Resource};
use serde::{Deserialize, Serialize};

/// Which rule settled a granted check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    SystemAdmin,
    PermissionLevel,
    SelfAccess,
    ManagerChain,
    SameOrganization,
    OrganizationRole,
    AdminScope,
}

/// What a decision was about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionContext {
    pub requestor_id: String,
    pub requestor_role: String,
    pub resource: String,
    pub action: String,
    pub target: Option<String>,
    pub cross_tenant: bool,
    pub rule: Option<DecisionRule>,
}

/// Outcome of every permission check. Denials are data, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationResult {
    pub authorized: bool,
    pub permission_level: PermissionLevel,
    pub required_level: PermissionLevel,
    pub reason: String,
    pub context: DecisionContext,
}

impl AuthorizationResult {
    pub(crate) fn granted(
        context: DecisionContext,
        rule: DecisionRule,
        permission_level: PermissionLevel,
        required_level: PermissionLevel,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            authorized: true,
            permission_level,
            required_level,
            reason: reason.into(),
            context: DecisionContext {
                rule: Some(rule),
                ..context
            },
        }
    }

    pub(crate) fn denied(
        context: DecisionContext,
        permission_level: PermissionLevel,
        required_level: PermissionLevel,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            authorized: false,
            permission_level,
            required_level,
            reason: reason.into(),
            context,
        }
    }

    pub fn rule(&self) -> Option<DecisionRule> {
        self.context.rule
    }
}

impl DecisionContext {
    pub(crate) fn new(
        requestor_id: &str,
        requestor_role: &str,
        resource: &str,
        action: &str,
    ) -> Self {
        Self {
            requestor_id: requestor_id.to_string(),
            requestor_role: requestor_role.to_string(),
            resource: resource.to_string(),
            action: action.to_string(),
            target: None,
            cross_tenant: false,
            rule: None,
        }
    }

    pub(crate) fn for_check(
        requestor_id: &str,
        requestor_role: &str,
        resource: Resource,
        action: Action,
    ) -> Self {
        Self::new(
            requestor_id,
            requestor_role,
            resource.as_str(),
            action.as_str(),
        )
    }
}
