//! # Permission Evaluator
//!
//! Decides whether a requestor may perform an action on a resource:
//!
//! 1. System administrators are always authorized.
//! 2. The role's base level for the resource is looked up.
//! 3. The level the action needs is derived from the action, the resource,
//!    the requestor's relation to the target and tenant crossing.
//! 4. A base level below the requirement is denied.
//! 5. Contextual rules decide the rest: self access, manager chain, shared
//!    organization for HR, organization owner/admin, admin scope.
//!
//! Every check is audited. Lookup failures deny; nothing here fails open.

use std::collections::HashSet;
use std::sync::Arc;

use config::EngineConfig;
use errors::LookupError;
use hr_core::{
    AccessScope, Action, EntityLookup, PermissionLevel, RequestContext, Resource, Role, UserId,
};
use observability::{AuditRecord, AuditSink, EngineTelemetry, TracingAuditSink};
use tracing::{debug, error};

use crate::requirement::{Relation, required_level};
use crate::result::{AuthorizationResult, DecisionContext, DecisionRule};
use crate::table::PermissionTable;
use crate::target::{CheckOptions, Target};

pub const DEFAULT_MAX_MANAGER_CHAIN_DEPTH: usize = 32;

pub const REASON_SYSTEM_ERROR: &str = "Authorization system error";
pub const REASON_NO_CONTEXTUAL_PERMISSION: &str = "No contextual permission found";

pub struct PermissionEvaluator<L: EntityLookup> {
    lookup: L,
    table: PermissionTable,
    max_manager_chain_depth: usize,
    audit: Arc<dyn AuditSink>,
    telemetry: EngineTelemetry,
}

impl<L: EntityLookup> PermissionEvaluator<L> {
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            table: PermissionTable::default(),
            max_manager_chain_depth: DEFAULT_MAX_MANAGER_CHAIN_DEPTH,
            audit: Arc::new(TracingAuditSink),
            telemetry: EngineTelemetry::new(),
        }
    }

    /// Decisions are audited through `tracing` whatever
    /// `observability.audit_enabled` says; the switch only covers
    /// configuration and route access.
    pub fn from_config(lookup: L, config: &EngineConfig) -> Self {
        Self::new(lookup).with_max_manager_chain_depth(config.authz.max_manager_chain_depth)
    }

    #[must_use]
    pub fn with_table(mut self, table: PermissionTable) -> Self {
        self.table = table;
        self
    }

    #[must_use]
    pub fn with_max_manager_chain_depth(mut self, depth: usize) -> Self {
        self.max_manager_chain_depth = depth;
        self
    }

    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn table(&self) -> &PermissionTable {
        &self.table
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Check with resource and action given by name, as they arrive from
    /// routes. Unknown names are denied.
    pub fn check_named(
        &self,
        requestor: &RequestContext,
        resource: &str,
        action: &str,
        target: Option<&Target>,
        options: CheckOptions,
    ) -> AuthorizationResult {
        let parsed_resource = resource.parse::<Resource>();
        let parsed_action = action.parse::<Action>();

        match (parsed_resource, parsed_action) {
            (Ok(resource), Ok(action)) => self.check(requestor, resource, action, target, options),
            (resource_result, _) => {
                let reason = if resource_result.is_err() {
                    format!("Unknown resource: {resource}")
                } else {
                    format!("Unknown action: {action}")
                };
                let mut context = DecisionContext::new(
                    requestor.user_id.as_str(),
                    requestor.user_role.as_str(),
                    resource,
                    action,
                );
                context.target = target.and_then(Target::label);
                let result = AuthorizationResult::denied(
                    context,
                    PermissionLevel::None,
                    PermissionLevel::None,
                    reason,
                );
                self.observe(&result);
                result
            }
        }
    }

    pub fn check(
        &self,
        requestor: &RequestContext,
        resource: Resource,
        action: Action,
        target: Option<&Target>,
        options: CheckOptions,
    ) -> AuthorizationResult {
        let result = self.evaluate(requestor, resource, action, target, options);
        self.observe(&result);
        result
    }

    fn observe(&self, result: &AuthorizationResult) {
        let ctx = &result.context;
        self.telemetry.record_decision(result.authorized);
        self.audit.record(
            AuditRecord::decision(
                ctx.requestor_id.clone(),
                ctx.requestor_role.clone(),
                ctx.resource.clone(),
                ctx.action.clone(),
            )
            .with_target(ctx.target.clone())
            .with_outcome(
                result.authorized,
                result.reason.clone(),
                result.permission_level.value(),
                result.required_level.value(),
            ),
        );
    }

    fn evaluate(
        &self,
        requestor: &RequestContext,
        resource: Resource,
        action: Action,
        target: Option<&Target>,
        options: CheckOptions,
    ) -> AuthorizationResult {
        let mut context = DecisionContext::for_check(
            requestor.user_id.as_str(),
            requestor.user_role.as_str(),
            resource,
            action,
        );

        if requestor.is_system_admin() {
            return AuthorizationResult::granted(
                context,
                DecisionRule::SystemAdmin,
                PermissionLevel::Sysadmin,
                PermissionLevel::None,
                "System administrator access",
            );
        }

        context.target = target.and_then(Target::label);
        let cross_tenant =
            options.cross_tenant || target.is_some_and(|t| crosses_tenant(requestor, t));
        context.cross_tenant = cross_tenant;

        let relation = match target {
            Some(t) if t.user_id.as_ref() != Some(&requestor.user_id) => Relation::Other,
            _ => Relation::Own,
        };
        let required = required_level(action, resource, relation, cross_tenant);

        let Some(role) = requestor.role() else {
            return AuthorizationResult::denied(
                context,
                PermissionLevel::None,
                required,
                format!("Unknown role: {}", requestor.user_role),
            );
        };

        let base = self.table.level(role, resource);
        if !base.satisfies(required) {
            return AuthorizationResult::denied(
                context,
                base,
                required,
                format!(
                    "Insufficient permission level: {} ({}) is below required {} ({})",
                    base.name(),
                    base.value(),
                    required.name(),
                    required.value()
                ),
            );
        }

        let Some(target) = target else {
            return AuthorizationResult::granted(
                context,
                DecisionRule::PermissionLevel,
                base,
                required,
                "Permission level sufficient",
            );
        };

        match self.contextual(requestor, role, resource, target) {
            Ok(Some((rule, reason))) => {
                AuthorizationResult::granted(context, rule, base, required, reason)
            }
            Ok(None) => {
                AuthorizationResult::denied(
                    context,
                    base,
                    required,
                    REASON_NO_CONTEXTUAL_PERMISSION,
                )
            }
            Err(e) => {
                error!(
                    requestor = %requestor.user_id,
                    resource = resource.as_str(),
                    action = action.as_str(),
                    error = %e,
                    "Entity lookup failed during authorization"
                );
                AuthorizationResult::denied(context, base, required, REASON_SYSTEM_ERROR)
            }
        }
    }

    /// First matching contextual rule, in fixed order.
    fn contextual(
        &self,
        requestor: &RequestContext,
        role: Role,
        resource: Resource,
        target: &Target,
    ) -> Result<Option<(DecisionRule, String)>, LookupError> {
        if target.user_id.as_ref() == Some(&requestor.user_id) {
            return Ok(Some((DecisionRule::SelfAccess, "Self access".to_string())));
        }

        if role == Role::Manager && self.manages(&requestor.user_id, target)? {
            return Ok(Some((
                DecisionRule::ManagerChain,
                "Manager access to a direct or indirect report".to_string(),
            )));
        }

        if role == Role::Hr {
            if let Some(org) = self.shared_organization(requestor, target)? {
                return Ok(Some((
                    DecisionRule::SameOrganization,
                    format!("Organization-scoped access: requestor and target share organization {org}"),
                )));
            }
        }

        if resource == Resource::OrganizationManagement {
            if let Some(org) = &target.organization_id {
                let member = self.lookup.membership(&requestor.user_id, org)?;
                if let Some(member) = member.filter(|m| m.role.can_manage()) {
                    return Ok(Some((
                        DecisionRule::OrganizationRole,
                        format!("Organization {} access to {org}", member.role),
                    )));
                }
            }
        }

        if role == Role::Admin {
            let scope = requestor.access_scope();
            if within_scope(requestor, scope, target) {
                return Ok(Some((
                    DecisionRule::AdminScope,
                    format!("Administrator access within {scope} scope"),
                )));
            }
        }

        Ok(None)
    }

    /// Walk the target's manager chain looking for `manager`.
    fn manages(&self, manager: &UserId, target: &Target) -> Result<bool, LookupError> {
        let employee = match (&target.employee, &target.user_id) {
            (Some(employee), _) => Some(employee.clone()),
            (None, Some(user_id)) => self.lookup.employee_by_user_id(user_id)?,
            (None, None) => None,
        };

        let mut next = employee.and_then(|e| e.manager_id);
        let mut visited = HashSet::new();

        for _ in 0..self.max_manager_chain_depth {
            let Some(current) = next else {
                return Ok(false);
            };
            if &current == manager {
                return Ok(true);
            }
            if !visited.insert(current.clone()) {
                debug!(user = %current, "Manager chain cycle detected");
                return Ok(false);
            }
            next = self
                .lookup
                .employee_by_user_id(&current)?
                .and_then(|e| e.manager_id);
        }

        debug!(
            manager = %manager,
            depth = self.max_manager_chain_depth,
            "Manager chain depth limit reached"
        );
        Ok(false)
    }

    /// The requestor's organization, when requestor and target both belong
    /// to it.
    fn shared_organization(
        &self,
        requestor: &RequestContext,
        target: &Target,
    ) -> Result<Option<String>, LookupError> {
        let Some(org) = &requestor.organization_id else {
            return Ok(None);
        };
        if self.lookup.membership(&requestor.user_id, org)?.is_none() {
            return Ok(None);
        }

        let target_in_org = match &target.user_id {
            Some(user_id) => self.lookup.membership(user_id, org)?.is_some(),
            None => target.organization_id.as_ref() == Some(org),
        };
        Ok(target_in_org.then(|| org.to_string()))
    }
}

/// A target in a tenant other than the requestor's. Targets without a
/// tenant are taken to live in the requestor's tenant.
fn crosses_tenant(requestor: &RequestContext, target: &Target) -> bool {
    match &target.tenant_id {
        Some(tenant) => requestor.tenant_id.as_ref() != Some(tenant),
        None => false,
    }
}

fn within_scope(requestor: &RequestContext, scope: AccessScope, target: &Target) -> bool {
    let same_or_unset = |mine: Option<&str>, theirs: Option<&str>| match theirs {
        Some(theirs) => mine == Some(theirs),
        None => true,
    };
    let same_tenant = same_or_unset(
        requestor.tenant_id.as_ref().map(|t| t.as_str()),
        target.tenant_id.as_ref().map(|t| t.as_str()),
    );
    let same_org = same_or_unset(
        requestor.organization_id.as_ref().map(|o| o.as_str()),
        target.organization_id.as_ref().map(|o| o.as_str()),
    );

    match scope {
        AccessScope::Platform => true,
        AccessScope::Tenant => same_tenant,
        AccessScope::Organization => same_tenant && same_org,
        AccessScope::User => false,
    }
}
