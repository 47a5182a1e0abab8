use std::sync::Arc;

use authz::{AuthorizationResult, CheckOptions, PermissionEvaluator};
use config::EngineConfig;
use context::{ContextBuilder, TokenBlacklist, TokenClaims};
use hr_core::{AccessScope, EntityLookup, RequestContext};
use observability::{AuditRecord, AuditSink, NoopAuditSink, TracingAuditSink};
use resolver::{ConfigResolver, ResolutionRequest, ResolvedConfig};
use tracing::{debug, info, warn};

use crate::error::AccessError;
use crate::route::{RouteRequirement, SecurityScope};

/// What a request carries past the middleware.
#[derive(Debug, Clone)]
pub struct AccessGrant {
    /// Configuration resolved and filtered for the caller.
    pub config: Arc<ResolvedConfig>,
    pub auth_context: RequestContext,
    /// The caller's own administrative reach.
    pub access_level: AccessScope,
    /// The scope the route declared.
    pub security_scope: SecurityScope,
    /// Present when the route declared a permission.
    pub decision: Option<AuthorizationResult>,
}

/// Runs the access pipeline for one request.
pub struct AccessGate<L: EntityLookup> {
    resolver: Arc<ConfigResolver>,
    evaluator: Arc<PermissionEvaluator<L>>,
    blacklist: Arc<TokenBlacklist>,
    public_paths: Vec<String>,
    audit: Arc<dyn AuditSink>,
}

impl<L: EntityLookup> std::fmt::Debug for AccessGate<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("resolver", &self.resolver)
            .field("public_paths", &self.public_paths)
            .field("revoked_tokens", &self.blacklist.len())
            .finish()
    }
}

impl<L: EntityLookup> AccessGate<L> {
    pub fn new(resolver: Arc<ConfigResolver>, evaluator: Arc<PermissionEvaluator<L>>) -> Self {
        Self {
            resolver,
            evaluator,
            blacklist: Arc::new(TokenBlacklist::new()),
            public_paths: Vec::new(),
            audit: Arc::new(TracingAuditSink),
        }
    }

    /// Wire a resolver, an evaluator and the audit sink from engine settings.
    ///
    /// `observability.audit_enabled` switches route and config-access
    /// records; the evaluator audits every decision regardless.
    pub fn from_config(config: &EngineConfig, lookup: L) -> Self {
        let audit: Arc<dyn AuditSink> = if config.observability.audit_enabled {
            Arc::new(TracingAuditSink)
        } else {
            Arc::new(NoopAuditSink)
        };
        Self::new(
            Arc::new(ConfigResolver::from_config(config)),
            Arc::new(PermissionEvaluator::from_config(lookup, config)),
        )
        .with_public_paths(config.gateway.public_paths.clone())
        .with_audit_sink(audit)
    }

    #[must_use]
    pub fn with_blacklist(mut self, blacklist: Arc<TokenBlacklist>) -> Self {
        self.blacklist = blacklist;
        self
    }

    #[must_use]
    pub fn with_public_paths(mut self, paths: Vec<String>) -> Self {
        self.public_paths = paths;
        self
    }

    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn resolver(&self) -> &Arc<ConfigResolver> {
        &self.resolver
    }

    pub fn evaluator(&self) -> &Arc<PermissionEvaluator<L>> {
        &self.evaluator
    }

    pub fn blacklist(&self) -> &Arc<TokenBlacklist> {
        &self.blacklist
    }

    /// A public path matches itself and everything below it.
    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|public| {
            path == public
                || path
                    .strip_prefix(public.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Build the context and run every check a route demands.
    ///
    /// `overrides` carries the request's headers and path parameters; the
    /// gate adds its blacklist before building.
    pub async fn authorize(
        &self,
        path: &str,
        claims: &TokenClaims,
        overrides: ContextBuilder,
        requirement: &RouteRequirement,
    ) -> Result<AccessGrant, AccessError> {
        let outcome = self
            .run(claims, overrides, requirement)
            .await;

        let record = AuditRecord::route_access(
            claims.sub.clone(),
            claims.role.clone(),
            path,
        );
        match &outcome {
            Ok(grant) => {
                self.audit.record(
                    record
                        .with_address(
                            grant.auth_context.tenant_slug.clone(),
                            grant.auth_context.organization_slug.clone(),
                        )
                        .with_verdict(true, format!("Access level {}", grant.access_level)),
                );
                info!(
                    path,
                    user_id = %grant.auth_context.user_id,
                    access_level = %grant.access_level,
                    security_scope = %grant.security_scope,
                    "Access granted"
                );
            }
            Err(e) => {
                self.audit
                    .record(record.with_verdict(false, e.to_string()));
                warn!(path, code = e.error_code(), error = %e, "Access refused");
            }
        }
        outcome
    }

    async fn run(
        &self,
        claims: &TokenClaims,
        overrides: ContextBuilder,
        requirement: &RouteRequirement,
    ) -> Result<AccessGrant, AccessError> {
        let resolved = overrides
            .with_blacklist(Arc::clone(&self.blacklist))
            .build(claims)?;
        for (field, value, source) in resolved.explain() {
            debug!(field = %field, value = %value, source = %source, "Context field");
        }
        let ctx = resolved.to_request_context();

        let access_level = ctx.access_scope();
        if !access_level.covers(requirement.scope) {
            return Err(AccessError::InsufficientScope {
                required: requirement.scope,
                actual: access_level,
            });
        }

        let decision = match requirement.permission {
            Some((resource, action)) => {
                let result =
                    self.evaluator
                        .check(&ctx, resource, action, None, CheckOptions::default());
                if !result.authorized {
                    return Err(result.into());
                }
                Some(result)
            }
            None => None,
        };

        let config = self
            .resolver
            .resolve(&ResolutionRequest::for_context(&ctx))
            .await?;

        Ok(AccessGrant {
            config,
            auth_context: ctx,
            access_level,
            security_scope: requirement.scope,
            decision,
        })
    }
}
