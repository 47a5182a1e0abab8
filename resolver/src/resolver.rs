//! # Config Resolver
//!
//! Loads the fragments a request addresses, merges them platform → tenant
//! → organization → user-role, checks required keys, filters the result for
//! the viewer and caches the filtered result.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use config::EngineConfig;
use errors::ResolutionError;
use hr_core::HierarchyLevel;
use observability::{AuditRecord, AuditSink, EngineTelemetry, NoopAuditSink, TracingAuditSink};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::cache::{CacheStats, ConfigCache, cache_key};
use crate::filter::filter;
use crate::fragment::FragmentStore;
use crate::merge::{ConfigMap, merge_fragments};
use crate::request::{LevelAddress, ResolutionRequest};
use crate::schema::RequiredKeys;
use crate::secret_policy::SecretPolicy;

/// A merged and filtered configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    /// Deepest hierarchy level that took part in the merge.
    pub level: HierarchyLevel,
    pub values: ConfigMap,
}

impl ResolvedConfig {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub struct ConfigResolver {
    store: FragmentStore,
    cache: ConfigCache,
    cache_enabled: bool,
    required: RequiredKeys,
    secret_policy: SecretPolicy,
    audit: Arc<dyn AuditSink>,
    telemetry: EngineTelemetry,
}

impl std::fmt::Debug for ConfigResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigResolver")
            .field("root", &self.store.root())
            .field("ttl", &self.cache.ttl())
            .field("cache_enabled", &self.cache_enabled)
            .finish_non_exhaustive()
    }
}

impl ConfigResolver {
    /// Resolver over `root` with default TTL, required keys and secret
    /// policy, auditing through `tracing`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            store: FragmentStore::new(root),
            cache: ConfigCache::default(),
            cache_enabled: true,
            required: RequiredKeys::default(),
            secret_policy: SecretPolicy::default(),
            audit: Arc::new(TracingAuditSink),
            telemetry: EngineTelemetry::new(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let audit: Arc<dyn AuditSink> = if config.observability.audit_enabled {
            Arc::new(TracingAuditSink)
        } else {
            Arc::new(NoopAuditSink)
        };

        Self::new(config.resolver.config_root.clone())
            .with_cache_ttl(config.resolver.cache_ttl())
            .with_cache_enabled(config.resolver.cache_enabled)
            .with_required_keys(RequiredKeys::from(&config.schema))
            .with_secret_policy(SecretPolicy::from(&config.secret_policy))
            .with_audit_sink(audit)
    }

    /// Replaces the cache, dropping anything already cached.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = ConfigCache::new(ttl);
        self
    }

    #[must_use]
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_required_keys(mut self, required: RequiredKeys) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn with_secret_policy(mut self, policy: SecretPolicy) -> Self {
        self.secret_policy = policy;
        self
    }

    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn root(&self) -> &Path {
        self.store.root()
    }

    pub fn cache(&self) -> &ConfigCache {
        &self.cache
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        debug!("Configuration cache cleared");
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn invalidate_tenant(&self, tenant_slug: &str) -> usize {
        let dropped = self.cache.invalidate_tenant(tenant_slug);
        debug!(tenant = tenant_slug, dropped, "Tenant cache entries invalidated");
        dropped
    }

    /// Drop entries whose TTL has run out, returning how many went.
    pub fn evict_expired(&self) -> usize {
        let evicted = self.cache.evict_expired();
        if evicted > 0 {
            debug!(evicted, "Expired cache entries evicted");
        }
        evicted
    }

    /// Resolve, filter and cache the configuration a request addresses.
    ///
    /// With `bypass_cache` the cache is not read, but the fresh result is
    /// still stored. Failed resolutions are never cached.
    #[instrument(skip(self, request), fields(
        tenant = request.tenant_slug.as_deref(),
        organization = request.organization_slug.as_deref(),
        role = request.user_role.as_deref(),
    ))]
    pub async fn resolve(
        &self,
        request: &ResolutionRequest,
    ) -> Result<Arc<ResolvedConfig>, ResolutionError> {
        let outcome = self.resolve_inner(request).await;

        let viewer_role = request
            .viewer
            .as_ref()
            .map(|v| v.role.as_str().to_string())
            .or_else(|| request.user_role.clone());
        let record = AuditRecord::config_access(
            viewer_role,
            request.tenant_slug.clone(),
            request.organization_slug.clone(),
        );

        match outcome {
            Ok((resolved, cache_hit)) => {
                self.audit.record(
                    record
                        .with_cache_hit(cache_hit)
                        .with_reason(format!("Resolved at {} level", resolved.level)),
                );
                Ok(resolved)
            }
            Err(e) => {
                self.telemetry.record_resolution_failure(e.code());
                self.audit.record(record.with_reason(e.to_string()));
                Err(e)
            }
        }
    }

    async fn resolve_inner(
        &self,
        request: &ResolutionRequest,
    ) -> Result<(Arc<ResolvedConfig>, bool), ResolutionError> {
        let address = request.validate()?;
        let key = cache_key(&address);

        if self.cache_enabled && !request.bypass_cache {
            if let Some(cached) = self.cache.get(&key) {
                self.telemetry.record_cache_hit();
                debug!(cache_hit = true, key = %key, "Configuration cache hit");
                return Ok((cached, true));
            }
            self.telemetry.record_cache_miss();
        }

        let merged = self.merge_address(&address).await?;
        let resolved = Arc::new(ResolvedConfig {
            level: address.deepest(),
            values: filter(&merged, &address.viewer),
        });

        if self.cache_enabled {
            self.cache
                .insert(key, address.tenant.clone(), Arc::clone(&resolved));
        }
        self.telemetry
            .record_resolution(&address.deepest().to_string());

        Ok((resolved, false))
    }

    /// The merged, validated configuration before security filtering.
    ///
    /// Never cached. Deterministic for a fixed fragment set and request.
    pub async fn merged(&self, request: &ResolutionRequest) -> Result<ConfigMap, ResolutionError> {
        let address = request.validate()?;
        self.merge_address(&address).await
    }

    async fn merge_address(&self, address: &LevelAddress) -> Result<ConfigMap, ResolutionError> {
        let mut fragments = Vec::new();
        for (level, dir) in address.level_dirs() {
            let level_fragments = self.store.load_level(&dir).await?;
            debug!(%level, fragments = level_fragments.len(), "Loaded level");
            fragments.extend(level_fragments);
        }

        let merged = merge_fragments(fragments);
        self.required.check(&merged, address.deepest())?;

        for violation in self.secret_policy.evaluate(&merged) {
            warn!(key = %violation.key, rule = %violation.rule, "Secret policy violation");
        }

        Ok(merged)
    }
}
