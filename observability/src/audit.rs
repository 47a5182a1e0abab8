//! # Audit Trail
//!
//! Every authorization decision and every configuration resolution is
//! written to an [`AuditSink`] as one structured [`AuditRecord`]. The engine
//! only hands records over; delivery and retention belong to the sink.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    AuthorizationDecision,
    ConfigAccess,
    RouteAccess,
}

impl AuditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditKind::AuthorizationDecision => "authorization_decision",
            AuditKind::ConfigAccess => "config_access",
            AuditKind::RouteAccess => "route_access",
        }
    }
}

/// One audit entry.
///
/// Fields that do not apply to a record's [`AuditKind`] stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub kind: AuditKind,
    pub requestor_id: Option<String>,
    pub requestor_role: Option<String>,
    pub resource: Option<String>,
    pub action: Option<String>,
    pub target: Option<String>,
    pub authorized: Option<bool>,
    pub reason: Option<String>,
    pub permission_level: Option<u16>,
    pub required_level: Option<u16>,
    pub tenant_slug: Option<String>,
    pub organization_slug: Option<String>,
    pub cache_hit: Option<bool>,
}

impl AuditRecord {
    fn new(kind: AuditKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
            requestor_id: None,
            requestor_role: None,
            resource: None,
            action: None,
            target: None,
            authorized: None,
            reason: None,
            permission_level: None,
            required_level: None,
            tenant_slug: None,
            organization_slug: None,
            cache_hit: None,
        }
    }

    /// Start a record for a permission check.
    pub fn decision(
        requestor_id: impl Into<String>,
        requestor_role: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        let mut record = Self::new(AuditKind::AuthorizationDecision);
        record.requestor_id = Some(requestor_id.into());
        record.requestor_role = Some(requestor_role.into());
        record.resource = Some(resource.into());
        record.action = Some(action.into());
        record
    }

    /// Start a record for a configuration resolution.
    pub fn config_access(
        requestor_role: Option<String>,
        tenant_slug: Option<String>,
        organization_slug: Option<String>,
    ) -> Self {
        let mut record = Self::new(AuditKind::ConfigAccess);
        record.requestor_role = requestor_role;
        record.tenant_slug = tenant_slug;
        record.organization_slug = organization_slug;
        record
    }

    /// Start a record for one request passing (or failing) the access
    /// middleware. `path` is stored as the target.
    pub fn route_access(
        requestor_id: Option<String>,
        requestor_role: Option<String>,
        path: impl Into<String>,
    ) -> Self {
        let mut record = Self::new(AuditKind::RouteAccess);
        record.requestor_id = requestor_id;
        record.requestor_role = requestor_role;
        record.target = Some(path.into());
        record
    }

    #[must_use]
    pub fn with_requestor(mut self, requestor_id: impl Into<String>) -> Self {
        self.requestor_id = Some(requestor_id.into());
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: Option<String>) -> Self {
        self.target = target;
        self
    }

    #[must_use]
    pub fn with_outcome(
        mut self,
        authorized: bool,
        reason: impl Into<String>,
        permission_level: u16,
        required_level: u16,
    ) -> Self {
        self.authorized = Some(authorized);
        self.reason = Some(reason.into());
        self.permission_level = Some(permission_level);
        self.required_level = Some(required_level);
        self
    }

    #[must_use]
    pub fn with_verdict(mut self, authorized: bool, reason: impl Into<String>) -> Self {
        self.authorized = Some(authorized);
        self.reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn with_address(
        mut self,
        tenant_slug: Option<String>,
        organization_slug: Option<String>,
    ) -> Self {
        self.tenant_slug = tenant_slug;
        self.organization_slug = organization_slug;
        self
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn with_cache_hit(mut self, hit: bool) -> Self {
        self.cache_hit = Some(hit);
        self
    }
}

/// Destination for audit records.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord);
}

impl<T: AuditSink + ?Sized> AuditSink for Arc<T> {
    fn record(&self, record: AuditRecord) {
        (**self).record(record);
    }
}

/// Writes each record as a `tracing` event on the `audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: AuditRecord) {
        let denied = record.authorized == Some(false);
        macro_rules! emit {
            ($level:ident) => {
                tracing::$level!(
                    target: "audit",
                    audit_id = %record.id,
                    kind = record.kind.as_str(),
                    requestor_id = record.requestor_id.as_deref(),
                    requestor_role = record.requestor_role.as_deref(),
                    resource = record.resource.as_deref(),
                    action = record.action.as_deref(),
                    target_id = record.target.as_deref(),
                    authorized = record.authorized,
                    reason = record.reason.as_deref(),
                    permission_level = record.permission_level,
                    required_level = record.required_level,
                    tenant_slug = record.tenant_slug.as_deref(),
                    organization_slug = record.organization_slug.as_deref(),
                    cache_hit = record.cache_hit,
                    "{}",
                    record.kind.as_str()
                )
            };
        }
        if denied {
            emit!(warn);
        } else {
            emit!(info);
        }
    }
}

/// Keeps records in memory, mostly for tests and the CLI.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }

    pub fn last(&self) -> Option<AuditRecord> {
        self.records.lock().last().cloned()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: AuditRecord) {
        self.records.lock().push(record);
    }
}

/// Discards everything. Used when auditing is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _record: AuditRecord) {}
}
