//! # Observability
//!
//! Audit records for authorization decisions and configuration access, and
//! the engine's `metrics` counters.

pub mod audit;
pub mod telemetry;

pub use audit::{
    AuditKind, AuditRecord, AuditSink, MemoryAuditSink, NoopAuditSink, TracingAuditSink,
};
pub use telemetry::EngineTelemetry;
