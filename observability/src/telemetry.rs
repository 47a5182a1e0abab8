use metrics::counter;

pub const AUTHZ_DECISIONS_TOTAL: &str = "hrgate_authz_decisions_total";
pub const CONFIG_CACHE_HITS_TOTAL: &str = "hrgate_config_cache_hits_total";
pub const CONFIG_CACHE_MISSES_TOTAL: &str = "hrgate_config_cache_misses_total";
pub const CONFIG_RESOLUTIONS_TOTAL: &str = "hrgate_config_resolutions_total";
pub const CONFIG_RESOLUTION_FAILURES_TOTAL: &str = "hrgate_config_resolution_failures_total";

/// Counters emitted by the resolver and the evaluator.
///
/// No exporter is installed here; the embedding process decides where the
/// global `metrics` recorder sends them.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineTelemetry;

impl EngineTelemetry {
    pub fn new() -> Self {
        Self
    }

    pub fn record_decision(&self, authorized: bool) {
        let outcome = if authorized { "granted" } else { "denied" };
        counter!(AUTHZ_DECISIONS_TOTAL, "outcome" => outcome).increment(1);
    }

    pub fn record_cache_hit(&self) {
        counter!(CONFIG_CACHE_HITS_TOTAL).increment(1);
    }

    pub fn record_cache_miss(&self) {
        counter!(CONFIG_CACHE_MISSES_TOTAL).increment(1);
    }

    pub fn record_resolution(&self, level: &str) {
        counter!(CONFIG_RESOLUTIONS_TOTAL, "level" => level.to_string()).increment(1);
    }

    pub fn record_resolution_failure(&self, code: &'static str) {
        counter!(CONFIG_RESOLUTION_FAILURES_TOTAL, "code" => code).increment(1);
    }
}
