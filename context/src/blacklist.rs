use dashmap::DashMap;
use tracing::{debug, info};

/// Revoked token ids, shared across in-flight requests.
///
/// Each entry maps a `jti` to the token's own expiry in unix seconds. Once
/// the token has expired it is rejected upstream anyway, so the entry is no
/// longer consulted and can be purged.
#[derive(Debug, Default)]
pub struct TokenBlacklist {
    revoked: DashMap<String, i64>,
}

impl TokenBlacklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revoke(&self, jti: impl Into<String>, expires_at: i64) {
        let jti = jti.into();
        info!(jti = %jti, expires_at, "Token revoked");
        self.revoked.insert(jti, expires_at);
    }

    pub fn is_revoked(&self, jti: &str, now: i64) -> bool {
        self.revoked
            .get(jti)
            .is_some_and(|expires_at| *expires_at > now)
    }

    /// Drop entries whose token has expired. Returns how many were removed.
    pub fn purge_expired(&self, now: i64) -> usize {
        let before = self.revoked.len();
        self.revoked.retain(|_, expires_at| *expires_at > now);
        let purged = before.saturating_sub(self.revoked.len());
        if purged > 0 {
            debug!(purged, "Purged expired token revocations");
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }
}
