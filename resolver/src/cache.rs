//! TTL cache of filtered resolutions, owned by one [`crate::ConfigResolver`].

use parking_lot::RwLock;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::request::LevelAddress;
use crate::resolver::ResolvedConfig;

/// Default lifetime of a cached resolution.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Clone, Debug)]
struct CacheEntry {
    config: Arc<ResolvedConfig>,
    tenant: Option<String>,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(config: Arc<ResolvedConfig>, tenant: Option<String>, ttl: Duration) -> Self {
        Self {
            config,
            tenant,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
}

/// Cache key for an address and the viewer it was filtered for.
///
/// Absent levels hash as the name of the level above them; the deepest
/// level is mixed in so a tenant slug can never impersonate a placeholder.
pub fn cache_key(address: &LevelAddress) -> String {
    let mut hasher = Sha256::new();
    hasher.update(address.deepest().to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(address.tenant.as_deref().unwrap_or("platform").as_bytes());
    hasher.update(b"|");
    hasher.update(address.organization.as_deref().unwrap_or("tenant").as_bytes());
    hasher.update(b"|");
    hasher.update(address.role.map_or("org", |r| r.as_str()).as_bytes());
    hasher.update(b"|");
    hasher.update(address.viewer.role.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(address.viewer.scope.to_string().as_bytes());
    format!("config:{}", hex::encode(hasher.finalize()))
}

#[derive(Debug)]
pub struct ConfigCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
}

impl Default for ConfigCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ConfigCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expired: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// A fresh entry, or `None`. An expired entry is dropped on the way.
    pub fn get(&self, key: &str) -> Option<Arc<ResolvedConfig>> {
        let stale = {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if entry.is_valid() => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(Arc::clone(&entry.config));
                }
                Some(_) => true,
                None => false,
            }
        };

        if stale {
            let mut entries = self.entries.write();
            if entries.get(key).is_some_and(|e| !e.is_valid()) {
                entries.remove(key);
                self.expired.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn insert(&self, key: String, tenant: Option<String>, config: Arc<ResolvedConfig>) {
        let mut entries = self.entries.write();
        entries.insert(key, CacheEntry::new(config, tenant, self.ttl));
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write();
        entries.clear();
    }

    /// Drop every entry resolved for `tenant`. Returns how many were dropped.
    pub fn invalidate_tenant(&self, tenant: &str) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.tenant.as_deref() != Some(tenant));
        before - entries.len()
    }

    pub fn evict_expired(&self) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_valid());
        let evicted = before - entries.len();
        self.expired.fetch_add(evicted as u64, Ordering::Relaxed);
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
        }
    }
}
