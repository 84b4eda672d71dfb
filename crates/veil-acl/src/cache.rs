//! Short-lived memoization of permission decisions.
//!
//! Entries are keyed by `(kind, identity, user)` and expire after the
//! configured TTL. Concurrent fills may race; the worst case is a redundant
//! evaluation or a decision that is stale for at most one TTL window.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use veil_core::{Clock, Decision, DocKind, RecordId, SystemClock};

/// Size at which [`PermissionCache::insert`] sweeps expired entries.
pub const PURGE_THRESHOLD: usize = 1024;

/// Key of a memoized decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    kind: DocKind,
    id: RecordId,
    user: String,
}

impl CacheKey {
    /// Build a key for a principal's view of one record.
    pub fn new(kind: DocKind, id: RecordId, user: impl Into<String>) -> Self {
        Self {
            kind,
            id,
            user: user.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    decision: Decision,
    stored_at: DateTime<Utc>,
}

/// TTL cache of permission decisions.
pub struct PermissionCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl PermissionCache {
    /// Create a cache with the given TTL in seconds and time source.
    pub fn new(ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Duration::seconds(ttl_secs.min(u64::from(u32::MAX)) as i64),
            clock,
        }
    }

    /// Create a cache on wall-clock time.
    pub fn with_system_clock(ttl_secs: u64) -> Self {
        Self::new(ttl_secs, Arc::new(SystemClock))
    }

    /// A live decision for `key`. An expired entry is a miss and is dropped.
    pub fn get(&self, key: &CacheKey) -> Option<Decision> {
        let now = self.clock.now();
        {
            let entries = self.entries.read().ok()?;
            let entry = entries.get(key)?;
            if now - entry.stored_at < self.ttl {
                return Some(entry.decision);
            }
        }
        if let Ok(mut entries) = self.entries.write() {
            // Another thread may have refilled the slot since the read.
            if entries
                .get(key)
                .is_some_and(|e| now - e.stored_at >= self.ttl)
            {
                entries.remove(key);
            }
        }
        None
    }

    /// Memoize a decision. Past [`PURGE_THRESHOLD`] entries, expired ones are
    /// swept first.
    pub fn insert(&self, key: CacheKey, decision: Decision) {
        if self.ttl <= Duration::zero() {
            return;
        }
        let stored_at = self.clock.now();
        if let Ok(mut entries) = self.entries.write() {
            if entries.len() >= PURGE_THRESHOLD {
                let ttl = self.ttl;
                entries.retain(|_, e| stored_at - e.stored_at < ttl);
            }
            entries.insert(
                key,
                CacheEntry {
                    decision,
                    stored_at,
                },
            );
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
        log::debug!("Permission cache cleared");
    }

    /// Drop expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let ttl = self.ttl;
        match self.entries.write() {
            Ok(mut entries) => {
                let before = entries.len();
                entries.retain(|_, e| now - e.stored_at < ttl);
                before - entries.len()
            }
            Err(_) => 0,
        }
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for PermissionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionCache")
            .field("entries", &self.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}
