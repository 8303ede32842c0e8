//! TTL cache for computed dashboard snapshots.
//!
//! Entries are keyed by consumer role plus a location bucket and checked
//! against wall-clock age on every read; an entry older than the TTL is
//! treated as absent. Reads never extend an entry's life. Expired entries
//! are dropped lazily on read or in bulk by [`SnapshotCache::sweep`],
//! which the background refresh loop calls once per tick.
//!
//! There is no de-duplication of concurrent misses: two requests racing
//! on the same key both recompute and the last write wins, which is safe
//! because snapshot computation is idempotent.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use safewatch_metrics_models::MetricsSnapshot;
use safewatch_report_models::{ConsumerRole, GeoPoint};

/// Default entry lifetime in milliseconds.
pub const DEFAULT_TTL_MS: i64 = 60_000;

struct CacheEntry {
    snapshot: Arc<MetricsSnapshot>,
    cached_at: DateTime<Utc>,
}

/// In-process snapshot cache shared between request handlers and the
/// refresh loop.
pub struct SnapshotCache {
    entries: RwLock<BTreeMap<String, CacheEntry>>,
    ttl: Duration,
}

impl SnapshotCache {
    /// Creates a cache whose entries expire after `ttl_ms` milliseconds.
    ///
    /// Non-positive values fall back to [`DEFAULT_TTL_MS`].
    #[must_use]
    pub fn new(ttl_ms: i64) -> Self {
        let ttl_ms = if ttl_ms > 0 { ttl_ms } else { DEFAULT_TTL_MS };
        Self {
            entries: RwLock::new(BTreeMap::new()),
            ttl: Duration::try_milliseconds(ttl_ms).unwrap_or_else(|| {
                Duration::try_milliseconds(DEFAULT_TTL_MS).expect("constant fits in Duration")
            }),
        }
    }

    /// Derives the cache key for a role and optional location.
    ///
    /// Locations are bucketed to 2 decimal places so nearby requests share
    /// an entry; no location maps to the `global` bucket.
    #[must_use]
    pub fn key(role: ConsumerRole, location: Option<GeoPoint>) -> String {
        location.map_or_else(
            || format!("{role}:global"),
            |point| format!("{role}:{:.2}_{:.2}", point.latitude, point.longitude),
        )
    }

    /// Returns the cached snapshot for the key, unless it has expired.
    #[must_use]
    pub fn get(&self, role: ConsumerRole, location: Option<GeoPoint>) -> Option<Arc<MetricsSnapshot>> {
        self.get_at(role, location, Utc::now())
    }

    /// [`Self::get`] against an explicit clock, so expiry is testable
    /// without sleeping.
    pub(crate) fn get_at(
        &self,
        role: ConsumerRole,
        location: Option<GeoPoint>,
        now: DateTime<Utc>,
    ) -> Option<Arc<MetricsSnapshot>> {
        let key = Self::key(role, location);
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(&key)?;
        if now - entry.cached_at > self.ttl {
            return None;
        }
        Some(Arc::clone(&entry.snapshot))
    }

    /// Stores a snapshot under the key, replacing any previous entry.
    pub fn put(&self, role: ConsumerRole, location: Option<GeoPoint>, snapshot: Arc<MetricsSnapshot>) {
        self.put_at(role, location, snapshot, Utc::now());
    }

    /// [`Self::put`] against an explicit clock.
    pub(crate) fn put_at(
        &self,
        role: ConsumerRole,
        location: Option<GeoPoint>,
        snapshot: Arc<MetricsSnapshot>,
        now: DateTime<Utc>,
    ) {
        let key = Self::key(role, location);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                key,
                CacheEntry {
                    snapshot,
                    cached_at: now,
                },
            );
    }

    /// Drops every expired entry. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    pub(crate) fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| now - entry.cached_at <= self.ttl);
        before - entries.len()
    }

    /// Drops every entry, expired or not. The administrative reset;
    /// takes effect before the next request.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of entries currently held, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache holds no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_MS)
    }
}
