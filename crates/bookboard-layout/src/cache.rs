#![forbid(unsafe_code)]

//! Stacking cache for memoizing committed lane packings.
//!
//! This module provides [`StackingCache`] which caches [`PackingResult`]s per
//! lane and visible window, so unchanged lanes are not re-packed every frame.
//!
//! # Usage
//!
//! ```ignore
//! use bookboard_layout::{StackingCache, pack_lane};
//!
//! let mut cache = StackingCache::new(256);
//! let packing = cache.get_or_compute(&lane, window.key(), || {
//!     pack_lane(store.intervals_in_lane(&lane, &window), None, &window, &scale, &config)
//! });
//! ```
//!
//! # Invalidation
//!
//! Invalidation is explicit and caller-driven. There is no TTL and no
//! implicit expiry.
//!
//! ```ignore
//! match change {
//!     // Every mutation path invalidates each lane it touches.
//!     Change::Moved { from, to } => {
//!         cache.invalidate(&from);
//!         cache.invalidate(&to);
//!     }
//!     // Zoom is not part of the key, so it must clear everything.
//!     Change::Zoom(_) => cache.invalidate_all(),
//!     // The window is part of the key; panning needs no invalidation.
//!     Change::Pan(_) => {}
//! }
//! ```
//!
//! # Committed only
//!
//! Drag previews never pass through this cache. A result stored here was
//! always computed from committed records, so a lookup can never hand back
//! speculative geometry.
//!
//! # Cache Eviction
//!
//! When at capacity, the least-accessed entry is evicted.

use bookboard_core::{LaneId, WindowKey};
use rustc_hash::FxHashMap;

use crate::pack::SharedPacking;

/// Key for stacking cache lookups.
///
/// The lane id is already canonical (see [`LaneId`]), so `7` and `"7"`
/// address the same entry.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct StackingCacheKey {
    pub lane: LaneId,
    pub window: WindowKey,
}

impl StackingCacheKey {
    #[must_use]
    pub fn new(lane: impl Into<LaneId>, window: WindowKey) -> Self {
        Self {
            lane: lane.into(),
            window,
        }
    }
}

/// Cached packing with metadata for eviction.
#[derive(Clone, Debug)]
struct CachedPackingEntry {
    packing: SharedPacking,
    /// Access count for eviction.
    access_count: u32,
}

/// Statistics about stacking cache performance.
#[derive(Debug, Clone, Default)]
pub struct StackingCacheStats {
    /// Number of entries currently in the cache.
    pub entries: usize,
    /// Total cache hits since creation or last reset.
    pub hits: u64,
    /// Total cache misses since creation or last reset.
    pub misses: u64,
    /// Hit rate as a fraction (0.0 to 1.0).
    pub hit_rate: f64,
}

/// Cache for committed lane packings.
#[derive(Debug)]
pub struct StackingCache {
    entries: FxHashMap<StackingCacheKey, CachedPackingEntry>,
    max_entries: usize,
    hits: u64,
    misses: u64,
}

impl StackingCache {
    /// Create a new cache with the specified maximum capacity.
    ///
    /// A capacity of at least the number of lanes on screen avoids thrashing.
    #[inline]
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: FxHashMap::with_capacity_and_hasher(max_entries.min(1024), Default::default()),
            max_entries,
            hits: 0,
            misses: 0,
        }
    }

    /// Get the cached packing or compute and cache a new one.
    pub fn get_or_compute<F>(
        &mut self,
        lane: impl Into<LaneId>,
        window: WindowKey,
        compute: F,
    ) -> SharedPacking
    where
        F: FnOnce() -> crate::pack::PackingResult,
    {
        let key = StackingCacheKey::new(lane, window);

        if let Some(entry) = self.entries.get_mut(&key) {
            self.hits += 1;
            entry.access_count = entry.access_count.saturating_add(1);
            return entry.packing.clone();
        }

        self.misses += 1;
        let packing = SharedPacking::new(compute());

        if self.entries.len() >= self.max_entries {
            self.evict_least_used();
        }

        self.entries.insert(
            key,
            CachedPackingEntry {
                packing: packing.clone(),
                access_count: 1,
            },
        );

        packing
    }

    /// Look up a packing without computing on miss. Does not touch stats.
    #[must_use]
    pub fn peek(&self, lane: impl Into<LaneId>, window: WindowKey) -> Option<SharedPacking> {
        self.entries
            .get(&StackingCacheKey::new(lane, window))
            .map(|e| e.packing.clone())
    }

    /// Whether an entry exists for this lane and window.
    #[must_use]
    pub fn contains(&self, lane: impl Into<LaneId>, window: WindowKey) -> bool {
        self.entries
            .contains_key(&StackingCacheKey::new(lane, window))
    }

    /// Remove every entry for `lane`, across all windows.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate(&mut self, lane: impl Into<LaneId>) -> usize {
        let lane = lane.into();
        let before = self.entries.len();
        self.entries.retain(|key, _| key.lane != lane);
        let removed = before - self.entries.len();
        tracing::debug!(
            target: "bookboard.layout",
            lane = %lane,
            removed,
            "stacking cache lane invalidated"
        );
        removed
    }

    /// Remove every entry.
    ///
    /// Required after zoom or any change to packing metrics, since neither
    /// is part of the key.
    pub fn invalidate_all(&mut self) {
        let removed = self.entries.len();
        self.entries.clear();
        tracing::debug!(
            target: "bookboard.layout",
            removed,
            "stacking cache cleared"
        );
    }

    /// Get current cache statistics.
    pub fn stats(&self) -> StackingCacheStats {
        let total = self.hits + self.misses;
        StackingCacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            hit_rate: if total > 0 {
                self.hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    /// Reset statistics counters to zero.
    #[inline]
    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
    }

    /// Returns the current number of entries in the cache.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the maximum capacity of the cache.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    fn evict_least_used(&mut self) {
        if let Some(key) = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.access_count)
            .map(|(k, _)| k.clone())
        {
            self.entries.remove(&key);
        }
    }
}

impl Default for StackingCache {
    /// Creates a cache with default capacity of 256 entries.
    fn default() -> Self {
        Self::new(256)
    }
}
