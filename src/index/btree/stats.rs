//! Lookup statistics.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by every lookup on a [`BLinkTree`](super::BLinkTree).
///
/// All fields are atomic, so concurrent lookups update them without a lock.
///
/// # Memory Ordering
/// Every update and load uses `Ordering::Relaxed`:
/// - each counter only needs atomic increments (no lost updates)
/// - no counter is used to publish node bytes or any other data
/// - counters are read together only for reporting, where a snapshot taken
///   during lookups may mix values from slightly different moments
///
/// Once all lookups have returned (threads joined), a snapshot is exact.
///
/// # Example
/// ```
/// use blinkdb::index::btree::SearchStats;
/// use std::sync::atomic::Ordering;
///
/// let stats = SearchStats::new();
/// stats.link_follows.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(stats.snapshot().link_follows, 1);
/// ```
#[derive(Debug, Default)]
pub struct SearchStats {
    /// Lookups started.
    pub lookups: AtomicU64,

    /// Nodes fetched and examined, including link hops.
    pub nodes_visited: AtomicU64,

    /// Right-link hops taken because a split moved the key's home node.
    pub link_follows: AtomicU64,

    /// Lookups abandoned on a checksum or corruption error.
    pub corrupt_nodes: AtomicU64,
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_lookup(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_visit(&self) {
        self.nodes_visited.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_link_follow(&self) {
        self.link_follows.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_corruption(&self) {
        self.corrupt_nodes.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            lookups: self.lookups.load(Ordering::Relaxed),
            nodes_visited: self.nodes_visited.load(Ordering::Relaxed),
            link_follows: self.link_follows.load(Ordering::Relaxed),
            corrupt_nodes: self.corrupt_nodes.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.lookups.store(0, Ordering::Relaxed);
        self.nodes_visited.store(0, Ordering::Relaxed);
        self.link_follows.store(0, Ordering::Relaxed);
        self.corrupt_nodes.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`SearchStats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub lookups: u64,
    pub nodes_visited: u64,
    pub link_follows: u64,
    pub corrupt_nodes: u64,
}

impl StatsSnapshot {
    /// Average nodes examined per lookup (0.0 with no lookups).
    pub fn nodes_per_lookup(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.nodes_visited as f64 / self.lookups as f64
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ lookups: {}, nodes: {}, links: {}, corrupt: {}, nodes/lookup: {:.2} }}",
            self.lookups,
            self.nodes_visited,
            self.link_follows,
            self.corrupt_nodes,
            self.nodes_per_lookup()
        )
    }
}
