//! Pool occupancy and lifecycle counters.
//!
//! [`PoolStats`] is a point-in-time snapshot; the counters behind it are
//! cumulative for the life of the pool.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot returned by [`ThreadPoolFactory::stats`](crate::ThreadPoolFactory::stats).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Entries currently mapped to a thread.
    pub live: usize,
    /// Entries reclaimed from dead or detached threads, waiting for reuse.
    pub free: usize,
    /// Cumulative number of factories built.
    pub created: u64,
    /// Cumulative number of free entries handed to a new thread.
    pub reassigned: u64,
    /// Cumulative number of sweeps.
    pub sweeps: u64,
    /// Cumulative number of entries moved to the free list.
    pub reclaimed: u64,
}

/// Live counters updated on the miss path only.
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub created: AtomicU64,
    pub reassigned: AtomicU64,
    pub sweeps: AtomicU64,
    pub reclaimed: AtomicU64,
}

impl PoolCounters {
    pub fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    pub fn snapshot(&self, live: usize, free: usize) -> PoolStats {
        PoolStats {
            live,
            free,
            created: self.created.load(Ordering::Relaxed),
            reassigned: self.reassigned.load(Ordering::Relaxed),
            sweeps: self.sweeps.load(Ordering::Relaxed),
            reclaimed: self.reclaimed.load(Ordering::Relaxed),
        }
    }
}
