//! Strongly-typed identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`FactoryId`] allocation.
static FACTORY_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Counter for unique [`ThreadKey`] allocation.
static THREAD_KEY_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per-instance identifier for a factory.
///
/// Allocated from a monotonic atomic counter via [`FactoryId::next`].
/// A factory keeps its id for its whole life, including when a thread
/// pool reassigns it from a dead thread to a new one, so the id is how
/// tests and diagnostics observe reuse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactoryId(u64);

impl FactoryId {
    /// Allocate a fresh, unique factory id. Thread-safe.
    pub fn next() -> Self {
        Self(FACTORY_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FactoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identity of an application thread as seen by a thread pool.
///
/// Unlike OS thread ids, keys are never reused within a process: a
/// thread that exits and a thread spawned later always get distinct keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadKey(u64);

impl ThreadKey {
    /// Allocate a fresh, unique key. Thread-safe.
    pub fn next() -> Self {
        Self(THREAD_KEY_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
