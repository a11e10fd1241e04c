//! Per-thread factory pool.
//!
//! [`ThreadPoolFactory`] hands each live thread a private factory. The
//! hot path is one shared read of the registry and an uncontended lock
//! of the thread's own entry. Only a thread's first call (a miss) takes
//! the coarse sweep lock: it moves entries owned by exited threads onto
//! the free list, then reuses one of those before building anything new.
//!
//! Entry lifecycle:
//!
//! ```text
//! unassigned ──build──▶ active ──thread exit / detach──▶ reclaimed
//!                         ▲                                 │
//!                         └────────────reassign─────────────┘
//! ```
//!
//! A reassigned entry keeps its factory as-is; arena cursors and ring
//! positions carry over to the new owner.
//!
//! A call made from a thread-local destructor, after the thread's token
//! is gone, borrows an entry that is never registered and goes back on
//! the free list when the call returns. No sweep can see it meanwhile.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_utils::{Backoff, CachePadded};
use gyre_arena::{CacheConfig, CyclicFactory, OffHeapFactory, RecyclingFactory, SlotFamily};
use gyre_core::{AllocError, FactoryId, ThreadKey};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};

use crate::metrics::{PoolCounters, PoolStats};
use crate::token;

/// A factory that can be driven from a pool entry.
pub trait Poolable: Send + 'static {
    /// Stable identity, kept across reassignment.
    fn factory_id(&self) -> FactoryId;
}

impl<S> Poolable for RecyclingFactory<S>
where
    S: SlotFamily + 'static,
    RecyclingFactory<S>: Send,
{
    fn factory_id(&self) -> FactoryId {
        self.id()
    }
}

type Builder<F> = Box<dyn Fn() -> Result<F, AllocError> + Send + Sync>;

/// One pooled factory. Padded so neighbouring entries' lock words do not
/// share a cache line.
struct Entry<F> {
    id: FactoryId,
    factory: Mutex<F>,
    assignments: AtomicU64,
}

type SharedEntry<F> = Arc<CachePadded<Entry<F>>>;

struct Slot<F> {
    entry: SharedEntry<F>,
    alive: Arc<AtomicBool>,
}

/// Maps each live thread to a private factory of type `F`.
///
/// `Send + Sync`; share it by reference or in an `Arc`.
///
/// ```
/// use gyre_arena::CacheConfig;
/// use gyre_pool::ThreadPoolFactory;
///
/// let pool = ThreadPoolFactory::cyclic(CacheConfig::default()).unwrap();
/// let sum = pool
///     .with(|factory| {
///         let v = factory.vec3::<f32>();
///         v.copy_from_slice(&[1.0, 2.0, 3.0]);
///         v.to_vec().iter().sum::<f32>()
///     })
///     .unwrap();
/// assert_eq!(sum, 6.0);
/// ```
pub struct ThreadPoolFactory<F> {
    builder: Builder<F>,
    registry: RwLock<IndexMap<ThreadKey, Slot<F>>>,
    free: Mutex<Vec<SharedEntry<F>>>,
    sweep_lock: Mutex<()>,
    counters: PoolCounters,
}

impl<F: Poolable> ThreadPoolFactory<F> {
    /// A pool that builds factories with `builder` on demand.
    ///
    /// `builder` runs on the miss path of the thread that needs a factory,
    /// under the pool's sweep lock.
    pub fn new(builder: impl Fn() -> Result<F, AllocError> + Send + Sync + 'static) -> Self {
        Self {
            builder: Box::new(builder),
            registry: RwLock::new(IndexMap::new()),
            free: Mutex::new(Vec::new()),
            sweep_lock: Mutex::new(()),
            counters: PoolCounters::default(),
        }
    }

    /// Run `body` against the calling thread's factory, assigning one if
    /// the thread has none yet.
    ///
    /// Fails only when a new factory has to be built and building fails.
    ///
    /// # Panics
    ///
    /// Panics if called from inside `body` on the same pool.
    pub fn with<R>(&self, body: impl FnOnce(&mut F) -> R) -> Result<R, AllocError> {
        let Some((key, alive)) = token::current() else {
            return self.with_transient(body);
        };
        let entry = match self.lookup(key) {
            Some(entry) => entry,
            None => self.assign(key, alive)?,
        };
        let Some(mut factory) = entry.factory.try_lock() else {
            panic!("ThreadPoolFactory::with re-entered on thread {key}");
        };
        Ok(body(&mut factory))
    }

    /// Release the calling thread's entry to the free list now instead of
    /// waiting for the thread to exit. Returns whether it had one.
    ///
    /// # Panics
    ///
    /// Panics if called from inside [`with`](Self::with) on the same pool.
    pub fn detach_current(&self) -> bool {
        let key = token::current_key();
        let _sweep = self.sweep_lock.lock();
        let mut registry = self.registry.write();
        let Some(slot) = registry.get(&key) else {
            return false;
        };
        assert!(
            !slot.entry.factory.is_locked(),
            "detach_current called inside ThreadPoolFactory::with"
        );
        let Some(slot) = registry.swap_remove(&key) else {
            return false;
        };
        drop(registry);
        tracing::debug!(thread = %key, factory = %slot.entry.id, "entry detached");
        self.free.lock().push(slot.entry);
        PoolCounters::bump(&self.counters.reclaimed, 1);
        true
    }

    /// Move every entry whose thread has exited to the free list. Returns
    /// how many were reclaimed.
    pub fn sweep(&self) -> usize {
        let _sweep = self.sweep_lock.lock();
        self.sweep_locked()
    }

    /// Occupancy and lifecycle counters.
    pub fn stats(&self) -> PoolStats {
        let live = self.registry.read().len();
        let free = self.free.lock().len();
        self.counters.snapshot(live, free)
    }

    /// Identity of the calling thread's factory, if it has one.
    pub fn current_entry(&self) -> Option<FactoryId> {
        self.lookup(token::current_key()).map(|entry| entry.id)
    }

    /// How many threads the calling thread's factory has been assigned
    /// to, counting this one.
    pub fn current_assignments(&self) -> Option<u64> {
        self.lookup(token::current_key())
            .map(|entry| entry.assignments.load(Ordering::Relaxed))
    }

    fn lookup(&self, key: ThreadKey) -> Option<SharedEntry<F>> {
        let backoff = Backoff::new();
        loop {
            // A sweep holds the write side only briefly.
            if let Some(registry) = self.registry.try_read() {
                return registry.get(&key).map(|slot| Arc::clone(&slot.entry));
            }
            backoff.snooze();
        }
    }

    fn assign(
        &self,
        key: ThreadKey,
        alive: Arc<AtomicBool>,
    ) -> Result<SharedEntry<F>, AllocError> {
        let _sweep = self.sweep_lock.lock();
        let entry = self.checkout()?;
        tracing::debug!(thread = %key, factory = %entry.id, "entry assigned");
        self.registry.write().insert(
            key,
            Slot {
                entry: Arc::clone(&entry),
                alive,
            },
        );
        Ok(entry)
    }

    /// Serve a call from a thread whose token is already destroyed. The
    /// entry stays out of the registry, so no sweep can reclaim it while
    /// `body` runs.
    fn with_transient<R>(&self, body: impl FnOnce(&mut F) -> R) -> Result<R, AllocError> {
        let entry = {
            let _sweep = self.sweep_lock.lock();
            self.checkout()?
        };
        tracing::debug!(factory = %entry.id, "transient entry for exiting thread");
        let result = body(&mut entry.factory.lock());
        self.free.lock().push(entry);
        Ok(result)
    }

    /// Sweep, then take a free entry or build a new one. Caller holds the
    /// sweep lock.
    fn checkout(&self) -> Result<SharedEntry<F>, AllocError> {
        self.sweep_locked();
        let reused = self.free.lock().pop();
        let entry = match reused {
            Some(entry) => {
                PoolCounters::bump(&self.counters.reassigned, 1);
                entry
            }
            None => {
                let factory = (self.builder)()?;
                PoolCounters::bump(&self.counters.created, 1);
                tracing::debug!(factory = %factory.factory_id(), "entry created");
                Arc::new(CachePadded::new(Entry {
                    id: factory.factory_id(),
                    factory: Mutex::new(factory),
                    assignments: AtomicU64::new(0),
                }))
            }
        };
        entry.assignments.fetch_add(1, Ordering::Relaxed);
        Ok(entry)
    }

    fn sweep_locked(&self) -> usize {
        let mut dead = Vec::new();
        self.registry.write().retain(|_, slot| {
            let alive = token::is_alive(&slot.alive);
            if !alive {
                dead.push(Arc::clone(&slot.entry));
            }
            alive
        });
        PoolCounters::bump(&self.counters.sweeps, 1);

        let reclaimed = dead.len();
        if reclaimed > 0 {
            let mut free = self.free.lock();
            free.extend(dead);
            PoolCounters::bump(&self.counters.reclaimed, reclaimed as u64);
            tracing::debug!(reclaimed, free = free.len(), "pool swept");
        }
        reclaimed
    }
}

impl ThreadPoolFactory<CyclicFactory> {
    /// A pool of heap-backed cyclic factories, all sized by `config`.
    pub fn cyclic(config: CacheConfig) -> Result<Self, AllocError> {
        config.validate()?;
        Ok(Self::new(move || CyclicFactory::new(config)))
    }
}

impl ThreadPoolFactory<OffHeapFactory> {
    /// A pool of off-heap factories, all sized by `config`.
    pub fn off_heap(config: CacheConfig) -> Result<Self, AllocError> {
        config.validate()?;
        Ok(Self::new(move || OffHeapFactory::new(config)))
    }
}

impl<F> fmt::Debug for ThreadPoolFactory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPoolFactory")
            .field("live", &self.registry.read().len())
            .field("free", &self.free.lock().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gyre_core::Precision;

    fn pool() -> ThreadPoolFactory<CyclicFactory> {
        ThreadPoolFactory::cyclic(CacheConfig::new(1)).unwrap()
    }

    #[test]
    fn first_call_builds_then_hits() {
        let pool = pool();
        let a = pool.with(|f| f.id()).unwrap();
        let b = pool.with(|f| f.id()).unwrap();
        assert_eq!(a, b);
        let stats = pool.stats();
        assert_eq!((stats.live, stats.created, stats.free), (1, 1, 0));
        assert_eq!(pool.current_entry(), Some(a));
    }

    #[test]
    fn state_persists_between_calls() {
        let pool = pool();
        pool.with(|f| {
            f.vec4::<f32>();
        })
        .unwrap();
        let cursor = pool.with(|f| f.cursor(Precision::Single)).unwrap();
        assert_eq!(cursor, 4);
    }

    #[test]
    fn invalid_config_rejected_up_front() {
        assert!(matches!(
            ThreadPoolFactory::off_heap(CacheConfig::new(0)),
            Err(AllocError::InvalidCacheSize { kilobytes: 0 })
        ));
    }

    #[test]
    fn builder_failure_propagates() {
        let pool: ThreadPoolFactory<CyclicFactory> =
            ThreadPoolFactory::new(|| CyclicFactory::new(CacheConfig::new(0)));
        assert!(pool.with(|_| ()).is_err());
        assert_eq!(pool.stats().live, 0);
    }

    #[test]
    #[should_panic(expected = "re-entered")]
    fn reentrant_with_panics() {
        let pool = pool();
        pool.with(|_| pool.with(|_| ()).unwrap()).unwrap();
    }

    #[test]
    fn detach_returns_entry_to_free_list() {
        let pool = pool();
        let id = pool.with(|f| f.id()).unwrap();
        assert!(pool.detach_current());
        assert!(!pool.detach_current());
        assert_eq!(pool.current_entry(), None);
        assert_eq!(pool.stats().free, 1);

        // The same thread comes back and gets its old factory again.
        assert_eq!(pool.with(|f| f.id()).unwrap(), id);
        assert_eq!(pool.current_assignments(), Some(2));
        assert_eq!(pool.stats().reassigned, 1);
    }

    #[test]
    fn exited_thread_is_swept() {
        let pool = pool();
        std::thread::scope(|s| {
            // An explicit join waits for the thread's TLS destructors.
            s.spawn(|| pool.with(|f| f.id()).unwrap()).join().unwrap();
        });
        assert_eq!(pool.stats().live, 1);
        assert_eq!(pool.sweep(), 1);
        let stats = pool.stats();
        assert_eq!((stats.live, stats.free, stats.reclaimed), (0, 1, 1));
    }

    #[test]
    fn pool_is_send_and_sync() {
        fn assert_both<T: Send + Sync>() {}
        assert_both::<ThreadPoolFactory<CyclicFactory>>();
        assert_both::<ThreadPoolFactory<OffHeapFactory>>();
    }
}
