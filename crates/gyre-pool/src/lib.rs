//! Thread pooling for Gyre factories.
//!
//! Cyclic and off-heap factories are deliberately unsynchronized. This
//! crate makes them usable from many threads at once by giving each live
//! thread its own factory and recycling the factories of threads that
//! have exited.
//!
//! # Architecture
//!
//! ```text
//! ThreadPoolFactory<F>
//! ├── builder: Fn() -> Result<F, AllocError>
//! ├── registry: RwLock<IndexMap<ThreadKey, Slot>>   (read-mostly)
//! │   └── Slot { Arc<CachePadded<Entry>>, thread liveness flag }
//! │       └── Entry { FactoryId, Mutex<F> (uncontended), assignments }
//! ├── free list: Mutex<Vec<Entry>>
//! └── sweep lock: Mutex<()>                          (miss path only)
//! ```
//!
//! Thread liveness comes from a thread-local token whose destructor
//! clears a shared flag. No polling of OS thread state is involved.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod metrics;
pub mod pool;
pub mod token;

pub use metrics::PoolStats;
pub use pool::{Poolable, ThreadPoolFactory};
pub use token::current_key;
