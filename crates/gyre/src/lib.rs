//! Gyre: fixed-shape vectors and matrices at allocation-free rates.
//!
//! This is the top-level facade crate that re-exports the public API of
//! the Gyre sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use gyre::prelude::*;
//!
//! let factory = CyclicFactory::new(CacheConfig::default()).unwrap();
//!
//! // Typed helpers for fixed shapes never fail.
//! let m = factory.mat2::<f64>();
//! m.copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
//! assert_eq!(m.get_at(1, 0), 3.0);
//!
//! // Temporaries inside a scope are rewound when it ends.
//! let before = factory.cursor(Precision::Single);
//! factory.scoped(|f| {
//!     f.vec4::<f32>().fill(1.0);
//! });
//! assert_eq!(factory.cursor(Precision::Single), before);
//!
//! // One private factory per thread.
//! let pool = ThreadPoolFactory::cyclic(CacheConfig::default()).unwrap();
//! let len = pool.with(|f| f.mat_n::<f32>(5).map(|v| v.len())).unwrap();
//! assert_eq!(len, Ok(25));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `gyre-core` | Shapes, precisions, ids, errors, access traits |
//! | [`arena`] | `gyre-arena` | Cyclic, off-heap and static factories; views |
//! | [`pool`] | `gyre-pool` | Per-thread factory pooling |
//! | [`context`] | this crate | [`Allocator`](context::Allocator) strategy handle |
//!
//! # Aliasing
//!
//! Recycled views are overwritten once their ring comes round again.
//! Keep at most one ring's worth of live views per shape, or detach the
//! ones that must persist.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod context;

/// Factories, views and arena storage (`gyre-arena`).
pub use gyre_arena as arena;

/// Shapes, precisions, ids, errors and the access traits (`gyre-core`).
///
/// Also home to the precision conversions in [`types::convert`].
pub use gyre_core as types;

/// Per-thread factory pooling (`gyre-pool`).
pub use gyre_pool as pool;

/// Common imports for typical Gyre usage.
///
/// ```rust
/// use gyre::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use gyre_core::convert::{narrow, widen};
    pub use gyre_core::{
        Aggregate, AggregateFactory, AllocError, ElementAccess, FactoryId, Precision, Scalar,
        Shape, ShapeKind,
    };

    // Factories and views
    pub use gyre_arena::{
        CacheConfig, CyclicFactory, MappedView, OffHeap, OffHeapFactory, OwnedAggregate,
        SavePoint, StaticFactory, ViewWindow,
    };

    // Pooling
    pub use gyre_pool::{PoolStats, ThreadPoolFactory};

    // Context
    pub use crate::context::{Allocator, AnyView};
}
