//! Recycling arena factories for Gyre aggregates.
//!
//! Hands out fixed-shape vectors and matrices at very high rates without
//! allocating per call. Each factory owns one arena per precision and a
//! ring of pre-built views per shape family; obtaining an aggregate remaps
//! the next view in the ring onto the next arena range.
//!
//! # Architecture
//!
//! ```text
//! RecyclingFactory<F: SlotFamily>   (CyclicFactory / OffHeapFactory)
//! ├── FactoryId + CacheConfig
//! └── DualStore<F>
//!     ├── PrecisionStore<f32, F>
//!     │   ├── Arena<f32> (RawBuffer + wrapping cursor)
//!     │   └── SlotRing<F::Slot<f32>> × 8 (one per ShapeKind)
//!     │       └── MappedView<f32> (ElementPtr + offset + shape + saved offsets)
//!     └── PrecisionStore<f64, F>
//!         └── ...
//!
//! StaticFactory → OwnedAggregate<T> (fresh Box<[T]> per call)
//! ```
//!
//! # Aliasing
//!
//! A ring holds exactly enough views to cover one pass of its arena. A
//! caller that keeps more than that many views of one shape alive will
//! find the oldest ones remapped and their contents overwritten. This is
//! not detected. Use [`MappedView::detach`] or the [`StaticFactory`] for
//! values that must persist.
//!
//! # Safety
//!
//! All `unsafe` lives in the private `raw` module. Views are lent out as
//! `&MappedView<T>` borrowed from the factory, so no view outlives the
//! arena it points into. Factories are `Send` and `!Sync`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod arena;
pub mod config;
pub mod cyclic;
pub mod factory;
pub mod offheap;
pub mod owned;
mod raw;
pub mod ring;
pub mod static_factory;
pub mod store;
pub mod view;

pub use arena::{Arena, WrapMode};
pub use config::CacheConfig;
pub use cyclic::CyclicFactory;
pub use factory::{RecyclingFactory, SavePoint};
pub use offheap::OffHeapFactory;
pub use owned::OwnedAggregate;
pub use raw::{Backing, OffHeap, RawBuffer};
pub use ring::SlotRing;
pub use static_factory::StaticFactory;
pub use store::{DualStore, HeapSlots, OffHeapSlots, PrecisionStore, SlotFamily, StoreMark};
pub use view::{MappedView, ViewWindow};
