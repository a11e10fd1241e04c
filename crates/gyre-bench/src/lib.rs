//! Benchmark workloads for the Gyre aggregate allocators.
//!
//! - [`SHAPE_MIX`]: the shape sequence a typical transform pipeline issues
//! - [`drive_mix`]: one pass of that sequence against any recycling factory
//! - [`bench_config`]: the cache budget every benchmark uses

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use gyre_arena::{CacheConfig, RecyclingFactory, SlotFamily};
use gyre_core::{Scalar, Shape};

/// Shapes issued per pass of the mixed workload: a few vectors feeding a
/// transform matrix, plus one dynamically sized vector.
pub const SHAPE_MIX: [Shape; 8] = [
    Shape::Vec3,
    Shape::Vec3,
    Shape::Vec4,
    Shape::Mat4,
    Shape::Mat3,
    Shape::Vec2,
    Shape::VecN(8),
    Shape::Vec4,
];

/// The default 16 KiB budget.
pub fn bench_config() -> CacheConfig {
    CacheConfig::default()
}

/// Issue every shape in [`SHAPE_MIX`] once, writing one element of each,
/// and return the sum of the offsets so the work cannot be optimised out.
pub fn drive_mix<T: Scalar, S: SlotFamily>(factory: &RecyclingFactory<S>) -> usize {
    let mut checksum = 0;
    for shape in SHAPE_MIX {
        if let Ok(view) = factory.next::<T>(shape) {
            view.set(0, T::ZERO);
            checksum += view.offset();
        }
    }
    checksum
}
