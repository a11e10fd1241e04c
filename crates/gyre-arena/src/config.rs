//! Cache budget configuration.

use gyre_core::{AllocError, Precision, ShapeKind};

/// Construction-time sizing for a factory.
///
/// A single number, the cache budget in KiB, determines both the arena
/// capacity and every ring length. Per precision, the arena holds
/// `budget / element_width` elements and each fixed-shape ring holds
/// `capacity / shape_len` views, so one full pass of any ring consumes
/// exactly one pass of the arena. Validated at construction; immutable
/// afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// Cache budget per precision in KiB.
    ///
    /// Default: 16. Must be in `1..=MAX_CACHE_KB`.
    pub cache_kb: u32,
}

impl CacheConfig {
    /// Default cache budget in KiB.
    pub const DEFAULT_CACHE_KB: u32 = 16;

    /// Largest accepted cache budget in KiB (16 MiB).
    pub const MAX_CACHE_KB: u32 = 16 * 1024;

    /// Ring length for the N-ary vector and matrix families.
    pub const NARY_RING_LEN: usize = 64;

    /// Create a config with the given budget. Call [`validate`](Self::validate)
    /// (factories do) before relying on the derived sizes.
    pub fn new(cache_kb: u32) -> Self {
        Self { cache_kb }
    }

    /// Check that the budget is in range.
    pub fn validate(&self) -> Result<(), AllocError> {
        if self.cache_kb == 0 || self.cache_kb > Self::MAX_CACHE_KB {
            return Err(AllocError::InvalidCacheSize {
                kilobytes: self.cache_kb,
            });
        }
        Ok(())
    }

    /// Total budget in bytes per precision.
    pub fn budget_bytes(&self) -> usize {
        self.cache_kb as usize * 1024
    }

    /// Arena capacity in elements for `precision`.
    pub fn arena_capacity(&self, precision: Precision) -> usize {
        self.budget_bytes() / precision.byte_width()
    }

    /// Number of views in the ring for `kind` at `precision`.
    ///
    /// Fixed shapes get `capacity / shape_len` (at least one); N-ary
    /// families get [`NARY_RING_LEN`](Self::NARY_RING_LEN).
    pub fn ring_len(&self, kind: ShapeKind, precision: Precision) -> usize {
        match kind.fixed_shape() {
            Some(shape) => (self.arena_capacity(precision) / shape.len()).max(1),
            None => Self::NARY_RING_LEN,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CACHE_KB)
    }
}
