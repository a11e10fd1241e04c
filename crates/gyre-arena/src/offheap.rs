//! Off-heap recycling factory.
//!
//! Same contract as [`CyclicFactory`](crate::CyclicFactory), but both arena
//! buffers come straight from the global allocator and every cached view
//! lives in its own [`OffHeap`](crate::OffHeap) allocation. Nothing here
//! is reclaimed by the heap's usual owners: the factory frees every raw
//! allocation exactly once, either in [`free`](RecyclingFactory::free) or
//! on drop.

use gyre_core::AllocError;

use crate::config::CacheConfig;
use crate::factory::RecyclingFactory;
use crate::store::OffHeapSlots;

/// Recycling factory over raw allocations, wrapping its cursor by
/// reserving the first block.
pub type OffHeapFactory = RecyclingFactory<OffHeapSlots>;

impl RecyclingFactory<OffHeapSlots> {
    /// Build an off-heap factory sized by `config`.
    ///
    /// If any raw allocation fails, everything allocated so far is freed
    /// and [`AllocError::AllocationFailed`] is returned.
    pub fn new(config: CacheConfig) -> Result<Self, AllocError> {
        let factory = Self::build(config)?;
        tracing::debug!(
            factory = %factory.id(),
            allocations = factory.allocation_count(),
            bytes = factory.memory_bytes(),
            "off-heap storage reserved"
        );
        Ok(factory)
    }

    /// Number of raw allocations this factory owns: two arena buffers plus
    /// one per cached view.
    pub fn allocation_count(&self) -> usize {
        2 + self.stores().slot_count()
    }

    /// Release every raw allocation now and report how many there were.
    ///
    /// Consuming `self` makes a second call, or any use afterwards, a
    /// compile error.
    pub fn free(self) -> usize {
        let released = self.allocation_count();
        tracing::debug!(
            factory = %self.id(),
            allocations = released,
            bytes = self.memory_bytes(),
            "off-heap factory freed"
        );
        drop(self);
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gyre_core::{AggregateFactory, Precision, Shape, ShapeKind};

    fn small() -> OffHeapFactory {
        OffHeapFactory::new(CacheConfig::new(1)).unwrap()
    }

    #[test]
    fn counts_every_raw_allocation() {
        let factory = small();
        let views: usize = Precision::ALL
            .iter()
            .flat_map(|&p| ShapeKind::ALL.iter().map(move |&k| (k, p)))
            .map(|(kind, precision)| factory.ring_len(kind, precision))
            .sum();
        assert_eq!(factory.allocation_count(), views + 2);
        assert_eq!(factory.free(), views + 2);
    }

    #[test]
    fn wrap_places_block_at_zero() {
        let factory = small();
        let capacity = factory.capacity(Precision::Double);
        for _ in 0..capacity / 16 {
            factory.mat4::<f64>();
        }
        assert_eq!(factory.mat4::<f64>().offset(), 0);
        assert_eq!(factory.cursor(Precision::Double), 16);
    }

    #[test]
    fn values_survive_until_overrun() {
        let factory = small();
        let v = factory.vec4::<f32>();
        v.copy_from_slice(&[1.0, -1.0, 0.5, 8.0]);
        factory.mat3::<f32>().fill(3.0);
        assert_eq!(v.to_vec(), vec![1.0, -1.0, 0.5, 8.0]);
    }

    #[test]
    fn strategy_name_and_nary() {
        let factory = small();
        assert_eq!(factory.strategy_name(), "off-heap");
        assert_eq!(factory.vec_n::<f32>(9).unwrap().shape(), Shape::VecN(9));
    }

    #[test]
    fn invalid_budget_allocates_nothing() {
        assert_eq!(
            OffHeapFactory::new(CacheConfig::new(CacheConfig::MAX_CACHE_KB + 1)).unwrap_err(),
            AllocError::InvalidCacheSize {
                kilobytes: CacheConfig::MAX_CACHE_KB + 1
            }
        );
    }

    #[test]
    fn factory_moves_across_threads() {
        let factory = small();
        factory.vec2::<f64>().copy_from_slice(&[4.0, 5.0]);
        let cursor = std::thread::spawn(move || {
            let view = factory.vec2::<f64>();
            view.fill(1.0);
            factory.cursor(Precision::Double)
        })
        .join()
        .unwrap();
        assert_eq!(cursor, 4);
    }
}
