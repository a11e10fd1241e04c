//! Heap-backed cyclic factory.

use gyre_core::AllocError;

use crate::config::CacheConfig;
use crate::factory::RecyclingFactory;
use crate::store::HeapSlots;

/// Recycling factory over heap arenas whose cursor rewinds to 0 on wrap.
///
/// ```
/// use gyre_arena::{CacheConfig, CyclicFactory};
/// use gyre_core::Shape;
///
/// let factory = CyclicFactory::new(CacheConfig::default()).unwrap();
/// let v = factory.vec3::<f32>();
/// v.copy_from_slice(&[1.0, 2.0, 3.0]);
/// assert_eq!(v.get(2), 3.0);
/// assert_eq!(factory.next::<f64>(Shape::Mat4).unwrap().len(), 16);
/// ```
pub type CyclicFactory = RecyclingFactory<HeapSlots>;

impl RecyclingFactory<HeapSlots> {
    /// Build a cyclic factory sized by `config`.
    ///
    /// Fails only with [`AllocError::InvalidCacheSize`].
    pub fn new(config: CacheConfig) -> Result<Self, AllocError> {
        Self::build(config)
    }
}
