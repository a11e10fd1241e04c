//! The recycling factory shared by the cyclic and off-heap strategies.
//!
//! A [`RecyclingFactory`] pairs one [`DualStore`] with an identity and its
//! config. `next` is a ring step, an arena bump and a remap: O(1), no
//! allocation, deterministic order. The two strategies differ only in
//! their [`SlotFamily`]; see [`CyclicFactory`](crate::CyclicFactory) and
//! [`OffHeapFactory`](crate::OffHeapFactory).
//!
//! Factories are `Send` but not `Sync`. Views borrow the factory, so none
//! can outlive it.

use std::fmt;

use gyre_core::{
    AggregateFactory, AllocError, FactoryId, Precision, Scalar, Shape, ShapeKind,
};

use crate::config::CacheConfig;
use crate::store::{DualStore, SlotFamily, StoreMark};
use crate::view::MappedView;

/// Arena cursors and ring positions captured by
/// [`RecyclingFactory::save_point`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavePoint {
    factory: FactoryId,
    marks: [StoreMark; 2],
}

impl SavePoint {
    /// The factory this save point belongs to.
    pub fn factory(&self) -> FactoryId {
        self.factory
    }
}

/// Hands out recycled [`MappedView`]s from per-precision arenas.
pub struct RecyclingFactory<F: SlotFamily> {
    id: FactoryId,
    config: CacheConfig,
    stores: DualStore<F>,
}

impl<F: SlotFamily> RecyclingFactory<F> {
    pub(crate) fn build(config: CacheConfig) -> Result<Self, AllocError> {
        config.validate()?;
        let stores = DualStore::new(&config)?;
        let id = FactoryId::next();
        tracing::debug!(
            factory = %id,
            strategy = F::NAME,
            cache_kb = config.cache_kb,
            single_capacity = stores.capacity(Precision::Single),
            double_capacity = stores.capacity(Precision::Double),
            views = stores.slot_count(),
            "factory created"
        );
        Ok(Self { id, config, stores })
    }

    /// The next view for `shape` at precision `T`.
    ///
    /// Contents are whatever a previous cycle left behind. Fails only for
    /// N-ary shapes larger than the arena.
    #[inline]
    pub fn next<T: Scalar>(&self, shape: Shape) -> Result<&MappedView<T>, AllocError> {
        T::pick(&self.stores).next(shape)
    }

    /// Next two-component vector.
    #[inline]
    pub fn vec2<T: Scalar>(&self) -> &MappedView<T> {
        T::pick(&self.stores).issue(Shape::Vec2)
    }

    /// Next three-component vector.
    #[inline]
    pub fn vec3<T: Scalar>(&self) -> &MappedView<T> {
        T::pick(&self.stores).issue(Shape::Vec3)
    }

    /// Next four-component vector.
    #[inline]
    pub fn vec4<T: Scalar>(&self) -> &MappedView<T> {
        T::pick(&self.stores).issue(Shape::Vec4)
    }

    /// Next 2×2 matrix.
    #[inline]
    pub fn mat2<T: Scalar>(&self) -> &MappedView<T> {
        T::pick(&self.stores).issue(Shape::Mat2)
    }

    /// Next 3×3 matrix.
    #[inline]
    pub fn mat3<T: Scalar>(&self) -> &MappedView<T> {
        T::pick(&self.stores).issue(Shape::Mat3)
    }

    /// Next 4×4 matrix.
    #[inline]
    pub fn mat4<T: Scalar>(&self) -> &MappedView<T> {
        T::pick(&self.stores).issue(Shape::Mat4)
    }

    /// Next `n`-component vector.
    pub fn vec_n<T: Scalar>(&self, n: u32) -> Result<&MappedView<T>, AllocError> {
        self.next(Shape::VecN(n))
    }

    /// Next `n`×`n` matrix.
    pub fn mat_n<T: Scalar>(&self, n: u32) -> Result<&MappedView<T>, AllocError> {
        self.next(Shape::MatN(n))
    }

    /// Capture both arena cursors and every ring position.
    pub fn save_point(&self) -> SavePoint {
        SavePoint {
            factory: self.id,
            marks: self.stores.mark(),
        }
    }

    /// Rewind to `point`. Views issued since then will be handed out again.
    ///
    /// # Panics
    ///
    /// Panics if `point` was taken on a different factory.
    pub fn restore(&self, point: SavePoint) {
        assert_eq!(
            point.factory, self.id,
            "save point from factory {} restored on factory {}",
            point.factory, self.id
        );
        self.stores.rewind(&point.marks);
    }

    /// Run `body` and rewind everything it allocated afterwards.
    ///
    /// Views issued inside the scope stay readable afterwards, but their
    /// slots and arena range are handed out again by the next calls.
    pub fn scoped<R>(&self, body: impl FnOnce(&Self) -> R) -> R {
        let point = self.save_point();
        let result = body(self);
        self.restore(point);
        result
    }

    /// Unique identity of this factory.
    pub fn id(&self) -> FactoryId {
        self.id
    }

    /// The config it was built from.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Arena cursor for `precision`, in elements.
    pub fn cursor(&self, precision: Precision) -> usize {
        self.stores.cursor(precision)
    }

    /// Arena capacity for `precision`, in elements.
    pub fn capacity(&self, precision: Precision) -> usize {
        self.stores.capacity(precision)
    }

    /// Ring length for `kind` at `precision`.
    pub fn ring_len(&self, kind: ShapeKind, precision: Precision) -> usize {
        self.stores.ring_len(kind, precision)
    }

    /// Arena storage across both precisions, in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.stores.memory_bytes()
    }

    pub(crate) fn stores(&self) -> &DualStore<F> {
        &self.stores
    }
}

impl<F: SlotFamily> AggregateFactory for RecyclingFactory<F> {
    type View<'a, T: Scalar> = &'a MappedView<T> where Self: 'a;

    fn strategy_name(&self) -> &'static str {
        F::NAME
    }

    fn next<T: Scalar>(&self, shape: Shape) -> Result<&MappedView<T>, AllocError> {
        RecyclingFactory::<F>::next::<T>(self, shape)
    }
}

impl<F: SlotFamily> fmt::Debug for RecyclingFactory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecyclingFactory")
            .field("strategy", &F::NAME)
            .field("id", &self.id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
