//! Explicit allocation context.
//!
//! There is no process-wide "current factory". Code that needs scratch
//! aggregates takes an [`Allocator`] argument and the caller decides which
//! strategy backs it.

use gyre_arena::{CyclicFactory, MappedView, OffHeapFactory, OwnedAggregate, StaticFactory};
use gyre_core::{Aggregate, AggregateFactory, AllocError, ElementAccess, Precision, Scalar, Shape};

/// A borrowed handle to one allocation strategy.
///
/// Cheap to copy; pass it down by value.
///
/// ```
/// use gyre::prelude::*;
///
/// fn midpoint(alloc: Allocator<'_>, a: [f32; 3], b: [f32; 3]) -> Vec<f32> {
///     let mut out = alloc.next::<f32>(Shape::Vec3).unwrap();
///     for i in 0..3 {
///         out.set(i, (a[i] + b[i]) / 2.0);
///     }
///     out.to_vec()
/// }
///
/// let cyclic = CyclicFactory::new(CacheConfig::default()).unwrap();
/// let m = midpoint(Allocator::from(&cyclic), [0.0; 3], [2.0, 4.0, 6.0]);
/// assert_eq!(m, vec![1.0, 2.0, 3.0]);
/// assert_eq!(midpoint(Allocator::from(&StaticFactory), [0.0; 3], [2.0; 3]), vec![1.0; 3]);
/// ```
#[derive(Clone, Copy, Debug)]
pub enum Allocator<'a> {
    /// Recycled heap-backed views.
    Cyclic(&'a CyclicFactory),
    /// Recycled off-heap views.
    OffHeap(&'a OffHeapFactory),
    /// A fresh owned aggregate per call.
    Static(&'a StaticFactory),
}

impl<'a> Allocator<'a> {
    /// The next aggregate of `shape` at precision `T`.
    pub fn next<T: Scalar>(self, shape: Shape) -> Result<AnyView<'a, T>, AllocError> {
        match self {
            Self::Cyclic(factory) => factory.next(shape).map(AnyView::Mapped),
            Self::OffHeap(factory) => factory.next(shape).map(AnyView::Mapped),
            Self::Static(factory) => factory.next(shape).map(AnyView::Owned),
        }
    }

    /// The next aggregate with precision chosen at run time.
    pub fn next_aggregate(
        self,
        shape: Shape,
        precision: Precision,
    ) -> Result<Aggregate<AnyView<'a, f32>, AnyView<'a, f64>>, AllocError> {
        match precision {
            Precision::Single => self.next::<f32>(shape).map(Aggregate::Single),
            Precision::Double => self.next::<f64>(shape).map(Aggregate::Double),
        }
    }

    /// Name of the backing strategy.
    pub fn strategy_name(self) -> &'static str {
        match self {
            Self::Cyclic(factory) => factory.strategy_name(),
            Self::OffHeap(factory) => factory.strategy_name(),
            Self::Static(factory) => factory.strategy_name(),
        }
    }

    /// Whether aggregates from this allocator are recycled.
    pub fn recycles(self) -> bool {
        !matches!(self, Self::Static(_))
    }
}

impl<'a> From<&'a CyclicFactory> for Allocator<'a> {
    fn from(factory: &'a CyclicFactory) -> Self {
        Self::Cyclic(factory)
    }
}

impl<'a> From<&'a OffHeapFactory> for Allocator<'a> {
    fn from(factory: &'a OffHeapFactory) -> Self {
        Self::OffHeap(factory)
    }
}

impl<'a> From<&'a StaticFactory> for Allocator<'a> {
    fn from(factory: &'a StaticFactory) -> Self {
        Self::Static(factory)
    }
}

impl<'a> AggregateFactory for Allocator<'a> {
    type View<'b, T: Scalar> = AnyView<'a, T> where Self: 'b;

    fn strategy_name(&self) -> &'static str {
        Allocator::strategy_name(*self)
    }

    fn next<T: Scalar>(&self, shape: Shape) -> Result<AnyView<'a, T>, AllocError> {
        Allocator::next::<T>(*self, shape)
    }
}

/// An aggregate from any strategy.
#[derive(Debug)]
pub enum AnyView<'a, T: Scalar> {
    /// A recycled view; valid until its ring comes round again.
    Mapped(&'a MappedView<T>),
    /// Owned storage.
    Owned(OwnedAggregate<T>),
}

impl<T: Scalar> AnyView<'_, T> {
    /// Copy out of recycled storage, or hand over owned storage as-is.
    pub fn into_owned(self) -> OwnedAggregate<T> {
        match self {
            Self::Mapped(view) => view.detach(),
            Self::Owned(owned) => owned,
        }
    }
}

impl<T: Scalar> ElementAccess<T> for AnyView<'_, T> {
    fn shape(&self) -> Shape {
        match self {
            Self::Mapped(view) => view.shape(),
            Self::Owned(owned) => owned.shape(),
        }
    }

    #[inline]
    fn get(&self, index: usize) -> T {
        match self {
            Self::Mapped(view) => view.get(index),
            Self::Owned(owned) => owned.get(index),
        }
    }

    #[inline]
    fn set(&mut self, index: usize, value: T) {
        match self {
            Self::Mapped(view) => view.set(index, value),
            Self::Owned(owned) => owned.set(index, value),
        }
    }

    fn copy_to_slice(&self, dest: &mut [T], dest_offset: usize, len: usize) {
        match self {
            Self::Mapped(view) => view.copy_to_slice(dest, dest_offset, len),
            Self::Owned(owned) => owned.copy_to_slice(dest, dest_offset, len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gyre_arena::CacheConfig;
    use gyre_core::ShapeKind;

    fn sum_of_squares<A: ElementAccess<f64>>(a: &A) -> f64 {
        (0..a.len()).map(|i| a.get(i) * a.get(i)).sum()
    }

    fn fill_ramp(alloc: Allocator<'_>, shape: Shape) -> AnyView<'_, f64> {
        let mut v = alloc.next::<f64>(shape).unwrap();
        for i in 0..v.len() {
            v.set(i, i as f64);
        }
        v
    }

    #[test]
    fn same_code_runs_on_every_strategy() {
        let cyclic = CyclicFactory::new(CacheConfig::new(1)).unwrap();
        let off_heap = OffHeapFactory::new(CacheConfig::new(1)).unwrap();
        let allocators = [
            Allocator::from(&cyclic),
            Allocator::from(&off_heap),
            Allocator::from(&StaticFactory),
        ];
        for alloc in allocators {
            let v = fill_ramp(alloc, Shape::Vec4);
            assert_eq!(sum_of_squares(&v), 14.0, "{}", alloc.strategy_name());
        }
    }

    #[test]
    fn static_allocator_rejects_nary_matrices() {
        let alloc = Allocator::from(&StaticFactory);
        assert!(!alloc.recycles());
        assert!(matches!(
            alloc.next::<f32>(Shape::MatN(3)),
            Err(AllocError::UnsupportedShape { strategy: "static", .. })
        ));
    }

    #[test]
    fn into_owned_detaches_recycled_storage() {
        let cyclic = CyclicFactory::new(CacheConfig::new(1)).unwrap();
        let alloc = Allocator::from(&cyclic);
        let owned = fill_ramp(alloc, Shape::Vec3).into_owned();
        for _ in 0..cyclic.ring_len(ShapeKind::Vec3, Precision::Double) {
            cyclic.vec3::<f64>().fill(-1.0);
        }
        assert_eq!(owned.as_slice(), &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn runtime_precision_through_context() {
        let off_heap = OffHeapFactory::new(CacheConfig::new(1)).unwrap();
        let agg = Allocator::from(&off_heap)
            .next_aggregate(Shape::Mat3, Precision::Single)
            .unwrap();
        assert_eq!(agg.precision(), Precision::Single);
        assert_eq!(agg.shape(), Shape::Mat3);
    }

    #[test]
    fn allocator_is_an_aggregate_factory() {
        fn make<A: AggregateFactory>(factory: &A) -> usize {
            factory.next::<f32>(Shape::Mat2).map(|v| v.len()).unwrap_or(0)
        }
        let cyclic = CyclicFactory::new(CacheConfig::new(1)).unwrap();
        assert_eq!(make(&Allocator::from(&cyclic)), 4);
        assert_eq!(make(&cyclic), 4);
    }
}
