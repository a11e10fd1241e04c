//! Heap-owned aggregates that are never recycled.

use gyre_core::{ElementAccess, Scalar, Shape};

/// An aggregate that owns its storage.
///
/// Returned by [`StaticFactory`](crate::StaticFactory) and by
/// [`MappedView::detach`](crate::MappedView::detach). Unlike a mapped view
/// it is never remapped, so it is safe to keep for as long as needed.
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedAggregate<T: Scalar> {
    shape: Shape,
    data: Box<[T]>,
}

impl<T: Scalar> OwnedAggregate<T> {
    /// A zero-filled aggregate of `shape`.
    pub fn zeroed(shape: Shape) -> Self {
        Self {
            shape,
            data: vec![T::ZERO; shape.len()].into_boxed_slice(),
        }
    }

    /// Copy any aggregate's current contents into owned storage.
    pub fn copy_of<A: ElementAccess<T> + ?Sized>(src: &A) -> Self {
        let shape = src.shape();
        let mut data = vec![T::ZERO; shape.len()];
        src.copy_to_slice(&mut data, 0, shape.len());
        Self {
            shape,
            data: data.into_boxed_slice(),
        }
    }

    /// Elements in row-major order.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable elements in row-major order.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Give up the shape and keep the storage.
    pub fn into_boxed_slice(self) -> Box<[T]> {
        self.data
    }
}

impl<T: Scalar> ElementAccess<T> for OwnedAggregate<T> {
    fn shape(&self) -> Shape {
        self.shape
    }

    #[inline]
    fn get(&self, index: usize) -> T {
        self.data[index]
    }

    #[inline]
    fn set(&mut self, index: usize, value: T) {
        self.data[index] = value;
    }

    fn copy_to_slice(&self, dest: &mut [T], dest_offset: usize, len: usize) {
        dest[dest_offset..dest_offset + len].copy_from_slice(&self.data[..len]);
    }

    fn copy_from_slice(&mut self, src: &[T]) {
        self.data.copy_from_slice(src);
    }
}
