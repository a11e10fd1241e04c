//! Core abstraction traits for element access and aggregate allocation.

use crate::error::AllocError;
use crate::scalar::{Precision, Scalar};
use crate::shape::Shape;

/// Raw element access to one vector or matrix.
///
/// This is the whole surface the numeric layer needs: indexed reads and
/// writes plus a bulk copy-out. Matrices are row-major. Every index is
/// bounds-checked against the aggregate's shape and panics when out of
/// range.
pub trait ElementAccess<T: Scalar> {
    /// The aggregate's current shape.
    fn shape(&self) -> Shape;

    /// Read element `index`.
    fn get(&self, index: usize) -> T;

    /// Write element `index`.
    fn set(&mut self, index: usize, value: T);

    /// Element count.
    fn len(&self) -> usize {
        self.shape().len()
    }

    /// Whether the aggregate has no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the element at `(row, col)`.
    fn get_at(&self, row: usize, col: usize) -> T {
        self.get(flat_index(self.shape(), row, col))
    }

    /// Write the element at `(row, col)`.
    fn set_at(&mut self, row: usize, col: usize, value: T) {
        let index = flat_index(self.shape(), row, col);
        self.set(index, value);
    }

    /// Copy the first `len` elements into `dest[dest_offset..dest_offset + len]`.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds the element count or the destination range
    /// is out of bounds.
    fn copy_to_slice(&self, dest: &mut [T], dest_offset: usize, len: usize) {
        assert!(
            len <= self.len(),
            "copy of {len} elements from an aggregate of {}",
            self.len()
        );
        let dest = &mut dest[dest_offset..dest_offset + len];
        for (i, slot) in dest.iter_mut().enumerate() {
            *slot = self.get(i);
        }
    }

    /// Overwrite every element from `src`.
    ///
    /// # Panics
    ///
    /// Panics if `src.len()` differs from the element count.
    fn copy_from_slice(&mut self, src: &[T]) {
        assert_eq!(
            src.len(),
            self.len(),
            "source length does not match aggregate length"
        );
        for (i, &value) in src.iter().enumerate() {
            self.set(i, value);
        }
    }

    /// Set every element to `value`.
    fn fill(&mut self, value: T) {
        for i in 0..self.len() {
            self.set(i, value);
        }
    }

    /// Collect the elements into a fresh `Vec`. Allocates; not for hot paths.
    fn to_vec(&self) -> Vec<T> {
        (0..self.len()).map(|i| self.get(i)).collect()
    }
}

/// Row-major flat index of `(row, col)` within `shape`.
///
/// # Panics
///
/// Panics if `row` or `col` is outside the shape.
pub fn flat_index(shape: Shape, row: usize, col: usize) -> usize {
    assert!(
        row < shape.rows() && col < shape.cols(),
        "({row}, {col}) is outside {shape}"
    );
    row * shape.cols() + col
}

/// A tagged aggregate of either precision.
///
/// Replaces per-precision virtual dispatch: callers that pick precision at
/// run time match on the tag once and then work with a concrete type.
#[derive(Debug)]
pub enum Aggregate<S, D> {
    /// Single-precision aggregate.
    Single(S),
    /// Double-precision aggregate.
    Double(D),
}

impl<S, D> Aggregate<S, D>
where
    S: ElementAccess<f32>,
    D: ElementAccess<f64>,
{
    /// The precision tag.
    pub fn precision(&self) -> Precision {
        match self {
            Self::Single(_) => Precision::Single,
            Self::Double(_) => Precision::Double,
        }
    }

    /// The aggregate's shape.
    pub fn shape(&self) -> Shape {
        match self {
            Self::Single(s) => s.shape(),
            Self::Double(d) => d.shape(),
        }
    }

    /// Read element `index` widened to `f64`.
    pub fn get_f64(&self, index: usize) -> f64 {
        match self {
            Self::Single(s) => f64::from(s.get(index)),
            Self::Double(d) => d.get(index),
        }
    }

    /// Write element `index` from an `f64`, narrowing for single precision.
    pub fn set_f64(&mut self, index: usize, value: f64) {
        match self {
            Self::Single(s) => s.set(index, f32::from_f64(value)),
            Self::Double(d) => d.set(index, value),
        }
    }
}

/// An allocation strategy that hands out aggregates by shape and precision.
///
/// `View` is what the strategy returns: a borrowed, recycled view for the
/// cyclic and off-heap strategies, an owned buffer for the static one.
pub trait AggregateFactory {
    /// The aggregate handle returned by [`next`](AggregateFactory::next).
    type View<'a, T: Scalar>: ElementAccess<T>
    where
        Self: 'a;

    /// Short strategy name for diagnostics and errors.
    fn strategy_name(&self) -> &'static str;

    /// Obtain the next aggregate of `shape` at precision `T`.
    ///
    /// Contents are unspecified; callers must initialise every element they
    /// intend to read.
    fn next<T: Scalar>(&self, shape: Shape) -> Result<Self::View<'_, T>, AllocError>;

    /// Obtain the next aggregate with precision chosen at run time.
    fn next_aggregate(
        &self,
        shape: Shape,
        precision: Precision,
    ) -> Result<Aggregate<Self::View<'_, f32>, Self::View<'_, f64>>, AllocError> {
        match precision {
            Precision::Single => self.next::<f32>(shape).map(Aggregate::Single),
            Precision::Double => self.next::<f64>(shape).map(Aggregate::Double),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal owned implementation used to exercise the provided methods.
    struct Plain<T> {
        shape: Shape,
        data: Vec<T>,
    }

    impl<T: Scalar> Plain<T> {
        fn new(shape: Shape) -> Self {
            Self {
                shape,
                data: vec![T::ZERO; shape.len()],
            }
        }
    }

    impl<T: Scalar> ElementAccess<T> for Plain<T> {
        fn shape(&self) -> Shape {
            self.shape
        }

        fn get(&self, index: usize) -> T {
            self.data[index]
        }

        fn set(&mut self, index: usize, value: T) {
            self.data[index] = value;
        }
    }

    #[test]
    fn row_major_addressing() {
        let mut m = Plain::<f32>::new(Shape::Mat3);
        m.set_at(1, 2, 7.0);
        assert_eq!(m.get(5), 7.0);
        assert_eq!(m.get_at(1, 2), 7.0);
    }

    #[test]
    #[should_panic(expected = "outside mat2")]
    fn out_of_shape_panics() {
        let m = Plain::<f64>::new(Shape::Mat2);
        m.get_at(2, 0);
    }

    #[test]
    fn copy_to_slice_honours_offset() {
        let mut v = Plain::<f32>::new(Shape::Vec3);
        v.copy_from_slice(&[1.0, 2.0, 3.0]);
        let mut dest = [0.0f32; 6];
        v.copy_to_slice(&mut dest, 2, 3);
        assert_eq!(dest, [0.0, 0.0, 1.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn fill_and_to_vec() {
        let mut v = Plain::<f64>::new(Shape::VecN(5));
        v.fill(2.5);
        assert_eq!(v.to_vec(), vec![2.5; 5]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn flat_index_visits_each_element_once(dim in 1u32..12, matrix in any::<bool>()) {
                let shape = if matrix { Shape::matrix(dim) } else { Shape::vector(dim) };
                let mut seen = vec![false; shape.len()];
                for row in 0..shape.rows() {
                    for col in 0..shape.cols() {
                        let index = flat_index(shape, row, col);
                        prop_assert!(!seen[index]);
                        seen[index] = true;
                    }
                }
                prop_assert!(seen.into_iter().all(|s| s));
            }
        }
    }

    #[test]
    fn aggregate_tag_and_widening() {
        let mut agg: Aggregate<Plain<f32>, Plain<f64>> =
            Aggregate::Single(Plain::new(Shape::Vec2));
        assert_eq!(agg.precision(), Precision::Single);
        assert_eq!(agg.shape(), Shape::Vec2);
        agg.set_f64(1, 0.5);
        assert_eq!(agg.get_f64(1), 0.5);
    }
}
