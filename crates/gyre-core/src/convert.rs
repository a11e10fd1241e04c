//! Element-wise conversions between aggregates.
//!
//! These are plain functions over [`ElementAccess`] rather than methods on
//! the view types, so any strategy's view converts to any other's.

use crate::scalar::Scalar;
use crate::traits::ElementAccess;

/// Copy `src` into `dst` element by element, converting precision through `f64`.
///
/// # Panics
///
/// Panics if the element counts differ.
pub fn copy<S, D, A, B>(src: &A, dst: &mut B)
where
    S: Scalar,
    D: Scalar,
    A: ElementAccess<S> + ?Sized,
    B: ElementAccess<D> + ?Sized,
{
    assert_eq!(
        src.len(),
        dst.len(),
        "cannot convert {} into {}",
        src.shape(),
        dst.shape()
    );
    for i in 0..src.len() {
        dst.set(i, D::from_f64(src.get(i).to_f64()));
    }
}

/// Widen a single-precision aggregate into a double-precision one. Exact.
pub fn widen<A, B>(src: &A, dst: &mut B)
where
    A: ElementAccess<f32> + ?Sized,
    B: ElementAccess<f64> + ?Sized,
{
    copy::<f32, f64, A, B>(src, dst);
}

/// Narrow a double-precision aggregate into a single-precision one,
/// rounding each element to nearest.
pub fn narrow<A, B>(src: &A, dst: &mut B)
where
    A: ElementAccess<f64> + ?Sized,
    B: ElementAccess<f32> + ?Sized,
{
    copy::<f64, f32, A, B>(src, dst);
}
