//! Scalar precisions and per-precision dispatch.
//!
//! Every factory keeps one half of its state per precision. [`Scalar`]
//! ties a Rust float type to its [`Precision`] tag, and [`PerPrecision`]
//! lets generic code pick the matching half at compile time instead of
//! going through a runtime match on every call.

use std::fmt;

/// Storage precision of an aggregate's elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Precision {
    /// 32-bit IEEE-754 (`f32`).
    Single,
    /// 64-bit IEEE-754 (`f64`).
    Double,
}

impl Precision {
    /// Both precisions, single first.
    pub const ALL: [Precision; 2] = [Self::Single, Self::Double];

    /// Size of one element in bytes.
    pub fn byte_width(self) -> usize {
        match self {
            Self::Single => std::mem::size_of::<f32>(),
            Self::Double => std::mem::size_of::<f64>(),
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Double => write!(f, "double"),
        }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// A container holding one value per precision.
///
/// `Of<T>` is the per-precision payload; implementors return the single
/// and double halves. [`Scalar::pick`] selects between them statically.
pub trait PerPrecision {
    /// The payload type for precision `T`.
    type Of<T: Scalar>;

    /// The single-precision half.
    fn single(&self) -> &Self::Of<f32>;

    /// The double-precision half.
    fn double(&self) -> &Self::Of<f64>;
}

/// Element type of an aggregate. Implemented for `f32` and `f64` only.
pub trait Scalar:
    sealed::Sealed
    + Copy
    + Default
    + PartialEq
    + PartialOrd
    + fmt::Debug
    + fmt::Display
    + Send
    + Sync
    + 'static
{
    /// The precision tag for this type.
    const PRECISION: Precision;

    /// Additive identity.
    const ZERO: Self;

    /// Convert from `f64`, rounding to nearest for `f32`.
    fn from_f64(value: f64) -> Self;

    /// Widen to `f64`. Exact for both implementors.
    fn to_f64(self) -> f64;

    /// Select this precision's half of `pair`.
    fn pick<P: PerPrecision + ?Sized>(pair: &P) -> &P::Of<Self>;
}

impl Scalar for f32 {
    const PRECISION: Precision = Precision::Single;
    const ZERO: Self = 0.0;

    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn pick<P: PerPrecision + ?Sized>(pair: &P) -> &P::Of<f32> {
        pair.single()
    }
}

impl Scalar for f64 {
    const PRECISION: Precision = Precision::Double;
    const ZERO: Self = 0.0;

    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn pick<P: PerPrecision + ?Sized>(pair: &P) -> &P::Of<f64> {
        pair.double()
    }
}
