//! Allocate-per-call factory.
//!
//! Every call returns a fresh, zeroed [`OwnedAggregate`]. Nothing is
//! recycled, so there is no aliasing hazard and no throughput benefit.
//! Useful as a reference strategy and for values that must be kept.

use gyre_core::{AggregateFactory, AllocError, Scalar, Shape};

use crate::owned::OwnedAggregate;

/// Returns a newly allocated aggregate on every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticFactory;

impl StaticFactory {
    /// Strategy name reported in errors.
    pub const NAME: &'static str = "static";

    /// A new factory. Stateless.
    pub fn new() -> Self {
        Self
    }

    /// A fresh zeroed aggregate of `shape`.
    ///
    /// N-ary matrices are not supported and fail with
    /// [`AllocError::UnsupportedShape`].
    pub fn next<T: Scalar>(&self, shape: Shape) -> Result<OwnedAggregate<T>, AllocError> {
        if let Shape::MatN(_) = shape {
            return Err(AllocError::UnsupportedShape {
                strategy: Self::NAME,
                shape,
            });
        }
        Ok(OwnedAggregate::zeroed(shape))
    }
}

impl AggregateFactory for StaticFactory {
    type View<'a, T: Scalar> = OwnedAggregate<T>;

    fn strategy_name(&self) -> &'static str {
        Self::NAME
    }

    fn next<T: Scalar>(&self, shape: Shape) -> Result<OwnedAggregate<T>, AllocError> {
        StaticFactory::next::<T>(self, shape)
    }
}
