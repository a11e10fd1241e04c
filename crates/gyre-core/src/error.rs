//! Error types for the Gyre allocators.
//!
//! Allocation on the hot path never fails: fixed shapes always fit and
//! capacity pressure is absorbed by cursor wraparound. Errors therefore
//! come from construction (raw allocation, configuration) and from
//! requests a strategy cannot serve at all.

use crate::shape::Shape;

/// Errors from factory construction and unsupported requests.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    /// A raw off-heap allocation could not be satisfied.
    ///
    /// Construction-time only; the factory being built is abandoned and
    /// everything it had already allocated is released.
    #[error("raw allocation failed: {bytes} bytes (align {align})")]
    AllocationFailed {
        /// Requested size in bytes.
        bytes: usize,
        /// Requested alignment in bytes.
        align: usize,
    },

    /// The strategy has no support for this shape.
    #[error("{strategy} factory does not support shape {shape}")]
    UnsupportedShape {
        /// Name of the refusing strategy.
        strategy: &'static str,
        /// The rejected shape.
        shape: Shape,
    },

    /// An N-ary shape needs more elements than the arena holds.
    #[error("shape {shape} needs {len} elements, arena holds {capacity}")]
    ShapeTooLarge {
        /// The rejected shape.
        shape: Shape,
        /// Element count of the shape.
        len: usize,
        /// Arena capacity in elements.
        capacity: usize,
    },

    /// The configured cache size is zero or out of range.
    #[error("invalid cache size: {kilobytes} KiB")]
    InvalidCacheSize {
        /// The rejected value.
        kilobytes: u32,
    },

    /// `pop` was called with no matching `push`.
    #[error("scope underflow: pop without matching push")]
    ScopeUnderflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_fields() {
        let err = AllocError::ShapeTooLarge {
            shape: Shape::MatN(100),
            len: 10_000,
            capacity: 4096,
        };
        assert_eq!(
            err.to_string(),
            "shape mat100x100 needs 10000 elements, arena holds 4096"
        );

        let err = AllocError::UnsupportedShape {
            strategy: "static",
            shape: Shape::MatN(5),
        };
        assert_eq!(err.to_string(), "static factory does not support shape mat5x5");
    }

    #[test]
    fn allocation_failure_message() {
        let err = AllocError::AllocationFailed { bytes: 64, align: 8 };
        assert_eq!(err.to_string(), "raw allocation failed: 64 bytes (align 8)");
    }
}
