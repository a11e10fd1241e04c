//! Core types and traits for the Gyre aggregate allocators.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every allocation strategy: aggregate shapes,
//! scalar precisions, identifiers, the error type, and the element-access
//! and factory traits that numeric code programs against.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod convert;
pub mod error;
pub mod id;
pub mod scalar;
pub mod shape;
pub mod traits;

pub use error::AllocError;
pub use id::{FactoryId, ThreadKey};
pub use scalar::{PerPrecision, Precision, Scalar};
pub use shape::{Shape, ShapeKind};
pub use traits::{Aggregate, AggregateFactory, ElementAccess};
