//! Error types for lazr

use crate::element::DType;
use thiserror::Error;

/// Result type alias using lazr's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lazr operations
///
/// All failures are raised synchronously at the call site, strictly before
/// any mutation of the destination. There are no retryable conditions.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// Shape mismatch between an assignment destination and its source
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// An assignment would violate a structural adapter's invariant
    #[error("Structural violation: {adapter} matrix rejected a non-conforming write")]
    StructuralViolation {
        /// Human-readable adapter kind ("diagonal", "uni_upper", ...)
        adapter: &'static str,
    },

    /// Element types of kernel operands differ
    #[error("DType mismatch: {lhs:?} vs {rhs:?}")]
    DTypeMismatch {
        /// Left-hand side dtype
        lhs: DType,
        /// Right-hand side dtype
        rhs: DType,
    },

    /// A kernel dispatch path was invoked with an unsupported configuration
    ///
    /// This is a programming-contract violation, not a recoverable runtime
    /// condition.
    #[error("Unsupported kernel configuration for '{op}': {reason}")]
    UnsupportedKernel {
        /// The operation name
        op: &'static str,
        /// Why the configuration is unsupported
        reason: &'static str,
    },

    /// Invalid dimension index for a container of the given rank
    #[error("Invalid dimension {dim} for a {ndim}-dimensional container")]
    InvalidDimension {
        /// The invalid dimension
        dim: usize,
        /// Number of dimensions
        ndim: usize,
    },

    /// Index out of bounds
    #[error("Index {index} out of bounds for dimension of size {size}")]
    IndexOutOfBounds {
        /// The invalid index
        index: usize,
        /// Size of the dimension
        size: usize,
    },
}
