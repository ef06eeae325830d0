//! Error types for ndnumerics.

use thiserror::Error;

/// Errors that can occur in tensor operations.
#[derive(Debug, Error)]
pub enum TensorError {
    /// Shape mismatch between data length and expected size.
    #[error("shape mismatch: expected {expected} elements, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Two operands of an elementwise operation disagree on shape.
    #[error("incompatible shapes {left:?} and {right:?}")]
    IncompatibleShapes { left: Vec<usize>, right: Vec<usize> },

    /// Index out of bounds.
    #[error("index out of bounds: index {index} is out of range for dimension {dim_size}")]
    IndexOutOfBounds { index: usize, dim_size: usize },

    /// Wrong number of indices provided.
    #[error("wrong number of indices: expected {expected}, got {actual}")]
    WrongNumberOfIndices { expected: usize, actual: usize },

    /// Axis out of range, or repeated in an axis pair.
    #[error("invalid axis {axis} for tensor with {ndim} dimensions: {reason}")]
    InvalidAxis {
        axis: isize,
        ndim: usize,
        reason: &'static str,
    },

    /// Norm order not defined for the requested reduction.
    #[error("invalid norm order {ord}: {reason}")]
    InvalidNormOrder { ord: String, reason: &'static str },

    /// SVD computation error.
    #[error("SVD error: {message}")]
    SvdError { message: String },

    /// Operation is not defined for the given inputs.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}
