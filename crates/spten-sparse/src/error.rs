//! Unified error types for sparse tensor operations
//!
//! # Design
//!
//! - **`SparseError`**: top-level enum returned by every fallible operation
//! - **`ShapeError`**: index/value rank, nnz and sparse-shape mismatches,
//!   dense operands whose shape differs from `batch + sparse_shape`
//! - **`ValueError`**: a value-dependent operation on a structure-only tensor
//! - **`TypeError`**: an operand kind the operation does not accept
//! - **`DimensionError`**: too few sparse dimensions for a structural operation
//!
//! Errors are raised at the call that detects them and are never retried.
//!
//! # Examples
//!
//! ```
//! use spten_sparse::error::{SparseError, ValueError};
//!
//! let err: SparseError = ValueError::MissingValues { operation: "div" }.into();
//! assert!(err.is_value_error());
//! assert_eq!(err.to_string(), "Value error: cannot div a tensor without values");
//! ```

use thiserror::Error;

/// Top-level error type for all sparse tensor operations
#[derive(Error, Debug)]
pub enum SparseError {
    /// Shape, rank and extent mismatches
    #[error("Shape error: {0}")]
    Shape(#[from] ShapeError),

    /// Missing or asymmetric values
    #[error("Value error: {0}")]
    Value(#[from] ValueError),

    /// Unsupported operand kinds
    #[error("Type error: {0}")]
    Type(#[from] TypeError),

    /// Too few sparse dimensions
    #[error("Dimension error: {0}")]
    Dimension(#[from] DimensionError),

    /// An entry point that this layer intentionally does not provide
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Failure reported by the dense backend
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Shape and rank errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("indices must be a 2D buffer, but got {got}D")]
    IndicesRank { got: usize },

    #[error("values must be at least 1D, but got {got}D")]
    ValuesRank { got: usize },

    #[error("values must have {nnz} entries in the last dimension (number of non-zeros), but got {got}")]
    NnzMismatch { nnz: usize, got: usize },

    #[error("length of sparse shape ({got}) must match the size of indices in dim-0 ({expected})")]
    SparseShapeLength { expected: usize, got: usize },

    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    Mismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("sparse shape mismatch: {lhs:?} vs {rhs:?}")]
    SparseShapeMismatch { lhs: Vec<usize>, rhs: Vec<usize> },

    #[error("matrix multiplication dimension mismatch: ({m1}×{n1}) × ({m2}×{n2})")]
    MatMul {
        m1: usize,
        n1: usize,
        m2: usize,
        n2: usize,
    },

    #[error("batch dimensions {lhs:?} and {rhs:?} cannot be broadcast together")]
    Broadcast { lhs: Vec<usize>, rhs: Vec<usize> },

    #[error("cannot reshape sparse shape {from:?} into {to:?}")]
    Reshape { from: Vec<usize>, to: Vec<usize> },

    #[error("index {index} out of bounds for axis {axis} with extent {extent}")]
    IndexOutOfBounds {
        index: usize,
        axis: usize,
        extent: usize,
    },

    #[error("invalid row pointer: {reason}")]
    InvalidRowPointer { reason: String },

    #[error("index arrays have different lengths: {lengths:?}")]
    RaggedIndices { lengths: Vec<usize> },

    #[error("at least one index array is required")]
    EmptyIndices,

    #[error("sparse shape {shape:?} has more elements than fit in usize")]
    IndexSpaceOverflow { shape: Vec<usize> },
}

/// Errors about the presence of values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("cannot {operation} a tensor without values")]
    MissingValues { operation: &'static str },

    #[error("self has value while other does not")]
    SelfHasValues,

    #[error("self has no value while other does")]
    OtherHasValues,
}

/// Unsupported operand kinds
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("Unsupported type {operand} in {operation}")]
    UnsupportedOperand {
        operand: &'static str,
        operation: &'static str,
    },
}

/// Structural operations that need more sparse dimensions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DimensionError {
    #[error("sparse ndim must be {required} or greater for {operation}, but got {got}")]
    TooFewSparseDims {
        operation: &'static str,
        required: usize,
        got: usize,
    },

    #[error("{operation} requires exactly {required} sparse dimensions, but got {got}")]
    ExactSparseDims {
        operation: &'static str,
        required: usize,
        got: usize,
    },
}

/// Result type alias for sparse tensor operations
pub type SparseResult<T> = Result<T, SparseError>;

impl SparseError {
    /// Create an unsupported-operand error
    pub fn unsupported(operand: &'static str, operation: &'static str) -> Self {
        SparseError::Type(TypeError::UnsupportedOperand { operand, operation })
    }

    /// Create a missing-values error
    pub fn missing_values(operation: &'static str) -> Self {
        SparseError::Value(ValueError::MissingValues { operation })
    }

    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: Vec<usize>, got: Vec<usize>) -> Self {
        SparseError::Shape(ShapeError::Mismatch { expected, got })
    }

    pub fn is_shape_error(&self) -> bool {
        matches!(self, SparseError::Shape(_))
    }

    pub fn is_value_error(&self) -> bool {
        matches!(self, SparseError::Value(_))
    }

    pub fn is_type_error(&self) -> bool {
        matches!(self, SparseError::Type(_))
    }

    pub fn is_dimension_error(&self) -> bool {
        matches!(self, SparseError::Dimension(_))
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, SparseError::NotImplemented(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_error_display() {
        let err = ShapeError::MatMul {
            m1: 3,
            n1: 4,
            m2: 5,
            n2: 6,
        };
        assert_eq!(
            err.to_string(),
            "matrix multiplication dimension mismatch: (3×4) × (5×6)"
        );
    }

    #[test]
    fn test_type_error_names_operand() {
        let err = SparseError::unsupported("CsrTensor", "addition");
        assert!(err.is_type_error());
        assert_eq!(
            err.to_string(),
            "Type error: Unsupported type CsrTensor in addition"
        );
    }

    #[test]
    fn test_backend_is_transparent() {
        let err: SparseError = anyhow::anyhow!("boom").into();
        assert_eq!(err.to_string(), "boom");
        assert!(!err.is_shape_error());
    }

    #[test]
    fn test_classification() {
        let err: SparseError = DimensionError::TooFewSparseDims {
            operation: "transpose",
            required: 2,
            got: 1,
        }
        .into();
        assert!(err.is_dimension_error());
        assert!(SparseError::NotImplemented("x".into()).is_not_implemented());
    }
}
