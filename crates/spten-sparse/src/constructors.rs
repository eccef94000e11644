//! Construction entry points and capability reporting
//!
//! [`coo_matrix`] and [`csr_matrix`] take a tagged [`CooSource`] /
//! [`CsrSource`] describing where the tensor comes from:
//! - a dense buffer
//! - another sparse tensor (converted to the target format)
//! - a bare shape (an empty tensor)
//! - explicit values and indices
//!
//! Building CSR from raw `(values, row_ptr, col_indices)` is not offered
//! here and reports [`SparseError::NotImplemented`]; [`CsrTensor::new`] is
//! the validated low-level constructor for that. [`capabilities`] reports
//! this and the overall maturity of the layer.
//!
//! # Examples
//!
//! ```
//! use spten_core::DenseND;
//! use spten_sparse::constructors::{coo_matrix, CooSource};
//!
//! let coo = coo_matrix(CooSource::Triplet {
//!     values: DenseND::from_vec(vec![1.0, 2.0], &[2]).unwrap(),
//!     indices: vec![vec![0, 1], vec![1, 0]],
//!     shape: Some(vec![2, 2]),
//! })
//! .unwrap();
//! assert_eq!(coo.to_dense().unwrap().to_vec(), vec![0.0, 1.0, 2.0, 0.0]);
//! ```

use crate::coo::CooTensor;
use crate::csr::CsrTensor;
use crate::error::{SparseError, SparseResult};
use crate::tensor::{SparseFormat, SparseTensor};
use scirs2_core::numeric::Float;
use spten_core::DenseND;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Input accepted by [`coo_matrix`]
#[derive(Debug, Clone)]
pub enum CooSource<T> {
    /// Dense buffer; the trailing `dims` axes become sparse (all when `None`)
    Dense {
        dense: DenseND<T>,
        dims: Option<usize>,
    },
    /// Existing sparse tensor of any format
    Sparse(SparseTensor<T>),
    /// Empty tensor with this sparse shape
    Shape(Vec<usize>),
    /// Values plus one index array per sparse axis
    Triplet {
        values: DenseND<T>,
        indices: Vec<Vec<usize>>,
        shape: Option<Vec<usize>>,
    },
}

/// Input accepted by [`csr_matrix`]
#[derive(Debug, Clone)]
pub enum CsrSource<T> {
    /// Dense buffer whose last two axes become rows and columns
    Dense(DenseND<T>),
    /// Existing sparse tensor of any format
    Sparse(SparseTensor<T>),
    /// Empty `(rows, cols)` tensor
    Shape((usize, usize)),
    /// Raw compressed-row parts
    Triplet {
        values: DenseND<T>,
        row_ptr: Vec<usize>,
        col_indices: Vec<usize>,
        shape: (usize, usize),
    },
}

/// Build a COO tensor
///
/// # Errors
///
/// A type error for a rank-0 dense buffer or an empty shape; otherwise the
/// errors of the underlying constructor.
pub fn coo_matrix<T: Float>(source: CooSource<T>) -> SparseResult<CooTensor<T>> {
    match source {
        CooSource::Dense { dense, dims } => {
            if dense.rank() == 0 {
                return Err(SparseError::unsupported("0-D dense buffer", "coo_matrix"));
            }
            CooTensor::from_dense(&dense, dims)
        }
        CooSource::Sparse(sparse) => sparse.to_coo(),
        CooSource::Shape(shape) => {
            if shape.is_empty() {
                return Err(SparseError::unsupported("empty shape", "coo_matrix"));
            }
            Ok(CooTensor::from_shape(&shape))
        }
        CooSource::Triplet {
            values,
            indices,
            shape,
        } => CooTensor::from_triplet(values, &indices, shape),
    }
}

/// Build a CSR tensor
///
/// ```
/// use spten_core::DenseND;
/// use spten_sparse::constructors::{csr_matrix, CsrSource};
///
/// let err = csr_matrix(CsrSource::Triplet {
///     values: DenseND::<f64>::ones(&[1]),
///     row_ptr: vec![0, 1],
///     col_indices: vec![0],
///     shape: (1, 1),
/// })
/// .unwrap_err();
/// assert!(err.is_not_implemented());
/// ```
pub fn csr_matrix<T: Float>(source: CsrSource<T>) -> SparseResult<CsrTensor<T>> {
    match source {
        CsrSource::Dense(dense) => {
            if dense.rank() < 2 {
                return Err(SparseError::unsupported(
                    "dense buffer with fewer than 2 axes",
                    "csr_matrix",
                ));
            }
            CooTensor::from_dense(&dense, Some(2))?.to_csr()
        }
        CsrSource::Sparse(sparse) => sparse.as_csr(),
        CsrSource::Shape((rows, cols)) => CooTensor::from_shape(&[rows, cols]).to_csr(),
        CsrSource::Triplet { .. } => Err(SparseError::NotImplemented(
            "csr_matrix from raw (values, row_ptr, col_indices); use CsrTensor::new".to_string(),
        )),
    }
}

/// Maturity of the sparse layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Stability {
    /// API may still change
    Experimental,
    Stable,
}

/// What this build of the sparse layer supports
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Capabilities {
    pub stability: Stability,
    /// Formats that [`SparseTensor`] can hold
    pub formats: Vec<SparseFormat>,
    /// Whether [`csr_matrix`] accepts [`CsrSource::Triplet`]
    pub csr_from_raw_triplet: bool,
    /// Whether the row-parallel CSR kernel runs on multiple threads
    pub parallel: bool,
}

/// Report the capabilities of the sparse layer
///
/// ```
/// use spten_sparse::constructors::{capabilities, Stability};
///
/// let caps = capabilities();
/// assert_eq!(caps.stability, Stability::Experimental);
/// assert!(!caps.csr_from_raw_triplet);
/// ```
pub fn capabilities() -> Capabilities {
    Capabilities {
        stability: Stability::Experimental,
        formats: vec![SparseFormat::Coo, SparseFormat::Csr],
        csr_from_raw_triplet: false,
        parallel: cfg!(feature = "parallel"),
    }
}
