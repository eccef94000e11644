//! Operand kinds and the operations shared by every sparse format
//!
//! Elementwise arithmetic and `matmul` on [`CooTensor`] accept an
//! [`Operand`]: a scalar, a dense buffer, or another sparse tensor. Which
//! kinds an operation supports is decided per operation; anything else is a
//! type error. Operations whose result may be either sparse or dense return
//! [`SparseOrDense`].
//!
//! # Examples
//!
//! ```
//! use scirs2_core::ndarray_ext::array;
//! use spten_core::DenseND;
//! use spten_sparse::ops::{Operand, SparseOrDense};
//! use spten_sparse::CooTensor;
//!
//! let coo = CooTensor::new(
//!     array![[0, 1], [0, 1]],
//!     Some(DenseND::from_vec(vec![2.0, 3.0], &[2]).unwrap()),
//!     None,
//!     None,
//! )
//! .unwrap();
//!
//! let x = DenseND::from_vec(vec![1.0, 1.0], &[2]).unwrap();
//! match coo.matmul(Operand::Dense(&x)).unwrap() {
//!     SparseOrDense::Dense(y) => assert_eq!(y.to_vec(), vec![2.0, 3.0]),
//!     SparseOrDense::Sparse(_) => unreachable!(),
//! }
//! ```

use crate::coo::CooTensor;
use crate::csr::CsrTensor;
use crate::error::SparseResult;
use scirs2_core::numeric::Float;
use spten_core::DenseND;

/// Right-hand operand of an arithmetic operation
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a, T> {
    Scalar(T),
    Dense(&'a DenseND<T>),
    Coo(&'a CooTensor<T>),
    Csr(&'a CsrTensor<T>),
}

impl<'a, T> Operand<'a, T> {
    /// Name used in type errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Operand::Scalar(_) => "scalar",
            Operand::Dense(_) => "DenseND",
            Operand::Coo(_) => "CooTensor",
            Operand::Csr(_) => "CsrTensor",
        }
    }
}

impl<'a, T> From<&'a DenseND<T>> for Operand<'a, T> {
    fn from(dense: &'a DenseND<T>) -> Self {
        Operand::Dense(dense)
    }
}

impl<'a, T> From<&'a CooTensor<T>> for Operand<'a, T> {
    fn from(coo: &'a CooTensor<T>) -> Self {
        Operand::Coo(coo)
    }
}

impl<'a, T> From<&'a CsrTensor<T>> for Operand<'a, T> {
    fn from(csr: &'a CsrTensor<T>) -> Self {
        Operand::Csr(csr)
    }
}

/// Result of an operation that is sparse or dense depending on the operand
#[derive(Debug, Clone, PartialEq)]
pub enum SparseOrDense<T> {
    Sparse(CooTensor<T>),
    Dense(DenseND<T>),
}

impl<T: Float> SparseOrDense<T> {
    pub fn is_sparse(&self) -> bool {
        matches!(self, SparseOrDense::Sparse(_))
    }

    pub fn into_sparse(self) -> Option<CooTensor<T>> {
        match self {
            SparseOrDense::Sparse(coo) => Some(coo),
            SparseOrDense::Dense(_) => None,
        }
    }

    pub fn into_dense(self) -> Option<DenseND<T>> {
        match self {
            SparseOrDense::Sparse(_) => None,
            SparseOrDense::Dense(dense) => Some(dense),
        }
    }

    /// Dense form of either variant
    pub fn to_dense(&self) -> SparseResult<DenseND<T>> {
        match self {
            SparseOrDense::Sparse(coo) => coo.to_dense(),
            SparseOrDense::Dense(dense) => Ok(dense.clone()),
        }
    }
}

/// Operations every sparse format supports
pub trait SparseOps<T: Float> {
    /// Full logical shape, batch axes first
    fn shape(&self) -> Vec<usize>;

    fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Number of stored entries
    fn nnz(&self) -> usize;

    fn density(&self) -> f64;

    /// Materialise as a dense buffer
    fn to_dense(&self) -> SparseResult<DenseND<T>>;

    /// Sparse × dense product
    ///
    /// # Errors
    ///
    /// Returns a shape error if the inner dimensions don't match
    fn matmul_dense(&self, x: &DenseND<T>) -> SparseResult<DenseND<T>>;
}
