//! Closed sum type over the sparse formats

use crate::coo::CooTensor;
use crate::csr::CsrTensor;
use crate::error::SparseResult;
use crate::ops::SparseOps;
use scirs2_core::numeric::Float;
use spten_core::DenseND;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sparse storage format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SparseFormat {
    /// Coordinate format
    ///
    /// Explicit coordinate columns plus values; any number of sparse axes,
    /// duplicates allowed. Best for construction and assembly.
    Coo,

    /// Compressed Sparse Row
    ///
    /// Row pointers + column indices + values; exactly two sparse axes.
    /// Best for row scans and repeated products with dense operands.
    Csr,
}

impl SparseFormat {
    /// Returns the format name as a string
    pub fn name(&self) -> &'static str {
        match self {
            SparseFormat::Coo => "COO",
            SparseFormat::Csr => "CSR",
        }
    }
}

impl std::fmt::Display for SparseFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A sparse tensor in one of the supported formats
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use spten_sparse::{CooTensor, SparseFormat, SparseTensor};
///
/// let coo = CooTensor::<f64>::new(array![[0, 1], [1, 0]], None, None, None).unwrap();
/// let tensor = SparseTensor::from(coo).to_csr().unwrap();
/// assert_eq!(tensor.format(), SparseFormat::Csr);
/// assert_eq!(tensor.nnz(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SparseTensor<T> {
    Coo(CooTensor<T>),
    Csr(CsrTensor<T>),
}

impl<T: Float> SparseTensor<T> {
    pub fn format(&self) -> SparseFormat {
        match self {
            SparseTensor::Coo(_) => SparseFormat::Coo,
            SparseTensor::Csr(_) => SparseFormat::Csr,
        }
    }

    pub fn nnz(&self) -> usize {
        match self {
            SparseTensor::Coo(coo) => coo.nnz(),
            SparseTensor::Csr(csr) => csr.nnz(),
        }
    }

    /// Full logical shape, batch axes first
    pub fn shape(&self) -> Vec<usize> {
        match self {
            SparseTensor::Coo(coo) => coo.shape(),
            SparseTensor::Csr(csr) => csr.full_shape(),
        }
    }

    pub fn to_dense(&self) -> SparseResult<DenseND<T>> {
        match self {
            SparseTensor::Coo(coo) => coo.to_dense(),
            SparseTensor::Csr(csr) => csr.to_dense(),
        }
    }

    /// Coordinate form; cheap for COO
    pub fn to_coo(&self) -> SparseResult<CooTensor<T>> {
        match self {
            SparseTensor::Coo(coo) => Ok(coo.clone()),
            SparseTensor::Csr(csr) => csr.to_coo(),
        }
    }

    /// This tensor in CSR format
    pub fn to_csr(&self) -> SparseResult<SparseTensor<T>> {
        Ok(SparseTensor::Csr(self.as_csr()?))
    }

    /// Compressed-row form; cheap for CSR
    pub fn as_csr(&self) -> SparseResult<CsrTensor<T>> {
        match self {
            SparseTensor::Coo(coo) => coo.to_csr(),
            SparseTensor::Csr(csr) => Ok(csr.clone()),
        }
    }

    pub fn matmul_dense(&self, x: &DenseND<T>) -> SparseResult<DenseND<T>> {
        match self {
            SparseTensor::Coo(coo) => coo.matmul_dense(x),
            SparseTensor::Csr(csr) => csr.matmul_dense(x),
        }
    }

    pub fn is_coo(&self) -> bool {
        matches!(self, SparseTensor::Coo(_))
    }

    pub fn is_csr(&self) -> bool {
        matches!(self, SparseTensor::Csr(_))
    }
}

impl<T: Float> SparseOps<T> for SparseTensor<T> {
    fn shape(&self) -> Vec<usize> {
        SparseTensor::shape(self)
    }

    fn nnz(&self) -> usize {
        SparseTensor::nnz(self)
    }

    fn density(&self) -> f64 {
        match self {
            SparseTensor::Coo(coo) => coo.density(),
            SparseTensor::Csr(csr) => csr.density(),
        }
    }

    fn to_dense(&self) -> SparseResult<DenseND<T>> {
        SparseTensor::to_dense(self)
    }

    fn matmul_dense(&self, x: &DenseND<T>) -> SparseResult<DenseND<T>> {
        SparseTensor::matmul_dense(self, x)
    }
}

impl<T> From<CooTensor<T>> for SparseTensor<T> {
    fn from(coo: CooTensor<T>) -> Self {
        SparseTensor::Coo(coo)
    }
}

impl<T> From<CsrTensor<T>> for SparseTensor<T> {
    fn from(csr: CsrTensor<T>) -> Self {
        SparseTensor::Csr(csr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scirs2_core::ndarray_ext::array;

    fn sample() -> SparseTensor<f64> {
        let values = DenseND::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
        CooTensor::new(array![[0, 1, 1], [2, 0, 0]], Some(values), Some(vec![2, 3]), None)
            .unwrap()
            .into()
    }

    #[test]
    fn test_format_names() {
        assert_eq!(SparseFormat::Coo.to_string(), "COO");
        assert_eq!(SparseFormat::Csr.name(), "CSR");
    }

    #[test]
    fn test_conversions_preserve_dense() {
        let coo = sample();
        let csr = coo.to_csr().unwrap();
        assert!(csr.is_csr());
        assert_eq!(csr.nnz(), 2);
        assert_eq!(csr.shape(), vec![2, 3]);
        assert_eq!(csr.to_dense().unwrap(), coo.to_dense().unwrap());

        let back = csr.to_coo().unwrap();
        assert_eq!(back.to_dense().unwrap(), coo.to_dense().unwrap());
    }

    #[test]
    fn test_matmul_dense_agrees() {
        let coo = sample();
        let csr = coo.to_csr().unwrap();
        let x = DenseND::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
        let expected = vec![3.0, 5.0];
        assert_eq!(coo.matmul_dense(&x).unwrap().to_vec(), expected);
        assert_eq!(csr.matmul_dense(&x).unwrap().to_vec(), expected);
    }
}
