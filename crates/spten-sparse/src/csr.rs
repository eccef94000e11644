//! CSR (Compressed Sparse Row) sparse tensor
//!
//! Entries of row `r` occupy positions `row_ptr[r]..row_ptr[r + 1]` of the
//! column index array and of the last axis of the value buffer. Values may
//! carry leading batch axes like COO values do.
//!
//! # Examples
//!
//! ```
//! use spten_core::DenseND;
//! use spten_sparse::CsrTensor;
//!
//! // [[1, 0, 2],
//! //  [0, 3, 0]]
//! let values = DenseND::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
//! let csr = CsrTensor::new(vec![0, 2, 3], vec![0, 2, 1], values, (2, 3)).unwrap();
//!
//! assert_eq!(csr.nnz(), 3);
//! assert_eq!(csr.to_dense().unwrap().to_vec(), vec![1.0, 0.0, 2.0, 0.0, 3.0, 0.0]);
//! ```

use crate::coo::CooTensor;
use crate::error::{DimensionError, ShapeError, SparseResult};
use crate::ops::SparseOps;
use crate::spmm::spmm_csr;
use crate::tracing_support::record_conversion;
use crate::utils::{check_shape_match, index_space_size, stack_rows, RowBuckets};
use crate::values::{validate_buffer, SparseValues};
use scirs2_core::numeric::Float;
use spten_core::DenseND;
use std::ops::Range;
use std::sync::Arc;

/// CSR sparse tensor with a `(rows, cols)` sparse shape
#[derive(Debug, Clone, PartialEq)]
pub struct CsrTensor<T> {
    row_ptr: Vec<usize>,
    col_indices: Vec<usize>,
    values: Arc<DenseND<T>>,
    shape: (usize, usize),
}

fn invalid_row_ptr(reason: String) -> ShapeError {
    ShapeError::InvalidRowPointer { reason }
}

impl<T: Float> CsrTensor<T> {
    /// Create a CSR tensor from its raw parts
    ///
    /// # Errors
    ///
    /// Fails with a shape error when `row_ptr` does not have `rows + 1`
    /// entries, does not start at 0, decreases anywhere or does not end at
    /// `nnz`; when a column index is out of bounds; or when the value
    /// buffer's last extent is not `nnz`.
    ///
    /// ```
    /// use spten_core::DenseND;
    /// use spten_sparse::CsrTensor;
    ///
    /// let values = DenseND::from_vec(vec![1.0, 2.0], &[2]).unwrap();
    /// assert!(CsrTensor::new(vec![0, 2, 1], vec![0, 1], values, (2, 2)).is_err());
    /// ```
    pub fn new(
        row_ptr: Vec<usize>,
        col_indices: Vec<usize>,
        values: DenseND<T>,
        shape: (usize, usize),
    ) -> SparseResult<Self> {
        let (nrows, ncols) = shape;
        let nnz = col_indices.len();

        if row_ptr.len() != nrows + 1 {
            return Err(invalid_row_ptr(format!(
                "expected {} entries for {} rows, got {}",
                nrows + 1,
                nrows,
                row_ptr.len()
            ))
            .into());
        }
        if row_ptr[0] != 0 {
            return Err(invalid_row_ptr(format!("must start at 0, got {}", row_ptr[0])).into());
        }
        if let Some(r) = (0..nrows).find(|&r| row_ptr[r] > row_ptr[r + 1]) {
            return Err(invalid_row_ptr(format!(
                "decreases at row {}: {} > {}",
                r,
                row_ptr[r],
                row_ptr[r + 1]
            ))
            .into());
        }
        if row_ptr[nrows] != nnz {
            return Err(invalid_row_ptr(format!(
                "must end at nnz ({}), got {}",
                nnz, row_ptr[nrows]
            ))
            .into());
        }
        if let Some(&index) = col_indices.iter().find(|&&c| c >= ncols) {
            return Err(ShapeError::IndexOutOfBounds {
                index,
                axis: 1,
                extent: ncols,
            }
            .into());
        }
        validate_buffer(&values, nnz)?;

        Ok(Self {
            row_ptr,
            col_indices,
            values: Arc::new(values),
            shape,
        })
    }

    /// Compress a COO tensor with exactly two sparse axes
    ///
    /// The input is coalesced first, so no row holds a column twice. A
    /// structure-only input gets explicit values (duplicate counts).
    pub fn from_coo(coo: &CooTensor<T>) -> SparseResult<Self> {
        if coo.sparse_ndim() != 2 {
            return Err(DimensionError::ExactSparseDims {
                operation: "CSR conversion",
                required: 2,
                got: coo.sparse_ndim(),
            }
            .into());
        }
        let coo = coo.coalesce(true)?;
        let (nrows, ncols) = (coo.sparse_shape()[0], coo.sparse_shape()[1]);
        let indices = coo.indices();

        let buckets = RowBuckets::build(indices.row(0).iter().copied(), nrows);
        let col_indices: Vec<usize> = buckets.order.iter().map(|&e| indices[[1, e]]).collect();
        let values = coo
            .sparse_values()
            .materialize(coo.nnz())
            .take_last(&buckets.order)?;

        record_conversion("COO", "CSR", coo.nnz());
        Ok(Self {
            row_ptr: buckets.offsets,
            col_indices,
            values: Arc::new(values),
            shape: (nrows, ncols),
        })
    }

    /// Expand back to coordinates, row by row
    pub fn to_coo(&self) -> SparseResult<CooTensor<T>> {
        let rows: Vec<usize> = (0..self.nrows())
            .flat_map(|r| std::iter::repeat(r).take(self.row_ptr[r + 1] - self.row_ptr[r]))
            .collect();
        let indices = stack_rows(&[rows.as_slice(), self.col_indices.as_slice()], self.nnz())?;
        record_conversion("CSR", "COO", self.nnz());
        CooTensor::from_shared(
            Arc::new(indices),
            SparseValues::Values(Arc::clone(&self.values)),
            Some(vec![self.shape.0, self.shape.1]),
            None,
        )
    }

    pub fn nnz(&self) -> usize {
        self.col_indices.len()
    }

    pub fn nrows(&self) -> usize {
        self.shape.0
    }

    pub fn ncols(&self) -> usize {
        self.shape.1
    }

    /// Sparse shape `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Batch shape carried by the values
    pub fn dense_shape(&self) -> Vec<usize> {
        self.values.shape()[..self.values.rank() - 1].to_vec()
    }

    /// Batch axes followed by `rows, cols`
    pub fn full_shape(&self) -> Vec<usize> {
        let mut shape = self.dense_shape();
        shape.extend_from_slice(&[self.shape.0, self.shape.1]);
        shape
    }

    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    pub fn col_indices(&self) -> &[usize] {
        &self.col_indices
    }

    pub fn values(&self) -> &DenseND<T> {
        &self.values
    }

    /// Column indices of row `i` and the matching range along the value axis
    pub fn row(&self, i: usize) -> Option<(&[usize], Range<usize>)> {
        if i >= self.nrows() {
            return None;
        }
        let range = self.row_ptr[i]..self.row_ptr[i + 1];
        Some((&self.col_indices[range.clone()], range))
    }

    pub fn density(&self) -> f64 {
        let total = self.nrows() as f64 * self.ncols() as f64;
        if total == 0.0 {
            0.0
        } else {
            self.nnz() as f64 / total
        }
    }

    /// Materialise as a dense buffer; repeated columns in a row sum
    pub fn to_dense(&self) -> SparseResult<DenseND<T>> {
        let (nrows, ncols) = self.shape;
        let mut flat_shape = self.dense_shape();
        flat_shape.push(index_space_size(&[nrows, ncols])?);
        let mut acc = DenseND::zeros(&flat_shape);

        let mut flat = Vec::with_capacity(self.nnz());
        for r in 0..nrows {
            for e in self.row_ptr[r]..self.row_ptr[r + 1] {
                flat.push(r * ncols + self.col_indices[e]);
            }
        }
        acc.index_add_last(&flat, &self.values)?;
        Ok(acc.reshape(&self.full_shape())?)
    }

    /// Sparse × dense product with the same contract as
    /// [`CooTensor::matmul_dense`]
    pub fn matmul_dense(&self, x: &DenseND<T>) -> SparseResult<DenseND<T>> {
        spmm_csr(&self.row_ptr, &self.col_indices, &self.values, self.shape, x)
    }

    /// Transpose by bucketing entries on their column
    pub fn transpose(&self) -> SparseResult<Self> {
        let (nrows, ncols) = self.shape;
        let buckets = RowBuckets::build(self.col_indices.iter().copied(), ncols);
        let mut entry_rows = vec![0usize; self.nnz()];
        for r in 0..nrows {
            for slot in &mut entry_rows[self.row_ptr[r]..self.row_ptr[r + 1]] {
                *slot = r;
            }
        }
        let col_indices = buckets.order.iter().map(|&e| entry_rows[e]).collect();
        let values = self.values.take_last(&buckets.order)?;

        Ok(Self {
            row_ptr: buckets.offsets,
            col_indices,
            values: Arc::new(values),
            shape: (ncols, nrows),
        })
    }

    fn with_values(&self, values: DenseND<T>) -> Self {
        Self {
            row_ptr: self.row_ptr.clone(),
            col_indices: self.col_indices.clone(),
            values: Arc::new(values),
            shape: self.shape,
        }
    }

    pub fn neg(&self) -> Self {
        self.with_values(self.values.map(|&v| -v))
    }

    pub fn mul_scalar(&self, scalar: T) -> Self {
        self.with_values(self.values.map(|&v| v * scalar))
    }

    pub fn div_scalar(&self, scalar: T) -> Self {
        self.with_values(self.values.map(|&v| v / scalar))
    }

    /// `self + alpha * other`, merged and recompressed
    pub fn add_csr(&self, other: &CsrTensor<T>, alpha: T) -> SparseResult<Self> {
        check_shape_match(&self.full_shape(), &other.full_shape())?;
        let sum = self.to_coo()?.add_coo(&other.to_coo()?, alpha)?;
        Self::from_coo(&sum)
    }
}

impl<T: Float> SparseOps<T> for CsrTensor<T> {
    fn shape(&self) -> Vec<usize> {
        self.full_shape()
    }

    fn nnz(&self) -> usize {
        CsrTensor::nnz(self)
    }

    fn density(&self) -> f64 {
        CsrTensor::density(self)
    }

    fn to_dense(&self) -> SparseResult<DenseND<T>> {
        CsrTensor::to_dense(self)
    }

    fn matmul_dense(&self, x: &DenseND<T>) -> SparseResult<DenseND<T>> {
        CsrTensor::matmul_dense(self, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SparseError;
    use scirs2_core::ndarray_ext::array;

    fn sample() -> CsrTensor<f64> {
        // [[1, 0, 2],
        //  [0, 3, 0]]
        let values = DenseND::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
        CsrTensor::new(vec![0, 2, 3], vec![0, 2, 1], values, (2, 3)).unwrap()
    }

    fn row_ptr_error(row_ptr: Vec<usize>) -> SparseError {
        let values = DenseND::<f64>::ones(&[2]);
        CsrTensor::new(row_ptr, vec![0, 1], values, (2, 2)).unwrap_err()
    }

    #[test]
    fn test_new_rejects_bad_row_ptr() {
        for row_ptr in [vec![0, 2], vec![1, 1, 2], vec![0, 2, 1], vec![0, 1, 1]] {
            let err = row_ptr_error(row_ptr);
            assert!(matches!(
                err,
                SparseError::Shape(ShapeError::InvalidRowPointer { .. })
            ));
        }
    }

    #[test]
    fn test_new_rejects_bad_columns_and_values() {
        let values = DenseND::<f64>::ones(&[2]);
        assert!(CsrTensor::new(vec![0, 1, 2], vec![0, 2], values, (2, 2)).is_err());
        let values = DenseND::<f64>::ones(&[3]);
        assert!(CsrTensor::new(vec![0, 1, 2], vec![0, 1], values, (2, 2))
            .unwrap_err()
            .is_shape_error());

        let err = CsrTensor::new(vec![0, 0], vec![], DenseND::scalar(1.0f64), (1, 1)).unwrap_err();
        assert!(matches!(err, SparseError::Shape(ShapeError::ValuesRank { got: 0 })));
    }

    #[test]
    fn test_accessors() {
        let csr = sample();
        assert_eq!(csr.nnz(), 3);
        assert_eq!(csr.shape(), (2, 3));
        assert_eq!(csr.full_shape(), vec![2, 3]);
        assert!((csr.density() - 0.5).abs() < 1e-12);
        let (cols, range) = csr.row(0).unwrap();
        assert_eq!(cols, &[0, 2]);
        assert_eq!(range, 0..2);
        assert!(csr.row(2).is_none());
    }

    #[test]
    fn test_from_coo_groups_rows() {
        let values = DenseND::from_vec(vec![4.0, 1.0, 2.0, 3.0], &[4]).unwrap();
        let coo = CooTensor::new(array![[1, 0, 0, 1], [1, 2, 0, 1]], Some(values), Some(vec![3, 3]), None)
            .unwrap();
        let csr = CsrTensor::from_coo(&coo).unwrap();
        assert_eq!(csr.row_ptr(), &[0, 2, 3, 3]);
        assert_eq!(csr.col_indices(), &[0, 2, 1]);
        assert_eq!(csr.values().to_vec(), vec![2.0, 1.0, 7.0]);
        assert_eq!(csr.to_dense().unwrap(), coo.to_dense().unwrap());
    }

    #[test]
    fn test_from_coo_structure_only() {
        let coo = CooTensor::<f64>::new(array![[0, 0], [1, 1]], None, Some(vec![1, 2]), None).unwrap();
        let csr = CsrTensor::from_coo(&coo).unwrap();
        assert_eq!(csr.values().to_vec(), vec![2.0]);
    }

    #[test]
    fn test_from_coo_needs_two_axes() {
        let coo = CooTensor::<f64>::new(array![[0, 1]], None, None, None).unwrap();
        assert!(CsrTensor::from_coo(&coo).unwrap_err().is_dimension_error());
    }

    #[test]
    fn test_to_coo_round_trip() {
        let csr = sample();
        let coo = csr.to_coo().unwrap();
        assert_eq!(coo.indices(), &array![[0, 0, 1], [0, 2, 1]]);
        assert_eq!(CsrTensor::from_coo(&coo).unwrap(), csr);
    }

    #[test]
    fn test_batched_to_dense() {
        let values = DenseND::from_vec(vec![1.0, 2.0, 10.0, 20.0], &[2, 2]).unwrap();
        let csr = CsrTensor::new(vec![0, 1, 2], vec![1, 0], values, (2, 2)).unwrap();
        let dense = csr.to_dense().unwrap();
        assert_eq!(dense.shape(), &[2, 2, 2]);
        assert_eq!(dense.to_vec(), vec![0.0, 1.0, 2.0, 0.0, 0.0, 10.0, 20.0, 0.0]);
    }

    #[test]
    fn test_matmul_dense() {
        let x = DenseND::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
        assert_eq!(sample().matmul_dense(&x).unwrap().to_vec(), vec![7.0, 6.0]);
    }

    #[test]
    fn test_repeated_column_accumulates() {
        let values = DenseND::from_vec(vec![2.0, 5.0], &[2]).unwrap();
        let csr = CsrTensor::new(vec![0, 2], vec![1, 1], values, (1, 2)).unwrap();
        assert_eq!(csr.to_dense().unwrap().to_vec(), vec![0.0, 7.0]);

        let x = DenseND::from_vec(vec![1.0, 10.0], &[2]).unwrap();
        assert_eq!(csr.matmul_dense(&x).unwrap().to_vec(), vec![70.0]);
        assert_eq!(crate::spmm::par_spmm_csr(&csr, &x).unwrap().to_vec(), vec![70.0]);

        let m = DenseND::from_vec(vec![1.0, 2.0, 10.0, 20.0], &[2, 2]).unwrap();
        assert_eq!(csr.matmul_dense(&m).unwrap().to_vec(), vec![70.0, 140.0]);
    }

    #[test]
    fn test_transpose() {
        let t = sample().transpose().unwrap();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.row_ptr(), &[0, 1, 2, 3]);
        assert_eq!(t.col_indices(), &[0, 1, 0]);
        assert_eq!(t.to_dense().unwrap().to_vec(), vec![1.0, 0.0, 0.0, 3.0, 2.0, 0.0]);
    }

    #[test]
    fn test_scalar_ops() {
        let csr = sample();
        assert_eq!(csr.neg().values().to_vec(), vec![-1.0, -2.0, -3.0]);
        assert_eq!(csr.mul_scalar(2.0).values().to_vec(), vec![2.0, 4.0, 6.0]);
        assert_eq!(csr.div_scalar(2.0).values().to_vec(), vec![0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_add_csr() {
        let csr = sample();
        let sum = csr.add_csr(&csr.transpose().unwrap().transpose().unwrap(), 2.0).unwrap();
        assert_eq!(sum.nnz(), 3);
        assert_eq!(sum.to_dense().unwrap().to_vec(), vec![3.0, 0.0, 6.0, 0.0, 9.0, 0.0]);

        let other = sample().transpose().unwrap();
        assert!(csr.add_csr(&other, 1.0).unwrap_err().is_shape_error());
    }
}
