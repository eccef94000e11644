//! COO (Coordinate) sparse tensor
//!
//! A coordinate tensor stores a `(D, nnz)` index matrix whose column `k` is
//! the coordinate of entry `k` along the `D` sparse axes, together with an
//! optional value buffer shaped `(*batch, nnz)`. Leading batch axes are dense
//! and shared by every entry. Without values, each stored coordinate counts
//! as 1.
//!
//! Entries are unordered and may repeat; repeated coordinates sum whenever
//! the tensor is materialised. [`CooTensor::coalesce`] merges them.
//!
//! # Sharing
//!
//! Tensors are immutable. Operations that keep the sparsity pattern share the
//! index buffer (and values where they are unchanged) through `Arc`;
//! [`CooTensor::copy`] and [`CooTensor::flatten`] never share.
//!
//! # Examples
//!
//! ```
//! use scirs2_core::ndarray_ext::array;
//! use spten_core::DenseND;
//! use spten_sparse::CooTensor;
//!
//! let indices = array![[0, 1, 0], [0, 1, 0]];
//! let values = DenseND::from_vec(vec![2.0, 3.0, 5.0], &[3]).unwrap();
//! let coo = CooTensor::new(indices, Some(values), Some(vec![2, 2]), None).unwrap();
//!
//! let merged = coo.coalesce(true).unwrap();
//! assert_eq!(merged.nnz(), 2);
//! assert_eq!(merged.to_dense().unwrap().to_vec(), vec![7.0, 0.0, 0.0, 3.0]);
//! ```

use crate::csr::CsrTensor;
use crate::error::{DimensionError, ShapeError, SparseError, SparseResult, ValueError};
use crate::ops::{Operand, SparseOps, SparseOrDense};
use crate::spmm::spmm_coo;
use crate::spspmm::spspmm_coo;
use crate::tracing_support::record_kernel;
use crate::utils::{
    check_bounds, check_shape_match, check_spshape_match, flatten_indices, index_space_size,
    linear_indices, stack_rows, tril_coo, unique_columns,
};
use crate::values::SparseValues;
use scirs2_core::ndarray_ext::{Array2, ArrayD, Axis};
use scirs2_core::numeric::Float;
use spten_core::ops::{numel, unravel_index};
use spten_core::DenseND;
use std::collections::HashMap;
use std::sync::Arc;

/// COO sparse tensor
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use spten_sparse::CooTensor;
///
/// // structure-only: shape inferred from the largest coordinates
/// let coo = CooTensor::<f64>::new(array![[0, 2], [1, 0]], None, None, None).unwrap();
/// assert_eq!(coo.sparse_shape(), &[3, 2]);
/// assert!(!coo.has_values());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CooTensor<T> {
    indices: Arc<Array2<usize>>,
    values: SparseValues<T>,
    sparse_shape: Vec<usize>,
    is_coalesced: Option<bool>,
}

/// One plus the largest coordinate on every axis, 0 for an empty tensor
fn infer_sparse_shape(indices: &Array2<usize>) -> Vec<usize> {
    indices
        .axis_iter(Axis(0))
        .map(|row| row.iter().max().map_or(0, |&m| m + 1))
        .collect()
}

/// Place the columns of `b` after those of `a`
fn concat_columns(a: &Array2<usize>, b: &Array2<usize>) -> SparseResult<Array2<usize>> {
    let nnz = a.ncols() + b.ncols();
    let rows: Vec<Vec<usize>> = a
        .axis_iter(Axis(0))
        .zip(b.axis_iter(Axis(0)))
        .map(|(ra, rb)| ra.iter().chain(rb.iter()).copied().collect())
        .collect();
    let refs: Vec<&[usize]> = rows.iter().map(Vec::as_slice).collect();
    stack_rows(&refs, nnz)
}

impl<T: Float> CooTensor<T> {
    /// Create a COO tensor
    ///
    /// When `sparse_shape` is `None` it is inferred as one plus the largest
    /// coordinate along each axis.
    ///
    /// # Errors
    ///
    /// Returns a shape error if `values` is rank 0, if its last extent is not
    /// the number of index columns, if `sparse_shape` has the wrong length,
    /// or if a coordinate lies outside `sparse_shape`.
    pub fn new(
        indices: Array2<usize>,
        values: Option<DenseND<T>>,
        sparse_shape: Option<Vec<usize>>,
        is_coalesced: Option<bool>,
    ) -> SparseResult<Self> {
        Self::from_shared(
            Arc::new(indices),
            SparseValues::from_option(values),
            sparse_shape,
            is_coalesced,
        )
    }

    /// Create a COO tensor from an index buffer of any rank
    ///
    /// ```
    /// use scirs2_core::ndarray_ext::{ArrayD, IxDyn};
    /// use spten_sparse::CooTensor;
    ///
    /// let flat = ArrayD::<usize>::zeros(IxDyn(&[4]));
    /// let err = CooTensor::<f64>::from_dyn_indices(flat, None, None, None).unwrap_err();
    /// assert!(err.is_shape_error());
    /// ```
    pub fn from_dyn_indices(
        indices: ArrayD<usize>,
        values: Option<DenseND<T>>,
        sparse_shape: Option<Vec<usize>>,
        is_coalesced: Option<bool>,
    ) -> SparseResult<Self> {
        if indices.ndim() != 2 {
            return Err(ShapeError::IndicesRank {
                got: indices.ndim(),
            }
            .into());
        }
        let (d, nnz) = (indices.shape()[0], indices.shape()[1]);
        let data: Vec<usize> = indices.iter().copied().collect();
        let indices = Array2::from_shape_vec((d, nnz), data).map_err(anyhow::Error::from)?;
        Self::new(indices, values, sparse_shape, is_coalesced)
    }

    /// Create a COO tensor around buffers that may be shared with other tensors
    pub fn from_shared(
        indices: Arc<Array2<usize>>,
        values: SparseValues<T>,
        sparse_shape: Option<Vec<usize>>,
        is_coalesced: Option<bool>,
    ) -> SparseResult<Self> {
        values.validate(indices.ncols())?;
        let sparse_shape = match sparse_shape {
            Some(shape) => {
                check_bounds(&indices, &shape)?;
                shape
            }
            None => infer_sparse_shape(&indices),
        };
        Ok(Self::assemble(indices, values, sparse_shape, is_coalesced))
    }

    /// An empty tensor with the given sparse shape and no batch axes
    pub fn from_shape(sparse_shape: &[usize]) -> Self {
        Self::assemble(
            Arc::new(Array2::zeros((sparse_shape.len(), 0))),
            SparseValues::new(DenseND::zeros(&[0])),
            sparse_shape.to_vec(),
            Some(true),
        )
    }

    /// Build from one index array per sparse axis and a value buffer
    ///
    /// ```
    /// use spten_core::DenseND;
    /// use spten_sparse::CooTensor;
    ///
    /// let values = DenseND::from_vec(vec![1.0, 2.0], &[2]).unwrap();
    /// let coo = CooTensor::from_triplet(values, &[vec![0, 3], vec![1, 1]], None).unwrap();
    /// assert_eq!(coo.sparse_shape(), &[4, 2]);
    /// ```
    pub fn from_triplet(
        values: DenseND<T>,
        indices: &[Vec<usize>],
        sparse_shape: Option<Vec<usize>>,
    ) -> SparseResult<Self> {
        let nnz = match indices.first() {
            Some(first) => first.len(),
            None => return Err(ShapeError::EmptyIndices.into()),
        };
        if indices.iter().any(|row| row.len() != nnz) {
            return Err(ShapeError::RaggedIndices {
                lengths: indices.iter().map(Vec::len).collect(),
            }
            .into());
        }
        let rows: Vec<&[usize]> = indices.iter().map(Vec::as_slice).collect();
        let indices = stack_rows(&rows, nnz)?;
        Self::new(indices, Some(values), sparse_shape, None)
    }

    /// Convert a dense buffer whose trailing `sparse_dims` axes become sparse
    ///
    /// `None` makes every axis sparse. A coordinate is stored when any batch
    /// entry at that position is non-zero. The result is coalesced with
    /// coordinates in row-major order.
    ///
    /// ```
    /// use spten_core::DenseND;
    /// use spten_sparse::CooTensor;
    ///
    /// let dense = DenseND::from_vec(vec![0.0, 1.0, 2.0, 0.0], &[2, 2]).unwrap();
    /// let coo = CooTensor::from_dense(&dense, None).unwrap();
    /// assert_eq!(coo.nnz(), 2);
    /// assert_eq!(coo.to_dense().unwrap(), dense);
    /// ```
    pub fn from_dense(dense: &DenseND<T>, sparse_dims: Option<usize>) -> SparseResult<Self> {
        let rank = dense.rank();
        let sparse_dims = sparse_dims.unwrap_or(rank);
        if sparse_dims == 0 || sparse_dims > rank {
            return Err(DimensionError::TooFewSparseDims {
                operation: "conversion from dense",
                required: sparse_dims.max(1),
                got: rank,
            }
            .into());
        }
        let (batch_shape, sparse_shape) = dense.shape().split_at(rank - sparse_dims);
        let (batch_shape, sparse_shape) = (batch_shape.to_vec(), sparse_shape.to_vec());
        let size = numel(&sparse_shape);
        let mut flat_shape = batch_shape.clone();
        flat_shape.push(size);
        let flat = dense.reshape(&flat_shape)?;
        let data = flat.to_vec();

        let kept: Vec<usize> = (0..size)
            .filter(|&lin| {
                (0..numel(&batch_shape)).any(|b| data[b * size + lin] != T::zero())
            })
            .collect();

        let nnz = kept.len();
        let mut coords = vec![0usize; sparse_dims * nnz];
        for (e, &lin) in kept.iter().enumerate() {
            for (axis, c) in unravel_index(lin, &sparse_shape).into_iter().enumerate() {
                coords[axis * nnz + e] = c;
            }
        }
        let indices = Array2::from_shape_vec((sparse_dims, nnz), coords).map_err(anyhow::Error::from)?;
        let values = flat.take_last(&kept)?;

        Ok(Self::assemble(
            Arc::new(indices),
            SparseValues::new(values),
            sparse_shape,
            Some(true),
        ))
    }

    /// Construct without validation; callers uphold every invariant
    fn assemble(
        indices: Arc<Array2<usize>>,
        values: SparseValues<T>,
        sparse_shape: Vec<usize>,
        is_coalesced: Option<bool>,
    ) -> Self {
        Self {
            indices,
            values,
            sparse_shape,
            is_coalesced,
        }
    }

    /// Same coordinates, new values
    fn with_values(&self, values: SparseValues<T>) -> Self {
        Self::assemble(
            Arc::clone(&self.indices),
            values,
            self.sparse_shape.clone(),
            self.is_coalesced,
        )
    }

    pub fn indices(&self) -> &Array2<usize> {
        &self.indices
    }

    /// Shared handle to the index buffer
    pub fn shared_indices(&self) -> Arc<Array2<usize>> {
        Arc::clone(&self.indices)
    }

    /// The explicit value buffer; `None` for a structure-only tensor
    pub fn values(&self) -> Option<&DenseND<T>> {
        self.values.as_dense()
    }

    pub fn sparse_values(&self) -> &SparseValues<T> {
        &self.values
    }

    pub fn has_values(&self) -> bool {
        !self.values.is_structure_only()
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.indices.ncols()
    }

    pub fn sparse_ndim(&self) -> usize {
        self.indices.nrows()
    }

    pub fn dense_ndim(&self) -> usize {
        self.values.dense_shape().len()
    }

    pub fn ndim(&self) -> usize {
        self.dense_ndim() + self.sparse_ndim()
    }

    pub fn sparse_shape(&self) -> &[usize] {
        &self.sparse_shape
    }

    /// Batch shape carried by the values
    pub fn dense_shape(&self) -> Vec<usize> {
        self.values.dense_shape()
    }

    /// Full logical shape: batch axes followed by sparse axes
    pub fn shape(&self) -> Vec<usize> {
        let mut shape = self.dense_shape();
        shape.extend_from_slice(&self.sparse_shape);
        shape
    }

    /// `Some(true)` when duplicates are known to be merged, `None` if unknown
    pub fn is_coalesced(&self) -> Option<bool> {
        self.is_coalesced
    }

    /// Fraction of the sparse index space that is stored
    pub fn density(&self) -> f64 {
        let total: f64 = self.sparse_shape.iter().map(|&d| d as f64).product();
        if total == 0.0 {
            0.0
        } else {
            self.nnz() as f64 / total
        }
    }

    /// Scatter-add the entries into `acc`, shaped `(*batch, prod(sparse_shape))`
    fn scatter_into(&self, acc: &mut DenseND<T>, fill_value: T) -> SparseResult<()> {
        let flat = linear_indices(&self.indices, &self.sparse_shape)?;
        match &self.values {
            SparseValues::Values(v) => acc.index_add_last(&flat, v)?,
            SparseValues::StructureOnly => {
                acc.index_add_last(&flat, &DenseND::from_elem(&[self.nnz()], fill_value))?
            }
        }
        Ok(())
    }

    /// `(*batch, prod(sparse_shape))`
    fn flat_shape(&self) -> SparseResult<Vec<usize>> {
        let mut shape = self.dense_shape();
        shape.push(index_space_size(&self.sparse_shape)?);
        Ok(shape)
    }

    /// Materialise as a dense buffer shaped [`CooTensor::shape`]
    ///
    /// Repeated coordinates sum. Structure-only entries contribute 1.
    pub fn to_dense(&self) -> SparseResult<DenseND<T>> {
        self.to_dense_with_fill(T::one())
    }

    /// Materialise with `fill_value` standing in for absent values
    pub fn to_dense_with_fill(&self, fill_value: T) -> SparseResult<DenseND<T>> {
        let mut acc = DenseND::zeros(&self.flat_shape()?);
        self.scatter_into(&mut acc, fill_value)?;
        Ok(acc.reshape(&self.shape())?)
    }

    /// Merge entries that share a coordinate
    ///
    /// Values of a group are summed. A structure-only tensor gets the group
    /// sizes as values when `accumulate` is true and stays structure-only
    /// otherwise. Coordinates of the result are in lexicographic order.
    /// A tensor already flagged as coalesced is returned as is.
    pub fn coalesce(&self, accumulate: bool) -> SparseResult<Self> {
        if self.is_coalesced == Some(true) {
            return Ok(self.clone());
        }

        let (unique, inverse) = unique_columns(&self.indices);
        let groups = unique.ncols();
        let values = match &self.values {
            SparseValues::Values(v) => {
                let mut shape = self.dense_shape();
                shape.push(groups);
                let mut acc = DenseND::zeros(&shape);
                acc.index_add_last(&inverse, v)?;
                SparseValues::new(acc)
            }
            SparseValues::StructureOnly if accumulate => {
                let mut acc = DenseND::zeros(&[groups]);
                acc.index_add_last(&inverse, &DenseND::ones(&[self.nnz()]))?;
                SparseValues::new(acc)
            }
            SparseValues::StructureOnly => SparseValues::StructureOnly,
        };

        record_kernel("coalesce", self.nnz(), groups);
        Ok(Self::assemble(
            Arc::new(unique),
            values,
            self.sparse_shape.clone(),
            Some(true),
        ))
    }

    /// Swap the last two sparse axes
    ///
    /// Outer sparse axes and batch axes are untouched.
    ///
    /// # Errors
    ///
    /// Returns a dimension error with fewer than two sparse axes.
    pub fn transpose(&self) -> SparseResult<Self> {
        let d = self.sparse_ndim();
        if d < 2 {
            return Err(DimensionError::TooFewSparseDims {
                operation: "transpose",
                required: 2,
                got: d,
            }
            .into());
        }
        let mut order: Vec<usize> = (0..d).collect();
        order.swap(d - 2, d - 1);
        let mut shape = self.sparse_shape.clone();
        shape.swap(d - 2, d - 1);

        Ok(Self::assemble(
            Arc::new(self.indices.select(Axis(0), &order)),
            self.values.clone(),
            shape,
            self.is_coalesced,
        ))
    }

    /// Keep entries on or below the `k`-th diagonal of the last two axes
    pub fn tril(&self, k: isize) -> SparseResult<Self> {
        let (indices, values) = tril_coo(&self.indices, &self.values, k)?;
        Ok(Self::assemble(
            Arc::new(indices),
            values,
            self.sparse_shape.clone(),
            self.is_coalesced,
        ))
    }

    /// Collapse the sparse axes into one, sharing the values
    pub fn ravel(&self) -> SparseResult<Self> {
        let flat = flatten_indices(&self.indices, &self.sparse_shape)?;
        Ok(Self::assemble(
            Arc::new(flat),
            self.values.clone(),
            vec![index_space_size(&self.sparse_shape)?],
            self.is_coalesced,
        ))
    }

    /// Collapse the sparse axes into one, copying the values
    pub fn flatten(&self) -> SparseResult<Self> {
        let flat = flatten_indices(&self.indices, &self.sparse_shape)?;
        Ok(Self::assemble(
            Arc::new(flat),
            self.values.deep_copy(),
            vec![index_space_size(&self.sparse_shape)?],
            self.is_coalesced,
        ))
    }

    /// Reinterpret the sparse axes with a new shape of equal size
    ///
    /// ```
    /// use scirs2_core::ndarray_ext::array;
    /// use spten_sparse::CooTensor;
    ///
    /// let coo = CooTensor::<f64>::new(array![[1], [2]], None, Some(vec![2, 3]), None).unwrap();
    /// let r = coo.reshape(&[3, 2]).unwrap();
    /// assert_eq!(r.indices(), &array![[2], [1]]);
    /// assert!(coo.reshape(&[4, 2]).is_err());
    /// ```
    pub fn reshape(&self, new_shape: &[usize]) -> SparseResult<Self> {
        if index_space_size(new_shape)? != index_space_size(&self.sparse_shape)? {
            return Err(ShapeError::Reshape {
                from: self.sparse_shape.clone(),
                to: new_shape.to_vec(),
            }
            .into());
        }
        let flat = linear_indices(&self.indices, &self.sparse_shape)?;
        let nnz = flat.len();
        let d = new_shape.len();
        let mut coords = vec![0usize; d * nnz];
        for (e, &lin) in flat.iter().enumerate() {
            for (axis, c) in unravel_index(lin, new_shape).into_iter().enumerate() {
                coords[axis * nnz + e] = c;
            }
        }
        let indices = Array2::from_shape_vec((d, nnz), coords).map_err(anyhow::Error::from)?;

        Ok(Self::assemble(
            Arc::new(indices),
            self.values.clone(),
            new_shape.to_vec(),
            self.is_coalesced,
        ))
    }

    /// Deep copy sharing no buffer with `self`
    pub fn copy(&self) -> Self {
        Self::assemble(
            Arc::new(self.indices.as_ref().clone()),
            self.values.deep_copy(),
            self.sparse_shape.clone(),
            self.is_coalesced,
        )
    }

    /// Negate the values; a structure-only tensor is returned unchanged
    pub fn neg(&self) -> Self {
        self.with_values(self.values.map(|&v| -v))
    }

    /// Add `alpha * scalar` to every stored value
    ///
    /// Structure-only entries are treated as 1 and the result carries values.
    pub fn add_scalar(&self, scalar: T, alpha: T) -> Self {
        let shift = alpha * scalar;
        let values = self.values.materialize(self.nnz()).map(|&v| v + shift);
        self.with_values(SparseValues::new(values))
    }

    /// Concatenate the entries of `self` and `alpha * other`
    ///
    /// Duplicates are kept; call [`CooTensor::coalesce`] to merge them.
    ///
    /// # Errors
    ///
    /// Shape errors when the shapes differ, a value error when exactly one
    /// side is structure-only.
    pub fn add_coo(&self, other: &CooTensor<T>, alpha: T) -> SparseResult<Self> {
        check_shape_match(&self.shape(), &other.shape())?;
        check_spshape_match(&self.sparse_shape, &other.sparse_shape)?;
        let indices = concat_columns(&self.indices, &other.indices)?;
        let values = match (&self.values, &other.values) {
            (SparseValues::StructureOnly, SparseValues::StructureOnly) => {
                SparseValues::StructureOnly
            }
            (SparseValues::StructureOnly, SparseValues::Values(_)) => {
                return Err(ValueError::OtherHasValues.into())
            }
            (SparseValues::Values(_), SparseValues::StructureOnly) => {
                return Err(ValueError::SelfHasValues.into())
            }
            (SparseValues::Values(a), SparseValues::Values(b)) => {
                let scaled = b.map(|&v| v * alpha);
                SparseValues::new(DenseND::concatenate_last(&[&**a, &scaled])?)
            }
        };
        Ok(Self::assemble(
            Arc::new(indices),
            values,
            self.sparse_shape.clone(),
            None,
        ))
    }

    /// `alpha * dense` with the entries of `self` scatter-added on top
    pub fn add_dense(&self, dense: &DenseND<T>, alpha: T) -> SparseResult<DenseND<T>> {
        check_shape_match(&self.shape(), dense.shape())?;
        let mut acc = dense.map(|&v| v * alpha).reshape(&self.flat_shape()?)?;
        self.scatter_into(&mut acc, T::one())?;
        Ok(acc.reshape(&self.shape())?)
    }

    /// Entries of `dense` at the stored coordinates, shaped `(*batch, nnz)`
    fn gather(&self, dense: &DenseND<T>) -> SparseResult<DenseND<T>> {
        check_shape_match(&self.shape(), dense.shape())?;
        let flat = linear_indices(&self.indices, &self.sparse_shape)?;
        Ok(dense.reshape(&self.flat_shape()?)?.take_last(&flat)?)
    }

    fn require_values(&self, operation: &'static str) -> SparseResult<&DenseND<T>> {
        self.values
            .as_dense()
            .ok_or_else(|| SparseError::missing_values(operation))
    }

    pub fn mul_scalar(&self, scalar: T) -> SparseResult<Self> {
        let v = self.require_values("multiply")?;
        Ok(self.with_values(SparseValues::new(v.map(|&x| x * scalar))))
    }

    /// Multiply by `dense` at the stored coordinates
    pub fn mul_dense(&self, dense: &DenseND<T>) -> SparseResult<Self> {
        let v = self.require_values("multiply")?;
        let gathered = self.gather(dense)?;
        Ok(self.with_values(SparseValues::new(v.zip_with(&gathered, |a, b| a * b)?)))
    }

    /// Hadamard product with another COO tensor
    ///
    /// Only coordinates present in both operands survive. Both sides are
    /// coalesced first, so a structure-only operand contributes the number
    /// of times each coordinate was stored. Two structure-only operands give
    /// the structure-only intersection of their patterns.
    ///
    /// ```
    /// use scirs2_core::ndarray_ext::array;
    /// use spten_core::DenseND;
    /// use spten_sparse::CooTensor;
    ///
    /// let a = CooTensor::new(
    ///     array![[0, 1], [0, 1]],
    ///     Some(DenseND::from_vec(vec![2.0, 3.0], &[2]).unwrap()),
    ///     Some(vec![2, 2]),
    ///     None,
    /// )
    /// .unwrap();
    /// let b = CooTensor::new(
    ///     array![[1, 1], [0, 1]],
    ///     Some(DenseND::from_vec(vec![7.0, 4.0], &[2]).unwrap()),
    ///     Some(vec![2, 2]),
    ///     None,
    /// )
    /// .unwrap();
    /// let c = a.mul_coo(&b).unwrap();
    /// assert_eq!(c.to_dense().unwrap().to_vec(), vec![0.0, 0.0, 0.0, 12.0]);
    /// ```
    pub fn mul_coo(&self, other: &CooTensor<T>) -> SparseResult<Self> {
        check_shape_match(&self.shape(), &other.shape())?;
        check_spshape_match(&self.sparse_shape, &other.sparse_shape)?;
        // Two patterns intersect to a pattern
        let accumulate = self.has_values() || other.has_values();
        let lhs = self.coalesce(accumulate)?;
        let rhs = other.coalesce(accumulate)?;

        // Keyed on whole coordinate columns; linear indices may not fit in usize
        let rhs_positions: HashMap<Vec<usize>, usize> = rhs
            .indices
            .axis_iter(Axis(1))
            .enumerate()
            .map(|(pos, col)| (col.to_vec(), pos))
            .collect();
        let (keep_lhs, keep_rhs): (Vec<usize>, Vec<usize>) = lhs
            .indices
            .axis_iter(Axis(1))
            .enumerate()
            .filter_map(|(pos, col)| rhs_positions.get(&col.to_vec()).map(|&other| (pos, other)))
            .unzip();

        let values = match (&lhs.values, &rhs.values) {
            (SparseValues::StructureOnly, SparseValues::StructureOnly) => {
                SparseValues::StructureOnly
            }
            (a, b) => {
                let a = a.materialize(lhs.nnz()).take_last(&keep_lhs)?;
                let b = b.materialize(rhs.nnz()).take_last(&keep_rhs)?;
                SparseValues::new(a.zip_with(&b, |x, y| x * y)?)
            }
        };

        Ok(Self::assemble(
            Arc::new(lhs.indices.select(Axis(1), &keep_lhs)),
            values,
            self.sparse_shape.clone(),
            Some(true),
        ))
    }

    pub fn div_scalar(&self, scalar: T) -> SparseResult<Self> {
        let v = self.require_values("divide")?;
        Ok(self.with_values(SparseValues::new(v.map(|&x| x / scalar))))
    }

    /// Divide by `dense` at the stored coordinates
    pub fn div_dense(&self, dense: &DenseND<T>) -> SparseResult<Self> {
        let v = self.require_values("divide")?;
        let gathered = self.gather(dense)?;
        Ok(self.with_values(SparseValues::new(v.zip_with(&gathered, |a, b| a / b)?)))
    }

    pub fn pow_scalar(&self, exponent: T) -> SparseResult<Self> {
        let v = self.require_values("power")?;
        Ok(self.with_values(SparseValues::new(v.map(|&x| x.powf(exponent)))))
    }

    /// Raise the values to the entries of `dense` at the stored coordinates
    pub fn pow_dense(&self, dense: &DenseND<T>) -> SparseResult<Self> {
        let v = self.require_values("power")?;
        let gathered = self.gather(dense)?;
        Ok(self.with_values(SparseValues::new(v.zip_with(&gathered, |a, b| a.powf(b))?)))
    }

    /// Sparse × sparse product, returned coalesced
    ///
    /// ```
    /// use scirs2_core::ndarray_ext::array;
    /// use spten_core::DenseND;
    /// use spten_sparse::CooTensor;
    ///
    /// let a = CooTensor::new(
    ///     array![[0, 0], [0, 1]],
    ///     Some(DenseND::from_vec(vec![1.0, 2.0], &[2]).unwrap()),
    ///     Some(vec![1, 2]),
    ///     None,
    /// )
    /// .unwrap();
    /// let b = CooTensor::new(
    ///     array![[0, 1], [0, 0]],
    ///     Some(DenseND::from_vec(vec![3.0, 4.0], &[2]).unwrap()),
    ///     Some(vec![2, 1]),
    ///     None,
    /// )
    /// .unwrap();
    ///
    /// let c = a.matmul_coo(&b).unwrap();
    /// assert_eq!(c.is_coalesced(), Some(true));
    /// assert_eq!(c.nnz(), 1);
    /// assert_eq!(c.values().unwrap().to_vec(), vec![11.0]);
    /// ```
    pub fn matmul_coo(&self, other: &CooTensor<T>) -> SparseResult<Self> {
        let a = self.require_values("matrix-multiply")?;
        let b = other.require_values("matrix-multiply")?;
        let (indices, values, sparse_shape) = spspmm_coo(
            &self.indices,
            a,
            &self.sparse_shape,
            &other.indices,
            b,
            &other.sparse_shape,
        )?;
        Self::assemble(Arc::new(indices), SparseValues::new(values), sparse_shape, None)
            .coalesce(true)
    }

    /// Sparse × dense product
    ///
    /// A 1-D operand is a matrix-vector product; higher ranks are
    /// (batched) matrix-matrix products.
    pub fn matmul_dense(&self, x: &DenseND<T>) -> SparseResult<DenseND<T>> {
        let v = self.require_values("matrix-multiply")?;
        spmm_coo(&self.indices, v, &self.sparse_shape, x)
    }

    /// Convert to compressed rows
    pub fn to_csr(&self) -> SparseResult<CsrTensor<T>> {
        CsrTensor::from_coo(self)
    }

    /// Addition dispatched on the operand kind
    ///
    /// A dense operand gives a dense result; scalars and COO tensors give a
    /// COO tensor.
    pub fn add(&self, other: Operand<'_, T>, alpha: T) -> SparseResult<SparseOrDense<T>> {
        match other {
            Operand::Scalar(s) => Ok(SparseOrDense::Sparse(self.add_scalar(s, alpha))),
            Operand::Dense(d) => Ok(SparseOrDense::Dense(self.add_dense(d, alpha)?)),
            Operand::Coo(c) => Ok(SparseOrDense::Sparse(self.add_coo(c, alpha)?)),
            other => Err(SparseError::unsupported(other.type_name(), "addition")),
        }
    }

    /// Elementwise multiplication dispatched on the operand kind
    pub fn mul(&self, other: Operand<'_, T>) -> SparseResult<Self> {
        match other {
            Operand::Scalar(s) => self.mul_scalar(s),
            Operand::Dense(d) => self.mul_dense(d),
            Operand::Coo(c) => self.mul_coo(c),
            other => Err(SparseError::unsupported(other.type_name(), "multiplication")),
        }
    }

    /// Elementwise division dispatched on the operand kind
    pub fn div(&self, other: Operand<'_, T>) -> SparseResult<Self> {
        self.require_values("divide")?;
        match other {
            Operand::Scalar(s) => self.div_scalar(s),
            Operand::Dense(d) => self.div_dense(d),
            other => Err(SparseError::unsupported(other.type_name(), "division")),
        }
    }

    /// Elementwise power dispatched on the operand kind
    pub fn pow(&self, other: Operand<'_, T>) -> SparseResult<Self> {
        self.require_values("power")?;
        match other {
            Operand::Scalar(s) => self.pow_scalar(s),
            Operand::Dense(d) => self.pow_dense(d),
            other => Err(SparseError::unsupported(other.type_name(), "power")),
        }
    }

    /// Matrix product dispatched on the operand kind
    pub fn matmul(&self, other: Operand<'_, T>) -> SparseResult<SparseOrDense<T>> {
        match other {
            Operand::Coo(c) => Ok(SparseOrDense::Sparse(self.matmul_coo(c)?)),
            Operand::Dense(d) => Ok(SparseOrDense::Dense(self.matmul_dense(d)?)),
            other => Err(SparseError::unsupported(other.type_name(), "matmul")),
        }
    }
}

impl<T: Float> SparseOps<T> for CooTensor<T> {
    fn shape(&self) -> Vec<usize> {
        CooTensor::shape(self)
    }

    fn nnz(&self) -> usize {
        CooTensor::nnz(self)
    }

    fn density(&self) -> f64 {
        CooTensor::density(self)
    }

    fn to_dense(&self) -> SparseResult<DenseND<T>> {
        CooTensor::to_dense(self)
    }

    fn matmul_dense(&self, x: &DenseND<T>) -> SparseResult<DenseND<T>> {
        CooTensor::matmul_dense(self, x)
    }
}
