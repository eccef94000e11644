//! Index and shape utilities
//!
//! Pure functions over coordinate matrices shaped `(D, nnz)`:
//! - flattening multi-dimensional coordinates into linear indices
//! - lower-triangular filtering over the last two sparse axes
//! - grouping identical coordinate columns (unique with inverse)
//! - shape compatibility checks
//!
//! # Examples
//!
//! ```
//! use scirs2_core::ndarray_ext::array;
//! use spten_sparse::utils::flatten_indices;
//!
//! let indices = array![[0, 1, 2], [3, 0, 1]];
//! let flat = flatten_indices(&indices, &[3, 4]).unwrap();
//! assert_eq!(flat.row(0).to_vec(), vec![3, 4, 9]);
//! ```

use crate::error::{DimensionError, ShapeError, SparseError, SparseResult};
use crate::values::SparseValues;
use scirs2_core::ndarray_ext::{Array2, Axis};
use scirs2_core::numeric::Float;
use spten_core::ops::{broadcast_shapes, checked_numel, checked_row_major_strides};

#[cfg(feature = "parallel")]
use scirs2_core::parallel_ops::*;

/// Map a `(D, nnz)` coordinate matrix to a `(1, nnz)` matrix of linear indices
///
/// Strides are row-major: the first sparse axis varies slowest.
pub fn flatten_indices(indices: &Array2<usize>, sparse_shape: &[usize]) -> SparseResult<Array2<usize>> {
    let flat = linear_indices(indices, sparse_shape)?;
    let nnz = flat.len();
    Ok(Array2::from_shape_vec((1, nnz), flat).map_err(anyhow::Error::from)?)
}

/// Linear index of every coordinate column
pub(crate) fn linear_indices(indices: &Array2<usize>, sparse_shape: &[usize]) -> SparseResult<Vec<usize>> {
    if indices.nrows() != sparse_shape.len() {
        return Err(ShapeError::SparseShapeLength {
            expected: indices.nrows(),
            got: sparse_shape.len(),
        }
        .into());
    }
    index_space_size(sparse_shape)?;
    let overflow = || ShapeError::IndexSpaceOverflow {
        shape: sparse_shape.to_vec(),
    };
    let strides = checked_row_major_strides(sparse_shape).ok_or_else(overflow)?;
    let mut flat = vec![0usize; indices.ncols()];
    for (row, &stride) in indices.axis_iter(Axis(0)).zip(&strides) {
        for (slot, &coord) in flat.iter_mut().zip(row.iter()) {
            let offset = coord.checked_mul(stride).ok_or_else(overflow)?;
            *slot = slot.checked_add(offset).ok_or_else(overflow)?;
        }
    }
    Ok(flat)
}

/// Number of coordinates in `sparse_shape`
///
/// Fails with [`ShapeError::IndexSpaceOverflow`] when the count does not fit
/// in `usize`; linear indexing is impossible for such shapes.
pub(crate) fn index_space_size(sparse_shape: &[usize]) -> SparseResult<usize> {
    checked_numel(sparse_shape).ok_or_else(|| {
        SparseError::from(ShapeError::IndexSpaceOverflow {
            shape: sparse_shape.to_vec(),
        })
    })
}

/// Keep the entries whose last two coordinates satisfy `col <= row + k`
///
/// Relative order of the surviving entries is preserved.
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use spten_sparse::utils::tril_coo;
/// use spten_sparse::SparseValues;
///
/// let indices = array![[0, 0, 1, 2], [0, 2, 1, 0]];
/// let (kept, _) = tril_coo::<f64>(&indices, &SparseValues::StructureOnly, 0).unwrap();
/// assert_eq!(kept, array![[0, 1, 2], [0, 1, 0]]);
/// ```
pub fn tril_coo<T: Float>(
    indices: &Array2<usize>,
    values: &SparseValues<T>,
    k: isize,
) -> SparseResult<(Array2<usize>, SparseValues<T>)> {
    let d = indices.nrows();
    if d < 2 {
        return Err(DimensionError::TooFewSparseDims {
            operation: "tril",
            required: 2,
            got: d,
        }
        .into());
    }
    let rows = indices.row(d - 2);
    let cols = indices.row(d - 1);
    let keep: Vec<usize> = rows
        .iter()
        .zip(cols.iter())
        .enumerate()
        .filter(|(_, (&r, &c))| (c as isize) <= (r as isize) + k)
        .map(|(pos, _)| pos)
        .collect();

    Ok((indices.select(Axis(1), &keep), values.select(&keep)?))
}

/// Unique coordinate columns in lexicographic order, with inverse mapping
///
/// `inverse[e]` is the column of the unique matrix that entry `e` maps to.
pub fn unique_columns(indices: &Array2<usize>) -> (Array2<usize>, Vec<usize>) {
    let nnz = indices.ncols();
    let keys: Vec<Vec<usize>> = indices.axis_iter(Axis(1)).map(|c| c.to_vec()).collect();

    let mut perm: Vec<usize> = (0..nnz).collect();
    #[cfg(feature = "parallel")]
    perm.par_sort_by(|&a, &b| keys[a].cmp(&keys[b]));
    #[cfg(not(feature = "parallel"))]
    perm.sort_by(|&a, &b| keys[a].cmp(&keys[b]));

    let mut inverse = vec![0usize; nnz];
    let mut representatives: Vec<usize> = Vec::new();
    for &e in &perm {
        let is_new = match representatives.last() {
            Some(&prev) => keys[prev] != keys[e],
            None => true,
        };
        if is_new {
            representatives.push(e);
        }
        inverse[e] = representatives.len() - 1;
    }

    (indices.select(Axis(1), &representatives), inverse)
}

/// Entries grouped by row with a stable counting sort
///
/// Entries of row `r` are `order[offsets[r]..offsets[r + 1]]`, so `offsets`
/// doubles as a CSR row pointer. Every row must be below `nrows`.
pub(crate) struct RowBuckets {
    pub(crate) offsets: Vec<usize>,
    pub(crate) order: Vec<usize>,
}

impl RowBuckets {
    pub(crate) fn build(rows: impl Iterator<Item = usize> + Clone, nrows: usize) -> Self {
        let mut offsets = vec![0usize; nrows + 1];
        for r in rows.clone() {
            offsets[r + 1] += 1;
        }
        for r in 0..nrows {
            offsets[r + 1] += offsets[r];
        }
        let mut next = offsets[..nrows].to_vec();
        let mut order = vec![0usize; offsets[nrows]];
        for (e, r) in rows.enumerate() {
            order[next[r]] = e;
            next[r] += 1;
        }
        Self { offsets, order }
    }

    pub(crate) fn bucket(&self, row: usize) -> &[usize] {
        &self.order[self.offsets[row]..self.offsets[row + 1]]
    }
}

/// Fail unless the two full shapes are identical
pub fn check_shape_match(expected: &[usize], got: &[usize]) -> SparseResult<()> {
    if expected != got {
        return Err(SparseError::shape_mismatch(expected.to_vec(), got.to_vec()));
    }
    Ok(())
}

/// Fail unless the two sparse shapes are identical
pub fn check_spshape_match(lhs: &[usize], rhs: &[usize]) -> SparseResult<()> {
    if lhs != rhs {
        return Err(ShapeError::SparseShapeMismatch {
            lhs: lhs.to_vec(),
            rhs: rhs.to_vec(),
        }
        .into());
    }
    Ok(())
}

/// Fail if any coordinate lies outside `sparse_shape`
pub(crate) fn check_bounds(indices: &Array2<usize>, sparse_shape: &[usize]) -> SparseResult<()> {
    if indices.nrows() != sparse_shape.len() {
        return Err(ShapeError::SparseShapeLength {
            expected: indices.nrows(),
            got: sparse_shape.len(),
        }
        .into());
    }
    for (axis, (row, &extent)) in indices.axis_iter(Axis(0)).zip(sparse_shape).enumerate() {
        if let Some(&index) = row.iter().find(|&&i| i >= extent) {
            return Err(ShapeError::IndexOutOfBounds {
                index,
                axis,
                extent,
            }
            .into());
        }
    }
    Ok(())
}

/// Broadcast two batch shapes, reporting failure as a shape error
pub(crate) fn broadcast_batch(lhs: &[usize], rhs: &[usize]) -> SparseResult<Vec<usize>> {
    broadcast_shapes(lhs, rhs).map_err(|_| {
        SparseError::from(ShapeError::Broadcast {
            lhs: lhs.to_vec(),
            rhs: rhs.to_vec(),
        })
    })
}

/// Build a `(rows.len(), nnz)` coordinate matrix from per-axis index rows
pub(crate) fn stack_rows(rows: &[&[usize]], nnz: usize) -> SparseResult<Array2<usize>> {
    let mut data = Vec::with_capacity(rows.len() * nnz);
    for row in rows {
        data.extend_from_slice(row);
    }
    Ok(Array2::from_shape_vec((rows.len(), nnz), data).map_err(anyhow::Error::from)?)
}
