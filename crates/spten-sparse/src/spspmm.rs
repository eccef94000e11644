//! Sparse × sparse matrix product on coordinate data
//!
//! For A (M×K) and B (K×N), every pair of entries `(i, k, v1)` of A and
//! `(k, j, v2)` of B that share the inner coordinate `k` yields a candidate
//! `(i, j, v1 * v2)`. B is bucketed by row with a counting sort so only
//! matching pairs are visited.
//!
//! The candidates are returned uncoalesced; [`CooTensor::matmul_coo`]
//! merges them before handing the product to the caller.
//!
//! [`CooTensor::matmul_coo`]: crate::CooTensor::matmul_coo
//!
//! # Complexity
//!
//! O(nnz_A + nnz_B + K + P) where P is the number of matching pairs.

use crate::error::{DimensionError, ShapeError, SparseResult};
use crate::tracing_support::record_kernel;
use crate::utils::{broadcast_batch, check_bounds, stack_rows, RowBuckets};
use scirs2_core::ndarray_ext::Array2;
use scirs2_core::numeric::Float;
use spten_core::DenseND;

fn require_matrix(indices: &Array2<usize>, shape: &[usize]) -> SparseResult<()> {
    if indices.nrows() != 2 || shape.len() != 2 {
        return Err(DimensionError::ExactSparseDims {
            operation: "sparse matrix multiplication",
            required: 2,
            got: indices.nrows(),
        }
        .into());
    }
    check_bounds(indices, shape)
}

/// Expand the product of two coordinate matrices
///
/// Returns `(indices, values, sparse_shape)` of the uncoalesced product.
/// Value buffers may carry batch dimensions; they broadcast against each
/// other.
pub fn spspmm_coo<T: Float>(
    a_indices: &Array2<usize>,
    a_values: &DenseND<T>,
    a_shape: &[usize],
    b_indices: &Array2<usize>,
    b_values: &DenseND<T>,
    b_shape: &[usize],
) -> SparseResult<(Array2<usize>, DenseND<T>, Vec<usize>)> {
    require_matrix(a_indices, a_shape)?;
    require_matrix(b_indices, b_shape)?;
    let (m, k) = (a_shape[0], a_shape[1]);
    let (k2, n) = (b_shape[0], b_shape[1]);
    if k != k2 {
        return Err(ShapeError::MatMul {
            m1: m,
            n1: k,
            m2: k2,
            n2: n,
        }
        .into());
    }

    let a_batch = &a_values.shape()[..a_values.rank().saturating_sub(1)];
    let b_batch = &b_values.shape()[..b_values.rank().saturating_sub(1)];
    broadcast_batch(a_batch, b_batch)?;

    let buckets = RowBuckets::build(b_indices.row(0).iter().copied(), k);

    let mut rows = Vec::new();
    let mut cols = Vec::new();
    let mut from_a = Vec::new();
    let mut from_b = Vec::new();
    for (ea, (&i, &inner)) in a_indices
        .row(0)
        .iter()
        .zip(a_indices.row(1).iter())
        .enumerate()
    {
        for &eb in buckets.bucket(inner) {
            rows.push(i);
            cols.push(b_indices[[1, eb]]);
            from_a.push(ea);
            from_b.push(eb);
        }
    }

    let pairs = rows.len();
    let lhs = a_values.take_last(&from_a)?;
    let rhs = b_values.take_last(&from_b)?;
    let values = lhs.zip_with(&rhs, |x, y| x * y)?;
    let indices = stack_rows(&[rows.as_slice(), cols.as_slice()], pairs)?;

    record_kernel("spspmm", a_indices.ncols() + b_indices.ncols(), pairs);
    Ok((indices, values, vec![m, n]))
}
