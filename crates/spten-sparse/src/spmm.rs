//! Sparse × dense matrix product
//!
//! For sparse A (M×K) and dense X shaped `(*batch, K, N)` or `(K,)`, every
//! stored entry `(i, k, v)` adds `v * X[..., k, :]` into `Y[..., i, :]`.
//! Contributions are summed, so duplicate coordinates need no coalescing.
//!
//! Batch dimensions of the sparse values and of X broadcast against each
//! other the same way the dense [`DenseND::matmul`] does, and a 1-D X drops
//! its promoted axis from the result.

use crate::error::{DimensionError, ShapeError, SparseError, SparseResult};
use crate::tracing_support::record_kernel;
use crate::utils::{broadcast_batch, check_bounds};
use scirs2_core::ndarray_ext::Array2;
use scirs2_core::numeric::Float;
use spten_core::ops::numel;
use spten_core::DenseND;

#[cfg(feature = "parallel")]
use scirs2_core::parallel_ops::*;

/// Operands broadcast to a common batch shape, flattened row-major
struct Prepared<T> {
    batches: usize,
    nnz: usize,
    m: usize,
    k: usize,
    n: usize,
    values: Vec<T>,
    x: Vec<T>,
    out_shape: Vec<usize>,
}

fn prepare<T: Float>(
    values: &DenseND<T>,
    (m, k): (usize, usize),
    x: &DenseND<T>,
) -> SparseResult<Prepared<T>> {
    let (&nnz, vb) = values
        .shape()
        .split_last()
        .ok_or(ShapeError::ValuesRank { got: 0 })?;
    if x.rank() == 0 {
        return Err(SparseError::unsupported("0-D dense buffer", "matmul"));
    }

    let is_vector = x.rank() == 1;
    let x = if is_vector {
        x.reshape(&[x.len(), 1])?
    } else {
        x.clone()
    };
    let (xb, xm) = x.shape().split_at(x.rank() - 2);
    let (k2, n) = (xm[0], xm[1]);
    if k2 != k {
        return Err(ShapeError::MatMul {
            m1: m,
            n1: k,
            m2: k2,
            n2: n,
        }
        .into());
    }

    let batch = broadcast_batch(vb, xb)?;
    let mut values_shape = batch.clone();
    values_shape.push(nnz);
    let mut x_shape = batch.clone();
    x_shape.extend_from_slice(&[k, n]);

    let mut out_shape = batch.clone();
    out_shape.push(m);
    if !is_vector {
        out_shape.push(n);
    }

    Ok(Prepared {
        batches: numel(&batch),
        nnz,
        m,
        k,
        n,
        values: values.broadcast_to(&values_shape)?.to_vec(),
        x: x.broadcast_to(&x_shape)?.to_vec(),
        out_shape,
    })
}

/// Scatter-add every `(row, col, entry)` triple into the output
fn accumulate<T, I>(p: &Prepared<T>, entries: I) -> Vec<T>
where
    T: Float,
    I: Iterator<Item = (usize, usize, usize)> + Clone,
{
    let mut out = vec![T::zero(); p.batches * p.m * p.n];
    for b in 0..p.batches {
        let (vo, xo, yo) = (b * p.nnz, b * p.k * p.n, b * p.m * p.n);
        for (i, c, e) in entries.clone() {
            let v = p.values[vo + e];
            let src = &p.x[xo + c * p.n..xo + (c + 1) * p.n];
            let dst = &mut out[yo + i * p.n..yo + (i + 1) * p.n];
            for (d, &s) in dst.iter_mut().zip(src) {
                *d = *d + v * s;
            }
        }
    }
    out
}

/// Multiply a coordinate matrix by a dense operand
///
/// `values` is shaped `(*batch, nnz)`; `indices` must have exactly two rows.
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use spten_core::DenseND;
/// use spten_sparse::spmm::spmm_coo;
///
/// let indices = array![[0, 1, 1], [1, 0, 0]];
/// let values = DenseND::from_vec(vec![2.0, 1.0, 3.0], &[3]).unwrap();
/// let x = DenseND::from_vec(vec![10.0, 100.0], &[2]).unwrap();
///
/// let y = spmm_coo(&indices, &values, &[2, 2], &x).unwrap();
/// assert_eq!(y.to_vec(), vec![200.0, 40.0]);
/// ```
pub fn spmm_coo<T: Float>(
    indices: &Array2<usize>,
    values: &DenseND<T>,
    sparse_shape: &[usize],
    x: &DenseND<T>,
) -> SparseResult<DenseND<T>> {
    if indices.nrows() != 2 {
        return Err(DimensionError::ExactSparseDims {
            operation: "sparse-dense multiplication",
            required: 2,
            got: indices.nrows(),
        }
        .into());
    }
    check_bounds(indices, sparse_shape)?;
    let nnz = indices.ncols();
    if values.shape().last() != Some(&nnz) {
        return Err(ShapeError::NnzMismatch {
            nnz,
            got: values.shape().last().copied().unwrap_or(0),
        }
        .into());
    }

    let p = prepare(values, (sparse_shape[0], sparse_shape[1]), x)?;
    let rows = indices.row(0);
    let cols = indices.row(1);
    let entries = rows
        .iter()
        .copied()
        .zip(cols.iter().copied())
        .enumerate()
        .map(|(e, (i, c))| (i, c, e));
    let out = accumulate(&p, entries);

    record_kernel("spmm_coo", nnz, out.len());
    Ok(DenseND::from_vec(out, &p.out_shape)?)
}

/// Multiply compressed rows by a dense operand, scanning row by row
///
/// The caller guarantees a valid row pointer and in-bounds columns.
pub(crate) fn spmm_csr<T: Float>(
    row_ptr: &[usize],
    col_indices: &[usize],
    values: &DenseND<T>,
    shape: (usize, usize),
    x: &DenseND<T>,
) -> SparseResult<DenseND<T>> {
    let p = prepare(values, shape, x)?;
    let entries = (0..shape.0).flat_map(move |r| {
        (row_ptr[r]..row_ptr[r + 1]).map(move |e| (r, col_indices[e], e))
    });
    let out = accumulate(&p, entries);

    record_kernel("spmm_csr", col_indices.len(), out.len());
    Ok(DenseND::from_vec(out, &p.out_shape)?)
}

/// Row-parallel CSR × dense product
///
/// Each output row depends only on its own column range, so rows are
/// computed independently. Falls back to the sequential kernel when the
/// `parallel` feature is disabled.
///
/// # Examples
///
/// ```
/// use spten_core::DenseND;
/// use spten_sparse::spmm::par_spmm_csr;
/// use spten_sparse::CsrTensor;
///
/// let values = DenseND::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
/// let csr = CsrTensor::new(vec![0, 2, 3], vec![0, 2, 1], values, (2, 3)).unwrap();
///
/// let x = DenseND::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
/// let y = par_spmm_csr(&csr, &x).unwrap();
/// assert_eq!(y.to_vec(), vec![7.0, 6.0]);
/// ```
#[cfg(feature = "parallel")]
pub fn par_spmm_csr<T>(csr: &crate::CsrTensor<T>, x: &DenseND<T>) -> SparseResult<DenseND<T>>
where
    T: Float + Send + Sync,
{
    let p = prepare(csr.values(), (csr.nrows(), csr.ncols()), x)?;
    let row_ptr = csr.row_ptr();
    let col_indices = csr.col_indices();

    let mut out = Vec::with_capacity(p.batches * p.m * p.n);
    for b in 0..p.batches {
        let (vo, xo) = (b * p.nnz, b * p.k * p.n);
        let rows: Vec<Vec<T>> = (0..p.m)
            .into_par_iter()
            .map(|r| {
                let mut acc = vec![T::zero(); p.n];
                for e in row_ptr[r]..row_ptr[r + 1] {
                    let v = p.values[vo + e];
                    let c = col_indices[e];
                    for (j, slot) in acc.iter_mut().enumerate() {
                        *slot = *slot + v * p.x[xo + c * p.n + j];
                    }
                }
                acc
            })
            .collect();
        for row in rows {
            out.extend(row);
        }
    }

    record_kernel("par_spmm_csr", csr.nnz(), out.len());
    Ok(DenseND::from_vec(out, &p.out_shape)?)
}

/// Sequential fallback for par_spmm_csr when parallel feature is disabled
#[cfg(not(feature = "parallel"))]
pub fn par_spmm_csr<T: Float>(csr: &crate::CsrTensor<T>, x: &DenseND<T>) -> SparseResult<DenseND<T>> {
    csr.matmul_dense(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scirs2_core::ndarray_ext::array;

    fn diag() -> (Array2<usize>, DenseND<f64>) {
        (
            array![[0, 1], [0, 1]],
            DenseND::from_vec(vec![2.0, 3.0], &[2]).unwrap(),
        )
    }

    #[test]
    fn test_matrix_operand() {
        let (idx, val) = diag();
        let x = DenseND::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
        let y = spmm_coo(&idx, &val, &[2, 2], &x).unwrap();
        assert_eq!(y.shape(), &[2, 3]);
        assert_eq!(y.to_vec(), vec![2.0, 4.0, 6.0, 12.0, 15.0, 18.0]);
    }

    #[test]
    fn test_duplicates_accumulate() {
        let idx = array![[0, 0], [1, 1]];
        let val = DenseND::from_vec(vec![1.0, 4.0], &[2]).unwrap();
        let x = DenseND::from_vec(vec![0.0, 2.0], &[2]).unwrap();
        let y = spmm_coo(&idx, &val, &[1, 2], &x).unwrap();
        assert_eq!(y.to_vec(), vec![10.0]);
    }

    #[test]
    fn test_batched_operand() {
        let (idx, val) = diag();
        let x = DenseND::from_vec(vec![1.0, 1.0, 2.0, 2.0], &[2, 2, 1]).unwrap();
        let y = spmm_coo(&idx, &val, &[2, 2], &x).unwrap();
        assert_eq!(y.shape(), &[2, 2, 1]);
        assert_eq!(y.to_vec(), vec![2.0, 3.0, 4.0, 6.0]);
    }

    #[test]
    fn test_batched_values_with_vector() {
        let idx = array![[0, 1], [0, 1]];
        let val = DenseND::from_vec(vec![1.0, 2.0, 10.0, 20.0], &[2, 2]).unwrap();
        let x = DenseND::from_vec(vec![1.0, 1.0], &[2]).unwrap();
        let y = spmm_coo(&idx, &val, &[2, 2], &x).unwrap();
        assert_eq!(y.shape(), &[2, 2]);
        assert_eq!(y.to_vec(), vec![1.0, 2.0, 10.0, 20.0]);
    }

    #[test]
    fn test_inner_mismatch() {
        let (idx, val) = diag();
        let x = DenseND::<f64>::zeros(&[3]);
        assert!(spmm_coo(&idx, &val, &[2, 2], &x).unwrap_err().is_shape_error());
    }

    #[test]
    fn test_scalar_operand_rejected() {
        let (idx, val) = diag();
        let x = DenseND::scalar(1.0);
        assert!(spmm_coo(&idx, &val, &[2, 2], &x).unwrap_err().is_type_error());
    }

    #[test]
    fn test_csr_row_scan() {
        let val = DenseND::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
        let x = DenseND::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
        let y = spmm_csr(&[0, 2, 3], &[0, 2, 1], &val, (2, 3), &x).unwrap();
        assert_eq!(y.to_vec(), vec![7.0, 6.0]);
    }
}
