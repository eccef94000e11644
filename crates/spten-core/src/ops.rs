//! Shape arithmetic shared by the dense backend and the sparse core.
//!
//! All helpers assume C-contiguous (row-major) layout: the first axis varies
//! slowest and the last axis varies fastest.
//!
//! # Examples
//!
//! ```
//! use spten_core::ops::{broadcast_shapes, row_major_strides, unravel_index};
//!
//! assert_eq!(row_major_strides(&[2, 3, 4]), vec![12, 4, 1]);
//! assert_eq!(unravel_index(23, &[2, 3, 4]), vec![1, 2, 3]);
//! assert_eq!(broadcast_shapes(&[3, 1], &[4]).unwrap(), vec![3, 4]);
//! ```

/// Row-major strides for `shape`.
pub fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }
    strides
}

/// Row-major strides for `shape`, or `None` if a stride overflows `usize`.
///
/// Sparse index spaces are never allocated, so their extents can be far
/// larger than any buffer; use this rather than [`row_major_strides`] there.
pub fn checked_row_major_strides(shape: &[usize]) -> Option<Vec<usize>> {
    let mut strides = vec![1usize; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1].checked_mul(shape[axis + 1])?;
    }
    Some(strides)
}

/// Linear (row-major) offset of a multi-index.
///
/// The caller guarantees `index.len() == shape.len()`.
pub fn ravel_index(index: &[usize], shape: &[usize]) -> usize {
    index
        .iter()
        .zip(row_major_strides(shape))
        .map(|(&i, stride)| i * stride)
        .sum()
}

/// Inverse of [`ravel_index`].
pub fn unravel_index(mut linear: usize, shape: &[usize]) -> Vec<usize> {
    let mut index = vec![0; shape.len()];
    for (axis, &extent) in shape.iter().enumerate().rev() {
        if extent == 0 {
            continue;
        }
        index[axis] = linear % extent;
        linear /= extent;
    }
    index
}

/// Number of elements described by `shape` (1 for the empty shape).
///
/// The caller guarantees the product fits in `usize`, which holds for the
/// shape of any allocated buffer.
pub fn numel(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Number of elements described by `shape`, or `None` on overflow.
///
/// ```
/// use spten_core::ops::checked_numel;
///
/// assert_eq!(checked_numel(&[2, 3]), Some(6));
/// assert_eq!(checked_numel(&[1 << 40, 1 << 40]), None);
/// ```
pub fn checked_numel(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// NumPy-style broadcast of two shapes.
///
/// Shapes are right-aligned; an extent of 1 stretches to match the other side.
pub fn broadcast_shapes(a: &[usize], b: &[usize]) -> anyhow::Result<Vec<usize>> {
    let ndim = a.len().max(b.len());
    let mut out = vec![0; ndim];
    for axis in 0..ndim {
        let da = if axis + a.len() >= ndim {
            a[axis + a.len() - ndim]
        } else {
            1
        };
        let db = if axis + b.len() >= ndim {
            b[axis + b.len() - ndim]
        } else {
            1
        };
        out[axis] = match (da, db) {
            (x, y) if x == y => x,
            (1, y) => y,
            (x, 1) => x,
            _ => anyhow::bail!("Cannot broadcast shapes {:?} and {:?}", a, b),
        };
    }
    Ok(out)
}
