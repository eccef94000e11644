//! Dense N-dimensional buffer used as the array backend of the sparse core
//!
//! `DenseND<T>` wraps a dynamic-rank `scirs2_core` array and exposes the small
//! set of primitives the sparse engine needs from a dense backend:
//!
//! - elementwise arithmetic with broadcasting ([`DenseND::zip_with`], [`DenseND::map`])
//! - reshape / broadcast / concatenation along the last axis
//! - gather ([`DenseND::take_last`]) and scatter-add ([`DenseND::index_add_last`])
//!   along the last axis
//! - a reference dense [`DenseND::matmul`] with batch broadcasting
//!
//! # SciRS2 Integration
//!
//! All array operations use `scirs2_core::ndarray_ext`.

use crate::ops::{broadcast_shapes, numel};
use scirs2_core::ndarray_ext::{Array, ArrayView, IxDyn};
use scirs2_core::numeric::Num;
use std::fmt;

/// Dense N-dimensional tensor in C-contiguous order
///
/// # Examples
///
/// ```
/// use spten_core::DenseND;
///
/// let t = DenseND::<f64>::zeros(&[2, 3]);
/// assert_eq!(t.shape(), &[2, 3]);
/// assert_eq!(t.rank(), 2);
/// ```
#[derive(Clone, PartialEq)]
pub struct DenseND<T> {
    pub(crate) data: Array<T, IxDyn>,
}

impl<T> DenseND<T>
where
    T: Clone + Num,
{
    /// Create a tensor from an existing dynamic-rank array
    pub fn from_array(array: Array<T, IxDyn>) -> Self {
        Self { data: array }
    }

    /// Create a tensor from row-major data
    ///
    /// ```
    /// use spten_core::DenseND;
    ///
    /// let t = DenseND::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
    /// assert_eq!(t[&[1, 0]], 3.0);
    /// assert!(DenseND::from_vec(vec![1.0], &[2, 2]).is_err());
    /// ```
    pub fn from_vec(vec: Vec<T>, shape: &[usize]) -> anyhow::Result<Self> {
        let total = numel(shape);
        if vec.len() != total {
            anyhow::bail!(
                "Shape {:?} requires {} elements, but got {}",
                shape,
                total,
                vec.len()
            );
        }
        let array = Array::from_shape_vec(IxDyn(shape), vec)?;
        Ok(Self { data: array })
    }

    /// A rank-0 tensor holding one value
    pub fn scalar(value: T) -> Self {
        Self::from_elem(&[], value)
    }

    /// Create a tensor filled with `value`
    pub fn from_elem(shape: &[usize], value: T) -> Self {
        Self {
            data: Array::from_elem(IxDyn(shape), value),
        }
    }

    /// Create a tensor of zeros
    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            data: Array::zeros(IxDyn(shape)),
        }
    }

    /// Create a tensor of ones
    pub fn ones(shape: &[usize]) -> Self {
        Self {
            data: Array::ones(IxDyn(shape)),
        }
    }

    /// Number of dimensions
    pub fn rank(&self) -> usize {
        self.data.ndim()
    }

    /// Shape of this tensor
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Owned copy of the shape
    pub fn shape_vec(&self) -> Vec<usize> {
        self.shape().to_vec()
    }

    /// Total number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the tensor holds zero elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Underlying array
    pub fn as_array(&self) -> &Array<T, IxDyn> {
        &self.data
    }

    /// Immutable view
    pub fn view(&self) -> ArrayView<'_, T, IxDyn> {
        self.data.view()
    }

    /// Element at `index`, or `None` when out of bounds
    pub fn get(&self, index: &[usize]) -> Option<&T> {
        if index.len() != self.rank() {
            return None;
        }
        self.data.get(IxDyn(index))
    }

    /// Elements in row-major order
    pub fn to_vec(&self) -> Vec<T> {
        self.data.iter().cloned().collect()
    }

    /// Reshape to `new_shape` (copying into row-major order)
    ///
    /// ```
    /// use spten_core::DenseND;
    ///
    /// let t = DenseND::<f64>::zeros(&[2, 3, 4]);
    /// assert_eq!(t.reshape(&[6, 4]).unwrap().shape(), &[6, 4]);
    /// assert!(t.reshape(&[7]).is_err());
    /// ```
    pub fn reshape(&self, new_shape: &[usize]) -> anyhow::Result<Self> {
        if numel(new_shape) != self.len() {
            anyhow::bail!(
                "Cannot reshape tensor of shape {:?} ({} elements) into {:?}",
                self.shape(),
                self.len(),
                new_shape
            );
        }
        Self::from_vec(self.to_vec(), new_shape)
    }

    /// Broadcast to `target_shape` following NumPy rules
    pub fn broadcast_to(&self, target_shape: &[usize]) -> anyhow::Result<Self> {
        match self.data.broadcast(IxDyn(target_shape)) {
            Some(view) => Ok(Self {
                data: view.to_owned(),
            }),
            None => anyhow::bail!(
                "Cannot broadcast shape {:?} to {:?}",
                self.shape(),
                target_shape
            ),
        }
    }

    /// Apply `f` to every element
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(&T) -> T,
    {
        Self {
            data: self.data.map(f),
        }
    }

    /// Combine two tensors elementwise after broadcasting them together
    ///
    /// ```
    /// use spten_core::DenseND;
    ///
    /// let a = DenseND::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
    /// let b = DenseND::from_vec(vec![10.0, 20.0], &[2]).unwrap();
    /// let c = a.zip_with(&b, |x, y| x + y).unwrap();
    /// assert_eq!(c.to_vec(), vec![11.0, 22.0, 13.0, 24.0]);
    /// ```
    pub fn zip_with<F>(&self, other: &Self, f: F) -> anyhow::Result<Self>
    where
        F: Fn(T, T) -> T,
    {
        let shape = broadcast_shapes(self.shape(), other.shape())?;
        let lhs = self.broadcast_to(&shape)?;
        let rhs = other.broadcast_to(&shape)?;
        let data: Vec<T> = lhs
            .data
            .iter()
            .zip(rhs.data.iter())
            .map(|(a, b)| f(a.clone(), b.clone()))
            .collect();
        Self::from_vec(data, &shape)
    }

    /// Split the shape into (leading elements, last extent)
    fn leading_and_last(&self) -> anyhow::Result<(usize, usize)> {
        match self.shape().split_last() {
            Some((&last, lead)) => Ok((numel(lead), last)),
            None => anyhow::bail!("Operation along the last axis requires rank >= 1"),
        }
    }

    /// Gather along the last axis: `out[..., k] = self[..., index[k]]`
    ///
    /// ```
    /// use spten_core::DenseND;
    ///
    /// let t = DenseND::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// let g = t.take_last(&[2, 0]).unwrap();
    /// assert_eq!(g.shape(), &[2, 2]);
    /// assert_eq!(g.to_vec(), vec![3.0, 1.0, 6.0, 4.0]);
    /// ```
    pub fn take_last(&self, index: &[usize]) -> anyhow::Result<Self> {
        let (lead, last) = self.leading_and_last()?;
        if let Some(&bad) = index.iter().find(|&&i| i >= last) {
            anyhow::bail!("Gather index {} out of bounds for axis of size {}", bad, last);
        }
        let src = self.to_vec();
        let mut out = Vec::with_capacity(lead * index.len());
        for row in 0..lead {
            let base = row * last;
            out.extend(index.iter().map(|&i| src[base + i].clone()));
        }
        let mut shape = self.shape_vec();
        if let Some(tail) = shape.last_mut() {
            *tail = index.len();
        }
        Self::from_vec(out, &shape)
    }

    /// Scatter-add along the last axis: `self[..., index[k]] += src[..., k]`
    ///
    /// Repeated destinations accumulate. The leading shapes of `self` and `src`
    /// must agree and `index.len()` must equal the last extent of `src`.
    ///
    /// ```
    /// use spten_core::DenseND;
    ///
    /// let mut acc = DenseND::<f64>::zeros(&[3]);
    /// let src = DenseND::from_vec(vec![1.0, 2.0, 5.0], &[3]).unwrap();
    /// acc.index_add_last(&[0, 2, 0], &src).unwrap();
    /// assert_eq!(acc.to_vec(), vec![6.0, 0.0, 2.0]);
    /// ```
    pub fn index_add_last(&mut self, index: &[usize], src: &Self) -> anyhow::Result<()> {
        let (lead, last) = self.leading_and_last()?;
        let (src_lead, src_last) = src.leading_and_last()?;
        if self.shape()[..self.rank() - 1] != src.shape()[..src.rank() - 1] {
            anyhow::bail!(
                "Scatter-add leading shapes differ: destination {:?}, source {:?}",
                self.shape(),
                src.shape()
            );
        }
        if src_last != index.len() {
            anyhow::bail!(
                "Scatter-add expects {} indices, got {}",
                src_last,
                index.len()
            );
        }
        if let Some(&bad) = index.iter().find(|&&i| i >= last) {
            anyhow::bail!(
                "Scatter index {} out of bounds for axis of size {}",
                bad,
                last
            );
        }

        let shape = self.shape_vec();
        let mut dst = self.to_vec();
        let values = src.to_vec();
        for row in 0..lead.min(src_lead) {
            let dst_base = row * last;
            let src_base = row * src_last;
            for (k, &i) in index.iter().enumerate() {
                let slot = &mut dst[dst_base + i];
                *slot = slot.clone() + values[src_base + k].clone();
            }
        }
        *self = Self::from_vec(dst, &shape)?;
        Ok(())
    }

    /// Concatenate tensors along their last axis
    ///
    /// All inputs must share the same leading shape.
    pub fn concatenate_last(tensors: &[&Self]) -> anyhow::Result<Self> {
        let first = match tensors.first() {
            Some(t) => *t,
            None => anyhow::bail!("Cannot concatenate an empty list of tensors"),
        };
        let (lead, _) = first.leading_and_last()?;
        let lead_shape = &first.shape()[..first.rank() - 1];
        for t in tensors {
            if t.rank() != first.rank() || &t.shape()[..t.rank() - 1] != lead_shape {
                anyhow::bail!(
                    "Concatenation along the last axis requires matching leading shapes: {:?} vs {:?}",
                    first.shape(),
                    t.shape()
                );
            }
        }

        let parts: Vec<(Vec<T>, usize)> = tensors
            .iter()
            .map(|t| (t.to_vec(), t.shape()[t.rank() - 1]))
            .collect();
        let total_last: usize = parts.iter().map(|(_, n)| n).sum();
        let mut out = Vec::with_capacity(lead * total_last);
        for row in 0..lead {
            for (data, n) in &parts {
                out.extend_from_slice(&data[row * n..(row + 1) * n]);
            }
        }
        let mut shape = lead_shape.to_vec();
        shape.push(total_last);
        Self::from_vec(out, &shape)
    }

    /// Dense matrix product with NumPy `matmul` semantics
    ///
    /// 1-D operands are promoted to a row (left) or column (right) matrix and
    /// the promoted axis is dropped from the result. Leading batch dimensions
    /// broadcast.
    ///
    /// ```
    /// use spten_core::DenseND;
    ///
    /// let a = DenseND::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
    /// let b = DenseND::from_vec(vec![5.0, 6.0, 7.0, 8.0], &[2, 2]).unwrap();
    /// let c = a.matmul(&b).unwrap();
    /// assert_eq!(c.to_vec(), vec![19.0, 22.0, 43.0, 50.0]);
    ///
    /// let x = DenseND::from_vec(vec![1.0, 1.0], &[2]).unwrap();
    /// assert_eq!(a.matmul(&x).unwrap().to_vec(), vec![3.0, 7.0]);
    /// ```
    pub fn matmul(&self, other: &Self) -> anyhow::Result<Self> {
        if self.rank() == 0 || other.rank() == 0 {
            anyhow::bail!("Matrix multiplication requires operands of rank >= 1");
        }
        let lhs_vec = self.rank() == 1;
        let rhs_vec = other.rank() == 1;
        let lhs = if lhs_vec {
            self.reshape(&[1, self.len()])?
        } else {
            self.clone()
        };
        let rhs = if rhs_vec {
            other.reshape(&[other.len(), 1])?
        } else {
            other.clone()
        };

        let (lb, lm) = lhs.shape().split_at(lhs.rank() - 2);
        let (rb, rm) = rhs.shape().split_at(rhs.rank() - 2);
        let (m, k1) = (lm[0], lm[1]);
        let (k2, n) = (rm[0], rm[1]);
        if k1 != k2 {
            anyhow::bail!(
                "Matrix dimensions incompatible: ({}, {}) × ({}, {})",
                m,
                k1,
                k2,
                n
            );
        }

        let batch = broadcast_shapes(lb, rb)?;
        let mut lhs_shape = batch.clone();
        lhs_shape.extend_from_slice(&[m, k1]);
        let mut rhs_shape = batch.clone();
        rhs_shape.extend_from_slice(&[k1, n]);
        let a = lhs.broadcast_to(&lhs_shape)?.to_vec();
        let b = rhs.broadcast_to(&rhs_shape)?.to_vec();

        let nb = numel(&batch);
        let mut out = vec![T::zero(); nb * m * n];
        for bi in 0..nb {
            let (ao, bo, co) = (bi * m * k1, bi * k1 * n, bi * m * n);
            for i in 0..m {
                for k in 0..k1 {
                    let aik = a[ao + i * k1 + k].clone();
                    for j in 0..n {
                        let slot = &mut out[co + i * n + j];
                        *slot = slot.clone() + aik.clone() * b[bo + k * n + j].clone();
                    }
                }
            }
        }

        let mut shape = batch;
        if !lhs_vec {
            shape.push(m);
        }
        if !rhs_vec {
            shape.push(n);
        }
        Self::from_vec(out, &shape)
    }
}

impl<T> std::ops::Index<&[usize]> for DenseND<T> {
    type Output = T;

    fn index(&self, index: &[usize]) -> &Self::Output {
        &self.data[index]
    }
}

impl<T> std::ops::IndexMut<&[usize]> for DenseND<T> {
    fn index_mut(&mut self, index: &[usize]) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl<T: fmt::Debug> fmt::Debug for DenseND<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DenseND")
            .field("shape", &self.data.shape())
            .field("data", &self.data)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_and_index() {
        let t = DenseND::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
        assert_eq!(t[&[0, 2]], 3.0);
        assert_eq!(t[&[1, 0]], 4.0);
        assert_eq!(t.get(&[2, 0]), None);
        assert_eq!(t.get(&[0]), None);
    }

    #[test]
    fn test_scalar() {
        let s = DenseND::scalar(2.5f64);
        assert_eq!(s.rank(), 0);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_take_last_batched() {
        let t = DenseND::from_vec((0..12).map(|x| x as f64).collect(), &[2, 2, 3]).unwrap();
        let g = t.take_last(&[1, 1]).unwrap();
        assert_eq!(g.shape(), &[2, 2, 2]);
        assert_eq!(g.to_vec(), vec![1.0, 1.0, 4.0, 4.0, 7.0, 7.0, 10.0, 10.0]);
        assert!(t.take_last(&[3]).is_err());
    }

    #[test]
    fn test_index_add_batched() {
        let mut acc = DenseND::<f64>::zeros(&[2, 2]);
        let src = DenseND::from_vec(vec![1.0, 2.0, 3.0, 10.0, 20.0, 30.0], &[2, 3]).unwrap();
        acc.index_add_last(&[1, 1, 0], &src).unwrap();
        assert_eq!(acc.to_vec(), vec![3.0, 3.0, 30.0, 30.0]);
    }

    #[test]
    fn test_index_add_shape_errors() {
        let mut acc = DenseND::<f64>::zeros(&[2, 2]);
        let src = DenseND::<f64>::zeros(&[3, 2]);
        assert!(acc.index_add_last(&[0, 1], &src).is_err());
        let src = DenseND::<f64>::zeros(&[2, 2]);
        assert!(acc.index_add_last(&[0], &src).is_err());
        assert!(acc.index_add_last(&[0, 5], &src).is_err());
    }

    #[test]
    fn test_concatenate_last() {
        let a = DenseND::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        let b = DenseND::from_vec(vec![5.0, 6.0], &[2, 1]).unwrap();
        let c = DenseND::concatenate_last(&[&a, &b]).unwrap();
        assert_eq!(c.shape(), &[2, 3]);
        assert_eq!(c.to_vec(), vec![1.0, 2.0, 5.0, 3.0, 4.0, 6.0]);

        let bad = DenseND::<f64>::zeros(&[3, 1]);
        assert!(DenseND::concatenate_last(&[&a, &bad]).is_err());
    }

    #[test]
    fn test_matmul_batched() {
        // batch of two 2x2 identity-scaled matrices times one shared 2x1
        let a = DenseND::from_vec(vec![1.0, 0.0, 0.0, 1.0, 2.0, 0.0, 0.0, 2.0], &[2, 2, 2])
            .unwrap();
        let b = DenseND::from_vec(vec![3.0, 4.0], &[2, 1]).unwrap();
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.shape(), &[2, 2, 1]);
        assert_eq!(c.to_vec(), vec![3.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_matmul_mismatch() {
        let a = DenseND::<f64>::zeros(&[2, 3]);
        let b = DenseND::<f64>::zeros(&[2, 3]);
        assert!(a.matmul(&b).is_err());
    }

    #[test]
    fn test_zip_with_broadcast_error() {
        let a = DenseND::<f64>::zeros(&[2, 3]);
        let b = DenseND::<f64>::zeros(&[2]);
        assert!(a.zip_with(&b, |x, y| x + y).is_err());
    }
}
