//! Stored values of a sparse tensor
//!
//! A sparse tensor either carries an explicit value buffer of shape
//! `(*batch, nnz)` or is structure-only, in which case every stored
//! coordinate has the implicit value 1.

use crate::error::{ShapeError, SparseResult};
use scirs2_core::numeric::Float;
use spten_core::DenseND;
use std::sync::Arc;

/// Value buffer of a sparse tensor
///
/// The buffer is reference-counted: tensors never mutate their values after
/// construction, so pattern-preserving operations share it.
#[derive(Debug, Clone, PartialEq)]
pub enum SparseValues<T> {
    /// Explicit values shaped `(*batch, nnz)`
    Values(Arc<DenseND<T>>),
    /// Pure structure; every entry is implicitly 1
    StructureOnly,
}

impl<T: Float> SparseValues<T> {
    /// Wrap an optional buffer
    pub fn from_option(values: Option<DenseND<T>>) -> Self {
        match values {
            Some(v) => SparseValues::Values(Arc::new(v)),
            None => SparseValues::StructureOnly,
        }
    }

    /// Wrap a buffer
    pub fn new(values: DenseND<T>) -> Self {
        SparseValues::Values(Arc::new(values))
    }

    /// The explicit buffer, if any
    pub fn as_dense(&self) -> Option<&DenseND<T>> {
        match self {
            SparseValues::Values(v) => Some(v.as_ref()),
            SparseValues::StructureOnly => None,
        }
    }

    pub fn is_structure_only(&self) -> bool {
        matches!(self, SparseValues::StructureOnly)
    }

    /// Leading (batch) shape; empty for structure-only values
    pub fn dense_shape(&self) -> Vec<usize> {
        match self {
            SparseValues::Values(v) => v.shape()[..v.rank().saturating_sub(1)].to_vec(),
            SparseValues::StructureOnly => Vec::new(),
        }
    }

    /// Check the invariants against the number of stored entries
    pub(crate) fn validate(&self, nnz: usize) -> SparseResult<()> {
        match self {
            SparseValues::Values(v) => validate_buffer(v, nnz),
            SparseValues::StructureOnly => Ok(()),
        }
    }

    /// Keep the entries at `positions`, in that order
    pub(crate) fn select(&self, positions: &[usize]) -> SparseResult<Self> {
        match self {
            SparseValues::Values(v) => Ok(SparseValues::new(v.take_last(positions)?)),
            SparseValues::StructureOnly => Ok(SparseValues::StructureOnly),
        }
    }

    /// Apply `f` to every stored value
    pub(crate) fn map<F>(&self, f: F) -> Self
    where
        F: Fn(&T) -> T,
    {
        match self {
            SparseValues::Values(v) => SparseValues::new(v.map(f)),
            SparseValues::StructureOnly => SparseValues::StructureOnly,
        }
    }

    /// Copy of the buffer that shares nothing with `self`
    pub(crate) fn deep_copy(&self) -> Self {
        match self {
            SparseValues::Values(v) => SparseValues::new(v.as_ref().clone()),
            SparseValues::StructureOnly => SparseValues::StructureOnly,
        }
    }

    /// Explicit buffer, materialising implicit ones for structure-only values
    pub(crate) fn materialize(&self, nnz: usize) -> DenseND<T> {
        match self {
            SparseValues::Values(v) => v.as_ref().clone(),
            SparseValues::StructureOnly => DenseND::ones(&[nnz]),
        }
    }
}

/// A value buffer must be at least 1-D with `nnz` as its last extent
pub(crate) fn validate_buffer<T: Float>(values: &DenseND<T>, nnz: usize) -> SparseResult<()> {
    match values.shape().last() {
        None => Err(ShapeError::ValuesRank { got: 0 }.into()),
        Some(&last) if last != nnz => Err(ShapeError::NnzMismatch { nnz, got: last }.into()),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_shape() {
        let v = SparseValues::new(DenseND::<f64>::zeros(&[2, 3, 5]));
        assert_eq!(v.dense_shape(), vec![2, 3]);
        assert!(SparseValues::<f64>::StructureOnly.dense_shape().is_empty());
    }

    #[test]
    fn test_validate() {
        let v = SparseValues::new(DenseND::<f64>::zeros(&[4]));
        assert!(v.validate(4).is_ok());
        assert!(v.validate(3).is_err());
        let scalar = SparseValues::new(DenseND::scalar(1.0f64));
        assert!(scalar.validate(1).is_err());
        assert!(SparseValues::<f64>::StructureOnly.validate(7).is_ok());
    }

    #[test]
    fn test_deep_copy_does_not_share() {
        let v = SparseValues::new(DenseND::<f64>::ones(&[3]));
        let shared = v.clone();
        let copied = v.deep_copy();
        match (&v, &shared, &copied) {
            (SparseValues::Values(a), SparseValues::Values(b), SparseValues::Values(c)) => {
                assert!(Arc::ptr_eq(a, b));
                assert!(!Arc::ptr_eq(a, c));
                assert_eq!(a, c);
            }
            _ => panic!("expected explicit values"),
        }
    }
}
