//! # spten-sparse
//!
//! Sparse tensors for assembly and solver layers.
//!
//! This crate provides:
//! - COO (Coordinate) tensors with any number of sparse axes and optional
//!   batch axes on the values
//! - CSR (Compressed Sparse Row) tensors for row-oriented products
//! - Coalescing (merging duplicate coordinates by summation)
//! - SpSpMM (sparse × sparse, bucketed join on the inner index) and SpMM
//!   (sparse × dense, scatter-add)
//! - Elementwise arithmetic against scalars, dense buffers and sparse tensors
//! - A closed [`SparseTensor`] sum type and tagged construction inputs
//!
//! Every tensor is immutable; operations return new tensors and share
//! unchanged buffers.
//!
//! # Quick Start
//!
//! ```
//! use scirs2_core::ndarray_ext::array;
//! use spten_core::DenseND;
//! use spten_sparse::CooTensor;
//!
//! // Local contributions to a 2x2 global matrix, (0, 0) assembled twice
//! let indices = array![[0, 1, 0], [0, 1, 0]];
//! let values = DenseND::from_vec(vec![2.0, 3.0, 5.0], &[3]).unwrap();
//! let a = CooTensor::new(indices, Some(values), Some(vec![2, 2]), None).unwrap();
//!
//! let a = a.coalesce(true).unwrap();
//! let x = DenseND::from_vec(vec![1.0, 1.0], &[2]).unwrap();
//! assert_eq!(a.matmul_dense(&x).unwrap().to_vec(), vec![7.0, 3.0]);
//! ```
//!
//! # Features
//!
//! - `parallel`: parallel coordinate sorting and a row-parallel CSR kernel
//! - `tracing`: structured kernel events via `tracing`
//! - `serde`: serialization of [`SparseFormat`] and [`Capabilities`]

pub mod constructors;
pub mod coo;
pub mod csr;
pub mod error;
pub mod ops;
pub mod spmm;
pub mod spspmm;
pub mod tensor;
pub mod tracing_support;
pub mod utils;
pub mod values;

// Re-exports
pub use constructors::{capabilities, coo_matrix, csr_matrix, Capabilities, CooSource, CsrSource, Stability};
pub use coo::CooTensor;
pub use csr::CsrTensor;
pub use error::*;
pub use ops::{Operand, SparseOps, SparseOrDense};
pub use tensor::{SparseFormat, SparseTensor};
pub use values::SparseValues;
