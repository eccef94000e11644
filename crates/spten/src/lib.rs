//! # spten - Sparse Tensor Engine
//!
//! This is the **meta crate** that re-exports the spten components for
//! convenient access.
//!
//! ## Quick Start
//!
//! ```
//! use spten::prelude::*;
//! use scirs2_core::ndarray_ext::array;
//!
//! let a = CooTensor::new(
//!     array![[0, 1], [0, 1]],
//!     Some(DenseND::from_vec(vec![2.0, 3.0], &[2])?),
//!     Some(vec![2, 2]),
//!     None,
//! )?;
//! assert_eq!(a.to_dense()?.to_vec(), vec![2.0, 0.0, 0.0, 3.0]);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Components
//!
//! ### Dense Backend ([`core`])
//!
//! Row-major N-d buffers with broadcasting, gather and scatter-add along
//! the last axis, and a reference dense matmul.
//!
//! ```
//! use spten::core::DenseND;
//!
//! let t = DenseND::<f64>::ones(&[2, 3, 4]);
//! assert_eq!(t.reshape(&[6, 4]).unwrap().shape(), &[6, 4]);
//! ```
//!
//! ### Sparse Tensors ([`sparse`])
//!
//! COO and CSR tensors, coalescing, sparse × sparse and sparse × dense
//! products, and the construction facade.
//!
//! ```
//! use spten::sparse::{coo_matrix, CooSource};
//!
//! let empty = coo_matrix::<f64>(CooSource::Shape(vec![4, 4])).unwrap();
//! assert_eq!(empty.nnz(), 0);
//! ```
//!
//! ## Features
//!
//! - `parallel`: parallel coordinate sorting and row-parallel CSR products
//! - `tracing`: structured kernel events
//! - `serde`: serialization of format and capability descriptors
//! - `full`: enable all features

// Re-export all components
pub use spten_core as core;
pub use spten_sparse as sparse;

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! # Example
    //!
    //! ```
    //! use spten::prelude::*;
    //!
    //! let empty = CooTensor::<f64>::from_shape(&[3, 3]);
    //! assert_eq!(empty.shape(), vec![3, 3]);
    //! ```

    // Dense backend
    pub use crate::core::DenseND;

    // Sparse types
    pub use crate::sparse::{
        CooTensor, CsrTensor, Operand, SparseError, SparseFormat, SparseOps, SparseOrDense,
        SparseResult, SparseTensor, SparseValues,
    };

    // Construction
    pub use crate::sparse::{capabilities, coo_matrix, csr_matrix, CooSource, CsrSource};
}
