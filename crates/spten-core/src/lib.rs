//! # spten-core
//!
//! Dense array backend for the spten sparse-tensor engine.
//!
//! The sparse core treats dense storage as an external collaborator that only
//! has to provide a handful of primitives. This crate is that collaborator:
//!
//! - **Dense tensor representation** ([`DenseND`]) in row-major order
//! - **Elementwise arithmetic** with NumPy broadcasting
//! - **Gather / scatter-add** along the last axis, the two primitives that
//!   coalescing, dense conversion and sparse products are built on
//! - **Concatenation** along the last axis
//! - **Reference dense matmul** with batch broadcasting, used to verify the
//!   sparse kernels
//! - **Shape arithmetic** ([`ops`]): strides, ravel/unravel, broadcasting
//!
//! ## SciRS2 Integration
//!
//! This crate uses `scirs2-core` for all array storage. Direct use of `ndarray`
//! is avoided.
//!
//! ## Quick Start
//!
//! ```
//! use spten_core::DenseND;
//!
//! let mut acc = DenseND::<f64>::zeros(&[4]);
//! let contributions = DenseND::from_vec(vec![1.0, 1.0, 1.0], &[3]).unwrap();
//! acc.index_add_last(&[0, 3, 0], &contributions).unwrap();
//! assert_eq!(acc.to_vec(), vec![2.0, 0.0, 0.0, 1.0]);
//! ```
//!
//! ## Error Handling
//!
//! Operations return `anyhow::Result` with a descriptive message.
//!
//! ## Features
//!
//! - `parallel`: enable parallel array operations through scirs2-core

pub mod dense;
pub mod ops;

pub use dense::DenseND;
