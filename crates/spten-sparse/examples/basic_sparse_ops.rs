//! Basic Sparse Tensor Operations Example
//!
//! This example demonstrates:
//! - Creating COO tensors with and without values
//! - Coalescing duplicate coordinates
//! - Structural operations (transpose, tril, reshape)
//! - Sparse × sparse and sparse × dense products
//! - Converting to CSR
//!
//! Run with: cargo run --example basic_sparse_ops

use scirs2_core::ndarray_ext::array;
use spten_core::DenseND;
use spten_sparse::{CooTensor, CsrTensor, Operand, SparseOrDense};

fn main() -> anyhow::Result<()> {
    println!("=== spten-sparse: Basic Operations Example ===\n");

    // 1. A 4x4 matrix with one duplicated coordinate
    println!("1. Creating a 4x4 COO tensor...");
    let indices = array![[0, 0, 1, 2, 3, 0], [0, 2, 1, 0, 3, 0]];
    let values = DenseND::from_vec(vec![5.0, 3.0, 8.0, 2.0, 6.0, 1.0], &[6])?;
    let coo = CooTensor::new(indices, Some(values), Some(vec![4, 4]), None)?;
    println!(
        "   {} stored entries, density {:.1}%, coalesced: {:?}\n",
        coo.nnz(),
        coo.density() * 100.0,
        coo.is_coalesced()
    );

    // 2. Merge duplicates
    println!("2. Coalescing...");
    let coo = coo.coalesce(true)?;
    println!("   {} entries after merging", coo.nnz());
    println!("   indices:\n{:?}", coo.indices());
    println!("   values: {:?}\n", coo.values().map(DenseND::to_vec));

    // 3. Structural operations
    println!("3. Structural operations...");
    let transposed = coo.transpose()?;
    println!("   transpose: {:?}", transposed.to_dense()?.to_vec());
    let lower = coo.tril(0)?;
    println!("   tril(0) keeps {} of {} entries", lower.nnz(), coo.nnz());
    let reshaped = coo.reshape(&[2, 8])?;
    println!("   reshape to {:?}\n", reshaped.sparse_shape());

    // 4. Products
    println!("4. Products...");
    let x = DenseND::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[4])?;
    println!("   A @ x = {:?}", coo.matmul_dense(&x)?.to_vec());
    match coo.matmul(Operand::Coo(&transposed))? {
        SparseOrDense::Sparse(product) => println!("   A @ A^T has {} entries", product.nnz()),
        SparseOrDense::Dense(_) => unreachable!("sparse @ sparse stays sparse"),
    }

    // 5. CSR
    println!("\n5. Converting to CSR...");
    let csr = CsrTensor::from_coo(&coo)?;
    println!("   row_ptr:     {:?}", csr.row_ptr());
    println!("   col_indices: {:?}", csr.col_indices());
    println!("   A @ x = {:?}", csr.matmul_dense(&x)?.to_vec());

    println!("\n=== Example Complete ===");
    Ok(())
}
