//! Finite-Element Assembly Example
//!
//! Assembles the stiffness matrix of a 1-D Poisson problem from per-cell
//! contributions, merges duplicates by coalescing and applies the result
//! to a dense vector in COO and CSR form.
//!
//! Run with: cargo run --example fe_assembly --features tracing

use scirs2_core::ndarray_ext::Array2;
use spten_core::DenseND;
use spten_sparse::tracing_support::{init_tracing, TracingConfig};
use spten_sparse::CooTensor;

/// Global degrees of freedom of each cell
fn cell_to_dofs(cells: usize) -> Vec<[usize; 2]> {
    (0..cells).map(|c| [c, c + 1]).collect()
}

fn main() -> anyhow::Result<()> {
    init_tracing(TracingConfig::default())?;

    let cells = 8;
    let n = cells + 1;
    let h = 1.0 / cells as f64;
    let local = [1.0 / h, -1.0 / h, -1.0 / h, 1.0 / h];

    // Every cell contributes a 2x2 block; all blocks go into one COO tensor
    let cell2dof = cell_to_dofs(cells);
    let nnz = 4 * cells;
    let mut indices = Array2::zeros((2, nnz));
    let mut values = Vec::with_capacity(nnz);
    for (cell, dofs) in cell2dof.iter().enumerate() {
        for (a, &row) in dofs.iter().enumerate() {
            for (b, &col) in dofs.iter().enumerate() {
                let e = 4 * cell + 2 * a + b;
                indices[[0, e]] = row;
                indices[[1, e]] = col;
                values.push(local[2 * a + b]);
            }
        }
    }
    let values = DenseND::from_vec(values, &[nnz])?;
    let stiffness = CooTensor::new(indices, Some(values), Some(vec![n, n]), None)?;
    println!("Assembled {} local entries", stiffness.nnz());

    let stiffness = stiffness.coalesce(true)?;
    println!("{} entries after coalescing", stiffness.nnz());

    // A linear function has zero second derivative in the interior
    let x: Vec<f64> = (0..n).map(|i| i as f64 * h).collect();
    let x = DenseND::from_vec(x, &[n])?;
    let y = stiffness.matmul_dense(&x)?;
    println!("K @ x (COO) = {:?}", y.to_vec());

    let csr = stiffness.to_csr()?;
    let y_csr = csr.matmul_dense(&x)?;
    println!("K @ x (CSR) = {:?}", y_csr.to_vec());

    Ok(())
}
