//! End-to-end assembly scenarios
//!
//! Local element contributions are concatenated into a global COO tensor,
//! merged by coalescing and then used in products, the way a finite-element
//! or graph layer drives the sparse API.

use scirs2_core::ndarray_ext::{array, Array2};
use spten_core::DenseND;
use spten_sparse::{
    capabilities, coo_matrix, csr_matrix, CooSource, CooTensor, CsrSource, CsrTensor, Operand,
    SparseError, SparseOrDense, SparseTensor,
};

fn vector(values: &[f64]) -> DenseND<f64> {
    DenseND::from_vec(values.to_vec(), &[values.len()]).unwrap()
}

/// 1-D Laplacian stiffness of `cells` linear elements on a uniform mesh
fn assemble_laplacian(cells: usize) -> CooTensor<f64> {
    let n = cells + 1;
    let mut global = CooTensor::from_shape(&[n, n]);
    for cell in 0..cells {
        let dofs = [cell, cell + 1];
        let mut indices = Array2::zeros((2, 4));
        let mut local = Vec::with_capacity(4);
        for (a, &row) in dofs.iter().enumerate() {
            for (b, &col) in dofs.iter().enumerate() {
                let e = 2 * a + b;
                indices[[0, e]] = row;
                indices[[1, e]] = col;
                local.push(if a == b { 1.0 } else { -1.0 });
            }
        }
        let element = CooTensor::new(indices, Some(vector(&local)), Some(vec![n, n]), None).unwrap();
        global = global.add_coo(&element, 1.0).unwrap();
    }
    global
}

#[test]
fn test_diagonal_with_duplicate_coalesces_to_sum() {
    let diag = CooTensor::new(
        array![[0, 1], [0, 1]],
        Some(vector(&[2.0, 3.0])),
        Some(vec![2, 2]),
        None,
    )
    .unwrap();
    assert_eq!(diag.to_dense().unwrap().to_vec(), vec![2.0, 0.0, 0.0, 3.0]);

    let extra = CooTensor::new(array![[0], [0]], Some(vector(&[5.0])), Some(vec![2, 2]), None).unwrap();
    let sum = diag.add_coo(&extra, 1.0).unwrap();
    assert_eq!(sum.nnz(), 3);
    assert_eq!(sum.is_coalesced(), None);

    let merged = sum.coalesce(true).unwrap();
    assert_eq!(merged.nnz(), 2);
    assert_eq!(merged.indices(), &array![[0, 1], [0, 1]]);
    assert_eq!(merged.values().unwrap().to_vec(), vec![7.0, 3.0]);
}

#[test]
fn test_nnz_mismatch_is_shape_error() {
    let indices = Array2::<usize>::zeros((2, 3));
    let err = CooTensor::new(indices, Some(vector(&[1.0; 4])), None, None).unwrap_err();
    assert!(err.is_shape_error());
    assert!(matches!(err, SparseError::Shape(_)));
}

#[test]
fn test_laplacian_assembly() {
    let stiffness = assemble_laplacian(3).coalesce(true).unwrap();
    assert_eq!(stiffness.nnz(), 10);

    let dense = stiffness.to_dense().unwrap();
    #[rustfmt::skip]
    let expected = vec![
         1.0, -1.0,  0.0,  0.0,
        -1.0,  2.0, -1.0,  0.0,
         0.0, -1.0,  2.0, -1.0,
         0.0,  0.0, -1.0,  1.0,
    ];
    assert_eq!(dense.to_vec(), expected);

    // Constants are in the kernel of the Laplacian
    let ones = DenseND::ones(&[4]);
    assert_eq!(stiffness.matmul_dense(&ones).unwrap().to_vec(), vec![0.0; 4]);

    let csr = stiffness.to_csr().unwrap();
    assert_eq!(csr.row_ptr(), &[0, 2, 5, 8, 10]);
    assert_eq!(csr.matmul_dense(&ones).unwrap().to_vec(), vec![0.0; 4]);
}

#[test]
fn test_batched_assembly() {
    // Two load cases share one sparsity pattern
    let values = DenseND::from_vec(vec![1.0, 2.0, 3.0, 10.0, 20.0, 30.0], &[2, 3]).unwrap();
    let coo = CooTensor::new(
        array![[0, 1, 0], [0, 1, 0]],
        Some(values),
        Some(vec![2, 2]),
        None,
    )
    .unwrap();
    assert_eq!(coo.shape(), vec![2, 2, 2]);

    let merged = coo.coalesce(true).unwrap();
    assert_eq!(merged.values().unwrap().shape(), &[2, 2]);
    assert_eq!(merged.values().unwrap().to_vec(), vec![4.0, 2.0, 40.0, 20.0]);

    let x = vector(&[1.0, 1.0]);
    let y = merged.matmul_dense(&x).unwrap();
    assert_eq!(y.shape(), &[2, 2]);
    assert_eq!(y.to_vec(), vec![4.0, 2.0, 40.0, 20.0]);
}

#[test]
fn test_graph_adjacency_products() {
    // Directed 3-cycle; A^3 is the identity
    let adjacency =
        CooTensor::<f64>::new(array![[0, 1, 2], [1, 2, 0]], None, Some(vec![3, 3]), None)
            .unwrap()
            .coalesce(true)
            .unwrap();
    let squared = adjacency.matmul_coo(&adjacency).unwrap();
    let cubed = squared.matmul_coo(&adjacency).unwrap();
    assert_eq!(
        cubed.to_dense().unwrap().to_vec(),
        vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
    );

    let lower = adjacency.tril(-1).unwrap();
    assert_eq!(lower.nnz(), 1);
    assert_eq!(lower.indices(), &array![[2], [0]]);
}

#[test]
fn test_dispatch_over_operands() {
    let a = CooTensor::new(
        array![[0, 1], [1, 0]],
        Some(vector(&[2.0, 4.0])),
        Some(vec![2, 2]),
        None,
    )
    .unwrap();
    let dense = DenseND::ones(&[2, 2]);

    match a.add(Operand::Dense(&dense), 1.0).unwrap() {
        SparseOrDense::Dense(d) => assert_eq!(d.to_vec(), vec![1.0, 3.0, 5.0, 1.0]),
        SparseOrDense::Sparse(_) => panic!("sparse + dense must be dense"),
    }

    let halved = a.div(Operand::Scalar(2.0)).unwrap();
    assert_eq!(halved.values().unwrap().to_vec(), vec![1.0, 2.0]);

    let squared = a.pow(Operand::Scalar(2.0)).unwrap();
    assert_eq!(squared.values().unwrap().to_vec(), vec![4.0, 16.0]);

    let csr = a.to_csr().unwrap();
    let err = a.mul(Operand::Csr(&csr)).unwrap_err();
    assert!(err.is_type_error());
    assert!(err.to_string().contains("CsrTensor"));
}

#[test]
fn test_structure_only_value_errors() {
    let pattern =
        CooTensor::<f64>::new(array![[0, 1], [1, 0]], None, Some(vec![2, 2]), None).unwrap();
    assert!(pattern.div(Operand::Scalar(2.0)).unwrap_err().is_value_error());
    assert!(pattern.pow(Operand::Scalar(2.0)).unwrap_err().is_value_error());
    assert!(pattern.matmul_dense(&vector(&[1.0, 1.0])).unwrap_err().is_value_error());

    // Missing values materialize as ones
    assert_eq!(pattern.to_dense().unwrap().to_vec(), vec![0.0, 1.0, 1.0, 0.0]);
}

#[test]
fn test_facade_round_trip() {
    let dense = DenseND::from_vec(vec![0.0, 1.0, 2.0, 0.0, 0.0, 3.0], &[2, 3]).unwrap();
    let coo = coo_matrix(CooSource::Dense {
        dense: dense.clone(),
        dims: None,
    })
    .unwrap();
    let csr = csr_matrix(CsrSource::Sparse(SparseTensor::from(coo))).unwrap();
    assert_eq!(csr.shape(), (2, 3));
    assert_eq!(csr.to_dense().unwrap(), dense);

    let back = coo_matrix(CooSource::Sparse(csr.into())).unwrap();
    assert_eq!(back.to_dense().unwrap(), dense);
}

#[test]
fn test_raw_csr_paths() {
    let err = csr_matrix(CsrSource::Triplet {
        values: vector(&[1.0, 2.0]),
        row_ptr: vec![0, 1, 2],
        col_indices: vec![0, 1],
        shape: (2, 2),
    })
    .unwrap_err();
    assert!(err.is_not_implemented());
    assert!(!capabilities().csr_from_raw_triplet);

    let csr = CsrTensor::new(vec![0, 1, 2], vec![0, 1], vector(&[1.0, 2.0]), (2, 2)).unwrap();
    assert_eq!(csr.to_dense().unwrap().to_vec(), vec![1.0, 0.0, 0.0, 2.0]);

    let err = CsrTensor::new(vec![0, 2, 1], vec![0, 1], vector(&[1.0, 2.0]), (2, 2)).unwrap_err();
    assert!(err.is_shape_error());
}
