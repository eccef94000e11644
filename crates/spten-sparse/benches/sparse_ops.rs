//! Benchmarks for sparse tensor operations
//!
//! Covers the assembly path (coalesce, COO → CSR) and both product kernels
//! across sizes and densities.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use scirs2_core::ndarray_ext::Array2;
use spten_core::DenseND;
use spten_sparse::spmm::par_spmm_csr;
use spten_sparse::CooTensor;
use std::hint::black_box;

/// Random uncoalesced COO matrix with roughly `density * rows * cols` entries
fn random_coo(nrows: usize, ncols: usize, density: f64, mut seed: u64) -> CooTensor<f64> {
    let nnz = ((nrows * ncols) as f64 * density).max(1.0) as usize;

    let mut indices = Array2::zeros((2, nnz));
    let mut values = Vec::with_capacity(nnz);

    // Simple pseudo-random generation for reproducibility
    for e in 0..nnz {
        seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        indices[[0, e]] = (seed % nrows as u64) as usize;
        seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        indices[[1, e]] = (seed % ncols as u64) as usize;
        seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        values.push((seed % 10000) as f64 / 10000.0);
    }

    let values = DenseND::from_vec(values, &[nnz]).expect("Failed to create values");
    CooTensor::new(indices, Some(values), Some(vec![nrows, ncols]), None)
        .expect("Failed to create COO")
}

/// Random dense `(rows, cols)` operand
fn random_dense(nrows: usize, ncols: usize) -> DenseND<f64> {
    let mut seed = 54321u64;
    let data = (0..nrows * ncols)
        .map(|_| {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            (seed % 10000) as f64 / 10000.0
        })
        .collect();
    DenseND::from_vec(data, &[nrows, ncols]).expect("Failed to create dense")
}

fn bench_coalesce(c: &mut Criterion) {
    let mut group = c.benchmark_group("coalesce");

    for size in [100, 500, 1000].iter() {
        for density in [0.01, 0.05].iter() {
            let coo = random_coo(*size, *size, *density, 12345);
            group.throughput(Throughput::Elements(coo.nnz() as u64));

            group.bench_with_input(
                BenchmarkId::from_parameter(format!("{}x{}_d{}", size, size, density)),
                &coo,
                |b, coo| {
                    b.iter(|| {
                        let result = black_box(coo).coalesce(true);
                        let _ = black_box(result);
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_spspmm(c: &mut Criterion) {
    let mut group = c.benchmark_group("spspmm");

    for size in [100, 300].iter() {
        for density in [0.01, 0.05].iter() {
            let a = random_coo(*size, *size, *density, 12345);
            let b = random_coo(*size, *size, *density, 67890);

            group.bench_with_input(
                BenchmarkId::from_parameter(format!("{}x{}_d{}", size, size, density)),
                &(a, b),
                |bench, (a, b)| {
                    bench.iter(|| {
                        let result = black_box(a).matmul_coo(black_box(b));
                        let _ = black_box(result);
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_spmm(c: &mut Criterion) {
    let mut group = c.benchmark_group("spmm");

    for size in [100, 500].iter() {
        let coo = random_coo(*size, *size, 0.05, 12345);
        let csr = coo.to_csr().expect("Failed to convert to CSR");
        let x = random_dense(*size, 16);
        group.throughput(Throughput::Elements((coo.nnz() * 16) as u64));

        group.bench_with_input(BenchmarkId::new("coo", size), &(&coo, &x), |b, (coo, x)| {
            b.iter(|| {
                let result = coo.matmul_dense(black_box(x));
                let _ = black_box(result);
            });
        });

        group.bench_with_input(BenchmarkId::new("csr", size), &(&csr, &x), |b, (csr, x)| {
            b.iter(|| {
                let result = csr.matmul_dense(black_box(x));
                let _ = black_box(result);
            });
        });

        group.bench_with_input(
            BenchmarkId::new("csr_par", size),
            &(&csr, &x),
            |b, (csr, x)| {
                b.iter(|| {
                    let result = par_spmm_csr(csr, black_box(x));
                    let _ = black_box(result);
                });
            },
        );
    }

    group.finish();
}

fn bench_to_csr(c: &mut Criterion) {
    let mut group = c.benchmark_group("coo_to_csr");

    for size in [100, 500, 1000].iter() {
        let coo = random_coo(*size, *size, 0.02, 12345);
        group.throughput(Throughput::Elements(coo.nnz() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), &coo, |b, coo| {
            b.iter(|| {
                let result = black_box(coo).to_csr();
                let _ = black_box(result);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_coalesce, bench_spspmm, bench_spmm, bench_to_csr);
criterion_main!(benches);
