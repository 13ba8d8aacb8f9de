// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Drift and integration microbenchmarks
//!
//! Notes:
//! - One drift evaluation costs 86 transfer-function calls; that dominates.
//! - Fixed seeds and inputs, no I/O.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use adex_dynamics::{
    drift, integrate, regulate, AfferentDrive, DriveBlending, IntegratorOptions, MeanFieldState,
    ModelParameters, SigmoidTransferFunction, TimeGrid, STATE_DIM,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn warm_state() -> MeanFieldState {
    let flat: Vec<f64> = (0..STATE_DIM).map(|i| 0.5 + 0.1 * i as f64).collect();
    MeanFieldState::from_slice(&flat).unwrap_or_default()
}

fn bench_drift(c: &mut Criterion) {
    let rs = SigmoidTransferFunction::regular_spiking();
    let fs = SigmoidTransferFunction::fast_spiking();
    let params = ModelParameters::default();
    let state = warm_state();
    let afferent = AfferentDrive::new(3.0, 1.0, 3.0, 1.0);

    c.bench_function("drift_sigmoid", |b| {
        b.iter(|| {
            drift(
                black_box(&state),
                &rs,
                &fs,
                black_box(&params),
                black_box(&afferent),
            )
        })
    });
}

fn bench_integrate(c: &mut Criterion) {
    let rs = SigmoidTransferFunction::regular_spiking();
    let fs = SigmoidTransferFunction::fast_spiking();
    let mut group = c.benchmark_group("integrate");
    group.sample_size(20);

    for t_final in [0.01, 0.05] {
        let params = ModelParameters {
            t_final,
            dt: 1e-4,
            ..ModelParameters::default()
        };
        let grid = match TimeGrid::from_parameters(&params) {
            Ok(grid) => grid,
            Err(_) => continue,
        };
        let stim_a = vec![4.0; grid.len()];
        let stim_b = vec![1.0; grid.len()];
        group.throughput(Throughput::Elements(grid.steps as u64));

        group.bench_with_input(BenchmarkId::from_parameter(grid.steps), &params, |b, params| {
            b.iter(|| {
                let mut rng = StdRng::seed_from_u64(7);
                let drive = regulate(0.6, &stim_a, &stim_b, params, DriveBlending::EveryStep, &mut rng);
                drive.and_then(|drive| {
                    integrate(
                        &MeanFieldState::zeros(),
                        &drive,
                        &rs,
                        &fs,
                        params,
                        &IntegratorOptions::default(),
                        &mut rng,
                    )
                })
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_drift, bench_integrate);
criterion_main!(benches);
