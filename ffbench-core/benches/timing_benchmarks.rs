use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::sync::Arc;
use std::time::Duration;

use ffbench_core::timing::TimingRow;
use ffbench_core::{Benchmarker, BenchmarkerConfig, RecordingSink, SimulatedLoop, elapsed_for_epoch};

fn bench_extrapolation(c: &mut Criterion) {
    let row: TimingRow = (0..64u64).map(|s| (s * 1_000, Some(0.01 + s as f64 * 1e-4))).collect();

    c.bench_function("elapsed_for_epoch_64_checkpoints", |b| {
        b.iter(|| elapsed_for_epoch(0, black_box(&row), black_box(100_000), black_box(10)))
    });

    let sparse: TimingRow = [(0u64, Some(0.02)), (50_000, Some(0.01))].into_iter().collect();
    c.bench_function("elapsed_for_epoch_sparse", |b| {
        b.iter(|| elapsed_for_epoch(0, black_box(&sparse), black_box(100_000), black_box(10)))
    });
}

fn bench_simulated_run(c: &mut Criterion) {
    let config = BenchmarkerConfig {
        min_steps: 50,
        epoch_list: vec![0, 10, 50],
        step_list: vec![0, 500, 2_000],
        all_epochs: false,
    };

    c.bench_function("simulated_run_three_epoch_checkpoints", |b| {
        b.iter(|| {
            let mut sim = SimulatedLoop::new(5_000, 100, 32)
                .with_step_cost(|_, step| Duration::from_micros(800 + step % 7));
            let mut bench = Benchmarker::new(&config, Arc::new(RecordingSink::new()))
                .unwrap()
                .with_clock(Arc::new(sim.clock()));
            sim.run(black_box(&mut bench)).unwrap()
        })
    });
}

criterion_group!(benches, bench_extrapolation, bench_simulated_run);
criterion_main!(benches);
