use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use scenario_core::{aggregate, aggregate_parallel, Simulator, SimulationConfig};

fn config_with_paths(paths: usize) -> SimulationConfig {
    SimulationConfig {
        paths,
        ..SimulationConfig::default()
    }
}

fn bench_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("run");
    group.sample_size(10);

    for paths in [256usize, 1_024, 4_096] {
        group.bench_with_input(BenchmarkId::new("paths", paths), &paths, |b, &paths| {
            b.iter_batched(
                || Simulator::new(config_with_paths(paths)).expect("bench config is valid"),
                |simulator| simulator.run().expect("bench run completes"),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    let config = config_with_paths(4_096);
    let trajectories = Simulator::new(config.clone())
        .and_then(|simulator| simulator.simulate())
        .expect("bench simulation completes");

    group.bench_function("sequential", |b| b.iter(|| aggregate(&config, &trajectories)));
    group.bench_function("parallel", |b| {
        b.iter(|| aggregate_parallel(&config, &trajectories))
    });

    group.finish();
}

criterion_group!(run_benches, bench_run, bench_aggregate);
criterion_main!(run_benches);
