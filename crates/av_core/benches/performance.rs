//! Performance benchmarks for av_core using Criterion.rs.

use av_core::connectivity::ConnectivityValidator;
use av_core::routing::RouteFinder;
use av_core::runner::simulate_hours;
use av_core::scenario::{build_simulation, SimulationParams};
use av_core::search::{Metric, PathSearch};
use av_core::test_helpers::grid_network;
use bevy_ecs::prelude::World;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_path_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_search");
    for side in [10usize, 30, 60] {
        let network = grid_network(side, side, 100.0);
        let goal = (side * side - 1) as i64;
        group.bench_with_input(BenchmarkId::from_parameter(side), &network, |b, network| {
            b.iter(|| {
                // Fresh engine each time so the heuristic cache does not carry over.
                let mut search = PathSearch::new();
                black_box(
                    search
                        .find_shortest_path(network, 0, goal, Metric::Time)
                        .expect("search"),
                )
            });
        });
    }
    group.finish();
}

fn bench_validation(c: &mut Criterion) {
    let network = grid_network(20, 20, 100.0);
    c.bench_function("validate_20x20", |b| {
        b.iter(|| {
            let mut router = RouteFinder::default();
            black_box(
                ConnectivityValidator::default()
                    .validate_network(&network, &mut router)
                    .expect("validate"),
            )
        });
    });
}

fn bench_simulation_run(c: &mut Criterion) {
    let scenarios = [("light", 120.0), ("default", 360.0), ("busy", 1200.0)];
    let mut group = c.benchmark_group("simulation_hour");
    group.sample_size(10);
    for (name, rate) in scenarios {
        group.bench_with_input(BenchmarkId::from_parameter(name), &rate, |b, &rate| {
            b.iter(|| {
                let mut world = World::new();
                let params = SimulationParams::default()
                    .with_seed(42)
                    .with_requests_per_hour(rate);
                build_simulation(&mut world, grid_network(15, 15, 120.0), params)
                    .expect("build");
                black_box(simulate_hours(&mut world, 1.0).expect("run"))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_path_search, bench_validation, bench_simulation_run);
criterion_main!(benches);
