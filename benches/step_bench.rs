//! Benchmarks for batched stepping.
//!
//! Run with: cargo bench --bench step_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use multi_agent_phys::{make_scenario, scenario, Actions, Device, ScenarioOptions};
use nalgebra::DMatrix;
use serde_json::json;

fn bench_flocking_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("flocking_step");

    for &batch_dim in &[1usize, 32, 256] {
        let mut flocking = make_scenario("flocking").unwrap();
        let options: ScenarioOptions = json!({ "n_agents": 5, "n_obstacles": 5 })
            .as_object()
            .cloned()
            .unwrap_or_default();
        let mut world = flocking.make_world(batch_dim, Device::Cpu, &options).unwrap();
        world.seed(0);
        flocking.reset_world_at(&mut world, None).unwrap();

        let actions: Actions = world
            .agents()
            .map(|a| (a.name().to_owned(), DMatrix::from_element(batch_dim, 2, 0.5)))
            .collect();

        group.throughput(Throughput::Elements(batch_dim as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batch_dim), &batch_dim, |b, _| {
            b.iter(|| {
                world.step(black_box(&actions)).unwrap();
                black_box(scenario::rewards(flocking.as_ref(), &world).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_flocking_step);
criterion_main!(benches);
