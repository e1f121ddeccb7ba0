//! Benchmarks force evaluation on a Lennard-Jones cuboid lattice, comparing
//! the O(N^2) DirectSum container against the cell-based LinkedCells
//! container at the same cutoff (mirrors `original_source`'s
//! `benchmark/interaction_benchmark.cpp`).

use april_md::container::linked_cells::LinkedCellsConfig;
use april_md::force::{Charge, ForceKind, LennardJones};
use april_md::generators::cuboid_lattice;
use april_md::storage::Aos;
use april_md::vec3::{UVec3, Vec3};
use april_md::{boundary::{BoundaryKind, Face}, build_direct_sum, build_linked_cells, Environment};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

#[derive(Copy, Clone, Default)]
struct NoCharge;
impl Charge for NoCharge {
    fn charge(&self) -> f64 {
        0.0
    }
}

const SIGMA: f64 = 1.0;
const EPSILON: f64 = 3.0;
const SPACING: f64 = 1.1225 * SIGMA;
const CUTOFF: f64 = 3.0 * SIGMA;

fn lattice_env(side: u32) -> Environment<NoCharge> {
    let mut env = Environment::<NoCharge>::new(1);
    for spec in cuboid_lattice::<NoCharge>(0, UVec3::new(side, side, side), SPACING, Vec3::ZERO, 1.0) {
        env.add_particle(spec);
    }
    env.add_type_interaction(
        0,
        0,
        ForceKind::LennardJones(LennardJones::new(EPSILON, SIGMA, Some(CUTOFF))),
    );
    for face in Face::ALL {
        env.set_boundary(face, BoundaryKind::Reflective);
    }
    env.set_margin_absolute(CUTOFF);
    env
}

fn bench_direct_sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("direct_sum");
    for &side in &[6u32, 10u32] {
        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, &side| {
            let mut system = build_direct_sum::<_, Aos<NoCharge>>(lattice_env(side)).unwrap();
            b.iter(|| system.compute_forces());
        });
    }
    group.finish();
}

fn bench_linked_cells(c: &mut Criterion) {
    let mut group = c.benchmark_group("linked_cells");
    for &side in &[6u32, 10u32, 20u32] {
        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, &side| {
            let mut system =
                build_linked_cells::<_, Aos<NoCharge>>(lattice_env(side), LinkedCellsConfig::default())
                    .unwrap();
            b.iter(|| system.compute_forces());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_direct_sum, bench_linked_cells);
criterion_main!(benches);
