//! A cubic Lennard-Jones lattice at its equilibrium spacing must not
//! explode under velocity-Verlet integration, and its center of mass must
//! not drift (spec.md §8 scenario 5).

use april_md::container::linked_cells::LinkedCellsConfig;
use april_md::container::{Container, LinkedCells};
use april_md::force::{Charge, ForceKind, LennardJones};
use april_md::generators::cuboid_lattice;
use april_md::integrators::VelocityVerlet;
use april_md::storage::{Aos, Storage};
use april_md::system::System;
use april_md::vec3::{UVec3, Vec3};
use april_md::{build_linked_cells, boundary::{BoundaryKind, Face}, Environment};

#[derive(Copy, Clone, Default)]
struct NoCharge;
impl Charge for NoCharge {
    fn charge(&self) -> f64 {
        0.0
    }
}

type LatticeSystem = System<NoCharge, LinkedCells<NoCharge, Aos<NoCharge>>>;

fn total_kinetic_energy(system: &LatticeSystem) -> f64 {
    let storage = system.container().storage();
    (0..storage.len()).map(|i| storage.get(i)).map(|p| 0.5 * p.mass * p.velocity.norm2()).sum()
}

fn center_of_mass(system: &LatticeSystem) -> Vec3 {
    let storage = system.container().storage();
    let mut com = Vec3::ZERO;
    let mut total_mass = 0.0;
    for i in 0..storage.len() {
        let p = storage.get(i);
        com += p.position * p.mass;
        total_mass += p.mass;
    }
    com / total_mass
}

#[test]
fn cuboid_lattice_stays_bounded_and_keeps_its_center_of_mass() {
    let sigma = 1.0;
    let epsilon = 3.0;
    let spacing = 1.1225 * sigma;
    let side = 20u32;

    let mut env = Environment::<NoCharge>::new(1);
    for spec in cuboid_lattice::<NoCharge>(0, UVec3::new(side, side, side), spacing, Vec3::ZERO, 1.0) {
        env.add_particle(spec);
    }
    env.add_type_interaction(
        0,
        0,
        ForceKind::LennardJones(LennardJones::new(epsilon, sigma, Some(3.0 * sigma))),
    );
    for face in Face::ALL {
        env.set_boundary(face, BoundaryKind::Reflective);
    }
    env.set_margin_absolute(3.0 * sigma);

    let mut system = build_linked_cells::<_, Aos<NoCharge>>(env, LinkedCellsConfig::default()).unwrap();
    let n_particles = system.container().particle_count() as f64;
    let initial_com = center_of_mass(&system);

    system.compute_forces();
    let integrator = VelocityVerlet;
    for _ in 0..100 {
        integrator.step(&mut system, 2e-4);
    }

    let kinetic = total_kinetic_energy(&system);
    assert!(kinetic < 50.0 * epsilon * n_particles, "kinetic energy exploded: {kinetic}");

    let drift = (center_of_mass(&system) - initial_com).norm();
    assert!(drift < 1e-2, "center of mass drifted by {drift}");
}
