//! Two-body circular orbit: a stationary heavy mass and a light test
//! particle on a circular orbit must return to its starting position and
//! speed after one full period (spec.md §8 scenario 4).

use april_md::container::Container;
use april_md::domain::Domain;
use april_md::force::{Charge, ForceKind, Gravity};
use april_md::integrators::VelocityVerlet;
use april_md::particle::ParticleState;
use april_md::storage::{Aos, Storage};
use april_md::vec3::Vec3;
use april_md::{build_direct_sum, Environment, ParticleSpec};

#[derive(Copy, Clone, Default)]
struct NoCharge;
impl Charge for NoCharge {
    fn charge(&self) -> f64 {
        0.0
    }
}

#[test]
fn two_body_orbit_returns_to_start_after_one_period() {
    let mut env = Environment::<NoCharge>::new(1);
    env.set_domain(Domain::new(Vec3::splat(-5.0), Vec3::splat(10.0)));
    env.add_particle(
        ParticleSpec::new(0, Vec3::ZERO).with_mass(1.0).with_state(ParticleState::STATIONARY),
    );
    env.add_particle(
        ParticleSpec::new(0, Vec3::new(0.0, 1.0, 0.0))
            .with_mass(1e-10)
            .with_velocity(Vec3::new(1.0, 0.0, 0.0)),
    );
    env.add_type_interaction(0, 0, ForceKind::Gravity(Gravity::new(1.0, None)));

    let mut system = build_direct_sum::<_, Aos<NoCharge>>(env).unwrap();
    system.compute_forces();

    let steps = 200_000u32;
    let dt = std::f64::consts::TAU / steps as f64;
    let integrator = VelocityVerlet;
    for _ in 0..steps {
        integrator.step(&mut system, dt);
    }

    let light = system.container().storage().get(1);
    assert!((light.position.x - 0.0).abs() < 1e-3, "x = {}", light.position.x);
    assert!((light.position.y - 1.0).abs() < 1e-3, "y = {}", light.position.y);
    assert!((light.velocity.norm() - 1.0).abs() < 1e-3, "speed = {}", light.velocity.norm());

    let heavy = system.container().storage().get(0);
    assert_eq!(heavy.position, Vec3::ZERO);
}
