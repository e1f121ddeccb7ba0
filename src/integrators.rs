//! Time integrators. Each one drives a [`System`] through its public hooks
//! only — rebuild, boundary, force, field, controller — and never reaches
//! into a container's internals directly (spec.md §6 "Integrator hook").

use crate::container::Container;
use crate::force::Charge;
use crate::particle::ParticleState;
use crate::system::System;

/// Second-order Störmer-Verlet ("velocity Verlet"), ported from the
/// reference implementation's `integrators/stoermer_verlet.h`. One call
/// advances the system by exactly one step of size `dt`.
#[derive(Copy, Clone, Debug, Default)]
pub struct VelocityVerlet;

impl VelocityVerlet {
    pub fn step<U, C>(&self, system: &mut System<U, C>, dt: f64)
    where
        U: Copy + Charge,
        C: Container<U>,
    {
        system.for_each_particle(ParticleState::MOVABLE, |_, p| {
            p.position += p.velocity * dt + p.force * (0.5 * dt * dt / p.mass);
            p.old_force = p.force;
        });

        system.rebuild_structure();
        system.apply_boundary_conditions();
        system.compute_forces();
        system.apply_force_fields();

        system.for_each_particle(ParticleState::MOVABLE, |_, p| {
            p.velocity += (p.old_force + p.force) * (0.5 * dt / p.mass);
        });

        system.apply_controllers();
        system.advance(dt);
    }
}

/// Fourth-order Yoshida composition of the velocity-Verlet step, ported
/// from `integrators/yoshida4.h`. Four position drifts with three
/// interleaved velocity kicks, using the classic Yoshida (1990)
/// coefficients derived from `w1 = 1 / (2 - 2^(1/3))`.
#[derive(Copy, Clone, Debug, Default)]
pub struct Yoshida4;

impl Yoshida4 {
    fn coefficients() -> ([f64; 4], [f64; 3]) {
        let cbrt2 = 2f64.powf(1.0 / 3.0);
        let w1 = 1.0 / (2.0 - cbrt2);
        let w0 = -cbrt2 * w1;
        let c = [w1 / 2.0, (w0 + w1) / 2.0, (w0 + w1) / 2.0, w1 / 2.0];
        let d = [w1, w0, w1];
        (c, d)
    }

    pub fn step<U, C>(&self, system: &mut System<U, C>, dt: f64)
    where
        U: Copy + Charge,
        C: Container<U>,
    {
        let (c, d) = Self::coefficients();

        for i in 0..4 {
            let drift = c[i] * dt;
            system.for_each_particle(ParticleState::MOVABLE, |_, p| {
                p.position += p.velocity * drift;
            });
            system.rebuild_structure();
            system.apply_boundary_conditions();
            system.compute_forces();
            system.apply_force_fields();

            if i < 3 {
                let kick = d[i] * dt;
                system.for_each_particle(ParticleState::MOVABLE, |_, p| {
                    p.velocity += p.force * (kick / p.mass);
                });
            }
        }

        system.apply_controllers();
        system.advance(dt);
    }
}
