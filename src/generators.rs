//! Particle generators: bulk sources of [`ParticleSpec`] for common initial
//! conditions, grounded on the reference implementation's cube and sphere
//! benchmark setups. The caller owns the RNG and passes it in explicitly —
//! no thread-local or global generator exists (spec.md §9 "Global mutable
//! state").

use rand::Rng;

use crate::env::ParticleSpec;
use crate::particle::ParticleType;
use crate::vec3::{UVec3, Vec3};

/// A simple cubic lattice of `counts.x * counts.y * counts.z` particles,
/// spaced `spacing` apart starting at `origin`. Scenario 5's `1.1225σ`
/// spacing for an equilibrium Lennard-Jones lattice is just a particular
/// `spacing` value the caller passes in.
pub fn cuboid_lattice<U: Default>(
    ty: ParticleType,
    counts: UVec3,
    spacing: f64,
    origin: Vec3,
    mass: f64,
) -> Vec<ParticleSpec<U>> {
    let mut out = Vec::with_capacity((counts.x * counts.y * counts.z) as usize);
    for z in 0..counts.z {
        for y in 0..counts.y {
            for x in 0..counts.x {
                let position = origin
                    + Vec3::new(x as f64 * spacing, y as f64 * spacing, z as f64 * spacing);
                out.push(ParticleSpec::new(ty, position).with_mass(mass));
            }
        }
    }
    out
}

/// `count` particles uniformly distributed inside a sphere of `radius`
/// centered at `center`, via rejection sampling against the bounding cube.
pub fn sphere<U: Default, R: Rng + ?Sized>(
    ty: ParticleType,
    count: usize,
    radius: f64,
    center: Vec3,
    mass: f64,
    rng: &mut R,
) -> Vec<ParticleSpec<U>> {
    let mut out = Vec::with_capacity(count);
    while out.len() < count {
        let candidate = Vec3::new(
            rng.gen_range(-radius..=radius),
            rng.gen_range(-radius..=radius),
            rng.gen_range(-radius..=radius),
        );
        if candidate.norm2() <= radius * radius {
            out.push(ParticleSpec::new(ty, center + candidate).with_mass(mass));
        }
    }
    out
}

/// Assigns every spec an independent uniform random velocity in
/// `[-v_max, v_max]` on each axis, e.g. to seed a thermal distribution
/// before equilibration.
pub fn randomize_velocities<U, R: Rng + ?Sized>(specs: Vec<ParticleSpec<U>>, v_max: f64, rng: &mut R) -> Vec<ParticleSpec<U>> {
    specs
        .into_iter()
        .map(|spec| {
            let v = Vec3::new(
                rng.gen_range(-v_max..=v_max),
                rng.gen_range(-v_max..=v_max),
                rng.gen_range(-v_max..=v_max),
            );
            spec.with_velocity(v)
        })
        .collect()
}
