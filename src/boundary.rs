//! Per-face boundary topology and the boundary-kind dispatch applied once
//! per step to every particle near a face (spec.md §3 "Boundary topology",
//! §4.7).

use crate::domain::Domain;
use crate::particle::{Particle, ParticleState};
use crate::vec3::Vec3;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Face {
    XMinus,
    XPlus,
    YMinus,
    YPlus,
    ZMinus,
    ZPlus,
}

impl Face {
    pub const ALL: [Face; 6] =
        [Face::XMinus, Face::XPlus, Face::YMinus, Face::YPlus, Face::ZMinus, Face::ZPlus];

    pub fn axis(self) -> usize {
        match self {
            Face::XMinus | Face::XPlus => 0,
            Face::YMinus | Face::YPlus => 1,
            Face::ZMinus | Face::ZPlus => 2,
        }
    }

    pub fn is_positive(self) -> bool {
        matches!(self, Face::XPlus | Face::YPlus | Face::ZPlus)
    }

    /// Position of this face in [`Face::ALL`], used to index a
    /// per-face `[T; 6]` boundary table.
    pub const fn index(self) -> usize {
        match self {
            Face::XMinus => 0,
            Face::XPlus => 1,
            Face::YMinus => 2,
            Face::YPlus => 3,
            Face::ZMinus => 4,
            Face::ZPlus => 5,
        }
    }
}

/// Topology of a single face: region thickness (positive = inside the
/// domain, negative = outside), whether the paired face on the same axis
/// must agree (periodicity requires this), and whether the container must
/// emit wrapped neighbor pairs on this axis.
#[derive(Copy, Clone, Debug)]
pub struct Topology {
    pub thickness: f64,
    pub couples_axis: bool,
    pub force_wrap: bool,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum BoundaryKind {
    Periodic,
    Reflective,
    Absorb,
    Outflow,
    Repulsive { stiffness: f64, range: f64 },
}

impl BoundaryKind {
    pub fn topology(&self, thickness: f64) -> Topology {
        match self {
            BoundaryKind::Periodic => Topology { thickness, couples_axis: true, force_wrap: true },
            BoundaryKind::Reflective | BoundaryKind::Repulsive { .. } => {
                Topology { thickness, couples_axis: false, force_wrap: false }
            }
            BoundaryKind::Absorb | BoundaryKind::Outflow => {
                Topology { thickness, couples_axis: false, force_wrap: false }
            }
        }
    }

    /// Applies this boundary's effect to `particle` if it has crossed `face`
    /// of `domain`. Run-time failures (a particle leaving a non-periodic,
    /// non-absorbing face) are implementation-defined per spec.md §4.8: the
    /// particle is left as-is.
    pub fn apply<U>(&self, particle: &mut Particle<U>, domain: &Domain, face: Face) {
        let axis = face.axis();
        let lo = domain.min[axis];
        let hi = domain.max()[axis];
        let crossed = if face.is_positive() {
            particle.position[axis] >= hi
        } else {
            particle.position[axis] < lo
        };
        if !crossed {
            return;
        }

        match self {
            BoundaryKind::Periodic => {
                let extent = domain.extent[axis];
                if face.is_positive() {
                    particle.position[axis] -= extent;
                } else {
                    particle.position[axis] += extent;
                }
            }
            BoundaryKind::Reflective => {
                particle.velocity[axis] = -particle.velocity[axis];
                particle.position[axis] = if face.is_positive() { hi - f64::EPSILON } else { lo };
            }
            BoundaryKind::Absorb => {
                particle.state = ParticleState::DEAD;
            }
            BoundaryKind::Outflow => {
                // Left undefined beyond removal-from-dynamics; the particle
                // keeps moving and is picked up by the container's "outside"
                // sentinel cell (spec.md §4.4).
            }
            BoundaryKind::Repulsive { stiffness, range } => {
                let dist = if face.is_positive() { hi - particle.position[axis] } else { particle.position[axis] - lo };
                if dist < *range && dist > 0.0 {
                    let mag = stiffness * (*range - dist);
                    particle.force[axis] += if face.is_positive() { -mag } else { mag };
                }
            }
        }
    }
}

/// Precomputed minimum-image correction lookup, indexed by
/// `(periodic_x, periodic_y, periodic_z)` (spec.md §4.3's "2^3 jump table").
#[derive(Copy, Clone, Debug)]
pub struct Bcp {
    pub periodic: [bool; 3],
    pub extent: Vec3,
}

impl Bcp {
    pub fn correct(&self, mut r: Vec3) -> Vec3 {
        for i in 0..3 {
            if self.periodic[i] {
                let e = self.extent[i];
                if r[i] > 0.5 * e {
                    r[i] -= e;
                } else if r[i] < -0.5 * e {
                    r[i] += e;
                }
            }
        }
        r
    }

    /// A fixed-shift correction used for wrapped LinkedCells neighbor pairs
    /// (spec.md §4.4 "Wrapped pairs"): `r` is offset by a precomputed shift
    /// vector instead of re-deriving it from the periodic flags.
    pub fn shifted(shift: Vec3) -> impl Fn(Vec3) -> Vec3 {
        move |r| r + shift
    }
}
