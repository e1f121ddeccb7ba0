//! Pairwise force descriptors and the tagged-sum dispatch over them.
//!
//! The reference implementation declares the available force kinds at
//! compile time via a `std::variant`; Rust has no open sum type so the same
//! idea is expressed as the `ForceKind` enum (spec.md §9, "Compile-time
//! force/boundary variants").

use crate::error::SystemError;
use crate::fields::{self, Field, FieldMask};
use crate::vec3::Vec3;

pub const NO_CUTOFF: f64 = f64::INFINITY;

/// User-data types that participate in Coulomb interactions expose a charge.
/// A system that never uses [`Coulomb`] may implement this as a constant
/// zero; the bound is carried on [`ForceKind`] uniformly because Rust, unlike
/// the reference implementation's `requires` clause, cannot conditionally
/// require a method only for one enum variant.
pub trait Charge {
    fn charge(&self) -> f64;
}

/// Per-particle fields visible to `Force::eval`, masked down to what the
/// active force actually declared via [`required_fields`](ForceKind::required_fields).
#[derive(Copy, Clone, Debug)]
pub struct ForceView<U> {
    pub mass: f64,
    pub user_data: U,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LennardJones {
    epsilon: f64,
    sigma: f64,
    cutoff: f64,
    c6: f64,
    c12: f64,
}

impl LennardJones {
    pub fn new(epsilon: f64, sigma: f64, cutoff: Option<f64>) -> Self {
        let cutoff = cutoff.unwrap_or(3.0 * sigma);
        let mut lj = LennardJones { epsilon, sigma, cutoff, c6: 0.0, c12: 0.0 };
        lj.recompute();
        lj
    }

    fn recompute(&mut self) {
        let sigma2 = self.sigma * self.sigma;
        let sigma6 = sigma2 * sigma2 * sigma2;
        let sigma12 = sigma6 * sigma6;
        self.c6 = 24.0 * self.epsilon * sigma6;
        self.c12 = 48.0 * self.epsilon * sigma12;
    }

    fn eval(&self, r: Vec3) -> Vec3 {
        let inv_r2 = 1.0 / r.norm2();
        let inv_r6 = inv_r2 * inv_r2 * inv_r2;
        let magnitude = (self.c12 * inv_r6 - self.c6) * inv_r6 * inv_r2;
        -magnitude * r
    }

    fn mix(&self, other: &LennardJones) -> LennardJones {
        let epsilon = (self.epsilon * other.epsilon).sqrt();
        let sigma = 0.5 * (self.sigma + other.sigma);
        let cutoff = (self.cutoff * other.cutoff).sqrt();
        LennardJones::new(epsilon, sigma, Some(cutoff))
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Coulomb {
    pub coulomb_constant: f64,
    cutoff: f64,
}

impl Coulomb {
    pub fn new(coulomb_constant: f64, cutoff: Option<f64>) -> Self {
        Coulomb { coulomb_constant, cutoff: cutoff.unwrap_or(NO_CUTOFF) }
    }

    fn eval<U: Charge>(&self, u1: &U, u2: &U, r: Vec3) -> Vec3 {
        let inv_r = r.inv_norm();
        let mag = self.coulomb_constant * u1.charge() * u2.charge() * inv_r * inv_r;
        mag * inv_r * r
    }

    /// Mixes two Coulomb descriptors. The reference implementation has two
    /// historical behaviors (average, or refuse); spec.md §9 selects refuse
    /// as the safer semantic, so differing constants are an error.
    fn mix(&self, other: &Coulomb) -> Result<Coulomb, SystemError> {
        if (self.coulomb_constant - other.coulomb_constant).abs() > 1e-9 {
            return Err(SystemError::InvalidConfig(format!(
                "cannot mix Coulomb forces with different constants ({} vs {})",
                self.coulomb_constant, other.coulomb_constant
            )));
        }
        Ok(Coulomb::new(self.coulomb_constant, Some(self.cutoff.max(other.cutoff))))
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Gravity {
    pub g: f64,
    cutoff: f64,
}

impl Gravity {
    pub fn new(g: f64, cutoff: Option<f64>) -> Self {
        Gravity { g, cutoff: cutoff.unwrap_or(NO_CUTOFF) }
    }

    fn eval(&self, m1: f64, m2: f64, r: Vec3) -> Vec3 {
        let inv_r = 1.0 / r.norm();
        let mag = self.g * m1 * m2 * inv_r * inv_r;
        mag * inv_r * r
    }

    fn mix(&self, other: &Gravity) -> Gravity {
        Gravity::new(0.5 * (self.g + other.g), Some(0.5 * (self.cutoff + other.cutoff)))
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Harmonic {
    pub k: f64,
    pub r0: f64,
    cutoff: f64,
}

impl Harmonic {
    pub fn new(k: f64, r0: f64, cutoff: Option<f64>) -> Self {
        Harmonic { k, r0, cutoff: cutoff.unwrap_or(NO_CUTOFF) }
    }

    fn eval(&self, r: Vec3) -> Vec3 {
        let dist = r.norm();
        let magnitude = self.k * (dist - self.r0) / dist;
        magnitude * r
    }

    fn mix(&self, other: &Harmonic) -> Harmonic {
        // Two springs in series.
        let k = 2.0 * self.k * other.k / (self.k + other.k);
        let r0 = 0.5 * (self.r0 + other.r0);
        Harmonic::new(k, r0, Some(self.cutoff.max(other.cutoff)))
    }
}

/// The tagged sum of every force kind a system may declare, plus the two
/// internal sentinels: `NoForce` (a valid, user-visible zero force) and
/// `Sentinel` (an unreachable placeholder used only before a force-table
/// slot is filled).
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ForceKind {
    LennardJones(LennardJones),
    Coulomb(Coulomb),
    Gravity(Gravity),
    Harmonic(Harmonic),
    NoForce,
    Sentinel,
}

impl ForceKind {
    pub fn required_fields(&self) -> FieldMask {
        match self {
            ForceKind::Coulomb(_) => Field::UserData as u32,
            ForceKind::Gravity(_) => Field::Mass as u32,
            ForceKind::LennardJones(_) | ForceKind::Harmonic(_) | ForceKind::NoForce => fields::NONE,
            ForceKind::Sentinel => fields::NONE,
        }
    }

    pub fn cutoff(&self) -> f64 {
        match self {
            ForceKind::LennardJones(f) => f.cutoff,
            ForceKind::Coulomb(f) => f.cutoff,
            ForceKind::Gravity(f) => f.cutoff,
            ForceKind::Harmonic(f) => f.cutoff,
            ForceKind::NoForce => NO_CUTOFF,
            ForceKind::Sentinel => -1.0,
        }
    }

    pub fn cutoff2(&self) -> f64 {
        let c = self.cutoff();
        if c.is_infinite() { c } else { c * c }
    }

    pub fn has_cutoff(&self) -> bool {
        self.cutoff() != NO_CUTOFF
    }

    /// Evaluates the force on particle 1 given the difference vector
    /// `r = p2.position - p1.position` (already boundary-corrected).
    pub fn eval<U: Copy + Charge>(&self, p1: &ForceView<U>, p2: &ForceView<U>, r: Vec3) -> Vec3 {
        match self {
            ForceKind::LennardJones(f) => f.eval(r),
            ForceKind::Coulomb(f) => f.eval(&p1.user_data, &p2.user_data, r),
            ForceKind::Gravity(f) => f.eval(p1.mass, p2.mass, r),
            ForceKind::Harmonic(f) => f.eval(r),
            ForceKind::NoForce => Vec3::ZERO,
            ForceKind::Sentinel => unreachable!("ForceKind::Sentinel must never be evaluated"),
        }
    }

    /// Synthesizes a cross-type entry from two same-kind self-interactions.
    /// Mixing different kinds, or mixing through the sentinel, is a
    /// build-time configuration error (spec.md §4.6).
    pub fn mix(&self, other: &ForceKind) -> Result<ForceKind, SystemError> {
        match (self, other) {
            (ForceKind::LennardJones(a), ForceKind::LennardJones(b)) => {
                Ok(ForceKind::LennardJones(a.mix(b)))
            }
            (ForceKind::Coulomb(a), ForceKind::Coulomb(b)) => Ok(ForceKind::Coulomb(a.mix(b)?)),
            (ForceKind::Gravity(a), ForceKind::Gravity(b)) => Ok(ForceKind::Gravity(a.mix(b))),
            (ForceKind::Harmonic(a), ForceKind::Harmonic(b)) => Ok(ForceKind::Harmonic(a.mix(b))),
            (ForceKind::NoForce, ForceKind::NoForce) => Ok(ForceKind::NoForce),
            (a, b) => Err(SystemError::InvalidConfig(format!(
                "cannot mix force kinds {a:?} and {b:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Copy, Clone)]
    struct Q(f64);
    impl Charge for Q {
        fn charge(&self) -> f64 {
            self.0
        }
    }

    #[test]
    fn two_body_coulomb() {
        let f = ForceKind::Coulomb(Coulomb::new(1.0, None));
        let p1 = ForceView { mass: 1.0, user_data: Q(1.0) };
        let p2 = ForceView { mass: 1.0, user_data: Q(-2.0) };
        let r = Vec3::new(2.0, 0.0, 0.0);
        let force_on_1 = f.eval(&p1, &p2, r);
        assert!((force_on_1.x - (-0.5)).abs() < 1e-12);
        assert!(force_on_1.y.abs() < 1e-12);
        assert!(force_on_1.z.abs() < 1e-12);
    }

    #[test]
    fn lennard_jones_at_sigma_two() {
        let f = ForceKind::LennardJones(LennardJones::new(1.0, 2.0, None));
        let p = ForceView { mass: 1.0, user_data: Q(0.0) };
        let r = Vec3::new(2.0, 0.0, 0.0);
        let force_on_1 = f.eval(&p, &p, r);
        assert!((force_on_1.x - (-12.0)).abs() < 1e-9);
        assert!(force_on_1.y.abs() < 1e-9);
        assert!(force_on_1.z.abs() < 1e-9);
    }

    #[test]
    fn gravity_two_body() {
        let f = ForceKind::Gravity(Gravity::new(1.0, None));
        let p1 = ForceView { mass: 10.0, user_data: Q(0.0) };
        let p2 = ForceView { mass: 20.0, user_data: Q(0.0) };
        let r = Vec3::new(2.0, 0.0, 0.0);
        let force_on_1 = f.eval(&p1, &p2, r);
        assert!((force_on_1.x - 50.0).abs() < 1e-9);
    }

    #[test]
    fn mixing_different_kinds_is_rejected() {
        let a = ForceKind::Gravity(Gravity::new(1.0, None));
        let b = ForceKind::LennardJones(LennardJones::new(1.0, 1.0, None));
        assert!(a.mix(&b).is_err());
    }

    #[test]
    fn mixing_coulomb_with_different_constants_is_rejected() {
        let a = ForceKind::Coulomb(Coulomb::new(1.0, None));
        let b = ForceKind::Coulomb(Coulomb::new(2.0, None));
        assert!(a.mix(&b).is_err());
    }

    #[test]
    fn no_force_is_zero() {
        let f = ForceKind::NoForce;
        let p = ForceView { mass: 1.0, user_data: Q(0.0) };
        let r = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(f.eval(&p, &p, r), Vec3::ZERO);
    }
}
