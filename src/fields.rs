//! Field masks and the compile-time-erased particle projections they gate.
//!
//! Every component that touches particle storage declares the subset of
//! fields it needs. A mask is a `bitflags`-style `u32`; the reference
//! implementation's `particle/fields.h` motivates the layout one-for-one.

use crate::particle::ParticleState;
use crate::vec3::Vec3;

pub type FieldMask = u32;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Field {
    Position = 1 << 0,
    Velocity = 1 << 1,
    Force = 1 << 2,
    OldPosition = 1 << 3,
    OldForce = 1 << 4,
    State = 1 << 5,
    Mass = 1 << 6,
    Type = 1 << 7,
    Id = 1 << 8,
    UserData = 1 << 9,
}

pub const NONE: FieldMask = 0;
pub const ALL: FieldMask = (1 << 10) - 1;

/// Masks used at the three call sites named in spec.md §9: a full mutable
/// reference, a read-only view, and a write-force-only restricted reference.
pub const FULL: FieldMask = ALL;
pub const VIEW: FieldMask =
    Field::Position as u32 | Field::Velocity as u32 | Field::Mass as u32
        | Field::Type as u32 | Field::Id as u32 | Field::State as u32 | Field::UserData as u32;
pub const RESTRICTED: FieldMask =
    Field::Position as u32 | Field::Force as u32 | Field::Mass as u32
        | Field::Type as u32 | Field::Id as u32 | Field::UserData as u32;

#[inline]
pub const fn has(mask: FieldMask, field: Field) -> bool {
    mask & (field as u32) != 0
}

/// A read-only, field-masked projection of a single particle.
///
/// Layouts build this from their fetcher; fields outside `M` simply are not
/// read from backing storage, so unused loads are elided at the call site
/// even though this struct (unlike the AoSoA lane proxy) always carries
/// copies rather than references — copies are cheap for the scalar fields
/// a `View` exposes.
#[derive(Copy, Clone, Debug)]
pub struct View<U: Copy> {
    pub position: Vec3,
    pub velocity: Vec3,
    pub mass: f64,
    pub ty: u16,
    pub id: u32,
    pub state: ParticleState,
    pub user_data: U,
}

/// A write-force-only projection produced for the inner interaction loop.
/// Readable fields are whatever the active force's required mask demands;
/// `force` is the only field ever written through it. `state` is always
/// carried so the engine can skip a pair without a separate lookup
/// (spec.md §3 "DEAD ... excluded from dynamics and forces").
#[derive(Copy, Clone, Debug)]
pub struct RestrictedRef<U: Copy> {
    pub position: Vec3,
    pub mass: f64,
    pub ty: u16,
    pub id: u32,
    pub state: ParticleState,
    pub user_data: U,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_composition() {
        let m = Field::Position as u32 | Field::Mass as u32;
        assert!(has(m, Field::Position));
        assert!(has(m, Field::Mass));
        assert!(!has(m, Field::Velocity));
    }

    #[test]
    fn all_covers_every_field() {
        for f in [
            Field::Position,
            Field::Velocity,
            Field::Force,
            Field::OldPosition,
            Field::OldForce,
            Field::State,
            Field::Mass,
            Field::Type,
            Field::Id,
            Field::UserData,
        ] {
            assert!(has(ALL, f));
        }
    }
}
