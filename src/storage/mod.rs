//! Three data-layout-polymorphic particle storages behind one interface
//! (spec.md §4.1). Each layout copies records in on `build`, rewrites itself
//! in bucket order on `reorder`, and hands out the same field-masked
//! projections ([`crate::fields::View`], [`crate::fields::RestrictedRef`]) so
//! that code above this layer never has to know which layout it is driving.

mod aos;
mod aosoa;
mod soa;

pub use aos::Aos;
pub use aosoa::{Aosoa, CHUNK_WIDTH};
pub use soa::Soa;

use crate::fields::{RestrictedRef, View};
use crate::particle::{Particle, ParticleState};
use crate::vec3::Vec3;

/// Common contract implemented by [`Aos`], [`Soa`], and [`Aosoa`].
///
/// `reorder` takes, for each new index `i`, the index the particle
/// previously occupied (`old_index_order[i]`); this is exactly the
/// information a bucket sort produces (spec.md §3 "Storage invariants").
pub trait Storage<U: Copy> {
    fn build(records: Vec<Particle<U>>) -> Self;
    fn len(&self) -> usize;
    fn reorder(&mut self, old_index_order: &[usize]);

    fn get(&self, i: usize) -> Particle<U>;
    fn set(&mut self, i: usize, p: Particle<U>);

    fn view(&self, i: usize) -> View<U>;
    fn restricted(&self, i: usize) -> RestrictedRef<U>;

    fn add_force(&mut self, i: usize, f: Vec3);
    fn reset_forces(&mut self);

    /// Iterates the half-open index range `[start, stop)`, visiting
    /// particles whose state intersects `state_filter`.
    fn for_each_particle<F: FnMut(usize, &mut Particle<U>)>(
        &mut self,
        start: usize,
        stop: usize,
        state_filter: ParticleState,
        f: F,
    );
}
