//! The per-step state machine and the public surface integrators and
//! monitors drive it through (spec.md §4.7, §6).

use tracing::trace;

use crate::batch::{Batch, Correction};
use crate::boundary::{BoundaryKind, Face};
use crate::container::Container;
use crate::domain::Domain;
use crate::storage::Storage;
use crate::engine;
use crate::fields::RestrictedRef;
use crate::force::Charge;
use crate::force_table::ForceTable;
use crate::particle::{Particle, ParticleState};
use crate::vec3::Vec3;

/// A uniform field applied to every exerting particle before integration,
/// e.g. gravity-well or an external electric field (spec.md §1, "Out of
/// scope ... consume a field-masked particle iterator").
pub type FieldFn<U> = Box<dyn Fn(&RestrictedRef<U>) -> Vec3>;

/// A per-step hook with free access to the container, e.g. a thermostat or
/// a particle source/sink.
pub type ControllerFn<C> = Box<dyn FnMut(&mut C)>;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Phase {
    Init,
    Running,
    Final,
}

/// Owns the container, force table, and boundary table for one simulation
/// and exposes the hooks an external integrator drives (spec.md §6
/// "Integrator hook"). Only the per-step loop has explicit states:
/// `INIT -> RUN -> (STEP -> RECORD)* -> FINAL` (spec.md §4.7).
pub struct System<U: Copy + Charge, C: Container<U>> {
    container: C,
    force_table: ForceTable,
    boundaries: [BoundaryKind; 6],
    force_fields: Vec<FieldFn<U>>,
    controllers: Vec<ControllerFn<C>>,
    time: f64,
    step: u64,
    phase: Phase,
}

impl<U: Copy + Charge, C: Container<U>> System<U, C> {
    pub(crate) fn new(container: C, force_table: ForceTable, boundaries: [BoundaryKind; 6]) -> Self {
        System {
            container,
            force_table,
            boundaries,
            force_fields: Vec::new(),
            controllers: Vec::new(),
            time: 0.0,
            step: 0,
            phase: Phase::Init,
        }
    }

    pub fn add_force_field(&mut self, f: FieldFn<U>) {
        self.force_fields.push(f);
    }

    pub fn add_controller(&mut self, f: ControllerFn<C>) {
        self.controllers.push(f);
    }

    pub fn domain(&self) -> Domain {
        self.container.domain()
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn size(&self, state_filter: ParticleState) -> usize {
        let n = self.container.storage().len();
        (0..n).filter(|&i| self.container.storage().view(i).state.intersects(state_filter)).count()
    }

    pub fn collect_indices_in_region(&self, region: Domain) -> Vec<usize> {
        self.container.collect_indices_in_region(region)
    }

    pub fn container(&self) -> &C {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut C {
        &mut self.container
    }

    /// Iterates particles in `[0, particle_count)` matching `state_filter`.
    pub fn for_each_particle<F: FnMut(usize, &mut Particle<U>)>(&mut self, state_filter: ParticleState, f: F) {
        let n = self.container.storage().len();
        self.container.storage_mut().for_each_particle(0, n, state_filter, f);
    }

    pub fn for_each_interaction_batch<F: FnMut(&Batch, &Correction)>(&self, f: F) {
        self.container.for_each_interaction_batch(f);
    }

    /// Re-bins the container from current positions. A no-op for DirectSum.
    pub fn rebuild_structure(&mut self) {
        trace!(particle_count = self.container.particle_count(), "rebuilding container structure");
        self.container.rebuild_structure();
    }

    /// Applies every face's boundary kind to particles that crossed it.
    pub fn apply_boundary_conditions(&mut self) {
        let domain = self.container.domain();
        let boundaries = self.boundaries;
        let n = self.container.storage().len();
        self.container.storage_mut().for_each_particle(0, n, ParticleState::ALIVE, |_, p| {
            for &face in &Face::ALL {
                boundaries[face.index()].apply(p, &domain, face);
            }
        });
    }

    /// Resets forces, then evaluates every interaction batch the container
    /// currently emits (spec.md §4.5).
    pub fn compute_forces(&mut self) {
        self.container.storage_mut().reset_forces();
        let mut batches = Vec::new();
        self.container.for_each_interaction_batch(|batch, correction| {
            batches.push((batch.clone(), *correction));
        });
        for (batch, correction) in &batches {
            engine::evaluate_batch(self.container.storage_mut(), &self.force_table, batch, correction);
        }
    }

    /// Adds every registered uniform field's contribution to each exerting
    /// particle's force.
    pub fn apply_force_fields(&mut self) {
        if self.force_fields.is_empty() {
            return;
        }
        let n = self.container.storage().len();
        for i in 0..n {
            let restricted = self.container.storage().restricted(i);
            if !restricted.state.intersects(ParticleState::EXERTING) {
                continue;
            }
            let mut total = Vec3::ZERO;
            for field in &self.force_fields {
                total += field(&restricted);
            }
            self.container.storage_mut().add_force(i, total);
        }
    }

    /// Runs every registered controller once, in registration order.
    pub fn apply_controllers(&mut self) {
        for controller in &mut self.controllers {
            controller(&mut self.container);
        }
    }

    /// Advances the step counter and simulated time; called by an
    /// integrator after it has moved every particle.
    pub fn advance(&mut self, dt: f64) {
        self.time += dt;
        self.step += 1;
        self.phase = Phase::Running;
    }

    pub fn finish(&mut self) {
        self.phase = Phase::Final;
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Final
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::DirectSum;
    use crate::container::ContainerFlags;
    use crate::force::{ForceKind, Gravity};
    use crate::storage::Aos;
    use crate::vec3::Vec3;

    #[derive(Copy, Clone, Default)]
    struct NoCharge;
    impl Charge for NoCharge {
        fn charge(&self) -> f64 {
            0.0
        }
    }

    fn make_system() -> System<NoCharge, DirectSum<NoCharge, Aos<NoCharge>>> {
        let particles = vec![
            Particle::new(0, 0, Vec3::new(0.0, 0.0, 0.0), 10.0),
            Particle::new(1, 0, Vec3::new(2.0, 0.0, 0.0), 20.0),
        ];
        let domain = Domain::new(Vec3::splat(-10.0), Vec3::splat(20.0));
        let container = DirectSum::build(particles, 1, domain, ContainerFlags::default());
        let force_table = ForceTable::build(
            1,
            &[(0u16, 0u16, ForceKind::Gravity(Gravity::new(1.0, None)))],
            &[],
            &[true],
        )
        .unwrap();
        System::new(container, force_table, [BoundaryKind::Outflow; 6])
    }

    #[test]
    fn compute_forces_applies_newtons_third_law() {
        let mut system = make_system();
        system.compute_forces();
        let f1 = system.container().storage().get(0).force;
        let f2 = system.container().storage().get(1).force;
        assert!((f1.x + f2.x).abs() < 1e-12);
        assert!((f1.x - 50.0).abs() < 1e-9);
    }

    #[test]
    fn advance_tracks_time_and_step() {
        let mut system = make_system();
        system.advance(0.1);
        system.advance(0.1);
        assert_eq!(system.step(), 2);
        assert!((system.time() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn force_field_adds_to_every_particle() {
        let mut system = make_system();
        system.add_force_field(Box::new(|_: &RestrictedRef<NoCharge>| Vec3::new(0.0, -1.0, 0.0)));
        system.apply_force_fields();
        assert_eq!(system.container().storage().get(0).force.y, -1.0);
        assert_eq!(system.container().storage().get(1).force.y, -1.0);
    }

    #[test]
    fn force_field_skips_dead_particles() {
        let mut system = make_system();
        let mut dead = system.container().storage().get(0);
        dead.state = ParticleState::DEAD;
        system.container_mut().storage_mut().set(0, dead);

        system.add_force_field(Box::new(|_: &RestrictedRef<NoCharge>| Vec3::new(0.0, -1.0, 0.0)));
        system.apply_force_fields();
        assert_eq!(system.container().storage().get(0).force, Vec3::ZERO);
        assert_eq!(system.container().storage().get(1).force.y, -1.0);
    }
}
