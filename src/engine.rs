//! Executes a batch: iterates its pairs, applies the BCP, evaluates the
//! looked-up force, and writes reaction pairs (spec.md §4.5).

use crate::batch::{Batch, CompoundBatch, Correction};
use crate::force::{Charge, ForceView};
use crate::force_table::ForceTable;
use crate::particle::ParticleState;
use crate::storage::Storage;

/// Runs every pair of `batch` through `table`, writing forces back into
/// `storage`. This is the callback the force subsystem hands to a
/// container's `for_each_interaction_batch`.
pub fn evaluate_batch<U, S>(storage: &mut S, table: &ForceTable, batch: &Batch, correction: &Correction)
where
    U: Copy + Charge,
    S: Storage<U>,
{
    batch.for_each_pair(|i, j| {
        let pi = storage.restricted(i);
        let pj = storage.restricted(j);

        if !pi.state.intersects(ParticleState::EXERTING) || !pj.state.intersects(ParticleState::EXERTING) {
            return;
        }

        let mut r = pj.position - pi.position;
        r = correction.apply(r);
        let r2 = r.norm2();

        let force = table.lookup(pi.id, pj.id, pi.ty, pj.ty);
        if r2 > force.cutoff2() {
            return;
        }

        let v1 = ForceView { mass: pi.mass, user_data: pi.user_data };
        let v2 = ForceView { mass: pj.mass, user_data: pj.user_data };
        let f = force.eval(&v1, &v2, r);

        storage.add_force(i, f);
        storage.add_force(j, -f);
    });
}

/// Runs every batch of a compound batch (spec.md §4.4 "Batch emission"):
/// a block's worth of work dispatched in one call.
pub fn evaluate_compound<U, S>(storage: &mut S, table: &ForceTable, compound: &CompoundBatch)
where
    U: Copy + Charge,
    S: Storage<U>,
{
    for (batch, correction) in &compound.batches {
        evaluate_batch(storage, table, batch, correction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::SymmetricBatch;
    use crate::force::{ForceKind, Gravity};
    use crate::particle::Particle;
    use crate::storage::Aos;
    use crate::vec3::Vec3;

    #[derive(Copy, Clone, Default)]
    struct NoCharge;
    impl Charge for NoCharge {
        fn charge(&self) -> f64 {
            0.0
        }
    }

    #[test]
    fn newtons_third_law_holds_after_one_batch() {
        let p1 = Particle::<NoCharge>::new(0, 0, Vec3::new(0.0, 0.0, 0.0), 10.0);
        let p2 = Particle::<NoCharge>::new(1, 0, Vec3::new(2.0, 0.0, 0.0), 20.0);
        let mut storage = Aos::build(vec![p1, p2]);

        let table = ForceTable::build(
            1,
            &[(0, 0, ForceKind::Gravity(Gravity::new(1.0, None)))],
            &[],
            &[true],
        )
        .unwrap();

        let batch = Batch::Symmetric(SymmetricBatch { range: 0..2 });
        evaluate_batch(&mut storage, &table, &batch, &Correction::None);

        let f1 = storage.get(0).force;
        let f2 = storage.get(1).force;
        assert!((f1.x + f2.x).abs() < 1e-12);
        assert!((f1.x - 50.0).abs() < 1e-9);
    }

    #[test]
    fn pairs_beyond_cutoff_contribute_nothing() {
        let p1 = Particle::<NoCharge>::new(0, 0, Vec3::new(0.0, 0.0, 0.0), 1.0);
        let p2 = Particle::<NoCharge>::new(1, 0, Vec3::new(100.0, 0.0, 0.0), 1.0);
        let mut storage = Aos::build(vec![p1, p2]);

        let table = ForceTable::build(
            1,
            &[(0, 0, ForceKind::Gravity(Gravity::new(1.0, Some(5.0))))],
            &[],
            &[true],
        )
        .unwrap();

        let batch = Batch::Symmetric(SymmetricBatch { range: 0..2 });
        evaluate_batch(&mut storage, &table, &batch, &Correction::None);

        assert_eq!(storage.get(0).force, Vec3::ZERO);
        assert_eq!(storage.get(1).force, Vec3::ZERO);
    }

    #[test]
    fn dead_particle_neither_exerts_nor_receives_force() {
        let mut p1 = Particle::<NoCharge>::new(0, 0, Vec3::new(0.0, 0.0, 0.0), 10.0);
        p1.state = ParticleState::DEAD;
        let p2 = Particle::<NoCharge>::new(1, 0, Vec3::new(2.0, 0.0, 0.0), 20.0);
        let mut storage = Aos::build(vec![p1, p2]);

        let table = ForceTable::build(
            1,
            &[(0, 0, ForceKind::Gravity(Gravity::new(1.0, None)))],
            &[],
            &[true],
        )
        .unwrap();

        let batch = Batch::Symmetric(SymmetricBatch { range: 0..2 });
        evaluate_batch(&mut storage, &table, &batch, &Correction::None);

        assert_eq!(storage.get(0).force, Vec3::ZERO);
        assert_eq!(storage.get(1).force, Vec3::ZERO);
    }
}
