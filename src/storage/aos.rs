use super::Storage;
use crate::fields::{RestrictedRef, View};
use crate::particle::{Particle, ParticleState};
use crate::vec3::Vec3;

/// Array-of-structs: a single flat vector of records. The simplest layout;
/// every field of a particle is adjacent, so a code path touching one field
/// drags the whole record through cache (spec.md §4.1).
pub struct Aos<U> {
    records: Vec<Particle<U>>,
}

impl<U: Copy> Storage<U> for Aos<U> {
    fn build(records: Vec<Particle<U>>) -> Self {
        Aos { records }
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn reorder(&mut self, old_index_order: &[usize]) {
        let mut next = Vec::with_capacity(old_index_order.len());
        for &old in old_index_order {
            next.push(self.records[old].clone());
        }
        self.records = next;
    }

    fn get(&self, i: usize) -> Particle<U> {
        self.records[i].clone()
    }

    fn set(&mut self, i: usize, p: Particle<U>) {
        self.records[i] = p;
    }

    fn view(&self, i: usize) -> View<U> {
        let p = &self.records[i];
        View {
            position: p.position,
            velocity: p.velocity,
            mass: p.mass,
            ty: p.ty,
            id: p.id,
            state: p.state,
            user_data: p.user_data,
        }
    }

    fn restricted(&self, i: usize) -> RestrictedRef<U> {
        let p = &self.records[i];
        RestrictedRef {
            position: p.position,
            mass: p.mass,
            ty: p.ty,
            id: p.id,
            state: p.state,
            user_data: p.user_data,
        }
    }

    fn add_force(&mut self, i: usize, f: Vec3) {
        self.records[i].force += f;
    }

    fn reset_forces(&mut self) {
        for p in &mut self.records {
            p.old_force = p.force;
            p.force = Vec3::ZERO;
        }
    }

    fn for_each_particle<F: FnMut(usize, &mut Particle<U>)>(
        &mut self,
        start: usize,
        stop: usize,
        state_filter: ParticleState,
        mut f: F,
    ) {
        for i in start..stop.min(self.records.len()) {
            if self.records[i].state.intersects(state_filter) {
                f(i, &mut self.records[i]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(id: u32) -> Particle<()> {
        Particle::new(id, 0, Vec3::new(id as f64, 0.0, 0.0), 1.0)
    }

    #[test]
    fn reorder_preserves_identity() {
        let mut aos = Aos::build(vec![particle(0), particle(1), particle(2)]);
        aos.reorder(&[2, 0, 1]);
        assert_eq!(aos.get(0).id, 2);
        assert_eq!(aos.get(1).id, 0);
        assert_eq!(aos.get(2).id, 1);
    }

    #[test]
    fn reorder_to_self_is_idempotent() {
        let mut aos = Aos::build(vec![particle(0), particle(1), particle(2)]);
        aos.reorder(&[0, 1, 2]);
        assert_eq!(aos.get(0).id, 0);
        assert_eq!(aos.get(1).id, 1);
        assert_eq!(aos.get(2).id, 2);
    }
}
