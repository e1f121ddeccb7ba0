use super::Storage;
use crate::fields::{RestrictedRef, View};
use crate::particle::{Particle, ParticleId, ParticleState, ParticleType};
use crate::vec3::Vec3;

/// Struct-of-arrays: one vector per field. A loop touching only `position`
/// and `force` streams two arrays instead of the whole record, which is the
/// entire point of the layout (spec.md §4.1, §4.4 rationale).
pub struct Soa<U> {
    id: Vec<ParticleId>,
    ty: Vec<ParticleType>,
    position: Vec<Vec3>,
    velocity: Vec<Vec3>,
    old_position: Vec<Vec3>,
    force: Vec<Vec3>,
    old_force: Vec<Vec3>,
    mass: Vec<f64>,
    state: Vec<ParticleState>,
    user_data: Vec<U>,
}

impl<U: Copy> Storage<U> for Soa<U> {
    fn build(records: Vec<Particle<U>>) -> Self {
        let n = records.len();
        let mut s = Soa {
            id: Vec::with_capacity(n),
            ty: Vec::with_capacity(n),
            position: Vec::with_capacity(n),
            velocity: Vec::with_capacity(n),
            old_position: Vec::with_capacity(n),
            force: Vec::with_capacity(n),
            old_force: Vec::with_capacity(n),
            mass: Vec::with_capacity(n),
            state: Vec::with_capacity(n),
            user_data: Vec::with_capacity(n),
        };
        for p in records {
            s.id.push(p.id);
            s.ty.push(p.ty);
            s.position.push(p.position);
            s.velocity.push(p.velocity);
            s.old_position.push(p.old_position);
            s.force.push(p.force);
            s.old_force.push(p.old_force);
            s.mass.push(p.mass);
            s.state.push(p.state);
            s.user_data.push(p.user_data);
        }
        s
    }

    fn len(&self) -> usize {
        self.id.len()
    }

    fn reorder(&mut self, old_index_order: &[usize]) {
        macro_rules! permute {
            ($field:ident) => {
                self.$field = old_index_order.iter().map(|&old| self.$field[old]).collect();
            };
        }
        permute!(id);
        permute!(ty);
        permute!(position);
        permute!(velocity);
        permute!(old_position);
        permute!(force);
        permute!(old_force);
        permute!(mass);
        permute!(state);
        permute!(user_data);
    }

    fn get(&self, i: usize) -> Particle<U> {
        Particle {
            id: self.id[i],
            ty: self.ty[i],
            position: self.position[i],
            velocity: self.velocity[i],
            old_position: self.old_position[i],
            force: self.force[i],
            old_force: self.old_force[i],
            mass: self.mass[i],
            state: self.state[i],
            user_data: self.user_data[i],
        }
    }

    fn set(&mut self, i: usize, p: Particle<U>) {
        self.id[i] = p.id;
        self.ty[i] = p.ty;
        self.position[i] = p.position;
        self.velocity[i] = p.velocity;
        self.old_position[i] = p.old_position;
        self.force[i] = p.force;
        self.old_force[i] = p.old_force;
        self.mass[i] = p.mass;
        self.state[i] = p.state;
        self.user_data[i] = p.user_data;
    }

    fn view(&self, i: usize) -> View<U> {
        View {
            position: self.position[i],
            velocity: self.velocity[i],
            mass: self.mass[i],
            ty: self.ty[i],
            id: self.id[i],
            state: self.state[i],
            user_data: self.user_data[i],
        }
    }

    fn restricted(&self, i: usize) -> RestrictedRef<U> {
        RestrictedRef {
            position: self.position[i],
            mass: self.mass[i],
            ty: self.ty[i],
            id: self.id[i],
            state: self.state[i],
            user_data: self.user_data[i],
        }
    }

    fn add_force(&mut self, i: usize, f: Vec3) {
        self.force[i] += f;
    }

    fn reset_forces(&mut self) {
        std::mem::swap(&mut self.old_force, &mut self.force);
        for f in &mut self.force {
            *f = Vec3::ZERO;
        }
    }

    fn for_each_particle<F: FnMut(usize, &mut Particle<U>)>(
        &mut self,
        start: usize,
        stop: usize,
        state_filter: ParticleState,
        mut f: F,
    ) {
        for i in start..stop.min(self.len()) {
            if self.state[i].intersects(state_filter) {
                let mut p = self.get(i);
                f(i, &mut p);
                self.set(i, p);
            }
        }
    }
}
