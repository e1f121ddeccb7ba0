use super::Storage;
use crate::fields::{RestrictedRef, View};
use crate::particle::{Particle, ParticleId, ParticleState, ParticleType};
use crate::vec3::Vec3;

/// Chunk width in lanes. A power of two, as required by spec.md §3's
/// `(index >> log2(W)) , index & (W-1)` addressing scheme.
pub const CHUNK_WIDTH: usize = 4;

/// One fixed-size chunk: every field is an aligned array of `CHUNK_WIDTH`
/// scalars. Lanes beyond a bucket's live count are unused filler, not
/// read by any batch (the batch machinery tracks the valid-lane count of
/// the tail chunk itself, per spec.md §3).
#[derive(Clone)]
struct Chunk<U> {
    id: [ParticleId; CHUNK_WIDTH],
    ty: [ParticleType; CHUNK_WIDTH],
    position: [Vec3; CHUNK_WIDTH],
    velocity: [Vec3; CHUNK_WIDTH],
    old_position: [Vec3; CHUNK_WIDTH],
    force: [Vec3; CHUNK_WIDTH],
    old_force: [Vec3; CHUNK_WIDTH],
    mass: [f64; CHUNK_WIDTH],
    state: [ParticleState; CHUNK_WIDTH],
    user_data: [U; CHUNK_WIDTH],
}

impl<U: Copy + Default> Chunk<U> {
    fn empty() -> Self {
        Chunk {
            id: [0; CHUNK_WIDTH],
            ty: [0; CHUNK_WIDTH],
            position: [Vec3::ZERO; CHUNK_WIDTH],
            velocity: [Vec3::ZERO; CHUNK_WIDTH],
            old_position: [Vec3::ZERO; CHUNK_WIDTH],
            force: [Vec3::ZERO; CHUNK_WIDTH],
            old_force: [Vec3::ZERO; CHUNK_WIDTH],
            mass: [0.0; CHUNK_WIDTH],
            state: [ParticleState::default(); CHUNK_WIDTH],
            user_data: [U::default(); CHUNK_WIDTH],
        }
    }
}

/// Array-of-struct-of-arrays: a sequence of fixed-width [`Chunk`]s. Combines
/// SoA's per-field streaming with AoS's locality within a chunk, and is the
/// layout the reference implementation targets for its SIMD inner loops
/// (spec.md §4.1, §4.5).
pub struct Aosoa<U> {
    chunks: Vec<Chunk<U>>,
    len: usize,
}

impl<U> Aosoa<U> {
    fn addr(i: usize) -> (usize, usize) {
        (i / CHUNK_WIDTH, i % CHUNK_WIDTH)
    }
}

impl<U: Copy + Default> Storage<U> for Aosoa<U> {
    fn build(records: Vec<Particle<U>>) -> Self {
        let len = records.len();
        let n_chunks = (len + CHUNK_WIDTH - 1) / CHUNK_WIDTH;
        let mut chunks = vec![Chunk::empty(); n_chunks];
        for (i, p) in records.into_iter().enumerate() {
            let (c, lane) = Self::addr(i);
            let chunk = &mut chunks[c];
            chunk.id[lane] = p.id;
            chunk.ty[lane] = p.ty;
            chunk.position[lane] = p.position;
            chunk.velocity[lane] = p.velocity;
            chunk.old_position[lane] = p.old_position;
            chunk.force[lane] = p.force;
            chunk.old_force[lane] = p.old_force;
            chunk.mass[lane] = p.mass;
            chunk.state[lane] = p.state;
            chunk.user_data[lane] = p.user_data;
        }
        Aosoa { chunks, len }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn reorder(&mut self, old_index_order: &[usize]) {
        let mut next = vec![Chunk::empty(); self.chunks.len()];
        for (new_i, &old_i) in old_index_order.iter().enumerate() {
            let p = self.get(old_i);
            let (c, lane) = Self::addr(new_i);
            let chunk = &mut next[c];
            chunk.id[lane] = p.id;
            chunk.ty[lane] = p.ty;
            chunk.position[lane] = p.position;
            chunk.velocity[lane] = p.velocity;
            chunk.old_position[lane] = p.old_position;
            chunk.force[lane] = p.force;
            chunk.old_force[lane] = p.old_force;
            chunk.mass[lane] = p.mass;
            chunk.state[lane] = p.state;
            chunk.user_data[lane] = p.user_data;
        }
        self.chunks = next;
    }

    fn get(&self, i: usize) -> Particle<U> {
        let (c, lane) = Self::addr(i);
        let chunk = &self.chunks[c];
        Particle {
            id: chunk.id[lane],
            ty: chunk.ty[lane],
            position: chunk.position[lane],
            velocity: chunk.velocity[lane],
            old_position: chunk.old_position[lane],
            force: chunk.force[lane],
            old_force: chunk.old_force[lane],
            mass: chunk.mass[lane],
            state: chunk.state[lane],
            user_data: chunk.user_data[lane],
        }
    }

    fn set(&mut self, i: usize, p: Particle<U>) {
        let (c, lane) = Self::addr(i);
        let chunk = &mut self.chunks[c];
        chunk.id[lane] = p.id;
        chunk.ty[lane] = p.ty;
        chunk.position[lane] = p.position;
        chunk.velocity[lane] = p.velocity;
        chunk.old_position[lane] = p.old_position;
        chunk.force[lane] = p.force;
        chunk.old_force[lane] = p.old_force;
        chunk.mass[lane] = p.mass;
        chunk.state[lane] = p.state;
        chunk.user_data[lane] = p.user_data;
    }

    fn view(&self, i: usize) -> View<U> {
        let (c, lane) = Self::addr(i);
        let chunk = &self.chunks[c];
        View {
            position: chunk.position[lane],
            velocity: chunk.velocity[lane],
            mass: chunk.mass[lane],
            ty: chunk.ty[lane],
            id: chunk.id[lane],
            state: chunk.state[lane],
            user_data: chunk.user_data[lane],
        }
    }

    fn restricted(&self, i: usize) -> RestrictedRef<U> {
        let (c, lane) = Self::addr(i);
        let chunk = &self.chunks[c];
        RestrictedRef {
            position: chunk.position[lane],
            mass: chunk.mass[lane],
            ty: chunk.ty[lane],
            id: chunk.id[lane],
            state: chunk.state[lane],
            user_data: chunk.user_data[lane],
        }
    }

    fn add_force(&mut self, i: usize, f: Vec3) {
        let (c, lane) = Self::addr(i);
        self.chunks[c].force[lane] += f;
    }

    fn reset_forces(&mut self) {
        for chunk in &mut self.chunks {
            chunk.old_force = chunk.force;
            chunk.force = [Vec3::ZERO; CHUNK_WIDTH];
        }
    }

    fn for_each_particle<F: FnMut(usize, &mut Particle<U>)>(
        &mut self,
        start: usize,
        stop: usize,
        state_filter: ParticleState,
        mut f: F,
    ) {
        for i in start..stop.min(self.len) {
            let (c, lane) = Self::addr(i);
            if self.chunks[c].state[lane].intersects(state_filter) {
                let mut p = self.get(i);
                f(i, &mut p);
                self.set(i, p);
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
    fn addressing_round_trips() {
        let aosoa = Aosoa::build((0..9).map(particle).collect());
        for i in 0..9 {
            assert_eq!(aosoa.get(i).id, i as u32);
        }
    }

    #[test]
    fn reorder_preserves_identity() {
        let mut aosoa = Aosoa::build((0..5).map(particle).collect());
        aosoa.reorder(&[4, 3, 2, 1, 0]);
        for i in 0..5 {
            assert_eq!(aosoa.get(i).id, (4 - i) as u32);
        }
    }
}
