//! The non-layout-specific container contract (spec.md §4.2) plus the
//! bucket-sort-by-type helper shared by [`direct_sum`] and [`linked_cells`].

pub mod direct_sum;
pub mod linked_cells;

pub use direct_sum::DirectSum;
pub use linked_cells::LinkedCells;

use fxhash::FxHashMap;

use crate::batch::{Batch, Correction};
use crate::domain::Domain;
use crate::particle::{Particle, ParticleId};
use crate::storage::Storage;

/// Flags set by the build step (spec.md §4.2).
#[derive(Copy, Clone, Debug, Default)]
pub struct ContainerFlags {
    pub periodic: [bool; 3],
    pub infinite_domain: bool,
    pub particle_addable: bool,
    pub particle_deletable: bool,
}

/// Required operations every container implements, independent of its
/// internal neighbor-search strategy.
pub trait Container<U: Copy> {
    type S: Storage<U>;

    fn storage(&self) -> &Self::S;
    fn storage_mut(&mut self) -> &mut Self::S;
    fn flags(&self) -> ContainerFlags;
    fn domain(&self) -> Domain;

    /// Rebuilds whatever spatial index the container maintains from
    /// current positions. A no-op for DirectSum.
    fn rebuild_structure(&mut self);

    /// Visits every interaction batch for this step, calling `f(batch,
    /// correction)` once per batch. The engine evaluates each call.
    fn for_each_interaction_batch<F: FnMut(&Batch, &Correction)>(&self, f: F);

    fn collect_indices_in_region(&self, region: Domain) -> Vec<usize>;
    fn contains(&self, id: ParticleId) -> bool;
    fn particle_count(&self) -> usize;
    fn min_id(&self) -> Option<ParticleId>;
    fn max_id(&self) -> Option<ParticleId>;
    fn id_to_index(&self, id: ParticleId) -> Option<usize>;

    /// Fast path for partial position updates; falls back to a full rebuild
    /// unless a container overrides it (spec.md §4.2, §4.4 "Rebuild policy").
    fn notify_moved(&mut self, _indices: &[usize]) {
        self.rebuild_structure();
    }
}

/// Sorts `particles` into contiguous type buckets. Returns `(old_index_order,
/// bin_starts)`: `old_index_order[new_i]` is the index the particle at new
/// position `new_i` previously occupied, and `bin_starts[t]..bin_starts[t+1]`
/// is type `t`'s contiguous range (spec.md §3 "Storage invariants").
pub fn bucket_sort_by_type<U>(particles: &[Particle<U>], n_types: usize) -> (Vec<usize>, Vec<usize>) {
    let mut counts = vec![0usize; n_types + 1];
    for p in particles {
        counts[p.ty as usize + 1] += 1;
    }
    for t in 0..n_types {
        counts[t + 1] += counts[t];
    }
    let bin_starts = counts.clone();

    let mut write_ptr = counts;
    let mut order = vec![0usize; particles.len()];
    for (old_i, p) in particles.iter().enumerate() {
        let slot = &mut write_ptr[p.ty as usize];
        order[*slot] = old_i;
        *slot += 1;
    }
    (order, bin_starts)
}

/// Maintains the id -> current-index map across reorders (spec.md §3
/// "the id->index map is maintained across every reorder").
#[derive(Default)]
pub struct IdIndex {
    map: FxHashMap<ParticleId, usize>,
}

impl IdIndex {
    pub fn build<U>(particles: &[Particle<U>]) -> Self {
        let mut map = FxHashMap::default();
        for (i, p) in particles.iter().enumerate() {
            map.insert(p.id, i);
        }
        IdIndex { map }
    }

    /// Rewrites the map after a reorder described by `old_index_order`
    /// (`old_index_order[new_i]` = previous index of the particle now at
    /// `new_i`).
    pub fn reorder(&mut self, old_index_order: &[usize]) {
        let old = std::mem::take(&mut self.map);
        let mut old_id_by_index = vec![0 as ParticleId; old.len()];
        for (&id, &idx) in &old {
            old_id_by_index[idx] = id;
        }
        for (new_i, &old_i) in old_index_order.iter().enumerate() {
            self.map.insert(old_id_by_index[old_i], new_i);
        }
    }

    pub fn get(&self, id: ParticleId) -> Option<usize> {
        self.map.get(&id).copied()
    }

    pub fn contains(&self, id: ParticleId) -> bool {
        self.map.contains_key(&id)
    }

    pub fn min_max(&self) -> Option<(ParticleId, ParticleId)> {
        self.map.keys().fold(None, |acc, &id| match acc {
            None => Some((id, id)),
            Some((lo, hi)) => Some((lo.min(id), hi.max(id))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec3::Vec3;

    fn particle(id: u32, ty: u16) -> Particle<()> {
        Particle::new(id, ty, Vec3::ZERO, 1.0)
    }

    #[test]
    fn bucket_sort_groups_by_type() {
        let particles = vec![particle(0, 1), particle(1, 0), particle(2, 1), particle(3, 0)];
        let (order, bin_starts) = bucket_sort_by_type(&particles, 2);
        assert_eq!(bin_starts, vec![0, 2, 4]);
        for &old in &order[0..2] {
            assert_eq!(particles[old].ty, 0);
        }
        for &old in &order[2..4] {
            assert_eq!(particles[old].ty, 1);
        }
    }

    #[test]
    fn already_sorted_storage_is_unchanged() {
        let particles = vec![particle(0, 0), particle(1, 0), particle(2, 1)];
        let (order, _) = bucket_sort_by_type(&particles, 2);
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn id_index_tracks_reorder() {
        let particles = vec![particle(10, 0), particle(20, 0), particle(30, 0)];
        let mut idx = IdIndex::build(&particles);
        idx.reorder(&[2, 0, 1]);
        assert_eq!(idx.get(30), Some(0));
        assert_eq!(idx.get(10), Some(1));
        assert_eq!(idx.get(20), Some(2));
    }
}
