//! All-pairs container: one symmetric batch per type, one asymmetric batch
//! per distinct type pair (spec.md §4.3). O(N^2); useful as a correctness
//! oracle and for small systems without a meaningful cutoff.

use super::{bucket_sort_by_type, Container, ContainerFlags, IdIndex};
use crate::batch::{AsymmetricBatch, Batch, Correction, SymmetricBatch};
use crate::boundary::Bcp;
use crate::domain::Domain;
use crate::particle::{Particle, ParticleId};
use crate::storage::Storage;

pub struct DirectSum<U: Copy, S: Storage<U>> {
    storage: S,
    n_types: usize,
    bin_starts: Vec<usize>,
    id_index: IdIndex,
    domain: Domain,
    flags: ContainerFlags,
    batches: Vec<(Batch, Correction)>,
    _marker: std::marker::PhantomData<U>,
}

impl<U: Copy, S: Storage<U>> DirectSum<U, S> {
    pub fn build(mut records: Vec<Particle<U>>, n_types: usize, domain: Domain, flags: ContainerFlags) -> Self {
        let (order, bin_starts) = bucket_sort_by_type(&records, n_types);
        records = order.iter().map(|&old| records[old].clone()).collect();
        let storage = S::build(records);
        let id_index = IdIndex::build(storage_particles(&storage).as_slice());

        let correction = if flags.periodic.iter().any(|&p| p) {
            Correction::MinImage(Bcp { periodic: flags.periodic, extent: domain.extent })
        } else {
            Correction::None
        };

        let mut batches = Vec::new();
        for t in 0..n_types {
            let range = bin_starts[t]..bin_starts[t + 1];
            if range.len() > 1 {
                batches.push((Batch::Symmetric(SymmetricBatch { range }), correction));
            }
        }
        for t1 in 0..n_types {
            for t2 in (t1 + 1)..n_types {
                let r1 = bin_starts[t1]..bin_starts[t1 + 1];
                let r2 = bin_starts[t2]..bin_starts[t2 + 1];
                if !r1.is_empty() && !r2.is_empty() {
                    batches.push((
                        Batch::Asymmetric(AsymmetricBatch { range1: r1, range2: r2 }),
                        correction,
                    ));
                }
            }
        }

        DirectSum {
            storage,
            n_types,
            bin_starts,
            id_index,
            domain,
            flags,
            batches,
            _marker: std::marker::PhantomData,
        }
    }
}

fn storage_particles<U: Copy, S: Storage<U>>(storage: &S) -> Vec<Particle<U>> {
    (0..storage.len()).map(|i| storage.get(i)).collect()
}

impl<U: Copy, S: Storage<U>> Container<U> for DirectSum<U, S> {
    type S = S;

    fn storage(&self) -> &S {
        &self.storage
    }

    fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    fn flags(&self) -> ContainerFlags {
        self.flags
    }

    fn domain(&self) -> Domain {
        self.domain
    }

    /// Every pair is considered every step; there is no spatial index to
    /// rebuild (spec.md §4.3).
    fn rebuild_structure(&mut self) {}

    fn for_each_interaction_batch<F: FnMut(&Batch, &Correction)>(&self, mut f: F) {
        for (batch, correction) in &self.batches {
            f(batch, correction);
        }
    }

    fn collect_indices_in_region(&self, region: Domain) -> Vec<usize> {
        let n = self.storage.len();
        let domain_vol = self.domain.extent.x * self.domain.extent.y * self.domain.extent.z;
        let region_vol = region.extent.x * region.extent.y * region.extent.z;
        let estimate = if domain_vol > 0.0 {
            ((n as f64) * (region_vol / domain_vol) * 1.1).ceil() as usize
        } else {
            n
        };
        let mut result = Vec::with_capacity(estimate.min(n));
        for i in 0..n {
            if region.contains(self.storage.view(i).position) {
                result.push(i);
            }
        }
        result
    }

    fn contains(&self, id: ParticleId) -> bool {
        self.id_index.contains(id)
    }

    fn particle_count(&self) -> usize {
        self.storage.len()
    }

    fn min_id(&self) -> Option<ParticleId> {
        self.id_index.min_max().map(|(lo, _)| lo)
    }

    fn max_id(&self) -> Option<ParticleId> {
        self.id_index.min_max().map(|(_, hi)| hi)
    }

    fn id_to_index(&self, id: ParticleId) -> Option<usize> {
        self.id_index.get(id)
    }
}

impl<U: Copy, S: Storage<U>> DirectSum<U, S> {
    pub fn bin_starts(&self) -> &[usize] {
        &self.bin_starts
    }

    pub fn n_types(&self) -> usize {
        self.n_types
    }
}
