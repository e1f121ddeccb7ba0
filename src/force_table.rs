//! Pair-keyed lookup of `(type,type)` and `(id,id)` to a force variant
//! (spec.md §3 "Force table", §4.6).

use bit_set::BitSet;
use fxhash::FxHashMap;

use crate::error::SystemError;
use crate::force::ForceKind;
use crate::particle::{ParticleId, ParticleType};

fn canonical_types(a: ParticleType, b: ParticleType) -> (ParticleType, ParticleType) {
    (a.min(b), a.max(b))
}

fn canonical_ids(a: ParticleId, b: ParticleId) -> (ParticleId, ParticleId) {
    (a.min(b), a.max(b))
}

/// A dense `n_types x n_types` table of type-pair forces plus a hash map of
/// id-pair overrides. Lookup precedence is id-pair, then type-pair, then the
/// "no force" sentinel (spec.md §3).
pub struct ForceTable {
    n_types: usize,
    type_pairs: Vec<ForceKind>,
    id_pairs: FxHashMap<(ParticleId, ParticleId), ForceKind>,
}

impl ForceTable {
    /// Builds the table from the user's self-interactions (`(t, t, force)`),
    /// explicit cross-type interactions, and id-pair overrides. Missing
    /// type-pair entries whose two self-interactions are the same kind are
    /// synthesized via `ForceKind::mix`; any other gap is left as the
    /// internal sentinel, which is itself a build-time error if reachable
    /// (i.e. if a particle of that type exists, §4.6 "missing self-interaction").
    pub fn build(
        n_types: usize,
        type_interactions: &[(ParticleType, ParticleType, ForceKind)],
        id_interactions: &[(ParticleId, ParticleId, ForceKind)],
        types_in_use: &[bool],
    ) -> Result<ForceTable, SystemError> {
        let mut type_pairs = vec![ForceKind::Sentinel; n_types * n_types];
        let mut set = BitSet::with_capacity(n_types * n_types);

        let idx = |a: usize, b: usize| a * n_types + b;

        for &(t1, t2, ref force) in type_interactions {
            if t1 as usize >= n_types || t2 as usize >= n_types {
                return Err(SystemError::InvalidConfig(format!(
                    "force declared for unknown type pair ({t1}, {t2})"
                )));
            }
            let (a, b) = canonical_types(t1, t2);
            let i = idx(a as usize, b as usize);
            if set.contains(i) {
                return Err(SystemError::InvalidConfig(format!(
                    "duplicate force entry for type pair ({a}, {b})"
                )));
            }
            type_pairs[i] = force.clone();
            set.insert(i);
        }

        for t in 0..n_types {
            if types_in_use[t] && !set.contains(idx(t, t)) {
                return Err(SystemError::InvalidConfig(format!(
                    "missing self-interaction for type {t}"
                )));
            }
        }

        for a in 0..n_types {
            for b in (a + 1)..n_types {
                let i = idx(a, b);
                if set.contains(i) || !types_in_use[a] || !types_in_use[b] {
                    continue;
                }
                let self_a = &type_pairs[idx(a, a)];
                let self_b = &type_pairs[idx(b, b)];
                type_pairs[i] = self_a.mix(self_b)?;
                set.insert(i);
            }
        }

        let mut id_pairs = FxHashMap::default();
        for &(id1, id2, ref force) in id_interactions {
            if id1 == id2 {
                return Err(SystemError::InvalidConfig(format!(
                    "self-interaction not allowed on id pair ({id1}, {id2})"
                )));
            }
            let key = canonical_ids(id1, id2);
            if id_pairs.contains_key(&key) {
                return Err(SystemError::InvalidConfig(format!(
                    "duplicate force entry for id pair {key:?}"
                )));
            }
            id_pairs.insert(key, force.clone());
        }

        Ok(ForceTable { n_types, type_pairs, id_pairs })
    }

    /// The largest finite cutoff among every entry, used to size a
    /// LinkedCells grid. `None` if every active force has an infinite
    /// cutoff (LinkedCells cannot be used in that configuration).
    pub fn max_finite_cutoff(&self) -> Option<f64> {
        self.type_pairs
            .iter()
            .chain(self.id_pairs.values())
            .map(ForceKind::cutoff)
            .filter(|c| c.is_finite())
            .fold(None, |acc, c| Some(acc.map_or(c, |m: f64| m.max(c))))
    }

    pub fn lookup(&self, id1: ParticleId, id2: ParticleId, t1: ParticleType, t2: ParticleType) -> &ForceKind {
        let idk = canonical_ids(id1, id2);
        if let Some(f) = self.id_pairs.get(&idk) {
            return f;
        }
        let (a, b) = canonical_types(t1, t2);
        &self.type_pairs[a as usize * self.n_types + b as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::force::{Gravity, LennardJones};

    #[test]
    fn mixes_missing_cross_type_entries() {
        let interactions = vec![
            (0u16, 0u16, ForceKind::Gravity(Gravity::new(1.0, None))),
            (1u16, 1u16, ForceKind::Gravity(Gravity::new(3.0, None))),
        ];
        let table = ForceTable::build(2, &interactions, &[], &[true, true]).unwrap();
        let mixed = table.lookup(10, 11, 0, 1);
        match mixed {
            ForceKind::Gravity(g) => assert!((g.g - 2.0).abs() < 1e-12),
            _ => panic!("expected mixed gravity"),
        }
    }

    #[test]
    fn missing_self_interaction_is_an_error() {
        let interactions = vec![(0u16, 0u16, ForceKind::Gravity(Gravity::new(1.0, None)))];
        let err = ForceTable::build(2, &interactions, &[], &[true, true]);
        assert!(err.is_err());
    }

    #[test]
    fn id_pair_takes_precedence_over_type_pair() {
        let interactions = vec![(0u16, 0u16, ForceKind::Gravity(Gravity::new(1.0, None)))];
        let id_over = vec![(5u32, 6u32, ForceKind::LennardJones(LennardJones::new(1.0, 1.0, None)))];
        let table = ForceTable::build(1, &interactions, &id_over, &[true]).unwrap();
        match table.lookup(5, 6, 0, 0) {
            ForceKind::LennardJones(_) => {}
            _ => panic!("expected id-pair override"),
        }
        match table.lookup(5, 7, 0, 0) {
            ForceKind::Gravity(_) => {}
            _ => panic!("expected type-pair fallback"),
        }
    }

    #[test]
    fn duplicate_type_pair_is_rejected() {
        let interactions = vec![
            (0u16, 0u16, ForceKind::Gravity(Gravity::new(1.0, None))),
            (0u16, 0u16, ForceKind::Gravity(Gravity::new(2.0, None))),
        ];
        assert!(ForceTable::build(1, &interactions, &[], &[true]).is_err());
    }

    #[test]
    fn self_interaction_on_id_pair_is_rejected() {
        let id_over = vec![(5u32, 5u32, ForceKind::NoForce)];
        assert!(ForceTable::build(1, &[], &id_over, &[true]).is_err());
    }

    #[test]
    fn max_finite_cutoff_ignores_infinite_entries() {
        use crate::force::LennardJones;
        let interactions = vec![(0u16, 0u16, ForceKind::LennardJones(LennardJones::new(1.0, 1.0, Some(2.5))))];
        let id_over = vec![(5u32, 6u32, ForceKind::Gravity(Gravity::new(1.0, None)))];
        let table = ForceTable::build(1, &interactions, &id_over, &[true]).unwrap();
        assert_eq!(table.max_finite_cutoff(), Some(2.5));
    }
}
