//! The two pair-iteration shapes a container emits, and the
//! boundary-correction predicate (BCP) applied to each pair's difference
//! vector before force evaluation (spec.md §4.5, GLOSSARY).

use std::ops::Range;

use crate::boundary::Bcp;
use crate::vec3::Vec3;

/// Iterates `(i, j)` with `i < j` over a single index range — intra-bucket,
/// same-type pairs, or the self-pair batch DirectSum emits per type.
#[derive(Clone, Debug)]
pub struct SymmetricBatch {
    pub range: Range<usize>,
}

impl SymmetricBatch {
    pub fn for_each_pair<F: FnMut(usize, usize)>(&self, mut f: F) {
        for i in self.range.clone() {
            for j in (i + 1)..self.range.end {
                f(i, j);
            }
        }
    }
}

/// Iterates `(i, j) in R1 x R2` with `R1 n R2 = {}` — cross-bucket or
/// cross-type pairs, where reaction forces never double-count.
#[derive(Clone, Debug)]
pub struct AsymmetricBatch {
    pub range1: Range<usize>,
    pub range2: Range<usize>,
}

impl AsymmetricBatch {
    pub fn for_each_pair<F: FnMut(usize, usize)>(&self, mut f: F) {
        for i in self.range1.clone() {
            for j in self.range2.clone() {
                f(i, j);
            }
        }
    }
}

#[derive(Clone, Debug)]
pub enum Batch {
    Symmetric(SymmetricBatch),
    Asymmetric(AsymmetricBatch),
}

impl Batch {
    pub fn for_each_pair<F: FnMut(usize, usize)>(&self, f: F) {
        match self {
            Batch::Symmetric(b) => b.for_each_pair(f),
            Batch::Asymmetric(b) => b.for_each_pair(f),
        }
    }
}

/// The correction applied to `r = p2.position - p1.position` before the
/// cutoff test and force evaluation.
#[derive(Clone, Copy, Debug)]
pub enum Correction {
    /// No boundary is periodic on any axis this batch spans.
    None,
    /// Standard minimum-image correction (DirectSum, and LinkedCells' own
    /// cell / non-wrapped neighbor batches).
    MinImage(Bcp),
    /// A precomputed shift for a LinkedCells wrapped neighbor-cell pair
    /// (spec.md §4.4 "Wrapped pairs").
    Shift(Vec3),
}

impl Correction {
    pub fn apply(&self, r: Vec3) -> Vec3 {
        match self {
            Correction::None => r,
            Correction::MinImage(bcp) => bcp.correct(r),
            Correction::Shift(shift) => r + *shift,
        }
    }
}

/// A set of batches dispatched together in one call to the integrator
/// callback, amortizing per-batch overhead (spec.md §4.4 "Batch emission").
#[derive(Clone, Debug, Default)]
pub struct CompoundBatch {
    pub batches: Vec<(Batch, Correction)>,
}

impl CompoundBatch {
    pub fn push(&mut self, batch: Batch, correction: Correction) {
        self.batches.push((batch, correction));
    }
}
