//! Uniform cell grid with a half-stencil walk and block-tiled batch
//! emission (spec.md §4.4). The most involved container: grid setup, cell
//! ordering, `(cell,type)` bucket assignment, the neighbor stencil, periodic
//! wrapping, and compound-batch emission all live here.

use itertools::iproduct;
use smallvec::SmallVec;

use super::{Container, ContainerFlags, IdIndex};
use crate::batch::{AsymmetricBatch, Batch, Correction, CompoundBatch, SymmetricBatch};
use crate::domain::Domain;
use crate::error::SystemError;
use crate::particle::{Particle, ParticleId, ParticleType};
use crate::storage::Storage;
use crate::vec3::{IVec3, UVec3, Vec3};

/// How the cell width `h` is derived from the maximum active force cutoff
/// `r_c` (spec.md §4.4 "Grid setup").
#[derive(Copy, Clone, Debug)]
pub enum CellSizePolicy {
    Cutoff,
    Half,
    Third,
    Absolute(f64),
    Factor(f64),
}

impl CellSizePolicy {
    fn width(self, rc: f64) -> f64 {
        match self {
            CellSizePolicy::Cutoff => rc,
            CellSizePolicy::Half => rc / 2.0,
            CellSizePolicy::Third => rc / 3.0,
            CellSizePolicy::Absolute(v) => v,
            CellSizePolicy::Factor(f) => f * rc,
        }
    }
}

pub type CellOrderingFn = fn(UVec3) -> u64;

/// Container configuration consumed by [`LinkedCells::build`], grounded on
/// `include/april/containers/linked_cells/lc_config.hpp`.
#[derive(Copy, Clone)]
pub struct LinkedCellsConfig {
    pub cell_size: CellSizePolicy,
    pub cell_ordering: Option<CellOrderingFn>,
    pub block_size: UVec3,
}

impl Default for LinkedCellsConfig {
    fn default() -> Self {
        LinkedCellsConfig { cell_size: CellSizePolicy::Cutoff, cell_ordering: None, block_size: UVec3::splat(2) }
    }
}

impl LinkedCellsConfig {
    pub fn with_cell_size(mut self, policy: CellSizePolicy) -> Self {
        self.cell_size = policy;
        self
    }

    pub fn with_cell_ordering(mut self, f: CellOrderingFn) -> Self {
        self.cell_ordering = Some(f);
        self
    }

    pub fn with_block_size(mut self, block_size: UVec3) -> Self {
        self.block_size = block_size;
        self
    }
}

/// A relative neighbor-cell offset in the half-stencil.
#[derive(Copy, Clone, Debug)]
struct StencilOffset {
    delta: IVec3,
}

struct WrappedPair {
    cell1: usize,
    cell2: usize,
    shift: Vec3,
}

pub struct LinkedCells<U: Copy, S: Storage<U>> {
    storage: S,
    n_types: usize,
    domain: Domain,
    flags: ContainerFlags,

    counts: UVec3,
    cell_size: Vec3,
    inv_cell_size: Vec3,
    outside_cell: usize,

    /// `bin_starts[cell * n_types + t] .. bin_starts[cell * n_types + t + 1]`.
    bin_starts: Vec<usize>,
    block_size: UVec3,
    stencil: SmallVec<[StencilOffset; 26]>,
    wrapped: Vec<WrappedPair>,
    cell_order: Vec<u64>,

    id_index: IdIndex,
    _marker: std::marker::PhantomData<U>,
}

impl<U: Copy, S: Storage<U>> LinkedCells<U, S> {
    pub fn build(
        records: Vec<Particle<U>>,
        n_types: usize,
        domain: Domain,
        flags: ContainerFlags,
        max_cutoff: f64,
        config: LinkedCellsConfig,
    ) -> Result<Self, SystemError> {
        if flags.infinite_domain {
            return Err(SystemError::Unsupported("LinkedCells does not support an infinite domain".into()));
        }

        let h = config.cell_size.width(max_cutoff).max(1e-12);
        let counts = UVec3::new(
            (domain.extent.x / h).floor().max(1.0) as u32,
            (domain.extent.y / h).floor().max(1.0) as u32,
            (domain.extent.z / h).floor().max(1.0) as u32,
        );
        let cell_size = Vec3::new(
            domain.extent.x / counts.x as f64,
            domain.extent.y / counts.y as f64,
            domain.extent.z / counts.z as f64,
        );
        let inv_cell_size = Vec3::new(1.0 / cell_size.x, 1.0 / cell_size.y, 1.0 / cell_size.z);
        let n_cells = (counts.x * counts.y * counts.z) as usize;
        let outside_cell = n_cells;

        let stencil = build_half_stencil(counts, cell_size, max_cutoff);
        let wrapped = if flags.periodic.iter().any(|&p| p) {
            build_wrapped_pairs(counts, &stencil, flags.periodic, domain.extent)
        } else {
            Vec::new()
        };

        let cell_order = (0..=n_cells as u64)
            .map(|flat| {
                if flat as usize == outside_cell {
                    u64::MAX
                } else if let Some(f) = config.cell_ordering {
                    f(flat_to_coords(flat as usize, counts))
                } else {
                    flat
                }
            })
            .collect();

        let mut lc = LinkedCells {
            storage: S::build(records),
            n_types,
            domain,
            flags,
            counts,
            cell_size,
            inv_cell_size,
            outside_cell,
            bin_starts: Vec::new(),
            block_size: config.block_size,
            stencil,
            wrapped,
            cell_order,
            id_index: IdIndex::default(),
            _marker: std::marker::PhantomData,
        };
        lc.rebuild_structure();
        Ok(lc)
    }

    fn cell_of(&self, pos: Vec3) -> usize {
        if !self.domain.contains(pos) {
            return self.outside_cell;
        }
        let rel = pos - self.domain.min;
        let cx = (rel.x * self.inv_cell_size.x) as u32;
        let cy = (rel.y * self.inv_cell_size.y) as u32;
        let cz = (rel.z * self.inv_cell_size.z) as u32;
        let cx = cx.min(self.counts.x - 1);
        let cy = cy.min(self.counts.y - 1);
        let cz = cz.min(self.counts.z - 1);
        flat_index(UVec3::new(cx, cy, cz), self.counts)
    }

    fn n_cells(&self) -> usize {
        (self.counts.x * self.counts.y * self.counts.z) as usize
    }

    fn bin_of(&self, cell: usize, ty: ParticleType) -> usize {
        cell * self.n_types + ty as usize
    }

    fn cell_range(&self, cell: usize, ty: ParticleType) -> std::ops::Range<usize> {
        let bin = self.bin_of(cell, ty);
        self.bin_starts[bin]..self.bin_starts[bin + 1]
    }

    fn neighbor_coords(&self, cell: UVec3, d: IVec3) -> Option<UVec3> {
        let nx = cell.x as i64 + d.x as i64;
        let ny = cell.y as i64 + d.y as i64;
        let nz = cell.z as i64 + d.z as i64;
        if nx < 0
            || ny < 0
            || nz < 0
            || nx >= self.counts.x as i64
            || ny >= self.counts.y as i64
            || nz >= self.counts.z as i64
        {
            return None;
        }
        Some(UVec3::new(nx as u32, ny as u32, nz as u32))
    }

    /// Emits the batches for one block of cells, for one ordered type pair.
    fn emit_block(&self, block_cells: &[UVec3], t1: ParticleType, t2: ParticleType, compound: &mut CompoundBatch) {
        let correction = Correction::None;
        for &cell_coord in block_cells {
            let cell = flat_index(cell_coord, self.counts);
            let r1 = self.cell_range(cell, t1);
            let r2 = self.cell_range(cell, t2);

            if t1 == t2 {
                if r1.len() > 1 {
                    compound.push(Batch::Symmetric(SymmetricBatch { range: r1.clone() }), correction);
                }
            } else if !r1.is_empty() && !r2.is_empty() {
                compound.push(
                    Batch::Asymmetric(AsymmetricBatch { range1: r1.clone(), range2: r2.clone() }),
                    correction,
                );
            }

            for offset in &self.stencil {
                let Some(neighbor_coord) = self.neighbor_coords(cell_coord, offset.delta) else { continue };
                let neighbor = flat_index(neighbor_coord, self.counts);
                let nr1 = self.cell_range(neighbor, t1);
                let nr2 = self.cell_range(neighbor, t2);
                if !r1.is_empty() && !nr2.is_empty() {
                    compound.push(
                        Batch::Asymmetric(AsymmetricBatch { range1: r1.clone(), range2: nr2.clone() }),
                        correction,
                    );
                }
                if t1 != t2 && !nr1.is_empty() && !r2.is_empty() {
                    compound.push(
                        Batch::Asymmetric(AsymmetricBatch { range1: nr1.clone(), range2: r2.clone() }),
                        correction,
                    );
                }
            }
        }
    }

    fn emit_wrapped(&self, t1: ParticleType, t2: ParticleType, compound: &mut CompoundBatch) {
        for w in &self.wrapped {
            let r1 = self.cell_range(w.cell1, t1);
            let r2 = self.cell_range(w.cell2, t2);
            if !r1.is_empty() && !r2.is_empty() {
                compound.push(
                    Batch::Asymmetric(AsymmetricBatch { range1: r1, range2: r2 }),
                    Correction::Shift(w.shift),
                );
            }
            if t1 != t2 {
                let r1b = self.cell_range(w.cell1, t2);
                let r2b = self.cell_range(w.cell2, t1);
                if !r1b.is_empty() && !r2b.is_empty() {
                    compound.push(
                        Batch::Asymmetric(AsymmetricBatch { range1: r2b, range2: r1b }),
                        Correction::Shift(-w.shift),
                    );
                }
            }
        }
    }

    pub fn bin_starts(&self) -> &[usize] {
        &self.bin_starts
    }
}

impl<U: Copy, S: Storage<U>> Container<U> for LinkedCells<U, S> {
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

    fn rebuild_structure(&mut self) {
        let n = self.storage.len();
        let n_bins = self.n_cells() * self.n_types + self.n_types;
        let mut counts = vec![0usize; n_bins + 1];

        let mut cell_of_index = vec![0usize; n];
        for i in 0..n {
            let p = self.storage.get(i);
            let cell = self.cell_of(p.position);
            let cell = if cell == self.outside_cell { self.n_cells() } else { cell };
            cell_of_index[i] = cell;
            counts[cell * self.n_types + p.ty as usize + 1] += 1;
        }
        for b in 0..n_bins {
            counts[b + 1] += counts[b];
        }
        let bin_starts = counts.clone();

        let mut write_ptr = counts;
        let mut order = vec![0usize; n];
        for i in 0..n {
            let p = self.storage.get(i);
            let bin = cell_of_index[i] * self.n_types + p.ty as usize;
            let slot = &mut write_ptr[bin];
            order[*slot] = i;
            *slot += 1;
        }

        self.storage.reorder(&order);
        self.bin_starts = bin_starts;
        self.id_index = IdIndex::build(&(0..n).map(|i| self.storage.get(i)).collect::<Vec<_>>());
    }

    fn for_each_interaction_batch<F: FnMut(&Batch, &Correction)>(&self, mut f: F) {
        let bx = self.block_size.x.max(1);
        let by = self.block_size.y.max(1);
        let bz = self.block_size.z.max(1);

        let mut blocks = Vec::new();
        let mut bz0 = 0;
        while bz0 < self.counts.z {
            let mut by0 = 0;
            while by0 < self.counts.y {
                let mut bx0 = 0;
                while bx0 < self.counts.x {
                    let block_cells: Vec<UVec3> = iproduct!(
                        bz0..(bz0 + bz).min(self.counts.z),
                        by0..(by0 + by).min(self.counts.y),
                        bx0..(bx0 + bx).min(self.counts.x)
                    )
                    .map(|(z, y, x)| UVec3::new(x, y, z))
                    .collect();
                    blocks.push(block_cells);
                    bx0 += bx;
                }
                by0 += by;
            }
            bz0 += bz;
        }
        // Visit blocks in `cell_order` rather than raw lexicographic order,
        // so a Morton/Hilbert ordering function improves cache locality
        // across the whole traversal, not just within a block.
        blocks.sort_by_key(|cells| {
            cells.iter().map(|&c| self.cell_order[flat_index(c, self.counts)]).min().unwrap_or(u64::MAX)
        });

        for t1 in 0..self.n_types as u16 {
            for t2 in t1..self.n_types as u16 {
                for block_cells in &blocks {
                    let mut compound = CompoundBatch::default();
                    self.emit_block(block_cells, t1, t2, &mut compound);
                    for (batch, correction) in &compound.batches {
                        f(batch, correction);
                    }
                }

                let mut compound = CompoundBatch::default();
                self.emit_wrapped(t1, t2, &mut compound);
                for (batch, correction) in &compound.batches {
                    f(batch, correction);
                }
            }
        }
    }

    fn collect_indices_in_region(&self, region: Domain) -> Vec<usize> {
        let n = self.storage.len();
        let mut result = Vec::new();
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

fn flat_index(c: UVec3, counts: UVec3) -> usize {
    (c.z as usize * counts.y as usize + c.y as usize) * counts.x as usize + c.x as usize
}

fn flat_to_coords(flat: usize, counts: UVec3) -> UVec3 {
    let x = flat % counts.x as usize;
    let y = (flat / counts.x as usize) % counts.y as usize;
    let z = flat / (counts.x as usize * counts.y as usize);
    UVec3::new(x as u32, y as u32, z as u32)
}

/// Builds the half-space stencil: offsets with lexicographic order
/// `(dz,dy,dx) > (0,0,0)` whose minimum point-to-point distance to the
/// origin cell is within `r_c` (spec.md §4.4 "Neighbor stencil").
fn build_half_stencil(counts: UVec3, cell_size: Vec3, rc: f64) -> SmallVec<[StencilOffset; 26]> {
    let rx = (rc / cell_size.x).ceil() as i32;
    let ry = (rc / cell_size.y).ceil() as i32;
    let rz = (rc / cell_size.z).ceil() as i32;
    let rx = rx.min(counts.x as i32);
    let ry = ry.min(counts.y as i32);
    let rz = rz.min(counts.z as i32);

    iproduct!(-rz..=rz, -ry..=ry, -rx..=rx)
        .filter(|&(dz, dy, dx)| (dz, dy, dx) > (0, 0, 0))
        .filter(|&(dz, dy, dx)| min_cell_distance(dx, dy, dz, cell_size) <= rc)
        .map(|(dz, dy, dx)| StencilOffset { delta: IVec3::new(dx, dy, dz) })
        .collect()
}

fn min_cell_distance(dx: i32, dy: i32, dz: i32, cell_size: Vec3) -> f64 {
    let gap = |d: i32, size: f64| -> f64 {
        if d == 0 {
            0.0
        } else {
            ((d.unsigned_abs() - 1) as f64) * size
        }
    };
    let gx = gap(dx, cell_size.x);
    let gy = gap(dy, cell_size.y);
    let gz = gap(dz, cell_size.z);
    (gx * gx + gy * gy + gz * gz).sqrt()
}

/// For every periodic axis, walks the stencil and records `(cell1, cell2,
/// shift)` for every neighbor pair that wraps across a domain edge
/// (spec.md §4.4 "Wrapped pairs").
fn build_wrapped_pairs(
    counts: UVec3,
    stencil: &[StencilOffset],
    periodic: [bool; 3],
    extent: Vec3,
) -> Vec<WrappedPair> {
    let mut out = Vec::new();
    for z in 0..counts.z {
        for y in 0..counts.y {
            for x in 0..counts.x {
                let cell1 = UVec3::new(x, y, z);
                for offset in stencil {
                    let raw = (
                        cell1.x as i64 + offset.delta.x as i64,
                        cell1.y as i64 + offset.delta.y as i64,
                        cell1.z as i64 + offset.delta.z as i64,
                    );
                    let axes = [raw.0, raw.1, raw.2];
                    let dims = [counts.x as i64, counts.y as i64, counts.z as i64];
                    let mut wraps = false;
                    let mut wrapped = [0i64; 3];
                    let mut shift = Vec3::ZERO;
                    for a in 0..3 {
                        let mut v = axes[a];
                        if v < 0 {
                            if !periodic[a] {
                                wraps = false;
                                wrapped = [-1, -1, -1];
                                break;
                            }
                            v += dims[a];
                            shift[a] = -extent[a];
                            wraps = true;
                        } else if v >= dims[a] {
                            if !periodic[a] {
                                wraps = false;
                                wrapped = [-1, -1, -1];
                                break;
                            }
                            v -= dims[a];
                            shift[a] = extent[a];
                            wraps = true;
                        }
                        wrapped[a] = v;
                    }
                    if !wraps || wrapped[0] < 0 {
                        continue;
                    }
                    let cell2 = UVec3::new(wrapped[0] as u32, wrapped[1] as u32, wrapped[2] as u32);
                    out.push(WrappedPair {
                        cell1: flat_index(cell1, counts),
                        cell2: flat_index(cell2, counts),
                        shift,
                    });
                }
            }
        }
    }
    out
}
