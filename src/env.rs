//! The user-facing environment descriptor and the `build_direct_sum` /
//! `build_linked_cells` entry points that turn it into a [`System`]
//! (spec.md §6 "System construction").

use fxhash::FxHashSet;
use tracing::info;

use crate::boundary::{BoundaryKind, Face};
use crate::container::{ContainerFlags, DirectSum, LinkedCells};
use crate::container::linked_cells::LinkedCellsConfig;
use crate::domain::Domain;
use crate::error::SystemError;
use crate::force::{Charge, ForceKind};
use crate::force_table::ForceTable;
use crate::particle::{Particle, ParticleId, ParticleState, ParticleType};
use crate::storage::Storage;
use crate::system::System;
use crate::vec3::Vec3;

/// Builder for one particle, mirroring the reference implementation's
/// `env/particle.h` chained setters (`with_id`, `at`, `with_velocity`, ...).
pub struct ParticleSpec<U> {
    id: Option<ParticleId>,
    ty: ParticleType,
    position: Vec3,
    velocity: Vec3,
    mass: f64,
    state: ParticleState,
    user_data: U,
}

impl<U: Default> ParticleSpec<U> {
    pub fn new(ty: ParticleType, position: Vec3) -> Self {
        ParticleSpec {
            id: None,
            ty,
            position,
            velocity: Vec3::ZERO,
            mass: 1.0,
            state: ParticleState::ALIVE,
            user_data: U::default(),
        }
    }
}

impl<U> ParticleSpec<U> {
    pub fn with_id(mut self, id: ParticleId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_state(mut self, state: ParticleState) -> Self {
        self.state = state;
        self
    }

    pub fn with_user_data(mut self, user_data: U) -> Self {
        self.user_data = user_data;
        self
    }
}

/// Everything `build_direct_sum`/`build_linked_cells` needs: particles,
/// interaction lists, boundary table, and domain hints (spec.md §6).
pub struct Environment<U> {
    pub n_types: usize,
    pub particles: Vec<ParticleSpec<U>>,
    pub type_interactions: Vec<(ParticleType, ParticleType, ForceKind)>,
    pub id_interactions: Vec<(ParticleId, ParticleId, ForceKind)>,
    pub boundaries: [BoundaryKind; 6],
    pub user_domain: Option<Domain>,
    pub margin_abs: Option<f64>,
    pub margin_fac: Option<f64>,
    pub infinite_domain: bool,
    pub particle_addable: bool,
    pub particle_deletable: bool,
}

impl<U> Environment<U> {
    pub fn new(n_types: usize) -> Self {
        Environment {
            n_types,
            particles: Vec::new(),
            type_interactions: Vec::new(),
            id_interactions: Vec::new(),
            boundaries: [BoundaryKind::Outflow; 6],
            user_domain: None,
            margin_abs: None,
            margin_fac: None,
            infinite_domain: false,
            particle_addable: false,
            particle_deletable: false,
        }
    }

    pub fn add_particle(&mut self, spec: ParticleSpec<U>) -> &mut Self {
        self.particles.push(spec);
        self
    }

    pub fn add_type_interaction(&mut self, t1: ParticleType, t2: ParticleType, force: ForceKind) -> &mut Self {
        self.type_interactions.push((t1, t2, force));
        self
    }

    pub fn add_id_interaction(&mut self, id1: ParticleId, id2: ParticleId, force: ForceKind) -> &mut Self {
        self.id_interactions.push((id1, id2, force));
        self
    }

    pub fn set_boundary(&mut self, face: Face, kind: BoundaryKind) -> &mut Self {
        self.boundaries[face.index()] = kind;
        self
    }

    pub fn set_domain(&mut self, domain: Domain) -> &mut Self {
        self.user_domain = Some(domain);
        self
    }

    pub fn set_margin_absolute(&mut self, margin: f64) -> &mut Self {
        self.margin_abs = Some(margin);
        self
    }

    pub fn set_margin_fractional(&mut self, margin: f64) -> &mut Self {
        self.margin_fac = Some(margin);
        self
    }
}

struct Prepared<U> {
    particles: Vec<Particle<U>>,
    force_table: ForceTable,
    domain: Domain,
    flags: ContainerFlags,
    boundaries: [BoundaryKind; 6],
}

/// Fills in missing ids (smallest free id first), validates masses and
/// types, resolves the domain, derives periodicity flags from the boundary
/// table, and builds the force table. Shared by both container builders.
fn prepare<U: Copy>(env: Environment<U>) -> Result<Prepared<U>, SystemError> {
    let Environment {
        n_types,
        particles: specs,
        type_interactions,
        id_interactions,
        boundaries,
        user_domain,
        margin_abs,
        margin_fac,
        infinite_domain,
        particle_addable,
        particle_deletable,
    } = env;

    let mut used_ids: FxHashSet<ParticleId> = specs.iter().filter_map(|s| s.id).collect();
    let mut next_free: ParticleId = 0;
    let mut particles = Vec::with_capacity(specs.len());
    let mut types_in_use = vec![false; n_types];

    for spec in specs {
        if spec.mass <= 0.0 {
            return Err(SystemError::InvalidConfig(format!(
                "particle mass must be positive, got {}",
                spec.mass
            )));
        }
        if spec.ty as usize >= n_types {
            return Err(SystemError::InvalidConfig(format!(
                "particle declared with unknown type {}",
                spec.ty
            )));
        }
        types_in_use[spec.ty as usize] = true;

        let id = match spec.id {
            Some(id) => id,
            None => {
                while used_ids.contains(&next_free) {
                    next_free += 1;
                }
                used_ids.insert(next_free);
                next_free
            }
        };

        particles.push(Particle {
            id,
            ty: spec.ty,
            position: spec.position,
            velocity: spec.velocity,
            old_position: spec.position,
            force: Vec3::ZERO,
            old_force: Vec3::ZERO,
            mass: spec.mass,
            state: spec.state,
            user_data: spec.user_data,
        });
    }

    let bbox = Domain::bounding_box(particles.iter().map(|p| p.position));
    let domain = Domain::resolve(user_domain, bbox, margin_abs, margin_fac)?;

    if user_domain.is_some() {
        for p in &particles {
            if !domain.contains(p.position) {
                return Err(SystemError::DomainMismatch { id: p.id, position: p.position });
            }
        }
    }

    let mut periodic = [false; 3];
    let axis_faces = [(Face::XMinus, Face::XPlus), (Face::YMinus, Face::YPlus), (Face::ZMinus, Face::ZPlus)];
    for (axis, (lo, hi)) in axis_faces.into_iter().enumerate() {
        let lo_periodic = boundaries[lo.index()] == BoundaryKind::Periodic;
        let hi_periodic = boundaries[hi.index()] == BoundaryKind::Periodic;
        if lo_periodic != hi_periodic {
            return Err(SystemError::InvalidConfig(format!(
                "axis {axis} has mismatched periodicity: the two opposing faces must agree"
            )));
        }
        periodic[axis] = lo_periodic;
    }

    let force_table = ForceTable::build(n_types, &type_interactions, &id_interactions, &types_in_use)?;

    info!(
        particle_count = particles.len(),
        n_types,
        domain_min_x = domain.min.x,
        domain_extent_x = domain.extent.x,
        "building simulation system"
    );

    Ok(Prepared {
        particles,
        force_table,
        domain,
        flags: ContainerFlags { periodic, infinite_domain, particle_addable, particle_deletable },
        boundaries,
    })
}

pub fn build_direct_sum<U, S>(env: Environment<U>) -> Result<System<U, DirectSum<U, S>>, SystemError>
where
    U: Copy + Charge,
    S: Storage<U>,
{
    let n_types = env.n_types;
    let prepared = prepare(env)?;
    let container = DirectSum::build(prepared.particles, n_types, prepared.domain, prepared.flags);
    Ok(System::new(container, prepared.force_table, prepared.boundaries))
}

pub fn build_linked_cells<U, S>(
    env: Environment<U>,
    config: LinkedCellsConfig,
) -> Result<System<U, LinkedCells<U, S>>, SystemError>
where
    U: Copy + Charge,
    S: Storage<U>,
{
    let n_types = env.n_types;
    let prepared = prepare(env)?;
    let max_cutoff = prepared.force_table.max_finite_cutoff().ok_or_else(|| {
        SystemError::InvalidConfig("LinkedCells requires at least one force with a finite cutoff".into())
    })?;
    let container =
        LinkedCells::build(prepared.particles, n_types, prepared.domain, prepared.flags, max_cutoff, config)?;
    Ok(System::new(container, prepared.force_table, prepared.boundaries))
}
