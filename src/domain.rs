//! The axis-aligned simulation domain and the margin computation used to
//! derive it from a particle bounding box (spec.md §3 "Domain").

use crate::error::SystemError;
use crate::vec3::Vec3;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Domain {
    pub min: Vec3,
    pub extent: Vec3,
}

impl Domain {
    pub fn new(min: Vec3, extent: Vec3) -> Self {
        Domain { min, extent }
    }

    pub fn max(&self) -> Vec3 {
        self.min + self.extent
    }

    pub fn contains(&self, p: Vec3) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] < self.max()[i])
    }

    /// The tightest axis-aligned box enclosing every particle position.
    pub fn bounding_box<I: IntoIterator<Item = Vec3>>(positions: I) -> Option<Domain> {
        let mut min = Vec3::splat(f64::INFINITY);
        let mut max = Vec3::splat(f64::NEG_INFINITY);
        let mut any = false;
        for p in positions {
            any = true;
            for i in 0..3 {
                if p[i] < min[i] {
                    min[i] = p[i];
                }
                if p[i] > max[i] {
                    max[i] = p[i];
                }
            }
        }
        if !any {
            return None;
        }
        Some(Domain::new(min, max - min))
    }

    /// Grows `self` by an absolute margin on every face.
    pub fn grow_absolute(&self, margin: f64) -> Domain {
        Domain::new(self.min - Vec3::splat(margin), self.extent + Vec3::splat(2.0 * margin))
    }

    /// Grows `self` by a fraction of its own extent on every face.
    pub fn grow_fractional(&self, fraction: f64) -> Domain {
        let margin = self.extent * fraction;
        Domain::new(self.min - margin, self.extent + margin * 2.0)
    }

    /// Resolves the simulation domain: an explicit `user_domain` is
    /// validated against the particle bounding box; otherwise the box is
    /// grown by the given margin.
    pub fn resolve(
        user_domain: Option<Domain>,
        particle_box: Option<Domain>,
        margin_abs: Option<f64>,
        margin_fac: Option<f64>,
    ) -> Result<Domain, SystemError> {
        if let Some(domain) = user_domain {
            if let Some(bbox) = particle_box {
                let bmax = bbox.max();
                let dmax = domain.max();
                for i in 0..3 {
                    if bbox.min[i] < domain.min[i] || bmax[i] > dmax[i] {
                        return Err(SystemError::InvalidConfig(format!(
                            "user-specified domain is smaller than the particle bounding box on axis {i}"
                        )));
                    }
                }
            }
            return Ok(domain);
        }

        let bbox = particle_box.ok_or_else(|| {
            SystemError::InvalidConfig("cannot infer a domain with zero particles".into())
        })?;
        Ok(match (margin_abs, margin_fac) {
            (Some(abs), _) => bbox.grow_absolute(abs),
            (None, Some(fac)) => bbox.grow_fractional(fac),
            (None, None) => bbox.grow_fractional(0.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_covers_all_points() {
        let pts = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, -1.0, 5.0)];
        let bbox = Domain::bounding_box(pts).unwrap();
        assert_eq!(bbox.min, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(bbox.extent, Vec3::new(2.0, 1.0, 5.0));
    }

    #[test]
    fn user_domain_too_small_is_rejected() {
        let bbox = Domain::new(Vec3::ZERO, Vec3::splat(10.0));
        let small = Domain::new(Vec3::ZERO, Vec3::splat(1.0));
        let err = Domain::resolve(Some(small), Some(bbox), None, None);
        assert!(err.is_err());
    }

    #[test]
    fn inferred_domain_from_margin() {
        let bbox = Domain::new(Vec3::ZERO, Vec3::splat(10.0));
        let d = Domain::resolve(None, Some(bbox), Some(1.0), None).unwrap();
        assert_eq!(d.min, Vec3::splat(-1.0));
        assert_eq!(d.extent, Vec3::splat(12.0));
    }
}
