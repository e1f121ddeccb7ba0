//! Typed build- and run-time errors (spec.md §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SystemError {
    /// User supplied a bad particle/force/boundary combination: duplicate
    /// pair, missing self-interaction, non-positive mass, domain smaller
    /// than the particle bounding box, or an incompatible mix.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A particle lies outside a user-specified (non-inferred) domain.
    #[error("particle {id} at {position:?} lies outside the configured domain")]
    DomainMismatch { id: u32, position: crate::vec3::Vec3 },

    /// A requested combination of features is not implemented, e.g. an
    /// infinite domain with `LinkedCells` (spec.md §9).
    #[error("unsupported configuration: {0}")]
    Unsupported(String),

    /// A monitor failed to write its output file.
    #[error("I/O error in monitor: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_informative() {
        let e = SystemError::InvalidConfig("missing self-interaction for type 2".into());
        assert!(e.to_string().contains("missing self-interaction"));
    }
}
