use crate::session::Phase;
use thiserror::Error;

/// Failures of the round/scoring engine.
///
/// Every variant is raised synchronously at the offending call. A call that
/// fails leaves the session exactly as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("coordinate out of range: lat {lat}, lng {lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("distance must be a non-negative number, got {0}")]
    InvalidDistance(f64),

    #[error("pool has {available} locations but {requested} rounds were requested")]
    InsufficientPool { requested: usize, available: usize },

    #[error("cannot {operation} while {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: Phase,
    },
}

pub type Result<T, E = GameError> = std::result::Result<T, E>;
