//! Typed errors for shape validation and result persistence.

use thiserror::Error;

/// Dimension and broadcasting failures raised by the parameter and density helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("input vector ({value}) does not have the correct dimensions (ndim = {ndim})")]
    DimensionMismatch { value: String, ndim: usize },

    #[error("expected {expected} coordinate arrays, got {got}")]
    ArgumentCount { expected: usize, got: usize },

    #[error("coordinate arrays with lengths {lengths:?} cannot be broadcast together")]
    IncompatibleShapes { lengths: Vec<usize> },

    #[error("center must have at least one dimension")]
    EmptyCenter,
}

/// Failures while writing or reading serialized trajectories.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid trajectory: {0}")]
    InvalidTrajectory(String),
}
