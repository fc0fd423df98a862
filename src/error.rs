//! Error types for the lattice planner.

use thiserror::Error;

/// Planner error type.
///
/// Configuration-time failures (`LoadError`, `InvalidConfiguration`) abort
/// the operation that raised them and leave the previously active
/// configuration untouched. Search-time failures are returned per planning
/// call and leave the engine ready for the next one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    /// Lattice file missing, unreadable, or malformed.
    #[error("failed to load lattice file '{path}': {reason}")]
    LoadError {
        /// Path of the offending file.
        path: String,
        /// What went wrong while loading it.
        reason: String,
    },

    /// Start pose outside the grid or in collision.
    #[error("start pose is off the grid or in collision")]
    InvalidStart,

    /// Goal pose outside the grid or in collision.
    #[error("goal pose is off the grid or in collision")]
    InvalidGoal,

    /// Open set exhausted without reaching the goal.
    #[error("no valid path found")]
    NoPathFound,

    /// Iteration budget exhausted before reaching the goal.
    #[error("exceeded maximum iterations ({0})")]
    IterationsExceeded(usize),

    /// Wall-clock deadline passed before reaching the goal.
    #[error("exceeded maximum planning time ({0:.3}s)")]
    TimeExceeded(f32),

    /// Configuration selects something this planner does not implement.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result alias for planner operations.
pub type Result<T> = std::result::Result<T, PlannerError>;
