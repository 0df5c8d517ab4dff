//! Error types for engine operations.

use thiserror::Error;

use crate::event::EventInstance;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),

    /// The candidate interval overlaps existing commitments. Carries the
    /// full overlapping set so callers can offer alternatives.
    #[error("schedule conflict with {} existing commitment(s)", .conflicts.len())]
    Conflict { conflicts: Vec<EventInstance> },

    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
