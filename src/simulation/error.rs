//! Error types for the signal engine

use thiserror::Error;

use super::types::Lane;

/// Errors raised by the signal engine
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SignalError {
    /// Dequeue attempted on a lane with nobody waiting.
    /// The engine treats this as idle green time.
    #[error("No vehicle waiting on lane {0}")]
    EmptyLane(Lane),

    /// A lane reference outside the four approaches
    #[error("Invalid lane: {0:?}")]
    InvalidLane(String),

    #[error("Configuration value `{field}` out of range: {reason}")]
    ConfigurationOutOfRange { field: &'static str, reason: String },
}

pub type SignalResult<T> = Result<T, SignalError>;
