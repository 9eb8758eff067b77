//! Error types for revmesh-accumulator

use thiserror::Error;

/// Errors that can occur during accumulator operations
#[derive(Debug, Error)]
pub enum AccumulatorError {
    #[error("Invalid secret key")]
    InvalidKey,

    #[error("Element is not a member: {0}")]
    ElementNotMember(String),

    #[error("Element is already a member: {0}")]
    ElementAlreadyMember(String),

    #[error("Witness generation failed: {0}")]
    WitnessGenerationFailed(String),
}

/// Result type for accumulator operations
pub type AccumulatorResult<T> = Result<T, AccumulatorError>;
