//! Error types for the revmesh simulation
//!
//! All variants are fatal to the current run: the engine never retries and
//! never swallows a failure. A driver that wants another attempt starts a new
//! run with a new seed.

use revmesh_accumulator::AccumulatorError;
use thiserror::Error;

/// Top-level error type for a simulation run
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The caller asked for something the current state cannot satisfy,
    /// e.g. revoking more credentials than there are valid devices
    #[error("Precondition violation: {0}")]
    PreconditionViolation(String),

    /// Propagated unchanged from the accumulator capability; never retried here
    #[error("Accumulator operation failed: {0}")]
    CryptoOperation(#[from] AccumulatorError),

    /// A state combination the propagation rule forbids was observed;
    /// indicates a logic bug and aborts the run loudly
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Result type alias for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;
