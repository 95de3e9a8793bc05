//! Error types for simulation and orchestration

use qlane_core::CoreError;
use qlane_state::StateError;
use thiserror::Error;

/// Errors that can occur while running a circuit
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// Fusion or circuit-model failure
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Kernel or buffer failure
    #[error(transparent)]
    State(#[from] StateError),

    /// A fused member gate carries no matrix
    #[error("fused gate member at time {time} has no matrix")]
    MissingMatrix { time: u32 },

    /// A fused member acts outside its anchor's qubit set
    #[error("fused gate member acts outside the anchor qubit set")]
    MalformedFusedGate,

    /// A measurement reached the unitary application path
    #[error("measurement gate passed to the unitary simulator")]
    NotUnitary,
}

/// Result type for simulation operations
pub type Result<T> = std::result::Result<T, SimError>;
