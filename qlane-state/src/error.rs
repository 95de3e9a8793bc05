//! Error types for amplitude-buffer operations

use thiserror::Error;

/// Errors that can occur during state-space operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Buffer length does not match the state space's raw size
    #[error("buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Aligned allocation failed
    #[error("failed to allocate {size} bytes for the amplitude buffer")]
    AllocationFailed { size: usize },

    /// Qubit count exceeds what the back-end supports
    #[error("{num_qubits} qubits exceed the supported maximum of {max}")]
    TooManyQubits { num_qubits: usize, max: usize },

    /// Invalid qubit index for a kernel
    #[error("invalid qubit index {qubit} for a {num_qubits}-qubit state")]
    InvalidQubitIndex { qubit: u32, num_qubits: usize },

    /// Collapse onto an outcome with no probability mass
    #[error("collapse onto an outcome with zero probability mass")]
    ZeroMass,

    /// The cumulative scan never crossed the requested threshold
    #[error("measurement scan failed to locate an outcome")]
    MeasurementFailed,
}

/// Result type for state-space operations
pub type Result<T> = std::result::Result<T, StateError>;
