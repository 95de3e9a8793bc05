//! Error types for circuit construction and gate fusion

use thiserror::Error;

/// Errors that can occur while building circuits or fusing gates
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Gate times must be non-decreasing across the input sequence
    #[error("gate times should be ordered: time {time} follows time {prev}")]
    UnorderedGateTimes { time: u32, prev: u32 },

    /// Non-measurement gates act on one or two qubits only
    #[error("unsupported gate: {num_qubits} qubits on a non-measurement gate at time {time}")]
    UnsupportedGate { time: u32, num_qubits: usize },

    /// Invalid qubit index
    #[error("invalid qubit index {qubit} for a {num_qubits}-qubit circuit")]
    InvalidQubitIndex { qubit: u32, num_qubits: usize },

    /// Duplicate qubit in a gate operand list
    #[error("duplicate qubit {qubit} in gate operand list")]
    DuplicateQubit { qubit: u32 },

    /// Unitary gate without a matrix
    #[error("gate at time {time} has no matrix")]
    MissingMatrix { time: u32 },
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
