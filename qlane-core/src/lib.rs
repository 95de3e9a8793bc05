//! Core circuit model and gate-fusion planner
//!
//! This crate holds the pieces of the simulator that know nothing about
//! amplitude storage: the gate and circuit data model, pre-computed
//! matrices for the standard gate set, the greedy fusion planner that
//! groups gates into at-most-two-qubit units, and the diagnostic sinks
//! the engine reports through.
//!
//! # Example
//!
//! ```
//! use qlane_core::{matrices, BasicFuser, Circuit, Gate, SilentIo};
//!
//! let mut circuit = Circuit::new(2);
//! circuit.add_gate(Gate::unitary1(0, 0, matrices::HADAMARD)).unwrap();
//! circuit.add_gate(Gate::unitary2(1, 0, 1, matrices::CNOT).unwrap()).unwrap();
//!
//! let fused = BasicFuser::fuse(2, &circuit.gates, &SilentIo).unwrap();
//! assert_eq!(fused.len(), 1);
//! ```

pub mod circuit;
pub mod error;
pub mod fused;
pub mod fuser;
pub mod gate;
pub mod io;
pub mod matrices;

pub use circuit::Circuit;
pub use error::{CoreError, Result};
pub use fused::FusedGate;
pub use fuser::BasicFuser;
pub use gate::{Gate, GateKind, Matrix, Qubits};
pub use io::{BufferedIo, ConsoleIo, Io, SilentIo};
