//! Fused-gate simulation and circuit orchestration
//!
//! Ties the planner and the state-space kernels together: fused gates
//! from `qlane-core` are turned into effective 2x2 or 4x4 matrices and
//! applied in place through a `qlane-state` back-end, while the runner
//! sequences windows, mid-circuit measurements, and diagnostics.
//!
//! # Example
//!
//! ```
//! use qlane_core::{matrices, Circuit, Gate, SilentIo};
//! use qlane_sim::{MeasureEvent, RunParams, Runner};
//! use qlane_state::{ScalarStateSpace, SequentialLoop, StateSpace};
//!
//! let mut circuit = Circuit::new(2);
//! circuit.add_gate(Gate::unitary1(0, 0, matrices::HADAMARD)).unwrap();
//! circuit.add_gate(Gate::unitary2(1, 0, 1, matrices::CNOT).unwrap()).unwrap();
//!
//! type Space = ScalarStateSpace<SequentialLoop>;
//! Runner::<Space>::run_to_end(&RunParams::default(), &circuit, &SilentIo, |event| {
//!     if let MeasureEvent::Window { space, buf, .. } = event {
//!         let bell = space.get_ampl(buf, 0);
//!         assert!((bell.re - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
//!     }
//! })
//! .unwrap();
//! ```

pub mod config;
pub mod error;
pub mod matrix;
pub mod runner;
pub mod simulator;

pub use config::RunParams;
pub use error::{Result, SimError};
pub use matrix::{fused_matrix, FusedMatrix};
pub use runner::{MeasureEvent, Runner};
pub use simulator::Simulator;
