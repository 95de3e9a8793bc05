//! In-place application of fused unitary gates

use crate::error::{Result, SimError};
use crate::matrix::{fused_matrix, FusedMatrix};
use qlane_core::{FusedGate, Gate, GateKind};
use qlane_state::{StateBuffer, StateSpace};

/// Applies fused unitary gates to an amplitude buffer through a
/// state-space back-end's kernels.
///
/// The simulator holds no amplitude state of its own; parallelism and
/// float width come from the back-end it borrows.
pub struct Simulator<'a, S: StateSpace> {
    space: &'a S,
}

impl<'a, S: StateSpace> Simulator<'a, S> {
    pub fn new(space: &'a S) -> Self {
        Self { space }
    }

    /// Apply a fused unitary gate in place.
    ///
    /// The member matrices are multiplied into the effective matrix here;
    /// fusion itself never touches matrices. Measurement fused gates are
    /// routed through the state space by the runner, not through this
    /// path.
    ///
    /// # Errors
    /// Fails on measurement fused gates, malformed members, or kernel
    /// errors from the back-end.
    pub fn apply_fused(
        &self,
        fused: &FusedGate,
        gates: &[Gate],
        buf: &mut StateBuffer<S::Fp>,
    ) -> Result<()> {
        if fused.kind == GateKind::Measurement {
            return Err(SimError::NotUnitary);
        }

        match fused_matrix(fused, gates)? {
            FusedMatrix::One(m) => self.space.apply_gate1(buf, fused.qubits[0], &m)?,
            FusedMatrix::Two(m) => {
                self.space
                    .apply_gate2(buf, fused.qubits[0], fused.qubits[1], &m)?
            }
        }
        Ok(())
    }
}
