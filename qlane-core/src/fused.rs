//! Fused gate groups produced by the planner

use crate::gate::{GateKind, Qubits};

/// A group of gates applied together as one composite operation.
///
/// `anchor` and `members` are indices into the gate slice that was fused;
/// the slice must outlive the fused-gate list. Member matrices are not
/// premultiplied here; the simulator multiplies them in list order when
/// the fused gate is applied.
#[derive(Debug, Clone)]
pub struct FusedGate {
    pub kind: GateKind,
    /// Time of the anchor gate.
    pub time: u32,
    /// Anchor qubit set; the union of all measured qubits for a fused
    /// measurement.
    pub qubits: Qubits,
    /// The gate whose qubit set defines this fused gate.
    pub anchor: usize,
    /// Gates to multiply in time order, including the anchor. Empty for
    /// fused measurements.
    pub members: Vec<usize>,
}

impl FusedGate {
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }
}
