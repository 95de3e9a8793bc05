//! Gate data model: kinds, operands, and dense unitary matrices
//!
//! Qubit `q` occupies bit `q` of a basis-state index (least significant
//! first). Within a two-qubit matrix on qubits `[q0, q1]` the subspace
//! index is `bit(q0) | bit(q1) << 1`, so the first listed qubit is the
//! low matrix bit. Two-qubit gates are normalized on construction so that
//! `qubits[0] < qubits[1]`, permuting the matrix when the caller listed
//! them in descending order.

use crate::error::{CoreError, Result};
use num_complex::Complex64;
use smallvec::SmallVec;

/// Qubit operand list; inline storage covers the one- and two-qubit cases.
pub type Qubits = SmallVec<[u32; 2]>;

/// Discriminates ordinary unitary gates from measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateKind {
    Unitary,
    Measurement,
}

/// Dense unitary matrix in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub enum Matrix {
    /// 2x2 matrix of a one-qubit gate.
    One([Complex64; 4]),
    /// 4x4 matrix of a two-qubit gate.
    Two([Complex64; 16]),
}

impl Matrix {
    /// Matrix dimension: 2 for one-qubit, 4 for two-qubit gates.
    pub fn dim(&self) -> usize {
        match self {
            Matrix::One(_) => 2,
            Matrix::Two(_) => 4,
        }
    }
}

/// A single gate in a time-ordered circuit.
///
/// Gates are immutable once constructed; the fuser and the simulator refer
/// to them by index into the circuit's gate slice.
#[derive(Debug, Clone)]
pub struct Gate {
    pub kind: GateKind,
    /// Time step; non-decreasing across a circuit.
    pub time: u32,
    pub qubits: Qubits,
    /// A single-qubit gate marked unfusible anchors its own fused gate.
    pub unfusible: bool,
    /// Dense unitary; `None` for measurements.
    pub matrix: Option<Matrix>,
}

impl Gate {
    /// One-qubit unitary gate.
    pub fn unitary1(time: u32, qubit: u32, matrix: [Complex64; 4]) -> Self {
        Self {
            kind: GateKind::Unitary,
            time,
            qubits: SmallVec::from_slice(&[qubit]),
            unfusible: false,
            matrix: Some(Matrix::One(matrix)),
        }
    }

    /// Two-qubit unitary gate.
    ///
    /// The matrix is given in the basis `bit(q0) | bit(q1) << 1`. Operands
    /// are normalized to ascending order, permuting the matrix to match.
    ///
    /// # Errors
    /// Returns an error if the two qubits coincide.
    pub fn unitary2(time: u32, q0: u32, q1: u32, matrix: [Complex64; 16]) -> Result<Self> {
        if q0 == q1 {
            return Err(CoreError::DuplicateQubit { qubit: q0 });
        }

        let (qubits, matrix) = if q0 < q1 {
            (SmallVec::from_slice(&[q0, q1]), matrix)
        } else {
            (SmallVec::from_slice(&[q1, q0]), swap_qubit_order(&matrix))
        };

        Ok(Self {
            kind: GateKind::Unitary,
            time,
            qubits,
            unfusible: false,
            matrix: Some(Matrix::Two(matrix)),
        })
    }

    /// Measurement of the given qubits in the computational basis.
    ///
    /// # Errors
    /// Returns an error if a qubit is listed twice.
    pub fn measurement(time: u32, qubits: &[u32]) -> Result<Self> {
        for i in 0..qubits.len() {
            for j in (i + 1)..qubits.len() {
                if qubits[i] == qubits[j] {
                    return Err(CoreError::DuplicateQubit { qubit: qubits[i] });
                }
            }
        }

        Ok(Self {
            kind: GateKind::Measurement,
            time,
            qubits: SmallVec::from_slice(qubits),
            unfusible: false,
            matrix: None,
        })
    }

    /// Mark this gate as unfusible; it will anchor its own fused gate.
    pub fn with_unfusible(mut self) -> Self {
        self.unfusible = true;
        self
    }

    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    #[inline]
    pub fn is_measurement(&self) -> bool {
        self.kind == GateKind::Measurement
    }
}

/// Permute a 4x4 matrix so the roles of the two subspace bits swap.
fn swap_qubit_order(m: &[Complex64; 16]) -> [Complex64; 16] {
    // Basis permutation 01 <-> 10.
    const P: [usize; 4] = [0, 2, 1, 3];

    let mut out = [Complex64::new(0.0, 0.0); 16];
    for r in 0..4 {
        for c in 0..4 {
            out[r * 4 + c] = m[P[r] * 4 + P[c]];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrices;

    #[test]
    fn test_unitary1_fields() {
        let g = Gate::unitary1(3, 1, matrices::HADAMARD);
        assert_eq!(g.kind, GateKind::Unitary);
        assert_eq!(g.time, 3);
        assert_eq!(g.qubits.as_slice(), &[1]);
        assert!(!g.unfusible);
        assert_eq!(g.num_qubits(), 1);
    }

    #[test]
    fn test_unitary2_rejects_duplicate_qubit() {
        let result = Gate::unitary2(0, 2, 2, matrices::CNOT);
        assert_eq!(result.unwrap_err(), CoreError::DuplicateQubit { qubit: 2 });
    }

    #[test]
    fn test_unitary2_normalizes_descending_operands() {
        // CNOT listed as (control=1, target=0) must become qubits [0, 1]
        // with the control moved to the high subspace bit.
        let g = Gate::unitary2(0, 1, 0, matrices::CNOT).unwrap();
        assert_eq!(g.qubits.as_slice(), &[0, 1]);

        let m = match g.matrix.unwrap() {
            Matrix::Two(m) => m,
            _ => panic!("expected a two-qubit matrix"),
        };

        // Control on the high bit: |10> -> |11>, |11> -> |10>.
        let one = Complex64::new(1.0, 0.0);
        assert_eq!(m[0], one); // |00> -> |00>
        assert_eq!(m[1 * 4 + 1], one); // |01> -> |01>
        assert_eq!(m[3 * 4 + 2], one); // |10> -> |11>
        assert_eq!(m[2 * 4 + 3], one); // |11> -> |10>
    }

    #[test]
    fn test_measurement_gate() {
        let g = Gate::measurement(5, &[0, 2]).unwrap();
        assert!(g.is_measurement());
        assert_eq!(g.num_qubits(), 2);
        assert!(g.matrix.is_none());
    }

    #[test]
    fn test_measurement_rejects_duplicates() {
        assert!(Gate::measurement(0, &[1, 1]).is_err());
    }

    #[test]
    fn test_with_unfusible() {
        let g = Gate::unitary1(0, 0, matrices::PAULI_X).with_unfusible();
        assert!(g.unfusible);
    }
}
