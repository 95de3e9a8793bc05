//! Effective-matrix construction for fused gates
//!
//! A fused gate's members are multiplied at apply time, in time order,
//! each multiplying on the left of the accumulating product. One-qubit
//! members of a two-qubit fused gate are embedded into the anchor's
//! subspace first: the anchor's first qubit is the low subspace bit.

use crate::error::{Result, SimError};
use num_complex::Complex64;
use qlane_core::{FusedGate, Gate, Matrix};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

/// The dense product matrix of a fused gate's members.
#[derive(Debug, Clone, PartialEq)]
pub enum FusedMatrix {
    One([Complex64; 4]),
    Two([Complex64; 16]),
}

/// Multiply the member matrices of `fused` into a single unitary.
///
/// # Errors
/// Fails if a member lacks a matrix or acts outside the anchor's qubits.
pub fn fused_matrix(fused: &FusedGate, gates: &[Gate]) -> Result<FusedMatrix> {
    match fused.num_qubits() {
        1 => {
            let mut acc = [ONE, ZERO, ZERO, ONE];
            for &gi in &fused.members {
                let m = member_matrix1(&gates[gi])?;
                acc = mul2(&m, &acc);
            }
            Ok(FusedMatrix::One(acc))
        }
        2 => {
            let mut acc = identity4();
            for &gi in &fused.members {
                let gate = &gates[gi];
                let m = match gate.matrix.as_ref() {
                    Some(Matrix::One(m)) => {
                        let q = gate.qubits[0];
                        if q == fused.qubits[0] {
                            expand_low(m)
                        } else if q == fused.qubits[1] {
                            expand_high(m)
                        } else {
                            return Err(SimError::MalformedFusedGate);
                        }
                    }
                    Some(Matrix::Two(m)) => {
                        if gate.qubits.as_slice() != fused.qubits.as_slice() {
                            return Err(SimError::MalformedFusedGate);
                        }
                        *m
                    }
                    None => return Err(SimError::MissingMatrix { time: gate.time }),
                };
                acc = mul4(&m, &acc);
            }
            Ok(FusedMatrix::Two(acc))
        }
        _ => Err(SimError::MalformedFusedGate),
    }
}

fn member_matrix1(gate: &Gate) -> Result<[Complex64; 4]> {
    match gate.matrix.as_ref() {
        Some(Matrix::One(m)) => Ok(*m),
        Some(Matrix::Two(_)) => Err(SimError::MalformedFusedGate),
        None => Err(SimError::MissingMatrix { time: gate.time }),
    }
}

fn identity4() -> [Complex64; 16] {
    let mut m = [ZERO; 16];
    for r in 0..4 {
        m[r * 4 + r] = ONE;
    }
    m
}

/// a * b for row-major 2x2 matrices.
fn mul2(a: &[Complex64; 4], b: &[Complex64; 4]) -> [Complex64; 4] {
    let mut out = [ZERO; 4];
    for r in 0..2 {
        for c in 0..2 {
            out[r * 2 + c] = a[r * 2] * b[c] + a[r * 2 + 1] * b[2 + c];
        }
    }
    out
}

/// a * b for row-major 4x4 matrices.
fn mul4(a: &[Complex64; 16], b: &[Complex64; 16]) -> [Complex64; 16] {
    let mut out = [ZERO; 16];
    for r in 0..4 {
        for c in 0..4 {
            let mut sum = ZERO;
            for k in 0..4 {
                sum += a[r * 4 + k] * b[k * 4 + c];
            }
            out[r * 4 + c] = sum;
        }
    }
    out
}

/// Embed a one-qubit matrix on the low subspace bit: E = I (x) m.
fn expand_low(m: &[Complex64; 4]) -> [Complex64; 16] {
    let mut out = [ZERO; 16];
    for r in 0..4 {
        for c in 0..4 {
            if r >> 1 == c >> 1 {
                out[r * 4 + c] = m[(r & 1) * 2 + (c & 1)];
            }
        }
    }
    out
}

/// Embed a one-qubit matrix on the high subspace bit: E = m (x) I.
fn expand_high(m: &[Complex64; 4]) -> [Complex64; 16] {
    let mut out = [ZERO; 16];
    for r in 0..4 {
        for c in 0..4 {
            if r & 1 == c & 1 {
                out[r * 4 + c] = m[(r >> 1) * 2 + (c >> 1)];
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use qlane_core::{matrices, BasicFuser, SilentIo};

    fn assert_close4(a: &[Complex64; 16], b: &[Complex64; 16]) {
        for (x, y) in a.iter().zip(b) {
            assert_relative_eq!(x.re, y.re, epsilon = 1e-12);
            assert_relative_eq!(x.im, y.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_mul2_identity() {
        let h = matrices::HADAMARD;
        assert_eq!(mul2(&matrices::IDENTITY, &h), h);
        assert_eq!(mul2(&h, &matrices::IDENTITY), h);
    }

    #[test]
    fn test_hadamard_squares_to_identity() {
        let hh = mul2(&matrices::HADAMARD, &matrices::HADAMARD);
        for (got, want) in hh.iter().zip(&matrices::IDENTITY) {
            assert_relative_eq!(got.re, want.re, epsilon = 1e-12);
            assert_relative_eq!(got.im, want.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_expand_low_acts_on_bit_zero() {
        let e = expand_low(&matrices::PAULI_X);
        // X on the low bit maps subspace 0 <-> 1 and 2 <-> 3.
        assert_eq!(e[0 * 4 + 1], Complex64::new(1.0, 0.0));
        assert_eq!(e[1 * 4 + 0], Complex64::new(1.0, 0.0));
        assert_eq!(e[2 * 4 + 3], Complex64::new(1.0, 0.0));
        assert_eq!(e[3 * 4 + 2], Complex64::new(1.0, 0.0));
        assert_eq!(e[0 * 4 + 0], Complex64::new(0.0, 0.0));
    }

    #[test]
    fn test_expand_high_acts_on_bit_one() {
        let e = expand_high(&matrices::PAULI_X);
        // X on the high bit maps subspace 0 <-> 2 and 1 <-> 3.
        assert_eq!(e[0 * 4 + 2], Complex64::new(1.0, 0.0));
        assert_eq!(e[2 * 4 + 0], Complex64::new(1.0, 0.0));
        assert_eq!(e[1 * 4 + 3], Complex64::new(1.0, 0.0));
        assert_eq!(e[3 * 4 + 1], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_fused_matrix_multiplies_members_in_time_order() {
        // X then Z on one qubit: effective matrix Z * X = [[0,1],[-1,0]].
        let gates = vec![
            qlane_core::Gate::unitary1(0, 0, matrices::PAULI_X),
            qlane_core::Gate::unitary1(1, 0, matrices::PAULI_Z),
        ];
        let fused = BasicFuser::fuse(1, &gates, &SilentIo).unwrap();
        assert_eq!(fused.len(), 1);

        let m = match fused_matrix(&fused[0], &gates).unwrap() {
            FusedMatrix::One(m) => m,
            _ => panic!("expected a one-qubit matrix"),
        };
        assert_relative_eq!(m[1].re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(m[2].re, -1.0, epsilon = 1e-12);
        assert_relative_eq!(m[0].re, 0.0, epsilon = 1e-12);
        assert_relative_eq!(m[3].re, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fused_matrix_embeds_single_qubit_members() {
        // H on qubit 0 followed by CNOT(0, 1): the Bell-pair unitary.
        let gates = vec![
            qlane_core::Gate::unitary1(0, 0, matrices::HADAMARD),
            qlane_core::Gate::unitary2(1, 0, 1, matrices::CNOT).unwrap(),
        ];
        let fused = BasicFuser::fuse(2, &gates, &SilentIo).unwrap();
        assert_eq!(fused.len(), 1);

        let m = match fused_matrix(&fused[0], &gates).unwrap() {
            FusedMatrix::Two(m) => m,
            _ => panic!("expected a two-qubit matrix"),
        };

        let expected = mul4(&matrices::CNOT, &expand_low(&matrices::HADAMARD));
        assert_close4(&m, &expected);
    }
}
