//! Pre-computed matrices for the standard gate set
//!
//! Flat row-major tables matching [`crate::gate::Matrix`]. Two-qubit
//! matrices follow the subspace convention `bit(q0) | bit(q1) << 1`, so
//! the first listed qubit is the low matrix bit; for the controlled gates
//! below the control is the first listed qubit.

use num_complex::Complex64;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);
const NEG_I: Complex64 = Complex64::new(0.0, -1.0);
const NEG_ONE: Complex64 = Complex64::new(-1.0, 0.0);

const INV_SQRT2: f64 = std::f64::consts::FRAC_1_SQRT_2;
const H: Complex64 = Complex64::new(INV_SQRT2, 0.0);
const NEG_H: Complex64 = Complex64::new(-INV_SQRT2, 0.0);

/// Identity
pub const IDENTITY: [Complex64; 4] = [ONE, ZERO, ZERO, ONE];

/// Hadamard: H = 1/sqrt(2) * [[1, 1], [1, -1]]
pub const HADAMARD: [Complex64; 4] = [H, H, H, NEG_H];

/// Pauli-X (NOT)
pub const PAULI_X: [Complex64; 4] = [ZERO, ONE, ONE, ZERO];

/// Pauli-Y
pub const PAULI_Y: [Complex64; 4] = [ZERO, NEG_I, I, ZERO];

/// Pauli-Z
pub const PAULI_Z: [Complex64; 4] = [ONE, ZERO, ZERO, NEG_ONE];

/// S (phase) gate
pub const S_GATE: [Complex64; 4] = [ONE, ZERO, ZERO, I];

/// T gate: diag(1, exp(i pi/4))
pub const T_GATE: [Complex64; 4] = [
    ONE,
    ZERO,
    ZERO,
    Complex64::new(INV_SQRT2, INV_SQRT2),
];

/// CNOT with the control on the first listed qubit.
#[rustfmt::skip]
pub const CNOT: [Complex64; 16] = [
    ONE,  ZERO, ZERO, ZERO,
    ZERO, ZERO, ZERO, ONE,
    ZERO, ZERO, ONE,  ZERO,
    ZERO, ONE,  ZERO, ZERO,
];

/// Controlled-Z; symmetric in its operands.
#[rustfmt::skip]
pub const CZ: [Complex64; 16] = [
    ONE,  ZERO, ZERO, ZERO,
    ZERO, ONE,  ZERO, ZERO,
    ZERO, ZERO, ONE,  ZERO,
    ZERO, ZERO, ZERO, NEG_ONE,
];

/// SWAP
#[rustfmt::skip]
pub const SWAP: [Complex64; 16] = [
    ONE,  ZERO, ZERO, ZERO,
    ZERO, ZERO, ONE,  ZERO,
    ZERO, ONE,  ZERO, ZERO,
    ZERO, ZERO, ZERO, ONE,
];

/// ISWAP: swaps with a phase of i on the exchanged states.
#[rustfmt::skip]
pub const ISWAP: [Complex64; 16] = [
    ONE,  ZERO, ZERO, ZERO,
    ZERO, ZERO, I,    ZERO,
    ZERO, I,    ZERO, ZERO,
    ZERO, ZERO, ZERO, ONE,
];

/// Rotation about X: RX(theta) = exp(-i theta X / 2)
pub fn rx(theta: f64) -> [Complex64; 4] {
    let (sin, cos) = (theta / 2.0).sin_cos();
    [
        Complex64::new(cos, 0.0),
        Complex64::new(0.0, -sin),
        Complex64::new(0.0, -sin),
        Complex64::new(cos, 0.0),
    ]
}

/// Rotation about Y: RY(theta) = exp(-i theta Y / 2)
pub fn ry(theta: f64) -> [Complex64; 4] {
    let (sin, cos) = (theta / 2.0).sin_cos();
    [
        Complex64::new(cos, 0.0),
        Complex64::new(-sin, 0.0),
        Complex64::new(sin, 0.0),
        Complex64::new(cos, 0.0),
    ]
}

/// Rotation about Z: RZ(theta) = exp(-i theta Z / 2)
pub fn rz(theta: f64) -> [Complex64; 4] {
    let (sin, cos) = (theta / 2.0).sin_cos();
    [
        Complex64::new(cos, -sin),
        ZERO,
        ZERO,
        Complex64::new(cos, sin),
    ]
}
