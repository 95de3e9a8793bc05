//! The state-space contract shared by all amplitude back-ends
//!
//! A state space owns no amplitudes itself; it describes the storage
//! layout for a fixed qubit count and provides the kernels that operate
//! on [`StateBuffer`]s of that shape. Back-ends differ in float width and
//! lane count but expose identical semantics, so the simulator and the
//! runner are generic over [`StateSpace`].

use crate::buffer::StateBuffer;
use crate::error::{Result, StateError};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Mask and bit values identifying a measurement outcome.
///
/// An amplitude with basis index `i` survives the associated collapse
/// exactly when `i & mask == bits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementOutcome {
    pub mask: u64,
    pub bits: u64,
}

/// Amplitude storage and kernels for a fixed qubit count.
pub trait StateSpace: Send + Sync + Sized {
    /// Storage float type.
    type Fp: Copy + Send + Sync + 'static;

    /// Lane count L of the interleaved layout; blocks hold L real parts
    /// followed by L imaginary parts.
    const LANES: usize;

    /// Build a state space for `num_qubits` qubits and `num_workers`
    /// kernel workers.
    fn new(num_qubits: usize, num_workers: usize) -> Result<Self>;

    fn num_qubits(&self) -> usize;

    fn num_workers(&self) -> usize;

    /// Number of logical amplitudes, 2^N.
    #[inline]
    fn size(&self) -> u64 {
        1u64 << self.num_qubits()
    }

    /// Raw component count of a conforming buffer: max(2L, 2 * 2^N).
    fn raw_size(&self) -> usize;

    /// Allocate a buffer of `raw_size()` components, zero-initialized.
    fn create_buffer(&self) -> Result<StateBuffer<Self::Fp>>;

    /// Set every component to zero.
    fn set_all_zeros(&self, buf: &mut StateBuffer<Self::Fp>) -> Result<()>;

    /// Prepare |0...0>: amplitude 0 becomes 1, all others 0.
    fn set_state_zero(&self, buf: &mut StateBuffer<Self::Fp>) -> Result<()>;

    /// Prepare the uniform superposition with amplitude 1/sqrt(2^N).
    fn set_state_uniform(&self, buf: &mut StateBuffer<Self::Fp>) -> Result<()>;

    /// Amplitude at basis index `i`.
    fn get_ampl(&self, buf: &StateBuffer<Self::Fp>, i: u64) -> Complex64;

    /// Store an amplitude at basis index `i`.
    fn set_ampl(&self, buf: &mut StateBuffer<Self::Fp>, i: u64, ampl: Complex64);

    /// Elementwise `dst += src`.
    fn add_state(
        &self,
        src: &StateBuffer<Self::Fp>,
        dst: &mut StateBuffer<Self::Fp>,
    ) -> Result<()>;

    /// Elementwise `buf *= a` for a real scalar.
    fn multiply(&self, a: f64, buf: &mut StateBuffer<Self::Fp>) -> Result<()>;

    /// Sum of conj(a_i) * b_i, accumulated in double precision.
    fn inner_product(
        &self,
        a: &StateBuffer<Self::Fp>,
        b: &StateBuffer<Self::Fp>,
    ) -> Result<Complex64>;

    /// Real part of the inner product, accumulated in double precision.
    fn real_inner_product(
        &self,
        a: &StateBuffer<Self::Fp>,
        b: &StateBuffer<Self::Fp>,
    ) -> Result<f64>;

    /// Squared norm of the state.
    fn norm(&self, buf: &StateBuffer<Self::Fp>) -> Result<f64> {
        self.real_inner_product(buf, buf)
    }

    /// Per-worker partial sums of |amplitude|^2, one entry per worker.
    fn partial_norms(&self, buf: &StateBuffer<Self::Fp>) -> Result<Vec<f64>>;

    /// Draw `num_samples` basis indices distributed as |amplitude|^2.
    ///
    /// Reproducible for a fixed `(seed, buffer)` pair.
    fn sample(
        &self,
        buf: &StateBuffer<Self::Fp>,
        num_samples: usize,
        seed: u64,
    ) -> Result<Vec<u64>>;

    /// Scan `worker`'s slice for the first basis index whose cumulative
    /// squared norm exceeds `r`, returning that index masked with `mask`.
    fn find_measured_bits(
        &self,
        worker: usize,
        r: f64,
        mask: u64,
        buf: &StateBuffer<Self::Fp>,
    ) -> Option<u64>;

    /// Zero every amplitude whose index fails `i & mask == bits` and
    /// renormalize the survivors.
    ///
    /// # Errors
    /// Fails with [`StateError::ZeroMass`] when nothing survives.
    fn collapse(
        &self,
        outcome: MeasurementOutcome,
        buf: &mut StateBuffer<Self::Fp>,
    ) -> Result<()>;

    /// Reorder the buffer from the lane-interleaved layout to alternating
    /// (re, im) pairs in basis order.
    fn internal_to_normal(&self, buf: &mut StateBuffer<Self::Fp>) -> Result<()>;

    /// Inverse of [`StateSpace::internal_to_normal`].
    fn normal_to_internal(&self, buf: &mut StateBuffer<Self::Fp>) -> Result<()>;

    /// Apply a one-qubit gate matrix (row-major 2x2) to qubit `q`.
    fn apply_gate1(
        &self,
        buf: &mut StateBuffer<Self::Fp>,
        q: u32,
        matrix: &[Complex64; 4],
    ) -> Result<()>;

    /// Apply a two-qubit gate matrix (row-major 4x4) to distinct qubits
    /// `q0` and `q1`; `q0` is the low subspace bit.
    fn apply_gate2(
        &self,
        buf: &mut StateBuffer<Self::Fp>,
        q0: u32,
        q1: u32,
        matrix: &[Complex64; 16],
    ) -> Result<()>;

    /// Measure the given qubits, collapsing the state to the outcome.
    fn measure(
        &self,
        qubits: &[u32],
        rng: &mut StdRng,
        buf: &mut StateBuffer<Self::Fp>,
    ) -> Result<MeasurementOutcome> {
        let mask = qubits.iter().fold(0u64, |m, &q| m | (1u64 << q));

        let partials = self.partial_norms(buf)?;
        let total: f64 = partials.iter().sum();
        if total <= 0.0 {
            return Err(StateError::ZeroMass);
        }

        let mut r = rng.gen::<f64>() * total;
        let mut worker = 0usize;
        while worker + 1 < partials.len() && r >= partials[worker] {
            r -= partials[worker];
            worker += 1;
        }

        let bits = self
            .find_measured_bits(worker, r, mask, buf)
            .ok_or(StateError::MeasurementFailed)?;

        let outcome = MeasurementOutcome { mask, bits };
        self.collapse(outcome, buf)?;
        Ok(outcome)
    }

    /// Export all 2^N amplitudes in basis order.
    fn to_amplitudes(&self, buf: &StateBuffer<Self::Fp>) -> Result<Vec<Complex64>> {
        check_size(self.raw_size(), buf.len())?;
        Ok((0..self.size()).map(|i| self.get_ampl(buf, i)).collect())
    }
}

/// Validate a buffer length against the state space's raw size.
#[inline]
pub(crate) fn check_size(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(StateError::BufferSizeMismatch { expected, actual });
    }
    Ok(())
}

/// Ascending uniform draws in `[0, norm)`, deterministic per seed.
pub(crate) fn sorted_uniform_draws(num_samples: usize, seed: u64, norm: f64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut draws: Vec<f64> = (0..num_samples).map(|_| rng.gen::<f64>() * norm).collect();
    draws.sort_by(f64::total_cmp);
    draws
}

/// Insert a zero bit at position `q` of `t`.
#[inline]
pub(crate) fn expand1(t: u64, q: u32) -> u64 {
    ((t >> q) << (q + 1)) | (t & ((1u64 << q) - 1))
}

/// Insert zero bits at positions `ql < qh`.
#[inline]
pub(crate) fn expand2(t: u64, ql: u32, qh: u32) -> u64 {
    expand1(expand1(t, ql), qh)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand1_clears_target_bit() {
        for t in 0..16u64 {
            for q in 0..4u32 {
                let i = expand1(t, q);
                assert_eq!(i & (1 << q), 0);
            }
        }
        assert_eq!(expand1(0b101, 1), 0b1001);
    }

    #[test]
    fn test_expand2_enumerates_clear_pairs() {
        let indices: Vec<u64> = (0..4).map(|t| expand2(t, 0, 2)).collect();
        assert_eq!(indices, vec![0b0000, 0b0010, 0b1000, 0b1010]);
    }

    #[test]
    fn test_sorted_draws_are_deterministic_and_bounded() {
        let a = sorted_uniform_draws(64, 7, 2.0);
        let b = sorted_uniform_draws(64, 7, 2.0);
        assert_eq!(a, b);
        assert!(a.windows(2).all(|w| w[0] <= w[1]));
        assert!(a.iter().all(|&x| (0.0..2.0).contains(&x)));
    }
}
