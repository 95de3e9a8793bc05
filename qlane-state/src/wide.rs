//! Wide-lane single-precision back-end
//!
//! Amplitudes are stored in blocks of eight: eight real parts followed by
//! eight imaginary parts, each half one 256-bit register wide. The
//! amplitude with basis index `i` lives at component `16*(i/8) + i%8`
//! (real) and eight past it (imaginary).
//!
//! Elementwise kernels, reductions, and gate application on qubits with a
//! full-block stride (q >= 3) dispatch to AVX2/FMA kernels when the host
//! supports them; in-lane qubits, cumulative scans, and the layout
//! conversions use portable lane-addressed loops.

#[cfg(target_arch = "x86_64")]
mod avx2;

use crate::buffer::StateBuffer;
use crate::error::{Result, StateError};
use crate::parallel::{ParallelLoop, SyncPtr};
use crate::statespace::{
    check_size, expand1, expand2, sorted_uniform_draws, MeasurementOutcome, StateSpace,
};
use num_complex::Complex64;

/// Widest state this back-end accepts.
const MAX_QUBITS: usize = 40;

/// Floats per lane block: eight reals then eight imaginaries.
const BLOCK: usize = 16;

/// f32 state space with lane count 8.
pub struct WideStateSpace<P: ParallelLoop> {
    num_qubits: usize,
    raw_size: usize,
    par: P,
    use_simd: bool,
}

/// Component index of the real part of amplitude `i`.
#[inline]
fn pos(i: u64) -> usize {
    (((i >> 3) << 4) | (i & 7)) as usize
}

#[inline]
fn read(s: *const f32, i: u64) -> (f32, f32) {
    let k = pos(i);
    unsafe { (*s.add(k), *s.add(k + 8)) }
}

#[inline]
fn write(s: *mut f32, i: u64, re: f32, im: f32) {
    let k = pos(i);
    unsafe {
        *s.add(k) = re;
        *s.add(k + 8) = im;
    }
}

/// 2x2 matrix as (re, im) pairs in storage precision.
fn m2_f32(m: &[Complex64; 4]) -> [(f32, f32); 4] {
    let mut out = [(0.0, 0.0); 4];
    for (dst, src) in out.iter_mut().zip(m) {
        *dst = (src.re as f32, src.im as f32);
    }
    out
}

fn m4_f32(m: &[Complex64; 16]) -> [(f32, f32); 16] {
    let mut out = [(0.0, 0.0); 16];
    for (dst, src) in out.iter_mut().zip(m) {
        *dst = (src.re as f32, src.im as f32);
    }
    out
}

fn detect_simd() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma")
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        false
    }
}

impl<P: ParallelLoop> WideStateSpace<P> {
    #[inline]
    fn num_blocks(&self) -> u64 {
        (self.raw_size / BLOCK) as u64
    }

    fn check_qubit(&self, q: u32) -> Result<()> {
        if q as usize >= self.num_qubits {
            return Err(StateError::InvalidQubitIndex {
                qubit: q,
                num_qubits: self.num_qubits,
            });
        }
        Ok(())
    }

    /// Portable 2x2 application to the lane pair (i, j) of one qubit.
    #[inline]
    fn kernel1(s: *mut f32, i: u64, j: u64, m: &[(f32, f32); 4]) {
        let (r0, i0) = read(s, i);
        let (r1, i1) = read(s, j);

        let nr0 = m[0].0 * r0 - m[0].1 * i0 + m[1].0 * r1 - m[1].1 * i1;
        let ni0 = m[0].0 * i0 + m[0].1 * r0 + m[1].0 * i1 + m[1].1 * r1;
        let nr1 = m[2].0 * r0 - m[2].1 * i0 + m[3].0 * r1 - m[3].1 * i1;
        let ni1 = m[2].0 * i0 + m[2].1 * r0 + m[3].0 * i1 + m[3].1 * r1;

        write(s, i, nr0, ni0);
        write(s, j, nr1, ni1);
    }

    fn apply_gate1_high(&self, buf: &mut StateBuffer<f32>, q: u32, m: &[Complex64; 4]) {
        let d = 1u64 << (q - 3);
        let pairs = self.num_blocks() / 2;
        let p = SyncPtr(buf.as_mut_ptr());

        #[cfg(target_arch = "x86_64")]
        if self.use_simd {
            let mf: [f32; 8] = [
                m[0].re as f32,
                m[0].im as f32,
                m[1].re as f32,
                m[1].im as f32,
                m[2].re as f32,
                m[2].im as f32,
                m[3].re as f32,
                m[3].im as f32,
            ];
            self.par.run(pairs, move |_w, t| {
                let b0 = expand1(t, q - 3);
                let b1 = b0 + d;
                unsafe {
                    avx2::gate1_block_pair(
                        p.get().add(BLOCK * b0 as usize),
                        p.get().add(BLOCK * b1 as usize),
                        &mf,
                    );
                }
            });
            return;
        }

        let mf = m2_f32(m);
        self.par.run(pairs, move |_w, t| {
            let b0 = expand1(t, q - 3);
            let b1 = b0 + d;
            for j in 0..8u64 {
                Self::kernel1(p.get(), 8 * b0 + j, 8 * b1 + j, &mf);
            }
        });
    }

    fn apply_gate1_low(&self, buf: &mut StateBuffer<f32>, q: u32, m: &[Complex64; 4]) {
        let mf = m2_f32(m);
        let bit = 1u64 << q;
        let p = SyncPtr(buf.as_mut_ptr());

        self.par.run(self.num_blocks(), move |_w, k| {
            for j in 0..8u64 {
                if j & bit == 0 {
                    Self::kernel1(p.get(), 8 * k + j, 8 * k + (j | bit), &mf);
                }
            }
        });
    }
}

impl<P: ParallelLoop> StateSpace for WideStateSpace<P> {
    type Fp = f32;

    const LANES: usize = 8;

    fn new(num_qubits: usize, num_workers: usize) -> Result<Self> {
        if num_qubits > MAX_QUBITS {
            return Err(StateError::TooManyQubits {
                num_qubits,
                max: MAX_QUBITS,
            });
        }
        Ok(Self {
            num_qubits,
            raw_size: BLOCK.max(2usize << num_qubits),
            par: P::with_workers(num_workers),
            use_simd: detect_simd(),
        })
    }

    fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    fn num_workers(&self) -> usize {
        self.par.num_workers()
    }

    fn raw_size(&self) -> usize {
        self.raw_size
    }

    fn create_buffer(&self) -> Result<StateBuffer<f32>> {
        StateBuffer::zeroed(self.raw_size)
    }

    fn set_all_zeros(&self, buf: &mut StateBuffer<f32>) -> Result<()> {
        check_size(self.raw_size, buf.len())?;
        let p = SyncPtr(buf.as_mut_ptr());
        self.par.run(self.num_blocks(), move |_w, k| unsafe {
            let s = p.get().add(BLOCK * k as usize);
            for t in 0..BLOCK {
                *s.add(t) = 0.0;
            }
        });
        Ok(())
    }

    fn set_state_zero(&self, buf: &mut StateBuffer<f32>) -> Result<()> {
        self.set_all_zeros(buf)?;
        buf.as_mut_slice()[0] = 1.0;
        Ok(())
    }

    fn set_state_uniform(&self, buf: &mut StateBuffer<f32>) -> Result<()> {
        check_size(self.raw_size, buf.len())?;
        let v = (1.0 / (self.size() as f64).sqrt()) as f32;

        if self.num_qubits < 3 {
            // Only the leading lanes of block zero are occupied.
            self.set_all_zeros(buf)?;
            for i in 0..self.size() {
                write(buf.as_mut_ptr(), i, v, 0.0);
            }
            return Ok(());
        }

        let p = SyncPtr(buf.as_mut_ptr());
        self.par.run(self.num_blocks(), move |_w, k| unsafe {
            let s = p.get().add(BLOCK * k as usize);
            for j in 0..8 {
                *s.add(j) = v;
                *s.add(j + 8) = 0.0;
            }
        });
        Ok(())
    }

    fn get_ampl(&self, buf: &StateBuffer<f32>, i: u64) -> Complex64 {
        debug_assert!(i < self.size());
        let (re, im) = read(buf.as_ptr(), i);
        Complex64::new(re as f64, im as f64)
    }

    fn set_ampl(&self, buf: &mut StateBuffer<f32>, i: u64, ampl: Complex64) {
        debug_assert!(i < self.size());
        write(buf.as_mut_ptr(), i, ampl.re as f32, ampl.im as f32);
    }

    fn add_state(&self, src: &StateBuffer<f32>, dst: &mut StateBuffer<f32>) -> Result<()> {
        check_size(self.raw_size, src.len())?;
        check_size(self.raw_size, dst.len())?;
        let s = SyncPtr(src.as_ptr() as *mut f32);
        let d = SyncPtr(dst.as_mut_ptr());

        #[cfg(target_arch = "x86_64")]
        if self.use_simd {
            self.par.run(self.num_blocks(), move |_w, k| unsafe {
                avx2::add_block(s.get().add(BLOCK * k as usize), d.get().add(BLOCK * k as usize));
            });
            return Ok(());
        }

        self.par.run(self.num_blocks(), move |_w, k| unsafe {
            let sp = s.get().add(BLOCK * k as usize);
            let dp = d.get().add(BLOCK * k as usize);
            for t in 0..BLOCK {
                *dp.add(t) += *sp.add(t);
            }
        });
        Ok(())
    }

    fn multiply(&self, a: f64, buf: &mut StateBuffer<f32>) -> Result<()> {
        check_size(self.raw_size, buf.len())?;
        let a = a as f32;
        let p = SyncPtr(buf.as_mut_ptr());

        #[cfg(target_arch = "x86_64")]
        if self.use_simd {
            self.par.run(self.num_blocks(), move |_w, k| unsafe {
                avx2::scale_block(p.get().add(BLOCK * k as usize), a);
            });
            return Ok(());
        }

        self.par.run(self.num_blocks(), move |_w, k| unsafe {
            let s = p.get().add(BLOCK * k as usize);
            for t in 0..BLOCK {
                *s.add(t) *= a;
            }
        });
        Ok(())
    }

    fn inner_product(
        &self,
        a: &StateBuffer<f32>,
        b: &StateBuffer<f32>,
    ) -> Result<Complex64> {
        check_size(self.raw_size, a.len())?;
        check_size(self.raw_size, b.len())?;
        let pa = SyncPtr(a.as_ptr() as *mut f32);
        let pb = SyncPtr(b.as_ptr() as *mut f32);

        #[cfg(target_arch = "x86_64")]
        if self.use_simd {
            return Ok(self.par.run_reduce(
                self.num_blocks(),
                move |_w, k| {
                    let (re, im) = unsafe {
                        avx2::inner_product_block(
                            pa.get().add(BLOCK * k as usize),
                            pb.get().add(BLOCK * k as usize),
                        )
                    };
                    Complex64::new(re, im)
                },
                |x, y| x + y,
            ));
        }

        Ok(self.par.run_reduce(
            self.num_blocks(),
            move |_w, k| {
                let mut re = 0.0f64;
                let mut im = 0.0f64;
                for j in 0..8u64 {
                    let (r1, i1) = read(pa.get(), 8 * k + j);
                    let (r2, i2) = read(pb.get(), 8 * k + j);
                    re += (r1 * r2 + i1 * i2) as f64;
                    im += (r1 * i2 - i1 * r2) as f64;
                }
                Complex64::new(re, im)
            },
            |x, y| x + y,
        ))
    }

    fn real_inner_product(
        &self,
        a: &StateBuffer<f32>,
        b: &StateBuffer<f32>,
    ) -> Result<f64> {
        check_size(self.raw_size, a.len())?;
        check_size(self.raw_size, b.len())?;
        let pa = SyncPtr(a.as_ptr() as *mut f32);
        let pb = SyncPtr(b.as_ptr() as *mut f32);

        #[cfg(target_arch = "x86_64")]
        if self.use_simd {
            return Ok(self.par.run_reduce(
                self.num_blocks(),
                move |_w, k| unsafe {
                    avx2::real_inner_product_block(
                        pa.get().add(BLOCK * k as usize),
                        pb.get().add(BLOCK * k as usize),
                    )
                },
                |x, y| x + y,
            ));
        }

        Ok(self.par.run_reduce(
            self.num_blocks(),
            move |_w, k| {
                let mut sum = 0.0f64;
                for j in 0..8u64 {
                    let (r1, i1) = read(pa.get(), 8 * k + j);
                    let (r2, i2) = read(pb.get(), 8 * k + j);
                    sum += (r1 * r2 + i1 * i2) as f64;
                }
                sum
            },
            |x, y| x + y,
        ))
    }

    fn partial_norms(&self, buf: &StateBuffer<f32>) -> Result<Vec<f64>> {
        check_size(self.raw_size, buf.len())?;
        let p = SyncPtr(buf.as_ptr() as *mut f32);

        #[cfg(target_arch = "x86_64")]
        if self.use_simd {
            return Ok(self.par.run_reduce_partials(
                self.num_blocks(),
                move |_w, k| unsafe { avx2::norm_block(p.get().add(BLOCK * k as usize)) },
                |x, y| x + y,
            ));
        }

        Ok(self.par.run_reduce_partials(
            self.num_blocks(),
            move |_w, k| {
                let mut sum = 0.0f64;
                for j in 0..8u64 {
                    let (re, im) = read(p.get(), 8 * k + j);
                    sum += (re * re + im * im) as f64;
                }
                sum
            },
            |x, y| x + y,
        ))
    }

    fn sample(
        &self,
        buf: &StateBuffer<f32>,
        num_samples: usize,
        seed: u64,
    ) -> Result<Vec<u64>> {
        check_size(self.raw_size, buf.len())?;
        if num_samples == 0 {
            return Ok(Vec::new());
        }

        let s = buf.as_ptr();
        let mut norm = 0.0f64;
        for k in 0..self.num_blocks() {
            for j in 0..8u64 {
                let (re, im) = read(s, 8 * k + j);
                norm += (re * re + im * im) as f64;
            }
        }

        let draws = sorted_uniform_draws(num_samples, seed, norm);

        let mut samples = Vec::with_capacity(num_samples);
        let mut m = 0usize;
        let mut csum = 0.0f64;
        for k in 0..self.num_blocks() {
            for j in 0..8u64 {
                let (re, im) = read(s, 8 * k + j);
                csum += (re * re + im * im) as f64;
                while m < num_samples && draws[m] < csum {
                    samples.push(8 * k + j);
                    m += 1;
                }
            }
        }

        Ok(samples)
    }

    fn find_measured_bits(
        &self,
        worker: usize,
        r: f64,
        mask: u64,
        buf: &StateBuffer<f32>,
    ) -> Option<u64> {
        if buf.len() != self.raw_size {
            return None;
        }

        let k0 = self.par.index0(self.num_blocks(), worker);
        let k1 = self.par.index1(self.num_blocks(), worker);

        let s = buf.as_ptr();
        let mut csum = 0.0f64;
        for k in k0..k1 {
            for j in 0..8u64 {
                let (re, im) = read(s, 8 * k + j);
                csum += (re * re + im * im) as f64;
                if r < csum {
                    return Some((8 * k + j) & mask);
                }
            }
        }
        None
    }

    fn collapse(
        &self,
        outcome: MeasurementOutcome,
        buf: &mut StateBuffer<f32>,
    ) -> Result<()> {
        check_size(self.raw_size, buf.len())?;

        let p = SyncPtr(buf.as_mut_ptr());
        let MeasurementOutcome { mask, bits } = outcome;

        let surviving: f64 = self.par.run_reduce(
            self.num_blocks(),
            move |_w, k| {
                let mut sum = 0.0f64;
                for j in 0..8u64 {
                    if (8 * k + j) & mask == bits {
                        let (re, im) = read(p.get(), 8 * k + j);
                        sum += (re * re + im * im) as f64;
                    }
                }
                sum
            },
            |x, y| x + y,
        );
        if surviving <= 0.0 {
            return Err(StateError::ZeroMass);
        }

        let renorm = (1.0 / surviving.sqrt()) as f32;
        self.par.run(self.num_blocks(), move |_w, k| {
            for j in 0..8u64 {
                let i = 8 * k + j;
                let (re, im) = read(p.get(), i);
                if i & mask == bits {
                    write(p.get(), i, re * renorm, im * renorm);
                } else {
                    write(p.get(), i, 0.0, 0.0);
                }
            }
        });
        Ok(())
    }

    fn internal_to_normal(&self, buf: &mut StateBuffer<f32>) -> Result<()> {
        check_size(self.raw_size, buf.len())?;

        match self.num_qubits {
            1 => {
                let s = buf.as_mut_slice();
                s[2] = s[1];
                s[1] = s[8];
                s[3] = s[9];
                for t in 4..BLOCK {
                    s[t] = 0.0;
                }
            }
            2 => {
                let s = buf.as_mut_slice();
                s[6] = s[3];
                s[4] = s[2];
                s[2] = s[1];
                s[1] = s[8];
                s[3] = s[9];
                s[5] = s[10];
                s[7] = s[11];
                for t in 8..BLOCK {
                    s[t] = 0.0;
                }
            }
            _ => {
                let p = SyncPtr(buf.as_mut_ptr());
                self.par.run(self.num_blocks(), move |_w, k| unsafe {
                    let b = p.get().add(BLOCK * k as usize);
                    let mut re = [0.0f32; 8];
                    let mut im = [0.0f32; 8];
                    for j in 0..8 {
                        re[j] = *b.add(j);
                        im[j] = *b.add(j + 8);
                    }
                    for j in 0..8 {
                        *b.add(2 * j) = re[j];
                        *b.add(2 * j + 1) = im[j];
                    }
                });
            }
        }
        Ok(())
    }

    fn normal_to_internal(&self, buf: &mut StateBuffer<f32>) -> Result<()> {
        check_size(self.raw_size, buf.len())?;

        match self.num_qubits {
            1 => {
                let s = buf.as_mut_slice();
                s[8] = s[1];
                s[1] = s[2];
                s[9] = s[3];
                for t in 2..8 {
                    s[t] = 0.0;
                    s[t + 8] = 0.0;
                }
            }
            2 => {
                let s = buf.as_mut_slice();
                s[8] = s[1];
                s[9] = s[3];
                s[10] = s[5];
                s[11] = s[7];
                s[1] = s[2];
                s[2] = s[4];
                s[3] = s[6];
                for t in 4..8 {
                    s[t] = 0.0;
                    s[t + 8] = 0.0;
                }
            }
            _ => {
                let p = SyncPtr(buf.as_mut_ptr());
                self.par.run(self.num_blocks(), move |_w, k| unsafe {
                    let b = p.get().add(BLOCK * k as usize);
                    let mut re = [0.0f32; 8];
                    let mut im = [0.0f32; 8];
                    for j in 0..8 {
                        re[j] = *b.add(2 * j);
                        im[j] = *b.add(2 * j + 1);
                    }
                    for j in 0..8 {
                        *b.add(j) = re[j];
                        *b.add(j + 8) = im[j];
                    }
                });
            }
        }
        Ok(())
    }

    fn apply_gate1(
        &self,
        buf: &mut StateBuffer<f32>,
        q: u32,
        matrix: &[Complex64; 4],
    ) -> Result<()> {
        check_size(self.raw_size, buf.len())?;
        self.check_qubit(q)?;

        if q >= 3 {
            self.apply_gate1_high(buf, q, matrix);
        } else {
            self.apply_gate1_low(buf, q, matrix);
        }
        Ok(())
    }

    fn apply_gate2(
        &self,
        buf: &mut StateBuffer<f32>,
        q0: u32,
        q1: u32,
        matrix: &[Complex64; 16],
    ) -> Result<()> {
        check_size(self.raw_size, buf.len())?;
        self.check_qubit(q0)?;
        self.check_qubit(q1)?;
        if q0 == q1 {
            return Err(StateError::InvalidQubitIndex {
                qubit: q0,
                num_qubits: self.num_qubits,
            });
        }

        let m = m4_f32(matrix);
        let (ql, qh) = if q0 < q1 { (q0, q1) } else { (q1, q0) };
        let p = SyncPtr(buf.as_mut_ptr());

        self.par.run(self.size() / 4, move |_w, t| {
            let base = expand2(t, ql, qh);
            let idx = [
                base,
                base | (1u64 << q0),
                base | (1u64 << q1),
                base | (1u64 << q0) | (1u64 << q1),
            ];

            let mut ar = [0.0f32; 4];
            let mut ai = [0.0f32; 4];
            for s in 0..4 {
                let (re, im) = read(p.get(), idx[s]);
                ar[s] = re;
                ai[s] = im;
            }

            for r in 0..4 {
                let mut nr = 0.0f32;
                let mut ni = 0.0f32;
                for c in 0..4 {
                    let (mr, mi) = m[r * 4 + c];
                    nr += mr * ar[c] - mi * ai[c];
                    ni += mr * ai[c] + mi * ar[c];
                }
                write(p.get(), idx[r], nr, ni);
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::{SequentialLoop, ThreadPoolLoop};
    use approx::assert_relative_eq;

    type Space = WideStateSpace<SequentialLoop>;

    fn space(num_qubits: usize) -> Space {
        Space::new(num_qubits, 1).unwrap()
    }

    const H2: [Complex64; 4] = [
        Complex64::new(std::f64::consts::FRAC_1_SQRT_2, 0.0),
        Complex64::new(std::f64::consts::FRAC_1_SQRT_2, 0.0),
        Complex64::new(std::f64::consts::FRAC_1_SQRT_2, 0.0),
        Complex64::new(-std::f64::consts::FRAC_1_SQRT_2, 0.0),
    ];

    #[test]
    fn test_raw_size_has_block_minimum() {
        assert_eq!(space(0).raw_size(), 16);
        assert_eq!(space(2).raw_size(), 16);
        assert_eq!(space(3).raw_size(), 16);
        assert_eq!(space(4).raw_size(), 32);
    }

    #[test]
    fn test_lane_positions() {
        assert_eq!(pos(0), 0);
        assert_eq!(pos(7), 7);
        assert_eq!(pos(8), 16);
        assert_eq!(pos(13), 21);
    }

    #[test]
    fn test_set_state_zero() {
        let ss = space(4);
        let mut buf = ss.create_buffer().unwrap();
        ss.set_state_zero(&mut buf).unwrap();

        assert_eq!(ss.get_ampl(&buf, 0), Complex64::new(1.0, 0.0));
        for i in 1..ss.size() {
            assert_eq!(ss.get_ampl(&buf, i), Complex64::new(0.0, 0.0));
        }
    }

    #[test]
    fn test_set_state_uniform_small_keeps_tail_zero() {
        let ss = space(1);
        let mut buf = ss.create_buffer().unwrap();
        ss.set_state_uniform(&mut buf).unwrap();

        let v = std::f64::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(ss.get_ampl(&buf, 0).re, v, epsilon = 1e-6);
        assert_relative_eq!(ss.get_ampl(&buf, 1).re, v, epsilon = 1e-6);
        // Lanes past 2^N stay zero.
        for t in 2..8 {
            assert_eq!(buf.as_slice()[t], 0.0);
            assert_eq!(buf.as_slice()[t + 8], 0.0);
        }
    }

    #[test]
    fn test_set_state_uniform_norm() {
        let ss = space(5);
        let mut buf = ss.create_buffer().unwrap();
        ss.set_state_uniform(&mut buf).unwrap();
        assert_relative_eq!(ss.norm(&buf).unwrap(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_set_get_round_trip() {
        let ss = space(4);
        let mut buf = ss.create_buffer().unwrap();
        for i in 0..ss.size() {
            let z = Complex64::new(i as f64, -(i as f64));
            ss.set_ampl(&mut buf, i, z);
        }
        for i in 0..ss.size() {
            assert_eq!(ss.get_ampl(&buf, i), Complex64::new(i as f64, -(i as f64)));
        }
    }

    #[test]
    fn test_layout_round_trip_generic() {
        let ss = space(4);
        let mut buf = ss.create_buffer().unwrap();
        for i in 0..ss.size() {
            ss.set_ampl(&mut buf, i, Complex64::new(i as f64, 0.5 * i as f64));
        }
        let before: Vec<f32> = buf.as_slice().to_vec();

        ss.internal_to_normal(&mut buf).unwrap();
        // Normal order: alternating re/im pairs in basis order.
        assert_eq!(buf.as_slice()[2], 1.0);
        assert_eq!(buf.as_slice()[3], 0.5);

        ss.normal_to_internal(&mut buf).unwrap();
        assert_eq!(buf.as_slice(), before.as_slice());
    }

    #[test]
    fn test_layout_round_trip_small() {
        for n in 1..=2usize {
            let ss = space(n);
            let mut buf = ss.create_buffer().unwrap();
            for i in 0..ss.size() {
                ss.set_ampl(&mut buf, i, Complex64::new(1.0 + i as f64, -(i as f64)));
            }
            let before: Vec<f32> = buf.as_slice().to_vec();

            ss.internal_to_normal(&mut buf).unwrap();
            for i in 0..ss.size() as usize {
                assert_eq!(buf.as_slice()[2 * i], 1.0 + i as f32);
                assert_eq!(buf.as_slice()[2 * i + 1], -(i as f32));
            }

            ss.normal_to_internal(&mut buf).unwrap();
            assert_eq!(buf.as_slice(), before.as_slice());
        }
    }

    #[test]
    fn test_add_and_multiply() {
        let ss = space(4);
        let mut a = ss.create_buffer().unwrap();
        let mut b = ss.create_buffer().unwrap();
        ss.set_state_uniform(&mut a).unwrap();
        ss.set_state_uniform(&mut b).unwrap();

        ss.add_state(&a, &mut b).unwrap();
        ss.multiply(0.5, &mut b).unwrap();

        for i in 0..ss.size() {
            assert_relative_eq!(
                ss.get_ampl(&b, i).re,
                ss.get_ampl(&a, i).re,
                epsilon = 1e-6
            );
        }
    }

    #[test]
    fn test_inner_product_matches_norm() {
        let ss = space(4);
        let mut buf = ss.create_buffer().unwrap();
        ss.set_state_uniform(&mut buf).unwrap();

        let ip = ss.inner_product(&buf, &buf).unwrap();
        assert_relative_eq!(ip.re, 1.0, epsilon = 1e-5);
        assert_relative_eq!(ip.im, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_apply_gate1_low_qubit_hadamard() {
        let ss = space(1);
        let mut buf = ss.create_buffer().unwrap();
        ss.set_state_zero(&mut buf).unwrap();
        ss.apply_gate1(&mut buf, 0, &H2).unwrap();

        let v = std::f64::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(ss.get_ampl(&buf, 0).re, v, epsilon = 1e-6);
        assert_relative_eq!(ss.get_ampl(&buf, 1).re, v, epsilon = 1e-6);
    }

    #[test]
    fn test_apply_gate1_high_qubit_matches_low_semantics() {
        // H on qubit 4 of |0...0>: mass splits between indices 0 and 16.
        let ss = space(5);
        let mut buf = ss.create_buffer().unwrap();
        ss.set_state_zero(&mut buf).unwrap();
        ss.apply_gate1(&mut buf, 4, &H2).unwrap();

        let v = std::f64::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(ss.get_ampl(&buf, 0).re, v, epsilon = 1e-6);
        assert_relative_eq!(ss.get_ampl(&buf, 16).re, v, epsilon = 1e-6);
        assert_relative_eq!(ss.norm(&buf).unwrap(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_apply_gate1_preserves_norm_on_every_qubit() {
        let ss = space(6);
        let mut buf = ss.create_buffer().unwrap();
        ss.set_state_zero(&mut buf).unwrap();

        for q in 0..6 {
            ss.apply_gate1(&mut buf, q, &H2).unwrap();
            assert_relative_eq!(ss.norm(&buf).unwrap(), 1.0, epsilon = 1e-4);
        }
        // Fully mixed: every amplitude 1/8.
        for i in 0..ss.size() {
            assert_relative_eq!(ss.get_ampl(&buf, i).re, 0.125, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_apply_gate2_cnot_across_lane_boundary() {
        let zero = Complex64::new(0.0, 0.0);
        let one = Complex64::new(1.0, 0.0);
        #[rustfmt::skip]
        let cnot = [
            one,  zero, zero, zero,
            zero, zero, zero, one,
            zero, zero, one,  zero,
            zero, one,  zero, zero,
        ];

        // Control qubit 0 (in-lane), target qubit 4 (block stride).
        let ss = space(5);
        let mut buf = ss.create_buffer().unwrap();
        ss.set_all_zeros(&mut buf).unwrap();
        ss.set_ampl(&mut buf, 1, one);

        ss.apply_gate2(&mut buf, 0, 4, &cnot).unwrap();
        assert_eq!(ss.get_ampl(&buf, 1), zero);
        assert_eq!(ss.get_ampl(&buf, 17), one);
    }

    #[test]
    fn test_collapse_and_partial_norms() {
        let ss = space(4);
        let mut buf = ss.create_buffer().unwrap();
        ss.set_state_uniform(&mut buf).unwrap();

        ss.collapse(MeasurementOutcome { mask: 1, bits: 0 }, &mut buf)
            .unwrap();

        for i in 0..ss.size() {
            if i & 1 == 1 {
                assert_eq!(ss.get_ampl(&buf, i), Complex64::new(0.0, 0.0));
            }
        }
        let partials = ss.partial_norms(&buf).unwrap();
        assert_relative_eq!(partials.iter().sum::<f64>(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_sample_deterministic() {
        let ss = space(3);
        let mut buf = ss.create_buffer().unwrap();
        ss.set_state_uniform(&mut buf).unwrap();

        let a = ss.sample(&buf, 50, 3).unwrap();
        let b = ss.sample(&buf, 50, 3).unwrap();
        assert_eq!(a, b);
        assert!(a.iter().all(|&i| i < 8));
    }

    #[test]
    fn test_parallel_loop_agrees_with_sequential() {
        let seq = WideStateSpace::<SequentialLoop>::new(6, 1).unwrap();
        let par = WideStateSpace::<ThreadPoolLoop>::new(6, 4).unwrap();

        let mut a = seq.create_buffer().unwrap();
        let mut b = par.create_buffer().unwrap();
        seq.set_state_zero(&mut a).unwrap();
        par.set_state_zero(&mut b).unwrap();

        for q in 0..6 {
            seq.apply_gate1(&mut a, q, &H2).unwrap();
            par.apply_gate1(&mut b, q, &H2).unwrap();
        }

        for i in 0..seq.size() {
            assert_relative_eq!(
                seq.get_ampl(&a, i).re,
                par.get_ampl(&b, i).re,
                epsilon = 1e-6
            );
        }

        let partials = par.partial_norms(&b).unwrap();
        assert_eq!(partials.len(), 4);
        assert_relative_eq!(partials.iter().sum::<f64>(), 1.0, epsilon = 1e-4);
    }
}
