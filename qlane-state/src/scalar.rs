//! Portable double-precision reference back-end
//!
//! Lane count 1: a block is a single (re, im) pair, so the internal
//! layout coincides with the normal layout and the order conversions are
//! the identity. Every kernel is a straight loop over basis indices,
//! parallelized through the configured [`ParallelLoop`]. This back-end
//! defines the semantics the wide-lane back-end must reproduce.

use crate::buffer::StateBuffer;
use crate::error::{Result, StateError};
use crate::parallel::{ParallelLoop, SyncPtr};
use crate::statespace::{
    check_size, expand1, expand2, sorted_uniform_draws, MeasurementOutcome, StateSpace,
};
use num_complex::Complex64;

/// Widest state this back-end accepts.
const MAX_QUBITS: usize = 40;

/// f64 state space with lane count 1.
pub struct ScalarStateSpace<P: ParallelLoop> {
    num_qubits: usize,
    raw_size: usize,
    par: P,
}

impl<P: ParallelLoop> ScalarStateSpace<P> {
    #[inline]
    fn read(s: *const f64, i: u64) -> Complex64 {
        unsafe { Complex64::new(*s.add(2 * i as usize), *s.add(2 * i as usize + 1)) }
    }

    #[inline]
    fn write(s: *mut f64, i: u64, z: Complex64) {
        unsafe {
            *s.add(2 * i as usize) = z.re;
            *s.add(2 * i as usize + 1) = z.im;
        }
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
}

impl<P: ParallelLoop> StateSpace for ScalarStateSpace<P> {
    type Fp = f64;

    const LANES: usize = 1;

    fn new(num_qubits: usize, num_workers: usize) -> Result<Self> {
        if num_qubits > MAX_QUBITS {
            return Err(StateError::TooManyQubits {
                num_qubits,
                max: MAX_QUBITS,
            });
        }
        Ok(Self {
            num_qubits,
            raw_size: 2usize << num_qubits,
            par: P::with_workers(num_workers),
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

    fn create_buffer(&self) -> Result<StateBuffer<f64>> {
        StateBuffer::zeroed(self.raw_size)
    }

    fn set_all_zeros(&self, buf: &mut StateBuffer<f64>) -> Result<()> {
        check_size(self.raw_size, buf.len())?;
        let p = SyncPtr(buf.as_mut_ptr());
        self.par.run(self.size(), move |_w, i| {
            Self::write(p.get(), i, Complex64::new(0.0, 0.0));
        });
        Ok(())
    }

    fn set_state_zero(&self, buf: &mut StateBuffer<f64>) -> Result<()> {
        self.set_all_zeros(buf)?;
        buf.as_mut_slice()[0] = 1.0;
        Ok(())
    }

    fn set_state_uniform(&self, buf: &mut StateBuffer<f64>) -> Result<()> {
        check_size(self.raw_size, buf.len())?;
        let v = 1.0 / (self.size() as f64).sqrt();
        let p = SyncPtr(buf.as_mut_ptr());
        self.par.run(self.size(), move |_w, i| {
            Self::write(p.get(), i, Complex64::new(v, 0.0));
        });
        Ok(())
    }

    fn get_ampl(&self, buf: &StateBuffer<f64>, i: u64) -> Complex64 {
        debug_assert!(i < self.size());
        Self::read(buf.as_ptr(), i)
    }

    fn set_ampl(&self, buf: &mut StateBuffer<f64>, i: u64, ampl: Complex64) {
        debug_assert!(i < self.size());
        Self::write(buf.as_mut_ptr(), i, ampl);
    }

    fn add_state(&self, src: &StateBuffer<f64>, dst: &mut StateBuffer<f64>) -> Result<()> {
        check_size(self.raw_size, src.len())?;
        check_size(self.raw_size, dst.len())?;
        let s = SyncPtr(src.as_ptr() as *mut f64);
        let d = SyncPtr(dst.as_mut_ptr());
        self.par.run(self.size(), move |_w, i| {
            let sum = Self::read(s.get(), i) + Self::read(d.get(), i);
            Self::write(d.get(), i, sum);
        });
        Ok(())
    }

    fn multiply(&self, a: f64, buf: &mut StateBuffer<f64>) -> Result<()> {
        check_size(self.raw_size, buf.len())?;
        let p = SyncPtr(buf.as_mut_ptr());
        self.par.run(self.size(), move |_w, i| {
            Self::write(p.get(), i, Self::read(p.get(), i) * a);
        });
        Ok(())
    }

    fn inner_product(
        &self,
        a: &StateBuffer<f64>,
        b: &StateBuffer<f64>,
    ) -> Result<Complex64> {
        check_size(self.raw_size, a.len())?;
        check_size(self.raw_size, b.len())?;
        let pa = SyncPtr(a.as_ptr() as *mut f64);
        let pb = SyncPtr(b.as_ptr() as *mut f64);
        Ok(self.par.run_reduce(
            self.size(),
            move |_w, i| Self::read(pa.get(), i).conj() * Self::read(pb.get(), i),
            |x, y| x + y,
        ))
    }

    fn real_inner_product(
        &self,
        a: &StateBuffer<f64>,
        b: &StateBuffer<f64>,
    ) -> Result<f64> {
        check_size(self.raw_size, a.len())?;
        check_size(self.raw_size, b.len())?;
        let pa = SyncPtr(a.as_ptr() as *mut f64);
        let pb = SyncPtr(b.as_ptr() as *mut f64);
        Ok(self.par.run_reduce(
            self.size(),
            move |_w, i| {
                let x = Self::read(pa.get(), i);
                let y = Self::read(pb.get(), i);
                x.re * y.re + x.im * y.im
            },
            |x, y| x + y,
        ))
    }

    fn partial_norms(&self, buf: &StateBuffer<f64>) -> Result<Vec<f64>> {
        check_size(self.raw_size, buf.len())?;
        let p = SyncPtr(buf.as_ptr() as *mut f64);
        Ok(self.par.run_reduce_partials(
            self.size(),
            move |_w, i| Self::read(p.get(), i).norm_sqr(),
            |x, y| x + y,
        ))
    }

    fn sample(
        &self,
        buf: &StateBuffer<f64>,
        num_samples: usize,
        seed: u64,
    ) -> Result<Vec<u64>> {
        check_size(self.raw_size, buf.len())?;
        if num_samples == 0 {
            return Ok(Vec::new());
        }

        let s = buf.as_ptr();
        let mut norm = 0.0;
        for i in 0..self.size() {
            norm += Self::read(s, i).norm_sqr();
        }

        let draws = sorted_uniform_draws(num_samples, seed, norm);

        let mut samples = Vec::with_capacity(num_samples);
        let mut m = 0usize;
        let mut csum = 0.0;
        for i in 0..self.size() {
            csum += Self::read(s, i).norm_sqr();
            while m < num_samples && draws[m] < csum {
                samples.push(i);
                m += 1;
            }
        }

        Ok(samples)
    }

    fn find_measured_bits(
        &self,
        worker: usize,
        r: f64,
        mask: u64,
        buf: &StateBuffer<f64>,
    ) -> Option<u64> {
        if buf.len() != self.raw_size {
            return None;
        }

        let n = self.size();
        let i0 = self.par.index0(n, worker);
        let i1 = self.par.index1(n, worker);

        let s = buf.as_ptr();
        let mut csum = 0.0;
        for i in i0..i1 {
            csum += Self::read(s, i).norm_sqr();
            if r < csum {
                return Some(i & mask);
            }
        }
        None
    }

    fn collapse(
        &self,
        outcome: MeasurementOutcome,
        buf: &mut StateBuffer<f64>,
    ) -> Result<()> {
        check_size(self.raw_size, buf.len())?;

        let p = SyncPtr(buf.as_mut_ptr());
        let MeasurementOutcome { mask, bits } = outcome;

        let surviving: f64 = self.par.run_reduce(
            self.size(),
            move |_w, i| {
                if i & mask == bits {
                    Self::read(p.get(), i).norm_sqr()
                } else {
                    0.0
                }
            },
            |x, y| x + y,
        );
        if surviving <= 0.0 {
            return Err(StateError::ZeroMass);
        }

        let renorm = 1.0 / surviving.sqrt();
        self.par.run(self.size(), move |_w, i| {
            let z = if i & mask == bits {
                Self::read(p.get(), i) * renorm
            } else {
                Complex64::new(0.0, 0.0)
            };
            Self::write(p.get(), i, z);
        });
        Ok(())
    }

    fn internal_to_normal(&self, buf: &mut StateBuffer<f64>) -> Result<()> {
        // Lane count 1: the layouts coincide.
        check_size(self.raw_size, buf.len())
    }

    fn normal_to_internal(&self, buf: &mut StateBuffer<f64>) -> Result<()> {
        check_size(self.raw_size, buf.len())
    }

    fn apply_gate1(
        &self,
        buf: &mut StateBuffer<f64>,
        q: u32,
        matrix: &[Complex64; 4],
    ) -> Result<()> {
        check_size(self.raw_size, buf.len())?;
        self.check_qubit(q)?;

        let m = *matrix;
        let p = SyncPtr(buf.as_mut_ptr());
        self.par.run(self.size() / 2, move |_w, t| {
            let i = expand1(t, q);
            let j = i | (1u64 << q);

            let a0 = Self::read(p.get(), i);
            let a1 = Self::read(p.get(), j);

            Self::write(p.get(), i, m[0] * a0 + m[1] * a1);
            Self::write(p.get(), j, m[2] * a0 + m[3] * a1);
        });
        Ok(())
    }

    fn apply_gate2(
        &self,
        buf: &mut StateBuffer<f64>,
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

        let m = *matrix;
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

            let a: [Complex64; 4] = [
                Self::read(p.get(), idx[0]),
                Self::read(p.get(), idx[1]),
                Self::read(p.get(), idx[2]),
                Self::read(p.get(), idx[3]),
            ];

            for (r, &out) in idx.iter().enumerate() {
                let z = m[r * 4] * a[0]
                    + m[r * 4 + 1] * a[1]
                    + m[r * 4 + 2] * a[2]
                    + m[r * 4 + 3] * a[3];
                Self::write(p.get(), out, z);
            }
        });
        Ok(())
    }
}
