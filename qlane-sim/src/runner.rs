//! Circuit orchestration: fuse, apply, measure
//!
//! The runner owns the glue between the fusion planner, the simulator,
//! and the state-space measurement kernels. It builds the state, fuses
//! the circuit against the requested measurement windows, applies fused
//! gates in program order, and hands measurement events to the caller's
//! callback.

use std::marker::PhantomData;
use std::time::Instant;

use crate::config::RunParams;
use crate::error::Result;
use crate::simulator::Simulator;
use qlane_core::{BasicFuser, Circuit, GateKind, Io};
use qlane_state::{StateBuffer, StateSpace};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Measurement notifications delivered during a run.
pub enum MeasureEvent<'a, S: StateSpace> {
    /// A requested measurement window closed: all gates at or before the
    /// window's split time have been applied.
    Window {
        index: usize,
        space: &'a S,
        buf: &'a mut StateBuffer<S::Fp>,
    },
    /// A mid-circuit measurement gate collapsed the state.
    Outcome {
        time: u32,
        qubits: &'a [u32],
        bits: u64,
    },
}

/// Drives a circuit through a state-space back-end.
pub struct Runner<S: StateSpace> {
    _space: PhantomData<S>,
}

impl<S: StateSpace> Runner<S> {
    /// Run `circuit` from |0...0>, invoking `measure` once per entry of
    /// `times_to_measure_at` and once per mid-circuit measurement gate.
    ///
    /// # Errors
    /// Aborts on the first failure: allocation, fusion, kernel, or
    /// zero-mass collapse. The error is also reported through `io`.
    pub fn run<F>(
        params: &RunParams,
        times_to_measure_at: &[u32],
        circuit: &Circuit,
        io: &dyn Io,
        mut measure: F,
    ) -> Result<()>
    where
        F: FnMut(MeasureEvent<'_, S>),
    {
        let t0 = Instant::now();

        let space = S::new(circuit.num_qubits, params.num_workers)?;
        let mut buf = match space.create_buffer() {
            Ok(buf) => buf,
            Err(err) => {
                io.error("not enough memory: is the number of qubits too large?");
                return Err(err.into());
            }
        };
        space.set_state_zero(&mut buf)?;

        let fused = BasicFuser::fuse_with_splits(
            circuit.num_qubits,
            &circuit.gates,
            times_to_measure_at,
            io,
        )?;

        let sim = Simulator::new(&space);
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut cur = 0usize;

        for (i, f) in fused.iter().enumerate() {
            let t1 = Instant::now();

            match f.kind {
                GateKind::Unitary => sim.apply_fused(f, &circuit.gates, &mut buf)?,
                GateKind::Measurement => {
                    let outcome = space.measure(&f.qubits, &mut rng, &mut buf)?;
                    measure(MeasureEvent::Outcome {
                        time: f.time,
                        qubits: &f.qubits,
                        bits: outcome.bits,
                    });
                }
            }

            if params.verbosity > 1 {
                io.message(&format!("gate {} done in {:.2?}", i, t1.elapsed()));
            }

            if cur < times_to_measure_at.len() {
                let t = times_to_measure_at[cur];
                if i == fused.len() - 1 || fused[i + 1].time > t {
                    measure(MeasureEvent::Window {
                        index: cur,
                        space: &space,
                        buf: &mut buf,
                    });
                    cur += 1;
                }
            }
        }

        if params.verbosity > 0 {
            io.message(&format!("time elapsed {:.2?}", t0.elapsed()));
        }

        Ok(())
    }

    /// Run with a single measurement window at the circuit's last gate
    /// time.
    pub fn run_to_end<F>(
        params: &RunParams,
        circuit: &Circuit,
        io: &dyn Io,
        measure: F,
    ) -> Result<()>
    where
        F: FnMut(MeasureEvent<'_, S>),
    {
        let maxtime = circuit.max_time().unwrap_or(0);
        Self::run(params, &[maxtime], circuit, io, measure)
    }

    /// Advance a caller-provided state through `circuit`, applying only
    /// gates with `time <= maxtime`. No window callbacks are emitted;
    /// mid-circuit measurements still collapse the state.
    ///
    /// `buf` holds the initial state on entry and the final state on a
    /// successful return.
    pub fn run_to_time(
        params: &RunParams,
        maxtime: u32,
        circuit: &Circuit,
        io: &dyn Io,
        buf: &mut StateBuffer<S::Fp>,
    ) -> Result<()> {
        let t0 = Instant::now();

        let space = S::new(circuit.num_qubits, params.num_workers)?;

        let end = circuit.gates.partition_point(|g| g.time <= maxtime);
        let fused = BasicFuser::fuse_with_splits(
            circuit.num_qubits,
            &circuit.gates[..end],
            &[maxtime],
            io,
        )?;

        let sim = Simulator::new(&space);
        let mut rng = StdRng::seed_from_u64(params.seed);

        for (i, f) in fused.iter().enumerate() {
            let t1 = Instant::now();

            match f.kind {
                GateKind::Unitary => sim.apply_fused(f, &circuit.gates, buf)?,
                GateKind::Measurement => {
                    space.measure(&f.qubits, &mut rng, buf)?;
                }
            }

            if params.verbosity > 1 {
                io.message(&format!("gate {} done in {:.2?}", i, t1.elapsed()));
            }
        }

        if params.verbosity > 0 {
            io.message(&format!("time elapsed {:.2?}", t0.elapsed()));
        }

        Ok(())
    }
}
