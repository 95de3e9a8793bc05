//! Greedy gate-fusion planner
//!
//! Groups a time-ordered gate stream into fused gates acting on at most
//! two qubits each. Two-qubit gates and unfusible single-qubit gates
//! anchor fused gates; fusible single-qubit neighbors on the anchor's
//! qubits are absorbed greedily in both time directions. Measurements and
//! caller-supplied split times bound fusion windows: no fused gate
//! straddles a window boundary.

use std::collections::BTreeMap;

use crate::error::{CoreError, Result};
use crate::fused::FusedGate;
use crate::gate::{Gate, GateKind};
use crate::io::Io;
use smallvec::SmallVec;

/// Gate-fusion planner over a time-ordered gate slice.
pub struct BasicFuser;

impl BasicFuser {
    /// Fuse an entire gate sequence with no extra split times.
    pub fn fuse(num_qubits: usize, gates: &[Gate], io: &dyn Io) -> Result<Vec<FusedGate>> {
        Self::fuse_with_splits(num_qubits, gates, &[], io)
    }

    /// Fuse a gate sequence, additionally splitting at the given times.
    ///
    /// `times_to_split_at` must be ordered. Each element of the output
    /// holds gates from a single window; a window covers the half-open
    /// time interval up to and including its split time.
    ///
    /// # Errors
    /// Fails without partial output when gate times are out of order or a
    /// non-measurement gate acts on more than two qubits. The error is
    /// also reported through `io`.
    pub fn fuse_with_splits(
        num_qubits: usize,
        gates: &[Gate],
        times_to_split_at: &[u32],
        io: &dyn Io,
    ) -> Result<Vec<FusedGate>> {
        if gates.is_empty() {
            return Ok(Vec::new());
        }

        for gate in gates {
            if gate.kind != GateKind::Measurement && gate.num_qubits() > 2 {
                io.error(&format!(
                    "only one- and two-qubit gates can be fused; gate at time {} has {} qubits",
                    gate.time,
                    gate.num_qubits()
                ));
                return Err(CoreError::UnsupportedGate {
                    time: gate.time,
                    num_qubits: gate.num_qubits(),
                });
            }
        }

        let times = merge_with_measurement_times(gates, times_to_split_at);

        let mut fused: Vec<FusedGate> = Vec::with_capacity(gates.len());

        // Measurement gates grouped by time.
        let mut measurement_gates: BTreeMap<u32, Vec<usize>> = BTreeMap::new();

        // Sequence of top-level gates the other gates get fused to.
        let mut seq: Vec<usize> = Vec::new();

        // Lattice of gates: per-qubit lists in time order.
        let mut lat: Vec<Vec<usize>> = vec![Vec::new(); num_qubits];

        // Next unfused gate.
        let mut gi = 0usize;

        for &t_split in &times {
            seq.clear();
            for wires in lat.iter_mut() {
                wires.clear();
            }

            let mut prev_time = gates[gi].time;

            // Fill seq and lat for this window.
            while gi < gates.len() {
                let gate = &gates[gi];
                if gate.time > t_split {
                    break;
                }

                if gate.time < prev_time {
                    io.error("gate times should be ordered");
                    return Err(CoreError::UnorderedGateTimes {
                        time: gate.time,
                        prev: prev_time,
                    });
                }
                prev_time = gate.time;

                match gate.kind {
                    GateKind::Measurement => {
                        let at_time = measurement_gates.entry(gate.time).or_default();
                        if at_time.is_empty() {
                            seq.push(gi);
                        }
                        at_time.push(gi);
                    }
                    GateKind::Unitary => {
                        if gate.num_qubits() == 1 {
                            lat[gate.qubits[0] as usize].push(gi);
                            if gate.unfusible {
                                seq.push(gi);
                            }
                        } else {
                            lat[gate.qubits[0] as usize].push(gi);
                            lat[gate.qubits[1] as usize].push(gi);
                            seq.push(gi);
                        }
                    }
                }

                gi += 1;
            }

            let mut last = vec![0usize; num_qubits];
            let mut delayed_measurement: Option<usize> = None;

            // Resolve anchors and absorb fusible neighbors.
            for &ai in &seq {
                let anchor = &gates[ai];

                match anchor.kind {
                    GateKind::Measurement => {
                        delayed_measurement = Some(ai);
                    }
                    GateKind::Unitary if anchor.num_qubits() == 1 => {
                        let q0 = anchor.qubits[0] as usize;

                        let mut members = Vec::new();
                        last[q0] = advance(gates, &lat[q0], last[q0], &mut members);
                        members.push(lat[q0][last[q0]]);
                        last[q0] = advance(gates, &lat[q0], last[q0] + 1, &mut members);

                        fused.push(FusedGate {
                            kind: anchor.kind,
                            time: anchor.time,
                            qubits: anchor.qubits.clone(),
                            anchor: ai,
                            members,
                        });
                    }
                    GateKind::Unitary => {
                        let q0 = anchor.qubits[0] as usize;
                        let q1 = anchor.qubits[1] as usize;

                        // Already consumed through an earlier anchor's chain.
                        if done(gates, &lat[q0], last[q0], anchor.time) {
                            continue;
                        }

                        let mut members = Vec::new();
                        loop {
                            last[q0] = advance(gates, &lat[q0], last[q0], &mut members);
                            last[q1] = advance(gates, &lat[q1], last[q1], &mut members);
                            // Both heads now point at the same shared
                            // two-qubit gate.
                            members.push(lat[q0][last[q0]]);

                            last[q0] = advance(gates, &lat[q0], last[q0] + 1, &mut members);
                            last[q1] = advance(gates, &lat[q1], last[q1] + 1, &mut members);

                            if !next_shared(&lat[q0], last[q0], &lat[q1], last[q1]) {
                                break;
                            }
                        }

                        fused.push(FusedGate {
                            kind: anchor.kind,
                            time: anchor.time,
                            qubits: anchor.qubits.clone(),
                            anchor: ai,
                            members,
                        });
                    }
                }
            }

            // Qubits with leftover single-qubit gates and no anchor.
            for q in 0..num_qubits {
                let l = last[q];
                if l == lat[q].len() {
                    continue;
                }

                let first = lat[q][l];
                let mut members = vec![first];
                let end = advance(gates, &lat[q], l + 1, &mut members);
                debug_assert_eq!(end, lat[q].len());

                fused.push(FusedGate {
                    kind: gates[first].kind,
                    time: gates[first].time,
                    qubits: gates[first].qubits.clone(),
                    anchor: first,
                    members,
                });
            }

            if let Some(mi) = delayed_measurement {
                let at_time = &measurement_gates[&gates[mi].time];

                let mut qubits: SmallVec<[u32; 2]> = SmallVec::new();
                for &gj in at_time {
                    qubits.extend_from_slice(&gates[gj].qubits);
                }

                fused.push(FusedGate {
                    kind: GateKind::Measurement,
                    time: gates[mi].time,
                    qubits,
                    anchor: mi,
                    members: Vec::new(),
                });
            }

            if gi == gates.len() {
                break;
            }
        }

        Ok(fused)
    }
}

/// Union of measurement times and caller split times, in arrival order,
/// with the last gate's time appended when it lies past the final split.
fn merge_with_measurement_times(gates: &[Gate], times: &[u32]) -> Vec<u32> {
    let mut merged = Vec::with_capacity(gates.len() + times.len());
    let mut cursor = 0usize;

    for gate in gates {
        if gate.kind == GateKind::Measurement
            && merged.last().map_or(true, |&t| t < gate.time)
        {
            merged.push(gate.time);
        }

        if cursor < times.len() && gate.time > times[cursor] {
            while cursor < times.len() && times[cursor] <= gate.time {
                let prev = times[cursor];
                cursor += 1;
                merged.push(prev);
                while cursor < times.len() && times[cursor] <= prev {
                    cursor += 1;
                }
            }
        }
    }

    let last_time = gates.last().map(|g| g.time).unwrap_or(0);
    if merged.last().map_or(true, |&t| t < last_time) {
        merged.push(last_time);
    }

    merged
}

/// Absorb fusible single-qubit gates from `wire` starting at `k`,
/// returning the first index that cannot be absorbed.
fn advance(gates: &[Gate], wire: &[usize], mut k: usize, members: &mut Vec<usize>) -> usize {
    while k < wire.len() {
        let gate = &gates[wire[k]];
        if gate.num_qubits() != 1 || gate.unfusible {
            break;
        }
        members.push(wire[k]);
        k += 1;
    }
    k
}

/// True when the cursor has passed every gate up to time `t` on `wire`.
fn done(gates: &[Gate], wire: &[usize], k: usize, t: u32) -> bool {
    k >= wire.len() || gates[wire[k]].time > t
}

/// True when both wires' heads point at the same shared two-qubit gate.
fn next_shared(wire0: &[usize], k0: usize, wire1: &[usize], k1: usize) -> bool {
    k0 < wire0.len() && k1 < wire1.len() && wire0[k0] == wire1[k1]
}
