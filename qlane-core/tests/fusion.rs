//! Fusion-plan properties over whole circuits

use qlane_core::{matrices, BasicFuser, FusedGate, Gate, GateKind, SilentIo};

fn h(time: u32, q: u32) -> Gate {
    Gate::unitary1(time, q, matrices::HADAMARD)
}

fn x(time: u32, q: u32) -> Gate {
    Gate::unitary1(time, q, matrices::PAULI_X)
}

fn cnot(time: u32, q0: u32, q1: u32) -> Gate {
    Gate::unitary2(time, q0, q1, matrices::CNOT).unwrap()
}

fn measure(time: u32, qubits: &[u32]) -> Gate {
    Gate::measurement(time, qubits).unwrap()
}

/// Every unitary input gate lands in exactly one fused gate's members.
fn assert_partition(gates: &[Gate], fused: &[FusedGate]) {
    let mut seen = vec![0usize; gates.len()];
    for f in fused {
        for &m in &f.members {
            seen[m] += 1;
        }
    }
    for (i, gate) in gates.iter().enumerate() {
        if gate.kind == GateKind::Unitary {
            assert_eq!(seen[i], 1, "gate {i} referenced {} times", seen[i]);
        }
    }
}

#[test]
fn mid_circuit_measurement_splits_plan() {
    // H q0, measure q0, X q1: one fused H, one fused measurement, and the
    // X is orphaned into its own fused gate in the next window.
    let gates = vec![h(0, 0), measure(1, &[0]), x(2, 1)];
    let fused = BasicFuser::fuse(2, &gates, &SilentIo).unwrap();

    assert_eq!(fused.len(), 3);

    assert_eq!(fused[0].kind, GateKind::Unitary);
    assert_eq!(fused[0].members, vec![0]);
    assert_eq!(fused[0].qubits.as_slice(), &[0]);

    assert_eq!(fused[1].kind, GateKind::Measurement);
    assert_eq!(fused[1].qubits.as_slice(), &[0]);
    assert!(fused[1].members.is_empty());

    assert_eq!(fused[2].kind, GateKind::Unitary);
    assert_eq!(fused[2].members, vec![2]);
    assert_eq!(fused[2].qubits.as_slice(), &[1]);
}

#[test]
fn measurements_at_equal_times_merge_qubit_sets() {
    let gates = vec![h(0, 0), measure(1, &[0]), measure(1, &[2, 1])];
    let fused = BasicFuser::fuse(3, &gates, &SilentIo).unwrap();

    let mea: Vec<_> = fused
        .iter()
        .filter(|f| f.kind == GateKind::Measurement)
        .collect();
    assert_eq!(mea.len(), 1);
    assert_eq!(mea[0].qubits.as_slice(), &[0, 2, 1]);
    assert_eq!(mea[0].num_qubits(), 3);
}

#[test]
fn fused_members_keep_input_order_per_qubit() {
    let gates = vec![
        x(0, 0),
        h(1, 1),
        x(2, 1),
        cnot(3, 0, 1),
        h(4, 0),
        x(4, 1),
    ];
    let fused = BasicFuser::fuse(2, &gates, &SilentIo).unwrap();

    assert_eq!(fused.len(), 1);
    // Members from qubit 0's wire come before qubit 1's at the same
    // cursor step; trailing gates keep time order per wire.
    assert_eq!(fused[0].members, vec![0, 1, 2, 3, 4, 5]);
    assert_partition(&gates, &fused);
}

#[test]
fn no_fused_gate_straddles_a_split_time() {
    let gates = vec![x(0, 0), x(1, 0), x(2, 0), x(3, 0)];
    let fused = BasicFuser::fuse_with_splits(1, &gates, &[1], &SilentIo).unwrap();

    assert_eq!(fused.len(), 2);
    assert_eq!(fused[0].members, vec![0, 1]);
    assert_eq!(fused[1].members, vec![2, 3]);

    for f in &fused {
        let times: Vec<u32> = f.members.iter().map(|&m| gates[m].time).collect();
        assert!(times.iter().all(|&t| t <= 1) || times.iter().all(|&t| t > 1));
    }
    assert_partition(&gates, &fused);
}

#[test]
fn two_qubit_anchors_on_disjoint_pairs_stay_separate() {
    let gates = vec![cnot(0, 0, 1), cnot(1, 1, 2), h(2, 0)];
    let fused = BasicFuser::fuse(3, &gates, &SilentIo).unwrap();

    assert_eq!(fused.len(), 2);
    assert_eq!(fused[0].anchor, 0);
    assert_eq!(fused[1].anchor, 1);
    // The trailing H on qubit 0 is free to join the first anchor's wire.
    assert_eq!(fused[0].members, vec![0, 2]);
    assert_eq!(fused[1].members, vec![1]);
    assert_partition(&gates, &fused);
}

#[test]
fn orphans_fuse_greedily_to_the_window_end() {
    let gates = vec![h(0, 1), x(1, 1), h(2, 1)];
    let fused = BasicFuser::fuse(2, &gates, &SilentIo).unwrap();

    assert_eq!(fused.len(), 1);
    assert_eq!(fused[0].anchor, 0);
    assert_eq!(fused[0].members, vec![0, 1, 2]);
    assert_eq!(fused[0].qubits.as_slice(), &[1]);
}

#[test]
fn out_of_order_input_produces_no_plan() {
    let gates = vec![h(0, 0), h(2, 0), h(1, 0)];
    assert!(BasicFuser::fuse(1, &gates, &SilentIo).is_err());
}

#[test]
fn equal_times_are_accepted() {
    let gates = vec![h(0, 0), h(0, 1), cnot(0, 0, 1)];
    let fused = BasicFuser::fuse(2, &gates, &SilentIo).unwrap();

    assert_eq!(fused.len(), 1);
    assert_eq!(fused[0].members, vec![0, 1, 2]);
}
