//! End-to-end circuit throughput

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use qlane_core::{matrices, Circuit, Gate, SilentIo};
use qlane_sim::{RunParams, Runner};
use qlane_state::{SequentialLoop, ThreadPoolLoop, WideStateSpace};

/// Layered circuit: a Hadamard wall, then nearest-neighbor CNOT ladders.
fn layered_circuit(num_qubits: usize, depth: u32) -> Circuit {
    let mut circuit = Circuit::new(num_qubits);
    for q in 0..num_qubits {
        circuit
            .add_gate(Gate::unitary1(0, q as u32, matrices::HADAMARD))
            .unwrap();
    }
    for layer in 1..=depth {
        for q in (0..num_qubits - 1).step_by(2) {
            circuit
                .add_gate(Gate::unitary2(layer, q as u32, q as u32 + 1, matrices::CNOT).unwrap())
                .unwrap();
        }
        for q in 0..num_qubits {
            circuit
                .add_gate(Gate::unitary1(layer, q as u32, matrices::rx(0.3)))
                .unwrap();
        }
    }
    circuit
}

fn bench_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_circuit");
    group.sample_size(20);

    for num_qubits in [14usize, 18] {
        let circuit = layered_circuit(num_qubits, 8);

        group.bench_with_input(
            BenchmarkId::new("wide/seq", num_qubits),
            &circuit,
            |b, circuit| {
                b.iter(|| {
                    Runner::<WideStateSpace<SequentialLoop>>::run_to_end(
                        &RunParams::default(),
                        circuit,
                        &SilentIo,
                        |_| {},
                    )
                    .unwrap()
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("wide/pool4", num_qubits),
            &circuit,
            |b, circuit| {
                b.iter(|| {
                    Runner::<WideStateSpace<ThreadPoolLoop>>::run_to_end(
                        &RunParams::new().with_workers(4),
                        circuit,
                        &SilentIo,
                        |_| {},
                    )
                    .unwrap()
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_run);
criterion_main!(benches);
