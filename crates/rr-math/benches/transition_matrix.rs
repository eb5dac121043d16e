//! Criterion benchmarks for `rr-math`.
//!
//! The transition-matrix builder is the only kernel that scales with the
//! full state space, so it gets its own group.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rr_math::{create_transition_matrix, estimate_from_counts};

fn bench_transition_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("transition_matrix");

    // Increment supports seen in practice: 3 bins (classic panel) up to 6.
    let probs_3 = [0.39, 0.60, 0.01];
    let probs_6 = [0.10, 0.30, 0.25, 0.20, 0.10, 0.05];

    for num_states in [90usize, 175, 400, 1000] {
        group.bench_with_input(
            BenchmarkId::new("support_3", num_states),
            &num_states,
            |b, &n| {
                b.iter(|| black_box(create_transition_matrix(black_box(n), black_box(&probs_3))));
            },
        );

        group.bench_with_input(
            BenchmarkId::new("support_6", num_states),
            &num_states,
            |b, &n| {
                b.iter(|| black_box(create_transition_matrix(black_box(n), black_box(&probs_6))));
            },
        );
    }

    group.finish();
}

fn bench_estimate(c: &mut Criterion) {
    let counts = [1_682u64, 2_860, 51];
    c.bench_function("estimate_from_counts", |b| {
        b.iter(|| black_box(estimate_from_counts(black_box(&counts))));
    });
}

criterion_group!(benches, bench_transition_matrix, bench_estimate);
criterion_main!(benches);
