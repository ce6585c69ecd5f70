//! Benchmark suite for phonics-algo
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use phonics_algo::{match_pronunciation, update_schedule, Quality, ScheduleState};

fn bench_update_schedule(c: &mut Criterion) {
    let state = ScheduleState {
        ease_factor: 2.3,
        interval_days: 12,
        repetitions: 4,
    };
    c.bench_function("sm2::update_schedule", |b| {
        b.iter(|| update_schedule(black_box(Some(&state)), black_box(Quality::new(4))))
    });
}

fn bench_match_pronunciation(c: &mut Criterion) {
    c.bench_function("matcher::match_pronunciation", |b| {
        b.iter(|| match_pronunciation(black_box("the cat saat on the mat"), black_box("the cat sat on the mat")))
    });
}

criterion_group!(benches, bench_update_schedule, bench_match_pronunciation);
criterion_main!(benches);
