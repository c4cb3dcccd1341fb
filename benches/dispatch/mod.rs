//! Benchmarks for the dispatcher tick loop.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_proto::{
    diagnostics::{self, Diagnostics},
    patches::{FactorialRouter, Gain, Vco},
    processor::Processor,
    DispatchConfig, Dispatcher, Frame, NUM_CHANNELS,
};

use crate::BLOCK_SIZES;

fn dispatcher_with<P: Processor + 'static>(processor: P) -> (Dispatcher, Diagnostics) {
    // Large enough that display text never fills it between drains
    let (tx, rx) = diagnostics::channel(4096);
    let mut dispatcher = Dispatcher::new(48_000.0, tx);
    dispatcher
        .load(processor)
        .expect("built-in patch config is valid");
    (dispatcher, rx)
}

pub fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch/tick");

    for &size in BLOCK_SIZES {
        let inputs: Vec<Frame> = (0..size)
            .map(|n| [(n as f32 * 0.01).sin(); NUM_CHANNELS])
            .collect();
        let mut outputs = vec![[0.0; NUM_CHANNELS]; size];

        // Per-sample callback: worst case call overhead
        let (mut d, mut rx) = dispatcher_with(Gain::new());
        group.bench_with_input(BenchmarkId::new("gain_n1", size), &size, |b, _| {
            b.iter(|| {
                d.process_frames(black_box(&inputs), black_box(&mut outputs));
                rx.drain_logged();
            })
        });

        // Buffered audio-rate callback
        let (mut d, mut rx) = dispatcher_with(Vco::new());
        group.bench_with_input(BenchmarkId::new("vco_n16", size), &size, |b, _| {
            b.iter(|| {
                d.process_frames(black_box(&inputs), black_box(&mut outputs));
                rx.drain_logged();
            })
        });

        // Buffered routing with per-call display text
        let (mut d, mut rx) = dispatcher_with(FactorialRouter::new());
        group.bench_with_input(BenchmarkId::new("router_n16", size), &size, |b, _| {
            b.iter(|| {
                d.process_frames(black_box(&inputs), black_box(&mut outputs));
                rx.drain_logged();
            })
        });
    }

    group.finish();
}

pub fn bench_divider(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch/divider");
    let size = 256;
    let inputs = vec![[0.5; NUM_CHANNELS]; size];
    let mut outputs = vec![[0.0; NUM_CHANNELS]; size];

    for divider in [1, 4, 32, 256] {
        let config = DispatchConfig::default().with_frame_divider(divider);
        let (mut d, mut rx) = dispatcher_with(Gain::new());
        d.configure(config).expect("valid divider");

        group.bench_with_input(BenchmarkId::new("gain", divider), &divider, |b, _| {
            b.iter(|| {
                d.process_frames(black_box(&inputs), black_box(&mut outputs));
                rx.drain_logged();
            })
        });
    }

    group.finish();
}
