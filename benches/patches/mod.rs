//! Benchmarks for built-in patches called directly on a block.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_proto::{
    patches::{FactorialRouter, Gain, Rainbow, Sandbox, Vco},
    processor::Processor,
    Block, DispatchConfig,
};

use crate::BLOCK_SIZES;

pub fn bench_patches(c: &mut Criterion) {
    let mut group = c.benchmark_group("patches");

    for &size in BLOCK_SIZES {
        let config = DispatchConfig::default().with_buffer_size(size);
        let mut block = Block::new(&config, 48_000.0);

        let mut gain = Gain::new();
        group.bench_with_input(BenchmarkId::new("gain", size), &size, |b, _| {
            b.iter(|| gain.process(black_box(&mut block)))
        });

        // Sine per sample - uses sin() transcendental function
        let mut vco = Vco::new();
        group.bench_with_input(BenchmarkId::new("vco", size), &size, |b, _| {
            b.iter(|| vco.process(black_box(&mut block)))
        });

        let mut router = FactorialRouter::new();
        group.bench_with_input(BenchmarkId::new("factorial_router", size), &size, |b, _| {
            b.iter(|| router.process(black_box(&mut block)))
        });
    }

    // Control-rate patches only ever see one sample
    let mut block = Block::new(&DispatchConfig::default(), 48_000.0);
    let mut rainbow = Rainbow::new();
    group.bench_function("rainbow", |b| {
        b.iter(|| rainbow.process(black_box(&mut block)))
    });
    let mut sandbox = Sandbox::new();
    group.bench_function("sandbox", |b| {
        b.iter(|| sandbox.process(black_box(&mut block)))
    });

    group.finish();
}
