//! Benchmarks for sine buffer generation.

use std::hint::black_box;

use criterion::Criterion;
use loopback_bench::{config, waveform::sine_samples};

pub fn bench_waveform(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/waveform");

    // The buffer the benchmark uploads once at startup
    group.bench_function("sine_22050", |b| {
        b.iter(|| {
            sine_samples(
                black_box(config::BUFFER_LENGTH),
                black_box(config::SAMPLE_RATE),
                black_box(config::TONE_FREQUENCY),
            )
        })
    });

    group.finish();
}
