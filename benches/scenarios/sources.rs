//! Render cost against source count, with and without HRTF.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use loopback_bench::{backend::OpenAl, BenchConfig, Session};

use crate::BLOCK_SIZES;

const SOURCE_COUNTS: &[usize] = &[1, 16, 64, 150];

pub fn bench_sources(c: &mut Criterion) {
    let mut backend = match OpenAl::load() {
        Ok(backend) => backend,
        Err(err) => {
            eprintln!("skipping scenarios/sources: {err}");
            return;
        }
    };
    let mut group = c.benchmark_group("scenarios/sources");

    for hrtf in [false, true] {
        let label = if hrtf { "hrtf" } else { "panned" };

        for &count in SOURCE_COUNTS {
            for &size in BLOCK_SIZES {
                let config = BenchConfig {
                    block_size: size,
                    num_sources: count,
                    iterations: 1,
                    hrtf,
                    ..BenchConfig::default()
                };

                let mut session = Session::open(&mut backend).expect("loopback device");
                session.create_context(&config).expect("context");
                let buffer = session.create_buffer(&config).expect("sine buffer");
                session
                    .start_sources(config.num_sources, buffer)
                    .expect("sources");

                let id = BenchmarkId::new(format!("{label}/{count}"), size);
                group.bench_with_input(id, &size, |b, _| {
                    b.iter(|| black_box(session.measure(black_box(&config))))
                });
            }
        }
    }

    group.finish();
}
