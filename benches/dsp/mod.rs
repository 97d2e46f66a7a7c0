//! Benchmarks for the work done before rendering starts.

mod waveform;

pub use waveform::bench_waveform;
