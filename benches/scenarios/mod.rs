//! Whole-render benchmarks.
//!
//! These run the same setup as the binary (one shared sine buffer, every
//! source looping on it) and time single render calls.

mod sources;

pub use sources::bench_sources;
