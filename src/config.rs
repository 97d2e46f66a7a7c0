//! Fixed benchmark tunables.
//!
//! The binary takes no arguments; everything it measures is decided here at
//! build time. [`BenchConfig`] exists so tests and criterion benches can run
//! the same driver with smaller numbers.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of render calls inside the timed loop.
pub const ITERATIONS: usize = 200;
/// Stereo frames rendered per call.
pub const BLOCK_SIZE: usize = 1024;
/// Looping sources created on the shared buffer.
pub const NUM_SOURCES: usize = 150;
/// Length of the sine buffer in samples (half a second at 44.1 kHz).
pub const BUFFER_LENGTH: usize = 22_050;
/// Sample rate of both the waveform buffer and the loopback output.
pub const SAMPLE_RATE: u32 = 44_100;
/// Tone of the shared waveform, in Hz.
pub const TONE_FREQUENCY: f64 = 1_000.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchConfig {
    pub iterations: usize,
    pub block_size: usize,
    pub num_sources: usize,
    pub buffer_length: usize,
    pub sample_rate: u32,
    pub tone_frequency: f64,
    /// Ask the backend for binaural (HRTF) rendering.
    pub hrtf: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            iterations: ITERATIONS,
            block_size: BLOCK_SIZE,
            num_sources: NUM_SOURCES,
            buffer_length: BUFFER_LENGTH,
            sample_rate: SAMPLE_RATE,
            tone_frequency: TONE_FREQUENCY,
            hrtf: true,
        }
    }
}

impl BenchConfig {
    /// Seconds of audio the timed loop produces.
    pub fn synthesized_seconds(&self) -> f64 {
        (self.block_size * self.iterations) as f64 / f64::from(self.sample_rate)
    }

    /// Interleaved stereo samples in one render block.
    pub fn scratch_len(&self) -> usize {
        self.block_size * 2
    }
}
