//! Timing results and their console form.

use std::{fmt, time::Duration};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::BenchConfig;

/// Outcome of one timed render loop.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Report {
    pub num_sources: usize,
    pub block_size: usize,
    pub iterations: usize,
    /// Wall-clock seconds spent rendering.
    pub elapsed: f64,
    /// Seconds of audio the loop produced.
    pub synthesized: f64,
}

impl Report {
    pub fn new(config: &BenchConfig, elapsed: Duration) -> Self {
        Self {
            num_sources: config.num_sources,
            block_size: config.block_size,
            iterations: config.iterations,
            elapsed: elapsed.as_secs_f64(),
            synthesized: config.synthesized_seconds(),
        }
    }

    /// Sources the backend could mix in real time, assuming render cost
    /// grows linearly with the number of sources.
    pub fn max_sources(&self) -> f64 {
        self.synthesized * self.num_sources as f64 / self.elapsed
    }

    /// Rendered audio time per second of wall-clock time.
    pub fn realtime_factor(&self) -> f64 {
        self.synthesized / self.elapsed
    }
}

/// The line printed before the timed loop starts.
pub struct Header<'a>(pub &'a BenchConfig);

impl fmt::Display for Header<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Measuring. num_sources={}, block_size={}, iterations={}",
            self.0.num_sources, self.0.block_size, self.0.iterations
        )
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Took {:.6} seconds.", self.elapsed)?;
        writeln!(f, "Synthesized {:.6} seconds of audio.", self.synthesized)?;
        write!(
            f,
            "Estimated maximum of {:.6} sources before realtime synthesis is impossible.",
            self.max_sources()
        )
    }
}
