pub mod backend; // Backend contract and the OpenAL Soft binding
pub mod bench; // Run sequence and resource session
pub mod config;
pub mod report;
pub mod waveform;

pub use bench::{report_failure, run, run_and_report, BenchError, Session};
pub use config::BenchConfig;
pub use report::Report;
