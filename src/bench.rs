//! The benchmark driver.
//!
//! A run walks a fixed sequence: open a loopback device, create a context in
//! the requested output format, upload the sine buffer, start every source
//! looping on it, time the render loop, report. Any failure before the timed
//! loop ends the run with a [`BenchError`].
//!
//! Everything acquired along the way is owned by a [`Session`], which
//! releases it in teardown order (sources, buffer, context, device) when it
//! is dropped, whether the run finished or bailed out early.

use std::{
    hint::black_box,
    io::{self, Write},
    time::{Duration, Instant},
};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    backend::{
        AudioBackend, BackendFault, BufferId, ChannelLayout, ContextAttributes, ContextId,
        DeviceId, SampleType, SourceId,
    },
    config::BenchConfig,
    report::{Header, Report},
    waveform::{self, WaveformError},
};

/// Why a run stopped before reporting.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("Couldn't get device.")]
    DeviceUnavailable,
    #[error("Couldn't get context.")]
    Context,
    #[error("Couldn't get buffer.")]
    Buffer(#[source] WaveformError),
    #[error("Couldn't create sources.")]
    SourceCreation(#[source] BackendFault),
    #[error("Couldn't set up source properties.")]
    SourceSetup(#[source] BackendFault),
    #[error("failed to write results")]
    Output(#[from] io::Error),
}

impl BenchError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

/// Backend resources held for the duration of a run.
pub struct Session<'a, B: AudioBackend> {
    backend: &'a mut B,
    device: DeviceId,
    context: Option<ContextId>,
    buffer: Option<BufferId>,
    sources: Vec<SourceId>,
}

impl<'a, B: AudioBackend> Session<'a, B> {
    /// Open the default loopback device.
    pub fn open(backend: &'a mut B) -> Result<Self, BenchError> {
        let device = backend
            .loopback_open_device(None)
            .ok_or(BenchError::DeviceUnavailable)?;
        debug!(?device, "device open");

        Ok(Self {
            backend,
            device,
            context: None,
            buffer: None,
            sources: Vec::new(),
        })
    }

    pub fn sources(&self) -> &[SourceId] {
        &self.sources
    }

    /// Create and activate a context rendering stereo 16-bit output at the
    /// configured rate, with room for every source and HRTF requested.
    pub fn create_context(&mut self, config: &BenchConfig) -> Result<ContextId, BenchError> {
        if !self.backend.is_render_format_supported(
            self.device,
            config.sample_rate,
            ChannelLayout::Stereo,
            SampleType::Short,
        ) {
            warn!(frequency = config.sample_rate, "render format not supported");
            return Err(BenchError::Context);
        }

        let attrs = ContextAttributes::new()
            .mono_sources(config.num_sources as u32)
            .frequency(config.sample_rate)
            .channels(ChannelLayout::Stereo)
            .sample_type(SampleType::Short)
            .hrtf(config.hrtf);

        let context = self
            .backend
            .create_context(self.device, &attrs)
            .ok_or(BenchError::Context)?;
        self.context = Some(context);

        if !self.backend.make_context_current(Some(context)) {
            return Err(BenchError::Context);
        }

        let hrtf = self.backend.hrtf_status(self.device);
        info!(?context, ?hrtf, "context current");
        Ok(context)
    }

    /// Upload the shared sine buffer.
    pub fn create_buffer(&mut self, config: &BenchConfig) -> Result<BufferId, BenchError> {
        let buffer = waveform::create_sine_wave(
            &mut *self.backend,
            config.buffer_length,
            config.sample_rate,
            config.tone_frequency,
        )
        .map_err(BenchError::Buffer)?;
        self.buffer = Some(buffer);
        Ok(buffer)
    }

    /// Create `count` sources, bind each to `buffer`, loop and play them.
    pub fn start_sources(&mut self, count: usize, buffer: BufferId) -> Result<(), BenchError> {
        self.sources = self.backend.gen_sources(count);
        if let Some(fault) = self.backend.take_fault(self.device) {
            // Nothing was generated; the names are placeholders.
            self.sources.clear();
            return Err(BenchError::SourceCreation(fault));
        }

        for &source in &self.sources {
            self.backend.set_source_buffer(source, buffer);
            self.backend.set_source_looping(source, true);
            self.backend.play_source(source);
        }
        if let Some(fault) = self.backend.take_fault(self.device) {
            return Err(BenchError::SourceSetup(fault));
        }

        debug!(count, ?buffer, "sources playing");
        Ok(())
    }

    /// Render `config.iterations` blocks of `config.block_size` frames and
    /// return the wall-clock time taken. Render errors are not checked.
    pub fn measure(&mut self, config: &BenchConfig) -> Duration {
        let mut block = vec![0i16; config.scratch_len()];

        let start = Instant::now();
        for _ in 0..config.iterations {
            self.backend
                .render_samples(self.device, black_box(block.as_mut_slice()), config.block_size);
        }
        start.elapsed()
    }

    /// Release everything now. Dropping the session does the same.
    pub fn close(self) {}
}

impl<B: AudioBackend> Drop for Session<'_, B> {
    fn drop(&mut self) {
        if !self.sources.is_empty() {
            self.backend.delete_sources(&self.sources);
            self.sources.clear();
        }
        if let Some(buffer) = self.buffer.take() {
            self.backend.delete_buffers(&[buffer]);
        }
        if let Some(err) = self.backend.get_error() {
            warn!(%err, "error while releasing sources and buffer");
        }
        if let Some(context) = self.context.take() {
            self.backend.make_context_current(None);
            self.backend.destroy_context(context);
        }
        if !self.backend.close_device(self.device) {
            warn!(device = ?self.device, "device did not close cleanly");
        }
        debug!(device = ?self.device, "session released");
    }
}

/// Run the whole benchmark, writing progress and results to `out`.
pub fn run<B: AudioBackend, W: Write>(
    backend: &mut B,
    config: &BenchConfig,
    out: &mut W,
) -> Result<Report, BenchError> {
    let mut session = Session::open(backend)?;
    session.create_context(config)?;
    let buffer = session.create_buffer(config)?;
    session.start_sources(config.num_sources, buffer)?;

    writeln!(out, "{}", Header(config))?;
    let elapsed = session.measure(config);
    let report = Report::new(config, elapsed);
    writeln!(out, "{report}")?;

    session.close();
    Ok(report)
}

/// Print `err` the way the console reports it and return the exit status.
pub fn report_failure<W: Write>(err: &BenchError, out: &mut W) -> io::Result<u8> {
    debug!(error = ?err, "run failed");
    writeln!(out, "{err}")?;
    Ok(err.exit_code())
}

/// [`run`], then print the failure message if there was one. Returns the
/// process exit status: 0 on success.
pub fn run_and_report<B: AudioBackend, W: Write>(
    backend: &mut B,
    config: &BenchConfig,
    out: &mut W,
) -> io::Result<u8> {
    match run(backend, config, out) {
        Ok(report) => {
            debug!(realtime_factor = report.realtime_factor(), "done");
            Ok(0)
        }
        Err(BenchError::Output(err)) => Err(err),
        Err(err) => report_failure(&err, out),
    }
}
