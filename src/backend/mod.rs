//! The audio backend contract consumed by the benchmark.
//!
//! The shape follows the OpenAL loopback API: opaque handles for devices,
//! contexts, buffers and sources, calls that report failure through a sticky
//! error flag rather than a return value, and two error queries (generic and
//! per-device) that read and clear that flag.
//!
//! [`OpenAl`] implements it over the system OpenAL Soft library.

pub mod openal;

pub use openal::{LoadError, OpenAl};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u32);

/// Buffer handle. `BufferId::NONE` unbinds a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

impl BufferId {
    pub const NONE: BufferId = BufferId(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Mono,
    Stereo,
}

impl ChannelLayout {
    pub fn channel_count(self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }
}

/// Sample type of rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    Short,
    Float,
}

/// Layout of sample data submitted to a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferFormat {
    Mono16,
    Stereo16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Initial,
    Playing,
    Paused,
    Stopped,
}

/// Snapshot of a source's playback properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceInfo {
    pub buffer: BufferId,
    pub looping: bool,
    pub state: SourceState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HrtfStatus {
    Disabled,
    Enabled,
    Denied,
    Required,
    UnsupportedFormat,
}

/// Attribute list passed at context creation.
///
/// Unset fields are left to the backend's defaults. Loopback devices require
/// `frequency`, `channels` and `sample_type`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextAttributes {
    pub mono_sources: Option<u32>,
    pub stereo_sources: Option<u32>,
    pub frequency: Option<u32>,
    pub channels: Option<ChannelLayout>,
    pub sample_type: Option<SampleType>,
    pub hrtf: Option<bool>,
}

impl ContextAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mono_sources(mut self, count: u32) -> Self {
        self.mono_sources = Some(count);
        self
    }

    pub fn stereo_sources(mut self, count: u32) -> Self {
        self.stereo_sources = Some(count);
        self
    }

    pub fn frequency(mut self, hz: u32) -> Self {
        self.frequency = Some(hz);
        self
    }

    pub fn channels(mut self, layout: ChannelLayout) -> Self {
        self.channels = Some(layout);
        self
    }

    pub fn sample_type(mut self, sample_type: SampleType) -> Self {
        self.sample_type = Some(sample_type);
        self
    }

    pub fn hrtf(mut self, enabled: bool) -> Self {
        self.hrtf = Some(enabled);
        self
    }
}

/// Errors reported by buffer and source calls (`alGetError`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AlError {
    #[error("invalid name")]
    InvalidName,
    #[error("invalid enum")]
    InvalidEnum,
    #[error("invalid value")]
    InvalidValue,
    #[error("invalid operation")]
    InvalidOperation,
    #[error("out of memory")]
    OutOfMemory,
}

/// Errors reported by device and context calls (`alcGetError`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AlcError {
    #[error("invalid device")]
    InvalidDevice,
    #[error("invalid context")]
    InvalidContext,
    #[error("invalid enum")]
    InvalidEnum,
    #[error("invalid value")]
    InvalidValue,
    #[error("out of memory")]
    OutOfMemory,
}

/// Either of the two error flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BackendFault {
    #[error("AL error: {0}")]
    Al(#[from] AlError),
    #[error("ALC error: {0}")]
    Alc(#[from] AlcError),
}

pub trait AudioBackend {
    /// Open a loopback device. `None` selects the default.
    fn loopback_open_device(&mut self, name: Option<&str>) -> Option<DeviceId>;

    fn is_render_format_supported(
        &mut self,
        device: DeviceId,
        frequency: u32,
        channels: ChannelLayout,
        sample_type: SampleType,
    ) -> bool;

    fn create_context(&mut self, device: DeviceId, attrs: &ContextAttributes)
        -> Option<ContextId>;

    /// Make `context` current, or clear the current context with `None`.
    fn make_context_current(&mut self, context: Option<ContextId>) -> bool;

    fn destroy_context(&mut self, context: ContextId);

    fn close_device(&mut self, device: DeviceId) -> bool;

    fn hrtf_status(&mut self, device: DeviceId) -> HrtfStatus;

    fn gen_buffers(&mut self, count: usize) -> Vec<BufferId>;

    fn buffer_data(&mut self, buffer: BufferId, format: BufferFormat, data: &[i16], frequency: u32);

    fn is_buffer(&mut self, buffer: BufferId) -> bool;

    fn delete_buffers(&mut self, buffers: &[BufferId]);

    fn gen_sources(&mut self, count: usize) -> Vec<SourceId>;

    fn set_source_buffer(&mut self, source: SourceId, buffer: BufferId);

    fn set_source_looping(&mut self, source: SourceId, looping: bool);

    fn play_source(&mut self, source: SourceId);

    fn source_info(&mut self, source: SourceId) -> Option<SourceInfo>;

    fn delete_sources(&mut self, sources: &[SourceId]);

    /// Render `frames` frames into `out` in the device's loopback format.
    fn render_samples(&mut self, device: DeviceId, out: &mut [i16], frames: usize);

    /// Read and clear the generic error flag.
    fn get_error(&mut self) -> Option<AlError>;

    /// Read and clear the device error flag. `None` reads the flag kept for
    /// calls that had no valid device.
    fn get_device_error(&mut self, device: Option<DeviceId>) -> Option<AlcError>;

    /// Read and clear both error flags, reporting the generic one first.
    fn take_fault(&mut self, device: DeviceId) -> Option<BackendFault> {
        let al = self.get_error();
        let alc = self.get_device_error(Some(device));
        al.map(BackendFault::from).or(alc.map(BackendFault::from))
    }
}
