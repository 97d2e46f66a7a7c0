//! A recording backend that always succeeds unless told to fail at one step.

#![allow(dead_code)]

use std::collections::BTreeMap;

use loopback_bench::backend::{
    AlError, AlcError, AudioBackend, BufferFormat, BufferId, ChannelLayout, ContextAttributes,
    ContextId, DeviceId, HrtfStatus, SampleType, SourceId, SourceInfo, SourceState,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    OpenDevice,
    ProbeFormat,
    CreateContext(ContextAttributes),
    MakeCurrent(Option<ContextId>),
    DestroyContext(ContextId),
    CloseDevice(DeviceId),
    GenBuffers(usize),
    BufferData { buffer: BufferId, len: usize, frequency: u32 },
    IsBuffer(BufferId),
    DeleteBuffers(Vec<BufferId>),
    GenSources(usize),
    DeleteSources(usize),
    Render { out_len: usize, frames: usize },
}

/// Step at which the stub reports failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    OpenDevice,
    CreateContext,
    MakeCurrent,
    BufferData,
    GenSources,
    /// Device error raised while setting source properties.
    SourceProperties,
}

pub struct StubBackend {
    pub calls: Vec<Call>,
    pub fail: Option<Failure>,
    pub sources: BTreeMap<SourceId, SourceInfo>,
    /// Source states seen by the first render call.
    pub at_first_render: Option<Vec<SourceInfo>>,
    error: Option<AlError>,
    device_error: Option<AlcError>,
    next_id: u32,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            fail: None,
            sources: BTreeMap::new(),
            at_first_render: None,
            error: None,
            device_error: None,
            next_id: 0,
        }
    }

    pub fn failing_at(failure: Failure) -> Self {
        Self {
            fail: Some(failure),
            ..Self::new()
        }
    }

    fn id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn fails(&self, step: Failure) -> bool {
        self.fail == Some(step)
    }

    pub fn render_calls(&self) -> Vec<(usize, usize)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Render { out_len, frames } => Some((*out_len, *frames)),
                _ => None,
            })
            .collect()
    }

    /// Calls other than rendering, in order.
    pub fn setup_and_teardown(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|c| !matches!(c, Call::Render { .. }))
            .collect()
    }
}

impl AudioBackend for StubBackend {
    fn loopback_open_device(&mut self, _name: Option<&str>) -> Option<DeviceId> {
        self.calls.push(Call::OpenDevice);
        if self.fails(Failure::OpenDevice) {
            return None;
        }
        Some(DeviceId(self.id()))
    }

    fn is_render_format_supported(
        &mut self,
        _device: DeviceId,
        _frequency: u32,
        _channels: ChannelLayout,
        _sample_type: SampleType,
    ) -> bool {
        self.calls.push(Call::ProbeFormat);
        true
    }

    fn create_context(&mut self, _device: DeviceId, attrs: &ContextAttributes) -> Option<ContextId> {
        self.calls.push(Call::CreateContext(attrs.clone()));
        if self.fails(Failure::CreateContext) {
            return None;
        }
        Some(ContextId(self.id()))
    }

    fn make_context_current(&mut self, context: Option<ContextId>) -> bool {
        self.calls.push(Call::MakeCurrent(context));
        !(context.is_some() && self.fails(Failure::MakeCurrent))
    }

    fn destroy_context(&mut self, context: ContextId) {
        self.calls.push(Call::DestroyContext(context));
    }

    fn close_device(&mut self, device: DeviceId) -> bool {
        self.calls.push(Call::CloseDevice(device));
        true
    }

    fn hrtf_status(&mut self, _device: DeviceId) -> HrtfStatus {
        HrtfStatus::Enabled
    }

    fn gen_buffers(&mut self, count: usize) -> Vec<BufferId> {
        self.calls.push(Call::GenBuffers(count));
        (0..count).map(|_| BufferId(self.id())).collect()
    }

    fn buffer_data(&mut self, buffer: BufferId, _format: BufferFormat, data: &[i16], frequency: u32) {
        self.calls.push(Call::BufferData {
            buffer,
            len: data.len(),
            frequency,
        });
        if self.fails(Failure::BufferData) {
            self.error.get_or_insert(AlError::InvalidValue);
        }
    }

    fn is_buffer(&mut self, buffer: BufferId) -> bool {
        self.calls.push(Call::IsBuffer(buffer));
        true
    }

    fn delete_buffers(&mut self, buffers: &[BufferId]) {
        self.calls.push(Call::DeleteBuffers(buffers.to_vec()));
    }

    fn gen_sources(&mut self, count: usize) -> Vec<SourceId> {
        self.calls.push(Call::GenSources(count));
        if self.fails(Failure::GenSources) {
            // alGenSources leaves the caller's zeroed names untouched.
            self.error.get_or_insert(AlError::OutOfMemory);
            return vec![SourceId(0); count];
        }
        (0..count)
            .map(|_| {
                let id = SourceId(self.id());
                self.sources.insert(
                    id,
                    SourceInfo {
                        buffer: BufferId::NONE,
                        looping: false,
                        state: SourceState::Initial,
                    },
                );
                id
            })
            .collect()
    }

    fn set_source_buffer(&mut self, source: SourceId, buffer: BufferId) {
        if let Some(info) = self.sources.get_mut(&source) {
            info.buffer = buffer;
        }
    }

    fn set_source_looping(&mut self, source: SourceId, looping: bool) {
        if let Some(info) = self.sources.get_mut(&source) {
            info.looping = looping;
        }
    }

    fn play_source(&mut self, source: SourceId) {
        if self.fails(Failure::SourceProperties) {
            self.device_error.get_or_insert(AlcError::InvalidContext);
        }
        if let Some(info) = self.sources.get_mut(&source) {
            info.state = SourceState::Playing;
        }
    }

    fn source_info(&mut self, source: SourceId) -> Option<SourceInfo> {
        self.sources.get(&source).copied()
    }

    fn delete_sources(&mut self, sources: &[SourceId]) {
        self.calls.push(Call::DeleteSources(sources.len()));
        for id in sources {
            self.sources.remove(id);
        }
    }

    fn render_samples(&mut self, _device: DeviceId, out: &mut [i16], frames: usize) {
        if self.at_first_render.is_none() {
            self.at_first_render = Some(self.sources.values().copied().collect());
        }
        self.calls.push(Call::Render {
            out_len: out.len(),
            frames,
        });
        out.fill(0);
    }

    fn get_error(&mut self) -> Option<AlError> {
        self.error.take()
    }

    fn get_device_error(&mut self, _device: Option<DeviceId>) -> Option<AlcError> {
        self.device_error.take()
    }
}
