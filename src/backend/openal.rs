//! OpenAL Soft binding.
//!
//! The shared library is opened at run time and the handful of AL/ALC entry
//! points the benchmark uses (plus the `ALC_SOFT_loopback` and
//! `ALC_SOFT_HRTF` extensions) are resolved into a function table. Device and
//! context pointers are kept in tables behind integer handles; buffer and
//! source names are passed through unchanged.
//!
//! Reference: https://openal-soft.org/openal-extensions/SOFT_loopback.txt

use std::{
    collections::HashMap,
    ffi::{c_char, c_int, c_uint, c_void, CString, OsStr},
    ptr::{self, NonNull},
};

use libloading::Library;
use thiserror::Error;
use tracing::{debug, warn};

use super::{
    AlError, AlcError, AudioBackend, BufferFormat, BufferId, ChannelLayout, ContextAttributes,
    ContextId, DeviceId, HrtfStatus, SampleType, SourceId, SourceInfo, SourceState,
};

// =============================================================================
// Types and constants
// =============================================================================

#[repr(C)]
pub struct ALCdevice {
    _private: [u8; 0],
}

#[repr(C)]
pub struct ALCcontext {
    _private: [u8; 0],
}

type ALint = c_int;
type ALuint = c_uint;
type ALsizei = c_int;
type ALenum = c_int;
type ALboolean = c_char;

const AL_NO_ERROR: ALenum = 0;
const AL_INVALID_NAME: ALenum = 0xA001;
const AL_INVALID_ENUM: ALenum = 0xA002;
const AL_INVALID_VALUE: ALenum = 0xA003;
const AL_INVALID_OPERATION: ALenum = 0xA004;
const AL_OUT_OF_MEMORY: ALenum = 0xA005;

const ALC_INVALID_DEVICE: ALenum = 0xA001;
const ALC_INVALID_CONTEXT: ALenum = 0xA002;
const ALC_INVALID_ENUM: ALenum = 0xA003;
const ALC_INVALID_VALUE: ALenum = 0xA004;
const ALC_OUT_OF_MEMORY: ALenum = 0xA005;

const AL_LOOPING: ALenum = 0x1007;
const AL_BUFFER: ALenum = 0x1009;
const AL_SOURCE_STATE: ALenum = 0x1010;
const AL_INITIAL: ALint = 0x1011;
const AL_PLAYING: ALint = 0x1012;
const AL_PAUSED: ALint = 0x1013;

const AL_FORMAT_MONO16: ALenum = 0x1101;
const AL_FORMAT_STEREO16: ALenum = 0x1103;

const ALC_FREQUENCY: ALint = 0x1007;
const ALC_MONO_SOURCES: ALint = 0x1010;
const ALC_STEREO_SOURCES: ALint = 0x1011;

const ALC_FORMAT_CHANNELS_SOFT: ALint = 0x1990;
const ALC_FORMAT_TYPE_SOFT: ALint = 0x1991;
const ALC_SHORT_SOFT: ALint = 0x1402;
const ALC_FLOAT_SOFT: ALint = 0x1406;
const ALC_MONO_SOFT: ALint = 0x1500;
const ALC_STEREO_SOFT: ALint = 0x1501;

const ALC_HRTF_SOFT: ALint = 0x1992;
const ALC_HRTF_STATUS_SOFT: ALenum = 0x1993;
const ALC_HRTF_ENABLED_SOFT: ALint = 0x0001;
const ALC_HRTF_DENIED_SOFT: ALint = 0x0002;
const ALC_HRTF_REQUIRED_SOFT: ALint = 0x0003;
const ALC_HRTF_HEADPHONES_DETECTED_SOFT: ALint = 0x0004;
const ALC_HRTF_UNSUPPORTED_FORMAT_SOFT: ALint = 0x0005;

const AL_TRUE: ALint = 1;
const AL_FALSE: ALint = 0;

/// File names tried, in order, by [`OpenAl::load`].
#[cfg(target_os = "windows")]
pub const LIBRARY_NAMES: &[&str] = &["OpenAL32.dll", "soft_oal.dll"];
#[cfg(target_os = "macos")]
pub const LIBRARY_NAMES: &[&str] = &["libopenal.1.dylib", "libopenal.dylib"];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const LIBRARY_NAMES: &[&str] = &["libopenal.so.1", "libopenal.so"];

// =============================================================================
// Entry points
// =============================================================================

/// Declares the function table and its loader. Field names are the exported
/// symbol names.
macro_rules! entry_points {
    ($($name:ident: fn($($arg:ty),*) $(-> $ret:ty)?;)*) => {
        #[allow(non_snake_case)]
        struct Api {
            $($name: unsafe extern "C" fn($($arg),*) $(-> $ret)?,)*
        }

        impl Api {
            /// # Safety
            /// `library` must export these symbols with these signatures, and
            /// must stay loaded for as long as the table is used.
            unsafe fn resolve(library: &Library) -> Result<Self, LoadError> {
                Ok(Self {
                    $($name: *library
                        .get::<unsafe extern "C" fn($($arg),*) $(-> $ret)?>(
                            concat!(stringify!($name), "\0").as_bytes(),
                        )
                        .map_err(|source| LoadError::Symbol {
                            name: stringify!($name),
                            source,
                        })?,)*
                })
            }
        }
    };
}

entry_points! {
    alcLoopbackOpenDeviceSOFT: fn(*const c_char) -> *mut ALCdevice;
    alcIsRenderFormatSupportedSOFT: fn(*mut ALCdevice, ALsizei, ALenum, ALenum) -> ALboolean;
    alcRenderSamplesSOFT: fn(*mut ALCdevice, *mut c_void, ALsizei);
    alcCreateContext: fn(*mut ALCdevice, *const ALint) -> *mut ALCcontext;
    alcMakeContextCurrent: fn(*mut ALCcontext) -> ALboolean;
    alcDestroyContext: fn(*mut ALCcontext);
    alcCloseDevice: fn(*mut ALCdevice) -> ALboolean;
    alcGetError: fn(*mut ALCdevice) -> ALenum;
    alcGetIntegerv: fn(*mut ALCdevice, ALenum, ALsizei, *mut ALint);

    alGetError: fn() -> ALenum;
    alGenBuffers: fn(ALsizei, *mut ALuint);
    alBufferData: fn(ALuint, ALenum, *const c_void, ALsizei, ALsizei);
    alIsBuffer: fn(ALuint) -> ALboolean;
    alDeleteBuffers: fn(ALsizei, *const ALuint);
    alGenSources: fn(ALsizei, *mut ALuint);
    alIsSource: fn(ALuint) -> ALboolean;
    alSourcei: fn(ALuint, ALenum, ALint);
    alGetSourcei: fn(ALuint, ALenum, *mut ALint);
    alSourcePlay: fn(ALuint);
    alDeleteSources: fn(ALsizei, *const ALuint);
}

/// Why the OpenAL library could not be used.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no OpenAL library could be loaded ({0})")]
    NotFound(String),
    #[error("failed to load {path}")]
    Library {
        path: String,
        #[source]
        source: libloading::Error,
    },
    #[error("OpenAL library does not export `{name}`")]
    Symbol {
        name: &'static str,
        #[source]
        source: libloading::Error,
    },
}

fn al_error(code: ALenum) -> Option<AlError> {
    match code {
        AL_NO_ERROR => None,
        AL_INVALID_NAME => Some(AlError::InvalidName),
        AL_INVALID_ENUM => Some(AlError::InvalidEnum),
        AL_INVALID_VALUE => Some(AlError::InvalidValue),
        AL_INVALID_OPERATION => Some(AlError::InvalidOperation),
        AL_OUT_OF_MEMORY => Some(AlError::OutOfMemory),
        _ => Some(AlError::InvalidOperation),
    }
}

fn alc_error(code: ALenum) -> Option<AlcError> {
    match code {
        AL_NO_ERROR => None,
        ALC_INVALID_DEVICE => Some(AlcError::InvalidDevice),
        ALC_INVALID_CONTEXT => Some(AlcError::InvalidContext),
        ALC_INVALID_ENUM => Some(AlcError::InvalidEnum),
        ALC_INVALID_VALUE => Some(AlcError::InvalidValue),
        ALC_OUT_OF_MEMORY => Some(AlcError::OutOfMemory),
        _ => Some(AlcError::InvalidValue),
    }
}

fn channels_enum(layout: ChannelLayout) -> ALint {
    match layout {
        ChannelLayout::Mono => ALC_MONO_SOFT,
        ChannelLayout::Stereo => ALC_STEREO_SOFT,
    }
}

fn type_enum(sample_type: SampleType) -> ALint {
    match sample_type {
        SampleType::Short => ALC_SHORT_SOFT,
        SampleType::Float => ALC_FLOAT_SOFT,
    }
}

/// Zero-terminated `ALCint` attribute list.
fn attr_list(attrs: &ContextAttributes) -> Vec<ALint> {
    let mut list = Vec::with_capacity(13);
    if let Some(n) = attrs.mono_sources {
        list.extend([ALC_MONO_SOURCES, n as ALint]);
    }
    if let Some(n) = attrs.stereo_sources {
        list.extend([ALC_STEREO_SOURCES, n as ALint]);
    }
    if let Some(hz) = attrs.frequency {
        list.extend([ALC_FREQUENCY, hz as ALint]);
    }
    if let Some(layout) = attrs.channels {
        list.extend([ALC_FORMAT_CHANNELS_SOFT, channels_enum(layout)]);
    }
    if let Some(sample_type) = attrs.sample_type {
        list.extend([ALC_FORMAT_TYPE_SOFT, type_enum(sample_type)]);
    }
    if let Some(hrtf) = attrs.hrtf {
        list.extend([ALC_HRTF_SOFT, if hrtf { AL_TRUE } else { AL_FALSE }]);
    }
    list.push(0);
    list
}

/// Output format a loopback context renders in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RenderFormat {
    layout: ChannelLayout,
    sample_type: SampleType,
}

impl RenderFormat {
    fn from_attrs(attrs: &ContextAttributes) -> Option<Self> {
        Some(Self {
            layout: attrs.channels?,
            sample_type: attrs.sample_type?,
        })
    }

    /// Whether `frames` frames in this format fit a block of `len` `i16`
    /// samples. Float output never does.
    fn fits(self, len: usize, frames: usize) -> bool {
        match self.sample_type {
            SampleType::Short => frames
                .checked_mul(self.layout.channel_count())
                .is_some_and(|needed| needed <= len),
            SampleType::Float => false,
        }
    }
}

// =============================================================================
// Backend
// =============================================================================

pub struct OpenAl {
    api: Api,
    devices: HashMap<DeviceId, NonNull<ALCdevice>>,
    contexts: HashMap<ContextId, NonNull<ALCcontext>>,
    /// Output format per device, recorded at context creation.
    formats: HashMap<DeviceId, RenderFormat>,
    next_id: u32,
    // Dropped last; `api` points into it.
    _library: Library,
}

impl OpenAl {
    /// Load the system OpenAL library, trying each of [`LIBRARY_NAMES`].
    pub fn load() -> Result<Self, LoadError> {
        let mut failures = Vec::with_capacity(LIBRARY_NAMES.len());
        for name in LIBRARY_NAMES {
            match Self::load_from(name) {
                Ok(al) => return Ok(al),
                Err(LoadError::Library { path, source }) => {
                    debug!(%path, %source, "OpenAL candidate not loadable");
                    failures.push(format!("{path}: {source}"));
                }
                Err(err) => return Err(err),
            }
        }
        Err(LoadError::NotFound(failures.join("; ")))
    }

    /// Load OpenAL from a specific file name or path.
    pub fn load_from(path: impl AsRef<OsStr>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        // SAFETY: loading OpenAL runs only its own initialisers.
        let library = unsafe { Library::new(path) }.map_err(|source| LoadError::Library {
            path: path.to_string_lossy().into_owned(),
            source,
        })?;
        // SAFETY: the table is stored next to the library and never outlives it.
        let api = unsafe { Api::resolve(&library) }?;
        debug!(path = %path.to_string_lossy(), "loaded OpenAL");

        Ok(Self {
            api,
            devices: HashMap::new(),
            contexts: HashMap::new(),
            formats: HashMap::new(),
            next_id: 0,
            _library: library,
        })
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn device_ptr(&self, device: DeviceId) -> *mut ALCdevice {
        self.devices
            .get(&device)
            .map_or(ptr::null_mut(), |p| p.as_ptr())
    }
}

impl AudioBackend for OpenAl {
    fn loopback_open_device(&mut self, name: Option<&str>) -> Option<DeviceId> {
        let name = match name.map(CString::new) {
            Some(Ok(name)) => Some(name),
            Some(Err(_)) => return None,
            None => None,
        };
        let name_ptr = name.as_ref().map_or(ptr::null(), |n| n.as_ptr());
        // SAFETY: name_ptr is null or a valid C string for the call.
        let device = NonNull::new(unsafe { (self.api.alcLoopbackOpenDeviceSOFT)(name_ptr) })?;
        let id = DeviceId(self.next_id());
        self.devices.insert(id, device);
        Some(id)
    }

    fn is_render_format_supported(
        &mut self,
        device: DeviceId,
        frequency: u32,
        channels: ChannelLayout,
        sample_type: SampleType,
    ) -> bool {
        // SAFETY: a null device is reported by OpenAL as ALC_INVALID_DEVICE.
        unsafe {
            (self.api.alcIsRenderFormatSupportedSOFT)(
                self.device_ptr(device),
                frequency as ALsizei,
                channels_enum(channels),
                type_enum(sample_type),
            ) != 0
        }
    }

    fn create_context(
        &mut self,
        device: DeviceId,
        attrs: &ContextAttributes,
    ) -> Option<ContextId> {
        let list = attr_list(attrs);
        // SAFETY: list is zero-terminated and outlives the call.
        let context = NonNull::new(unsafe {
            (self.api.alcCreateContext)(self.device_ptr(device), list.as_ptr())
        })?;
        let id = ContextId(self.next_id());
        self.contexts.insert(id, context);
        match RenderFormat::from_attrs(attrs) {
            Some(format) => {
                self.formats.insert(device, format);
            }
            None => {
                self.formats.remove(&device);
            }
        }
        Some(id)
    }

    fn make_context_current(&mut self, context: Option<ContextId>) -> bool {
        let ptr = match context {
            Some(id) => match self.contexts.get(&id) {
                Some(p) => p.as_ptr(),
                None => return false,
            },
            None => ptr::null_mut(),
        };
        // SAFETY: ptr is null or a live context.
        unsafe { (self.api.alcMakeContextCurrent)(ptr) != 0 }
    }

    fn destroy_context(&mut self, context: ContextId) {
        if let Some(ptr) = self.contexts.remove(&context) {
            // SAFETY: the pointer came from alcCreateContext and is removed
            // from the table, so it is destroyed once.
            unsafe { (self.api.alcDestroyContext)(ptr.as_ptr()) }
        }
    }

    fn close_device(&mut self, device: DeviceId) -> bool {
        match self.devices.remove(&device) {
            Some(ptr) => {
                self.formats.remove(&device);
                // SAFETY: pointer from alcLoopbackOpenDeviceSOFT, closed once.
                unsafe { (self.api.alcCloseDevice)(ptr.as_ptr()) != 0 }
            }
            None => false,
        }
    }

    fn hrtf_status(&mut self, device: DeviceId) -> HrtfStatus {
        let mut status: ALint = 0;
        // SAFETY: one ALint is written into `status`.
        unsafe {
            (self.api.alcGetIntegerv)(self.device_ptr(device), ALC_HRTF_STATUS_SOFT, 1, &mut status)
        };
        match status {
            ALC_HRTF_ENABLED_SOFT | ALC_HRTF_HEADPHONES_DETECTED_SOFT => HrtfStatus::Enabled,
            ALC_HRTF_DENIED_SOFT => HrtfStatus::Denied,
            ALC_HRTF_REQUIRED_SOFT => HrtfStatus::Required,
            ALC_HRTF_UNSUPPORTED_FORMAT_SOFT => HrtfStatus::UnsupportedFormat,
            _ => HrtfStatus::Disabled,
        }
    }

    fn gen_buffers(&mut self, count: usize) -> Vec<BufferId> {
        let mut names: Vec<ALuint> = vec![0; count];
        // SAFETY: names has room for `count` entries.
        unsafe { (self.api.alGenBuffers)(count as ALsizei, names.as_mut_ptr()) };
        names.into_iter().map(BufferId).collect()
    }

    fn buffer_data(&mut self, buffer: BufferId, format: BufferFormat, data: &[i16], frequency: u32) {
        let format = match format {
            BufferFormat::Mono16 => AL_FORMAT_MONO16,
            BufferFormat::Stereo16 => AL_FORMAT_STEREO16,
        };
        let bytes = std::mem::size_of_val(data) as ALsizei;
        // SAFETY: OpenAL copies `bytes` bytes out of `data` before returning.
        unsafe {
            (self.api.alBufferData)(buffer.0, format, data.as_ptr().cast(), bytes, frequency as ALsizei)
        }
    }

    fn is_buffer(&mut self, buffer: BufferId) -> bool {
        // SAFETY: plain query.
        unsafe { (self.api.alIsBuffer)(buffer.0) != 0 }
    }

    fn delete_buffers(&mut self, buffers: &[BufferId]) {
        let names: Vec<ALuint> = buffers.iter().map(|b| b.0).collect();
        // SAFETY: names holds `len` entries.
        unsafe { (self.api.alDeleteBuffers)(names.len() as ALsizei, names.as_ptr()) }
    }

    fn gen_sources(&mut self, count: usize) -> Vec<SourceId> {
        let mut names: Vec<ALuint> = vec![0; count];
        // SAFETY: names has room for `count` entries.
        unsafe { (self.api.alGenSources)(count as ALsizei, names.as_mut_ptr()) };
        names.into_iter().map(SourceId).collect()
    }

    fn set_source_buffer(&mut self, source: SourceId, buffer: BufferId) {
        // SAFETY: plain setter.
        unsafe { (self.api.alSourcei)(source.0, AL_BUFFER, buffer.0 as ALint) }
    }

    fn set_source_looping(&mut self, source: SourceId, looping: bool) {
        let value = if looping { AL_TRUE } else { AL_FALSE };
        // SAFETY: plain setter.
        unsafe { (self.api.alSourcei)(source.0, AL_LOOPING, value) }
    }

    fn play_source(&mut self, source: SourceId) {
        // SAFETY: plain call.
        unsafe { (self.api.alSourcePlay)(source.0) }
    }

    fn source_info(&mut self, source: SourceId) -> Option<SourceInfo> {
        // SAFETY: plain query.
        if unsafe { (self.api.alIsSource)(source.0) } == 0 {
            return None;
        }
        let (mut buffer, mut looping, mut state) = (0, 0, 0);
        // SAFETY: each call writes one ALint.
        unsafe {
            (self.api.alGetSourcei)(source.0, AL_BUFFER, &mut buffer);
            (self.api.alGetSourcei)(source.0, AL_LOOPING, &mut looping);
            (self.api.alGetSourcei)(source.0, AL_SOURCE_STATE, &mut state);
        }
        let state = match state {
            AL_INITIAL => SourceState::Initial,
            AL_PLAYING => SourceState::Playing,
            AL_PAUSED => SourceState::Paused,
            _ => SourceState::Stopped,
        };
        Some(SourceInfo {
            buffer: BufferId(buffer as ALuint),
            looping: looping != 0,
            state,
        })
    }

    fn delete_sources(&mut self, sources: &[SourceId]) {
        let names: Vec<ALuint> = sources.iter().map(|s| s.0).collect();
        // SAFETY: names holds `len` entries.
        unsafe { (self.api.alDeleteSources)(names.len() as ALsizei, names.as_ptr()) }
    }

    fn render_samples(&mut self, device: DeviceId, out: &mut [i16], frames: usize) {
        let Some(format) = self.formats.get(&device).copied() else {
            warn!(?device, "render on a device without a loopback context");
            return;
        };
        if !format.fits(out.len(), frames) {
            warn!(?device, ?format, len = out.len(), frames, "render block does not fit output format");
            return;
        }
        let Ok(count) = ALsizei::try_from(frames) else {
            return;
        };
        // SAFETY: out holds `frames` frames of 16-bit samples in the
        // device's channel layout.
        unsafe {
            (self.api.alcRenderSamplesSOFT)(self.device_ptr(device), out.as_mut_ptr().cast(), count)
        }
    }

    fn get_error(&mut self) -> Option<AlError> {
        // SAFETY: plain query.
        al_error(unsafe { (self.api.alGetError)() })
    }

    fn get_device_error(&mut self, device: Option<DeviceId>) -> Option<AlcError> {
        let ptr = match device {
            Some(id) => match self.devices.get(&id) {
                Some(p) => p.as_ptr(),
                None => return Some(AlcError::InvalidDevice),
            },
            None => ptr::null_mut(),
        };
        // SAFETY: ptr is null or a live device.
        alc_error(unsafe { (self.api.alcGetError)(ptr) })
    }
}
