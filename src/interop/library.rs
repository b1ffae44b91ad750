//! Runtime loading of the OSPRay shared library
//!
//! Symbols are resolved once when the library is opened and kept as plain
//! function pointers next to the `libloading::Library` that owns them.

use core::ffi::c_void;
use std::ffi::{CStr, OsStr, OsString};
use std::os::raw::{c_char, c_int};
use std::path::{Path, PathBuf};

use libloading::Library;
use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::device::Device;
use crate::interop::handle::Handle;
use crate::interop::types::{Channels, DataPayload, FrameBufferFormat, Vec2i};
use crate::interop::{
    CameraHandle, DataHandle, FrameBufferHandle, GeometryHandle, LightHandle, ModelHandle,
    ObjectHandle, RendererHandle,
};

type Raw = *mut c_void;

type InitFn = unsafe extern "C" fn(*mut c_int, *const *const c_char) -> c_int;
type ShutdownFn = unsafe extern "C" fn();
type ObjectFn = unsafe extern "C" fn(Raw);
type AddGeometryFn = unsafe extern "C" fn(Raw, Raw);
type NewTypedFn = unsafe extern "C" fn(*const c_char) -> Raw;
type NewModelFn = unsafe extern "C" fn() -> Raw;
type NewFrameBufferFn = unsafe extern "C" fn(*const Vec2i, u32, u32) -> Raw;
type NewDataFn = unsafe extern "C" fn(usize, u32, *const c_void, u32) -> Raw;
type SetObjectFn = unsafe extern "C" fn(Raw, *const c_char, Raw);
type Set1fFn = unsafe extern "C" fn(Raw, *const c_char, f32);
type Set1iFn = unsafe extern "C" fn(Raw, *const c_char, i32);
type Set3fvFn = unsafe extern "C" fn(Raw, *const c_char, *const f32);
type ClearFn = unsafe extern "C" fn(Raw, u32);
type RenderFn = unsafe extern "C" fn(Raw, Raw, u32) -> f32;
type MapFn = unsafe extern "C" fn(Raw, u32) -> *const c_void;
type UnmapFn = unsafe extern "C" fn(*const c_void, Raw);

/// Resolved entry points
struct Api {
    init: InitFn,
    shutdown: ShutdownFn,
    commit: ObjectFn,
    release: ObjectFn,
    add_geometry: AddGeometryFn,
    new_camera: NewTypedFn,
    new_renderer: NewTypedFn,
    new_light: NewTypedFn,
    new_model: NewModelFn,
    new_geometry: NewTypedFn,
    new_frame_buffer: NewFrameBufferFn,
    new_data: NewDataFn,
    set_object: SetObjectFn,
    set_data: SetObjectFn,
    set_1f: Set1fFn,
    set_1i: Set1iFn,
    set_3fv: Set3fvFn,
    frame_buffer_clear: ClearFn,
    render_frame: RenderFn,
    map_frame_buffer: MapFn,
    unmap_frame_buffer: UnmapFn,
}

macro_rules! resolve {
    ($lib:expr, $symbol:literal, $ty:ty) => {{
        // SAFETY: the type alias mirrors the C prototype of the symbol
        let symbol = unsafe { $lib.get::<$ty>(concat!($symbol, "\0").as_bytes()) }
            .map_err(|e| LoadError::SymbolMissing {
                symbol: $symbol,
                message: e.to_string(),
            })?;
        *symbol
    }};
}

impl Api {
    fn resolve(lib: &Library) -> Result<Self, LoadError> {
        Ok(Self {
            init: resolve!(lib, "ospInit", InitFn),
            shutdown: resolve!(lib, "ospShutdown", ShutdownFn),
            commit: resolve!(lib, "ospCommit", ObjectFn),
            release: resolve!(lib, "ospRelease", ObjectFn),
            add_geometry: resolve!(lib, "ospAddGeometry", AddGeometryFn),
            new_camera: resolve!(lib, "ospNewCamera", NewTypedFn),
            new_renderer: resolve!(lib, "ospNewRenderer", NewTypedFn),
            new_light: resolve!(lib, "ospNewLight3", NewTypedFn),
            new_model: resolve!(lib, "ospNewModel", NewModelFn),
            new_geometry: resolve!(lib, "ospNewGeometry", NewTypedFn),
            new_frame_buffer: resolve!(lib, "ospNewFrameBuffer", NewFrameBufferFn),
            new_data: resolve!(lib, "ospNewData", NewDataFn),
            set_object: resolve!(lib, "ospSetObject", SetObjectFn),
            set_data: resolve!(lib, "ospSetData", SetObjectFn),
            set_1f: resolve!(lib, "ospSet1f", Set1fFn),
            set_1i: resolve!(lib, "ospSet1i", Set1iFn),
            set_3fv: resolve!(lib, "ospSet3fv", Set3fvFn),
            frame_buffer_clear: resolve!(lib, "ospFrameBufferClear", ClearFn),
            render_frame: resolve!(lib, "ospRenderFrame", RenderFn),
            map_frame_buffer: resolve!(lib, "ospMapFrameBuffer", MapFn),
            unmap_frame_buffer: resolve!(lib, "ospUnmapFrameBuffer", UnmapFn),
        })
    }
}

/// Handle to a loaded OSPRay library
pub struct OsprayLibrary {
    api: Api,
    // Keeps the function pointers in `api` valid
    _library: Library,
}

// The resolved table is immutable; OSPRay's C API is callable from any thread.
unsafe impl Send for OsprayLibrary {}
unsafe impl Sync for OsprayLibrary {}

impl OsprayLibrary {
    /// Load the library at `path` (a file path or a name the dynamic loader
    /// can search for) and resolve every entry point
    pub fn open(path: impl AsRef<OsStr>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        // SAFETY: loading runs the library's initializers; OSPRay's are benign
        let library = unsafe { Library::new(path) }.map_err(|e| LoadError::LoadFailed {
            path: PathBuf::from(path),
            message: e.to_string(),
        })?;
        let api = Api::resolve(&library)?;

        info!(path = %Path::new(path).display(), "loaded OSPRay library");
        Ok(Self {
            api,
            _library: library,
        })
    }

    /// Try each candidate in order, returning the first that loads
    pub fn open_first<I>(candidates: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = OsString>,
    {
        let mut last = None;
        for candidate in candidates {
            match Self::open(&candidate) {
                Ok(library) => return Ok(library),
                Err(err) => {
                    debug!(candidate = ?candidate, error = %err, "library candidate rejected");
                    last = Some(err);
                }
            }
        }
        Err(last.unwrap_or(LoadError::NoCandidates))
    }
}

static SHARED: OnceCell<OsprayLibrary> = OnceCell::new();

/// Process-wide library, loaded on first use from the discovered config
pub fn shared() -> Result<&'static OsprayLibrary, LoadError> {
    SHARED.get_or_try_init(|| {
        let config = Config::discover();
        OsprayLibrary::open_first(config.library_candidates())
    })
}

impl Device for OsprayLibrary {
    fn init(&self) -> i32 {
        // SAFETY: null argc/argv is accepted and means "no command line"
        unsafe { (self.api.init)(core::ptr::null_mut(), core::ptr::null()) }
    }

    fn shutdown(&self) {
        unsafe { (self.api.shutdown)() }
    }

    fn commit(&self, object: ObjectHandle) {
        unsafe { (self.api.commit)(object.as_ptr()) }
    }

    fn release(&self, object: ObjectHandle) {
        unsafe { (self.api.release)(object.as_ptr()) }
    }

    fn add_geometry(&self, model: ModelHandle, geometry: GeometryHandle) {
        unsafe { (self.api.add_geometry)(model.as_ptr(), geometry.as_ptr()) }
    }

    fn new_camera(&self, kind: &CStr) -> CameraHandle {
        Handle::from_ptr(unsafe { (self.api.new_camera)(kind.as_ptr()) })
    }

    fn new_renderer(&self, kind: &CStr) -> RendererHandle {
        Handle::from_ptr(unsafe { (self.api.new_renderer)(kind.as_ptr()) })
    }

    fn new_light(&self, kind: &CStr) -> LightHandle {
        Handle::from_ptr(unsafe { (self.api.new_light)(kind.as_ptr()) })
    }

    fn new_model(&self) -> ModelHandle {
        Handle::from_ptr(unsafe { (self.api.new_model)() })
    }

    fn new_geometry(&self, kind: &CStr) -> GeometryHandle {
        Handle::from_ptr(unsafe { (self.api.new_geometry)(kind.as_ptr()) })
    }

    fn new_frame_buffer(
        &self,
        size: Vec2i,
        format: FrameBufferFormat,
        channels: Channels,
    ) -> FrameBufferHandle {
        Handle::from_ptr(unsafe {
            (self.api.new_frame_buffer)(&size, format.native(), channels.bits())
        })
    }

    fn new_data(&self, count: usize, payload: &DataPayload) -> DataHandle {
        // SAFETY: the bridge checked `payload` holds `count` items; OSPRay
        // copies the source since no sharing flag is passed
        Handle::from_ptr(unsafe {
            (self.api.new_data)(count, payload.format().native(), payload.as_ptr(), 0)
        })
    }

    fn set_object(&self, object: ObjectHandle, name: &CStr, value: ObjectHandle) {
        unsafe { (self.api.set_object)(object.as_ptr(), name.as_ptr(), value.as_ptr()) }
    }

    fn set_data(&self, object: ObjectHandle, name: &CStr, value: DataHandle) {
        unsafe { (self.api.set_data)(object.as_ptr(), name.as_ptr(), value.as_ptr()) }
    }

    fn set_float(&self, object: ObjectHandle, name: &CStr, value: f32) {
        unsafe { (self.api.set_1f)(object.as_ptr(), name.as_ptr(), value) }
    }

    fn set_int(&self, object: ObjectHandle, name: &CStr, value: i32) {
        unsafe { (self.api.set_1i)(object.as_ptr(), name.as_ptr(), value) }
    }

    fn set_float3(&self, object: ObjectHandle, name: &CStr, value: &[f32; 3]) {
        unsafe { (self.api.set_3fv)(object.as_ptr(), name.as_ptr(), value.as_ptr()) }
    }

    fn clear_frame_buffer(&self, fb: FrameBufferHandle, channels: Channels) {
        unsafe { (self.api.frame_buffer_clear)(fb.as_ptr(), channels.bits()) }
    }

    fn render_frame(
        &self,
        fb: FrameBufferHandle,
        renderer: RendererHandle,
        channels: Channels,
    ) -> f32 {
        unsafe { (self.api.render_frame)(fb.as_ptr(), renderer.as_ptr(), channels.bits()) }
    }

    fn map_frame_buffer(&self, fb: FrameBufferHandle, channel: Channels) -> *const c_void {
        unsafe { (self.api.map_frame_buffer)(fb.as_ptr(), channel.bits()) }
    }

    fn unmap_frame_buffer(&self, mapped: *const c_void, fb: FrameBufferHandle) {
        unsafe { (self.api.unmap_frame_buffer)(mapped, fb.as_ptr()) }
    }
}

/// Library loading errors
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to load OSPRay library '{}': {message}", path.display())]
    LoadFailed { path: PathBuf, message: String },

    #[error("OSPRay library is missing symbol '{symbol}': {message}")]
    SymbolMissing {
        symbol: &'static str,
        message: String,
    },

    #[error("No OSPRay library candidates configured")]
    NoCandidates,
}
