//! Test doubles: a plain-Rust scripting value and a recording device

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::CStr;

use core::ffi::c_void;

use crate::device::Device;
use crate::errors::{BridgeError, BridgeResult};
use crate::interop::{
    CameraHandle, Channels, DataHandle, DataPayload, FrameBufferFormat, FrameBufferHandle,
    GeometryHandle, Handle, HostValue, LightHandle, ModelHandle, ObjectHandle, RendererHandle,
    Vec2i,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Integer outside the `i64` range, carried as its float value
    BigInt(f64),
    Str(String),
    List(Vec<Value>),
    /// Element whose retrieval fails during iteration
    Poison,
}

impl Value {
    pub fn str(s: &str) -> Self {
        Self::Str(s.to_string())
    }

    pub fn strs(items: &[&str]) -> Self {
        Self::List(items.iter().map(|s| Self::str(s)).collect())
    }

    pub fn ints(items: &[i64]) -> Self {
        Self::List(items.iter().copied().map(Self::Int).collect())
    }

    pub fn floats(items: &[f64]) -> Self {
        Self::List(items.iter().copied().map(Self::Float).collect())
    }
}

impl HostValue for Value {
    type Iter = std::vec::IntoIter<BridgeResult<Value>>;

    fn type_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::BigInt(_) => "int",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Poison => "poison",
        })
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) | Self::BigInt(f) => Some(*f),
            _ => None,
        }
    }

    fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    fn is_integer(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Bool(_) | Self::BigInt(_))
    }

    fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Str(s) => Some(Cow::Borrowed(s)),
            _ => None,
        }
    }

    fn elements(&self) -> Option<Self::Iter> {
        match self {
            Self::List(items) => Some(
                items
                    .iter()
                    .map(|item| match item {
                        Self::Poison => Err(BridgeError::HostIteration("poisoned element".into())),
                        other => Ok(other.clone()),
                    })
                    .collect::<Vec<_>>()
                    .into_iter(),
            ),
            _ => None,
        }
    }
}

/// One native call as observed by [`RecordingDevice`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Init,
    Shutdown,
    Commit(u64),
    Release(u64),
    AddGeometry(u64, u64),
    NewCamera(String),
    NewRenderer(String),
    NewLight(String),
    NewModel,
    NewGeometry(String),
    NewFrameBuffer(Vec2i, FrameBufferFormat, Channels),
    NewData(usize, DataPayload),
    SetObject(u64, String, u64),
    SetData(u64, String, u64),
    SetFloat(u64, String, f32),
    SetInt(u64, String, i32),
    SetFloat3(u64, String, [f32; 3]),
    Clear(u64, Channels),
    Render(u64, u64, Channels),
    Map(u64, Channels),
    Unmap(u64),
}

/// In-memory device that hands out fresh handles and records every call
pub struct RecordingDevice {
    calls: RefCell<Vec<Call>>,
    next: Cell<u64>,
    pixels: RefCell<HashMap<u64, Vec<u8>>>,
    pub init_status: Cell<i32>,
    pub fail_map: Cell<bool>,
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            next: Cell::new(0x1000),
            pixels: RefCell::new(HashMap::new()),
            init_status: Cell::new(0),
            fail_map: Cell::new(false),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn last_call(&self) -> Option<Call> {
        self.calls.borrow().last().cloned()
    }

    /// Replace the color channel contents of a frame buffer
    pub fn set_pixels(&self, fb: FrameBufferHandle, bytes: Vec<u8>) {
        self.pixels.borrow_mut().insert(fb.bits(), bytes);
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn fresh<K: crate::interop::Kind>(&self) -> Handle<K> {
        let bits = self.next.get();
        self.next.set(bits + 0x10);
        Handle::from_bits(bits)
    }
}

fn text(s: &CStr) -> String {
    s.to_string_lossy().into_owned()
}

impl Device for RecordingDevice {
    fn init(&self) -> i32 {
        self.record(Call::Init);
        self.init_status.get()
    }

    fn shutdown(&self) {
        self.record(Call::Shutdown);
    }

    fn commit(&self, object: ObjectHandle) {
        self.record(Call::Commit(object.bits()));
    }

    fn release(&self, object: ObjectHandle) {
        self.record(Call::Release(object.bits()));
    }

    fn add_geometry(&self, model: ModelHandle, geometry: GeometryHandle) {
        self.record(Call::AddGeometry(model.bits(), geometry.bits()));
    }

    fn new_camera(&self, kind: &CStr) -> CameraHandle {
        self.record(Call::NewCamera(text(kind)));
        self.fresh()
    }

    fn new_renderer(&self, kind: &CStr) -> RendererHandle {
        self.record(Call::NewRenderer(text(kind)));
        self.fresh()
    }

    fn new_light(&self, kind: &CStr) -> LightHandle {
        self.record(Call::NewLight(text(kind)));
        self.fresh()
    }

    fn new_model(&self) -> ModelHandle {
        self.record(Call::NewModel);
        self.fresh()
    }

    fn new_geometry(&self, kind: &CStr) -> GeometryHandle {
        self.record(Call::NewGeometry(text(kind)));
        self.fresh()
    }

    fn new_frame_buffer(
        &self,
        size: Vec2i,
        format: FrameBufferFormat,
        channels: Channels,
    ) -> FrameBufferHandle {
        self.record(Call::NewFrameBuffer(size, format, channels));
        let fb: FrameBufferHandle = self.fresh();
        let (w, h) = size.dims().unwrap_or((0, 0));
        self.set_pixels(fb, vec![0; w * h * format.bytes_per_pixel()]);
        fb
    }

    fn new_data(&self, count: usize, payload: &DataPayload) -> DataHandle {
        self.record(Call::NewData(count, payload.clone()));
        self.fresh()
    }

    fn set_object(&self, object: ObjectHandle, name: &CStr, value: ObjectHandle) {
        self.record(Call::SetObject(object.bits(), text(name), value.bits()));
    }

    fn set_data(&self, object: ObjectHandle, name: &CStr, value: DataHandle) {
        self.record(Call::SetData(object.bits(), text(name), value.bits()));
    }

    fn set_float(&self, object: ObjectHandle, name: &CStr, value: f32) {
        self.record(Call::SetFloat(object.bits(), text(name), value));
    }

    fn set_int(&self, object: ObjectHandle, name: &CStr, value: i32) {
        self.record(Call::SetInt(object.bits(), text(name), value));
    }

    fn set_float3(&self, object: ObjectHandle, name: &CStr, value: &[f32; 3]) {
        self.record(Call::SetFloat3(object.bits(), text(name), *value));
    }

    fn clear_frame_buffer(&self, fb: FrameBufferHandle, channels: Channels) {
        self.record(Call::Clear(fb.bits(), channels));
    }

    fn render_frame(
        &self,
        fb: FrameBufferHandle,
        renderer: RendererHandle,
        channels: Channels,
    ) -> f32 {
        self.record(Call::Render(fb.bits(), renderer.bits(), channels));
        0.0
    }

    fn map_frame_buffer(&self, fb: FrameBufferHandle, channel: Channels) -> *const c_void {
        self.record(Call::Map(fb.bits(), channel));
        if self.fail_map.get() {
            return core::ptr::null();
        }
        self.pixels
            .borrow()
            .get(&fb.bits())
            .map_or(core::ptr::null(), |bytes| bytes.as_ptr().cast())
    }

    fn unmap_frame_buffer(&self, _mapped: *const c_void, fb: FrameBufferHandle) {
        self.record(Call::Unmap(fb.bits()));
    }
}
