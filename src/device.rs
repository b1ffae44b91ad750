//! The native renderer as seen by the bridge
//!
//! [`Device`] names every native operation the bridge forwards to, one method
//! per C entry point. Handles passed in are trusted: their validity is the
//! native library's contract, exactly as for a C caller.

use core::ffi::c_void;
use core::ptr::NonNull;
use std::ffi::CStr;

use crate::errors::{BridgeError, BridgeResult};
use crate::interop::{
    CameraHandle, Channels, DataHandle, DataPayload, FrameBufferFormat, FrameBufferHandle,
    GeometryHandle, LightHandle, ModelHandle, ObjectHandle, RendererHandle, Vec2i,
};

pub trait Device {
    /// Returns the native error code (0 on success)
    fn init(&self) -> i32;
    fn shutdown(&self);

    fn commit(&self, object: ObjectHandle);
    fn release(&self, object: ObjectHandle);
    fn add_geometry(&self, model: ModelHandle, geometry: GeometryHandle);

    fn new_camera(&self, kind: &CStr) -> CameraHandle;
    fn new_renderer(&self, kind: &CStr) -> RendererHandle;
    fn new_light(&self, kind: &CStr) -> LightHandle;
    fn new_model(&self) -> ModelHandle;
    fn new_geometry(&self, kind: &CStr) -> GeometryHandle;
    fn new_frame_buffer(
        &self,
        size: Vec2i,
        format: FrameBufferFormat,
        channels: Channels,
    ) -> FrameBufferHandle;
    /// `payload` holds at least `count` items of its format
    fn new_data(&self, count: usize, payload: &DataPayload) -> DataHandle;

    fn set_object(&self, object: ObjectHandle, name: &CStr, value: ObjectHandle);
    fn set_data(&self, object: ObjectHandle, name: &CStr, value: DataHandle);
    fn set_float(&self, object: ObjectHandle, name: &CStr, value: f32);
    fn set_int(&self, object: ObjectHandle, name: &CStr, value: i32);
    fn set_float3(&self, object: ObjectHandle, name: &CStr, value: &[f32; 3]);

    fn clear_frame_buffer(&self, fb: FrameBufferHandle, channels: Channels);
    /// Returns the native frame variance estimate
    fn render_frame(
        &self,
        fb: FrameBufferHandle,
        renderer: RendererHandle,
        channels: Channels,
    ) -> f32;

    /// Host-accessible view of one channel; null on failure
    fn map_frame_buffer(&self, fb: FrameBufferHandle, channel: Channels) -> *const c_void;
    /// Release a non-null pointer obtained from `map_frame_buffer`
    fn unmap_frame_buffer(&self, mapped: *const c_void, fb: FrameBufferHandle);
}

impl<D: Device + ?Sized> Device for &D {
    fn init(&self) -> i32 {
        (**self).init()
    }

    fn shutdown(&self) {
        (**self).shutdown()
    }

    fn commit(&self, object: ObjectHandle) {
        (**self).commit(object)
    }

    fn release(&self, object: ObjectHandle) {
        (**self).release(object)
    }

    fn add_geometry(&self, model: ModelHandle, geometry: GeometryHandle) {
        (**self).add_geometry(model, geometry)
    }

    fn new_camera(&self, kind: &CStr) -> CameraHandle {
        (**self).new_camera(kind)
    }

    fn new_renderer(&self, kind: &CStr) -> RendererHandle {
        (**self).new_renderer(kind)
    }

    fn new_light(&self, kind: &CStr) -> LightHandle {
        (**self).new_light(kind)
    }

    fn new_model(&self) -> ModelHandle {
        (**self).new_model()
    }

    fn new_geometry(&self, kind: &CStr) -> GeometryHandle {
        (**self).new_geometry(kind)
    }

    fn new_frame_buffer(
        &self,
        size: Vec2i,
        format: FrameBufferFormat,
        channels: Channels,
    ) -> FrameBufferHandle {
        (**self).new_frame_buffer(size, format, channels)
    }

    fn new_data(&self, count: usize, payload: &DataPayload) -> DataHandle {
        (**self).new_data(count, payload)
    }

    fn set_object(&self, object: ObjectHandle, name: &CStr, value: ObjectHandle) {
        (**self).set_object(object, name, value)
    }

    fn set_data(&self, object: ObjectHandle, name: &CStr, value: DataHandle) {
        (**self).set_data(object, name, value)
    }

    fn set_float(&self, object: ObjectHandle, name: &CStr, value: f32) {
        (**self).set_float(object, name, value)
    }

    fn set_int(&self, object: ObjectHandle, name: &CStr, value: i32) {
        (**self).set_int(object, name, value)
    }

    fn set_float3(&self, object: ObjectHandle, name: &CStr, value: &[f32; 3]) {
        (**self).set_float3(object, name, value)
    }

    fn clear_frame_buffer(&self, fb: FrameBufferHandle, channels: Channels) {
        (**self).clear_frame_buffer(fb, channels)
    }

    fn render_frame(
        &self,
        fb: FrameBufferHandle,
        renderer: RendererHandle,
        channels: Channels,
    ) -> f32 {
        (**self).render_frame(fb, renderer, channels)
    }

    fn map_frame_buffer(&self, fb: FrameBufferHandle, channel: Channels) -> *const c_void {
        (**self).map_frame_buffer(fb, channel)
    }

    fn unmap_frame_buffer(&self, mapped: *const c_void, fb: FrameBufferHandle) {
        (**self).unmap_frame_buffer(mapped, fb)
    }
}

/// A mapped frame buffer channel, unmapped on drop
pub struct MappedFrame<'d, D: Device + ?Sized> {
    device: &'d D,
    fb: FrameBufferHandle,
    ptr: NonNull<c_void>,
}

impl<'d, D: Device + ?Sized> MappedFrame<'d, D> {
    pub fn map(device: &'d D, fb: FrameBufferHandle, channel: Channels) -> BridgeResult<Self> {
        let ptr = NonNull::new(device.map_frame_buffer(fb, channel).cast_mut())
            .ok_or(BridgeError::MapFailed(fb.bits()))?;
        tracing::trace!(%fb, "mapped frame buffer");
        Ok(Self { device, fb, ptr })
    }

    /// View the first `len` bytes of the mapping.
    ///
    /// # Safety
    /// The native buffer must be at least `len` bytes long.
    pub unsafe fn bytes(&self, len: usize) -> &[u8] {
        core::slice::from_raw_parts(self.ptr.as_ptr() as *const u8, len)
    }
}

impl<D: Device + ?Sized> Drop for MappedFrame<'_, D> {
    fn drop(&mut self) {
        self.device.unmap_frame_buffer(self.ptr.as_ptr(), self.fb);
        tracing::trace!(fb = %self.fb, "unmapped frame buffer");
    }
}
