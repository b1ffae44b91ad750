//! Entry-point wrappers
//!
//! Each method converts its arguments, performs exactly one native operation
//! on the [`Device`] and encodes the result: a typed handle for constructors,
//! `()` for everything else. Failures of any kind come back as
//! [`BridgeError`], never as a panic.

mod ppm;

pub use ppm::{save_ppm, write_ppm};

use std::path::Path;

use tracing::{debug, instrument, warn};

use crate::device::{Device, MappedFrame};
use crate::errors::{BridgeError, BridgeResult};
use crate::interop::marshal::{self, HostValue};
use crate::interop::{
    CameraHandle, Channels, DataFormat, DataHandle, DataPayload, FrameBufferFormat,
    FrameBufferHandle, GeometryHandle, Handle, Kind, LightHandle, ModelHandle, ObjectHandle,
    RendererHandle, Vec2i,
};

/// Marshaling bridge over a native device
pub struct Bridge<D> {
    device: D,
}

impl<D: Device> Bridge<D> {
    pub const fn new(device: D) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    // ---- lifecycle ----

    #[instrument(name = "ospInit", skip(self))]
    pub fn init(&self) -> BridgeResult<()> {
        let status = self.device.init();
        if status != 0 {
            warn!(status, "native initialization reported an error");
        }
        Ok(())
    }

    #[instrument(name = "ospShutdown", skip(self))]
    pub fn shutdown(&self) -> BridgeResult<()> {
        self.device.shutdown();
        Ok(())
    }

    // ---- object management ----

    #[instrument(name = "ospCommit", skip(self))]
    pub fn commit(&self, object: ObjectHandle) -> BridgeResult<()> {
        self.device.commit(object);
        Ok(())
    }

    #[instrument(name = "ospRelease", skip(self))]
    pub fn release(&self, object: ObjectHandle) -> BridgeResult<()> {
        self.device.release(object);
        Ok(())
    }

    #[instrument(name = "ospAddGeometry", skip(self))]
    pub fn add_geometry(&self, model: ModelHandle, geometry: GeometryHandle) -> BridgeResult<()> {
        self.device.add_geometry(model, geometry);
        Ok(())
    }

    // ---- object creation ----

    #[instrument(name = "ospNewCamera", skip(self))]
    pub fn new_camera(&self, kind: &str) -> BridgeResult<CameraHandle> {
        let kind = marshal::to_cstring(kind)?;
        Ok(created(self.device.new_camera(&kind)))
    }

    #[instrument(name = "ospNewRenderer", skip(self))]
    pub fn new_renderer(&self, kind: &str) -> BridgeResult<RendererHandle> {
        let kind = marshal::to_cstring(kind)?;
        Ok(created(self.device.new_renderer(&kind)))
    }

    #[instrument(name = "ospNewLight", skip(self))]
    pub fn new_light(&self, kind: &str) -> BridgeResult<LightHandle> {
        let kind = marshal::to_cstring(kind)?;
        Ok(created(self.device.new_light(&kind)))
    }

    #[instrument(name = "ospNewModel", skip(self))]
    pub fn new_model(&self) -> BridgeResult<ModelHandle> {
        Ok(created(self.device.new_model()))
    }

    #[instrument(name = "ospNewGeometry", skip(self))]
    pub fn new_geometry(&self, kind: &str) -> BridgeResult<GeometryHandle> {
        let kind = marshal::to_cstring(kind)?;
        Ok(created(self.device.new_geometry(&kind)))
    }

    #[instrument(name = "ospNewFrameBuffer", skip(self, channels))]
    pub fn new_frame_buffer<V: HostValue>(
        &self,
        size: Vec2i,
        format: &str,
        channels: &V,
    ) -> BridgeResult<FrameBufferHandle> {
        size.dims()?;
        let format = FrameBufferFormat::parse(format)?;
        let channels = channel_flags(channels)?;
        Ok(created(self.device.new_frame_buffer(size, format, channels)))
    }

    /// Create a typed data array of `count` items.
    ///
    /// The value list must hold at least `count * components` values for the
    /// format; extra values are ignored.
    #[instrument(name = "ospNewData", skip(self, values))]
    pub fn new_data<V: HostValue>(
        &self,
        count: i32,
        format: &str,
        values: &V,
    ) -> BridgeResult<DataHandle> {
        let format = DataFormat::parse(format)?;
        let count = usize::try_from(count)
            .map_err(|_| BridgeError::InvalidSize(format!("negative item count {}", count)))?;

        let payload = match format {
            DataFormat::Float3a => DataPayload::Float3a(marshal::to_floats(values)?),
            DataFormat::Float4 => DataPayload::Float4(marshal::to_floats(values)?),
            DataFormat::Int3 => DataPayload::Int3(marshal::to_ints(values)?),
            DataFormat::Light => DataPayload::Light(marshal::to_handles(values)?),
        };

        let expected = count * format.components();
        if payload.len() < expected {
            warn!(%format, expected, found = payload.len(), "data array too short");
            return Err(BridgeError::DataLength {
                format: format.name(),
                expected,
                found: payload.len(),
            });
        }

        Ok(created(self.device.new_data(count, &payload)))
    }

    // ---- parameters ----

    #[instrument(name = "ospSetObject", skip(self))]
    pub fn set_object(
        &self,
        object: ObjectHandle,
        name: &str,
        value: ObjectHandle,
    ) -> BridgeResult<()> {
        let name = marshal::to_cstring(name)?;
        self.device.set_object(object, &name, value);
        Ok(())
    }

    #[instrument(name = "ospSetData", skip(self))]
    pub fn set_data(
        &self,
        object: ObjectHandle,
        name: &str,
        value: DataHandle,
    ) -> BridgeResult<()> {
        let name = marshal::to_cstring(name)?;
        self.device.set_data(object, &name, value);
        Ok(())
    }

    #[instrument(name = "ospSet1f", skip(self))]
    pub fn set_float(&self, object: ObjectHandle, name: &str, value: f32) -> BridgeResult<()> {
        let name = marshal::to_cstring(name)?;
        self.device.set_float(object, &name, value);
        Ok(())
    }

    #[instrument(name = "ospSet1i", skip(self))]
    pub fn set_int(&self, object: ObjectHandle, name: &str, value: i32) -> BridgeResult<()> {
        let name = marshal::to_cstring(name)?;
        self.device.set_int(object, &name, value);
        Ok(())
    }

    /// Set a three-float parameter; the list must hold exactly three numbers.
    #[instrument(name = "ospSet3fv", skip(self, values))]
    pub fn set_float3<V: HostValue>(
        &self,
        object: ObjectHandle,
        name: &str,
        values: &V,
    ) -> BridgeResult<()> {
        let value: [f32; 3] = marshal::to_float_array(values)?;
        let name = marshal::to_cstring(name)?;
        self.device.set_float3(object, &name, &value);
        Ok(())
    }

    // ---- frame buffers ----

    #[instrument(name = "ospFrameBufferClear", skip(self, channels))]
    pub fn frame_buffer_clear<V: HostValue>(
        &self,
        fb: FrameBufferHandle,
        channels: &V,
    ) -> BridgeResult<()> {
        let channels = channel_flags(channels)?;
        self.device.clear_frame_buffer(fb, channels);
        Ok(())
    }

    #[instrument(name = "ospRenderFrame", skip(self, channels))]
    pub fn render_frame<V: HostValue>(
        &self,
        fb: FrameBufferHandle,
        renderer: RendererHandle,
        channels: &V,
    ) -> BridgeResult<()> {
        let channels = channel_flags(channels)?;
        let variance = self.device.render_frame(fb, renderer, channels);
        debug!(variance, "frame rendered");
        Ok(())
    }

    /// Write the color channel of `fb` to `path` as a binary PPM.
    ///
    /// The frame buffer stays mapped only while the file is written and is
    /// unmapped on every path out of this call.
    #[instrument(name = "ospFrameBufferSave", skip(self))]
    pub fn frame_buffer_save(
        &self,
        path: &str,
        fb: FrameBufferHandle,
        size: Vec2i,
        format: &str,
    ) -> BridgeResult<()> {
        let format = FrameBufferFormat::parse(format)?;
        let (width, height) = size.dims()?;

        let mapped = MappedFrame::map(&self.device, fb, Channels::COLOR)?;
        let len = width * height * format.bytes_per_pixel();
        // SAFETY: an OSPRay color channel of this size holds one native pixel
        // per element; the caller vouches for the size, as with the C API
        let pixels = unsafe { mapped.bytes(len) };

        save_ppm(Path::new(path), width, height, pixels).map_err(|e| {
            warn!(path, error = %e, "failed to write frame buffer");
            BridgeError::io(path, e)
        })
    }
}

/// Flags for a list of channel names
fn channel_flags<V: HostValue>(names: &V) -> BridgeResult<Channels> {
    Ok(Channels::from_names(marshal::to_strings(names)?))
}

fn created<K: Kind>(handle: Handle<K>) -> Handle<K> {
    debug!(kind = K::NAME, %handle, "created object");
    handle
}
