//! Interoperability with the native OSPRay library
//!
//! Architecture:
//! - `handle.rs` - typed opaque handles (bit pattern of native pointers)
//! - `types.rs` - native enums and the name tables selecting them
//! - `marshal.rs` - scripting value ↔ native value conversions
//! - `library.rs` - runtime loading of the shared library and its symbols

mod handle;
mod library;
pub mod marshal;
mod types;

pub use handle::{
    Camera, CameraHandle, Data, DataHandle, FrameBuffer, FrameBufferHandle, Geometry,
    GeometryHandle, Handle, Kind, Light, LightHandle, Model, ModelHandle, Object, ObjectHandle,
    Renderer, RendererHandle,
};
pub use library::{shared, LoadError, OsprayLibrary};
pub use marshal::HostValue;
pub use types::{Channels, DataFormat, DataPayload, FrameBufferFormat, Vec2i};
