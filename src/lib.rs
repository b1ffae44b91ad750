//! Python bindings for the OSPRay ray-tracing engine
//!
//! Each `osp*` entry point takes scripting values, converts them to the
//! native representation and forwards them to the engine. Object handles cross
//! the boundary as plain integers.
//!
//! The pieces, bottom-up:
//! - [`interop`]: handles, lookup tables, value marshaling and the runtime
//!   symbol table of the shared library
//! - [`device`]: the one-call-per-function seam over the engine
//! - [`bridge`]: argument validation and dispatch, shared by every host
//! - `bindings` (feature `python`): the `ospray` extension module

pub mod bridge;
pub mod config;
pub mod device;
pub mod errors;
pub mod interop;
pub mod logging;

#[cfg(feature = "python")]
pub mod bindings;

#[cfg(test)]
mod testing;

// Re-export commonly used items
pub use bridge::Bridge;
pub use config::Config;
pub use device::{Device, MappedFrame};
pub use errors::{BridgeError, BridgeResult};
pub use interop::{
    CameraHandle, Channels, DataFormat, DataHandle, FrameBufferFormat, FrameBufferHandle,
    GeometryHandle, Handle, HostValue, LightHandle, ModelHandle, ObjectHandle, OsprayLibrary,
    RendererHandle, Vec2i,
};
pub use logging::{init_logging, LogConfig};

#[cfg(feature = "python")]
pub use bindings::ospray_module;
