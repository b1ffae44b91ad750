//! Native enumerations and the name tables that select them
//!
//! Every lookup from a scripting-side name to a native value goes through a
//! static table, so an unknown name has exactly one place where it is handled.

use core::ffi::c_void;
use core::fmt;
use core::ops::{BitOr, BitOrAssign};

use crate::errors::{BridgeError, BridgeResult};
use crate::interop::handle::LightHandle;

/// Frame buffer channel bit flags (`OSPFrameBufferChannel`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Channels(u32);

impl Channels {
    pub const NONE: Self = Self(0);
    pub const COLOR: Self = Self(1 << 0);
    pub const DEPTH: Self = Self(1 << 1);
    pub const ACCUM: Self = Self(1 << 2);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Flag for a single channel name, `None` when unrecognized
    pub fn lookup(name: &str) -> Option<Self> {
        CHANNEL_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, flag)| flag)
    }

    /// OR together the flags of every recognized name.
    ///
    /// Unrecognized names contribute nothing.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().fold(Self::NONE, |acc, name| {
            let name = name.as_ref();
            match Self::lookup(name) {
                Some(flag) => acc | flag,
                None => {
                    tracing::debug!(channel = name, "ignoring unknown frame buffer channel");
                    acc
                }
            }
        })
    }
}

impl BitOr for Channels {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Channels {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

static CHANNEL_NAMES: &[(&str, Channels)] = &[
    ("color", Channels::COLOR),
    ("depth", Channels::DEPTH),
    ("accum", Channels::ACCUM),
];

/// Pixel format of a frame buffer (`OSPFrameBufferFormat`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum FrameBufferFormat {
    Srgba = 2,
}

impl FrameBufferFormat {
    pub fn parse(name: &str) -> BridgeResult<Self> {
        FRAME_BUFFER_FORMATS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, format)| format)
            .ok_or_else(|| BridgeError::UnsupportedFormat {
                kind: "frame buffer",
                name: name.to_string(),
            })
    }

    #[inline]
    pub const fn native(self) -> u32 {
        self as u32
    }

    /// Bytes per pixel of the mapped color channel
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Srgba => 4,
        }
    }
}

static FRAME_BUFFER_FORMATS: &[(&str, FrameBufferFormat)] = &[("srgba", FrameBufferFormat::Srgba)];

/// Element encoding of a data array (`OSPDataType`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum DataFormat {
    /// Three floats padded to 16 bytes
    Float3a = 6004,
    Float4 = 6003,
    Int3 = 4002,
    /// Array of light handles
    Light = 1005,
}

impl DataFormat {
    pub fn parse(name: &str) -> BridgeResult<Self> {
        DATA_FORMATS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, format)| format)
            .ok_or_else(|| BridgeError::UnsupportedFormat {
                kind: "data",
                name: name.to_string(),
            })
    }

    #[inline]
    pub const fn native(self) -> u32 {
        self as u32
    }

    /// Scalar values per item in the packed array
    #[inline]
    pub const fn components(self) -> usize {
        match self {
            Self::Float3a | Self::Float4 => 4,
            Self::Int3 => 3,
            Self::Light => 1,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Float3a => "float3a",
            Self::Float4 => "float4",
            Self::Int3 => "int3",
            Self::Light => "light",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static DATA_FORMATS: &[(&str, DataFormat)] = &[
    ("float3a", DataFormat::Float3a),
    ("OSP_FLOAT3A", DataFormat::Float3a),
    ("float4", DataFormat::Float4),
    ("OSP_FLOAT4", DataFormat::Float4),
    ("int3", DataFormat::Int3),
    ("OSP_INT3", DataFormat::Int3),
    ("light", DataFormat::Light),
    ("OSP_LIGHT", DataFormat::Light),
];

/// `osp::vec2i`, handed to the native side by pointer (`const vec2i &`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C)]
pub struct Vec2i {
    pub x: i32,
    pub y: i32,
}

impl Vec2i {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Width and height, rejecting negative extents
    pub fn dims(self) -> BridgeResult<(usize, usize)> {
        match (usize::try_from(self.x), usize::try_from(self.y)) {
            (Ok(w), Ok(h)) => Ok((w, h)),
            _ => Err(BridgeError::InvalidSize(format!("({}, {})", self.x, self.y))),
        }
    }
}

impl From<(i32, i32)> for Vec2i {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Packed values for a new data array, tagged with their encoding
#[derive(Debug, Clone, PartialEq)]
pub enum DataPayload {
    Float3a(Vec<f32>),
    Float4(Vec<f32>),
    Int3(Vec<i32>),
    Light(Vec<LightHandle>),
}

impl DataPayload {
    pub fn format(&self) -> DataFormat {
        match self {
            Self::Float3a(_) => DataFormat::Float3a,
            Self::Float4(_) => DataFormat::Float4,
            Self::Int3(_) => DataFormat::Int3,
            Self::Light(_) => DataFormat::Light,
        }
    }

    /// Number of scalar values (not items)
    pub fn len(&self) -> usize {
        match self {
            Self::Float3a(v) | Self::Float4(v) => v.len(),
            Self::Int3(v) => v.len(),
            Self::Light(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start of the packed buffer, valid while `self` is alive
    pub fn as_ptr(&self) -> *const c_void {
        match self {
            Self::Float3a(v) | Self::Float4(v) => v.as_ptr().cast(),
            Self::Int3(v) => v.as_ptr().cast(),
            Self::Light(v) => v.as_ptr().cast(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_lookup() {
        assert_eq!(Channels::lookup("color"), Some(Channels::COLOR));
        assert_eq!(Channels::lookup("depth"), Some(Channels::DEPTH));
        assert_eq!(Channels::lookup("accum"), Some(Channels::ACCUM));
        assert_eq!(Channels::lookup("Color"), None);
        assert_eq!(Channels::lookup("variance"), None);
    }

    #[test]
    fn test_channels_ignore_unknown() {
        let flags = Channels::from_names(["color", "normal", "accum", ""]);
        assert_eq!(flags, Channels::COLOR | Channels::ACCUM);
        assert_eq!(flags.bits(), 0b101);

        let none: [&str; 0] = [];
        assert!(Channels::from_names(none).is_empty());
    }

    #[test]
    fn test_data_format_aliases() {
        assert_eq!(DataFormat::parse("float3a").unwrap(), DataFormat::Float3a);
        assert_eq!(DataFormat::parse("OSP_FLOAT3A").unwrap(), DataFormat::Float3a);
        assert_eq!(DataFormat::parse("OSP_LIGHT").unwrap(), DataFormat::Light);
        assert_eq!(DataFormat::parse("int3").unwrap().native(), 4002);
    }

    #[test]
    fn test_unknown_formats() {
        let err = DataFormat::parse("float3").unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedFormat { kind: "data", .. }));

        let err = FrameBufferFormat::parse("rgba8").unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedFormat { kind: "frame buffer", .. }));
    }

    #[test]
    fn test_vec2i_dims() {
        assert_eq!(Vec2i::new(1024, 768).dims().unwrap(), (1024, 768));
        assert_eq!(Vec2i::new(0, 0).dims().unwrap(), (0, 0));
        assert!(matches!(Vec2i::new(-1, 4).dims(), Err(BridgeError::InvalidSize(_))));
    }

    #[test]
    fn test_payload_layout() {
        let payload = DataPayload::Light(vec![
            LightHandle::from_bits(0xdead),
            LightHandle::from_bits(0xbeef),
        ]);
        assert_eq!(payload.format(), DataFormat::Light);
        assert_eq!(payload.len(), 2);

        let ptr = payload.as_ptr() as *const u64;
        unsafe {
            assert_eq!(*ptr, 0xdead);
            assert_eq!(*ptr.add(1), 0xbeef);
        }
    }
}
