//! Typed opaque handles
//!
//! Design: the binding never owns native objects. A handle is only the bit
//! pattern of the native pointer, tagged at compile time with the kind of
//! object it names so a geometry cannot be passed where a model is expected.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

/// Marker for a kind of native object
pub trait Kind: 'static {
    /// Name used in logs
    const NAME: &'static str;
}

macro_rules! kinds {
    ($($(#[$doc:meta])* $ty:ident => $name:literal),* $(,)?) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub enum $ty {}

            impl Kind for $ty {
                const NAME: &'static str = $name;
            }
        )*
    };
}

kinds! {
    /// Any managed object (the erased kind)
    Object => "object",
    Camera => "camera",
    Renderer => "renderer",
    Light => "light",
    Model => "model",
    Geometry => "geometry",
    FrameBuffer => "framebuffer",
    /// Typed data array
    Data => "data",
}

/// Opaque native handle of kind `K`
///
/// Layout is exactly a `u64`, so a slice of handles can be handed to the
/// native side as an array of object pointers.
#[repr(transparent)]
pub struct Handle<K: Kind> {
    raw: u64,
    _kind: PhantomData<fn() -> K>,
}

impl<K: Kind> Handle<K> {
    /// The null handle
    pub const NULL: Self = Self::from_bits(0);

    #[inline]
    pub const fn from_bits(raw: u64) -> Self {
        Self {
            raw,
            _kind: PhantomData,
        }
    }

    /// Build from the signed integer the scripting host carries
    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        Self::from_bits(raw as u64)
    }

    /// Signed integer for the scripting host
    #[inline]
    pub const fn into_raw(self) -> i64 {
        self.raw as i64
    }

    #[inline]
    pub const fn bits(self) -> u64 {
        self.raw
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.raw == 0
    }

    #[inline]
    pub fn as_ptr(self) -> *mut core::ffi::c_void {
        self.raw as usize as *mut core::ffi::c_void
    }

    #[inline]
    pub fn from_ptr(ptr: *mut core::ffi::c_void) -> Self {
        Self::from_bits(ptr as usize as u64)
    }

    /// Forget the kind, for operations accepting any object
    #[inline]
    pub const fn erase(self) -> Handle<Object> {
        Handle::from_bits(self.raw)
    }
}

impl<K: Kind> Clone for Handle<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: Kind> Copy for Handle<K> {}

impl<K: Kind> PartialEq for Handle<K> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<K: Kind> Eq for Handle<K> {}

impl<K: Kind> Hash for Handle<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<K: Kind> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:#x})", K::NAME, self.raw)
    }
}

impl<K: Kind> fmt::Display for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.raw)
    }
}

impl<K: Kind> Default for Handle<K> {
    fn default() -> Self {
        Self::NULL
    }
}

pub type ObjectHandle = Handle<Object>;
pub type CameraHandle = Handle<Camera>;
pub type RendererHandle = Handle<Renderer>;
pub type LightHandle = Handle<Light>;
pub type ModelHandle = Handle<Model>;
pub type GeometryHandle = Handle<Geometry>;
pub type FrameBufferHandle = Handle<FrameBuffer>;
pub type DataHandle = Handle<Data>;
