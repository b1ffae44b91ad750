//! Type marshaling - scripting values to native scalars and packed vectors
//!
//! Design: conversions are written against [`HostValue`], so the same helpers
//! serve the Python binding and plain-Rust tests. Every helper is single-pass
//! and allocates at most one output container.

use std::borrow::Cow;
use std::ffi::CString;

use num_traits::AsPrimitive;

use crate::errors::{BridgeError, BridgeResult};
use crate::interop::handle::{Handle, Kind};
use crate::interop::types::Vec2i;

/// One value owned by the scripting host
pub trait HostValue: Sized {
    /// Iterator over the elements of a sequence value
    type Iter: Iterator<Item = BridgeResult<Self>>;

    /// Host-side type name, for error messages
    fn type_name(&self) -> Cow<'_, str>;

    /// The value as a float: floats, and integers too wide for `as_integer`
    fn as_float(&self) -> Option<f64>;

    /// The value as an integer, only if it is integral and fits in `i64`
    fn as_integer(&self) -> Option<i64>;

    /// Whether the value is an integer of any width
    fn is_integer(&self) -> bool {
        self.as_integer().is_some()
    }

    /// The value as text, only if it is a string
    fn as_text(&self) -> Option<Cow<'_, str>>;

    /// Iterator over the elements, `None` if the value is not a sequence.
    ///
    /// Strings are not sequences here.
    fn elements(&self) -> Option<Self::Iter>;
}

/// Convert to `f32`. Integers are widened.
pub fn to_float<V: HostValue>(value: &V) -> BridgeResult<f32> {
    to_number(value, "float")
}

/// Convert to `i32` with C cast semantics (floats truncate).
pub fn to_int<V: HostValue>(value: &V) -> BridgeResult<i32> {
    to_number(value, "int")
}

/// Convert to `i64`. Floats are rejected, wider integers overflow.
pub fn to_long<V: HostValue>(value: &V) -> BridgeResult<i64> {
    match value.as_integer() {
        Some(i) => Ok(i),
        None if value.is_integer() => Err(BridgeError::Overflow("i64")),
        None => Err(BridgeError::type_mismatch("int", value.type_name())),
    }
}

/// Convert to an owned string.
pub fn to_string<V: HostValue>(value: &V) -> BridgeResult<String> {
    value
        .as_text()
        .map(Cow::into_owned)
        .ok_or_else(|| BridgeError::type_mismatch("str", value.type_name()))
}

/// Convert an integer value to a handle of kind `K`.
pub fn to_handle<K: Kind, V: HostValue>(value: &V) -> BridgeResult<Handle<K>> {
    to_long(value).map(Handle::from_raw)
}

/// Convert a sequence element by element, preserving order.
///
/// Fails on the first element that does not convert; the partial output is
/// dropped with the error.
pub fn to_vec<V, T, F>(value: &V, convert: F) -> BridgeResult<Vec<T>>
where
    V: HostValue,
    F: Fn(&V) -> BridgeResult<T>,
{
    let elements = value
        .elements()
        .ok_or_else(|| BridgeError::type_mismatch("iterable", value.type_name()))?;

    let (lower, _) = elements.size_hint();
    let mut out = Vec::with_capacity(lower);
    for element in elements {
        out.push(convert(&element?)?);
    }
    Ok(out)
}

pub fn to_floats<V: HostValue>(value: &V) -> BridgeResult<Vec<f32>> {
    to_vec(value, to_float)
}

pub fn to_ints<V: HostValue>(value: &V) -> BridgeResult<Vec<i32>> {
    to_vec(value, to_int)
}

pub fn to_longs<V: HostValue>(value: &V) -> BridgeResult<Vec<i64>> {
    to_vec(value, to_long)
}

pub fn to_strings<V: HostValue>(value: &V) -> BridgeResult<Vec<String>> {
    to_vec(value, to_string)
}

pub fn to_handles<K: Kind, V: HostValue>(value: &V) -> BridgeResult<Vec<Handle<K>>> {
    to_vec(value, to_handle::<K, V>)
}

/// Exactly `N` floats
pub fn to_float_array<V: HostValue, const N: usize>(value: &V) -> BridgeResult<[f32; N]> {
    let floats = to_floats(value)?;
    let found = floats.len();
    floats
        .try_into()
        .map_err(|_| BridgeError::VectorLength { expected: N, found })
}

/// A `(width, height)` pair from any two-element sequence of integers
pub fn to_size<V: HostValue>(value: &V) -> BridgeResult<Vec2i> {
    let items = to_longs(value)?;
    let [x, y] = <[i64; 2]>::try_from(items).map_err(|items| BridgeError::VectorLength {
        expected: 2,
        found: items.len(),
    })?;
    match (i32::try_from(x), i32::try_from(y)) {
        (Ok(x), Ok(y)) => Ok(Vec2i::new(x, y)),
        _ => Err(BridgeError::InvalidSize(format!("({}, {})", x, y))),
    }
}

/// NUL-terminated copy of a string headed for the native side
pub fn to_cstring(text: &str) -> BridgeResult<CString> {
    CString::new(text).map_err(|_| BridgeError::InteriorNul(text.to_string()))
}

fn to_number<V, T>(value: &V, expected: &'static str) -> BridgeResult<T>
where
    V: HostValue,
    T: Copy + 'static,
    f64: AsPrimitive<T>,
    i64: AsPrimitive<T>,
{
    if let Some(f) = value.as_float() {
        return Ok(f.as_());
    }
    if let Some(i) = value.as_integer() {
        return Ok(i.as_());
    }
    if value.is_integer() {
        return Err(BridgeError::Overflow(expected));
    }
    Err(BridgeError::type_mismatch(expected, value.type_name()))
}
