//! Host bindings
//!
//! The `ospray` extension module for Python, built on pyo3.

mod python;

pub use python::{ospray_module, PyElements, PyValue};
