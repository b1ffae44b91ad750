//! Error type shared by every entry point of the bridge.

use std::io;
use thiserror::Error;

use crate::interop::LoadError;

pub type BridgeResult<T> = Result<T, BridgeError>;

/// Failure of a single binding call.
///
/// Argument-shape failures and semantic failures (unknown formats) share this
/// type, so every entry point reports errors the same way.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: String },

    #[error("Iteration failed: {0}")]
    HostIteration(String),

    #[error("Unsupported {kind} format '{name}'")]
    UnsupportedFormat { kind: &'static str, name: String },

    #[error("Expected a list of {expected} values, found {found}")]
    VectorLength { expected: usize, found: usize },

    #[error("Format '{format}' needs {expected} values, found {found}")]
    DataLength {
        format: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Integer too large to convert to {0}")]
    Overflow(&'static str),

    #[error("Invalid size: {0}")]
    InvalidSize(String),

    #[error("String contains an interior NUL byte: {0:?}")]
    InteriorNul(String),

    #[error("Mapping frame buffer {0:#x} returned null")]
    MapFailed(u64),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    LibraryLoad(#[from] LoadError),
}

impl BridgeError {
    pub fn type_mismatch(expected: &'static str, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected,
            found: found.into(),
        }
    }

    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
