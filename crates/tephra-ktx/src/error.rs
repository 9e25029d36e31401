//! Error types for KTX handling.

use thiserror::Error;

/// Errors that can occur when parsing KTX v1 files.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] tephra_common::Error),

    /// The 12-byte identifier is wrong.
    #[error("not a KTX v1 file")]
    InvalidIdentifier,

    /// The endianness sentinel marks a byte-swapped producer.
    #[error("KTX file is byte-swapped; endian correction is not supported")]
    EndianMismatch,

    /// Invalid header field.
    #[error("invalid KTX header: {0}")]
    InvalidHeader(String),

    /// The GL format tuple is unknown.
    #[error(
        "unsupported GL format tuple (internal {internal_format:#x}, format {format:#x}, type {gl_type:#x})"
    )]
    UnknownGlFormat {
        internal_format: u32,
        format: u32,
        gl_type: u32,
    },

    /// Requested mip level does not exist.
    #[error("mip level {level} out of range ({count} levels)")]
    LevelOutOfRange { level: u32, count: u32 },

    /// Pixel data ends before the requested level.
    #[error("pixel data truncated: needed {needed} bytes, file holds {available}")]
    Truncated { needed: usize, available: usize },
}

/// Result type for KTX operations.
pub type Result<T> = std::result::Result<T, Error>;
