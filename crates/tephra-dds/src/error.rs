//! Error types for DDS handling.

use thiserror::Error;

use crate::FourCC;

/// Errors that can occur when parsing DDS files.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] tephra_common::Error),

    /// Invalid DDS header.
    #[error("invalid DDS header: {0}")]
    InvalidHeader(String),

    /// The DXGI format code is out of range or unsupported.
    #[error("unsupported DXGI format code {0}")]
    UnknownDxgiFormat(u32),

    /// The FourCC compression code is unsupported.
    #[error("unsupported FourCC {0:?}")]
    UnknownFourCc(FourCC),

    /// The pixel format could not be matched against any known layout.
    #[error("unrecognized pixel format (flags {flags:#x}, {bit_count} bpp)")]
    UnknownFormat { flags: u32, bit_count: u32 },

    /// Declared bits-per-pixel disagrees with the matched format.
    #[error("pixel format size mismatch: header declares {bit_count} bpp, format needs {expected} bytes")]
    FormatSizeMismatch { bit_count: u32, expected: u32 },

    /// Requested mip level does not exist.
    #[error("mip level {level} out of range ({count} levels)")]
    LevelOutOfRange { level: u32, count: u32 },

    /// Pixel data ends before the requested level.
    #[error("pixel data truncated: needed {needed} bytes, file holds {available}")]
    Truncated { needed: usize, available: usize },
}

/// Result type for DDS operations.
pub type Result<T> = std::result::Result<T, Error>;
