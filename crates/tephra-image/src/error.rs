//! Error types for the image entity, its operations and loading.

use tephra_format::PixelFormat;
use thiserror::Error;

/// Errors constructing an [`Image`](crate::Image) from existing parts.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The provided buffer does not match the geometry's byte size.
    #[error("pixel buffer is {actual} bytes, geometry needs {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// A geometry field is out of range.
    #[error("invalid image geometry: {0}")]
    InvalidGeometry(String),
}

/// Errors from loading an image out of container bytes.
#[derive(Debug, Error)]
pub enum LoadError {
    /// I/O error reading the source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The container bytes could not be decoded.
    #[error("container decoding failed: {0}")]
    Decoding(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The pixel buffer could not be allocated.
    #[error("pixel buffer allocation of {requested} bytes failed")]
    Allocation { requested: usize },

    /// No registered loader succeeded for the extension.
    #[error("no loader succeeded for extension {extension:?}")]
    NoLoader { extension: String },
}

impl LoadError {
    /// Wrap a parser error as a decoding failure.
    pub fn decoding<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Decoding(Box::new(err))
    }
}

/// Errors from image operations.
#[derive(Debug, Error)]
pub enum OpError {
    /// The operation has no implementation for this format.
    #[error("operation not supported for {0:?}")]
    UnsupportedFormat(PixelFormat),

    /// The image violates a precondition of the operation.
    #[error("{0}")]
    UnsupportedPrecondition(String),

    /// Block decoding failed.
    #[error(transparent)]
    Decode(#[from] tephra_bcdec::DecodeError),
}
