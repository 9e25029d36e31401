//! KTX v1 texture container parsing.
//!
//! A KTX file is a 12-byte identifier, a 32-bit endianness sentinel, 12
//! 32-bit header fields describing the GL format tuple and geometry, a
//! key-value block, and per-level pixel data: each mip level is prefixed
//! with its stored byte size and padded to 4 bytes. Non-array cubemaps
//! store the size of a single face; the six faces follow, each padded to
//! 4 bytes.
//!
//! Byte-swapped files (sentinel `0x01020304`) are detected and refused;
//! no correction path exists.
//!
//! # Example
//!
//! ```no_run
//! use tephra_ktx::KtxReader;
//!
//! let data = std::fs::read("texture.ktx")?;
//! let reader = KtxReader::new(&data)?;
//! println!("{}x{} {:?}", reader.width(), reader.height(), reader.format());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
pub mod gl;
mod header;
mod reader;

pub use error::{Error, Result};
pub use header::KtxHeader;
pub use reader::KtxReader;

/// The 12-byte KTX v1 file identifier.
pub const KTX_IDENTIFIER: &[u8; 12] = &[
    0xAB, 0x4B, 0x54, 0x58, 0x20, 0x31, 0x31, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
];

/// Endianness sentinel as written by a same-endian producer.
pub const KTX_ENDIAN_REF: u32 = 0x0403_0201;

/// Endianness sentinel as it appears when the producer was byte-swapped.
pub const KTX_ENDIAN_REF_SWAPPED: u32 = 0x0102_0304;

/// Check if data starts with the KTX v1 identifier.
pub fn is_ktx(data: &[u8]) -> bool {
    data.len() >= KTX_IDENTIFIER.len() && &data[..KTX_IDENTIFIER.len()] == KTX_IDENTIFIER
}
