//! DDS texture container parsing.
//!
//! A DDS file is a 4-byte magic (`"DDS "`), a 124-byte header with a
//! 32-byte pixel-format sub-block, an optional 20-byte DX10 extension
//! (when the FourCC is `"DX10"`), an optional 1024-byte palette for
//! P8/A8P8, and then the pixel data: one full mip chain per cube face or
//! array element, largest level first. Per-level sizes are computed from
//! the format, never stored.
//!
//! # Example
//!
//! ```no_run
//! use tephra_dds::DdsReader;
//!
//! let data = std::fs::read("texture.dds")?;
//! let mut reader = DdsReader::new(&data)?;
//! println!("{}x{} {:?}", reader.width(), reader.height(), reader.format());
//! let top_level = reader.image_data(0)?;
//! # let _ = top_level;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod format;
mod header;
mod reader;

pub use error::{Error, Result};
pub use format::{decode_format, encode_format, FormatEncoding};
pub use header::{DdsHeader, DdsHeaderDxt10, DdsPixelFormat, FourCC};
pub use reader::DdsReader;

/// DDS file magic bytes ("DDS ").
pub const DDS_MAGIC: &[u8; 4] = b"DDS ";

/// Check if data starts with the DDS magic.
pub fn is_dds(data: &[u8]) -> bool {
    data.len() >= DDS_MAGIC.len() && &data[..DDS_MAGIC.len()] == DDS_MAGIC
}
