//! Canonical pixel format descriptions.
//!
//! Every container-native format code (DDS bitmasks, DXGI codes, GL
//! tuples) converges to one [`PixelFormat`]. The rest of the workspace
//! asks this crate three kinds of questions:
//!
//! - classification: [`PixelFormat::family`], [`PixelFormat::is_compressed`],
//!   [`PixelFormat::channel_count`], ...
//! - storage arithmetic: bytes per texel or block, block geometry
//! - logical texels: [`decode_texel`] / [`encode_texel`] convert between
//!   raw bytes and an `[f32; 4]` working value for plain formats
//!
//! The crate is stateless and does no I/O.

mod pixel_format;
mod texel;

pub use pixel_format::{FormatFamily, PixelFormat};
pub use texel::{decode_texel, encode_texel};
