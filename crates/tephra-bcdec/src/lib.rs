//! Software decoder for BC1-BC5 block-compressed texture data.
//!
//! Each 4x4 block decodes into caller-provided output with explicit
//! per-texel and per-row strides, so the same routines serve any plain
//! destination layout. [`decode_blocks`] drives the per-block routines
//! over a whole surface.
//!
//! BC6H, BC7, ETC and PVRTC have no software path here; callers reject
//! them up front.

mod block;
mod decode;

pub use block::{decode_bc2_alpha_block, decode_bc3_alpha_block, decode_color_block, ColorMode};
pub use decode::{decode_blocks, DecodeError};
