//! Whole-surface decode driver.

use tephra_format::PixelFormat;
use thiserror::Error;

use crate::block::{decode_bc2_alpha_block, decode_bc3_alpha_block, decode_color_block, ColorMode};

/// Errors from [`decode_blocks`].
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The format has no software block decoder.
    #[error("no software decoder for {0:?}")]
    UnsupportedFormat(PixelFormat),

    /// Source buffer too small for the surface.
    #[error("compressed source truncated: needed {needed} bytes, got {available}")]
    SourceTruncated { needed: usize, available: usize },

    /// Destination buffer too small for the decoded surface.
    #[error("decode destination too small: needed {needed} bytes, got {available}")]
    DestinationTruncated { needed: usize, available: usize },
}

/// Decode a whole BC1-BC5 surface into packed rows of the format's
/// expanded plain format (one byte per channel, channel count by format).
///
/// `src_row_padding` bytes of source are skipped after each row of
/// blocks, covering row-aligned source layouts. Signed BC4/BC5 data
/// decodes through the same integer ramp; the snorm bytes pass through
/// unconverted.
pub fn decode_blocks(
    dst: &mut [u8],
    src: &[u8],
    width: usize,
    height: usize,
    format: PixelFormat,
    src_row_padding: usize,
) -> Result<(), DecodeError> {
    use PixelFormat::*;

    let (block_bytes, channels) = match format {
        Bc1 | Bc1Srgb => (8, 4),
        Bc2 | Bc2Srgb | Bc3 | Bc3Srgb => (16, 4),
        Bc4 | Bc4S => (8, 1),
        Bc5 | Bc5S => (16, 2),
        other => return Err(DecodeError::UnsupportedFormat(other)),
    };

    let blocks_x = width.div_ceil(4).max(1);
    let blocks_y = height.div_ceil(4).max(1);
    let needed_src = blocks_y * (blocks_x * block_bytes + src_row_padding);
    if src.len() < needed_src {
        return Err(DecodeError::SourceTruncated {
            needed: needed_src,
            available: src.len(),
        });
    }
    let needed_dst = width * height * channels;
    if dst.len() < needed_dst {
        return Err(DecodeError::DestinationTruncated {
            needed: needed_dst,
            available: dst.len(),
        });
    }

    let y_stride = width * channels;
    let mut src_pos = 0;

    for by in 0..blocks_y {
        let y = by * 4;
        let bh = (height - y).min(4);
        for bx in 0..blocks_x {
            let x = bx * 4;
            let bw = (width - x).min(4);
            let dst_base = y * y_stride + x * channels;
            let block = &src[src_pos..src_pos + block_bytes];

            match format {
                Bc1 | Bc1Srgb => {
                    decode_color_block(
                        &mut dst[dst_base..],
                        bw,
                        bh,
                        channels,
                        y_stride,
                        0,
                        2,
                        Some(3),
                        ColorMode::Bc1,
                        block,
                    );
                }
                Bc2 | Bc2Srgb => {
                    decode_bc2_alpha_block(
                        &mut dst[dst_base + 3..],
                        bw,
                        bh,
                        channels,
                        y_stride,
                        block,
                    );
                    decode_color_block(
                        &mut dst[dst_base..],
                        bw,
                        bh,
                        channels,
                        y_stride,
                        0,
                        2,
                        None,
                        ColorMode::Opaque,
                        &block[8..],
                    );
                }
                Bc3 | Bc3Srgb => {
                    decode_bc3_alpha_block(
                        &mut dst[dst_base + 3..],
                        bw,
                        bh,
                        channels,
                        y_stride,
                        block,
                    );
                    decode_color_block(
                        &mut dst[dst_base..],
                        bw,
                        bh,
                        channels,
                        y_stride,
                        0,
                        2,
                        None,
                        ColorMode::Opaque,
                        &block[8..],
                    );
                }
                Bc4 | Bc4S => {
                    decode_bc3_alpha_block(
                        &mut dst[dst_base..],
                        bw,
                        bh,
                        channels,
                        y_stride,
                        block,
                    );
                }
                Bc5 | Bc5S => {
                    decode_bc3_alpha_block(
                        &mut dst[dst_base..],
                        bw,
                        bh,
                        channels,
                        y_stride,
                        block,
                    );
                    decode_bc3_alpha_block(
                        &mut dst[dst_base + 1..],
                        bw,
                        bh,
                        channels,
                        y_stride,
                        &block[8..],
                    );
                }
                _ => unreachable!(),
            }

            src_pos += block_bytes;
        }
        src_pos += src_row_padding;
    }

    Ok(())
}
