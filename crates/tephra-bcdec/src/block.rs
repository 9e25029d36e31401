//! Per-block decode routines.
//!
//! All routines take the block's destination region as a base slice plus
//! explicit strides in bytes: `x_stride` between horizontally adjacent
//! texels, `y_stride` between rows. `w`/`h` clip the block against the
//! surface edge for surfaces narrower than 4 texels.

/// Palette construction rule for the color block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// BC1 rule: `c0 <= c1` selects the 3-color + transparent-black palette.
    Bc1,
    /// BC2/BC3 context: always the 4-color palette, alpha comes from its
    /// own block.
    Opaque,
}

/// Decode one BC1-style color block.
///
/// Endpoints are two RGB565 words expanded to 8 bits by shifting; the
/// remaining four bytes hold 16 2-bit palette indices, row by row from
/// the low bits. `red` and `blue` are the destination byte offsets of the
/// red and blue channels, letting callers produce BGR output by swapping
/// them. When `alpha` names a destination offset, punch-through alpha is
/// written there: 0 for index 3 in the 3-color palette, 255 otherwise.
#[allow(clippy::too_many_arguments)]
pub fn decode_color_block(
    dst: &mut [u8],
    w: usize,
    h: usize,
    x_stride: usize,
    y_stride: usize,
    red: usize,
    blue: usize,
    alpha: Option<usize>,
    mode: ColorMode,
    src: &[u8],
) {
    let c0 = u16::from_le_bytes([src[0], src[1]]);
    let c1 = u16::from_le_bytes([src[2], src[3]]);

    let mut colors = [[0u8; 3]; 4];
    colors[0] = [
        (((c0 >> 11) & 0x1F) << 3) as u8,
        (((c0 >> 5) & 0x3F) << 2) as u8,
        ((c0 & 0x1F) << 3) as u8,
    ];
    colors[1] = [
        (((c1 >> 11) & 0x1F) << 3) as u8,
        (((c1 >> 5) & 0x3F) << 2) as u8,
        ((c1 & 0x1F) << 3) as u8,
    ];

    let four_color = c0 > c1 || mode == ColorMode::Opaque;
    if four_color {
        for i in 0..3 {
            colors[2][i] =
                ((2 * colors[0][i] as u16 + colors[1][i] as u16 + 1) / 3) as u8;
            colors[3][i] =
                ((colors[0][i] as u16 + 2 * colors[1][i] as u16 + 1) / 3) as u8;
        }
    } else {
        for i in 0..3 {
            colors[2][i] = ((colors[0][i] as u16 + colors[1][i] as u16 + 1) >> 1) as u8;
            colors[3][i] = 0;
        }
    }

    for y in 0..h {
        let mut indices = src[4 + y] as u32;
        let row = y * y_stride;
        for x in 0..w {
            let index = (indices & 0x3) as usize;
            let color = &colors[index];
            let base = row + x * x_stride;
            dst[base + red] = color[0];
            dst[base + 1] = color[1];
            dst[base + blue] = color[2];
            if let Some(alpha) = alpha {
                dst[base + alpha] = if !four_color && index == 3 { 0 } else { 255 };
            }
            indices >>= 2;
        }
    }
}

/// Decode one BC2 explicit-alpha block: 16 4-bit values scaled by 17.
pub fn decode_bc2_alpha_block(
    dst: &mut [u8],
    w: usize,
    h: usize,
    x_stride: usize,
    y_stride: usize,
    src: &[u8],
) {
    for y in 0..h {
        let mut alpha = u16::from_le_bytes([src[2 * y], src[2 * y + 1]]) as u32;
        let row = y * y_stride;
        for x in 0..w {
            dst[row + x * x_stride] = ((alpha & 0xF) * 17) as u8;
            alpha >>= 4;
        }
    }
}

/// Decode one BC3/BC4-style interpolated-alpha block.
///
/// Two 8-bit endpoints followed by 16 3-bit indices packed into 48 bits.
/// `a0 > a1` selects the 7-step ramp; otherwise the 5-step ramp with
/// indices 6 and 7 pinned to 0 and 255.
pub fn decode_bc3_alpha_block(
    dst: &mut [u8],
    w: usize,
    h: usize,
    x_stride: usize,
    y_stride: usize,
    src: &[u8],
) {
    let a0 = src[0] as u32;
    let a1 = src[1] as u32;
    let mut indices = u64::from_le_bytes([
        src[0], src[1], src[2], src[3], src[4], src[5], src[6], src[7],
    ]) >> 16;

    for y in 0..h {
        let row = y * y_stride;
        for x in 0..w {
            let k = (indices & 0x7) as u32;
            let value = if k == 0 {
                a0
            } else if k == 1 {
                a1
            } else if a0 > a1 {
                ((8 - k) * a0 + (k - 1) * a1) / 7
            } else if k >= 6 {
                if k == 6 {
                    0
                } else {
                    255
                }
            } else {
                ((6 - k) * a0 + (k - 1) * a1) / 5
            };
            dst[row + x * x_stride] = value as u8;
            indices >>= 3;
        }
        // narrow surfaces still consume a full row of index bits
        if w < 4 {
            indices >>= 3 * (4 - w as u64);
        }
    }
}
