//! Logical texel codec.
//!
//! Format conversion works through an `[f32; 4]` RGBA working value.
//! [`decode_texel`] reads one texel's raw bytes into that value and
//! [`encode_texel`] writes it back out in another format. Only plain and
//! packed-word formats participate; compressed and palettized formats
//! return `None`/`false` and take their own paths.
//!
//! Packed layouts match the D3D/DXGI bit assignments the containers use:
//! 565 puts red in the top bits, 5551 and 4444 put alpha in the top bits,
//! 10-10-10-2 puts red in the low bits.

use half::f16;

use crate::PixelFormat;

#[inline]
fn unorm8(v: u8) -> f32 {
    v as f32 / 255.0
}

#[inline]
fn snorm8(v: u8) -> f32 {
    (v as i8 as f32 / 127.0).max(-1.0)
}

#[inline]
fn unorm16(v: u16) -> f32 {
    v as f32 / 65535.0
}

#[inline]
fn snorm16(v: u16) -> f32 {
    (v as i16 as f32 / 32767.0).max(-1.0)
}

#[inline]
fn to_unorm8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

#[inline]
fn to_snorm8(v: f32) -> u8 {
    ((v.clamp(-1.0, 1.0) * 127.0).round() as i8) as u8
}

#[inline]
fn to_unorm16(v: f32) -> u16 {
    (v.clamp(0.0, 1.0) * 65535.0 + 0.5) as u16
}

#[inline]
fn to_snorm16(v: f32) -> u16 {
    ((v.clamp(-1.0, 1.0) * 32767.0).round() as i16) as u16
}

#[inline]
fn read_u16(bytes: &[u8], i: usize) -> u16 {
    u16::from_le_bytes([bytes[2 * i], bytes[2 * i + 1]])
}

#[inline]
fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[inline]
fn read_f32(bytes: &[u8], i: usize) -> f32 {
    f32::from_le_bytes([bytes[4 * i], bytes[4 * i + 1], bytes[4 * i + 2], bytes[4 * i + 3]])
}

fn rgb9e5_to_rgb(bits: u32) -> [f32; 3] {
    let e = ((bits >> 27) & 0x1F) as i32;
    let scale = (e - 15 - 9) as f32;
    let scale = scale.exp2();
    [
        (bits & 0x1FF) as f32 * scale,
        ((bits >> 9) & 0x1FF) as f32 * scale,
        ((bits >> 18) & 0x1FF) as f32 * scale,
    ]
}

fn rgb_to_rgb9e5(r: f32, g: f32, b: f32) -> u32 {
    let r = r.max(0.0);
    let g = g.max(0.0);
    let b = b.max(0.0);
    let max = r.max(g).max(b);
    if max < 1.52587890625e-5 {
        return 0;
    }
    // shared exponent, 9-bit mantissas
    let e = (max.log2().floor() as i32 + 1).clamp(-15, 16);
    let scale = ((e - 9) as f32).exp2();
    let r9 = ((r / scale) as u32).min(511);
    let g9 = ((g / scale) as u32).min(511);
    let b9 = ((b / scale) as u32).min(511);
    r9 | (g9 << 9) | (b9 << 18) | (((e + 15) as u32) << 27)
}

/// Decode one texel into an RGBA working value.
///
/// `bytes` must hold at least the format's texel size. Missing channels
/// read as 0 with alpha defaulting to 1. Returns `None` for formats with
/// no logical-texel path (compressed, palettized, 11-11-10 float).
pub fn decode_texel(format: PixelFormat, bytes: &[u8]) -> Option<[f32; 4]> {
    use PixelFormat::*;
    let mut rgba = [0.0, 0.0, 0.0, 1.0];
    match format {
        R8 | Srgb8 => rgba[0] = unorm8(bytes[0]),
        A8 => rgba[3] = unorm8(bytes[0]),
        Rg8 => {
            rgba[0] = unorm8(bytes[0]);
            rgba[1] = unorm8(bytes[1]);
        }
        Rgb8 => {
            for c in 0..3 {
                rgba[c] = unorm8(bytes[c]);
            }
        }
        Bgr8 => {
            rgba[0] = unorm8(bytes[2]);
            rgba[1] = unorm8(bytes[1]);
            rgba[2] = unorm8(bytes[0]);
        }
        Rgba8 | Srgba8 => {
            for c in 0..4 {
                rgba[c] = unorm8(bytes[c]);
            }
        }
        Bgra8 | Sbgra8 => {
            rgba[0] = unorm8(bytes[2]);
            rgba[1] = unorm8(bytes[1]);
            rgba[2] = unorm8(bytes[0]);
            rgba[3] = unorm8(bytes[3]);
        }
        R8S => rgba[0] = snorm8(bytes[0]),
        Rg8S => {
            rgba[0] = snorm8(bytes[0]);
            rgba[1] = snorm8(bytes[1]);
        }
        Rgba8S => {
            for c in 0..4 {
                rgba[c] = snorm8(bytes[c]);
            }
        }
        R16 => rgba[0] = unorm16(read_u16(bytes, 0)),
        Rg16 => {
            for c in 0..2 {
                rgba[c] = unorm16(read_u16(bytes, c));
            }
        }
        Rgb16 => {
            for c in 0..3 {
                rgba[c] = unorm16(read_u16(bytes, c));
            }
        }
        Rgba16 => {
            for c in 0..4 {
                rgba[c] = unorm16(read_u16(bytes, c));
            }
        }
        Rgba16S => {
            for c in 0..4 {
                rgba[c] = snorm16(read_u16(bytes, c));
            }
        }
        R16F => rgba[0] = f16::from_bits(read_u16(bytes, 0)).to_f32(),
        Rg16F => {
            for c in 0..2 {
                rgba[c] = f16::from_bits(read_u16(bytes, c)).to_f32();
            }
        }
        Rgb16F => {
            for c in 0..3 {
                rgba[c] = f16::from_bits(read_u16(bytes, c)).to_f32();
            }
        }
        Rgba16F => {
            for c in 0..4 {
                rgba[c] = f16::from_bits(read_u16(bytes, c)).to_f32();
            }
        }
        R32F => rgba[0] = read_f32(bytes, 0),
        Rg32F => {
            for c in 0..2 {
                rgba[c] = read_f32(bytes, c);
            }
        }
        Rgb32F => {
            for c in 0..3 {
                rgba[c] = read_f32(bytes, c);
            }
        }
        Rgba32F => {
            for c in 0..4 {
                rgba[c] = read_f32(bytes, c);
            }
        }
        Rgb565 => {
            let v = read_u16(bytes, 0);
            rgba[0] = ((v >> 11) & 0x1F) as f32 / 31.0;
            rgba[1] = ((v >> 5) & 0x3F) as f32 / 63.0;
            rgba[2] = (v & 0x1F) as f32 / 31.0;
        }
        Rgb5A1 => {
            let v = read_u16(bytes, 0);
            rgba[0] = ((v >> 10) & 0x1F) as f32 / 31.0;
            rgba[1] = ((v >> 5) & 0x1F) as f32 / 31.0;
            rgba[2] = (v & 0x1F) as f32 / 31.0;
            rgba[3] = (v >> 15) as f32;
        }
        Rgba4 => {
            let v = read_u16(bytes, 0);
            rgba[0] = ((v >> 8) & 0xF) as f32 / 15.0;
            rgba[1] = ((v >> 4) & 0xF) as f32 / 15.0;
            rgba[2] = (v & 0xF) as f32 / 15.0;
            rgba[3] = ((v >> 12) & 0xF) as f32 / 15.0;
        }
        Rgb10A2 => {
            let v = read_u32(bytes);
            rgba[0] = (v & 0x3FF) as f32 / 1023.0;
            rgba[1] = ((v >> 10) & 0x3FF) as f32 / 1023.0;
            rgba[2] = ((v >> 20) & 0x3FF) as f32 / 1023.0;
            rgba[3] = (v >> 30) as f32 / 3.0;
        }
        Rgb9E5 => {
            let [r, g, b] = rgb9e5_to_rgb(read_u32(bytes));
            rgba[0] = r;
            rgba[1] = g;
            rgba[2] = b;
        }
        _ => return None,
    }
    Some(rgba)
}

/// Encode an RGBA working value as one texel of `format` into `out`.
///
/// `out` must hold at least the format's texel size. Returns `false` for
/// formats with no logical-texel path.
pub fn encode_texel(format: PixelFormat, rgba: [f32; 4], out: &mut [u8]) -> bool {
    use PixelFormat::*;
    match format {
        R8 | Srgb8 => out[0] = to_unorm8(rgba[0]),
        A8 => out[0] = to_unorm8(rgba[3]),
        Rg8 => {
            out[0] = to_unorm8(rgba[0]);
            out[1] = to_unorm8(rgba[1]);
        }
        Rgb8 => {
            for c in 0..3 {
                out[c] = to_unorm8(rgba[c]);
            }
        }
        Bgr8 => {
            out[0] = to_unorm8(rgba[2]);
            out[1] = to_unorm8(rgba[1]);
            out[2] = to_unorm8(rgba[0]);
        }
        Rgba8 | Srgba8 => {
            for c in 0..4 {
                out[c] = to_unorm8(rgba[c]);
            }
        }
        Bgra8 | Sbgra8 => {
            out[0] = to_unorm8(rgba[2]);
            out[1] = to_unorm8(rgba[1]);
            out[2] = to_unorm8(rgba[0]);
            out[3] = to_unorm8(rgba[3]);
        }
        R8S => out[0] = to_snorm8(rgba[0]),
        Rg8S => {
            out[0] = to_snorm8(rgba[0]);
            out[1] = to_snorm8(rgba[1]);
        }
        Rgba8S => {
            for c in 0..4 {
                out[c] = to_snorm8(rgba[c]);
            }
        }
        R16 => out[..2].copy_from_slice(&to_unorm16(rgba[0]).to_le_bytes()),
        Rg16 => {
            for c in 0..2 {
                out[2 * c..2 * c + 2].copy_from_slice(&to_unorm16(rgba[c]).to_le_bytes());
            }
        }
        Rgb16 => {
            for c in 0..3 {
                out[2 * c..2 * c + 2].copy_from_slice(&to_unorm16(rgba[c]).to_le_bytes());
            }
        }
        Rgba16 => {
            for c in 0..4 {
                out[2 * c..2 * c + 2].copy_from_slice(&to_unorm16(rgba[c]).to_le_bytes());
            }
        }
        Rgba16S => {
            for c in 0..4 {
                out[2 * c..2 * c + 2].copy_from_slice(&to_snorm16(rgba[c]).to_le_bytes());
            }
        }
        R16F => out[..2].copy_from_slice(&f16::from_f32(rgba[0]).to_bits().to_le_bytes()),
        Rg16F => {
            for c in 0..2 {
                out[2 * c..2 * c + 2]
                    .copy_from_slice(&f16::from_f32(rgba[c]).to_bits().to_le_bytes());
            }
        }
        Rgb16F => {
            for c in 0..3 {
                out[2 * c..2 * c + 2]
                    .copy_from_slice(&f16::from_f32(rgba[c]).to_bits().to_le_bytes());
            }
        }
        Rgba16F => {
            for c in 0..4 {
                out[2 * c..2 * c + 2]
                    .copy_from_slice(&f16::from_f32(rgba[c]).to_bits().to_le_bytes());
            }
        }
        R32F => out[..4].copy_from_slice(&rgba[0].to_le_bytes()),
        Rg32F => {
            for c in 0..2 {
                out[4 * c..4 * c + 4].copy_from_slice(&rgba[c].to_le_bytes());
            }
        }
        Rgb32F => {
            for c in 0..3 {
                out[4 * c..4 * c + 4].copy_from_slice(&rgba[c].to_le_bytes());
            }
        }
        Rgba32F => {
            for c in 0..4 {
                out[4 * c..4 * c + 4].copy_from_slice(&rgba[c].to_le_bytes());
            }
        }
        Rgb565 => {
            let v = ((to_unorm8(rgba[0]) as u16 >> 3) << 11)
                | ((to_unorm8(rgba[1]) as u16 >> 2) << 5)
                | (to_unorm8(rgba[2]) as u16 >> 3);
            out[..2].copy_from_slice(&v.to_le_bytes());
        }
        Rgb5A1 => {
            let v = (((rgba[3] >= 0.5) as u16) << 15)
                | ((to_unorm8(rgba[0]) as u16 >> 3) << 10)
                | ((to_unorm8(rgba[1]) as u16 >> 3) << 5)
                | (to_unorm8(rgba[2]) as u16 >> 3);
            out[..2].copy_from_slice(&v.to_le_bytes());
        }
        Rgba4 => {
            let v = (((to_unorm8(rgba[3]) as u16) >> 4) << 12)
                | (((to_unorm8(rgba[0]) as u16) >> 4) << 8)
                | (((to_unorm8(rgba[1]) as u16) >> 4) << 4)
                | ((to_unorm8(rgba[2]) as u16) >> 4);
            out[..2].copy_from_slice(&v.to_le_bytes());
        }
        Rgb10A2 => {
            let r = (rgba[0].clamp(0.0, 1.0) * 1023.0 + 0.5) as u32;
            let g = (rgba[1].clamp(0.0, 1.0) * 1023.0 + 0.5) as u32;
            let b = (rgba[2].clamp(0.0, 1.0) * 1023.0 + 0.5) as u32;
            let a = (rgba[3].clamp(0.0, 1.0) * 3.0 + 0.5) as u32;
            let v = r | (g << 10) | (b << 20) | (a << 30);
            out[..4].copy_from_slice(&v.to_le_bytes());
        }
        Rgb9E5 => {
            let v = rgb_to_rgb9e5(rgba[0], rgba[1], rgba[2]);
            out[..4].copy_from_slice(&v.to_le_bytes());
        }
        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba8_round_trip() {
        let bytes = [10u8, 20, 30, 255];
        let rgba = decode_texel(PixelFormat::Rgba8, &bytes).unwrap();
        let mut out = [0u8; 4];
        assert!(encode_texel(PixelFormat::Rgba8, rgba, &mut out));
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_bgra_swizzle() {
        let bytes = [1u8, 2, 3, 4]; // b g r a in memory
        let rgba = decode_texel(PixelFormat::Bgra8, &bytes).unwrap();
        assert_eq!(rgba[0], 3.0 / 255.0);
        assert_eq!(rgba[2], 1.0 / 255.0);

        let mut out = [0u8; 4];
        assert!(encode_texel(PixelFormat::Rgba8, rgba, &mut out));
        assert_eq!(out, [3, 2, 1, 4]);
    }

    #[test]
    fn test_rgb565_pure_channels() {
        let red = 0xF800u16.to_le_bytes();
        let rgba = decode_texel(PixelFormat::Rgb565, &red).unwrap();
        assert_eq!(rgba, [1.0, 0.0, 0.0, 1.0]);

        let green = 0x07E0u16.to_le_bytes();
        let rgba = decode_texel(PixelFormat::Rgb565, &green).unwrap();
        assert_eq!(rgba, [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_f16_lane() {
        let one = f16::from_f32(1.0).to_bits().to_le_bytes();
        let bytes = [one[0], one[1], 0, 0];
        let rgba = decode_texel(PixelFormat::Rg16F, &bytes).unwrap();
        assert_eq!(rgba[0], 1.0);
        assert_eq!(rgba[1], 0.0);
    }

    #[test]
    fn test_rgb9e5_round_trip_ordering() {
        let mut out = [0u8; 4];
        assert!(encode_texel(
            PixelFormat::Rgb9E5,
            [0.5, 0.25, 1.0, 1.0],
            &mut out
        ));
        let rgba = decode_texel(PixelFormat::Rgb9E5, &out).unwrap();
        assert!((rgba[0] - 0.5).abs() < 0.01);
        assert!((rgba[1] - 0.25).abs() < 0.01);
        assert!((rgba[2] - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_no_path_for_compressed() {
        assert!(decode_texel(PixelFormat::Bc1, &[0u8; 8]).is_none());
        assert!(!encode_texel(PixelFormat::Bc1, [0.0; 4], &mut [0u8; 8]));
    }
}
