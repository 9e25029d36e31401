//! Translation between DDS-native format descriptions and [`PixelFormat`].
//!
//! Decoding follows the precedence real files require: a DX10 extension's
//! DXGI code wins outright; otherwise a FourCC is tried first as a legacy
//! numeric D3DFMT code, then as a block-compression code; only then are
//! the RGB bit masks, bump-map, luminance, alpha and palette flag
//! combinations consulted.

use tephra_format::{FormatFamily, PixelFormat};

use crate::{DdsHeader, DdsHeaderDxt10, DdsPixelFormat, Error, FourCC, Result};

/// DXGI format codes the decoder understands.
mod dxgi {
    pub const R32G32B32A32_FLOAT: u32 = 2;
    pub const R32G32B32_FLOAT: u32 = 6;
    pub const R16G16B16A16_FLOAT: u32 = 10;
    pub const R16G16B16A16_UNORM: u32 = 11;
    pub const R16G16B16A16_SNORM: u32 = 13;
    pub const R32G32_FLOAT: u32 = 16;
    pub const R10G10B10A2_UNORM: u32 = 24;
    pub const R11G11B10_FLOAT: u32 = 26;
    pub const R8G8B8A8_UNORM: u32 = 28;
    pub const R8G8B8A8_UNORM_SRGB: u32 = 29;
    pub const R8G8B8A8_SNORM: u32 = 31;
    pub const R16G16_FLOAT: u32 = 34;
    pub const R16G16_UNORM: u32 = 35;
    pub const R32_FLOAT: u32 = 41;
    pub const R8G8_UNORM: u32 = 49;
    pub const R8G8_SNORM: u32 = 51;
    pub const R16_FLOAT: u32 = 54;
    pub const R16_UNORM: u32 = 56;
    pub const R8_UNORM: u32 = 61;
    pub const R8_SNORM: u32 = 63;
    pub const A8_UNORM: u32 = 65;
    pub const R9G9B9E5_SHAREDEXP: u32 = 67;
    pub const BC1_UNORM: u32 = 71;
    pub const BC1_UNORM_SRGB: u32 = 72;
    pub const BC2_UNORM: u32 = 74;
    pub const BC2_UNORM_SRGB: u32 = 75;
    pub const BC3_UNORM: u32 = 77;
    pub const BC3_UNORM_SRGB: u32 = 78;
    pub const BC4_UNORM: u32 = 80;
    pub const BC4_SNORM: u32 = 81;
    pub const BC5_UNORM: u32 = 83;
    pub const BC5_SNORM: u32 = 84;
    pub const B5G6R5_UNORM: u32 = 85;
    pub const B5G5R5A1_UNORM: u32 = 86;
    pub const B8G8R8A8_UNORM: u32 = 87;
    pub const B8G8R8A8_UNORM_SRGB: u32 = 91;
    pub const BC6H_UF16: u32 = 95;
    pub const BC7_UNORM: u32 = 98;
    pub const BC7_UNORM_SRGB: u32 = 99;
    pub const B4G4R4A4_UNORM: u32 = 115;
}

/// Legacy D3DFMT codes stored numerically in the FourCC field.
mod d3dfmt {
    pub const A16B16G16R16: u32 = 36;
    pub const Q16W16V16U16: u32 = 110;
    pub const R16F: u32 = 111;
    pub const G16R16F: u32 = 112;
    pub const A16B16G16R16F: u32 = 113;
    pub const R32F: u32 = 114;
    pub const G32R32F: u32 = 115;
    pub const A32B32G32R32F: u32 = 116;
}

/// Bit-mask rows recognized for uncompressed formats.
///
/// `(bit_count, r, g, b, a, format, canonical)` - canonical rows are the
/// ones [`encode_format`] emits; the rest are aliases seen in the wild
/// (X8 variants, alpha-less 1555).
const BITMASK_TABLE: &[(u32, u32, u32, u32, u32, PixelFormat, bool)] = &[
    (32, 0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0xFF00_0000, PixelFormat::Rgba8, true),
    (32, 0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0x0000_0000, PixelFormat::Rgba8, false),
    (32, 0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0xFF00_0000, PixelFormat::Bgra8, true),
    (32, 0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0x0000_0000, PixelFormat::Bgra8, false),
    (32, 0x0000_03FF, 0x000F_FC00, 0x3FF0_0000, 0xC000_0000, PixelFormat::Rgb10A2, true),
    (32, 0x0000_FFFF, 0xFFFF_0000, 0x0000_0000, 0x0000_0000, PixelFormat::Rg16, true),
    (24, 0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0x0000_0000, PixelFormat::Bgr8, true),
    (24, 0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0x0000_0000, PixelFormat::Rgb8, true),
    (16, 0x0000_F800, 0x0000_07E0, 0x0000_001F, 0x0000_0000, PixelFormat::Rgb565, true),
    (16, 0x0000_7C00, 0x0000_03E0, 0x0000_001F, 0x0000_8000, PixelFormat::Rgb5A1, true),
    (16, 0x0000_7C00, 0x0000_03E0, 0x0000_001F, 0x0000_0000, PixelFormat::Rgb5A1, false),
    (16, 0x0000_0F00, 0x0000_00F0, 0x0000_000F, 0x0000_F000, PixelFormat::Rgba4, true),
    (16, 0x0000_00FF, 0x0000_FF00, 0x0000_0000, 0x0000_0000, PixelFormat::Rg8, true),
    (16, 0x0000_FFFF, 0x0000_0000, 0x0000_0000, 0x0000_0000, PixelFormat::R16, true),
    (8, 0x0000_00FF, 0x0000_0000, 0x0000_0000, 0x0000_0000, PixelFormat::R8, true),
];

fn format_from_dxgi(code: u32) -> Result<PixelFormat> {
    use PixelFormat::*;
    let format = match code {
        dxgi::R32G32B32A32_FLOAT => Rgba32F,
        dxgi::R32G32B32_FLOAT => Rgb32F,
        dxgi::R16G16B16A16_FLOAT => Rgba16F,
        dxgi::R16G16B16A16_UNORM => Rgba16,
        dxgi::R16G16B16A16_SNORM => Rgba16S,
        dxgi::R32G32_FLOAT => Rg32F,
        dxgi::R10G10B10A2_UNORM => Rgb10A2,
        dxgi::R11G11B10_FLOAT => Rg11B10F,
        dxgi::R8G8B8A8_UNORM => Rgba8,
        dxgi::R8G8B8A8_UNORM_SRGB => Srgba8,
        dxgi::R8G8B8A8_SNORM => Rgba8S,
        dxgi::R16G16_FLOAT => Rg16F,
        dxgi::R16G16_UNORM => Rg16,
        dxgi::R32_FLOAT => R32F,
        dxgi::R8G8_UNORM => Rg8,
        dxgi::R8G8_SNORM => Rg8S,
        dxgi::R16_FLOAT => R16F,
        dxgi::R16_UNORM => R16,
        dxgi::R8_UNORM => R8,
        dxgi::R8_SNORM => R8S,
        dxgi::A8_UNORM => A8,
        dxgi::R9G9B9E5_SHAREDEXP => Rgb9E5,
        dxgi::BC1_UNORM => Bc1,
        dxgi::BC1_UNORM_SRGB => Bc1Srgb,
        dxgi::BC2_UNORM => Bc2,
        dxgi::BC2_UNORM_SRGB => Bc2Srgb,
        dxgi::BC3_UNORM => Bc3,
        dxgi::BC3_UNORM_SRGB => Bc3Srgb,
        dxgi::BC4_UNORM => Bc4,
        dxgi::BC4_SNORM => Bc4S,
        dxgi::BC5_UNORM => Bc5,
        dxgi::BC5_SNORM => Bc5S,
        dxgi::B5G6R5_UNORM => Rgb565,
        dxgi::B5G5R5A1_UNORM => Rgb5A1,
        dxgi::B8G8R8A8_UNORM => Bgra8,
        dxgi::B8G8R8A8_UNORM_SRGB => Sbgra8,
        dxgi::BC6H_UF16 => Bc6h,
        dxgi::BC7_UNORM => Bc7,
        dxgi::BC7_UNORM_SRGB => Bc7Srgb,
        dxgi::B4G4R4A4_UNORM => Rgba4,
        other => return Err(Error::UnknownDxgiFormat(other)),
    };
    Ok(format)
}

fn format_from_fourcc(four_cc: FourCC) -> Result<PixelFormat> {
    use PixelFormat::*;
    // legacy D3DFMT codes were stashed numerically in the FourCC field
    let format = match four_cc.as_u32() {
        d3dfmt::A16B16G16R16 => return Ok(Rgba16),
        d3dfmt::Q16W16V16U16 => return Ok(Rgba16S),
        d3dfmt::R16F => return Ok(R16F),
        d3dfmt::G16R16F => return Ok(Rg16F),
        d3dfmt::A16B16G16R16F => return Ok(Rgba16F),
        d3dfmt::R32F => return Ok(R32F),
        d3dfmt::G32R32F => return Ok(Rg32F),
        d3dfmt::A32B32G32R32F => return Ok(Rgba32F),
        _ => match four_cc {
            FourCC::DXT1 => Bc1,
            FourCC::DXT2 | FourCC::DXT3 => Bc2,
            FourCC::DXT4 | FourCC::DXT5 => Bc3,
            FourCC::ATI1 | FourCC::BC4U => Bc4,
            FourCC::BC4S => Bc4S,
            FourCC::ATI2 | FourCC::BC5U => Bc5,
            FourCC::BC5S => Bc5S,
            other => return Err(Error::UnknownFourCc(other)),
        },
    };
    Ok(format)
}

fn format_from_masks(pf: &DdsPixelFormat) -> Result<PixelFormat> {
    let bit_count = pf.rgb_bit_count;
    let (r, g, b, a) = (pf.r_bit_mask, pf.g_bit_mask, pf.b_bit_mask, pf.a_bit_mask);
    for &(bits, tr, tg, tb, ta, format, _) in BITMASK_TABLE {
        if bit_count == bits && r == tr && g == tg && b == tb && a == ta {
            return Ok(format);
        }
    }
    Err(Error::UnknownFormat {
        flags: pf.flags,
        bit_count,
    })
}

/// Decode the pixel format described by a DDS header (and its DX10
/// extension when present).
pub fn decode_format(header: &DdsHeader, dx10: Option<&DdsHeaderDxt10>) -> Result<PixelFormat> {
    use PixelFormat::*;

    if let Some(dx10) = dx10 {
        let code = dx10.dxgi_format;
        if code == 0 || code > DdsHeaderDxt10::DXGI_FORMAT_MAX {
            return Err(Error::UnknownDxgiFormat(code));
        }
        return format_from_dxgi(code);
    }

    let pf = &header.pixel_format;
    let flags = pf.flags;

    if flags & DdsPixelFormat::FLAG_FOURCC != 0 {
        return format_from_fourcc(pf.four_cc);
    }

    if flags & DdsPixelFormat::FLAG_RGB != 0 {
        let format = format_from_masks(pf)?;
        // a mask row only matches its own bit count, but guard against
        // formats whose storage size disagrees with the declared bpp
        let expected = match format.family() {
            FormatFamily::Uncompressed { bytes_per_texel } => bytes_per_texel,
            _ => 0,
        };
        if expected != 0 && pf.rgb_bit_count / 8 != expected {
            return Err(Error::FormatSizeMismatch {
                bit_count: pf.rgb_bit_count,
                expected,
            });
        }
        return Ok(format);
    }

    if flags & DdsPixelFormat::FLAG_BUMP_DUDV != 0 {
        return match pf.rgb_bit_count {
            16 => Ok(Rg8S),
            32 => Ok(Rgba8S),
            bits => Err(Error::UnknownFormat { flags, bit_count: bits }),
        };
    }

    if flags & DdsPixelFormat::FLAG_LUMINANCE != 0 {
        return match (pf.rgb_bit_count, flags & DdsPixelFormat::FLAG_ALPHA_PIXELS != 0) {
            (8, false) => Ok(R8),
            (16, true) => Ok(Rg8),
            (16, false) => Ok(R16),
            (bits, _) => Err(Error::UnknownFormat { flags, bit_count: bits }),
        };
    }

    if flags & DdsPixelFormat::FLAG_ALPHA != 0 && pf.rgb_bit_count == 8 {
        return Ok(A8);
    }

    if flags & DdsPixelFormat::FLAG_PALETTE8 != 0 {
        return match pf.rgb_bit_count {
            8 => Ok(P8),
            16 => Ok(A8P8),
            bits => Err(Error::UnknownFormat { flags, bit_count: bits }),
        };
    }

    Err(Error::UnknownFormat {
        flags,
        bit_count: pf.rgb_bit_count,
    })
}

/// How a [`PixelFormat`] is expressed in a DDS header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatEncoding {
    /// Legacy FourCC code in the pixel-format sub-block.
    FourCc(FourCC),
    /// Uncompressed bit masks.
    Masks {
        flags: u32,
        bit_count: u32,
        r: u32,
        g: u32,
        b: u32,
        a: u32,
    },
    /// DX10 extension with a DXGI code.
    Dx10(u32),
}

/// Produce the DDS header encoding of a format, the inverse of
/// [`decode_format`]. Mask-representable formats get their canonical mask
/// row; block formats get a FourCC where one exists, a DXGI code
/// otherwise.
pub fn encode_format(format: PixelFormat) -> FormatEncoding {
    use PixelFormat::*;

    for &(bits, r, g, b, a, f, canonical) in BITMASK_TABLE {
        if canonical && f == format {
            let mut flags = DdsPixelFormat::FLAG_RGB;
            if a != 0 {
                flags |= DdsPixelFormat::FLAG_ALPHA_PIXELS;
            }
            return FormatEncoding::Masks {
                flags,
                bit_count: bits,
                r,
                g,
                b,
                a,
            };
        }
    }

    match format {
        Bc1 => FormatEncoding::FourCc(FourCC::DXT1),
        Bc2 => FormatEncoding::FourCc(FourCC::DXT3),
        Bc3 => FormatEncoding::FourCc(FourCC::DXT5),
        Bc4 => FormatEncoding::FourCc(FourCC::ATI1),
        Bc4S => FormatEncoding::FourCc(FourCC::BC4S),
        Bc5 => FormatEncoding::FourCc(FourCC::ATI2),
        Bc5S => FormatEncoding::FourCc(FourCC::BC5S),
        R16F => FormatEncoding::FourCc(FourCC(d3dfmt::R16F.to_le_bytes())),
        Rg16F => FormatEncoding::FourCc(FourCC(d3dfmt::G16R16F.to_le_bytes())),
        Rgba16F => FormatEncoding::FourCc(FourCC(d3dfmt::A16B16G16R16F.to_le_bytes())),
        R32F => FormatEncoding::FourCc(FourCC(d3dfmt::R32F.to_le_bytes())),
        Rg32F => FormatEncoding::FourCc(FourCC(d3dfmt::G32R32F.to_le_bytes())),
        Rgba32F => FormatEncoding::FourCc(FourCC(d3dfmt::A32B32G32R32F.to_le_bytes())),
        Rgba16 => FormatEncoding::FourCc(FourCC(d3dfmt::A16B16G16R16.to_le_bytes())),
        Bc1Srgb => FormatEncoding::Dx10(dxgi::BC1_UNORM_SRGB),
        Bc2Srgb => FormatEncoding::Dx10(dxgi::BC2_UNORM_SRGB),
        Bc3Srgb => FormatEncoding::Dx10(dxgi::BC3_UNORM_SRGB),
        Bc6h => FormatEncoding::Dx10(dxgi::BC6H_UF16),
        Bc7 => FormatEncoding::Dx10(dxgi::BC7_UNORM),
        Bc7Srgb => FormatEncoding::Dx10(dxgi::BC7_UNORM_SRGB),
        Srgba8 => FormatEncoding::Dx10(dxgi::R8G8B8A8_UNORM_SRGB),
        Sbgra8 => FormatEncoding::Dx10(dxgi::B8G8R8A8_UNORM_SRGB),
        Rgba8S => FormatEncoding::Dx10(dxgi::R8G8B8A8_SNORM),
        R8S => FormatEncoding::Dx10(dxgi::R8_SNORM),
        Rg8S => FormatEncoding::Dx10(dxgi::R8G8_SNORM),
        Rgba16S => FormatEncoding::Dx10(dxgi::R16G16B16A16_SNORM),
        Rgb9E5 => FormatEncoding::Dx10(dxgi::R9G9B9E5_SHAREDEXP),
        Rg11B10F => FormatEncoding::Dx10(dxgi::R11G11B10_FLOAT),
        Rgb32F => FormatEncoding::Dx10(dxgi::R32G32B32_FLOAT),
        Rg16 => FormatEncoding::Dx10(dxgi::R16G16_UNORM),
        A8 => FormatEncoding::Dx10(dxgi::A8_UNORM),
        // no DDS expression exists; fall back to an out-of-range DXGI code
        // so callers notice rather than write a wrong header
        other => FormatEncoding::Dx10(encode_fallback(other)),
    }
}

fn encode_fallback(format: PixelFormat) -> u32 {
    log::debug!("no DDS encoding for {format:?}");
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_with_masks(bits: u32, r: u32, g: u32, b: u32, a: u32) -> DdsHeader {
        let mut flags = DdsPixelFormat::FLAG_RGB;
        if a != 0 {
            flags |= DdsPixelFormat::FLAG_ALPHA_PIXELS;
        }
        DdsHeader {
            size: DdsHeader::SIZE,
            flags: 0,
            height: 4,
            width: 4,
            pitch_or_linear_size: 0,
            depth: 0,
            mipmap_count: 1,
            reserved1: [0; 11],
            pixel_format: DdsPixelFormat {
                size: DdsPixelFormat::SIZE,
                flags,
                four_cc: FourCC([0; 4]),
                rgb_bit_count: bits,
                r_bit_mask: r,
                g_bit_mask: g,
                b_bit_mask: b,
                a_bit_mask: a,
            },
            caps: 0,
            caps2: 0,
            caps3: 0,
            caps4: 0,
            reserved2: 0,
        }
    }

    #[test]
    fn test_bitmask_table_round_trips_through_encode() {
        for &(bits, r, g, b, a, format, canonical) in BITMASK_TABLE {
            // decode every row
            let header = header_with_masks(bits, r, g, b, a);
            assert_eq!(decode_format(&header, None).unwrap(), format);

            // canonical rows come back out of encode_format verbatim
            if canonical {
                match encode_format(format) {
                    FormatEncoding::Masks {
                        bit_count,
                        r: er,
                        g: eg,
                        b: eb,
                        a: ea,
                        ..
                    } => {
                        assert_eq!((bit_count, er, eg, eb, ea), (bits, r, g, b, a));
                    }
                    other => panic!("{format:?} should encode as masks, got {other:?}"),
                }
            }
        }
    }

    #[test]
    fn test_fourcc_precedence_over_masks() {
        let mut header = header_with_masks(32, 0xFF, 0xFF00, 0xFF0000, 0xFF000000);
        header.pixel_format.flags = DdsPixelFormat::FLAG_FOURCC;
        header.pixel_format.four_cc = FourCC::DXT5;
        assert_eq!(decode_format(&header, None).unwrap(), PixelFormat::Bc3);
    }

    #[test]
    fn test_legacy_numeric_fourcc() {
        let mut header = header_with_masks(0, 0, 0, 0, 0);
        header.pixel_format.flags = DdsPixelFormat::FLAG_FOURCC;
        header.pixel_format.four_cc = FourCC(114u32.to_le_bytes());
        assert_eq!(decode_format(&header, None).unwrap(), PixelFormat::R32F);
    }

    #[test]
    fn test_dx10_wins() {
        let mut header = header_with_masks(0, 0, 0, 0, 0);
        header.pixel_format.flags = DdsPixelFormat::FLAG_FOURCC;
        header.pixel_format.four_cc = FourCC::DX10;
        let dx10 = DdsHeaderDxt10 {
            dxgi_format: 71,
            resource_dimension: 3,
            misc_flag: 0,
            array_size: 1,
            misc_flags2: 0,
        };
        assert_eq!(
            decode_format(&header, Some(&dx10)).unwrap(),
            PixelFormat::Bc1
        );
    }

    #[test]
    fn test_out_of_range_dxgi_rejected() {
        let header = header_with_masks(0, 0, 0, 0, 0);
        let dx10 = DdsHeaderDxt10 {
            dxgi_format: 500,
            resource_dimension: 3,
            misc_flag: 0,
            array_size: 1,
            misc_flags2: 0,
        };
        assert!(matches!(
            decode_format(&header, Some(&dx10)),
            Err(Error::UnknownDxgiFormat(500))
        ));
    }

    #[test]
    fn test_luminance_and_palette_flags() {
        let mut header = header_with_masks(8, 0, 0, 0, 0);
        header.pixel_format.flags = DdsPixelFormat::FLAG_LUMINANCE;
        assert_eq!(decode_format(&header, None).unwrap(), PixelFormat::R8);

        header.pixel_format.flags = DdsPixelFormat::FLAG_PALETTE8;
        assert_eq!(decode_format(&header, None).unwrap(), PixelFormat::P8);

        header.pixel_format.flags = DdsPixelFormat::FLAG_ALPHA;
        assert_eq!(decode_format(&header, None).unwrap(), PixelFormat::A8);
    }

    #[test]
    fn test_unknown_masks_rejected() {
        let header = header_with_masks(32, 0xF0F0F0F0, 0x0F0F0F0F, 0, 0);
        assert!(matches!(
            decode_format(&header, None),
            Err(Error::UnknownFormat { .. })
        ));
    }
}
