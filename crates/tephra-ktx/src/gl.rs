//! GL constants and the tuple <-> [`PixelFormat`] translation tables.
//!
//! KTX v1 describes formats as a `(type, type_size, format,
//! internal_format)` tuple. Sized internal formats identify the canonical
//! format on their own; legacy unsized internal formats fall back to the
//! `(format, type)` pair. [`format_to_gl`] emits one deterministic tuple
//! per format - the first table row - so encoding is not the exact
//! inverse of every accepted spelling.

use tephra_format::PixelFormat;

// texel types
pub const GL_BYTE: u32 = 0x1400;
pub const GL_UNSIGNED_BYTE: u32 = 0x1401;
pub const GL_SHORT: u32 = 0x1402;
pub const GL_UNSIGNED_SHORT: u32 = 0x1403;
pub const GL_FLOAT: u32 = 0x1406;
pub const GL_HALF_FLOAT: u32 = 0x140B;
pub const GL_UNSIGNED_SHORT_4_4_4_4: u32 = 0x8033;
pub const GL_UNSIGNED_SHORT_5_5_5_1: u32 = 0x8034;
pub const GL_UNSIGNED_SHORT_5_6_5: u32 = 0x8363;
pub const GL_UNSIGNED_INT_2_10_10_10_REV: u32 = 0x8368;
pub const GL_UNSIGNED_INT_10F_11F_11F_REV: u32 = 0x8C3B;
pub const GL_UNSIGNED_INT_5_9_9_9_REV: u32 = 0x8C3E;

// unsized formats
pub const GL_ALPHA: u32 = 0x1906;
pub const GL_RGB: u32 = 0x1907;
pub const GL_RGBA: u32 = 0x1908;
pub const GL_LUMINANCE: u32 = 0x1909;
pub const GL_LUMINANCE_ALPHA: u32 = 0x190A;
pub const GL_RED: u32 = 0x1903;
pub const GL_RG: u32 = 0x8227;
pub const GL_BGR: u32 = 0x80E0;
pub const GL_BGRA: u32 = 0x80E1;

// sized internal formats
pub const GL_R8: u32 = 0x8229;
pub const GL_RG8: u32 = 0x822B;
pub const GL_RGB8: u32 = 0x8051;
pub const GL_RGBA8: u32 = 0x8058;
pub const GL_SRGB8: u32 = 0x8C41;
pub const GL_SRGB8_ALPHA8: u32 = 0x8C43;
pub const GL_R8_SNORM: u32 = 0x8F94;
pub const GL_RG8_SNORM: u32 = 0x8F95;
pub const GL_RGBA8_SNORM: u32 = 0x8F97;
pub const GL_R16: u32 = 0x822A;
pub const GL_RG16: u32 = 0x822C;
pub const GL_RGB16: u32 = 0x8054;
pub const GL_RGBA16: u32 = 0x805B;
pub const GL_RGBA16_SNORM: u32 = 0x8F9B;
pub const GL_R16F: u32 = 0x822D;
pub const GL_RG16F: u32 = 0x822F;
pub const GL_RGB16F: u32 = 0x881B;
pub const GL_RGBA16F: u32 = 0x881A;
pub const GL_R32F: u32 = 0x822E;
pub const GL_RG32F: u32 = 0x8230;
pub const GL_RGB32F: u32 = 0x8815;
pub const GL_RGBA32F: u32 = 0x8814;
pub const GL_RGB565: u32 = 0x8D62;
pub const GL_RGBA4: u32 = 0x8056;
pub const GL_RGB5_A1: u32 = 0x8057;
pub const GL_RGB10_A2: u32 = 0x8059;
pub const GL_RGB9_E5: u32 = 0x8C3D;
pub const GL_R11F_G11F_B10F: u32 = 0x8C3A;
pub const GL_ALPHA8: u32 = 0x803C;

// compressed internal formats
pub const GL_COMPRESSED_RGB_S3TC_DXT1: u32 = 0x83F0;
pub const GL_COMPRESSED_RGBA_S3TC_DXT1: u32 = 0x83F1;
pub const GL_COMPRESSED_RGBA_S3TC_DXT3: u32 = 0x83F2;
pub const GL_COMPRESSED_RGBA_S3TC_DXT5: u32 = 0x83F3;
pub const GL_COMPRESSED_SRGB_S3TC_DXT1: u32 = 0x8C4C;
pub const GL_COMPRESSED_SRGB_ALPHA_S3TC_DXT1: u32 = 0x8C4D;
pub const GL_COMPRESSED_SRGB_ALPHA_S3TC_DXT3: u32 = 0x8C4E;
pub const GL_COMPRESSED_SRGB_ALPHA_S3TC_DXT5: u32 = 0x8C4F;
pub const GL_COMPRESSED_RED_RGTC1: u32 = 0x8DBB;
pub const GL_COMPRESSED_SIGNED_RED_RGTC1: u32 = 0x8DBC;
pub const GL_COMPRESSED_RG_RGTC2: u32 = 0x8DBD;
pub const GL_COMPRESSED_SIGNED_RG_RGTC2: u32 = 0x8DBE;
pub const GL_COMPRESSED_RGBA_BPTC_UNORM: u32 = 0x8E8C;
pub const GL_COMPRESSED_SRGB_ALPHA_BPTC_UNORM: u32 = 0x8E8D;
pub const GL_COMPRESSED_RGB_BPTC_UNSIGNED_FLOAT: u32 = 0x8E8F;
pub const GL_ETC1_RGB8_OES: u32 = 0x8D64;
pub const GL_COMPRESSED_RGB_PVRTC_4BPPV1: u32 = 0x8C00;
pub const GL_COMPRESSED_RGB_PVRTC_2BPPV1: u32 = 0x8C01;
pub const GL_COMPRESSED_RGBA_PVRTC_4BPPV1: u32 = 0x8C02;
pub const GL_COMPRESSED_RGBA_PVRTC_2BPPV1: u32 = 0x8C03;
pub const GL_COMPRESSED_SRGB_PVRTC_2BPPV1: u32 = 0x8A54;
pub const GL_COMPRESSED_SRGB_PVRTC_4BPPV1: u32 = 0x8A55;
pub const GL_COMPRESSED_SRGB_ALPHA_PVRTC_2BPPV1: u32 = 0x8A56;
pub const GL_COMPRESSED_SRGB_ALPHA_PVRTC_4BPPV1: u32 = 0x8A57;

/// One GL spelling of a pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlFormat {
    pub internal_format: u32,
    pub format: u32,
    pub gl_type: u32,
    pub type_size: u32,
}

/// Canonical table: one row per [`PixelFormat`] with a GL expression.
/// Compressed rows carry format 0 / type 0 / type size 1 as KTX requires.
const GL_TABLE: &[(PixelFormat, GlFormat)] = &[
    (PixelFormat::R8, gl(GL_R8, GL_RED, GL_UNSIGNED_BYTE, 1)),
    (PixelFormat::Rg8, gl(GL_RG8, GL_RG, GL_UNSIGNED_BYTE, 1)),
    (PixelFormat::Rgb8, gl(GL_RGB8, GL_RGB, GL_UNSIGNED_BYTE, 1)),
    (PixelFormat::Rgba8, gl(GL_RGBA8, GL_RGBA, GL_UNSIGNED_BYTE, 1)),
    (PixelFormat::Srgb8, gl(GL_SRGB8, GL_RGB, GL_UNSIGNED_BYTE, 1)),
    (PixelFormat::Srgba8, gl(GL_SRGB8_ALPHA8, GL_RGBA, GL_UNSIGNED_BYTE, 1)),
    (PixelFormat::A8, gl(GL_ALPHA8, GL_ALPHA, GL_UNSIGNED_BYTE, 1)),
    (PixelFormat::R8S, gl(GL_R8_SNORM, GL_RED, GL_BYTE, 1)),
    (PixelFormat::Rg8S, gl(GL_RG8_SNORM, GL_RG, GL_BYTE, 1)),
    (PixelFormat::Rgba8S, gl(GL_RGBA8_SNORM, GL_RGBA, GL_BYTE, 1)),
    (PixelFormat::R16, gl(GL_R16, GL_RED, GL_UNSIGNED_SHORT, 2)),
    (PixelFormat::Rg16, gl(GL_RG16, GL_RG, GL_UNSIGNED_SHORT, 2)),
    (PixelFormat::Rgb16, gl(GL_RGB16, GL_RGB, GL_UNSIGNED_SHORT, 2)),
    (PixelFormat::Rgba16, gl(GL_RGBA16, GL_RGBA, GL_UNSIGNED_SHORT, 2)),
    (PixelFormat::Rgba16S, gl(GL_RGBA16_SNORM, GL_RGBA, GL_SHORT, 2)),
    (PixelFormat::R16F, gl(GL_R16F, GL_RED, GL_HALF_FLOAT, 2)),
    (PixelFormat::Rg16F, gl(GL_RG16F, GL_RG, GL_HALF_FLOAT, 2)),
    (PixelFormat::Rgb16F, gl(GL_RGB16F, GL_RGB, GL_HALF_FLOAT, 2)),
    (PixelFormat::Rgba16F, gl(GL_RGBA16F, GL_RGBA, GL_HALF_FLOAT, 2)),
    (PixelFormat::R32F, gl(GL_R32F, GL_RED, GL_FLOAT, 4)),
    (PixelFormat::Rg32F, gl(GL_RG32F, GL_RG, GL_FLOAT, 4)),
    (PixelFormat::Rgb32F, gl(GL_RGB32F, GL_RGB, GL_FLOAT, 4)),
    (PixelFormat::Rgba32F, gl(GL_RGBA32F, GL_RGBA, GL_FLOAT, 4)),
    (PixelFormat::Rgb565, gl(GL_RGB565, GL_RGB, GL_UNSIGNED_SHORT_5_6_5, 2)),
    (PixelFormat::Rgba4, gl(GL_RGBA4, GL_RGBA, GL_UNSIGNED_SHORT_4_4_4_4, 2)),
    (PixelFormat::Rgb5A1, gl(GL_RGB5_A1, GL_RGBA, GL_UNSIGNED_SHORT_5_5_5_1, 2)),
    (PixelFormat::Rgb10A2, gl(GL_RGB10_A2, GL_RGBA, GL_UNSIGNED_INT_2_10_10_10_REV, 4)),
    (PixelFormat::Rgb9E5, gl(GL_RGB9_E5, GL_RGB, GL_UNSIGNED_INT_5_9_9_9_REV, 4)),
    (PixelFormat::Rg11B10F, gl(GL_R11F_G11F_B10F, GL_RGB, GL_UNSIGNED_INT_10F_11F_11F_REV, 4)),
    (PixelFormat::Bc1, gl(GL_COMPRESSED_RGBA_S3TC_DXT1, 0, 0, 1)),
    (PixelFormat::Bc1Srgb, gl(GL_COMPRESSED_SRGB_ALPHA_S3TC_DXT1, 0, 0, 1)),
    (PixelFormat::Bc2, gl(GL_COMPRESSED_RGBA_S3TC_DXT3, 0, 0, 1)),
    (PixelFormat::Bc2Srgb, gl(GL_COMPRESSED_SRGB_ALPHA_S3TC_DXT3, 0, 0, 1)),
    (PixelFormat::Bc3, gl(GL_COMPRESSED_RGBA_S3TC_DXT5, 0, 0, 1)),
    (PixelFormat::Bc3Srgb, gl(GL_COMPRESSED_SRGB_ALPHA_S3TC_DXT5, 0, 0, 1)),
    (PixelFormat::Bc4, gl(GL_COMPRESSED_RED_RGTC1, 0, 0, 1)),
    (PixelFormat::Bc4S, gl(GL_COMPRESSED_SIGNED_RED_RGTC1, 0, 0, 1)),
    (PixelFormat::Bc5, gl(GL_COMPRESSED_RG_RGTC2, 0, 0, 1)),
    (PixelFormat::Bc5S, gl(GL_COMPRESSED_SIGNED_RG_RGTC2, 0, 0, 1)),
    (PixelFormat::Bc6h, gl(GL_COMPRESSED_RGB_BPTC_UNSIGNED_FLOAT, 0, 0, 1)),
    (PixelFormat::Bc7, gl(GL_COMPRESSED_RGBA_BPTC_UNORM, 0, 0, 1)),
    (PixelFormat::Bc7Srgb, gl(GL_COMPRESSED_SRGB_ALPHA_BPTC_UNORM, 0, 0, 1)),
    (PixelFormat::Etc1, gl(GL_ETC1_RGB8_OES, 0, 0, 1)),
    (PixelFormat::Pvrtc2, gl(GL_COMPRESSED_RGB_PVRTC_2BPPV1, 0, 0, 1)),
    (PixelFormat::Pvrtc2A, gl(GL_COMPRESSED_RGBA_PVRTC_2BPPV1, 0, 0, 1)),
    (PixelFormat::Pvrtc4, gl(GL_COMPRESSED_RGB_PVRTC_4BPPV1, 0, 0, 1)),
    (PixelFormat::Pvrtc4A, gl(GL_COMPRESSED_RGBA_PVRTC_4BPPV1, 0, 0, 1)),
    (PixelFormat::Pvrtc2Srgb, gl(GL_COMPRESSED_SRGB_PVRTC_2BPPV1, 0, 0, 1)),
    (PixelFormat::Pvrtc2ASrgb, gl(GL_COMPRESSED_SRGB_ALPHA_PVRTC_2BPPV1, 0, 0, 1)),
    (PixelFormat::Pvrtc4Srgb, gl(GL_COMPRESSED_SRGB_PVRTC_4BPPV1, 0, 0, 1)),
    (PixelFormat::Pvrtc4ASrgb, gl(GL_COMPRESSED_SRGB_ALPHA_PVRTC_4BPPV1, 0, 0, 1)),
];

const fn gl(internal_format: u32, format: u32, gl_type: u32, type_size: u32) -> GlFormat {
    GlFormat {
        internal_format,
        format,
        gl_type,
        type_size,
    }
}

/// Resolve a KTX GL tuple to a canonical format.
///
/// Sized internal formats resolve directly; unsized ones (plain `GL_RGB`
/// and friends from GLES 2 era producers) fall back to the
/// `(format, type)` pair. Extra DXT1 spellings without alpha fold into
/// BC1.
pub fn format_from_gl(
    internal_format: u32,
    format: u32,
    gl_type: u32,
) -> Option<PixelFormat> {
    for &(pixel_format, entry) in GL_TABLE {
        if entry.internal_format == internal_format {
            return Some(pixel_format);
        }
    }

    // alias spellings not in the canonical table
    match internal_format {
        GL_COMPRESSED_RGB_S3TC_DXT1 => return Some(PixelFormat::Bc1),
        GL_COMPRESSED_SRGB_S3TC_DXT1 => return Some(PixelFormat::Bc1Srgb),
        _ => {}
    }

    // unsized internal formats: decide from the client format and type
    match (format, gl_type) {
        (GL_RED | GL_LUMINANCE, GL_UNSIGNED_BYTE) => Some(PixelFormat::R8),
        (GL_ALPHA, GL_UNSIGNED_BYTE) => Some(PixelFormat::A8),
        (GL_RG | GL_LUMINANCE_ALPHA, GL_UNSIGNED_BYTE) => Some(PixelFormat::Rg8),
        (GL_RGB, GL_UNSIGNED_BYTE) => Some(PixelFormat::Rgb8),
        (GL_RGBA, GL_UNSIGNED_BYTE) => Some(PixelFormat::Rgba8),
        (GL_BGR, GL_UNSIGNED_BYTE) => Some(PixelFormat::Bgr8),
        (GL_BGRA, GL_UNSIGNED_BYTE) => Some(PixelFormat::Bgra8),
        (GL_RGB, GL_UNSIGNED_SHORT_5_6_5) => Some(PixelFormat::Rgb565),
        (GL_RGBA, GL_UNSIGNED_SHORT_4_4_4_4) => Some(PixelFormat::Rgba4),
        (GL_RGBA, GL_UNSIGNED_SHORT_5_5_5_1) => Some(PixelFormat::Rgb5A1),
        _ => None,
    }
}

/// The canonical GL tuple for a format, if one exists.
pub fn format_to_gl(format: PixelFormat) -> Option<GlFormat> {
    GL_TABLE
        .iter()
        .find(|(pixel_format, _)| *pixel_format == format)
        .map(|&(_, entry)| entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_round_trips() {
        for &(format, entry) in GL_TABLE {
            let decoded = format_from_gl(entry.internal_format, entry.format, entry.gl_type);
            assert_eq!(decoded, Some(format), "row {format:?}");
            assert_eq!(format_to_gl(format), Some(entry));
        }
    }

    #[test]
    fn test_dxt1_aliases_fold_into_bc1() {
        assert_eq!(
            format_from_gl(GL_COMPRESSED_RGB_S3TC_DXT1, 0, 0),
            Some(PixelFormat::Bc1)
        );
        assert_eq!(
            format_from_gl(GL_COMPRESSED_RGBA_S3TC_DXT1, 0, 0),
            Some(PixelFormat::Bc1)
        );
        // encoding picks the canonical alpha spelling
        assert_eq!(
            format_to_gl(PixelFormat::Bc1).map(|e| e.internal_format),
            Some(GL_COMPRESSED_RGBA_S3TC_DXT1)
        );
    }

    #[test]
    fn test_unsized_fallback() {
        assert_eq!(
            format_from_gl(GL_RGBA, GL_RGBA, GL_UNSIGNED_BYTE),
            Some(PixelFormat::Rgba8)
        );
        assert_eq!(
            format_from_gl(GL_RGB, GL_RGB, GL_UNSIGNED_SHORT_5_6_5),
            Some(PixelFormat::Rgb565)
        );
    }

    #[test]
    fn test_unknown_tuple() {
        assert_eq!(format_from_gl(0xFFFF, 0xFFFF, 0xFFFF), None);
    }
}
