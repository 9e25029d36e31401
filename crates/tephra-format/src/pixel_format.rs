//! The canonical pixel format enum and its classification helpers.

/// Canonical pixel format.
///
/// Naming follows channel order in memory, lowest address first, with a
/// suffix for the interpretation: no suffix is unsigned normalized, `S`
/// is signed normalized, `F` is floating point. Packed formats name the
/// logical channel layout of the packed word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    // 8-bit unorm
    R8,
    Rg8,
    Rgb8,
    Rgba8,
    Bgr8,
    Bgra8,
    A8,
    // 8-bit snorm
    R8S,
    Rg8S,
    Rgba8S,
    // 16-bit unorm
    R16,
    Rg16,
    Rgb16,
    Rgba16,
    Rgba16S,
    // half float
    R16F,
    Rg16F,
    Rgb16F,
    Rgba16F,
    // 32-bit float
    R32F,
    Rg32F,
    Rgb32F,
    Rgba32F,
    // packed 16-bit
    Rgb565,
    Rgba4,
    Rgb5A1,
    // packed 32-bit
    Rgb10A2,
    Rgb9E5,
    Rg11B10F,
    // sRGB
    Srgb8,
    Srgba8,
    Sbgra8,
    // block compressed
    Bc1,
    Bc1Srgb,
    Bc2,
    Bc2Srgb,
    Bc3,
    Bc3Srgb,
    Bc4,
    Bc4S,
    Bc5,
    Bc5S,
    Bc6h,
    Bc7,
    Bc7Srgb,
    Etc1,
    // PVRTC (size accounting only, no decoder)
    Pvrtc2,
    Pvrtc2A,
    Pvrtc4,
    Pvrtc4A,
    Pvrtc2Srgb,
    Pvrtc2ASrgb,
    Pvrtc4Srgb,
    Pvrtc4ASrgb,
    // palettized
    P8,
    A8P8,
}

/// Storage family of a pixel format.
///
/// Sizing and addressing code matches on this instead of re-deriving the
/// classification from format ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatFamily {
    /// One texel per element of `bytes_per_texel` bytes.
    Uncompressed { bytes_per_texel: u32 },
    /// Fixed-size blocks of texels.
    BlockCompressed {
        block_width: u32,
        block_height: u32,
        block_depth: u32,
        bytes_per_block: u32,
    },
    /// PVRTC: sized in bits per texel over tile-padded dimensions.
    Pvrtc {
        bits_per_texel: u32,
        min_tile_width: u32,
        min_tile_height: u32,
    },
    /// Palette index formats; `bytes_per_texel` covers the index width.
    Clut { bytes_per_texel: u32 },
}

impl PixelFormat {
    /// Storage family of this format.
    pub fn family(self) -> FormatFamily {
        use PixelFormat::*;
        match self {
            R8 | R8S | A8 => FormatFamily::Uncompressed { bytes_per_texel: 1 },
            Rg8 | Rg8S | R16 | R16F | Rgb565 | Rgba4 | Rgb5A1 => {
                FormatFamily::Uncompressed { bytes_per_texel: 2 }
            }
            Rgb8 | Bgr8 | Srgb8 => FormatFamily::Uncompressed { bytes_per_texel: 3 },
            Rgba8 | Rgba8S | Bgra8 | Srgba8 | Sbgra8 | Rg16 | Rg16F | R32F | Rgb10A2 | Rgb9E5
            | Rg11B10F => FormatFamily::Uncompressed { bytes_per_texel: 4 },
            Rgb16 | Rgb16F => FormatFamily::Uncompressed { bytes_per_texel: 6 },
            Rgba16 | Rgba16S | Rgba16F | Rg32F => {
                FormatFamily::Uncompressed { bytes_per_texel: 8 }
            }
            Rgb32F => FormatFamily::Uncompressed {
                bytes_per_texel: 12,
            },
            Rgba32F => FormatFamily::Uncompressed {
                bytes_per_texel: 16,
            },
            Bc1 | Bc1Srgb | Bc4 | Bc4S | Etc1 => FormatFamily::BlockCompressed {
                block_width: 4,
                block_height: 4,
                block_depth: 1,
                bytes_per_block: 8,
            },
            Bc2 | Bc2Srgb | Bc3 | Bc3Srgb | Bc5 | Bc5S | Bc6h | Bc7 | Bc7Srgb => {
                FormatFamily::BlockCompressed {
                    block_width: 4,
                    block_height: 4,
                    block_depth: 1,
                    bytes_per_block: 16,
                }
            }
            Pvrtc2 | Pvrtc2A | Pvrtc2Srgb | Pvrtc2ASrgb => FormatFamily::Pvrtc {
                bits_per_texel: 2,
                min_tile_width: 16,
                min_tile_height: 8,
            },
            Pvrtc4 | Pvrtc4A | Pvrtc4Srgb | Pvrtc4ASrgb => FormatFamily::Pvrtc {
                bits_per_texel: 4,
                min_tile_width: 8,
                min_tile_height: 8,
            },
            P8 => FormatFamily::Clut { bytes_per_texel: 1 },
            A8P8 => FormatFamily::Clut { bytes_per_texel: 2 },
        }
    }

    /// Number of color channels the format carries.
    pub fn channel_count(self) -> u32 {
        use PixelFormat::*;
        match self {
            R8 | R8S | A8 | R16 | R16F | R32F | Bc4 | Bc4S | P8 => 1,
            Rg8 | Rg8S | Rg16 | Rg16F | Rg32F | Bc5 | Bc5S | A8P8 => 2,
            Rgb8 | Bgr8 | Srgb8 | Rgb16 | Rgb16F | Rgb32F | Rgb565 | Rgb9E5 | Rg11B10F | Bc6h
            | Etc1 | Pvrtc2 | Pvrtc2Srgb | Pvrtc4 | Pvrtc4Srgb => 3,
            Rgba8 | Rgba8S | Bgra8 | Srgba8 | Sbgra8 | Rgba16 | Rgba16S | Rgba16F | Rgba32F
            | Rgba4 | Rgb5A1 | Rgb10A2 | Bc1 | Bc1Srgb | Bc2 | Bc2Srgb | Bc3 | Bc3Srgb | Bc7
            | Bc7Srgb | Pvrtc2A | Pvrtc2ASrgb | Pvrtc4A | Pvrtc4ASrgb => 4,
        }
    }

    /// Whether the format stores blocks or tiles rather than addressable texels.
    pub fn is_compressed(self) -> bool {
        matches!(
            self.family(),
            FormatFamily::BlockCompressed { .. } | FormatFamily::Pvrtc { .. }
        )
    }

    /// Whether the channels are floating point.
    pub fn is_float(self) -> bool {
        use PixelFormat::*;
        matches!(
            self,
            R16F | Rg16F | Rgb16F | Rgba16F | R32F | Rg32F | Rgb32F | Rgba32F | Rg11B10F | Bc6h
        )
    }

    /// Whether the channels are signed.
    pub fn is_signed(self) -> bool {
        use PixelFormat::*;
        matches!(self, R8S | Rg8S | Rgba8S | Rgba16S | Bc4S | Bc5S) || self.is_float()
    }

    /// Whether the format is tagged with the sRGB transfer function.
    pub fn is_srgb(self) -> bool {
        use PixelFormat::*;
        matches!(
            self,
            Srgb8
                | Srgba8
                | Sbgra8
                | Bc1Srgb
                | Bc2Srgb
                | Bc3Srgb
                | Bc7Srgb
                | Pvrtc2Srgb
                | Pvrtc2ASrgb
                | Pvrtc4Srgb
                | Pvrtc4ASrgb
        )
    }

    /// Whether the format stores its channels in separate planes.
    ///
    /// No supported format does; the predicate exists so callers can gate
    /// on it without knowing the enum's contents.
    pub fn is_planar(self) -> bool {
        false
    }

    /// Whether the format indexes into a color lookup table.
    pub fn is_palettized(self) -> bool {
        matches!(self.family(), FormatFamily::Clut { .. })
    }

    /// Plain formats have directly addressable channels of uniform width
    /// (no packing, no compression, no palette).
    pub fn is_plain(self) -> bool {
        self.channel_width_bytes().is_some()
    }

    /// Channel width in bytes for plain formats, `None` otherwise.
    pub fn channel_width_bytes(self) -> Option<u32> {
        use PixelFormat::*;
        match self {
            R8 | Rg8 | Rgb8 | Rgba8 | Bgr8 | Bgra8 | A8 | R8S | Rg8S | Rgba8S | Srgb8 | Srgba8
            | Sbgra8 => Some(1),
            R16 | Rg16 | Rgb16 | Rgba16 | Rgba16S | R16F | Rg16F | Rgb16F | Rgba16F => Some(2),
            R32F | Rg32F | Rgb32F | Rgba32F => Some(4),
            _ => None,
        }
    }

    /// Bytes covered by one element (texel or block) of this format.
    pub fn bytes_per_element(self) -> u32 {
        match self.family() {
            FormatFamily::Uncompressed { bytes_per_texel } => bytes_per_texel,
            FormatFamily::BlockCompressed {
                bytes_per_block, ..
            } => bytes_per_block,
            // PVRTC has no per-element size; sizing goes through the tile formula.
            FormatFamily::Pvrtc { .. } => 0,
            FormatFamily::Clut { bytes_per_texel } => bytes_per_texel,
        }
    }

    /// Block footprint, `(width, height, depth)`. Uncompressed and palette
    /// formats count as 1x1x1 blocks.
    pub fn block_dimensions(self) -> (u32, u32, u32) {
        match self.family() {
            FormatFamily::BlockCompressed {
                block_width,
                block_height,
                block_depth,
                ..
            } => (block_width, block_height, block_depth),
            _ => (1, 1, 1),
        }
    }

    /// The plain unorm format a software decoder expands this format to,
    /// chosen by channel count.
    pub fn expanded_format(self) -> PixelFormat {
        match self.channel_count() {
            1 => PixelFormat::R8,
            2 => PixelFormat::Rg8,
            3 => PixelFormat::Rgb8,
            _ => PixelFormat::Rgba8,
        }
    }
}
