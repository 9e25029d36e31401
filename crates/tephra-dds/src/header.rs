//! DDS header structures.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// DDS file header.
///
/// This structure follows the 4-byte magic `"DDS "` at the start of the
/// file and is always 124 bytes.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct DdsHeader {
    /// Header size (must be 124).
    pub size: u32,
    /// Header flags (`DdsHeader::FLAG_*`).
    pub flags: u32,
    /// Image height.
    pub height: u32,
    /// Image width.
    pub width: u32,
    /// Pitch or linear size.
    pub pitch_or_linear_size: u32,
    /// Depth (for volume textures).
    pub depth: u32,
    /// Number of mipmap levels.
    pub mipmap_count: u32,
    /// Reserved.
    pub reserved1: [u32; 11],
    /// Pixel format.
    pub pixel_format: DdsPixelFormat,
    /// Surface capabilities.
    pub caps: u32,
    /// Surface capabilities 2.
    pub caps2: u32,
    /// Surface capabilities 3.
    pub caps3: u32,
    /// Surface capabilities 4.
    pub caps4: u32,
    /// Reserved.
    pub reserved2: u32,
}

impl DdsHeader {
    /// Expected header size.
    pub const SIZE: u32 = 124;

    /// Header carries a valid mipmap count.
    pub const FLAG_MIPMAP_COUNT: u32 = 0x20000;
    /// Header carries a valid depth.
    pub const FLAG_DEPTH: u32 = 0x800000;

    /// caps2: the surface is a cubemap.
    pub const CAPS2_CUBEMAP: u32 = 0x200;
    /// caps2: the surface is a volume texture.
    pub const CAPS2_VOLUME: u32 = 0x200000;

    /// Check if this header is followed by a DX10 extension.
    pub fn is_dx10(&self) -> bool {
        self.pixel_format.flags & DdsPixelFormat::FLAG_FOURCC != 0
            && self.pixel_format.four_cc == FourCC::DX10
    }

    /// Check if the surface is a cubemap.
    pub fn is_cubemap(&self) -> bool {
        self.caps2 & Self::CAPS2_CUBEMAP != 0
    }

    /// Check if the surface is a volume texture.
    pub fn is_volume(&self) -> bool {
        self.caps2 & Self::CAPS2_VOLUME != 0 && self.flags & Self::FLAG_DEPTH != 0
    }
}

/// DDS pixel format sub-block (32 bytes inside the header).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct DdsPixelFormat {
    /// Structure size (must be 32).
    pub size: u32,
    /// Pixel format flags (`DdsPixelFormat::FLAG_*`).
    pub flags: u32,
    /// Four-character code for compression.
    pub four_cc: FourCC,
    /// Number of bits per pixel (for uncompressed).
    pub rgb_bit_count: u32,
    /// Red bit mask.
    pub r_bit_mask: u32,
    /// Green bit mask.
    pub g_bit_mask: u32,
    /// Blue bit mask.
    pub b_bit_mask: u32,
    /// Alpha bit mask.
    pub a_bit_mask: u32,
}

impl DdsPixelFormat {
    /// Expected sub-block size.
    pub const SIZE: u32 = 32;

    /// Alpha channel present alongside the color masks.
    pub const FLAG_ALPHA_PIXELS: u32 = 0x1;
    /// Alpha-only surface.
    pub const FLAG_ALPHA: u32 = 0x2;
    /// FourCC field is valid.
    pub const FLAG_FOURCC: u32 = 0x4;
    /// 8-bit palette indices.
    pub const FLAG_PALETTE8: u32 = 0x20;
    /// Color bit masks are valid.
    pub const FLAG_RGB: u32 = 0x40;
    /// Luminance surface.
    pub const FLAG_LUMINANCE: u32 = 0x20000;
    /// Signed bump-map (du/dv) surface.
    pub const FLAG_BUMP_DUDV: u32 = 0x80000;
}

/// Four-character code for compression type.
#[derive(Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(transparent)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// BC1 compression.
    pub const DXT1: Self = Self(*b"DXT1");
    /// BC2 with premultiplied alpha.
    pub const DXT2: Self = Self(*b"DXT2");
    /// BC2 compression.
    pub const DXT3: Self = Self(*b"DXT3");
    /// BC3 with premultiplied alpha.
    pub const DXT4: Self = Self(*b"DXT4");
    /// BC3 compression.
    pub const DXT5: Self = Self(*b"DXT5");
    /// DX10 extended header.
    pub const DX10: Self = Self(*b"DX10");
    /// BC4 (single channel).
    pub const ATI1: Self = Self(*b"ATI1");
    /// BC4 unsigned.
    pub const BC4U: Self = Self(*b"BC4U");
    /// BC4 signed.
    pub const BC4S: Self = Self(*b"BC4S");
    /// BC5 (two channel).
    pub const ATI2: Self = Self(*b"ATI2");
    /// BC5 unsigned.
    pub const BC5U: Self = Self(*b"BC5U");
    /// BC5 signed.
    pub const BC5S: Self = Self(*b"BC5S");

    /// Interpret the code as a little-endian integer (legacy D3DFMT codes
    /// were stored numerically in this field).
    pub fn as_u32(self) -> u32 {
        u32::from_le_bytes(self.0)
    }
}

impl std::fmt::Debug for FourCC {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            write!(f, "FourCC({})", String::from_utf8_lossy(&self.0))
        } else {
            write!(f, "FourCC({:#x})", self.as_u32())
        }
    }
}

/// DX10 extended header (20 bytes after the main header).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct DdsHeaderDxt10 {
    /// DXGI format.
    pub dxgi_format: u32,
    /// Resource dimension (2 = 1D, 3 = 2D, 4 = 3D).
    pub resource_dimension: u32,
    /// Misc flags (0x4 = cubemap).
    pub misc_flag: u32,
    /// Array size.
    pub array_size: u32,
    /// Misc flags 2.
    pub misc_flags2: u32,
}

impl DdsHeaderDxt10 {
    /// misc_flag: texture cube.
    pub const MISC_TEXTURECUBE: u32 = 0x4;

    /// Highest DXGI format code accepted.
    pub const DXGI_FORMAT_MAX: u32 = 132;
}
