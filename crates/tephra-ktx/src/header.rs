//! KTX v1 header structure.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// KTX v1 header.
///
/// Follows the 12-byte identifier. All fields are 32-bit words in the
/// producer's endianness; the `endianness` sentinel says which.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct KtxHeader {
    /// Endianness sentinel (0x04030201 when same-endian).
    pub endianness: u32,
    /// GL type of the texel data (0 for compressed formats).
    pub gl_type: u32,
    /// Size in bytes of the GL type.
    pub gl_type_size: u32,
    /// GL format of the texel data (0 for compressed formats).
    pub gl_format: u32,
    /// GL sized internal format.
    pub gl_internal_format: u32,
    /// GL base internal format.
    pub gl_base_internal_format: u32,
    /// Width in texels.
    pub pixel_width: u32,
    /// Height in texels (0 for 1D textures).
    pub pixel_height: u32,
    /// Depth in texels (0 for non-volume textures).
    pub pixel_depth: u32,
    /// Array element count (0 for non-array textures).
    pub number_of_array_elements: u32,
    /// Face count: 1, or 6 for cubemaps.
    pub number_of_faces: u32,
    /// Mip level count (0 requests runtime generation, treated as 1).
    pub number_of_mipmap_levels: u32,
    /// Byte length of the key-value block that follows.
    pub bytes_of_key_value_data: u32,
}
