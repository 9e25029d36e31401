//! KTX container reader.

use tephra_common::{align_up, memchr, BinaryReader};
use tephra_format::{FormatFamily, PixelFormat};

use crate::{
    gl, Error, KtxHeader, Result, KTX_ENDIAN_REF, KTX_ENDIAN_REF_SWAPPED, KTX_IDENTIFIER,
};

/// Parsed KTX v1 container.
///
/// Construction validates the identifier, endianness sentinel and header
/// and resolves the GL format tuple. Mip levels are prefixed with their
/// stored size in the file, so level offsets are discovered lazily and
/// cached as levels are queried.
#[derive(Debug)]
pub struct KtxReader<'a> {
    data: &'a [u8],
    header: KtxHeader,
    format: PixelFormat,
    key_value: &'a [u8],
    first_image_pos: usize,
    mip_count: u32,
    /// Per-level `(offset_of_size_prefix, total_level_bytes)`, filled in
    /// order as levels are visited.
    level_cache: Vec<Option<(usize, usize)>>,
}

impl<'a> KtxReader<'a> {
    /// Parse a KTX v1 container from bytes.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        if reader.expect_magic(KTX_IDENTIFIER).is_err() {
            return Err(Error::InvalidIdentifier);
        }

        match reader.peek_u32()? {
            KTX_ENDIAN_REF => {}
            KTX_ENDIAN_REF_SWAPPED => return Err(Error::EndianMismatch),
            other => {
                return Err(Error::InvalidHeader(format!(
                    "bad endianness sentinel {other:#010x}"
                )))
            }
        }

        let header: KtxHeader = reader.read_struct()?;
        if header.pixel_width == 0 {
            return Err(Error::InvalidHeader("zero width".into()));
        }
        if header.number_of_faces != 1 && header.number_of_faces != 6 {
            return Err(Error::InvalidHeader(format!(
                "face count {} (must be 1 or 6)",
                header.number_of_faces
            )));
        }

        let format =
            gl::format_from_gl(header.gl_internal_format, header.gl_format, header.gl_type)
                .ok_or(Error::UnknownGlFormat {
                    internal_format: header.gl_internal_format,
                    format: header.gl_format,
                    gl_type: header.gl_type,
                })?;

        let key_value = reader.read_bytes(header.bytes_of_key_value_data as usize)?;
        let first_image_pos = reader.position();

        let declared = Self::level_count(&header);
        // a chain can only halve down to 1x1(x1); clamp what the header claims
        let extent = header
            .pixel_width
            .max(header.pixel_height)
            .max(header.pixel_depth)
            .max(1);
        let chain_max = 32 - extent.leading_zeros();
        let mip_count = declared.min(chain_max);
        if mip_count < declared {
            log::warn!(
                "KTX declares {declared} mip levels but {}x{} carries at most {chain_max}",
                header.pixel_width,
                header.pixel_height.max(1),
            );
        }
        let level_cache = vec![None; mip_count as usize];

        Ok(Self {
            data,
            header,
            format,
            key_value,
            first_image_pos,
            mip_count,
            level_cache,
        })
    }

    fn level_count(header: &KtxHeader) -> u32 {
        header.number_of_mipmap_levels.max(1)
    }

    /// Image width in texels.
    pub fn width(&self) -> u32 {
        self.header.pixel_width
    }

    /// Image height in texels (1 for 1D textures).
    pub fn height(&self) -> u32 {
        self.header.pixel_height.max(1)
    }

    /// Volume depth in texels (1 for non-volume surfaces).
    pub fn depth(&self) -> u32 {
        self.header.pixel_depth.max(1)
    }

    /// Whether the file is a 1D texture.
    pub fn is_1d(&self) -> bool {
        self.header.pixel_height == 0
    }

    /// Whether the file is a volume texture.
    pub fn is_volume(&self) -> bool {
        self.header.pixel_depth > 0
    }

    /// Whether the file is a cubemap.
    pub fn is_cubemap(&self) -> bool {
        self.header.number_of_faces == 6
    }

    /// Array element count (1 for non-array textures).
    pub fn array_size(&self) -> u32 {
        self.header.number_of_array_elements.max(1)
    }

    /// Number of mip levels the dimensions can actually carry.
    pub fn mip_count(&self) -> u32 {
        self.mip_count
    }

    /// Resolved pixel format.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Raw header.
    pub fn header(&self) -> &KtxHeader {
        &self.header
    }

    /// Look up a key in the key-value block.
    ///
    /// Keys are NUL-terminated UTF-8; the value is the rest of the entry.
    pub fn get_value(&self, key: &str) -> Option<&'a [u8]> {
        let mut pos = 0;
        while pos + 4 <= self.key_value.len() {
            let size = u32::from_le_bytes([
                self.key_value[pos],
                self.key_value[pos + 1],
                self.key_value[pos + 2],
                self.key_value[pos + 3],
            ]) as usize;
            let entry_start = pos + 4;
            let entry_end = (entry_start + size).min(self.key_value.len());
            let entry = &self.key_value[entry_start..entry_end];

            if let Some(nul) = memchr::memchr(0, entry) {
                if &entry[..nul] == key.as_bytes() {
                    return Some(&entry[nul + 1..]);
                }
            }

            pos = entry_start + align_up(size, 4);
        }
        None
    }

    /// `true` when the non-array cubemap rule applies: the stored level
    /// size counts a single face.
    fn face_sized_levels(&self) -> bool {
        self.header.number_of_faces == 6 && self.header.number_of_array_elements == 0
    }

    /// Locate `level`, returning `(size_prefix_offset, total_level_bytes)`.
    fn locate_level(&mut self, level: u32) -> Result<(usize, usize)> {
        if level >= self.mip_count() {
            return Err(Error::LevelOutOfRange {
                level,
                count: self.mip_count(),
            });
        }

        let reader = BinaryReader::new(self.data);
        let mut offset = self.first_image_pos;
        for l in 0..=level {
            if let Some(cached) = self.level_cache[l as usize] {
                offset = cached.0;
            }
            let stored = reader.read_u32_at(offset)? as usize;
            let total = if self.face_sized_levels() {
                align_up(stored, 4) * 6
            } else {
                align_up(stored, 4)
            };
            self.level_cache[l as usize] = Some((offset, total));
            if l == level {
                return Ok((offset, total));
            }
            offset += 4 + total;
        }
        unreachable!("loop returns at the target level")
    }

    /// Stored size prefix of `level` - for non-array cubemaps this is the
    /// byte size of a single face.
    pub fn stored_size(&mut self, level: u32) -> Result<usize> {
        let (offset, _) = self.locate_level(level)?;
        let reader = BinaryReader::new(self.data);
        Ok(reader.read_u32_at(offset)? as usize)
    }

    /// Total byte size of `level` including all faces and face padding.
    pub fn image_size(&mut self, level: u32) -> Result<usize> {
        self.locate_level(level).map(|(_, total)| total)
    }

    /// Raw pixel data of `level`: all array elements and faces, each face
    /// padded to 4 bytes as stored in the file.
    pub fn image_data(&mut self, level: u32) -> Result<&'a [u8]> {
        let (offset, total) = self.locate_level(level)?;
        let start = offset + 4;
        if self.data.len() < start + total {
            return Err(Error::Truncated {
                needed: start + total,
                available: self.data.len(),
            });
        }
        Ok(&self.data[start..start + total])
    }

    /// Packed row stride of `level` in the destination layout.
    pub fn packed_row_stride(&self, level: u32) -> usize {
        let w = self.header.pixel_width.checked_shr(level).unwrap_or(0).max(1) as usize;
        match self.format.family() {
            FormatFamily::Uncompressed { bytes_per_texel }
            | FormatFamily::Clut { bytes_per_texel } => w * bytes_per_texel as usize,
            // block and tile formats have no row padding concept here
            _ => 0,
        }
    }

    /// Row stride of `level` as stored in the file, honoring the
    /// GL_UNPACK_ALIGNMENT=4 convention KTX inherits.
    pub fn unpacked_row_stride(&self, level: u32) -> usize {
        align_up(self.packed_row_stride(level), 4)
    }

    /// Whether rows of `level` carry alignment padding in the file that a
    /// packed destination must strip.
    pub fn is_level_unpacked(&self, level: u32) -> bool {
        let packed = self.packed_row_stride(level);
        packed != 0 && packed != self.unpacked_row_stride(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::IntoBytes;

    fn header(width: u32, height: u32, mips: u32) -> KtxHeader {
        KtxHeader {
            endianness: KTX_ENDIAN_REF,
            gl_type: gl::GL_UNSIGNED_BYTE,
            gl_type_size: 1,
            gl_format: gl::GL_RGBA,
            gl_internal_format: gl::GL_RGBA8,
            gl_base_internal_format: gl::GL_RGBA,
            pixel_width: width,
            pixel_height: height,
            pixel_depth: 0,
            number_of_array_elements: 0,
            number_of_faces: 1,
            number_of_mipmap_levels: mips,
            bytes_of_key_value_data: 0,
        }
    }

    fn build_file(header: &KtxHeader, key_value: &[u8], levels: &[&[u8]]) -> Vec<u8> {
        let mut file = Vec::new();
        file.extend_from_slice(KTX_IDENTIFIER);
        file.extend_from_slice(header.as_bytes());
        file.extend_from_slice(key_value);
        for level in levels {
            file.extend_from_slice(&(level.len() as u32).to_le_bytes());
            file.extend_from_slice(level);
            while file.len() % 4 != 0 {
                file.push(0);
            }
        }
        file
    }

    #[test]
    fn test_parse_rgba8_with_mips() {
        let header = header(4, 4, 2);
        let level0 = vec![1u8; 64];
        let level1 = vec![2u8; 16];
        let file = build_file(&header, &[], &[&level0, &level1]);

        let mut reader = KtxReader::new(&file).unwrap();
        assert_eq!(reader.width(), 4);
        assert_eq!(reader.format(), PixelFormat::Rgba8);
        assert_eq!(reader.mip_count(), 2);
        assert_eq!(reader.image_size(0).unwrap(), 64);
        assert_eq!(reader.image_size(1).unwrap(), 16);
        assert_eq!(reader.image_data(0).unwrap(), &level0[..]);
        assert_eq!(reader.image_data(1).unwrap(), &level1[..]);
        // second query hits the offset cache
        assert_eq!(reader.image_data(1).unwrap(), &level1[..]);
    }

    #[test]
    fn test_overdeclared_mip_count_clamped() {
        // 4x4 carries at most 3 levels no matter what the header claims
        let header = header(4, 4, 40);
        let level0 = vec![1u8; 64];
        let level1 = vec![2u8; 16];
        let level2 = vec![3u8; 4];
        let file = build_file(&header, &[], &[&level0, &level1, &level2]);

        let mut reader = KtxReader::new(&file).unwrap();
        assert_eq!(reader.mip_count(), 3);
        assert_eq!(reader.image_data(2).unwrap(), &level2[..]);
        assert!(matches!(
            reader.image_data(3),
            Err(Error::LevelOutOfRange { .. })
        ));
    }

    #[test]
    fn test_cubemap_scales_stored_size() {
        let mut h = header(4, 4, 1);
        h.number_of_faces = 6;
        // stored size is one face; file holds six
        let mut file = Vec::new();
        file.extend_from_slice(KTX_IDENTIFIER);
        file.extend_from_slice(h.as_bytes());
        file.extend_from_slice(&64u32.to_le_bytes());
        for face in 0u8..6 {
            file.extend(vec![face; 64]);
        }

        let mut reader = KtxReader::new(&file).unwrap();
        assert!(reader.is_cubemap());
        assert_eq!(reader.stored_size(0).unwrap(), 64);
        assert_eq!(reader.image_size(0).unwrap(), 64 * 6);
        let data = reader.image_data(0).unwrap();
        assert_eq!(data.len(), 64 * 6);
        assert!(data[64..128].iter().all(|&b| b == 1));
    }

    #[test]
    fn test_key_value_lookup() {
        let h = header(4, 4, 1);
        let mut kv = Vec::new();
        let entry = b"KTXorientation\0S=r,T=d";
        kv.extend_from_slice(&(entry.len() as u32).to_le_bytes());
        kv.extend_from_slice(entry);
        while kv.len() % 4 != 0 {
            kv.push(0);
        }
        let mut h = h;
        h.bytes_of_key_value_data = kv.len() as u32;
        let file = build_file(&h, &kv, &[&[0u8; 64]]);

        let reader = KtxReader::new(&file).unwrap();
        assert_eq!(
            reader.get_value("KTXorientation"),
            Some(&b"S=r,T=d"[..])
        );
        assert_eq!(reader.get_value("missing"), None);
    }

    #[test]
    fn test_endian_mismatch_detected() {
        let h = header(4, 4, 1);
        let mut file = Vec::new();
        file.extend_from_slice(KTX_IDENTIFIER);
        file.extend_from_slice(h.as_bytes());
        // rewrite the sentinel byte-swapped
        file[12..16].copy_from_slice(&KTX_ENDIAN_REF_SWAPPED.to_le_bytes());
        assert!(matches!(KtxReader::new(&file), Err(Error::EndianMismatch)));
    }

    #[test]
    fn test_row_unpack_queries() {
        // 2x2 RGB8: packed row = 6 bytes, file row = 8
        let mut h = header(2, 2, 1);
        h.gl_internal_format = gl::GL_RGB8;
        h.gl_format = gl::GL_RGB;
        let file = build_file(&h, &[], &[&[0u8; 16]]);

        let reader = KtxReader::new(&file).unwrap();
        assert_eq!(reader.format(), PixelFormat::Rgb8);
        assert_eq!(reader.packed_row_stride(0), 6);
        assert_eq!(reader.unpacked_row_stride(0), 8);
        assert!(reader.is_level_unpacked(0));
    }

    #[test]
    fn test_bad_identifier_and_truncation() {
        assert!(matches!(
            KtxReader::new(b"not a ktx file at all"),
            Err(Error::InvalidIdentifier)
        ));

        let h = header(4, 4, 1);
        let mut file = Vec::new();
        file.extend_from_slice(KTX_IDENTIFIER);
        file.extend_from_slice(h.as_bytes());
        file.extend_from_slice(&64u32.to_le_bytes());
        file.extend_from_slice(&[0u8; 8]); // far short of 64
        let mut reader = KtxReader::new(&file).unwrap();
        assert!(matches!(
            reader.image_data(0),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn test_unknown_gl_tuple_rejected() {
        let mut h = header(4, 4, 1);
        h.gl_internal_format = 0xDEAD;
        h.gl_format = 0xBEEF;
        h.gl_type = 0xF00D;
        let file = build_file(&h, &[], &[&[0u8; 64]]);
        assert!(matches!(
            KtxReader::new(&file),
            Err(Error::UnknownGlFormat { .. })
        ));
    }
}
