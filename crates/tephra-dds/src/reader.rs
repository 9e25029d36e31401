//! DDS container reader.

use tephra_common::BinaryReader;
use tephra_format::{FormatFamily, PixelFormat};

use crate::{decode_format, DdsHeader, DdsHeaderDxt10, DdsPixelFormat, Error, Result, DDS_MAGIC};

/// Size of the optional palette block for P8/A8P8 (256 BGRA entries).
const CLUT_SIZE: usize = 256 * 4;

/// Parsed DDS container.
///
/// Construction validates the header and decodes the pixel format; all
/// geometry queries after that are cheap. Per-level data is gathered
/// lazily and cached: DDS stores one full mip chain per cube face or
/// array element, so [`DdsReader::image_data`] repacks a level's
/// faces/elements into one contiguous run the first time it is asked for.
#[derive(Debug)]
pub struct DdsReader<'a> {
    data: &'a [u8],
    header: DdsHeader,
    dx10: Option<DdsHeaderDxt10>,
    format: PixelFormat,
    clut: Option<&'a [u8]>,
    /// Offset of the first pixel byte.
    data_start: usize,
    mip_count: u32,
    level_cache: Vec<Option<Vec<u8>>>,
}

impl<'a> DdsReader<'a> {
    /// Parse a DDS container from bytes.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        reader.expect_magic(DDS_MAGIC)?;

        let header: DdsHeader = reader.read_struct()?;
        // copy out of the packed struct before formatting
        let header_size = header.size;
        if header_size != DdsHeader::SIZE {
            return Err(Error::InvalidHeader(format!(
                "header size {header_size} (expected {})",
                DdsHeader::SIZE
            )));
        }
        let pixel_format_size = header.pixel_format.size;
        if pixel_format_size != DdsPixelFormat::SIZE {
            return Err(Error::InvalidHeader(format!(
                "pixel format size {pixel_format_size} (expected {})",
                DdsPixelFormat::SIZE
            )));
        }
        if header.width == 0 || header.height == 0 {
            return Err(Error::InvalidHeader("zero width or height".into()));
        }

        let dx10 = if header.is_dx10() {
            Some(reader.read_struct::<DdsHeaderDxt10>()?)
        } else {
            None
        };

        let format = decode_format(&header, dx10.as_ref())?;

        let clut = if format.is_palettized() {
            Some(reader.read_bytes(CLUT_SIZE)?)
        } else {
            None
        };

        let data_start = reader.position();
        let mip_count = corrected_mip_count(&header, format);
        let level_cache = vec![None; mip_count as usize];

        Ok(Self {
            data,
            header,
            dx10,
            format,
            clut,
            data_start,
            mip_count,
            level_cache,
        })
    }

    /// Image width in texels.
    pub fn width(&self) -> u32 {
        self.header.width
    }

    /// Image height in texels.
    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// Volume depth in texels (1 for non-volume surfaces).
    pub fn depth(&self) -> u32 {
        if self.header.is_volume() {
            self.header.depth.max(1)
        } else {
            1
        }
    }

    /// Number of mip levels actually present.
    pub fn mip_count(&self) -> u32 {
        self.mip_count
    }

    /// Array element count (1 when no DX10 extension is present).
    pub fn array_size(&self) -> u32 {
        self.dx10.map_or(1, |d| d.array_size.max(1))
    }

    /// Whether the surface is a cubemap.
    pub fn is_cubemap(&self) -> bool {
        self.header.is_cubemap()
            || self
                .dx10
                .is_some_and(|d| d.misc_flag & DdsHeaderDxt10::MISC_TEXTURECUBE != 0)
    }

    /// Whether the surface is a volume texture.
    pub fn is_volume(&self) -> bool {
        self.header.is_volume()
    }

    /// Decoded pixel format.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Palette for P8/A8P8 surfaces: 256 BGRA entries.
    pub fn clut(&self) -> Option<&'a [u8]> {
        self.clut
    }

    /// Raw header, for callers that need the container-level fields.
    pub fn header(&self) -> &DdsHeader {
        &self.header
    }

    fn faces(&self) -> u32 {
        if self.is_cubemap() {
            6
        } else {
            1
        }
    }

    /// Mip-reduced dimension.
    fn level_extent(extent: u32, level: u32) -> u32 {
        (extent >> level).max(1)
    }

    /// Size in bytes of one face/element slice at `level`.
    pub fn face_size(&self, level: u32) -> Result<usize> {
        if level >= self.mip_count {
            return Err(Error::LevelOutOfRange {
                level,
                count: self.mip_count,
            });
        }
        let w = Self::level_extent(self.header.width, level) as usize;
        let h = Self::level_extent(self.header.height, level) as usize;
        let d = Self::level_extent(self.depth(), level) as usize;
        Ok(surface_size(self.format, w, h, d))
    }

    /// Size in bytes of the whole `level` across all faces and array
    /// elements.
    pub fn image_size(&self, level: u32) -> Result<usize> {
        let face = self.face_size(level)?;
        Ok(face * self.faces() as usize * self.array_size() as usize)
    }

    /// Byte length of one face's full mip chain in the file.
    fn chain_size(&self) -> Result<usize> {
        let mut total = 0;
        for level in 0..self.mip_count {
            total += self.face_size(level)?;
        }
        Ok(total)
    }

    /// Raw pixel data for `level`, all faces/elements contiguous.
    ///
    /// The first call gathers (and for cubemaps/arrays repacks) the level
    /// out of the file; repeat calls return the cached copy.
    pub fn image_data(&mut self, level: u32) -> Result<&[u8]> {
        if level >= self.mip_count {
            return Err(Error::LevelOutOfRange {
                level,
                count: self.mip_count,
            });
        }

        if self.level_cache[level as usize].is_none() {
            let face_size = self.face_size(level)?;
            let chain_size = self.chain_size()?;
            let chains = (self.faces() * self.array_size()) as usize;

            let needed = self.data_start + chain_size * chains;
            if self.data.len() < needed {
                return Err(Error::Truncated {
                    needed,
                    available: self.data.len(),
                });
            }

            let level_offset: usize = (0..level).map(|l| self.face_size(l)).sum::<Result<usize>>()?;

            let mut gathered = Vec::with_capacity(face_size * chains);
            for chain in 0..chains {
                let start = self.data_start + chain * chain_size + level_offset;
                gathered.extend_from_slice(&self.data[start..start + face_size]);
            }
            self.level_cache[level as usize] = Some(gathered);
        }

        Ok(self.level_cache[level as usize]
            .as_deref()
            .unwrap_or_default())
    }
}

/// Bytes of one w x h x d surface in `format`.
pub(crate) fn surface_size(format: PixelFormat, w: usize, h: usize, d: usize) -> usize {
    match format.family() {
        FormatFamily::Uncompressed { bytes_per_texel }
        | FormatFamily::Clut { bytes_per_texel } => w * h * d * bytes_per_texel as usize,
        FormatFamily::BlockCompressed {
            block_width,
            block_height,
            block_depth,
            bytes_per_block,
        } => {
            w.div_ceil(block_width as usize)
                * h.div_ceil(block_height as usize)
                * d.div_ceil(block_depth as usize)
                * bytes_per_block as usize
        }
        FormatFamily::Pvrtc {
            bits_per_texel,
            min_tile_width,
            min_tile_height,
        } => {
            let w = w.next_multiple_of(min_tile_width as usize);
            let h = h.next_multiple_of(min_tile_height as usize);
            w * h * d * bits_per_texel as usize / 8
        }
    }
}

/// Clamp a declared mip count to the levels whose dimensions still fit
/// the format's minimum footprint.
fn corrected_mip_count(header: &DdsHeader, format: PixelFormat) -> u32 {
    let declared = if header.flags & DdsHeader::FLAG_MIPMAP_COUNT != 0 {
        header.mipmap_count.max(1)
    } else {
        1
    };

    let (width, height) = (header.width, header.height);
    // a chain can only halve down to 1x1; anything beyond is malformed
    let chain_max = 32 - width.max(height).leading_zeros();
    let bounded = declared.min(chain_max);

    let (min_w, min_h, _) = format.block_dimensions();
    let mut usable = 0;
    for level in 0..bounded {
        let w = (width >> level).max(1);
        let h = (height >> level).max(1);
        if w < min_w || h < min_h {
            break;
        }
        usable += 1;
    }
    let usable = usable.max(1);
    if usable < declared {
        log::warn!(
            "DDS declares {declared} mip levels but only {usable} fit {width}x{height} {format:?}"
        );
    }
    usable
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::IntoBytes;

    fn basic_header(width: u32, height: u32, mips: u32) -> DdsHeader {
        DdsHeader {
            size: DdsHeader::SIZE,
            flags: DdsHeader::FLAG_MIPMAP_COUNT,
            height,
            width,
            pitch_or_linear_size: 0,
            depth: 0,
            mipmap_count: mips,
            reserved1: [0; 11],
            pixel_format: DdsPixelFormat {
                size: DdsPixelFormat::SIZE,
                flags: DdsPixelFormat::FLAG_RGB | DdsPixelFormat::FLAG_ALPHA_PIXELS,
                four_cc: crate::FourCC([0; 4]),
                rgb_bit_count: 32,
                r_bit_mask: 0x0000_00FF,
                g_bit_mask: 0x0000_FF00,
                b_bit_mask: 0x00FF_0000,
                a_bit_mask: 0xFF00_0000,
            },
            caps: 0,
            caps2: 0,
            caps3: 0,
            caps4: 0,
            reserved2: 0,
        }
    }

    fn build_file(header: &DdsHeader, pixels: &[u8]) -> Vec<u8> {
        let mut file = Vec::new();
        file.extend_from_slice(DDS_MAGIC);
        file.extend_from_slice(header.as_bytes());
        file.extend_from_slice(pixels);
        file
    }

    #[test]
    fn test_parse_rgba8_with_mips() {
        // 4x4 with 3 mips: 64 + 16 + 4 bytes
        let header = basic_header(4, 4, 3);
        let pixels: Vec<u8> = (0..84).map(|i| i as u8).collect();
        let file = build_file(&header, &pixels);

        let mut reader = DdsReader::new(&file).unwrap();
        assert_eq!(reader.width(), 4);
        assert_eq!(reader.format(), PixelFormat::Rgba8);
        assert_eq!(reader.mip_count(), 3);
        assert_eq!(reader.face_size(0).unwrap(), 64);
        assert_eq!(reader.face_size(1).unwrap(), 16);
        assert_eq!(reader.face_size(2).unwrap(), 4);

        assert_eq!(reader.image_data(0).unwrap(), &pixels[..64]);
        assert_eq!(reader.image_data(1).unwrap(), &pixels[64..80]);
        assert_eq!(reader.image_data(2).unwrap(), &pixels[80..84]);
        // cache hit returns the same bytes
        assert_eq!(reader.image_data(1).unwrap(), &pixels[64..80]);
    }

    #[test]
    fn test_cubemap_faces_gathered_per_level() {
        let mut header = basic_header(4, 4, 2);
        header.caps2 = DdsHeader::CAPS2_CUBEMAP;
        // per face: 64 + 16 bytes; six chains
        let mut pixels = Vec::new();
        for face in 0u8..6 {
            pixels.extend(vec![face; 64]);
            pixels.extend(vec![face + 100; 16]);
        }
        let file = build_file(&header, &pixels);

        let mut reader = DdsReader::new(&file).unwrap();
        assert!(reader.is_cubemap());
        assert_eq!(reader.image_size(0).unwrap(), 64 * 6);

        let level1 = reader.image_data(1).unwrap();
        assert_eq!(level1.len(), 16 * 6);
        for face in 0u8..6 {
            let run = &level1[face as usize * 16..face as usize * 16 + 16];
            assert!(run.iter().all(|&b| b == face + 100));
        }
    }

    #[test]
    fn test_mip_count_correction() {
        // 4x4 BC1 declaring 3 mips: 2x2 and 1x1 don't fit a 4x4 block
        let mut header = basic_header(4, 4, 3);
        header.pixel_format.flags = DdsPixelFormat::FLAG_FOURCC;
        header.pixel_format.four_cc = crate::FourCC::DXT1;
        let file = build_file(&header, &[0u8; 8]);

        let reader = DdsReader::new(&file).unwrap();
        assert_eq!(reader.format(), PixelFormat::Bc1);
        assert_eq!(reader.mip_count(), 1);
    }

    #[test]
    fn test_overdeclared_mip_count_clamped() {
        // 4x4 carries at most 3 levels no matter what the header claims
        let header = basic_header(4, 4, 40);
        let pixels: Vec<u8> = (0..84).map(|i| i as u8).collect();
        let file = build_file(&header, &pixels);

        let mut reader = DdsReader::new(&file).unwrap();
        assert_eq!(reader.mip_count(), 3);
        assert_eq!(reader.image_data(2).unwrap(), &pixels[80..84]);
    }

    #[test]
    fn test_wrong_header_size_reported() {
        let mut header = basic_header(4, 4, 1);
        header.size = 100;
        let file = build_file(&header, &[0u8; 64]);
        assert!(matches!(
            DdsReader::new(&file),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_truncated_pixels_rejected() {
        let header = basic_header(4, 4, 1);
        let file = build_file(&header, &[0u8; 10]); // needs 64
        let mut reader = DdsReader::new(&file).unwrap();
        assert!(matches!(
            reader.image_data(0),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn test_truncated_header_rejected() {
        let file = b"DDS \x7c\x00\x00\x00only a few bytes";
        assert!(DdsReader::new(file).is_err());
    }

    #[test]
    fn test_bad_magic_rejected() {
        assert!(DdsReader::new(b"KTX 1234").is_err());
        assert!(!crate::is_dds(b"PNG"));
    }
}
