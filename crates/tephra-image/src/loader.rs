//! Container loader dispatch.
//!
//! Loaders turn container bytes into [`Image`]s through a caller-supplied
//! [`TexelAllocator`], so embedders can route pixel memory through their
//! own pools. The [`LoaderRegistry`] owns a list of loaders and picks one
//! by file extension, falling through to the remaining loaders when the
//! preferred one rejects the bytes.

use std::path::Path;

use tephra_dds::DdsReader;
use tephra_format::{FormatFamily, PixelFormat};
use tephra_ktx::KtxReader;

use crate::image::{Image, Layout, Shape};
use crate::LoadError;

/// Source of pixel buffer memory for the loaders.
pub trait TexelAllocator {
    /// Produce a zero-filled buffer of exactly `size` bytes, or `None`
    /// when the allocation cannot be satisfied.
    fn allocate(&mut self, size: usize) -> Option<Vec<u8>>;
}

/// Default allocator backed by the global heap, failing gracefully
/// instead of aborting on exhaustion.
#[derive(Debug, Default)]
pub struct HeapAllocator;

impl TexelAllocator for HeapAllocator {
    fn allocate(&mut self, size: usize) -> Option<Vec<u8>> {
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(size).ok()?;
        buffer.resize(size, 0);
        Some(buffer)
    }
}

/// Loader knobs: alignment padding to apply to the loaded pixel buffer,
/// matching what the consuming GPU upload path expects.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub row_alignment: u32,
    pub subtexture_alignment: u32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            row_alignment: 1,
            subtexture_alignment: 1,
        }
    }
}

/// One container format's loader.
pub trait ImageLoader {
    /// File extension this loader claims, lowercase without the dot.
    fn extension(&self) -> &str;

    /// Decode `data` into an image, taking pixel memory from `allocator`.
    fn load(
        &self,
        data: &[u8],
        options: &LoadOptions,
        allocator: &mut dyn TexelAllocator,
    ) -> Result<Image, LoadError>;
}

/// Copy one subtexture row by row, stripping source padding and applying
/// destination padding. `row_bytes == 0` means the format has no row
/// addressing; the slice is copied whole.
fn copy_slice(
    dst: &mut [u8],
    dst_stride: usize,
    src: &[u8],
    src_stride: usize,
    row_bytes: usize,
    rows: usize,
) {
    if row_bytes == 0 || (dst_stride == src_stride && dst_stride == row_bytes) {
        let len = dst.len().min(src.len());
        dst[..len].copy_from_slice(&src[..len]);
        return;
    }
    for row in 0..rows {
        dst[row * dst_stride..row * dst_stride + row_bytes]
            .copy_from_slice(&src[row * src_stride..row * src_stride + row_bytes]);
    }
}

/// Allocate the destination image for a container's geometry.
#[allow(clippy::too_many_arguments)]
fn allocate_image(
    format: PixelFormat,
    width: u32,
    height: u32,
    shape: Shape,
    mip_count: u32,
    array_count: u32,
    options: &LoadOptions,
    allocator: &mut dyn TexelAllocator,
) -> Result<Image, LoadError> {
    let mut image = Image::with_geometry(
        format,
        width,
        height,
        shape,
        mip_count,
        array_count,
        Layout::MipsAfterSlices,
        options.row_alignment,
        options.subtexture_alignment,
    );
    let size = image.size_in_bytes();
    let buffer = allocator
        .allocate(size)
        .ok_or(LoadError::Allocation { requested: size })?;
    image.set_data(buffer);
    Ok(image)
}

/// DDS container loader. Palettized surfaces (P8/A8P8) are expanded
/// through the file's palette into RGBA8 at load time.
#[derive(Debug, Default)]
pub struct DdsLoader;

impl DdsLoader {
    fn expand_palette(
        image: &mut Image,
        reader: &mut DdsReader,
        source_format: PixelFormat,
        clut: &[u8],
    ) -> Result<(), LoadError> {
        let index_stride = match source_format {
            PixelFormat::A8P8 => 2,
            _ => 1,
        };
        for mip in 0..image.mip_count() {
            let src = reader.image_data(mip).map_err(LoadError::decoding)?.to_vec();
            let w = image.width(mip) as usize;
            let rows = image.height(mip) as usize * image.depth(mip) as usize;
            let src_slice = w * rows * index_stride;
            let dst_stride = image.bytes_per_row(mip);
            for slice in 0..image.slice_count() {
                let src = &src[slice as usize * src_slice..][..src_slice];
                let dst = match image.pixels_mut(mip, slice) {
                    Some(dst) => dst,
                    None => continue,
                };
                for row in 0..rows {
                    for x in 0..w {
                        let texel = &src[(row * w + x) * index_stride..];
                        let entry = &clut[texel[0] as usize * 4..][..4];
                        let out = &mut dst[row * dst_stride + x * 4..][..4];
                        // palette entries are stored BGRA
                        out[0] = entry[2];
                        out[1] = entry[1];
                        out[2] = entry[0];
                        out[3] = if index_stride == 2 { texel[1] } else { entry[3] };
                    }
                }
            }
        }
        Ok(())
    }
}

impl ImageLoader for DdsLoader {
    fn extension(&self) -> &str {
        "dds"
    }

    fn load(
        &self,
        data: &[u8],
        options: &LoadOptions,
        allocator: &mut dyn TexelAllocator,
    ) -> Result<Image, LoadError> {
        let mut reader = DdsReader::new(data).map_err(LoadError::decoding)?;

        let shape = if reader.is_cubemap() {
            Shape::Cube
        } else if reader.is_volume() {
            Shape::Volume {
                depth: reader.depth(),
            }
        } else {
            Shape::Flat
        };

        let source_format = reader.format();
        let stored_format = if source_format.is_palettized() {
            PixelFormat::Rgba8
        } else {
            source_format
        };

        let mut image = allocate_image(
            stored_format,
            reader.width(),
            reader.height(),
            shape,
            reader.mip_count(),
            reader.array_size(),
            options,
            allocator,
        )?;

        if source_format.is_palettized() {
            let clut = reader
                .clut()
                .ok_or_else(|| {
                    LoadError::decoding(tephra_dds::Error::InvalidHeader(
                        "palettized format without palette".into(),
                    ))
                })?
                .to_vec();
            Self::expand_palette(&mut image, &mut reader, source_format, &clut)?;
            return Ok(image);
        }

        for mip in 0..image.mip_count() {
            let face_size = reader.face_size(mip).map_err(LoadError::decoding)?;
            let src = reader.image_data(mip).map_err(LoadError::decoding)?.to_vec();
            let dst_stride = image.bytes_per_row(mip);
            let row_bytes = packed_row_bytes(stored_format, image.width(mip));
            let rows = image.row_count(mip) * image.depth(mip) as usize;
            for slice in 0..image.slice_count() {
                let src = &src[slice as usize * face_size..][..face_size];
                if let Some(dst) = image.pixels_mut(mip, slice) {
                    copy_slice(dst, dst_stride, src, row_bytes, row_bytes, rows);
                }
            }
        }

        Ok(image)
    }
}

/// KTX v1 container loader.
#[derive(Debug, Default)]
pub struct KtxLoader;

impl ImageLoader for KtxLoader {
    fn extension(&self) -> &str {
        "ktx"
    }

    fn load(
        &self,
        data: &[u8],
        options: &LoadOptions,
        allocator: &mut dyn TexelAllocator,
    ) -> Result<Image, LoadError> {
        let mut reader = KtxReader::new(data).map_err(LoadError::decoding)?;

        let shape = if reader.is_cubemap() {
            Shape::Cube
        } else if reader.is_volume() {
            Shape::Volume {
                depth: reader.depth(),
            }
        } else {
            Shape::Flat
        };

        let format = reader.format();
        let mut image = allocate_image(
            format,
            reader.width(),
            reader.height(),
            shape,
            reader.mip_count(),
            reader.array_size(),
            options,
            allocator,
        )?;

        // the file's own layout: rows unpacked to 4 bytes, each
        // face/element padded to 4 bytes
        let stored = Image::with_geometry(
            format,
            reader.width(),
            reader.height(),
            shape,
            reader.mip_count(),
            reader.array_size(),
            Layout::MipsAfterSlices,
            4,
            4,
        );

        for mip in 0..image.mip_count() {
            let src = reader.image_data(mip).map_err(LoadError::decoding)?;
            let src_slice = stored.aligned_slice_size(mip);
            let src_stride = stored.bytes_per_row(mip);
            let dst_stride = image.bytes_per_row(mip);
            let row_bytes = packed_row_bytes(format, image.width(mip));
            let rows = image.row_count(mip) * image.depth(mip) as usize;
            for slice in 0..image.slice_count() {
                let start = slice as usize * src_slice;
                if start >= src.len() {
                    return Err(LoadError::decoding(tephra_ktx::Error::Truncated {
                        needed: start + src_slice,
                        available: src.len(),
                    }));
                }
                let src = &src[start..src.len().min(start + src_slice)];
                if let Some(dst) = image.pixels_mut(mip, slice) {
                    copy_slice(dst, dst_stride, src, src_stride, row_bytes, rows);
                }
            }
        }

        Ok(image)
    }
}

/// Bytes of one packed row (no alignment padding); 0 for tile formats.
fn packed_row_bytes(format: PixelFormat, width: u32) -> usize {
    let w = width as usize;
    match format.family() {
        FormatFamily::Uncompressed { bytes_per_texel }
        | FormatFamily::Clut { bytes_per_texel } => w * bytes_per_texel as usize,
        FormatFamily::BlockCompressed {
            block_width,
            bytes_per_block,
            ..
        } => w.div_ceil(block_width as usize) * bytes_per_block as usize,
        FormatFamily::Pvrtc { .. } => 0,
    }
}

/// Owned list of container loaders, consulted by file extension.
pub struct LoaderRegistry {
    loaders: Vec<Box<dyn ImageLoader>>,
}

impl LoaderRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            loaders: Vec::new(),
        }
    }

    /// Registry with the built-in DDS and KTX loaders.
    pub fn with_default_loaders() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(DdsLoader));
        registry.register(Box::new(KtxLoader));
        registry
    }

    /// Add a loader; later registrations are consulted after earlier
    /// ones.
    pub fn register(&mut self, loader: Box<dyn ImageLoader>) {
        self.loaders.push(loader);
    }

    /// Decode `data` into an image.
    ///
    /// The loader claiming `extension` (case-insensitive) is tried first;
    /// when it rejects the bytes the remaining loaders are tried in
    /// registration order. Allocation failures abort immediately.
    pub fn load(
        &self,
        data: &[u8],
        extension: &str,
        options: &LoadOptions,
        allocator: &mut dyn TexelAllocator,
    ) -> Result<Image, LoadError> {
        let claims = |loader: &dyn ImageLoader| loader.extension().eq_ignore_ascii_case(extension);
        let preferred = self.loaders.iter().filter(|l| claims(l.as_ref()));
        let rest = self.loaders.iter().filter(|l| !claims(l.as_ref()));

        let mut last_error = None;
        for loader in preferred.chain(rest) {
            match loader.load(data, options, allocator) {
                Ok(image) => return Ok(image),
                Err(err @ LoadError::Allocation { .. }) => return Err(err),
                Err(err) => {
                    log::debug!("loader {:?} declined: {err}", loader.extension());
                    last_error = Some(err);
                }
            }
        }
        Err(last_error.unwrap_or(LoadError::NoLoader {
            extension: extension.to_string(),
        }))
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::with_default_loaders()
    }
}

impl Image {
    /// Decode an image from container bytes using the built-in loaders.
    pub fn load_from_memory(
        data: &[u8],
        extension: &str,
        options: &LoadOptions,
    ) -> Result<Image, LoadError> {
        let registry = LoaderRegistry::with_default_loaders();
        let mut allocator = HeapAllocator;
        registry.load(data, extension, options, &mut allocator)
    }

    /// Read and decode an image file, recording its path as the source.
    pub fn load_from_file(
        path: impl AsRef<Path>,
        options: &LoadOptions,
    ) -> Result<Image, LoadError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let mut image = Self::load_from_memory(&data, extension, options)?;
        image.set_source_path(path.to_string_lossy().into_owned());
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tephra_dds::{DdsHeader, DdsPixelFormat, FourCC, DDS_MAGIC};
    use tephra_ktx::{gl, KtxHeader, KTX_ENDIAN_REF, KTX_IDENTIFIER};
    use zerocopy::IntoBytes;

    fn rgba8_dds_header(width: u32, height: u32, mips: u32) -> DdsHeader {
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
                four_cc: FourCC([0; 4]),
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

    fn dds_file(header: &DdsHeader, pixels: &[u8]) -> Vec<u8> {
        let mut file = Vec::new();
        file.extend_from_slice(DDS_MAGIC);
        file.extend_from_slice(header.as_bytes());
        file.extend_from_slice(pixels);
        file
    }

    fn rgba8_ktx_file(width: u32, height: u32, mips: u32, levels: &[&[u8]]) -> Vec<u8> {
        let header = KtxHeader {
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
        };
        let mut file = Vec::new();
        file.extend_from_slice(KTX_IDENTIFIER);
        file.extend_from_slice(header.as_bytes());
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
    fn test_load_dds_rgba8_preserves_texels() {
        // 4x4 RGBA8, one level, 64 bytes
        let header = rgba8_dds_header(4, 4, 1);
        let pixels: Vec<u8> = (0..64).collect();
        let file = dds_file(&header, &pixels);

        let image =
            Image::load_from_memory(&file, "dds", &LoadOptions::default()).unwrap();

        assert_eq!(image.format(), PixelFormat::Rgba8);
        assert_eq!(image.size_in_bytes(), 64);
        assert_eq!(image.layout(), Layout::MipsAfterSlices);
        assert_eq!(&image.pixels(0, 0).unwrap()[..4], &[0, 1, 2, 3]);
        assert_eq!(image.data(), &pixels[..]);
    }

    #[test]
    fn test_load_dds_mip_chain() {
        let header = rgba8_dds_header(4, 4, 3);
        let mut pixels = Vec::new();
        pixels.extend(vec![1u8; 64]);
        pixels.extend(vec![2u8; 16]);
        pixels.extend(vec![3u8; 4]);
        let file = dds_file(&header, &pixels);

        let image =
            Image::load_from_memory(&file, "dds", &LoadOptions::default()).unwrap();
        assert_eq!(image.mip_count(), 3);
        assert!(image.pixels(1, 0).unwrap().iter().all(|&b| b == 2));
        assert!(image.pixels(2, 0).unwrap().iter().all(|&b| b == 3));
    }

    #[test]
    fn test_load_dds_row_alignment_applied() {
        // 2x2 RGBA8 rows are 8 bytes packed; 16-byte alignment pads them
        let header = rgba8_dds_header(2, 2, 1);
        let pixels: Vec<u8> = (0..16).collect();
        let file = dds_file(&header, &pixels);

        let options = LoadOptions {
            row_alignment: 16,
            subtexture_alignment: 1,
        };
        let image = Image::load_from_memory(&file, "dds", &options).unwrap();

        assert_eq!(image.bytes_per_row(0), 16);
        assert_eq!(image.size_in_bytes(), 32);
        let data = image.pixels(0, 0).unwrap();
        assert_eq!(&data[..8], &pixels[..8]);
        assert_eq!(&data[16..24], &pixels[8..16]);
    }

    #[test]
    fn test_load_ktx_rgba8() {
        let level0 = vec![7u8; 64];
        let file = rgba8_ktx_file(4, 4, 1, &[&level0]);

        let image =
            Image::load_from_memory(&file, "ktx", &LoadOptions::default()).unwrap();
        assert_eq!(image.format(), PixelFormat::Rgba8);
        assert_eq!(image.data(), &level0[..]);
    }

    #[test]
    fn test_load_ktx_strips_row_padding() {
        // 2x2 RGB8: file rows are 8 bytes (GL unpack alignment), packed
        // rows are 6
        let header = KtxHeader {
            endianness: KTX_ENDIAN_REF,
            gl_type: gl::GL_UNSIGNED_BYTE,
            gl_type_size: 1,
            gl_format: gl::GL_RGB,
            gl_internal_format: gl::GL_RGB8,
            gl_base_internal_format: gl::GL_RGB,
            pixel_width: 2,
            pixel_height: 2,
            pixel_depth: 0,
            number_of_array_elements: 0,
            number_of_faces: 1,
            number_of_mipmap_levels: 1,
            bytes_of_key_value_data: 0,
        };
        let mut file = Vec::new();
        file.extend_from_slice(KTX_IDENTIFIER);
        file.extend_from_slice(header.as_bytes());
        file.extend_from_slice(&16u32.to_le_bytes());
        file.extend_from_slice(&[1, 2, 3, 4, 5, 6, 0, 0]);
        file.extend_from_slice(&[7, 8, 9, 10, 11, 12, 0, 0]);

        let image =
            Image::load_from_memory(&file, "ktx", &LoadOptions::default()).unwrap();
        assert_eq!(image.format(), PixelFormat::Rgb8);
        assert_eq!(
            image.data(),
            &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]
        );
    }

    #[test]
    fn test_registry_falls_through_on_wrong_extension() {
        // DDS bytes presented as .ktx still load through fallthrough
        let header = rgba8_dds_header(4, 4, 1);
        let file = dds_file(&header, &[9u8; 64]);

        let image =
            Image::load_from_memory(&file, "ktx", &LoadOptions::default()).unwrap();
        assert_eq!(image.format(), PixelFormat::Rgba8);
    }

    #[test]
    fn test_unrecognized_bytes_rejected() {
        let result =
            Image::load_from_memory(b"not a texture", "png", &LoadOptions::default());
        assert!(matches!(result, Err(LoadError::Decoding(_))));
    }

    struct FailingAllocator;
    impl TexelAllocator for FailingAllocator {
        fn allocate(&mut self, _size: usize) -> Option<Vec<u8>> {
            None
        }
    }

    #[test]
    fn test_allocation_failure_propagates() {
        let header = rgba8_dds_header(4, 4, 1);
        let file = dds_file(&header, &[0u8; 64]);

        let registry = LoaderRegistry::with_default_loaders();
        let mut allocator = FailingAllocator;
        let result = registry.load(&file, "dds", &LoadOptions::default(), &mut allocator);
        assert!(matches!(
            result,
            Err(LoadError::Allocation { requested: 64 })
        ));
    }

    #[test]
    fn test_overdeclared_mip_counts_load_clamped() {
        // headers claiming absurd mip counts must clamp, never crash
        let header = rgba8_dds_header(4, 4, 40);
        let mut pixels = Vec::new();
        pixels.extend(vec![1u8; 64]);
        pixels.extend(vec![2u8; 16]);
        pixels.extend(vec![3u8; 4]);
        let dds = dds_file(&header, &pixels);

        let image =
            Image::load_from_memory(&dds, "dds", &LoadOptions::default()).unwrap();
        assert_eq!(image.mip_count(), 3);
        assert!(image.pixels(2, 0).unwrap().iter().all(|&b| b == 3));

        let level0 = vec![1u8; 64];
        let level1 = vec![2u8; 16];
        let level2 = vec![3u8; 4];
        let ktx = rgba8_ktx_file(4, 4, 40, &[&level0, &level1, &level2]);

        let image =
            Image::load_from_memory(&ktx, "ktx", &LoadOptions::default()).unwrap();
        assert_eq!(image.mip_count(), 3);
        assert!(image.pixels(2, 0).unwrap().iter().all(|&b| b == 3));
    }

    #[test]
    fn test_parser_and_entity_sizing_agree() {
        // the DDS reader and the image entity size levels independently;
        // they must agree for every level when no padding is requested
        for (width, height, mips) in [(16, 16, 5), (8, 4, 3), (32, 8, 4)] {
            let header = rgba8_dds_header(width, height, mips);
            let total: usize = (0..mips)
                .map(|l| {
                    ((width >> l).max(1) * (height >> l).max(1) * 4) as usize
                })
                .sum();
            let file = dds_file(&header, &vec![0u8; total]);

            let reader = DdsReader::new(&file).unwrap();
            let image =
                Image::load_from_memory(&file, "dds", &LoadOptions::default()).unwrap();
            for mip in 0..mips {
                assert_eq!(
                    image.slice_size(mip),
                    reader.face_size(mip).unwrap(),
                    "{width}x{height} level {mip}"
                );
            }
            assert_eq!(image.size_in_bytes(), total);
        }
    }

    #[test]
    fn test_truncated_prefixes_error_without_panic() {
        let header = rgba8_dds_header(4, 4, 1);
        let dds = dds_file(&header, &[0u8; 64]);
        let ktx = rgba8_ktx_file(4, 4, 1, &[&[0u8; 64]]);

        for file in [&dds, &ktx] {
            for n in 0..file.len() {
                let result =
                    Image::load_from_memory(&file[..n], "dds", &LoadOptions::default());
                assert!(result.is_err(), "prefix of {n} bytes must not load");
            }
        }
    }

    #[test]
    fn test_load_palettized_dds_expands_to_rgba() {
        let mut header = rgba8_dds_header(2, 2, 1);
        header.pixel_format.flags = DdsPixelFormat::FLAG_PALETTE8;
        header.pixel_format.rgb_bit_count = 8;
        header.pixel_format.r_bit_mask = 0;
        header.pixel_format.g_bit_mask = 0;
        header.pixel_format.b_bit_mask = 0;
        header.pixel_format.a_bit_mask = 0;

        // palette entry 5 = BGRA (10, 20, 30, 40)
        let mut clut = vec![0u8; 1024];
        clut[5 * 4..5 * 4 + 4].copy_from_slice(&[10, 20, 30, 40]);

        let mut file = Vec::new();
        file.extend_from_slice(DDS_MAGIC);
        file.extend_from_slice(header.as_bytes());
        file.extend_from_slice(&clut);
        file.extend_from_slice(&[5u8; 4]); // four indexed texels

        let image =
            Image::load_from_memory(&file, "dds", &LoadOptions::default()).unwrap();
        assert_eq!(image.format(), PixelFormat::Rgba8);
        for texel in image.data().chunks_exact(4) {
            assert_eq!(texel, &[30, 20, 10, 40]);
        }
    }
}
