//! Software image operations: block decompression, format conversion,
//! mipmap generation, channel utilities and float normalization.

use tephra_bcdec::decode_blocks;
use tephra_format::{decode_texel, encode_texel, FormatFamily, PixelFormat};

use crate::image::{Image, Shape};
use crate::OpError;

impl Image {
    /// Decompress a BC1-BC5 image in place into its expanded plain
    /// format (one byte per channel).
    ///
    /// All mips and slices are decoded. Row and subtexture alignments
    /// reset to 1; the layout is preserved.
    pub fn uncompress(&mut self) -> Result<(), OpError> {
        use PixelFormat::*;
        let format = self.format();
        match format {
            Bc1 | Bc1Srgb | Bc2 | Bc2Srgb | Bc3 | Bc3Srgb | Bc4 | Bc4S | Bc5 | Bc5S => {}
            other => return Err(OpError::UnsupportedFormat(other)),
        }

        let bytes_per_block = match format.family() {
            FormatFamily::BlockCompressed { bytes_per_block, .. } => bytes_per_block as usize,
            _ => return Err(OpError::UnsupportedFormat(format)),
        };
        let dest_format = format.expanded_format();
        let channels = dest_format.channel_count() as usize;

        let mut dest = Image::new(
            dest_format,
            self.width(0),
            self.height(0),
            self.shape(),
            self.mip_count(),
            self.array_count(),
        );
        dest.set_layout(self.layout());

        for mip in 0..self.mip_count() {
            let w = self.width(mip) as usize;
            let h = self.height(mip) as usize;
            let d = self.depth(mip) as usize;
            let blocks_x = w.div_ceil(4).max(1);
            let src_layer_size = self.bytes_per_row(mip) * self.row_count(mip);
            let src_row_padding = self.bytes_per_row(mip) - blocks_x * bytes_per_block;
            let dst_layer_size = w * h * channels;

            for slice in 0..self.slice_count() {
                // pixel_offset already bounds-checked the indices
                let src = match self.pixels(mip, slice) {
                    Some(src) => src,
                    None => continue,
                };
                let dst = match dest.pixels_mut(mip, slice) {
                    Some(dst) => dst,
                    None => continue,
                };
                for layer in 0..d {
                    decode_blocks(
                        &mut dst[layer * dst_layer_size..(layer + 1) * dst_layer_size],
                        &src[layer * src_layer_size..(layer + 1) * src_layer_size],
                        w,
                        h,
                        format,
                        src_row_padding,
                    )?;
                }
            }
        }

        self.replace(dest);
        Ok(())
    }

    /// Convert every texel to `new_format` through an `[f32; 4]` working
    /// value, rewriting the pixel buffer.
    ///
    /// Both formats must be codec-capable plain or packed-word formats.
    /// A single source channel replicates into RGB; a single destination
    /// channel takes the 0.30 / 0.59 / 0.11 luminance of RGB. Alignments
    /// reset to 1.
    pub fn convert(&mut self, new_format: PixelFormat) -> Result<(), OpError> {
        let format = self.format();
        if new_format == format {
            return Ok(());
        }

        let src_bpe = format.bytes_per_element() as usize;
        let dst_bpe = new_format.bytes_per_element() as usize;
        let probe_src = vec![0u8; src_bpe];
        let mut probe_dst = vec![0u8; dst_bpe];
        if src_bpe == 0 || decode_texel(format, &probe_src).is_none() {
            return Err(OpError::UnsupportedFormat(format));
        }
        if dst_bpe == 0 || !encode_texel(new_format, [0.0; 4], &mut probe_dst) {
            return Err(OpError::UnsupportedFormat(new_format));
        }

        let src_channels = format.channel_count();
        let dst_channels = new_format.channel_count();

        let mut dest = Image::new(
            new_format,
            self.width(0),
            self.height(0),
            self.shape(),
            self.mip_count(),
            self.array_count(),
        );
        dest.set_layout(self.layout());

        let fast_path: Option<fn(&[u8], &mut [u8])> = match (format, new_format) {
            (PixelFormat::Rgb8, PixelFormat::Rgba8) => Some(|src, dst| {
                dst[..3].copy_from_slice(&src[..3]);
                dst[3] = 255;
            }),
            (PixelFormat::Rgba8, PixelFormat::Bgra8) => Some(|src, dst| {
                dst[0] = src[2];
                dst[1] = src[1];
                dst[2] = src[0];
                dst[3] = src[3];
            }),
            _ => None,
        };

        for mip in 0..self.mip_count() {
            let w = self.width(mip) as usize;
            let rows = self.height(mip) as usize * self.depth(mip) as usize;
            let src_stride = self.bytes_per_row(mip);
            let dst_stride = dest.bytes_per_row(mip);

            for slice in 0..self.slice_count() {
                let src = match self.pixels(mip, slice) {
                    Some(src) => src,
                    None => continue,
                };
                let dst = match dest.pixels_mut(mip, slice) {
                    Some(dst) => dst,
                    None => continue,
                };
                for row in 0..rows {
                    let src_row = &src[row * src_stride..];
                    let dst_row = &mut dst[row * dst_stride..];
                    for x in 0..w {
                        let src_texel = &src_row[x * src_bpe..(x + 1) * src_bpe];
                        let dst_texel = &mut dst_row[x * dst_bpe..(x + 1) * dst_bpe];
                        if let Some(fast) = fast_path {
                            fast(src_texel, dst_texel);
                            continue;
                        }
                        // probe above guarantees the codec paths exist
                        let mut rgba = decode_texel(format, src_texel).unwrap_or([0.0; 4]);
                        if src_channels == 1 && dst_channels >= 3 {
                            rgba[1] = rgba[0];
                            rgba[2] = rgba[0];
                        }
                        if dst_channels == 1 && src_channels >= 3 {
                            rgba[0] = 0.30 * rgba[0] + 0.59 * rgba[1] + 0.11 * rgba[2];
                        }
                        encode_texel(new_format, rgba, dst_texel);
                    }
                }
            }
        }

        self.replace(dest);
        Ok(())
    }

    /// Regenerate the mip chain below level 0 with an 8-tap box filter,
    /// growing or shrinking the chain to `target_mip_count` (clamped to
    /// what the dimensions can carry).
    ///
    /// Requires a plain integer or f32 format, power-of-two dimensions
    /// and no alignment padding.
    pub fn generate_mipmaps(&mut self, target_mip_count: u32) -> Result<(), OpError> {
        let format = self.format();
        let sample = match (format.channel_width_bytes(), format.is_float()) {
            (Some(1), false) => SampleWidth::U8,
            (Some(2), false) => SampleWidth::U16,
            (Some(4), true) => SampleWidth::F32,
            _ => return Err(OpError::UnsupportedFormat(format)),
        };
        if !self.width(0).is_power_of_two() || !self.height(0).is_power_of_two() {
            return Err(OpError::UnsupportedPrecondition(
                "mipmap generation needs power-of-two dimensions".into(),
            ));
        }
        if let Shape::Volume { depth } = self.shape() {
            if !depth.is_power_of_two() {
                return Err(OpError::UnsupportedPrecondition(
                    "mipmap generation needs power-of-two depth".into(),
                ));
            }
        }
        if self.row_alignment() != 1 || self.subtexture_alignment() != 1 {
            return Err(OpError::UnsupportedPrecondition(
                "mipmap generation needs unpadded pixel rows".into(),
            ));
        }

        let mip_count = target_mip_count
            .max(1)
            .min(self.mip_count_from_dimensions());
        let channels = format.channel_count() as usize;

        let mut dest = Image::new(
            format,
            self.width(0),
            self.height(0),
            self.shape(),
            mip_count,
            self.array_count(),
        );
        dest.set_layout(self.layout());

        for slice in 0..self.slice_count() {
            if let (Some(src), Some(dst)) = (self.pixels(0, slice), dest.pixels_mut(0, slice)) {
                dst.copy_from_slice(src);
            }
        }

        for mip in 1..mip_count {
            let w = dest.width(mip - 1) as usize;
            let h = dest.height(mip - 1) as usize;
            let d = dest.depth(mip - 1) as usize;
            let cw = dest.width(mip) as usize;
            let ch = dest.height(mip) as usize;
            let cd = dest.depth(mip) as usize;

            for slice in 0..dest.slice_count() {
                let prev = match dest.pixels(mip - 1, slice) {
                    Some(prev) => prev.to_vec(),
                    None => continue,
                };
                let dst = match dest.pixels_mut(mip, slice) {
                    Some(dst) => dst,
                    None => continue,
                };
                downsample_box(dst, &prev, w, h, d, cw, ch, cd, channels, sample);
            }
        }

        self.replace(dest);
        Ok(())
    }

    /// Minimum and maximum sample over the whole buffer of an f32 image.
    pub fn color_range(&self) -> Result<(f32, f32), OpError> {
        use PixelFormat::*;
        match self.format() {
            R32F | Rg32F | Rgb32F | Rgba32F => {}
            other => return Err(OpError::UnsupportedFormat(other)),
        }
        let mut min = f32::MAX;
        let mut max = -f32::MAX;
        self.for_each_f32_row(|row| {
            for bytes in row.chunks_exact(4) {
                let v = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                min = min.min(v);
                max = max.max(v);
            }
        });
        Ok((min, max))
    }

    /// Remap every sample of an f32 image into `[0, 1]` using the global
    /// color range. A constant image is left untouched.
    pub fn normalize(&mut self) -> Result<(), OpError> {
        let (min, max) = self.color_range()?;
        if max <= min {
            return Ok(());
        }
        let scale = 1.0 / (max - min);
        self.for_each_f32_row_mut(|row| {
            for bytes in row.chunks_exact_mut(4) {
                let v = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                bytes.copy_from_slice(&((v - min) * scale).to_le_bytes());
            }
        });
        Ok(())
    }

    /// Visit the packed sample bytes of every row, skipping any row
    /// alignment padding.
    fn for_each_f32_row(&self, mut visit: impl FnMut(&[u8])) {
        let bpe = self.format().bytes_per_element() as usize;
        for mip in 0..self.mip_count() {
            let packed = self.width(mip) as usize * bpe;
            let rows = self.height(mip) as usize * self.depth(mip) as usize;
            let stride = self.bytes_per_row(mip);
            for slice in 0..self.slice_count() {
                if let Some(pixels) = self.pixels(mip, slice) {
                    for row in 0..rows {
                        visit(&pixels[row * stride..row * stride + packed]);
                    }
                }
            }
        }
    }

    fn for_each_f32_row_mut(&mut self, mut visit: impl FnMut(&mut [u8])) {
        let bpe = self.format().bytes_per_element() as usize;
        for mip in 0..self.mip_count() {
            let packed = self.width(mip) as usize * bpe;
            let rows = self.height(mip) as usize * self.depth(mip) as usize;
            let stride = self.bytes_per_row(mip);
            for slice in 0..self.slice_count() {
                if let Some(pixels) = self.pixels_mut(mip, slice) {
                    for row in 0..rows {
                        visit(&mut pixels[row * stride..row * stride + packed]);
                    }
                }
            }
        }
    }

    /// Swap two storage channels in every texel of a plain format.
    pub fn swap_channels(&mut self, channel_a: u32, channel_b: u32) -> Result<(), OpError> {
        let format = self.format();
        let Some(cw) = format.channel_width_bytes() else {
            return Err(OpError::UnsupportedFormat(format));
        };
        let channels = format.channel_count();
        if channel_a >= channels || channel_b >= channels {
            return Err(OpError::UnsupportedPrecondition(format!(
                "channel index out of range for {channels}-channel format"
            )));
        }
        if channel_a == channel_b {
            return Ok(());
        }

        let cw = cw as usize;
        let bpe = format.bytes_per_element() as usize;
        let off_a = channel_a as usize * cw;
        let off_b = channel_b as usize * cw;

        for mip in 0..self.mip_count() {
            let w = self.width(mip) as usize;
            let rows = self.height(mip) as usize * self.depth(mip) as usize;
            let stride = self.bytes_per_row(mip);
            for slice in 0..self.slice_count() {
                let pixels = match self.pixels_mut(mip, slice) {
                    Some(pixels) => pixels,
                    None => continue,
                };
                for row in 0..rows {
                    let row = &mut pixels[row * stride..];
                    for x in 0..w {
                        let texel = x * bpe;
                        for byte in 0..cw {
                            row.swap(texel + off_a + byte, texel + off_b + byte);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum SampleWidth {
    U8,
    U16,
    F32,
}

/// 8-tap box filter over one subtexture. Offsets collapse to zero along
/// dimensions that are already 1, so the divisor stays 8 everywhere.
#[allow(clippy::too_many_arguments)]
fn downsample_box(
    dst: &mut [u8],
    src: &[u8],
    w: usize,
    h: usize,
    d: usize,
    cw: usize,
    ch: usize,
    cd: usize,
    channels: usize,
    sample: SampleWidth,
) {
    let x_off = if w < 2 { 0 } else { channels };
    let y_off = if h < 2 { 0 } else { channels * w };
    let z_off = if d < 2 { 0 } else { channels * w * h };

    macro_rules! filter_int {
        ($ty:ty, $width:expr) => {{
            let read = |i: usize| -> u32 {
                let mut bytes = [0u8; core::mem::size_of::<$ty>()];
                bytes.copy_from_slice(&src[i * $width..(i + 1) * $width]);
                <$ty>::from_le_bytes(bytes) as u32
            };
            for z in 0..cd {
                for y in 0..ch {
                    for x in 0..cw {
                        let base = ((z * 2 * h + y * 2) * w + x * 2) * channels;
                        let out = ((z * ch + y) * cw + x) * channels;
                        for c in 0..channels {
                            let i = base + c;
                            let sum = read(i)
                                + read(i + x_off)
                                + read(i + y_off)
                                + read(i + x_off + y_off)
                                + read(i + z_off)
                                + read(i + z_off + x_off)
                                + read(i + z_off + y_off)
                                + read(i + z_off + x_off + y_off);
                            let v = (sum / 8) as $ty;
                            dst[(out + c) * $width..(out + c + 1) * $width]
                                .copy_from_slice(&v.to_le_bytes());
                        }
                    }
                }
            }
        }};
    }

    match sample {
        SampleWidth::U8 => filter_int!(u8, 1),
        SampleWidth::U16 => filter_int!(u16, 2),
        SampleWidth::F32 => {
            let read = |i: usize| -> f32 {
                f32::from_le_bytes([
                    src[i * 4],
                    src[i * 4 + 1],
                    src[i * 4 + 2],
                    src[i * 4 + 3],
                ])
            };
            for z in 0..cd {
                for y in 0..ch {
                    for x in 0..cw {
                        let base = ((z * 2 * h + y * 2) * w + x * 2) * channels;
                        let out = ((z * ch + y) * cw + x) * channels;
                        for c in 0..channels {
                            let i = base + c;
                            let sum = read(i)
                                + read(i + x_off)
                                + read(i + y_off)
                                + read(i + x_off + y_off)
                                + read(i + z_off)
                                + read(i + z_off + x_off)
                                + read(i + z_off + y_off)
                                + read(i + z_off + x_off + y_off);
                            let v = sum / 8.0;
                            dst[(out + c) * 4..(out + c + 1) * 4]
                                .copy_from_slice(&v.to_le_bytes());
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Layout;

    /// One solid-red BC1 block: both endpoints 0xF800, all indices 0.
    fn solid_red_bc1_block() -> [u8; 8] {
        let mut block = [0u8; 8];
        block[..2].copy_from_slice(&0xF800u16.to_le_bytes());
        block[2..4].copy_from_slice(&0xF800u16.to_le_bytes());
        block
    }

    #[test]
    fn test_uncompress_bc1_to_rgba8() {
        let mut data = Vec::new();
        // 8x8 surface = 2x2 blocks
        for _ in 0..4 {
            data.extend_from_slice(&solid_red_bc1_block());
        }
        let mut image = Image::from_parts(
            PixelFormat::Bc1,
            8,
            8,
            Shape::Flat,
            1,
            1,
            Layout::MipsAfterSlices,
            1,
            1,
            data,
        )
        .unwrap();

        image.uncompress().unwrap();

        assert_eq!(image.format(), PixelFormat::Rgba8);
        assert_eq!(image.size_in_bytes(), 8 * 8 * 4);
        for texel in image.data().chunks_exact(4) {
            assert_eq!(texel, &[0xF8, 0, 0, 255]);
        }
    }

    #[test]
    fn test_uncompress_bc4_to_r8() {
        let mut block = [0u8; 8];
        block[0] = 200;
        block[1] = 100;
        let mut image = Image::from_parts(
            PixelFormat::Bc4,
            4,
            4,
            Shape::Flat,
            1,
            1,
            Layout::MipsAfterSlices,
            1,
            1,
            block.to_vec(),
        )
        .unwrap();

        image.uncompress().unwrap();
        assert_eq!(image.format(), PixelFormat::R8);
        assert!(image.data().iter().all(|&v| v == 200));
    }

    #[test]
    fn test_uncompress_rejects_plain_format() {
        let mut image = Image::new(PixelFormat::Rgba8, 4, 4, Shape::Flat, 1, 1);
        assert!(matches!(
            image.uncompress(),
            Err(OpError::UnsupportedFormat(PixelFormat::Rgba8))
        ));
    }

    #[test]
    fn test_convert_rgb8_to_rgba8() {
        let mut image = Image::new(PixelFormat::Rgb8, 2, 2, Shape::Flat, 1, 1);
        image.data_mut().copy_from_slice(&[
            10, 20, 30, 40, 50, 60, //
            70, 80, 90, 100, 110, 120,
        ]);
        image.convert(PixelFormat::Rgba8).unwrap();
        assert_eq!(
            image.data(),
            &[
                10, 20, 30, 255, 40, 50, 60, 255, //
                70, 80, 90, 255, 100, 110, 120, 255,
            ]
        );
    }

    #[test]
    fn test_convert_rgba8_to_bgra8() {
        let mut image = Image::new(PixelFormat::Rgba8, 1, 1, Shape::Flat, 1, 1);
        image.data_mut().copy_from_slice(&[1, 2, 3, 4]);
        image.convert(PixelFormat::Bgra8).unwrap();
        assert_eq!(image.data(), &[3, 2, 1, 4]);
    }

    #[test]
    fn test_convert_to_luminance() {
        let mut image = Image::new(PixelFormat::Rgba8, 1, 1, Shape::Flat, 1, 1);
        image.data_mut().copy_from_slice(&[255, 255, 255, 255]);
        image.convert(PixelFormat::R8).unwrap();
        assert_eq!(image.data(), &[255]);
    }

    #[test]
    fn test_convert_single_channel_replicates() {
        let mut image = Image::new(PixelFormat::R8, 1, 1, Shape::Flat, 1, 1);
        image.data_mut()[0] = 128;
        image.convert(PixelFormat::Rgb8).unwrap();
        assert_eq!(image.data(), &[128, 128, 128]);
    }

    #[test]
    fn test_convert_rejects_compressed() {
        let mut image = Image::from_parts(
            PixelFormat::Bc1,
            4,
            4,
            Shape::Flat,
            1,
            1,
            Layout::MipsAfterSlices,
            1,
            1,
            vec![0u8; 8],
        )
        .unwrap();
        assert!(image.convert(PixelFormat::Rgba8).is_err());
    }

    #[test]
    fn test_generate_mipmaps_full_chain() {
        // 16x16 RGBA8 carries a 5-level chain ending at 1x1
        let mut image = Image::new(PixelFormat::Rgba8, 16, 16, Shape::Flat, 1, 1);
        for texel in image.data_mut().chunks_exact_mut(4) {
            texel.copy_from_slice(&[64, 128, 192, 255]);
        }

        image.generate_mipmaps(u32::MAX).unwrap();

        assert_eq!(image.mip_count(), 5);
        assert_eq!(image.width(4), 1);
        assert_eq!(image.height(4), 1);
        // constant input stays constant at every level
        for mip in 0..5 {
            let pixels = image.pixels(mip, 0).unwrap();
            for texel in pixels.chunks_exact(4) {
                assert_eq!(texel, &[64, 128, 192, 255]);
            }
        }
    }

    #[test]
    fn test_generate_mipmaps_box_average() {
        let mut image = Image::new(PixelFormat::R8, 2, 2, Shape::Flat, 1, 1);
        image.data_mut().copy_from_slice(&[0, 100, 100, 200]);
        image.generate_mipmaps(2).unwrap();
        // 8 taps with collapsed z: (0+100+100+200)*2 / 8 = 100
        assert_eq!(image.pixels(1, 0).unwrap(), &[100]);
    }

    #[test]
    fn test_generate_mipmaps_f32() {
        let mut image = Image::new(PixelFormat::R32F, 2, 1, Shape::Flat, 1, 1);
        image.data_mut()[..4].copy_from_slice(&1.0f32.to_le_bytes());
        image.data_mut()[4..].copy_from_slice(&3.0f32.to_le_bytes());
        image.generate_mipmaps(2).unwrap();
        let pixels = image.pixels(1, 0).unwrap();
        let v = f32::from_le_bytes([pixels[0], pixels[1], pixels[2], pixels[3]]);
        assert_eq!(v, 2.0);
    }

    #[test]
    fn test_generate_mipmaps_rejects_npot() {
        let mut image = Image::new(PixelFormat::Rgba8, 12, 16, Shape::Flat, 1, 1);
        assert!(matches!(
            image.generate_mipmaps(2),
            Err(OpError::UnsupportedPrecondition(_))
        ));
    }

    #[test]
    fn test_normalize() {
        let mut image = Image::new(PixelFormat::R32F, 2, 1, Shape::Flat, 1, 1);
        image.data_mut()[..4].copy_from_slice(&2.0f32.to_le_bytes());
        image.data_mut()[4..].copy_from_slice(&6.0f32.to_le_bytes());

        assert_eq!(image.color_range().unwrap(), (2.0, 6.0));
        image.normalize().unwrap();

        let lo = f32::from_le_bytes(image.data()[..4].try_into().unwrap());
        let hi = f32::from_le_bytes(image.data()[4..].try_into().unwrap());
        assert_eq!((lo, hi), (0.0, 1.0));
    }

    #[test]
    fn test_normalize_constant_is_noop() {
        let mut image = Image::new(PixelFormat::R32F, 2, 1, Shape::Flat, 1, 1);
        image.data_mut()[..4].copy_from_slice(&5.0f32.to_le_bytes());
        image.data_mut()[4..].copy_from_slice(&5.0f32.to_le_bytes());
        image.normalize().unwrap();
        let v = f32::from_le_bytes(image.data()[..4].try_into().unwrap());
        assert_eq!(v, 5.0);
    }

    #[test]
    fn test_normalize_rejects_integer_format() {
        let image = Image::new(PixelFormat::Rgba8, 2, 2, Shape::Flat, 1, 1);
        assert!(image.color_range().is_err());
    }

    #[test]
    fn test_swap_channels() {
        let mut image = Image::new(PixelFormat::Rgba8, 2, 1, Shape::Flat, 1, 1);
        image.data_mut().copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        image.swap_channels(0, 2).unwrap();
        assert_eq!(image.data(), &[3, 2, 1, 4, 7, 6, 5, 8]);
    }

    #[test]
    fn test_swap_channels_out_of_range() {
        let mut image = Image::new(PixelFormat::Rg8, 1, 1, Shape::Flat, 1, 1);
        assert!(image.swap_channels(0, 2).is_err());
    }
}
