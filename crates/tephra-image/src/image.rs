//! The image entity and its addressing arithmetic.

use tephra_common::align_up;
use tephra_format::{FormatFamily, PixelFormat};

use crate::ImageError;

/// Spatial shape of an image.
///
/// Cubemaps are a shape, not a depth sentinel: callers match on this
/// instead of testing magic values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// 1D or 2D surface.
    Flat,
    /// Volume texture with the top-level depth.
    Volume { depth: u32 },
    /// Six-faced cubemap.
    Cube,
}

impl Shape {
    /// Number of cube faces (1 for non-cube shapes).
    pub fn face_count(self) -> u32 {
        match self {
            Shape::Cube => 6,
            _ => 1,
        }
    }
}

/// Slice storage convention of the pixel buffer.
///
/// The two conventions are mutually exclusive; all addressing goes
/// through [`Image::pixels`] so call sites never reimplement the
/// arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Each slice stores its full mip chain contiguously; slices follow
    /// one another.
    SlicesAfterMips,
    /// Each mip level stores all slices contiguously; levels follow one
    /// another, largest first. Container loaders use this.
    MipsAfterSlices,
}

/// A block of texture memory: geometry, format, mip chain, slices, and
/// the pixel buffer itself.
#[derive(Debug, Clone)]
pub struct Image {
    width: u32,
    height: u32,
    shape: Shape,
    format: PixelFormat,
    mip_count: u32,
    array_count: u32,
    row_alignment: u32,
    subtexture_alignment: u32,
    layout: Layout,
    data: Vec<u8>,
    source_path: Option<String>,
}

impl Image {
    /// Create an image with a zero-filled pixel buffer.
    pub fn new(
        format: PixelFormat,
        width: u32,
        height: u32,
        shape: Shape,
        mip_count: u32,
        array_count: u32,
    ) -> Self {
        let mut image = Self {
            width: width.max(1),
            height: height.max(1),
            shape,
            format,
            mip_count: mip_count.max(1),
            array_count: array_count.max(1),
            row_alignment: 1,
            subtexture_alignment: 1,
            layout: Layout::SlicesAfterMips,
            data: Vec::new(),
            source_path: None,
        };
        image.data = vec![0; image.size_in_bytes()];
        image
    }

    /// Create an image around an existing pixel buffer without copying.
    ///
    /// The buffer length must match the geometry exactly.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        format: PixelFormat,
        width: u32,
        height: u32,
        shape: Shape,
        mip_count: u32,
        array_count: u32,
        layout: Layout,
        row_alignment: u32,
        subtexture_alignment: u32,
        data: Vec<u8>,
    ) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidGeometry("zero width or height".into()));
        }
        if matches!(shape, Shape::Volume { depth: 0 }) {
            return Err(ImageError::InvalidGeometry("zero volume depth".into()));
        }

        let mut image = Self {
            width,
            height,
            shape,
            format,
            mip_count: mip_count.max(1),
            array_count: array_count.max(1),
            row_alignment: row_alignment.max(1),
            subtexture_alignment: subtexture_alignment.max(1),
            layout,
            data: Vec::new(),
            source_path: None,
        };
        let expected = image.size_in_bytes();
        if data.len() != expected {
            return Err(ImageError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        image.data = data;
        Ok(image)
    }

    /// Geometry-only image with no pixel buffer, used by the loaders to
    /// size allocations before committing to them.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn with_geometry(
        format: PixelFormat,
        width: u32,
        height: u32,
        shape: Shape,
        mip_count: u32,
        array_count: u32,
        layout: Layout,
        row_alignment: u32,
        subtexture_alignment: u32,
    ) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            shape,
            format,
            mip_count: mip_count.max(1),
            array_count: array_count.max(1),
            row_alignment: row_alignment.max(1),
            subtexture_alignment: subtexture_alignment.max(1),
            layout,
            data: Vec::new(),
            source_path: None,
        }
    }

    /// Install a pixel buffer; the caller guarantees its length matches
    /// [`Image::size_in_bytes`].
    pub(crate) fn set_data(&mut self, data: Vec<u8>) {
        debug_assert_eq!(data.len(), self.size_in_bytes());
        self.data = data;
    }

    /// Replace geometry and buffer in one step, used by operations that
    /// change format or mip count.
    pub(crate) fn replace(&mut self, other: Image) {
        let source_path = self.source_path.take();
        *self = other;
        self.source_path = source_path;
    }

    // accessors

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub(crate) fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
    }

    pub fn mip_count(&self) -> u32 {
        self.mip_count
    }

    pub fn array_count(&self) -> u32 {
        self.array_count
    }

    /// Total stored slices: array elements times cube faces.
    pub fn slice_count(&self) -> u32 {
        self.array_count * self.shape.face_count()
    }

    pub fn row_alignment(&self) -> u32 {
        self.row_alignment
    }

    pub fn subtexture_alignment(&self) -> u32 {
        self.subtexture_alignment
    }

    /// Provenance of a file load, when there is one.
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    pub(crate) fn set_source_path(&mut self, path: String) {
        self.source_path = Some(path);
    }

    /// Raw pixel buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Raw mutable pixel buffer.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Drop the pixel buffer and reset geometry.
    pub fn clear(&mut self) {
        let source_path = self.source_path.take();
        *self = Image::new(PixelFormat::R8, 1, 1, Shape::Flat, 1, 1);
        self.source_path = source_path;
    }

    // per-level geometry

    /// Width of `level` in texels.
    pub fn width(&self, level: u32) -> u32 {
        self.width.checked_shr(level).unwrap_or(0).max(1)
    }

    /// Height of `level` in texels.
    pub fn height(&self, level: u32) -> u32 {
        self.height.checked_shr(level).unwrap_or(0).max(1)
    }

    /// Depth of `level` in texels (1 for flat and cube shapes).
    pub fn depth(&self, level: u32) -> u32 {
        match self.shape {
            Shape::Volume { depth } => depth.checked_shr(level).unwrap_or(0).max(1),
            _ => 1,
        }
    }

    /// Bytes per stored row of `level`, including row alignment padding.
    /// Zero for tile formats that have no row addressing.
    pub fn bytes_per_row(&self, level: u32) -> usize {
        self.bytes_per_row_as(level, self.format)
    }

    fn bytes_per_row_as(&self, level: u32, format: PixelFormat) -> usize {
        let w = self.width(level) as usize;
        let packed = match format.family() {
            FormatFamily::Uncompressed { bytes_per_texel }
            | FormatFamily::Clut { bytes_per_texel } => w * bytes_per_texel as usize,
            FormatFamily::BlockCompressed {
                block_width,
                bytes_per_block,
                ..
            } => w.div_ceil(block_width as usize) * bytes_per_block as usize,
            FormatFamily::Pvrtc { .. } => return 0,
        };
        align_up(packed, self.row_alignment as usize)
    }

    /// Stored rows in one depth layer of `level` (block rows for
    /// compressed formats).
    pub fn row_count(&self, level: u32) -> usize {
        let (_, block_height, _) = self.format.block_dimensions();
        (self.height(level) as usize).div_ceil(block_height as usize)
    }

    /// Bytes of one slice of `level`, without subtexture alignment.
    pub fn slice_size(&self, level: u32) -> usize {
        self.slice_size_as(level, self.format)
    }

    /// Like [`Image::slice_size`] for a prospective format, used while
    /// converting.
    pub fn slice_size_as(&self, level: u32, format: PixelFormat) -> usize {
        let w = self.width(level) as usize;
        let h = self.height(level) as usize;
        let d = self.depth(level) as usize;
        match format.family() {
            FormatFamily::Pvrtc {
                bits_per_texel,
                min_tile_width,
                min_tile_height,
            } => {
                let w = w.next_multiple_of(min_tile_width as usize);
                let h = h.next_multiple_of(min_tile_height as usize);
                w * h * d * bits_per_texel as usize / 8
            }
            FormatFamily::BlockCompressed {
                block_height,
                block_depth,
                ..
            } => {
                self.bytes_per_row_as(level, format)
                    * h.div_ceil(block_height as usize)
                    * d.div_ceil(block_depth as usize)
            }
            _ => self.bytes_per_row_as(level, format) * h * d,
        }
    }

    /// Slice size of `level` rounded up to the subtexture alignment.
    pub fn aligned_slice_size(&self, level: u32) -> usize {
        align_up(self.slice_size(level), self.subtexture_alignment as usize)
    }

    /// Bytes of one slice's chain of levels `[first, first + count)`,
    /// clamped to the mip count.
    fn slice_chain_size(&self, first_level: u32, count: u32) -> usize {
        let last = (first_level + count).min(self.mip_count);
        (first_level..last)
            .map(|level| self.aligned_slice_size(level))
            .sum()
    }

    /// Byte size of levels `[first, first + count)`.
    ///
    /// Matches the container-facing convention: the array factor is
    /// folded in only for [`Layout::MipsAfterSlices`], the cube factor
    /// always.
    pub fn mip_mapped_size(&self, first_level: u32, count: u32) -> usize {
        let mut size = self.slice_chain_size(first_level, count);
        if self.layout == Layout::MipsAfterSlices {
            size *= self.array_count as usize;
        }
        size * self.shape.face_count() as usize
    }

    /// Total byte size of the pixel buffer.
    pub fn size_in_bytes(&self) -> usize {
        match self.layout {
            Layout::SlicesAfterMips => {
                self.mip_mapped_size(0, self.mip_count) * self.array_count as usize
            }
            Layout::MipsAfterSlices => self.mip_mapped_size(0, self.mip_count),
        }
    }

    /// Byte offset of `(mip, slice)` in the pixel buffer, or `None` when
    /// either index is out of range.
    pub fn pixel_offset(&self, mip: u32, slice: u32) -> Option<usize> {
        if mip >= self.mip_count || slice >= self.slice_count() {
            return None;
        }
        let slice = slice as usize;
        Some(match self.layout {
            Layout::SlicesAfterMips => {
                slice * self.slice_chain_size(0, self.mip_count) + self.slice_chain_size(0, mip)
            }
            Layout::MipsAfterSlices => {
                self.slice_chain_size(0, mip) * self.slice_count() as usize
                    + slice * self.aligned_slice_size(mip)
            }
        })
    }

    /// Pixels of one `(mip, slice)` subtexture, or `None` when out of
    /// range.
    pub fn pixels(&self, mip: u32, slice: u32) -> Option<&[u8]> {
        let offset = self.pixel_offset(mip, slice)?;
        Some(&self.data[offset..offset + self.slice_size(mip)])
    }

    /// Mutable pixels of one `(mip, slice)` subtexture.
    pub fn pixels_mut(&mut self, mip: u32, slice: u32) -> Option<&mut [u8]> {
        let offset = self.pixel_offset(mip, slice)?;
        let size = self.slice_size(mip);
        Some(&mut self.data[offset..offset + size])
    }

    /// The full mip chain the dimensions can carry, down to 1x1(x1).
    pub fn mip_count_from_dimensions(&self) -> u32 {
        let mut extent = self.width.max(self.height);
        if let Shape::Volume { depth } = self.shape {
            extent = extent.max(depth);
        }
        32 - extent.leading_zeros()
    }

    /// Texels in levels `[first, first + count)` of one array element,
    /// cube faces included.
    pub fn texel_count(&self, first_level: u32, count: u32) -> usize {
        let last = (first_level + count).min(self.mip_count);
        let total: usize = (first_level..last)
            .map(|level| {
                self.width(level) as usize * self.height(level) as usize
                    * self.depth(level) as usize
            })
            .sum();
        total * self.shape.face_count() as usize
    }
}
