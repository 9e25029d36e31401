//! Mip-mapped texture image entity and operations.
//!
//! [`Image`] models a block of texture memory: geometry (width, height,
//! [`Shape`]), a [`PixelFormat`](tephra_format::PixelFormat), a mip
//! chain, array elements / cube faces, and one of two slice storage
//! conventions ([`Layout`]). All byte addressing goes through
//! [`Image::pixels`] / [`Image::pixels_mut`].
//!
//! On top of the entity sit the software operations (uncompress, format
//! conversion, mipmap generation, normalization) and the loader registry
//! that dispatches container bytes to the DDS and KTX parsers.

mod error;
mod image;
mod loader;
mod ops;

pub use error::{ImageError, LoadError, OpError};
pub use image::{Image, Layout, Shape};
pub use loader::{
    DdsLoader, HeapAllocator, ImageLoader, KtxLoader, LoadOptions, LoaderRegistry, TexelAllocator,
};
