//! Tephra - texture container loading and image manipulation library.
//!
//! This crate provides a unified interface to the Tephra library
//! ecosystem for working with GPU texture data in software.
//!
//! # Crates
//!
//! - [`tephra_common`] - Common utilities (binary reading, alignment)
//! - [`tephra_format`] - Pixel format descriptions and the texel codec
//! - [`tephra_bcdec`] - BC1-BC5 software block decompression
//! - [`tephra_dds`] - DDS container parsing
//! - [`tephra_ktx`] - KTX v1 container parsing
//! - [`tephra_image`] - Image entity, addressing, operations and loading
//!
//! # Example
//!
//! ```no_run
//! use tephra::prelude::*;
//!
//! // Load a texture file through the built-in loaders
//! let mut image = Image::load_from_file("albedo.dds", &LoadOptions::default())?;
//! println!(
//!     "{}x{} {:?}, {} mips",
//!     image.width(0),
//!     image.height(0),
//!     image.format(),
//!     image.mip_count()
//! );
//!
//! // Decompress to plain bytes for CPU-side use
//! if image.format().is_compressed() {
//!     image.uncompress()?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use tephra_bcdec as bcdec;
pub use tephra_common as common;
pub use tephra_dds as dds;
pub use tephra_format as format;
pub use tephra_image as image;
pub use tephra_ktx as ktx;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tephra_common::BinaryReader;
    pub use tephra_dds::DdsReader;
    pub use tephra_format::{FormatFamily, PixelFormat};
    pub use tephra_image::{
        Image, ImageLoader, Layout, LoadOptions, LoaderRegistry, Shape,
    };
    pub use tephra_ktx::KtxReader;
}

// Re-export commonly used types at the crate root
pub use tephra_format::PixelFormat;
pub use tephra_image::Image;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
