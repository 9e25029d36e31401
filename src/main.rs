//! Tephra CLI - Command-line tool for inspecting and decoding texture
//! containers.
//!
//! This is the main entry point for the Tephra command-line application.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use tephra::prelude::*;

/// Tephra - DDS/KTX texture inspection and decoding tool
#[derive(Parser)]
#[command(name = "tephra")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print container and geometry information for a texture file
    Info {
        /// Input DDS or KTX file
        #[arg(short, long, env = "INPUT_TEXTURE")]
        input: PathBuf,

        /// Show per-level sizes
        #[arg(short, long)]
        detailed: bool,
    },

    /// Decode a texture file to a PNG
    Decode {
        /// Input DDS or KTX file
        #[arg(short, long, env = "INPUT_TEXTURE")]
        input: PathBuf,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,

        /// Mip level to decode
        #[arg(short, long, default_value_t = 0)]
        mip: u32,

        /// Array element / cube face to decode
        #[arg(short, long, default_value_t = 0)]
        slice: u32,
    },

    /// Regenerate the mip chain of a texture and report the result
    Mipmap {
        /// Input DDS or KTX file
        #[arg(short, long, env = "INPUT_TEXTURE")]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { input, detailed } => {
            cmd_info(&input, detailed)?;
        }
        Commands::Decode {
            input,
            output,
            mip,
            slice,
        } => {
            cmd_decode(&input, &output, mip, slice)?;
        }
        Commands::Mipmap { input } => {
            cmd_mipmap(&input)?;
        }
    }

    Ok(())
}

fn shape_name(shape: Shape) -> String {
    match shape {
        Shape::Flat => "2D".to_string(),
        Shape::Volume { depth } => format!("3D (depth {depth})"),
        Shape::Cube => "cube".to_string(),
    }
}

fn cmd_info(input: &PathBuf, detailed: bool) -> Result<()> {
    let image = Image::load_from_file(input, &LoadOptions::default())
        .with_context(|| format!("Failed to load {}", input.display()))?;

    println!("File:    {}", input.display());
    println!("Format:  {:?}", image.format());
    println!("Size:    {}x{}", image.width(0), image.height(0));
    println!("Shape:   {}", shape_name(image.shape()));
    println!("Mips:    {}", image.mip_count());
    println!("Array:   {}", image.array_count());
    println!("Bytes:   {}", image.size_in_bytes());

    if detailed {
        println!();
        for mip in 0..image.mip_count() {
            println!(
                "  level {:>2}: {:>5}x{:<5} {:>10} bytes",
                mip,
                image.width(mip),
                image.height(mip),
                image.slice_size(mip)
            );
        }
    }

    Ok(())
}

fn cmd_decode(input: &PathBuf, output: &PathBuf, mip: u32, slice: u32) -> Result<()> {
    println!("Decoding: {} -> {}", input.display(), output.display());

    let mut img = Image::load_from_file(input, &LoadOptions::default())
        .with_context(|| format!("Failed to load {}", input.display()))?;

    if img.format().is_compressed() {
        img.uncompress().context("Failed to decompress")?;
    }
    if img.format() != PixelFormat::Rgba8 {
        img.convert(PixelFormat::Rgba8)
            .with_context(|| format!("No conversion from {:?} to RGBA8", img.format()))?;
    }

    let width = img.width(mip);
    let height = img.height(mip);
    let pixels = img
        .pixels(mip, slice)
        .with_context(|| format!("No mip {mip} / slice {slice} in this file"))?;

    let png = image::RgbaImage::from_raw(width, height, pixels.to_vec())
        .context("Decoded buffer does not match geometry")?;
    png.save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Wrote {width}x{height} PNG");

    Ok(())
}

fn cmd_mipmap(input: &PathBuf) -> Result<()> {
    let mut img = Image::load_from_file(input, &LoadOptions::default())
        .with_context(|| format!("Failed to load {}", input.display()))?;

    if img.format().is_compressed() {
        img.uncompress().context("Failed to decompress")?;
    }

    let before = img.mip_count();
    img.generate_mipmaps(u32::MAX)
        .context("Failed to generate mipmaps")?;

    println!(
        "Mip chain: {} -> {} levels, {} bytes total",
        before,
        img.mip_count(),
        img.size_in_bytes()
    );

    Ok(())
}
