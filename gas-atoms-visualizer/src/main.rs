use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use gas_atoms_common::{load_frames, AtomColor, Frame};
use image::{ImageBuffer, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use log::{info, warn, LevelFilter};
use palette::{Darken, LinSrgb, Srgb};
use rayon::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

/// Command-line arguments for the visualizer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Recorded frames (.json, .bin or .msgpack)
    #[arg(short, long)]
    input: PathBuf,

    /// Directory the PNG frames are written to
    #[arg(short, long, default_value = "frames")]
    output_dir: PathBuf,

    /// Width of the output images in pixels
    #[arg(long, default_value_t = 390)]
    width: u32,

    /// Height of the output images in pixels (calculated from aspect ratio if not provided)
    #[arg(long)]
    height: Option<u32>,

    /// Render only every n-th frame
    #[arg(long, default_value_t = 1)]
    every: usize,

    /// Background color - any CSS color name
    #[arg(long, default_value = "black")]
    bg_color: String,
}

/// Resolved drawing parameters shared by every frame.
#[derive(Debug, Clone, Copy)]
struct Canvas {
    width: u32,
    height: u32,
    pixels_per_unit: f32,
    background: Rgba<u8>,
}

/// Parse a CSS color name to RGBA values
fn parse_color(color_name: &str) -> Rgba<u8> {
    match palette::named::from_str(&color_name.to_ascii_lowercase()) {
        Some(color) => Rgba([color.red, color.green, color.blue, 255]),
        None => {
            // Default to black if color not found
            warn!("Color '{}' not recognized, using black.", color_name);
            Rgba([0, 0, 0, 255])
        }
    }
}

/// Fill and rim colors for an atom tag.
fn atom_colors(color: AtomColor) -> (Rgba<u8>, Rgba<u8>) {
    let [r, g, b] = color.rgb();
    let fill = Srgb::new(r, g, b);
    let linear: LinSrgb<f32> = fill.into_linear();
    let rim: Srgb<u8> = Srgb::from_linear(linear.darken(0.35));
    (
        Rgba([fill.red, fill.green, fill.blue, 255]),
        Rgba([rim.red, rim.green, rim.blue, 255]),
    )
}

/// Draw one recorded frame. Arena coordinates have their origin at the top-left,
/// same as image coordinates, so no axis flip is needed.
fn draw_frame(frame: &Frame, canvas: &Canvas) -> RgbaImage {
    let mut image = ImageBuffer::from_pixel(canvas.width, canvas.height, canvas.background);

    for atom in &frame.atoms {
        let px = (atom.x * canvas.pixels_per_unit).round() as i32;
        let py = (atom.y * canvas.pixels_per_unit).round() as i32;
        let radius_px = ((atom.radius * canvas.pixels_per_unit).round() as i32).max(1);
        let (fill, rim) = atom_colors(atom.color);
        draw_filled_circle_mut(&mut image, (px, py), radius_px, fill);
        if radius_px > 2 {
            draw_hollow_circle_mut(&mut image, (px, py), radius_px, rim);
        }
    }

    image
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    run_with_args(args)
}

fn run_with_args(args: Args) -> Result<()> {
    // Initialize logger
    let _ = Builder::from_default_env()
        .filter(None, LevelFilter::Info)
        .try_init();

    info!("Starting gas-atoms visualizer...");
    info!("Input file: {}", args.input.display());
    info!("Output directory: {}", args.output_dir.display());

    let frames = load_frames(&args.input)?;
    info!("Found {} frames in the file", frames.len());
    let Some(first) = frames.first() else {
        warn!("Input file contains no frames. Exiting.");
        return Ok(());
    };

    // --- Calculate Output Dimensions and Scale ---
    let (arena_width, arena_height) = (first.arena_width, first.arena_height);
    if arena_width <= 0.0 || arena_height <= 0.0 {
        anyhow::bail!("Frames carry an empty arena ({}x{}).", arena_width, arena_height);
    }
    let width = args.width.max(1);
    let height = args
        .height
        .unwrap_or_else(|| (width as f32 * arena_height / arena_width).round() as u32)
        .max(1);
    let pixels_per_unit = (width as f32 / arena_width).min(height as f32 / arena_height);
    let canvas = Canvas {
        width,
        height,
        pixels_per_unit,
        background: parse_color(&args.bg_color),
    };
    info!(
        "Arena {:.1}x{:.1} -> {}x{} px ({:.3} px per unit)",
        arena_width, arena_height, width, height, pixels_per_unit
    );

    fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("Failed to create output directory {}", args.output_dir.display())
    })?;

    let selected: Vec<&Frame> = frames.iter().step_by(args.every.max(1)).collect();

    // Set up progress bar
    let progress_bar = ProgressBar::new(selected.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames ({percent}%) [{eta}]")
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );

    let start_time = Instant::now();
    selected
        .par_iter()
        .enumerate()
        .progress_with(progress_bar.clone())
        .try_for_each(|(index, frame)| -> Result<()> {
            let image = draw_frame(frame, &canvas);
            let path = args.output_dir.join(format!("frame_{:05}.png", index));
            image
                .save(&path)
                .with_context(|| format!("Failed to write {}", path.display()))
        })?;
    progress_bar.finish_with_message("done");

    let duration = start_time.elapsed();
    info!(
        "Rendered {} frames in {:.2?} ({:.1} frames per second)",
        selected.len(),
        duration,
        selected.len() as f64 / duration.as_secs_f64().max(f64::EPSILON)
    );

    Ok(())
}
