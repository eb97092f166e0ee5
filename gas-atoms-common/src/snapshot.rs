use crate::color::AtomColor;
use crate::config::OutputFormat;
use crate::interaction::InteractionState;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Render-facing view of a single atom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtomFrame {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub color: AtomColor,
}

/// Read-only picture of the engine after a given tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Number of ticks advanced before this frame was taken.
    pub tick: u64,
    pub state: InteractionState,
    pub speed_multiplier: f32,
    pub arena_width: f32,
    pub arena_height: f32,
    pub atoms: Vec<AtomFrame>,
}

/// Writes frames as a `u32` count header followed by each bincode-encoded frame.
pub fn write_frames_bincode<W: Write>(mut writer: W, frames: &[Frame]) -> Result<()> {
    let count = u32::try_from(frames.len()).context("Too many frames for a bincode container")?;
    bincode::serialize_into(&mut writer, &count).context("Failed to write frame count header")?;
    for (i, frame) in frames.iter().enumerate() {
        bincode::serialize_into(&mut writer, frame)
            .with_context(|| format!("Failed to write frame {}", i))?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads the container produced by [`write_frames_bincode`].
pub fn read_frames_bincode<R: Read>(mut reader: R) -> Result<Vec<Frame>> {
    let count: u32 = bincode::deserialize_from(&mut reader)
        .context("Failed to read frame count from header")?;
    let mut frames = Vec::with_capacity(count as usize);
    for i in 0..count {
        let frame: Frame = bincode::deserialize_from(&mut reader)
            .with_context(|| format!("Failed to read frame {} of {}", i, count))?;
        frames.push(frame);
    }
    Ok(frames)
}

/// Writes all frames to `path` in the given format.
pub fn save_frames<P: AsRef<Path>>(path: P, format: OutputFormat, frames: &[Frame]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create frame file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);
    match format {
        OutputFormat::Json => {
            serde_json::to_writer(&mut writer, frames).context("Failed to serialize frames to JSON")?;
            writer.flush()?;
        }
        OutputFormat::Bincode => write_frames_bincode(&mut writer, frames)?,
        OutputFormat::MessagePack => {
            rmp_serde::encode::write(&mut writer, frames)
                .context("Failed to serialize frames to MessagePack")?;
            writer.flush()?;
        }
    }
    Ok(())
}

/// Reads frames from `path`, picking the format from the file extension.
pub fn load_frames<P: AsRef<Path>>(path: P) -> Result<Vec<Frame>> {
    let path = path.as_ref();
    let format = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(OutputFormat::from_extension)
        .with_context(|| format!("Cannot tell frame format from '{}'", path.display()))?;
    let file = File::open(path)
        .with_context(|| format!("Failed to open frame file '{}'", path.display()))?;
    let reader = BufReader::new(file);
    let frames = match format {
        OutputFormat::Json => serde_json::from_reader(reader).context("Failed to parse JSON frames")?,
        OutputFormat::Bincode => read_frames_bincode(reader)?,
        OutputFormat::MessagePack => {
            rmp_serde::decode::from_read(reader).context("Failed to parse MessagePack frames")?
        }
    };
    Ok(frames)
}
