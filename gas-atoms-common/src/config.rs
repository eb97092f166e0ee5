use crate::sim_params::{BroadPhase, EngineParams, DEFAULT_ATOM_RADIUS};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// Arena the atoms live in, in the same units the renderer uses (points/pixels)
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ArenaConfig {
    pub width: f32,
    pub height: f32,
}

// Initial population
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct AtomsConfig {
    pub count: usize,
    #[serde(default = "default_radius")]
    pub radius: f32,
    /// Seed for the engine RNG (placement, initial velocities, tap colors).
    pub seed: u64,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BroadPhaseKind {
    #[default]
    BruteForce,
    UniformGrid,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct CollisionConfig {
    #[serde(default)]
    pub broad_phase: BroadPhaseKind,
    /// Grid cell edge length; defaults to one atom diameter.
    #[serde(default)]
    pub grid_cell_size: Option<f32>,
}

/// A tap forwarded to the engine right before the given tick is advanced.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct TapEvent {
    pub tick: u64,
    pub x: f32,
    pub y: f32,
}

// How the driver paces and scripts the run
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct DriverConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    pub total_ticks: u64,
    #[serde(default = "default_record_interval_ticks")]
    pub record_interval_ticks: u64,
    /// Sleep `tick_interval_ms` between ticks instead of running flat out.
    #[serde(default)]
    pub realtime: bool,
    #[serde(default)]
    pub taps: Vec<TapEvent>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Bincode,
    MessagePack,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Bincode => "bin",
            OutputFormat::MessagePack => "msgpack",
        }
    }

    /// Inverse of [`OutputFormat::extension`].
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "bin" | "bincode" => Some(OutputFormat::Bincode),
            "msgpack" | "mp" => Some(OutputFormat::MessagePack),
            _ => None,
        }
    }
}

// Configuration for output settings
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default = "default_true")]
    pub save_frames: bool,
    #[serde(default = "default_true")]
    pub save_final_positions: bool,
}

fn default_radius() -> f32 {
    DEFAULT_ATOM_RADIUS
}

fn default_tick_interval_ms() -> u64 {
    100 // 10 Hz
}

fn default_record_interval_ticks() -> u64 {
    1
}

fn default_true() -> bool {
    true
}

// Main configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub arena: ArenaConfig,
    pub atoms: AtomsConfig,
    #[serde(default)]
    pub collision: CollisionConfig,
    pub driver: DriverConfig,
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read config file '{}'", path_ref.display()))?;
        Self::from_toml_str(&config_str)
            .with_context(|| format!("Invalid configuration in '{}'", path_ref.display()))
    }

    /// Parses and validates a configuration held in memory.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig =
            toml::from_str(config_str).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let radius = self.atoms.radius;
        if !(radius.is_finite() && radius > 0.0) {
            anyhow::bail!("atoms.radius must be positive, got {}.", radius);
        }
        let (width, height) = (self.arena.width, self.arena.height);
        if !(width.is_finite() && height.is_finite()) {
            anyhow::bail!("arena dimensions must be finite.");
        }
        if width < 2.0 * radius || height < 2.0 * radius {
            anyhow::bail!(
                "arena {}x{} cannot hold an atom of radius {}.",
                width,
                height,
                radius
            );
        }
        if let Some(cell) = self.collision.grid_cell_size {
            if !(cell.is_finite() && cell >= 2.0 * radius) {
                anyhow::bail!(
                    "collision.grid_cell_size must be at least one atom diameter ({}), got {}.",
                    2.0 * radius,
                    cell
                );
            }
        }
        if self.driver.record_interval_ticks == 0 {
            anyhow::bail!("driver.record_interval_ticks must be greater than 0.");
        }
        for tap in &self.driver.taps {
            if tap.tick >= self.driver.total_ticks {
                anyhow::bail!(
                    "tap at tick {} is outside the run of {} ticks.",
                    tap.tick,
                    self.driver.total_ticks
                );
            }
            if !(tap.x.is_finite() && tap.y.is_finite()) {
                anyhow::bail!("tap at tick {} has a non-finite position.", tap.tick);
            }
        }
        Ok(())
    }

    /// Converts the configuration into the parameters the engine runs with.
    pub fn get_engine_params(&self) -> EngineParams {
        let broad_phase = match self.collision.broad_phase {
            BroadPhaseKind::BruteForce => BroadPhase::BruteForce,
            BroadPhaseKind::UniformGrid => BroadPhase::UniformGrid {
                cell_size: self
                    .collision
                    .grid_cell_size
                    .unwrap_or(2.0 * self.atoms.radius),
            },
        };
        EngineParams {
            atom_radius: self.atoms.radius,
            broad_phase,
        }
    }

    /// Taps scheduled for `tick`, in file order.
    pub fn taps_at(&self, tick: u64) -> impl Iterator<Item = &TapEvent> {
        self.driver.taps.iter().filter(move |tap| tap.tick == tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [arena]
        width = 400.0
        height = 800.0

        [atoms]
        count = 50
        seed = 7

        [driver]
        total_ticks = 100

        [output]
        base_filename = "run"
    "#;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = SimulationConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.atoms.radius, 10.0);
        assert_eq!(config.driver.tick_interval_ms, 100);
        assert_eq!(config.driver.record_interval_ticks, 1);
        assert!(!config.driver.realtime);
        assert!(config.driver.taps.is_empty());
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.save_frames);
        let params = config.get_engine_params();
        assert_eq!(params.atom_radius, 10.0);
        assert_eq!(params.broad_phase, BroadPhase::BruteForce);
    }

    #[test]
    fn grid_cell_defaults_to_diameter() {
        let text = format!("{MINIMAL}\n[collision]\nbroad_phase = \"uniform_grid\"\n");
        let config = SimulationConfig::from_toml_str(&text).unwrap();
        assert_eq!(
            config.get_engine_params().broad_phase,
            BroadPhase::UniformGrid { cell_size: 20.0 }
        );
    }

    #[test]
    fn taps_are_parsed_and_filtered_by_tick() {
        let text = format!(
            "{MINIMAL}\n[[driver.taps]]\ntick = 5\nx = 10.0\ny = 20.0\n\
             [[driver.taps]]\ntick = 9\nx = 1.0\ny = 2.0\n\
             [[driver.taps]]\ntick = 5\nx = 3.0\ny = 4.0\n"
        );
        let config = SimulationConfig::from_toml_str(&text).unwrap();
        let at_five: Vec<_> = config.taps_at(5).map(|t| (t.x, t.y)).collect();
        assert_eq!(at_five, vec![(10.0, 20.0), (3.0, 4.0)]);
        assert_eq!(config.taps_at(6).count(), 0);
    }

    #[test]
    fn rejects_negative_arena() {
        let text = MINIMAL.replace("width = 400.0", "width = -400.0");
        let err = SimulationConfig::from_toml_str(&text).unwrap_err();
        assert!(err.to_string().contains("cannot hold an atom"));
    }

    #[test]
    fn rejects_negative_count() {
        let text = MINIMAL.replace("count = 50", "count = -3");
        assert!(SimulationConfig::from_toml_str(&text).is_err());
    }

    #[test]
    fn rejects_tap_after_last_tick() {
        let text = format!("{MINIMAL}\n[[driver.taps]]\ntick = 100\nx = 1.0\ny = 1.0\n");
        let err = SimulationConfig::from_toml_str(&text).unwrap_err();
        assert!(err.to_string().contains("outside the run"));
    }

    #[test]
    fn output_format_extension_round_trip() {
        for format in [OutputFormat::Json, OutputFormat::Bincode, OutputFormat::MessagePack] {
            assert_eq!(OutputFormat::from_extension(format.extension()), Some(format));
        }
        assert_eq!(OutputFormat::from_extension("png"), None);
    }
}
