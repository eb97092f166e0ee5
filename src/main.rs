use anyhow::{Context, Result};
use gas_atoms::{Atom, Engine, Vec2};
use gas_atoms_common::{save_frames, Frame, SimulationConfig};
use log::{debug, error, info, trace};
use std::thread;
use std::time::{Duration, Instant};

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting gas-atoms driver...");

    // --- Load Configuration ---
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = SimulationConfig::load(&config_path)?;
    debug!("Configuration: {:#?}", config);

    // --- Initialize Engine ---
    let params = config.get_engine_params();
    let mut engine = Engine::seeded(config.atoms.seed, params)
        .context("Failed to create engine")?;
    engine
        .reset(config.arena.width, config.arena.height, config.atoms.count)
        .context("Failed to seed atoms")?;
    info!("Engine initialized with {} atoms.", engine.atoms().len());

    // --- Simulation Loop ---
    let total_ticks = config.driver.total_ticks;
    let record_interval = config.driver.record_interval_ticks;
    let tick_interval = Duration::from_millis(config.driver.tick_interval_ms);
    let mut frames: Vec<Frame> = Vec::new();

    if config.output.save_frames {
        frames.push(engine.frame());
    }

    info!(
        "Running {} ticks ({} ms cadence, realtime: {}).",
        total_ticks, config.driver.tick_interval_ms, config.driver.realtime
    );
    let start_time = Instant::now();
    let mut previous_print_time = start_time;

    for tick in 0..total_ticks {
        let tick_start = Instant::now();

        for tap in config.taps_at(tick) {
            let outcome = engine.apply_interaction(Vec2::new(tap.x, tap.y));
            info!(
                "Tick {}: tap at ({:.1}, {:.1}) moved state {} -> {} (speed x{}).",
                tick, tap.x, tap.y, outcome.previous, outcome.state, outcome.speed_multiplier
            );
            if outcome.degenerate > 0 {
                debug!("{} atoms sat on the tap point.", outcome.degenerate);
            }
            if outcome.invalid_point {
                debug!("Tap point was not finite; no atom was retargeted.");
            }
        }

        engine.advance();

        let is_last_tick = tick + 1 == total_ticks;
        if config.output.save_frames && ((tick + 1) % record_interval == 0 || is_last_tick) {
            frames.push(engine.frame());
        }

        // Print status periodically
        let now = Instant::now();
        if now.duration_since(previous_print_time).as_secs_f64() >= 5.0 || is_last_tick {
            info!(
                "Tick [{}/{}] | State: {} | Speed: x{} | Frames: {} | Elapsed: {:.2} s",
                tick + 1,
                total_ticks,
                engine.state(),
                engine.speed_multiplier(),
                frames.len(),
                start_time.elapsed().as_secs_f64()
            );
            previous_print_time = now;
        } else {
            trace!("Tick [{}/{}] took {:?}", tick + 1, total_ticks, tick_start.elapsed());
        }

        if config.driver.realtime {
            if let Some(remaining) = tick_interval.checked_sub(tick_start.elapsed()) {
                thread::sleep(remaining);
            }
        }
    }

    info!(
        "Simulation finished in {:.3} seconds.",
        start_time.elapsed().as_secs_f64()
    );

    // --- Save Recorded Data ---
    if config.output.save_frames {
        let format = config.output.format;
        let filename = format!("{}_frames.{}", config.output.base_filename, format.extension());
        match save_frames(&filename, format, &frames) {
            Ok(()) => info!("{} frames saved to {} ({:?}).", frames.len(), filename, format),
            Err(e) => error!("Error saving frames to '{}': {:#}", filename, e),
        }
    } else {
        info!("Skipping saving frames as per config (save_frames is false).");
    }

    // Save final positions if requested (separate from frames)
    if config.output.save_final_positions {
        let filename = format!("{}_final_positions.csv", config.output.base_filename);
        match write_final_positions(&filename, engine.atoms()) {
            Ok(()) => info!("Final positions saved to {}", filename),
            Err(e) => error!("Error saving CSV file '{}': {:#}", filename, e),
        }
    } else {
        info!("Skipping saving final positions as per config.");
    }

    info!("Simulation Complete.");
    Ok(())
}

/// Writes one `id,x,y,color` row per atom.
fn write_final_positions(path: &str, atoms: &[Atom]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file {}", path))?;
    writer.write_record(["id", "x", "y", "color"])?;
    for atom in atoms {
        let position = atom.position();
        writer.write_record([
            atom.id().get().to_string(),
            format!("{:.4}", position.x),
            format!("{:.4}", position.y),
            atom.color().to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gas_atoms::{AtomSeed, EngineParams};

    #[test]
    fn final_positions_csv_has_header_and_one_row_per_atom() {
        let mut engine = Engine::seeded(3, EngineParams::default()).unwrap();
        let seeds = vec![
            AtomSeed::new((20.0, 30.0), (0.0, 0.0)),
            AtomSeed::new((150.0, 80.0), (1.0, 0.0)),
        ];
        engine.reset_with_atoms(200.0, 100.0, seeds).unwrap();

        let path = std::env::temp_dir().join("gas_atoms_final_positions_test.csv");
        let path = path.to_str().unwrap();
        write_final_positions(path, engine.atoms()).unwrap();

        let mut reader = csv::Reader::from_path(path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, ["id", "x", "y", "color"]);
        let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "20.0000");
        assert_eq!(&rows[1][3], "white");
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn final_positions_report_unwritable_path() {
        let dir = std::env::temp_dir().join("gas_atoms_missing_dir_for_csv_test");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("positions.csv");
        let err = write_final_positions(path.to_str().unwrap(), &[]).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to create CSV file"));
    }
}
