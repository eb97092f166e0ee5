use serde::{Deserialize, Serialize};

/// Default atom radius in arena units.
pub const DEFAULT_ATOM_RADIUS: f32 = 10.0;

/// How candidate pairs are gathered before the narrow-phase overlap test.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum BroadPhase {
    /// Every unordered pair (i, j), i < j.
    #[default]
    BruteForce,
    /// Uniform grid with square cells; pairs come from the same or adjacent cells.
    UniformGrid { cell_size: f32 },
}

/// Engine parameters derived from the configuration; fixed for the engine's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineParams {
    /// Radius given to every atom created by `reset`.
    pub atom_radius: f32,
    pub broad_phase: BroadPhase,
}

impl Default for EngineParams {
    fn default() -> Self {
        EngineParams {
            atom_radius: DEFAULT_ATOM_RADIUS,
            broad_phase: BroadPhase::BruteForce,
        }
    }
}
