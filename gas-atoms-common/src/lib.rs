pub mod color;
pub mod config;
pub mod interaction;
pub mod sim_params;
pub mod snapshot;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use color::AtomColor;
pub use config::{
    ArenaConfig, AtomsConfig, BroadPhaseKind, CollisionConfig, DriverConfig, OutputConfig,
    OutputFormat, SimulationConfig, TapEvent,
};
pub use interaction::{InteractionProfile, InteractionState};
pub use sim_params::{BroadPhase, EngineParams, DEFAULT_ATOM_RADIUS};
pub use snapshot::{load_frames, save_frames, AtomFrame, Frame};
pub use vecmath::{clamp, Vec2};
