//! Tick-driven 2D atom simulation: wall bounces, pairwise velocity-swap
//! collisions and a five-state tap cycle that recolors and retargets atoms.

pub mod atom;
pub mod engine;
pub mod error;
pub mod grid;

pub use atom::{Atom, AtomId, AtomSeed};
pub use engine::{Engine, InteractionOutcome};
pub use error::{EngineError, Result};
pub use gas_atoms_common::{
    AtomColor, BroadPhase, EngineParams, Frame, InteractionState, Vec2, DEFAULT_ATOM_RADIUS,
};
