use gas_atoms_common::{AtomColor, AtomFrame, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque atom identity, unique within one engine for its whole lifetime.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AtomId(pub(crate) u64);

impl AtomId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AtomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "atom#{}", self.0)
    }
}

/// A circular particle. Only the engine mutates atoms; the radius never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    id: AtomId,
    pub(crate) position: Vec2,
    /// Arena units per tick, before the speed multiplier.
    pub(crate) velocity: Vec2,
    radius: f32,
    pub(crate) color: AtomColor,
}

impl Atom {
    pub(crate) fn new(id: AtomId, position: Vec2, velocity: Vec2, radius: f32) -> Self {
        Atom {
            id,
            position,
            velocity,
            radius,
            color: AtomColor::White,
        }
    }

    pub fn id(&self) -> AtomId {
        self.id
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn color(&self) -> AtomColor {
        self.color
    }

    pub fn to_frame(&self) -> AtomFrame {
        AtomFrame {
            id: self.id.0,
            x: self.position.x,
            y: self.position.y,
            radius: self.radius,
            color: self.color,
        }
    }
}

/// Explicit starting point for one atom, used by `Engine::reset_with_atoms`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomSeed {
    pub position: Vec2,
    pub velocity: Vec2,
}

impl AtomSeed {
    pub fn new(position: impl Into<Vec2>, velocity: impl Into<Vec2>) -> Self {
        AtomSeed {
            position: position.into(),
            velocity: velocity.into(),
        }
    }
}
