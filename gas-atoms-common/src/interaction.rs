use crate::color::AtomColor;
use serde::{Deserialize, Serialize};
use std::fmt;

const FULL_PALETTE: &[AtomColor] = &[
    AtomColor::Red,
    AtomColor::Green,
    AtomColor::Blue,
    AtomColor::Yellow,
];
const WHITE_PALETTE: &[AtomColor] = &[AtomColor::White];

/// Phase of the tap cycle. Each tap applies the profile of the current phase and
/// then moves to its successor.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionState {
    #[default]
    Initial,
    Touch1,
    Touch2,
    Touch3,
    Touch4,
}

/// What a tap does while the engine is in a given state.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct InteractionProfile {
    /// Colors drawn from, uniformly and independently per atom.
    pub palette: &'static [AtomColor],
    /// Speed multiplier stored by the engine and used as the new speed of every atom.
    pub speed_multiplier: f32,
}

impl InteractionState {
    /// Cyclic successor: Initial -> Touch1 -> ... -> Touch4 -> Initial.
    pub fn successor(self) -> Self {
        match self {
            InteractionState::Initial => InteractionState::Touch1,
            InteractionState::Touch1 => InteractionState::Touch2,
            InteractionState::Touch2 => InteractionState::Touch3,
            InteractionState::Touch3 => InteractionState::Touch4,
            InteractionState::Touch4 => InteractionState::Initial,
        }
    }

    pub fn profile(self) -> InteractionProfile {
        let (palette, speed_multiplier) = match self {
            InteractionState::Initial => (FULL_PALETTE, 2.0),
            InteractionState::Touch1 => (FULL_PALETTE, 3.5),
            InteractionState::Touch2 => (FULL_PALETTE, 2.0),
            InteractionState::Touch3 => (FULL_PALETTE, 4.5),
            InteractionState::Touch4 => (WHITE_PALETTE, 2.0),
        };
        InteractionProfile { palette, speed_multiplier }
    }
}

impl fmt::Display for InteractionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InteractionState::Initial => "initial",
            InteractionState::Touch1 => "touch1",
            InteractionState::Touch2 => "touch2",
            InteractionState::Touch3 => "touch3",
            InteractionState::Touch4 => "touch4",
        };
        f.write_str(name)
    }
}
