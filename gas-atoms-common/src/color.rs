use serde::{Deserialize, Serialize};
use std::fmt;

/// Palette tag carried by every atom. Renderers decide the exact shade.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AtomColor {
    #[default]
    White,
    Red,
    Green,
    Blue,
    Yellow,
}

impl AtomColor {
    /// Lowercase name, identical to the serialized form.
    pub fn name(self) -> &'static str {
        match self {
            AtomColor::White => "white",
            AtomColor::Red => "red",
            AtomColor::Green => "green",
            AtomColor::Blue => "blue",
            AtomColor::Yellow => "yellow",
        }
    }

    /// 8-bit sRGB components.
    pub fn rgb(self) -> [u8; 3] {
        match self {
            AtomColor::White => [255, 255, 255],
            AtomColor::Red => [255, 0, 0],
            AtomColor::Green => [0, 255, 0],
            AtomColor::Blue => [0, 0, 255],
            AtomColor::Yellow => [255, 255, 0],
        }
    }
}

impl fmt::Display for AtomColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
