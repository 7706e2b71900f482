//! The four directions an agent can face. Facings are a 0-based rotation
//! (North, East, South, West in clockwise order) so that turning and reversing
//! are plain arithmetic modulo 4.
use serde::Serialize;
use strum::{Display, EnumIter};

use crate::random::RandomSource;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
#[strum(serialize_all = "snake_case")]
pub enum Facing {
    North,
    East,
    South,
    West,
}

impl Facing {
    const ALL: [Facing; 4] = [Facing::North, Facing::East, Facing::South, Facing::West];

    /// Picks one of the four facings uniformly.
    pub fn random(random: &mut (impl RandomSource + ?Sized)) -> Facing {
        Facing::from_index(random.below(4))
    }

    /// The facing `index` quarter turns clockwise from North.
    #[must_use]
    pub fn from_index(index: u32) -> Facing {
        Facing::ALL[(index % 4) as usize]
    }

    #[must_use]
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Rotates clockwise by `quarter_turns`.
    #[must_use]
    pub fn rotate(self, quarter_turns: u32) -> Facing {
        Facing::from_index(self.index() + quarter_turns % 4)
    }

    /// The facing two quarter turns away. Applying it twice is the identity.
    #[must_use]
    pub fn opposite(self) -> Facing {
        self.rotate(2)
    }

    /// The `(dx, dy)` step for one cell in this direction; `y` grows southward.
    #[must_use]
    pub fn offset(self) -> (i32, i32) {
        match self {
            Facing::North => (0, -1),
            Facing::East => (1, 0),
            Facing::South => (0, 1),
            Facing::West => (-1, 0),
        }
    }

    /// The 1-based numbering (North = 1 .. West = 4) used by external
    /// consumers such as keyboard-driven renderers.
    #[must_use]
    pub fn to_one_based(self) -> u8 {
        self as u8 + 1
    }

    #[must_use]
    pub fn from_one_based(value: u8) -> Option<Facing> {
        match value {
            1..=4 => Some(Facing::from_index(u32::from(value - 1))),
            _ => None,
        }
    }
}
