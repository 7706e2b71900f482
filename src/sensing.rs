//! Directional ray queries over the occupancy grid.
use crate::facing::Facing;
use crate::grid::{Category, OccupancyGrid, Position};

/// How far a near look reaches.
pub const NEAR_DISTANCE: u32 = 1;
/// How far a far look reaches.
pub const FAR_DISTANCE: u32 = 10;

/// The result of a look: the first thing seen along the ray.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Nothing,
    Wall,
    Human,
    HumanPanic,
    Zombie,
}

impl Target {
    #[must_use]
    pub fn is_human(self) -> bool {
        matches!(self, Target::Human | Target::HumanPanic)
    }
}

/// Walks up to `distance` cells from `from` in `facing` and reports the first
/// non-empty cell. Leaving the grid reports `Wall` immediately.
#[must_use]
pub fn look(grid: &OccupancyGrid, from: Position, facing: Facing, distance: u32) -> Target {
    let mut cell = from;
    for _ in 0..distance {
        cell = cell.step(facing);
        let Ok(category) = grid.get(cell) else {
            return Target::Wall;
        };
        match category {
            Category::Empty => {}
            Category::Wall => return Target::Wall,
            Category::Human => return Target::Human,
            Category::HumanPanic => return Target::HumanPanic,
            Category::Zombie => return Target::Zombie,
        }
    }
    Target::Nothing
}

/// Looks at the adjacent cell in `facing`.
#[must_use]
pub fn near_look(grid: &OccupancyGrid, from: Position, facing: Facing) -> Target {
    look(grid, from, facing, NEAR_DISTANCE)
}

/// Looks up to `FAR_DISTANCE` cells ahead in `facing`.
#[must_use]
pub fn far_look(grid: &OccupancyGrid, from: Position, facing: Facing) -> Target {
    look(grid, from, facing, FAR_DISTANCE)
}
