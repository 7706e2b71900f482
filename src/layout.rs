//! World generation: a solid block of wall with streets and rooms carved
//! out of its interior.
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::OutbreakError;
use crate::grid::{Category, OccupancyGrid, Position};
use crate::random::RandomSource;

/// The longest side, in cells, a street or room may be drawn with.
pub const MAX_SHAPE_SIDE: u32 = 1024;

/// How many streets and rooms to carve and how large they are. A street is
/// the one-cell-wide outline of a rectangle; a room is a filled rectangle.
/// Width and height are drawn independently, each `*_min + below(*_span)`
/// cells.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldLayout {
    pub streets: usize,
    pub street_min: u32,
    pub street_span: u32,
    pub rooms: usize,
    pub room_min: u32,
    pub room_span: u32,
}

impl Default for WorldLayout {
    fn default() -> Self {
        WorldLayout {
            streets: 80,
            street_min: 15,
            street_span: 60,
            rooms: 12,
            room_min: 10,
            room_span: 10,
        }
    }
}

impl WorldLayout {
    /// A layout that carves nothing, leaving the world solid wall.
    #[must_use]
    pub fn solid() -> Self {
        WorldLayout {
            streets: 0,
            rooms: 0,
            ..WorldLayout::default()
        }
    }

    /// Checks that no shape can be larger than `MAX_SHAPE_SIDE`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` naming the oversized shape.
    pub fn validate(&self) -> Result<(), OutbreakError> {
        for (name, min, span) in [
            ("street", self.street_min, self.street_span),
            ("room", self.room_min, self.room_span),
        ] {
            match min.checked_add(span) {
                Some(largest) if largest <= MAX_SHAPE_SIDE => {}
                _ => {
                    return Err(format!(
                        "{name} sides of {min} + {span} exceed the limit of {MAX_SHAPE_SIDE}"
                    )
                    .into());
                }
            }
        }
        Ok(())
    }
}

/// Builds a `width` x `height` world from `layout`. The outer ring is always
/// wall; carving never reaches it. Sides beyond `MAX_SHAPE_SIDE` are cut
/// down to it.
///
/// Streets are drawn first, then rooms. Each shape draws its corner from
/// `random` (x, then y) followed by its width and then its height.
///
/// # Errors
///
/// Returns `InvalidDimension` if either side is shorter than 2.
pub fn generate_world(
    width: usize,
    height: usize,
    layout: &WorldLayout,
    random: &mut dyn RandomSource,
) -> Result<OccupancyGrid, OutbreakError> {
    let mut grid = OccupancyGrid::new(width, height, Category::Wall)?;
    let (width, height) = (axis(width), axis(height));

    for _ in 0..layout.streets {
        let x = random.below(width) as i32;
        let y = random.below(height) as i32;
        let w = sized(random, layout.street_min, layout.street_span);
        let h = sized(random, layout.street_min, layout.street_span);
        let (right, bottom) = (x.saturating_add(w), y.saturating_add(h));
        for cx in x..=right {
            carve(&mut grid, Position::new(cx, y));
            carve(&mut grid, Position::new(cx, bottom));
        }
        for cy in y..=bottom {
            carve(&mut grid, Position::new(x, cy));
            carve(&mut grid, Position::new(right, cy));
        }
    }

    for _ in 0..layout.rooms {
        let x = random.below(width) as i32;
        let y = random.below(height) as i32;
        let w = sized(random, layout.room_min, layout.room_span);
        let h = sized(random, layout.room_min, layout.room_span);
        for cy in y..y.saturating_add(h) {
            for cx in x..x.saturating_add(w) {
                carve(&mut grid, Position::new(cx, cy));
            }
        }
    }

    debug!(
        "generated {}x{} world with {} open cells",
        grid.width(),
        grid.height(),
        grid.count(Category::Empty)
    );
    Ok(grid)
}

fn axis(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

fn sized(random: &mut dyn RandomSource, min: u32, span: u32) -> i32 {
    let extra = if span == 0 { 0 } else { random.below(span) };
    // MAX_SHAPE_SIDE fits in i32
    min.saturating_add(extra).min(MAX_SHAPE_SIDE) as i32
}

fn carve(grid: &mut OccupancyGrid, position: Position) {
    if grid.in_interior(position) {
        // in_interior implies in bounds
        let _ = grid.set(position, Category::Empty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{ScriptedRandom, SeededRandom};

    fn border_is_wall(grid: &OccupancyGrid) -> bool {
        let (w, h) = (grid.width() as i32, grid.height() as i32);
        (0..w).all(|x| {
            grid.get(Position::new(x, 0)).unwrap() == Category::Wall
                && grid.get(Position::new(x, h - 1)).unwrap() == Category::Wall
        }) && (0..h).all(|y| {
            grid.get(Position::new(0, y)).unwrap() == Category::Wall
                && grid.get(Position::new(w - 1, y)).unwrap() == Category::Wall
        })
    }

    #[test]
    fn solid_layout_is_all_wall() {
        let mut random = SeededRandom::new(0);
        let grid = generate_world(12, 9, &WorldLayout::solid(), &mut random).unwrap();
        assert_eq!(grid.count(Category::Wall), 12 * 9);
    }

    #[test]
    fn street_is_a_rectangle_outline() {
        let layout = WorldLayout {
            streets: 1,
            street_min: 2,
            street_span: 10,
            ..WorldLayout::solid()
        };
        // corner (3, 4), width 2 + 5, height 2 + 1
        let mut random = ScriptedRandom::new([3, 4, 5, 1]);
        let grid = generate_world(20, 20, &layout, &mut random).unwrap();
        assert_eq!(grid.count(Category::Empty), 2 * 8 + 2 * 2);
        assert_eq!(grid.get(Position::new(10, 4)).unwrap(), Category::Empty);
        assert_eq!(grid.get(Position::new(10, 7)).unwrap(), Category::Empty);
        assert_eq!(grid.get(Position::new(11, 4)).unwrap(), Category::Wall);
        assert_eq!(grid.get(Position::new(3, 8)).unwrap(), Category::Wall);
        assert_eq!(grid.get(Position::new(5, 5)).unwrap(), Category::Wall);
    }

    #[test]
    fn street_with_fixed_size_is_a_square_outline() {
        let layout = WorldLayout {
            streets: 1,
            street_min: 4,
            street_span: 0,
            ..WorldLayout::solid()
        };
        let mut random = ScriptedRandom::new([2, 3]);
        let grid = generate_world(20, 20, &layout, &mut random).unwrap();
        assert_eq!(grid.count(Category::Empty), 16);
        assert_eq!(grid.get(Position::new(2, 3)).unwrap(), Category::Empty);
        assert_eq!(grid.get(Position::new(6, 7)).unwrap(), Category::Empty);
        assert_eq!(grid.get(Position::new(4, 5)).unwrap(), Category::Wall);
    }

    #[test]
    fn room_is_a_filled_square() {
        let layout = WorldLayout {
            rooms: 1,
            room_min: 3,
            room_span: 4,
            ..WorldLayout::solid()
        };
        // corner (5, 5), width and height 3 + 1
        let mut random = ScriptedRandom::new([5, 5, 1, 1]);
        let grid = generate_world(20, 20, &layout, &mut random).unwrap();
        assert_eq!(grid.count(Category::Empty), 16);
        assert_eq!(grid.get(Position::new(8, 8)).unwrap(), Category::Empty);
        assert_eq!(grid.get(Position::new(9, 9)).unwrap(), Category::Wall);
    }

    #[test]
    fn carving_is_clipped_to_the_interior() {
        let layout = WorldLayout {
            rooms: 1,
            room_min: 50,
            room_span: 0,
            ..WorldLayout::solid()
        };
        let mut random = ScriptedRandom::new([0, 0]);
        let grid = generate_world(10, 8, &layout, &mut random).unwrap();
        assert_eq!(grid.count(Category::Empty), 8 * 6);
        assert!(border_is_wall(&grid));
    }

    #[test]
    fn oversized_shapes_are_cut_down() {
        let layout = WorldLayout {
            streets: 1,
            street_min: 3_000_000_000,
            street_span: 0,
            rooms: 1,
            room_min: u32::MAX,
            room_span: 10,
        };
        let mut random = ScriptedRandom::new([5, 5, 0, 0, 5, 5, 5]);
        let grid = generate_world(20, 20, &layout, &mut random).unwrap();
        assert!(grid.count(Category::Empty) > 0);
        assert!(border_is_wall(&grid));
        assert!(layout.validate().is_err());
    }

    #[test]
    fn validate_bounds_shape_sides() {
        assert!(WorldLayout::default().validate().is_ok());
        let at_limit = WorldLayout {
            room_min: MAX_SHAPE_SIDE - 10,
            room_span: 10,
            ..WorldLayout::default()
        };
        assert!(at_limit.validate().is_ok());
        let over = WorldLayout {
            street_min: MAX_SHAPE_SIDE,
            street_span: 1,
            ..WorldLayout::default()
        };
        assert!(matches!(
            over.validate(),
            Err(OutbreakError::InvalidParameter(_))
        ));
        let wrapping = WorldLayout {
            room_min: u32::MAX,
            room_span: 10,
            ..WorldLayout::default()
        };
        assert!(wrapping.validate().is_err());
    }

    #[test]
    fn default_layout_keeps_border_and_opens_space() {
        let mut random = SeededRandom::new(17);
        let grid = generate_world(200, 150, &WorldLayout::default(), &mut random).unwrap();
        assert!(border_is_wall(&grid));
        assert!(grid.count(Category::Empty) > 0);
    }

    #[test]
    fn same_seed_same_world() {
        let layout = WorldLayout::default();
        let first = generate_world(80, 60, &layout, &mut SeededRandom::new(3)).unwrap();
        let second = generate_world(80, 60, &layout, &mut SeededRandom::new(3)).unwrap();
        assert!(first.rows().eq(second.rows()));
    }
}
