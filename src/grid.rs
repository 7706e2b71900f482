//! The occupancy grid: one category per cell, last write wins.
//!
//! The grid is the only thing sensing reads. It is a visibility layer, not a
//! record of who is where: when two agents share a cell, only whichever drew
//! itself most recently is visible. Agent identity lives in the population.
use serde::Serialize;
use strum::{Display, EnumIter};

use crate::error::OutbreakError;
use crate::facing::Facing;

/// What a cell shows.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    Empty,
    Wall,
    Human,
    HumanPanic,
    Zombie,
}

/// An sRGB color.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Category {
    /// The palette renderers use. Every category maps to a distinct color.
    #[must_use]
    pub fn color(self) -> Rgb {
        match self {
            Category::Empty => Rgb(0, 0, 0),
            Category::Wall => Rgb(90, 90, 90),
            Category::Human => Rgb(213, 175, 213),
            Category::HumanPanic => Rgb(196, 43, 196),
            Category::Zombie => Rgb(30, 170, 30),
        }
    }

    #[must_use]
    pub fn is_human(self) -> bool {
        matches!(self, Category::Human | Category::HumanPanic)
    }
}

/// A cell coordinate. Signed so that rays can step past the border before
/// being bounds-checked.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[must_use]
    pub fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// The neighbouring cell in `facing`.
    #[must_use]
    pub fn step(self, facing: Facing) -> Position {
        let (dx, dy) = facing.offset();
        Position {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[derive(Clone, Debug)]
pub struct OccupancyGrid {
    width: usize,
    height: usize,
    cells: Vec<Category>,
}

impl OccupancyGrid {
    /// Creates a `width` x `height` grid with every cell set to `fill`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDimension` if either side is shorter than 2.
    pub fn new(width: usize, height: usize, fill: Category) -> Result<Self, OutbreakError> {
        let too_large = i32::try_from(width).is_err() || i32::try_from(height).is_err();
        if width < 2 || height < 2 || too_large {
            return Err(OutbreakError::InvalidDimension { width, height });
        }
        Ok(OccupancyGrid {
            width,
            height,
            cells: vec![fill; width * height],
        })
    }

    /// Creates a grid whose outer ring is `Wall` and whose interior is `Empty`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDimension` if either side is shorter than 2.
    pub fn walled(width: usize, height: usize) -> Result<Self, OutbreakError> {
        let mut grid = OccupancyGrid::new(width, height, Category::Wall)?;
        grid.fill_rect(1, 1, width as i32 - 2, height as i32 - 2, Category::Empty);
        Ok(grid)
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn in_bounds(&self, position: Position) -> bool {
        self.index(position).is_some()
    }

    /// True when `position` lies inside the border ring.
    #[must_use]
    pub fn in_interior(&self, position: Position) -> bool {
        position.x >= 1
            && position.y >= 1
            && position.x <= self.width as i32 - 2
            && position.y <= self.height as i32 - 2
    }

    fn index(&self, position: Position) -> Option<usize> {
        let x = usize::try_from(position.x).ok()?;
        let y = usize::try_from(position.y).ok()?;
        (x < self.width && y < self.height).then_some(y * self.width + x)
    }

    /// Reads the category at `position`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if `position` is outside the grid.
    pub fn get(&self, position: Position) -> Result<Category, OutbreakError> {
        self.index(position)
            .map(|index| self.cells[index])
            .ok_or(OutbreakError::OutOfBounds {
                x: position.x,
                y: position.y,
            })
    }

    /// Overwrites the category at `position`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if `position` is outside the grid.
    pub fn set(&mut self, position: Position, category: Category) -> Result<(), OutbreakError> {
        let index = self.index(position).ok_or(OutbreakError::OutOfBounds {
            x: position.x,
            y: position.y,
        })?;
        self.cells[index] = category;
        Ok(())
    }

    /// Sets every in-bounds cell of the `width` x `height` rectangle whose
    /// top-left corner is `(x, y)`. Cells outside the grid are ignored.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, category: Category) {
        for cy in y..y + height {
            for cx in x..x + width {
                if let Some(index) = self.index(Position::new(cx, cy)) {
                    self.cells[index] = category;
                }
            }
        }
    }

    /// Counts cells showing `category`.
    #[must_use]
    pub fn count(&self, category: Category) -> usize {
        self.cells.iter().filter(|cell| **cell == category).count()
    }

    /// Iterates over the rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Category]> {
        self.cells.chunks(self.width)
    }
}
