use crate::constants::{GRID_HEIGHT, GRID_WIDTH, START_MARGIN};
use crate::rng::Rng;
use crate::types::Cell;

/// Fixed-size playfield. Cells are 0-indexed; anything outside
/// `[0, width) x [0, height)` is wall.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            width: GRID_WIDTH,
            height: GRID_HEIGHT,
        }
    }
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    pub fn cell_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    pub fn random_cell(&self, rng: &mut Rng) -> Cell {
        let x = rng.range_inclusive(0, self.width - 1);
        let y = rng.range_inclusive(0, self.height - 1);
        Cell::new(x, y)
    }

    /// A start cell that keeps a full margin to every wall. Grids too small
    /// for the margin collapse the range onto the centre line.
    pub fn random_start_cell(&self, rng: &mut Rng) -> Cell {
        let (min_x, max_x) = margin_range(self.width);
        let (min_y, max_y) = margin_range(self.height);
        let x = rng.range_inclusive(min_x, max_x);
        let y = rng.range_inclusive(min_y, max_y);
        Cell::new(x, y)
    }
}

fn margin_range(extent: i32) -> (i32, i32) {
    let min = START_MARGIN;
    let max = extent - START_MARGIN - 1;
    if max < min {
        let mid = extent / 2;
        return (mid, mid);
    }
    (min, max)
}
