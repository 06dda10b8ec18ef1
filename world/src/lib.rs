#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative terrain state for the Delve sandbox.
//!
//! The [`World`] stores a horizontally periodic grid of [`Cell`]s whose rows
//! grow lazily upward. Every coordinate is wrapped on the x axis before the
//! grid is touched, everything below the floor reads as bedrock, and anything
//! above the allocated rows reads as open air.

mod generation;
mod physics;

use std::num::NonZeroU32;

use delve_core::{BgCell, Cell, Position};

pub use generation::{SettingsError, WorldSettings};
pub use physics::SimulatedStep;

/// Terrain grid shared by every creature in a match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct World {
    width: u32,
    ground_height: i64,
    cells: Vec<Cell>,
    background: Vec<BgCell>,
}

impl World {
    /// Creates a world of open air with no allocated rows.
    #[must_use]
    pub fn empty(width: NonZeroU32) -> Self {
        Self {
            width: width.get(),
            ground_height: 0,
            cells: Vec::new(),
            background: Vec::new(),
        }
    }

    /// Creates a world from explicit rows, listed bottom-up starting at `y = 0`.
    ///
    /// Rows shorter than the width are padded with [`Cell::Empty`]; longer rows
    /// are truncated.
    #[must_use]
    pub fn from_rows(width: NonZeroU32, rows: &[Vec<Cell>]) -> Self {
        let mut world = Self::empty(width);
        let row_len = world.row_len();
        world.cells.reserve(rows.len() * row_len);
        for row in rows {
            world
                .cells
                .extend((0..row_len).map(|x| row.get(x).copied().unwrap_or(Cell::Empty)));
        }
        world.ground_height = i64::try_from(rows.len()).unwrap_or(i64::MAX);
        world
    }

    /// Number of columns; the grid wraps around horizontally at this width.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Nominal height of the generated ground surface.
    #[must_use]
    pub const fn ground_height(&self) -> i64 {
        self.ground_height
    }

    /// Number of rows currently allocated.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.cells.len() / self.row_len()
    }

    /// Wraps `x` into `0..width`.
    #[must_use]
    pub fn normalize_x(&self, x: i64) -> i64 {
        x.rem_euclid(i64::from(self.width))
    }

    /// Wraps the horizontal coordinate of `pos` into `0..width`.
    #[must_use]
    pub fn normalize(&self, pos: Position) -> Position {
        Position::new(self.normalize_x(pos.x()), pos.y())
    }

    /// Material at `(x, y)`.
    #[must_use]
    pub fn cell(&self, x: i64, y: i64) -> Cell {
        if y < 0 {
            return Cell::Bedrock;
        }
        self.index(x, y)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(Cell::Empty)
    }

    /// Material at `pos`.
    #[must_use]
    pub fn cell_at(&self, pos: Position) -> Cell {
        self.cell(pos.x(), pos.y())
    }

    /// Overwrites the material at `(x, y)`, allocating rows upward as needed.
    ///
    /// Writes below the floor are ignored.
    pub fn set_cell(&mut self, x: i64, y: i64, cell: Cell) {
        if y < 0 {
            return;
        }
        let Some(index) = self.index(x, y) else {
            return;
        };
        if index >= self.cells.len() {
            let row_len = self.row_len();
            let required = (index / row_len + 1) * row_len;
            self.cells.resize(required, Cell::Empty);
        }
        self.cells[index] = cell;
    }

    /// Overwrites the material at `pos`.
    pub fn set_cell_at(&mut self, pos: Position, cell: Cell) {
        self.set_cell(pos.x(), pos.y(), cell);
    }

    /// Render-only background material at `(x, y)`.
    #[must_use]
    pub fn bg_cell(&self, x: i64, y: i64) -> BgCell {
        if y < 0 {
            return BgCell::Bedrock;
        }
        self.index(x, y)
            .and_then(|index| self.background.get(index).copied())
            .unwrap_or(BgCell::Sky)
    }

    /// Reports whether the material at `(x, y)` is solid.
    #[must_use]
    pub fn is_solid(&self, x: i64, y: i64) -> bool {
        self.cell(x, y).is_solid()
    }

    /// Reports whether the material at `(x, y)` is a rock of any stage.
    #[must_use]
    pub fn is_rock(&self, x: i64, y: i64) -> bool {
        self.cell(x, y).is_rock()
    }

    /// Reports whether the material at `(x, y)` is a rock carrying momentum.
    #[must_use]
    pub fn is_falling_rock(&self, x: i64, y: i64) -> bool {
        self.cell(x, y).is_falling_rock()
    }

    /// Reports whether any orthogonal neighbour of `(x, y)` is open air.
    #[must_use]
    pub fn is_bordering_empty(&self, x: i64, y: i64) -> bool {
        [(x - 1, y), (x, y - 1), (x + 1, y), (x, y + 1)]
            .into_iter()
            .any(|(nx, ny)| self.cell(nx, ny) == Cell::Empty)
    }

    /// Highest solid `y` in column `x`, or `-1` when only the floor is solid.
    #[must_use]
    pub fn top_solid_y(&self, x: i64) -> i64 {
        let mut y = i64::try_from(self.rows()).unwrap_or(i64::MAX);
        while y >= 0 && !self.is_solid(x, y) {
            y -= 1;
        }
        y
    }

    /// Reports whether two columns are horizontal neighbours, wrapping around.
    #[must_use]
    pub fn is_x_adjacent(&self, x1: i64, x2: i64) -> bool {
        let (x1, x2) = (self.normalize_x(x1), self.normalize_x(x2));
        let last = i64::from(self.width) - 1;
        (x1 - x2).abs() == 1 || (x1 == 0 && x2 == last) || (x1 == last && x2 == 0)
    }

    /// Signed horizontal offset from `x1` to `x2` with the smallest magnitude.
    #[must_use]
    pub fn wrapping_x_offset(&self, x1: i64, x2: i64) -> i64 {
        let width = i64::from(self.width);
        let (x1, x2) = (self.normalize_x(x1), self.normalize_x(x2));
        let direct = x2 - x1;
        let forward = x2 + width - x1;
        let backward = x2 - (x1 + width);
        if forward.abs() < direct.abs() {
            forward
        } else if backward.abs() < direct.abs() {
            backward
        } else {
            direct
        }
    }

    /// Manhattan distance between two positions, wrapping horizontally.
    #[must_use]
    pub fn dist(&self, a: Position, b: Position) -> i64 {
        self.wrapping_x_offset(a.x(), b.x()).abs() + (a.y() - b.y()).abs()
    }

    fn row_len(&self) -> usize {
        usize::try_from(self.width).unwrap_or(usize::MAX)
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        let row = usize::try_from(y).ok()?;
        let column = usize::try_from(self.normalize_x(x)).ok()?;
        row.checked_mul(self.row_len())?.checked_add(column)
    }
}

/// Query functions that provide raw read-only access for presentation layers.
pub mod query {
    use delve_core::{BgCell, Cell};

    use super::World;

    /// Allocated terrain rows, bottom-up.
    pub fn rows(world: &World) -> impl Iterator<Item = &[Cell]> {
        world.cells.chunks(world.row_len())
    }

    /// Allocated background rows, bottom-up.
    pub fn background_rows(world: &World) -> impl Iterator<Item = &[BgCell]> {
        world.background.chunks(world.row_len())
    }
}
