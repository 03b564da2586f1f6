//! Row/column addressable grid storage.
//!
//! `Grid<T>` stores one value per cell and maps between three ways of
//! naming a cell: a flat index, a `CellPos` (row, col), and a world-space
//! position. Indexing is row-major: `index = row * cols + col`.
//!
//! World positions name cell centres: cell (r, c) spans
//! `[origin.x + c * cell_size, origin.x + (c + 1) * cell_size)` on X and the
//! same on Y with `r`.

use super::direction::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A (row, col) grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPos {
    pub row: usize,
    pub col: usize,
}

impl CellPos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A position in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
}

impl WorldPos {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Error type for grid construction.
#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    /// Rows or columns is zero
    EmptyDimensions { rows: usize, cols: usize },
    /// Cell size is zero, negative or not finite
    InvalidCellSize(f32),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::EmptyDimensions { rows, cols } => {
                write!(f, "grid dimensions must be positive, got {}x{}", rows, cols)
            }
            GridError::InvalidCellSize(size) => {
                write!(f, "cell size must be positive, got {}", size)
            }
        }
    }
}

impl std::error::Error for GridError {}

/// Dense 2D storage with position mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cell_size: f32,
    origin: WorldPos,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Create a grid with every cell set to `fill`.
    pub fn new(
        rows: usize,
        cols: usize,
        cell_size: f32,
        origin: WorldPos,
        fill: T,
    ) -> Result<Self, GridError> {
        Self::from_fn(rows, cols, cell_size, origin, |_| fill.clone())
    }
}

impl<T> Grid<T> {
    /// Create a grid whose cells are produced by `f`, in index order.
    pub fn from_fn(
        rows: usize,
        cols: usize,
        cell_size: f32,
        origin: WorldPos,
        mut f: impl FnMut(CellPos) -> T,
    ) -> Result<Self, GridError> {
        if rows == 0 || cols == 0 {
            return Err(GridError::EmptyDimensions { rows, cols });
        }
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(GridError::InvalidCellSize(cell_size));
        }

        let mut cells = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(f(CellPos::new(row, col)));
            }
        }

        Ok(Self {
            rows,
            cols,
            cell_size,
            origin,
            cells,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn origin(&self) -> WorldPos {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn in_bounds(&self, pos: CellPos) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    /// Flat index of `pos`, or `None` if it lies outside the grid.
    #[inline]
    pub fn index(&self, pos: CellPos) -> Option<usize> {
        if self.in_bounds(pos) {
            Some(pos.row * self.cols + pos.col)
        } else {
            None
        }
    }

    /// Inverse of `index`. Assumes `index < len()`.
    #[inline]
    pub fn position(&self, index: usize) -> CellPos {
        CellPos::new(index / self.cols, index % self.cols)
    }

    /// World-space centre of a cell.
    pub fn world_position(&self, pos: CellPos) -> WorldPos {
        WorldPos::new(
            self.origin.x + (pos.col as f32 + 0.5) * self.cell_size,
            self.origin.y + (pos.row as f32 + 0.5) * self.cell_size,
        )
    }

    /// The cell containing a world-space point.
    pub fn cell_at_world(&self, world: WorldPos) -> Option<CellPos> {
        let col = ((world.x - self.origin.x) / self.cell_size).floor();
        let row = ((world.y - self.origin.y) / self.cell_size).floor();
        if col < 0.0 || row < 0.0 || !col.is_finite() || !row.is_finite() {
            return None;
        }
        let pos = CellPos::new(row as usize, col as usize);
        self.in_bounds(pos).then_some(pos)
    }

    /// The neighbor of `pos` in `direction`, if it lies inside the grid.
    pub fn neighbor(&self, pos: CellPos, direction: Direction) -> Option<CellPos> {
        let (dr, dc) = direction.offset();
        let row = pos.row as i64 + dr;
        let col = pos.col as i64 + dc;
        if row < 0 || col < 0 {
            return None;
        }
        let next = CellPos::new(row as usize, col as usize);
        self.in_bounds(next).then_some(next)
    }

    pub fn get_index(&self, index: usize) -> Option<&T> {
        self.cells.get(index)
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut T> {
        self.cells.get_mut(index)
    }

    pub fn get(&self, pos: CellPos) -> Option<&T> {
        self.index(pos).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, pos: CellPos) -> Option<&mut T> {
        self.index(pos).map(move |i| &mut self.cells[i])
    }

    pub fn get_world(&self, world: WorldPos) -> Option<&T> {
        self.cell_at_world(world).and_then(|pos| self.get(pos))
    }

    /// Store `value` at `pos`. Returns false (and drops `value`) when
    /// `pos` lies outside the grid.
    pub fn set(&mut self, pos: CellPos, value: T) -> bool {
        match self.get_mut(pos) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    pub fn set_world(&mut self, world: WorldPos, value: T) -> bool {
        match self.cell_at_world(world) {
            Some(pos) => self.set(pos, value),
            None => false,
        }
    }

    /// Cells in index order, paired with their position.
    pub fn iter(&self) -> impl Iterator<Item = (CellPos, &T)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, v)| (self.position(i), v))
    }

    pub fn values(&self) -> &[T] {
        &self.cells
    }

    /// Build a grid of the same shape by mapping every cell.
    pub fn map<U>(&self, mut f: impl FnMut(CellPos, &T) -> U) -> Grid<U> {
        Grid {
            rows: self.rows,
            cols: self.cols,
            cell_size: self.cell_size,
            origin: self.origin,
            cells: self
                .cells
                .iter()
                .enumerate()
                .map(|(i, v)| f(self.position(i), v))
                .collect(),
        }
    }

    /// Like `map`, but gives up with `None` as soon as `f` does.
    pub fn try_map<U>(&self, mut f: impl FnMut(CellPos, &T) -> Option<U>) -> Option<Grid<U>> {
        let cells = self
            .cells
            .iter()
            .enumerate()
            .map(|(i, v)| f(self.position(i), v))
            .collect::<Option<Vec<U>>>()?;
        Some(Grid {
            rows: self.rows,
            cols: self.cols,
            cell_size: self.cell_size,
            origin: self.origin,
            cells,
        })
    }
}
