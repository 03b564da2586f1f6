//! Wave field: per-cell superposition state for one generation run.
//!
//! Every cell is either `Uncollapsed` with the set of tiles still possible
//! there, or `Collapsed` to exactly one tile. Possibility sets only shrink,
//! and a cell collapses at most once.
//!
//! Alongside each possibility set the field keeps the running sums needed
//! for Shannon entropy (sum of frequencies and sum of `f * log2 f`), so
//! `entropy_of` is O(1). Sums are rebuilt whenever a set shrinks.

use super::catalog::{TileCatalog, TileId};
use super::grid::{CellPos, Grid, GridError, WorldPos};
use super::tile_set::TileSet;
use std::fmt;

/// State of a single cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellState {
    /// Tiles still possible here
    Uncollapsed(TileSet),
    /// Final tile
    Collapsed(TileId),
}

impl CellState {
    pub fn is_collapsed(&self) -> bool {
        matches!(self, CellState::Collapsed(_))
    }

    pub fn tile(&self) -> Option<TileId> {
        match self {
            CellState::Collapsed(tile) => Some(*tile),
            CellState::Uncollapsed(_) => None,
        }
    }
}

/// Error for precondition violations on the wave field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaveError {
    /// Position lies outside the grid
    OutOfBounds(CellPos),
    /// Cell has already been collapsed
    AlreadyCollapsed(CellPos),
    /// Tile is not in the cell's possibility set
    TileNotPossible { pos: CellPos, tile: TileId },
    /// The run has already succeeded, failed or hit its step limit
    RunFinished,
}

impl fmt::Display for WaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaveError::OutOfBounds(pos) => write!(f, "position {} is outside the grid", pos),
            WaveError::AlreadyCollapsed(pos) => write!(f, "cell {} is already collapsed", pos),
            WaveError::TileNotPossible { pos, tile } => {
                write!(f, "tile {} is not possible at {}", tile, pos)
            }
            WaveError::RunFinished => write!(f, "the run has already finished"),
        }
    }
}

impl std::error::Error for WaveError {}

/// Running entropy sums for one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct EntropySums {
    weights: f64,
    weight_log_weights: f64,
}

/// Per-cell possibility state over a grid.
#[derive(Debug, Clone)]
pub struct WaveField {
    cells: Grid<CellState>,
    sums: Vec<EntropySums>,
    frequencies: Vec<f64>,
    weight_log_weights: Vec<f64>,
    uncollapsed: usize,
}

impl WaveField {
    /// Create a field with every cell able to hold every catalog tile.
    pub fn new(
        rows: usize,
        cols: usize,
        cell_size: f32,
        origin: WorldPos,
        catalog: &TileCatalog,
    ) -> Result<Self, GridError> {
        let all = catalog.all_tiles();
        let cells = Grid::new(
            rows,
            cols,
            cell_size,
            origin,
            CellState::Uncollapsed(all.clone()),
        )?;

        let frequencies: Vec<f64> = catalog.tiles().iter().map(|t| t.frequency).collect();
        let weight_log_weights: Vec<f64> = catalog
            .tiles()
            .iter()
            .map(|t| catalog.weight_log_weight(t.id))
            .collect();

        let start = EntropySums {
            weights: frequencies.iter().sum(),
            weight_log_weights: weight_log_weights.iter().sum(),
        };
        let len = cells.len();

        Ok(Self {
            cells,
            sums: vec![start; len],
            frequencies,
            weight_log_weights,
            uncollapsed: len,
        })
    }

    pub fn grid(&self) -> &Grid<CellState> {
        &self.cells
    }

    pub fn rows(&self) -> usize {
        self.cells.rows()
    }

    pub fn cols(&self) -> usize {
        self.cells.cols()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn state(&self, pos: CellPos) -> Option<&CellState> {
        self.cells.get(pos)
    }

    /// Possibility set of an uncollapsed cell.
    pub fn possible_tiles(&self, pos: CellPos) -> Option<&TileSet> {
        match self.cells.get(pos)? {
            CellState::Uncollapsed(set) => Some(set),
            CellState::Collapsed(_) => None,
        }
    }

    /// Shannon entropy of the frequency-weighted distribution over the
    /// cell's possibility set. `None` for collapsed or out-of-grid cells;
    /// an empty set reports 0.
    pub fn entropy_of(&self, pos: CellPos) -> Option<f64> {
        let index = self.cells.index(pos)?;
        match self.cells.get_index(index)? {
            CellState::Collapsed(_) => None,
            CellState::Uncollapsed(_) => Some(self.entropy_at(index)),
        }
    }

    pub(crate) fn entropy_at(&self, index: usize) -> f64 {
        let sums = self.sums[index];
        if sums.weights <= 0.0 {
            return 0.0;
        }
        // A singleton must read exactly zero, not rounding noise
        let entropy = sums.weights.log2() - sums.weight_log_weights / sums.weights;
        if entropy.abs() < 1e-12 {
            0.0
        } else {
            entropy
        }
    }

    /// Resolve an uncollapsed cell to `tile`.
    pub fn collapse(&mut self, pos: CellPos, tile: TileId) -> Result<(), WaveError> {
        let index = self.cells.index(pos).ok_or(WaveError::OutOfBounds(pos))?;
        match &self.cells.values()[index] {
            CellState::Collapsed(_) => return Err(WaveError::AlreadyCollapsed(pos)),
            CellState::Uncollapsed(set) if !set.contains(tile) => {
                return Err(WaveError::TileNotPossible { pos, tile });
            }
            CellState::Uncollapsed(_) => {}
        }

        if let Some(cell) = self.cells.get_index_mut(index) {
            *cell = CellState::Collapsed(tile);
        }
        self.sums[index] = EntropySums {
            weights: self.frequencies[tile.0],
            weight_log_weights: self.weight_log_weights[tile.0],
        };
        self.uncollapsed -= 1;
        Ok(())
    }

    /// Intersect an uncollapsed cell's possibilities with `allowed`.
    ///
    /// Returns true only if the set actually shrank. Collapsed and
    /// out-of-grid cells are left alone.
    pub fn restrict(&mut self, pos: CellPos, allowed: &TileSet) -> bool {
        let Some(index) = self.cells.index(pos) else {
            return false;
        };
        let changed = match self.cells.get_index_mut(index) {
            Some(CellState::Uncollapsed(set)) => set.intersect_with(allowed),
            _ => false,
        };
        if changed {
            self.refresh_sums(index);
        }
        changed
    }

    fn refresh_sums(&mut self, index: usize) {
        if let Some(CellState::Uncollapsed(set)) = self.cells.get_index(index) {
            let mut sums = EntropySums::default();
            for t in set.iter() {
                sums.weights += self.frequencies[t.0];
                sums.weight_log_weights += self.weight_log_weights[t.0];
            }
            self.sums[index] = sums;
        }
    }

    pub fn is_fully_collapsed(&self) -> bool {
        self.uncollapsed == 0
    }

    pub fn uncollapsed_count(&self) -> usize {
        self.uncollapsed
    }

    /// First uncollapsed cell whose possibility set is empty.
    pub fn contradiction(&self) -> Option<CellPos> {
        self.cells.iter().find_map(|(pos, cell)| match cell {
            CellState::Uncollapsed(set) if set.is_empty() => Some(pos),
            _ => None,
        })
    }

    /// Collapsed tile per cell, `None` where still uncollapsed.
    pub fn assignment(&self) -> Grid<Option<TileId>> {
        self.cells.map(|_, cell| cell.tile())
    }
}
