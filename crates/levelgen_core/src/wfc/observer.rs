//! Placement notifications for collaborators that materialize tiles.
//!
//! The solver calls `on_collapse` once per collapsed cell, in collapse
//! order. Closures can be wrapped with `observe_with`:
//!
//! ```ignore
//! let mut placed = Vec::new();
//! let result = generate(&catalog, &config, &mut observe_with(|p| placed.push(p.pos)))?;
//! ```

use super::catalog::TileType;
use super::grid::{CellPos, WorldPos};

/// A cell that has just received its final tile.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    pub pos: CellPos,
    /// World-space centre of the cell
    pub world: WorldPos,
    pub tile: &'a TileType,
}

pub trait PlacementObserver {
    fn on_collapse(&mut self, _placement: &Placement<'_>) {}
}

/// Observer backed by a closure. See `observe_with`.
pub struct FnObserver<F>(F);

impl<F: FnMut(&Placement<'_>)> PlacementObserver for FnObserver<F> {
    fn on_collapse(&mut self, placement: &Placement<'_>) {
        (self.0)(placement)
    }
}

pub fn observe_with<F: FnMut(&Placement<'_>)>(f: F) -> FnObserver<F> {
    FnObserver(f)
}

pub struct NoOpObserver;
impl PlacementObserver for NoOpObserver {}
