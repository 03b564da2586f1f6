//! Breadth-first constraint propagation over the 4-neighborhood.
//!
//! Starting from one changed cell, each dequeued cell narrows its in-grid,
//! uncollapsed neighbors to the union of what its remaining tiles admit in
//! that direction. Any neighbor that actually shrank is enqueued in turn.
//! The fixed point does not depend on direction order.

use super::catalog::TileCatalog;
use super::direction::Direction;
use super::grid::CellPos;
use super::tile_set::TileSet;
use super::wave::{CellState, WaveField};
use std::collections::VecDeque;

/// Summary of one propagation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Propagation {
    /// Cells dequeued and examined
    pub visited: usize,
    /// Restrictions that shrank a neighbor
    pub narrowed: usize,
    /// Cell whose possibility set became empty, if any
    pub contradiction: Option<CellPos>,
}

/// Reusable propagation queue.
#[derive(Debug, Default)]
pub struct Propagator {
    queue: VecDeque<CellPos>,
}

impl Propagator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Propagate constraints outward from `origin` until nothing changes.
    ///
    /// Stops early if a neighbor's possibility set becomes empty.
    pub fn propagate(
        &mut self,
        wave: &mut WaveField,
        catalog: &TileCatalog,
        origin: CellPos,
    ) -> Propagation {
        let mut result = Propagation::default();
        self.queue.clear();
        self.queue.push_back(origin);

        while let Some(pos) = self.queue.pop_front() {
            result.visited += 1;

            for direction in Direction::ALL {
                let Some(neighbor) = wave.grid().neighbor(pos, direction) else {
                    continue;
                };
                if !matches!(wave.state(neighbor), Some(CellState::Uncollapsed(_))) {
                    continue;
                }
                let Some(allowed) = admitted(wave, catalog, pos, direction) else {
                    continue;
                };

                if wave.restrict(neighbor, &allowed) {
                    result.narrowed += 1;
                    if wave.possible_tiles(neighbor).is_some_and(TileSet::is_empty) {
                        result.contradiction = Some(neighbor);
                        self.queue.clear();
                        return result;
                    }
                    self.queue.push_back(neighbor);
                }
            }
        }

        result
    }
}

/// Union of the admissible-neighbor sets, in `direction`, of every tile
/// still possible at `pos`.
fn admitted(
    wave: &WaveField,
    catalog: &TileCatalog,
    pos: CellPos,
    direction: Direction,
) -> Option<TileSet> {
    match wave.state(pos)? {
        CellState::Collapsed(tile) => Some(catalog.tile(*tile).admissible(direction).clone()),
        CellState::Uncollapsed(set) => {
            let mut union = TileSet::empty(catalog.len());
            for t in set.iter() {
                union.union_with(catalog.tile(t).admissible(direction));
            }
            Some(union)
        }
    }
}
