//! Tile-model Wave Function Collapse.
//!
//! - `catalog`: tile types, adjacency and frequencies
//! - `grid`: row/column storage with world-space mapping
//! - `wave`: per-cell possibility sets and entropy
//! - `propagator`: constraint propagation after a cell changes
//! - `solver`: the select/collapse/propagate loop

pub mod catalog;
pub mod direction;
pub mod grid;
pub mod observer;
pub mod propagator;
pub mod render;
pub mod solver;
pub mod tile_set;
pub mod wave;

pub use catalog::{
    CatalogBuilder, CatalogError, NeighborRule, SymmetryPolicy, TileCatalog, TileDef, TileId,
    TileType,
};
pub use direction::{Direction, DirectionSet, UnknownDirection};
pub use grid::{CellPos, Grid, GridError, WorldPos};
pub use observer::{observe_with, FnObserver, NoOpObserver, Placement, PlacementObserver};
pub use propagator::{Propagation, Propagator};
pub use render::render_ascii;
pub use solver::{
    generate, CellDebug, FailureReason, GenerationResult, Solver, SolverState, StepResult,
};
pub use tile_set::TileSet;
pub use wave::{CellState, WaveError, WaveField};
