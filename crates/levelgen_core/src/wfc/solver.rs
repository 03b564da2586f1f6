//! The observe/collapse/propagate loop.
//!
//! A `Solver` owns one run: its wave field, RNG and step budget. Each call
//! to `step` selects the lowest-entropy uncollapsed cell (uniformly at
//! random among ties), collapses it by a frequency-weighted draw, and
//! propagates the consequences. Callers choose the cadence: `run` loops
//! until a terminal state, an animated caller calls `step` once per tick.
//!
//! # Example
//!
//! ```ignore
//! use levelgen_core::{generate, GenerationConfig, GenerationResult, NoOpObserver};
//!
//! let config = GenerationConfig::new(8, 8).with_seed(42);
//! match generate(&catalog, &config, &mut NoOpObserver)? {
//!     GenerationResult::Success(grid) => println!("{} cells", grid.len()),
//!     GenerationResult::Failure(reason) => println!("retry: {}", reason),
//!     GenerationResult::Partial { cells_remaining, .. } => println!("{} left", cells_remaining),
//! }
//! ```

use super::catalog::{TileCatalog, TileId};
use super::grid::{CellPos, Grid, GridError};
use super::observer::{Placement, PlacementObserver};
use super::propagator::{Propagation, Propagator};
use super::tile_set::TileSet;
use super::wave::{CellState, WaveError, WaveField};
use crate::config::GenerationConfig;
use crate::rng::{StdRandom, WfcRng};
use std::fmt;
use tracing::{debug, trace, warn};

/// Entropies closer than this are treated as tied.
const ENTROPY_EPSILON: f64 = 1e-9;

/// Why a run ended in failure. Retrying with another seed may succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// A cell's possibility set became empty
    Contradiction { pos: CellPos, iteration: usize },
    /// Cells remain uncollapsed but none can be selected
    NoSelectableCell { remaining: usize },
    /// The solver tried to collapse a cell it should not have
    InvalidCollapse(WaveError),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Contradiction { pos, iteration } => {
                write!(f, "contradiction at {} on iteration {}", pos, iteration)
            }
            FailureReason::NoSelectableCell { remaining } => {
                write!(f, "no selectable cell among {} remaining", remaining)
            }
            FailureReason::InvalidCollapse(e) => write!(f, "invalid collapse: {}", e),
        }
    }
}

impl std::error::Error for FailureReason {}

/// Solver state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverState {
    /// Between steps, about to pick a cell
    Selecting,
    /// Cell chosen, about to draw its tile
    Collapsing(CellPos),
    /// Cell collapsed, constraints being propagated
    Propagating(CellPos),
    /// Every cell collapsed
    Succeeded,
    /// Contradiction reached
    Failed(FailureReason),
    /// Step budget used up before every cell collapsed
    Exhausted,
}

impl SolverState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SolverState::Succeeded | SolverState::Failed(_) | SolverState::Exhausted
        )
    }
}

/// Outcome of a single `step` call.
#[derive(Debug, Clone, PartialEq)]
pub enum StepResult {
    /// One cell was collapsed and its constraints propagated
    Collapsed {
        pos: CellPos,
        tile: TileId,
        entropy: f64,
        propagation: Propagation,
    },
    /// The run is over; further steps return the same state
    Finished(SolverState),
}

/// Final result of a generation run.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    Success(Grid<TileId>),
    Failure(FailureReason),
    Partial {
        assignment: Grid<Option<TileId>>,
        cells_remaining: usize,
    },
}

impl GenerationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationResult::Success(_))
    }
}

/// Debug view of one uncollapsed cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellDebug {
    pub pos: CellPos,
    pub possible: Vec<TileId>,
    pub entropy: f64,
}

/// One generation run over a catalog.
pub struct Solver<'a> {
    catalog: &'a TileCatalog,
    wave: WaveField,
    propagator: Propagator,
    rng: Box<dyn WfcRng>,
    state: SolverState,
    iterations: usize,
    max_iterations: usize,
    /// Reused candidate buffer for selection
    candidates: Vec<CellPos>,
}

impl<'a> Solver<'a> {
    /// Start a run with a fresh wave field seeded from `config.seed`.
    pub fn new(catalog: &'a TileCatalog, config: &GenerationConfig) -> Result<Self, GridError> {
        Self::with_rng(
            catalog,
            config,
            Box::new(StdRandom::from_seed(config.seed)),
        )
    }

    /// Start a run driven by a caller-supplied RNG.
    pub fn with_rng(
        catalog: &'a TileCatalog,
        config: &GenerationConfig,
        rng: Box<dyn WfcRng>,
    ) -> Result<Self, GridError> {
        let wave = WaveField::new(
            config.rows,
            config.cols,
            config.cell_size,
            config.origin,
            catalog,
        )?;

        debug!(
            rows = config.rows,
            cols = config.cols,
            tiles = catalog.len(),
            seed = config.seed,
            max_iterations = config.max_iterations,
            "starting generation run"
        );

        Ok(Self {
            catalog,
            wave,
            propagator: Propagator::new(),
            rng,
            state: SolverState::Selecting,
            iterations: 0,
            max_iterations: config.max_iterations,
            candidates: Vec::new(),
        })
    }

    pub fn state(&self) -> &SolverState {
        &self.state
    }

    pub fn wave(&self) -> &WaveField {
        &self.wave
    }

    pub fn catalog(&self) -> &TileCatalog {
        self.catalog
    }

    /// Number of collapse steps taken so far.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Narrow a cell before (or between) steps and propagate the result.
    ///
    /// Used to pin tiles in place, e.g. a fixed entrance. An emptied set
    /// ends the run as `Failed`. A finished run is left untouched.
    pub fn restrict_cell(
        &mut self,
        pos: CellPos,
        allowed: &TileSet,
    ) -> Result<Propagation, WaveError> {
        if self.state.is_terminal() {
            return Err(WaveError::RunFinished);
        }
        match self.wave.state(pos) {
            None => return Err(WaveError::OutOfBounds(pos)),
            Some(CellState::Collapsed(_)) => return Err(WaveError::AlreadyCollapsed(pos)),
            Some(CellState::Uncollapsed(_)) => {}
        }

        if !self.wave.restrict(pos, allowed) {
            return Ok(Propagation::default());
        }

        if self.wave.possible_tiles(pos).is_some_and(TileSet::is_empty) {
            self.fail_contradiction(pos);
            return Ok(Propagation {
                contradiction: Some(pos),
                ..Default::default()
            });
        }

        let propagation = self.propagator.propagate(&mut self.wave, self.catalog, pos);
        if let Some(at) = propagation.contradiction {
            self.fail_contradiction(at);
        }
        Ok(propagation)
    }

    /// Run one select/collapse/propagate step.
    pub fn step(&mut self, observer: &mut dyn PlacementObserver) -> StepResult {
        if self.state.is_terminal() {
            return StepResult::Finished(self.state.clone());
        }

        if self.wave.is_fully_collapsed() {
            return self.finish(SolverState::Succeeded);
        }
        if let Some(pos) = self.wave.contradiction() {
            self.fail_contradiction(pos);
            return StepResult::Finished(self.state.clone());
        }
        if self.max_iterations > 0 && self.iterations >= self.max_iterations {
            return self.finish(SolverState::Exhausted);
        }

        // Selecting
        self.state = SolverState::Selecting;
        let Some((pos, entropy)) = self.select() else {
            let remaining = self.wave.uncollapsed_count();
            return self.finish(SolverState::Failed(FailureReason::NoSelectableCell {
                remaining,
            }));
        };

        // Collapsing
        self.state = SolverState::Collapsing(pos);
        let Some(tile) = self.draw_tile(pos) else {
            let remaining = self.wave.uncollapsed_count();
            return self.finish(SolverState::Failed(FailureReason::NoSelectableCell {
                remaining,
            }));
        };
        if let Err(e) = self.wave.collapse(pos, tile) {
            return self.finish(SolverState::Failed(FailureReason::InvalidCollapse(e)));
        }
        self.iterations += 1;

        observer.on_collapse(&Placement {
            pos,
            world: self.wave.grid().world_position(pos),
            tile: self.catalog.tile(tile),
        });

        // Propagating
        self.state = SolverState::Propagating(pos);
        let propagation = self.propagator.propagate(&mut self.wave, self.catalog, pos);

        trace!(
            iteration = self.iterations,
            %pos,
            entropy,
            tile = self.catalog.name_of(tile),
            visited = propagation.visited,
            narrowed = propagation.narrowed,
            "collapsed cell"
        );

        match propagation.contradiction {
            Some(at) => self.fail_contradiction(at),
            None if self.wave.is_fully_collapsed() => self.state = SolverState::Succeeded,
            None => self.state = SolverState::Selecting,
        }
        if self.state.is_terminal() {
            self.log_finish();
        }

        StepResult::Collapsed {
            pos,
            tile,
            entropy,
            propagation,
        }
    }

    /// Step until the run reaches a terminal state.
    pub fn run(&mut self, observer: &mut dyn PlacementObserver) -> &SolverState {
        while let StepResult::Collapsed { .. } = self.step(observer) {}
        &self.state
    }

    /// Package the current wave as a result.
    ///
    /// A run that was abandoned before finishing reports as `Partial`.
    pub fn result(&self) -> GenerationResult {
        match &self.state {
            SolverState::Failed(reason) => GenerationResult::Failure(reason.clone()),
            SolverState::Succeeded => match self.wave.assignment().try_map(|_, t| *t) {
                Some(grid) => GenerationResult::Success(grid),
                None => self.partial(),
            },
            _ => self.partial(),
        }
    }

    fn partial(&self) -> GenerationResult {
        GenerationResult::Partial {
            assignment: self.wave.assignment(),
            cells_remaining: self.wave.uncollapsed_count(),
        }
    }

    /// Possibility set and entropy of every uncollapsed cell.
    pub fn snapshot(&self) -> Vec<CellDebug> {
        self.wave
            .grid()
            .iter()
            .filter_map(|(pos, cell)| match cell {
                CellState::Uncollapsed(set) => Some(CellDebug {
                    pos,
                    possible: set.iter().collect(),
                    entropy: self.wave.entropy_of(pos).unwrap_or(0.0),
                }),
                CellState::Collapsed(_) => None,
            })
            .collect()
    }

    /// Minimum-entropy uncollapsed cell, ties broken uniformly at random.
    fn select(&mut self) -> Option<(CellPos, f64)> {
        self.candidates.clear();
        let mut min_entropy = f64::INFINITY;

        for (index, cell) in self.wave.grid().values().iter().enumerate() {
            let CellState::Uncollapsed(set) = cell else {
                continue;
            };
            if set.is_empty() {
                continue;
            }
            let entropy = self.wave.entropy_at(index);
            let pos = self.wave.grid().position(index);
            if entropy < min_entropy - ENTROPY_EPSILON {
                min_entropy = entropy;
                self.candidates.clear();
                self.candidates.push(pos);
            } else if (entropy - min_entropy).abs() <= ENTROPY_EPSILON {
                self.candidates.push(pos);
            }
        }

        if self.candidates.is_empty() {
            return None;
        }
        let pick = self.rng.next_usize_max(self.candidates.len());
        Some((self.candidates[pick], min_entropy))
    }

    /// Cumulative-weight draw over the cell's possibility set.
    fn draw_tile(&mut self, pos: CellPos) -> Option<TileId> {
        let set = self.wave.possible_tiles(pos)?;
        let total: f64 = set.iter().map(|t| self.catalog.frequency(t)).sum();
        let mut remainder = self.rng.next_double() * total;

        let mut last = None;
        for t in set.iter() {
            remainder -= self.catalog.frequency(t);
            if remainder <= 0.0 {
                return Some(t);
            }
            last = Some(t);
        }
        // Rounding can leave a sliver of remainder after the last tile
        last
    }

    fn fail_contradiction(&mut self, pos: CellPos) {
        self.state = SolverState::Failed(FailureReason::Contradiction {
            pos,
            iteration: self.iterations,
        });
        self.log_finish();
    }

    fn finish(&mut self, state: SolverState) -> StepResult {
        self.state = state;
        self.log_finish();
        StepResult::Finished(self.state.clone())
    }

    fn log_finish(&self) {
        match &self.state {
            SolverState::Failed(reason) => warn!(
                iterations = self.iterations,
                %reason,
                "generation failed"
            ),
            SolverState::Exhausted => warn!(
                iterations = self.iterations,
                remaining = self.wave.uncollapsed_count(),
                "iteration budget exhausted"
            ),
            state => debug!(iterations = self.iterations, ?state, "generation finished"),
        }
    }
}

/// Generate a layout in one call.
///
/// Runs to completion, failure or budget exhaustion, notifying `observer`
/// of every collapsed cell.
pub fn generate(
    catalog: &TileCatalog,
    config: &GenerationConfig,
    observer: &mut dyn PlacementObserver,
) -> Result<GenerationResult, GridError> {
    let mut solver = Solver::new(catalog, config)?;
    solver.run(observer);
    Ok(solver.result())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::StdRandom;
    use crate::wfc::catalog::{CatalogBuilder, TileDef};
    use crate::wfc::direction::DirectionSet;
    use crate::wfc::observer::{observe_with, NoOpObserver};

    fn open_catalog(weights: &[f64]) -> TileCatalog {
        let names: Vec<String> = (0..weights.len()).map(|i| format!("t{}", i)).collect();
        CatalogBuilder::new()
            .tiles(weights.iter().enumerate().map(|(i, &w)| {
                TileDef::new(names[i].clone(), w).admits(DirectionSet::ALL, names.clone())
            }))
            .build()
            .unwrap()
    }

    #[test]
    fn test_draw_tile_follows_frequencies() {
        let catalog = open_catalog(&[1.0, 9.0]);
        let config = GenerationConfig::new(1, 1);
        let mut counts = [0usize; 2];

        for seed in 0..1000 {
            let mut solver =
                Solver::with_rng(&catalog, &config, Box::new(StdRandom::from_seed(seed))).unwrap();
            let tile = solver.draw_tile(CellPos::new(0, 0)).unwrap();
            counts[tile.0] += 1;
        }

        assert!(
            counts[1] > counts[0] * 5,
            "Expected heavier tile to dominate, got {:?}",
            counts
        );
    }

    #[test]
    fn test_draw_tile_only_from_possible_set() {
        let catalog = open_catalog(&[5.0, 1.0, 5.0]);
        let config = GenerationConfig::new(1, 1);
        let mut solver = Solver::new(&catalog, &config).unwrap();
        solver
            .restrict_cell(CellPos::new(0, 0), &TileSet::from_ids(3, [TileId(1)]))
            .unwrap();

        for _ in 0..50 {
            assert_eq!(solver.draw_tile(CellPos::new(0, 0)), Some(TileId(1)));
        }
    }

    #[test]
    fn test_select_prefers_lowest_entropy() {
        let catalog = open_catalog(&[1.0, 1.0, 1.0]);
        let config = GenerationConfig::new(2, 2);
        let mut solver = Solver::new(&catalog, &config).unwrap();
        let target = CellPos::new(1, 0);
        solver
            .restrict_cell(target, &TileSet::from_ids(3, [TileId(0), TileId(2)]))
            .unwrap();

        let (pos, entropy) = solver.select().unwrap();
        assert_eq!(pos, target);
        assert!((entropy - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_select_breaks_ties_randomly() {
        let catalog = open_catalog(&[1.0, 1.0]);
        let config = GenerationConfig::new(3, 3);
        let mut seen = std::collections::HashSet::new();

        for seed in 0..64 {
            let mut solver = Solver::new(&catalog, &config.clone().with_seed(seed)).unwrap();
            seen.insert(solver.select().unwrap().0);
        }

        assert!(
            seen.len() > 3,
            "first pick should spread over the grid, saw {:?}",
            seen
        );
    }

    #[test]
    fn test_step_state_machine() {
        let catalog = open_catalog(&[1.0, 1.0]);
        let config = GenerationConfig::new(1, 2).with_seed(3);
        let mut solver = Solver::new(&catalog, &config).unwrap();
        assert_eq!(solver.state(), &SolverState::Selecting);

        assert!(matches!(
            solver.step(&mut NoOpObserver),
            StepResult::Collapsed { .. }
        ));
        assert_eq!(solver.state(), &SolverState::Selecting);

        assert!(matches!(
            solver.step(&mut NoOpObserver),
            StepResult::Collapsed { .. }
        ));
        assert_eq!(solver.state(), &SolverState::Succeeded);

        assert_eq!(
            solver.step(&mut NoOpObserver),
            StepResult::Finished(SolverState::Succeeded)
        );
        assert_eq!(solver.iterations(), 2);
    }

    #[test]
    fn test_restrict_cell_to_empty_fails_run() {
        let catalog = open_catalog(&[1.0, 1.0]);
        let config = GenerationConfig::new(2, 2);
        let mut solver = Solver::new(&catalog, &config).unwrap();

        let propagation = solver
            .restrict_cell(CellPos::new(0, 1), &TileSet::empty(2))
            .unwrap();
        assert_eq!(propagation.contradiction, Some(CellPos::new(0, 1)));
        assert!(matches!(
            solver.result(),
            GenerationResult::Failure(FailureReason::Contradiction { iteration: 0, .. })
        ));

        let mut fresh = Solver::new(&catalog, &config).unwrap();
        assert_eq!(
            fresh.restrict_cell(CellPos::new(5, 5), &TileSet::empty(2)),
            Err(WaveError::OutOfBounds(CellPos::new(5, 5)))
        );
    }

    #[test]
    fn test_restrict_cell_after_run_finished() {
        let catalog = open_catalog(&[1.0, 1.0]);
        let config = GenerationConfig::new(2, 2).with_seed(3).with_max_iterations(1);
        let mut solver = Solver::new(&catalog, &config).unwrap();
        solver.run(&mut NoOpObserver);
        assert_eq!(*solver.state(), SolverState::Exhausted);

        let uncollapsed = solver.snapshot()[0].pos;
        assert_eq!(
            solver.restrict_cell(uncollapsed, &TileSet::empty(2)),
            Err(WaveError::RunFinished)
        );
        assert_eq!(*solver.state(), SolverState::Exhausted, "late restriction reopened the run");
        assert!(matches!(
            solver.result(),
            GenerationResult::Partial { cells_remaining: 3, .. }
        ));

        // A failed run keeps its original failure position
        let mut failed = Solver::new(&catalog, &GenerationConfig::new(2, 2)).unwrap();
        failed
            .restrict_cell(CellPos::new(0, 0), &TileSet::empty(2))
            .unwrap();
        let before = failed.state().clone();
        assert_eq!(
            failed.restrict_cell(CellPos::new(0, 1), &TileSet::empty(2)),
            Err(WaveError::RunFinished)
        );
        assert_eq!(*failed.state(), before);
    }

    #[test]
    fn test_snapshot_lists_uncollapsed_cells() {
        let catalog = open_catalog(&[1.0, 1.0]);
        let config = GenerationConfig::new(2, 2).with_seed(11);
        let mut solver = Solver::new(&catalog, &config).unwrap();
        assert_eq!(solver.snapshot().len(), 4);

        solver.step(&mut NoOpObserver);
        let snapshot = solver.snapshot();
        assert_eq!(snapshot.len(), 3);
        for cell in snapshot {
            assert_eq!(cell.possible, vec![TileId(0), TileId(1)]);
            assert!((cell.entropy - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_observer_sees_every_collapse() {
        let catalog = open_catalog(&[1.0, 2.0, 3.0]);
        let config = GenerationConfig::new(3, 4).with_seed(5).with_cell_size(2.0);
        let mut placed = Vec::new();

        let result = generate(
            &catalog,
            &config,
            &mut observe_with(|p| placed.push((p.pos, p.world, p.tile.id))),
        )
        .unwrap();

        let grid = match result {
            GenerationResult::Success(grid) => grid,
            other => panic!("unconstrained catalog must succeed, got {:?}", other),
        };
        assert_eq!(placed.len(), 12);
        for (pos, world, tile) in placed {
            assert_eq!(grid.get(pos), Some(&tile));
            assert_eq!(grid.world_position(pos), world);
        }
    }
}
