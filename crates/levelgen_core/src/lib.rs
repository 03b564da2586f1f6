//! Tile-based level layout generation.
//!
//! A level is described as a set of tile types with adjacency rules and
//! relative frequencies. `wfc::generate` fills a rows x cols grid with
//! tiles so that every pair of neighboring cells is allowed by the rules,
//! using Wave Function Collapse.
//!
//! ```ignore
//! use levelgen_core::{generate, GenerationConfig, LevelSet, NoOpObserver};
//!
//! let levels = LevelSet::load("levels/demo.xml")?;
//! let level = levels.level("meadow")?;
//! let catalog = level.catalog()?;
//! let config = GenerationConfig::from_level(level).with_seed(7);
//! let result = generate(&catalog, &config, &mut NoOpObserver)?;
//! ```

pub mod config;
pub mod level;
pub mod rng;
pub mod wfc;

pub use config::{ConfigError, GenerationConfig};
pub use level::{LevelData, LevelSet, LoadError};
pub use rng::{StdRandom, WfcRng};
pub use wfc::{
    generate, render_ascii, CatalogBuilder, GenerationResult, NoOpObserver, Solver, SolverState,
    StepResult, TileCatalog,
};
