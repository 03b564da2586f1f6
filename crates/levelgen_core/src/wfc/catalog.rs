//! Tile catalog: the immutable tile types a generation run draws from.
//!
//! A `TileCatalog` is built once from raw `TileDef`s by `CatalogBuilder`,
//! which resolves string ids to dense `TileId`s, expands directional
//! shorthand, makes adjacency symmetric (or rejects asymmetry, depending on
//! `SymmetryPolicy`) and normalizes frequencies so they sum to 1.
//!
//! # Example
//!
//! ```ignore
//! use levelgen_core::wfc::{CatalogBuilder, DirectionSet, TileDef};
//!
//! let catalog = CatalogBuilder::new()
//!     .tile(TileDef::new("grass", 3.0).admits(DirectionSet::ALL, ["grass", "road"]))
//!     .tile(TileDef::new("road", 1.0).admits(DirectionSet::ALL, ["grass"]))
//!     .build()?;
//! assert_eq!(catalog.len(), 2);
//! ```

use super::direction::{Direction, DirectionSet};
use super::tile_set::TileSet;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Dense index of a tile type within its catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub usize);

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One directional constraint of a raw tile definition.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborRule {
    pub directions: DirectionSet,
    pub neighbors: Vec<String>,
}

/// Raw tile definition, as produced by a data loader.
#[derive(Debug, Clone, PartialEq)]
pub struct TileDef {
    pub id: String,
    pub frequency: f64,
    /// Opaque handle for whatever renders the tile.
    pub visual: String,
    pub rules: Vec<NeighborRule>,
}

impl TileDef {
    pub fn new(id: impl Into<String>, frequency: f64) -> Self {
        Self {
            id: id.into(),
            frequency,
            visual: String::new(),
            rules: Vec::new(),
        }
    }

    pub fn with_visual(mut self, visual: impl Into<String>) -> Self {
        self.visual = visual.into();
        self
    }

    /// Admit `neighbors` in every direction of `directions`.
    pub fn admits<I, S>(mut self, directions: DirectionSet, neighbors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.push(NeighborRule {
            directions,
            neighbors: neighbors.into_iter().map(Into::into).collect(),
        });
        self
    }
}

/// A resolved, immutable tile type.
#[derive(Debug, Clone, PartialEq)]
pub struct TileType {
    pub id: TileId,
    pub name: String,
    /// Normalized probability weight (all tiles sum to 1).
    pub frequency: f64,
    pub visual: String,
    /// `admissible[d.index()]` = tiles allowed next to this one in direction `d`
    admissible: [TileSet; 4],
}

impl TileType {
    pub fn admissible(&self, direction: Direction) -> &TileSet {
        &self.admissible[direction.index()]
    }
}

/// How the builder treats adjacency that is only declared one way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SymmetryPolicy {
    /// If A admits B to the NORTH, B is made to admit A to the SOUTH.
    #[default]
    Symmetrize,
    /// One-way adjacency is a data error.
    Strict,
}

/// Error type for catalog construction (malformed tile data).
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// No tiles were defined
    EmptyCatalog,
    /// Two tiles share an id
    DuplicateTile(String),
    /// Frequency is zero, negative or not finite
    NonPositiveFrequency { tile: String, frequency: f64 },
    /// A constraint names a tile that does not exist
    UnknownNeighbor {
        tile: String,
        direction: Direction,
        neighbor: String,
    },
    /// Adjacency declared one way only (strict policy)
    AsymmetricAdjacency {
        tile: String,
        direction: Direction,
        neighbor: String,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::EmptyCatalog => write!(f, "catalog has no tiles"),
            CatalogError::DuplicateTile(id) => write!(f, "duplicate tile id '{}'", id),
            CatalogError::NonPositiveFrequency { tile, frequency } => {
                write!(f, "tile '{}' has non-positive frequency {}", tile, frequency)
            }
            CatalogError::UnknownNeighbor {
                tile,
                direction,
                neighbor,
            } => write!(
                f,
                "tile '{}' names unknown neighbor '{}' to its {}",
                tile, neighbor, direction
            ),
            CatalogError::AsymmetricAdjacency {
                tile,
                direction,
                neighbor,
            } => write!(
                f,
                "tile '{}' admits '{}' to its {} but not the reverse",
                tile, neighbor, direction
            ),
        }
    }
}

impl std::error::Error for CatalogError {}

/// Builds a `TileCatalog` from raw definitions.
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    defs: Vec<TileDef>,
    policy: SymmetryPolicy,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symmetry(mut self, policy: SymmetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn tile(mut self, def: TileDef) -> Self {
        self.defs.push(def);
        self
    }

    pub fn tiles(mut self, defs: impl IntoIterator<Item = TileDef>) -> Self {
        self.defs.extend(defs);
        self
    }

    pub fn build(self) -> Result<TileCatalog, CatalogError> {
        if self.defs.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }

        let n = self.defs.len();
        let mut by_name = HashMap::with_capacity(n);
        for (i, def) in self.defs.iter().enumerate() {
            if by_name.insert(def.id.clone(), TileId(i)).is_some() {
                return Err(CatalogError::DuplicateTile(def.id.clone()));
            }
            if !(def.frequency.is_finite() && def.frequency > 0.0) {
                return Err(CatalogError::NonPositiveFrequency {
                    tile: def.id.clone(),
                    frequency: def.frequency,
                });
            }
        }

        // Resolve declared adjacency
        let mut admissible: Vec<[TileSet; 4]> =
            (0..n).map(|_| std::array::from_fn(|_| TileSet::empty(n))).collect();
        for (i, def) in self.defs.iter().enumerate() {
            for rule in &def.rules {
                for direction in rule.directions.iter() {
                    for neighbor in &rule.neighbors {
                        let id = by_name.get(neighbor).copied().ok_or_else(|| {
                            CatalogError::UnknownNeighbor {
                                tile: def.id.clone(),
                                direction,
                                neighbor: neighbor.clone(),
                            }
                        })?;
                        admissible[i][direction.index()].insert(id);
                    }
                }
            }
        }

        let declared = admissible.clone();
        for a in 0..n {
            for direction in Direction::ALL {
                for b in declared[a][direction.index()].iter() {
                    let reverse = direction.opposite().index();
                    if declared[b.0][reverse].contains(TileId(a)) {
                        continue;
                    }
                    match self.policy {
                        SymmetryPolicy::Symmetrize => {
                            admissible[b.0][reverse].insert(TileId(a));
                        }
                        SymmetryPolicy::Strict => {
                            return Err(CatalogError::AsymmetricAdjacency {
                                tile: self.defs[a].id.clone(),
                                direction,
                                neighbor: self.defs[b.0].id.clone(),
                            });
                        }
                    }
                }
            }
        }

        // Scale by the largest weight first so the sum cannot overflow
        let largest = self.defs.iter().map(|d| d.frequency).fold(0.0, f64::max);
        let total: f64 = self.defs.iter().map(|d| d.frequency / largest).sum();
        let tiles: Vec<TileType> = self
            .defs
            .into_iter()
            .zip(admissible)
            .enumerate()
            .map(|(i, (def, admissible))| TileType {
                id: TileId(i),
                name: def.id,
                frequency: def.frequency / largest / total,
                visual: def.visual,
                admissible,
            })
            .collect();

        debug!(
            tiles = tiles.len(),
            policy = ?self.policy,
            "built tile catalog"
        );

        Ok(TileCatalog::from_tiles(tiles, by_name))
    }
}

/// The immutable set of tile types for one generation request.
#[derive(Debug, Clone)]
pub struct TileCatalog {
    tiles: Vec<TileType>,
    by_name: HashMap<String, TileId>,
    /// `f * log2(f)` per tile, for entropy sums
    weight_log_weights: Vec<f64>,
}

impl TileCatalog {
    fn from_tiles(tiles: Vec<TileType>, by_name: HashMap<String, TileId>) -> Self {
        let weight_log_weights = tiles
            .iter()
            .map(|t| t.frequency * t.frequency.log2())
            .collect();
        Self {
            tiles,
            by_name,
            weight_log_weights,
        }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> &[TileType] {
        &self.tiles
    }

    /// Look up a tile. Panics on an id from a different catalog.
    pub fn tile(&self, id: TileId) -> &TileType {
        &self.tiles[id.0]
    }

    pub fn id_of(&self, name: &str) -> Option<TileId> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, id: TileId) -> &str {
        &self.tiles[id.0].name
    }

    pub fn frequency(&self, id: TileId) -> f64 {
        self.tiles[id.0].frequency
    }

    pub fn weight_log_weight(&self, id: TileId) -> f64 {
        self.weight_log_weights[id.0]
    }

    /// Every tile in the catalog, as a possibility set.
    pub fn all_tiles(&self) -> TileSet {
        TileSet::full(self.tiles.len())
    }

    /// Whether `neighbor` may sit next to `tile` in `direction`.
    pub fn admits(&self, tile: TileId, direction: Direction, neighbor: TileId) -> bool {
        self.tiles[tile.0].admissible(direction).contains(neighbor)
    }

    /// Resolve a list of names to a possibility set.
    pub fn set_of<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Option<TileSet> {
        let mut set = TileSet::empty(self.len());
        for name in names {
            set.insert(self.id_of(name)?);
        }
        Some(set)
    }
}
