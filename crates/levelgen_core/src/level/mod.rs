//! XML level documents.
//!
//! A document holds one or more named levels. Each level fixes the grid
//! size and lists its tile types with their adjacency constraints:
//!
//! ```xml
//! <levels>
//!   <level name="meadow" rows="8" cols="12" cellSize="1.5"
//!          startRow="0" startCol="0" endRow="7" endCol="11">
//!     <tile id="grass" frequency="4" prefab="Tiles/Grass">
//!       <constraint direction="ALL" neighbors="grass flower"/>
//!     </tile>
//!     <tile id="flower" frequency="1" prefab="Tiles/Flower">
//!       <constraint direction="ALL" neighbors="grass"/>
//!     </tile>
//!   </level>
//! </levels>
//! ```
//!
//! `neighbors` is a comma- or whitespace-separated list of tile ids.
//! `direction` accepts the single directions and the shorthand understood
//! by `DirectionSet`. `frequency` defaults to 1 and `cellSize` to 1.0.

mod parse;

use crate::wfc::{
    CatalogBuilder, CatalogError, CellPos, SymmetryPolicy, TileCatalog, TileDef, UnknownDirection,
};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Error type for level document loading.
#[derive(Debug)]
pub enum LoadError {
    /// File cannot be read
    Io(std::io::Error),
    /// Malformed XML
    Xml(String),
    /// Missing required attribute
    MissingAttribute { element: String, attribute: String },
    /// Attribute value that cannot be parsed or is out of range
    InvalidAttribute {
        element: String,
        attribute: String,
        value: String,
        reason: String,
    },
    /// Bad `direction` keyword on a constraint
    UnknownDirection(UnknownDirection),
    /// No level with the requested name
    LevelNotFound(String),
    /// The tile data of a level does not form a valid catalog
    Catalog(CatalogError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "IO error: {}", e),
            LoadError::Xml(msg) => write!(f, "XML error: {}", msg),
            LoadError::MissingAttribute { element, attribute } => {
                write!(f, "missing attribute '{}' in <{}>", attribute, element)
            }
            LoadError::InvalidAttribute {
                element,
                attribute,
                value,
                reason,
            } => write!(
                f,
                "invalid value '{}' for attribute '{}' in <{}>: {}",
                value, attribute, element, reason
            ),
            LoadError::UnknownDirection(e) => write!(f, "{}", e),
            LoadError::LevelNotFound(name) => write!(f, "level not found: {}", name),
            LoadError::Catalog(e) => write!(f, "catalog error: {}", e),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(e) => Some(e),
            LoadError::UnknownDirection(e) => Some(e),
            LoadError::Catalog(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e)
    }
}

impl From<UnknownDirection> for LoadError {
    fn from(e: UnknownDirection) -> Self {
        LoadError::UnknownDirection(e)
    }
}

impl From<CatalogError> for LoadError {
    fn from(e: CatalogError) -> Self {
        LoadError::Catalog(e)
    }
}

pub type LoadResult<T> = Result<T, LoadError>;

/// One level as read from a document. Tile data is raw: it is only
/// validated when turned into a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelData {
    pub name: String,
    pub rows: usize,
    pub cols: usize,
    pub cell_size: f32,
    /// Entry cell, for collaborators that lay out paths
    pub start: Option<CellPos>,
    /// Exit cell, for collaborators that lay out paths
    pub end: Option<CellPos>,
    pub tiles: Vec<TileDef>,
}

impl LevelData {
    /// Build the level's catalog, symmetrizing one-way adjacency.
    pub fn catalog(&self) -> Result<TileCatalog, CatalogError> {
        self.catalog_with(SymmetryPolicy::Symmetrize)
    }

    pub fn catalog_with(&self, policy: SymmetryPolicy) -> Result<TileCatalog, CatalogError> {
        CatalogBuilder::new()
            .symmetry(policy)
            .tiles(self.tiles.iter().cloned())
            .build()
    }
}

/// All levels of one document, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelSet {
    levels: Vec<LevelData>,
}

impl LevelSet {
    pub fn parse(xml: &str) -> LoadResult<Self> {
        let levels = parse::parse_levels(xml)?;
        debug!(levels = levels.len(), "parsed level document");
        Ok(Self { levels })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> LoadResult<Self> {
        let path = path.as_ref();
        let xml = fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading level document");
        Self::parse(&xml)
    }

    /// Look up a level by name. The first match wins.
    pub fn level(&self, name: &str) -> LoadResult<&LevelData> {
        self.levels
            .iter()
            .find(|level| level.name == name)
            .ok_or_else(|| LoadError::LevelNotFound(name.to_string()))
    }

    pub fn levels(&self) -> &[LevelData] {
        &self.levels
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.levels.iter().map(|level| level.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wfc::{Direction, DirectionSet};

    const MEADOW: &str = r#"
        <levels>
          <level name="meadow" rows="4" cols="6" cellSize="1.5"
                 startRow="0" startCol="0" endRow="3" endCol="5">
            <tile id="grass" frequency="4" prefab="Tiles/Grass">
              <constraint direction="ALL" neighbors="grass, flower"/>
            </tile>
            <tile id="flower" prefab="Tiles/Flower">
              <constraint direction="horizontal" neighbors="grass"/>
              <constraint direction="VERTICAL" neighbors="grass flower"/>
            </tile>
          </level>
          <level name="void" rows="2" cols="2">
            <tile id="x"/>
          </level>
        </levels>
    "#;

    #[test]
    fn test_parse_levels() {
        let set = LevelSet::parse(MEADOW).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["meadow", "void"]);

        let meadow = set.level("meadow").unwrap();
        assert_eq!((meadow.rows, meadow.cols), (4, 6));
        assert_eq!(meadow.cell_size, 1.5);
        assert_eq!(meadow.start, Some(CellPos::new(0, 0)));
        assert_eq!(meadow.end, Some(CellPos::new(3, 5)));
        assert_eq!(meadow.tiles.len(), 2);

        let flower = &meadow.tiles[1];
        assert_eq!(flower.id, "flower");
        assert_eq!(flower.frequency, 1.0, "frequency defaults to 1");
        assert_eq!(flower.visual, "Tiles/Flower");
        assert_eq!(flower.rules.len(), 2);
        assert_eq!(flower.rules[0].directions, DirectionSet::horizontal());
        assert_eq!(flower.rules[1].neighbors, vec!["grass", "flower"]);

        let void = set.level("void").unwrap();
        assert_eq!(void.cell_size, 1.0);
        assert_eq!(void.start, None);
        assert!(void.tiles[0].rules.is_empty());
    }

    #[test]
    fn test_level_catalog() {
        let set = LevelSet::parse(MEADOW).unwrap();
        let catalog = set.level("meadow").unwrap().catalog().unwrap();
        let grass = catalog.id_of("grass").unwrap();
        let flower = catalog.id_of("flower").unwrap();

        assert!((catalog.frequency(grass) - 0.8).abs() < 1e-12);
        assert!(catalog.admits(flower, Direction::North, flower));
        assert!(!catalog.admits(flower, Direction::East, flower));
        assert!(catalog.admits(grass, Direction::West, flower));
    }

    #[test]
    fn test_level_not_found() {
        let set = LevelSet::parse(MEADOW).unwrap();
        assert!(matches!(
            set.level("desert"),
            Err(LoadError::LevelNotFound(name)) if name == "desert"
        ));
    }

    #[test]
    fn test_unknown_neighbor_surfaces_as_catalog_error() {
        let set = LevelSet::parse(
            r#"<levels><level name="a" rows="1" cols="1">
                 <tile id="a"><constraint direction="NORTH" neighbors="b"/></tile>
               </level></levels>"#,
        )
        .unwrap();
        let err = set.level("a").unwrap().catalog().unwrap_err();
        assert!(matches!(err, CatalogError::UnknownNeighbor { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("levels.xml");
        std::fs::write(&path, MEADOW).unwrap();

        let set = LevelSet::load(&path).unwrap();
        assert_eq!(set.len(), 2);

        assert!(matches!(
            LevelSet::load(dir.path().join("missing.xml")),
            Err(LoadError::Io(_))
        ));
    }
}
