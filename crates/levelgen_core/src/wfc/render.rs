//! Plain-text rendering of a (possibly partial) layout.

use super::catalog::{TileCatalog, TileId};
use super::grid::{CellPos, Grid};

/// One character per cell: the first character of the tile id, or `?`
/// for cells without a tile. The top row (highest row index) comes first.
pub fn render_ascii(assignment: &Grid<Option<TileId>>, catalog: &TileCatalog) -> String {
    let mut out = String::with_capacity((assignment.cols() + 1) * assignment.rows());
    for row in (0..assignment.rows()).rev() {
        for col in 0..assignment.cols() {
            let glyph = match assignment.get(CellPos::new(row, col)) {
                Some(Some(tile)) => catalog.name_of(*tile).chars().next().unwrap_or(' '),
                _ => '?',
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wfc::catalog::{CatalogBuilder, TileDef};
    use crate::wfc::direction::DirectionSet;
    use crate::wfc::grid::WorldPos;

    #[test]
    fn test_render_top_row_first() {
        let catalog = CatalogBuilder::new()
            .tile(TileDef::new("grass", 1.0).admits(DirectionSet::ALL, ["grass", "water"]))
            .tile(TileDef::new("water", 1.0).admits(DirectionSet::ALL, ["water"]))
            .build()
            .unwrap();
        let grass = catalog.id_of("grass");
        let water = catalog.id_of("water");

        let mut grid = Grid::new(2, 3, 1.0, WorldPos::default(), None).unwrap();
        grid.set(CellPos::new(0, 0), grass);
        grid.set(CellPos::new(0, 1), water);
        grid.set(CellPos::new(1, 2), water);

        assert_eq!(render_ascii(&grid, &catalog), "??w\ngw?\n");
    }
}
