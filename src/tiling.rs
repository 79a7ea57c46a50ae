use crate::data::osm::TileId;
use crate::errors::{Error, ErrorKind, Result};

/// Maps a coordinate to the tile it belongs to.
pub trait TileOracle {
    fn tile_id(&self, lat: f64, lon: f64) -> Result<TileId>;
}

impl<F> TileOracle for F
where
    F: Fn(f64, f64) -> Result<TileId>,
{
    fn tile_id(&self, lat: f64, lon: f64) -> Result<TileId> {
        self(lat, lon)
    }
}

/// Regular lat/lon grid. Tiles are numbered row by row from (-90, -180).
#[derive(Debug, Clone, Copy)]
pub struct GridTiler {
    tile_size_deg: f64,
    columns: i64,
    rows: i64,
}

fn grid_error(tile_size_deg: f64, reason: &str) -> Error {
    Error::new(ErrorKind::Tiling, format!("tile size {} {}", tile_size_deg, reason))
}

/// Number of cells covering `span` degrees. Rejects counts that do not fit an `i64`.
fn cell_count(span: f64, tile_size_deg: f64) -> Result<i64> {
    let cells = (span / tile_size_deg).ceil();
    if !cells.is_finite() || cells >= i64::MAX as f64 {
        return Err(grid_error(tile_size_deg, "yields more tiles than ids"));
    }
    Ok(cells as i64)
}

impl GridTiler {
    pub fn new(tile_size_deg: f64) -> Result<Self> {
        if !tile_size_deg.is_finite() || tile_size_deg <= 0.0 || tile_size_deg > 360.0 {
            return Err(grid_error(tile_size_deg, "must be in (0, 360] degrees"));
        }
        let columns = cell_count(360.0, tile_size_deg)?;
        let rows = cell_count(180.0, tile_size_deg)?;
        match columns.checked_mul(rows) {
            Some(tiles) if tiles <= i64::from(TileId::MAX) => Ok(GridTiler {
                tile_size_deg,
                columns,
                rows,
            }),
            _ => Err(grid_error(tile_size_deg, "yields more tiles than ids")),
        }
    }

    fn cell(&self, offset: f64, cells: i64) -> i64 {
        ((offset / self.tile_size_deg).floor() as i64).clamp(0, cells - 1)
    }
}

impl TileOracle for GridTiler {
    fn tile_id(&self, lat: f64, lon: f64) -> Result<TileId> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(Error::new(
                ErrorKind::Tiling,
                format!("coordinate ({}, {}) is outside the globe", lat, lon),
            ));
        }
        let row = self.cell(lat + 90.0, self.rows);
        let column = self.cell(lon + 180.0, self.columns);
        Ok(TileId::try_from(row * self.columns + column)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_numbering() {
        let tiler = GridTiler::new(90.0).unwrap();
        assert_eq!(tiler.tile_id(-90.0, -180.0).unwrap(), 0);
        assert_eq!(tiler.tile_id(-45.0, -80.0).unwrap(), 1);
        assert_eq!(tiler.tile_id(10.0, -180.0).unwrap(), 4);
        // Edges of the globe fold into the last row and column.
        assert_eq!(tiler.tile_id(90.0, 180.0).unwrap(), 7);
    }

    #[test]
    fn test_nearby_points_share_a_tile() {
        let tiler = GridTiler::new(1.0).unwrap();
        assert_eq!(
            tiler.tile_id(51.5074, -0.1278).unwrap(),
            tiler.tile_id(51.9, -0.9).unwrap(),
        );
        assert_ne!(
            tiler.tile_id(51.5074, -0.1278).unwrap(),
            tiler.tile_id(51.5074, 0.1278).unwrap(),
        );
    }

    #[test]
    fn test_invalid_input_is_a_tiling_error() {
        assert_eq!(GridTiler::new(0.0).unwrap_err().kind, ErrorKind::Tiling);
        assert_eq!(GridTiler::new(f64::NAN).unwrap_err().kind, ErrorKind::Tiling);
        // Tiny tiles overflow the cell product or the cell count itself.
        for tiny in [1e-3, 1e-8, 1e-300, f64::MIN_POSITIVE] {
            assert_eq!(GridTiler::new(tiny).unwrap_err().kind, ErrorKind::Tiling);
        }
        assert!(GridTiler::new(0.01).is_ok());
        let tiler = GridTiler::new(1.0).unwrap();
        assert_eq!(tiler.tile_id(f64::NAN, 0.0).unwrap_err().kind, ErrorKind::Tiling);
        assert_eq!(tiler.tile_id(0.0, 181.0).unwrap_err().kind, ErrorKind::Tiling);
    }

    #[test]
    fn test_closures_are_oracles() {
        let oracle = |lat: f64, _lon: f64| -> Result<TileId> { Ok(if lat < 0.0 { 1 } else { 2 }) };
        assert_eq!(oracle.tile_id(-1.0, 0.0).unwrap(), 1);
        assert_eq!(oracle.tile_id(1.0, 0.0).unwrap(), 2);
    }
}
