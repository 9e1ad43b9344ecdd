//! A single 1° × 1° tile with a lazily loaded grid.
//!
//! A [`Tile`] is created as soon as its name is first seen, but its samples
//! are only fetched and decoded on the first elevation query. Tiles for which
//! no download URL exists are permanently void.

use crate::catalog::TileUrl;
use crate::download::{load_tile_bytes, Fetcher};
use crate::error::Result;
use crate::filename::TileName;
use crate::grid::Grid;
use crate::interpolate;
use crate::storage::ArchiveStore;

/// Load state of a tile's samples.
#[derive(Debug, Clone)]
pub enum TileData {
    /// Not fetched yet, or the last attempt failed.
    Unloaded,
    /// Decoded and validated.
    Loaded(Grid),
}

/// One tile and its (possibly not yet loaded) grid.
#[derive(Debug, Clone)]
pub struct Tile {
    name: TileName,
    download_url: Option<String>,
    data: TileData,
}

impl Tile {
    /// Create an unloaded tile. Without a URL the tile has no data.
    pub fn new(name: TileName, url: Option<TileUrl>) -> Self {
        Self {
            name,
            download_url: url.map(|url| url.download_url()),
            data: TileData::Unloaded,
        }
    }

    /// Elevation at `(lat, lon)` in meters.
    ///
    /// Returns `NaN` without any I/O when the tile has no download URL, and
    /// `NaN` when no valid sample is close enough to estimate a void.
    ///
    /// The grid is loaded through `store`/`fetcher` on first use. If loading
    /// fails the tile stays unloaded and the next call tries again.
    ///
    /// Coordinates outside the tile's cell are clamped to its edges.
    pub fn elevation_at(
        &mut self,
        lat: f64,
        lon: f64,
        store: &dyn ArchiveStore,
        fetcher: &dyn Fetcher,
    ) -> Result<f64> {
        let Some(url) = self.download_url.as_deref() else {
            return Ok(f64::NAN);
        };

        if let TileData::Unloaded = self.data {
            let bytes = load_tile_bytes(self.name.as_str(), url, store, fetcher)?;
            self.data = TileData::Loaded(Grid::from_bytes(self.name.as_str(), bytes)?);
        }

        let TileData::Loaded(grid) = &self.data else {
            return Ok(f64::NAN);
        };

        let (row, col) = self.grid_position(grid.square_size(), lat, lon);
        Ok(interpolate::value_at(grid, row, col))
    }

    /// Row and column for `(lat, lon)`. Row 0 is the north edge.
    fn grid_position(&self, square_size: usize, lat: f64, lon: f64) -> (usize, usize) {
        let last = (square_size - 1) as f64;
        let row = ((f64::from(self.name.origin_lat()) + 1.0 - lat) * last).floor();
        let col = ((lon - f64::from(self.name.origin_lon())) * last).floor();

        // `as` saturates negatives and NaN to 0
        let clamp = |index: f64| (index as usize).min(square_size - 1);
        (clamp(row), clamp(col))
    }

    /// The tile's name and origin.
    pub fn name(&self) -> &TileName {
        &self.name
    }

    /// Full download URL, if the tile is published.
    pub fn download_url(&self) -> Option<&str> {
        self.download_url.as_deref()
    }

    /// Whether the tile has data at all.
    pub fn is_valid(&self) -> bool {
        self.download_url.is_some()
    }

    /// Whether the grid has been decoded.
    pub fn is_loaded(&self) -> bool {
        matches!(self.data, TileData::Loaded(_))
    }

    /// Samples per row/column, once loaded.
    pub fn square_size(&self) -> Option<usize> {
        match &self.data {
            TileData::Loaded(grid) => Some(grid.square_size()),
            TileData::Unloaded => None,
        }
    }

    /// The decoded grid, once loaded.
    pub fn grid(&self) -> Option<&Grid> {
        match &self.data {
            TileData::Loaded(grid) => Some(grid),
            TileData::Unloaded => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ElevationError;
    use crate::filename::tile_name_for;
    use crate::storage::MemoryStore;
    use std::io::{Cursor, Write};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const VOID: u16 = 0x8000;

    struct ZipFetcher {
        archive: Vec<u8>,
        calls: AtomicUsize,
    }

    impl ZipFetcher {
        fn new(archive: Vec<u8>) -> Self {
            Self {
                archive,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Fetcher for ZipFetcher {
        fn get(&self, _url: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.archive.clone())
        }
    }

    fn zip_samples(name: &str, samples: &[u16]) -> Vec<u8> {
        let contents: Vec<u8> = samples.iter().flat_map(|v| v.to_be_bytes()).collect();
        let mut buffer = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buffer));
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated);
            zip.start_file(format!("{}.hgt", name), options).unwrap();
            zip.write_all(&contents).unwrap();
            zip.finish().unwrap();
        }
        buffer
    }

    fn tile_url(name: &str) -> TileUrl {
        TileUrl {
            base_url: "http://srtm.test/SRTM3/".to_string(),
            relative_url: format!("{}.hgt.zip", name),
        }
    }

    /// 3x3 grid, north row first:
    ///
    /// ```text
    /// 100 200 300
    /// 400 VOID 600
    /// 700 800 900
    /// ```
    fn sample_fetcher() -> ZipFetcher {
        ZipFetcher::new(zip_samples(
            "N37W123",
            &[100, 200, 300, 400, VOID, 600, 700, 800, 900],
        ))
    }

    #[test]
    fn test_invalid_tile_is_nan_without_io() {
        let store = MemoryStore::new();
        let fetcher = sample_fetcher();
        let mut tile = Tile::new(tile_name_for(0.5, -150.5), None);

        assert!(!tile.is_valid());
        assert!(tile.elevation_at(0.5, -150.5, &store, &fetcher).unwrap().is_nan());
        assert_eq!(fetcher.calls(), 0);
        assert!(store.is_empty());
        assert!(!tile.is_loaded());
    }

    #[test]
    fn test_lazy_load_happens_once() {
        let store = MemoryStore::new();
        let fetcher = sample_fetcher();
        let mut tile = Tile::new(tile_name_for(37.5, -122.5), Some(tile_url("N37W123")));

        assert!(!tile.is_loaded());
        assert_eq!(tile.square_size(), None);

        tile.elevation_at(37.9, -122.9, &store, &fetcher).unwrap();
        tile.elevation_at(37.1, -122.1, &store, &fetcher).unwrap();

        assert!(tile.is_loaded());
        assert_eq!(tile.square_size(), Some(3));
        assert_eq!(fetcher.calls(), 1);
        assert!(store.contains("N37W123.hgt.zip"));
    }

    #[test]
    fn test_grid_orientation() {
        let store = MemoryStore::new();
        let fetcher = sample_fetcher();
        let mut tile = Tile::new(tile_name_for(37.5, -122.5), Some(tile_url("N37W123")));

        // North-west corner: row 0, col 0
        assert_eq!(tile.elevation_at(38.0, -123.0, &store, &fetcher).unwrap(), 100.0);
        // North-east: row 0, col 2
        assert_eq!(tile.elevation_at(38.0, -122.0, &store, &fetcher).unwrap(), 300.0);
        // South-west: row 2, col 0
        assert_eq!(tile.elevation_at(37.0, -123.0, &store, &fetcher).unwrap(), 700.0);
        // row = floor(0.75 * 2) = 1, col = floor(0.25 * 2) = 0
        assert_eq!(tile.elevation_at(37.25, -122.75, &store, &fetcher).unwrap(), 400.0);
    }

    #[test]
    fn test_void_center_is_interpolated() {
        let store = MemoryStore::new();
        let fetcher = sample_fetcher();
        let mut tile = Tile::new(tile_name_for(37.5, -122.5), Some(tile_url("N37W123")));

        // row = floor(0.5 * 2) = 1, col = floor(0.5 * 2) = 1
        // vertical (200 + 800) / 2 = 500, horizontal (400 + 600) / 2 = 500
        assert_eq!(tile.elevation_at(37.5, -122.5, &store, &fetcher).unwrap(), 500.0);
    }

    #[test]
    fn test_out_of_cell_coordinates_are_clamped() {
        let store = MemoryStore::new();
        let fetcher = sample_fetcher();
        let mut tile = Tile::new(tile_name_for(37.5, -122.5), Some(tile_url("N37W123")));

        assert_eq!(tile.elevation_at(40.0, -130.0, &store, &fetcher).unwrap(), 100.0);
        assert_eq!(tile.elevation_at(30.0, -100.0, &store, &fetcher).unwrap(), 900.0);
    }

    #[test]
    fn test_bad_size_stays_unloaded() {
        let store = MemoryStore::new();
        let fetcher = ZipFetcher::new(zip_samples("N37W123", &[1, 2, 3]));
        let mut tile = Tile::new(tile_name_for(37.5, -122.5), Some(tile_url("N37W123")));

        let result = tile.elevation_at(37.5, -122.5, &store, &fetcher);
        assert!(matches!(
            result,
            Err(ElevationError::InvalidTileSize { len: 6, .. })
        ));
        assert!(!tile.is_loaded());

        // Retried from the store; the archive is not downloaded again.
        assert!(tile.elevation_at(37.5, -122.5, &store, &fetcher).is_err());
        assert_eq!(fetcher.calls(), 1);
    }

    #[test]
    fn test_corrupt_archive_reports_size_error() {
        let store = MemoryStore::new();
        let fetcher = ZipFetcher::new(b"not a zip archive".to_vec());
        let mut tile = Tile::new(tile_name_for(37.5, -122.5), Some(tile_url("N37W123")));

        let result = tile.elevation_at(37.5, -122.5, &store, &fetcher);
        assert!(matches!(
            result,
            Err(ElevationError::InvalidTileSize { len: 0, .. })
        ));
    }

    #[test]
    fn test_accessors() {
        let tile = Tile::new(tile_name_for(37.5, -122.5), Some(tile_url("N37W123")));
        assert_eq!(tile.name().as_str(), "N37W123");
        assert_eq!(
            tile.download_url(),
            Some("http://srtm.test/SRTM3/N37W123.hgt.zip")
        );
        assert!(tile.grid().is_none());
    }
}
