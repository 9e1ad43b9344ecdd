//! Elevation lookups over the whole globe.
//!
//! [`ElevationEngine`] turns a coordinate into a tile name, keeps one
//! [`Tile`] per name for its whole lifetime, and lets the tile fetch, decode
//! and interpolate on demand.
//!
//! The engine is not internally synchronized. Every lookup takes `&mut self`;
//! share one engine between threads behind a `Mutex`, or give each worker
//! its own.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::catalog::{SrtmCatalog, TileUrlResolver, DEFAULT_BASE_URL};
use crate::download::{DownloadConfig, Fetcher, HttpFetcher, DEFAULT_TIMEOUT_SECS};
use crate::error::Result;
use crate::filename::tile_name_for;
use crate::storage::{ArchiveStore, LocalFileStore};
use crate::tile::Tile;

/// Environment variable overriding the archive cache directory.
pub const ENV_CACHE_DIR: &str = "GEOELEV_CACHE_DIR";
/// Environment variable overriding the server base URL.
pub const ENV_BASE_URL: &str = "GEOELEV_BASE_URL";
/// Environment variable overriding the HTTP timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "GEOELEV_TIMEOUT_SECS";

/// Statistics about the engine's tile cache.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of tiles known to the engine.
    pub tile_count: usize,
    /// Lookups that found their tile already cached.
    pub hit_count: u64,
    /// Lookups that had to create their tile.
    pub miss_count: u64,
    /// Cached tiles for which no archive is published.
    pub no_data_tiles: usize,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// Resolves elevations, downloading and caching tiles as needed.
///
/// # Example
///
/// ```ignore
/// use geoelev::ElevationEngineBuilder;
///
/// let mut engine = ElevationEngineBuilder::from_env().build()?;
///
/// // First lookup in a tile downloads its archive
/// let elevation = engine.elevation_at(46.5197, 6.6323)?; // Lausanne
/// if elevation.is_nan() {
///     println!("no data");
/// } else {
///     println!("Elevation: {}m", elevation);
/// }
///
/// // Same tile: served from memory
/// let elevation2 = engine.elevation_at(46.5, 6.6)?;
/// ```
pub struct ElevationEngine {
    resolver: Box<dyn TileUrlResolver>,
    store: Box<dyn ArchiveStore>,
    fetcher: Box<dyn Fetcher>,
    /// Append-only; a tile is never replaced once inserted.
    tiles: HashMap<String, Tile>,
    hit_count: u64,
    miss_count: u64,
}

impl ElevationEngine {
    /// Create an engine from its collaborators, with an empty tile cache.
    pub fn new(
        resolver: Box<dyn TileUrlResolver>,
        store: Box<dyn ArchiveStore>,
        fetcher: Box<dyn Fetcher>,
    ) -> Self {
        Self {
            resolver,
            store,
            fetcher,
            tiles: HashMap::new(),
            hit_count: 0,
            miss_count: 0,
        }
    }

    /// Create a builder with default settings.
    pub fn builder() -> ElevationEngineBuilder {
        ElevationEngineBuilder::new()
    }

    /// Elevation in meters at `(lat, lon)`.
    ///
    /// The resolver is consulted only the first time a tile name is seen.
    ///
    /// # Returns
    ///
    /// - `Ok(elevation)` - measured or interpolated elevation
    /// - `Ok(NaN)` - no archive is published for the tile, or no valid
    ///   sample is close enough to fill a void
    /// - `Err(...)` - store, network or format failure
    pub fn elevation_at(&mut self, lat: f64, lon: f64) -> Result<f64> {
        let name = tile_name_for(lat, lon);

        let tile = match self.tiles.entry(name.as_str().to_string()) {
            Entry::Occupied(entry) => {
                self.hit_count += 1;
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                self.miss_count += 1;
                let url = self.resolver.best_url_for(name.as_str());
                if url.is_none() {
                    debug!(tile = %name, "no archive published for tile");
                }
                entry.insert(Tile::new(name, url))
            }
        };

        tile.elevation_at(lat, lon, self.store.as_ref(), self.fetcher.as_ref())
    }

    /// Elevations for several coordinates, in order.
    ///
    /// The first failing lookup aborts the batch.
    pub fn elevations_batch(&mut self, coords: &[(f64, f64)]) -> Result<Vec<f64>> {
        coords
            .iter()
            .map(|&(lat, lon)| self.elevation_at(lat, lon))
            .collect()
    }

    /// Get cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            tile_count: self.tiles.len(),
            hit_count: self.hit_count,
            miss_count: self.miss_count,
            no_data_tiles: self.tiles.values().filter(|t| !t.is_valid()).count(),
        }
    }

    /// A cached tile, if a lookup has already created it.
    pub fn tile(&self, name: &str) -> Option<&Tile> {
        self.tiles.get(name)
    }

    /// The resolver consulted for new tiles.
    pub fn resolver(&self) -> &dyn TileUrlResolver {
        self.resolver.as_ref()
    }

    /// The store holding downloaded archives.
    pub fn store(&self) -> &dyn ArchiveStore {
        self.store.as_ref()
    }
}

/// Builder for [`ElevationEngine`].
///
/// Collaborators that are not set explicitly are created by [`Self::build`]:
/// a [`LocalFileStore`] in the cache directory, an [`HttpFetcher`] with the
/// configured timeout, and an [`SrtmCatalog`] read from the store or crawled
/// from the base URL.
pub struct ElevationEngineBuilder {
    cache_dir: PathBuf,
    base_url: String,
    timeout_secs: u64,
    resolver: Option<Box<dyn TileUrlResolver>>,
    store: Option<Box<dyn ArchiveStore>>,
    fetcher: Option<Box<dyn Fetcher>>,
}

impl Default for ElevationEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ElevationEngineBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self {
            cache_dir: LocalFileStore::default_dir(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            resolver: None,
            store: None,
            fetcher: None,
        }
    }

    /// Create a builder configured from environment variables.
    ///
    /// # Environment Variables
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `GEOELEV_CACHE_DIR` | Directory for downloaded archives | `$HOME/.geoelev` |
    /// | `GEOELEV_BASE_URL` | Server publishing `SRTM1/` and `SRTM3/` | `http://srtm.kurviger.de` |
    /// | `GEOELEV_TIMEOUT_SECS` | HTTP request timeout | 300 |
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let mut builder = Self::new();

        if let Ok(dir) = std::env::var(ENV_CACHE_DIR) {
            builder.cache_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            builder.base_url = url;
        }
        if let Some(secs) = std::env::var(ENV_TIMEOUT_SECS)
            .ok()
            .and_then(|s| s.parse().ok())
        {
            builder.timeout_secs = secs;
        }

        builder
    }

    /// Set the directory for downloaded archives and the cached catalog.
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = path.as_ref().to_path_buf();
        self
    }

    /// Set the server publishing the `SRTM1/` and `SRTM3/` listings.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the HTTP request timeout.
    ///
    /// Default is 300 seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Use `resolver` instead of the cached or crawled catalog.
    pub fn resolver(mut self, resolver: Box<dyn TileUrlResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Use `store` instead of a [`LocalFileStore`] in the cache directory.
    pub fn store(mut self, store: Box<dyn ArchiveStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use `fetcher` instead of an [`HttpFetcher`].
    pub fn fetcher(mut self, fetcher: Box<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Build the [`ElevationEngine`].
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created, the HTTP
    /// client cannot be initialized, or the catalog can be neither read nor
    /// crawled.
    pub fn build(self) -> Result<ElevationEngine> {
        let store: Box<dyn ArchiveStore> = match self.store {
            Some(store) => store,
            None => Box::new(LocalFileStore::new(&self.cache_dir)?),
        };

        let fetcher: Box<dyn Fetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Box::new(HttpFetcher::new(
                DownloadConfig::default().with_timeout(self.timeout_secs),
            )?),
        };

        let resolver: Box<dyn TileUrlResolver> = match self.resolver {
            Some(resolver) => resolver,
            None => Box::new(SrtmCatalog::load_or_crawl(
                fetcher.as_ref(),
                store.as_ref(),
                &self.base_url,
            )?),
        };

        Ok(ElevationEngine::new(resolver, store, fetcher))
    }
}
