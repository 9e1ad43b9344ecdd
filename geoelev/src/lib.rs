//! # geoelev - SRTM Elevation Lookups
//!
//! Query ground elevation anywhere SRTM data is published. Tile archives are
//! downloaded on first use, kept in a local cache directory, and decoded
//! lazily in memory.
//!
//! ## Features
//!
//! - **On Demand**: A tile is only fetched when a coordinate inside it is queried
//! - **Cached**: Archives are downloaded once and reused across runs
//! - **Best Resolution**: SRTM1 (~30m) is preferred over SRTM3 (~90m)
//! - **Void Filling**: Missing samples are estimated from their nearest neighbours
//!
//! ## Quick Start
//!
//! ```ignore
//! use geoelev::ElevationEngineBuilder;
//!
//! let mut engine = ElevationEngineBuilder::new()
//!     .cache_dir("/data/srtm")
//!     .build()?;
//!
//! let elevation = engine.elevation_at(27.9881, 86.9250)?;
//! println!("Elevation: {}m", elevation);
//! ```
//!
//! ## SRTM Data Format
//!
//! A tile covers 1° × 1° and is named after its southwest corner
//! (`N37W123`). Its contents are a square grid of 16-bit big-endian samples,
//! north row first:
//!
//! - **SRTM1**: 3601×3601 samples, 1 arc-second resolution
//! - **SRTM3**: 1201×1201 samples, 3 arc-second resolution
//!
//! Samples of 9000 and above are void. Lookups that land on a void sample are
//! interpolated; lookups with nothing to interpolate from return `NaN`.

pub mod catalog;
pub mod download;
pub mod engine;
pub mod error;
pub mod filename;
pub mod grid;
pub mod interpolate;
pub mod storage;
pub mod tile;

// Re-export main types at crate root for convenience
pub use catalog::{SrtmCatalog, TileUrl, TileUrlResolver};
pub use download::{DownloadConfig, Fetcher, HttpFetcher};
pub use engine::{CacheStats, ElevationEngine, ElevationEngineBuilder};
pub use error::{ElevationError, Result};
pub use filename::{tile_name_for, TileName};
pub use grid::{Grid, VOID_THRESHOLD};
pub use storage::{ArchiveStore, LocalFileStore, MemoryStore};
pub use tile::Tile;
