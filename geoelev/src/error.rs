//! Error types for the geoelev library.

use thiserror::Error;

/// Errors that can occur while resolving an elevation.
///
/// A coordinate that falls in a tile nobody publishes (open ocean, for
/// example) is *not* an error: it resolves to `NaN`.
#[derive(Error, Debug)]
pub enum ElevationError {
    /// Local IO error outside of the archive store (e.g. creating the cache directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive store failed for a reason other than "not found".
    #[error("Archive store error for {filename}: {source}")]
    Storage {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    /// Transport-level HTTP failure, including timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered, but not with the archive.
    #[error("Download failed for {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    /// The archive could not be decompressed.
    #[error("Failed to decompress archive: {reason}")]
    Decompress { reason: String },

    /// Decoded tile contents are not a square grid of 2-byte samples.
    #[error("Invalid size for tile {name}: {len} bytes")]
    InvalidTileSize { name: String, len: usize },

    /// String is not a tile name like `N37W123`.
    #[error("Invalid tile name: {0}")]
    InvalidTileName(String),

    /// The tile catalog could not be read or written.
    #[error("Catalog error: {0}")]
    Catalog(String),
}

/// Result type alias using [`ElevationError`].
pub type Result<T> = std::result::Result<T, ElevationError>;
