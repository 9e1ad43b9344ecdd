//! Tile download and the fetch/decode pipeline.
//!
//! Archives are looked up in the [`ArchiveStore`] first. Only when the store
//! reports the archive as absent is it fetched over the network, and the
//! fetched bytes are persisted before use. There is exactly one attempt: no
//! retries, no backoff.

use std::io::{Cursor, Read};
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::error::{ElevationError, Result};
use crate::filename::archive_filename;
use crate::storage::ArchiveStore;

/// Default timeout for HTTP requests in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Fetches raw bytes for a URL.
pub trait Fetcher: Send {
    /// Fetch `url`, single attempt.
    fn get(&self, url: &str) -> Result<Vec<u8>>;
}

/// Configuration for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: concat!("geoelev/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl DownloadConfig {
    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the `User-Agent` header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Blocking HTTP fetcher.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: DownloadConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent)
            .build()?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send()?;

        if !response.status().is_success() {
            return Err(ElevationError::DownloadFailed {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        Ok(response.bytes()?.to_vec())
    }
}

/// Load the raw sample bytes of tile `name`.
///
/// Reads `{name}.hgt.zip` from `store`, or downloads it from `url` and saves
/// it under that filename when the store does not have it. The archive is
/// then decompressed.
///
/// A decompression failure is logged and yields empty contents; it is
/// reported as [`ElevationError::InvalidTileSize`] once the grid is validated.
///
/// # Errors
///
/// Store errors other than "not found", network errors and failures to
/// persist the download are returned unchanged.
pub fn load_tile_bytes(
    name: &str,
    url: &str,
    store: &dyn ArchiveStore,
    fetcher: &dyn Fetcher,
) -> Result<Vec<u8>> {
    let filename = archive_filename(name);

    let archive = match store.load(&filename) {
        Ok(bytes) => {
            debug!(%filename, bytes = bytes.len(), "archive found in store");
            bytes
        }
        Err(err) if store.is_not_found(&err) => {
            info!(%filename, %url, "archive not in store, downloading");
            let bytes = fetcher.get(url)?;
            store
                .save(&filename, &bytes)
                .map_err(|source| ElevationError::Storage {
                    filename: filename.clone(),
                    source,
                })?;
            info!(%filename, bytes = bytes.len(), "archive saved to store");
            bytes
        }
        Err(source) => return Err(ElevationError::Storage { filename, source }),
    };

    let contents = match unzip_single_entry(&archive) {
        Ok(contents) => contents,
        Err(err) => {
            warn!(%filename, error = %err, "failed to decompress archive");
            Vec::new()
        }
    };
    debug!(%filename, bytes = contents.len(), "tile contents loaded");

    Ok(contents)
}

/// Decompress a single-entry archive.
///
/// Prefers the first entry whose name ends in `.hgt` (case-insensitive) and
/// falls back to the first file entry.
pub fn unzip_single_entry(data: &[u8]) -> Result<Vec<u8>> {
    let decompress_err = |reason: String| ElevationError::Decompress { reason };

    let mut archive = ZipArchive::new(Cursor::new(data))
        .map_err(|e| decompress_err(format!("Failed to read ZIP archive: {}", e)))?;

    let mut fallback = None;
    let mut chosen = None;
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| decompress_err(format!("Failed to read ZIP entry: {}", e)))?;

        if entry.is_dir() {
            continue;
        }
        if entry.name().to_lowercase().ends_with(".hgt") {
            chosen = Some(i);
            break;
        }
        fallback.get_or_insert(i);
    }

    let index = chosen
        .or(fallback)
        .ok_or_else(|| decompress_err("ZIP archive has no file entries".to_string()))?;

    let mut entry = archive
        .by_index(index)
        .map_err(|e| decompress_err(format!("Failed to read ZIP entry: {}", e)))?;
    let mut contents = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut contents)
        .map_err(|e| decompress_err(format!("Failed to extract ZIP entry: {}", e)))?;

    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::io::{self, Write};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buffer));
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated);
            for (name, data) in entries {
                zip.start_file(*name, options).unwrap();
                zip.write_all(data).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer
    }

    struct CountingFetcher {
        body: Vec<u8>,
        calls: AtomicUsize,
    }

    impl CountingFetcher {
        fn new(body: Vec<u8>) -> Self {
            Self {
                body,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Fetcher for CountingFetcher {
        fn get(&self, _url: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.clone())
        }
    }

    struct FailingFetcher;

    impl Fetcher for FailingFetcher {
        fn get(&self, url: &str) -> Result<Vec<u8>> {
            Err(ElevationError::DownloadFailed {
                url: url.to_string(),
                reason: "HTTP 503 Service Unavailable".to_string(),
            })
        }
    }

    /// Store whose loads fail with a non-"not found" error.
    struct BrokenStore;

    impl ArchiveStore for BrokenStore {
        fn load(&self, _filename: &str) -> io::Result<Vec<u8>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }

        fn save(&self, _filename: &str, _bytes: &[u8]) -> io::Result<()> {
            Ok(())
        }

        fn contains(&self, _filename: &str) -> bool {
            false
        }
    }

    /// Store that never has anything and cannot be written.
    struct ReadOnlyEmptyStore;

    impl ArchiveStore for ReadOnlyEmptyStore {
        fn load(&self, filename: &str) -> io::Result<Vec<u8>> {
            Err(io::Error::new(io::ErrorKind::NotFound, filename.to_string()))
        }

        fn save(&self, _filename: &str, _bytes: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "read-only"))
        }

        fn contains(&self, _filename: &str) -> bool {
            false
        }
    }

    #[test]
    fn test_unzip_prefers_hgt_entry() {
        let data = zip_with(&[
            ("readme.txt", &b"hello"[..]),
            ("N37W123.HGT", &[1, 2, 3, 4][..]),
        ]);
        assert_eq!(unzip_single_entry(&data).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_unzip_falls_back_to_first_entry() {
        let data = zip_with(&[("tile.bin", &[9, 9][..])]);
        assert_eq!(unzip_single_entry(&data).unwrap(), vec![9, 9]);
    }

    #[test]
    fn test_unzip_rejects_garbage() {
        let result = unzip_single_entry(b"definitely not a zip");
        assert!(matches!(result, Err(ElevationError::Decompress { .. })));
    }

    #[test]
    fn test_unzip_empty_archive() {
        let data = zip_with(&[]);
        assert!(matches!(
            unzip_single_entry(&data),
            Err(ElevationError::Decompress { .. })
        ));
    }

    #[test]
    fn test_load_downloads_and_persists_on_miss() {
        let archive = zip_with(&[("N37W123.hgt", &[0, 1, 0, 2][..])]);
        let store = MemoryStore::new();
        let fetcher = CountingFetcher::new(archive.clone());

        let contents =
            load_tile_bytes("N37W123", "http://x/N37W123.hgt.zip", &store, &fetcher).unwrap();

        assert_eq!(contents, vec![0, 1, 0, 2]);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.load("N37W123.hgt.zip").unwrap(), archive);
    }

    #[test]
    fn test_load_uses_store_when_present() {
        let store = MemoryStore::new();
        store
            .save("N37W123.hgt.zip", &zip_with(&[("N37W123.hgt", &[0, 5][..])]))
            .unwrap();
        let fetcher = CountingFetcher::new(Vec::new());

        let contents =
            load_tile_bytes("N37W123", "http://x/N37W123.hgt.zip", &store, &fetcher).unwrap();

        assert_eq!(contents, vec![0, 5]);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_load_propagates_network_error() {
        let store = MemoryStore::new();
        let result = load_tile_bytes("N37W123", "http://x/a.zip", &store, &FailingFetcher);

        assert!(matches!(result, Err(ElevationError::DownloadFailed { .. })));
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_propagates_store_error() {
        let fetcher = CountingFetcher::new(Vec::new());
        let result = load_tile_bytes("N37W123", "http://x/a.zip", &BrokenStore, &fetcher);

        match result {
            Err(ElevationError::Storage { filename, .. }) => {
                assert_eq!(filename, "N37W123.hgt.zip")
            }
            _ => panic!("Expected Storage error"),
        }
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_load_fails_when_persisting_fails() {
        let fetcher = CountingFetcher::new(zip_with(&[("N37W123.hgt", &[0, 1][..])]));
        let result = load_tile_bytes("N37W123", "http://x/a.zip", &ReadOnlyEmptyStore, &fetcher);

        assert!(matches!(result, Err(ElevationError::Storage { .. })));
    }

    #[test]
    fn test_load_bad_archive_yields_empty_contents() {
        let store = MemoryStore::new();
        let fetcher = CountingFetcher::new(b"not a zip".to_vec());

        let contents = load_tile_bytes("N37W123", "http://x/a.zip", &store, &fetcher).unwrap();
        assert!(contents.is_empty());
        // The download is still persisted as fetched.
        assert!(store.contains("N37W123.hgt.zip"));
    }

    #[test]
    fn test_download_config_builder() {
        let config = DownloadConfig::default()
            .with_timeout(60)
            .with_user_agent("test-agent");

        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(DownloadConfig::default().timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_http_fetcher_builds() {
        assert!(HttpFetcher::new(DownloadConfig::default()).is_ok());
    }
}
