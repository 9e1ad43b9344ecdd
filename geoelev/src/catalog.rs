//! Tile catalog: which tile names are published, and where.
//!
//! SRTM archives are published in two resolution tiers, each as a plain
//! directory listing:
//!
//! - **SRTM1**: 1 arc-second (~30m), 3601 × 3601 samples
//! - **SRTM3**: 3 arc-second (~90m), 1201 × 1201 samples
//!
//! [`SrtmCatalog::crawl`] walks both listings once and records every
//! `*.hgt.zip` link it finds. Lookups prefer SRTM1 when a tile exists in both
//! tiers. Tiles that appear in neither (open ocean, polar regions) resolve to
//! no URL at all.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::download::Fetcher;
use crate::error::{ElevationError, Result};
use crate::storage::ArchiveStore;

/// Default server hosting the SRTM1 and SRTM3 listings.
pub const DEFAULT_BASE_URL: &str = "http://srtm.kurviger.de";

/// Store key under which the catalog crawled from `base_url` is cached.
///
/// The scheme is dropped and every character other than ASCII alphanumerics,
/// `.` and `-` becomes `-`.
///
/// ```
/// use geoelev::catalog::catalog_filename;
///
/// assert_eq!(catalog_filename("http://srtm.kurviger.de"), "srtm-srtm.kurviger.de.json");
/// assert_eq!(catalog_filename("https://mirror.test:8080/dem/"), "srtm-mirror.test-8080-dem.json");
/// ```
pub fn catalog_filename(base_url: &str) -> String {
    let server = base_url
        .split_once("://")
        .map_or(base_url, |(_, rest)| rest)
        .trim_matches('/');
    let key: String = server
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("srtm-{}.json", key)
}

const SRTM1_DIR: &str = "SRTM1";
const SRTM3_DIR: &str = "SRTM3";

/// Listings are followed at most this many levels deep (root included).
const MAX_CRAWL_DEPTH: usize = 2;

/// Download location of a tile archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileUrl {
    /// Root of the tier listing, ending in `/`.
    pub base_url: String,
    /// Path of the archive below `base_url`.
    pub relative_url: String,
}

impl TileUrl {
    /// Full URL of the archive. `.zip` is appended if missing.
    pub fn download_url(&self) -> String {
        let mut url = format!("{}{}", self.base_url, self.relative_url);
        if !url.ends_with(".zip") {
            url.push_str(".zip");
        }
        url
    }
}

/// Maps a tile name to the URL of its best available archive.
pub trait TileUrlResolver: Send {
    /// URL of the highest resolution archive for `name`, if any tier has it.
    fn best_url_for(&self, name: &str) -> Option<TileUrl>;
}

/// Tile names and archive paths of both SRTM tiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrtmCatalog {
    pub srtm1_base_url: String,
    pub srtm1: BTreeMap<String, String>,
    pub srtm3_base_url: String,
    pub srtm3: BTreeMap<String, String>,
}

impl SrtmCatalog {
    /// Empty catalog for the tiers published under `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self {
            srtm1_base_url: tier_url(base_url, SRTM1_DIR),
            srtm3_base_url: tier_url(base_url, SRTM3_DIR),
            ..Default::default()
        }
    }

    /// Record an SRTM1 archive.
    pub fn insert_srtm1(&mut self, name: impl Into<String>, relative_url: impl Into<String>) {
        self.srtm1.insert(name.into(), relative_url.into());
    }

    /// Record an SRTM3 archive.
    pub fn insert_srtm3(&mut self, name: impl Into<String>, relative_url: impl Into<String>) {
        self.srtm3.insert(name.into(), relative_url.into());
    }

    /// Number of distinct tile names across both tiers.
    pub fn len(&self) -> usize {
        self.srtm1.len()
            + self
                .srtm3
                .keys()
                .filter(|name| !self.srtm1.contains_key(*name))
                .count()
    }

    /// True when neither tier lists any archive.
    pub fn is_empty(&self) -> bool {
        self.srtm1.is_empty() && self.srtm3.is_empty()
    }

    /// Crawl the SRTM1 and SRTM3 listings under `base_url`.
    ///
    /// # Errors
    ///
    /// Any failed page fetch aborts the crawl.
    pub fn crawl(fetcher: &dyn Fetcher, base_url: &str) -> Result<Self> {
        let mut catalog = Self::new(base_url);

        info!(url = %catalog.srtm1_base_url, "crawling SRTM1 listing");
        harvest(fetcher, &catalog.srtm1_base_url, "", 0, &mut catalog.srtm1)?;

        info!(url = %catalog.srtm3_base_url, "crawling SRTM3 listing");
        harvest(fetcher, &catalog.srtm3_base_url, "", 0, &mut catalog.srtm3)?;

        info!(
            srtm1 = catalog.srtm1.len(),
            srtm3 = catalog.srtm3.len(),
            "catalog crawled"
        );
        Ok(catalog)
    }

    /// Read the catalog cached in `store`, or crawl `base_url` and cache it.
    ///
    /// Each server gets its own store entry (see [`catalog_filename`]), so a
    /// cached catalog is never overwritten.
    pub fn load_or_crawl(
        fetcher: &dyn Fetcher,
        store: &dyn ArchiveStore,
        base_url: &str,
    ) -> Result<Self> {
        let filename = catalog_filename(base_url);
        match store.load(&filename) {
            Ok(bytes) => {
                let catalog: Self = serde_json::from_slice(&bytes).map_err(|e| {
                    ElevationError::Catalog(format!("{} is not valid: {}", filename, e))
                })?;
                if catalog.srtm1_base_url == tier_url(base_url, SRTM1_DIR) {
                    debug!(%filename, tiles = catalog.len(), "using cached catalog");
                    return Ok(catalog);
                }
                // Two URLs that sanitize to the same key; keep the stored entry.
                info!(
                    %filename,
                    cached = %catalog.srtm1_base_url,
                    "cached catalog is for another server, crawling without caching"
                );
                return Self::crawl(fetcher, base_url);
            }
            Err(err) if store.is_not_found(&err) => {}
            Err(source) => return Err(ElevationError::Storage { filename, source }),
        }

        let catalog = Self::crawl(fetcher, base_url)?;
        let json = serde_json::to_vec(&catalog)
            .map_err(|e| ElevationError::Catalog(format!("Failed to serialize catalog: {}", e)))?;
        store
            .save(&filename, &json)
            .map_err(|source| ElevationError::Storage { filename, source })?;

        Ok(catalog)
    }
}

impl TileUrlResolver for SrtmCatalog {
    fn best_url_for(&self, name: &str) -> Option<TileUrl> {
        let (base_url, relative_url) = self
            .srtm1
            .get(name)
            .map(|rel| (&self.srtm1_base_url, rel))
            .or_else(|| self.srtm3.get(name).map(|rel| (&self.srtm3_base_url, rel)))?;

        Some(TileUrl {
            base_url: base_url.clone(),
            relative_url: relative_url.clone(),
        })
    }
}

fn tier_url(base_url: &str, tier: &str) -> String {
    format!("{}/{}/", base_url.trim_end_matches('/'), tier)
}

/// Collect archive links from the listing at `tier_base + dir`, following
/// subdirectory links until `MAX_CRAWL_DEPTH`.
fn harvest(
    fetcher: &dyn Fetcher,
    tier_base: &str,
    dir: &str,
    depth: usize,
    out: &mut BTreeMap<String, String>,
) -> Result<()> {
    if depth >= MAX_CRAWL_DEPTH {
        return Ok(());
    }

    let page = fetcher.get(&format!("{}{}", tier_base, dir))?;
    let html = String::from_utf8_lossy(&page);

    for link in extract_links(&html) {
        let link = link.strip_suffix("/index.html").unwrap_or(&link);
        let lower = link.to_lowercase();
        if !is_relative(&lower) {
            continue;
        }

        if lower.ends_with(".hgt.zip") {
            let file = link.rsplit('/').next().unwrap_or(link);
            let name = file[..file.len() - ".hgt.zip".len()].to_ascii_uppercase();
            debug!(%name, path = %format!("{}{}", dir, link), "found archive");
            out.insert(name, format!("{}{}", dir, link));
        } else if !lower.ends_with(".jpg") {
            let subdir = format!("{}{}/", dir, link.trim_end_matches('/'));
            harvest(fetcher, tier_base, &subdir, depth + 1, out)?;
        }
    }

    Ok(())
}

/// Links that stay below the current listing.
fn is_relative(lower: &str) -> bool {
    !lower.is_empty()
        && !lower.starts_with(['/', '.', '?', '#'])
        && !lower.starts_with("http")
        && !lower.starts_with("mailto:")
}

/// Matches a whole `href` attribute and captures its double-quoted,
/// single-quoted or bare value.
fn href_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // The attribute name must follow `<` or whitespace, so `data-href`
        // and `xhref` never match.
        Regex::new(r#"(?i)(?:^|[\s<])href\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
            .expect("Valid regex")
    })
}

/// Values of all `href` attributes in an HTML document, in order.
/// Empty values are dropped.
pub fn extract_links(html: &str) -> Vec<String> {
    href_pattern()
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .map(|value| value.as_str().trim())
        .filter(|link| !link.is_empty())
        .map(str::to_string)
        .collect()
}
