use anyhow::{Context, Result};
use geoelev::{ElevationEngine, ElevationEngineBuilder, LocalFileStore, TileName};
use std::path::PathBuf;

pub mod batch;
pub mod info;
pub mod list;
pub mod query;

/// Engine settings shared by all subcommands.
pub struct EngineOptions {
    pub cache_dir: Option<PathBuf>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl EngineOptions {
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(LocalFileStore::default_dir)
    }

    pub fn build_engine(&self) -> Result<ElevationEngine> {
        ElevationEngineBuilder::new()
            .cache_dir(self.cache_dir())
            .base_url(&self.base_url)
            .timeout_secs(self.timeout_secs)
            .build()
            .context("Failed to create elevation engine")
    }
}

/// Human-readable extent of a tile, e.g. `N37 to N38, W123 to W122`.
pub fn coverage(name: &TileName) -> String {
    let lat = name.origin_lat();
    let lon = name.origin_lon();
    let lat_label = |v: i32| format!("{}{:02}", if v >= 0 { "N" } else { "S" }, v.abs());
    let lon_label = |v: i32| format!("{}{:03}", if v >= 0 { "E" } else { "W" }, v.abs());

    format!(
        "{} to {}, {} to {}",
        lat_label(lat),
        lat_label(lat + 1),
        lon_label(lon),
        lon_label(lon + 1)
    )
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
