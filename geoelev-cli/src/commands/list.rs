use anyhow::{Context, Result};
use geoelev::{LocalFileStore, TileName};
use std::fs;

use super::{coverage, format_size, EngineOptions};

pub fn run(options: &EngineOptions) -> Result<()> {
    let dir = options.cache_dir();

    if !dir.exists() {
        anyhow::bail!("Cache directory does not exist: {}", dir.display());
    }

    let store = LocalFileStore::new(&dir).context("Failed to open cache directory")?;
    let archives = store.list().context("Failed to read cache directory")?;

    if archives.is_empty() {
        println!("No .hgt.zip archives found in: {}", dir.display());
        return Ok(());
    }

    let mut total_size: u64 = 0;

    println!("{:<18} {:>12} {:>28}", "ARCHIVE", "SIZE", "COVERAGE");
    println!("{}", "-".repeat(60));

    for filename in &archives {
        let size = fs::metadata(store.dir().join(filename))
            .map(|m| m.len())
            .unwrap_or(0);
        total_size += size;

        // Parse coverage from filename
        let extent = filename
            .parse::<TileName>()
            .map(|name| coverage(&name))
            .unwrap_or_else(|_| "Unknown".to_string());

        println!(
            "{:<18} {:>12} {:>28}",
            filename,
            format_size(size),
            extent
        );
    }

    // Summary
    println!();
    println!("Summary:");
    println!("  Total archives: {}", archives.len());
    println!("  Total size: {}", format_size(total_size));
    println!("  Cache directory: {}", dir.display());

    Ok(())
}
