use anyhow::{Context, Result};
use geoelev::download::unzip_single_entry;
use geoelev::{tile_name_for, Grid, TileName};

use super::{coverage, format_size, EngineOptions};

pub fn run(
    options: &EngineOptions,
    tile: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
) -> Result<()> {
    // Determine tile name
    let name: TileName = match (tile, lat, lon) {
        (_, Some(lat), Some(lon)) => tile_name_for(lat, lon),
        (Some(tile), _, _) => tile.parse().context("Failed to parse tile name")?,
        _ => anyhow::bail!("Specify a tile name or both --lat and --lon"),
    };

    let engine = options.build_engine()?;
    let filename = name.archive_filename();

    println!("Tile: {}", name);
    println!("Origin: {}, {}", name.origin_lat(), name.origin_lon());
    println!("Coverage: {}", coverage(&name));
    println!("Archive: {}", filename);

    match engine.resolver().best_url_for(name.as_str()) {
        Some(url) => println!("URL: {}", url.download_url()),
        None => println!("URL: none (no data published for this tile)"),
    }
    println!();

    if !engine.store().contains(&filename) {
        println!("Cached: no");
        return Ok(());
    }

    let archive = engine
        .store()
        .load(&filename)
        .with_context(|| format!("Failed to read {}", filename))?;
    println!("Cached: yes ({})", format_size(archive.len() as u64));

    let contents = unzip_single_entry(&archive).context("Failed to decompress archive")?;
    let grid = Grid::from_bytes(name.as_str(), contents).context("Failed to decode tile")?;
    print_grid_summary(&grid);

    Ok(())
}

fn print_grid_summary(grid: &Grid) {
    let size = grid.square_size();
    let resolution = match size {
        3601 => "SRTM1 (~30m)",
        1201 => "SRTM3 (~90m)",
        _ => "custom",
    };
    println!("Resolution: {} ({}x{} samples)", resolution, size, size);

    let summary = GridSummary::of(grid);
    if let Some((min, max)) = summary.range {
        println!("Min elevation: {}m", min);
        println!("Max elevation: {}m", max);
    }

    if summary.void_count > 0 {
        let void_pct = (summary.void_count as f64 / (size * size) as f64) * 100.0;
        println!("Void samples: {} ({:.1}%)", summary.void_count, void_pct);
    }
}

/// Elevation range and void count over every sample of a grid.
struct GridSummary {
    range: Option<(u16, u16)>,
    void_count: u64,
}

impl GridSummary {
    fn of(grid: &Grid) -> Self {
        let mut range: Option<(u16, u16)> = None;
        let mut void_count = 0;

        for sample in grid.samples() {
            if geoelev::grid::is_void(sample) {
                void_count += 1;
                continue;
            }
            range = Some(match range {
                Some((min, max)) => (min.min(sample), max.max(sample)),
                None => (sample, sample),
            });
        }

        Self { range, void_count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_summary() {
        let samples: [u16; 4] = [120, 0x8000, 3776, 9000];
        let data = samples.iter().flat_map(|v| v.to_be_bytes()).collect();
        let grid = Grid::from_bytes("N35E138", data).unwrap();

        let summary = GridSummary::of(&grid);
        assert_eq!(summary.range, Some((120, 3776)));
        assert_eq!(summary.void_count, 2);
    }

    #[test]
    fn test_grid_summary_all_void() {
        let data = [0xFFu8; 8].to_vec();
        let grid = Grid::from_bytes("N35E138", data).unwrap();

        let summary = GridSummary::of(&grid);
        assert_eq!(summary.range, None);
        assert_eq!(summary.void_count, 4);
    }
}
