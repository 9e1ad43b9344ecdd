//! Basic example demonstrating geoelev library usage.
//!
//! Run with: cargo run --example basic -- [/path/to/cache/dir]
//!
//! The first run crawls the tile catalog and downloads one archive per peak.

use geoelev::{ElevationEngineBuilder, ElevationError};
use std::env;

fn main() -> Result<(), ElevationError> {
    let mut builder = ElevationEngineBuilder::from_env();
    if let Some(dir) = env::args().nth(1) {
        builder = builder.cache_dir(dir);
    }
    let mut engine = builder.build()?;

    // Query some famous peaks
    let locations = [
        ("Mount Fuji, Japan", 35.3606, 138.7274),
        ("Mount Everest, Nepal", 27.9881, 86.9250),
        ("Denali, Alaska", 63.0695, -151.0074),
        ("Pacific Ocean", 0.5, -150.5),
    ];

    println!("Elevation queries:");
    println!("{:-<50}", "");

    for (name, lat, lon) in &locations {
        match engine.elevation_at(*lat, *lon) {
            Ok(elevation) if elevation.is_nan() => {
                println!("{}: no data", name);
            }
            Ok(elevation) => {
                println!("{}: {:.0}m", name, elevation);
            }
            Err(e) => {
                println!("{}: error - {}", name, e);
            }
        }
    }

    // Show cache statistics
    let stats = engine.cache_stats();
    println!("\nCache statistics:");
    println!("  Cached tiles: {}", stats.tile_count);
    println!("  No-data tiles: {}", stats.no_data_tiles);
    println!("  Hits: {}", stats.hit_count);
    println!("  Misses: {}", stats.miss_count);
    println!("  Hit rate: {:.1}%", stats.hit_rate() * 100.0);

    Ok(())
}
