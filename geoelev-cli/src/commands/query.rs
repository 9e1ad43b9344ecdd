use anyhow::{Context, Result};
use geoelev::tile_name_for;
use serde::Serialize;

use super::EngineOptions;

#[derive(Serialize)]
struct ElevationResponse {
    lat: f64,
    lon: f64,
    /// `null` when there is no data
    elevation: Option<f64>,
    tile: String,
}

pub fn run(options: &EngineOptions, lat: f64, lon: f64, json: bool) -> Result<()> {
    let mut engine = options.build_engine()?;

    let elevation = engine
        .elevation_at(lat, lon)
        .context("Failed to get elevation")?;
    let elevation = (!elevation.is_nan()).then_some(elevation);

    // Output result
    if json {
        let response = ElevationResponse {
            lat,
            lon,
            elevation,
            tile: tile_name_for(lat, lon).to_string(),
        };
        println!("{}", serde_json::to_string(&response)?);
    } else {
        println!("{}", format_elevation(elevation));
    }

    Ok(())
}

/// `void` for missing data, whole meters for raw samples, two decimals for
/// interpolated ones.
pub fn format_elevation(elevation: Option<f64>) -> String {
    match elevation {
        None => "void".to_string(),
        Some(e) if e.fract() == 0.0 => format!("{}", e as i64),
        Some(e) => format!("{:.2}", e),
    }
}
