//! Tile naming and addressing.
//!
//! Every 1° × 1° cell has exactly one tile name of the form
//! `{N|S}{lat:02}{E|W}{lon:03}`, built from the **southwest corner** of the
//! cell (`floor(lat)`, `floor(lon)`).
//!
//! Archives are stored and downloaded as `{name}.hgt.zip`.

use std::fmt;
use std::str::FromStr;

use crate::error::ElevationError;

/// Extension used for tile archives, both in the local store and on the server.
pub const ARCHIVE_EXTENSION: &str = ".hgt.zip";

/// The name of a 1° × 1° tile together with its southwest origin.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileName {
    name: String,
    origin_lat: i32,
    origin_lon: i32,
}

impl TileName {
    /// The tile name, e.g. `N37W123`.
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Latitude of the southwest corner.
    pub fn origin_lat(&self) -> i32 {
        self.origin_lat
    }

    /// Longitude of the southwest corner.
    pub fn origin_lon(&self) -> i32 {
        self.origin_lon
    }

    /// Filename of the archive holding this tile, e.g. `N37W123.hgt.zip`.
    pub fn archive_filename(&self) -> String {
        archive_filename(&self.name)
    }
}

impl fmt::Display for TileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl AsRef<str> for TileName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

/// Compute the tile name and origin for a coordinate.
///
/// # Examples
///
/// ```
/// use geoelev::filename::tile_name_for;
///
/// let name = tile_name_for(37.77, -122.4);
/// assert_eq!(name.as_str(), "N37W123");
/// assert_eq!((name.origin_lat(), name.origin_lon()), (37, -123));
///
/// assert_eq!(tile_name_for(-1.2, 5.9).as_str(), "S02E005");
/// ```
pub fn tile_name_for(lat: f64, lon: f64) -> TileName {
    let origin_lat = lat.floor() as i32;
    let origin_lon = lon.floor() as i32;

    let lat_prefix = if lat >= 0.0 { 'N' } else { 'S' };
    let lon_prefix = if lon >= 0.0 { 'E' } else { 'W' };

    TileName {
        name: format!(
            "{}{:02}{}{:03}",
            lat_prefix,
            origin_lat.abs(),
            lon_prefix,
            origin_lon.abs()
        ),
        origin_lat,
        origin_lon,
    }
}

/// Archive filename for a tile name (`N37W123` → `N37W123.hgt.zip`).
pub fn archive_filename(name: &str) -> String {
    format!("{}{}", name, ARCHIVE_EXTENSION)
}

impl FromStr for TileName {
    type Err = ElevationError;

    /// Parse a tile name, optionally with a leading path and a `.hgt` or
    /// `.hgt.zip` suffix.
    ///
    /// ```
    /// use geoelev::filename::TileName;
    ///
    /// let name: TileName = "/cache/s12w077.hgt.zip".parse().unwrap();
    /// assert_eq!(name.as_str(), "S12W077");
    /// assert_eq!((name.origin_lat(), name.origin_lon()), (-12, -77));
    /// assert!("invalid".parse::<TileName>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ElevationError::InvalidTileName(s.to_string());

        // Extract just the filename if a path is given
        let base = s.rsplit(['/', '\\']).next().unwrap_or(s);
        let upper = base.to_ascii_uppercase();
        let name = upper.strip_suffix(".ZIP").unwrap_or(&upper);
        let name = name.strip_suffix(".HGT").unwrap_or(name);

        // Must be exactly 7 characters: N00E000
        if name.len() != 7 || !name.is_ascii() {
            return Err(invalid());
        }

        let lat_sign = match &name[0..1] {
            "N" => 1,
            "S" => -1,
            _ => return Err(invalid()),
        };
        let lon_sign = match &name[3..4] {
            "E" => 1,
            "W" => -1,
            _ => return Err(invalid()),
        };
        let lat: i32 = name[1..3].parse().map_err(|_| invalid())?;
        let lon: i32 = name[4..7].parse().map_err(|_| invalid())?;

        Ok(TileName {
            name: name.to_string(),
            origin_lat: lat * lat_sign,
            origin_lon: lon * lon_sign,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_and_origin(lat: f64, lon: f64) -> (String, i32, i32) {
        let name = tile_name_for(lat, lon);
        (name.to_string(), name.origin_lat(), name.origin_lon())
    }

    #[test]
    fn test_reference_coords() {
        assert_eq!(
            name_and_origin(37.9, -122.1),
            ("N37W123".to_string(), 37, -123)
        );
        assert_eq!(name_and_origin(-1.2, 5.9), ("S02E005".to_string(), -2, 5));
        assert_eq!(
            name_and_origin(37.77, -122.4),
            ("N37W123".to_string(), 37, -123)
        );
    }

    #[test]
    fn test_positive_coords() {
        assert_eq!(tile_name_for(35.5, 138.7).as_str(), "N35E138");
        assert_eq!(tile_name_for(0.5, 0.5).as_str(), "N00E000");
        assert_eq!(tile_name_for(59.9, 179.9).as_str(), "N59E179");
    }

    #[test]
    fn test_negative_coords() {
        // floor(-12.3) = -13, floor(-77.1) = -78
        assert_eq!(tile_name_for(-12.3, -77.1).as_str(), "S13W078");
        assert_eq!(tile_name_for(-0.5, -0.5).as_str(), "S01W001");
        assert_eq!(tile_name_for(-1.0, -1.0).as_str(), "S01W001");
    }

    #[test]
    fn test_boundary_cases() {
        assert_eq!(tile_name_for(35.0, 138.0).as_str(), "N35E138");
        assert_eq!(tile_name_for(0.0, 0.0).as_str(), "N00E000");
        assert_eq!(tile_name_for(-0.1, -0.1).as_str(), "S01W001");
    }

    #[test]
    fn test_archive_filename() {
        assert_eq!(
            tile_name_for(37.9, -122.1).archive_filename(),
            "N37W123.hgt.zip"
        );
        assert_eq!(archive_filename("S02E005"), "S02E005.hgt.zip");
    }

    #[test]
    fn test_parse() {
        let name: TileName = "N35E138".parse().unwrap();
        assert_eq!((name.origin_lat(), name.origin_lon()), (35, 138));

        let name: TileName = "C:\\data\\S12W077.hgt".parse().unwrap();
        assert_eq!(name.as_str(), "S12W077");
        assert_eq!((name.origin_lat(), name.origin_lon()), (-12, -77));

        let name: TileName = "n00e000.hgt.zip".parse().unwrap();
        assert_eq!(name.as_str(), "N00E000");
    }

    #[test]
    fn test_parse_invalid() {
        assert!("invalid".parse::<TileName>().is_err());
        assert!("N35E13".parse::<TileName>().is_err());
        assert!("X35E138".parse::<TileName>().is_err());
        assert!("N35X138".parse::<TileName>().is_err());
        assert!("NAAE138".parse::<TileName>().is_err());
    }

    #[test]
    fn test_parse_matches_computed_name() {
        for (lat, lon) in [(35.5, 138.7), (-12.3, -77.1), (0.5, -0.5), (-59.9, 179.9)] {
            let computed = tile_name_for(lat, lon);
            let parsed: TileName = computed.as_str().parse().unwrap();
            assert_eq!(parsed, computed);
        }
    }
}
