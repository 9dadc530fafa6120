use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

/// Default timezone when a location row leaves it blank.
pub const DEFAULT_TIMEZONE: &str = "America/Chicago";

/// A saved dashboard location.
///
/// Identity is the coordinate pair; see [`Location::key`].
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Location {
    /// Human-readable name of the place
    pub name: String,
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
    /// IANA timezone used for local sunrise/sunset timestamps
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// State or province
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

impl Location {
    /// Stable key for this location: `"{lat},{lon}"`.
    pub fn key(&self) -> String {
        format!("{},{}", self.lat, self.lon)
    }

    /// Unordered key for a pair of locations. `pair_key(a, b) == pair_key(b, a)`.
    pub fn pair_key(a: &Location, b: &Location) -> String {
        let (first, second) = Self::ordered_keys(a, b);
        format!("{first}|{second}")
    }

    /// True when `a` sorts before (or equal to) `b` under the pair-key ordering.
    pub fn is_canonical_order(a: &Location, b: &Location) -> bool {
        a.key() <= b.key()
    }

    fn ordered_keys(a: &Location, b: &Location) -> (String, String) {
        let (ka, kb) = (a.key(), b.key());
        if ka <= kb {
            (ka, kb)
        } else {
            (kb, ka)
        }
    }

    /// Parse a CSV string of locations.
    ///
    /// Expected CSV columns (with headers): name, lat, lon, timezone, region, country
    pub fn parse_location_csv(csv_object: &str) -> anyhow::Result<Vec<Location>> {
        let mut location_list: Vec<Location> = Vec::new();
        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_object.as_bytes());
        for row in rdr.records() {
            let record = row?;
            let name = record.get(0).unwrap_or("").trim().to_string();
            let lat = record.get(1).unwrap_or("").trim().parse::<f64>();
            let lon = record.get(2).unwrap_or("").trim().parse::<f64>();
            let (lat, lon) = match (lat, lon) {
                (Ok(lat), Ok(lon)) => (lat, lon),
                _ => {
                    log::warn!("Skipping location row without coordinates: {:?}", record);
                    continue;
                }
            };
            let timezone = match record.get(3).map(str::trim) {
                Some(tz) if !tz.is_empty() => tz.to_string(),
                _ => default_timezone(),
            };
            let region = record.get(4).unwrap_or("").trim().to_string();
            let country = record.get(5).unwrap_or("").trim().to_string();
            location_list.push(Location {
                name,
                lat,
                lon,
                timezone,
                region,
                country,
            });
        }
        Ok(location_list)
    }
}
