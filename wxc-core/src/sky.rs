use serde::{Deserialize, Serialize};

/// Cloud cover percentage at or above which a day counts as mostly cloudy.
pub const MOSTLY_CLOUDY_PCT: f64 = 60.0;
/// Cloud cover percentage at or above which a day counts as overcast.
pub const OVERCAST_PCT: f64 = 85.0;
/// Cloud cover percentage below which a day counts as clear.
pub const CLEAR_PCT: f64 = 25.0;

/// Sky-cover category for a day, ordered from clearest to cloudiest.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkyCover {
    Clear,
    PartlyCloudy,
    MostlyCloudy,
    Overcast,
}

impl SkyCover {
    /// Categorize a mean cloud-cover percentage.
    pub fn from_cloud_cover(pct: f64) -> SkyCover {
        if pct < CLEAR_PCT {
            SkyCover::Clear
        } else if pct < MOSTLY_CLOUDY_PCT {
            SkyCover::PartlyCloudy
        } else if pct < OVERCAST_PCT {
            SkyCover::MostlyCloudy
        } else {
            SkyCover::Overcast
        }
    }

    /// Categorize a WMO weather code. Fog and any precipitation imply a
    /// fully covered sky.
    pub fn from_wmo(code: WmoCode) -> Option<SkyCover> {
        match code.0 {
            0 | 1 => Some(SkyCover::Clear),
            2 => Some(SkyCover::PartlyCloudy),
            3 | 45 | 48 => Some(SkyCover::Overcast),
            _ if code.is_precipitation() => Some(SkyCover::Overcast),
            _ => None,
        }
    }
}

/// Kind of precipitation that fell on a day.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecipKind {
    Rain,
    Snow,
}

/// WMO weather interpretation code as reported by Open-Meteo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WmoCode(pub u8);

impl WmoCode {
    /// Snowfall, snow grains or snow showers.
    pub fn is_snow(self) -> bool {
        matches!(self.0, 71..=77 | 85 | 86)
    }

    /// Any drizzle, rain, snow, shower or thunderstorm code.
    pub fn is_precipitation(self) -> bool {
        matches!(self.0, 51..=67 | 71..=77 | 80..=86 | 95..=99)
    }
}
