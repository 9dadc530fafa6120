use crate::sky::{PrecipKind, SkyCover, WmoCode};
use chrono::naive::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use wxc_utils::dates::{
    format_date, format_timestamp, minutes_since_midnight, parse_date, parse_timestamp,
};

/// Precipitation (inches of water) at or below which a day counts as dry.
pub const TRACE_PRECIP_IN: f64 = 0.01;

/// Snowfall (inches) at or below which a day counts as snow-free.
pub const TRACE_SNOW_IN: f64 = 0.1;

/// Column order of the daily records CSV.
pub const CSV_HEADER: [&str; 12] = [
    "location_key",
    "date",
    "high",
    "low",
    "apparent_high",
    "precip",
    "snowfall",
    "sunshine_sec",
    "weather_code",
    "cloud_cover",
    "sunrise",
    "sunset",
];

/// One calendar day of observed weather at a single location.
///
/// Temperatures are °F, precipitation and snowfall are inches, timestamps
/// are local to the location. Any field other than `date` may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub high: Option<f64>,
    pub low: Option<f64>,
    /// Feels-like daily maximum
    pub apparent_high: Option<f64>,
    pub precip: Option<f64>,
    pub snowfall: Option<f64>,
    /// Seconds of sunshine
    pub sunshine_sec: Option<f64>,
    pub weather_code: Option<WmoCode>,
    /// Mean cloud cover, percent
    pub cloud_cover: Option<f64>,
    pub sunrise: Option<NaiveDateTime>,
    pub sunset: Option<NaiveDateTime>,
}

impl DailyRecord {
    /// An empty record for `date`.
    pub fn new(date: NaiveDate) -> DailyRecord {
        DailyRecord {
            date,
            ..Default::default()
        }
    }

    pub fn sunshine_hours(&self) -> Option<f64> {
        self.sunshine_sec.map(|s| s / 3600.0)
    }

    /// Sky cover from the cloud-cover percentage, falling back to the WMO code.
    pub fn sky_cover(&self) -> Option<SkyCover> {
        match self.cloud_cover {
            Some(pct) => Some(SkyCover::from_cloud_cover(pct)),
            None => self.weather_code.and_then(SkyCover::from_wmo),
        }
    }

    /// True when the record carries any precipitation information.
    pub fn has_precip_data(&self) -> bool {
        self.precip.is_some() || self.snowfall.is_some()
    }

    /// Kind of measurable precipitation, `None` for a dry (or unmeasured) day.
    pub fn precip_kind(&self) -> Option<PrecipKind> {
        let snowed = self.snowfall.is_some_and(|s| s > TRACE_SNOW_IN);
        let wet = self.precip.is_some_and(|p| p > TRACE_PRECIP_IN);
        let snow_coded = self.weather_code.is_some_and(|c| c.is_snow());
        if snowed || (wet && snow_coded) {
            Some(PrecipKind::Snow)
        } else if wet {
            Some(PrecipKind::Rain)
        } else {
            None
        }
    }

    /// Feels-like high when reported, otherwise the plain high.
    pub fn feels_like_high(&self) -> Option<f64> {
        self.apparent_high.or(self.high)
    }

    /// Hours between sunrise and sunset, if both are known and ordered.
    pub fn daylight_hours(&self) -> Option<f64> {
        match (self.sunrise, self.sunset) {
            (Some(rise), Some(set)) if set > rise => {
                Some((set - rise).num_seconds() as f64 / 3600.0)
            }
            _ => None,
        }
    }

    /// Sunset as minutes since local midnight.
    pub fn sunset_minutes(&self) -> Option<u32> {
        self.sunset.as_ref().map(minutes_since_midnight)
    }

    /// Parse one daily-records CSV row (see [`CSV_HEADER`]) into its
    /// location key and record.
    ///
    /// Returns `None` when the location key or date is missing or malformed.
    /// Unparseable optional cells become missing values.
    pub fn parse_csv_row(row: &StringRecord) -> Option<(String, DailyRecord)> {
        let location_key = row.get(0).map(str::trim).filter(|s| !s.is_empty())?;
        let date = parse_date(row.get(1)?).ok()?;
        let float = |idx: usize| row.get(idx).and_then(|s| s.trim().parse::<f64>().ok());
        let stamp = |idx: usize| row.get(idx).and_then(|s| parse_timestamp(s).ok());
        let record = DailyRecord {
            date,
            high: float(2),
            low: float(3),
            apparent_high: float(4),
            precip: float(5),
            snowfall: float(6),
            sunshine_sec: float(7),
            weather_code: row
                .get(8)
                .and_then(|s| s.trim().parse::<u8>().ok())
                .map(WmoCode),
            cloud_cover: float(9),
            sunrise: stamp(10),
            sunset: stamp(11),
        };
        Some((location_key.to_string(), record))
    }

    /// Render this record as a daily-records CSV row.
    pub fn to_csv_row(&self, location_key: &str) -> Vec<String> {
        let float = |v: Option<f64>| v.map_or(String::new(), |v| v.to_string());
        let stamp = |v: Option<NaiveDateTime>| v.map_or(String::new(), |v| format_timestamp(&v));
        vec![
            location_key.to_string(),
            format_date(&self.date),
            float(self.high),
            float(self.low),
            float(self.apparent_high),
            float(self.precip),
            float(self.snowfall),
            float(self.sunshine_sec),
            self.weather_code
                .map_or(String::new(), |c| c.0.to_string()),
            float(self.cloud_cover),
            stamp(self.sunrise),
            stamp(self.sunset),
        ]
    }
}
