//! Open-Meteo archive API client for historical daily weather.
//!
//! API: <https://archive-api.open-meteo.com/v1/archive> (free, no key).
//! Requests Fahrenheit and inches so records line up with the metric thresholds.

use crate::daily_record::DailyRecord;
use crate::location::Location;
use crate::sky::WmoCode;
use chrono::NaiveDate;
use log::{info, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use wxc_utils::dates::{format_date, parse_date, parse_timestamp};

pub const ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

/// Daily variables requested from the archive.
pub const DAILY_FIELDS: [&str; 10] = [
    "temperature_2m_max",
    "temperature_2m_min",
    "apparent_temperature_max",
    "precipitation_sum",
    "snowfall_sum",
    "sunshine_duration",
    "weather_code",
    "cloud_cover_mean",
    "sunrise",
    "sunset",
];

const MAX_TRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    #[serde(default)]
    daily: ArchiveDaily,
}

#[derive(Debug, Default, Deserialize)]
struct ArchiveDaily {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    apparent_temperature_max: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    snowfall_sum: Vec<Option<f64>>,
    #[serde(default)]
    sunshine_duration: Vec<Option<f64>>,
    #[serde(default)]
    weather_code: Vec<Option<u8>>,
    #[serde(default)]
    cloud_cover_mean: Vec<Option<f64>>,
    #[serde(default)]
    sunrise: Vec<Option<String>>,
    #[serde(default)]
    sunset: Vec<Option<String>>,
}

fn at<T: Clone>(values: &[Option<T>], i: usize) -> Option<T> {
    values.get(i).cloned().flatten()
}

impl ArchiveDaily {
    /// Zip the column arrays into records. Days with an unparseable date are dropped.
    fn into_records(self) -> Vec<DailyRecord> {
        let mut records = Vec::with_capacity(self.time.len());
        for (i, day) in self.time.iter().enumerate() {
            let date = match parse_date(day) {
                Ok(d) => d,
                Err(_) => {
                    warn!("Archive returned malformed date {:?}, skipping", day);
                    continue;
                }
            };
            let stamp = |v: Option<String>| v.and_then(|s| parse_timestamp(&s).ok());
            records.push(DailyRecord {
                date,
                high: at(&self.temperature_2m_max, i),
                low: at(&self.temperature_2m_min, i),
                apparent_high: at(&self.apparent_temperature_max, i),
                precip: at(&self.precipitation_sum, i),
                snowfall: at(&self.snowfall_sum, i),
                sunshine_sec: at(&self.sunshine_duration, i),
                weather_code: at(&self.weather_code, i).map(WmoCode),
                cloud_cover: at(&self.cloud_cover_mean, i),
                sunrise: stamp(at(&self.sunrise, i)),
                sunset: stamp(at(&self.sunset, i)),
            });
        }
        records
    }
}

/// Parse an archive response body into daily records.
pub fn parse_archive_response(body: &str) -> anyhow::Result<Vec<DailyRecord>> {
    let response: ArchiveResponse = serde_json::from_str(body)?;
    Ok(response.daily.into_records())
}

/// Async client for the Open-Meteo archive.
pub struct ArchiveClient {
    client: Client,
    base_url: String,
}

impl ArchiveClient {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_base_url(ARCHIVE_URL)
    }

    /// Point the client at a different archive endpoint (mirrors, tests).
    pub fn with_base_url(base_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Fetch daily history for `location` between `start` and `end` inclusive,
    /// retrying with exponential backoff.
    pub async fn fetch_daily(
        &self,
        location: &Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<DailyRecord>> {
        let mut sleep_millis: u64 = 1000;
        let start_str = format_date(&start);
        let end_str = format_date(&end);
        let daily = DAILY_FIELDS.join(",");
        let lat = location.lat.to_string();
        let lon = location.lon.to_string();
        let query = [
            ("latitude", lat.as_str()),
            ("longitude", lon.as_str()),
            ("start_date", start_str.as_str()),
            ("end_date", end_str.as_str()),
            ("daily", daily.as_str()),
            ("temperature_unit", "fahrenheit"),
            ("precipitation_unit", "inch"),
            ("timezone", location.timezone.as_str()),
        ];

        for attempt in 1..=MAX_TRIES {
            match self.client.get(&self.base_url).query(&query).send().await {
                Ok(response) => {
                    if response.status() != StatusCode::OK {
                        warn!(
                            "Attempt {}/{}: Bad response status for {}: {}",
                            attempt,
                            MAX_TRIES,
                            location.name,
                            response.status()
                        );
                    } else {
                        match response.text().await {
                            Ok(body) => return parse_archive_response(&body),
                            Err(e) => {
                                warn!(
                                    "Attempt {}/{}: Failed to read response body for {}: {}",
                                    attempt, MAX_TRIES, location.name, e
                                );
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        "Attempt {}/{}: Request failed for {}: {}",
                        attempt, MAX_TRIES, location.name, e
                    );
                }
            }

            if attempt < MAX_TRIES {
                info!(
                    "Sleeping for {} milliseconds before retry for {}",
                    sleep_millis, location.name
                );
                tokio::time::sleep(Duration::from_millis(sleep_millis)).await;
                sleep_millis *= 2;
            }
        }

        anyhow::bail!("All {} attempts failed for {}", MAX_TRIES, location.name)
    }
}
