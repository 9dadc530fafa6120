//! Incremental fetch - only fetch days newer than what's already in the CSV.
//!
//! Keeps a long-lived daily-records CSV current without re-downloading the
//! whole window on every run.

use crate::fetch::{history_start, read_locations, today, REQUEST_PAUSE_MS};
use chrono::{Duration, NaiveDate};
use log::{info, warn};
use std::collections::HashMap;
use std::fs::OpenOptions;
use wxc_core::archive::ArchiveClient;
use wxc_core::daily_record::CSV_HEADER;
use wxc_db::Database;

/// Find the most recent date for each location key in an existing CSV.
///
/// A missing file yields an empty map. Malformed rows are ignored.
fn find_max_dates(csv_path: &str) -> anyhow::Result<HashMap<String, NaiveDate>> {
    if !std::path::Path::new(csv_path).exists() {
        return Ok(HashMap::new());
    }
    let db = Database::new()?;
    db.load_daily_records(&std::fs::read_to_string(csv_path)?)?;
    db.query_max_dates()
}

/// First day to fetch for a location: the day after its latest stored day,
/// or `default_start` when nothing is stored yet.
fn fetch_start(
    max_dates: &HashMap<String, NaiveDate>,
    location_key: &str,
    default_start: NaiveDate,
) -> NaiveDate {
    match max_dates.get(location_key) {
        Some(last_date) => *last_date + Duration::days(1),
        None => default_start,
    }
}

/// Run incremental update: only fetch days newer than what's in the existing
/// CSV, appending them in place. Locations without history get the full window.
pub async fn run_incremental(
    locations_csv: &str,
    daily_csv: &str,
    years: u32,
) -> anyhow::Result<()> {
    let locations = read_locations(locations_csv)?;
    let max_dates = find_max_dates(daily_csv)?;
    let today = today();
    let default_start = history_start(years, today)?;
    let end_date = today - Duration::days(1);

    let has_header = std::fs::metadata(daily_csv)
        .map(|m| m.len() > 0)
        .unwrap_or(false);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(daily_csv)?;
    let mut wtr = csv::Writer::from_writer(file);
    if !has_header {
        wtr.write_record(CSV_HEADER)?;
    }

    let client = ArchiveClient::new()?;
    let mut appended = 0usize;
    let mut fetched_any = false;

    for location in &locations {
        let key = location.key();
        let start_date = fetch_start(&max_dates, &key, default_start);

        if start_date > end_date {
            info!("{} ({}) is up to date", location.name, key);
            continue;
        }

        if fetched_any {
            tokio::time::sleep(std::time::Duration::from_millis(REQUEST_PAUSE_MS)).await;
        }
        fetched_any = true;

        info!(
            "Fetching {} ({}) from {} to {}",
            location.name, key, start_date, end_date
        );
        let records = match client.fetch_daily(location, start_date, end_date).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Failed to fetch {}: {}", location.name, e);
                continue;
            }
        };
        for record in records.iter().filter(|r| r.date >= start_date) {
            wtr.write_record(record.to_csv_row(&key))?;
            appended += 1;
        }
    }
    wtr.flush()?;

    info!(
        "Incremental update complete. {} daily records appended to {}",
        appended, daily_csv
    );
    Ok(())
}
