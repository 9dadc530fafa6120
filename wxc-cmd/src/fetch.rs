//! Full fetch of daily history from the Open-Meteo archive.

use chrono::{Duration, Local, NaiveDate};
use log::{info, warn};
use wxc_core::archive::ArchiveClient;
use wxc_core::daily_record::CSV_HEADER;
use wxc_core::location::Location;
use wxc_data::engine::ComparisonWindow;

/// Pause between archive requests, to be polite to the free API.
pub(crate) const REQUEST_PAUSE_MS: u64 = 500;

/// Read and parse a locations CSV, failing when it holds no usable rows.
pub(crate) fn read_locations(path: &str) -> anyhow::Result<Vec<Location>> {
    let data = std::fs::read_to_string(path)?;
    let locations = Location::parse_location_csv(&data)?;
    if locations.is_empty() {
        anyhow::bail!("No locations with coordinates in {}", path);
    }
    Ok(locations)
}

/// First day of history a `years`-long comparison ending before `today` reads.
pub(crate) fn history_start(years: u32, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let window = ComparisonWindow::trailing(years, today);
    window
        .start_date()
        .ok_or_else(|| anyhow::anyhow!("{} years before {} is outside the calendar", years, today))
}

/// Today in local time.
pub(crate) fn today() -> NaiveDate {
    Local::now().naive_local().date()
}

/// Run a full fetch of daily history for every location.
///
/// Writes a fresh daily-records CSV covering enough history for a
/// `years`-long comparison, through yesterday. A location whose fetch fails
/// is logged and left out.
pub async fn run_fetch(locations_csv: &str, daily_csv: &str, years: u32) -> anyhow::Result<()> {
    let locations = read_locations(locations_csv)?;
    let client = ArchiveClient::new()?;
    let today = today();
    let start_date = history_start(years, today)?;
    let end_date = today - Duration::days(1);

    info!(
        "Fetching {} locations from {} to {}",
        locations.len(),
        start_date,
        end_date
    );

    let mut wtr = csv::Writer::from_path(daily_csv)?;
    wtr.write_record(CSV_HEADER)?;
    let mut total = 0usize;

    for (i, location) in locations.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(REQUEST_PAUSE_MS)).await;
        }
        let key = location.key();
        info!("Fetching daily history for {} ({})", location.name, key);
        let records = match client.fetch_daily(location, start_date, end_date).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Failed to fetch {}: {}", location.name, e);
                continue;
            }
        };
        for record in &records {
            wtr.write_record(record.to_csv_row(&key))?;
        }
        info!("  {} days for {}", records.len(), location.name);
        total += records.len();
    }
    wtr.flush()?;

    info!(
        "Fetch complete. {} daily records written to {}",
        total, daily_csv
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_start_covers_the_window() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert_eq!(
            history_start(2, today).unwrap(),
            NaiveDate::from_ymd_opt(2023, 3, 1).unwrap()
        );
        assert_eq!(
            history_start(1, today).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(history_start(u32::MAX, today).is_err());
    }

    #[test]
    fn read_locations_rejects_empty_files() {
        let path = std::env::temp_dir().join(format!("wxc-empty-{}.csv", std::process::id()));
        std::fs::write(&path, "name,lat,lon\nNowhere,,\n").unwrap();
        let result = read_locations(path.to_str().unwrap());
        std::fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }
}
