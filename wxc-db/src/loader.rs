//! CSV data loading functions for populating the in-memory SQLite database.
//!
//! Each loader parses CSV data from a string slice and inserts rows into the
//! corresponding table. The formats match the files written by the `fetch`
//! and `incremental-fetch` commands.
//!
//! # CSV Formats
//!
//! - **Locations** (has headers): `name,lat,lon,timezone,region,country`
//! - **Daily records** (has headers): see [`wxc_core::daily_record::CSV_HEADER`]

use crate::models::LoadSummary;
use crate::Database;
use rusqlite::{params, Connection};
use wxc_core::daily_record::DailyRecord;
use wxc_core::location::Location;
use wxc_utils::dates::{format_date, format_timestamp};

impl Database {
    /// Load saved locations from a CSV string.
    ///
    /// Rows without usable coordinates are skipped. A location already
    /// present is replaced.
    ///
    /// # Example CSV
    /// ```text
    /// name,lat,lon,timezone,region,country
    /// Houston,29.76,-95.37,America/Chicago,Texas,United States
    /// ```
    pub fn load_locations(&self, csv_data: &str) -> anyhow::Result<u32> {
        let locations = Location::parse_location_csv(csv_data)?;
        let conn = self.conn.borrow();
        for location in &locations {
            insert_location(&conn, location)?;
        }
        log::info!("loader: Loaded {} locations", locations.len());
        Ok(locations.len() as u32)
    }

    /// Add or replace a single location.
    pub fn add_location(&self, location: &Location) -> anyhow::Result<()> {
        insert_location(&self.conn.borrow(), location)
    }

    /// Load daily records from a CSV string.
    ///
    /// Rows with a missing or malformed location key or date are skipped and
    /// counted. When a (location, date) pair is already stored, the stored
    /// row is kept.
    ///
    /// # Example CSV
    /// ```text
    /// location_key,date,high,low,apparent_high,precip,snowfall,sunshine_sec,weather_code,cloud_cover,sunrise,sunset
    /// "29.76,-95.37",2024-06-21,94.1,77.0,103.2,0.0,0.0,43200,1,12,2024-06-21T06:23,2024-06-21T20:26
    /// ```
    pub fn load_daily_records(&self, csv_data: &str) -> anyhow::Result<LoadSummary> {
        let mut conn = self.conn.borrow_mut();
        let tx = conn.transaction()?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_data.as_bytes());

        let mut summary = LoadSummary::default();
        for result in rdr.records() {
            let r = result?;
            match DailyRecord::parse_csv_row(&r) {
                Some((location_key, record)) => {
                    if insert_daily_record(&tx, &location_key, &record)? {
                        summary.loaded += 1;
                    } else {
                        summary.skipped += 1;
                    }
                }
                None => summary.skipped += 1,
            }
        }
        tx.commit()?;
        if summary.skipped > 0 {
            log::warn!(
                "loader: Skipped {} malformed or duplicate daily rows",
                summary.skipped
            );
        }
        log::info!("loader: Loaded {} daily records", summary.loaded);
        Ok(summary)
    }

    /// Insert already-parsed records for one location, keeping any stored
    /// row for the same date. Returns the number of rows inserted.
    pub fn insert_daily_records(
        &self,
        location_key: &str,
        records: &[DailyRecord],
    ) -> anyhow::Result<u32> {
        let mut conn = self.conn.borrow_mut();
        let tx = conn.transaction()?;
        let mut inserted = 0u32;
        for record in records {
            if insert_daily_record(&tx, location_key, record)? {
                inserted += 1;
            }
        }
        tx.commit()?;
        log::info!("loader: Inserted {} daily records for {}", inserted, location_key);
        Ok(inserted)
    }
}

fn insert_location(conn: &Connection, location: &Location) -> anyhow::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO locations (location_key, name, lat, lon, timezone, region, country)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            location.key(),
            location.name,
            location.lat,
            location.lon,
            location.timezone,
            location.region,
            location.country
        ],
    )?;
    Ok(())
}

/// Returns false when the (location, date) row already existed.
fn insert_daily_record(
    conn: &Connection,
    location_key: &str,
    record: &DailyRecord,
) -> anyhow::Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO daily_records
         (location_key, date, high, low, apparent_high, precip, snowfall,
          sunshine_sec, weather_code, cloud_cover, sunrise, sunset)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            location_key,
            format_date(&record.date),
            record.high,
            record.low,
            record.apparent_high,
            record.precip,
            record.snowfall,
            record.sunshine_sec,
            record.weather_code.map(|c| i64::from(c.0)),
            record.cloud_cover,
            record.sunrise.as_ref().map(format_timestamp),
            record.sunset.as_ref().map(format_timestamp),
        ],
    )?;
    Ok(changed == 1)
}
