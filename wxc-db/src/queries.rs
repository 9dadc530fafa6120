//! Typed query methods for retrieving locations and daily history.
//!
//! Dates are stored as `YYYY-MM-DD` text, so range filters compare strings.

use crate::models::{LocationCoverage, MonthCoverage};
use crate::Database;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use std::collections::HashMap;
use wxc_core::daily_record::DailyRecord;
use wxc_core::location::Location;
use wxc_core::sky::WmoCode;
use wxc_utils::dates::{format_date, parse_timestamp, DATE_FORMAT};

impl Database {
    // ───────────────────── Location Queries ─────────────────────

    /// Get all saved locations, ordered by name.
    pub fn query_locations(&self) -> anyhow::Result<Vec<Location>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT name, lat, lon, timezone, region, country FROM locations
             ORDER BY name, location_key",
        )?;
        let rows = stmt
            .query_map([], location_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("query: query_locations returned {} records", rows.len());
        Ok(rows)
    }

    /// Look up one location by its `"{lat},{lon}"` key.
    pub fn query_location(&self, location_key: &str) -> anyhow::Result<Option<Location>> {
        let conn = self.conn.borrow();
        let location = conn
            .query_row(
                "SELECT name, lat, lon, timezone, region, country FROM locations
                 WHERE location_key = ?1",
                params![location_key],
                location_from_row,
            )
            .optional()?;
        Ok(location)
    }

    // ───────────────────── History Queries ─────────────────────

    /// Get daily records for a location within `start..=end`, ordered by date.
    pub fn query_daily_records(
        &self,
        location_key: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<DailyRecord>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT date, high, low, apparent_high, precip, snowfall, sunshine_sec,
                    weather_code, cloud_cover, sunrise, sunset
             FROM daily_records
             WHERE location_key = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date",
        )?;
        let rows = stmt
            .query_map(
                params![location_key, format_date(&start), format_date(&end)],
                daily_record_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!(
            "query: query_daily_records({}) returned {} records",
            location_key,
            rows.len()
        );
        Ok(rows)
    }

    /// Get the (first, last) stored date for a location, `None` without records.
    pub fn query_date_range(
        &self,
        location_key: &str,
    ) -> anyhow::Result<Option<(NaiveDate, NaiveDate)>> {
        let conn = self.conn.borrow();
        let (min_date, max_date) = conn.query_row(
            "SELECT MIN(date), MAX(date) FROM daily_records WHERE location_key = ?1",
            params![location_key],
            |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, Option<String>>(1)?,
                ))
            },
        )?;
        match (min_date, max_date) {
            (Some(first), Some(last)) => Ok(Some((
                NaiveDate::parse_from_str(&first, DATE_FORMAT)?,
                NaiveDate::parse_from_str(&last, DATE_FORMAT)?,
            ))),
            _ => Ok(None),
        }
    }

    /// Latest stored date for every location key that has records.
    pub fn query_max_dates(&self) -> anyhow::Result<HashMap<String, NaiveDate>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT location_key, MAX(date) FROM daily_records GROUP BY location_key",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, date_column(row, 1)?))
            })?
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(rows)
    }

    /// Stored history per saved location, ordered by name.
    pub fn query_coverage(&self) -> anyhow::Result<Vec<LocationCoverage>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT l.location_key, l.name, MIN(d.date), MAX(d.date), COUNT(d.date)
             FROM locations l
             LEFT JOIN daily_records d ON d.location_key = l.location_key
             GROUP BY l.location_key
             ORDER BY l.name, l.location_key",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(LocationCoverage {
                    location_key: row.get(0)?,
                    name: row.get(1)?,
                    first_date: row.get(2)?,
                    last_date: row.get(3)?,
                    days: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("query: query_coverage returned {} records", rows.len());
        Ok(rows)
    }

    /// Stored days per calendar month for a location, oldest first.
    pub fn query_month_coverage(&self, location_key: &str) -> anyhow::Result<Vec<MonthCoverage>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT substr(date, 1, 7) AS month, COUNT(*)
             FROM daily_records
             WHERE location_key = ?1
             GROUP BY month
             ORDER BY month",
        )?;
        let rows = stmt
            .query_map(params![location_key], |row| {
                Ok(MonthCoverage {
                    month: row.get(0)?,
                    days: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Total number of stored daily records.
    pub fn record_count(&self) -> anyhow::Result<u64> {
        let conn = self.conn.borrow();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM daily_records", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn location_from_row(row: &Row) -> rusqlite::Result<Location> {
    Ok(Location {
        name: row.get(0)?,
        lat: row.get(1)?,
        lon: row.get(2)?,
        timezone: row.get(3)?,
        region: row.get(4)?,
        country: row.get(5)?,
    })
}

fn date_column(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn timestamp_column(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
    let text: Option<String> = row.get(idx)?;
    Ok(text.and_then(|s| parse_timestamp(&s).ok()))
}

fn daily_record_from_row(row: &Row) -> rusqlite::Result<DailyRecord> {
    let weather_code: Option<i64> = row.get(7)?;
    Ok(DailyRecord {
        date: date_column(row, 0)?,
        high: row.get(1)?,
        low: row.get(2)?,
        apparent_high: row.get(3)?,
        precip: row.get(4)?,
        snowfall: row.get(5)?,
        sunshine_sec: row.get(6)?,
        weather_code: weather_code
            .and_then(|c| u8::try_from(c).ok())
            .map(WmoCode),
        cloud_cover: row.get(8)?,
        sunrise: timestamp_column(row, 9)?,
        sunset: timestamp_column(row, 10)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::Database;
    use chrono::NaiveDate;
    use wxc_core::sky::WmoCode;

    const LOCATIONS: &str = "\
name,lat,lon,timezone,region,country
Seattle,47.61,-122.33,America/Los_Angeles,Washington,United States
Houston,29.76,-95.37,America/Chicago,Texas,United States
Nowhere,0.5,0.5,,,
";

    const DAILY: &str = "\
location_key,date,high,low,apparent_high,precip,snowfall,sunshine_sec,weather_code,cloud_cover,sunrise,sunset
\"29.76,-95.37\",2024-05-31,90.0,74.0,,0.0,,40000,1,,,
\"29.76,-95.37\",2024-06-21,94.1,77.0,103.2,0.0,0.0,43200,1,12,2024-06-21T06:23,2024-06-21T20:26
\"29.76,-95.37\",2024-06-20,92.0,76.0,,0.5,,30000,63,95,,
\"29.76,-95.37\",2024-07-01,95.0,78.0,,,,,,,,
\"47.61,-122.33\",2024-06-21,72.0,55.0,,0.1,,50000,3,90,2024-06-21T05:11,2024-06-21T21:10
";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_db() -> Database {
        let db = Database::new().unwrap();
        db.load_locations(LOCATIONS).unwrap();
        db.load_daily_records(DAILY).unwrap();
        db
    }

    #[test]
    fn query_locations_ordered_by_name() {
        let db = sample_db();
        let names: Vec<String> = db
            .query_locations()
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["Houston", "Nowhere", "Seattle"]);
    }

    #[test]
    fn query_location_by_key() {
        let db = sample_db();
        let houston = db.query_location("29.76,-95.37").unwrap().unwrap();
        assert_eq!(houston.name, "Houston");
        assert_eq!(houston.key(), "29.76,-95.37");
        assert!(db.query_location("1,1").unwrap().is_none());
    }

    #[test]
    fn query_daily_records_in_range() {
        let db = sample_db();
        let june = db
            .query_daily_records("29.76,-95.37", date(2024, 6, 1), date(2024, 6, 30))
            .unwrap();
        assert_eq!(june.len(), 2);
        assert_eq!(june[0].date, date(2024, 6, 20), "Ordered by date");
        assert_eq!(june[0].weather_code, Some(WmoCode(63)));
        assert_eq!(june[1].sunset_minutes(), Some(1226));
        assert_eq!(june[1].apparent_high, Some(103.2));
        assert_eq!(june[0].sunrise, None);
    }

    #[test]
    fn records_round_trip_through_the_table() {
        let db = sample_db();
        let stored = db
            .query_daily_records("47.61,-122.33", date(2024, 6, 21), date(2024, 6, 21))
            .unwrap();
        assert_eq!(stored.len(), 1);

        let copy = Database::new().unwrap();
        copy.insert_daily_records("47.61,-122.33", &stored).unwrap();
        let again = copy
            .query_daily_records("47.61,-122.33", date(2024, 1, 1), date(2024, 12, 31))
            .unwrap();
        assert_eq!(again, stored);
    }

    #[test]
    fn query_date_range_per_location() {
        let db = sample_db();
        assert_eq!(
            db.query_date_range("29.76,-95.37").unwrap(),
            Some((date(2024, 5, 31), date(2024, 7, 1)))
        );
        assert_eq!(db.query_date_range("0.5,0.5").unwrap(), None);
    }

    #[test]
    fn query_max_dates_per_location() {
        let db = sample_db();
        let max = db.query_max_dates().unwrap();
        assert_eq!(max.len(), 2);
        assert_eq!(max["29.76,-95.37"], date(2024, 7, 1));
        assert_eq!(max["47.61,-122.33"], date(2024, 6, 21));
    }

    #[test]
    fn coverage_includes_locations_without_history() {
        let db = sample_db();
        let coverage = db.query_coverage().unwrap();
        assert_eq!(coverage.len(), 3);
        assert_eq!(coverage[0].name, "Houston");
        assert_eq!(coverage[0].days, 4);
        assert_eq!(coverage[0].first_date.as_deref(), Some("2024-05-31"));
        assert_eq!(coverage[1].name, "Nowhere");
        assert_eq!(coverage[1].days, 0);
        assert_eq!(coverage[1].last_date, None);
    }

    #[test]
    fn month_coverage_counts_days() {
        let db = sample_db();
        let months = db.query_month_coverage("29.76,-95.37").unwrap();
        let summary: Vec<(&str, u32)> = months.iter().map(|m| (m.month.as_str(), m.days)).collect();
        assert_eq!(summary, vec![("2024-05", 1), ("2024-06", 2), ("2024-07", 1)]);
    }

    #[test]
    fn record_count_counts_all_rows() {
        let db = sample_db();
        assert_eq!(db.record_count().unwrap(), 5);
    }
}
