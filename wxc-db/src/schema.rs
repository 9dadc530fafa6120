//! SQL schema definitions for the in-memory SQLite database.
//!
//! The schema is applied as a single batch when the database is initialized.

/// Returns the full SQL schema as a single batch string.
///
/// This creates the following tables:
///
/// - `locations` - Saved locations keyed by `"{lat},{lon}"`
/// - `daily_records` - One row per location and calendar day. Every weather
///   column is nullable; dates are `YYYY-MM-DD` and sunrise/sunset are local
///   `YYYY-MM-DDTHH:MM` timestamps, so text ordering is chronological.
pub fn create_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS locations (
        location_key TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        lat REAL NOT NULL,
        lon REAL NOT NULL,
        timezone TEXT NOT NULL,
        region TEXT NOT NULL DEFAULT '',
        country TEXT NOT NULL DEFAULT ''
    );

    CREATE TABLE IF NOT EXISTS daily_records (
        location_key TEXT NOT NULL,
        date TEXT NOT NULL,
        high REAL,
        low REAL,
        apparent_high REAL,
        precip REAL,
        snowfall REAL,
        sunshine_sec REAL,
        weather_code INTEGER,
        cloud_cover REAL,
        sunrise TEXT,
        sunset TEXT,
        PRIMARY KEY (location_key, date)
    );
    CREATE INDEX IF NOT EXISTS idx_daily_location ON daily_records(location_key);
    CREATE INDEX IF NOT EXISTS idx_daily_date ON daily_records(date);
    "#
}
