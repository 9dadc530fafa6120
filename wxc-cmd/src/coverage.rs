//! The `coverage` command: how much daily history is stored per location.

use crate::compare::write_json;
use log::info;
use serde::Serialize;
use wxc_db::models::LocationCoverage;
use wxc_db::Database;

#[derive(Debug, Serialize)]
struct CoverageReport {
    records: u64,
    locations: Vec<LocationCoverage>,
}

fn coverage_report(db: &Database) -> anyhow::Result<CoverageReport> {
    Ok(CoverageReport {
        records: db.record_count()?,
        locations: db.query_coverage()?,
    })
}

pub fn run_coverage(
    locations_csv: &str,
    daily_csv: &str,
    output: Option<&str>,
) -> anyhow::Result<()> {
    let db = Database::new()?;
    db.load_locations(&std::fs::read_to_string(locations_csv)?)?;
    db.load_daily_records(&std::fs::read_to_string(daily_csv)?)?;

    let report = coverage_report(&db)?;
    for location in report.locations.iter().filter(|l| l.days == 0) {
        info!("{} ({}) has no stored history", location.name, location.location_key);
    }
    write_json(&serde_json::to_string_pretty(&report)?, output)
}
