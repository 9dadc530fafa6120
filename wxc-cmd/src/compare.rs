//! The `compare` command: load saved history into the in-memory database,
//! run one comparison and print a view of the result as JSON.

use crate::fetch::today;
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use log::{info, warn};
use std::collections::HashMap;
use std::io::Write;
use wxc_core::location::Location;
use wxc_core::month::YearMonth;
use wxc_data::engine::{
    CompareOptions, ComparisonEngine, ComparisonWindow, DEFAULT_WINDOW_YEARS, MIN_DAYS_PER_MONTH,
};
use wxc_data::views;
use wxc_data::{ComparisonConfig, ComparisonResult, MetricSettings};
use wxc_db::Database;
use wxc_utils::dates::parse_date;

/// How the comparison result is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    /// Every compared month, oldest first, with the overall totals
    Chronological,
    /// Months grouped by calendar month across years
    Calendar,
    /// Runs of consecutive months with the same winner
    Streaks,
    /// Months won on every compared metric
    Sweeps,
    /// Win counts per calendar year
    Yearly,
}

#[derive(Debug, Clone, Args)]
pub struct CompareArgs {
    /// Daily-records CSV written by `fetch` or `incremental-fetch`
    #[arg(long)]
    pub daily_csv: String,

    /// Locations CSV used to resolve `--loc1`/`--loc2`
    #[arg(long)]
    pub locations_csv: Option<String>,

    /// Saved comparison configuration (JSON); replaces the location and metric flags
    #[arg(long, conflicts_with_all = ["loc1", "loc2", "hidden", "display"])]
    pub config: Option<String>,

    /// First location, by key ("lat,lon") or name
    #[arg(long, required_unless_present = "config")]
    pub loc1: Option<String>,

    /// Second location, by key ("lat,lon") or name
    #[arg(long, required_unless_present = "config")]
    pub loc2: Option<String>,

    /// Metrics left out entirely (comma separated keys)
    #[arg(long, value_delimiter = ',')]
    pub hidden: Vec<String>,

    /// Metrics shown but not scored (comma separated keys)
    #[arg(long, value_delimiter = ',')]
    pub display: Vec<String>,

    /// Years of history to compare
    #[arg(long, default_value_t = DEFAULT_WINDOW_YEARS, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub years: u32,

    /// Fewest days each location needs in a month for it to count
    #[arg(long, default_value_t = MIN_DAYS_PER_MONTH)]
    pub min_days: usize,

    /// Pretend today is this date (YYYY-MM-DD)
    #[arg(long)]
    pub today: Option<String>,

    #[arg(long, value_enum, default_value_t = View::Chronological)]
    pub view: View,

    /// Write the JSON here instead of stdout
    #[arg(long)]
    pub output: Option<String>,
}

pub fn run_compare(args: &CompareArgs) -> anyhow::Result<()> {
    let db = Database::new()?;
    if let Some(path) = &args.locations_csv {
        db.load_locations(&std::fs::read_to_string(path)?)?;
    }
    let summary = db.load_daily_records(&std::fs::read_to_string(&args.daily_csv)?)?;
    info!(
        "Loaded {} daily records ({} skipped) from {}",
        summary.loaded, summary.skipped, args.daily_csv
    );

    let config = match &args.config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => config_from_flags(&db, args)?,
    };
    let today = match &args.today {
        Some(date) => parse_date(date)?,
        None => today(),
    };

    let window = ComparisonWindow::trailing(args.years, today);
    report_coverage(&db, &config, &window, args.min_days)?;

    let result = run_comparison(&db, &config, args.years, args.min_days, today)?;
    info!(
        "{} vs {}: {} months compared, {}-{} ({:?})",
        config.loc1.name,
        config.loc2.name,
        result.months.len(),
        result.loc1_wins,
        result.loc2_wins,
        result.overall_winner
    );

    write_json(&render(&result, args.view)?, args.output.as_deref())
}

/// Write JSON to `output`, or stdout when there is none.
pub(crate) fn write_json(json: &str, output: Option<&str>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            info!("Wrote {}", path);
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }
    Ok(())
}

/// Months of `window` where `location` has fewer than `min_days` stored days.
fn thin_months(
    db: &Database,
    location: &Location,
    window: &ComparisonWindow,
    min_days: usize,
) -> anyhow::Result<Vec<YearMonth>> {
    let stored: HashMap<YearMonth, u32> = db
        .query_month_coverage(&location.key())?
        .into_iter()
        .filter_map(|c| c.month.parse::<YearMonth>().ok().map(|m| (m, c.days)))
        .collect();
    Ok(window
        .months()
        .filter(|m| (stored.get(m).copied().unwrap_or(0) as usize) < min_days)
        .collect())
}

/// Warn about stored history too thin to compare inside the window.
fn report_coverage(
    db: &Database,
    config: &ComparisonConfig,
    window: &ComparisonWindow,
    min_days: usize,
) -> anyhow::Result<()> {
    for location in [&config.loc1, &config.loc2] {
        let key = location.key();
        let Some((first, last)) = db.query_date_range(&key)? else {
            warn!("No stored history for {} ({})", location.name, key);
            continue;
        };
        info!("{} history runs {} to {}", location.name, first, last);
        let thin = thin_months(db, location, window, min_days)?;
        if !thin.is_empty() {
            let months: Vec<String> = thin.iter().map(|m| m.to_string()).collect();
            warn!(
                "{} has fewer than {} days in {} month(s), which will be skipped: {}",
                location.name,
                min_days,
                thin.len(),
                months.join(", ")
            );
        }
    }
    Ok(())
}

fn run_comparison(
    db: &Database,
    config: &ComparisonConfig,
    years: u32,
    min_days: usize,
    today: NaiveDate,
) -> anyhow::Result<ComparisonResult> {
    let engine = ComparisonEngine::new(CompareOptions {
        window_years: years,
        min_days_per_month: min_days,
    });
    engine.compare(config, db, today)
}

fn config_from_flags(db: &Database, args: &CompareArgs) -> anyhow::Result<ComparisonConfig> {
    let (Some(loc1), Some(loc2)) = (&args.loc1, &args.loc2) else {
        anyhow::bail!("Both --loc1 and --loc2 are required without --config");
    };
    Ok(ComparisonConfig {
        loc1: resolve_location(db, loc1)?,
        loc2: resolve_location(db, loc2)?,
        metrics: MetricSettings::from_sets(args.hidden.iter(), args.display.iter()),
    })
}

/// Find a location by key, falling back to a case-insensitive name match.
fn resolve_location(db: &Database, query: &str) -> anyhow::Result<Location> {
    if let Some(location) = db.query_location(query)? {
        return Ok(location);
    }
    let mut matches: Vec<Location> = db
        .query_locations()?
        .into_iter()
        .filter(|l| l.name.eq_ignore_ascii_case(query))
        .collect();
    match matches.len() {
        0 => anyhow::bail!("Unknown location '{}'", query),
        1 => Ok(matches.remove(0)),
        n => anyhow::bail!("'{}' matches {} locations; use its lat,lon key", query, n),
    }
}

fn render(result: &ComparisonResult, view: View) -> anyhow::Result<String> {
    let json = match view {
        View::Chronological => serde_json::to_string_pretty(result)?,
        View::Calendar => serde_json::to_string_pretty(&views::by_calendar_month(result))?,
        View::Streaks => serde_json::to_string_pretty(&views::streaks(result))?,
        View::Sweeps => serde_json::to_string_pretty(&views::sweeps(result))?,
        View::Yearly => serde_json::to_string_pretty(&result.yearly_series())?,
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration};
    use wxc_core::daily_record::DailyRecord;
    use wxc_data::{Metric, MetricVisibility, Side};

    const LOCATIONS: &str = "\
name,lat,lon,timezone,region,country
Seattle,47.61,-122.33,America/Los_Angeles,Washington,United States
Phoenix,33.45,-112.07,America/Phoenix,Arizona,United States
";

    fn args() -> CompareArgs {
        CompareArgs {
            daily_csv: String::new(),
            locations_csv: None,
            config: None,
            loc1: Some("Seattle".to_string()),
            loc2: Some("33.45,-112.07".to_string()),
            hidden: vec![],
            display: vec![],
            years: 1,
            min_days: 15,
            today: None,
            view: View::Chronological,
            output: None,
        }
    }

    /// 2024 history: Seattle wet and grey, Phoenix dry and sunny.
    fn seeded_db() -> Database {
        let db = Database::new().unwrap();
        db.load_locations(LOCATIONS).unwrap();
        let mut date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let (mut seattle, mut phoenix) = (vec![], vec![]);
        while date.year() == 2024 {
            let mut wet = DailyRecord::new(date);
            wet.high = Some(55.0);
            wet.low = Some(42.0);
            wet.precip = Some(0.2);
            wet.cloud_cover = Some(95.0);
            wet.sunshine_sec = Some(3600.0);
            seattle.push(wet);

            let mut dry = DailyRecord::new(date);
            dry.high = Some(85.0);
            dry.low = Some(60.0);
            dry.precip = Some(0.0);
            dry.cloud_cover = Some(5.0);
            dry.sunshine_sec = Some(36000.0);
            phoenix.push(dry);
            date += Duration::days(1);
        }
        db.insert_daily_records("47.61,-122.33", &seattle).unwrap();
        db.insert_daily_records("33.45,-112.07", &phoenix).unwrap();
        db
    }

    #[test]
    fn resolves_locations_by_key_or_name() {
        let db = seeded_db();
        assert_eq!(resolve_location(&db, "seattle").unwrap().lat, 47.61);
        assert_eq!(resolve_location(&db, "33.45,-112.07").unwrap().name, "Phoenix");
        assert!(resolve_location(&db, "Atlantis").is_err());
    }

    #[test]
    fn flags_build_metric_settings() {
        let db = seeded_db();
        let mut args = args();
        args.hidden = vec!["snow_days".to_string()];
        args.display = vec!["hot_days".to_string(), "not_a_metric".to_string()];

        let config = config_from_flags(&db, &args).unwrap();
        assert_eq!(config.loc1.name, "Seattle");
        assert_eq!(config.metrics.visibility(Metric::SnowDays), MetricVisibility::Hidden);
        assert_eq!(config.metrics.visibility(Metric::HotDays), MetricVisibility::DisplayOnly);
        assert_eq!(config.metrics.visibility(Metric::RainyDays), MetricVisibility::Scored);
    }

    #[test]
    fn sunny_dry_location_wins_every_month() {
        let db = seeded_db();
        let config = config_from_flags(&db, &args()).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();

        let result = run_comparison(&db, &config, 1, 15, today).unwrap();
        assert_eq!(result.months.len(), 12);
        assert_eq!(result.loc2_wins, 12);
        assert_eq!(result.overall_winner, Side::Loc2);

        let streaks: serde_json::Value =
            serde_json::from_str(&render(&result, View::Streaks).unwrap()).unwrap();
        assert_eq!(streaks.as_array().unwrap().len(), 1);

        let yearly: serde_json::Value =
            serde_json::from_str(&render(&result, View::Yearly).unwrap()).unwrap();
        assert_eq!(yearly[0]["year"], 2024);
        assert_eq!(yearly[0]["loc2_wins"], 12);
    }

    #[test]
    fn saved_config_round_trips_through_the_command() {
        let db = seeded_db();
        let config = config_from_flags(&db, &args()).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let restored: ComparisonConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);

        let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let calendar: serde_json::Value = serde_json::from_str(
            &render(&run_comparison(&db, &restored, 1, 15, today).unwrap(), View::Calendar)
                .unwrap(),
        )
        .unwrap();
        assert_eq!(calendar.as_array().unwrap().len(), 12);
        assert_eq!(calendar[0]["month"], 1);
    }

    #[test]
    fn thin_months_inside_the_window() {
        let db = seeded_db();
        let partial: Vec<DailyRecord> = (1..=10)
            .map(|d| DailyRecord::new(NaiveDate::from_ymd_opt(2025, 1, d).unwrap()))
            .collect();
        db.insert_daily_records("33.45,-112.07", &partial).unwrap();
        let phoenix = resolve_location(&db, "Phoenix").unwrap();
        let seattle = resolve_location(&db, "Seattle").unwrap();
        let ym = |y, m| YearMonth::new(y, m).unwrap();
        let window = ComparisonWindow {
            start: ym(2024, 11),
            end: ym(2025, 2),
        };

        assert_eq!(
            thin_months(&db, &phoenix, &window, 15).unwrap(),
            vec![ym(2025, 1), ym(2025, 2)]
        );
        assert_eq!(thin_months(&db, &phoenix, &window, 10).unwrap(), vec![ym(2025, 2)]);
        assert_eq!(
            thin_months(&db, &seattle, &window, 15).unwrap(),
            vec![ym(2025, 1), ym(2025, 2)]
        );

        let config = config_from_flags(&db, &args()).unwrap();
        assert!(report_coverage(&db, &config, &window, 15).is_ok());
    }

    #[test]
    fn window_without_history_is_an_empty_tie() {
        let db = seeded_db();
        let config = config_from_flags(&db, &args()).unwrap();
        let today = NaiveDate::from_ymd_opt(2030, 6, 1).unwrap();
        let result = run_comparison(&db, &config, 1, 15, today).unwrap();
        assert!(result.months.is_empty());
        assert_eq!(result.overall_winner, Side::Tie);
    }
}
