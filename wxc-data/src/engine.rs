//! Comparison pipeline: window selection, per-month metrics, scoring and
//! aggregation, fronted by the cache.

use crate::aggregate::{aggregate, ComparisonResult};
use crate::cache::ComparisonCache;
use crate::metrics::{partition_by_month, MonthlyMetrics};
use crate::scoring::score_month;
use crate::visibility::ComparisonConfig;
use chrono::NaiveDate;
use serde::Serialize;
use wxc_core::daily_record::DailyRecord;
use wxc_core::history::DailyHistory;
use wxc_core::month::{MonthRange, YearMonth};

/// Years of history compared by default.
pub const DEFAULT_WINDOW_YEARS: u32 = 2;

/// Fewest daily records each location needs in a month for it to be compared.
pub const MIN_DAYS_PER_MONTH: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareOptions {
    pub window_years: u32,
    pub min_days_per_month: usize,
}

impl Default for CompareOptions {
    fn default() -> Self {
        CompareOptions {
            window_years: DEFAULT_WINDOW_YEARS,
            min_days_per_month: MIN_DAYS_PER_MONTH,
        }
    }
}

/// Inclusive range of calendar months to compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ComparisonWindow {
    pub start: YearMonth,
    pub end: YearMonth,
}

impl ComparisonWindow {
    /// The `years` complete years of months ending the month before `today`.
    /// A zero-year window is empty.
    pub fn trailing(years: u32, today: NaiveDate) -> ComparisonWindow {
        let end = YearMonth::of(&today).pred();
        let start = match years {
            0 => end.succ(),
            n => end.minus_months(n.saturating_mul(12) - 1),
        };
        ComparisonWindow { start, end }
    }

    pub fn months(&self) -> MonthRange {
        MonthRange(self.start, self.end)
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// First day of the window, `None` when it lies outside the calendar.
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start.first_day()
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end.last_day()
    }
}

/// Everything one comparison reads. Building this is the caller's job, so
/// [`compare`] stays free of I/O.
#[derive(Debug, Clone, Copy)]
pub struct ComparisonContext<'a> {
    pub config: &'a ComparisonConfig,
    pub window: ComparisonWindow,
    pub loc1_history: &'a [DailyRecord],
    pub loc2_history: &'a [DailyRecord],
    pub min_days_per_month: usize,
}

/// Compare two daily histories month by month over the window.
///
/// Months where either side has fewer than `min_days_per_month` records are
/// left out.
pub fn compare(ctx: &ComparisonContext) -> ComparisonResult {
    let scored = ctx.config.metrics.scored_set();
    let loc1_months = partition_by_month(ctx.loc1_history);
    let loc2_months = partition_by_month(ctx.loc2_history);

    let mut months = Vec::new();
    for month in ctx.window.months() {
        let (Some(loc1_days), Some(loc2_days)) = (loc1_months.get(&month), loc2_months.get(&month))
        else {
            log::debug!("{month}: no data for one or both locations");
            continue;
        };
        if loc1_days.len() < ctx.min_days_per_month || loc2_days.len() < ctx.min_days_per_month {
            log::debug!(
                "{month}: insufficient data ({} and {} days)",
                loc1_days.len(),
                loc2_days.len()
            );
            continue;
        }
        let metrics = MonthlyMetrics::from_records(month, loc1_days.iter().copied()).and_then(
            |loc1| {
                MonthlyMetrics::from_records(month, loc2_days.iter().copied())
                    .map(|loc2| (loc1, loc2))
            },
        );
        match metrics {
            Ok((loc1, loc2)) => months.push(score_month(month, loc1, loc2, &scored)),
            Err(e) => log::warn!("Skipping {month}: {e}"),
        }
    }
    aggregate(months)
}

/// Cached comparison front end over a [`DailyHistory`].
#[derive(Debug, Default)]
pub struct ComparisonEngine {
    options: CompareOptions,
    cache: ComparisonCache,
}

impl ComparisonEngine {
    pub fn new(options: CompareOptions) -> ComparisonEngine {
        ComparisonEngine {
            options,
            cache: ComparisonCache::new(),
        }
    }

    pub fn options(&self) -> &CompareOptions {
        &self.options
    }

    pub fn cache(&self) -> &ComparisonCache {
        &self.cache
    }

    /// Compare the configured locations over the trailing window ending
    /// before `today`. History is only read on a cache miss.
    pub fn compare<H>(
        &self,
        config: &ComparisonConfig,
        history: &H,
        today: NaiveDate,
    ) -> anyhow::Result<ComparisonResult>
    where
        H: DailyHistory + ?Sized,
    {
        let window = ComparisonWindow::trailing(self.options.window_years, today);
        let result = self.cache.get_or_compute(config, window, |config| {
            let (Some(start), Some(end)) = (window.start_date(), window.end_date()) else {
                anyhow::bail!("Window {}..{} is outside the calendar", window.start, window.end);
            };
            log::info!(
                "Comparing {} and {} from {} to {}",
                config.loc1.name,
                config.loc2.name,
                window.start,
                window.end
            );
            let loc1_history = history.daily_records(&config.loc1, start, end)?;
            let loc2_history = history.daily_records(&config.loc2, start, end)?;
            let ctx = ComparisonContext {
                config,
                window,
                loc1_history: &loc1_history,
                loc2_history: &loc2_history,
                min_days_per_month: self.options.min_days_per_month,
            };
            anyhow::Ok(compare(&ctx))
        })?;
        log::info!(
            "{} month(s) compared: {} won {}, {} won {}, {} tied",
            result.months.len(),
            config.loc1.name,
            result.loc1_wins,
            config.loc2.name,
            result.loc2_wins,
            result.ties()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Side;
    use std::collections::HashMap;
    use wxc_core::location::Location;

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    fn location(name: &str, lat: f64, lon: f64) -> Location {
        Location {
            name: name.to_string(),
            lat,
            lon,
            timezone: "America/Chicago".to_string(),
            region: String::new(),
            country: String::new(),
        }
    }

    fn month_of_days(month: YearMonth, days: u32, sunshine_sec: f64) -> Vec<DailyRecord> {
        (1..=days)
            .map(|d| {
                let mut r = DailyRecord::new(
                    NaiveDate::from_ymd_opt(month.year, month.month, d).unwrap(),
                );
                r.sunshine_sec = Some(sunshine_sec);
                r
            })
            .collect()
    }

    #[test]
    fn trailing_window_ends_before_current_month() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let window = ComparisonWindow::trailing(2, today);
        assert_eq!(window.start, ym(2023, 3));
        assert_eq!(window.end, ym(2025, 2));
        assert_eq!(window.months().count(), 24);
        assert_eq!(window.end_date(), NaiveDate::from_ymd_opt(2025, 2, 28));

        let january = ComparisonWindow::trailing(1, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(january.start, ym(2024, 1));
        assert_eq!(january.end, ym(2024, 12));

        assert!(ComparisonWindow::trailing(0, today).is_empty());
        assert_eq!(ComparisonWindow::trailing(0, today).months().count(), 0);
    }

    #[test]
    fn huge_window_does_not_overflow() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let window = ComparisonWindow::trailing(u32::MAX, today);
        assert_eq!(window.end, ym(2025, 2));
        assert!(window.start < window.end);
        assert_eq!(window.start_date(), None);

        let engine = ComparisonEngine::new(CompareOptions {
            window_years: u32::MAX,
            ..Default::default()
        });
        let config = ComparisonConfig::new(location("A", 1.0, 1.0), location("B", 2.0, 2.0));
        let history: HashMap<String, Vec<DailyRecord>> = HashMap::new();
        assert!(engine.compare(&config, &history, today).is_err());
        assert!(engine.cache().is_empty());
    }

    #[test]
    fn sparse_months_are_skipped() {
        let config = ComparisonConfig::new(location("A", 1.0, 1.0), location("B", 2.0, 2.0));
        let mut loc1 = month_of_days(ym(2024, 1), 31, 30_000.0);
        loc1.extend(month_of_days(ym(2024, 2), 10, 30_000.0));
        let mut loc2 = month_of_days(ym(2024, 1), 31, 20_000.0);
        loc2.extend(month_of_days(ym(2024, 2), 29, 20_000.0));
        let ctx = ComparisonContext {
            config: &config,
            window: ComparisonWindow {
                start: ym(2024, 1),
                end: ym(2024, 3),
            },
            loc1_history: &loc1,
            loc2_history: &loc2,
            min_days_per_month: MIN_DAYS_PER_MONTH,
        };
        let result = compare(&ctx);
        assert_eq!(result.months.len(), 1);
        assert_eq!(result.months[0].month, ym(2024, 1));
        assert_eq!(result.overall_winner, Side::Loc1);
    }

    #[test]
    fn records_outside_window_are_ignored() {
        let config = ComparisonConfig::new(location("A", 1.0, 1.0), location("B", 2.0, 2.0));
        let loc1 = month_of_days(ym(2023, 12), 31, 30_000.0);
        let loc2 = month_of_days(ym(2023, 12), 31, 20_000.0);
        let ctx = ComparisonContext {
            config: &config,
            window: ComparisonWindow {
                start: ym(2024, 1),
                end: ym(2024, 12),
            },
            loc1_history: &loc1,
            loc2_history: &loc2,
            min_days_per_month: MIN_DAYS_PER_MONTH,
        };
        assert_eq!(compare(&ctx), ComparisonResult::empty());
    }

    #[test]
    fn engine_reads_history_once_per_key() {
        let a = location("A", 1.0, 1.0);
        let b = location("B", 2.0, 2.0);
        let mut history: HashMap<String, Vec<DailyRecord>> = HashMap::new();
        history.insert(a.key(), month_of_days(ym(2024, 5), 31, 20_000.0));
        history.insert(b.key(), month_of_days(ym(2024, 5), 31, 30_000.0));

        let engine = ComparisonEngine::new(CompareOptions {
            window_years: 1,
            ..Default::default()
        });
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let config = ComparisonConfig::new(a, b);
        let first = engine.compare(&config, &history, today).unwrap();
        assert_eq!(first.overall_winner, Side::Loc2);
        assert_eq!(engine.cache().len(), 1);

        let swapped = engine.compare(&config.swapped(), &history, today).unwrap();
        assert_eq!(swapped, first.mirrored());
        assert_eq!(engine.cache().len(), 1);
    }

    #[test]
    fn a_new_today_is_not_served_the_old_window() {
        let a = location("A", 1.0, 1.0);
        let b = location("B", 2.0, 2.0);
        let mut history: HashMap<String, Vec<DailyRecord>> = HashMap::new();
        let mut a_days = month_of_days(ym(2023, 1), 31, 30_000.0);
        a_days.extend(month_of_days(ym(2025, 1), 31, 20_000.0));
        let mut b_days = month_of_days(ym(2023, 1), 31, 20_000.0);
        b_days.extend(month_of_days(ym(2025, 1), 31, 30_000.0));
        history.insert(a.key(), a_days);
        history.insert(b.key(), b_days);

        let options = CompareOptions {
            window_years: 1,
            ..Default::default()
        };
        let config = ComparisonConfig::new(a, b);
        let early = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        let late = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        let engine = ComparisonEngine::new(options);
        let first = engine.compare(&config, &history, early).unwrap();
        assert_eq!(first.overall_winner, Side::Loc1);

        let second = engine.compare(&config, &history, late).unwrap();
        let fresh = ComparisonEngine::new(options)
            .compare(&config, &history, late)
            .unwrap();
        assert_eq!(second, fresh);
        assert_eq!(second.window_start, Some(ym(2025, 1)));
        assert_eq!(second.overall_winner, Side::Loc2);
        assert_eq!(engine.cache().len(), 2);
    }
}
