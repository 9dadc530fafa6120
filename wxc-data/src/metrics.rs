//! Metric calculator: reduces one location's daily records for one calendar
//! month into [`MonthlyMetrics`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use wxc_core::daily_record::DailyRecord;
use wxc_core::month::YearMonth;
use wxc_core::sky::{PrecipKind, SkyCover};

/// Daily low (°F) at or below which a day counts as freezing.
pub const FREEZING_F: f64 = 32.0;
/// Daily high (°F) at or above which a day counts as hot.
pub const HOT_F: f64 = 90.0;
/// Feels-like high (°F) at or above which a day counts as sticky.
pub const STICKY_F: f64 = 100.0;
/// Daily high band (°F, inclusive) for a pleasantly cloudy day.
pub const COZY_HIGH_MIN_F: f64 = 55.0;
pub const COZY_HIGH_MAX_F: f64 = 80.0;

/// A named monthly statistic.
///
/// Declaration order is the canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    SunshineHours,
    RainyDays,
    OvercastDays,
    CozyOvercastDays,
    SnowDays,
    FreezingDays,
    HotDays,
    StickyDays,
    AvgDaylightHours,
    AvgSunsetMin,
    AvgHigh,
    AvgLow,
}

impl Metric {
    pub const ALL: [Metric; 12] = [
        Metric::SunshineHours,
        Metric::RainyDays,
        Metric::OvercastDays,
        Metric::CozyOvercastDays,
        Metric::SnowDays,
        Metric::FreezingDays,
        Metric::HotDays,
        Metric::StickyDays,
        Metric::AvgDaylightHours,
        Metric::AvgSunsetMin,
        Metric::AvgHigh,
        Metric::AvgLow,
    ];

    /// Wire key, e.g. `"sunshine_hours"`.
    pub fn key(self) -> &'static str {
        match self {
            Metric::SunshineHours => "sunshine_hours",
            Metric::RainyDays => "rainy_days",
            Metric::OvercastDays => "overcast_days",
            Metric::CozyOvercastDays => "cozy_overcast_days",
            Metric::SnowDays => "snow_days",
            Metric::FreezingDays => "freezing_days",
            Metric::HotDays => "hot_days",
            Metric::StickyDays => "sticky_days",
            Metric::AvgDaylightHours => "avg_daylight_hours",
            Metric::AvgSunsetMin => "avg_sunset_min",
            Metric::AvgHigh => "avg_high",
            Metric::AvgLow => "avg_low",
        }
    }

    /// Day-count metrics that are zero in climates where the condition never
    /// happens (no snow in Houston, no heat in Seattle).
    pub fn is_activity(self) -> bool {
        matches!(
            self,
            Metric::SnowDays
                | Metric::FreezingDays
                | Metric::HotDays
                | Metric::StickyDays
                | Metric::CozyOvercastDays
        )
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseMetricError(pub String);

impl fmt::Display for ParseMetricError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown metric key {:?}", self.0)
    }
}

impl std::error::Error for ParseMetricError {}

impl FromStr for Metric {
    type Err = ParseMetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Metric::ALL
            .into_iter()
            .find(|m| m.key() == s)
            .ok_or_else(|| ParseMetricError(s.to_string()))
    }
}

/// Errors from computing a month's metrics.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricsError {
    /// No records were supplied for the month.
    EmptyMonth(YearMonth),
    /// A record dated outside the month was supplied.
    OutsideMonth {
        month: YearMonth,
        date: chrono::NaiveDate,
    },
}

impl fmt::Display for MetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricsError::EmptyMonth(month) => write!(f, "no daily records for {month}"),
            MetricsError::OutsideMonth { month, date } => {
                write!(f, "record dated {date} does not belong to {month}")
            }
        }
    }
}

impl std::error::Error for MetricsError {}

/// Statistics for one location over one calendar month.
///
/// A metric is `None` when no day in the month carried the input it needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyMetrics {
    /// Total hours of sunshine over the month
    pub sunshine_hours: Option<f64>,
    pub rainy_days: Option<f64>,
    pub overcast_days: Option<f64>,
    pub cozy_overcast_days: Option<f64>,
    pub snow_days: Option<f64>,
    pub freezing_days: Option<f64>,
    pub hot_days: Option<f64>,
    pub sticky_days: Option<f64>,
    pub avg_daylight_hours: Option<f64>,
    /// Mean sunset, whole minutes since local midnight
    pub avg_sunset_min: Option<f64>,
    pub avg_high: Option<f64>,
    pub avg_low: Option<f64>,
}

impl MonthlyMetrics {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::SunshineHours => self.sunshine_hours,
            Metric::RainyDays => self.rainy_days,
            Metric::OvercastDays => self.overcast_days,
            Metric::CozyOvercastDays => self.cozy_overcast_days,
            Metric::SnowDays => self.snow_days,
            Metric::FreezingDays => self.freezing_days,
            Metric::HotDays => self.hot_days,
            Metric::StickyDays => self.sticky_days,
            Metric::AvgDaylightHours => self.avg_daylight_hours,
            Metric::AvgSunsetMin => self.avg_sunset_min,
            Metric::AvgHigh => self.avg_high,
            Metric::AvgLow => self.avg_low,
        }
    }

    /// Compute a month's metrics from that month's daily records.
    ///
    /// Fails when `records` is empty or contains a day outside `month`;
    /// use [`partition_by_month`] to split a history first.
    pub fn from_records<'a, I>(month: YearMonth, records: I) -> Result<MonthlyMetrics, MetricsError>
    where
        I: IntoIterator<Item = &'a DailyRecord>,
    {
        let mut acc = MonthAccumulator::default();
        for record in records {
            if !month.contains(&record.date) {
                return Err(MetricsError::OutsideMonth {
                    month,
                    date: record.date,
                });
            }
            acc.push(record);
        }
        if acc.days == 0 {
            return Err(MetricsError::EmptyMonth(month));
        }
        Ok(acc.finish())
    }
}

/// A dry, fully overcast day with a mild high.
pub fn is_cozy_overcast(record: &DailyRecord) -> bool {
    let overcast = record.sky_cover() >= Some(SkyCover::Overcast);
    let mild = record
        .high
        .is_some_and(|h| (COZY_HIGH_MIN_F..=COZY_HIGH_MAX_F).contains(&h));
    overcast && mild && record.precip_kind().is_none()
}

/// Group a history by calendar month, chronologically.
///
/// When a date appears more than once, the first record wins.
pub fn partition_by_month(records: &[DailyRecord]) -> BTreeMap<YearMonth, Vec<&DailyRecord>> {
    let mut months: BTreeMap<YearMonth, Vec<&DailyRecord>> = BTreeMap::new();
    for record in records {
        let days = months.entry(YearMonth::of(&record.date)).or_default();
        if days.iter().any(|d| d.date == record.date) {
            log::debug!("Duplicate daily record for {}, keeping the first", record.date);
            continue;
        }
        days.push(record);
    }
    months
}

#[derive(Default)]
struct Tally {
    observed: bool,
    count: u32,
}

impl Tally {
    fn observe(&mut self, hit: bool) {
        self.observed = true;
        if hit {
            self.count += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        self.observed.then_some(self.count as f64)
    }
}

#[derive(Default)]
struct Mean {
    sum: f64,
    n: u32,
}

impl Mean {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.n += 1;
        }
    }

    fn total(&self) -> Option<f64> {
        (self.n > 0).then_some(self.sum)
    }

    fn mean(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / self.n as f64)
    }
}

#[derive(Default)]
struct MonthAccumulator {
    days: usize,
    sunshine: Mean,
    rainy: Tally,
    snow: Tally,
    overcast: Tally,
    cozy: Tally,
    freezing: Tally,
    hot: Tally,
    sticky: Tally,
    daylight: Mean,
    sunset: Mean,
    high: Mean,
    low: Mean,
}

impl MonthAccumulator {
    fn push(&mut self, r: &DailyRecord) {
        self.days += 1;
        self.sunshine.push(r.sunshine_hours());
        if r.has_precip_data() {
            let kind = r.precip_kind();
            self.rainy.observe(kind == Some(PrecipKind::Rain));
            self.snow.observe(kind == Some(PrecipKind::Snow));
        }
        if let Some(sky) = r.sky_cover() {
            self.overcast.observe(sky >= SkyCover::Overcast);
            self.cozy.observe(is_cozy_overcast(r));
        }
        if let Some(low) = r.low {
            self.freezing.observe(low <= FREEZING_F);
        }
        if let Some(high) = r.high {
            self.hot.observe(high >= HOT_F);
        }
        if let Some(feels) = r.feels_like_high() {
            self.sticky.observe(feels >= STICKY_F);
        }
        self.daylight.push(r.daylight_hours());
        self.sunset.push(r.sunset_minutes().map(f64::from));
        self.high.push(r.high);
        self.low.push(r.low);
    }

    fn finish(self) -> MonthlyMetrics {
        MonthlyMetrics {
            sunshine_hours: self.sunshine.total().map(|v| round_to(v, 1)),
            rainy_days: self.rainy.value(),
            overcast_days: self.overcast.value(),
            cozy_overcast_days: self.cozy.value(),
            snow_days: self.snow.value(),
            freezing_days: self.freezing.value(),
            hot_days: self.hot.value(),
            sticky_days: self.sticky.value(),
            avg_daylight_hours: self.daylight.mean().map(|v| round_to(v, 2)),
            avg_sunset_min: self.sunset.mean().map(f64::round),
            avg_high: self.high.mean().map(|v| round_to(v, 1)),
            avg_low: self.low.mean().map(|v| round_to(v, 1)),
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wxc_core::sky::WmoCode;
    use wxc_utils::dates::parse_timestamp;

    fn june() -> YearMonth {
        YearMonth::new(2024, 6).unwrap()
    }

    fn day(d: u32) -> DailyRecord {
        DailyRecord::new(NaiveDate::from_ymd_opt(2024, 6, d).unwrap())
    }

    #[test]
    fn metric_keys_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(metric.key().parse::<Metric>().unwrap(), metric);
            let json = serde_json::to_string(&metric).unwrap();
            assert_eq!(json, format!("\"{}\"", metric.key()));
        }
        assert!("sunshine".parse::<Metric>().is_err());
    }

    #[test]
    fn empty_month_is_an_error() {
        let none: Vec<DailyRecord> = Vec::new();
        assert_eq!(
            MonthlyMetrics::from_records(june(), &none),
            Err(MetricsError::EmptyMonth(june()))
        );
    }

    #[test]
    fn record_outside_month_is_an_error() {
        let records = vec![
            day(30),
            DailyRecord::new(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()),
        ];
        assert!(matches!(
            MonthlyMetrics::from_records(june(), &records),
            Err(MetricsError::OutsideMonth { .. })
        ));
    }

    #[test]
    fn sunshine_is_a_monthly_total() {
        let records: Vec<DailyRecord> = (1..=3)
            .map(|d| {
                let mut r = day(d);
                r.sunshine_sec = Some(36_000.0);
                r
            })
            .collect();
        let metrics = MonthlyMetrics::from_records(june(), &records).unwrap();
        assert_eq!(metrics.sunshine_hours, Some(30.0));
    }

    #[test]
    fn counts_rain_and_snow_days_above_trace() {
        let mut trace = day(1);
        trace.precip = Some(0.01);
        let mut rain = day(2);
        rain.precip = Some(0.5);
        let mut snow = day(3);
        snow.precip = Some(0.4);
        snow.snowfall = Some(3.0);
        let unmeasured = day(4);
        let records = vec![trace, rain, snow, unmeasured];
        let metrics = MonthlyMetrics::from_records(june(), &records).unwrap();
        assert_eq!(metrics.rainy_days, Some(1.0));
        assert_eq!(metrics.snow_days, Some(1.0));
    }

    #[test]
    fn missing_inputs_yield_null_metrics() {
        let records = vec![day(1), day(2)];
        let metrics = MonthlyMetrics::from_records(june(), &records).unwrap();
        assert_eq!(metrics, MonthlyMetrics::default());
    }

    #[test]
    fn temperature_thresholds() {
        let temps = [(101.0, 80.0, None), (90.0, 70.0, Some(99.0)), (60.0, 32.0, None)];
        let records: Vec<DailyRecord> = temps
            .iter()
            .enumerate()
            .map(|(i, (high, low, feels))| {
                let mut r = day(i as u32 + 1);
                r.high = Some(*high);
                r.low = Some(*low);
                r.apparent_high = *feels;
                r
            })
            .collect();
        let metrics = MonthlyMetrics::from_records(june(), &records).unwrap();
        assert_eq!(metrics.hot_days, Some(2.0));
        // day 1 falls back to its plain high, day 2 feels like 99
        assert_eq!(metrics.sticky_days, Some(1.0));
        assert_eq!(metrics.freezing_days, Some(1.0));
        assert_eq!(metrics.avg_high, Some(83.7));
        assert_eq!(metrics.avg_low, Some(60.7));
    }

    #[test]
    fn cozy_overcast_is_a_subset_of_overcast() {
        let mut cozy = day(1);
        cozy.weather_code = Some(WmoCode(3));
        cozy.high = Some(68.0);
        cozy.precip = Some(0.0);

        let mut rainy_overcast = day(2);
        rainy_overcast.weather_code = Some(WmoCode(63));
        rainy_overcast.high = Some(68.0);
        rainy_overcast.precip = Some(0.8);

        let mut hot_overcast = day(3);
        hot_overcast.cloud_cover = Some(95.0);
        hot_overcast.high = Some(91.0);

        let mut sunny = day(4);
        sunny.weather_code = Some(WmoCode(0));
        sunny.high = Some(70.0);

        assert!(is_cozy_overcast(&cozy));
        assert!(!is_cozy_overcast(&rainy_overcast));
        assert!(!is_cozy_overcast(&hot_overcast));
        assert!(!is_cozy_overcast(&sunny));

        let records = vec![cozy, rainy_overcast, hot_overcast, sunny];
        let metrics = MonthlyMetrics::from_records(june(), &records).unwrap();
        assert_eq!(metrics.overcast_days, Some(3.0));
        assert_eq!(metrics.cozy_overcast_days, Some(1.0));
    }

    #[test]
    fn daylight_and_sunset_averages() {
        let mut a = day(1);
        a.sunrise = Some(parse_timestamp("2024-06-01T06:00").unwrap());
        a.sunset = Some(parse_timestamp("2024-06-01T20:00").unwrap());
        let mut b = day(2);
        b.sunset = Some(parse_timestamp("2024-06-02T20:21").unwrap());
        let records = vec![a, b];
        let metrics = MonthlyMetrics::from_records(june(), &records).unwrap();
        // only day 1 has both timestamps
        assert_eq!(metrics.avg_daylight_hours, Some(14.0));
        // (1200 + 1221) / 2 = 1210.5, rounded to a whole minute
        assert_eq!(metrics.avg_sunset_min, Some(1211.0));
    }

    #[test]
    fn partition_groups_and_dedupes() {
        let records = vec![
            DailyRecord::new(NaiveDate::from_ymd_opt(2024, 5, 31).unwrap()),
            day(1),
            day(1),
            day(2),
        ];
        let months = partition_by_month(&records);
        assert_eq!(months.len(), 2);
        assert_eq!(months[&YearMonth::new(2024, 5).unwrap()].len(), 1);
        assert_eq!(months[&june()].len(), 2);
        let keys: Vec<YearMonth> = months.keys().copied().collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn calculation_is_deterministic() {
        let records: Vec<DailyRecord> = (1..=30)
            .map(|d| {
                let mut r = day(d);
                r.high = Some(70.0 + d as f64 * 0.7);
                r.low = Some(50.0 + d as f64 * 0.3);
                r.precip = Some(if d % 4 == 0 { 0.3 } else { 0.0 });
                r.sunshine_sec = Some(20_000.0 + d as f64 * 333.3);
                r
            })
            .collect();
        let a = MonthlyMetrics::from_records(june(), &records).unwrap();
        let b = MonthlyMetrics::from_records(june(), records.iter()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.rainy_days, Some(7.0));
    }
}
