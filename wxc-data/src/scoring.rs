//! Month scorer: head-to-head vote between two locations' metrics for one month.

use crate::metrics::{Metric, MonthlyMetrics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use wxc_core::month::YearMonth;

/// Sunset averages must differ by more than this many minutes to earn a point.
pub const SUNSET_THRESHOLD_MIN: f64 = 10.0;

/// Which location won, or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Loc1,
    Loc2,
    Tie,
}

impl Side {
    /// The same outcome with the locations exchanged.
    pub fn mirrored(self) -> Side {
        match self {
            Side::Loc1 => Side::Loc2,
            Side::Loc2 => Side::Loc1,
            Side::Tie => Side::Tie,
        }
    }

    /// Winner of a tally, ties when equal.
    pub fn from_scores(loc1: u32, loc2: u32) -> Side {
        match loc1.cmp(&loc2) {
            std::cmp::Ordering::Greater => Side::Loc1,
            std::cmp::Ordering::Less => Side::Loc2,
            std::cmp::Ordering::Equal => Side::Tie,
        }
    }
}

/// How a metric decides a head-to-head comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringRule {
    HigherIsBetter,
    LowerIsBetter,
    /// Later sunset wins, but only beyond [`SUNSET_THRESHOLD_MIN`].
    LaterSunset,
}

impl ScoringRule {
    /// Compare two present values under this rule.
    pub fn decide(self, loc1: f64, loc2: f64) -> Side {
        match self {
            ScoringRule::HigherIsBetter => strict(loc1, loc2),
            ScoringRule::LowerIsBetter => strict(loc2, loc1),
            ScoringRule::LaterSunset => {
                if (loc1 - loc2).abs() > SUNSET_THRESHOLD_MIN {
                    strict(loc1, loc2)
                } else {
                    Side::Tie
                }
            }
        }
    }
}

fn strict(better_if_greater: f64, other: f64) -> Side {
    if better_if_greater > other {
        Side::Loc1
    } else if better_if_greater < other {
        Side::Loc2
    } else {
        Side::Tie
    }
}

impl Metric {
    /// Scoring rule, `None` for informational metrics.
    pub fn scoring_rule(self) -> Option<ScoringRule> {
        match self {
            Metric::SunshineHours
            | Metric::OvercastDays
            | Metric::CozyOvercastDays
            | Metric::AvgDaylightHours => Some(ScoringRule::HigherIsBetter),
            Metric::RainyDays
            | Metric::SnowDays
            | Metric::FreezingDays
            | Metric::HotDays
            | Metric::StickyDays => Some(ScoringRule::LowerIsBetter),
            Metric::AvgSunsetMin => Some(ScoringRule::LaterSunset),
            Metric::AvgHigh | Metric::AvgLow => None,
        }
    }
}

/// Outcome of comparing one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthResult {
    pub month: YearMonth,
    pub loc1: MonthlyMetrics,
    pub loc2: MonthlyMetrics,
    pub winner: Side,
    pub loc1_score: u32,
    pub loc2_score: u32,
    /// Scored metrics where both sides were present and neither won
    pub metric_ties: u32,
    /// Rounded loc1 minus loc2 mean sunset, in minutes
    pub sunset_diff: Option<i64>,
}

impl MonthResult {
    /// A month one side won without the other scoring at all.
    pub fn is_sweep(&self) -> bool {
        match self.winner {
            Side::Loc1 => self.loc2_score == 0,
            Side::Loc2 => self.loc1_score == 0,
            Side::Tie => false,
        }
    }

    /// Metrics that cast a vote or tied.
    pub fn metrics_compared(&self) -> u32 {
        self.loc1_score + self.loc2_score + self.metric_ties
    }

    /// Per-metric outcome, `None` when the metric has no rule or a side is missing.
    pub fn metric_outcome(&self, metric: Metric) -> Option<Side> {
        let rule = metric.scoring_rule()?;
        Some(rule.decide(self.loc1.get(metric)?, self.loc2.get(metric)?))
    }

    /// The same month with the locations exchanged.
    pub fn mirrored(&self) -> MonthResult {
        MonthResult {
            month: self.month,
            loc1: self.loc2.clone(),
            loc2: self.loc1.clone(),
            winner: self.winner.mirrored(),
            loc1_score: self.loc2_score,
            loc2_score: self.loc1_score,
            metric_ties: self.metric_ties,
            sunset_diff: self.sunset_diff.map(|d| -d),
        }
    }
}

/// Score one month between two locations.
///
/// Only metrics in `scored` with a scoring rule vote. A metric missing on
/// either side is skipped, not counted as a tie.
pub fn score_month(
    month: YearMonth,
    loc1: MonthlyMetrics,
    loc2: MonthlyMetrics,
    scored: &BTreeSet<Metric>,
) -> MonthResult {
    let (mut loc1_score, mut loc2_score, mut metric_ties) = (0, 0, 0);
    for metric in scored {
        let Some(rule) = metric.scoring_rule() else {
            continue;
        };
        let (Some(a), Some(b)) = (loc1.get(*metric), loc2.get(*metric)) else {
            continue;
        };
        match rule.decide(a, b) {
            Side::Loc1 => loc1_score += 1,
            Side::Loc2 => loc2_score += 1,
            Side::Tie => metric_ties += 1,
        }
    }
    let sunset_diff = match (loc1.avg_sunset_min, loc2.avg_sunset_min) {
        (Some(a), Some(b)) => Some((a - b).round() as i64),
        _ => None,
    };
    log::debug!("{month}: loc1 {loc1_score}, loc2 {loc2_score}, ties {metric_ties}");
    MonthResult {
        month,
        winner: Side::from_scores(loc1_score, loc2_score),
        loc1,
        loc2,
        loc1_score,
        loc2_score,
        metric_ties,
        sunset_diff,
    }
}
