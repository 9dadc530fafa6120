//! Aggregator: folds month results into the overall comparison.

use crate::scoring::{MonthResult, Side};
use serde::{Deserialize, Serialize};
use wxc_core::month::YearMonth;

/// Outcome of a full comparison over a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Compared months, oldest first
    pub months: Vec<MonthResult>,
    pub loc1_wins: u32,
    pub loc2_wins: u32,
    pub overall_winner: Side,
    pub window_start: Option<YearMonth>,
    pub window_end: Option<YearMonth>,
}

/// Month wins per calendar year, for charting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearTally {
    pub year: i32,
    pub loc1_wins: u32,
    pub loc2_wins: u32,
    pub ties: u32,
}

/// Combine month results into a [`ComparisonResult`].
///
/// Months are sorted chronologically first, so the result does not depend
/// on input order.
pub fn aggregate(mut months: Vec<MonthResult>) -> ComparisonResult {
    months.sort_by_key(|m| m.month);
    let (mut loc1_wins, mut loc2_wins) = (0, 0);
    for month in &months {
        match month.winner {
            Side::Loc1 => loc1_wins += 1,
            Side::Loc2 => loc2_wins += 1,
            Side::Tie => {}
        }
    }
    let window_start = months.first().map(|m| m.month);
    let window_end = months.last().map(|m| m.month);
    ComparisonResult {
        loc1_wins,
        loc2_wins,
        overall_winner: Side::from_scores(loc1_wins, loc2_wins),
        window_start,
        window_end,
        months,
    }
}

impl ComparisonResult {
    /// A comparison with no eligible months.
    pub fn empty() -> ComparisonResult {
        aggregate(Vec::new())
    }

    /// Months neither location won.
    pub fn ties(&self) -> u32 {
        (self.months.len() as u32).saturating_sub(self.loc1_wins + self.loc2_wins)
    }

    /// The same comparison with the locations exchanged.
    pub fn mirrored(&self) -> ComparisonResult {
        ComparisonResult {
            months: self.months.iter().map(MonthResult::mirrored).collect(),
            loc1_wins: self.loc2_wins,
            loc2_wins: self.loc1_wins,
            overall_winner: self.overall_winner.mirrored(),
            window_start: self.window_start,
            window_end: self.window_end,
        }
    }

    /// Check the internal bookkeeping: months strictly chronological, each
    /// winner agreeing with its scores, and totals agreeing with the months.
    pub fn is_consistent(&self) -> bool {
        let ordered = self.months.windows(2).all(|w| w[0].month < w[1].month);
        let winners_match = self
            .months
            .iter()
            .all(|m| m.winner == Side::from_scores(m.loc1_score, m.loc2_score));
        let count = |side: Side| self.months.iter().filter(|m| m.winner == side).count() as u32;
        ordered
            && winners_match
            && count(Side::Loc1) == self.loc1_wins
            && count(Side::Loc2) == self.loc2_wins
            && self.overall_winner == Side::from_scores(self.loc1_wins, self.loc2_wins)
            && self.window_start == self.months.first().map(|m| m.month)
            && self.window_end == self.months.last().map(|m| m.month)
    }

    /// Month wins grouped by calendar year, oldest first.
    pub fn yearly_series(&self) -> Vec<YearTally> {
        let mut series: Vec<YearTally> = Vec::new();
        for month in &self.months {
            let year = month.month.year;
            if series.last().map(|t| t.year) != Some(year) {
                series.push(YearTally {
                    year,
                    loc1_wins: 0,
                    loc2_wins: 0,
                    ties: 0,
                });
            }
            if let Some(tally) = series.last_mut() {
                match month.winner {
                    Side::Loc1 => tally.loc1_wins += 1,
                    Side::Loc2 => tally.loc2_wins += 1,
                    Side::Tie => tally.ties += 1,
                }
            }
        }
        series
    }
}
