//! Read-only presentations of a [`ComparisonResult`]. None of these reorder
//! the result's months.

use crate::aggregate::ComparisonResult;
use crate::scoring::{MonthResult, Side};
use serde::Serialize;
use wxc_core::month::YearMonth;

/// Results for one calendar month (e.g. every January) across years.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarMonthGroup<'a> {
    /// 1..=12
    pub month: u32,
    pub loc1_wins: u32,
    pub loc2_wins: u32,
    pub ties: u32,
    pub months: Vec<&'a MonthResult>,
}

/// Group months by calendar month, January first. Calendar months with no
/// compared data are left out.
pub fn by_calendar_month(result: &ComparisonResult) -> Vec<CalendarMonthGroup<'_>> {
    (1..=12)
        .filter_map(|calendar_month| {
            let months: Vec<&MonthResult> = result
                .months
                .iter()
                .filter(|m| m.month.month == calendar_month)
                .collect();
            if months.is_empty() {
                return None;
            }
            let wins = |side: Side| months.iter().filter(|m| m.winner == side).count() as u32;
            Some(CalendarMonthGroup {
                month: calendar_month,
                loc1_wins: wins(Side::Loc1),
                loc2_wins: wins(Side::Loc2),
                ties: wins(Side::Tie),
                months,
            })
        })
        .collect()
}

/// A run of consecutive calendar months with the same winner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Streak<'a> {
    pub winner: Side,
    pub start: YearMonth,
    pub end: YearMonth,
    pub months: Vec<&'a MonthResult>,
}

impl Streak<'_> {
    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}

/// Split the months into winner streaks. A month missing from the result
/// (skipped for lack of data) breaks a streak.
pub fn streaks(result: &ComparisonResult) -> Vec<Streak<'_>> {
    let mut runs: Vec<Streak> = Vec::new();
    for month in &result.months {
        let current = runs
            .last_mut()
            .filter(|run| run.winner == month.winner && run.end.succ() == month.month);
        if let Some(run) = current {
            run.end = month.month;
            run.months.push(month);
            continue;
        }
        runs.push(Streak {
            winner: month.winner,
            start: month.month,
            end: month.month,
            months: vec![month],
        });
    }
    runs
}

/// The longest streak won by `side`, earliest on a tie.
pub fn longest_streak<'a>(result: &'a ComparisonResult, side: Side) -> Option<Streak<'a>> {
    streaks(result)
        .into_iter()
        .filter(|s| s.winner == side)
        .fold(None, |best: Option<Streak>, s| match best {
            Some(b) if b.len() >= s.len() => Some(b),
            _ => Some(s),
        })
}

/// Months one side won without the other scoring, oldest first.
pub fn sweeps(result: &ComparisonResult) -> Vec<&MonthResult> {
    result.months.iter().filter(|m| m.is_sweep()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::aggregate::tests::month_result;

    fn sample() -> ComparisonResult {
        aggregate(vec![
            month_result(2023, 1, 4, 1),
            month_result(2023, 2, 6, 0),
            month_result(2023, 3, 2, 5),
            month_result(2024, 1, 3, 3),
            month_result(2024, 2, 5, 2),
            month_result(2024, 3, 0, 4),
            month_result(2024, 5, 0, 7),
        ])
    }

    #[test]
    fn groups_by_calendar_month() {
        let result = sample();
        let groups = by_calendar_month(&result);
        let labels: Vec<u32> = groups.iter().map(|g| g.month).collect();
        assert_eq!(labels, vec![1, 2, 3, 5]);

        let january = &groups[0];
        assert_eq!(january.loc1_wins, 1);
        assert_eq!(january.ties, 1);
        assert_eq!(january.months.len(), 2);
        assert!(january.months[0].month < january.months[1].month);

        let february = &groups[1];
        assert_eq!(february.loc1_wins, 2);
        assert_eq!(february.loc2_wins, 0);
    }

    #[test]
    fn streaks_break_on_winner_change_and_gaps() {
        let result = sample();
        let runs = streaks(&result);
        let summary: Vec<(Side, String, usize)> = runs
            .iter()
            .map(|r| (r.winner, r.start.to_string(), r.len()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Side::Loc1, "2023-01".to_string(), 2),
                (Side::Loc2, "2023-03".to_string(), 1),
                (Side::Tie, "2024-01".to_string(), 1),
                (Side::Loc1, "2024-02".to_string(), 1),
                (Side::Loc2, "2024-03".to_string(), 1),
                (Side::Loc2, "2024-05".to_string(), 1),
            ]
        );
        assert_eq!(runs.iter().map(Streak::len).sum::<usize>(), result.months.len());
    }

    #[test]
    fn longest_streak_per_side() {
        let result = sample();
        let best = longest_streak(&result, Side::Loc1).unwrap();
        assert_eq!(best.start.to_string(), "2023-01");
        assert_eq!(best.end.to_string(), "2023-02");
        let loc2 = longest_streak(&result, Side::Loc2).unwrap();
        assert_eq!(loc2.start.to_string(), "2023-03");
        assert!(longest_streak(&ComparisonResult::empty(), Side::Loc1).is_none());
    }

    #[test]
    fn sweeps_in_order() {
        let result = sample();
        let months: Vec<String> = sweeps(&result).iter().map(|m| m.month.to_string()).collect();
        assert_eq!(months, vec!["2023-02", "2024-03", "2024-05"]);
    }

    #[test]
    fn views_leave_result_untouched() {
        let result = sample();
        let before = result.clone();
        let _ = by_calendar_month(&result);
        let _ = streaks(&result);
        let _ = sweeps(&result);
        assert_eq!(result, before);
    }
}
