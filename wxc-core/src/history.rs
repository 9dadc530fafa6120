use crate::daily_record::DailyRecord;
use crate::location::Location;
use chrono::NaiveDate;

/// Source of historical daily weather for a location.
///
/// Implementations return the records with `start <= date <= end`,
/// ordered by date, one per day at most. Days with no data are simply absent.
pub trait DailyHistory {
    fn daily_records(
        &self,
        location: &Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<DailyRecord>>;
}

/// A fixed, already-fetched history snapshot keyed by location key.
impl DailyHistory for std::collections::HashMap<String, Vec<DailyRecord>> {
    fn daily_records(
        &self,
        location: &Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<DailyRecord>> {
        let mut records: Vec<DailyRecord> = self
            .get(&location.key())
            .map(|all| {
                all.iter()
                    .filter(|r| start <= r.date && r.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        records.sort_by_key(|r| r.date);
        records.dedup_by_key(|r| r.date);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::DailyHistory;
    use crate::daily_record::DailyRecord;
    use crate::location::Location;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn test_snapshot_filters_and_orders() {
        let location = Location {
            name: "Houston".to_string(),
            lat: 29.76,
            lon: -95.37,
            timezone: "America/Chicago".to_string(),
            region: String::new(),
            country: String::new(),
        };
        let mut snapshot = HashMap::new();
        snapshot.insert(
            location.key(),
            vec![
                DailyRecord::new(date(3, 2)),
                DailyRecord::new(date(1, 15)),
                DailyRecord::new(date(2, 1)),
                DailyRecord::new(date(2, 1)),
            ],
        );
        let records = snapshot
            .daily_records(&location, date(2, 1), date(3, 31))
            .unwrap();
        let dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(2, 1), date(3, 2)]);
    }
}
