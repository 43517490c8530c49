use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::analyzers::types::PeriodPoint;
use crate::record::Record;

/// Groups records by date and returns one chart point per period, oldest first.
///
/// Each point carries the mean of `avg_delay_all_trains` and the sum of
/// scheduled circulations for that period.
pub fn monthly_series<'a, I>(records: I) -> Vec<PeriodPoint>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut periods: BTreeMap<NaiveDate, (f64, usize, u64)> = BTreeMap::new();

    for record in records {
        let entry = periods.entry(record.date).or_insert((0.0, 0, 0));
        entry.0 += record.avg_delay_all_trains;
        entry.1 += 1;
        entry.2 += u64::from(record.scheduled_count);
    }

    periods
        .into_iter()
        .map(|(date, (delay_sum, count, scheduled_sum))| PeriodPoint {
            date,
            mean_delay_minutes: delay_sum / count as f64,
            scheduled_sum,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::record;

    #[test]
    fn test_series_groups_and_sorts() {
        let mut a = record("Paris", "Lyon", "2023-02-01");
        a.avg_delay_all_trains = 4.0;
        a.scheduled_count = 10;
        let mut b = record("Paris", "Lyon", "2023-01-01");
        b.avg_delay_all_trains = 1.0;
        let mut c = record("Paris", "Lyon", "2023-02-01");
        c.avg_delay_all_trains = 2.0;
        c.scheduled_count = 5;

        let series = monthly_series(&[a, b, c]);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(series[0].mean_delay_minutes, 1.0);
        assert_eq!(series[0].scheduled_sum, 100);
        assert_eq!(series[1].mean_delay_minutes, 3.0);
        assert_eq!(series[1].scheduled_sum, 15);
    }

    #[test]
    fn test_series_empty() {
        assert!(monthly_series(&[] as &[Record]).is_empty());
    }
}
