use crate::analyzers::types::Metrics;
use crate::analyzers::utility::{mean, pct};
use crate::record::Record;

/// Aggregates a set of records into route [`Metrics`].
///
/// Always recomputed from scratch; an empty set gives zero totals, a 0% delay
/// rate and no mean delay.
pub fn aggregate<'a, I>(records: I) -> Metrics
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut scheduled_total = 0u64;
    let mut delayed_total = 0u64;
    let mut cancelled_total = 0u64;
    let mut delays = Vec::new();
    let mut date_range: Option<(chrono::NaiveDate, chrono::NaiveDate)> = None;

    for record in records {
        scheduled_total += u64::from(record.scheduled_count);
        delayed_total += u64::from(record.delayed());
        cancelled_total += u64::from(record.cancelled());
        delays.push(record.avg_delay_all_trains);

        date_range = Some(match date_range {
            None => (record.date, record.date),
            Some((min, max)) => (min.min(record.date), max.max(record.date)),
        });
    }

    Metrics {
        scheduled_total,
        avg_delay_minutes: mean(&delays),
        delay_rate_pct: pct(delayed_total, scheduled_total),
        cancelled_total,
        date_range,
        trip_count: delays.len(),
    }
}

/// Mean of the known average trip durations, in minutes.
pub fn mean_duration<'a, I>(records: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a Record>,
{
    let durations: Vec<f64> = records
        .into_iter()
        .filter_map(|r| r.avg_duration_minutes)
        .collect();
    mean(&durations)
}
