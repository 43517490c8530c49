//! Data types produced by the aggregation functions.

use chrono::NaiveDate;
use serde::Serialize;

/// Punctuality KPIs of a set of records, usually one route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub scheduled_total: u64,
    /// Mean of the per-record average delay. `None` when there are no records.
    pub avg_delay_minutes: Option<f64>,
    pub delay_rate_pct: f64,
    pub cancelled_total: u64,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub trip_count: usize,
}

/// One point of the monthly charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodPoint {
    pub date: NaiveDate,
    pub mean_delay_minutes: f64,
    pub scheduled_sum: u64,
}
