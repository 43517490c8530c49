//! What-if simulation on a route.
//!
//! [`Simulator`] owns the working [`Dataset`] and the selected [`Route`]. Users
//! add synthetic trains or remove existing records; every action is followed by
//! a fresh aggregation of the selected route so the reported KPIs always match
//! the current record set.

use std::ops::RangeInclusive;

use chrono::{NaiveDate, NaiveTime, TimeDelta};
use serde::Serialize;
use tracing::{info, warn};

use crate::analyzers::metrics::aggregate;
use crate::analyzers::types::Metrics;
use crate::dataset::{Dataset, Entry};
use crate::normalize::normalize;
use crate::record::{Record, RecordId, Route};

/// Accepted planned duration of a simulated train, in minutes.
pub const DURATION_RANGE: RangeInclusive<i64> = 10..=600;
/// Accepted simulated delay, in minutes.
pub const DELAY_RANGE: RangeInclusive<i64> = 0..=300;

const MINUTES_PER_DAY: i64 = 24 * 60;

pub fn clamp_duration(minutes: i64) -> i64 {
    minutes.clamp(*DURATION_RANGE.start(), *DURATION_RANGE.end())
}

pub fn clamp_delay(minutes: i64) -> i64 {
    minutes.clamp(*DELAY_RANGE.start(), *DELAY_RANGE.end())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    #[error("{field} must not be negative (got {value})")]
    NegativeMinutes { field: &'static str, value: i64 },
    #[error("nothing to remove on {0}")]
    NothingToRemove(Route),
    #[error("no record {id} on {route}")]
    UnknownRecord { id: RecordId, route: Route },
}

/// A single train the user wants to add.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticTrain {
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
    pub departure_time: NaiveTime,
    pub duration_minutes: i64,
    pub train_type: String,
    pub simulated_delay_minutes: i64,
}

impl SyntheticTrain {
    /// Builds the record for this train.
    ///
    /// One scheduled circulation, never cancelled, delayed only when the
    /// simulated delay is positive. The estimated arrival is the departure plus
    /// duration plus delay, wrapping past midnight.
    pub fn to_record(&self) -> Result<Record, SimulationError> {
        if self.duration_minutes < 0 {
            return Err(SimulationError::NegativeMinutes {
                field: "duration",
                value: self.duration_minutes,
            });
        }
        if self.simulated_delay_minutes < 0 {
            return Err(SimulationError::NegativeMinutes {
                field: "delay",
                value: self.simulated_delay_minutes,
            });
        }

        let delay = self.simulated_delay_minutes;
        // only the time of day is kept, so whole days can be dropped first
        let offset = self.duration_minutes % MINUTES_PER_DAY + delay % MINUTES_PER_DAY;
        let (arrival, _) = self
            .departure_time
            .overflowing_add_signed(TimeDelta::minutes(offset));

        Ok(Record {
            date: self.date,
            origin: normalize(&self.origin),
            destination: normalize(&self.destination),
            avg_duration_minutes: Some(self.duration_minutes as f64),
            scheduled_count: 1,
            cancelled_count: Some(0),
            delayed_count: Some(if delay > 0 { 1 } else { 0 }),
            avg_delay_among_delayed: Some(if delay > 0 { delay as f64 } else { 0.0 }),
            avg_delay_all_trains: delay as f64,
            train_type: Some(self.train_type.clone()),
            departure_time: Some(self.departure_time),
            estimated_arrival_time: Some(arrival),
        })
    }
}

/// One user action on the simulator.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Add(SyntheticTrain),
    Remove(RecordId),
}

/// What an action changed.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Added(RecordId),
    Removed(RecordId, Record),
}

/// Result of an action together with the route metrics recomputed after it.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionReport {
    pub route: Route,
    pub outcome: Result<Change, SimulationError>,
    pub metrics: Metrics,
}

/// Route KPIs before and after an action, for impact display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Impact {
    pub scheduled_delta: i64,
    pub trip_delta: i64,
    pub delay_rate_delta_pct: f64,
}

impl Impact {
    pub fn between(before: &Metrics, after: &Metrics) -> Self {
        Self {
            scheduled_delta: after.scheduled_total as i64 - before.scheduled_total as i64,
            trip_delta: after.trip_count as i64 - before.trip_count as i64,
            delay_rate_delta_pct: after.delay_rate_pct - before.delay_rate_pct,
        }
    }
}

/// Working state of a dashboard session.
#[derive(Debug, Clone)]
pub struct Simulator {
    dataset: Dataset,
    route: Route,
}

impl Simulator {
    pub fn new(dataset: Dataset, route: Route) -> Self {
        Self { dataset, route }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn select(&mut self, route: Route) {
        info!(route = %route, "Route selected");
        self.route = route;
    }

    /// Records of the selected route that can be removed, with their identifiers.
    pub fn candidates(&self) -> Vec<&Entry> {
        self.dataset.route_entries(&self.route).collect()
    }

    /// Aggregates the selected route from the current records.
    pub fn metrics(&self) -> Metrics {
        aggregate(self.dataset.route_records(&self.route))
    }

    /// Appends a synthetic train. Existing identifiers are left untouched.
    pub fn add(&mut self, train: &SyntheticTrain) -> Result<RecordId, SimulationError> {
        let record = train.to_record()?;
        let id = self.dataset.insert(record);
        info!(
            id = %id,
            date = %train.date,
            train_type = %train.train_type,
            delay = train.simulated_delay_minutes,
            "Synthetic train added"
        );
        Ok(id)
    }

    /// Removes one record of the selected route.
    ///
    /// Fails without touching the dataset when the route has no records or when
    /// `id` is not one of them.
    pub fn remove(&mut self, id: RecordId) -> Result<Record, SimulationError> {
        let candidates = self.candidates();
        if candidates.is_empty() {
            return Err(SimulationError::NothingToRemove(self.route.clone()));
        }
        if !candidates.iter().any(|e| e.id == id) {
            return Err(SimulationError::UnknownRecord {
                id,
                route: self.route.clone(),
            });
        }

        let removed = self
            .dataset
            .remove(id)
            .ok_or_else(|| SimulationError::UnknownRecord {
                id,
                route: self.route.clone(),
            })?;
        info!(id = %id, route = %self.route, "Record removed");
        Ok(removed)
    }

    /// Runs one action, then recomputes the selected route's metrics once,
    /// whether the action succeeded or not.
    pub fn apply(&mut self, action: Action) -> ActionReport {
        let outcome = match action {
            Action::Add(train) => self.add(&train).map(Change::Added),
            Action::Remove(id) => self.remove(id).map(|record| Change::Removed(id, record)),
        };

        if let Err(e) = &outcome {
            warn!(error = %e, "Action rejected");
        }

        ActionReport {
            route: self.route.clone(),
            outcome,
            metrics: self.metrics(),
        }
    }
}
