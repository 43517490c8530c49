//! Core record types shared by the cleaner, the dataset and the simulator.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

pub const COL_DATE: &str = "Date";
pub const COL_ORIGIN: &str = "Gare de départ";
pub const COL_DESTINATION: &str = "Gare d'arrivée";
pub const COL_AVG_DURATION: &str = "Durée moyenne du trajet";
pub const COL_SCHEDULED: &str = "Nombre de circulations prévues";
pub const COL_CANCELLED: &str = "Nombre de trains annulés";
pub const COL_DELAYED: &str = "Nombre de trains en retard à l'arrivée";
pub const COL_AVG_DELAY_DELAYED: &str = "Retard moyen des trains en retard à l'arrivée";
pub const COL_AVG_DELAY_ALL: &str = "Retard moyen de tous les trains à l'arrivée";
pub const COL_DEPARTURE_TIME: &str = "Heure de départ";
pub const COL_ARRIVAL_TIME: &str = "Heure d'arrivée estimée";
pub const COL_TRAIN_TYPE: &str = "Type de train";

/// Columns every raw and cleaned file must carry, in output order.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    COL_DATE,
    COL_ORIGIN,
    COL_DESTINATION,
    COL_AVG_DURATION,
    COL_SCHEDULED,
    COL_CANCELLED,
    COL_DELAYED,
    COL_AVG_DELAY_DELAYED,
    COL_AVG_DELAY_ALL,
];

/// Train type reported for records that do not carry one.
pub const UNKNOWN_TRAIN_TYPE: &str = "Unknown";

/// Monthly statistics of one line, or a single simulated train.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub date: NaiveDate,
    pub origin: String,
    pub destination: String,
    pub avg_duration_minutes: Option<f64>,
    pub scheduled_count: u32,
    pub cancelled_count: Option<u32>,
    pub delayed_count: Option<u32>,
    pub avg_delay_among_delayed: Option<f64>,
    pub avg_delay_all_trains: f64,
    pub train_type: Option<String>,
    pub departure_time: Option<NaiveTime>,
    pub estimated_arrival_time: Option<NaiveTime>,
}

/// Hashable stand-in for a [`Record`], used for exact-duplicate detection.
/// Floats compare by bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    date: NaiveDate,
    origin: String,
    destination: String,
    avg_duration_minutes: Option<u64>,
    scheduled_count: u32,
    cancelled_count: Option<u32>,
    delayed_count: Option<u32>,
    avg_delay_among_delayed: Option<u64>,
    avg_delay_all_trains: u64,
    train_type: Option<String>,
    departure_time: Option<NaiveTime>,
    estimated_arrival_time: Option<NaiveTime>,
}

impl Record {
    pub fn route(&self) -> Route {
        Route::new(&self.origin, &self.destination)
    }

    pub fn is_on(&self, route: &Route) -> bool {
        self.origin == route.origin && self.destination == route.destination
    }

    pub fn train_type(&self) -> &str {
        self.train_type.as_deref().unwrap_or(UNKNOWN_TRAIN_TYPE)
    }

    pub fn cancelled(&self) -> u32 {
        self.cancelled_count.unwrap_or(0)
    }

    pub fn delayed(&self) -> u32 {
        self.delayed_count.unwrap_or(0)
    }

    pub fn key(&self) -> RecordKey {
        // -0.0 and 0.0 are the same value
        fn bits(v: f64) -> u64 {
            if v == 0.0 { 0 } else { v.to_bits() }
        }

        RecordKey {
            date: self.date,
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            avg_duration_minutes: self.avg_duration_minutes.map(bits),
            scheduled_count: self.scheduled_count,
            cancelled_count: self.cancelled_count,
            delayed_count: self.delayed_count,
            avg_delay_among_delayed: self.avg_delay_among_delayed.map(bits),
            avg_delay_all_trains: bits(self.avg_delay_all_trains),
            train_type: self.train_type.clone(),
            departure_time: self.departure_time,
            estimated_arrival_time: self.estimated_arrival_time,
        }
    }

    /// One-line description used when listing trains of a route.
    pub fn summary(&self) -> String {
        let departure = self
            .departure_time
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|| "–".to_string());
        format!(
            "{} at {} – {} ({} → {})",
            self.date.format("%Y-%m-%d"),
            departure,
            self.train_type(),
            self.origin,
            self.destination
        )
    }
}

/// An ordered origin/destination pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Route {
    pub origin: String,
    pub destination: String,
}

impl Route {
    pub fn new(origin: &str, destination: &str) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.origin, self.destination)
    }
}

/// Stable identifier of a record inside a [`crate::dataset::Dataset`].
///
/// Assigned from a monotonic counter when the record enters the dataset and
/// never reused, so removals do not shift the identity of other records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A monthly record with sensible defaults for tests.
    pub fn record(origin: &str, destination: &str, date: &str) -> Record {
        Record {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            avg_duration_minutes: Some(180.0),
            scheduled_count: 100,
            cancelled_count: Some(2),
            delayed_count: Some(10),
            avg_delay_among_delayed: Some(15.0),
            avg_delay_all_trains: 1.5,
            train_type: None,
            departure_time: None,
            estimated_arrival_time: None,
        }
    }
}
