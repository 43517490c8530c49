//! In-memory working dataset of the dashboard.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::cleaner::read_records;
use crate::record::{Record, RecordId, Route};

/// A record together with its stable identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: RecordId,
    pub record: Record,
}

/// Ordered collection of records keyed by [`RecordId`].
///
/// Identifiers come from a counter that only moves forward: inserting appends
/// with a fresh id and removing never renumbers the remaining entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    entries: Vec<Entry>,
    next_id: u64,
}

impl Dataset {
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut dataset = Self::default();
        for record in records {
            dataset.insert(record);
        }
        dataset
    }

    /// Loads a cleaned, comma-delimited file written by the `clean` step.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open cleaned data {}", path.display()))?;
        let (records, stats) = read_records(file, b',')
            .with_context(|| format!("failed to read cleaned data {}", path.display()))?;

        info!(
            path = %path.display(),
            records = records.len(),
            malformed = stats.malformed_skipped,
            incomplete = stats.incomplete_dropped,
            "Dataset loaded"
        );
        Ok(Self::from_records(records))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.entries.iter().map(|e| &e.record)
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.record)
    }

    /// Appends a record and returns its new identifier.
    pub fn insert(&mut self, record: Record) -> RecordId {
        let id = RecordId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, record });
        id
    }

    /// Removes the record with the given identifier, keeping the order of the rest.
    pub fn remove(&mut self, id: RecordId) -> Option<Record> {
        let position = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(position).record)
    }

    /// Entries of one route, in dataset order.
    pub fn route_entries<'a>(&'a self, route: &'a Route) -> impl Iterator<Item = &'a Entry> + 'a {
        self.entries.iter().filter(move |e| e.record.is_on(route))
    }

    /// Records of one route, in dataset order.
    pub fn route_records<'a>(&'a self, route: &'a Route) -> impl Iterator<Item = &'a Record> + 'a {
        self.route_entries(route).map(|e| &e.record)
    }

    /// Distinct origins in order of first appearance.
    pub fn origins(&self) -> Vec<String> {
        let mut origins: Vec<String> = Vec::new();
        for r in self.records() {
            if !origins.contains(&r.origin) {
                origins.push(r.origin.clone());
            }
        }
        origins
    }

    /// Distinct destinations served from `origin`, in order of first appearance.
    pub fn destinations_from(&self, origin: &str) -> Vec<String> {
        let mut destinations: Vec<String> = Vec::new();
        for r in self.records().filter(|r| r.origin == origin) {
            if !destinations.contains(&r.destination) {
                destinations.push(r.destination.clone());
            }
        }
        destinations
    }

    /// The route a dashboard opens on: the first origin and its first destination.
    pub fn default_route(&self) -> Option<Route> {
        self.entries.first().map(|e| e.record.route())
    }
}
