//! Raw punctuality CSV cleaning.
//!
//! Turns the semicolon-delimited open-data export into normalized [`Record`]s:
//! required columns are checked up front, fields are coerced leniently, station
//! names are canonicalized, incomplete rows are dropped and exact duplicates
//! removed. Input order is preserved.

use std::collections::HashSet;
use std::io::Read;

use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::normalize::normalize;
use crate::parser::{parse_count, parse_date, parse_float, parse_text, parse_time};
use crate::record::{
    COL_ARRIVAL_TIME, COL_DEPARTURE_TIME, COL_TRAIN_TYPE, REQUIRED_COLUMNS, Record,
};

#[derive(Debug, thiserror::Error)]
pub enum CleanError {
    #[error("missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },
    #[error("unreadable CSV header: {0}")]
    Header(#[from] csv::Error),
}

/// Counters collected while cleaning.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CleanStats {
    pub rows_read: usize,
    pub malformed_skipped: usize,
    pub incomplete_dropped: usize,
    pub duplicates_removed: usize,
}

impl CleanStats {
    pub fn kept(&self) -> usize {
        self.rows_read - self.malformed_skipped - self.incomplete_dropped - self.duplicates_removed
    }
}

/// Cleaned records, in input order, plus what was discarded along the way.
#[derive(Debug)]
pub struct CleanReport {
    pub records: Vec<Record>,
    pub stats: CleanStats,
}

/// Header positions of the columns a [`Record`] is built from.
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    required: [usize; REQUIRED_COLUMNS.len()],
    departure_time: Option<usize>,
    arrival_time: Option<usize>,
    train_type: Option<usize>,
}

impl ColumnIndex {
    /// Locates every required column, failing with the full list of the
    /// missing ones.
    pub fn resolve(headers: &StringRecord) -> Result<Self, CleanError> {
        let names: Vec<&str> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim())
            .collect();
        let find = |column: &str| names.iter().position(|name| *name == column);

        let mut required = [0usize; REQUIRED_COLUMNS.len()];
        let mut missing = Vec::new();
        for (slot, column) in required.iter_mut().zip(REQUIRED_COLUMNS) {
            match find(column) {
                Some(position) => *slot = position,
                None => missing.push(column.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(CleanError::MissingColumns { missing });
        }

        Ok(Self {
            required,
            departure_time: find(COL_DEPARTURE_TIME),
            arrival_time: find(COL_ARRIVAL_TIME),
            train_type: find(COL_TRAIN_TYPE),
        })
    }

    fn field<'r>(&self, row: &'r StringRecord, slot: usize) -> &'r str {
        row.get(self.required[slot]).unwrap_or("")
    }

    fn optional<'r>(&self, row: &'r StringRecord, position: Option<usize>) -> &'r str {
        position.and_then(|p| row.get(p)).unwrap_or("")
    }

    /// Coerces one row. Returns `None` when a required value is missing or
    /// cannot be parsed.
    pub fn parse_row(&self, row: &StringRecord) -> Option<Record> {
        let date = parse_date(self.field(row, 0));
        let origin = parse_text(self.field(row, 1)).map(|s| normalize(&s));
        let destination = parse_text(self.field(row, 2)).map(|s| normalize(&s));
        let scheduled_count = parse_count(self.field(row, 4));
        let avg_delay_all_trains = parse_float(self.field(row, 8));

        Some(Record {
            date: date?,
            origin: origin.filter(|s| !s.is_empty())?,
            destination: destination.filter(|s| !s.is_empty())?,
            avg_duration_minutes: parse_float(self.field(row, 3)),
            scheduled_count: scheduled_count?,
            cancelled_count: parse_count(self.field(row, 5)),
            delayed_count: parse_count(self.field(row, 6)),
            avg_delay_among_delayed: parse_float(self.field(row, 7)),
            avg_delay_all_trains: avg_delay_all_trains?,
            train_type: parse_text(self.optional(row, self.train_type)),
            departure_time: parse_time(self.optional(row, self.departure_time)),
            estimated_arrival_time: parse_time(self.optional(row, self.arrival_time)),
        })
    }
}

/// Reads complete records from a delimited CSV.
///
/// Lines with more fields than the header are malformed: logged and skipped.
/// Shorter lines are read with the missing trailing fields empty, so they are
/// kept when every required value is present and dropped otherwise. Only a
/// missing required column is fatal.
pub fn read_records<R: Read>(
    reader: R,
    delimiter: u8,
) -> Result<(Vec<Record>, CleanStats), CleanError> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?;
    let width = headers.len();
    let columns = ColumnIndex::resolve(headers)?;
    let mut stats = CleanStats::default();
    let mut records = Vec::new();

    for result in rdr.records() {
        stats.rows_read += 1;

        let row = match result {
            Ok(row) => row,
            Err(e) => {
                let line = e.position().map(|p| p.line());
                warn!(line, error = %e, "Skipping malformed line");
                stats.malformed_skipped += 1;
                continue;
            }
        };

        if row.len() > width {
            let line = row.position().map(|p| p.line());
            warn!(line, fields = row.len(), expected = width, "Skipping malformed line");
            stats.malformed_skipped += 1;
            continue;
        }

        match columns.parse_row(&row) {
            Some(record) => records.push(record),
            None => {
                debug!(line = row.position().map(|p| p.line()), "Dropping incomplete row");
                stats.incomplete_dropped += 1;
            }
        }
    }

    Ok((records, stats))
}

/// Removes exact duplicates, keeping the first occurrence. Returns how many
/// records were removed.
pub fn dedup(records: &mut Vec<Record>) -> usize {
    let before = records.len();
    let mut seen = HashSet::new();
    records.retain(|r| seen.insert(r.key()));
    before - records.len()
}

/// Cleans the raw semicolon-delimited punctuality export.
///
/// Station names come out trimmed, title-cased and mapped to their city where
/// one is recognized. The returned records are densely ordered as in the input
/// minus dropped and duplicate rows.
pub fn clean_reader<R: Read>(reader: R) -> Result<CleanReport, CleanError> {
    let (mut records, mut stats) = read_records(reader, b';')?;
    stats.duplicates_removed = dedup(&mut records);

    info!(
        rows_read = stats.rows_read,
        malformed = stats.malformed_skipped,
        incomplete = stats.incomplete_dropped,
        duplicates = stats.duplicates_removed,
        kept = records.len(),
        "Cleaning complete"
    );

    Ok(CleanReport { records, stats })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Date;Gare de départ;Gare d'arrivée;Durée moyenne du trajet;Nombre de circulations prévues;Nombre de trains annulés;Nombre de trains en retard à l'arrivée;Retard moyen des trains en retard à l'arrivée;Retard moyen de tous les trains à l'arrivée";

    fn clean_str(body: &str) -> Result<CleanReport, CleanError> {
        let input = format!("{HEADER}\n{body}");
        clean_reader(input.as_bytes())
    }

    #[test]
    fn test_scenario_row() {
        let report =
            clean_str("2023-01-01;Paris Gare de Lyon;Marseille St Charles;;100;2;10;15;1.5\n")
                .unwrap();

        assert_eq!(report.records.len(), 1);
        let r = &report.records[0];
        assert_eq!(r.origin, "Paris");
        assert_eq!(r.destination, "Marseille");
        assert_eq!(r.scheduled_count, 100);
        assert_eq!(r.cancelled_count, Some(2));
        assert_eq!(r.delayed_count, Some(10));
        assert_eq!(r.avg_duration_minutes, None);
        assert_eq!(r.avg_delay_all_trains, 1.5);
    }

    #[test]
    fn test_missing_columns_is_fatal() {
        let input = "Date;Gare de départ\n2023-01-01;Paris\n";
        let err = clean_reader(input.as_bytes()).unwrap_err();

        match err {
            CleanError::MissingColumns { missing } => {
                assert_eq!(missing.len(), 7);
                assert!(missing.contains(&"Gare d'arrivée".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_incomplete_rows_dropped() {
        let body = "\
2023-01-01;Paris Nord;Lille Europe;60;50;0;5;10;2.0
;Paris Nord;Lille Europe;60;50;0;5;10;2.0
2023-02-01;;Lille Europe;60;50;0;5;10;2.0
2023-02-01;Paris Nord;;60;50;0;5;10;2.0
2023-02-01;Paris Nord;Lille Europe;60;;0;5;10;2.0
2023-02-01;Paris Nord;Lille Europe;60;50;0;5;10;
2023-02-01;Paris Nord;Lille Europe;60;50;0;5;10;nan
not a date;Paris Nord;Lille Europe;60;50;0;5;10;2.0
";
        let report = clean_str(body).unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.stats.incomplete_dropped, 7);
        assert_eq!(report.stats.rows_read, 8);
    }

    #[test]
    fn test_optional_numeric_fields_may_be_missing() {
        let report = clean_str("2023-01-01;Lyon Part Dieu;Nantes;;80;;;;3.0\n").unwrap();
        let r = &report.records[0];
        assert_eq!(r.cancelled_count, None);
        assert_eq!(r.delayed_count, None);
        assert_eq!(r.avg_delay_among_delayed, None);
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let body = "\
2023-01-01;Paris Nord;Lille Europe;60;50;0;5;10;2.0
2023-01-01;Paris Nord;Lille Europe;60;50;0;5;10;2.0;one;too many
2023-02-01;Paris Nord;Lille Europe;60;50;0;5;10;2.5
";
        let report = clean_str(body).unwrap();
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.stats.malformed_skipped, 1);
        assert_eq!(report.stats.kept(), 2);
    }

    #[test]
    fn test_short_rows_padded_with_empty_fields() {
        let input = format!(
            "{HEADER};Commentaire\n\
2023-01-01;Paris Nord;Lille Europe;60;50;0;5;10;2.0;Grève\n\
2023-02-01;Paris Nord;Lille Europe;60;50;0;5;10;2.5\n\
2023-03-01;Paris Nord;too;few\n"
        );
        let report = clean_reader(input.as_bytes()).unwrap();

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[1].avg_delay_all_trains, 2.5);
        assert_eq!(report.stats.malformed_skipped, 0);
        assert_eq!(report.stats.incomplete_dropped, 1);
    }

    #[test]
    fn test_duplicates_removed_after_normalization() {
        // both rows normalize to the same record
        let body = "\
2023-01-01;Paris Montparnasse;Bordeaux St Jean;120;40;1;4;12;1.0
2023-01-01;PARIS MONTPARNASSE;bordeaux st jean;120;40;1;4;12;1.0
2023-01-01;Paris Montparnasse;Bordeaux St Jean;120;40;1;4;12;1.1
";
        let report = clean_str(body).unwrap();
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.stats.duplicates_removed, 1);
        assert_eq!(report.records[0].avg_delay_all_trains, 1.0);
        assert_eq!(report.records[1].avg_delay_all_trains, 1.1);
    }

    #[test]
    fn test_unknown_station_title_cased() {
        let report = clean_str("2023-01-01;  RENNES ;angers st laud;90;30;0;3;8;0.5\n").unwrap();
        assert_eq!(report.records[0].origin, "Rennes");
        assert_eq!(report.records[0].destination, "Angers St Laud");
    }

    #[test]
    fn test_extra_columns_and_order_ignored() {
        let input = "\
Service;Retard moyen de tous les trains à l'arrivée;Date;Gare de départ;Gare d'arrivée;Durée moyenne du trajet;Nombre de circulations prévues;Nombre de trains annulés;Nombre de trains en retard à l'arrivée;Retard moyen des trains en retard à l'arrivée
National;4.2;2023-05;Strasbourg;Paris Est;110;60;1;9;20
";
        let report = clean_reader(input.as_bytes()).unwrap();
        let r = &report.records[0];
        assert_eq!(r.origin, "Strasbourg");
        assert_eq!(r.destination, "Paris");
        assert_eq!(r.avg_delay_all_trains, 4.2);
        assert_eq!(r.date, chrono::NaiveDate::from_ymd_opt(2023, 5, 1).unwrap());
    }

    #[test]
    fn test_header_with_bom() {
        let input = format!("\u{feff}{HEADER}\n2023-01-01;Paris;Lyon;;10;0;1;5;0.5\n");
        let report = clean_reader(input.as_bytes()).unwrap();
        assert_eq!(report.records.len(), 1);
    }
}
