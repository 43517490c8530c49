//! Output formatting and persistence for cleaned records.
//!
//! Supports CSV export of a record set, JSON rendering and a short log preview.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use csv::WriterBuilder;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::record::{REQUIRED_COLUMNS, Record};

/// One cleaned row with the nine required columns.
#[derive(Serialize)]
struct CleanRow<'a> {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Gare de départ")]
    origin: &'a str,
    #[serde(rename = "Gare d'arrivée")]
    destination: &'a str,
    #[serde(rename = "Durée moyenne du trajet")]
    avg_duration_minutes: Option<f64>,
    #[serde(rename = "Nombre de circulations prévues")]
    scheduled_count: u32,
    #[serde(rename = "Nombre de trains annulés")]
    cancelled_count: Option<u32>,
    #[serde(rename = "Nombre de trains en retard à l'arrivée")]
    delayed_count: Option<u32>,
    #[serde(rename = "Retard moyen des trains en retard à l'arrivée")]
    avg_delay_among_delayed: Option<f64>,
    #[serde(rename = "Retard moyen de tous les trains à l'arrivée")]
    avg_delay_all_trains: f64,
}

impl<'a> From<&'a Record> for CleanRow<'a> {
    fn from(r: &'a Record) -> Self {
        Self {
            date: r.date,
            origin: &r.origin,
            destination: &r.destination,
            avg_duration_minutes: r.avg_duration_minutes,
            scheduled_count: r.scheduled_count,
            cancelled_count: r.cancelled_count,
            delayed_count: r.delayed_count,
            avg_delay_among_delayed: r.avg_delay_among_delayed,
            avg_delay_all_trains: r.avg_delay_all_trains,
        }
    }
}

/// A cleaned row that also carries the simulated-train columns.
#[derive(Serialize)]
struct SimulatedRow<'a> {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Gare de départ")]
    origin: &'a str,
    #[serde(rename = "Gare d'arrivée")]
    destination: &'a str,
    #[serde(rename = "Durée moyenne du trajet")]
    avg_duration_minutes: Option<f64>,
    #[serde(rename = "Nombre de circulations prévues")]
    scheduled_count: u32,
    #[serde(rename = "Nombre de trains annulés")]
    cancelled_count: Option<u32>,
    #[serde(rename = "Nombre de trains en retard à l'arrivée")]
    delayed_count: Option<u32>,
    #[serde(rename = "Retard moyen des trains en retard à l'arrivée")]
    avg_delay_among_delayed: Option<f64>,
    #[serde(rename = "Retard moyen de tous les trains à l'arrivée")]
    avg_delay_all_trains: f64,
    #[serde(rename = "Heure de départ")]
    departure_time: Option<NaiveTime>,
    #[serde(rename = "Heure d'arrivée estimée")]
    estimated_arrival_time: Option<NaiveTime>,
    #[serde(rename = "Type de train")]
    train_type: Option<&'a str>,
}

impl<'a> From<&'a Record> for SimulatedRow<'a> {
    fn from(r: &'a Record) -> Self {
        Self {
            date: r.date,
            origin: &r.origin,
            destination: &r.destination,
            avg_duration_minutes: r.avg_duration_minutes,
            scheduled_count: r.scheduled_count,
            cancelled_count: r.cancelled_count,
            delayed_count: r.delayed_count,
            avg_delay_among_delayed: r.avg_delay_among_delayed,
            avg_delay_all_trains: r.avg_delay_all_trains,
            departure_time: r.departure_time,
            estimated_arrival_time: r.estimated_arrival_time,
            train_type: r.train_type.as_deref(),
        }
    }
}

/// Writes records as comma-delimited CSV with the French column names.
///
/// The departure, estimated arrival and train type columns are only emitted
/// when at least one record carries one of them.
pub fn write_csv<W: Write>(writer: W, records: &[Record]) -> Result<()> {
    let with_extras = records.iter().any(|r| {
        r.train_type.is_some() || r.departure_time.is_some() || r.estimated_arrival_time.is_some()
    });

    let mut wtr = WriterBuilder::new().delimiter(b',').from_writer(writer);

    // serialize only writes the header along with the first row
    if records.is_empty() {
        wtr.write_record(REQUIRED_COLUMNS)?;
    }

    for r in records {
        if with_extras {
            wtr.serialize(SimulatedRow::from(r))?;
        } else {
            wtr.serialize(CleanRow::from(r))?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Writes the cleaned dataset to `path`, creating the parent directory if needed.
/// An existing file is replaced.
pub fn write_records(path: &Path, records: &[Record]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
    }

    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    debug!(path = %path.display(), records = records.len(), "Writing cleaned CSV");
    write_csv(file, records)
}

/// Logs the first `n` records, one per line.
pub fn log_preview(records: &[Record], n: usize) {
    for (index, r) in records.iter().take(n).enumerate() {
        info!(
            index,
            date = %r.date,
            origin = %r.origin,
            destination = %r.destination,
            scheduled = r.scheduled_count,
            avg_delay = r.avg_delay_all_trains,
            "Preview"
        );
    }
}

/// Renders any serializable value as pretty-printed JSON.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::record;
    use crate::record::{COL_ARRIVAL_TIME, COL_DEPARTURE_TIME, COL_TRAIN_TYPE};
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(name)
    }

    fn render(records: &[Record]) -> String {
        let mut buf = Vec::new();
        write_csv(&mut buf, records).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_write_csv_base_columns() {
        let content = render(&[record("Paris", "Lyon", "2023-01-01")]);
        let lines: Vec<_> = content.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Date,Gare de départ,Gare d'arrivée"));
        assert!(!lines[0].contains("Type de train"));
        assert_eq!(lines[1], "2023-01-01,Paris,Lyon,180.0,100,2,10,15.0,1.5");
    }

    #[test]
    fn test_write_csv_optional_columns() {
        let mut simulated = record("Paris", "Lyon", "2023-01-01");
        simulated.train_type = Some("TGV".to_string());
        simulated.departure_time = NaiveTime::from_hms_opt(8, 0, 0);
        simulated.estimated_arrival_time = NaiveTime::from_hms_opt(10, 0, 0);
        let mut plain = record("Paris", "Lille", "2023-01-01");
        plain.cancelled_count = None;

        let content = render(&[simulated, plain]);
        let lines: Vec<_> = content.lines().collect();

        assert!(lines[0].ends_with("Heure de départ,Heure d'arrivée estimée,Type de train"));
        assert!(lines[1].ends_with("08:00:00,10:00:00,TGV"));
        assert_eq!(lines[2], "2023-01-01,Paris,Lille,180.0,100,,10,15.0,1.5,,,");
    }

    #[test]
    fn test_write_csv_header_names() {
        let mut simulated = record("Paris", "Lyon", "2023-01-01");
        simulated.train_type = Some("TER".to_string());

        let base = render(&[record("Paris", "Lyon", "2023-01-01")]);
        let extended = render(&[simulated]);
        let empty = render(&[]);

        let required = REQUIRED_COLUMNS.join(",");
        assert_eq!(base.lines().next(), Some(required.as_str()));
        assert_eq!(empty, format!("{required}\n"));
        assert_eq!(
            extended.lines().next().map(String::from),
            Some(format!("{required},{COL_DEPARTURE_TIME},{COL_ARRIVAL_TIME},{COL_TRAIN_TYPE}"))
        );
        assert!(extended.lines().nth(1).unwrap().ends_with(",,,TER"));
    }

    #[test]
    fn test_write_records_creates_directory() {
        let dir = temp_path("sncf_dashboard_test_output_dir");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("clean.csv");

        write_records(&path, &[record("Paris", "Lyon", "2023-01-01")]).unwrap();
        assert!(path.exists());

        // overwrite, not append
        write_records(&path, &[record("Paris", "Lyon", "2023-01-01")]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_to_json() {
        let json = to_json(&record("Paris", "Lyon", "2023-01-01")).unwrap();
        assert!(json.contains("\"origin\": \"Paris\""));
    }

    #[test]
    fn test_log_preview_does_not_panic() {
        log_preview(&[record("Paris", "Lyon", "2023-01-01")], 10);
    }
}
