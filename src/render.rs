//! Plain-text rendering of KPIs, charts, listings and maps.

use std::fmt::Write;

use crate::analyzers::types::{Metrics, PeriodPoint};
use crate::analyzers::utility::round2;
use crate::dataset::Entry;
use crate::map::RouteMap;
use crate::record::Route;
use crate::simulator::Impact;

const BAR_WIDTH: usize = 30;

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(len.max(1))
}

fn fmt_delay(v: Option<f64>) -> String {
    v.map(|d| format!("{}", round2(d)))
        .unwrap_or_else(|| "n/a".to_string())
}

pub fn render_metrics(title: &str, route: &Route, metrics: &Metrics) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## {title}: {route}");
    let _ = writeln!(output, "Scheduled circulations: {}", metrics.scheduled_total);
    let _ = writeln!(output, "Mean delay (min):       {}", fmt_delay(metrics.avg_delay_minutes));
    let _ = writeln!(output, "Delay rate:             {}%", round2(metrics.delay_rate_pct));
    let _ = writeln!(output, "Cancelled trains:       {}", metrics.cancelled_total);
    match metrics.date_range {
        Some((from, to)) => {
            let _ = writeln!(output, "Period covered:         {from} → {to}");
        }
        None => {
            let _ = writeln!(output, "Period covered:         n/a");
        }
    }
    let _ = writeln!(output, "Records:                {}", metrics.trip_count);

    output
}

pub fn render_impact(impact: &Impact) -> String {
    format!(
        "Change: {:+} circulations, {:+} records, {:+}% delay rate\n",
        impact.scheduled_delta,
        impact.trip_delta,
        round2(impact.delay_rate_delta_pct)
    )
}

/// Two text charts: mean delay per period and scheduled circulations per period.
pub fn render_chart(series: &[PeriodPoint]) -> String {
    let mut output = String::new();

    if series.is_empty() {
        let _ = writeln!(output, "No data to chart.");
        return output;
    }

    let max_delay = series
        .iter()
        .map(|p| p.mean_delay_minutes)
        .fold(0.0, f64::max);
    let max_scheduled = series.iter().map(|p| p.scheduled_sum).max().unwrap_or(0) as f64;

    let _ = writeln!(output, "## Mean delay per month (min)");
    for p in series {
        let _ = writeln!(
            output,
            "{}  {:>8.2}  {}",
            p.date,
            p.mean_delay_minutes,
            bar(p.mean_delay_minutes, max_delay)
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Scheduled circulations per month");
    for p in series {
        let _ = writeln!(
            output,
            "{}  {:>8}  {}",
            p.date,
            p.scheduled_sum,
            bar(p.scheduled_sum as f64, max_scheduled)
        );
    }

    output
}

pub fn render_trains(route: &Route, entries: &[&Entry]) -> String {
    let mut output = String::new();

    if entries.is_empty() {
        let _ = writeln!(output, "No train available on {route}.");
        return output;
    }

    let _ = writeln!(output, "{} record(s) on {route}:", entries.len());
    for entry in entries {
        let _ = writeln!(output, "[{}] {}", entry.id, entry.record.summary());
    }
    output
}

pub fn render_routes(origin: &str, destinations: &[String]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "From {origin}: {}", destinations.join(", "));
    output
}

pub fn render_map(map: &RouteMap) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "## Routes from {} ({:.4}, {:.4})",
        map.origin, map.origin_coords[0], map.origin_coords[1]
    );
    for line in &map.lines {
        let _ = writeln!(
            output,
            "[{}] {} → {}: mean delay {} min, delay rate {}%",
            line.severity,
            map.origin,
            line.destination,
            fmt_delay(line.avg_delay_minutes),
            round2(line.delay_rate_pct)
        );
    }
    let _ = writeln!(output, "Legend: green < 10%, orange 10-20%, red >= 20% delayed");
    output
}
