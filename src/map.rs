//! Route map: station coordinates and delay-colored lines from an origin.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::analyzers::metrics::aggregate;
use crate::analyzers::severity::DelaySeverity;
use crate::dataset::Dataset;
use crate::record::Route;

/// Latitude/longitude of the canonical stations.
const DEFAULT_COORDS: [(&str, [f64; 2]); 8] = [
    ("Paris", [48.8566, 2.3522]),
    ("Lille", [50.6292, 3.0573]),
    ("Lyon", [45.7640, 4.8357]),
    ("Marseille", [43.2965, 5.3698]),
    ("Bordeaux", [44.8378, -0.5792]),
    ("Strasbourg", [48.5734, 7.7521]),
    ("Nantes", [47.2184, -1.5536]),
    ("Toulouse", [43.6047, 1.4442]),
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error("no coordinates known for station '{0}'")]
    UnknownStation(String),
}

/// Station name to `[lat, lon]` lookup.
///
/// Starts from the built-in table; a JSON file can add stations or override
/// existing ones:
/// ```json
/// { "Rennes": [48.1035, -1.6722], "Paris": [48.8443, 2.3744] }
/// ```
#[derive(Debug, Clone)]
pub struct StationCoords {
    entries: HashMap<String, [f64; 2]>,
}

impl Default for StationCoords {
    fn default() -> Self {
        Self {
            entries: DEFAULT_COORDS
                .iter()
                .map(|(name, coords)| (name.to_string(), *coords))
                .collect(),
        }
    }
}

impl StationCoords {
    /// Loads the built-in table extended with the entries of the JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read station coordinates {}", path.display()))?;
        Self::default().with_json(&content)
    }

    fn with_json(mut self, content: &str) -> Result<Self> {
        let extra: HashMap<String, [f64; 2]> =
            serde_json::from_str(content).context("invalid station coordinates JSON")?;
        self.entries.extend(extra);
        Ok(self)
    }

    pub fn get(&self, station: &str) -> Option<[f64; 2]> {
        self.entries.get(station).copied()
    }
}

/// A line from the origin to one destination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteLine {
    pub destination: String,
    pub coords: [f64; 2],
    pub avg_delay_minutes: Option<f64>,
    pub delay_rate_pct: f64,
    pub severity: DelaySeverity,
}

/// Every route leaving one origin that can be placed on a map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteMap {
    pub origin: String,
    pub origin_coords: [f64; 2],
    pub lines: Vec<RouteLine>,
}

/// Builds the map of routes leaving `origin`.
///
/// Destinations without coordinates are left out; an origin without
/// coordinates is an error so the caller can warn and skip the map.
pub fn build_route_map(
    dataset: &Dataset,
    origin: &str,
    coords: &StationCoords,
) -> Result<RouteMap, MapError> {
    let origin_coords = coords
        .get(origin)
        .ok_or_else(|| MapError::UnknownStation(origin.to_string()))?;

    let mut lines = Vec::new();
    for destination in dataset.destinations_from(origin) {
        let Some(dest_coords) = coords.get(&destination) else {
            debug!(destination = %destination, "No coordinates for destination, skipping");
            continue;
        };

        let route = Route::new(origin, &destination);
        let metrics = aggregate(dataset.route_records(&route));
        lines.push(RouteLine {
            destination,
            coords: dest_coords,
            avg_delay_minutes: metrics.avg_delay_minutes,
            delay_rate_pct: metrics.delay_rate_pct,
            severity: DelaySeverity::from_rate(metrics.delay_rate_pct),
        });
    }

    Ok(RouteMap {
        origin: origin.to_string(),
        origin_coords,
        lines,
    })
}

impl RouteMap {
    /// Renders the map as a GeoJSON `FeatureCollection`: an origin point, one
    /// point per destination and one colored line per route. Coordinates are
    /// written `[lon, lat]` as GeoJSON requires.
    pub fn to_geojson(&self) -> Value {
        let lon_lat = |c: [f64; 2]| json!([c[1], c[0]]);

        let mut features = vec![json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": lon_lat(self.origin_coords) },
            "properties": { "role": "origin", "name": self.origin, "marker-color": "green" },
        })];

        for line in &self.lines {
            features.push(json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": lon_lat(line.coords) },
                "properties": { "role": "destination", "name": line.destination, "marker-color": "blue" },
            }));
            features.push(json!({
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": [lon_lat(self.origin_coords), lon_lat(line.coords)],
                },
                "properties": {
                    "route": format!("{} → {}", self.origin, line.destination),
                    "avg_delay_minutes": line.avg_delay_minutes,
                    "delay_rate_pct": line.delay_rate_pct,
                    "stroke": line.severity.color(),
                    "stroke-width": 3,
                },
            }));
        }

        json!({ "type": "FeatureCollection", "features": features })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::record;

    fn dataset() -> Dataset {
        let mut lyon = record("Paris", "Lyon", "2023-01-01");
        lyon.delayed_count = Some(25);
        let lille = record("Paris", "Lille", "2023-01-01");
        let mut late = record("Paris", "Marseille", "2023-01-01");
        late.delayed_count = Some(5);
        let rennes = record("Paris", "Rennes", "2023-01-01");
        let other = record("Lyon", "Paris", "2023-01-01");
        Dataset::from_records(vec![lyon, lille, late, rennes, other])
    }

    #[test]
    fn test_build_route_map_colors() {
        let map = build_route_map(&dataset(), "Paris", &StationCoords::default()).unwrap();

        assert_eq!(map.origin_coords, [48.8566, 2.3522]);
        // Rennes has no coordinates
        assert_eq!(map.lines.len(), 3);
        assert_eq!(map.lines[0].destination, "Lyon");
        assert_eq!(map.lines[0].severity, DelaySeverity::Red);
        assert_eq!(map.lines[1].severity, DelaySeverity::Orange);
        assert_eq!(map.lines[2].severity, DelaySeverity::Green);
    }

    #[test]
    fn test_unknown_origin() {
        let err = build_route_map(&dataset(), "Rennes", &StationCoords::default()).unwrap_err();
        assert_eq!(err, MapError::UnknownStation("Rennes".to_string()));
    }

    #[test]
    fn test_json_overrides() {
        let coords = StationCoords::default()
            .with_json(r#"{ "Rennes": [48.1035, -1.6722] }"#)
            .unwrap();
        assert_eq!(coords.get("Rennes"), Some([48.1035, -1.6722]));
        assert!(coords.get("Paris").is_some());

        let map = build_route_map(&dataset(), "Paris", &coords).unwrap();
        assert_eq!(map.lines.len(), 4);
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(StationCoords::default().with_json("[1, 2]").is_err());
    }

    #[test]
    fn test_geojson_shape() {
        let map = build_route_map(&dataset(), "Paris", &StationCoords::default()).unwrap();
        let geo = map.to_geojson();

        assert_eq!(geo["type"], "FeatureCollection");
        let features = geo["features"].as_array().unwrap();
        assert_eq!(features.len(), 1 + 2 * map.lines.len());
        assert_eq!(features[0]["geometry"]["coordinates"][0], 2.3522);
        assert_eq!(features[2]["properties"]["stroke"], "red");
    }
}
