//! File locations, resolved from CLI flags, then environment, then defaults.
//!
//! | Setting             | Variable             | Default                                  |
//! |---------------------|----------------------|------------------------------------------|
//! | raw source          | `SNCF_RAW_SOURCE`    | `data/regularite-mensuelle-tgv-aqst.csv` |
//! | cleaned data        | `SNCF_CLEAN_PATH`    | `data/sncf_clean.csv`                    |
//! | station coordinates | `SNCF_STATIONS_PATH` | built-in table                           |

use std::path::PathBuf;

pub const DEFAULT_RAW_SOURCE: &str = "data/regularite-mensuelle-tgv-aqst.csv";
pub const DEFAULT_CLEAN_PATH: &str = "data/sncf_clean.csv";

pub const ENV_RAW_SOURCE: &str = "SNCF_RAW_SOURCE";
pub const ENV_CLEAN_PATH: &str = "SNCF_CLEAN_PATH";
pub const ENV_STATIONS_PATH: &str = "SNCF_STATIONS_PATH";

#[derive(Debug, Clone, PartialEq)]
pub struct Paths {
    pub raw_source: String,
    pub clean_path: PathBuf,
    pub stations_path: Option<PathBuf>,
}

impl Paths {
    /// Resolves every path; `lookup` stands in for `std::env::var`.
    pub fn resolve<F>(
        raw_source: Option<String>,
        clean_path: Option<PathBuf>,
        stations_path: Option<PathBuf>,
        lookup: F,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            raw_source: raw_source
                .or_else(|| lookup(ENV_RAW_SOURCE))
                .unwrap_or_else(|| DEFAULT_RAW_SOURCE.to_string()),
            clean_path: clean_path
                .or_else(|| lookup(ENV_CLEAN_PATH).map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CLEAN_PATH)),
            stations_path: stations_path.or_else(|| lookup(ENV_STATIONS_PATH).map(PathBuf::from)),
        }
    }

    pub fn from_env(
        raw_source: Option<String>,
        clean_path: Option<PathBuf>,
        stations_path: Option<PathBuf>,
    ) -> Self {
        Self::resolve(raw_source, clean_path, stations_path, |key| {
            std::env::var(key).ok().filter(|v| !v.is_empty())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let paths = Paths::resolve(None, None, None, |_| None);
        assert_eq!(paths.raw_source, DEFAULT_RAW_SOURCE);
        assert_eq!(paths.clean_path, PathBuf::from(DEFAULT_CLEAN_PATH));
        assert_eq!(paths.stations_path, None);
    }

    #[test]
    fn test_env_then_flags() {
        let env: HashMap<&str, &str> = [
            (ENV_RAW_SOURCE, "https://example.org/raw.csv"),
            (ENV_CLEAN_PATH, "/tmp/env_clean.csv"),
            (ENV_STATIONS_PATH, "stations.json"),
        ]
        .into_iter()
        .collect();
        let lookup = |k: &str| env.get(k).map(|v| v.to_string());

        let from_env = Paths::resolve(None, None, None, lookup);
        assert_eq!(from_env.raw_source, "https://example.org/raw.csv");
        assert_eq!(from_env.stations_path, Some(PathBuf::from("stations.json")));

        let from_flags = Paths::resolve(
            Some("raw.csv".to_string()),
            Some(PathBuf::from("clean.csv")),
            None,
            lookup,
        );
        assert_eq!(from_flags.raw_source, "raw.csv");
        assert_eq!(from_flags.clean_path, PathBuf::from("clean.csv"));
    }
}
