use std::fmt;

use serde::Serialize;

/// Delay severity of a route, used to color map lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DelaySeverity {
    Green,
    Orange,
    Red,
}

impl DelaySeverity {
    /// Classifies a delay rate in percent.
    ///
    /// | Range         | Severity |
    /// |---------------|----------|
    /// | < 10          | Green    |
    /// | >= 10, < 20   | Orange   |
    /// | >= 20         | Red      |
    pub fn from_rate(delay_rate_pct: f64) -> Self {
        match delay_rate_pct {
            p if p < 10.0 => DelaySeverity::Green,
            p if p < 20.0 => DelaySeverity::Orange,
            _ => DelaySeverity::Red,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            DelaySeverity::Green => "green",
            DelaySeverity::Orange => "orange",
            DelaySeverity::Red => "red",
        }
    }
}

impl fmt::Display for DelaySeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.color())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_boundaries() {
        assert_eq!(DelaySeverity::from_rate(0.0), DelaySeverity::Green);
        assert_eq!(DelaySeverity::from_rate(9.99), DelaySeverity::Green);
        assert_eq!(DelaySeverity::from_rate(10.0), DelaySeverity::Orange);
        assert_eq!(DelaySeverity::from_rate(19.99), DelaySeverity::Orange);
        assert_eq!(DelaySeverity::from_rate(20.0), DelaySeverity::Red);
        assert_eq!(DelaySeverity::from_rate(100.0), DelaySeverity::Red);
    }

    #[test]
    fn test_color_names() {
        assert_eq!(DelaySeverity::Orange.to_string(), "orange");
    }
}
