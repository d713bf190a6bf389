use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Display time-window token selecting chart granularity and span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1D")]
    D1,
    #[serde(rename = "1M")]
    M1,
    #[serde(rename = "3M")]
    M3,
    #[serde(rename = "6M")]
    M6,
    #[serde(rename = "YTD")]
    Ytd,
    #[serde(rename = "1Y")]
    Y1,
    #[serde(rename = "2Y")]
    Y2,
    #[serde(rename = "5Y")]
    Y5,
}

impl TimeRange {
    pub const ALL: [TimeRange; 8] = [
        TimeRange::D1,
        TimeRange::M1,
        TimeRange::M3,
        TimeRange::M6,
        TimeRange::Ytd,
        TimeRange::Y1,
        TimeRange::Y2,
        TimeRange::Y5,
    ];

    /// How many trailing entries of the located series a range keeps.
    ///
    /// Weekly-cadence ranges use week counts, not calendar counts — the
    /// mapping assumes the located series matches the range's intended
    /// cadence. Returns `None` for YTD, which filters by calendar date
    /// instead of truncating by count.
    #[must_use]
    pub fn point_budget(&self) -> Option<usize> {
        match self {
            TimeRange::D1 => Some(24),
            TimeRange::M1 => Some(30),
            TimeRange::M3 => Some(90),
            TimeRange::M6 => Some(26),
            TimeRange::Ytd => None,
            TimeRange::Y1 => Some(52),
            TimeRange::Y2 => Some(104),
            TimeRange::Y5 => Some(260),
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token = match self {
            TimeRange::D1 => "1D",
            TimeRange::M1 => "1M",
            TimeRange::M3 => "3M",
            TimeRange::M6 => "6M",
            TimeRange::Ytd => "YTD",
            TimeRange::Y1 => "1Y",
            TimeRange::Y2 => "2Y",
            TimeRange::Y5 => "5Y",
        };
        write!(f, "{token}")
    }
}

impl std::str::FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "1D" => Ok(TimeRange::D1),
            "1M" => Ok(TimeRange::M1),
            "3M" => Ok(TimeRange::M3),
            "6M" => Ok(TimeRange::M6),
            "YTD" => Ok(TimeRange::Ytd),
            "1Y" => Ok(TimeRange::Y1),
            "2Y" => Ok(TimeRange::Y2),
            "5Y" => Ok(TimeRange::Y5),
            other => Err(format!("Unknown time range token: {other}")),
        }
    }
}

/// One parsed time-series bar. All numeric fields are parsed from the
/// provider's string representation before anything else touches them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Chart-ready series: one display label per closing price, chronological
/// ascending. The frontend only renders — it never reorders or filters.
///
/// Invariant: `labels.len() == values.len()`. Both empty when no
/// underlying series was found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    /// Build a series from retained points. Labels are "{month}/{day}"
    /// with no year and no zero-padding; values are closing prices.
    #[must_use]
    pub fn from_points(points: &[TimeSeriesPoint]) -> Self {
        let labels = points
            .iter()
            .map(|p| format!("{}/{}", p.timestamp.month(), p.timestamp.day()))
            .collect();
        let values = points.iter().map(|p| p.close).collect();
        Self { labels, values }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }
}
