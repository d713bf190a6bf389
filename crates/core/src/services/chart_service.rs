use chrono::{Datelike, Local, NaiveDate};
use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::series::{ChartSeries, TimeRange, TimeSeriesPoint};
use crate::providers::alphavantage::TimeSeriesResponse;
use crate::providers::traits::TimeSeriesProvider;

/// Turns raw time-series payloads into chart-ready series.
///
/// The core computes all the numbers — the frontend only renders.
pub struct ChartService {
    provider: Arc<dyn TimeSeriesProvider>,
}

impl ChartService {
    pub fn new(provider: Arc<dyn TimeSeriesProvider>) -> Self {
        Self { provider }
    }

    /// Fetch and normalize the price history of one ticker for a display
    /// range. An unavailable or unrecognized payload yields an empty
    /// series, not an error — the UI shows "no data" and the user retries
    /// by reopening the screen.
    pub async fn fetch_chart(
        &self,
        ticker: &str,
        range: TimeRange,
    ) -> Result<ChartSeries, CoreError> {
        let payload = self.provider.time_series(ticker, range).await?;
        Ok(normalize_series(&payload, range))
    }
}

/// Normalize a raw payload for a display range, windowed relative to the
/// current local date (YTD uses January 1st of the current year).
#[must_use]
pub fn normalize_series(payload: &TimeSeriesResponse, range: TimeRange) -> ChartSeries {
    normalize_series_at(payload, range, Local::now().date_naive())
}

/// Normalization with an explicit "today", so windowing is deterministic.
///
/// Steps: classify the payload (rate-limit markers → empty), locate the
/// series under the fixed key precedence, parse every bar, sort ascending
/// by timestamp (provider order is not guaranteed), then window: YTD keeps
/// entries at or after January 1st of `today`'s year, every other range
/// keeps the last `point_budget()` entries.
#[must_use]
pub fn normalize_series_at(
    payload: &TimeSeriesResponse,
    range: TimeRange,
    today: NaiveDate,
) -> ChartSeries {
    if payload.is_unavailable() {
        return ChartSeries::default();
    }
    let Some(series) = payload.located_series() else {
        return ChartSeries::default();
    };

    let mut points: Vec<TimeSeriesPoint> = series
        .iter()
        .filter_map(|(timestamp, bar)| bar.parse(timestamp))
        .collect();
    points.sort_by_key(|p| p.timestamp);

    let retained: &[TimeSeriesPoint] = match range.point_budget() {
        Some(budget) => {
            let start = points.len().saturating_sub(budget);
            &points[start..]
        }
        None => {
            // YTD: calendar filter, no truncation by count.
            let jan_first = NaiveDate::from_ymd_opt(today.year(), 1, 1)
                .unwrap_or(today)
                .and_hms_opt(0, 0, 0)
                .unwrap_or_default();
            let start = points.partition_point(|p| p.timestamp < jan_first);
            &points[start..]
        }
    };

    ChartSeries::from_points(retained)
}

/// All parsed points of the located series, chronological ascending and
/// unwindowed — the input for indicator math.
#[must_use]
pub fn raw_points(payload: &TimeSeriesResponse) -> Vec<TimeSeriesPoint> {
    let Some(series) = payload.located_series() else {
        return Vec::new();
    };
    let mut points: Vec<TimeSeriesPoint> = series
        .iter()
        .filter_map(|(timestamp, bar)| bar.parse(timestamp))
        .collect();
    points.sort_by_key(|p| p.timestamp);
    points
}

/// Simple moving average over closing prices. Positions before the first
/// full window hold 0.0 so the output aligns index-for-index with the
/// input.
#[must_use]
pub fn moving_average(points: &[TimeSeriesPoint], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![0.0; points.len()];
    }
    points
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 < period {
                0.0
            } else {
                let window = &points[i + 1 - period..=i];
                window.iter().map(|p| p.close).sum::<f64>() / period as f64
            }
        })
        .collect()
}

/// Shorten a share volume for display: 1_234_000_000 → "1.23B".
#[must_use]
pub fn format_volume(volume: u64) -> String {
    if volume >= 1_000_000_000 {
        format!("{:.2}B", volume as f64 / 1_000_000_000.0)
    } else if volume >= 1_000_000 {
        format!("{:.2}M", volume as f64 / 1_000_000.0)
    } else if volume >= 1_000 {
        format!("{:.2}K", volume as f64 / 1_000.0)
    } else {
        volume.to_string()
    }
}
