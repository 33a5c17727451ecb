//! Trend & Volatility
//!
//! Descriptive statistics over the filtered, chronologically sorted pain
//! sequence:
//!
//! - mean pain and volatility (population standard deviation)
//! - trend as an ordinary-least-squares slope over the entry index, in pain
//!   points per entry; this is the canonical trend
//! - half-split percentage change (second-half mean vs first-half mean),
//!   consumed by the forecast step table. It is not a rescaled slope: the two
//!   can disagree in magnitude and even in sign
//! - trailing rolling mean / standard deviation and anomaly flags

use crate::config::AnalyticsConfig;
use crate::entry::Entry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of the canonical (OLS slope) trend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    /// Pain is falling
    Improving,
    Stable,
    /// Pain is rising
    Worsening,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Improving => write!(f, "improving"),
            TrendDirection::Stable => write!(f, "stable"),
            TrendDirection::Worsening => write!(f, "worsening"),
        }
    }
}

/// Descriptive statistics of one entry set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendSummary {
    pub entry_count: usize,
    /// Mean pain, 0-10
    pub mean_pain: f64,
    /// Population standard deviation of pain
    pub volatility: f64,
    /// OLS slope of pain over entry index (pain points per entry)
    pub slope: f64,
    /// Percentage change from first-half mean to second-half mean
    pub half_split_change_percent: f64,
    pub direction: TrendDirection,
    pub min_pain: f64,
    pub max_pain: f64,
    /// Entries with pain at or above the bad-day threshold
    pub bad_day_count: usize,
    /// `bad_day_count / entry_count`, 0 when empty
    pub bad_day_ratio: f64,
}

/// One point of the rolling sequence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RollingPoint {
    pub timestamp: DateTime<Utc>,
    pub pain: f64,
    /// Mean of the trailing window of prior points; `None` for the first point
    pub rolling_mean: Option<f64>,
    pub rolling_std_dev: Option<f64>,
    pub anomalous: bool,
}

/// A point whose pain deviates sharply from its trailing window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Anomaly {
    pub timestamp: DateTime<Utc>,
    pub pain: f64,
    pub expected: f64,
    /// Signed deviation in rolling standard deviations
    pub z_score: f64,
}

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation, 0 for fewer than two values
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Median, 0 for an empty slice
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Ordinary-least-squares slope with `x` = 0-based index
///
/// `slope = (n·Σxy − Σx·Σy) / (n·Σx² − (Σx)²)`; 0 for fewer than two values.
pub fn ols_slope(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let n = values.len() as f64;
    let sum_x: f64 = (0..values.len()).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, &y)| i as f64 * y).sum();
    let sum_x2: f64 = (0..values.len()).map(|i| (i as f64).powi(2)).sum();

    let denominator = n * sum_x2 - sum_x.powi(2);
    if denominator.abs() < f64::EPSILON {
        return 0.0;
    }

    (n * sum_xy - sum_x * sum_y) / denominator
}

/// Percentage change of the second-half mean over the first-half mean
///
/// The first half holds `len / 2` values. Guarded to 0 when the first half is
/// empty or its mean is 0.
pub fn half_split_change_percent(values: &[f64]) -> f64 {
    let mid = values.len() / 2;
    if mid == 0 {
        return 0.0;
    }

    let first = mean(&values[..mid]);
    if first == 0.0 {
        return 0.0;
    }

    let second = mean(&values[mid..]);
    (second - first) / first * 100.0
}

/// Compute the descriptive summary of a chronological entry list
pub fn summarize(entries: &[Entry], config: &AnalyticsConfig) -> TrendSummary {
    let pains: Vec<f64> = entries.iter().map(|e| e.pain).collect();

    let slope = ols_slope(&pains);
    let direction = if slope > config.trend_slope_threshold {
        TrendDirection::Worsening
    } else if slope < -config.trend_slope_threshold {
        TrendDirection::Improving
    } else {
        TrendDirection::Stable
    };

    let bad_day_count = pains.iter().filter(|&&p| p >= config.bad_day_pain).count();
    let bad_day_ratio = if pains.is_empty() {
        0.0
    } else {
        bad_day_count as f64 / pains.len() as f64
    };

    let (min_pain, max_pain) = if pains.is_empty() {
        (0.0, 0.0)
    } else {
        (
            pains.iter().cloned().fold(f64::INFINITY, f64::min),
            pains.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        )
    };

    TrendSummary {
        entry_count: pains.len(),
        mean_pain: mean(&pains),
        volatility: population_std_dev(&pains),
        slope,
        half_split_change_percent: half_split_change_percent(&pains),
        direction,
        min_pain,
        max_pain,
        bad_day_count,
        bad_day_ratio,
    }
}

/// Trailing rolling statistics with anomaly flags
///
/// The window for index `i` is the up-to-`rolling_window` points before `i`,
/// so it shrinks near the start instead of producing NaN. Index `i` is
/// anomalous when `|pain − mean| > k · std_dev`; a zero standard deviation
/// never flags.
pub fn rolling(entries: &[Entry], config: &AnalyticsConfig) -> Vec<RollingPoint> {
    let window = config.rolling_window.max(1);
    let pains: Vec<f64> = entries.iter().map(|e| e.pain).collect();

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let prior = &pains[i.saturating_sub(window)..i];
            if prior.is_empty() {
                return RollingPoint {
                    timestamp: entry.timestamp,
                    pain: entry.pain,
                    rolling_mean: None,
                    rolling_std_dev: None,
                    anomalous: false,
                };
            }

            let rolling_mean = mean(prior);
            let rolling_std_dev = population_std_dev(prior);
            let anomalous = rolling_std_dev > 0.0
                && (entry.pain - rolling_mean).abs() > config.anomaly_multiplier * rolling_std_dev;

            RollingPoint {
                timestamp: entry.timestamp,
                pain: entry.pain,
                rolling_mean: Some(rolling_mean),
                rolling_std_dev: Some(rolling_std_dev),
                anomalous,
            }
        })
        .collect()
}

/// Extract the flagged points of a rolling sequence
pub fn anomalies(points: &[RollingPoint]) -> Vec<Anomaly> {
    points
        .iter()
        .filter(|p| p.anomalous)
        .filter_map(|p| {
            let expected = p.rolling_mean?;
            let std_dev = p.rolling_std_dev.filter(|s| *s > 0.0)?;
            Some(Anomaly {
                timestamp: p.timestamp,
                pain: p.pain,
                expected,
                z_score: (p.pain - expected) / std_dev,
            })
        })
        .collect()
}
