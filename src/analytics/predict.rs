//! Predictive Heuristics
//!
//! Three short-horizon readings built from the trend summary and the most
//! recent entries:
//!
//! - a 0-100 flare risk score with a low/moderate/high stratum
//! - a flare prediction, present only when recent pain is high and rising
//! - a next-period forecast driven by the half-split percentage change
//!
//! All outputs are observational heuristics, not clinical predictions.

use crate::analytics::trend::{mean, TrendSummary};
use crate::config::AnalyticsConfig;
use crate::entry::Entry;
use serde::{Deserialize, Serialize};

/// Fixed label attached to every flare prediction
pub const FLARE_TIMEFRAME: &str = "24-48 hours";

/// Ordered actions attached to every flare prediction
pub const FLARE_ACTIONS: [&str; 4] = [
    "Plan lighter activity for the next two days",
    "Keep rescue medication and comfort measures within reach",
    "Prioritize sleep and hydration",
    "Log pain more often so changes are caught early",
];

/// Qualitative confidence tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Tier for a sample size against two inclusive cut-offs
    pub fn from_samples(samples: usize, medium: usize, high: usize) -> Self {
        if samples >= high {
            Confidence::High
        } else if samples >= medium {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

/// Stratum of the risk score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Moderate => write!(f, "moderate"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// Weighted flare risk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    /// 0-100
    pub score: f64,
    pub level: RiskLevel,
    /// Whether the last `rising_run` entries are non-decreasing
    pub rising: bool,
}

/// Severity tier of a predicted flare
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlareSeverity {
    Low,
    Moderate,
    High,
}

/// Expected near-term flare
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlarePrediction {
    /// 0-100
    pub probability: u32,
    pub timeframe: String,
    pub severity: FlareSeverity,
    /// Mean pain of the recent entries the prediction is based on
    pub recent_average: f64,
    pub recommended_actions: Vec<String>,
}

/// Next-period average pain projection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Forecast {
    /// 0-10
    pub projected_average: f64,
    /// Signed pain points relative to the current mean
    pub delta_from_current: f64,
    pub confidence: Confidence,
    pub narrative: String,
}

/// Whether the last `run` pains never decrease
///
/// False when fewer than `run` pains exist.
pub fn rising_tail(pains: &[f64], run: usize) -> bool {
    let run = run.max(2);
    if pains.len() < run {
        return false;
    }
    pains[pains.len() - run..].windows(2).all(|w| w[1] >= w[0])
}

/// Combine mean, volatility and bad-day ratio into a 0-100 score
pub fn risk_score(summary: &TrendSummary, entries: &[Entry], config: &AnalyticsConfig) -> RiskAssessment {
    let pains: Vec<f64> = entries.iter().map(|e| e.pain).collect();
    let rising = rising_tail(&pains, config.rising_run);

    let mut score = summary.mean_pain * config.risk_mean_weight
        + summary.volatility * config.risk_volatility_weight
        + summary.bad_day_ratio * config.risk_bad_day_weight;
    if rising {
        score += config.risk_rising_bonus;
    }
    let score = if score.is_finite() {
        score.clamp(0.0, 100.0)
    } else {
        0.0
    };

    let level = if score >= config.risk_high_score {
        RiskLevel::High
    } else if score >= config.risk_moderate_score {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    };

    RiskAssessment { score, level, rising }
}

/// Predict a flare when recent pain is both high and rising
pub fn predict_flare(entries: &[Entry], config: &AnalyticsConfig) -> Option<FlarePrediction> {
    let pains: Vec<f64> = entries.iter().map(|e| e.pain).collect();
    let recent = &pains[pains.len().saturating_sub(config.recent_entries.max(1))..];
    if recent.is_empty() {
        return None;
    }

    let recent_average = mean(recent);
    if recent_average <= config.flare_recent_average || !rising_tail(&pains, config.rising_run) {
        return None;
    }

    let probability = ((recent_average / 10.0 * 100.0).round() as u32).min(config.flare_probability_cap);
    let severity = if recent_average > config.flare_high_average {
        FlareSeverity::High
    } else {
        FlareSeverity::Moderate
    };

    tracing::debug!(probability, recent_average, "Flare predicted");

    Some(FlarePrediction {
        probability,
        timeframe: FLARE_TIMEFRAME.to_string(),
        severity,
        recent_average,
        recommended_actions: FLARE_ACTIONS.iter().map(|a| a.to_string()).collect(),
    })
}

/// Step-table change in pain points for a half-split percentage change
pub fn projected_change(change_percent: f64, config: &AnalyticsConfig) -> f64 {
    let steep = config.forecast_steep_percent;
    if change_percent > steep {
        config.forecast_steep_rise
    } else if change_percent > 0.0 {
        config.forecast_mild_rise
    } else if change_percent < -steep {
        config.forecast_steep_fall
    } else if change_percent < 0.0 {
        config.forecast_mild_fall
    } else {
        0.0
    }
}

/// Project next-period average pain
pub fn forecast(summary: &TrendSummary, config: &AnalyticsConfig) -> Forecast {
    let confidence = Confidence::from_samples(
        summary.entry_count,
        config.forecast_medium_samples,
        config.forecast_high_samples,
    );

    if summary.entry_count == 0 {
        return Forecast {
            projected_average: 0.0,
            delta_from_current: 0.0,
            confidence,
            narrative: "Not enough data to forecast yet.".to_string(),
        };
    }

    let change = projected_change(summary.half_split_change_percent, config);
    let projected_average = (summary.mean_pain + change).clamp(0.0, 10.0);
    let delta_from_current = projected_average - summary.mean_pain;

    let narrative = if delta_from_current > 0.0 {
        format!(
            "Average pain may rise to about {:.1} next period (from {:.1}).",
            projected_average, summary.mean_pain
        )
    } else if delta_from_current < 0.0 {
        format!(
            "Average pain may ease to about {:.1} next period (from {:.1}).",
            projected_average, summary.mean_pain
        )
    } else {
        format!(
            "Average pain is expected to hold around {:.1} next period.",
            projected_average
        )
    };

    Forecast {
        projected_average,
        delta_from_current,
        confidence,
        narrative,
    }
}
