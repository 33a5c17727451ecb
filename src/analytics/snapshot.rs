//! Analytics engine and snapshot
//!
//! `AnalyticsEngine::analyze` runs the whole pipeline over one entry set and
//! window and returns an immutable `AnalyticsSnapshot`:
//!
//! ```text
//! filter → prepare → aggregate
//!            ├── trend / rolling / anomalies
//!            ├── label + signal correlations
//!            ├── episodes
//!            └── medication effects
//!                  → risk / flare / forecast
//!                        → recommendations + reasoning tree
//! ```
//!
//! The engine never fails. Optional sub-analyses that return an error are
//! logged and surfaced as `None`.

use crate::analytics::aggregate::{aggregate, Aggregates};
use crate::analytics::correlation::{self, CorrelationResult, SignalCorrelation};
use crate::analytics::episodes::{self, EpisodeReport};
use crate::analytics::filter;
use crate::analytics::medication::{self, MedicationReport};
use crate::analytics::predict::{self, FlarePrediction, Forecast, RiskAssessment};
use crate::analytics::reasoning::{self, ReasoningNode};
use crate::analytics::recommend::{self, Recommendation, Signals};
use crate::analytics::trend::{self, Anomaly, RollingPoint, TrendSummary};
use crate::config::AnalyticsConfig;
use crate::entry::{Entry, TimeWindow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attached to every snapshot
pub const OBSERVATIONAL_NOTICE: &str =
    "Heuristic, observational summary of logged entries. Not a diagnosis or medical advice.";

/// Everything one engine invocation produces
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsSnapshot {
    pub window: TimeWindow,
    /// Reference instant the window was measured back from
    pub generated_for: DateTime<Utc>,
    pub summary: TrendSummary,
    pub aggregates: Aggregates,
    pub rolling: Vec<RollingPoint>,
    pub anomalies: Vec<Anomaly>,
    pub correlations: Vec<CorrelationResult>,
    /// `None` when signal correlation was unavailable
    pub signal_correlations: Option<Vec<SignalCorrelation>>,
    pub episodes: EpisodeReport,
    /// `None` when the medication analysis was unavailable
    pub medication: Option<MedicationReport>,
    pub risk: RiskAssessment,
    pub predicted_flare: Option<FlarePrediction>,
    pub forecast: Forecast,
    /// Never empty
    pub recommendations: Vec<Recommendation>,
    pub reasoning: ReasoningNode,
    pub notice: String,
}

/// Stateless analytics engine
#[derive(Debug, Clone, Default)]
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
}

impl AnalyticsEngine {
    /// Create an engine with the given thresholds
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    /// Thresholds in use
    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Compute a snapshot of `entries` within `window` of `now`
    ///
    /// `entries` may be in any order; the caller's slice is never modified.
    pub fn analyze(&self, entries: &[Entry], window: TimeWindow, now: DateTime<Utc>) -> AnalyticsSnapshot {
        let config = &self.config;
        let entries = filter::prepare(filter::apply(entries, window, now));

        let aggregates = aggregate(&entries, config.offset());
        let summary = trend::summarize(&entries, config);
        let rolling = trend::rolling(&entries, config);
        let anomalies = trend::anomalies(&rolling);
        let correlations = correlation::rank_labels(&entries, config);

        let signal_correlations = match correlation::signal_correlations(&entries, config) {
            Ok(found) => Some(found),
            Err(e) => {
                tracing::warn!(error = %e, "Signal correlation unavailable");
                None
            }
        };

        let episodes = episodes::detect(&aggregates.days, config);

        let medication = match medication::analyze(&entries, config) {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!(error = %e, "Medication analysis unavailable");
                None
            }
        };

        let risk = predict::risk_score(&summary, &entries, config);
        let predicted_flare = predict::predict_flare(&entries, config);
        let forecast = predict::forecast(&summary, config);

        let signals = Signals {
            summary: &summary,
            aggregates: &aggregates,
            correlations: &correlations,
            medication: medication.as_ref(),
            flare: predicted_flare.as_ref(),
        };
        let recommendations = recommend::build(&signals, config);
        let reasoning = reasoning::build(&signals, &risk, &recommendations, config);

        tracing::debug!(
            window = %window,
            entries = summary.entry_count,
            episodes = episodes.episodes.len(),
            anomalies = anomalies.len(),
            risk = risk.score,
            "Computed analytics snapshot"
        );

        AnalyticsSnapshot {
            window,
            generated_for: now,
            summary,
            aggregates,
            rolling,
            anomalies,
            correlations,
            signal_correlations,
            episodes,
            medication,
            risk,
            predicted_flare,
            forecast,
            recommendations,
            reasoning,
            notice: OBSERVATIONAL_NOTICE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::predict::FlareSeverity;
    use crate::analytics::recommend::Emphasis;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap()
    }

    fn daily_until_now(pains: &[f64]) -> Vec<Entry> {
        let n = pains.len() as i64;
        pains
            .iter()
            .enumerate()
            .map(|(i, &p)| Entry::new(now() - Duration::days(n - i as i64), p))
            .collect()
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = AnalyticsEngine::default().analyze(&[], TimeWindow::Month, now());

        assert_eq!(snapshot.summary.mean_pain, 0.0);
        assert_eq!(snapshot.summary.volatility, 0.0);
        assert!(snapshot.predicted_flare.is_none());
        assert_eq!(snapshot.recommendations.len(), 1);
        assert_eq!(snapshot.recommendations[0].emphasis, Emphasis::Low);
        assert!(snapshot.episodes.episodes.is_empty());
        assert_eq!(snapshot.signal_correlations, Some(Vec::new()));
        assert_eq!(snapshot.medication, Some(MedicationReport::default()));
        assert_eq!(snapshot.reasoning.title, "No evidence yet");
        assert_eq!(snapshot.notice, OBSERVATIONAL_NOTICE);
    }

    #[test]
    fn test_window_excludes_old_entries() {
        let mut entries = daily_until_now(&[4.0, 4.0]);
        entries.push(Entry::new(now() - Duration::days(60), 9.0));

        let snapshot = AnalyticsEngine::default().analyze(&entries, TimeWindow::Month, now());
        assert_eq!(snapshot.summary.entry_count, 2);
        assert_eq!(snapshot.summary.mean_pain, 4.0);

        let all = AnalyticsEngine::default().analyze(&entries, TimeWindow::All, now());
        assert_eq!(all.summary.entry_count, 3);
    }

    #[test]
    fn test_fortnight_episode_through_engine() {
        let entries = daily_until_now(&[3.0, 3.0, 3.0, 4.0, 4.0, 5.0, 6.0, 7.0, 8.0, 8.0, 7.0, 6.0, 5.0, 4.0]);
        let snapshot = AnalyticsEngine::default().analyze(&entries, TimeWindow::Month, now());

        assert_eq!(snapshot.episodes.episodes.len(), 1);
        assert_eq!(snapshot.episodes.episodes[0].peak_pain, 8.0);
        assert_eq!(snapshot.episodes.episodes[0].duration_days, 7);
    }

    #[test]
    fn test_rising_week_predicts_flare() {
        let entries = daily_until_now(&[4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        let snapshot = AnalyticsEngine::default().analyze(&entries, TimeWindow::Week, now());

        let flare = snapshot.predicted_flare.as_ref().unwrap();
        // Recent average 7.0: moderate, probability 70
        assert_eq!(flare.severity, FlareSeverity::Moderate);
        assert_eq!(flare.probability, 70);
        assert_eq!(snapshot.recommendations[0].title, "Prepare for a possible flare");
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let entries = daily_until_now(&[2.0, 6.0, 3.0, 7.0, 5.0]);
        let mut reversed = entries.clone();
        reversed.reverse();

        let engine = AnalyticsEngine::default();
        assert_eq!(
            engine.analyze(&entries, TimeWindow::Month, now()),
            engine.analyze(&reversed, TimeWindow::Month, now())
        );
    }

    #[test]
    fn test_unavailable_signal_correlation_does_not_abort() {
        let entries: Vec<Entry> = daily_until_now(&[3.0, 4.0, 5.0])
            .into_iter()
            .map(|e| e.sleep_quality(6.0))
            .collect();

        let snapshot = AnalyticsEngine::default().analyze(&entries, TimeWindow::Month, now());
        assert!(snapshot.signal_correlations.is_none());
        assert_eq!(snapshot.summary.entry_count, 3);
    }

    #[test]
    fn test_snapshot_serializes() {
        let entries = daily_until_now(&[3.0, 5.0, 4.0]);
        let snapshot = AnalyticsEngine::default().analyze(&entries, TimeWindow::Month, now());

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"mean_pain\""));
        assert!(json.contains("\"predicted_flare\":null"));
    }
}
