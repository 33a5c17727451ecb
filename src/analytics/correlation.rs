//! Correlation Engine
//!
//! Two kinds of association with pain:
//!
//! - **Label deltas**: for every trigger, symptom, location, and activity
//!   label, the mean pain of entries carrying it minus the overall mean.
//!   Ranked by `|mean_delta|`, ties broken by higher occurrence count.
//! - **Signal correlations**: Pearson coefficient between pain and each
//!   optional numeric signal (sleep quality, mood impact, stress, activity
//!   level) over the entries that recorded it.
//!
//! Both are observational associations, not causes.

use crate::analytics::aggregate::Accumulator;
use crate::analytics::error::{ensure_finite, AnalyticsError, AnalyticsResult};
use crate::analytics::trend::mean;
use crate::config::AnalyticsConfig;
use crate::entry::{Entry, LabelKind, Signal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Association between one label and pain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorrelationResult {
    pub label: String,
    pub kind: LabelKind,
    pub occurrence_count: usize,
    /// Mean pain of entries carrying the label
    pub mean_pain: f64,
    /// Signed difference from the overall mean, in pain points
    pub mean_delta: f64,
    /// `min(1, occurrence_count / support_reference_count)`
    pub confidence: f64,
    /// Seen fewer than `min_support` times
    pub low_confidence: bool,
    /// 1-based position in the ranking
    pub rank: usize,
}

/// Pearson correlation between pain and one numeric signal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalCorrelation {
    pub signal: Signal,
    /// Pearson correlation coefficient (-1 to 1)
    pub coefficient: f64,
    /// Human-readable strength: "strong", "moderate", "weak", "negligible"
    pub strength: String,
    /// Direction: "positive" or "negative"
    pub direction: String,
    /// Number of entries that recorded the signal
    pub sample_size: usize,
}

/// Rank every observed label by the magnitude of its pain delta
pub fn rank_labels(entries: &[Entry], config: &AnalyticsConfig) -> Vec<CorrelationResult> {
    if entries.is_empty() {
        return Vec::new();
    }

    let baseline = mean(&entries.iter().map(|e| e.pain).collect::<Vec<_>>());

    let mut groups: BTreeMap<(LabelKind, &str), Accumulator> = BTreeMap::new();
    for entry in entries {
        for key in entry.labels() {
            groups.entry(key).or_default().add(entry.pain);
        }
    }

    let reference = config.support_reference_count.max(1) as f64;

    let mut results: Vec<CorrelationResult> = groups
        .into_iter()
        .map(|((kind, label), acc)| {
            let mean_pain = acc.mean();
            CorrelationResult {
                label: label.to_string(),
                kind,
                occurrence_count: acc.count,
                mean_pain,
                mean_delta: mean_pain - baseline,
                confidence: (acc.count as f64 / reference).min(1.0),
                low_confidence: acc.count < config.min_support,
                rank: 0,
            }
        })
        .collect();

    // BTreeMap iteration already ordered ties by (kind, label)
    results.sort_by(|a, b| {
        b.mean_delta
            .abs()
            .total_cmp(&a.mean_delta.abs())
            .then_with(|| b.occurrence_count.cmp(&a.occurrence_count))
    });

    for (i, result) in results.iter_mut().enumerate() {
        result.rank = i + 1;
    }

    tracing::debug!(labels = results.len(), baseline, "Ranked label correlations");
    results
}

/// Top label of a kind whose delta exceeds `min_delta` (aggravating labels)
pub fn top_aggravating(
    results: &[CorrelationResult],
    kind: LabelKind,
    min_delta: f64,
) -> Option<&CorrelationResult> {
    results
        .iter()
        .find(|r| r.kind == kind && r.mean_delta > min_delta)
}

/// Correlate pain with every optional signal that has enough observations
///
/// Signals recorded fewer than `signal_min_pairs` times are skipped. Fails
/// only when no signal qualifies at all while some were recorded, or when a
/// coefficient comes out non-finite.
pub fn signal_correlations(
    entries: &[Entry],
    config: &AnalyticsConfig,
) -> AnalyticsResult<Vec<SignalCorrelation>> {
    let mut correlations = Vec::new();
    let mut best_sample = 0;

    for &signal in Signal::all() {
        let (pains, values): (Vec<f64>, Vec<f64>) = entries
            .iter()
            .filter_map(|e| e.signal(signal).map(|v| (e.pain, v)))
            .unzip();

        best_sample = best_sample.max(pains.len());
        if pains.len() < config.signal_min_pairs {
            continue;
        }

        let r = ensure_finite(pearson_correlation(&pains, &values), "signal correlation")?;

        correlations.push(SignalCorrelation {
            signal,
            coefficient: (r * 100.0).round() / 100.0, // Round to 2 decimals
            strength: correlation_strength(r),
            direction: if r >= 0.0 {
                "positive".to_string()
            } else {
                "negative".to_string()
            },
            sample_size: pains.len(),
        });
    }

    if correlations.is_empty() && best_sample > 0 {
        return Err(AnalyticsError::InsufficientData {
            analysis: "signal correlation",
            needed: config.signal_min_pairs,
            found: best_sample,
        });
    }

    // Sort by absolute correlation strength (strongest first)
    correlations.sort_by(|a, b| b.coefficient.abs().total_cmp(&a.coefficient.abs()));

    Ok(correlations)
}

/// Calculate Pearson correlation coefficient
///
/// Returns a value between -1 and 1:
/// - 1: perfect positive correlation
/// - 0: no correlation
/// - -1: perfect negative correlation
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.is_empty() {
        return 0.0;
    }

    let n = x.len() as f64;

    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y.iter()).map(|(a, b)| a * b).sum();
    let sum_x2: f64 = x.iter().map(|a| a * a).sum();
    let sum_y2: f64 = y.iter().map(|b| b * b).sum();

    let numerator = n * sum_xy - sum_x * sum_y;
    let denominator = ((n * sum_x2 - sum_x.powi(2)) * (n * sum_y2 - sum_y.powi(2))).sqrt();

    if denominator == 0.0 || denominator.is_nan() {
        0.0
    } else {
        (numerator / denominator).clamp(-1.0, 1.0)
    }
}

/// Convert correlation coefficient to human-readable strength
fn correlation_strength(r: f64) -> String {
    let abs_r = r.abs();
    if abs_r > 0.7 {
        "strong".to_string()
    } else if abs_r > 0.5 {
        "moderate".to_string()
    } else if abs_r > 0.3 {
        "weak".to_string()
    } else {
        "negligible".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn at(day: i64, pain: f64) -> Entry {
        let start = Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap();
        Entry::new(start + Duration::days(day), pain)
    }

    #[test]
    fn test_pearson_correlation_perfect_positive() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![2.0, 4.0, 6.0, 8.0, 10.0];
        let r = pearson_correlation(&x, &y);
        assert!((r - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_pearson_correlation_perfect_negative() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![10.0, 8.0, 6.0, 4.0, 2.0];
        let r = pearson_correlation(&x, &y);
        assert!((r + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_pearson_correlation_empty_or_constant() {
        assert_eq!(pearson_correlation(&[], &[]), 0.0);
        assert_eq!(pearson_correlation(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_correlation_strength() {
        assert_eq!(correlation_strength(0.8), "strong");
        assert_eq!(correlation_strength(-0.75), "strong");
        assert_eq!(correlation_strength(0.6), "moderate");
        assert_eq!(correlation_strength(0.4), "weak");
        assert_eq!(correlation_strength(0.2), "negligible");
    }

    #[test]
    fn test_large_delta_outranks_frequent_small_delta() {
        // Label A: mean delta +3 over 5 entries. Label B: mean delta -1 over 20.
        let mut entries = Vec::new();
        let mut day = 0;
        for _ in 0..5 {
            entries.push(at(day, 8.0).trigger("A"));
            day += 1;
        }
        for _ in 0..20 {
            entries.push(at(day, 4.0).trigger("B"));
            day += 1;
        }
        for _ in 0..5 {
            entries.push(at(day, 6.0));
            day += 1;
        }
        // overall mean = (40 + 80 + 30) / 30 = 5
        let config = AnalyticsConfig::default();
        let ranked = rank_labels(&entries, &config);

        assert_eq!(ranked[0].label, "A");
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].label, "B");
        assert!((ranked[0].mean_delta - 3.0).abs() < 1e-12);
        assert!((ranked[1].mean_delta + 1.0).abs() < 1e-12);
        assert_eq!(ranked[1].occurrence_count, 20);
    }

    #[test]
    fn test_ties_break_on_occurrence_count() {
        let entries = vec![
            at(0, 8.0).symptom("rare"),
            at(1, 8.0).trigger("common"),
            at(2, 8.0).trigger("common"),
            at(3, 2.0),
            at(4, 2.0),
            at(5, 2.0),
        ];
        let config = AnalyticsConfig::default();
        let ranked = rank_labels(&entries, &config);

        assert_eq!(ranked[0].label, "common");
        assert_eq!(ranked[1].label, "rare");
        assert_eq!(ranked[0].mean_delta, ranked[1].mean_delta);
    }

    #[test]
    fn test_ranking_is_non_increasing() {
        let entries = vec![
            at(0, 9.0).trigger("weather").location("knee"),
            at(1, 3.0).activity("swimming"),
            at(2, 6.0).trigger("weather").symptom("swelling"),
            at(3, 5.0).location("knee"),
            at(4, 2.0).activity("swimming"),
        ];
        let ranked = rank_labels(&entries, &AnalyticsConfig::default());

        for pair in ranked.windows(2) {
            assert!(pair[0].mean_delta.abs() >= pair[1].mean_delta.abs());
        }
    }

    #[test]
    fn test_low_support_is_marked() {
        let entries = vec![at(0, 7.0).trigger("coffee"), at(1, 3.0)];
        let ranked = rank_labels(&entries, &AnalyticsConfig::default());

        assert_eq!(ranked.len(), 1);
        assert!(ranked[0].low_confidence);
        assert!((ranked[0].confidence - 0.2).abs() < 1e-12);
        assert_eq!(ranked[0].mean_delta, 2.0);
    }

    #[test]
    fn test_same_label_in_different_kinds_is_separate() {
        let entries = vec![at(0, 7.0).trigger("walking").activity("walking")];
        let ranked = rank_labels(&entries, &AnalyticsConfig::default());
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_empty_entries() {
        assert!(rank_labels(&[], &AnalyticsConfig::default()).is_empty());
        assert_eq!(
            signal_correlations(&[], &AnalyticsConfig::default()),
            Ok(Vec::new())
        );
    }

    #[test]
    fn test_top_aggravating_trigger() {
        let entries = vec![
            at(0, 9.0).trigger("weather"),
            at(1, 9.0).trigger("weather"),
            at(2, 2.0).symptom("fatigue"),
            at(3, 2.0),
        ];
        let config = AnalyticsConfig::default();
        let ranked = rank_labels(&entries, &config);

        let top = top_aggravating(&ranked, LabelKind::Trigger, 1.0).unwrap();
        assert_eq!(top.label, "weather");
        assert!(top_aggravating(&ranked, LabelKind::Activity, 1.0).is_none());
    }

    #[test]
    fn test_sleep_signal_correlation() {
        let entries: Vec<Entry> = (0..6)
            .map(|i| at(i, 2.0 + i as f64).sleep_quality(8.0 - i as f64))
            .collect();

        let correlations = signal_correlations(&entries, &AnalyticsConfig::default()).unwrap();

        assert_eq!(correlations.len(), 1);
        assert_eq!(correlations[0].signal, Signal::SleepQuality);
        assert_eq!(correlations[0].coefficient, -1.0);
        assert_eq!(correlations[0].strength, "strong");
        assert_eq!(correlations[0].direction, "negative");
        assert_eq!(correlations[0].sample_size, 6);
    }

    #[test]
    fn test_sparse_signal_reports_insufficient_data() {
        let entries = vec![at(0, 5.0).stress(6.0), at(1, 4.0).stress(3.0)];
        let err = signal_correlations(&entries, &AnalyticsConfig::default()).unwrap_err();

        assert_eq!(
            err,
            AnalyticsError::InsufficientData {
                analysis: "signal correlation",
                needed: 5,
                found: 2,
            }
        );
    }
}
