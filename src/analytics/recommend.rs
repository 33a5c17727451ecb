//! Recommendation Builder
//!
//! Maps the engine's readings through ordered rules into a prioritized list
//! of recommendation records. Rules fire in a fixed order and the list is
//! then stably sorted by emphasis, so among equal emphasis the rule order
//! decides. The list is never empty: when no rule fires a single
//! low-emphasis "keep logging" record is returned.

use crate::analytics::aggregate::{Aggregates, WeekdayStats};
use crate::analytics::correlation::{top_aggravating, CorrelationResult};
use crate::analytics::medication::MedicationReport;
use crate::analytics::predict::FlarePrediction;
use crate::analytics::trend::{TrendDirection, TrendSummary};
use crate::config::AnalyticsConfig;
use crate::entry::LabelKind;
use serde::{Deserialize, Serialize};

/// What a recommendation is about
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationCategory {
    Flare,
    Trigger,
    Medication,
    Routine,
}

/// How prominently a recommendation should be shown
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Emphasis {
    Low,
    Medium,
    High,
}

/// A human-readable suggestion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub title: String,
    pub detail: String,
    pub category: RecommendationCategory,
    pub emphasis: Emphasis,
}

impl Recommendation {
    fn new(
        title: impl Into<String>,
        detail: impl Into<String>,
        category: RecommendationCategory,
        emphasis: Emphasis,
    ) -> Self {
        Self {
            title: title.into(),
            detail: detail.into(),
            category,
            emphasis,
        }
    }
}

/// Readings the recommendation and reasoning builders consume
#[derive(Debug, Clone, Copy)]
pub struct Signals<'a> {
    pub summary: &'a TrendSummary,
    pub aggregates: &'a Aggregates,
    pub correlations: &'a [CorrelationResult],
    pub medication: Option<&'a MedicationReport>,
    pub flare: Option<&'a FlarePrediction>,
}

/// Apply the recommendation rules in order
pub fn build(signals: &Signals<'_>, config: &AnalyticsConfig) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if let Some(flare) = signals.flare {
        recommendations.push(Recommendation::new(
            "Prepare for a possible flare",
            format!(
                "Recent pain averages {:.1} and has not eased over the last entries. \
                 A flare within {} is estimated at {}%.",
                flare.recent_average, flare.timeframe, flare.probability
            ),
            RecommendationCategory::Flare,
            Emphasis::High,
        ));
    }

    if let Some(trigger) = top_aggravating(signals.correlations, LabelKind::Trigger, config.trigger_delta) {
        recommendations.push(Recommendation::new(
            format!("Watch for \"{}\"", trigger.label),
            format!(
                "Pain averages {:+.1} points when \"{}\" is logged ({} entries).",
                trigger.mean_delta, trigger.label, trigger.occurrence_count
            ),
            RecommendationCategory::Trigger,
            Emphasis::High,
        ));
    }

    if let Some(day) = heavy_weekday(signals, config) {
        recommendations.push(Recommendation::new(
            format!("Plan lighter {}s", day.name),
            format!(
                "{}s average {:.1}, against {:.1} overall.",
                day.name, day.mean_pain, signals.summary.mean_pain
            ),
            RecommendationCategory::Routine,
            Emphasis::Medium,
        ));
    }

    if signals.summary.direction == TrendDirection::Worsening {
        recommendations.push(Recommendation::new(
            "Review recent changes",
            format!(
                "Pain has been rising by about {:.2} points per entry across this period.",
                signals.summary.slope
            ),
            RecommendationCategory::Routine,
            Emphasis::Medium,
        ));
    }

    if let Some(report) = signals.medication {
        if let Some(med) = report
            .standout()
            .filter(|m| m.avg_reduction > config.medication_reduction)
        {
            recommendations.push(Recommendation::new(
                format!("{} tends to help", med.name),
                format!(
                    "The next entry after {} averages {:.1} points lower ({} of {} doses).",
                    med.name, med.avg_reduction, med.uses, med.logged_doses
                ),
                RecommendationCategory::Medication,
                Emphasis::Medium,
            ));
        }

        if let Some(window) = report
            .optimal_window
            .as_ref()
            .filter(|w| w.avg_reduction > config.window_reduction)
        {
            recommendations.push(Recommendation::new(
                format!("Doses between {} relieve the most", window.label),
                format!(
                    "Doses in this window are followed by {:.1} points less pain on average \
                     ({} events).",
                    window.avg_reduction, window.count
                ),
                RecommendationCategory::Medication,
                Emphasis::Medium,
            ));
        }
    }

    if recommendations.is_empty() {
        recommendations.push(Recommendation::new(
            "Keep logging",
            "More entries will make patterns and predictions clearer.",
            RecommendationCategory::Routine,
            Emphasis::Low,
        ));
    }

    recommendations.sort_by(|a, b| b.emphasis.cmp(&a.emphasis));

    tracing::debug!(count = recommendations.len(), "Built recommendations");
    recommendations
}

/// Worst weekday with enough entries that stands out from the overall mean
fn heavy_weekday<'a>(signals: &Signals<'a>, config: &AnalyticsConfig) -> Option<&'a WeekdayStats> {
    signals
        .aggregates
        .weekdays
        .iter()
        .filter(|w| w.count >= config.min_weekday_entries)
        .fold(None, |best: Option<&WeekdayStats>, w| match best {
            Some(b) if b.mean_pain >= w.mean_pain => Some(b),
            _ => Some(w),
        })
        .filter(|w| w.mean_pain >= signals.summary.mean_pain + config.weekday_delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::aggregate::aggregate;
    use crate::analytics::correlation::rank_labels;
    use crate::analytics::medication;
    use crate::analytics::predict::predict_flare;
    use crate::analytics::trend::summarize;
    use crate::entry::Entry;
    use chrono::{Duration, TimeZone, Utc};

    fn build_for(entries: &[Entry]) -> Vec<Recommendation> {
        let config = AnalyticsConfig::default();
        let summary = summarize(entries, &config);
        let aggregates = aggregate(entries, config.offset());
        let correlations = rank_labels(entries, &config);
        let medication = medication::analyze(entries, &config).ok();
        let flare = predict_flare(entries, &config);

        let signals = Signals {
            summary: &summary,
            aggregates: &aggregates,
            correlations: &correlations,
            medication: medication.as_ref(),
            flare: flare.as_ref(),
        };
        build(&signals, &config)
    }

    fn daily(pains: &[f64]) -> Vec<Entry> {
        // 2024-01-01 is a Monday
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        pains
            .iter()
            .enumerate()
            .map(|(i, &p)| Entry::new(start + Duration::days(i as i64), p))
            .collect()
    }

    #[test]
    fn test_fallback_when_nothing_fires() {
        let recs = build_for(&[]);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].title, "Keep logging");
        assert_eq!(recs[0].emphasis, Emphasis::Low);
    }

    #[test]
    fn test_flare_comes_first() {
        let mut entries = daily(&[5.0, 6.0, 7.0, 8.0, 9.0, 9.5, 10.0]);
        entries[0] = entries[0].clone().trigger("weather");
        entries[1] = entries[1].clone().trigger("weather");
        entries[6] = entries[6].clone().trigger("stairs");
        entries[5] = entries[5].clone().trigger("stairs");

        let recs = build_for(&entries);

        assert_eq!(recs[0].category, RecommendationCategory::Flare);
        assert_eq!(recs[0].emphasis, Emphasis::High);
        assert_eq!(recs[1].category, RecommendationCategory::Trigger);
        assert!(recs[1].title.contains("stairs"));
        assert!(recs.windows(2).all(|w| w[0].emphasis >= w[1].emphasis));
    }

    #[test]
    fn test_heavy_weekday_is_routine() {
        // Mondays at 8, other days at 3
        let pains: Vec<f64> = (0..14).map(|i| if i % 7 == 0 { 8.0 } else { 3.0 }).collect();
        let recs = build_for(&daily(&pains));

        let routine = recs
            .iter()
            .find(|r| r.category == RecommendationCategory::Routine)
            .unwrap();
        assert_eq!(routine.title, "Plan lighter Mondays");
        assert_eq!(routine.emphasis, Emphasis::Medium);
    }

    #[test]
    fn test_medication_and_window() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap();
        let mut entries = Vec::new();
        for day in 0..4 {
            let dose = start + Duration::days(day);
            entries.push(Entry::new(dose, 6.0).medication("ibuprofen"));
            entries.push(Entry::new(dose + Duration::hours(2), 4.0));
        }

        let recs = build_for(&entries);
        let meds: Vec<&Recommendation> = recs
            .iter()
            .filter(|r| r.category == RecommendationCategory::Medication)
            .collect();

        assert_eq!(meds.len(), 2);
        assert_eq!(meds[0].title, "ibuprofen tends to help");
        assert!(meds[1].title.contains("19:00-24:00"));
    }
}
