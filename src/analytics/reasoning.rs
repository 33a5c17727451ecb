//! Reasoning Tree Builder
//!
//! Packages the engine's readings into a shallow explanation tree for audit:
//!
//! ```text
//! root (sample size, mean, volatility)
//! ├── pattern   → worst weekday, worst time of day, top trigger
//! ├── risk      → flare prediction, best dosing window
//! └── clinical  → good/bad day counts, top two recommendations
//! ```
//!
//! Every node carries the same coverage-based confidence, derived from the
//! number of entries behind the snapshot.

use crate::analytics::correlation::top_aggravating;
use crate::analytics::predict::{Confidence, RiskAssessment};
use crate::analytics::recommend::{Recommendation, Signals};
use crate::config::AnalyticsConfig;
use crate::entry::LabelKind;
use serde::{Deserialize, Serialize};

/// One node of the explanation tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReasoningNode {
    pub id: String,
    pub title: String,
    pub insight: String,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
    #[serde(default)]
    pub children: Vec<ReasoningNode>,
}

impl ReasoningNode {
    fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        insight: impl Into<String>,
        confidence: Confidence,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            insight: insight.into(),
            confidence,
            evidence: None,
            suggested_action: None,
            children: Vec::new(),
        }
    }

    fn evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }

    fn action(mut self, action: impl Into<String>) -> Self {
        self.suggested_action = Some(action.into());
        self
    }

    fn children(mut self, children: Vec<ReasoningNode>) -> Self {
        self.children = children;
        self
    }

    /// Number of levels in the tree rooted here (a leaf is depth 1)
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(|c| c.depth()).max().unwrap_or(0)
    }

    /// Total nodes in the tree rooted here
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }
}

/// Build the explanation tree
pub fn build(
    signals: &Signals<'_>,
    risk: &RiskAssessment,
    recommendations: &[Recommendation],
    config: &AnalyticsConfig,
) -> ReasoningNode {
    let summary = signals.summary;
    let confidence =
        Confidence::from_samples(summary.entry_count, config.coverage_medium, config.coverage_high);

    if summary.entry_count == 0 {
        return ReasoningNode::new(
            "root",
            "No evidence yet",
            "There are no entries in this window to reason about.",
            confidence,
        )
        .action("Log pain entries to start building patterns");
    }

    let root = ReasoningNode::new(
        "root",
        "Pain overview",
        format!(
            "{} entries average {:.1} with volatility {:.1}; the trend is {}.",
            summary.entry_count, summary.mean_pain, summary.volatility, summary.direction
        ),
        confidence,
    );

    root.children(vec![
        pattern_branch(signals, confidence),
        risk_branch(signals, risk, confidence),
        clinical_branch(signals, recommendations, config, confidence),
    ])
}

fn pattern_branch(signals: &Signals<'_>, confidence: Confidence) -> ReasoningNode {
    let aggregates = signals.aggregates;
    let mut leaves = Vec::new();

    if let Some(day) = aggregates.worst_weekday() {
        leaves.push(
            ReasoningNode::new(
                "pattern.weekday",
                format!("{}s are hardest", day.name),
                format!("{}s average {:.1}.", day.name, day.mean_pain),
                confidence,
            )
            .evidence(format!("{} entries", day.count)),
        );
    }

    if let Some(period) = aggregates.worst_period() {
        leaves.push(
            ReasoningNode::new(
                "pattern.period",
                format!("The {} is hardest", period.period),
                format!("Entries in the {} average {:.1}.", period.period, period.mean_pain),
                confidence,
            )
            .evidence(format!("{} entries", period.count)),
        );
    }

    if let Some(trigger) = top_aggravating(signals.correlations, LabelKind::Trigger, 0.0) {
        leaves.push(
            ReasoningNode::new(
                "pattern.trigger",
                format!("Top trigger: {}", trigger.label),
                format!("Pain averages {:+.1} points when it is logged.", trigger.mean_delta),
                confidence,
            )
            .evidence(format!(
                "{} entries, support {:.0}%",
                trigger.occurrence_count,
                trigger.confidence * 100.0
            )),
        );
    }

    ReasoningNode::new(
        "pattern",
        "Patterns",
        format!(
            "Entries span {} days, {} weekdays and {} times of day.",
            aggregates.days.len(),
            aggregates.weekdays.len(),
            aggregates.periods.len()
        ),
        confidence,
    )
    .children(leaves)
}

fn risk_branch(signals: &Signals<'_>, risk: &RiskAssessment, confidence: Confidence) -> ReasoningNode {
    let mut leaves = Vec::new();

    if let Some(flare) = signals.flare {
        let mut leaf = ReasoningNode::new(
            "risk.flare",
            "Possible flare ahead",
            format!(
                "Estimated {}% within {}.",
                flare.probability, flare.timeframe
            ),
            confidence,
        )
        .evidence(format!("Recent average {:.1}", flare.recent_average));
        if let Some(action) = flare.recommended_actions.first() {
            leaf = leaf.action(action.clone());
        }
        leaves.push(leaf);
    }

    if let Some(window) = signals.medication.and_then(|m| m.optimal_window.as_ref()) {
        leaves.push(
            ReasoningNode::new(
                "risk.medication_window",
                format!("Best dosing window {}", window.label),
                format!(
                    "Doses here are followed by {:.1} points less pain.",
                    window.avg_reduction
                ),
                confidence,
            )
            .evidence(format!("{} relief events", window.count)),
        );
    }

    ReasoningNode::new(
        "risk",
        "Flare risk",
        format!("Risk score {:.0} of 100 ({}).", risk.score, risk.level),
        confidence,
    )
    .evidence(format!(
        "Bad-day ratio {:.0}%, rising tail: {}",
        signals.summary.bad_day_ratio * 100.0,
        if risk.rising { "yes" } else { "no" }
    ))
    .children(leaves)
}

fn clinical_branch(
    signals: &Signals<'_>,
    recommendations: &[Recommendation],
    config: &AnalyticsConfig,
    confidence: Confidence,
) -> ReasoningNode {
    let days = &signals.aggregates.days;
    let good_days = days.iter().filter(|d| d.mean_pain <= config.good_day_pain).count();
    let bad_days = days.iter().filter(|d| d.mean_pain >= config.bad_day_pain).count();

    let leaves = recommendations
        .iter()
        .take(2)
        .enumerate()
        .map(|(i, rec)| {
            ReasoningNode::new(
                format!("clinical.recommendation_{}", i + 1),
                rec.title.clone(),
                rec.detail.clone(),
                confidence,
            )
            .action(rec.title.clone())
        })
        .collect();

    ReasoningNode::new(
        "clinical",
        "Ready to share",
        format!(
            "{} good days and {} bad days out of {} logged days.",
            good_days,
            bad_days,
            days.len()
        ),
        confidence,
    )
    .evidence("Observational summary, not a diagnosis")
    .children(leaves)
}
