//! Medication Effect Analyzer
//!
//! Estimates relief by comparing the pain of an entry that logged medication
//! with the pain of the chronologically next entry. Only positive reductions
//! count as evidence; a rise after a dose is discarded rather than read as
//! harm, since unrelated pain increases are common.
//!
//! Evidence is aggregated per medication name and per local dosing window.
//! `effectiveness_score` is a presentation scale, not an efficacy claim.

use crate::analytics::aggregate::Accumulator;
use crate::analytics::error::{ensure_finite, AnalyticsResult};
use crate::config::AnalyticsConfig;
use crate::entry::Entry;
use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Relief evidence for one medication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationEffect {
    pub name: String,
    /// Doses followed by a pain reduction
    pub uses: usize,
    /// Doses followed by any later entry
    pub logged_doses: usize,
    /// Mean of the positive reductions, 0 without evidence
    pub avg_reduction: f64,
    /// `clamp(avg_reduction / reference × 100, 0, 100)`
    pub effectiveness_score: f64,
}

/// Fixed local-time bands used to group doses
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DoseWindow {
    /// 00:00-04:00
    Overnight,
    /// 04:00-07:00
    EarlyMorning,
    /// 07:00-10:00
    Morning,
    /// 10:00-13:00
    Midday,
    /// 13:00-16:00
    Afternoon,
    /// 16:00-19:00
    Evening,
    /// 19:00-24:00
    Night,
}

impl DoseWindow {
    /// Classify a local hour (0-23)
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=3 => DoseWindow::Overnight,
            4..=6 => DoseWindow::EarlyMorning,
            7..=9 => DoseWindow::Morning,
            10..=12 => DoseWindow::Midday,
            13..=15 => DoseWindow::Afternoon,
            16..=18 => DoseWindow::Evening,
            _ => DoseWindow::Night,
        }
    }

    /// Clock range of the band
    pub fn label(&self) -> &'static str {
        match self {
            DoseWindow::Overnight => "00:00-04:00",
            DoseWindow::EarlyMorning => "04:00-07:00",
            DoseWindow::Morning => "07:00-10:00",
            DoseWindow::Midday => "10:00-13:00",
            DoseWindow::Afternoon => "13:00-16:00",
            DoseWindow::Evening => "16:00-19:00",
            DoseWindow::Night => "19:00-24:00",
        }
    }
}

/// Relief evidence for doses taken in one window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowEffect {
    pub window: DoseWindow,
    pub label: String,
    /// Relief events in this window
    pub count: usize,
    pub avg_reduction: f64,
    /// `min(1, count / medication_window_reference)`
    pub confidence: f64,
}

/// Everything the analyzer found
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MedicationReport {
    /// Sorted by average reduction, then uses, then name
    pub medications: Vec<MedicationEffect>,
    /// Windows with at least one relief event, in clock order
    pub windows: Vec<WindowEffect>,
    /// Window with the highest average reduction
    pub optimal_window: Option<WindowEffect>,
}

impl MedicationReport {
    /// Medication with the highest average reduction
    pub fn standout(&self) -> Option<&MedicationEffect> {
        self.medications.first().filter(|m| m.uses > 0)
    }
}

#[derive(Default)]
struct DoseTally {
    relief: Accumulator,
    logged: usize,
}

/// Analyze relief following logged doses
///
/// `entries` must be in chronological order.
pub fn analyze(entries: &[Entry], config: &AnalyticsConfig) -> AnalyticsResult<MedicationReport> {
    let offset = config.offset();
    let mut by_name: BTreeMap<&str, DoseTally> = BTreeMap::new();
    let mut by_window: BTreeMap<DoseWindow, Accumulator> = BTreeMap::new();

    for pair in entries.windows(2) {
        let (dose, next) = (&pair[0], &pair[1]);
        if !dose.has_medication() {
            continue;
        }

        let reduction = dose.pain - next.pain;
        let relief = reduction > 0.0;

        let names: BTreeSet<&str> = dose.medications.iter().map(|m| m.name.as_str()).collect();
        for name in names {
            let tally = by_name.entry(name).or_default();
            tally.logged += 1;
            if relief {
                tally.relief.add(reduction);
            }
        }

        if relief {
            let hour = dose.timestamp.with_timezone(&offset).hour();
            by_window
                .entry(DoseWindow::from_hour(hour))
                .or_default()
                .add(reduction);
        }
    }

    let reference_reduction = config.medication_reference_reduction;
    let mut medications = Vec::with_capacity(by_name.len());
    for (name, tally) in by_name {
        let avg_reduction = ensure_finite(tally.relief.mean(), "medication average reduction")?;
        let effectiveness_score = if reference_reduction > 0.0 {
            (avg_reduction / reference_reduction * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        medications.push(MedicationEffect {
            name: name.to_string(),
            uses: tally.relief.count,
            logged_doses: tally.logged,
            avg_reduction,
            effectiveness_score,
        });
    }

    medications.sort_by(|a, b| {
        b.avg_reduction
            .total_cmp(&a.avg_reduction)
            .then_with(|| b.uses.cmp(&a.uses))
            .then_with(|| a.name.cmp(&b.name))
    });

    let window_reference = config.medication_window_reference.max(1) as f64;
    let mut windows = Vec::with_capacity(by_window.len());
    for (window, acc) in by_window {
        windows.push(WindowEffect {
            window,
            label: window.label().to_string(),
            count: acc.count,
            avg_reduction: ensure_finite(acc.mean(), "dose window average reduction")?,
            confidence: (acc.count as f64 / window_reference).min(1.0),
        });
    }

    // Earliest window wins exact ties on reduction and count
    let optimal_window = windows
        .iter()
        .fold(None, |best: Option<&WindowEffect>, w| match best {
            Some(b)
                if b.avg_reduction > w.avg_reduction
                    || (b.avg_reduction == w.avg_reduction && b.count >= w.count) =>
            {
                Some(b)
            }
            _ => Some(w),
        })
        .cloned();

    tracing::debug!(
        medications = medications.len(),
        windows = windows.len(),
        "Analyzed medication effects"
    );

    Ok(MedicationReport {
        medications,
        windows,
        optimal_window,
    })
}
