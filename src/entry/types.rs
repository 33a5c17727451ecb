//! Core data types for pain-log entries
//!
//! This module defines the input side of the engine:
//! - `Entry`: A single health-log record (pain, labels, signals, medications)
//! - `MedicationUse`: One medication taken alongside an entry
//! - `TimeWindow`: The look-back window an analysis is restricted to
//! - `LabelKind` and `Signal`: Classification enums for correlation analysis

use crate::entry::error::EntryError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Lowest pain level on the scale
pub const PAIN_MIN: f64 = 0.0;

/// Highest pain level on the scale
pub const PAIN_MAX: f64 = 10.0;

/// A single pain-log entry
///
/// Entries are created and edited by the caller's health-log store; the engine
/// only reads them. Label sets are ordered so every derived ranking is
/// deterministic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    /// When the entry was recorded
    pub timestamp: DateTime<Utc>,
    /// Pain level, 0-10 inclusive
    pub pain: f64,
    /// Body locations where pain was felt
    #[serde(default)]
    pub locations: BTreeSet<String>,
    /// Symptoms noted with this entry
    #[serde(default)]
    pub symptoms: BTreeSet<String>,
    /// Suspected triggers
    #[serde(default)]
    pub triggers: BTreeSet<String>,
    /// Activities performed around the entry
    #[serde(default)]
    pub activities: BTreeSet<String>,
    /// Sleep quality, 0-10
    #[serde(default, alias = "qualityOfSleep")]
    pub sleep_quality: Option<f64>,
    /// Impact on mood, 0-10
    #[serde(default, alias = "moodImpact")]
    pub mood_impact: Option<f64>,
    /// Medications taken, in the order they were logged
    #[serde(default, alias = "medicationsUsed")]
    pub medications: Vec<MedicationUse>,
    /// Stress level
    #[serde(default)]
    pub stress: Option<f64>,
    /// Physical activity level
    #[serde(default, alias = "activityLevel")]
    pub activity_level: Option<f64>,
}

impl Entry {
    /// Create an entry with only a timestamp and pain level
    pub fn new(timestamp: DateTime<Utc>, pain: f64) -> Self {
        Self {
            timestamp,
            pain,
            locations: BTreeSet::new(),
            symptoms: BTreeSet::new(),
            triggers: BTreeSet::new(),
            activities: BTreeSet::new(),
            sleep_quality: None,
            mood_impact: None,
            medications: Vec::new(),
            stress: None,
            activity_level: None,
        }
    }

    /// Builder method: add a pain location
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.locations.insert(location.into());
        self
    }

    /// Builder method: add a symptom
    pub fn symptom(mut self, symptom: impl Into<String>) -> Self {
        self.symptoms.insert(symptom.into());
        self
    }

    /// Builder method: add a trigger
    pub fn trigger(mut self, trigger: impl Into<String>) -> Self {
        self.triggers.insert(trigger.into());
        self
    }

    /// Builder method: add an activity
    pub fn activity(mut self, activity: impl Into<String>) -> Self {
        self.activities.insert(activity.into());
        self
    }

    /// Builder method: record a medication
    pub fn medication(mut self, name: impl Into<String>) -> Self {
        self.medications.push(MedicationUse::new(name));
        self
    }

    /// Builder method: set sleep quality
    pub fn sleep_quality(mut self, value: f64) -> Self {
        self.sleep_quality = Some(value);
        self
    }

    /// Builder method: set mood impact
    pub fn mood_impact(mut self, value: f64) -> Self {
        self.mood_impact = Some(value);
        self
    }

    /// Builder method: set stress level
    pub fn stress(mut self, value: f64) -> Self {
        self.stress = Some(value);
        self
    }

    /// Builder method: set activity level
    pub fn activity_level(mut self, value: f64) -> Self {
        self.activity_level = Some(value);
        self
    }

    /// Check whether any medication was logged with this entry
    pub fn has_medication(&self) -> bool {
        !self.medications.is_empty()
    }

    /// Iterate over every label on this entry together with its kind
    pub fn labels(&self) -> impl Iterator<Item = (LabelKind, &str)> + '_ {
        tagged(LabelKind::Trigger, &self.triggers)
            .chain(tagged(LabelKind::Symptom, &self.symptoms))
            .chain(tagged(LabelKind::Location, &self.locations))
            .chain(tagged(LabelKind::Activity, &self.activities))
    }

    /// Read an optional numeric signal; non-finite values count as absent
    pub fn signal(&self, signal: Signal) -> Option<f64> {
        let value = match signal {
            Signal::SleepQuality => self.sleep_quality,
            Signal::MoodImpact => self.mood_impact,
            Signal::Stress => self.stress,
            Signal::ActivityLevel => self.activity_level,
        };
        value.filter(|v| v.is_finite())
    }
}

fn tagged(kind: LabelKind, set: &BTreeSet<String>) -> impl Iterator<Item = (LabelKind, &str)> + '_ {
    set.iter().map(move |label| (kind, label.as_str()))
}

/// A medication taken alongside an entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MedicationUse {
    /// Medication name as logged
    pub name: String,
}

impl MedicationUse {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Which label set a correlation label came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LabelKind {
    Trigger,
    Symptom,
    Location,
    Activity,
}

impl std::fmt::Display for LabelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelKind::Trigger => write!(f, "trigger"),
            LabelKind::Symptom => write!(f, "symptom"),
            LabelKind::Location => write!(f, "location"),
            LabelKind::Activity => write!(f, "activity"),
        }
    }
}

/// Optional numeric quality-of-life signals carried by entries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    SleepQuality,
    MoodImpact,
    Stress,
    ActivityLevel,
}

impl Signal {
    /// Get all signals for iteration
    pub fn all() -> &'static [Signal] {
        &[
            Signal::SleepQuality,
            Signal::MoodImpact,
            Signal::Stress,
            Signal::ActivityLevel,
        ]
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::SleepQuality => write!(f, "sleep quality"),
            Signal::MoodImpact => write!(f, "mood impact"),
            Signal::Stress => write!(f, "stress"),
            Signal::ActivityLevel => write!(f, "activity level"),
        }
    }
}

/// Look-back window for an analysis
///
/// Serialized in its short form (`7d`, `30d`, `90d`, `1y`, `all`); `1w` and
/// `365d` are accepted on input, matching `FromStr`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum TimeWindow {
    #[serde(rename = "7d", alias = "1w")]
    Week,
    #[default]
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "1y", alias = "365d")]
    Year,
    #[serde(rename = "all")]
    All,
}

impl TimeWindow {
    /// Number of days covered, or `None` for the unbounded window
    pub fn days(&self) -> Option<i64> {
        match self {
            TimeWindow::Week => Some(7),
            TimeWindow::Month => Some(30),
            TimeWindow::Quarter => Some(90),
            TimeWindow::Year => Some(365),
            TimeWindow::All => None,
        }
    }

    /// Earliest timestamp (inclusive) kept by this window relative to `now`
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.days().map(|days| now - Duration::days(days))
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeWindow::Week => write!(f, "7d"),
            TimeWindow::Month => write!(f, "30d"),
            TimeWindow::Quarter => write!(f, "90d"),
            TimeWindow::Year => write!(f, "1y"),
            TimeWindow::All => write!(f, "all"),
        }
    }
}

impl FromStr for TimeWindow {
    type Err = EntryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "7d" | "1w" => Ok(TimeWindow::Week),
            "30d" => Ok(TimeWindow::Month),
            "90d" => Ok(TimeWindow::Quarter),
            "1y" | "365d" => Ok(TimeWindow::Year),
            "all" => Ok(TimeWindow::All),
            other => Err(EntryError::InvalidWindow(other.to_string())),
        }
    }
}
