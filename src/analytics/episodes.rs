//! Episode Detector
//!
//! Segments the day-bucket mean-pain series into flare episodes.
//!
//! The baseline for a day is the mean (or median) of up to `baseline_days`
//! preceding day means; no episode can open until `min_baseline_days` of
//! history exist. A day whose mean sits at least `onset_threshold` above its
//! baseline opens an episode. The baseline is frozen at onset, and the
//! episode continues while day means stay more than `recovery_threshold`
//! above it. The first day back within that band is the recovery day.
//!
//! ```text
//!         onset            end  recovery
//!           │ ┌──peak──┐    │    │
//! baseline ─┴─┘        └────┴────┴──
//! ```

use crate::analytics::aggregate::DayBucket;
use crate::analytics::trend::{mean, median};
use crate::config::{AnalyticsConfig, BaselineMethod};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Severity tier of an observed episode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeSeverity {
    Moderate,
    High,
}

/// A contiguous run of elevated-pain days
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    pub start_date: NaiveDate,
    /// Last elevated day
    pub end_date: NaiveDate,
    pub peak_date: NaiveDate,
    /// Baseline in effect when the episode opened
    pub baseline: f64,
    pub severity: EpisodeSeverity,
    pub peak_pain: f64,
    /// Calendar days from onset to end, inclusive; always >= 1
    pub duration_days: i64,
    /// Days from the last elevated day to the first recovered day; `None`
    /// when the series ends before recovery
    pub recovery_days: Option<i64>,
}

/// All episodes in a day series
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EpisodeReport {
    pub episodes: Vec<Episode>,
    pub total_episode_days: i64,
    /// 0 when there are no episodes
    pub mean_duration_days: f64,
}

struct OpenEpisode {
    start: NaiveDate,
    end: NaiveDate,
    peak_date: NaiveDate,
    peak_pain: f64,
    baseline: f64,
}

impl OpenEpisode {
    fn close(self, recovery: Option<NaiveDate>, config: &AnalyticsConfig) -> Episode {
        let severity = if self.peak_pain >= config.high_severity_pain {
            EpisodeSeverity::High
        } else {
            EpisodeSeverity::Moderate
        };

        Episode {
            start_date: self.start,
            end_date: self.end,
            peak_date: self.peak_date,
            baseline: self.baseline,
            severity,
            peak_pain: self.peak_pain,
            duration_days: (self.end - self.start).num_days() + 1,
            recovery_days: recovery.map(|day| (day - self.end).num_days()),
        }
    }
}

/// Detect flare episodes over date-sorted day buckets
pub fn detect(days: &[DayBucket], config: &AnalyticsConfig) -> EpisodeReport {
    let mut history: Vec<f64> = Vec::with_capacity(days.len());
    let mut open: Option<OpenEpisode> = None;
    let mut episodes = Vec::new();

    for day in days {
        open = match open.take() {
            None => baseline(&history, config).and_then(|base| {
                (day.mean_pain - base >= config.onset_threshold).then(|| OpenEpisode {
                    start: day.date,
                    end: day.date,
                    peak_date: day.date,
                    peak_pain: day.mean_pain,
                    baseline: base,
                })
            }),
            Some(mut episode) => {
                if day.mean_pain - episode.baseline > config.recovery_threshold {
                    episode.end = day.date;
                    if day.mean_pain > episode.peak_pain {
                        episode.peak_pain = day.mean_pain;
                        episode.peak_date = day.date;
                    }
                    Some(episode)
                } else {
                    episodes.push(episode.close(Some(day.date), config));
                    None
                }
            }
        };
        history.push(day.mean_pain);
    }

    if let Some(episode) = open {
        episodes.push(episode.close(None, config));
    }

    let total_episode_days: i64 = episodes.iter().map(|e| e.duration_days).sum();
    let mean_duration_days = if episodes.is_empty() {
        0.0
    } else {
        total_episode_days as f64 / episodes.len() as f64
    };

    tracing::debug!(
        days = days.len(),
        episodes = episodes.len(),
        total_episode_days,
        "Detected flare episodes"
    );

    EpisodeReport {
        episodes,
        total_episode_days,
        mean_duration_days,
    }
}

/// Baseline from the trailing window of prior day means
fn baseline(history: &[f64], config: &AnalyticsConfig) -> Option<f64> {
    if history.len() < config.min_baseline_days.max(1) {
        return None;
    }

    let window = &history[history.len().saturating_sub(config.baseline_days.max(1))..];
    Some(match config.baseline_method {
        BaselineMethod::Mean => mean(window),
        BaselineMethod::Median => median(window),
    })
}
