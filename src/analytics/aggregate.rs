//! Aggregator
//!
//! Buckets entries by local calendar day, time-of-day period, day of week,
//! month, and season. Only buckets that received at least one entry are
//! emitted, so every bucket carries `count >= 1`.
//!
//! ```text
//! Entry → local time → {day, period, weekday, month, season} → count / mean
//! ```

use crate::entry::Entry;
use chrono::{Datelike, FixedOffset, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Running count and sum for one bucket
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Accumulator {
    pub count: usize,
    pub sum: f64,
}

impl Accumulator {
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
    }

    /// Mean of the accumulated values, 0 when nothing was added
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// All entries logged on one local calendar day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub count: usize,
    pub mean_pain: f64,
    /// Per-entry pains in chronological order
    pub pains: Vec<f64>,
}

/// Part of the day an entry falls in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum TimePeriod {
    /// 05:00-12:00
    Morning,
    /// 12:00-17:00
    Afternoon,
    /// 17:00-21:00
    Evening,
    /// 21:00-05:00
    Night,
}

impl TimePeriod {
    /// Classify a local hour (0-23)
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimePeriod::Morning,
            12..=16 => TimePeriod::Afternoon,
            17..=20 => TimePeriod::Evening,
            _ => TimePeriod::Night,
        }
    }
}

impl std::fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimePeriod::Morning => write!(f, "morning"),
            TimePeriod::Afternoon => write!(f, "afternoon"),
            TimePeriod::Evening => write!(f, "evening"),
            TimePeriod::Night => write!(f, "night"),
        }
    }
}

/// Meteorological season of the local date
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    /// Season for a month number (1-12)
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }
}

/// Count and mean pain for one time-of-day period
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodStats {
    pub period: TimePeriod,
    pub count: usize,
    pub mean_pain: f64,
}

/// Count and mean pain for one day of the week
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeekdayStats {
    /// ISO day number, Monday = 1
    pub iso_day: u32,
    pub name: String,
    pub count: usize,
    pub mean_pain: f64,
}

/// Count and mean pain for one calendar month (1-12)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthStats {
    pub month: u32,
    pub count: usize,
    pub mean_pain: f64,
}

/// Count and mean pain for one season
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeasonStats {
    pub season: Season,
    pub count: usize,
    pub mean_pain: f64,
}

/// Every bucketing of one entry set
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Aggregates {
    /// Day buckets sorted by date
    pub days: Vec<DayBucket>,
    pub periods: Vec<PeriodStats>,
    /// Sorted Monday first
    pub weekdays: Vec<WeekdayStats>,
    pub months: Vec<MonthStats>,
    pub seasons: Vec<SeasonStats>,
}

impl Aggregates {
    /// Day of week with the highest mean pain
    pub fn worst_weekday(&self) -> Option<&WeekdayStats> {
        self.weekdays
            .iter()
            .fold(None, |best: Option<&WeekdayStats>, w| match best {
                Some(b) if b.mean_pain >= w.mean_pain => Some(b),
                _ => Some(w),
            })
    }

    /// Time-of-day period with the highest mean pain
    pub fn worst_period(&self) -> Option<&PeriodStats> {
        self.periods
            .iter()
            .fold(None, |best: Option<&PeriodStats>, p| match best {
                Some(b) if b.mean_pain >= p.mean_pain => Some(b),
                _ => Some(p),
            })
    }
}

/// Bucket entries by local calendar units
///
/// `entries` must already be in chronological order so each day's `pains`
/// list is chronological too.
pub fn aggregate(entries: &[Entry], offset: FixedOffset) -> Aggregates {
    let mut days: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    let mut periods: BTreeMap<TimePeriod, Accumulator> = BTreeMap::new();
    let mut weekdays: BTreeMap<u32, Accumulator> = BTreeMap::new();
    let mut months: BTreeMap<u32, Accumulator> = BTreeMap::new();
    let mut seasons: BTreeMap<Season, Accumulator> = BTreeMap::new();

    for entry in entries {
        let local = entry.timestamp.with_timezone(&offset);

        days.entry(local.date_naive()).or_default().push(entry.pain);
        periods
            .entry(TimePeriod::from_hour(local.hour()))
            .or_default()
            .add(entry.pain);
        weekdays
            .entry(local.weekday().number_from_monday())
            .or_default()
            .add(entry.pain);
        months.entry(local.month()).or_default().add(entry.pain);
        seasons
            .entry(Season::from_month(local.month()))
            .or_default()
            .add(entry.pain);
    }

    let aggregates = Aggregates {
        days: days
            .into_iter()
            .map(|(date, pains)| DayBucket {
                date,
                count: pains.len(),
                mean_pain: pains.iter().sum::<f64>() / pains.len() as f64,
                pains,
            })
            .collect(),
        periods: periods
            .into_iter()
            .map(|(period, acc)| PeriodStats {
                period,
                count: acc.count,
                mean_pain: acc.mean(),
            })
            .collect(),
        weekdays: weekdays
            .into_iter()
            .map(|(iso_day, acc)| WeekdayStats {
                iso_day,
                name: weekday_name(iso_day).to_string(),
                count: acc.count,
                mean_pain: acc.mean(),
            })
            .collect(),
        months: months
            .into_iter()
            .map(|(month, acc)| MonthStats {
                month,
                count: acc.count,
                mean_pain: acc.mean(),
            })
            .collect(),
        seasons: seasons
            .into_iter()
            .map(|(season, acc)| SeasonStats {
                season,
                count: acc.count,
                mean_pain: acc.mean(),
            })
            .collect(),
    };

    tracing::debug!(
        days = aggregates.days.len(),
        periods = aggregates.periods.len(),
        weekdays = aggregates.weekdays.len(),
        "Aggregated entries"
    );

    aggregates
}

fn weekday_name(iso_day: u32) -> &'static str {
    match iso_day {
        1 => "Monday",
        2 => "Tuesday",
        3 => "Wednesday",
        4 => "Thursday",
        5 => "Friday",
        6 => "Saturday",
        _ => "Sunday",
    }
}
