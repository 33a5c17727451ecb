//! Entry Filter
//!
//! Restricts the working entry set to a time window and prepares it for the
//! chronology-dependent components.

use crate::entry::{Entry, TimeWindow, PAIN_MAX, PAIN_MIN};
use chrono::{DateTime, Utc};

/// Keep entries with `timestamp >= now - window`, preserving input order
///
/// `TimeWindow::All` returns the input unchanged. An empty result is valid.
pub fn apply(entries: &[Entry], window: TimeWindow, now: DateTime<Utc>) -> Vec<Entry> {
    match window.cutoff(now) {
        None => entries.to_vec(),
        Some(cutoff) => entries
            .iter()
            .filter(|e| e.timestamp >= cutoff)
            .cloned()
            .collect(),
    }
}

/// Sanitize and sort entries chronologically
///
/// Entries whose pain is NaN or infinite are dropped; finite pain outside the
/// 0-10 scale is clamped. The sort is stable, so entries sharing a timestamp
/// keep their input order.
pub fn prepare(entries: Vec<Entry>) -> Vec<Entry> {
    let total = entries.len();

    let mut prepared: Vec<Entry> = entries
        .into_iter()
        .filter(|e| e.pain.is_finite())
        .map(|mut e| {
            e.pain = e.pain.clamp(PAIN_MIN, PAIN_MAX);
            e
        })
        .collect();

    let dropped = total - prepared.len();
    if dropped > 0 {
        tracing::warn!(dropped, "Dropped entries with non-finite pain");
    }

    prepared.sort_by_key(|e| e.timestamp);
    prepared
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_window_is_inclusive_at_cutoff() {
        let entries = vec![
            Entry::new(now() - Duration::days(7), 4.0),
            Entry::new(now() - Duration::days(7) - Duration::seconds(1), 5.0),
            Entry::new(now(), 6.0),
        ];

        let kept = apply(&entries, TimeWindow::Week, now());
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].pain, 4.0);
        assert_eq!(kept[1].pain, 6.0);
    }

    #[test]
    fn test_all_window_returns_input_unchanged() {
        let entries = vec![
            Entry::new(now(), 3.0),
            Entry::new(now() - Duration::days(900), 8.0),
        ];

        assert_eq!(apply(&entries, TimeWindow::All, now()), entries);
    }

    #[test]
    fn test_filter_preserves_input_order() {
        let entries = vec![
            Entry::new(now() - Duration::days(1), 2.0),
            Entry::new(now() - Duration::days(3), 3.0),
            Entry::new(now() - Duration::days(2), 4.0),
        ];

        let pains: Vec<f64> = apply(&entries, TimeWindow::Month, now())
            .iter()
            .map(|e| e.pain)
            .collect();
        assert_eq!(pains, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_empty_input() {
        assert!(apply(&[], TimeWindow::Week, now()).is_empty());
        assert!(prepare(Vec::new()).is_empty());
    }

    #[test]
    fn test_prepare_sorts_clamps_and_drops() {
        let entries = vec![
            Entry::new(now(), 12.0),
            Entry::new(now() - Duration::days(2), f64::NAN),
            Entry::new(now() - Duration::days(1), -1.0),
        ];

        let prepared = prepare(entries);
        assert_eq!(prepared.len(), 2);
        assert_eq!(prepared[0].pain, 0.0);
        assert_eq!(prepared[1].pain, 10.0);
    }
}
