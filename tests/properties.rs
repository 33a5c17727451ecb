use chrono::{DateTime, Duration, TimeZone, Utc};
use flareline::analytics::{AnalyticsSnapshot, SnapshotCache};
use flareline::{AnalyticsConfig, AnalyticsEngine, BaselineMethod, Entry, TimeWindow};
use proptest::prelude::*;

const EPSILON: f64 = 1e-9;

fn reference_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 1, 18, 0, 0).unwrap()
}

fn arb_label() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("weather"), Just("stress"), Just("stairs"), Just("cold")]
}

fn arb_entry() -> impl Strategy<Value = Entry> {
    (
        0i64..(120 * 24),
        // Slightly outside the scale so clamping is exercised
        -1.0f64..11.0,
        proptest::option::of(arb_label()),
        proptest::option::of(0.0f64..10.0),
        any::<bool>(),
    )
        .prop_map(|(hours_ago, pain, trigger, sleep, medicated)| {
            let mut entry = Entry::new(reference_time() - Duration::hours(hours_ago), pain);
            if let Some(label) = trigger {
                entry = entry.trigger(label);
            }
            if let Some(value) = sleep {
                entry = entry.sleep_quality(value);
            }
            if medicated {
                entry = entry.medication("naproxen");
            }
            entry
        })
}

fn arb_entries() -> impl Strategy<Value = Vec<Entry>> {
    proptest::collection::vec(arb_entry(), 0..60)
}

fn arb_window() -> impl Strategy<Value = TimeWindow> {
    prop_oneof![
        Just(TimeWindow::Week),
        Just(TimeWindow::Month),
        Just(TimeWindow::Quarter),
        Just(TimeWindow::Year),
        Just(TimeWindow::All),
    ]
}

fn analyze(entries: &[Entry], window: TimeWindow) -> AnalyticsSnapshot {
    AnalyticsEngine::default().analyze(entries, window, reference_time())
}

// ── Bounds ───────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn summary_bounds(entries in arb_entries(), window in arb_window()) {
        let snapshot = analyze(&entries, window);
        let summary = &snapshot.summary;

        prop_assert!(summary.volatility >= 0.0);
        prop_assert!((0.0..=10.0).contains(&summary.mean_pain), "mean {}", summary.mean_pain);
        prop_assert!((0.0..=1.0).contains(&summary.bad_day_ratio));
    }

    #[test]
    fn risk_and_forecast_bounds(entries in arb_entries(), window in arb_window()) {
        let snapshot = analyze(&entries, window);

        prop_assert!((0.0..=100.0).contains(&snapshot.risk.score), "risk {}", snapshot.risk.score);
        prop_assert!((0.0..=10.0).contains(&snapshot.forecast.projected_average));
        if let Some(flare) = &snapshot.predicted_flare {
            prop_assert!(flare.probability <= 100);
        }
    }

    #[test]
    fn recommendations_never_empty(entries in arb_entries(), window in arb_window()) {
        let snapshot = analyze(&entries, window);
        prop_assert!(!snapshot.recommendations.is_empty());
        prop_assert!(snapshot
            .recommendations
            .windows(2)
            .all(|w| w[0].emphasis >= w[1].emphasis));
    }

    #[test]
    fn reasoning_tree_is_shallow(entries in arb_entries()) {
        let snapshot = analyze(&entries, TimeWindow::All);
        prop_assert!(snapshot.reasoning.depth() <= 3);
    }

    #[test]
    fn correlations_ordered_by_magnitude(entries in arb_entries()) {
        let snapshot = analyze(&entries, TimeWindow::All);
        prop_assert!(snapshot
            .correlations
            .windows(2)
            .all(|w| w[0].mean_delta.abs() >= w[1].mean_delta.abs()));
    }

    #[test]
    fn episodes_last_at_least_a_day(entries in arb_entries(), median in any::<bool>()) {
        let config = AnalyticsConfig {
            baseline_method: if median { BaselineMethod::Median } else { BaselineMethod::Mean },
            ..AnalyticsConfig::default()
        };
        let snapshot = AnalyticsEngine::new(config).analyze(&entries, TimeWindow::All, reference_time());

        for episode in &snapshot.episodes.episodes {
            prop_assert!(episode.duration_days >= 1);
            prop_assert!(episode.start_date <= episode.end_date);
            prop_assert!(episode.recovery_days.map_or(true, |d| d >= 1));
        }
    }

    #[test]
    fn medication_scores_bounded(entries in arb_entries()) {
        let snapshot = analyze(&entries, TimeWindow::All);
        if let Some(report) = &snapshot.medication {
            for m in &report.medications {
                prop_assert!((0.0..=100.0).contains(&m.effectiveness_score));
                prop_assert!(m.uses <= m.logged_doses);
            }
            if let Some(window) = &report.optimal_window {
                prop_assert!(window.confidence <= 1.0);
            }
        }
    }
}

// ── Determinism ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn analysis_is_idempotent(entries in arb_entries(), window in arb_window()) {
        let first = analyze(&entries, window);
        let second = analyze(&entries, window);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn cache_matches_direct_computation(entries in arb_entries(), window in arb_window()) {
        let engine = AnalyticsEngine::default();
        let mut cache = SnapshotCache::new(4);

        let cached = cache.get_or_compute(&engine, &entries, window, reference_time());
        let direct = engine.analyze(&entries, window, reference_time());
        prop_assert_eq!(cached.as_ref(), &direct);
    }

    #[test]
    fn json_round_trip_keeps_numbers(entries in arb_entries()) {
        let snapshot = analyze(&entries, TimeWindow::All);
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: AnalyticsSnapshot = serde_json::from_str(&json).unwrap();

        let close = |a: f64, b: f64| (a - b).abs() <= EPSILON;
        prop_assert!(close(back.summary.mean_pain, snapshot.summary.mean_pain));
        prop_assert!(close(back.summary.volatility, snapshot.summary.volatility));
        prop_assert!(close(back.summary.slope, snapshot.summary.slope));
        prop_assert!(close(
            back.summary.half_split_change_percent,
            snapshot.summary.half_split_change_percent
        ));
        prop_assert!(close(back.risk.score, snapshot.risk.score));
        prop_assert!(close(back.forecast.projected_average, snapshot.forecast.projected_average));

        prop_assert_eq!(back.correlations.len(), snapshot.correlations.len());
        for (a, b) in back.correlations.iter().zip(&snapshot.correlations) {
            prop_assert_eq!(&a.label, &b.label);
            prop_assert!(close(a.mean_delta, b.mean_delta));
        }

        prop_assert_eq!(back.episodes.episodes.len(), snapshot.episodes.episodes.len());
        prop_assert_eq!(&back.recommendations, &snapshot.recommendations);
        prop_assert_eq!(back.predicted_flare.is_some(), snapshot.predicted_flare.is_some());
    }
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[test]
fn correlation_magnitude_beats_frequency() {
    let start = reference_time() - Duration::days(40);
    let mut entries = Vec::new();
    let mut at = |pain: f64, label: Option<&str>| {
        let n = entries.len() as i64;
        let entry = Entry::new(start + Duration::hours(6 * n), pain);
        entries.push(match label {
            Some(l) => entry.trigger(l),
            None => entry,
        });
    };

    // Overall mean 5: A delta +3 (n=5), B delta -1 (n=20)
    for _ in 0..5 {
        at(8.0, Some("A"));
    }
    for _ in 0..20 {
        at(4.0, Some("B"));
    }
    for _ in 0..5 {
        at(6.0, None);
    }

    let snapshot = analyze(&entries, TimeWindow::All);
    let a = snapshot.correlations.iter().find(|c| c.label == "A").unwrap();
    let b = snapshot.correlations.iter().find(|c| c.label == "B").unwrap();

    assert!((a.mean_delta - 3.0).abs() < EPSILON);
    assert!((b.mean_delta + 1.0).abs() < EPSILON);
    assert!(a.rank < b.rank);
}

#[test]
fn medication_scenario_one_day_apart() {
    let dose = reference_time() - Duration::days(2);
    let entries = vec![
        Entry::new(dose, 8.0).medication("A"),
        Entry::new(dose + Duration::days(1), 3.0),
    ];

    let snapshot = analyze(&entries, TimeWindow::Week);
    let report = snapshot.medication.unwrap();
    assert_eq!(report.medications[0].name, "A");
    assert_eq!(report.medications[0].avg_reduction, 5.0);
    assert_eq!(report.medications[0].uses, 1);
}

#[test]
fn empty_input_snapshot() {
    let snapshot = analyze(&[], TimeWindow::Month);
    assert_eq!(snapshot.summary.mean_pain, 0.0);
    assert_eq!(snapshot.summary.volatility, 0.0);
    assert!(snapshot.predicted_flare.is_none());
    assert_eq!(snapshot.recommendations.len(), 1);
    assert_eq!(snapshot.recommendations[0].title, "Keep logging");
}
