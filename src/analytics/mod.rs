//! Flareline Analytics Engine
//!
//! Pure, deterministic computation over an in-memory entry list:
//!
//! - **filter**: Time-window restriction and input sanitizing
//! - **aggregate**: Day, time-of-day, weekday, month and season buckets
//! - **trend**: Mean, volatility, OLS slope, half-split change, rolling anomalies
//! - **correlation**: Label pain deltas and signal Pearson correlations
//! - **episodes**: Flare episode segmentation over day buckets
//! - **medication**: Relief after doses, per medication and dosing window
//! - **predict**: Risk score, flare prediction, forecast
//! - **recommend**: Ordered recommendation rules
//! - **reasoning**: Explanation tree
//! - **snapshot**: `AnalyticsEngine` tying the pipeline together
//! - **cache**: Caller-owned memoization of snapshots
//! - **error**: Sub-analysis error types
//!
//! # Architecture
//!
//! ```text
//! Entries → filter → aggregate → {trend, correlation, episodes, medication}
//!                                  → predict → {recommend, reasoning}
//!                                               → AnalyticsSnapshot
//! ```
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use flareline::analytics::AnalyticsEngine;
//! use flareline::entry::{Entry, TimeWindow};
//!
//! let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
//! let entries = vec![
//!     Entry::new(Utc.with_ymd_and_hms(2024, 3, 8, 9, 0, 0).unwrap(), 6.0).trigger("cold"),
//!     Entry::new(Utc.with_ymd_and_hms(2024, 3, 9, 9, 0, 0).unwrap(), 3.0),
//! ];
//!
//! let snapshot = AnalyticsEngine::default().analyze(&entries, TimeWindow::Week, now);
//! assert_eq!(snapshot.summary.entry_count, 2);
//! assert!(!snapshot.recommendations.is_empty());
//! ```

pub mod aggregate;
pub mod cache;
pub mod correlation;
pub mod episodes;
pub mod error;
pub mod filter;
pub mod medication;
pub mod predict;
pub mod reasoning;
pub mod recommend;
pub mod snapshot;
pub mod trend;

pub use aggregate::{Aggregates, DayBucket, Season, TimePeriod};
pub use cache::{CacheStats, SnapshotCache, SnapshotKey};
pub use correlation::{CorrelationResult, SignalCorrelation};
pub use episodes::{Episode, EpisodeReport, EpisodeSeverity};
pub use error::{AnalyticsError, AnalyticsResult};
pub use medication::{DoseWindow, MedicationEffect, MedicationReport, WindowEffect};
pub use predict::{Confidence, FlarePrediction, FlareSeverity, Forecast, RiskAssessment, RiskLevel};
pub use reasoning::ReasoningNode;
pub use recommend::{Emphasis, Recommendation, RecommendationCategory};
pub use snapshot::{AnalyticsEngine, AnalyticsSnapshot, OBSERVATIONAL_NOTICE};
pub use trend::{Anomaly, RollingPoint, TrendDirection, TrendSummary};
