//! # Flareline
//!
//! Pain Pattern & Predictive Analytics - a deterministic engine that turns a
//! personal pain log into trends, correlations, flare episodes, forecasts and
//! explainable recommendations.
//!
//! ## Features
//!
//! - **Descriptive statistics**: mean, volatility, OLS trend, rolling anomalies
//! - **Patterns**: day, time-of-day, weekday, month and season buckets
//! - **Correlations**: label pain deltas and quality-of-life signal correlations
//! - **Episodes**: flare onset, peak, duration and recovery
//! - **Medication**: relief after doses, per medication and dosing window
//! - **Prediction**: risk score, flare prediction, next-period forecast
//! - **Explainability**: ranked recommendations and a reasoning tree
//!
//! Every output is a heuristic, observational summary. Nothing here is a
//! diagnosis.
//!
//! ## Modules
//!
//! - [`entry`]: Input data model
//! - [`analytics`]: The engine and its components
//! - [`import`]: Loading entries from JSON and CSV files
//! - [`config`]: Thresholds and logging configuration
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use flareline::{AnalyticsConfig, AnalyticsEngine, Entry, TimeWindow};
//!
//! let now = Utc.with_ymd_and_hms(2024, 5, 20, 18, 0, 0).unwrap();
//! let entries: Vec<Entry> = [4.0, 5.0, 7.0, 8.0]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, &pain)| Entry::new(now - Duration::days(4 - i as i64), pain).trigger("rain"))
//!     .collect();
//!
//! let engine = AnalyticsEngine::new(AnalyticsConfig::default());
//! let snapshot = engine.analyze(&entries, TimeWindow::Month, now);
//!
//! println!("Mean pain {:.1}, risk {:.0}", snapshot.summary.mean_pain, snapshot.risk.score);
//! for rec in &snapshot.recommendations {
//!     println!("[{:?}] {}", rec.emphasis, rec.title);
//! }
//! ```

pub mod analytics;
pub mod config;
pub mod entry;
pub mod import;

// Re-export top-level types for convenience
pub use entry::{Entry, EntryError, LabelKind, MedicationUse, Signal, TimeWindow};

pub use analytics::{
    AnalyticsEngine, AnalyticsError, AnalyticsResult, AnalyticsSnapshot, SnapshotCache,
};

pub use import::{load_entries, EntryImport, ImportError, ImportResult};

pub use config::{AnalyticsConfig, BaselineMethod, Config, ConfigError, LoggingConfig};
