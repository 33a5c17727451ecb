//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.
//!
//! Every heuristic threshold used by the analytics engine is a named constant
//! below and a field of [`AnalyticsConfig`], so sensitivity can be tuned (or
//! varied in tests) without touching the analysis code.

use crate::entry::TimeWindow;
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 0;
pub const DEFAULT_ROLLING_WINDOW: usize = 7;
pub const DEFAULT_ANOMALY_MULTIPLIER: f64 = 2.5;
pub const DEFAULT_BAD_DAY_PAIN: f64 = 7.0;
pub const DEFAULT_GOOD_DAY_PAIN: f64 = 3.0;
pub const DEFAULT_TREND_SLOPE_THRESHOLD: f64 = 0.05;

pub const DEFAULT_MIN_SUPPORT: usize = 2;
pub const DEFAULT_SUPPORT_REFERENCE_COUNT: usize = 5;
pub const DEFAULT_SIGNAL_MIN_PAIRS: usize = 5;

pub const DEFAULT_BASELINE_DAYS: usize = 14;
pub const DEFAULT_MIN_BASELINE_DAYS: usize = 3;
pub const DEFAULT_ONSET_THRESHOLD: f64 = 2.0;
pub const DEFAULT_RECOVERY_THRESHOLD: f64 = 1.0;
pub const DEFAULT_HIGH_SEVERITY_PAIN: f64 = 7.0;

pub const DEFAULT_RECENT_ENTRIES: usize = 7;
pub const DEFAULT_RISING_RUN: usize = 3;
pub const DEFAULT_FLARE_RECENT_AVERAGE: f64 = 6.0;
pub const DEFAULT_FLARE_HIGH_AVERAGE: f64 = 8.0;
pub const DEFAULT_FLARE_PROBABILITY_CAP: u32 = 95;

pub const DEFAULT_RISK_MEAN_WEIGHT: f64 = 10.0;
pub const DEFAULT_RISK_VOLATILITY_WEIGHT: f64 = 5.0;
pub const DEFAULT_RISK_BAD_DAY_WEIGHT: f64 = 30.0;
pub const DEFAULT_RISK_RISING_BONUS: f64 = 10.0;
pub const DEFAULT_RISK_MODERATE_SCORE: f64 = 40.0;
pub const DEFAULT_RISK_HIGH_SCORE: f64 = 70.0;

pub const DEFAULT_FORECAST_STEEP_PERCENT: f64 = 5.0;
pub const DEFAULT_FORECAST_STEEP_RISE: f64 = 0.8;
pub const DEFAULT_FORECAST_MILD_RISE: f64 = 0.4;
pub const DEFAULT_FORECAST_STEEP_FALL: f64 = -0.7;
pub const DEFAULT_FORECAST_MILD_FALL: f64 = -0.3;
pub const DEFAULT_FORECAST_HIGH_SAMPLES: usize = 40;
pub const DEFAULT_FORECAST_MEDIUM_SAMPLES: usize = 20;

pub const DEFAULT_MEDICATION_REFERENCE_REDUCTION: f64 = 3.0;
pub const DEFAULT_MEDICATION_WINDOW_REFERENCE: usize = 4;

pub const DEFAULT_WEEKDAY_DELTA: f64 = 1.0;
pub const DEFAULT_MIN_WEEKDAY_ENTRIES: usize = 1;
pub const DEFAULT_TRIGGER_DELTA: f64 = 1.0;
pub const DEFAULT_MEDICATION_REDUCTION: f64 = 0.5;
pub const DEFAULT_WINDOW_REDUCTION: f64 = 0.3;

pub const DEFAULT_COVERAGE_HIGH: usize = 60;
pub const DEFAULT_COVERAGE_MEDIUM: usize = 25;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Engine invocation defaults
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub default_window: TimeWindow,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_window: TimeWindow::default(),
        }
    }
}

/// How the episode detector derives its rolling baseline
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BaselineMethod {
    #[default]
    Mean,
    Median,
}

/// Heuristic thresholds for every analytics component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Offset applied to timestamps before computing calendar buckets
    pub utc_offset_minutes: i32,

    /// Trailing window for rolling mean / standard deviation
    pub rolling_window: usize,
    /// Deviation (in rolling standard deviations) that marks an anomaly
    pub anomaly_multiplier: f64,
    /// Pain at or above this is a bad day
    pub bad_day_pain: f64,
    /// Day mean at or below this is a good day
    pub good_day_pain: f64,
    /// Absolute OLS slope (pain per entry) separating stable from moving
    pub trend_slope_threshold: f64,

    /// Labels seen fewer times than this are marked low-confidence
    pub min_support: usize,
    /// Occurrence count at which label confidence saturates
    pub support_reference_count: usize,
    /// Minimum paired observations for a signal correlation
    pub signal_min_pairs: usize,

    /// Trailing days used for the episode baseline
    pub baseline_days: usize,
    /// Days of history required before any episode can open
    pub min_baseline_days: usize,
    pub baseline_method: BaselineMethod,
    /// Elevation above baseline that opens an episode
    pub onset_threshold: f64,
    /// Elevation at or below which an episode has recovered
    pub recovery_threshold: f64,
    /// Peak pain at or above this makes an episode high severity
    pub high_severity_pain: f64,

    /// Entries considered "recent" by the flare predictor
    pub recent_entries: usize,
    /// Length of the trailing run checked for non-decreasing pain
    pub rising_run: usize,
    pub flare_recent_average: f64,
    pub flare_high_average: f64,
    pub flare_probability_cap: u32,

    pub risk_mean_weight: f64,
    pub risk_volatility_weight: f64,
    pub risk_bad_day_weight: f64,
    pub risk_rising_bonus: f64,
    pub risk_moderate_score: f64,
    pub risk_high_score: f64,

    /// Half-split percentage change beyond which the steep forecast steps apply
    pub forecast_steep_percent: f64,
    pub forecast_steep_rise: f64,
    pub forecast_mild_rise: f64,
    pub forecast_steep_fall: f64,
    pub forecast_mild_fall: f64,
    pub forecast_high_samples: usize,
    pub forecast_medium_samples: usize,

    /// Average reduction mapped to an effectiveness score of 100
    pub medication_reference_reduction: f64,
    /// Relief events at which a dosing-window estimate reaches full confidence
    pub medication_window_reference: usize,

    pub weekday_delta: f64,
    pub min_weekday_entries: usize,
    pub trigger_delta: f64,
    pub medication_reduction: f64,
    pub window_reduction: f64,

    pub coverage_high: usize,
    pub coverage_medium: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            rolling_window: DEFAULT_ROLLING_WINDOW,
            anomaly_multiplier: DEFAULT_ANOMALY_MULTIPLIER,
            bad_day_pain: DEFAULT_BAD_DAY_PAIN,
            good_day_pain: DEFAULT_GOOD_DAY_PAIN,
            trend_slope_threshold: DEFAULT_TREND_SLOPE_THRESHOLD,
            min_support: DEFAULT_MIN_SUPPORT,
            support_reference_count: DEFAULT_SUPPORT_REFERENCE_COUNT,
            signal_min_pairs: DEFAULT_SIGNAL_MIN_PAIRS,
            baseline_days: DEFAULT_BASELINE_DAYS,
            min_baseline_days: DEFAULT_MIN_BASELINE_DAYS,
            baseline_method: BaselineMethod::default(),
            onset_threshold: DEFAULT_ONSET_THRESHOLD,
            recovery_threshold: DEFAULT_RECOVERY_THRESHOLD,
            high_severity_pain: DEFAULT_HIGH_SEVERITY_PAIN,
            recent_entries: DEFAULT_RECENT_ENTRIES,
            rising_run: DEFAULT_RISING_RUN,
            flare_recent_average: DEFAULT_FLARE_RECENT_AVERAGE,
            flare_high_average: DEFAULT_FLARE_HIGH_AVERAGE,
            flare_probability_cap: DEFAULT_FLARE_PROBABILITY_CAP,
            risk_mean_weight: DEFAULT_RISK_MEAN_WEIGHT,
            risk_volatility_weight: DEFAULT_RISK_VOLATILITY_WEIGHT,
            risk_bad_day_weight: DEFAULT_RISK_BAD_DAY_WEIGHT,
            risk_rising_bonus: DEFAULT_RISK_RISING_BONUS,
            risk_moderate_score: DEFAULT_RISK_MODERATE_SCORE,
            risk_high_score: DEFAULT_RISK_HIGH_SCORE,
            forecast_steep_percent: DEFAULT_FORECAST_STEEP_PERCENT,
            forecast_steep_rise: DEFAULT_FORECAST_STEEP_RISE,
            forecast_mild_rise: DEFAULT_FORECAST_MILD_RISE,
            forecast_steep_fall: DEFAULT_FORECAST_STEEP_FALL,
            forecast_mild_fall: DEFAULT_FORECAST_MILD_FALL,
            forecast_high_samples: DEFAULT_FORECAST_HIGH_SAMPLES,
            forecast_medium_samples: DEFAULT_FORECAST_MEDIUM_SAMPLES,
            medication_reference_reduction: DEFAULT_MEDICATION_REFERENCE_REDUCTION,
            medication_window_reference: DEFAULT_MEDICATION_WINDOW_REFERENCE,
            weekday_delta: DEFAULT_WEEKDAY_DELTA,
            min_weekday_entries: DEFAULT_MIN_WEEKDAY_ENTRIES,
            trigger_delta: DEFAULT_TRIGGER_DELTA,
            medication_reduction: DEFAULT_MEDICATION_REDUCTION,
            window_reduction: DEFAULT_WINDOW_REDUCTION,
            coverage_high: DEFAULT_COVERAGE_HIGH,
            coverage_medium: DEFAULT_COVERAGE_MEDIUM,
        }
    }
}

impl AnalyticsConfig {
    /// Local offset used for calendar bucketing
    ///
    /// Out-of-range offsets fall back to UTC.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("flareline").join("config.toml")),
            Some(PathBuf::from("/etc/flareline/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(window) = std::env::var("FLARELINE_WINDOW") {
            match window.parse() {
                Ok(w) => self.engine.default_window = w,
                Err(e) => tracing::warn!(error = %e, "Ignoring FLARELINE_WINDOW"),
            }
        }
        if let Ok(offset) = std::env::var("FLARELINE_UTC_OFFSET_MINUTES") {
            if let Ok(minutes) = offset.parse() {
                self.analytics.utc_offset_minutes = minutes;
            }
        }

        if let Ok(level) = std::env::var("FLARELINE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("FLARELINE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Flareline Configuration
#
# Environment variables override these settings:
# - FLARELINE_WINDOW
# - FLARELINE_UTC_OFFSET_MINUTES
# - FLARELINE_LOG_LEVEL
# - FLARELINE_LOG_FORMAT

[engine]
# Window analyzed when none is given: 7d, 30d, 90d, 1y, all
default_window = "30d"

[analytics]
# Local calendar offset from UTC (minutes) for day/hour/weekday buckets
utc_offset_minutes = 0

# Rolling statistics and anomaly flags
rolling_window = 7
anomaly_multiplier = 2.5

# Day classification
bad_day_pain = 7.0
good_day_pain = 3.0
trend_slope_threshold = 0.05

# Correlation support
min_support = 2
support_reference_count = 5
signal_min_pairs = 5

# Flare episodes
baseline_days = 14
min_baseline_days = 3
baseline_method = "mean"
onset_threshold = 2.0
recovery_threshold = 1.0
high_severity_pain = 7.0

# Flare prediction
recent_entries = 7
rising_run = 3
flare_recent_average = 6.0
flare_high_average = 8.0
flare_probability_cap = 95

# Risk score weights
risk_mean_weight = 10.0
risk_volatility_weight = 5.0
risk_bad_day_weight = 30.0
risk_rising_bonus = 10.0
risk_moderate_score = 40.0
risk_high_score = 70.0

# Forecast step table (percent change -> pain points)
forecast_steep_percent = 5.0
forecast_steep_rise = 0.8
forecast_mild_rise = 0.4
forecast_steep_fall = -0.7
forecast_mild_fall = -0.3
forecast_high_samples = 40
forecast_medium_samples = 20

# Medication timing
medication_reference_reduction = 3.0
medication_window_reference = 4

# Recommendation rules
weekday_delta = 1.0
min_weekday_entries = 1
trigger_delta = 1.0
medication_reduction = 0.5
window_reduction = 0.3

# Reasoning confidence by entry count
coverage_high = 60
coverage_medium = 25

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/flareline/flareline.log"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_config_parses_to_defaults() {
        let config = Config::parse(&generate_default_config()).unwrap();

        assert_eq!(config.analytics, AnalyticsConfig::default());
        assert_eq!(config.engine.default_window, TimeWindow::Month);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_partial_analytics_section_keeps_defaults() {
        let config = Config::parse(
            r#"
[analytics]
onset_threshold = 1.5
baseline_method = "median"
"#,
        )
        .unwrap();

        assert_eq!(config.analytics.onset_threshold, 1.5);
        assert_eq!(config.analytics.baseline_method, BaselineMethod::Median);
        assert_eq!(config.analytics.rolling_window, DEFAULT_ROLLING_WINDOW);
    }

    #[test]
    fn test_invalid_window_is_a_parse_error() {
        let result = Config::parse("[engine]\ndefault_window = \"2w\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_long_window_forms_parse() {
        let config = Config::parse("[engine]\ndefault_window = \"365d\"\n").unwrap();
        assert_eq!(config.engine.default_window, TimeWindow::Year);
    }

    #[test]
    fn test_offset_falls_back_to_utc() {
        let mut config = AnalyticsConfig::default();
        config.utc_offset_minutes = 120;
        assert_eq!(config.offset().local_minus_utc(), 7200);

        config.utc_offset_minutes = 100_000;
        assert_eq!(config.offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
