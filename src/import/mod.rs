//! Entry import
//!
//! Loads entry lists from files for the command-line tool and test
//! fixtures. This layer does I/O; the analytics engine never does.
//!
//! - JSON: an array of `Entry` objects
//! - CSV: one entry per row, see [`CsvEntryImporter`]

mod csv_import;

pub use csv_import::CsvEntryImporter;

use crate::entry::{Entry, Signal, PAIN_MAX, PAIN_MIN};
use std::path::Path;

/// Maximum per-row error messages kept in an import result
pub const MAX_REPORTED_ERRORS: usize = 100;

/// Errors that can occur while loading entries
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Line {line}: {reason}")]
    InvalidRow { line: usize, reason: String },

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("Unsupported file format: {0} (expected .json or .csv)")]
    UnsupportedFormat(String),
}

/// Result type alias for imports
pub type ImportResult<T> = Result<T, ImportError>;

/// Supported entry file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryFormat {
    Json,
    Csv,
}

impl EntryFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> ImportResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "json" => Ok(EntryFormat::Json),
            "csv" => Ok(EntryFormat::Csv),
            _ => Err(ImportError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Entries read from a file, with per-row failures
#[derive(Debug, Default)]
pub struct EntryImport {
    pub entries: Vec<Entry>,
    pub rows_processed: usize,
    pub rows_failed: usize,
    pub errors: Vec<String>,
}

/// Load entries from a `.json` or `.csv` file
pub fn load_entries(path: &Path) -> ImportResult<EntryImport> {
    let import = match EntryFormat::from_path(path)? {
        EntryFormat::Json => {
            let content = std::fs::read_to_string(path)?;
            parse_json(&content)?
        }
        EntryFormat::Csv => CsvEntryImporter::new().import(path)?,
    };

    tracing::info!(
        path = %path.display(),
        entries = import.entries.len(),
        failed = import.rows_failed,
        "Loaded entries"
    );

    Ok(import)
}

/// Parse a JSON array of entries
pub fn parse_json(content: &str) -> ImportResult<EntryImport> {
    let entries: Vec<Entry> = serde_json::from_str(content)?;
    Ok(EntryImport {
        rows_processed: entries.len(),
        entries,
        rows_failed: 0,
        errors: Vec::new(),
    })
}

/// Describe values the engine would clamp, drop or ignore
///
/// Returns one message per problem; an empty list means every entry is
/// within range.
pub fn check_entries(entries: &[Entry]) -> Vec<String> {
    let mut problems = Vec::new();

    for (i, entry) in entries.iter().enumerate() {
        if !entry.pain.is_finite() {
            problems.push(format!("Entry {} ({}): pain is not a number", i + 1, entry.timestamp));
        } else if !(PAIN_MIN..=PAIN_MAX).contains(&entry.pain) {
            problems.push(format!(
                "Entry {} ({}): pain {} is outside {}-{}",
                i + 1,
                entry.timestamp,
                entry.pain,
                PAIN_MIN,
                PAIN_MAX
            ));
        }

        for &signal in Signal::all() {
            let raw = match signal {
                Signal::SleepQuality => entry.sleep_quality,
                Signal::MoodImpact => entry.mood_impact,
                Signal::Stress => entry.stress,
                Signal::ActivityLevel => entry.activity_level,
            };
            if raw.is_some_and(|v| !v.is_finite()) {
                problems.push(format!(
                    "Entry {} ({}): {} is not a number",
                    i + 1,
                    entry.timestamp,
                    signal
                ));
            }
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::io::Write;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(EntryFormat::from_path(Path::new("log.json")).unwrap(), EntryFormat::Json);
        assert_eq!(EntryFormat::from_path(Path::new("LOG.CSV")).unwrap(), EntryFormat::Csv);
        assert!(matches!(
            EntryFormat::from_path(Path::new("log.xml")),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_parse_json_with_defaults() {
        let json = r#"[
            {"timestamp": "2024-01-15T08:00:00Z", "pain": 6.5, "triggers": ["cold"]},
            {"timestamp": "2024-01-16T08:00:00Z", "pain": 3,
             "medications": [{"name": "ibuprofen"}], "sleep_quality": 7}
        ]"#;

        let import = parse_json(json).unwrap();
        assert_eq!(import.rows_processed, 2);
        assert!(import.entries[0].triggers.contains("cold"));
        assert!(import.entries[0].medications.is_empty());
        assert_eq!(import.entries[1].medications[0].name, "ibuprofen");
        assert_eq!(import.entries[1].sleep_quality, Some(7.0));
    }

    #[test]
    fn test_parse_json_camel_case_feeds_medication_report() {
        let json = r#"[
            {"timestamp": "2024-01-15T08:00:00Z", "pain": 8,
             "medicationsUsed": [{"name": "A"}], "qualityOfSleep": 3, "moodImpact": 4},
            {"timestamp": "2024-01-16T08:00:00Z", "pain": 3}
        ]"#;

        let import = parse_json(json).unwrap();
        assert_eq!(import.rows_failed, 0);
        assert_eq!(import.entries[0].sleep_quality, Some(3.0));
        assert_eq!(import.entries[0].mood_impact, Some(4.0));

        let config = crate::AnalyticsConfig::default();
        let report = crate::analytics::medication::analyze(&import.entries, &config).unwrap();
        assert_eq!(report.medications[0].name, "A");
        assert_eq!(report.medications[0].avg_reduction, 5.0);
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        let entries = vec![Entry::new(Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap(), 4.0)];
        write!(file, "{}", serde_json::to_string(&entries).unwrap()).unwrap();

        let import = load_entries(file.path()).unwrap();
        assert_eq!(import.entries, entries);
    }

    #[test]
    fn test_check_entries() {
        let ts = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
        let entries = vec![
            Entry::new(ts, 4.0),
            Entry::new(ts, 12.0),
            Entry::new(ts, f64::NAN),
            Entry::new(ts, 5.0).stress(f64::INFINITY),
        ];

        let problems = check_entries(&entries);
        assert_eq!(problems.len(), 3);
        assert!(problems[0].contains("outside"));
        assert!(problems[2].contains("stress"));
    }
}
