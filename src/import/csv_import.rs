//! CSV Import
//!
//! One entry per row. Columns are matched by header name, case-insensitive:
//!
//! ```text
//! timestamp,pain,locations,symptoms,triggers,activities,medications,
//! sleep_quality,mood_impact,stress,activity_level
//! ```
//!
//! Only `timestamp` and `pain` are required. List columns hold `;`-separated
//! items. Timestamps accept RFC 3339 and several common date/time formats;
//! date-only values are placed at noon UTC.

use super::{EntryImport, ImportError, ImportResult, MAX_REPORTED_ERRORS};
use crate::entry::{Entry, MedicationUse};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::BTreeSet;
use std::path::Path;

/// Separator between items of a list column
pub const LIST_SEPARATOR: char = ';';

const TIMESTAMP_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%SZ",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y", "%Y/%m/%d"];

/// Header positions of the recognized columns
#[derive(Debug, Default)]
struct ColumnMap {
    timestamp: Option<usize>,
    pain: Option<usize>,
    locations: Option<usize>,
    symptoms: Option<usize>,
    triggers: Option<usize>,
    activities: Option<usize>,
    medications: Option<usize>,
    sleep_quality: Option<usize>,
    mood_impact: Option<usize>,
    stress: Option<usize>,
    activity_level: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut map = ColumnMap::default();

        for (idx, header) in headers.iter().enumerate() {
            let slot = match header.trim().to_lowercase().replace(' ', "_").as_str() {
                "timestamp" | "date" | "time" | "datetime" => &mut map.timestamp,
                "pain" | "pain_level" => &mut map.pain,
                "locations" | "location" => &mut map.locations,
                "symptoms" => &mut map.symptoms,
                "triggers" => &mut map.triggers,
                "activities" => &mut map.activities,
                "medications" | "medications_used" => &mut map.medications,
                "sleep_quality" | "quality_of_sleep" => &mut map.sleep_quality,
                "mood_impact" => &mut map.mood_impact,
                "stress" => &mut map.stress,
                "activity_level" => &mut map.activity_level,
                _ => continue,
            };
            slot.get_or_insert(idx);
        }

        map
    }
}

/// Reads entries from CSV
#[derive(Debug, Clone, Default)]
pub struct CsvEntryImporter {
    /// Extra `strftime` format tried before the built-in ones
    timestamp_format: Option<String>,
}

impl CsvEntryImporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a timestamp format to try first
    pub fn with_timestamp_format(mut self, format: &str) -> Self {
        self.timestamp_format = Some(format.to_string());
        self
    }

    /// Import entries from a CSV file
    pub fn import(&self, path: &Path) -> ImportResult<EntryImport> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;
        self.import_reader(reader)
    }

    /// Import from a CSV string (useful for testing)
    pub fn import_str(&self, csv_data: &str) -> ImportResult<EntryImport> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(csv_data.as_bytes());
        self.import_reader(reader)
    }

    fn import_reader<R: std::io::Read>(&self, mut reader: csv::Reader<R>) -> ImportResult<EntryImport> {
        let columns = ColumnMap::from_headers(reader.headers()?);
        if columns.timestamp.is_none() {
            return Err(ImportError::MissingColumn("timestamp"));
        }
        if columns.pain.is_none() {
            return Err(ImportError::MissingColumn("pain"));
        }

        let mut import = EntryImport::default();

        for (line_num, result) in reader.records().enumerate() {
            // Header is line 1
            let line = line_num + 2;

            let parsed = result
                .map_err(|e| ImportError::InvalidRow {
                    line,
                    reason: e.to_string(),
                })
                .and_then(|record| self.parse_row(&record, &columns, line));

            match parsed {
                Ok(entry) => {
                    import.entries.push(entry);
                    import.rows_processed += 1;
                }
                Err(e) => {
                    import.errors.push(e.to_string());
                    import.rows_failed += 1;
                }
            }
        }

        // Truncate errors if too many
        if import.errors.len() > MAX_REPORTED_ERRORS {
            let total = import.errors.len();
            import.errors.truncate(MAX_REPORTED_ERRORS);
            import
                .errors
                .push(format!("... and {} more errors", total - MAX_REPORTED_ERRORS));
        }

        if import.rows_failed > 0 {
            tracing::warn!(failed = import.rows_failed, "Skipped invalid CSV rows");
        }

        Ok(import)
    }

    fn parse_row(&self, record: &csv::StringRecord, columns: &ColumnMap, line: usize) -> ImportResult<Entry> {
        let invalid = |reason: String| ImportError::InvalidRow { line, reason };
        let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).filter(|s| !s.is_empty());

        let ts_str = cell(columns.timestamp).ok_or_else(|| invalid("missing timestamp".to_string()))?;
        let timestamp = self
            .parse_timestamp(ts_str)
            .ok_or_else(|| invalid(format!("could not parse timestamp: {}", ts_str)))?;

        let pain_str = cell(columns.pain).ok_or_else(|| invalid("missing pain".to_string()))?;
        let pain: f64 = pain_str
            .parse()
            .map_err(|_| invalid(format!("invalid pain value: {}", pain_str)))?;

        let optional = |idx: Option<usize>, name: &str| -> ImportResult<Option<f64>> {
            match cell(idx) {
                None => Ok(None),
                Some(s) => s
                    .parse()
                    .map(Some)
                    .map_err(|_| invalid(format!("invalid {} value: {}", name, s))),
            }
        };

        let mut entry = Entry::new(timestamp, pain);
        entry.locations = split_list(cell(columns.locations));
        entry.symptoms = split_list(cell(columns.symptoms));
        entry.triggers = split_list(cell(columns.triggers));
        entry.activities = split_list(cell(columns.activities));
        entry.medications = cell(columns.medications)
            .map(|s| {
                s.split(LIST_SEPARATOR)
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(MedicationUse::new)
                    .collect()
            })
            .unwrap_or_default();
        entry.sleep_quality = optional(columns.sleep_quality, "sleep_quality")?;
        entry.mood_impact = optional(columns.mood_impact, "mood_impact")?;
        entry.stress = optional(columns.stress, "stress")?;
        entry.activity_level = optional(columns.activity_level, "activity_level")?;

        Ok(entry)
    }

    /// Parse a timestamp string, trying the configured format first
    fn parse_timestamp(&self, ts_str: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(ts_str) {
            return Some(dt.with_timezone(&Utc));
        }

        let custom = self.timestamp_format.as_deref();
        for fmt in custom.into_iter().chain(TIMESTAMP_FORMATS) {
            if let Ok(dt) = NaiveDateTime::parse_from_str(ts_str, fmt) {
                return Some(dt.and_utc());
            }
        }

        for fmt in custom.into_iter().chain(DATE_FORMATS) {
            if let Some(dt) = NaiveDate::parse_from_str(ts_str, fmt)
                .ok()
                .and_then(|date| date.and_hms_opt(12, 0, 0))
            {
                return Some(dt.and_utc());
            }
        }

        None
    }
}

fn split_list(cell: Option<&str>) -> BTreeSet<String> {
    cell.map(|s| {
        s.split(LIST_SEPARATOR)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
