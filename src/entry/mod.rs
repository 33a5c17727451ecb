//! Pain-log entries
//!
//! The read-only input model of the engine:
//!
//! - **types**: `Entry`, `MedicationUse`, `TimeWindow`, label and signal enums
//! - **error**: Error types for entry parameters

pub mod error;
pub mod types;

pub use error::EntryError;
pub use types::{Entry, LabelKind, MedicationUse, Signal, TimeWindow, PAIN_MAX, PAIN_MIN};
