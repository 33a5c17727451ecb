//! Entry error types

use thiserror::Error;

/// Errors raised while interpreting caller-supplied entry parameters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryError {
    /// Window selector was not one of the supported forms
    #[error("Invalid time window: {0}. Use: 7d, 30d, 90d, 1y, all")]
    InvalidWindow(String),
}
