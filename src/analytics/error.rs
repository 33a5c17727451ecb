//! Analytics error types
//!
//! The engine as a whole never fails; these errors describe optional
//! sub-analyses that could not produce a result. Callers log them and surface
//! the feature as unavailable.

use thiserror::Error;

/// Errors that can occur inside an optional sub-analysis
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    /// Not enough observations to compute the analysis
    #[error("Insufficient data for {analysis}: need {needed}, found {found}")]
    InsufficientData {
        analysis: &'static str,
        needed: usize,
        found: usize,
    },

    /// An intermediate value came out as NaN or infinite
    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),
}

/// Result type alias for sub-analyses
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Reject NaN / infinity produced by an intermediate computation
pub(crate) fn ensure_finite(value: f64, context: &'static str) -> AnalyticsResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AnalyticsError::NonFinite(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalyticsError::InsufficientData {
            analysis: "signal correlation",
            needed: 5,
            found: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient data for signal correlation: need 5, found 2"
        );
    }

    #[test]
    fn test_ensure_finite() {
        assert_eq!(ensure_finite(1.5, "x"), Ok(1.5));
        assert_eq!(
            ensure_finite(f64::NAN, "mean"),
            Err(AnalyticsError::NonFinite("mean"))
        );
    }
}
