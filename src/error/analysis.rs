// Analysis error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Log an analysis error with structured context
///
/// Logs analysis errors with the numeric error code, the component where
/// the error occurred and a human-readable message. The logging is
/// non-blocking and will not panic on failure.
pub fn log_analysis_error(err: &AnalysisError, context: &str) {
    error!(
        "Analysis error in {}: code={}, component=TrackAnalyzer, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Analysis-related errors
///
/// These errors cover track analysis operations including input
/// validation, re-entrancy protection and per-frame feature extraction.
///
/// Error code range: 1001-1003
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Input buffer is not usable PCM audio
    InvalidInput { reason: String },

    /// An analysis is already running on this analyzer instance
    Busy,

    /// Per-frame feature extraction fell back to time-domain features.
    /// Recovered locally; never surfaced to the caller.
    ExtractionDegraded { frame: usize },
}

impl ErrorCode for AnalysisError {
    fn code(&self) -> i32 {
        match self {
            AnalysisError::InvalidInput { .. } => 1001,
            AnalysisError::Busy => 1002,
            AnalysisError::ExtractionDegraded { .. } => 1003,
        }
    }

    fn message(&self) -> String {
        match self {
            AnalysisError::InvalidInput { reason } => {
                format!("Invalid audio input: {}", reason)
            }
            AnalysisError::Busy => {
                "Analysis already running on this analyzer instance.".to_string()
            }
            AnalysisError::ExtractionDegraded { frame } => {
                format!("Feature extraction degraded at frame {}", frame)
            }
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AnalysisError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AnalysisError {}
