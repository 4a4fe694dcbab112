//! Error handling for Segue
//!
//! Validation errors are raised at the boundary of each public operation.
//! Numerical edge cases (log of zero, silent buffers) are handled locally
//! with sentinels and never surface here.

use thiserror::Error;

/// Result type alias for Segue operations
pub type Result<T> = std::result::Result<T, MixError>;

/// Main error type for Segue operations
#[derive(Error, Debug)]
pub enum MixError {
    // Parameter Errors
    #[error("Invalid parameter: {param} = {value} (expected {expected})")]
    InvalidParameter {
        param: String,
        value: String,
        expected: String,
    },

    #[error("Degenerate input: {reason}")]
    DegenerateInput { reason: String },

    #[error("Out of range: {what} requested {requested}, only {available} available")]
    OutOfRange {
        what: String,
        requested: String,
        available: String,
    },

    // Audio Errors
    #[error("Sample rate mismatch: expected {expected} Hz, got {actual} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },

    #[error("Failed to read audio file: {path}")]
    AudioReadError {
        path: String,
        #[source]
        source: hound::Error,
    },

    #[error("Failed to write audio file: {path}")]
    AudioWriteError {
        path: String,
        #[source]
        source: hound::Error,
    },

    #[error("Invalid analysis file {path}: {reason}")]
    AnalysisFileError { path: String, reason: String },

    // Track Errors
    #[error("Track not found: {name}")]
    TrackNotFound { name: String },

    #[error("Track '{name}' has no {missing} yet")]
    TrackNotAnalyzed { name: String, missing: &'static str },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MixError {
    /// Shorthand for an `InvalidParameter` error
    pub fn invalid(
        param: impl Into<String>,
        value: impl ToString,
        expected: impl Into<String>,
    ) -> Self {
        MixError::InvalidParameter {
            param: param.into(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            MixError::InvalidParameter { .. } => "INVALID_PARAMETER",
            MixError::DegenerateInput { .. } => "DEGENERATE_INPUT",
            MixError::OutOfRange { .. } => "OUT_OF_RANGE",
            MixError::SampleRateMismatch { .. } => "SAMPLE_RATE_MISMATCH",
            MixError::AudioReadError { .. } => "AUDIO_READ_ERROR",
            MixError::AudioWriteError { .. } => "AUDIO_WRITE_ERROR",
            MixError::AnalysisFileError { .. } => "ANALYSIS_FILE_ERROR",
            MixError::TrackNotFound { .. } => "TRACK_NOT_FOUND",
            MixError::TrackNotAnalyzed { .. } => "TRACK_NOT_ANALYZED",
            MixError::Io(_) => "IO_ERROR",
            MixError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Returns a suggested recovery action for this error
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            MixError::InvalidParameter { .. } => "Adjust the parameter to be within the valid range",
            MixError::DegenerateInput { .. } => "Check that the analysis data describes real audio",
            MixError::OutOfRange { .. } => "Pick cue indices or windows that exist in the track",
            MixError::SampleRateMismatch { .. } => "Resample both tracks to the same rate first",
            MixError::AudioReadError { .. } => "Check that the file exists and is a valid WAV file",
            MixError::AnalysisFileError { .. } => "Regenerate the beat analysis for this track",
            MixError::TrackNotFound { .. } => "Load the track into the mix context first",
            MixError::TrackNotAnalyzed { .. } => "Run preprocess on the track before mixing",
            _ => "Check the error details and try again",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = MixError::invalid("sample_rate", 0, "> 0 Hz");
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
        assert_eq!(
            err.to_string(),
            "Invalid parameter: sample_rate = 0 (expected > 0 Hz)"
        );
    }

    #[test]
    fn test_recovery_hints() {
        let err = MixError::TrackNotAnalyzed {
            name: "JKS".to_string(),
            missing: "cue points",
        };
        assert_eq!(err.error_code(), "TRACK_NOT_ANALYZED");
        assert!(!err.recovery_hint().is_empty());
        assert_eq!(err.to_string(), "Track 'JKS' has no cue points yet");
    }
}
