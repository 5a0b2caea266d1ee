//! Error taxonomy for configuration and ingestion failures
//!
//! Runtime data sparsity and solver failures are not errors: they surface as
//! [`crate::core::UnavailableReason`] inside a [`crate::core::PositionEstimate`].

use std::io;
use thiserror::Error;

use crate::hardware::AcquisitionError;

/// Result type for positioning operations
pub type LocalizationResult<T> = Result<T, LocalizationError>;

/// Errors raised by construction, configuration and ingestion
#[derive(Error, Debug)]
pub enum LocalizationError {
    /// Path-loss model parameter is non-finite or degenerate
    #[error("invalid model parameter {parameter} = {value}")]
    InvalidModelParameter { parameter: &'static str, value: f64 },

    /// Outlier filter name not recognised
    #[error("invalid outlier detection method: {0}")]
    InvalidFilterMethod(String),

    /// Configuration value out of range or inconsistent
    #[error("configuration error: {parameter}: {reason}")]
    InvalidConfig { parameter: String, reason: String },

    /// Anchor name or address not present in the anchor table
    #[error("unknown anchor: {0}")]
    UnknownAnchor(String),

    /// Sample is not a finite reading in the plausible dBm range
    #[error("invalid sample for {anchor}: {value} dBm")]
    InvalidSample { anchor: String, value: f64 },

    /// Configuration file could not be read or written
    #[error("configuration I/O failed: {0}")]
    Io(#[from] io::Error),

    /// Configuration or replay file is not valid JSON for the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Acquisition collaborator failed in a way that cannot be skipped
    #[error("acquisition failed: {0}")]
    Acquisition(#[from] AcquisitionError),
}

impl LocalizationError {
    pub(crate) fn config(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        LocalizationError::InvalidConfig {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// True for errors that should stop startup rather than skip a cycle
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            LocalizationError::InvalidModelParameter { .. }
                | LocalizationError::InvalidFilterMethod(_)
                | LocalizationError::InvalidConfig { .. }
                | LocalizationError::Io(_)
                | LocalizationError::Json(_)
        )
    }
}
