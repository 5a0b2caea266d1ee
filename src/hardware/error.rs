//! Acquisition error types and handling

use thiserror::Error;

/// Failures reported by a sample source
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AcquisitionError {
    /// Link to the scanner was lost
    #[error("sample source {source_name} disconnected")]
    Disconnected { source_name: String },

    /// Sampling window elapsed without any reading
    #[error("no readings within {timeout_ms}ms")]
    Timeout { timeout_ms: u32 },

    /// Scanner returned a reading that could not be interpreted
    #[error("malformed reading: {details}")]
    MalformedReading { details: String },

    /// Scanner hardware fault
    #[error("hardware error {code}: {description}")]
    Hardware { code: u32, description: String },
}

/// Result type for acquisition operations
pub type AcquisitionResult<T> = Result<T, AcquisitionError>;

/// What a periodic caller should do after an acquisition failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Try again next cycle
    Retry,
    /// Drop this cycle and continue
    Skip,
    /// Stop; the source will not recover on its own
    Fail,
}

impl AcquisitionError {
    /// Get the recommended recovery strategy for this error
    pub fn recovery_strategy(&self) -> RecoveryStrategy {
        match self {
            AcquisitionError::Disconnected { .. } => RecoveryStrategy::Retry,
            AcquisitionError::Timeout { .. } => RecoveryStrategy::Skip,
            AcquisitionError::MalformedReading { .. } => RecoveryStrategy::Skip,
            AcquisitionError::Hardware { .. } => RecoveryStrategy::Fail,
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.recovery_strategy(), RecoveryStrategy::Fail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_strategies() {
        assert!(AcquisitionError::Timeout { timeout_ms: 5000 }.is_recoverable());
        assert_eq!(
            AcquisitionError::Disconnected { source_name: "wlan0".to_string() }.recovery_strategy(),
            RecoveryStrategy::Retry
        );
        let fault = AcquisitionError::Hardware { code: 7, description: "radio off".to_string() };
        assert!(!fault.is_recoverable());
        assert_eq!(fault.to_string(), "hardware error 7: radio off");
    }
}
