use crate::validation::error::{LocalizationError, LocalizationResult};

/// Checks incoming readings before they reach any buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleValidator {
    min_dbm: f64,
    max_dbm: f64,
}

impl SampleValidator {
    pub fn new(min_dbm: f64, max_dbm: f64) -> LocalizationResult<Self> {
        if !min_dbm.is_finite() || !max_dbm.is_finite() || min_dbm >= max_dbm {
            return Err(LocalizationError::config(
                "sample_range",
                format!("expected finite min < max, got [{}, {}]", min_dbm, max_dbm),
            ));
        }
        Ok(Self { min_dbm, max_dbm })
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min_dbm, self.max_dbm)
    }

    pub fn validate(&self, anchor: &str, value: f64) -> LocalizationResult<f64> {
        if value.is_finite() && (self.min_dbm..=self.max_dbm).contains(&value) {
            Ok(value)
        } else {
            Err(LocalizationError::InvalidSample { anchor: anchor.to_string(), value })
        }
    }

    /// Validate a whole batch; nothing is accepted if any reading is bad
    pub fn validate_batch(&self, anchor: &str, values: &[f64]) -> LocalizationResult<()> {
        for &value in values {
            self.validate(anchor, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_range() {
        let validator = SampleValidator::new(-120.0, 0.0).unwrap();
        assert_eq!(validator.validate("Tower 1", -55.0).unwrap(), -55.0);
        assert!(validator.validate("Tower 1", 0.0).is_ok());
        assert!(validator.validate("Tower 1", 3.0).is_err());
        assert!(validator.validate("Tower 1", -150.0).is_err());
        assert!(matches!(
            validator.validate("Tower 1", f64::NAN),
            Err(LocalizationError::InvalidSample { anchor, .. }) if anchor == "Tower 1"
        ));
    }

    #[test]
    fn test_batch_rejected_as_a_whole() {
        let validator = SampleValidator::new(-120.0, 0.0).unwrap();
        assert!(validator.validate_batch("Tower 2", &[-40.0, -41.0]).is_ok());
        assert!(validator.validate_batch("Tower 2", &[-40.0, f64::INFINITY, -41.0]).is_err());
        assert!(validator.validate_batch("Tower 2", &[]).is_ok());
    }

    #[test]
    fn test_invalid_range() {
        assert!(SampleValidator::new(0.0, -120.0).is_err());
        assert!(SampleValidator::new(f64::NAN, 0.0).is_err());
    }
}
