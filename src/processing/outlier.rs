//! Batch outlier rejection for RSSI readings
//!
//! Filtering is computed once over an incoming batch and never looks at
//! samples already held in a buffer.

use std::fmt;
use std::str::FromStr;

use crate::core::DEFAULT_OUTLIER_THRESHOLD;
use crate::validation::error::{LocalizationError, LocalizationResult};

/// Outlier detection method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMethod {
    /// Reject values at or beyond `threshold` population standard deviations
    #[default]
    ZScore,
    /// Reject values outside `[q1 - t*iqr, q3 + t*iqr]`
    Iqr,
}

impl FromStr for FilterMethod {
    type Err = LocalizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "z_score" | "zscore" | "z-score" => Ok(FilterMethod::ZScore),
            "iqr" => Ok(FilterMethod::Iqr),
            _ => Err(LocalizationError::InvalidFilterMethod(s.to_string())),
        }
    }
}

impl fmt::Display for FilterMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterMethod::ZScore => write!(f, "z_score"),
            FilterMethod::Iqr => write!(f, "iqr"),
        }
    }
}

/// Outlier filter applied to each ingested batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierFilter {
    method: FilterMethod,
    threshold: f64,
}

impl Default for OutlierFilter {
    fn default() -> Self {
        Self {
            method: FilterMethod::ZScore,
            threshold: DEFAULT_OUTLIER_THRESHOLD,
        }
    }
}

impl OutlierFilter {
    pub fn new(method: FilterMethod, threshold: f64) -> LocalizationResult<Self> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(LocalizationError::config(
                "filter.threshold",
                format!("must be a positive finite number, got {}", threshold),
            ));
        }
        Ok(Self { method, threshold })
    }

    /// Build from a method name as it appears in configuration
    pub fn from_name(method: &str, threshold: f64) -> LocalizationResult<Self> {
        Self::new(method.parse()?, threshold)
    }

    pub fn method(&self) -> FilterMethod {
        self.method
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Return the values of `data` that are not outliers, in their original order
    pub fn filter(&self, data: &[f64]) -> Vec<f64> {
        if data.is_empty() {
            return Vec::new();
        }

        match self.method {
            FilterMethod::ZScore => z_score_filter(data, self.threshold),
            FilterMethod::Iqr => iqr_filter(data, self.threshold),
        }
    }
}

fn z_score_filter(data: &[f64], threshold: f64) -> Vec<f64> {
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let stdev = variance.sqrt();

    data.iter()
        .copied()
        .filter(|x| stdev == 0.0 || ((x - mean) / stdev).abs() < threshold)
        .collect()
}

fn iqr_filter(data: &[f64], threshold: f64) -> Vec<f64> {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let q1 = percentile(&sorted, 25.0);
    let q3 = percentile(&sorted, 75.0);
    let iqr = q3 - q1;
    let lower = q1 - threshold * iqr;
    let upper = q3 + threshold * iqr;

    data.iter().copied().filter(|&x| lower <= x && x <= upper).collect()
}

/// Percentile of sorted data, linear interpolation between closest ranks
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() {
        assert_eq!("z_score".parse::<FilterMethod>().unwrap(), FilterMethod::ZScore);
        assert_eq!("IQR".parse::<FilterMethod>().unwrap(), FilterMethod::Iqr);
        assert!(matches!(
            "median".parse::<FilterMethod>(),
            Err(LocalizationError::InvalidFilterMethod(name)) if name == "median"
        ));
        assert_eq!(FilterMethod::Iqr.to_string(), "iqr");
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(OutlierFilter::new(FilterMethod::ZScore, 0.0).is_err());
        assert!(OutlierFilter::new(FilterMethod::Iqr, f64::NAN).is_err());
        assert!(OutlierFilter::from_name("bogus", 2.0).is_err());
    }

    #[test]
    fn test_empty_batch() {
        let filter = OutlierFilter::default();
        assert!(filter.filter(&[]).is_empty());
        let iqr = OutlierFilter::new(FilterMethod::Iqr, 1.5).unwrap();
        assert!(iqr.filter(&[]).is_empty());
    }

    #[test]
    fn test_z_score_rejects_spike() {
        let filter = OutlierFilter::default();
        let batch = [-50.0, -51.0, -49.0, -50.0, -50.0, -51.0, -49.0, -50.0, -90.0];
        let kept = filter.filter(&batch);
        assert_eq!(kept, vec![-50.0, -51.0, -49.0, -50.0, -50.0, -51.0, -49.0, -50.0]);
    }

    #[test]
    fn test_z_score_constant_batch() {
        let filter = OutlierFilter::default();
        let batch = [-42.0; 6];
        assert_eq!(filter.filter(&batch), batch.to_vec());
    }

    #[test]
    fn test_z_score_threshold_is_exclusive() {
        // Mean -50, population stdev 1: both readings sit at |z| == 1
        let batch = [-51.0, -49.0];
        assert!(OutlierFilter::new(FilterMethod::ZScore, 1.0).unwrap().filter(&batch).is_empty());
        assert_eq!(OutlierFilter::new(FilterMethod::ZScore, 1.001).unwrap().filter(&batch), batch.to_vec());
    }

    #[test]
    fn test_iqr_fences_are_inclusive() {
        // q1 = -53, q3 = -51: fences at -54 and -50 for threshold 0.5
        let batch = [-54.0, -53.0, -52.0, -51.0, -50.0];
        assert_eq!(OutlierFilter::new(FilterMethod::Iqr, 0.5).unwrap().filter(&batch), batch.to_vec());
        assert_eq!(
            OutlierFilter::new(FilterMethod::Iqr, 0.25).unwrap().filter(&batch),
            vec![-53.0, -52.0, -51.0]
        );
    }

    #[test]
    fn test_iqr_rejects_spike() {
        let filter = OutlierFilter::new(FilterMethod::Iqr, 2.0).unwrap();
        let batch = [-50.0, -52.0, -48.0, -51.0, -49.0, -50.0, -10.0];
        let kept = filter.filter(&batch);
        assert_eq!(kept, vec![-50.0, -52.0, -48.0, -51.0, -49.0, -50.0]);
    }

    #[test]
    fn test_percentile_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&sorted, 25.0) - 1.75).abs() < 1e-12);
        assert!((percentile(&sorted, 75.0) - 3.25).abs() < 1e-12);
        assert_eq!(percentile(&[7.0], 25.0), 7.0);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let batches: [&[f64]; 3] = [
            &[-50.0, -51.0, -49.0, -50.0, -50.0, -51.0, -49.0, -50.0, -90.0],
            &[-60.0, -55.0, -50.0, -45.0, -40.0],
            &[-50.0, -52.0, -48.0, -51.0, -49.0, -50.0, -10.0],
        ];
        let filters = [
            OutlierFilter::default(),
            OutlierFilter::new(FilterMethod::Iqr, 2.0).unwrap(),
        ];

        for filter in &filters {
            for batch in &batches {
                let once = filter.filter(batch);
                let twice = filter.filter(&once);
                assert_eq!(once, twice, "{} filter not stable on {:?}", filter.method(), batch);
            }
        }
    }
}
