//! Acquisition seam for RSSI scanners
//!
//! Real scanners and test doubles deliver one [`SampleCycle`] per solve
//! through [`SampleSource`]. Nothing in the positioning core blocks on them.

pub mod error;
pub mod mock;

pub use error::{AcquisitionError, AcquisitionResult, RecoveryStrategy};
pub use mock::ScriptedSource;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Readings collected during one sampling window, keyed by anchor name or BSSID
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleCycle {
    pub samples: BTreeMap<String, Vec<f64>>,
}

impl SampleCycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_samples(mut self, key: impl Into<String>, samples: Vec<f64>) -> Self {
        self.samples.entry(key.into()).or_default().extend(samples);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, sample: f64) {
        self.samples.entry(key.into()).or_default().push(sample);
    }

    pub fn is_empty(&self) -> bool {
        self.samples.values().all(|s| s.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.samples.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// Pull interface implemented by acquisition collaborators
pub trait SampleSource {
    /// Next sampling window
    /// Returns Ok(None) once the source has nothing more to deliver
    fn next_cycle(&mut self) -> AcquisitionResult<Option<SampleCycle>>;

    /// Name used in logs
    fn name(&self) -> &str;
}
