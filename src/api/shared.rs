//! Thread-shareable handle around a [`Localizer`]
//!
//! Acquisition and display usually run on different schedules. Every call
//! takes the lock for its whole duration, so a solve always sees a consistent
//! snapshot of the buffers.

use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

use crate::api::localizer::Localizer;
use crate::api::types::EstimateReport;
use crate::core::PositionEstimate;
use crate::hardware::SampleCycle;
use crate::validation::error::LocalizationResult;

#[derive(Debug, Clone)]
pub struct SharedLocalizer {
    inner: Arc<Mutex<Localizer>>,
}

impl SharedLocalizer {
    pub fn new(localizer: Localizer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(localizer)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Localizer> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("localizer lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn ingest_batch(&self, key: &str, samples: &[f64]) -> LocalizationResult<usize> {
        self.lock().ingest_batch(key, samples)
    }

    pub fn ingest_cycle(&self, cycle: &SampleCycle) -> LocalizationResult<usize> {
        self.lock().ingest_cycle(cycle)
    }

    pub fn solve(&self) -> PositionEstimate {
        self.lock().solve().clone()
    }

    /// Ingest one cycle and solve under a single lock
    pub fn ingest_and_solve(&self, cycle: &SampleCycle) -> LocalizationResult<PositionEstimate> {
        let mut localizer = self.lock();
        localizer.ingest_cycle(cycle)?;
        Ok(localizer.solve().clone())
    }

    pub fn latest_estimate(&self) -> Option<PositionEstimate> {
        self.lock().latest_estimate().cloned()
    }

    pub fn report(&self) -> EstimateReport {
        self.lock().report()
    }

    /// Run `f` with exclusive access to the underlying localizer
    pub fn with<R>(&self, f: impl FnOnce(&mut Localizer) -> R) -> R {
        f(&mut self.lock())
    }
}

impl From<Localizer> for SharedLocalizer {
    fn from(localizer: Localizer) -> Self {
        Self::new(localizer)
    }
}
