//! Per-anchor sliding window of RSSI samples and derived distances

use std::collections::VecDeque;
use tracing::debug;

use crate::processing::distance_model::DistanceModel;
use crate::processing::outlier::OutlierFilter;

/// One admitted reading with the distance it mapped to at admission time
#[derive(Debug, Clone, Copy, PartialEq)]
struct Entry {
    rssi: f64,
    distance_ft: f64,
}

/// Bounded FIFO window of the most recent samples for a single anchor
///
/// Readings and distances are stored as pairs, so both views always have the
/// same length. Once `capacity` is reached every insert evicts the oldest pair.
#[derive(Debug, Clone)]
pub struct AnchorBuffer {
    capacity: usize,
    entries: VecDeque<Entry>,
}

impl AnchorBuffer {
    /// Create an empty buffer; a zero capacity is raised to one
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when the anchor has no data in its current window
    pub fn is_down(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a reading, converting it with the model in effect now
    pub fn admit(&mut self, rssi: f64, model: &DistanceModel) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(Entry {
            rssi,
            distance_ft: model.distance_from_rssi(rssi),
        });
    }

    /// Filter a batch for outliers, then admit the survivors in order
    ///
    /// Returns the number of samples admitted.
    pub fn admit_batch(&mut self, samples: &[f64], filter: &OutlierFilter, model: &DistanceModel) -> usize {
        let kept = filter.filter(samples);
        if kept.len() < samples.len() {
            debug!(
                rejected = samples.len() - kept.len(),
                batch = samples.len(),
                method = %filter.method(),
                "outliers removed from batch"
            );
        }
        for &rssi in &kept {
            self.admit(rssi, model);
        }
        kept.len()
    }

    /// Mean of held readings, `None` when empty
    pub fn average_reading(&self) -> Option<f64> {
        self.mean_of(|e| e.rssi)
    }

    /// Mean of held distances in feet, `None` when empty
    pub fn average_distance(&self) -> Option<f64> {
        self.mean_of(|e| e.distance_ft)
    }

    /// Held readings, oldest first
    pub fn readings(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|e| e.rssi)
    }

    /// Held distances in feet, oldest first
    pub fn distances(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|e| e.distance_ft)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn mean_of(&self, value: impl Fn(&Entry) -> f64) -> Option<f64> {
        if self.entries.is_empty() {
            return None;
        }
        let sum: f64 = self.entries.iter().map(value).sum();
        Some(sum / self.entries.len() as f64)
    }
}
