//! Deterministic sample source for testing and replay

use std::collections::VecDeque;

use crate::core::{Anchor, Point2};
use crate::hardware::{AcquisitionError, AcquisitionResult, SampleCycle, SampleSource};
use crate::processing::distance_model::DistanceModel;

/// Sample source that plays back a fixed script of cycles and failures
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    name: String,
    script: VecDeque<AcquisitionResult<SampleCycle>>,
    delivered: usize,
}

impl ScriptedSource {
    /// Create an empty scripted source
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: VecDeque::new(),
            delivered: 0,
        }
    }

    pub fn from_cycles(name: impl Into<String>, cycles: impl IntoIterator<Item = SampleCycle>) -> Self {
        let mut source = Self::new(name);
        for cycle in cycles {
            source.push_cycle(cycle);
        }
        source
    }

    /// Queue a cycle to be delivered
    pub fn push_cycle(&mut self, cycle: SampleCycle) {
        self.script.push_back(Ok(cycle));
    }

    /// Queue a failure to be reported in place of a cycle
    pub fn push_error(&mut self, error: AcquisitionError) {
        self.script.push_back(Err(error));
    }

    /// Get the number of queued cycles and failures
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    /// Number of cycles handed out so far
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Noise-free readings a device at `truth` would produce, `count` per anchor
    pub fn exact_cycle(anchors: &[Anchor], model: &DistanceModel, truth: Point2, count: usize) -> SampleCycle {
        let mut cycle = SampleCycle::new();
        for anchor in anchors {
            let rssi = model.rssi_from_distance(anchor.position.distance_to(&truth));
            cycle = cycle.with_samples(anchor.name.clone(), vec![rssi; count]);
        }
        cycle
    }
}

impl SampleSource for ScriptedSource {
    fn next_cycle(&mut self) -> AcquisitionResult<Option<SampleCycle>> {
        match self.script.pop_front() {
            Some(Ok(cycle)) => {
                self.delivered += 1;
                Ok(Some(cycle))
            }
            Some(Err(error)) => Err(error),
            None => Ok(None),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::config::SystemConfig;

    #[test]
    fn test_script_order_and_exhaustion() {
        let mut source = ScriptedSource::new("script");
        source.push_cycle(SampleCycle::new().with_samples("Tower 1", vec![-50.0]));
        source.push_error(AcquisitionError::Timeout { timeout_ms: 5000 });
        assert_eq!(source.remaining(), 2);

        assert!(source.next_cycle().unwrap().is_some());
        assert_eq!(source.next_cycle(), Err(AcquisitionError::Timeout { timeout_ms: 5000 }));
        assert_eq!(source.next_cycle(), Ok(None));
        assert_eq!(source.delivered(), 1);
        assert_eq!(source.name(), "script");
    }

    #[test]
    fn test_exact_cycle_inverts_model() {
        let config = SystemConfig::default();
        let anchors = config.anchor_table();
        let model = config.distance_model().unwrap();
        let truth = Point2::new(150.0, 150.0);
        let cycle = ScriptedSource::exact_cycle(&anchors, &model, truth, 3);

        for anchor in &anchors {
            let readings = &cycle.samples[&anchor.name];
            assert_eq!(readings.len(), 3);
            let distance = model.distance_from_rssi(readings[0]);
            assert!((distance - anchor.position.distance_to(&truth)).abs() < 1e-9);
        }
    }
}
