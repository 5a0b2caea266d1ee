//! Synchronous positioning facade: ingest samples, solve, read the estimate
//!
//! A `Localizer` owns the anchor table, one [`AnchorBuffer`] per anchor and the
//! solver. `solve` takes `&mut self`, so ingestion can never interleave with a
//! solve in progress.

use std::fmt;
use tracing::{debug, info, warn};

use crate::algorithms::availability::{AnchorSet, AvailabilityPolicy};
use crate::algorithms::solver::PositionSolver;
use crate::api::types::{AnchorReport, EstimateReport};
use crate::core::{Anchor, AnchorId, PositionEstimate, UnavailableReason};
use crate::hardware::{SampleCycle, SampleSource};
use crate::processing::buffer::AnchorBuffer;
use crate::processing::distance_model::DistanceModel;
use crate::processing::outlier::OutlierFilter;
use crate::utils::config::SystemConfig;
use crate::validation::data::SampleValidator;
use crate::validation::error::{LocalizationError, LocalizationResult};

/// RSSI multilateration engine for a fixed anchor deployment
#[derive(Debug, Clone)]
pub struct Localizer {
    anchors: Vec<Anchor>,
    buffers: Vec<AnchorBuffer>,
    model: DistanceModel,
    filter: OutlierFilter,
    validator: SampleValidator,
    policy: AvailabilityPolicy,
    solver: PositionSolver,
    latest: Option<PositionEstimate>,
    last_selection: Option<AnchorSet>,
    sequence: u64,
}

impl Localizer {
    /// Build from a configuration, failing on any invalid setting
    pub fn new(config: SystemConfig) -> LocalizationResult<Self> {
        config.validate()?;

        let anchors = config.anchor_table();
        let buffers = anchors.iter().map(|_| AnchorBuffer::new(config.buffer.capacity)).collect();

        Ok(Self {
            buffers,
            model: config.distance_model()?,
            filter: config.outlier_filter()?,
            validator: config.sample_validator()?,
            policy: config.availability_policy(),
            solver: PositionSolver::new(config.solver),
            anchors,
            latest: None,
            last_selection: None,
            sequence: 0,
        })
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    pub fn model(&self) -> &DistanceModel {
        &self.model
    }

    pub fn buffer(&self, id: AnchorId) -> Option<&AnchorBuffer> {
        self.buffers.get(id.index())
    }

    /// Resolve an anchor name, or failing that a BSSID, to its id
    pub fn resolve(&self, key: &str) -> LocalizationResult<AnchorId> {
        self.anchors
            .iter()
            .find(|a| a.name == key)
            .or_else(|| {
                self.anchors
                    .iter()
                    .find(|a| a.bssid.as_deref().is_some_and(|b| b.eq_ignore_ascii_case(key)))
            })
            .map(|a| a.id)
            .ok_or_else(|| LocalizationError::UnknownAnchor(key.to_string()))
    }

    /// Admit a single reading without outlier filtering
    pub fn ingest(&mut self, key: &str, rssi: f64) -> LocalizationResult<()> {
        let id = self.resolve(key)?;
        self.validator.validate(key, rssi)?;
        self.buffers[id.index()].admit(rssi, &self.model);
        debug!(anchor = key, rssi, "sample admitted");
        Ok(())
    }

    /// Filter and admit a batch for one anchor; returns the number admitted
    pub fn ingest_batch(&mut self, key: &str, samples: &[f64]) -> LocalizationResult<usize> {
        let id = self.resolve(key)?;
        self.ingest_by_id(id, samples)
    }

    /// Filter and admit a batch routed by scanner BSSID (case-insensitive)
    pub fn ingest_by_bssid(&mut self, bssid: &str, samples: &[f64]) -> LocalizationResult<usize> {
        let id = self
            .anchors
            .iter()
            .find(|a| a.bssid.as_deref().is_some_and(|b| b.eq_ignore_ascii_case(bssid)))
            .map(|a| a.id)
            .ok_or_else(|| LocalizationError::UnknownAnchor(bssid.to_string()))?;
        self.ingest_by_id(id, samples)
    }

    pub fn ingest_by_id(&mut self, id: AnchorId, samples: &[f64]) -> LocalizationResult<usize> {
        let name = match self.anchors.get(id.index()) {
            Some(anchor) => anchor.name.clone(),
            None => return Err(LocalizationError::UnknownAnchor(format!("#{}", id.index()))),
        };
        self.validator.validate_batch(&name, samples)?;
        let admitted = self.buffers[id.index()].admit_batch(samples, &self.filter, &self.model);
        debug!(anchor = %name, batch = samples.len(), admitted, "batch admitted");
        Ok(admitted)
    }

    /// Admit a whole sampling window; nothing is admitted if any key or reading is invalid
    pub fn ingest_cycle(&mut self, cycle: &SampleCycle) -> LocalizationResult<usize> {
        let mut resolved = Vec::with_capacity(cycle.samples.len());
        for (key, samples) in cycle.iter() {
            let id = self.resolve(key)?;
            self.validator.validate_batch(key, samples)?;
            resolved.push((id, samples));
        }

        let mut admitted = 0;
        for (id, samples) in resolved {
            admitted += self.buffers[id.index()].admit_batch(samples, &self.filter, &self.model);
        }
        debug!(anchors = cycle.samples.len(), admitted, "cycle admitted");
        Ok(admitted)
    }

    /// Select eligible anchors and run the solver against the current buffers
    pub fn solve(&mut self) -> &PositionEstimate {
        let selection = AnchorSet::select(&self.anchors, &self.buffers, &self.policy);

        let estimate = if selection.is_solvable() {
            self.solver.solve(selection.eligible())
        } else {
            PositionEstimate::unavailable(UnavailableReason::InsufficientAnchors {
                eligible: selection.eligible().len(),
                required: selection.required(),
            })
        };

        self.sequence += 1;
        match &estimate {
            PositionEstimate::Point { x, y, anchors_used, .. } => {
                info!(sequence = self.sequence, x = *x, y = *y, anchors = anchors_used.len(), "position estimated");
            }
            PositionEstimate::Unavailable { reason } => {
                warn!(
                    sequence = self.sequence,
                    down = selection.down().len(),
                    rejected = selection.rejected().len(),
                    %reason,
                    "position unavailable"
                );
            }
        }

        self.last_selection = Some(selection);
        self.latest.insert(estimate)
    }

    /// Pull one cycle from `source`, ingest it and solve
    ///
    /// Returns `Ok(None)` when the source is exhausted or a recoverable
    /// acquisition error skipped the cycle.
    pub fn poll(&mut self, source: &mut dyn SampleSource) -> LocalizationResult<Option<PositionEstimate>> {
        let cycle = match source.next_cycle() {
            Ok(Some(cycle)) => cycle,
            Ok(None) => return Ok(None),
            Err(error) if error.is_recoverable() => {
                warn!(source = source.name(), %error, strategy = ?error.recovery_strategy(), "acquisition cycle skipped");
                return Ok(None);
            }
            Err(error) => return Err(error.into()),
        };

        self.ingest_cycle(&cycle)?;
        Ok(Some(self.solve().clone()))
    }

    pub fn latest_estimate(&self) -> Option<&PositionEstimate> {
        self.latest.as_ref()
    }

    /// Anchor availability used by the most recent solve
    pub fn last_selection(&self) -> Option<&AnchorSet> {
        self.last_selection.as_ref()
    }

    pub fn solve_count(&self) -> u64 {
        self.sequence
    }

    /// Current per-anchor view for display
    pub fn anchor_reports(&self) -> Vec<AnchorReport> {
        let selection = AnchorSet::select(&self.anchors, &self.buffers, &self.policy);
        self.anchors
            .iter()
            .zip(&self.buffers)
            .zip(selection.statuses())
            .map(|((anchor, buffer), (_, status))| AnchorReport {
                id: anchor.id,
                name: anchor.name.clone(),
                position: anchor.position,
                samples: buffer.len(),
                average_reading: buffer.average_reading(),
                average_distance_ft: buffer.average_distance(),
                status: *status,
            })
            .collect()
    }

    pub fn report(&self) -> EstimateReport {
        EstimateReport {
            sequence: self.sequence,
            estimate: self.latest.clone(),
            anchors: self.anchor_reports(),
        }
    }

    /// Replace the model's reference strength; held distances are kept as admitted
    pub fn recalibrate(&mut self, rssi0: f64) -> LocalizationResult<()> {
        self.model.recalibrate(rssi0)?;
        info!(rssi0, "distance model recalibrated");
        Ok(())
    }

    pub fn clear_buffers(&mut self) {
        for buffer in &mut self.buffers {
            buffer.clear();
        }
    }
}

impl fmt::Display for Localizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Localizer(rssi0={}, n={})", self.model.rssi0(), self.model.path_loss_exponent())?;
        for report in self.anchor_reports() {
            write!(f, "\n{} {}: {} samples", report.name, report.position, report.samples)?;
            match (report.average_reading, report.average_distance_ft) {
                (Some(rssi), Some(distance)) => {
                    write!(f, ", average {:.2} dBm, {:.2} ft [{}]", rssi, distance, report.status.label())?
                }
                _ => write!(f, " [{}]", report.status.label())?,
            }
        }
        Ok(())
    }
}
