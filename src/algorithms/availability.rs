//! Anchor availability policy: which anchors take part in a solve

use serde::{Deserialize, Serialize};

use crate::core::{Anchor, AnchorId, Point2, DEFAULT_DISTANCE_CEILING_FT, MIN_ANCHORS_2D};
use crate::processing::buffer::AnchorBuffer;

/// Thresholds deciding whether an anchor's current data is usable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvailabilityPolicy {
    /// Average distances above this are implausible (feet)
    pub distance_ceiling_ft: f64,
    /// Samples required in the window before an anchor is used
    pub min_samples: usize,
    /// Eligible anchors required to attempt a fix
    pub min_anchors: usize,
}

impl Default for AvailabilityPolicy {
    fn default() -> Self {
        Self {
            distance_ceiling_ft: DEFAULT_DISTANCE_CEILING_FT,
            min_samples: 1,
            min_anchors: MIN_ANCHORS_2D,
        }
    }
}

/// Availability of one anchor for the current solve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AnchorStatus {
    /// Usable, with its averaged distance
    Eligible { average_distance_ft: f64 },
    /// No data in the window
    Down,
    /// Data present but fewer samples than required
    Underfilled { samples: usize, required: usize },
    /// Data present but the averaged distance exceeds the ceiling
    Implausible { average_distance_ft: f64 },
}

impl AnchorStatus {
    pub fn is_eligible(&self) -> bool {
        matches!(self, AnchorStatus::Eligible { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            AnchorStatus::Eligible { .. } => "eligible",
            AnchorStatus::Down => "down",
            AnchorStatus::Underfilled { .. } => "underfilled",
            AnchorStatus::Implausible { .. } => "implausible",
        }
    }
}

/// Anchor chosen for a solve, with the distance it contributes
#[derive(Debug, Clone, PartialEq)]
pub struct EligibleAnchor {
    pub id: AnchorId,
    pub position: Point2,
    pub distance_ft: f64,
}

/// Snapshot of anchor availability taken at the start of a solve
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorSet {
    statuses: Vec<(AnchorId, AnchorStatus)>,
    eligible: Vec<EligibleAnchor>,
    required: usize,
}

impl AnchorSet {
    /// Classify every anchor against its buffer; `buffers` is indexed like `anchors`
    pub fn select(anchors: &[Anchor], buffers: &[AnchorBuffer], policy: &AvailabilityPolicy) -> Self {
        let mut statuses = Vec::with_capacity(anchors.len());
        let mut eligible = Vec::new();

        for (anchor, buffer) in anchors.iter().zip(buffers) {
            let status = Self::classify(buffer, policy);
            if let AnchorStatus::Eligible { average_distance_ft } = status {
                eligible.push(EligibleAnchor {
                    id: anchor.id,
                    position: anchor.position,
                    distance_ft: average_distance_ft,
                });
            }
            statuses.push((anchor.id, status));
        }

        Self {
            statuses,
            eligible,
            required: policy.min_anchors.max(MIN_ANCHORS_2D),
        }
    }

    fn classify(buffer: &AnchorBuffer, policy: &AvailabilityPolicy) -> AnchorStatus {
        let average = match buffer.average_distance() {
            Some(d) => d,
            None => return AnchorStatus::Down,
        };
        if buffer.len() < policy.min_samples {
            return AnchorStatus::Underfilled {
                samples: buffer.len(),
                required: policy.min_samples,
            };
        }
        if !average.is_finite() || average > policy.distance_ceiling_ft {
            return AnchorStatus::Implausible { average_distance_ft: average };
        }
        AnchorStatus::Eligible { average_distance_ft: average }
    }

    pub fn eligible(&self) -> &[EligibleAnchor] {
        &self.eligible
    }

    pub fn eligible_ids(&self) -> Vec<AnchorId> {
        self.eligible.iter().map(|a| a.id).collect()
    }

    pub fn status(&self, id: AnchorId) -> Option<AnchorStatus> {
        self.statuses.iter().find(|(a, _)| *a == id).map(|(_, s)| *s)
    }

    pub fn statuses(&self) -> &[(AnchorId, AnchorStatus)] {
        &self.statuses
    }

    /// Anchors with no data at all
    pub fn down(&self) -> Vec<AnchorId> {
        self.ids_where(|s| matches!(s, AnchorStatus::Down))
    }

    /// Anchors with data that was not usable
    pub fn rejected(&self) -> Vec<AnchorId> {
        self.ids_where(|s| matches!(s, AnchorStatus::Implausible { .. } | AnchorStatus::Underfilled { .. }))
    }

    pub fn required(&self) -> usize {
        self.required
    }

    pub fn is_solvable(&self) -> bool {
        self.eligible.len() >= self.required
    }

    fn ids_where(&self, predicate: impl Fn(&AnchorStatus) -> bool) -> Vec<AnchorId> {
        self.statuses
            .iter()
            .filter(|(_, s)| predicate(s))
            .map(|(id, _)| *id)
            .collect()
    }
}
