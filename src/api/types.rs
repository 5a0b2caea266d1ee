//! Common API types exposed to presentation collaborators

use serde::Serialize;

use crate::algorithms::availability::AnchorStatus;
use crate::core::{AnchorId, Point2, PositionEstimate};

/// Display view of one anchor's current window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnchorReport {
    pub id: AnchorId,
    pub name: String,
    pub position: Point2,
    /// Samples currently held
    pub samples: usize,
    /// Mean RSSI of the window (dBm)
    pub average_reading: Option<f64>,
    /// Mean distance of the window (feet)
    pub average_distance_ft: Option<f64>,
    pub status: AnchorStatus,
}

impl AnchorReport {
    pub fn is_down(&self) -> bool {
        matches!(self.status, AnchorStatus::Down)
    }
}

/// Latest estimate together with the anchor views it was computed from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateReport {
    /// Number of solves performed so far
    pub sequence: u64,
    pub estimate: Option<PositionEstimate>,
    pub anchors: Vec<AnchorReport>,
}
