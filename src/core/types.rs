//! Core data types for the positioning system

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 2-D position in the deployment plane (feet)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const ORIGIN: Point2 = Point2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    pub fn from_vector(v: &Vector2<f64>) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl fmt::Display for Point2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// Index of an anchor in the validated anchor table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnchorId(pub usize);

impl AnchorId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Fixed reference point with known position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub id: AnchorId,
    pub name: String,
    pub position: Point2,
    /// Hardware address the acquisition layer reports this anchor under
    pub bssid: Option<String>,
}

/// Why no position could be produced for a cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnavailableReason {
    /// Fewer eligible anchors than a 2-D fix needs
    InsufficientAnchors { eligible: usize, required: usize },
    /// The optimizer did not converge or hit a numerical failure
    OptimizationFailed(String),
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::InsufficientAnchors { eligible, required } => {
                write!(f, "insufficient anchors: {} eligible, {} required", eligible, required)
            }
            UnavailableReason::OptimizationFailed(message) => {
                write!(f, "optimization failed: {}", message)
            }
        }
    }
}

/// Result of one solve attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PositionEstimate {
    Point {
        x: f64,
        y: f64,
        anchors_used: Vec<AnchorId>,
        /// Root-mean-square range residual at the solution (feet)
        rms_residual: f64,
        iterations: usize,
    },
    Unavailable { reason: UnavailableReason },
}

impl PositionEstimate {
    pub fn unavailable(reason: UnavailableReason) -> Self {
        PositionEstimate::Unavailable { reason }
    }

    pub fn point(&self) -> Option<Point2> {
        match self {
            PositionEstimate::Point { x, y, .. } => Some(Point2::new(*x, *y)),
            PositionEstimate::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, PositionEstimate::Point { .. })
    }

    pub fn anchors_used(&self) -> &[AnchorId] {
        match self {
            PositionEstimate::Point { anchors_used, .. } => anchors_used,
            PositionEstimate::Unavailable { .. } => &[],
        }
    }

    pub fn reason(&self) -> Option<&UnavailableReason> {
        match self {
            PositionEstimate::Point { .. } => None,
            PositionEstimate::Unavailable { reason } => Some(reason),
        }
    }
}

impl fmt::Display for PositionEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionEstimate::Point { x, y, anchors_used, rms_residual, .. } => write!(
                f,
                "X: {:.1} ft, Y: {:.1} ft ({} anchors, rms {:.2} ft)",
                x,
                y,
                anchors_used.len(),
                rms_residual
            ),
            PositionEstimate::Unavailable { reason } => write!(f, "unavailable: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-12);
        assert_eq!(Point2::from_vector(&b.to_vector()), b);
    }

    #[test]
    fn test_estimate_accessors() {
        let fix = PositionEstimate::Point {
            x: 1.0,
            y: 2.0,
            anchors_used: vec![AnchorId(0), AnchorId(2), AnchorId(3)],
            rms_residual: 0.0,
            iterations: 4,
        };
        assert!(fix.is_available());
        assert_eq!(fix.point(), Some(Point2::new(1.0, 2.0)));
        assert_eq!(fix.anchors_used().len(), 3);
        assert!(fix.reason().is_none());

        let none = PositionEstimate::unavailable(UnavailableReason::InsufficientAnchors {
            eligible: 2,
            required: 3,
        });
        assert!(!none.is_available());
        assert!(none.point().is_none());
        assert!(none.anchors_used().is_empty());
        assert!(none.to_string().contains("2 eligible"));
    }
}
