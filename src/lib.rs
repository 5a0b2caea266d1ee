//! RSSI Multilateration
//!
//! Estimates the 2-D position of a transmitting device inside a fixed
//! deployment area from the signal strength reported by a set of anchors,
//! using a log-distance path-loss model and bounded least squares.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod validation;
pub mod utils;
pub mod hardware;
pub mod api;

// Re-export commonly used types
pub use self::core::{Anchor, AnchorId, Point2, PositionEstimate, UnavailableReason, FEET_PER_METER};
pub use algorithms::{AnchorSet, AnchorStatus, AvailabilityPolicy, Bounds, InitialGuess, PositionSolver, SolverSettings};
pub use processing::{AnchorBuffer, DistanceModel, FilterMethod, OutlierFilter};
pub use validation::{LocalizationError, LocalizationResult, SampleValidator};
pub use utils::config::SystemConfig;
pub use hardware::{AcquisitionError, SampleCycle, SampleSource, ScriptedSource};
pub use api::{AnchorReport, EstimateReport, JsonFormatter, Localizer, SharedLocalizer, TextFormatter};
