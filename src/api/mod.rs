//! Positioning API
//!
//! [`Localizer`] is the synchronous facade; [`SharedLocalizer`] wraps it for
//! callers that ingest and read estimates from different threads.

pub mod formatting;
pub mod localizer;
pub mod shared;
pub mod types;

pub use formatting::{JsonFormatter, TextFormatter};
pub use localizer::Localizer;
pub use shared::SharedLocalizer;
pub use types::{AnchorReport, EstimateReport};
