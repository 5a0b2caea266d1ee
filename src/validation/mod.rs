//! Input validation and error taxonomy

pub mod data;
pub mod error;

pub use data::SampleValidator;
pub use error::{LocalizationError, LocalizationResult};
