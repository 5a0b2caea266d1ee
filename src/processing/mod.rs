//! Signal processing: path-loss conversion, outlier rejection, sample windows

pub mod distance_model;
pub mod outlier;
pub mod buffer;

pub use distance_model::DistanceModel;
pub use outlier::{FilterMethod, OutlierFilter};
pub use buffer::AnchorBuffer;
