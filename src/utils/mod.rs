//! Configuration loading and validation

pub mod config;

pub use config::{
    AnchorConfig, AvailabilityConfig, BufferConfig, FilterConfig, ModelConfig, SampleRangeConfig, SystemConfig,
};
