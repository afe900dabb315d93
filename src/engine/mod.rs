//! Regime engine: configuration plus the end-to-end scoring pipeline.

pub mod config;
pub mod pipeline;

pub use config::{ConfigError, EngineConfig, IndicatorDef, DEFAULT_STALE_AFTER};
pub use pipeline::{AxisPoint, RegimeEngine, RegimeReport};
