pub mod data;
pub mod engine;
pub mod normalize;
pub mod regime;
pub mod scorecard;
pub mod validation;

// Re-export commonly used types
pub use data::{CsvLoader, IndicatorSet, IndicatorStore, Observation, RawBasket, SourceError};
pub use engine::{AxisPoint, EngineConfig, RegimeEngine, RegimeReport};
pub use normalize::{NormalizedSet, Normalizer};
pub use regime::{Polarity, PolarityTable, Regime, RegimeClassifier, RegimeVerdict, Tier, TierThresholds};
pub use scorecard::{Scorecard, ScorecardBuilder};
pub use validation::{DataIntegrityValidator, ValidationReport};
