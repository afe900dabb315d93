pub mod loader;
pub mod store;
pub mod types;

pub use loader::{CsvLoader, LoaderError};
pub use store::{DerivedSpread, IndicatorStore};
pub use types::{
    AlignedSeries, IndicatorSeries, IndicatorSet, Observation, RawBasket, SeriesError, SourceError,
};
