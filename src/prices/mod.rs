//! Price data pipeline
//!
//! raw table -> daily profiles -> cluster count -> representative days ->
//! price/weight parameters keyed by the model's index sets.

pub mod elbow;
pub mod loader;
pub mod representative;
pub mod table;

pub use elbow::{ClusterCountResult, ClusterCountSelector, DEFAULT_KMAX, DEFAULT_KMIN};
pub use loader::{ColumnSelector, PriceLoader};
pub use representative::{RepresentativeDayClusterer, CENTROID_ZERO_THRESHOLD};
pub use table::PriceTable;
