//! Price-taker multi-period model builder.
//!
//! Loads electricity price series, reduces them to representative days with
//! k-means, and assembles a multi-period unit-commitment model with ramping,
//! startup/shutdown and discounted cash-flow objectives. Equipment costing
//! and phase-equilibrium helpers live alongside.

pub mod clustering;
pub mod config;
pub mod costing;
pub mod domain;
pub mod error;
pub mod model;
pub mod multiperiod;
pub mod optimizer;
pub mod price_taker;
pub mod prices;
pub mod telemetry;
pub mod thermo;

pub use error::{Error, Result};
pub use price_taker::{BuildStages, ClusteringSettings, PriceTakerModel};
