//! Constraint and objective assembly on top of the multi-period model.
//!
//! Stages consume a [`MultiPeriodModel`](crate::multiperiod::MultiPeriodModel)
//! and return it extended, in the order ramping, startup/shutdown, cash flows.
//! Each stage checks its inputs before it adds anything.

pub mod cashflow;
pub mod constraints;
pub mod ramping;
pub mod strategies;

pub use cashflow::*;
pub use constraints::*;
pub use ramping::{RAMP_DOWN, RAMP_UP, SHUTDOWN, STARTUP};
pub use strategies::*;
