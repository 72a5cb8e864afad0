//! Solve strategies for assembled models

pub mod milp;

pub use milp::*;
