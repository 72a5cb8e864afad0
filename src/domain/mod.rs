pub mod prices;
pub mod series;

pub use prices::*;
pub use series::*;
