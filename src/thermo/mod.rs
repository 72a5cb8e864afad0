//! Phase-equilibrium and activity-coefficient formulations

pub mod enrtl;
pub mod smooth_vle;

pub use enrtl::{AlphaTable, ApparentSpecies, ElectrolyteSystem, MixingTerms, Species};
pub use smooth_vle::{
    smooth_max, smooth_min, FlashTemperatures, Phase, PhaseComponentSet, PhaseType, SmoothVle, VlComponents,
};
