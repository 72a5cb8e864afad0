//! Shell-and-tube heat exchanger purchase cost

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

use super::{parse_option, CostingParameters};
use crate::error::{Error, Result};

const M2_TO_FT2: f64 = 10.7639;
const PA_TO_PSI: f64 = 14.69 / 1.01325e5;
const BASE_CE_INDEX: f64 = 500.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
pub enum HxType {
    #[strum(serialize = "floating_head")]
    #[serde(rename = "floating_head")]
    FloatingHead,
    #[strum(serialize = "fixed_head")]
    #[serde(rename = "fixed_head")]
    FixedHead,
    #[default]
    #[strum(serialize = "U-tube")]
    #[serde(rename = "U-tube")]
    UTube,
    #[strum(serialize = "Kettle_vap")]
    #[serde(rename = "Kettle_vap")]
    KettleVaporizer,
}

impl HxType {
    /// `(a1, a2, a3)` of `ln CB = a1 - a2 ln A + a3 ln² A`
    fn coefficients(self) -> (f64, f64, f64) {
        match self {
            HxType::FloatingHead => (11.9052, 0.8709, 0.09005),
            HxType::FixedHead => (11.2927, 0.8228, 0.09861),
            HxType::UTube => (11.3852, 0.9186, 0.09790),
            HxType::KettleVaporizer => (12.2052, 0.8709, 0.09005),
        }
    }
}

/// Shell/tube construction material
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HxMaterial {
    #[default]
    StainSteel,
    CarbonSteel,
}

impl HxMaterial {
    pub fn factor(self) -> f64 {
        match self {
            HxMaterial::StainSteel => 3.0,
            HxMaterial::CarbonSteel => 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
pub enum TubeLength {
    #[strum(serialize = "8ft")]
    #[serde(rename = "8ft")]
    Ft8,
    #[default]
    #[strum(serialize = "12ft")]
    #[serde(rename = "12ft")]
    Ft12,
    #[strum(serialize = "16ft")]
    #[serde(rename = "16ft")]
    Ft16,
    #[strum(serialize = "20ft")]
    #[serde(rename = "20ft")]
    Ft20,
}

impl TubeLength {
    pub fn factor(self) -> f64 {
        match self {
            TubeLength::Ft8 => 1.25,
            TubeLength::Ft12 => 1.12,
            TubeLength::Ft16 => 1.05,
            TubeLength::Ft20 => 1.00,
        }
    }
}

/// Cost breakdown of one heat exchanger
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatExchangerCost {
    pub base_cost: f64,
    pub pressure_factor: f64,
    pub material_factor: f64,
    pub length_factor: f64,
    pub purchase_cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatExchangerCosting {
    pub hx_type: HxType,
    pub material: HxMaterial,
    pub tube_length: TubeLength,
    /// Area oversize factor, 1.1 to 1.5
    pub oversize: f64,
}

impl Default for HeatExchangerCosting {
    fn default() -> Self {
        Self {
            hx_type: HxType::default(),
            material: HxMaterial::default(),
            tube_length: TubeLength::default(),
            oversize: 1.1,
        }
    }
}

impl HeatExchangerCosting {
    /// Build from option strings such as `("U-tube", "stain_steel", "12ft")`
    pub fn from_options(hx_type: &str, material: &str, tube_length: &str) -> Result<Self> {
        Ok(Self {
            hx_type: parse_option("hx_type", hx_type)?,
            material: parse_option("hx material", material)?,
            tube_length: parse_option("tube length", tube_length)?,
            ..Default::default()
        })
    }

    /// Cost an exchanger of `area_m2` whose tube side enters at `tube_pressure_pa`
    pub fn cost(&self, params: &CostingParameters, area_m2: f64, tube_pressure_pa: f64) -> Result<HeatExchangerCost> {
        if !(area_m2.is_finite() && area_m2 > 0.0) {
            return Err(Error::config(format!("heat exchanger area must be > 0, got {}", area_m2)));
        }
        if !tube_pressure_pa.is_finite() || tube_pressure_pa < 0.0 {
            return Err(Error::config(format!(
                "tube pressure must be >= 0, got {}",
                tube_pressure_pa
            )));
        }

        let (a1, a2, a3) = self.hx_type.coefficients();
        let ln_area = (area_m2 * M2_TO_FT2 * self.oversize).ln();
        let base_cost = (a1 - a2 * ln_area + a3 * ln_area * ln_area).exp();

        // Correlation fitted between 100 and 2000 psig
        let p = tube_pressure_pa * PA_TO_PSI / 100.0;
        let pressure_factor = 0.9803 + 0.018 * p + 0.0017 * p * p;

        let material_factor = self.material.factor();
        let length_factor = self.tube_length.factor();
        let purchase_cost =
            pressure_factor * material_factor * length_factor * (params.ce_index / BASE_CE_INDEX) * base_cost;

        debug!(hx_type = %self.hx_type, area_m2, purchase_cost, "heat exchanger costed");
        Ok(HeatExchangerCost {
            base_cost,
            pressure_factor,
            material_factor,
            length_factor,
            purchase_cost,
        })
    }
}
