use serde::{Deserialize, Serialize};

use super::{DesignContribution, DesignModel, FamilyBuffer, OperationContribution, OperationModel};
use crate::domain::PeriodKey;
use crate::error::{Error, Result};
use crate::model::{AlgebraicModel, Constraint, Domain, Expression, Index};

/// Dispatchable thermal generator with on/off commitment.
///
/// Per period it owns binary `op_mode` and `startup` indicators and a power
/// output bounded by `min_power * op_mode <= power <= max_power * op_mode`.
/// Costs are linear in power: fuel (heat rate times fuel price), non-fuel
/// VOM, carbon, plus a fixed cost per startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalGenerator {
    pub name: String,
    /// MW
    pub max_power: f64,
    /// MW
    pub min_power: f64,
    /// MMBtu/MWh
    pub heat_rate: f64,
    /// $/MMBtu
    pub fuel_price: f64,
    /// $/MWh
    pub non_fuel_vom: f64,
    /// t CO2 / MWh
    pub emission_intensity: f64,
    /// $/t CO2
    pub carbon_price: f64,
    /// $ per startup
    pub startup_cost: f64,
    /// $/MW of capacity
    pub capex_per_mw: f64,
    /// $/MW-year
    pub fom_per_mw_year: f64,
}

impl Default for ThermalGenerator {
    fn default() -> Self {
        Self {
            name: "thermal".to_string(),
            max_power: 200.0,
            min_power: 60.0,
            heat_rate: 9.0,
            fuel_price: 3.0,
            non_fuel_vom: 2.3,
            emission_intensity: 0.4,
            carbon_price: 0.0,
            startup_cost: 0.0,
            capex_per_mw: 1.0e6,
            fom_per_mw_year: 1.5e4,
        }
    }
}

impl ThermalGenerator {
    /// Marginal cost of one MWh, $/MWh
    pub fn marginal_cost(&self) -> f64 {
        self.heat_rate * self.fuel_price + self.non_fuel_vom + self.emission_intensity * self.carbon_price
    }
}

impl OperationModel for ThermalGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<()> {
        let fields = [
            ("max_power", self.max_power),
            ("min_power", self.min_power),
            ("heat_rate", self.heat_rate),
            ("fuel_price", self.fuel_price),
            ("non_fuel_vom", self.non_fuel_vom),
            ("emission_intensity", self.emission_intensity),
            ("carbon_price", self.carbon_price),
            ("startup_cost", self.startup_cost),
            ("capex_per_mw", self.capex_per_mw),
            ("fom_per_mw_year", self.fom_per_mw_year),
        ];
        if let Some((field, value)) = fields.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(Error::config(format!(
                "{}.{} must be finite and >= 0, got {}",
                self.name, field, value
            )));
        }
        if self.max_power <= 0.0 {
            return Err(Error::config(format!("{}.max_power must be > 0", self.name)));
        }
        if self.min_power > self.max_power {
            return Err(Error::config(format!(
                "{}.min_power ({}) exceeds max_power ({})",
                self.name, self.min_power, self.max_power
            )));
        }
        Ok(())
    }

    fn build_operation(
        &self,
        model: &mut AlgebraicModel,
        key: &PeriodKey,
        price: f64,
        constraints: &mut FamilyBuffer,
    ) -> Result<OperationContribution> {
        let op_mode = model.add_var(format!("{}.op_mode{}", self.name, key), Domain::Binary);
        let startup = model.add_var(format!("{}.startup{}", self.name, key), Domain::Binary);
        let power = model.add_bounded_var(
            format!("{}.power{}", self.name, key),
            Domain::NonNegativeReals,
            None,
            Some(self.max_power),
        );

        constraints.push(
            format!("{}.power_max", self.name),
            Index::Period(*key),
            Constraint::le(power, op_mode * self.max_power),
        );
        constraints.push(
            format!("{}.power_min", self.name),
            Index::Period(*key),
            Constraint::ge(power, op_mode * self.min_power),
        );

        Ok(OperationContribution {
            unit: self.name.clone(),
            op_mode: op_mode.into(),
            startup: startup.into(),
            opt_power: power.into(),
            non_fuel_vom: power * self.non_fuel_vom + startup * self.startup_cost,
            fuel_cost: power * (self.heat_rate * self.fuel_price),
            elec_revenue: power * price,
            carbon_price: power * (self.emission_intensity * self.carbon_price),
        })
    }
}

impl DesignModel for ThermalGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<()> {
        OperationModel::validate(self)
    }

    fn build_design(&self, _model: &mut AlgebraicModel) -> Result<DesignContribution> {
        Ok(DesignContribution {
            unit: self.name.clone(),
            capex: Expression::from(self.capex_per_mw * self.max_power),
            fom: Expression::from(self.fom_per_mw_year * self.max_power),
        })
    }
}
