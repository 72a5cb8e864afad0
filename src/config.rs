use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::path::PathBuf;

use crate::multiperiod::ThermalGenerator;
use crate::optimizer::{CashflowObjective, CashflowParams, CashflowWeighting, RampingLimits, UpDownTimes};
use crate::price_taker::{BuildStages, ClusteringSettings, PriceTakerModel};
use crate::prices::ColumnSelector;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    pub data: DataConfig,
    #[serde(default)]
    pub clustering: ClusteringSettings,
    #[serde(default)]
    pub unit: ThermalGenerator,
    #[serde(default)]
    pub ramping: RampingLimits,
    #[serde(default)]
    pub startup_shutdown: UpDownTimes,
    #[serde(default)]
    pub cashflow: CashflowConfig,
    #[serde(default)]
    pub solver: SolverConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub seed: u64,
    pub horizon_length: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub path: PathBuf,
    /// Scenario label to keep; all rows when unset
    pub scenario: Option<String>,
    #[serde(default)]
    pub columns: ColumnSelector,
    /// Representative days to build; full horizon when unset
    pub n_clusters: Option<usize>,
    /// Select `n_clusters` from the inertia elbow instead
    #[serde(default)]
    pub auto_clusters: bool,
    pub horizon_override: Option<usize>,
}

/// Cash-flow section; the objective stays a string until [`CashflowConfig::params`]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CashflowConfig {
    pub lifetime: u32,
    pub discount_rate: f64,
    pub corp_tax: f64,
    pub other_costs: f64,
    pub other_revenue: f64,
    pub objective: String,
    pub weighting: CashflowWeighting,
}

impl Default for CashflowConfig {
    fn default() -> Self {
        let p = CashflowParams::default();
        Self {
            lifetime: p.lifetime,
            discount_rate: p.discount_rate,
            corp_tax: p.corp_tax,
            other_costs: p.other_costs,
            other_revenue: p.other_revenue,
            objective: p.objective.to_string(),
            weighting: p.weighting,
        }
    }
}

impl CashflowConfig {
    pub fn params(&self) -> crate::Result<CashflowParams> {
        Ok(CashflowParams {
            lifetime: self.lifetime,
            discount_rate: self.discount_rate,
            corp_tax: self.corp_tax,
            other_costs: self.other_costs,
            other_revenue: self.other_revenue,
            objective: CashflowObjective::parse(&self.objective)?,
            weighting: self.weighting,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Solve the LP relaxation after building
    pub enabled: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("PTM__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        Ok(figment.extract()?)
    }

    pub fn price_taker(&self) -> crate::Result<PriceTakerModel> {
        PriceTakerModel::new(self.model.seed, self.model.horizon_length)?.with_clustering(self.clustering)
    }

    pub fn stages(&self) -> crate::Result<BuildStages> {
        Ok(BuildStages {
            ramping: self.ramping,
            startup_shutdown: self.startup_shutdown,
            cashflow: self.cashflow.params()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const TOML: &str = r#"
        [model]
        seed = 7
        horizon_length = 24

        [data]
        path = "data/prices.csv"
        columns = ["2022", "2023"]
        n_clusters = 5

        [ramping]
        ramp_up_limit = 120.0

        [cashflow]
        objective = "Net Profit"
    "#;

    #[test]
    fn test_load_from_toml() {
        let cfg = Config::from_figment(Figment::new().merge(Toml::string(TOML))).unwrap();
        assert_eq!(cfg.model.seed, 7);
        assert_eq!(
            cfg.data.columns,
            ColumnSelector::Years(vec!["2022".into(), "2023".into()])
        );
        assert_eq!(cfg.ramping.ramp_up_limit, 120.0);
        assert_eq!(cfg.ramping.startup_limit, 100.0);
        assert_eq!(cfg.stages().unwrap().cashflow.objective, CashflowObjective::NetProfit);
        assert!(cfg.solver.enabled);
    }

    #[test]
    fn test_unknown_objective_is_config_error() {
        let toml = TOML.replace("Net Profit", "IRR");
        let cfg = Config::from_figment(Figment::new().merge(Toml::string(&toml))).unwrap();
        assert!(matches!(cfg.stages(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_env_override() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PTM__MODEL__SEED", "99");
            let cfg = Config::from_figment(
                Figment::new()
                    .merge(Toml::string(TOML))
                    .merge(Env::prefixed("PTM__").split("__")),
            )
            .map_err(|e| e.to_string())?;
            assert_eq!(cfg.model.seed, 99);
            Ok(())
        });
    }
}
