//! Discounted cash-flow assembly and objective selection

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString, VariantNames};
use tracing::info;

use crate::error::{Error, Result};
use crate::model::{Constraint, Domain, Expression, Objective, ObjectiveSense, Variable};
use crate::multiperiod::MultiPeriodModel;

const FAMILIES: [&str; 6] = [
    "capex_calculation",
    "fom_calculation",
    "dep_calculation",
    "net_cash_inflow_calculation",
    "corp_tax_calculation",
    "net_profit_calculation",
];

/// Quantity maximized by the price-taker model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, VariantNames)]
pub enum CashflowObjective {
    #[default]
    #[strum(serialize = "NPV")]
    #[serde(rename = "NPV")]
    Npv,
    #[strum(serialize = "Annualized NPV")]
    #[serde(rename = "Annualized NPV")]
    AnnualizedNpv,
    #[strum(serialize = "Net Profit")]
    #[serde(rename = "Net Profit")]
    NetProfit,
}

impl CashflowObjective {
    /// Parse an objective name; unknown names are configuration errors
    pub fn parse(name: &str) -> Result<Self> {
        Self::from_str(name).map_err(|_| {
            Error::config(format!(
                "objective '{}' is not supported; expected one of {:?}",
                name,
                Self::VARIANTS
            ))
        })
    }
}

/// How per-period net cash inflows are summed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CashflowWeighting {
    /// Every period counts once
    #[default]
    Unweighted,
    /// Each period is multiplied by its representative-day weight
    Occurrence,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CashflowParams {
    /// Years
    pub lifetime: u32,
    pub discount_rate: f64,
    pub corp_tax: f64,
    /// Yearly, $
    pub other_costs: f64,
    /// Yearly, $
    pub other_revenue: f64,
    pub objective: CashflowObjective,
    pub weighting: CashflowWeighting,
}

impl Default for CashflowParams {
    fn default() -> Self {
        Self {
            lifetime: 30,
            discount_rate: 0.08,
            corp_tax: 0.2,
            other_costs: 0.0,
            other_revenue: 0.0,
            objective: CashflowObjective::Npv,
            weighting: CashflowWeighting::Unweighted,
        }
    }
}

impl CashflowParams {
    pub fn validate(&self) -> Result<()> {
        if self.lifetime == 0 {
            return Err(Error::config("lifetime must be >= 1 year"));
        }
        if !self.discount_rate.is_finite() || self.discount_rate <= -1.0 {
            return Err(Error::config(format!(
                "discount_rate must be finite and > -1, got {}",
                self.discount_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.corp_tax) {
            return Err(Error::config(format!(
                "corp_tax must be within [0, 1], got {}",
                self.corp_tax
            )));
        }
        if !self.other_costs.is_finite() || !self.other_revenue.is_finite() {
            return Err(Error::config("other_costs and other_revenue must be finite"));
        }
        Ok(())
    }

    /// Present value of one dollar per year over the lifetime
    pub fn annuity_factor(&self) -> f64 {
        let r = self.discount_rate;
        let n = f64::from(self.lifetime);
        if r.abs() < 1e-12 {
            n
        } else {
            (1.0 - (1.0 + r).powf(-n)) / r
        }
    }
}

/// Scalar cash-flow variables of a built model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CashflowVars {
    pub capex: Variable,
    pub fom: Variable,
    pub depreciation: Variable,
    pub net_cash_inflow: Variable,
    pub corp_tax: Variable,
    pub net_profit: Variable,
}

impl MultiPeriodModel {
    /// Add the project cash flows and the objective.
    ///
    /// `CORP_TAX >= tax * (NCI + other_revenue - other_costs - FOM - DEP)` is
    /// an inequality so the optimizer can settle the tax itself.
    pub fn with_cashflows(mut self, params: &CashflowParams) -> Result<Self> {
        params.validate()?;
        self.model().ensure_new_families(&FAMILIES)?;
        if let Some(obj) = self.model().objective() {
            return Err(Error::config(format!("objective '{}' is already defined", obj.name)));
        }

        let capex_expr: Expression = self.designs().iter().map(|d| &d.capex).sum();
        let fom_expr: Expression = self.designs().iter().map(|d| &d.fom).sum();
        let mut nci_expr = Expression::default();
        for p in self.periods() {
            let weight = match params.weighting {
                CashflowWeighting::Unweighted => 1.0,
                CashflowWeighting::Occurrence => p.weight,
            };
            nci_expr.add_mul(weight, p.net_cash_inflow());
        }
        let factor = params.annuity_factor();
        let lifetime = f64::from(params.lifetime);

        let m = self.model_mut();
        let capex = m.add_var("CAPEX", Domain::NonNegativeReals);
        let fom = m.add_var("FOM", Domain::NonNegativeReals);
        let depreciation = m.add_var("DEPRECIATION", Domain::NonNegativeReals);
        let net_cash_inflow = m.add_var("NET_CASH_INFLOW", Domain::Reals);
        let corp_tax = m.add_var("CORP_TAX", Domain::NonNegativeReals);
        let net_profit = m.add_var("NET_PROFIT", Domain::Reals);

        let other = params.other_revenue - params.other_costs;
        m.add_constraint(FAMILIES[0], Constraint::equals(capex, capex_expr))?;
        m.add_constraint(FAMILIES[1], Constraint::equals(fom, fom_expr))?;
        m.add_constraint(FAMILIES[2], Constraint::equals(depreciation, capex / lifetime))?;
        m.add_constraint(FAMILIES[3], Constraint::equals(net_cash_inflow, nci_expr))?;
        let taxable = net_cash_inflow + other - fom - depreciation;
        m.add_constraint(FAMILIES[4], Constraint::ge(corp_tax, params.corp_tax * taxable))?;
        m.add_constraint(
            FAMILIES[5],
            Constraint::equals(net_profit, net_cash_inflow + other - fom - corp_tax),
        )?;

        let npv = net_profit * factor - capex;
        let annualized_npv = net_profit - capex / factor;
        m.add_expression("NPV", npv.clone())?;
        m.add_expression("Annualized_NPV", annualized_npv.clone())?;

        let (name, expr) = match params.objective {
            CashflowObjective::Npv => ("NPV", npv),
            CashflowObjective::AnnualizedNpv => ("Annualized_NPV", annualized_npv),
            CashflowObjective::NetProfit => ("NET_PROFIT", Expression::from(net_profit)),
        };
        m.set_objective(Objective {
            name: name.to_string(),
            expr,
            sense: ObjectiveSense::Maximize,
        })?;

        info!(
            objective = %params.objective,
            annuity_factor = factor,
            weighting = %params.weighting,
            "built cash flows"
        );
        Ok(self)
    }

    /// Cash-flow variables, once [`with_cashflows`](Self::with_cashflows) ran
    pub fn cashflow_vars(&self) -> Option<CashflowVars> {
        let m = self.model();
        Some(CashflowVars {
            capex: m.find_var("CAPEX")?,
            fom: m.find_var("FOM")?,
            depreciation: m.find_var("DEPRECIATION")?,
            net_cash_inflow: m.find_var("NET_CASH_INFLOW")?,
            corp_tax: m.find_var("CORP_TAX")?,
            net_profit: m.find_var("NET_PROFIT")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DayKey, IndexSets, PriceParameterSet};
    use crate::model::{ExpressionExt, Sense};
    use crate::multiperiod::{ThermalGenerator, UnitRegistry};
    use rstest::rstest;
    use std::collections::BTreeMap;

    fn model() -> MultiPeriodModel {
        let sets = IndexSets {
            time: vec![1, 2],
            days: Some(vec![1, 2]),
            years: None,
        };
        let prices: BTreeMap<_, _> = sets.period_keys().into_iter().map(|k| (k, 40.0)).collect();
        let mut weights = BTreeMap::new();
        weights.insert(DayKey { year: None, day: 1 }, 3);
        weights.insert(DayKey { year: None, day: 2 }, 7);
        let params = PriceParameterSet::new(sets, prices, weights);
        let gen = ThermalGenerator {
            max_power: 10.0,
            min_power: 2.0,
            capex_per_mw: 100.0,
            fom_per_mw_year: 5.0,
            ..Default::default()
        };
        MultiPeriodModel::build(&params, &UnitRegistry::new().with_unit(gen), true).unwrap()
    }

    #[rstest]
    #[case("NPV", CashflowObjective::Npv)]
    #[case("Annualized NPV", CashflowObjective::AnnualizedNpv)]
    #[case("Net Profit", CashflowObjective::NetProfit)]
    fn test_parse_objective(#[case] name: &str, #[case] expected: CashflowObjective) {
        assert_eq!(CashflowObjective::parse(name).unwrap(), expected);
        assert_eq!(expected.to_string(), name);
    }

    #[rstest]
    #[case("npv")]
    #[case("IRR")]
    #[case("")]
    fn test_unknown_objective(#[case] name: &str) {
        assert!(matches!(CashflowObjective::parse(name), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_annuity_factor() {
        let p = CashflowParams::default();
        let expected = (1.0 - 1.08f64.powi(-30)) / 0.08;
        assert!((p.annuity_factor() - expected).abs() < 1e-12);
        assert!((p.annuity_factor() - 11.257_783).abs() < 1e-6);

        let flat = CashflowParams {
            discount_rate: 0.0,
            ..Default::default()
        };
        assert_eq!(flat.annuity_factor(), 30.0);
    }

    #[test]
    fn test_net_profit_objective() {
        let params = CashflowParams {
            objective: CashflowObjective::NetProfit,
            ..Default::default()
        };
        let mp = model().with_cashflows(&params).unwrap();
        let vars = mp.cashflow_vars().unwrap();
        let obj = mp.model().objective().unwrap();

        assert_eq!(obj.expr, Expression::from(vars.net_profit));
        assert_eq!(obj.sense, ObjectiveSense::Maximize);
        assert_ne!(Some(&obj.expr), mp.model().expression("NPV"));
        assert_ne!(Some(&obj.expr), mp.model().expression("Annualized_NPV"));
    }

    #[test]
    fn test_npv_expression() {
        let mp = model().with_cashflows(&CashflowParams::default()).unwrap();
        let vars = mp.cashflow_vars().unwrap();
        let npv = mp.model().expression("NPV").unwrap();
        let factor = CashflowParams::default().annuity_factor();

        assert_eq!(npv.coefficient(vars.net_profit), factor);
        assert_eq!(npv.coefficient(vars.capex), -1.0);
        assert_eq!(mp.model().objective().unwrap().name, "NPV");
    }

    #[test]
    fn test_tax_is_lower_bound() {
        let mp = model().with_cashflows(&CashflowParams::default()).unwrap();
        let vars = mp.cashflow_vars().unwrap();
        let c = mp.model().constraint("corp_tax_calculation", crate::model::Index::Scalar).unwrap();
        assert_eq!(c.sense, Sense::Ge);
        assert_eq!(c.body.coefficient(vars.corp_tax), 1.0);
        assert!((c.body.coefficient(vars.net_cash_inflow) + 0.2).abs() < 1e-12);
        assert!((c.body.coefficient(vars.depreciation) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_fixed_costs_from_design() {
        let mp = model().with_cashflows(&CashflowParams::default()).unwrap();
        let vars = mp.cashflow_vars().unwrap();
        let capex = mp.model().constraint("capex_calculation", crate::model::Index::Scalar).unwrap();
        assert_eq!(capex.body.coefficient(vars.capex), 1.0);
        assert_eq!(capex.body.constant_term(), -1000.0);
        let fom = mp.model().constraint("fom_calculation", crate::model::Index::Scalar).unwrap();
        assert_eq!(fom.body.constant_term(), -50.0);
    }

    #[rstest]
    #[case(CashflowWeighting::Unweighted, 4.0)]
    #[case(CashflowWeighting::Occurrence, 20.0)]
    fn test_weighting(#[case] weighting: CashflowWeighting, #[case] total_weight: f64) {
        let params = CashflowParams {
            weighting,
            ..Default::default()
        };
        let mp = model().with_cashflows(&params).unwrap();
        let vars = mp.cashflow_vars().unwrap();
        let c = mp
            .model()
            .constraint("net_cash_inflow_calculation", crate::model::Index::Scalar)
            .unwrap();

        // Revenue coefficient on power summed over periods
        let revenue: f64 = mp
            .periods()
            .iter()
            .map(|p| {
                let power = p.opt_power().terms()[0].0;
                -c.body.coefficient(power) / (40.0 - ThermalGenerator::default().marginal_cost())
            })
            .sum();
        assert!((revenue - total_weight).abs() < 1e-9);
        assert_eq!(c.body.coefficient(vars.net_cash_inflow), 1.0);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let mp = model();
        let n_vars = mp.model().n_vars();
        let bad = CashflowParams {
            corp_tax: 1.5,
            ..Default::default()
        };
        assert!(matches!(mp.with_cashflows(&bad), Err(Error::Configuration(_))));

        let mp = model().with_cashflows(&CashflowParams::default()).unwrap();
        assert_eq!(mp.model().n_vars(), n_vars + 6);
        assert!(mp.with_cashflows(&CashflowParams::default()).is_err());
    }
}
