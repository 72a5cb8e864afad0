use once_cell::unsync::OnceCell;

use crate::domain::PeriodKey;
use crate::model::Expression;

/// Quantities one operation model contributes to a period
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationContribution {
    pub unit: String,
    pub op_mode: Expression,
    pub startup: Expression,
    pub opt_power: Expression,
    pub non_fuel_vom: Expression,
    pub fuel_cost: Expression,
    pub elec_revenue: Expression,
    pub carbon_price: Expression,
}

/// Fixed costs one design model contributes to the whole horizon
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesignContribution {
    pub unit: String,
    pub capex: Expression,
    pub fom: Expression,
}

/// Operating signals of a period, summed over its operation models
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSignals {
    pub op_mode: Expression,
    pub startup: Expression,
    pub opt_power: Expression,
}

/// Hourly cash flows of a period, summed over its operation models
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyCashflow {
    pub non_fuel_vom: Expression,
    pub fuel_cost: Expression,
    pub elec_revenue: Expression,
    pub carbon_price: Expression,
    /// revenue - non-fuel VOM - fuel - carbon
    pub net_cash_inflow: Expression,
}

/// One time step of the multi-period model.
///
/// Aggregates are built on first access and reused afterwards.
#[derive(Debug)]
pub struct Period {
    pub key: PeriodKey,
    /// Occurrence weight of the period's day; 1 outside stochastic builds
    pub weight: f64,
    pub price: f64,
    operations: Vec<OperationContribution>,
    signals: OnceCell<PeriodSignals>,
    cashflow: OnceCell<HourlyCashflow>,
}

impl Period {
    pub(crate) fn new(key: PeriodKey, weight: f64, price: f64, operations: Vec<OperationContribution>) -> Self {
        Self {
            key,
            weight,
            price,
            operations,
            signals: OnceCell::new(),
            cashflow: OnceCell::new(),
        }
    }

    pub fn operations(&self) -> &[OperationContribution] {
        &self.operations
    }

    pub fn signals(&self) -> &PeriodSignals {
        self.signals.get_or_init(|| PeriodSignals {
            op_mode: self.operations.iter().map(|o| &o.op_mode).sum(),
            startup: self.operations.iter().map(|o| &o.startup).sum(),
            opt_power: self.operations.iter().map(|o| &o.opt_power).sum(),
        })
    }

    pub fn op_mode(&self) -> &Expression {
        &self.signals().op_mode
    }

    pub fn startup(&self) -> &Expression {
        &self.signals().startup
    }

    pub fn opt_power(&self) -> &Expression {
        &self.signals().opt_power
    }

    pub fn cashflow(&self) -> &HourlyCashflow {
        self.cashflow.get_or_init(|| {
            let non_fuel_vom: Expression = self.operations.iter().map(|o| &o.non_fuel_vom).sum();
            let fuel_cost: Expression = self.operations.iter().map(|o| &o.fuel_cost).sum();
            let elec_revenue: Expression = self.operations.iter().map(|o| &o.elec_revenue).sum();
            let carbon_price: Expression = self.operations.iter().map(|o| &o.carbon_price).sum();
            let net_cash_inflow = elec_revenue.clone() - &non_fuel_vom - &fuel_cost - &carbon_price;
            HourlyCashflow {
                non_fuel_vom,
                fuel_cost,
                elec_revenue,
                carbon_price,
                net_cash_inflow,
            }
        })
    }

    pub fn net_cash_inflow(&self) -> &Expression {
        &self.cashflow().net_cash_inflow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExpressionExt, Variable};
    use good_lp::ProblemVariables;

    fn vars(n: usize) -> Vec<Variable> {
        let mut problem = ProblemVariables::new();
        (0..n).map(|_| problem.add_variable()).collect()
    }

    fn contribution(op: Variable, power: Variable) -> OperationContribution {
        OperationContribution {
            unit: "u".into(),
            op_mode: op.into(),
            startup: Expression::default(),
            opt_power: power.into(),
            non_fuel_vom: power * 2.0,
            fuel_cost: power * 3.0,
            elec_revenue: power * 40.0,
            carbon_price: Expression::from(1.0),
        }
    }

    #[test]
    fn test_signals_sum_operations() {
        let v = vars(4);
        let p = Period::new(
            PeriodKey::new(1, None, None),
            1.0,
            40.0,
            vec![contribution(v[0], v[1]), contribution(v[2], v[3])],
        );
        assert_eq!(p.op_mode().coefficient(v[0]), 1.0);
        assert_eq!(p.op_mode().coefficient(v[2]), 1.0);
        assert_eq!(p.opt_power().n_terms(), 2);
        // Cached value is returned on later calls
        assert!(std::ptr::eq(p.signals(), p.signals()));
    }

    #[test]
    fn test_net_cash_inflow() {
        let v = vars(2);
        let p = Period::new(PeriodKey::new(1, None, None), 1.0, 40.0, vec![contribution(v[0], v[1])]);
        let ncf = p.net_cash_inflow();
        assert_eq!(ncf.coefficient(v[1]), 35.0);
        assert_eq!(ncf.constant_term(), -1.0);
    }

    #[test]
    fn test_empty_period_has_zero_signals() {
        let p = Period::new(PeriodKey::new(1, None, None), 1.0, 0.0, Vec::new());
        assert!(p.op_mode().is_constant());
        assert_eq!(p.net_cash_inflow(), &Expression::default());
    }
}
