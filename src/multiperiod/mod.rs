//! Multi-period model
//!
//! One [`Period`] is created per key of the price parameters' index sets,
//! in (year, day, time) order. Units are attached through a typed
//! registry: operation models contribute per-period quantities, design
//! models contribute horizon-wide fixed costs.

use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::domain::{IndexSets, PeriodKey, PriceParameterSet};
use crate::error::{Error, Result};
use crate::model::{AlgebraicModel, Index, Relation};

pub mod period;
pub mod unit;

pub use period::{DesignContribution, HourlyCashflow, OperationContribution, Period, PeriodSignals};
pub use unit::ThermalGenerator;

/// Builds the per-period part of a unit
pub trait OperationModel {
    fn name(&self) -> &str;

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Add the unit's variables for period `key` and report its contribution.
    ///
    /// Indexed constraints go to `constraints`; they are committed once all
    /// periods are built.
    fn build_operation(
        &self,
        model: &mut AlgebraicModel,
        key: &PeriodKey,
        price: f64,
        constraints: &mut FamilyBuffer,
    ) -> Result<OperationContribution>;
}

/// Builds the horizon-wide part of a unit
pub trait DesignModel {
    fn name(&self) -> &str;

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn build_design(&self, model: &mut AlgebraicModel) -> Result<DesignContribution>;
}

/// Constraint members collected per family before they are added to a model
#[derive(Debug, Default)]
pub struct FamilyBuffer {
    families: BTreeMap<String, Vec<(Index, Relation)>>,
}

impl FamilyBuffer {
    pub fn push(&mut self, family: impl Into<String>, index: Index, relation: Relation) {
        self.families
            .entry(family.into())
            .or_default()
            .push((index, relation));
    }

    pub fn commit(self, model: &mut AlgebraicModel) -> Result<()> {
        let names: Vec<&str> = self.families.keys().map(String::as_str).collect();
        model.ensure_new_families(&names)?;
        for (family, members) in self.families {
            model.add_constraint_family(&family, members)?;
        }
        Ok(())
    }
}

/// Operation and design models attached to the multi-period model
#[derive(Default)]
pub struct UnitRegistry {
    operations: Vec<Box<dyn OperationModel>>,
    designs: Vec<Box<dyn DesignModel>>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operation(mut self, operation: impl OperationModel + 'static) -> Self {
        self.operations.push(Box::new(operation));
        self
    }

    pub fn with_design(mut self, design: impl DesignModel + 'static) -> Self {
        self.designs.push(Box::new(design));
        self
    }

    /// Attach a unit that has both an operation and a design part
    pub fn with_unit<U>(self, unit: U) -> Self
    where
        U: OperationModel + DesignModel + Clone + 'static,
    {
        self.with_design(unit.clone()).with_operation(unit)
    }

    pub fn n_operations(&self) -> usize {
        self.operations.len()
    }

    pub fn n_designs(&self) -> usize {
        self.designs.len()
    }

    fn validate(&self) -> Result<()> {
        for op in &self.operations {
            op.validate()?;
        }
        for design in &self.designs {
            design.validate()?;
        }
        Ok(())
    }
}

/// Periods, their unit contributions, and the algebraic model they live in
#[derive(Debug)]
pub struct MultiPeriodModel {
    model: AlgebraicModel,
    sets: IndexSets,
    periods: Vec<Period>,
    designs: Vec<DesignContribution>,
    stochastic: bool,
}

impl MultiPeriodModel {
    /// Build every period from `params`.
    ///
    /// With `stochastic` set, each period carries the occurrence weight of
    /// its representative day; otherwise every weight is 1.
    pub fn build(params: &PriceParameterSet, units: &UnitRegistry, stochastic: bool) -> Result<Self> {
        units.validate()?;

        let sets = params.sets().clone();
        let keys = sets.period_keys();
        if keys.is_empty() {
            return Err(Error::shape("price parameters define no periods"));
        }
        let priced = keys
            .iter()
            .map(|key| {
                params
                    .price(key)
                    .map(|price| (*key, price))
                    .ok_or_else(|| Error::shape(format!("no price for period {}", key)))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut model = AlgebraicModel::new();
        let mut buffer = FamilyBuffer::default();

        let designs = units
            .designs
            .iter()
            .map(|d| d.build_design(&mut model))
            .collect::<Result<Vec<_>>>()?;

        let mut periods = Vec::with_capacity(priced.len());
        for (key, price) in priced {
            let operations = units
                .operations
                .iter()
                .map(|op| op.build_operation(&mut model, &key, price, &mut buffer))
                .collect::<Result<Vec<_>>>()?;
            let weight = if stochastic { params.period_weight(&key) } else { 1.0 };
            periods.push(Period::new(key, weight, price, operations));
        }
        buffer.commit(&mut model)?;

        info!(
            n_periods = periods.len(),
            n_operations = units.n_operations(),
            n_designs = units.n_designs(),
            n_vars = model.n_vars(),
            stochastic,
            "built multi-period model"
        );
        debug!(n_constraints = model.constraints().len(), "period constraints");

        Ok(Self {
            model,
            sets,
            periods,
            designs,
            stochastic,
        })
    }

    pub fn model(&self) -> &AlgebraicModel {
        &self.model
    }

    pub(crate) fn model_mut(&mut self) -> &mut AlgebraicModel {
        &mut self.model
    }

    pub fn into_model(self) -> AlgebraicModel {
        self.model
    }

    pub fn sets(&self) -> &IndexSets {
        &self.sets
    }

    pub fn is_stochastic(&self) -> bool {
        self.stochastic
    }

    /// Periods in realization order
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn n_periods(&self) -> usize {
        self.periods.len()
    }

    pub fn period(&self, key: &PeriodKey) -> Option<&Period> {
        self.periods
            .binary_search_by(|p| p.key.cmp(key))
            .ok()
            .map(|i| &self.periods[i])
    }

    /// Period at position `pos` of the realization order
    pub fn period_at(&self, pos: usize) -> Option<&Period> {
        self.periods.get(pos)
    }

    pub fn designs(&self) -> &[DesignContribution] {
        &self.designs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DayKey;

    fn params(days: bool) -> PriceParameterSet {
        let sets = IndexSets {
            time: vec![1, 2, 3],
            days: days.then(|| vec![1, 2]),
            years: None,
        };
        let mut prices = BTreeMap::new();
        let mut weights = BTreeMap::new();
        for key in sets.period_keys() {
            prices.insert(key, 10.0 * key.time as f64 + key.day.unwrap_or(0) as f64);
        }
        if days {
            weights.insert(DayKey { year: None, day: 1 }, 5);
            weights.insert(DayKey { year: None, day: 2 }, 9);
        }
        PriceParameterSet::new(sets, prices, weights)
    }

    fn registry() -> UnitRegistry {
        UnitRegistry::new().with_unit(ThermalGenerator::default())
    }

    #[test]
    fn test_one_period_per_key() {
        let mp = MultiPeriodModel::build(&params(true), &registry(), true).unwrap();
        assert_eq!(mp.n_periods(), 6);
        assert_eq!(mp.designs().len(), 1);
        assert_eq!(mp.model().n_vars(), 18);
        assert_eq!(mp.model().constraints_named("thermal.power_max").count(), 6);

        let p = mp.period(&PeriodKey::new(2, Some(2), None)).unwrap();
        assert_eq!(p.price, 22.0);
        assert_eq!(p.weight, 9.0);
        assert_eq!(mp.period_at(3).map(|p| p.key), Some(PeriodKey::new(1, Some(2), None)));
    }

    #[test]
    fn test_deterministic_build_has_unit_weights() {
        let mp = MultiPeriodModel::build(&params(true), &registry(), false).unwrap();
        assert!(mp.periods().iter().all(|p| p.weight == 1.0));
    }

    #[test]
    fn test_missing_price_is_shape_error() {
        let sets = IndexSets {
            time: vec![1, 2],
            days: None,
            years: None,
        };
        let mut prices = BTreeMap::new();
        prices.insert(PeriodKey::new(1, None, None), 1.0);
        let params = PriceParameterSet::new(sets, prices, BTreeMap::new());
        let err = MultiPeriodModel::build(&params, &registry(), true).unwrap_err();
        assert!(matches!(err, Error::DataShape(_)));
    }

    #[test]
    fn test_invalid_unit_rejected_before_build() {
        let bad = UnitRegistry::new().with_unit(ThermalGenerator {
            max_power: -1.0,
            ..Default::default()
        });
        assert!(matches!(
            MultiPeriodModel::build(&params(false), &bad, true),
            Err(Error::Configuration(_))
        ));
    }
}
