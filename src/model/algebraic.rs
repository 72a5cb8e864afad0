use good_lp::{ProblemVariables, Variable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use super::expr::{Expression, ExpressionExt};
use crate::domain::PeriodKey;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Domain {
    Reals,
    NonNegativeReals,
    Binary,
}

/// Name, domain and bounds of a model variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    pub domain: Domain,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl VariableSpec {
    /// Effective bounds after applying the domain
    pub fn bounds(&self) -> (Option<f64>, Option<f64>) {
        match self.domain {
            Domain::Reals => (self.lower, self.upper),
            Domain::NonNegativeReals => (Some(self.lower.map_or(0.0, |l| l.max(0.0))), self.upper),
            Domain::Binary => (Some(0.0), Some(1.0)),
        }
    }
}

/// Relation of a constraint body to zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

/// Member index inside a constraint family
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Index {
    Scalar,
    Position(usize),
    Period(PeriodKey),
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Index::Scalar => Ok(()),
            Index::Position(t) => write!(f, "[{}]", t),
            Index::Period(key) => write!(f, "{}", key),
        }
    }
}

/// `body (<= | >= | ==) 0`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub family: String,
    pub index: Index,
    pub body: Expression,
    pub sense: Sense,
}

/// Constraint body and sense before it joins a family
pub type Relation = (Expression, Sense);

impl Constraint {
    /// `lhs <= rhs`
    pub fn le(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Relation {
        Self::relation(lhs.into(), rhs.into(), Sense::Le)
    }

    /// `lhs >= rhs`
    pub fn ge(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Relation {
        Self::relation(lhs.into(), rhs.into(), Sense::Ge)
    }

    /// `lhs == rhs`
    pub fn equals(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Relation {
        Self::relation(lhs.into(), rhs.into(), Sense::Eq)
    }

    /// Zero coefficients are dropped so equal relations compare equal
    fn relation(lhs: Expression, rhs: Expression, sense: Sense) -> Relation {
        ((lhs - rhs).pruned(), sense)
    }

    pub fn name(&self) -> String {
        format!("{}{}", self.family, self.index)
    }

    /// Whether an assignment satisfies the constraint within `tol`
    pub fn is_satisfied(&self, value: impl Fn(Variable) -> f64, tol: f64) -> bool {
        let v = self.body.evaluate(value);
        match self.sense {
            Sense::Le => v <= tol,
            Sense::Ge => v >= -tol,
            Sense::Eq => v.abs() <= tol,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveSense {
    Minimize,
    Maximize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub name: String,
    pub expr: Expression,
    pub sense: ObjectiveSense,
}

/// Variables, named expressions, constraint families and one objective.
///
/// Variable handles come from good_lp's [`ProblemVariables`] in creation
/// order. Constraint families and named expressions are write-once:
/// redefining either is a configuration error and leaves the model untouched.
#[derive(Default)]
pub struct AlgebraicModel {
    handles: ProblemVariables,
    variables: Vec<(Variable, VariableSpec)>,
    positions: HashMap<Variable, usize>,
    constraints: Vec<Constraint>,
    families: BTreeSet<String>,
    expressions: BTreeMap<String, Expression>,
    objective: Option<Objective>,
}

impl fmt::Debug for AlgebraicModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgebraicModel")
            .field("n_vars", &self.variables.len())
            .field("n_constraints", &self.constraints.len())
            .field("families", &self.families)
            .field("objective", &self.objective.as_ref().map(|o| &o.name))
            .finish()
    }
}

impl AlgebraicModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_var(&mut self, name: impl Into<String>, domain: Domain) -> Variable {
        self.add_bounded_var(name, domain, None, None)
    }

    pub fn add_bounded_var(
        &mut self,
        name: impl Into<String>,
        domain: Domain,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> Variable {
        let handle = self.handles.add_variable();
        self.positions.insert(handle, self.variables.len());
        self.variables.push((
            handle,
            VariableSpec {
                name: name.into(),
                domain,
                lower,
                upper,
            },
        ));
        handle
    }

    pub fn variable(&self, var: Variable) -> Option<&VariableSpec> {
        self.positions.get(&var).map(|&i| &self.variables[i].1)
    }

    /// Handles and specs in creation order
    pub fn variables(&self) -> &[(Variable, VariableSpec)] {
        &self.variables
    }

    pub fn n_vars(&self) -> usize {
        self.variables.len()
    }

    pub fn find_var(&self, name: &str) -> Option<Variable> {
        self.variables
            .iter()
            .find(|(_, spec)| spec.name == name)
            .map(|(handle, _)| *handle)
    }

    pub fn has_family(&self, family: &str) -> bool {
        self.families.contains(family)
    }

    /// Fail if any of `families` is already defined
    pub fn ensure_new_families(&self, families: &[&str]) -> Result<()> {
        match families.iter().find(|f| self.has_family(f)) {
            Some(f) => Err(Error::config(format!("constraint family '{}' is already defined", f))),
            None => Ok(()),
        }
    }

    /// Add a whole constraint family at once
    pub fn add_constraint_family(
        &mut self,
        family: &str,
        members: impl IntoIterator<Item = (Index, Relation)>,
    ) -> Result<usize> {
        self.ensure_new_families(&[family])?;
        let before = self.constraints.len();
        self.constraints
            .extend(members.into_iter().map(|(index, (body, sense))| Constraint {
                family: family.to_string(),
                index,
                body,
                sense,
            }));
        self.families.insert(family.to_string());
        Ok(self.constraints.len() - before)
    }

    pub fn add_constraint(&mut self, family: &str, relation: Relation) -> Result<()> {
        self.add_constraint_family(family, [(Index::Scalar, relation)])
            .map(|_| ())
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn constraints_named<'a>(&'a self, family: &'a str) -> impl Iterator<Item = &'a Constraint> + 'a {
        self.constraints.iter().filter(move |c| c.family == family)
    }

    pub fn constraint(&self, family: &str, index: Index) -> Option<&Constraint> {
        self.constraints
            .iter()
            .find(|c| c.family == family && c.index == index)
    }

    pub fn add_expression(&mut self, name: &str, expr: Expression) -> Result<()> {
        if self.expressions.contains_key(name) {
            return Err(Error::config(format!("expression '{}' is already defined", name)));
        }
        self.expressions.insert(name.to_string(), expr);
        Ok(())
    }

    pub fn expression(&self, name: &str) -> Option<&Expression> {
        self.expressions.get(name)
    }

    pub fn set_objective(&mut self, objective: Objective) -> Result<()> {
        if let Some(existing) = &self.objective {
            return Err(Error::config(format!(
                "objective '{}' is already defined",
                existing.name
            )));
        }
        self.objective = Some(objective);
        Ok(())
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    /// Constraints violated by `solution`
    pub fn violations<S: good_lp::Solution>(&self, solution: &S, tol: f64) -> Vec<&Constraint> {
        self.constraints
            .iter()
            .filter(|c| !c.is_satisfied(|v| solution.value(v), tol))
            .collect()
    }
}
