//! Algebraic modeling layer over good_lp: named variables with domains,
//! write-once constraint families, named expressions and one objective.

pub mod algebraic;
pub mod expr;

pub use algebraic::{AlgebraicModel, Constraint, Domain, Index, Objective, ObjectiveSense, Relation, Sense, VariableSpec};
pub use expr::{Expression, ExpressionExt, Variable};
