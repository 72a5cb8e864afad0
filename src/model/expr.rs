//! Affine expressions are good_lp [`Expression`]s over [`Variable`] handles.
//!
//! [`ExpressionExt`] adds the read access the model builders and their
//! tests need on top of good_lp's operators.

use good_lp::IntoAffineExpression;
pub use good_lp::{Expression, Variable};

/// Coefficient and value access on an [`Expression`]
pub trait ExpressionExt {
    /// Coefficient of `var`, 0 when absent
    fn coefficient(&self, var: Variable) -> f64;

    fn constant_term(&self) -> f64;

    /// Non-zero `(variable, coefficient)` pairs, in no particular order
    fn terms(&self) -> Vec<(Variable, f64)>;

    fn n_terms(&self) -> usize {
        self.terms().len()
    }

    fn is_constant(&self) -> bool {
        self.n_terms() == 0
    }

    /// Value for the given variable assignment
    fn evaluate(&self, value: impl Fn(Variable) -> f64) -> f64;

    /// Same expression without zero-coefficient entries
    fn pruned(&self) -> Expression;
}

impl ExpressionExt for Expression {
    fn coefficient(&self, var: Variable) -> f64 {
        <&Expression as IntoAffineExpression>::linear_coefficients(self)
            .filter(|(v, _)| *v == var)
            .map(|(_, c)| c)
            .sum()
    }

    fn constant_term(&self) -> f64 {
        IntoAffineExpression::constant(self)
    }

    fn terms(&self) -> Vec<(Variable, f64)> {
        <&Expression as IntoAffineExpression>::linear_coefficients(self)
            .filter(|(_, c)| *c != 0.0)
            .collect()
    }

    fn evaluate(&self, value: impl Fn(Variable) -> f64) -> f64 {
        <&Expression as IntoAffineExpression>::linear_coefficients(self)
            .map(|(v, c)| c * value(v))
            .sum::<f64>()
            + self.constant_term()
    }

    fn pruned(&self) -> Expression {
        let mut out = Expression::from(self.constant_term());
        for (v, c) in self.terms() {
            out.add_mul(c, v);
        }
        out
    }
}
