//! LP relaxation solve of an assembled price-taker model
//!
//! Binary commitment variables are relaxed to [0, 1] so the pure-Rust
//! `minilp` backend can solve the model. The relaxed optimum is an upper
//! bound on the mixed-integer optimum of a maximization problem.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::model::{AlgebraicModel, ExpressionExt, Variable};

/// Variable values and objective value of a solved model
#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    pub values: HashMap<Variable, f64>,
    pub objective_value: f64,
}

impl LpSolution {
    pub fn value(&self, var: Variable) -> f64 {
        self.values.get(&var).copied().unwrap_or(0.0)
    }
}

impl good_lp::Solution for LpSolution {
    fn value(&self, variable: Variable) -> f64 {
        LpSolution::value(self, variable)
    }
}

/// Solves the continuous relaxation of an [`AlgebraicModel`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LpRelaxationSolver;

impl LpRelaxationSolver {
    pub fn new() -> Self {
        Self
    }

    pub fn solve(&self, model: &AlgebraicModel) -> Result<LpSolution> {
        let objective = model
            .objective()
            .ok_or_else(|| Error::Solver("model has no objective".to_string()))?;
        let values = self.solve_lp(model)?;
        let objective_value = objective
            .expr
            .evaluate(|v| values.get(&v).copied().unwrap_or(0.0));
        Ok(LpSolution {
            values,
            objective_value,
        })
    }

    #[cfg(feature = "optimization")]
    fn solve_lp(&self, model: &AlgebraicModel) -> Result<HashMap<Variable, f64>> {
        use good_lp::{constraint, default_solver, variable, ProblemVariables, Solution, SolverModel};
        use tracing::{debug, warn};

        use crate::model::{Domain, ObjectiveSense, Sense};

        // Large models are slow with the simplex backend
        const LARGE_MODEL_VARS: usize = 20_000;

        let objective = model
            .objective()
            .ok_or_else(|| Error::Solver("model has no objective".to_string()))?;

        if model.n_vars() > LARGE_MODEL_VARS {
            warn!(
                n_vars = model.n_vars(),
                "LP relaxation received a large model; consider fewer representative days"
            );
        }
        let n_binary = model
            .variables()
            .iter()
            .filter(|(_, spec)| spec.domain == Domain::Binary)
            .count();
        debug!(n_binary, "relaxing binary variables to [0, 1]");

        // Re-adding the variables in creation order reproduces the model's handles
        let mut problem = ProblemVariables::new();
        for (handle, spec) in model.variables() {
            let (lower, upper) = spec.bounds();
            let mut def = variable().name(spec.name.clone());
            if let Some(lb) = lower {
                def = def.min(lb);
            }
            if let Some(ub) = upper {
                def = def.max(ub);
            }
            if problem.add(def) != *handle {
                return Err(Error::Solver(format!(
                    "variable '{}' is out of creation order",
                    spec.name
                )));
            }
        }

        // Constant terms stay out of the solver; they only shift the objective
        let goal = objective.expr.clone() - objective.expr.constant_term();
        let unsolved = match objective.sense {
            ObjectiveSense::Maximize => problem.maximise(goal),
            ObjectiveSense::Minimize => problem.minimise(goal),
        };
        let mut builder = unsolved.using(default_solver);

        for c in model.constraints() {
            let rhs = -c.body.constant_term();
            let lhs = c.body.clone() + rhs;
            builder = builder.with(match c.sense {
                Sense::Le => constraint!(lhs <= rhs),
                Sense::Ge => constraint!(lhs >= rhs),
                Sense::Eq => constraint!(lhs == rhs),
            });
        }

        let solution = builder
            .solve()
            .map_err(|e| Error::Solver(format!("LP relaxation failed: {}", e)))?;

        Ok(model
            .variables()
            .iter()
            .map(|(handle, _)| (*handle, solution.value(*handle)))
            .collect())
    }

    #[cfg(not(feature = "optimization"))]
    fn solve_lp(&self, _model: &AlgebraicModel) -> Result<HashMap<Variable, f64>> {
        Err(Error::Solver(
            "LP relaxation requires the 'optimization' feature to be enabled".to_string(),
        ))
    }
}
