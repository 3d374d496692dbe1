//! Pure-Rust backend built on `good_lp` with the `microlp` solver.
//!
//! `microlp` solves the LP relaxation with a dual simplex and closes the
//! integrality gap with branch and bound. It runs single-threaded and is
//! deterministic for a given problem.

use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};

use super::{Bound, IlpSolver, Problem, SolveError};

/// Binary ILP solver backed by `good_lp` + `microlp`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpSolver;

impl IlpSolver for MicroLpSolver {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(&self, problem: &Problem) -> Result<Vec<f64>, SolveError> {
        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = (0..problem.variable_count())
            .map(|_| vars.add(variable().binary()))
            .collect();

        let mut objective = Expression::from(0.0);
        for (&coefficient, &var) in problem.objective.iter().zip(&handles) {
            if coefficient != 0.0 {
                objective += coefficient * var;
            }
        }

        let mut model = vars.maximise(objective).using(default_solver);
        for c in &problem.constraints {
            let mut lhs = Expression::from(0.0);
            for &(var, coefficient) in &c.terms {
                lhs += coefficient * handles[var.0];
            }
            match c.bound {
                Bound::AtMost(v) => {
                    model.add_constraint(constraint::leq(lhs, Expression::from(v)));
                }
                Bound::AtLeast(v) => {
                    model.add_constraint(constraint::geq(lhs, Expression::from(v)));
                }
                Bound::Exactly(v) => {
                    model.add_constraint(constraint::eq(lhs, Expression::from(v)));
                }
                Bound::Between(lo, hi) => {
                    model.add_constraint(constraint::geq(lhs.clone(), Expression::from(lo)));
                    model.add_constraint(constraint::leq(lhs, Expression::from(hi)));
                }
            }
        }

        let solution = model.solve().map_err(|e| match e {
            ResolutionError::Infeasible => SolveError::Infeasible,
            ResolutionError::Unbounded => SolveError::Unbounded,
            other => SolveError::Backend(other.to_string()),
        })?;

        Ok(handles.iter().map(|&v| solution.value(v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ilp::{LinearConstraint, VarId};

    #[test]
    fn test_knapsack() {
        // max 5a + 4b + 3c  s.t. 2a + 3b + c <= 4 -> a + c
        let problem = Problem {
            objective: vec![5.0, 4.0, 3.0],
            constraints: vec![LinearConstraint {
                terms: vec![(VarId(0), 2.0), (VarId(1), 3.0), (VarId(2), 1.0)],
                bound: Bound::AtMost(4.0),
            }],
        };
        let values = MicroLpSolver.solve(&problem).unwrap();
        let rounded: Vec<i64> = values.iter().map(|v| v.round() as i64).collect();
        assert_eq!(rounded, vec![1, 0, 1]);
    }

    #[test]
    fn test_values_are_binary() {
        let problem = Problem {
            objective: vec![1.0, 1.0, 1.0],
            constraints: vec![LinearConstraint {
                terms: vec![(VarId(0), 1.0), (VarId(1), 1.0), (VarId(2), 1.0)],
                bound: Bound::AtMost(1.5),
            }],
        };
        let values = MicroLpSolver.solve(&problem).unwrap();
        assert!(values.iter().all(|v| v.abs() < 1e-6 || (v - 1.0).abs() < 1e-6));
        assert!((values.iter().sum::<f64>() - 1.0).abs() < 1e-6);
    }
}
