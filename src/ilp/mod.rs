//! Integer linear programming layer.
//!
//! Engines describe each optimization step as a [`Model`]: binary decision
//! variables addressed by a typed key, linear constraints over them, and a
//! linear objective to maximize. The model is then handed to any
//! [`IlpSolver`]; [`MicroLpSolver`] is the bundled pure-Rust backend.
//!
//! Keys are engine-specific types (e.g. a person/group pair), so variables of
//! different key spaces can never collide.
//!
//! # Reference
//! - Wolsey (1998), "Integer Programming"
//! - Schrijver (1986), "Theory of Linear and Integer Programming"

mod microlp;

pub use microlp::MicroLpSolver;

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use thiserror::Error;

/// Index of a decision variable inside a [`Problem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub usize);

/// Right-hand side of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// `sum <= value`
    AtMost(f64),
    /// `sum >= value`
    AtLeast(f64),
    /// `sum == value`
    Exactly(f64),
    /// `min <= sum <= max`
    Between(f64, f64),
}

impl Bound {
    /// Whether an empty sum (zero) satisfies this bound.
    fn admits_zero(&self) -> bool {
        match *self {
            Bound::AtMost(v) => v >= 0.0,
            Bound::AtLeast(v) => v <= 0.0,
            Bound::Exactly(v) => v == 0.0,
            Bound::Between(lo, hi) => lo <= 0.0 && hi >= 0.0,
        }
    }
}

/// A linear constraint over binary variables.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    /// `(variable, coefficient)` terms.
    pub terms: Vec<(VarId, f64)>,
    /// Right-hand side.
    pub bound: Bound,
}

/// Key-erased maximization problem over binary variables.
#[derive(Debug, Clone, Default)]
pub struct Problem {
    /// Objective coefficient per variable.
    pub objective: Vec<f64>,
    /// Linear constraints.
    pub constraints: Vec<LinearConstraint>,
}

impl Problem {
    /// Number of variables.
    pub fn variable_count(&self) -> usize {
        self.objective.len()
    }

    /// Objective value of a 0/1 assignment.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.objective.iter().zip(values).map(|(c, v)| c * v).sum()
    }
}

/// Solver failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    /// No assignment satisfies every constraint.
    #[error("model is infeasible")]
    Infeasible,
    /// The objective can grow without limit.
    #[error("model is unbounded")]
    Unbounded,
    /// The backend failed for another reason.
    #[error("solver backend error: {0}")]
    Backend(String),
}

impl SolveError {
    /// Whether the failure is a property of the model rather than the backend.
    pub fn is_infeasible(&self) -> bool {
        matches!(self, SolveError::Infeasible | SolveError::Unbounded)
    }
}

/// A backend able to maximize a [`Problem`] over binary variables.
///
/// Implementations must be deterministic: identical problems must yield
/// identical solutions.
pub trait IlpSolver: Send + Sync + Debug {
    /// Backend name.
    fn name(&self) -> &'static str;

    /// Solves the problem, returning one value (0.0 or 1.0) per variable.
    fn solve(&self, problem: &Problem) -> Result<Vec<f64>, SolveError>;
}

/// An ILP model whose binary variables are addressed by keys of type `K`.
#[derive(Debug, Clone)]
pub struct Model<K> {
    name: String,
    keys: Vec<K>,
    index: HashMap<K, VarId>,
    problem: Problem,
}

impl<K: Clone + Eq + Hash> Model<K> {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: Vec::new(),
            index: HashMap::new(),
            problem: Problem::default(),
        }
    }

    /// Model name (used in logs).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a binary variable, or returns the existing one for `key`.
    pub fn add_binary_var(&mut self, key: K) -> VarId {
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = VarId(self.keys.len());
        self.keys.push(key.clone());
        self.index.insert(key, id);
        self.problem.objective.push(0.0);
        id
    }

    /// Variable for `key`, if it exists.
    pub fn var(&self, key: &K) -> Option<VarId> {
        self.index.get(key).copied()
    }

    /// Key of a variable.
    pub fn key(&self, var: VarId) -> &K {
        &self.keys[var.0]
    }

    /// Sets a variable's objective coefficient.
    pub fn set_objective_coefficient(&mut self, var: VarId, coefficient: f64) {
        self.problem.objective[var.0] = coefficient;
    }

    /// Objective coefficient of a variable.
    pub fn objective_coefficient(&self, var: VarId) -> f64 {
        self.problem.objective[var.0]
    }

    /// Adds a linear constraint.
    pub fn add_constraint(&mut self, terms: Vec<(VarId, f64)>, bound: Bound) {
        self.problem.constraints.push(LinearConstraint { terms, bound });
    }

    /// Adds `sum(vars) <bound>` with unit coefficients.
    pub fn add_sum_constraint(&mut self, vars: impl IntoIterator<Item = VarId>, bound: Bound) {
        let terms = vars.into_iter().map(|v| (v, 1.0)).collect();
        self.add_constraint(terms, bound);
    }

    /// Number of variables.
    pub fn variable_count(&self) -> usize {
        self.keys.len()
    }

    /// Number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.problem.constraints.len()
    }

    /// The key-erased problem.
    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// Solves the model for maximum objective.
    ///
    /// Constraints without terms are decided here and never reach the
    /// backend; an empty model is solved without consulting it at all.
    pub fn solve(&self, solver: &dyn IlpSolver) -> Result<ModelSolution<K>, SolveError> {
        let (constant, constraints): (Vec<_>, Vec<_>) = self
            .problem
            .constraints
            .iter()
            .cloned()
            .partition(|c| c.terms.is_empty());
        if constant.iter().any(|c| !c.bound.admits_zero()) {
            return Err(SolveError::Infeasible);
        }
        if self.keys.is_empty() {
            return Ok(ModelSolution {
                selected: Vec::new(),
                objective: 0.0,
            });
        }

        tracing::debug!(
            model = %self.name,
            solver = solver.name(),
            variables = self.variable_count(),
            constraints = constraints.len(),
            "Solving model"
        );

        let problem = Problem {
            objective: self.problem.objective.clone(),
            constraints,
        };
        let values = solver.solve(&problem)?;
        let selected = self
            .keys
            .iter()
            .zip(&values)
            .filter(|(_, v)| **v > 0.5)
            .map(|(k, _)| k.clone())
            .collect();
        let rounded: Vec<f64> = values.iter().map(|v| v.round()).collect();

        Ok(ModelSolution {
            selected,
            objective: self.problem.evaluate(&rounded),
        })
    }
}

/// The variables a solve set to 1, in variable order.
#[derive(Debug, Clone)]
pub struct ModelSolution<K> {
    /// Keys of the selected variables.
    pub selected: Vec<K>,
    /// Objective value.
    pub objective: f64,
}
