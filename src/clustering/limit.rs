//! Limit-by-bound constraint.

use std::sync::Arc;

use super::{totals_after, BlockKey, ClusterConstraint, ConstraintTally};
use crate::filter::PersonKey;
use crate::models::Person;

/// Score returned when the remainder can no longer cover the shortfall.
const INFEASIBLE_PENALTY: f64 = -100.0;

/// Slack on the maximum so fractional values summing to it still fit.
const MAX_EPSILON: f64 = 1e-9;

/// Steers each cluster's total toward a minimum, and optionally caps it
/// with a hard maximum.
///
/// # Score
/// - `1` when no cluster falls short of the minimum
/// - `-100` when the unplaced remainder cannot cover the total shortfall
/// - `(1 − shortfall / remainder)²` otherwise
pub struct LimitConstraint {
    name: String,
    value: PersonKey,
    min: f64,
    max: Option<f64>,
    tally: ConstraintTally,
}

impl LimitConstraint {
    /// Limit on the sum of `value` per cluster.
    pub fn new(name: impl Into<String>, value: PersonKey, min: f64) -> Self {
        Self {
            name: name.into(),
            value,
            min,
            max: None,
            tally: ConstraintTally::default(),
        }
    }

    /// Limit on the number of people per cluster.
    pub fn count(name: impl Into<String>, min: f64) -> Self {
        Self::new(name, Arc::new(|_: &Person| Some(1.0)), min)
    }

    /// Adds a per-cluster maximum.
    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }
}

impl ClusterConstraint for LimitConstraint {
    fn name(&self) -> &str {
        &self.name
    }

    fn value_for(&self, person: &Person) -> f64 {
        (self.value)(person).unwrap_or(0.0)
    }

    fn tally(&self) -> &ConstraintTally {
        &self.tally
    }

    fn tally_mut(&mut self) -> &mut ConstraintTally {
        &mut self.tally
    }

    fn score(&self, totals: &[f64], cluster: usize, block: &BlockKey) -> f64 {
        let (after, remainder) = totals_after(
            totals,
            cluster,
            self.tally.block_value(block),
            self.tally.grand_total,
        );
        let shortfall: f64 = after.iter().map(|t| (self.min - t).max(0.0)).sum();
        if shortfall <= 0.0 {
            1.0
        } else if shortfall > remainder {
            INFEASIBLE_PENALTY
        } else {
            (1.0 - shortfall / remainder).powi(2)
        }
    }

    fn admits(&self, totals: &[f64], cluster: usize, block: &BlockKey) -> bool {
        match self.max {
            Some(max) => {
                let current = totals.get(cluster).copied().unwrap_or(0.0);
                current + self.tally.block_value(block) <= max + MAX_EPSILON
            }
            None => true,
        }
    }
}
