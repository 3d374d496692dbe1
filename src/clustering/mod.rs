//! Population clustering.
//!
//! Partitions people into a fixed number of clusters (e.g. lunch shifts or
//! team colors) while keeping pre-grouped people together and respecting
//! balance and limit constraints.
//!
//! People are first gathered into indivisible *blocks*: everyone sharing a
//! pre-cluster value forms one block, everyone else is a block of one.
//! Blocks are then placed one at a time, largest first, each by a small ILP
//! whose objective asks every constraint to score the block against the
//! per-cluster totals placed so far.
//!
//! # Attempts
//!
//! A run is repeated up to `max_attempts` times with an unchanged model and
//! stops at the first attempt that places everyone; otherwise the attempt
//! that placed the most people wins. Placement is deterministic, so repeated
//! attempts reproduce the first one. Constraints carry no decay schedule.
//!
//! # Reference
//! Mulvey & Beck (1984), "Solving capacitated clustering problems",
//! European Journal of Operational Research 18(3)

mod balance;
mod engine;
mod limit;

pub use balance::BalanceConstraint;
pub use engine::{
    pre_cluster_by_property, ClusterOutcome, ClusterRequest, ClusterSummary, Clusterer,
    PreClusterFn,
};
pub use limit::LimitConstraint;

use std::collections::HashMap;
use std::fmt;

use crate::models::{Person, PersonId};

/// Identity of an indivisible block of people.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockKey {
    /// People sharing a pre-cluster value.
    Cluster(String),
    /// A person without a pre-cluster value.
    Person(PersonId),
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKey::Cluster(value) => write!(f, "CLUSTER-{value}"),
            BlockKey::Person(id) => write!(f, "PERSON-{}", id.0),
        }
    }
}

/// Per-block and overall totals a constraint accumulates while loading.
#[derive(Debug, Clone, Default)]
pub struct ConstraintTally {
    /// Value total per block.
    pub by_block: HashMap<BlockKey, f64>,
    /// Value total over everyone.
    pub grand_total: f64,
}

impl ConstraintTally {
    /// Total of one block (zero if unknown).
    pub fn block_value(&self, block: &BlockKey) -> f64 {
        self.by_block.get(block).copied().unwrap_or(0.0)
    }
}

/// A balance or bound requirement over clusters.
pub trait ClusterConstraint: Send {
    /// Constraint name; also the key of its totals in the outcome.
    fn name(&self) -> &str;

    /// Contribution of one person.
    fn value_for(&self, person: &Person) -> f64;

    /// Accumulated totals.
    fn tally(&self) -> &ConstraintTally;

    /// Accumulated totals, mutably.
    fn tally_mut(&mut self) -> &mut ConstraintTally;

    /// Adds a person to their block's total and the grand total.
    fn load_person(&mut self, person: &Person, block: &BlockKey) {
        let value = self.value_for(person);
        let tally = self.tally_mut();
        *tally.by_block.entry(block.clone()).or_insert(0.0) += value;
        tally.grand_total += value;
    }

    /// Score of placing `block` into `cluster`, given the current per-cluster
    /// totals of this constraint.
    fn score(&self, totals: &[f64], cluster: usize, block: &BlockKey) -> f64;

    /// Whether `cluster` can take `block` without breaking a hard ceiling.
    fn admits(&self, totals: &[f64], cluster: usize, block: &BlockKey) -> bool {
        let _ = (totals, cluster, block);
        true
    }
}

/// Per-cluster totals after hypothetically adding `value` to `cluster`,
/// together with the remainder still unplaced.
pub(crate) fn totals_after(totals: &[f64], cluster: usize, value: f64, grand: f64) -> (Vec<f64>, f64) {
    let mut after = totals.to_vec();
    if let Some(t) = after.get_mut(cluster) {
        *t += value;
    }
    let placed: f64 = after.iter().sum();
    (after, (grand - placed).max(0.0))
}
