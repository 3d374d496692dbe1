//! Balance-by-quota constraint.

use super::{totals_after, BlockKey, ClusterConstraint, ConstraintTally};
use crate::filter::PersonKey;
use crate::models::Person;

/// Spreads a numeric or boolean property evenly across clusters.
///
/// # Score
/// `-weight × Σ (dev_i / grand)²` where `dev_i` is cluster `i`'s excess over
/// the even share plus the part of its deficit the unplaced remainder can no
/// longer cover. Early placements are therefore not penalized for shares
/// only reachable once more blocks are placed.
pub struct BalanceConstraint {
    name: String,
    value: PersonKey,
    weight: f64,
    tally: ConstraintTally,
}

impl BalanceConstraint {
    /// Creates a balance constraint penalizing deviation by `weight`.
    pub fn new(name: impl Into<String>, value: PersonKey, weight: f64) -> Self {
        Self {
            name: name.into(),
            value,
            weight,
            tally: ConstraintTally::default(),
        }
    }
}

impl ClusterConstraint for BalanceConstraint {
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
        let grand = self.tally.grand_total;
        if grand <= 0.0 || totals.is_empty() {
            return 0.0;
        }
        let (after, remainder) = totals_after(totals, cluster, self.tally.block_value(block), grand);
        let share = grand / after.len() as f64;
        let penalty: f64 = after
            .iter()
            .map(|&t| {
                let excess = (t - share).max(0.0);
                let uncovered = ((share - t) - remainder).max(0.0);
                ((excess + uncovered) / grand).powi(2)
            })
            .sum();
        -self.weight * penalty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::property_key;
    use crate::models::PersonId;

    fn loaded() -> BalanceConstraint {
        let mut c = BalanceConstraint::new("experienced", property_key("experienced"), 10.0);
        for id in 1..=4 {
            let p = Person::new(id, format!("p{id}")).with_property("experienced", id <= 2);
            c.load_person(&p, &BlockKey::Person(p.registrant_id));
        }
        c
    }

    #[test]
    fn test_load_tallies() {
        let c = loaded();
        assert!((c.tally().grand_total - 2.0).abs() < 1e-10);
        assert!((c.tally().block_value(&BlockKey::Person(PersonId(1))) - 1.0).abs() < 1e-10);
        assert_eq!(c.tally().block_value(&BlockKey::Person(PersonId(3))), 0.0);
    }

    #[test]
    fn test_penalizes_stacking() {
        let c = loaded();
        let block = BlockKey::Person(PersonId(1));
        // share = 1 per cluster
        assert_eq!(c.score(&[0.0, 0.0], 0, &block), 0.0);
        assert_eq!(c.score(&[0.0, 1.0], 0, &block), 0.0);
        // stacking both experienced people in cluster 0: excess 1, deficit 1 uncovered
        let stacked = c.score(&[1.0, 0.0], 0, &block);
        assert!((stacked - -10.0 * 0.5).abs() < 1e-10, "got {stacked}");
    }
}
