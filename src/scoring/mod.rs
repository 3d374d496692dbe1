//! Scorer framework.
//!
//! Scorers contribute to the objective of the group and staff engines. Each
//! scorer is a small object with an explicit scoring method; any memoization
//! lives in a [`ScoreCache`] owned by the scorer instance, never in shared
//! state.
//!
//! # Scorers
//!
//! | Scorer | Engine | Effect |
//! |--------|--------|--------|
//! | [`MatchingValueScorer`] | groups | Rewards sharing a value with group mates |
//! | [`FilterScorer`] | groups, staff | Flat bonus when filters match |
//! | [`RecencyScorer`] | staff | Penalizes back-to-back duty |
//! | [`PreferenceScorer`] | staff | Steers toward preferred job mix |
//! | [`AdjacencyScorer`] | staff | Rewards duty adjacent to own competing |
//!
//! Engines call scorers with `&mut self` so they may fill their caches;
//! callers construct fresh scorers per invocation.

mod adjacency;
mod filter;
mod matching;
mod preference;
mod recency;

pub use adjacency::AdjacencyScorer;
pub use filter::FilterScorer;
pub use matching::MatchingValueScorer;
pub use preference::PreferenceScorer;
pub use recency::RecencyScorer;

use std::collections::HashMap;
use std::hash::Hash;

use crate::models::{Activity, ActivityIndex, Person};

/// Read-only view of the snapshot shared with scorers during one solve.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    /// Time spans of every activity.
    pub index: &'a ActivityIndex,
}

impl<'a> ScoringContext<'a> {
    /// Creates a context.
    pub fn new(index: &'a ActivityIndex) -> Self {
        Self { index }
    }
}

/// Scores placing a person into a group.
pub trait GroupScorer: Send {
    /// Scorer name (used in logs).
    fn name(&self) -> &str;

    /// Score of placing `person` into `group`, given the people already
    /// confirmed or pending there.
    fn score(
        &mut self,
        ctx: &ScoringContext<'_>,
        person: &Person,
        group: &Activity,
        mates: &[&Person],
    ) -> f64;
}

/// Scores giving a person a job during an activity.
pub trait StaffScorer: Send {
    /// Scorer name (used in logs).
    fn name(&self) -> &str;

    /// Score of giving `person` the job `job` (at `station`, for per-station
    /// jobs) during `activity`.
    fn score(
        &mut self,
        ctx: &ScoringContext<'_>,
        person: &Person,
        activity: &Activity,
        job: &str,
        station: Option<u32>,
    ) -> f64;
}

/// Memoization table owned by one scorer instance.
#[derive(Debug, Clone)]
pub struct ScoreCache<K, V> {
    entries: HashMap<K, V>,
}

impl<K, V> Default for ScoreCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V: Clone> ScoreCache<K, V> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, computing it on first use.
    pub fn get_or_compute(&mut self, key: K, compute: impl FnOnce() -> V) -> V {
        self.entries.entry(key).or_insert_with(compute).clone()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_computes_once() {
        let mut cache: ScoreCache<u32, f64> = ScoreCache::new();
        let mut calls = 0;
        for _ in 0..3 {
            let v = cache.get_or_compute(7, || {
                calls += 1;
                2.5
            });
            assert!((v - 2.5).abs() < 1e-10);
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
    }
}
