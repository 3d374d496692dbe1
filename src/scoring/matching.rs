//! Match-count scorer.

use std::sync::Arc;

use super::{GroupScorer, ScoreCache, ScoringContext};
use crate::models::{Activity, Person, PersonId};

/// Extracts the value people are matched on.
pub type ValueFn = Arc<dyn Fn(&Person) -> Option<String> + Send + Sync>;

/// Rewards placing a person with group mates that share their value
/// (same country, same club, ...).
///
/// `score × min(limit, matching mates)`. A negative `score` spreads people
/// apart instead. People without a value never match.
pub struct MatchingValueScorer {
    value: ValueFn,
    score: f64,
    limit: usize,
    cache: ScoreCache<PersonId, Option<String>>,
}

impl MatchingValueScorer {
    /// Creates a scorer with no limit.
    pub fn new(value: ValueFn, score: f64) -> Self {
        Self {
            value,
            score,
            limit: usize::MAX,
            cache: ScoreCache::new(),
        }
    }

    /// Scorer reading a string (or numeric) custom property.
    pub fn by_property(name: impl Into<String>, score: f64) -> Self {
        let name = name.into();
        Self::new(
            Arc::new(move |p: &Person| {
                p.property(&name)
                    .filter(|v| v.is_truthy())
                    .map(|v| v.key_string())
            }),
            score,
        )
    }

    /// Caps the number of matching mates that count.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    fn value_of(&mut self, person: &Person) -> Option<String> {
        let value = &self.value;
        self.cache
            .get_or_compute(person.registrant_id, || value(person))
    }
}

impl GroupScorer for MatchingValueScorer {
    fn name(&self) -> &str {
        "matching-value"
    }

    fn score(
        &mut self,
        _ctx: &ScoringContext<'_>,
        person: &Person,
        _group: &Activity,
        mates: &[&Person],
    ) -> f64 {
        let Some(own) = self.value_of(person) else {
            return 0.0;
        };
        let matches = mates
            .iter()
            .filter(|m| m.registrant_id != person.registrant_id)
            .filter(|m| self.value_of(m).as_deref() == Some(own.as_str()))
            .count();
        self.score * matches.min(self.limit) as f64
    }
}
