//! Recency-based staff scorer.

use chrono::Duration;

use super::{ScoreCache, ScoringContext, StaffScorer};
use crate::models::{Activity, ActivityId, Person, PersonId};

/// Penalizes giving duty to someone who just finished another duty.
///
/// Every staff assignment ending at most `window` before the activity starts
/// contributes `-weight × (1 − gap / window)`, so duty ending right at the
/// start costs the full weight and duty ending `window` earlier costs nothing.
#[derive(Debug, Clone)]
pub struct RecencyScorer {
    weight: f64,
    window: Duration,
    cache: ScoreCache<(PersonId, ActivityId), f64>,
}

impl RecencyScorer {
    /// Creates a scorer.
    pub fn new(weight: f64, window: Duration) -> Self {
        Self {
            weight,
            window,
            cache: ScoreCache::new(),
        }
    }
}

impl StaffScorer for RecencyScorer {
    fn name(&self) -> &str {
        "recency"
    }

    fn score(
        &mut self,
        ctx: &ScoringContext<'_>,
        person: &Person,
        activity: &Activity,
        _job: &str,
        _station: Option<u32>,
    ) -> f64 {
        let (weight, window) = (self.weight, self.window);
        self.cache
            .get_or_compute((person.registrant_id, activity.id), || {
                recency_penalty(ctx, person, activity, weight, window)
            })
    }
}

fn recency_penalty(
    ctx: &ScoringContext<'_>,
    person: &Person,
    activity: &Activity,
    weight: f64,
    window: Duration,
) -> f64 {
    let window_ms = window.num_milliseconds();
    if window_ms <= 0 {
        return 0.0;
    }
    person
        .staff_assignments()
        .filter(|a| a.activity_id != activity.id)
        .filter_map(|a| ctx.index.span(a.activity_id))
        .map(|span| (activity.start_time - span.end).num_milliseconds())
        .filter(|&gap| (0..window_ms).contains(&gap))
        .map(|gap| -weight * (1.0 - gap as f64 / window_ms as f64))
        .sum()
}
