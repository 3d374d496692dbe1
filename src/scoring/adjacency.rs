//! Adjacency staff scorer.

use chrono::Duration;

use super::{ScoringContext, StaffScorer};
use crate::models::{Activity, Person};

/// Flat score for duty that starts as the person's own competing ends, or
/// ends as it starts (within `tolerance`).
///
/// A positive score keeps people near the stage they compete on; a negative
/// one gives them a break around their own groups.
#[derive(Debug, Clone)]
pub struct AdjacencyScorer {
    score: f64,
    tolerance: Duration,
}

impl AdjacencyScorer {
    /// Creates a scorer with exact-match tolerance.
    pub fn new(score: f64) -> Self {
        Self {
            score,
            tolerance: Duration::zero(),
        }
    }

    /// Sets how far apart boundaries may be and still count as adjacent.
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl StaffScorer for AdjacencyScorer {
    fn name(&self) -> &str {
        "adjacency"
    }

    fn score(
        &mut self,
        ctx: &ScoringContext<'_>,
        person: &Person,
        activity: &Activity,
        _job: &str,
        _station: Option<u32>,
    ) -> f64 {
        let span = activity.span();
        let adjacent = person
            .competing_in()
            .filter_map(|id| ctx.index.span(id))
            .any(|own| !own.overlaps(&span) && own.is_adjacent_to(&span, self.tolerance));
        if adjacent {
            self.score
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityId, Assignment};
    use crate::testing::staff_competition;

    #[test]
    fn test_adjacent_to_competing() {
        // activities 1 (9-10), 2 (10-11), 3 (12-13)
        let c = staff_competition(&[(1, 9), (2, 10), (3, 12)], 0);
        let index = c.activity_index();
        let ctx = ScoringContext::new(&index);
        let competitor = Person::new(1, "Ana").with_assignment(Assignment::competitor(ActivityId(1)));

        let mut scorer = AdjacencyScorer::new(2.0);
        let next = c.activity(ActivityId(2)).unwrap();
        let later = c.activity(ActivityId(3)).unwrap();
        assert_eq!(scorer.score(&ctx, &competitor, next, "judge", None), 2.0);
        assert_eq!(scorer.score(&ctx, &competitor, later, "judge", None), 0.0);

        let mut lenient = AdjacencyScorer::new(2.0).with_tolerance(Duration::hours(2));
        assert_eq!(lenient.score(&ctx, &competitor, later, "judge", None), 2.0);
    }
}
