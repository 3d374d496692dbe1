//! Preference-balance staff scorer.

use super::{ScoringContext, StaffScorer};
use crate::models::{Activity, Person};

/// Steers each person's job mix toward their stated preferences.
///
/// Preferences are a map property of job name → relative weight. The score
/// is `weight × (preferred share − current share)` for the job, where the
/// current share is that job's fraction of the person's staff assignments.
/// A job someone prefers but has not done yet scores high; a job they
/// already do more often than preferred scores negative.
#[derive(Debug, Clone)]
pub struct PreferenceScorer {
    property: String,
    weight: f64,
}

impl PreferenceScorer {
    /// Creates a scorer reading preferences from `property`.
    pub fn new(property: impl Into<String>, weight: f64) -> Self {
        Self {
            property: property.into(),
            weight,
        }
    }

    fn preferred_share(&self, person: &Person, job: &str) -> Option<f64> {
        let prefs = person.property(&self.property)?.as_map()?;
        let total: f64 = prefs
            .values()
            .filter_map(|v| v.as_f64())
            .filter(|v| *v > 0.0)
            .sum();
        if total <= 0.0 {
            return None;
        }
        let own = prefs
            .get(job)
            .and_then(|v| v.as_f64())
            .filter(|v| *v > 0.0)
            .unwrap_or(0.0);
        Some(own / total)
    }
}

impl StaffScorer for PreferenceScorer {
    fn name(&self) -> &str {
        "preference"
    }

    fn score(
        &mut self,
        _ctx: &ScoringContext<'_>,
        person: &Person,
        _activity: &Activity,
        job: &str,
        _station: Option<u32>,
    ) -> f64 {
        let Some(preferred) = self.preferred_share(person, job) else {
            return 0.0;
        };
        let (done, total) = person
            .staff_assignments()
            .fold((0usize, 0usize), |(done, total), a| {
                let hit = usize::from(a.assignment_code.job() == Some(job));
                (done + hit, total + 1)
            });
        let current = if total == 0 {
            0.0
        } else {
            done as f64 / total as f64
        };
        self.weight * (preferred - current)
    }
}
