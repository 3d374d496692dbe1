//! Filter-based flat bonus.

use super::{GroupScorer, ScoringContext, StaffScorer};
use crate::filter::{any_activity, any_person, ActivityFilter, PersonFilter};
use crate::models::{Activity, Person};

/// Adds a flat score when the person and activity filters both match.
///
/// Used by both engines; for staff, an optional job name narrows the bonus
/// to one job.
pub struct FilterScorer {
    score: f64,
    person_filter: PersonFilter,
    activity_filter: ActivityFilter,
    job: Option<String>,
}

impl FilterScorer {
    /// Creates a scorer that matches everything.
    pub fn new(score: f64) -> Self {
        Self {
            score,
            person_filter: any_person(),
            activity_filter: any_activity(),
            job: None,
        }
    }

    /// Restricts the bonus to people passing `filter`.
    pub fn with_person_filter(mut self, filter: PersonFilter) -> Self {
        self.person_filter = filter;
        self
    }

    /// Restricts the bonus to activities passing `filter`.
    pub fn with_activity_filter(mut self, filter: ActivityFilter) -> Self {
        self.activity_filter = filter;
        self
    }

    /// Restricts the bonus to one staff job.
    pub fn with_job(mut self, job: impl Into<String>) -> Self {
        self.job = Some(job.into());
        self
    }

    fn matches(&self, person: &Person, activity: &Activity) -> bool {
        (self.person_filter)(person) && (self.activity_filter)(activity)
    }
}

impl GroupScorer for FilterScorer {
    fn name(&self) -> &str {
        "filter"
    }

    fn score(
        &mut self,
        _ctx: &ScoringContext<'_>,
        person: &Person,
        group: &Activity,
        _mates: &[&Person],
    ) -> f64 {
        if self.matches(person, group) {
            self.score
        } else {
            0.0
        }
    }
}

impl StaffScorer for FilterScorer {
    fn name(&self) -> &str {
        "filter"
    }

    fn score(
        &mut self,
        _ctx: &ScoringContext<'_>,
        person: &Person,
        activity: &Activity,
        job: &str,
        _station: Option<u32>,
    ) -> f64 {
        let job_matches = self.job.as_deref().map_or(true, |j| j == job);
        if job_matches && self.matches(person, activity) {
            self.score
        } else {
            0.0
        }
    }
}
