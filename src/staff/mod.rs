//! Staff job assignment.
//!
//! Gives volunteers named jobs (judge, scrambler, runner, ...) during a list
//! of activities. Each activity is an independent ILP: every job slot must
//! be filled and nobody holds two jobs at once. Activities are solved in the
//! order given and committed one by one, so later activities see the duty
//! handed out earlier (for conflict checks and recency scoring).

mod engine;

pub use engine::{StaffAssigner, StaffAssignmentOutcome, StaffAssignmentRequest, StaffMember};

use std::fmt;

use crate::filter::{any_person, PersonFilter};

/// A staff job to fill during each activity.
#[derive(Clone)]
pub struct Job {
    /// Job name; assignments are recorded as `staff-<name>`.
    pub name: String,
    /// Number of people required.
    pub count: u32,
    /// Whether each slot is a distinct station (1..=count).
    pub per_station: bool,
    /// Who may take this job.
    pub eligibility: PersonFilter,
}

impl Job {
    /// Creates a job with interchangeable slots, open to everyone.
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
            per_station: false,
            eligibility: any_person(),
        }
    }

    /// Makes every slot a numbered station.
    pub fn per_station(mut self) -> Self {
        self.per_station = true;
        self
    }

    /// Restricts the job to people passing `filter`.
    pub fn with_eligibility(mut self, filter: PersonFilter) -> Self {
        self.eligibility = filter;
        self
    }

    /// Sub-roles of this job: one per station, or a single shared one.
    pub(crate) fn stations(&self) -> Vec<Option<u32>> {
        if self.per_station {
            (1..=self.count).map(Some).collect()
        } else {
            vec![None]
        }
    }

    /// People each sub-role requires.
    pub(crate) fn slot_size(&self) -> u32 {
        if self.per_station {
            1
        } else {
            self.count
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .field("count", &self.count)
            .field("per_station", &self.per_station)
            .finish_non_exhaustive()
    }
}
