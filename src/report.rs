//! Post-run assignment audit.
//!
//! Summarizes a competition snapshot after the engines have run.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Competitors per activity | Competitor assignments held in each activity |
//! | Staff load | Staff assignments held by each person |
//! | Conflicts | Pairs of one person's assignments whose activities overlap |
//! | Size spread | Largest minus smallest competitor count over a set of groups |

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{ActivityId, Competition, PersonId};

/// Two overlapping assignments held by one person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentConflict {
    /// The person.
    pub person_id: PersonId,
    /// Activity of the earlier-listed assignment.
    pub first: ActivityId,
    /// Activity of the later-listed assignment.
    pub second: ActivityId,
}

/// Assignment audit of a snapshot.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentReport {
    /// Competitor count per activity (only activities with competitors).
    pub competitors_by_activity: BTreeMap<ActivityId, usize>,
    /// Staff assignment count per person (only people with staff duty).
    pub staff_by_person: BTreeMap<PersonId, usize>,
    /// Every time conflict.
    pub conflicts: Vec<AssignmentConflict>,
}

impl AssignmentReport {
    /// Audits a snapshot.
    pub fn calculate(competition: &Competition) -> Self {
        let index = competition.activity_index();
        let mut report = Self::default();

        for person in &competition.persons {
            for (i, a) in person.assignments.iter().enumerate() {
                if a.is_competitor() {
                    *report.competitors_by_activity.entry(a.activity_id).or_insert(0) += 1;
                } else if a.assignment_code.is_staff() {
                    *report.staff_by_person.entry(person.registrant_id).or_insert(0) += 1;
                }
                for b in &person.assignments[i + 1..] {
                    if index.conflicts(a.activity_id, b.activity_id) {
                        report.conflicts.push(AssignmentConflict {
                            person_id: person.registrant_id,
                            first: a.activity_id,
                            second: b.activity_id,
                        });
                    }
                }
            }
        }
        report
    }

    /// Whether nobody holds two overlapping assignments.
    pub fn is_conflict_free(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Competitors in one activity.
    pub fn competitors(&self, activity: ActivityId) -> usize {
        self.competitors_by_activity.get(&activity).copied().unwrap_or(0)
    }

    /// Largest minus smallest competitor count over `activities`.
    pub fn size_spread(&self, activities: &[ActivityId]) -> usize {
        let sizes = activities.iter().map(|&a| self.competitors(a));
        match (sizes.clone().max(), sizes.min()) {
            (Some(max), Some(min)) => max - min,
            _ => 0,
        }
    }

    /// Total staff assignments.
    pub fn total_staff_assignments(&self) -> usize {
        self.staff_by_person.values().sum()
    }
}
