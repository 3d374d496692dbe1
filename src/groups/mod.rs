//! Competitor group assignment.
//!
//! Places the competitors of one round into its groups. Candidates are
//! processed per [`AssignmentSet`], in the order the sets are supplied; each
//! set is solved as a sequence of small ILPs that fill the set's groups one
//! person per group per iteration, so people spread evenly instead of the
//! first group filling up in one shot.
//!
//! # Usage
//!
//! ```
//! use u_assign::groups::{AssignmentSet, GroupAssigner, GroupAssignmentRequest};
//! use u_assign::models::{ActivityCode, Competition};
//! use u_assign::timing::Timings;
//!
//! let mut competition = Competition::new("Empty Open");
//! let request = GroupAssignmentRequest::new(ActivityCode::round("333", 1))
//!     .with_set(AssignmentSet::new("everyone"));
//! let result = GroupAssigner::new().assign(&mut competition, request, &mut Timings::new());
//! assert!(result.is_err()); // no such round
//! ```
//!
//! # Reference
//! Burkard, Dell'Amico & Martello (2012), "Assignment Problems", Ch. 5

mod engine;
mod station;

pub use engine::{GroupAssigner, GroupAssignmentOutcome, GroupAssignmentRequest, GroupMember};
pub use station::{StationMode, StationRule};

use std::fmt;

use crate::filter::{any_activity, any_person, ActivityFilter, PersonFilter};

/// A filtered population/group pairing processed as one optimization phase.
#[derive(Clone)]
pub struct AssignmentSet {
    /// Set name (used in warnings and logs).
    pub name: String,
    /// Which people belong to this set.
    pub person_filter: PersonFilter,
    /// Which groups this set may use.
    pub group_filter: ActivityFilter,
    /// Whether members are marked as featured competitors of their group.
    pub featured: bool,
}

impl AssignmentSet {
    /// Creates a set covering every person and every group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            person_filter: any_person(),
            group_filter: any_activity(),
            featured: false,
        }
    }

    /// Restricts the set to people passing `filter`.
    pub fn with_person_filter(mut self, filter: PersonFilter) -> Self {
        self.person_filter = filter;
        self
    }

    /// Restricts the set to groups passing `filter`.
    pub fn with_group_filter(mut self, filter: ActivityFilter) -> Self {
        self.group_filter = filter;
        self
    }

    /// Marks the set's members as featured competitors.
    pub fn featured(mut self) -> Self {
        self.featured = true;
        self
    }
}

impl fmt::Debug for AssignmentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssignmentSet")
            .field("name", &self.name)
            .field("featured", &self.featured)
            .finish_non_exhaustive()
    }
}
