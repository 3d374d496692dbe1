//! Person and assignment model.
//!
//! A person is anyone who can be placed into an activity: competitors and
//! staff volunteers alike. Assignments are recorded on the person as an
//! ordered list and are only ever appended to (or stripped on overwrite) by
//! the engines.
//!
//! # Assignment codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | `competitor` | Competes in the activity |
//! | `staff-<job>` | Works the named job during the activity |
//! | anything else | Externally defined, treated as an opaque fixed fact |

use serde::{Deserialize, Serialize};
use std::fmt;

use super::extension::{ExtensionValue, Extensions, PROPERTIES_NAMESPACE};
use super::ActivityId;

/// Opaque person identifier (registrant id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub u32);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role code of an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssignmentCode {
    /// `competitor`
    Competitor,
    /// `staff-<job>`
    Staff(String),
    /// Any externally defined code.
    Other(String),
}

const STAFF_PREFIX: &str = "staff-";

impl AssignmentCode {
    /// Creates a staff code for a job.
    pub fn staff(job: impl Into<String>) -> Self {
        Self::Staff(job.into())
    }

    /// Whether this is a staff code (any job).
    pub fn is_staff(&self) -> bool {
        matches!(self, Self::Staff(_))
    }

    /// Job name of a staff code.
    pub fn job(&self) -> Option<&str> {
        match self {
            Self::Staff(job) => Some(job),
            _ => None,
        }
    }
}

impl fmt::Display for AssignmentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Competitor => write!(f, "competitor"),
            Self::Staff(job) => write!(f, "{STAFF_PREFIX}{job}"),
            Self::Other(code) => write!(f, "{code}"),
        }
    }
}

impl From<String> for AssignmentCode {
    fn from(value: String) -> Self {
        if value == "competitor" {
            Self::Competitor
        } else if let Some(job) = value.strip_prefix(STAFF_PREFIX) {
            Self::Staff(job.to_string())
        } else {
            Self::Other(value)
        }
    }
}

impl From<AssignmentCode> for String {
    fn from(code: AssignmentCode) -> Self {
        code.to_string()
    }
}

/// A person's assignment to an activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// Assigned activity.
    pub activity_id: ActivityId,
    /// Role in the activity.
    pub assignment_code: AssignmentCode,
    /// 1-based station number, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station_number: Option<u32>,
}

impl Assignment {
    /// Creates an assignment.
    pub fn new(activity_id: ActivityId, assignment_code: AssignmentCode) -> Self {
        Self {
            activity_id,
            assignment_code,
            station_number: None,
        }
    }

    /// Creates a competitor assignment.
    pub fn competitor(activity_id: ActivityId) -> Self {
        Self::new(activity_id, AssignmentCode::Competitor)
    }

    /// Creates a staff assignment for a job.
    pub fn staff(activity_id: ActivityId, job: impl Into<String>) -> Self {
        Self::new(activity_id, AssignmentCode::staff(job))
    }

    /// Sets the station number.
    pub fn with_station(mut self, station: Option<u32>) -> Self {
        self.station_number = station;
        self
    }

    /// Whether this is a competitor assignment.
    pub fn is_competitor(&self) -> bool {
        self.assignment_code == AssignmentCode::Competitor
    }
}

/// Result type of a personal best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    /// Best single attempt.
    Single,
    /// Best average.
    Average,
}

/// A personal best in one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalBest {
    /// Event identifier.
    pub event_id: String,
    /// Single or average.
    #[serde(rename = "type")]
    pub kind: ResultKind,
    /// Result value (centiseconds for timed events; lower is better).
    pub best: i64,
}

/// A person registered for the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Registrant identifier.
    pub registrant_id: PersonId,
    /// Global user id, if known.
    #[serde(default)]
    pub user_id: Option<u32>,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Personal bests.
    #[serde(default)]
    pub personal_bests: Vec<PersonalBest>,
    /// Assignments, in the order they were made.
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    /// Extension data.
    #[serde(default)]
    pub extensions: Extensions,
}

impl Person {
    /// Creates a person.
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            registrant_id: PersonId(id),
            user_id: None,
            name: name.into(),
            personal_bests: Vec::new(),
            assignments: Vec::new(),
            extensions: Extensions::new(),
        }
    }

    /// Shorthand for the registrant id.
    #[inline]
    pub fn id(&self) -> PersonId {
        self.registrant_id
    }

    /// Adds a personal best.
    pub fn with_personal_best(mut self, event_id: impl Into<String>, kind: ResultKind, best: i64) -> Self {
        self.personal_bests.push(PersonalBest {
            event_id: event_id.into(),
            kind,
            best,
        });
        self
    }

    /// Adds an assignment.
    pub fn with_assignment(mut self, assignment: Assignment) -> Self {
        self.assignments.push(assignment);
        self
    }

    /// Sets a custom property.
    pub fn with_property(mut self, name: &str, value: impl Into<ExtensionValue>) -> Self {
        self.set_property(name, value.into());
        self
    }

    /// Personal best for an event, if recorded.
    pub fn personal_best(&self, event_id: &str, kind: ResultKind) -> Option<i64> {
        self.personal_bests
            .iter()
            .filter(|pb| pb.event_id == event_id && pb.kind == kind && pb.best > 0)
            .map(|pb| pb.best)
            .min()
    }

    /// Reads a custom property.
    pub fn property(&self, name: &str) -> Option<&ExtensionValue> {
        self.extensions.map_entry(PROPERTIES_NAMESPACE, name)
    }

    /// Writes a custom property.
    pub fn set_property(&mut self, name: &str, value: ExtensionValue) {
        self.extensions.set_map_entry(PROPERTIES_NAMESPACE, name, value);
    }

    /// Activities this person competes in.
    pub fn competing_in(&self) -> impl Iterator<Item = ActivityId> + '_ {
        self.assignments
            .iter()
            .filter(|a| a.is_competitor())
            .map(|a| a.activity_id)
    }

    /// Staff assignments held by this person.
    pub fn staff_assignments(&self) -> impl Iterator<Item = &Assignment> + '_ {
        self.assignments.iter().filter(|a| a.assignment_code.is_staff())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_code_strings() {
        assert_eq!(AssignmentCode::from("competitor".to_string()), AssignmentCode::Competitor);
        assert_eq!(
            AssignmentCode::from("staff-judge".to_string()),
            AssignmentCode::staff("judge")
        );
        assert_eq!(
            AssignmentCode::from("delegate".to_string()),
            AssignmentCode::Other("delegate".into())
        );
        assert_eq!(AssignmentCode::staff("runner").to_string(), "staff-runner");
        assert_eq!(AssignmentCode::staff("runner").job(), Some("runner"));
        assert!(!AssignmentCode::Competitor.is_staff());
    }

    #[test]
    fn test_assignment_json_shape() {
        let a = Assignment::staff(ActivityId(12), "judge").with_station(Some(3));
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"activityId": 12, "assignmentCode": "staff-judge", "stationNumber": 3})
        );
        let plain = serde_json::to_value(Assignment::competitor(ActivityId(4))).unwrap();
        assert!(plain.get("stationNumber").is_none());
    }

    #[test]
    fn test_personal_best_lookup() {
        let p = Person::new(1, "Ana")
            .with_personal_best("333", ResultKind::Single, 950)
            .with_personal_best("333", ResultKind::Average, 1100)
            .with_personal_best("222", ResultKind::Single, 300);
        assert_eq!(p.personal_best("333", ResultKind::Single), Some(950));
        assert_eq!(p.personal_best("333", ResultKind::Average), Some(1100));
        assert_eq!(p.personal_best("444", ResultKind::Single), None);
    }

    #[test]
    fn test_properties() {
        let mut p = Person::new(2, "Ben").with_property("team", "blue");
        assert_eq!(p.property("team").and_then(|v| v.as_str()), Some("blue"));
        p.set_property("team", "green".into());
        assert_eq!(p.property("team").and_then(|v| v.as_str()), Some("green"));
        assert!(p.property("age").is_none());
    }

    #[test]
    fn test_assignment_views() {
        let p = Person::new(3, "Cy")
            .with_assignment(Assignment::competitor(ActivityId(1)))
            .with_assignment(Assignment::staff(ActivityId(2), "judge"))
            .with_assignment(Assignment::competitor(ActivityId(5)));
        assert_eq!(p.competing_in().collect::<Vec<_>>(), vec![ActivityId(1), ActivityId(5)]);
        assert_eq!(p.staff_assignments().count(), 1);
    }
}
