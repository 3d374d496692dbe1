//! Activity (group) model.
//!
//! An activity is a time-boxed unit of the event schedule. Top-level
//! activities usually represent a whole round in one room; their child
//! activities are the groups people are assigned into.
//!
//! # Activity codes
//!
//! Codes are structured as `<event>[-r<round>][-g<group>][-a<attempt>]`,
//! e.g. `333-r1` (round 1 of 3x3x3), `333-r1-g2` (its second group) or
//! `333fm-r1-a2` (second attempt of fewest moves). Round and group numbers may
//! be absent for coarser codes. Codes of non-event activities (`other-lunch`)
//! are kept whole as the event id.
//!
//! # Conflicts
//! Two activities conflict iff their half-open intervals overlap:
//! `a.start < b.end && b.start < a.end`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::extension::{ExtensionValue, Extensions, FEATURED_NAMESPACE};
use super::PersonId;
use crate::error::AssignmentError;

/// Opaque activity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub u32);

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Structured activity code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActivityCode {
    /// Event identifier (e.g. "333", "other").
    pub event_id: String,
    /// Round number (1-based).
    pub round: Option<u32>,
    /// Group number (1-based).
    pub group: Option<u32>,
    /// Attempt number (1-based), for events held one attempt at a time.
    pub attempt: Option<u32>,
}

impl ActivityCode {
    /// Creates an event-level code.
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            round: None,
            group: None,
            attempt: None,
        }
    }

    /// Creates a round code (`<event>-r<n>`).
    pub fn round(event_id: impl Into<String>, round: u32) -> Self {
        Self::new(event_id).with_round(round)
    }

    /// Sets the round number.
    pub fn with_round(mut self, round: u32) -> Self {
        self.round = Some(round);
        self
    }

    /// Sets the group number.
    pub fn with_group(mut self, group: u32) -> Self {
        self.group = Some(group);
        self
    }

    /// Sets the attempt number.
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    /// Parses a code string.
    pub fn parse(code: &str) -> Result<Self, AssignmentError> {
        let invalid = |reason: &str| AssignmentError::InvalidActivityCode {
            code: code.to_string(),
            reason: reason.to_string(),
        };

        if code.starts_with("other-") {
            return Ok(Self::new(code));
        }

        let mut parts = code.split('-');
        let event_id = match parts.next() {
            Some(e) if !e.is_empty() => e,
            _ => return Err(invalid("missing event id")),
        };

        let mut parsed = Self::new(event_id);
        for part in parts {
            let (tag, number) = part.split_at(part.chars().next().map_or(0, char::len_utf8));
            let value: u32 = number
                .parse()
                .map_err(|_| invalid(&format!("bad component '{part}'")))?;
            let slot = match tag {
                "r" => &mut parsed.round,
                "g" => &mut parsed.group,
                "a" => &mut parsed.attempt,
                _ => return Err(invalid(&format!("unknown component '{part}'"))),
            };
            if slot.replace(value).is_some() {
                return Err(invalid(&format!("repeated component '{tag}'")));
            }
        }
        Ok(parsed)
    }

    /// The round-level code (event + round only).
    pub fn round_code(&self) -> Self {
        Self {
            event_id: self.event_id.clone(),
            round: self.round,
            group: None,
            attempt: None,
        }
    }

    /// Whether this code lies inside `round`, optionally narrowed to `attempt`.
    ///
    /// Activities without an attempt component belong to every attempt.
    pub fn belongs_to_round(&self, round: &ActivityCode, attempt: Option<u32>) -> bool {
        self.event_id == round.event_id
            && self.round.is_some()
            && self.round == round.round
            && match (attempt, self.attempt) {
                (Some(wanted), Some(own)) => wanted == own,
                _ => true,
            }
    }
}

impl fmt::Display for ActivityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.event_id)?;
        if let Some(r) = self.round {
            write!(f, "-r{r}")?;
        }
        if let Some(g) = self.group {
            write!(f, "-g{g}")?;
        }
        if let Some(a) = self.attempt {
            write!(f, "-a{a}")?;
        }
        Ok(())
    }
}

impl FromStr for ActivityCode {
    type Err = AssignmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ActivityCode {
    type Error = AssignmentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ActivityCode> for String {
    fn from(code: ActivityCode) -> Self {
        code.to_string()
    }
}

/// A half-open time interval [start, end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSpan {
    /// Interval start (inclusive).
    pub start: DateTime<Utc>,
    /// Interval end (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeSpan {
    /// Creates a new span.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Length of the span.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether two spans overlap.
    #[inline]
    pub fn overlaps(&self, other: &TimeSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether one span ends where the other starts, within `tolerance`.
    pub fn is_adjacent_to(&self, other: &TimeSpan, tolerance: Duration) -> bool {
        (self.end - other.start).abs() <= tolerance || (other.end - self.start).abs() <= tolerance
    }
}

/// A scheduled activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Unique activity identifier.
    pub id: ActivityId,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Structured activity code.
    pub activity_code: ActivityCode,
    /// Containing room or stage.
    #[serde(default)]
    pub room: String,
    /// Start instant.
    pub start_time: DateTime<Utc>,
    /// End instant.
    pub end_time: DateTime<Utc>,
    /// Sub-activities (groups).
    #[serde(default)]
    pub child_activities: Vec<Activity>,
    /// Extension data.
    #[serde(default)]
    pub extensions: Extensions,
}

impl Activity {
    /// Creates a new activity.
    pub fn new(
        id: u32,
        code: ActivityCode,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActivityId(id),
            name: code.to_string(),
            activity_code: code,
            room: String::new(),
            start_time,
            end_time,
            child_activities: Vec::new(),
            extensions: Extensions::new(),
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the room, including on all child activities.
    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.set_room(&room.into());
        self
    }

    /// Adds a child activity. The child inherits this activity's room.
    pub fn with_child(mut self, mut child: Activity) -> Self {
        if !self.room.is_empty() {
            child.set_room(&self.room);
        }
        self.child_activities.push(child);
        self
    }

    fn set_room(&mut self, room: &str) {
        self.room = room.to_string();
        for child in &mut self.child_activities {
            child.set_room(room);
        }
    }

    /// The activity's time interval.
    pub fn span(&self) -> TimeSpan {
        TimeSpan::new(self.start_time, self.end_time)
    }

    /// Length of the activity.
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Whether this activity overlaps `other` in time.
    pub fn conflicts(&self, other: &Activity) -> bool {
        self.span().overlaps(&other.span())
    }

    /// Person ids marked as featured competitors of this activity.
    pub fn featured_competitors(&self) -> Vec<PersonId> {
        self.extensions
            .get(FEATURED_NAMESPACE)
            .and_then(|v| v.as_list())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_f64())
                    .map(|n| PersonId(n as u32))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Marks a person as a featured competitor (idempotent).
    pub fn add_featured_competitor(&mut self, person: PersonId) {
        let slot = self
            .extensions
            .get_or_insert_with(FEATURED_NAMESPACE, ExtensionValue::empty_list);
        if !matches!(slot, ExtensionValue::List(_)) {
            *slot = ExtensionValue::empty_list();
        }
        if let ExtensionValue::List(items) = slot {
            let value = ExtensionValue::from(person.0);
            if !items.contains(&value) {
                items.push(value);
            }
        }
    }

    /// Removes every featured competitor mark.
    pub fn clear_featured_competitors(&mut self) {
        self.extensions.remove(FEATURED_NAMESPACE);
    }
}
