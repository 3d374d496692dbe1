//! Competition snapshot.
//!
//! The snapshot is supplied by the external data store and mutated in place
//! by the engines. Its schedule is organised venues → rooms → activities,
//! with each round activity owning its groups as child activities. Event data
//! lists the rounds and, for each round, who has a result recorded in it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Activity, ActivityCode, ActivityId, Assignment, Person, PersonId, TimeSpan};
use crate::error::{AssignmentError, AssignmentResult};

/// A venue with its rooms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    /// Venue name.
    pub name: String,
    /// IANA time zone the schedule is anchored to.
    #[serde(default)]
    pub timezone: String,
    /// Rooms (stages).
    #[serde(default)]
    pub rooms: Vec<Room>,
}

/// A room (stage) with its activities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Room name.
    pub name: String,
    /// Top-level activities held in this room.
    #[serde(default)]
    pub activities: Vec<Activity>,
}

/// An event and its rounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event identifier.
    pub id: String,
    /// Rounds, in order.
    #[serde(default)]
    pub rounds: Vec<Round>,
}

/// A round and its recorded results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    /// Round code (`<event>-r<n>`).
    pub id: ActivityCode,
    /// People with a result recorded in this round.
    #[serde(default)]
    pub results: Vec<RoundResult>,
}

/// One person's entry in a round.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    /// The person.
    pub person_id: PersonId,
    /// Final ranking, once known.
    #[serde(default)]
    pub ranking: Option<u32>,
}

/// The full competition data set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competition {
    /// Competition identifier.
    #[serde(default)]
    pub id: String,
    /// Venues and their schedule.
    #[serde(default)]
    pub venues: Vec<Venue>,
    /// Events and rounds.
    #[serde(default)]
    pub events: Vec<Event>,
    /// Registered people.
    #[serde(default)]
    pub persons: Vec<Person>,
}

impl Room {
    /// Creates an empty room.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            activities: Vec::new(),
        }
    }

    /// Adds an activity, placing it (and its groups) in this room.
    pub fn with_activity(mut self, activity: Activity) -> Self {
        self.activities.push(activity.with_room(self.name.clone()));
        self
    }
}

impl Venue {
    /// Creates an empty venue.
    pub fn new(name: impl Into<String>, timezone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timezone: timezone.into(),
            rooms: Vec::new(),
        }
    }

    /// Adds a room.
    pub fn with_room(mut self, room: Room) -> Self {
        self.rooms.push(room);
        self
    }
}

impl Round {
    /// Creates a round with the given participants.
    pub fn new(id: ActivityCode, people: impl IntoIterator<Item = PersonId>) -> Self {
        Self {
            id,
            results: people
                .into_iter()
                .map(|person_id| RoundResult {
                    person_id,
                    ranking: None,
                })
                .collect(),
        }
    }
}

impl Competition {
    /// Creates an empty competition.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Adds a venue.
    pub fn with_venue(mut self, venue: Venue) -> Self {
        self.venues.push(venue);
        self
    }

    /// Adds a round, creating its event if needed.
    pub fn with_round(mut self, round: Round) -> Self {
        let event_id = round.id.event_id.clone();
        match self.events.iter_mut().find(|e| e.id == event_id) {
            Some(event) => event.rounds.push(round),
            None => self.events.push(Event {
                id: event_id,
                rounds: vec![round],
            }),
        }
        self
    }

    /// Adds a person.
    pub fn with_person(mut self, person: Person) -> Self {
        self.persons.push(person);
        self
    }

    /// Every activity, top-level and nested, in schedule order.
    pub fn activities(&self) -> Vec<&Activity> {
        fn walk<'a>(activity: &'a Activity, out: &mut Vec<&'a Activity>) {
            out.push(activity);
            for child in &activity.child_activities {
                walk(child, out);
            }
        }

        let mut out = Vec::new();
        for room in self.venues.iter().flat_map(|v| &v.rooms) {
            for activity in &room.activities {
                walk(activity, &mut out);
            }
        }
        out
    }

    /// Finds an activity by id.
    pub fn activity(&self, id: ActivityId) -> Option<&Activity> {
        self.activities().into_iter().find(|a| a.id == id)
    }

    /// Finds an activity by id, mutably.
    pub fn activity_mut(&mut self, id: ActivityId) -> Option<&mut Activity> {
        fn find(activities: &mut [Activity], id: ActivityId) -> Option<&mut Activity> {
            for activity in activities {
                if activity.id == id {
                    return Some(activity);
                }
                if let Some(found) = find(&mut activity.child_activities, id) {
                    return Some(found);
                }
            }
            None
        }

        self.venues
            .iter_mut()
            .flat_map(|v| v.rooms.iter_mut())
            .find_map(|room| find(&mut room.activities, id))
    }

    /// Builds an id → time span index over all activities.
    pub fn activity_index(&self) -> ActivityIndex {
        ActivityIndex {
            spans: self.activities().into_iter().map(|a| (a.id, a.span())).collect(),
        }
    }

    /// Finds a round by its code.
    pub fn round(&self, code: &ActivityCode) -> Option<&Round> {
        let wanted = code.round_code();
        self.events
            .iter()
            .filter(|e| e.id == wanted.event_id)
            .flat_map(|e| &e.rounds)
            .find(|r| r.id.round_code() == wanted)
    }

    /// Resolves the groups of a round, optionally narrowed to one attempt.
    ///
    /// Groups are the child activities of every top-level activity belonging
    /// to the round. Fails with `UnknownRound` when the round has neither
    /// event data nor any scheduled activity.
    pub fn round_groups(
        &self,
        round: &ActivityCode,
        attempt: Option<u32>,
    ) -> AssignmentResult<Vec<ActivityId>> {
        let round_activities: Vec<&Activity> = self
            .venues
            .iter()
            .flat_map(|v| &v.rooms)
            .flat_map(|r| &r.activities)
            .filter(|a| a.activity_code.belongs_to_round(round, attempt))
            .collect();

        if round_activities.is_empty() && self.round(round).is_none() {
            return Err(AssignmentError::UnknownRound(round.clone()));
        }

        Ok(round_activities
            .iter()
            .flat_map(|a| &a.child_activities)
            .filter(|g| g.activity_code.belongs_to_round(round, attempt))
            .map(|g| g.id)
            .collect())
    }

    /// Finds a person by id.
    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.persons.iter().find(|p| p.registrant_id == id)
    }

    /// Finds a person by id, mutably.
    pub fn person_mut(&mut self, id: PersonId) -> Option<&mut Person> {
        self.persons.iter_mut().find(|p| p.registrant_id == id)
    }

    /// Position of every person in `persons`, for O(1) lookups.
    pub fn person_positions(&self) -> HashMap<PersonId, usize> {
        self.persons
            .iter()
            .enumerate()
            .map(|(i, p)| (p.registrant_id, i))
            .collect()
    }
}

/// Time spans of every activity, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ActivityIndex {
    spans: HashMap<ActivityId, TimeSpan>,
}

impl ActivityIndex {
    /// Time span of an activity.
    pub fn span(&self, id: ActivityId) -> Option<TimeSpan> {
        self.spans.get(&id).copied()
    }

    /// Whether two activities overlap in time. Unknown ids never conflict.
    pub fn conflicts(&self, a: ActivityId, b: ActivityId) -> bool {
        match (self.spans.get(&a), self.spans.get(&b)) {
            (Some(x), Some(y)) => x.overlaps(y),
            _ => false,
        }
    }

    /// Whether any of `assignments` lies in an activity overlapping `span`.
    pub fn any_conflict(&self, assignments: &[Assignment], span: &TimeSpan) -> bool {
        assignments
            .iter()
            .filter_map(|a| self.spans.get(&a.activity_id))
            .any(|s| s.overlaps(span))
    }

    /// Number of indexed activities.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{at, group, round_activity};

    fn sample() -> Competition {
        let r1 = round_activity(10, "333", 1, at(9, 0), at(10, 0))
            .with_child(group(11, "333", 1, 1, at(9, 0), at(9, 30)))
            .with_child(group(12, "333", 1, 2, at(9, 30), at(10, 0)));
        let r2 = round_activity(20, "333", 2, at(13, 0), at(14, 0))
            .with_child(group(21, "333", 2, 1, at(13, 0), at(14, 0)));
        Competition::new("Test Open")
            .with_venue(
                Venue::new("Hall", "Europe/Berlin")
                    .with_room(Room::new("Main").with_activity(r1).with_activity(r2)),
            )
            .with_round(Round::new(ActivityCode::round("333", 1), [PersonId(1), PersonId(2)]))
            .with_round(Round::new(ActivityCode::round("333", 2), []))
            .with_person(Person::new(1, "Ana"))
            .with_person(Person::new(2, "Ben"))
    }

    #[test]
    fn test_activity_lookup() {
        let mut c = sample();
        assert_eq!(c.activities().len(), 5);
        assert_eq!(c.activity(ActivityId(12)).map(|a| a.room.as_str()), Some("Main"));
        assert!(c.activity(ActivityId(99)).is_none());

        c.activity_mut(ActivityId(21)).unwrap().name = "Final".into();
        assert_eq!(c.activity(ActivityId(21)).unwrap().name, "Final");
    }

    #[test]
    fn test_round_groups() {
        let c = sample();
        let groups = c.round_groups(&ActivityCode::round("333", 1), None).unwrap();
        assert_eq!(groups, vec![ActivityId(11), ActivityId(12)]);

        let err = c.round_groups(&ActivityCode::round("444", 1), None).unwrap_err();
        assert!(matches!(err, AssignmentError::UnknownRound(_)));
    }

    #[test]
    fn test_round_groups_need_event_data_or_activities() {
        // event data without scheduled activities
        let c = sample().with_round(Round::new(ActivityCode::round("333", 3), []));
        let groups = c.round_groups(&ActivityCode::round("333", 3), None).unwrap();
        assert!(groups.is_empty());

        // scheduled activities without event data
        let unlisted = round_activity(30, "555", 1, at(15, 0), at(16, 0))
            .with_child(group(31, "555", 1, 1, at(15, 0), at(16, 0)));
        let c = Competition::new("Unlisted")
            .with_venue(Venue::new("Hall", "UTC").with_room(Room::new("Main").with_activity(unlisted)));
        let groups = c.round_groups(&ActivityCode::round("555", 1), None).unwrap();
        assert_eq!(groups, vec![ActivityId(31)]);
    }

    #[test]
    fn test_round_lookup_ignores_group_component() {
        let c = sample();
        let code = ActivityCode::round("333", 1).with_group(2);
        assert_eq!(c.round(&code).map(|r| r.results.len()), Some(2));
    }

    #[test]
    fn test_activity_index_conflicts() {
        let c = sample();
        let index = c.activity_index();
        assert_eq!(index.len(), 5);
        assert!(index.conflicts(ActivityId(10), ActivityId(11)));
        assert!(!index.conflicts(ActivityId(11), ActivityId(12)));
        assert!(!index.conflicts(ActivityId(11), ActivityId(404)));

        let held = vec![Assignment::competitor(ActivityId(11))];
        let span = index.span(ActivityId(12)).unwrap();
        assert!(!index.any_conflict(&held, &span));
        let span = index.span(ActivityId(10)).unwrap();
        assert!(index.any_conflict(&held, &span));
    }

    #[test]
    fn test_snapshot_json_round_trip() {
        let c = sample();
        let json = serde_json::to_string(&c).unwrap();
        let back: Competition = serde_json::from_str(&json).unwrap();
        assert_eq!(back.activities().len(), 5);
        assert_eq!(back.persons.len(), 2);
        assert_eq!(back.events[0].rounds.len(), 2);
    }
}
