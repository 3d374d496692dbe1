//! Shared test fixtures.

use chrono::{DateTime, TimeZone, Utc};

use crate::models::{
    Activity, ActivityCode, Competition, Person, PersonId, ResultKind, Room, Round, Venue,
};

/// An instant on the fixture day.
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0)
        .single()
        .unwrap_or_else(|| panic!("invalid fixture time {hour}:{minute}"))
}

/// A top-level round activity.
pub fn round_activity(
    id: u32,
    event: &str,
    round: u32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Activity {
    Activity::new(id, ActivityCode::round(event, round), start, end)
}

/// A group (child activity) of a round.
pub fn group(
    id: u32,
    event: &str,
    round: u32,
    group: u32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Activity {
    Activity::new(id, ActivityCode::round(event, round).with_group(group), start, end)
}

/// A `333-r1` round (activity 100) with `groups` consecutive 30-minute groups
/// (ids 101..) and `people` competitors (ids 1..) with distinct averages.
pub fn round_competition(people: u32, groups: u32) -> Competition {
    let mut round = round_activity(100, "333", 1, at(9, 0), at(9 + groups, 0));
    for g in 1..=groups {
        let start = at(9, 0) + chrono::Duration::minutes(30 * (g as i64 - 1));
        let end = start + chrono::Duration::minutes(30);
        round = round.with_child(group(100 + g, "333", 1, g, start, end));
    }

    let mut competition = Competition::new("Fixture Open")
        .with_venue(Venue::new("Hall", "UTC").with_room(Room::new("Main").with_activity(round)))
        .with_round(Round::new(
            ActivityCode::round("333", 1),
            (1..=people).map(PersonId),
        ));
    for id in 1..=people {
        competition = competition.with_person(
            Person::new(id, format!("Person {id}"))
                .with_personal_best("333", ResultKind::Average, 1000 + i64::from(id) * 10),
        );
    }
    competition
}

/// A room of standalone staffed activities (ids as given, one hour each from
/// the given hours) and `people` unassigned people.
pub fn staff_competition(activities: &[(u32, u32)], people: u32) -> Competition {
    let mut room = Room::new("Main");
    for &(id, hour) in activities {
        room = room.with_activity(round_activity(id, "333", id, at(hour, 0), at(hour + 1, 0)));
    }
    let mut competition =
        Competition::new("Staff Open").with_venue(Venue::new("Hall", "UTC").with_room(room));
    for id in 1..=people {
        competition = competition.with_person(Person::new(id, format!("Staff {id}")));
    }
    competition
}
