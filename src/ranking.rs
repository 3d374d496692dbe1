//! Seed ranking.
//!
//! The seed ranking orders a round's candidates by personal best and is the
//! universal tie-break of the group engine: queue order, final member order
//! and default station order all follow it.
//!
//! # Ordering
//! 1. Personal-best average in the round's event (ascending, missing last)
//! 2. Personal-best single in the round's event (ascending, missing last)
//! 3. Registrant id (ascending), so the order is total and deterministic

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{AssignmentError, AssignmentResult};
use crate::models::{ActivityCode, Competition, Person, PersonId, ResultKind};

/// A total, deterministic order over people.
#[derive(Debug, Clone, Default)]
pub struct SeedRanking {
    order: Vec<PersonId>,
    position: HashMap<PersonId, usize>,
}

impl SeedRanking {
    /// Ranks everyone with a result recorded in `round`.
    ///
    /// Results referencing people absent from the snapshot are skipped.
    pub fn for_round(competition: &Competition, round: &ActivityCode) -> AssignmentResult<Self> {
        let round_data = competition
            .round(round)
            .ok_or_else(|| AssignmentError::UnknownRound(round.clone()))?;

        let mut people: Vec<&Person> = round_data
            .results
            .iter()
            .filter_map(|r| competition.person(r.person_id))
            .collect();
        let event_id = round.event_id.as_str();
        people.sort_by(|a, b| compare_people(a, b, event_id));
        people.dedup_by_key(|p| p.registrant_id);

        Ok(Self::from_order(people.iter().map(|p| p.registrant_id)))
    }

    /// Builds a ranking from an explicit order.
    pub fn from_order(order: impl IntoIterator<Item = PersonId>) -> Self {
        let mut ranking = Self::default();
        for id in order {
            if !ranking.position.contains_key(&id) {
                ranking.position.insert(id, ranking.order.len());
                ranking.order.push(id);
            }
        }
        ranking
    }

    /// People in rank order.
    pub fn order(&self) -> &[PersonId] {
        &self.order
    }

    /// Rank position; unranked people sort after everyone ranked.
    pub fn position(&self, id: PersonId) -> usize {
        self.position.get(&id).copied().unwrap_or(usize::MAX)
    }

    /// Compares two people by rank, then by id.
    pub fn compare(&self, a: PersonId, b: PersonId) -> Ordering {
        self.position(a)
            .cmp(&self.position(b))
            .then_with(|| a.cmp(&b))
    }

    /// Sorts ids in place by rank.
    pub fn sort(&self, ids: &mut [PersonId]) {
        ids.sort_by(|&a, &b| self.compare(a, b));
    }

    /// Number of ranked people.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nobody is ranked.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn compare_people(a: &Person, b: &Person, event_id: &str) -> Ordering {
    compare_best(
        a.personal_best(event_id, ResultKind::Average),
        b.personal_best(event_id, ResultKind::Average),
    )
    .then_with(|| {
        compare_best(
            a.personal_best(event_id, ResultKind::Single),
            b.personal_best(event_id, ResultKind::Single),
        )
    })
    .then_with(|| a.registrant_id.cmp(&b.registrant_id))
}

/// Ascending, with missing results last.
fn compare_best(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Round;
    use proptest::prelude::*;

    fn competition(people: Vec<Person>) -> Competition {
        let ids: Vec<PersonId> = people.iter().map(|p| p.registrant_id).collect();
        let mut c = Competition::new("ranking").with_round(Round::new(ActivityCode::round("333", 1), ids));
        c.persons = people;
        c
    }

    #[test]
    fn test_average_then_single_then_id() {
        let c = competition(vec![
            Person::new(1, "slow").with_personal_best("333", ResultKind::Average, 3000),
            Person::new(2, "none"),
            Person::new(3, "fast").with_personal_best("333", ResultKind::Average, 900),
            Person::new(4, "single-only").with_personal_best("333", ResultKind::Single, 800),
            Person::new(5, "also-none"),
            Person::new(6, "other-event").with_personal_best("222", ResultKind::Average, 100),
        ]);
        let ranking = SeedRanking::for_round(&c, &ActivityCode::round("333", 1)).unwrap();
        let order: Vec<u32> = ranking.order().iter().map(|p| p.0).collect();
        assert_eq!(order, vec![3, 1, 4, 2, 5, 6]);
    }

    #[test]
    fn test_unknown_round_is_error() {
        let c = competition(vec![]);
        let err = SeedRanking::for_round(&c, &ActivityCode::round("333", 2)).unwrap_err();
        assert!(matches!(err, AssignmentError::UnknownRound(_)));
    }

    #[test]
    fn test_unranked_sort_last() {
        let ranking = SeedRanking::from_order([PersonId(9), PersonId(4)]);
        let mut ids = vec![PersonId(1), PersonId(4), PersonId(9)];
        ranking.sort(&mut ids);
        assert_eq!(ids, vec![PersonId(9), PersonId(4), PersonId(1)]);
        assert_eq!(ranking.position(PersonId(1)), usize::MAX);
    }

    #[test]
    fn test_from_order_dedups() {
        let ranking = SeedRanking::from_order([PersonId(2), PersonId(2), PersonId(1)]);
        assert_eq!(ranking.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_ranking_is_deterministic(bests in proptest::collection::vec(proptest::option::of(500i64..5000), 1..30)) {
            let people: Vec<Person> = bests
                .iter()
                .enumerate()
                .map(|(i, b)| {
                    let p = Person::new(i as u32 + 1, format!("p{i}"));
                    match b {
                        Some(v) => p.with_personal_best("333", ResultKind::Average, *v),
                        None => p,
                    }
                })
                .collect();
            let mut reversed = people.clone();
            reversed.reverse();

            let code = ActivityCode::round("333", 1);
            let a = SeedRanking::for_round(&competition(people), &code).unwrap();
            let b = SeedRanking::for_round(&competition(reversed), &code).unwrap();
            prop_assert_eq!(a.order(), b.order());
        }
    }
}
