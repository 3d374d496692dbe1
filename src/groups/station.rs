//! Station numbering rules.
//!
//! After every assignment set has run, each rule numbers the members of the
//! groups it matches 1..n. Later rules overwrite numbers given by earlier ones.

use std::cmp::Ordering;
use std::fmt;

use crate::filter::{any_activity, ActivityFilter, PersonKey};
use crate::models::Person;
use crate::ranking::SeedRanking;

/// How a rule orders a group's members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationMode {
    /// Smallest key gets station 1.
    Ascending,
    /// Largest key gets station 1.
    Descending,
    /// Seed order.
    Arbitrary,
}

/// Assigns station numbers within matching groups.
#[derive(Clone)]
pub struct StationRule {
    /// Which groups the rule numbers.
    pub group_filter: ActivityFilter,
    /// Ordering mode.
    pub mode: StationMode,
    /// Sort key; seed position when absent.
    pub sort_key: Option<PersonKey>,
}

impl StationRule {
    /// Creates a rule for every group.
    pub fn new(mode: StationMode) -> Self {
        Self {
            group_filter: any_activity(),
            mode,
            sort_key: None,
        }
    }

    /// Restricts the rule to groups passing `filter`.
    pub fn with_group_filter(mut self, filter: ActivityFilter) -> Self {
        self.group_filter = filter;
        self
    }

    /// Sorts by `key` instead of seed position.
    pub fn with_sort_key(mut self, key: PersonKey) -> Self {
        self.sort_key = Some(key);
        self
    }

    /// Orders `members` (already in seed order) for station numbering.
    ///
    /// People without a key value go last; ties keep seed order.
    pub(crate) fn order<'p>(&self, members: &[&'p Person], ranking: &SeedRanking) -> Vec<&'p Person> {
        let mut ordered = members.to_vec();
        if self.mode == StationMode::Arbitrary {
            return ordered;
        }

        let key = |p: &Person| -> Option<f64> {
            match &self.sort_key {
                Some(f) => f(p),
                None => Some(ranking.position(p.registrant_id) as f64),
            }
        };
        let descending = self.mode == StationMode::Descending;
        ordered.sort_by(|a, b| match (key(*a), key(*b)) {
            (Some(x), Some(y)) => {
                let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        ordered
    }
}

impl fmt::Debug for StationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StationRule")
            .field("mode", &self.mode)
            .field("sort_key", &self.sort_key.is_some())
            .finish_non_exhaustive()
    }
}
