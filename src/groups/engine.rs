//! Group assignment engine.
//!
//! # Algorithm
//!
//! For each assignment set, in order:
//! 1. Restrict to the set's eligible groups and people. People placed by an
//!    earlier set keep their group and count toward its load.
//! 2. Soft capacity = eligible people / eligible groups (fractional).
//! 3. Queue the remaining people in seed order. Repeat until the queue is
//!    empty:
//!    - usable groups = groups with load < capacity (capacity grows by one
//!      when none is usable);
//!    - build an ILP over the first `batch_size` queue entries × usable
//!      groups, at most one new person per group and one group per person,
//!      with exactly as many placements as a maximum matching of the batch
//!      allows;
//!    - coefficient = Σ scorers − the person's average over their options −
//!      their queue index, so seed order breaks every tie;
//!    - commit the solution.
//!
//! An infeasible solve grows the capacity once; a second infeasible solve
//! with an unchanged queue ends the set with a warning.
//!
//! Station rules run after all sets, and the snapshot is only mutated once
//! everything has been solved.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use super::{AssignmentSet, StationRule};
use crate::config::GroupAssignmentConfig;
use crate::error::{AssignmentError, AssignmentResult};
use crate::ilp::{Bound, IlpSolver, MicroLpSolver, Model, SolveError, VarId};
use crate::models::{
    Activity, ActivityCode, ActivityId, ActivityIndex, Assignment, Competition, Person, PersonId,
};
use crate::ranking::SeedRanking;
use crate::scoring::{GroupScorer, ScoringContext};
use crate::timing::Timings;
use crate::validation::{validate_assignment_sets, validate_competition};
use crate::warning::{Warning, WarningKind, Warnings};

/// Input for one group assignment run.
pub struct GroupAssignmentRequest {
    /// The round whose groups are filled.
    pub round: ActivityCode,
    /// Narrows the round to one attempt.
    pub attempt: Option<u32>,
    /// Assignment sets, processed in order.
    pub sets: Vec<AssignmentSet>,
    /// Objective contributions.
    pub scorers: Vec<Box<dyn GroupScorer>>,
    /// Station numbering rules, applied in order.
    pub station_rules: Vec<StationRule>,
    /// Replace existing competitor assignments instead of refusing.
    pub overwrite: bool,
}

impl GroupAssignmentRequest {
    /// Creates a request with no sets.
    pub fn new(round: ActivityCode) -> Self {
        Self {
            round,
            attempt: None,
            sets: Vec::new(),
            scorers: Vec::new(),
            station_rules: Vec::new(),
            overwrite: false,
        }
    }

    /// Narrows the round to one attempt.
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    /// Appends an assignment set.
    pub fn with_set(mut self, set: AssignmentSet) -> Self {
        self.sets.push(set);
        self
    }

    /// Adds a scorer.
    pub fn with_scorer(mut self, scorer: impl GroupScorer + 'static) -> Self {
        self.scorers.push(Box::new(scorer));
        self
    }

    /// Appends a station rule.
    pub fn with_station_rule(mut self, rule: StationRule) -> Self {
        self.station_rules.push(rule);
        self
    }

    /// Sets the overwrite flag.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// One confirmed group member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    /// The person.
    pub person_id: PersonId,
    /// Station number, if a station rule matched the group.
    pub station_number: Option<u32>,
}

/// Result of a group assignment run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupAssignmentOutcome {
    /// Every group of the round.
    pub groups: Vec<ActivityId>,
    /// Members per group, in seed order.
    pub assignments: BTreeMap<ActivityId, Vec<GroupMember>>,
    /// Non-fatal conditions.
    pub warnings: Vec<Warning>,
}

impl GroupAssignmentOutcome {
    /// Total number of people placed.
    pub fn assigned_count(&self) -> usize {
        self.assignments.values().map(Vec::len).sum()
    }
}

/// Fills a round's groups.
#[derive(Debug)]
pub struct GroupAssigner {
    config: GroupAssignmentConfig,
    solver: Box<dyn IlpSolver>,
}

impl Default for GroupAssigner {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupAssigner {
    /// Creates an engine with default tuning and the bundled solver.
    pub fn new() -> Self {
        Self {
            config: GroupAssignmentConfig::default(),
            solver: Box::new(MicroLpSolver),
        }
    }

    /// Sets the tuning.
    pub fn with_config(mut self, config: GroupAssignmentConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the solver backend.
    pub fn with_solver(mut self, solver: impl IlpSolver + 'static) -> Self {
        self.solver = Box::new(solver);
        self
    }

    /// Assigns competitors of `request.round` to its groups.
    ///
    /// # Errors
    /// Unknown round, malformed snapshot or sets, or a solver backend
    /// failure. Infeasibility is reported as a warning.
    pub fn assign(
        &self,
        competition: &mut Competition,
        mut request: GroupAssignmentRequest,
        timings: &mut Timings,
    ) -> AssignmentResult<GroupAssignmentOutcome> {
        let total = timings.start("groups");
        validate_competition(competition).map_err(AssignmentError::InvalidInput)?;
        validate_assignment_sets(&request.sets).map_err(AssignmentError::InvalidInput)?;

        let group_ids = competition.round_groups(&request.round, request.attempt)?;
        let ranking = SeedRanking::for_round(competition, &request.round)?;
        tracing::info!(
            round = %request.round,
            groups = group_ids.len(),
            candidates = ranking.len(),
            sets = request.sets.len(),
            "Assigning groups"
        );

        let mut warnings = Warnings::default();
        let mut outcome = GroupAssignmentOutcome {
            groups: group_ids.clone(),
            ..Default::default()
        };

        let group_set: HashSet<ActivityId> = group_ids.iter().copied().collect();
        let already_assigned = competition.persons.iter().any(|p| {
            p.assignments
                .iter()
                .any(|a| a.is_competitor() && group_set.contains(&a.activity_id))
        });
        if already_assigned {
            if !request.overwrite {
                warnings.push(Warning::new(
                    WarningKind::AlreadyAssigned,
                    request.round.to_string(),
                    format!(
                        "Groups for {} are already assigned; pass overwrite to replace them",
                        request.round
                    ),
                ));
                outcome.warnings = warnings.into_vec();
                timings.finish(total);
                return Ok(outcome);
            }
            strip_competitors(competition, &group_set);
        }

        let members = {
            let snapshot: &Competition = competition;
            let groups: Vec<&Activity> = group_ids
                .iter()
                .filter_map(|id| snapshot.activity(*id))
                .collect();
            let mut run = GroupRun {
                engine: self,
                competition: snapshot,
                index: snapshot.activity_index(),
                positions: snapshot.person_positions(),
                ranking: &ranking,
                groups,
                members: HashMap::new(),
                placed: HashMap::new(),
                featured: Vec::new(),
                warnings: &mut warnings,
            };
            for set in &request.sets {
                let token = timings.start("groups.set");
                run.assign_set(set, &mut request.scorers, timings)?;
                timings.finish(token);
            }
            run.finish(&request.station_rules)
        };

        for (group_id, people) in &members.by_group {
            let stationed: Vec<GroupMember> = people
                .iter()
                .map(|&person_id| GroupMember {
                    person_id,
                    station_number: members.stations.get(&person_id).copied(),
                })
                .collect();
            for m in &stationed {
                if let Some(person) = competition.person_mut(m.person_id) {
                    person
                        .assignments
                        .push(Assignment::competitor(*group_id).with_station(m.station_number));
                }
            }
            outcome.assignments.insert(*group_id, stationed);
        }
        for (group_id, person_id) in &members.featured {
            if let Some(group) = competition.activity_mut(*group_id) {
                group.add_featured_competitor(*person_id);
            }
        }

        outcome.warnings = warnings.into_vec();
        tracing::info!(
            round = %request.round,
            assigned = outcome.assigned_count(),
            warnings = outcome.warnings.len(),
            "Group assignment finished"
        );
        timings.finish(total);
        Ok(outcome)
    }
}

/// Removes competitor assignments on `groups` and their featured marks.
fn strip_competitors(competition: &mut Competition, groups: &HashSet<ActivityId>) {
    for person in &mut competition.persons {
        person
            .assignments
            .retain(|a| !(a.is_competitor() && groups.contains(&a.activity_id)));
    }
    for id in groups {
        if let Some(group) = competition.activity_mut(*id) {
            group.clear_featured_competitors();
        }
    }
}

/// Size of a maximum matching between people and the group slots each can
/// reach (augmenting paths).
fn max_matching(reachable: &[Vec<usize>], slots: usize) -> usize {
    let mut owner: Vec<Option<usize>> = vec![None; slots];
    let mut size = 0;
    for person in 0..reachable.len() {
        let mut visited = vec![false; slots];
        if augment(person, reachable, &mut owner, &mut visited) {
            size += 1;
        }
    }
    size
}

fn augment(
    person: usize,
    reachable: &[Vec<usize>],
    owner: &mut [Option<usize>],
    visited: &mut [bool],
) -> bool {
    for &slot in &reachable[person] {
        if visited[slot] {
            continue;
        }
        visited[slot] = true;
        let free = match owner[slot] {
            None => true,
            Some(other) => augment(other, reachable, owner, visited),
        };
        if free {
            owner[slot] = Some(person);
            return true;
        }
    }
    false
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Placement {
    person: PersonId,
    group: ActivityId,
}

#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    person: PersonId,
    index: usize,
}

/// Final member lists, ready to be written back.
struct Members {
    by_group: Vec<(ActivityId, Vec<PersonId>)>,
    stations: HashMap<PersonId, u32>,
    featured: Vec<(ActivityId, PersonId)>,
}

/// Solver state for one run, borrowed from a read-only snapshot.
struct GroupRun<'a> {
    engine: &'a GroupAssigner,
    competition: &'a Competition,
    index: ActivityIndex,
    positions: HashMap<PersonId, usize>,
    ranking: &'a SeedRanking,
    groups: Vec<&'a Activity>,
    members: HashMap<ActivityId, Vec<PersonId>>,
    placed: HashMap<PersonId, ActivityId>,
    featured: Vec<(ActivityId, PersonId)>,
    warnings: &'a mut Warnings,
}

impl<'a> GroupRun<'a> {
    fn person(&self, id: PersonId) -> Option<&'a Person> {
        let competition = self.competition;
        self.positions.get(&id).map(|&i| &competition.persons[i])
    }

    /// Whether `person` may join `group` without a time conflict.
    fn fits(&self, person: &Person, group: &Activity) -> bool {
        !self.index.any_conflict(&person.assignments, &group.span())
    }

    fn assign_set(
        &mut self,
        set: &AssignmentSet,
        scorers: &mut [Box<dyn GroupScorer>],
        timings: &mut Timings,
    ) -> AssignmentResult<()> {
        let groups: Vec<&'a Activity> = self
            .groups
            .iter()
            .copied()
            .filter(|g| (set.group_filter)(*g))
            .collect();
        if groups.is_empty() {
            self.warnings.push(Warning::new(
                WarningKind::NoEligibleGroups,
                set.name.clone(),
                format!("No eligible groups for assignment set '{}'", set.name),
            ));
            return Ok(());
        }

        let eligible: HashSet<ActivityId> = groups.iter().map(|g| g.id).collect();
        let mut load: HashMap<ActivityId, usize> = groups.iter().map(|g| (g.id, 0)).collect();
        let mut people = 0usize;
        let mut queue: Vec<QueueEntry> = Vec::new();
        for &id in self.ranking.order() {
            let Some(person) = self.person(id) else {
                continue;
            };
            if !(set.person_filter)(person) {
                continue;
            }
            match self.placed.get(&id) {
                Some(g) if eligible.contains(g) => {
                    people += 1;
                    *load.entry(*g).or_insert(0) += 1;
                }
                Some(_) => {}
                None => {
                    people += 1;
                    if groups.iter().any(|g| self.fits(person, g)) {
                        queue.push(QueueEntry {
                            person: id,
                            index: queue.len(),
                        });
                    } else {
                        self.warnings.push(Warning::new(
                            WarningKind::Unassignable,
                            set.name.clone(),
                            format!(
                                "{} ({}) conflicts with every group of assignment set '{}'",
                                person.name, id, set.name
                            ),
                        ));
                    }
                }
            }
        }

        let mut capacity = people as f64 / groups.len() as f64;
        tracing::debug!(
            set = %set.name,
            groups = groups.len(),
            people,
            queued = queue.len(),
            capacity,
            "Assignment set"
        );

        let mut previous_len: Option<usize> = None;
        while !queue.is_empty() {
            let started_with = queue.len();
            let usable: Vec<&'a Activity> = groups
                .iter()
                .copied()
                .filter(|g| (load[&g.id] as f64) < capacity)
                .collect();
            if usable.is_empty() {
                capacity += 1.0;
                continue;
            }

            let batch = &queue[..queue.len().min(self.engine.config.batch_size.max(1))];
            let model = self.build_model(batch, &usable, scorers);
            if model.variable_count() == 0 {
                if usable.len() == groups.len() {
                    self.warnings.push(Warning::new(
                        WarningKind::Infeasible,
                        set.name.clone(),
                        format!(
                            "{} people of assignment set '{}' fit no group",
                            queue.len(),
                            set.name
                        ),
                    ));
                    break;
                }
                capacity += 1.0;
                previous_len = Some(started_with);
                continue;
            }

            let token = timings.start("groups.solve");
            let solved = model.solve(self.engine.solver.as_ref());
            timings.finish(token);

            match solved {
                Ok(solution) => {
                    for placement in &solution.selected {
                        self.commit(set, *placement);
                        *load.entry(placement.group).or_insert(0) += 1;
                    }
                    let chosen: HashSet<PersonId> =
                        solution.selected.iter().map(|p| p.person).collect();
                    queue.retain(|e| !chosen.contains(&e.person));
                }
                Err(SolveError::Backend(reason)) => {
                    return Err(AssignmentError::Solver(SolveError::Backend(reason)));
                }
                Err(_) if previous_len == Some(started_with) => {
                    self.warnings.push(Warning::new(
                        WarningKind::Infeasible,
                        set.name.clone(),
                        format!(
                            "Assignment set '{}' stopped making progress; {} people left unassigned",
                            set.name,
                            queue.len()
                        ),
                    ));
                    break;
                }
                Err(_) => {
                    capacity += 1.0;
                }
            }
            previous_len = Some(started_with);
        }
        Ok(())
    }

    fn build_model(
        &self,
        batch: &[QueueEntry],
        usable: &[&'a Activity],
        scorers: &mut [Box<dyn GroupScorer>],
    ) -> Model<Placement> {
        let ctx = ScoringContext::new(&self.index);
        let mut model: Model<Placement> = Model::new("groups");
        let mut by_person: Vec<Vec<VarId>> = Vec::new();
        let mut by_group: HashMap<ActivityId, Vec<VarId>> = HashMap::new();
        let mut reachable: Vec<Vec<usize>> = Vec::new();

        for entry in batch {
            let Some(person) = self.person(entry.person) else {
                continue;
            };
            let mut options: Vec<(VarId, f64)> = Vec::new();
            let mut slots: Vec<usize> = Vec::new();
            for (slot, group) in usable
                .iter()
                .enumerate()
                .filter(|(_, g)| self.fits(person, g))
            {
                let mates: Vec<&Person> = self
                    .members
                    .get(&group.id)
                    .map(|ids| ids.iter().filter_map(|&id| self.person(id)).collect())
                    .unwrap_or_default();
                let score: f64 = scorers
                    .iter_mut()
                    .map(|s| s.score(&ctx, person, group, &mates))
                    .sum();
                let var = model.add_binary_var(Placement {
                    person: entry.person,
                    group: group.id,
                });
                by_group.entry(group.id).or_default().push(var);
                options.push((var, score));
                slots.push(slot);
            }
            if options.is_empty() {
                continue;
            }
            let average = options.iter().map(|(_, s)| s).sum::<f64>() / options.len() as f64;
            for &(var, score) in &options {
                model.set_objective_coefficient(var, score - average - entry.index as f64);
            }
            by_person.push(options.into_iter().map(|(v, _)| v).collect());
            reachable.push(slots);
        }

        let placements = max_matching(&reachable, usable.len());
        let all: Vec<VarId> = by_person.iter().flatten().copied().collect();
        for vars in by_person {
            model.add_sum_constraint(vars, Bound::AtMost(1.0));
        }
        for group in usable {
            if let Some(vars) = by_group.remove(&group.id) {
                model.add_sum_constraint(vars, Bound::AtMost(1.0));
            }
        }
        if !all.is_empty() {
            model.add_sum_constraint(all, Bound::Exactly(placements as f64));
        }
        model
    }

    fn commit(&mut self, set: &AssignmentSet, placement: Placement) {
        self.members
            .entry(placement.group)
            .or_default()
            .push(placement.person);
        self.placed.insert(placement.person, placement.group);
        if set.featured {
            self.featured.push((placement.group, placement.person));
        }
    }

    /// Applies station rules and orders every member list by seed.
    fn finish(mut self, rules: &[StationRule]) -> Members {
        let mut by_group = Vec::new();
        for group in &self.groups {
            let mut ids = self.members.remove(&group.id).unwrap_or_default();
            self.ranking.sort(&mut ids);
            by_group.push((group.id, ids));
        }

        let mut stations = HashMap::new();
        for rule in rules {
            for (group_id, ids) in &by_group {
                let Some(group) = self.groups.iter().find(|g| g.id == *group_id) else {
                    continue;
                };
                if !(rule.group_filter)(*group) {
                    continue;
                }
                let people: Vec<&Person> = ids.iter().filter_map(|&id| self.person(id)).collect();
                for (i, person) in rule.order(&people, self.ranking).iter().enumerate() {
                    stations.insert(person.registrant_id, i as u32 + 1);
                }
            }
        }

        let ranking = self.ranking;
        self.featured
            .sort_by(|a, b| a.0.cmp(&b.0).then_with(|| ranking.compare(a.1, b.1)));

        Members {
            by_group,
            stations,
            featured: self.featured,
        }
    }
}
