//! Staff assignment engine.
//!
//! # Algorithm
//!
//! For each activity, independently:
//! 1. Eligible people = people passing the request filter who (with
//!    `avoid_conflicts`) hold nothing overlapping the activity.
//! 2. Fewer eligible people than required slots: warn and skip.
//! 3. One binary variable per (person, job, station) the person qualifies
//!    for; each job (or station) is filled exactly, each person used at most
//!    once; objective = Σ scorers.
//! 4. Infeasible: warn and leave the activity untouched. Otherwise append
//!    one `staff-<job>` assignment per selected variable.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use super::Job;
use crate::error::{AssignmentError, AssignmentResult};
use crate::filter::{any_person, PersonFilter};
use crate::ilp::{Bound, IlpSolver, MicroLpSolver, Model, VarId};
use crate::models::{Activity, ActivityId, ActivityIndex, Assignment, Competition, PersonId};
use crate::scoring::{ScoringContext, StaffScorer};
use crate::timing::Timings;
use crate::validation::{validate_competition, validate_jobs};
use crate::warning::{Warning, WarningKind, Warnings};

/// Input for one staff assignment run.
pub struct StaffAssignmentRequest {
    /// Activities to staff, in solve order.
    pub activities: Vec<ActivityId>,
    /// Who may be given any job.
    pub person_filter: PersonFilter,
    /// Jobs to fill during every activity.
    pub jobs: Vec<Job>,
    /// Objective contributions.
    pub scorers: Vec<Box<dyn StaffScorer>>,
    /// Replace existing staff assignments instead of refusing.
    pub overwrite: bool,
    /// Skip people holding an overlapping assignment.
    pub avoid_conflicts: bool,
}

impl StaffAssignmentRequest {
    /// Creates a request for `activities` with no jobs.
    pub fn new(activities: impl IntoIterator<Item = ActivityId>) -> Self {
        Self {
            activities: activities.into_iter().collect(),
            person_filter: any_person(),
            jobs: Vec::new(),
            scorers: Vec::new(),
            overwrite: false,
            avoid_conflicts: true,
        }
    }

    /// Restricts the staff pool.
    pub fn with_person_filter(mut self, filter: PersonFilter) -> Self {
        self.person_filter = filter;
        self
    }

    /// Adds a job.
    pub fn with_job(mut self, job: Job) -> Self {
        self.jobs.push(job);
        self
    }

    /// Adds a scorer.
    pub fn with_scorer(mut self, scorer: impl StaffScorer + 'static) -> Self {
        self.scorers.push(Box::new(scorer));
        self
    }

    /// Sets the overwrite flag.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Sets whether overlapping assignments disqualify people.
    pub fn with_avoid_conflicts(mut self, avoid_conflicts: bool) -> Self {
        self.avoid_conflicts = avoid_conflicts;
        self
    }

    fn required_slots(&self) -> usize {
        self.jobs.iter().map(|j| j.count as usize).sum()
    }
}

/// One staffed slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    /// The person.
    pub person_id: PersonId,
    /// Station, for per-station jobs.
    pub station_number: Option<u32>,
}

/// Result of a staff assignment run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StaffAssignmentOutcome {
    /// Staff per activity, per job.
    pub assignments: BTreeMap<ActivityId, BTreeMap<String, Vec<StaffMember>>>,
    /// Non-fatal conditions.
    pub warnings: Vec<Warning>,
}

impl StaffAssignmentOutcome {
    /// Number of assignments made.
    pub fn assigned_count(&self) -> usize {
        self.assignments
            .values()
            .flat_map(|jobs| jobs.values())
            .map(Vec::len)
            .sum()
    }

    /// Staff of one job during one activity.
    pub fn staff(&self, activity: ActivityId, job: &str) -> &[StaffMember] {
        self.assignments
            .get(&activity)
            .and_then(|jobs| jobs.get(job))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Slot {
    person: PersonId,
    job: usize,
    station: Option<u32>,
}

/// Staffs activities.
#[derive(Debug)]
pub struct StaffAssigner {
    solver: Box<dyn IlpSolver>,
}

impl Default for StaffAssigner {
    fn default() -> Self {
        Self::new()
    }
}

impl StaffAssigner {
    /// Creates an engine with the bundled solver.
    pub fn new() -> Self {
        Self {
            solver: Box::new(MicroLpSolver),
        }
    }

    /// Sets the solver backend.
    pub fn with_solver(mut self, solver: impl IlpSolver + 'static) -> Self {
        self.solver = Box::new(solver);
        self
    }

    /// Staffs a single (possibly ad hoc) activity, ignoring
    /// `request.activities`.
    pub fn assign_activity(
        &self,
        competition: &mut Competition,
        activity: ActivityId,
        mut request: StaffAssignmentRequest,
        timings: &mut Timings,
    ) -> AssignmentResult<StaffAssignmentOutcome> {
        request.activities = vec![activity];
        self.assign(competition, request, timings)
    }

    /// Staffs every activity of the request.
    ///
    /// # Errors
    /// Unknown activity, malformed snapshot or jobs, or a solver backend
    /// failure.
    pub fn assign(
        &self,
        competition: &mut Competition,
        mut request: StaffAssignmentRequest,
        timings: &mut Timings,
    ) -> AssignmentResult<StaffAssignmentOutcome> {
        let total = timings.start("staff");
        validate_competition(competition).map_err(AssignmentError::InvalidInput)?;
        validate_jobs(&request.jobs).map_err(AssignmentError::InvalidInput)?;

        let activities: Vec<Activity> = request
            .activities
            .iter()
            .map(|&id| {
                competition
                    .activity(id)
                    .cloned()
                    .ok_or(AssignmentError::UnknownActivity(id))
            })
            .collect::<AssignmentResult<_>>()?;
        tracing::info!(
            activities = activities.len(),
            jobs = request.jobs.len(),
            slots = request.required_slots(),
            "Assigning staff"
        );

        let mut warnings = Warnings::default();
        let mut outcome = StaffAssignmentOutcome::default();

        let targets: HashSet<ActivityId> = activities.iter().map(|a| a.id).collect();
        let already_assigned = competition.persons.iter().any(|p| {
            p.staff_assignments()
                .any(|a| targets.contains(&a.activity_id))
        });
        if already_assigned {
            if !request.overwrite {
                warnings.push(Warning::new(
                    WarningKind::AlreadyAssigned,
                    "staff",
                    "Staff is already assigned for these activities; pass overwrite to replace them",
                ));
                outcome.warnings = warnings.into_vec();
                timings.finish(total);
                return Ok(outcome);
            }
            for person in &mut competition.persons {
                person
                    .assignments
                    .retain(|a| !(a.assignment_code.is_staff() && targets.contains(&a.activity_id)));
            }
        }

        let index = competition.activity_index();
        for activity in &activities {
            let token = timings.start("staff.activity");
            let staffed = self.staff_activity(
                competition,
                &index,
                activity,
                &mut request,
                &mut warnings,
                timings,
            )?;
            timings.finish(token);
            if let Some(jobs) = staffed {
                outcome.assignments.insert(activity.id, jobs);
            }
        }

        outcome.warnings = warnings.into_vec();
        tracing::info!(
            assigned = outcome.assigned_count(),
            warnings = outcome.warnings.len(),
            "Staff assignment finished"
        );
        timings.finish(total);
        Ok(outcome)
    }

    /// Solves and commits one activity; `None` when it was skipped.
    fn staff_activity(
        &self,
        competition: &mut Competition,
        index: &ActivityIndex,
        activity: &Activity,
        request: &mut StaffAssignmentRequest,
        warnings: &mut Warnings,
        timings: &mut Timings,
    ) -> AssignmentResult<Option<BTreeMap<String, Vec<StaffMember>>>> {
        let subject = format!("{} ({})", activity.name, activity.id);
        let span = activity.span();
        let eligible: Vec<usize> = competition
            .persons
            .iter()
            .enumerate()
            .filter(|(_, p)| (request.person_filter)(*p))
            .filter(|(_, p)| !request.avoid_conflicts || !index.any_conflict(&p.assignments, &span))
            .map(|(i, _)| i)
            .collect();

        let required = request.required_slots();
        tracing::debug!(activity = %subject, eligible = eligible.len(), required, "Staffing activity");
        if eligible.len() < required {
            warnings.push(Warning::new(
                WarningKind::InsufficientPeople,
                subject.clone(),
                format!(
                    "{subject} needs {required} staff but only {} people are eligible",
                    eligible.len()
                ),
            ));
            return Ok(None);
        }

        let ctx = ScoringContext::new(index);
        let mut model: Model<Slot> = Model::new("staff");
        let mut by_person: HashMap<PersonId, Vec<VarId>> = HashMap::new();
        for (j, job) in request.jobs.iter().enumerate() {
            for station in job.stations() {
                let mut vars = Vec::new();
                for &i in &eligible {
                    let person = &competition.persons[i];
                    if !(job.eligibility)(person) {
                        continue;
                    }
                    let score: f64 = request
                        .scorers
                        .iter_mut()
                        .map(|s| s.score(&ctx, person, activity, &job.name, station))
                        .sum();
                    let var = model.add_binary_var(Slot {
                        person: person.registrant_id,
                        job: j,
                        station,
                    });
                    model.set_objective_coefficient(var, score);
                    by_person.entry(person.registrant_id).or_default().push(var);
                    vars.push(var);
                }
                model.add_sum_constraint(vars, Bound::Exactly(f64::from(job.slot_size())));
            }
        }
        for &i in &eligible {
            if let Some(vars) = by_person.remove(&competition.persons[i].registrant_id) {
                model.add_sum_constraint(vars, Bound::AtMost(1.0));
            }
        }

        let token = timings.start("staff.solve");
        let solved = model.solve(self.solver.as_ref());
        timings.finish(token);

        let solution = match solved {
            Ok(solution) => solution,
            Err(e) if e.is_infeasible() => {
                warnings.push(Warning::new(
                    WarningKind::Infeasible,
                    subject.clone(),
                    format!("Could not fill every job for {subject}"),
                ));
                return Ok(None);
            }
            Err(e) => return Err(AssignmentError::Solver(e)),
        };

        let mut jobs: BTreeMap<String, Vec<StaffMember>> = request
            .jobs
            .iter()
            .map(|j| (j.name.clone(), Vec::new()))
            .collect();
        for slot in &solution.selected {
            let name = &request.jobs[slot.job].name;
            if let Some(person) = competition.person_mut(slot.person) {
                person
                    .assignments
                    .push(Assignment::staff(activity.id, name.as_str()).with_station(slot.station));
            }
            if let Some(members) = jobs.get_mut(name) {
                members.push(StaffMember {
                    person_id: slot.person,
                    station_number: slot.station,
                });
            }
        }
        for members in jobs.values_mut() {
            members.sort_by_key(|m| (m.station_number, m.person_id));
        }
        Ok(Some(jobs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Person;
    use crate::report::AssignmentReport;
    use crate::scoring::FilterScorer;
    use crate::testing::staff_competition;
    use std::sync::Arc;

    fn run(competition: &mut Competition, request: StaffAssignmentRequest) -> StaffAssignmentOutcome {
        StaffAssigner::new()
            .assign(competition, request, &mut Timings::new())
            .unwrap()
    }

    #[test]
    fn test_insufficient_people() {
        let mut c = staff_competition(&[(1, 9)], 2);
        let outcome = run(
            &mut c,
            StaffAssignmentRequest::new([ActivityId(1)])
                .with_job(Job::new("judge", 2))
                .with_job(Job::new("scrambler", 1)),
        );
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].kind, WarningKind::InsufficientPeople);
        assert_eq!(outcome.assigned_count(), 0);
        assert!(c.persons.iter().all(|p| p.assignments.is_empty()));
    }

    #[test]
    fn test_fills_every_job_once_per_person() {
        let mut c = staff_competition(&[(1, 9)], 4);
        let outcome = run(
            &mut c,
            StaffAssignmentRequest::new([ActivityId(1)])
                .with_job(Job::new("judge", 2))
                .with_job(Job::new("scrambler", 1)),
        );
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        assert_eq!(outcome.staff(ActivityId(1), "judge").len(), 2);
        assert_eq!(outcome.staff(ActivityId(1), "scrambler").len(), 1);
        assert!(c.persons.iter().all(|p| p.assignments.len() <= 1));
        assert_eq!(c.persons.iter().map(|p| p.assignments.len()).sum::<usize>(), 3);
    }

    #[test]
    fn test_per_station_jobs() {
        let mut c = staff_competition(&[(1, 9)], 3);
        let outcome = run(
            &mut c,
            StaffAssignmentRequest::new([ActivityId(1)]).with_job(Job::new("judge", 3).per_station()),
        );
        let stations: Vec<Option<u32>> = outcome
            .staff(ActivityId(1), "judge")
            .iter()
            .map(|m| m.station_number)
            .collect();
        assert_eq!(stations, vec![Some(1), Some(2), Some(3)]);
        let held: HashSet<Option<u32>> = c
            .persons
            .iter()
            .flat_map(|p| p.assignments.iter().map(|a| a.station_number))
            .collect();
        assert_eq!(held.len(), 3);
    }

    #[test]
    fn test_job_eligibility_and_scorers() {
        let mut c = staff_competition(&[(1, 9)], 3);
        c.persons[2].set_property("delegate", true.into());
        let is_delegate: PersonFilter =
            Arc::new(|p: &Person| p.property("delegate").is_some_and(|v| v.is_truthy()));

        let outcome = run(
            &mut c,
            StaffAssignmentRequest::new([ActivityId(1)])
                .with_job(Job::new("scrambler", 1).with_eligibility(is_delegate))
                .with_job(Job::new("judge", 1))
                .with_scorer(
                    FilterScorer::new(10.0)
                        .with_person_filter(Arc::new(|p: &Person| p.registrant_id == PersonId(2)))
                        .with_job("judge"),
                ),
        );
        assert_eq!(outcome.staff(ActivityId(1), "scrambler")[0].person_id, PersonId(3));
        assert_eq!(outcome.staff(ActivityId(1), "judge")[0].person_id, PersonId(2));
    }

    #[test]
    fn test_avoids_conflicts_across_activities() {
        // activities 1 and 2 both run 9:00-10:00
        let mut c = staff_competition(&[(1, 9), (2, 9)], 2);
        let outcome = run(
            &mut c,
            StaffAssignmentRequest::new([ActivityId(1), ActivityId(2)]).with_job(Job::new("judge", 1)),
        );
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        let first = outcome.staff(ActivityId(1), "judge")[0].person_id;
        let second = outcome.staff(ActivityId(2), "judge")[0].person_id;
        assert_ne!(first, second);
        assert!(AssignmentReport::calculate(&c).is_conflict_free());
    }

    #[test]
    fn test_conflicts_allowed_when_disabled() {
        let mut c = staff_competition(&[(1, 9), (2, 9)], 1);
        let outcome = run(
            &mut c,
            StaffAssignmentRequest::new([ActivityId(1), ActivityId(2)])
                .with_job(Job::new("judge", 1))
                .with_avoid_conflicts(false),
        );
        assert_eq!(outcome.assigned_count(), 2);
        assert!(!AssignmentReport::calculate(&c).is_conflict_free());
    }

    #[test]
    fn test_infeasible_activity_left_untouched() {
        let mut c = staff_competition(&[(1, 9)], 3);
        let nobody: PersonFilter = Arc::new(|_: &Person| false);
        let outcome = run(
            &mut c,
            StaffAssignmentRequest::new([ActivityId(1)])
                .with_job(Job::new("judge", 1))
                .with_job(Job::new("scrambler", 1).with_eligibility(nobody)),
        );
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].kind, WarningKind::Infeasible);
        assert!(c.persons.iter().all(|p| p.assignments.is_empty()));
    }

    #[test]
    fn test_guard_and_overwrite() {
        let mut c = staff_competition(&[(1, 9), (2, 12)], 2);
        c.persons[0]
            .assignments
            .push(Assignment::staff(ActivityId(2), "runner"));
        let request = || StaffAssignmentRequest::new([ActivityId(1)]).with_job(Job::new("judge", 1));
        run(&mut c, request());

        let before = serde_json::to_string(&c).unwrap();
        let first = run(&mut c, request());
        let second = run(&mut c, request());
        assert_eq!(first.warnings, second.warnings);
        assert_eq!(first.warnings[0].kind, WarningKind::AlreadyAssigned);
        assert_eq!(serde_json::to_string(&c).unwrap(), before);

        let outcome = run(&mut c, request().with_overwrite(true));
        assert!(outcome.warnings.is_empty());
        let on_first: usize = c
            .persons
            .iter()
            .flat_map(|p| &p.assignments)
            .filter(|a| a.activity_id == ActivityId(1))
            .count();
        assert_eq!(on_first, 1);
        assert!(c.persons[0]
            .assignments
            .contains(&Assignment::staff(ActivityId(2), "runner")));
    }

    #[test]
    fn test_single_activity_variant() {
        let mut c = staff_competition(&[(1, 9), (2, 12)], 2);
        let outcome = StaffAssigner::new()
            .assign_activity(
                &mut c,
                ActivityId(2),
                StaffAssignmentRequest::new([]).with_job(Job::new("judge", 2)),
                &mut Timings::new(),
            )
            .unwrap();
        assert_eq!(outcome.staff(ActivityId(2), "judge").len(), 2);
        assert!(outcome.assignments.get(&ActivityId(1)).is_none());
    }

    #[test]
    fn test_unknown_activity_is_fatal() {
        let mut c = staff_competition(&[(1, 9)], 2);
        let err = StaffAssigner::new()
            .assign(
                &mut c,
                StaffAssignmentRequest::new([ActivityId(77)]).with_job(Job::new("judge", 1)),
                &mut Timings::new(),
            )
            .unwrap_err();
        assert!(matches!(err, AssignmentError::UnknownActivity(ActivityId(77))));
    }

    #[test]
    fn test_invalid_jobs_are_fatal() {
        let mut c = staff_competition(&[(1, 9)], 2);
        let err = StaffAssigner::new()
            .assign(
                &mut c,
                StaffAssignmentRequest::new([ActivityId(1)]).with_job(Job::new("judge", 0)),
                &mut Timings::new(),
            )
            .unwrap_err();
        assert!(matches!(err, AssignmentError::InvalidInput(_)));
        assert!(c.persons.iter().all(|p| p.assignments.is_empty()));
    }
}
