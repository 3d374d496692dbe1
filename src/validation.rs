//! Input validation for assignment operations.
//!
//! Checks structural integrity of the competition snapshot and of the
//! per-invocation inputs before any engine runs. Detects:
//! - Duplicate activity or person IDs
//! - Activities whose interval is empty or inverted
//! - Assignments referencing unknown activities
//! - Round results referencing unknown people
//! - Malformed jobs and assignment sets
//!
//! Every check runs; all problems are reported together.

use std::collections::HashSet;

use crate::groups::AssignmentSet;
use crate::models::Competition;
use crate::staff::Job;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// An activity does not start before it ends.
    InvalidInterval,
    /// An assignment references an activity that doesn't exist.
    InvalidActivityReference,
    /// A round result references a person that doesn't exist.
    InvalidPersonReference,
    /// A job is unnamed, duplicated, or requires nobody.
    InvalidJob,
    /// An assignment set is unnamed.
    InvalidAssignmentSet,
    /// An engine configuration value is out of range.
    InvalidConfig,
    /// A cluster request is unnamed or asks for no clusters.
    InvalidClusterRequest,
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a competition snapshot.
///
/// Checks:
/// 1. No duplicate activity IDs (across all rooms and nesting levels)
/// 2. Every activity starts before it ends
/// 3. No duplicate person IDs
/// 4. Every assignment references an existing activity
/// 5. Every round result references an existing person
pub fn validate_competition(competition: &Competition) -> ValidationResult {
    let mut errors = Vec::new();

    let mut activity_ids = HashSet::new();
    for activity in competition.activities() {
        if !activity_ids.insert(activity.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate activity ID: {}", activity.id),
            ));
        }
        if activity.start_time >= activity.end_time {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidInterval,
                format!(
                    "Activity {} ({}) does not start before it ends",
                    activity.id, activity.activity_code
                ),
            ));
        }
    }

    let mut person_ids = HashSet::new();
    for person in &competition.persons {
        if !person_ids.insert(person.registrant_id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate person ID: {}", person.registrant_id),
            ));
        }
    }

    for person in &competition.persons {
        for assignment in &person.assignments {
            if !activity_ids.contains(&assignment.activity_id) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidActivityReference,
                    format!(
                        "Person {} holds an assignment to unknown activity {}",
                        person.registrant_id, assignment.activity_id
                    ),
                ));
            }
        }
    }

    for round in competition.events.iter().flat_map(|e| &e.rounds) {
        for result in &round.results {
            if !person_ids.contains(&result.person_id) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidPersonReference,
                    format!(
                        "Round {} references unknown person {}",
                        round.id, result.person_id
                    ),
                ));
            }
        }
    }

    finish(errors)
}

/// Validates staff jobs: non-empty unique names, positive counts.
pub fn validate_jobs(jobs: &[Job]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut names = HashSet::new();
    for job in jobs {
        if job.name.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidJob,
                "Job name must not be empty",
            ));
        } else if !names.insert(job.name.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidJob,
                format!("Duplicate job name: {}", job.name),
            ));
        }
        if job.count == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidJob,
                format!("Job '{}' has count 0", job.name),
            ));
        }
    }
    finish(errors)
}

/// Validates assignment sets: every set must be named.
pub fn validate_assignment_sets(sets: &[AssignmentSet]) -> ValidationResult {
    let errors = sets
        .iter()
        .enumerate()
        .filter(|(_, set)| set.name.trim().is_empty())
        .map(|(i, _)| {
            ValidationError::new(
                ValidationErrorKind::InvalidAssignmentSet,
                format!("Assignment set #{} has no name", i + 1),
            )
        })
        .collect();
    finish(errors)
}

/// Validates a cluster request: it needs a property name and at least one
/// cluster.
pub fn validate_cluster_request(name: &str, cluster_count: usize) -> ValidationResult {
    let mut errors = Vec::new();
    if name.trim().is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidClusterRequest,
            "Cluster property name is empty",
        ));
    }
    if cluster_count == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidClusterRequest,
            format!("Clustering '{name}' asks for 0 clusters"),
        ));
    }
    finish(errors)
}

fn finish(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
