//! Fatal error types.
//!
//! Only malformed input and solver backend failures are fatal. Guard
//! violations, infeasible sub-problems and population shortfalls are reported
//! as [`Warning`](crate::warning::Warning)s in the result payload instead.

use thiserror::Error;

use crate::ilp::SolveError;
use crate::models::{ActivityCode, ActivityId, PersonId};
use crate::validation::ValidationError;

/// Errors that abort a whole assignment operation.
#[derive(Debug, Error)]
pub enum AssignmentError {
    /// No round with this code exists in the snapshot.
    #[error("unknown round: {0}")]
    UnknownRound(ActivityCode),

    /// No activity with this id exists in the snapshot.
    #[error("unknown activity: {0}")]
    UnknownActivity(ActivityId),

    /// No person with this id exists in the snapshot.
    #[error("unknown person: {0}")]
    UnknownPerson(PersonId),

    /// An activity code could not be parsed.
    #[error("invalid activity code '{code}': {reason}")]
    InvalidActivityCode { code: String, reason: String },

    /// Structural input validation failed.
    #[error("invalid input: {}", summarize(.0))]
    InvalidInput(Vec<ValidationError>),

    /// The solver backend failed for a reason other than infeasibility.
    #[error("solver failure: {0}")]
    Solver(#[from] SolveError),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for assignment operations.
pub type AssignmentResult<T> = Result<T, AssignmentError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_error_display_messages() {
        let err = AssignmentError::UnknownRound(ActivityCode::round("333", 4));
        assert_eq!(err.to_string(), "unknown round: 333-r4");

        let err = AssignmentError::UnknownActivity(ActivityId(9));
        assert_eq!(err.to_string(), "unknown activity: #9");

        let err = AssignmentError::InvalidInput(vec![
            ValidationError::new(ValidationErrorKind::DuplicateId, "Duplicate person ID: 1"),
            ValidationError::new(ValidationErrorKind::InvalidJob, "Job 'judge' has count 0"),
        ]);
        assert_eq!(
            err.to_string(),
            "invalid input: Duplicate person ID: 1; Job 'judge' has count 0"
        );

        let err = AssignmentError::from(SolveError::Backend("out of memory".into()));
        assert_eq!(err.to_string(), "solver failure: solver backend error: out of memory");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AssignmentError>();
    }
}
