//! Non-fatal warnings returned in result payloads.
//!
//! Every condition an engine recovers from surfaces here as a human-readable
//! message. The caller decides whether to present, retry, or force overwrite.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of non-fatal conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningKind {
    /// Assignments already exist and overwrite was not requested.
    AlreadyAssigned,
    /// An assignment set matched no groups.
    NoEligibleGroups,
    /// A sub-problem had no feasible solution (or stopped making progress).
    Infeasible,
    /// Fewer eligible people than required slots.
    InsufficientPeople,
    /// A person could not be placed anywhere without a time conflict.
    Unassignable,
}

/// A non-fatal condition local to one unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    /// Warning category.
    pub kind: WarningKind,
    /// Unit of work the warning refers to (set name, activity, cluster run).
    pub subject: String,
    /// Human-readable description.
    pub message: String,
}

impl Warning {
    /// Creates a warning.
    pub fn new(kind: WarningKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Ordered warning accumulator that also emits each warning to the log.
#[derive(Debug, Clone, Default)]
pub(crate) struct Warnings(Vec<Warning>);

impl Warnings {
    pub(crate) fn push(&mut self, warning: Warning) {
        tracing::warn!(kind = ?warning.kind, subject = %warning.subject, "{}", warning.message);
        self.0.push(warning);
    }

    pub(crate) fn into_vec(self) -> Vec<Warning> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_message() {
        let w = Warning::new(WarningKind::NoEligibleGroups, "juniors", "No eligible groups for juniors");
        assert_eq!(w.to_string(), "No eligible groups for juniors");
    }

    #[test]
    fn test_kind_serializes_screaming() {
        let json = serde_json::to_string(&WarningKind::NoEligibleGroups).unwrap();
        assert_eq!(json, "\"NO_ELIGIBLE_GROUPS\"");
    }

    #[test]
    fn test_accumulator_keeps_order() {
        let mut ws = Warnings::default();
        ws.push(Warning::new(WarningKind::Infeasible, "a", "first"));
        ws.push(Warning::new(WarningKind::Unassignable, "b", "second"));
        let all = ws.into_vec();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].message, "first");
        assert_eq!(all[1].kind, WarningKind::Unassignable);
    }
}
