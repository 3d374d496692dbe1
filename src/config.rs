//! Engine configuration.
//!
//! Tuning knobs that stay constant across invocations. Per-call switches
//! (`overwrite`, `avoid_conflicts`, attempt number) live on the request types.
//! Every field has a default, so a partial JSON document is a valid config.

use serde::{Deserialize, Serialize};

use crate::error::{AssignmentError, AssignmentResult};
use crate::validation::{ValidationError, ValidationErrorKind};

/// Group assignment tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupAssignmentConfig {
    /// Maximum queue entries considered per iteration.
    pub batch_size: usize,
}

impl Default for GroupAssignmentConfig {
    fn default() -> Self {
        Self { batch_size: 100 }
    }
}

impl GroupAssignmentConfig {
    /// Sets the per-iteration batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// Clustering tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Solve attempts before settling for the best partial result.
    pub max_attempts: usize,
    /// Objective weight of each assigned person, weighed against constraint scores.
    pub assignment_weight: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            assignment_weight: 1000.0,
        }
    }
}

impl ClusterConfig {
    /// Sets the attempt limit.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the per-person assignment weight.
    pub fn with_assignment_weight(mut self, weight: f64) -> Self {
        self.assignment_weight = weight;
        self
    }
}

/// Configuration for all engines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Group assignment tuning.
    pub groups: GroupAssignmentConfig,
    /// Clustering tuning.
    pub clustering: ClusterConfig,
}

impl EngineConfig {
    /// Parses a (possibly partial) JSON document and validates it.
    pub fn from_json(json: &str) -> AssignmentResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            AssignmentError::InvalidInput(vec![ValidationError::new(
                ValidationErrorKind::InvalidConfig,
                format!("Malformed engine config: {e}"),
            )])
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the engines cannot run with.
    pub fn validate(&self) -> AssignmentResult<()> {
        let mut errors = Vec::new();
        if self.groups.batch_size == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidConfig,
                "groups.batch_size must be at least 1",
            ));
        }
        if self.clustering.max_attempts == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidConfig,
                "clustering.max_attempts must be at least 1",
            ));
        }
        if !(self.clustering.assignment_weight > 0.0) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidConfig,
                "clustering.assignment_weight must be positive",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AssignmentError::InvalidInput(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = EngineConfig::default();
        assert_eq!(c.groups.batch_size, 100);
        assert_eq!(c.clustering.max_attempts, 10);
        assert!((c.clustering.assignment_weight - 1000.0).abs() < 1e-10);
    }

    #[test]
    fn test_partial_json() {
        let c = EngineConfig::from_json(r#"{"clustering": {"max_attempts": 3}}"#).unwrap();
        assert_eq!(c.clustering.max_attempts, 3);
        assert!((c.clustering.assignment_weight - 1000.0).abs() < 1e-10);
        assert_eq!(c.groups.batch_size, 100);
    }

    #[test]
    fn test_rejects_zero_batch() {
        let err = EngineConfig::from_json(r#"{"groups": {"batch_size": 0}}"#).unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = EngineConfig::from_json("{").unwrap_err();
        assert!(matches!(err, AssignmentError::InvalidInput(_)));
    }

    #[test]
    fn test_builders() {
        let g = GroupAssignmentConfig::default().with_batch_size(5);
        assert_eq!(g.batch_size, 5);
        let c = ClusterConfig::default()
            .with_max_attempts(2)
            .with_assignment_weight(50.0);
        assert_eq!(c.max_attempts, 2);
        assert!((c.assignment_weight - 50.0).abs() < 1e-10);
    }
}
