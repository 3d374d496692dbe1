//! Scoped timing collector.
//!
//! Engines receive a `&mut Timings` from the caller and record how long their
//! phases took. There is no process-wide timer: each call owns its collector.

use std::time::{Duration, Instant};

/// One timed section.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingEntry {
    /// Section label.
    pub label: String,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

/// An in-flight section started with [`Timings::start`].
#[derive(Debug)]
#[must_use = "pass the token to Timings::finish"]
pub struct TimingToken {
    label: String,
    started: Instant,
}

/// Collector of timed sections.
#[derive(Debug, Clone, Default)]
pub struct Timings {
    entries: Vec<TimingEntry>,
}

impl Timings {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a section.
    pub fn start(&self, label: impl Into<String>) -> TimingToken {
        TimingToken {
            label: label.into(),
            started: Instant::now(),
        }
    }

    /// Finishes a section and records it.
    pub fn finish(&mut self, token: TimingToken) -> Duration {
        let elapsed = token.started.elapsed();
        tracing::debug!(
            section = %token.label,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "Timed section"
        );
        self.entries.push(TimingEntry {
            label: token.label,
            elapsed,
        });
        elapsed
    }

    /// Times a closure.
    pub fn time<T>(&mut self, label: impl Into<String>, f: impl FnOnce() -> T) -> T {
        let token = self.start(label);
        let out = f();
        self.finish(token);
        out
    }

    /// Recorded sections, in completion order.
    pub fn entries(&self) -> &[TimingEntry] {
        &self.entries
    }

    /// Total time across sections with this label.
    pub fn total_for(&self, label: &str) -> Duration {
        self.entries
            .iter()
            .filter(|e| e.label == label)
            .map(|e| e.elapsed)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_sections_in_order() {
        let mut t = Timings::new();
        let outer = t.start("outer");
        let value = t.time("inner", || 41 + 1);
        t.finish(outer);

        assert_eq!(value, 42);
        let labels: Vec<&str> = t.entries().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["inner", "outer"]);
        assert!(t.total_for("outer") >= t.total_for("inner"));
        assert_eq!(t.total_for("missing"), Duration::ZERO);
    }
}
