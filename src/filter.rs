//! Predicate types shared by the engines.
//!
//! The scripting layer compiles user expressions into these closures; the
//! engines only ever call them.

use std::sync::Arc;

use crate::models::{Activity, Person};

/// Person-eligibility predicate.
pub type PersonFilter = Arc<dyn Fn(&Person) -> bool + Send + Sync>;

/// Activity-eligibility predicate.
pub type ActivityFilter = Arc<dyn Fn(&Activity) -> bool + Send + Sync>;

/// Numeric key extracted from a person (sorting, constraint values).
pub type PersonKey = Arc<dyn Fn(&Person) -> Option<f64> + Send + Sync>;

/// Predicate accepting every person.
pub fn any_person() -> PersonFilter {
    Arc::new(|_: &Person| true)
}

/// Predicate accepting every activity.
pub fn any_activity() -> ActivityFilter {
    Arc::new(|_: &Activity| true)
}

/// Key reading a numeric (or boolean) custom property.
pub fn property_key(name: impl Into<String>) -> PersonKey {
    let name = name.into();
    Arc::new(move |p: &Person| p.property(&name).and_then(|v| v.as_f64()))
}
