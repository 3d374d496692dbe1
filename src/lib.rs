//! Assignment engines for competition scheduling.
//!
//! Places people into time-boxed activities by solving small integer linear
//! programs: competitors into the groups of a round, volunteers into staff
//! jobs, and whole populations into clusters. Every engine maximizes a score
//! built from pluggable scorers or constraints and never produces a time
//! conflict.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Competition`, `Activity`, `ActivityCode`,
//!   `Person`, `Assignment`, `ExtensionValue`
//! - **`groups`**: Competitor group assignment (`GroupAssigner`)
//! - **`staff`**: Staff job assignment (`StaffAssigner`)
//! - **`clustering`**: Population clustering (`Clusterer`)
//! - **`scoring`**: Scorer traits and concrete scorers
//! - **`ilp`**: Keyed ILP model and solver backends
//! - **`validation`**: Input integrity checks (duplicate IDs, references, jobs)
//! - **`report`**: Post-run audit (conflicts, group sizes, staff load)
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use u_assign::models::{Activity, ActivityCode, ActivityId, Competition, Person, Room, Venue};
//! use u_assign::staff::{Job, StaffAssigner, StaffAssignmentRequest};
//! use u_assign::timing::Timings;
//!
//! let start = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
//! let end = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
//! let mut competition = Competition::new("Example Open")
//!     .with_venue(Venue::new("Hall", "UTC").with_room(
//!         Room::new("Main").with_activity(Activity::new(1, ActivityCode::round("333", 1), start, end)),
//!     ))
//!     .with_person(Person::new(1, "Ana"))
//!     .with_person(Person::new(2, "Ben"));
//!
//! let request = StaffAssignmentRequest::new([ActivityId(1)]).with_job(Job::new("judge", 2));
//! let outcome = StaffAssigner::new().assign(&mut competition, request, &mut Timings::new())?;
//! assert_eq!(outcome.assigned_count(), 2);
//! # Ok::<(), u_assign::error::AssignmentError>(())
//! ```
//!
//! # References
//!
//! - Wolsey (1998), "Integer Programming"
//! - Burkard, Dell'Amico & Martello (2012), "Assignment Problems"
//! - Mulvey & Beck (1984), "Solving capacitated clustering problems"

pub mod clustering;
pub mod config;
pub mod error;
pub mod filter;
pub mod groups;
pub mod ilp;
pub mod models;
pub mod ranking;
pub mod report;
pub mod scoring;
pub mod staff;
pub mod timing;
pub mod validation;
pub mod warning;

#[cfg(test)]
mod testing;
