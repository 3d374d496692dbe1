//! Assignment domain models.
//!
//! Provides the plain data structures exchanged with the competition data
//! store: activities and their groups, people and their assignments, and the
//! extension containers both carry.
//!
//! # Domain Mappings
//!
//! | u-assign | Speedcubing | Conference | Sports league |
//! |----------|-------------|------------|---------------|
//! | Activity | Round / Group | Session | Match slot |
//! | Person | Competitor / Volunteer | Attendee / Crew | Player / Referee |
//! | Assignment | Group or staff job | Seat or shift | Roster spot |
//! | Extensions | WCIF extensions | Custom fields | Metadata |

mod activity;
mod competition;
mod extension;
mod person;

pub use activity::{Activity, ActivityCode, ActivityId, TimeSpan};
pub use competition::{ActivityIndex, Competition, Event, Room, Round, RoundResult, Venue};
pub use extension::{ExtensionValue, Extensions, FEATURED_NAMESPACE, PROPERTIES_NAMESPACE};
pub use person::{Assignment, AssignmentCode, Person, PersonId, PersonalBest, ResultKind};
