//! Dental case domain module.
//!
//! Business rules for lab work orders: validation, tooth counting, material
//! parsing, the deletion-request lifecycle and listing filters. Pure domain
//! logic (no IO, no HTTP, no storage).

pub mod calendar;
pub mod case;
pub mod filter;
pub mod material;

pub use calendar::LabCalendar;
pub use case::{CasePatch, CaseSource, DentalCase, NewCase, count_teeth};
pub use filter::{CaseFilter, month_options, sort_newest_first};
pub use material::{Material, ProsthesisType};
