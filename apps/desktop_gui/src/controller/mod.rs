//! Controller layer: screen state, reducer-like transitions, and validation.

pub mod enrollments;
pub mod events;
pub mod programs;
pub mod users;
pub mod validation;
