//! Students module for SmartLMS
//!
//! Student directory lookups and the student's own course catalogue.

pub mod api;

pub use api::{StudentApiState, student_api_router};
