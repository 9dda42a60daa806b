//! Projects module for SmartLMS
//!
//! Lecturer-authored projects, stand-alone tasks and code assignments, plus
//! the student view of everything assigned to their courses.

pub mod api;
pub mod input;

pub use api::{ProjectApiState, project_api_router};
