//! Templates module for SmartLMS
//!
//! Lecturers keep reusable project and task blueprints per course.

pub mod api;

pub use api::{TemplateApiState, template_api_router};
