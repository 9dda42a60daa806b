//! SmartLMS - learning management backend
//!
//! REST API for courses, students and lecturers, project and task
//! authoring with file uploads, student progress, deadline reminders,
//! learning goals and at-risk predictions.

pub mod app;
pub mod core;
