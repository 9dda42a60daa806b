//! Courses module for SmartLMS
//!
//! This module provides:
//! - Course administration and lecturer course listings
//! - Cohort eligibility rules shared with the student endpoints
//! - Course views with lecturer details populated

pub mod api;
pub mod eligibility;
pub mod view;

pub use api::{CourseApiState, course_api_router};
pub use eligibility::{CourseFilter, EligibilityReason, eligibility_reason, is_eligible};
pub use view::{CourseView, LecturerRef};
