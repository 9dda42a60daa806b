//! Admin module for SmartLMS
//!
//! Superadmin-only account management:
//! - Listing students and lecturers, and the pending approval queue
//! - Approving or rejecting registrations
//! - Deleting accounts

pub mod api;

pub use api::{AdminApiState, admin_api_router};
