//! Deadline reminders and student notifications
//!
//! Scheduling a project or task for a student creates four reminder rows at
//! 25/50/75/100 percent of the time left. The poller turns due reminders
//! into notifications while the student's work is unfinished.

pub mod api;
pub mod poller;
pub mod schedule;

pub use api::{NotificationApiState, notification_api_router};
pub use poller::{ReminderPoller, SchedulerStatus};
pub use schedule::ScheduleMode;
