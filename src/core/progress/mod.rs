//! Student progress module for SmartLMS
//!
//! Tracks which main tasks and subtasks a student has ticked off on each
//! project and task. A record is created from the item's task tree the first
//! time the student opens it.

pub mod api;

use crate::core::db::models::{MainTaskProgress, ProgressStatus, SubtaskProgress};

pub use api::{ProgressApiState, progress_api_router};

/// A checklist entry that can be ticked off
pub trait Completable {
    fn is_completed(&self) -> bool;
}

impl Completable for MainTaskProgress {
    fn is_completed(&self) -> bool {
        self.completed
    }
}

impl Completable for SubtaskProgress {
    fn is_completed(&self) -> bool {
        self.completed
    }
}

/// Status after an update: an explicit status wins, unless a non-empty
/// checklist is sent with every entry completed, which forces `done`.
pub fn next_status<T: Completable>(
    current: ProgressStatus,
    requested: Option<ProgressStatus>,
    checklist: Option<&[T]>,
) -> ProgressStatus {
    let status = requested.unwrap_or(current);

    match checklist {
        Some(items) if !items.is_empty() && items.iter().all(Completable::is_completed) => {
            ProgressStatus::Done
        }
        _ => status,
    }
}
