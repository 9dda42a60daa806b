//! Background reminder poller
//!
//! Wakes on a fixed interval, turns due reminders into notifications and
//! marks them processed. A failing reminder is logged and left for the rest
//! of the batch to continue.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;

use super::schedule::{
    ReminderTarget, project_snapshot, project_summary, reminder_text, should_send_reminder,
    task_snapshot, task_summary,
};
use crate::core::db::models::{
    CreateNotification, ProgressStatus, ScheduledReminder, TaskProgressSnapshot,
};
use crate::core::db::repositories::{
    NotificationRepository, ProgressRepository, ProjectRepository, ProjectRepositoryError,
    ReminderRepository, TaskRepository,
};

/// Maximum reminders handled per tick
pub const REMINDER_BATCH_SIZE: i64 = 100;

#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Project(#[from] ProjectRepositoryError),
}

/// Shared flag telling whether the poller loop is alive
#[derive(Debug, Clone, Default)]
pub struct SchedulerStatus {
    running: Arc<AtomicBool>,
}

impl SchedulerStatus {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }
}

/// What happened to a single due reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderOutcome {
    Notified,
    Skipped,
}

/// Counts for one tick
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub notified: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Everything the notification needs from a project or task
struct DueItem {
    target: ReminderTarget,
    name: String,
    status: ProgressStatus,
    summary: String,
    snapshot: Vec<TaskProgressSnapshot>,
}

#[derive(Clone)]
pub struct ReminderPoller {
    reminders: ReminderRepository,
    notifications: NotificationRepository,
    progress: ProgressRepository,
    projects: ProjectRepository,
    tasks: TaskRepository,
    interval: Duration,
    status: SchedulerStatus,
}

impl ReminderPoller {
    pub fn new(
        reminders: ReminderRepository,
        notifications: NotificationRepository,
        progress: ProgressRepository,
        projects: ProjectRepository,
        tasks: TaskRepository,
        interval: Duration,
    ) -> Self {
        Self {
            reminders,
            notifications,
            progress,
            projects,
            tasks,
            interval,
            status: SchedulerStatus::default(),
        }
    }

    pub fn status(&self) -> SchedulerStatus {
        self.status.clone()
    }

    /// Start the loop on the runtime
    pub fn spawn(self) -> JoinHandle<()> {
        let status = self.status.clone();
        status.set_running(true);

        tracing::info!("Reminder poller started (every {:?})", self.interval);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut ticks = IntervalStream::new(interval);

            while ticks.next().await.is_some() {
                match self.tick(Utc::now()).await {
                    Ok(report) if report.notified + report.skipped + report.failed > 0 => {
                        tracing::info!(
                            "Reminder tick: {} notified, {} skipped, {} failed",
                            report.notified,
                            report.skipped,
                            report.failed
                        );
                    }
                    Ok(_) => tracing::trace!("Reminder tick: nothing due"),
                    Err(e) => tracing::error!("Failed to fetch due reminders: {}", e),
                }
            }

            status.set_running(false);
        })
    }

    /// Process every reminder due at `now`
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<TickReport, PollerError> {
        let due = self.reminders.list_due(now, REMINDER_BATCH_SIZE).await?;
        let mut report = TickReport::default();

        for reminder in due {
            match self.process(&reminder, now).await {
                Ok(ReminderOutcome::Notified) => report.notified += 1,
                Ok(ReminderOutcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!("Reminder {} failed: {}", reminder.id, e);
                }
            }
        }

        Ok(report)
    }

    async fn process(
        &self,
        reminder: &ScheduledReminder,
        now: DateTime<Utc>,
    ) -> Result<ReminderOutcome, PollerError> {
        let outcome = self.notify(reminder, now).await?;
        self.reminders.mark_processed(reminder.id).await?;
        Ok(outcome)
    }

    async fn notify(
        &self,
        reminder: &ScheduledReminder,
        now: DateTime<Utc>,
    ) -> Result<ReminderOutcome, PollerError> {
        let Some(item) = self.load_item(reminder).await? else {
            return Ok(ReminderOutcome::Skipped);
        };

        if !should_send_reminder(item.status) {
            return Ok(ReminderOutcome::Skipped);
        }

        let already_sent = self
            .notifications
            .exists_for_checkpoint(
                reminder.student_id,
                reminder.project_id,
                reminder.task_id,
                reminder.reminder_percentage,
            )
            .await?;
        if already_sent {
            return Ok(ReminderOutcome::Skipped);
        }

        let text = reminder_text(reminder.reminder_type, &item.name, &item.summary);

        self.notifications
            .create(&CreateNotification {
                student_id: reminder.student_id,
                project_id: item.target.project_id(),
                task_id: item.target.task_id(),
                notification_type: item.target.notification_type(),
                reminder_percentage: Some(reminder.reminder_percentage),
                title: text.title,
                message: text.message,
                description: text.description,
                task_progress: item.snapshot,
                sent_at: Some(now),
                scheduled_for: reminder.scheduled_for,
            })
            .await?;

        tracing::debug!(
            "Sent {} reminder to student {}",
            reminder.reminder_type,
            reminder.student_id
        );

        Ok(ReminderOutcome::Notified)
    }

    /// Item plus the student's progress; `None` when either is gone
    async fn load_item(&self, reminder: &ScheduledReminder) -> Result<Option<DueItem>, PollerError> {
        if let Some(project_id) = reminder.project_id {
            let Some(project) = self.projects.find_by_id(project_id).await? else {
                return Ok(None);
            };
            let Some(progress) = self
                .progress
                .find_project_progress(reminder.student_id, project_id)
                .await?
            else {
                return Ok(None);
            };

            return Ok(Some(DueItem {
                target: ReminderTarget::Project(project_id),
                name: project.project_name,
                status: progress.status,
                summary: project_summary(&progress.main_tasks),
                snapshot: project_snapshot(&progress.main_tasks),
            }));
        }

        if let Some(task_id) = reminder.task_id {
            let Some(task) = self.tasks.find_by_id(task_id).await? else {
                return Ok(None);
            };
            let Some(progress) = self
                .progress
                .find_task_progress(reminder.student_id, task_id)
                .await?
            else {
                return Ok(None);
            };

            return Ok(Some(DueItem {
                target: ReminderTarget::Task(task_id),
                name: task.task_name,
                status: progress.status,
                summary: task_summary(&progress.subtasks),
                snapshot: task_snapshot(&progress.subtasks),
            }));
        }

        Ok(None)
    }
}
