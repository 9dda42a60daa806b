//! Reminder scheduling math and notification texts
//!
//! Everything here is pure: the poller and the API feed it `now` and the
//! item data and persist whatever comes back.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::core::db::models::{
    CreateReminder, DEFAULT_DEADLINE_TIME, MainTaskProgress, NotificationType, ProgressStatus,
    ReminderType, SnapshotSubtask, SubtaskProgress, TaskProgressSnapshot,
};
use crate::core::validation::parse_time;

/// Percent-of-time-elapsed checkpoints, the last one being the deadline itself
pub const CHECKPOINTS: [i32; 4] = [25, 50, 75, 100];

/// How reminder times are derived from the deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScheduleMode {
    /// Checkpoints are spread over the time left until the deadline
    #[default]
    Proportional,
    /// Fixed short delays so the whole flow can be watched in a few minutes
    Test,
}

impl ScheduleMode {
    pub fn from_test_flag(test_mode: bool) -> Self {
        if test_mode { Self::Test } else { Self::Proportional }
    }
}

/// Which kind of item a reminder points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderTarget {
    Project(Uuid),
    Task(Uuid),
}

impl ReminderTarget {
    pub fn project_id(self) -> Option<Uuid> {
        match self {
            Self::Project(id) => Some(id),
            Self::Task(_) => None,
        }
    }

    pub fn task_id(self) -> Option<Uuid> {
        match self {
            Self::Task(id) => Some(id),
            Self::Project(_) => None,
        }
    }

    pub fn notification_type(self) -> NotificationType {
        match self {
            Self::Project(_) => NotificationType::ProjectReminder,
            Self::Task(_) => NotificationType::TaskReminder,
        }
    }

    fn reminder_type(self, percentage: i32) -> Option<ReminderType> {
        let project = matches!(self, Self::Project(_));
        let kind = match (project, percentage) {
            (true, 25) => ReminderType::Project25,
            (true, 50) => ReminderType::Project50,
            (true, 75) => ReminderType::Project75,
            (true, 100) => ReminderType::ProjectDeadline,
            (false, 25) => ReminderType::Task25,
            (false, 50) => ReminderType::Task50,
            (false, 75) => ReminderType::Task75,
            (false, 100) => ReminderType::TaskDeadline,
            _ => return None,
        };
        Some(kind)
    }
}

/// Deadline as a UTC instant; a missing or unparsable time means 23:59
pub fn deadline_instant(date: NaiveDate, time: Option<&str>) -> DateTime<Utc> {
    let time = time
        .and_then(parse_time)
        .or_else(|| parse_time(DEFAULT_DEADLINE_TIME))
        .unwrap_or_default();

    date.and_time(time).and_utc()
}

/// When the reminder for `percentage` should fire
pub fn scheduled_for(
    now: DateTime<Utc>,
    deadline: DateTime<Utc>,
    percentage: i32,
    mode: ScheduleMode,
) -> DateTime<Utc> {
    match mode {
        ScheduleMode::Test => {
            let seconds = match percentage {
                25 => 10,
                50 => 30,
                75 => 60,
                _ => 90,
            };
            now + Duration::seconds(seconds)
        }
        ScheduleMode::Proportional => {
            let remaining = deadline - now;
            if remaining <= Duration::zero() {
                return now;
            }
            let offset_ms = remaining.num_milliseconds() * i64::from(percentage) / 100;
            now + Duration::milliseconds(offset_ms)
        }
    }
}

/// The four reminder rows for one student and one item
pub fn build_reminders(
    student_id: Uuid,
    target: ReminderTarget,
    deadline: DateTime<Utc>,
    now: DateTime<Utc>,
    mode: ScheduleMode,
) -> Vec<CreateReminder> {
    CHECKPOINTS
        .iter()
        .filter_map(|&percentage| {
            let reminder_type = target.reminder_type(percentage)?;
            Some(CreateReminder {
                student_id,
                project_id: target.project_id(),
                task_id: target.task_id(),
                reminder_type,
                reminder_percentage: percentage,
                deadline_date: deadline,
                scheduled_for: scheduled_for(now, deadline, percentage, mode),
            })
        })
        .collect()
}

/// Only unfinished work gets reminded
pub fn should_send_reminder(status: ProgressStatus) -> bool {
    matches!(status, ProgressStatus::Todo | ProgressStatus::InProgress)
}

// ============================================================================
// Notification texts
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderText {
    pub title: String,
    pub message: String,
    pub description: String,
}

pub fn reminder_text(reminder_type: ReminderType, name: &str, summary: &str) -> ReminderText {
    use ReminderType::*;

    let (title, message, description) = match reminder_type {
        Project25 | Task25 => (
            "⏰ Time to Start!",
            format!("{} deadline approaching", name),
            format!(
                "You have 75% of the time left. Start working on {} now! {}.",
                name, summary
            ),
        ),
        Project50 | Task50 => (
            "📅 Halfway There!",
            format!("{} is 50% through", name),
            format!("Complete half of the work on {}! {}.", name, summary),
        ),
        Project75 | Task75 => (
            "⚠️ Deadline is Near!",
            format!("{} deadline approaching fast", name),
            format!("Just 25% of time left. Finish up {}! {}.", name, summary),
        ),
        ProjectDeadline | TaskDeadline => (
            "🚨 Deadline Today!",
            format!("{} deadline is today", name),
            format!(
                "Today is the deadline for {}. Complete it now! {}.",
                name, summary
            ),
        ),
    };

    ReminderText {
        title: title.to_string(),
        message,
        description,
    }
}

fn count_completed<'a>(flags: impl Iterator<Item = &'a bool>) -> usize {
    flags.filter(|done| **done).count()
}

pub fn project_summary(main_tasks: &[MainTaskProgress]) -> String {
    let done = count_completed(main_tasks.iter().map(|t| &t.completed));
    let subtasks: Vec<&SubtaskProgress> = main_tasks.iter().flat_map(|t| &t.subtasks).collect();
    let subtasks_done = count_completed(subtasks.iter().map(|s| &s.completed));

    let mut summary = format!(
        "Progress: {}/{} main tasks completed",
        done,
        main_tasks.len()
    );
    if !subtasks.is_empty() {
        summary.push_str(&format!(", {}/{} subtasks done", subtasks_done, subtasks.len()));
    }
    summary
}

pub fn task_summary(subtasks: &[SubtaskProgress]) -> String {
    let done = count_completed(subtasks.iter().map(|s| &s.completed));
    format!("Progress: {}/{} subtasks completed", done, subtasks.len())
}

fn snapshot_subtasks(subtasks: &[SubtaskProgress]) -> Vec<SnapshotSubtask> {
    subtasks
        .iter()
        .map(|s| SnapshotSubtask {
            id: s.id.clone(),
            title: s.title.clone(),
            completed: s.completed,
        })
        .collect()
}

/// One snapshot entry per main task
pub fn project_snapshot(main_tasks: &[MainTaskProgress]) -> Vec<TaskProgressSnapshot> {
    main_tasks
        .iter()
        .map(|task| TaskProgressSnapshot {
            main_task_id: Some(task.id.clone()),
            main_task_title: Some(task.title.clone()),
            subtasks: snapshot_subtasks(&task.subtasks),
            completed: task.completed,
            total_tasks: task.subtasks.len() as i32,
            completed_count: count_completed(task.subtasks.iter().map(|s| &s.completed)) as i32,
        })
        .collect()
}

/// A single entry covering all of the task's subtasks
pub fn task_snapshot(subtasks: &[SubtaskProgress]) -> Vec<TaskProgressSnapshot> {
    let completed_count = count_completed(subtasks.iter().map(|s| &s.completed));

    vec![TaskProgressSnapshot {
        main_task_id: None,
        main_task_title: None,
        subtasks: snapshot_subtasks(subtasks),
        completed: completed_count == subtasks.len(),
        total_tasks: subtasks.len() as i32,
        completed_count: completed_count as i32,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn subtask(id: &str, completed: bool) -> SubtaskProgress {
        SubtaskProgress {
            id: id.to_string(),
            title: format!("Subtask {}", id),
            description: None,
            completed,
        }
    }

    fn main_task(id: &str, completed: bool, subtasks: Vec<SubtaskProgress>) -> MainTaskProgress {
        MainTaskProgress {
            id: id.to_string(),
            title: format!("Main {}", id),
            description: None,
            completed,
            subtasks,
        }
    }

    // ========================================================================
    // Deadlines
    // ========================================================================

    #[test]
    fn test_deadline_instant_uses_time() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let deadline = deadline_instant(date, Some("14:30"));
        assert_eq!(deadline, Utc.with_ymd_and_hms(2025, 3, 10, 14, 30, 0).unwrap());
    }

    #[test]
    fn test_deadline_instant_falls_back_to_end_of_day() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 3, 10, 23, 59, 0).unwrap();

        assert_eq!(deadline_instant(date, None), expected);
        assert_eq!(deadline_instant(date, Some("")), expected);
        assert_eq!(deadline_instant(date, Some("late")), expected);
    }

    // ========================================================================
    // Scheduling
    // ========================================================================

    #[test]
    fn test_scheduled_for_proportional() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let deadline = now + Duration::hours(100);

        let at = |pct| scheduled_for(now, deadline, pct, ScheduleMode::Proportional);

        assert_eq!(at(25), now + Duration::hours(25));
        assert_eq!(at(50), now + Duration::hours(50));
        assert_eq!(at(75), now + Duration::hours(75));
        assert_eq!(at(100), deadline);
    }

    #[test]
    fn test_scheduled_for_past_deadline_is_now() {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
        let deadline = now - Duration::days(2);

        for pct in CHECKPOINTS {
            assert_eq!(scheduled_for(now, deadline, pct, ScheduleMode::Proportional), now);
        }
    }

    #[test]
    fn test_scheduled_for_test_mode() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let deadline = now + Duration::days(30);

        let delays: Vec<i64> = CHECKPOINTS
            .iter()
            .map(|&pct| (scheduled_for(now, deadline, pct, ScheduleMode::Test) - now).num_seconds())
            .collect();

        assert_eq!(delays, vec![10, 30, 60, 90]);
    }

    #[test]
    fn test_build_reminders_for_task() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let deadline = now + Duration::hours(8);
        let student = Uuid::new_v4();
        let task = Uuid::new_v4();

        let reminders = build_reminders(
            student,
            ReminderTarget::Task(task),
            deadline,
            now,
            ScheduleMode::Proportional,
        );

        assert_eq!(reminders.len(), 4);
        assert!(reminders.iter().all(|r| r.task_id == Some(task) && r.project_id.is_none()));
        assert_eq!(
            reminders.iter().map(|r| r.reminder_type).collect::<Vec<_>>(),
            vec![
                ReminderType::Task25,
                ReminderType::Task50,
                ReminderType::Task75,
                ReminderType::TaskDeadline
            ]
        );
        assert_eq!(reminders[1].scheduled_for, now + Duration::hours(4));
        assert!(reminders.iter().all(|r| r.deadline_date == deadline));
    }

    #[test]
    fn test_build_reminders_for_project() {
        let now = Utc::now();
        let project = Uuid::new_v4();

        let reminders = build_reminders(
            Uuid::new_v4(),
            ReminderTarget::Project(project),
            now + Duration::days(4),
            now,
            ScheduleMode::Test,
        );

        assert_eq!(reminders[0].reminder_type, ReminderType::Project25);
        assert_eq!(reminders[3].reminder_type, ReminderType::ProjectDeadline);
        assert_eq!(reminders[3].reminder_percentage, 100);
        assert!(reminders.iter().all(|r| r.project_id == Some(project)));
    }

    #[test]
    fn test_should_send_reminder() {
        assert!(should_send_reminder(ProgressStatus::Todo));
        assert!(should_send_reminder(ProgressStatus::InProgress));
        assert!(!should_send_reminder(ProgressStatus::Done));
    }

    // ========================================================================
    // Texts and snapshots
    // ========================================================================

    #[test]
    fn test_reminder_text() {
        let text = reminder_text(ReminderType::Project50, "Compiler", "Progress: 1/2 main tasks completed");

        assert_eq!(text.title, "📅 Halfway There!");
        assert_eq!(text.message, "Compiler is 50% through");
        assert_eq!(
            text.description,
            "Complete half of the work on Compiler! Progress: 1/2 main tasks completed."
        );

        let deadline = reminder_text(ReminderType::TaskDeadline, "Essay", "Progress: 0/1 subtasks completed");
        assert_eq!(deadline.title, "🚨 Deadline Today!");
        assert_eq!(deadline.message, "Essay deadline is today");
    }

    #[test]
    fn test_project_summary() {
        let tasks = vec![
            main_task("a", true, vec![subtask("1", true), subtask("2", true)]),
            main_task("b", false, vec![subtask("3", false)]),
        ];
        assert_eq!(
            project_summary(&tasks),
            "Progress: 1/2 main tasks completed, 2/3 subtasks done"
        );

        let flat = vec![main_task("a", false, vec![])];
        assert_eq!(project_summary(&flat), "Progress: 0/1 main tasks completed");
    }

    #[test]
    fn test_task_summary_and_snapshot() {
        let subtasks = vec![subtask("1", true), subtask("2", false)];
        assert_eq!(task_summary(&subtasks), "Progress: 1/2 subtasks completed");

        let snapshot = task_snapshot(&subtasks);
        assert_eq!(snapshot.len(), 1);
        assert!(!snapshot[0].completed);
        assert_eq!(snapshot[0].total_tasks, 2);
        assert_eq!(snapshot[0].completed_count, 1);
        assert!(snapshot[0].main_task_id.is_none());
    }

    #[test]
    fn test_project_snapshot() {
        let tasks = vec![main_task("a", true, vec![subtask("1", true)])];
        let snapshot = project_snapshot(&tasks);

        assert_eq!(snapshot[0].main_task_id.as_deref(), Some("a"));
        assert_eq!(snapshot[0].main_task_title.as_deref(), Some("Main a"));
        assert!(snapshot[0].completed);
        assert_eq!(snapshot[0].completed_count, 1);
    }
}
