//! Student learning goals
//!
//! Goals are private to the student who created them. Status follows
//! progress and the target date whenever a goal is saved.

pub mod api;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::db::models::{GoalFields, GoalStatus, Milestone};

pub use api::{GoalApiState, goal_api_router};

pub fn clamp_progress(progress: f64) -> i32 {
    progress.round().clamp(0.0, 100.0) as i32
}

/// Status rules applied on every save
pub fn apply_save_rules(fields: &mut GoalFields, now: DateTime<Utc>) {
    if fields.progress >= 100 && fields.status != GoalStatus::Cancelled {
        fields.status = GoalStatus::Completed;
        fields.completed_at.get_or_insert(now);
    }

    if fields.target_date < now && fields.status == GoalStatus::Active && fields.progress < 100 {
        fields.status = GoalStatus::Overdue;
    }
}

/// Fill in missing ids and stamp `completedAt` on newly completed milestones
pub fn stamp_milestones(
    previous: &[Milestone],
    incoming: Vec<Milestone>,
    now: DateTime<Utc>,
) -> Vec<Milestone> {
    incoming
        .into_iter()
        .map(|mut milestone| {
            if milestone.id.trim().is_empty() {
                milestone.id = Uuid::new_v4().to_string();
            }

            if !milestone.completed {
                milestone.completed_at = None;
                return milestone;
            }

            let earlier = previous
                .iter()
                .find(|m| m.id == milestone.id && m.completed)
                .and_then(|m| m.completed_at);

            milestone.completed_at = milestone.completed_at.or(earlier).or(Some(now));
            milestone
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::models::{GoalCategory, GoalPriority};
    use chrono::Duration;

    fn fields(progress: i32, target_in_days: i64) -> GoalFields {
        GoalFields {
            title: "Finish the compiler".to_string(),
            description: Some("Type checker and codegen".to_string()),
            category: GoalCategory::Academic,
            target_date: Utc::now() + Duration::days(target_in_days),
            priority: GoalPriority::Medium,
            status: GoalStatus::Active,
            progress,
            milestones: vec![],
            tags: vec![],
            course_id: None,
            completed_at: None,
        }
    }

    fn milestone(id: &str, completed: bool) -> Milestone {
        Milestone {
            id: id.to_string(),
            title: format!("Milestone {}", id),
            completed,
            completed_at: None,
        }
    }

    #[test]
    fn test_clamp_progress() {
        assert_eq!(clamp_progress(-5.0), 0);
        assert_eq!(clamp_progress(42.4), 42);
        assert_eq!(clamp_progress(150.0), 100);
    }

    #[test]
    fn test_full_progress_completes_goal() {
        let now = Utc::now();
        let mut goal = fields(100, 7);

        apply_save_rules(&mut goal, now);

        assert_eq!(goal.status, GoalStatus::Completed);
        assert_eq!(goal.completed_at, Some(now));
    }

    #[test]
    fn test_completion_keeps_existing_timestamp() {
        let earlier = Utc::now() - Duration::days(3);
        let mut goal = fields(100, 7);
        goal.status = GoalStatus::Completed;
        goal.completed_at = Some(earlier);

        apply_save_rules(&mut goal, Utc::now());

        assert_eq!(goal.completed_at, Some(earlier));
    }

    #[test]
    fn test_cancelled_goal_stays_cancelled_at_full_progress() {
        let mut goal = fields(100, 7);
        goal.status = GoalStatus::Cancelled;

        apply_save_rules(&mut goal, Utc::now());

        assert_eq!(goal.status, GoalStatus::Cancelled);
        assert!(goal.completed_at.is_none());
    }

    #[test]
    fn test_past_target_marks_overdue() {
        let mut goal = fields(40, -1);
        apply_save_rules(&mut goal, Utc::now());
        assert_eq!(goal.status, GoalStatus::Overdue);

        let mut cancelled = fields(40, -1);
        cancelled.status = GoalStatus::Cancelled;
        apply_save_rules(&mut cancelled, Utc::now());
        assert_eq!(cancelled.status, GoalStatus::Cancelled);
    }

    #[test]
    fn test_future_target_stays_active() {
        let mut goal = fields(40, 10);
        apply_save_rules(&mut goal, Utc::now());
        assert_eq!(goal.status, GoalStatus::Active);
        assert!(goal.completed_at.is_none());
    }

    #[test]
    fn test_stamp_milestones() {
        let now = Utc::now();
        let done_at = now - Duration::days(2);
        let previous = vec![Milestone {
            completed_at: Some(done_at),
            ..milestone("a", true)
        }];

        let stamped = stamp_milestones(
            &previous,
            vec![milestone("a", true), milestone("b", true), milestone("", false)],
            now,
        );

        assert_eq!(stamped[0].completed_at, Some(done_at));
        assert_eq!(stamped[1].completed_at, Some(now));
        assert!(!stamped[2].id.is_empty());
        assert!(stamped[2].completed_at.is_none());
    }

    #[test]
    fn test_unchecked_milestone_loses_timestamp() {
        let previous = vec![Milestone {
            completed_at: Some(Utc::now()),
            ..milestone("a", true)
        }];

        let stamped = stamp_milestones(&previous, vec![milestone("a", false)], Utc::now());

        assert!(stamped[0].completed_at.is_none());
    }
}
