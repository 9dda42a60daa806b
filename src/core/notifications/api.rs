//! Student notification API endpoints
//!
//! - POST /api/projects-and-tasks/student/notifications/scheduled-reminders
//! - GET  /api/projects-and-tasks/student/notifications/scheduled-reminders
//! - GET  /api/projects-and-tasks/notifications/scheduled-reminders
//! - POST /api/projects-and-tasks/notifications/mark-read
//! - GET  /api/projects-and-tasks/student/notifications/init

use axum::{Router, extract::State, http::HeaderMap, routing::get, routing::post};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::poller::SchedulerStatus;
use super::schedule::{ReminderTarget, ScheduleMode, build_reminders, deadline_instant};
use crate::core::auth::{JwtService, require_student};
use crate::core::db::models::{Notification, ScheduledReminder};
use crate::core::db::repositories::{
    NotificationRepository, ProjectRepository, ProjectRepositoryError, ReminderRepository,
    TaskRepository,
};
use crate::core::response::{ApiError, ApiJson, ApiResponse, ApiResult};

/// Notification API state
#[derive(Clone)]
pub struct NotificationApiState {
    pub reminders: ReminderRepository,
    pub notifications: NotificationRepository,
    pub projects: ProjectRepository,
    pub tasks: TaskRepository,
    pub schedule_mode: ScheduleMode,
    pub scheduler: SchedulerStatus,
    pub jwt_service: JwtService,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleRequest {
    pub project_id: Option<String>,
    pub task_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarkReadRequest {
    pub notification_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RemindersResponse {
    pub reminders: Vec<ScheduledReminder>,
}

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub notification: Notification,
}

#[derive(Debug, Serialize)]
pub struct SchedulerResponse {
    pub running: bool,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Which item to schedule for; an unparsable id cannot exist, so it is a 404
fn schedule_target(request: &ScheduleRequest) -> Result<ReminderTarget, ApiError> {
    if let Some(raw) = non_blank(request.project_id.as_deref()) {
        let id = Uuid::parse_str(raw).map_err(|_| ApiError::not_found("Project not found"))?;
        return Ok(ReminderTarget::Project(id));
    }

    if let Some(raw) = non_blank(request.task_id.as_deref()) {
        let id = Uuid::parse_str(raw).map_err(|_| ApiError::not_found("Task not found"))?;
        return Ok(ReminderTarget::Task(id));
    }

    Err(ApiError::bad_request("Project ID or Task ID is required"))
}

/// Create notifications router
pub fn notification_api_router(state: NotificationApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route(
            "/api/projects-and-tasks/student/notifications/scheduled-reminders",
            get(list_notifications).post(schedule_reminders),
        )
        .route(
            "/api/projects-and-tasks/notifications/scheduled-reminders",
            get(list_notifications),
        )
        .route(
            "/api/projects-and-tasks/notifications/mark-read",
            post(mark_read),
        )
        .route(
            "/api/projects-and-tasks/student/notifications/init",
            get(scheduler_state),
        )
        .with_state(state)
}

async fn schedule_reminders(
    State(state): State<Arc<NotificationApiState>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<ScheduleRequest>,
) -> ApiResult<RemindersResponse> {
    let student_id = require_student(&state.jwt_service, &headers)?;
    let target = schedule_target(&request)?;

    let deadline = match target {
        ReminderTarget::Project(id) => {
            let project = state
                .projects
                .find_by_id(id)
                .await?
                .ok_or(ProjectRepositoryError::ProjectNotFound)?;
            deadline_instant(project.deadline_date, Some(&project.deadline_time))
        }
        ReminderTarget::Task(id) => {
            let task = state
                .tasks
                .find_by_id(id)
                .await?
                .ok_or(ProjectRepositoryError::TaskNotFound)?;
            let date = task
                .deadline_date
                .ok_or_else(|| ApiError::bad_request("Task has no deadline"))?;
            deadline_instant(date, Some(&task.deadline_time))
        }
    };

    let existing = state
        .reminders
        .list_for_item(student_id, target.project_id(), target.task_id())
        .await?;
    if !existing.is_empty() {
        return Ok(ApiResponse::ok(
            "Reminders already scheduled",
            RemindersResponse {
                reminders: existing,
            },
        ));
    }

    let planned = build_reminders(student_id, target, deadline, Utc::now(), state.schedule_mode);
    let reminders = state.reminders.create_many(&planned).await?;
    if reminders.is_empty() {
        // A concurrent request scheduled this item first
        let existing = state
            .reminders
            .list_for_item(student_id, target.project_id(), target.task_id())
            .await?;
        return Ok(ApiResponse::ok(
            "Reminders already scheduled",
            RemindersResponse {
                reminders: existing,
            },
        ));
    }

    tracing::info!(
        "Scheduled {} reminders for student {} (deadline {})",
        reminders.len(),
        student_id,
        deadline
    );

    Ok(ApiResponse::ok(
        "Reminders scheduled",
        RemindersResponse { reminders },
    ))
}

async fn list_notifications(
    State(state): State<Arc<NotificationApiState>>,
    headers: HeaderMap,
) -> ApiResult<NotificationsResponse> {
    let student_id = require_student(&state.jwt_service, &headers)?;
    let notifications = state.notifications.list_recent(student_id).await?;

    Ok(ApiResponse::ok(
        "Notifications retrieved",
        NotificationsResponse { notifications },
    ))
}

async fn mark_read(
    State(state): State<Arc<NotificationApiState>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<MarkReadRequest>,
) -> ApiResult<NotificationResponse> {
    let student_id = require_student(&state.jwt_service, &headers)?;

    let raw = non_blank(request.notification_id.as_deref())
        .ok_or_else(|| ApiError::not_found("Notification ID is required"))?;
    let id = Uuid::parse_str(raw).map_err(|_| ApiError::not_found("Notification not found"))?;

    let notification = state
        .notifications
        .mark_read(id, student_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Notification not found"))?;

    Ok(ApiResponse::ok(
        "Notification marked as read",
        NotificationResponse { notification },
    ))
}

async fn scheduler_state(
    State(state): State<Arc<NotificationApiState>>,
    headers: HeaderMap,
) -> ApiResult<SchedulerResponse> {
    require_student(&state.jwt_service, &headers)?;

    let running = state.scheduler.is_running();
    let message = if running {
        "Scheduler already running"
    } else {
        "Scheduler is not running"
    };

    Ok(ApiResponse::ok(message, SchedulerResponse { running }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::UserRole;
    use crate::core::testing::{jwt, lazy_pool, request, send, token_for};
    use axum::http::StatusCode;
    use serde_json::json;

    fn app() -> Router {
        let pool = lazy_pool();
        notification_api_router(NotificationApiState {
            reminders: ReminderRepository::new(pool.clone()),
            notifications: NotificationRepository::new(pool.clone()),
            projects: ProjectRepository::new(pool.clone()),
            tasks: TaskRepository::new(pool),
            schedule_mode: ScheduleMode::Test,
            scheduler: SchedulerStatus::default(),
            jwt_service: jwt(),
        })
    }

    // ========================================================================
    // Target parsing
    // ========================================================================

    #[test]
    fn test_schedule_target() {
        let project = Uuid::new_v4();
        let target = schedule_target(&ScheduleRequest {
            project_id: Some(project.to_string()),
            task_id: None,
        })
        .unwrap();
        assert_eq!(target, ReminderTarget::Project(project));

        let task = Uuid::new_v4();
        let target = schedule_target(&ScheduleRequest {
            project_id: Some("  ".to_string()),
            task_id: Some(task.to_string()),
        })
        .unwrap();
        assert_eq!(target, ReminderTarget::Task(task));
    }

    #[test]
    fn test_schedule_target_errors() {
        let neither = schedule_target(&ScheduleRequest::default()).unwrap_err();
        assert_eq!(neither.status(), StatusCode::BAD_REQUEST);

        let bad = schedule_target(&ScheduleRequest {
            project_id: Some("abc".to_string()),
            task_id: None,
        })
        .unwrap_err();
        assert_eq!(bad.status(), StatusCode::NOT_FOUND);
        assert_eq!(bad.to_string(), "Project not found");
    }

    // ========================================================================
    // Routes
    // ========================================================================

    #[tokio::test]
    async fn test_schedule_requires_item() {
        let token = token_for(UserRole::Student);
        let req = request(
            "POST",
            "/api/projects-and-tasks/student/notifications/scheduled-reminders",
            Some(&token),
            Some(json!({})),
        );

        let (status, body) = send(app(), req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Project ID or Task ID is required");
    }

    #[tokio::test]
    async fn test_mark_read_requires_id() {
        let token = token_for(UserRole::Student);
        let req = request(
            "POST",
            "/api/projects-and-tasks/notifications/mark-read",
            Some(&token),
            Some(json!({})),
        );

        let (status, body) = send(app(), req).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Notification ID is required");
    }

    #[tokio::test]
    async fn test_notifications_require_student() {
        let req = request(
            "GET",
            "/api/projects-and-tasks/notifications/scheduled-reminders",
            None,
            None,
        );

        let (status, _) = send(app(), req).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_scheduler_state() {
        let token = token_for(UserRole::Student);
        let req = request(
            "GET",
            "/api/projects-and-tasks/student/notifications/init",
            Some(&token),
            None,
        );

        let (status, body) = send(app(), req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["running"], false);
    }
}
