//! Student progress API endpoints
//!
//! - GET/POST /api/projects-and-tasks/student/project-progress
//! - GET/POST /api/projects-and-tasks/student/task-progress
//! - GET /api/student/project-progress/projects - All project progress with names
//! - GET /api/student/task-progress/tasks - All task progress with names

use axum::{
    Router,
    extract::{Query, State},
    http::HeaderMap,
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::next_status;
use crate::core::auth::{JwtService, require_student};
use crate::core::db::models::{
    MainTaskProgress, ProgressStatus, StudentProjectProgress, StudentTaskProgress, SubtaskProgress,
};
use crate::core::db::repositories::{
    ProgressRepository, ProjectProgressOverview, ProjectRepository, ProjectRepositoryError,
    TaskProgressOverview, TaskRepository,
};
use crate::core::response::{ApiError, ApiJson, ApiResponse, ApiResult};
use crate::core::validation::parse_enum;

/// Progress API state
#[derive(Clone)]
pub struct ProgressApiState {
    pub progress: ProgressRepository,
    pub projects: ProjectRepository,
    pub tasks: TaskRepository,
    pub jwt_service: JwtService,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressQuery {
    pub project_id: Option<String>,
    pub task_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectProgressRequest {
    pub project_id: Option<String>,
    pub status: Option<String>,
    pub main_tasks: Option<Vec<MainTaskProgress>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskProgressRequest {
    pub task_id: Option<String>,
    pub status: Option<String>,
    pub subtasks: Option<Vec<SubtaskProgress>>,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse<T> {
    pub progress: T,
}

#[derive(Debug, Serialize)]
pub struct ProgressOverviewResponse<T> {
    pub progress: Vec<T>,
    pub count: usize,
}

/// A missing id is reported as 404, matching the lookup that would follow
fn item_id(raw: Option<&str>, label: &str) -> Result<Uuid, ApiError> {
    let raw = raw
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::not_found(format!("{} ID is required", label)))?;

    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(format!("{} not found", label)))
}

fn requested_status(raw: Option<&str>) -> Result<Option<ProgressStatus>, ApiError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => parse_enum::<ProgressStatus>(raw)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request("Status must be todo, inprogress or done")),
    }
}

/// Create progress router
pub fn progress_api_router(state: ProgressApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route(
            "/api/projects-and-tasks/student/project-progress",
            get(get_project_progress).post(save_project_progress),
        )
        .route(
            "/api/projects-and-tasks/student/task-progress",
            get(get_task_progress).post(save_task_progress),
        )
        .route(
            "/api/student/project-progress/projects",
            get(project_progress_overview),
        )
        .route("/api/student/task-progress/tasks", get(task_progress_overview))
        .with_state(state)
}

// ============================================================================
// Project Progress
// ============================================================================

/// Fresh checklist built from the project's task tree
async fn initial_project_checklist(
    state: &ProgressApiState,
    project_id: Uuid,
) -> Result<Vec<MainTaskProgress>, ApiError> {
    let project = state
        .projects
        .find_by_id(project_id)
        .await?
        .ok_or(ProjectRepositoryError::ProjectNotFound)?;

    Ok(project.main_tasks.iter().map(MainTaskProgress::from).collect())
}

async fn get_project_progress(
    State(state): State<Arc<ProgressApiState>>,
    headers: HeaderMap,
    Query(query): Query<ProgressQuery>,
) -> ApiResult<ProgressResponse<StudentProjectProgress>> {
    let student_id = require_student(&state.jwt_service, &headers)?;
    let project_id = item_id(query.project_id.as_deref(), "Project")?;

    let progress = match state.progress.find_project_progress(student_id, project_id).await? {
        Some(progress) => progress,
        None => {
            let checklist = initial_project_checklist(&state, project_id).await?;
            state
                .progress
                .upsert_project_progress(student_id, project_id, ProgressStatus::Todo, &checklist)
                .await?
        }
    };

    Ok(ApiResponse::ok(
        "Project progress retrieved",
        ProgressResponse { progress },
    ))
}

async fn save_project_progress(
    State(state): State<Arc<ProgressApiState>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<ProjectProgressRequest>,
) -> ApiResult<ProgressResponse<StudentProjectProgress>> {
    let student_id = require_student(&state.jwt_service, &headers)?;
    let project_id = item_id(request.project_id.as_deref(), "Project")?;
    let requested = requested_status(request.status.as_deref())?;

    let (current, existing) = match state.progress.find_project_progress(student_id, project_id).await? {
        Some(progress) => (progress.status, progress.main_tasks.0),
        None => (
            ProgressStatus::Todo,
            initial_project_checklist(&state, project_id).await?,
        ),
    };

    let status = next_status(current, requested, request.main_tasks.as_deref());
    let checklist = request.main_tasks.unwrap_or(existing);

    let progress = state
        .progress
        .upsert_project_progress(student_id, project_id, status, &checklist)
        .await?;

    tracing::debug!("Student {} project {} now {}", student_id, project_id, status);

    Ok(ApiResponse::ok(
        "Project progress updated",
        ProgressResponse { progress },
    ))
}

// ============================================================================
// Task Progress
// ============================================================================

async fn initial_task_checklist(
    state: &ProgressApiState,
    task_id: Uuid,
) -> Result<Vec<SubtaskProgress>, ApiError> {
    let task = state
        .tasks
        .find_by_id(task_id)
        .await?
        .ok_or(ProjectRepositoryError::TaskNotFound)?;

    Ok(task.subtasks.iter().map(SubtaskProgress::from).collect())
}

async fn get_task_progress(
    State(state): State<Arc<ProgressApiState>>,
    headers: HeaderMap,
    Query(query): Query<ProgressQuery>,
) -> ApiResult<ProgressResponse<StudentTaskProgress>> {
    let student_id = require_student(&state.jwt_service, &headers)?;
    let task_id = item_id(query.task_id.as_deref(), "Task")?;

    let progress = match state.progress.find_task_progress(student_id, task_id).await? {
        Some(progress) => progress,
        None => {
            let checklist = initial_task_checklist(&state, task_id).await?;
            state
                .progress
                .upsert_task_progress(student_id, task_id, ProgressStatus::Todo, &checklist)
                .await?
        }
    };

    Ok(ApiResponse::ok(
        "Task progress retrieved",
        ProgressResponse { progress },
    ))
}

async fn save_task_progress(
    State(state): State<Arc<ProgressApiState>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<TaskProgressRequest>,
) -> ApiResult<ProgressResponse<StudentTaskProgress>> {
    let student_id = require_student(&state.jwt_service, &headers)?;
    let task_id = item_id(request.task_id.as_deref(), "Task")?;
    let requested = requested_status(request.status.as_deref())?;

    let (current, existing) = match state.progress.find_task_progress(student_id, task_id).await? {
        Some(progress) => (progress.status, progress.subtasks.0),
        None => (
            ProgressStatus::Todo,
            initial_task_checklist(&state, task_id).await?,
        ),
    };

    let status = next_status(current, requested, request.subtasks.as_deref());
    let checklist = request.subtasks.unwrap_or(existing);

    let progress = state
        .progress
        .upsert_task_progress(student_id, task_id, status, &checklist)
        .await?;

    Ok(ApiResponse::ok(
        "Task progress updated",
        ProgressResponse { progress },
    ))
}

// ============================================================================
// Overviews
// ============================================================================

async fn project_progress_overview(
    State(state): State<Arc<ProgressApiState>>,
    headers: HeaderMap,
) -> ApiResult<ProgressOverviewResponse<ProjectProgressOverview>> {
    let student_id = require_student(&state.jwt_service, &headers)?;
    let progress = state.progress.list_project_overview(student_id).await?;

    Ok(ApiResponse::ok(
        "Project progress retrieved successfully",
        ProgressOverviewResponse {
            count: progress.len(),
            progress,
        },
    ))
}

async fn task_progress_overview(
    State(state): State<Arc<ProgressApiState>>,
    headers: HeaderMap,
) -> ApiResult<ProgressOverviewResponse<TaskProgressOverview>> {
    let student_id = require_student(&state.jwt_service, &headers)?;
    let progress = state.progress.list_task_overview(student_id).await?;

    Ok(ApiResponse::ok(
        "Task progress retrieved successfully",
        ProgressOverviewResponse {
            count: progress.len(),
            progress,
        },
    ))
}
