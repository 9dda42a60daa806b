//! Template API endpoints
//!
//! - POST/GET /api/projects-and-tasks/lecturer/templates/project
//! - POST/GET /api/projects-and-tasks/lecturer/templates/task
//! - DELETE /api/projects-and-tasks/lecturer/templates/{kind}/{id} - Deactivate a template

use axum::{
    Router,
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{delete, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::auth::{JwtService, require_lecturer};
use crate::core::db::models::{
    CreateProjectTemplate, DEFAULT_DEADLINE_TIME, ProjectTemplate, TaskTemplate, TemplateCommon,
    TemplateDocument, TemplateImage, TemplateMainTask, TemplateNotification, TemplateSubtask,
};
use crate::core::db::repositories::{CourseRepository, TemplateRepository};
use crate::core::response::{ApiError, ApiJson, ApiResponse, ApiResult};
use crate::core::validation::{
    ValidationErrors, parse_date, parse_id, parse_time, string_or_number,
};

const MAX_NAME_LENGTH: usize = 200;
const MAX_TOTAL_MARKS: i32 = 1000;

/// Template API state
#[derive(Clone)]
pub struct TemplateApiState {
    pub templates: TemplateRepository,
    pub courses: CourseRepository,
    pub jwt_service: JwtService,
}

// ============================================================================
// Request Types and Validation
// ============================================================================

/// Fields both template kinds accept
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateFields {
    pub course: Option<String>,
    pub description: Option<String>,
    pub special_notes: Option<String>,
    pub notifications: Vec<TemplateNotification>,
    pub images: Vec<TemplateImage>,
    pub documents: Vec<TemplateDocument>,
    pub deadline_date: Option<String>,
    pub deadline_time: Option<String>,
    pub marking_description: Option<String>,
    #[serde(deserialize_with = "string_or_number::deserialize")]
    pub total_marks: Option<String>,
    pub subtasks: Option<Vec<TemplateSubtask>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectTemplateRequest {
    pub project_name: Option<String>,
    pub main_tasks: Option<Vec<TemplateMainTask>>,
    pub is_single_task_template: bool,
    #[serde(flatten)]
    pub fields: TemplateFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskTemplateRequest {
    pub task_name: Option<String>,
    #[serde(flatten)]
    pub fields: TemplateFields,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn check_subtasks(subtasks: &[TemplateSubtask], missing: &str, errors: &mut ValidationErrors) {
    if subtasks.is_empty() {
        errors.add("subtasks", missing);
    }
    for (i, subtask) in subtasks.iter().enumerate() {
        errors.check(
            !subtask.title.trim().is_empty(),
            &format!("subtasks[{}].title", i),
            "Subtask title is required",
        );
    }
}

/// Shared checks; `name_field`/`label` name the kind-specific title field
fn validate_common(
    fields: TemplateFields,
    name: Option<String>,
    name_field: &str,
    label: &str,
    lecturer_id: Uuid,
    errors: &mut ValidationErrors,
) -> Option<TemplateCommon> {
    let course_id = match fields.course.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            let id = Uuid::parse_str(raw).ok();
            errors.check(id.is_some(), "course", "Invalid course ID");
            id
        }
        _ => {
            errors.add("course", "Course is required");
            None
        }
    };

    let name = name.unwrap_or_default().trim().to_string();
    if errors.require(Some(&name), name_field, label) {
        errors.check(
            name.chars().count() <= MAX_NAME_LENGTH,
            name_field,
            &format!("{} must be less than {} characters", label, MAX_NAME_LENGTH),
        );
    }

    let deadline_date = match fields.deadline_date.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            let date = parse_date(raw);
            errors.check(date.is_some(), "deadlineDate", "Invalid deadline date");
            date
        }
        _ => {
            errors.add("deadlineDate", "Deadline date is required");
            None
        }
    };

    let deadline_time = match fields.deadline_time.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => match parse_time(raw) {
            Some(time) => time.format("%H:%M").to_string(),
            None => {
                errors.add("deadlineTime", "Deadline time must be HH:MM");
                DEFAULT_DEADLINE_TIME.to_string()
            }
        },
        _ => DEFAULT_DEADLINE_TIME.to_string(),
    };

    let total_marks = match fields.total_marks.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            let marks = raw
                .parse::<i32>()
                .ok()
                .filter(|m| (0..=MAX_TOTAL_MARKS).contains(m));
            errors.check(
                marks.is_some(),
                "totalMarks",
                "Total marks must be between 0 and 1000",
            );
            marks
        }
        _ => None,
    };

    Some(TemplateCommon {
        course_id: course_id?,
        lecturer_id,
        name,
        description: blank_to_none(fields.description),
        special_notes: blank_to_none(fields.special_notes),
        notifications: fields.notifications,
        images: fields.images,
        documents: fields.documents,
        deadline_date: deadline_date?,
        deadline_time,
        marking_description: blank_to_none(fields.marking_description),
        total_marks,
        subtasks: fields.subtasks.unwrap_or_default(),
    })
}

pub fn validate_project_template(
    request: ProjectTemplateRequest,
    lecturer_id: Uuid,
) -> Result<CreateProjectTemplate, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let single = request.is_single_task_template;
    let main_tasks = request.main_tasks.unwrap_or_default();

    if single {
        check_subtasks(
            request.fields.subtasks.as_deref().unwrap_or_default(),
            "At least one subtask is required for single task templates",
            &mut errors,
        );
    } else {
        errors.check(
            !main_tasks.is_empty(),
            "mainTasks",
            "At least one main task is required for project templates",
        );
        for (i, task) in main_tasks.iter().enumerate() {
            errors.check(
                !task.title.trim().is_empty(),
                &format!("mainTasks[{}].title", i),
                "Task title is required",
            );
        }
    }

    let common = validate_common(
        request.fields,
        request.project_name,
        "projectName",
        "Project name",
        lecturer_id,
        &mut errors,
    );

    match common {
        Some(mut common) if errors.is_empty() => {
            if !single {
                common.subtasks.clear();
            }
            Ok(CreateProjectTemplate {
                common,
                main_tasks: if single { Vec::new() } else { main_tasks },
                is_single_task_template: single,
            })
        }
        _ => Err(errors),
    }
}

pub fn validate_task_template(
    request: TaskTemplateRequest,
    lecturer_id: Uuid,
) -> Result<TemplateCommon, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    check_subtasks(
        request.fields.subtasks.as_deref().unwrap_or_default(),
        "At least one subtask is required",
        &mut errors,
    );

    let common = validate_common(
        request.fields,
        request.task_name,
        "taskName",
        "Task name",
        lecturer_id,
        &mut errors,
    );

    match common {
        Some(common) if errors.is_empty() => Ok(common),
        _ => Err(errors),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TemplateListQuery {
    pub course: Option<String>,
}

impl TemplateListQuery {
    fn course_id(&self) -> Result<Option<Uuid>, ApiError> {
        match self.course.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_id(raw, "course").map(Some),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TemplateKind {
    Project,
    Task,
}

impl TemplateKind {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "project" => Some(TemplateKind::Project),
            "task" => Some(TemplateKind::Task),
            _ => None,
        }
    }
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TemplateResponse<T> {
    pub template: T,
}

#[derive(Debug, Serialize)]
pub struct TemplateListResponse<T> {
    pub templates: Vec<T>,
    pub count: usize,
}

impl<T> TemplateListResponse<T> {
    fn new(templates: Vec<T>) -> Self {
        Self {
            count: templates.len(),
            templates,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeactivatedResponse {
    pub id: Uuid,
}

// ============================================================================
// Router and Handlers
// ============================================================================

/// Create template router
pub fn template_api_router(state: TemplateApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route(
            "/api/projects-and-tasks/lecturer/templates/project",
            post(create_project_template).get(list_project_templates),
        )
        .route(
            "/api/projects-and-tasks/lecturer/templates/task",
            post(create_task_template).get(list_task_templates),
        )
        .route(
            "/api/projects-and-tasks/lecturer/templates/{kind}/{id}",
            delete(deactivate_template),
        )
        .with_state(state)
}

async fn ensure_course(state: &TemplateApiState, course_id: Uuid) -> Result<(), ApiError> {
    match state.courses.find_by_id(course_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::not_found("Course not found")),
    }
}

async fn create_project_template(
    State(state): State<Arc<TemplateApiState>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<ProjectTemplateRequest>,
) -> ApiResult<TemplateResponse<ProjectTemplate>> {
    let lecturer_id = require_lecturer(&state.jwt_service, &headers)?;
    let dto = validate_project_template(request, lecturer_id)?;
    ensure_course(&state, dto.common.course_id).await?;

    let template = state.templates.create_project_template(&dto).await?;

    Ok(ApiResponse::created(
        "Project template created successfully",
        TemplateResponse { template },
    ))
}

async fn list_project_templates(
    State(state): State<Arc<TemplateApiState>>,
    headers: HeaderMap,
    Query(query): Query<TemplateListQuery>,
) -> ApiResult<TemplateListResponse<ProjectTemplate>> {
    let lecturer_id = require_lecturer(&state.jwt_service, &headers)?;
    let course_id = query.course_id()?;

    let templates = state
        .templates
        .list_project_templates(lecturer_id, course_id)
        .await?;

    Ok(ApiResponse::ok(
        "Templates retrieved successfully",
        TemplateListResponse::new(templates),
    ))
}

async fn create_task_template(
    State(state): State<Arc<TemplateApiState>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<TaskTemplateRequest>,
) -> ApiResult<TemplateResponse<TaskTemplate>> {
    let lecturer_id = require_lecturer(&state.jwt_service, &headers)?;
    let dto = validate_task_template(request, lecturer_id)?;
    ensure_course(&state, dto.course_id).await?;

    let template = state.templates.create_task_template(&dto).await?;

    Ok(ApiResponse::created(
        "Task template created successfully",
        TemplateResponse { template },
    ))
}

async fn list_task_templates(
    State(state): State<Arc<TemplateApiState>>,
    headers: HeaderMap,
    Query(query): Query<TemplateListQuery>,
) -> ApiResult<TemplateListResponse<TaskTemplate>> {
    let lecturer_id = require_lecturer(&state.jwt_service, &headers)?;
    let course_id = query.course_id()?;

    let templates = state
        .templates
        .list_task_templates(lecturer_id, course_id)
        .await?;

    Ok(ApiResponse::ok(
        "Templates retrieved successfully",
        TemplateListResponse::new(templates),
    ))
}

async fn deactivate_template(
    State(state): State<Arc<TemplateApiState>>,
    headers: HeaderMap,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<DeactivatedResponse> {
    let lecturer_id = require_lecturer(&state.jwt_service, &headers)?;
    let kind = TemplateKind::parse(&kind)
        .ok_or_else(|| ApiError::not_found("Unknown template type"))?;
    let id = parse_id(&id, "template")?;

    let removed = match kind {
        TemplateKind::Project => {
            state
                .templates
                .deactivate_project_template(id, lecturer_id)
                .await?
        }
        TemplateKind::Task => {
            state
                .templates
                .deactivate_task_template(id, lecturer_id)
                .await?
        }
    };

    if !removed {
        return Err(ApiError::not_found("Template not found"));
    }

    tracing::info!("Lecturer {} deactivated template {}", lecturer_id, id);

    Ok(ApiResponse::ok(
        "Template deleted successfully",
        DeactivatedResponse { id },
    ))
}
