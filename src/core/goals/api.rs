//! Learning goal API endpoints
//!
//! - GET/POST /api/student/learning-goals
//! - GET/PUT/PATCH/DELETE /api/student/learning-goals/{goal_id}

use axum::{
    Router,
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::get,
};
use chrono::{DateTime, NaiveTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::{apply_save_rules, clamp_progress, stamp_milestones};
use crate::core::auth::{JwtService, require_student};
use crate::core::db::models::{
    GoalCategory, GoalFields, GoalFilter, GoalPriority, GoalStatus, LearningGoal, Milestone,
    double_option,
};
use crate::core::db::repositories::{GoalStats, LearningGoalRepository};
use crate::core::response::{ApiError, ApiJson, ApiResponse, ApiResult};
use crate::core::validation::{ValidationErrors, parse_date, parse_enum};

const MAX_TITLE_LENGTH: usize = 200;
const MAX_DESCRIPTION_LENGTH: usize = 1000;
const MAX_TAG_LENGTH: usize = 50;

/// Goal API state
#[derive(Clone)]
pub struct GoalApiState {
    pub goals: LearningGoalRepository,
    pub jwt_service: JwtService,
}

// ============================================================================
// Request Types and Validation
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoalRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub target_date: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub progress: Option<f64>,
    pub milestones: Option<Vec<Milestone>>,
    pub tags: Option<Vec<String>>,
    #[serde(deserialize_with = "double_option::deserialize")]
    pub course_id: Option<Option<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProgressRequest {
    pub progress: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GoalQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
}

/// Accepts a full RFC 3339 timestamp or a bare date (midnight UTC)
fn parse_target_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value.trim()) {
        return Some(dt.with_timezone(&Utc));
    }
    parse_date(value).map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// Trimmed text field; blank counts as missing
fn text_field(
    errors: &mut ValidationErrors,
    value: Option<&str>,
    required: bool,
    field: &str,
    label: &str,
    max: usize,
) -> Option<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => {
            if v.chars().count() > max {
                errors.add(field, format!("{} cannot exceed {} characters", label, max));
            }
            Some(v.to_string())
        }
        Some(_) => {
            errors.add(field, format!("{} is required", label));
            None
        }
        None => {
            if required {
                errors.add(field, format!("{} is required", label));
            }
            None
        }
    }
}

fn enum_field<T: DeserializeOwned>(
    errors: &mut ValidationErrors,
    value: Option<&str>,
    field: &str,
    message: &str,
) -> Option<T> {
    let value = value?;
    let parsed = parse_enum::<T>(value);
    if parsed.is_none() {
        errors.add(field, message);
    }
    parsed
}

/// Validate a create (`base` is `None`) or a partial update of `base`
pub fn validate_goal(
    request: GoalRequest,
    base: Option<GoalFields>,
    now: DateTime<Utc>,
) -> Result<GoalFields, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let creating = base.is_none();

    let title = text_field(
        &mut errors,
        request.title.as_deref(),
        creating,
        "title",
        "Title",
        MAX_TITLE_LENGTH,
    );
    let description = text_field(
        &mut errors,
        request.description.as_deref(),
        creating,
        "description",
        "Description",
        MAX_DESCRIPTION_LENGTH,
    );

    let target_date = match request.target_date.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            let parsed = parse_target_date(raw);
            if parsed.is_none() {
                errors.add("targetDate", "Invalid target date");
            }
            parsed
        }
        Some(_) | None => {
            if creating || request.target_date.is_some() {
                errors.add("targetDate", "Target date is required");
            }
            None
        }
    };

    let category = enum_field::<GoalCategory>(
        &mut errors,
        request.category.as_deref(),
        "category",
        "Category must be academic, skill, project, career or personal",
    );
    let priority = enum_field::<GoalPriority>(
        &mut errors,
        request.priority.as_deref(),
        "priority",
        "Priority must be low, medium or high",
    );
    let status = enum_field::<GoalStatus>(
        &mut errors,
        request.status.as_deref(),
        "status",
        "Status must be active, completed, overdue or cancelled",
    );

    if let Some(progress) = request.progress {
        errors.check(
            (0.0..=100.0).contains(&progress),
            "progress",
            "Progress must be between 0 and 100",
        );
    }

    let tags = request.tags.map(|tags| {
        tags.into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect::<Vec<_>>()
    });
    if let Some(tags) = &tags {
        errors.check(
            tags.iter().all(|tag| tag.chars().count() <= MAX_TAG_LENGTH),
            "tags",
            "Tags cannot exceed 50 characters",
        );
    }

    if let Some(milestones) = &request.milestones {
        for (i, milestone) in milestones.iter().enumerate() {
            let field = format!("milestones[{}].title", i);
            let title = milestone.title.trim();
            if title.is_empty() {
                errors.add(field, "Milestone title is required");
            } else if title.chars().count() > MAX_TITLE_LENGTH {
                errors.add(field, "Milestone title cannot exceed 200 characters");
            }
        }
    }

    let course_id = match request.course_id {
        Some(Some(raw)) if !raw.trim().is_empty() => match Uuid::parse_str(raw.trim()) {
            Ok(id) => Some(Some(id)),
            Err(_) => {
                errors.add("courseId", "Invalid course ID");
                None
            }
        },
        Some(_) => Some(None),
        None => None,
    };

    errors.into_result()?;

    let mut fields = base.unwrap_or_else(|| GoalFields {
        title: String::new(),
        description: None,
        category: GoalCategory::Academic,
        target_date: now,
        priority: GoalPriority::default(),
        status: GoalStatus::default(),
        progress: 0,
        milestones: Vec::new(),
        tags: Vec::new(),
        course_id: None,
        completed_at: None,
    });

    if let Some(title) = title {
        fields.title = title;
    }
    if description.is_some() {
        fields.description = description;
    }
    if let Some(target_date) = target_date {
        fields.target_date = target_date;
    }
    if let Some(category) = category {
        fields.category = category;
    }
    if let Some(priority) = priority {
        fields.priority = priority;
    }
    if let Some(status) = status {
        fields.status = status;
    }
    if let Some(progress) = request.progress {
        fields.progress = clamp_progress(progress);
    }
    if let Some(tags) = tags {
        fields.tags = tags;
    }
    if let Some(course_id) = course_id {
        fields.course_id = course_id;
    }
    if let Some(milestones) = request.milestones {
        fields.milestones = stamp_milestones(&fields.milestones, milestones, now);
    }

    apply_save_rules(&mut fields, now);
    Ok(fields)
}

/// `all` (or nothing) means no filter
fn filter_value<T: DeserializeOwned>(raw: Option<&str>, label: &str) -> Result<Option<T>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => parse_enum::<T>(value)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request(format!("Invalid {} filter", label))),
    }
}

fn goal_filter(query: &GoalQuery) -> Result<GoalFilter, ApiError> {
    Ok(GoalFilter {
        status: filter_value(query.status.as_deref(), "status")?,
        category: filter_value(query.category.as_deref(), "category")?,
        priority: filter_value(query.priority.as_deref(), "priority")?,
    })
}

fn goal_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::not_found("Invalid goal ID"))
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Serialize)]
pub struct GoalResponse {
    pub goal: LearningGoal,
}

#[derive(Debug, Serialize)]
pub struct GoalsResponse {
    pub goals: Vec<LearningGoal>,
    pub stats: GoalStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedGoalResponse {
    pub goal_id: Uuid,
}

// ============================================================================
// Router and Handlers
// ============================================================================

/// Create learning goals router
pub fn goal_api_router(state: GoalApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route(
            "/api/student/learning-goals",
            get(list_goals).post(create_goal),
        )
        .route(
            "/api/student/learning-goals/{goal_id}",
            get(get_goal)
                .put(update_goal)
                .patch(update_progress)
                .delete(delete_goal),
        )
        .with_state(state)
}

async fn list_goals(
    State(state): State<Arc<GoalApiState>>,
    headers: HeaderMap,
    Query(query): Query<GoalQuery>,
) -> ApiResult<GoalsResponse> {
    let student_id = require_student(&state.jwt_service, &headers)?;
    let filter = goal_filter(&query)?;

    let goals = state.goals.list(student_id, &filter).await?;
    let stats = state.goals.stats(student_id).await?;

    Ok(ApiResponse::ok(
        "Goals retrieved successfully",
        GoalsResponse { goals, stats },
    ))
}

async fn create_goal(
    State(state): State<Arc<GoalApiState>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<GoalRequest>,
) -> ApiResult<GoalResponse> {
    let student_id = require_student(&state.jwt_service, &headers)?;
    let fields = validate_goal(request, None, Utc::now())?;

    let goal = state.goals.create(student_id, &fields).await?;
    tracing::debug!("Student {} created goal {}", student_id, goal.id);

    Ok(ApiResponse::created(
        "Goal created successfully",
        GoalResponse { goal },
    ))
}

async fn find_goal(
    state: &GoalApiState,
    id: Uuid,
    student_id: Uuid,
) -> Result<LearningGoal, ApiError> {
    state
        .goals
        .find(id, student_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Goal not found"))
}

async fn get_goal(
    State(state): State<Arc<GoalApiState>>,
    headers: HeaderMap,
    Path(goal_id_raw): Path<String>,
) -> ApiResult<GoalResponse> {
    let student_id = require_student(&state.jwt_service, &headers)?;
    let id = goal_id(&goal_id_raw)?;
    let goal = find_goal(&state, id, student_id).await?;

    Ok(ApiResponse::ok("Goal retrieved successfully", GoalResponse { goal }))
}

async fn save(
    state: &GoalApiState,
    id: Uuid,
    student_id: Uuid,
    fields: &GoalFields,
) -> ApiResult<GoalResponse> {
    let goal = state
        .goals
        .update(id, student_id, fields)
        .await?
        .ok_or_else(|| ApiError::not_found("Goal not found"))?;

    Ok(ApiResponse::ok("Goal updated successfully", GoalResponse { goal }))
}

async fn update_goal(
    State(state): State<Arc<GoalApiState>>,
    headers: HeaderMap,
    Path(goal_id_raw): Path<String>,
    ApiJson(request): ApiJson<GoalRequest>,
) -> ApiResult<GoalResponse> {
    let student_id = require_student(&state.jwt_service, &headers)?;
    let id = goal_id(&goal_id_raw)?;

    let existing = find_goal(&state, id, student_id).await?;
    let fields = validate_goal(request, Some(existing.into()), Utc::now())?;

    save(&state, id, student_id, &fields).await
}

async fn update_progress(
    State(state): State<Arc<GoalApiState>>,
    headers: HeaderMap,
    Path(goal_id_raw): Path<String>,
    ApiJson(request): ApiJson<ProgressRequest>,
) -> ApiResult<GoalResponse> {
    let student_id = require_student(&state.jwt_service, &headers)?;
    let id = goal_id(&goal_id_raw)?;

    let Some(progress) = request.progress else {
        let mut errors = ValidationErrors::new();
        errors.add("progress", "Progress is required");
        return Err(ApiError::validation(errors));
    };

    let mut fields: GoalFields = find_goal(&state, id, student_id).await?.into();
    fields.progress = clamp_progress(progress);
    apply_save_rules(&mut fields, Utc::now());

    save(&state, id, student_id, &fields).await
}

async fn delete_goal(
    State(state): State<Arc<GoalApiState>>,
    headers: HeaderMap,
    Path(goal_id_raw): Path<String>,
) -> ApiResult<DeletedGoalResponse> {
    let student_id = require_student(&state.jwt_service, &headers)?;
    let id = goal_id(&goal_id_raw)?;

    if !state.goals.delete(id, student_id).await? {
        return Err(ApiError::not_found("Goal not found"));
    }

    Ok(ApiResponse::ok(
        "Goal deleted successfully",
        DeletedGoalResponse { goal_id: id },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::UserRole;
    use crate::core::testing::{jwt, lazy_pool, request, send, token_for};
    use axum::http::StatusCode;
    use chrono::Duration;
    use serde_json::json;

    fn app() -> Router {
        goal_api_router(GoalApiState {
            goals: LearningGoalRepository::new(lazy_pool()),
            jwt_service: jwt(),
        })
    }

    fn create_request() -> GoalRequest {
        GoalRequest {
            title: Some("  Pass the algorithms exam ".to_string()),
            description: Some("Revise graphs and dynamic programming".to_string()),
            target_date: Some((Utc::now() + Duration::days(30)).to_rfc3339()),
            ..Default::default()
        }
    }

    // ========================================================================
    // Validation
    // ========================================================================

    #[test]
    fn test_validate_goal_defaults() {
        let fields = validate_goal(create_request(), None, Utc::now()).unwrap();

        assert_eq!(fields.title, "Pass the algorithms exam");
        assert_eq!(fields.category, GoalCategory::Academic);
        assert_eq!(fields.priority, GoalPriority::Medium);
        assert_eq!(fields.status, GoalStatus::Active);
        assert_eq!(fields.progress, 0);
        assert!(fields.course_id.is_none());
    }

    #[test]
    fn test_validate_goal_required_fields() {
        let errors = validate_goal(GoalRequest::default(), None, Utc::now()).unwrap_err();

        assert!(errors.contains("title"));
        assert!(errors.contains("description"));
        assert!(errors.contains("targetDate"));
    }

    #[test]
    fn test_validate_goal_rejects_bad_values() {
        let request = GoalRequest {
            category: Some("hobby".to_string()),
            priority: Some("urgent".to_string()),
            progress: Some(120.0),
            tags: Some(vec!["x".repeat(51)]),
            course_id: Some(Some("nope".to_string())),
            milestones: Some(vec![Milestone {
                id: String::new(),
                title: "  ".to_string(),
                completed: false,
                completed_at: None,
            }]),
            ..create_request()
        };

        let errors = validate_goal(request, None, Utc::now()).unwrap_err();

        assert!(errors.contains("category"));
        assert!(errors.contains("priority"));
        assert!(errors.contains("progress"));
        assert!(errors.contains("tags"));
        assert!(errors.contains("courseId"));
        assert!(errors.contains("milestones[0].title"));
    }

    #[test]
    fn test_validate_goal_accepts_bare_date() {
        let request = GoalRequest {
            target_date: Some("2099-06-01".to_string()),
            ..create_request()
        };

        let fields = validate_goal(request, None, Utc::now()).unwrap();

        assert_eq!(fields.target_date.to_rfc3339(), "2099-06-01T00:00:00+00:00");
    }

    #[test]
    fn test_validate_goal_partial_update() {
        let now = Utc::now();
        let base = validate_goal(create_request(), None, now).unwrap();

        let update = GoalRequest {
            progress: Some(100.0),
            course_id: Some(None),
            ..Default::default()
        };
        let fields = validate_goal(update, Some(base.clone()), now).unwrap();

        assert_eq!(fields.title, base.title);
        assert_eq!(fields.status, GoalStatus::Completed);
        assert_eq!(fields.completed_at, Some(now));
    }

    #[test]
    fn test_validate_goal_update_rejects_blank_title() {
        let base = validate_goal(create_request(), None, Utc::now()).unwrap();
        let update = GoalRequest {
            title: Some("   ".to_string()),
            ..Default::default()
        };

        let errors = validate_goal(update, Some(base), Utc::now()).unwrap_err();

        assert_eq!(errors.get("title").unwrap(), ["Title is required"]);
    }

    #[test]
    fn test_goal_filter_ignores_all() {
        let filter = goal_filter(&GoalQuery {
            status: Some("all".to_string()),
            category: Some("skill".to_string()),
            priority: None,
        })
        .unwrap();

        assert!(filter.status.is_none());
        assert_eq!(filter.category, Some(GoalCategory::Skill));

        let bad = goal_filter(&GoalQuery {
            status: Some("done".to_string()),
            ..Default::default()
        });
        assert!(bad.is_err());
    }

    // ========================================================================
    // Routes
    // ========================================================================

    #[tokio::test]
    async fn test_create_goal_validation() {
        let token = token_for(UserRole::Student);
        let req = request(
            "POST",
            "/api/student/learning-goals",
            Some(&token),
            Some(json!({ "title": "" })),
        );

        let (status, body) = send(app(), req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"]["title"].is_array());
    }

    #[tokio::test]
    async fn test_goal_invalid_id() {
        let token = token_for(UserRole::Student);
        let req = request("GET", "/api/student/learning-goals/xyz", Some(&token), None);

        let (status, body) = send(app(), req).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Invalid goal ID");
    }

    #[tokio::test]
    async fn test_patch_requires_progress() {
        let token = token_for(UserRole::Student);
        let uri = format!("/api/student/learning-goals/{}", Uuid::new_v4());
        let req = request("PATCH", &uri, Some(&token), Some(json!({})));

        let (status, _) = send(app(), req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_goals_require_student() {
        let token = token_for(UserRole::Lecture);
        let req = request("GET", "/api/student/learning-goals", Some(&token), None);

        let (status, _) = send(app(), req).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
