//! Admin API endpoints
//!
//! Provides REST API endpoints for account management (superadmin only):
//! - GET /api/admin/users - List students and/or lecturers
//! - GET /api/admin/users/pending - Unverified accounts awaiting approval
//! - POST /api/admin/users/approve - Approve or reject a lecturer
//! - POST /api/admin/users/approve-student - Approve or reject a student
//! - DELETE /api/admin/users/delete - Delete a student or lecturer
//! - GET /api/admin/lecturers/list - Verified lecturers for course assignment

use axum::{
    Router,
    extract::{Query, State},
    http::HeaderMap,
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::auth::{JwtService, require_superadmin};
use crate::core::db::models::{Lecturer, LecturerSummary, Student};
use crate::core::db::repositories::{
    LecturerRepository, LecturerRepositoryError, StudentRepository, StudentRepositoryError,
};
use crate::core::response::{ApiError, ApiJson, ApiResponse, ApiResult};
use crate::core::validation::{ValidationErrors, parse_enum, parse_id};

/// Admin API state
#[derive(Clone)]
pub struct AdminApiState {
    pub students: StudentRepository,
    pub lecturers: LecturerRepository,
    pub jwt_service: JwtService,
}

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    #[serde(rename = "type")]
    pub user_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApproveLecturerRequest {
    pub lecturer_id: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApproveStudentRequest {
    pub student_id: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteUserRequest {
    pub user_id: Option<String>,
    pub user_type: Option<String>,
}

/// Approval decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalAction {
    Approve,
    Reject,
}

/// Account kind used by list and delete endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Student,
    Lecturer,
}

/// A student or lecturer record
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Account {
    Student(Box<Student>),
    Lecturer(Box<Lecturer>),
}

/// An account tagged with its kind
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    #[serde(flatten)]
    pub account: Account,
    pub user_type: UserType,
}

impl AdminUser {
    fn student(student: Student) -> Self {
        Self {
            account: Account::Student(Box::new(student)),
            user_type: UserType::Student,
        }
    }

    fn lecturer(lecturer: Lecturer) -> Self {
        Self {
            account: Account::Lecturer(Box::new(lecturer)),
            user_type: UserType::Lecturer,
        }
    }

    fn created_at(&self) -> DateTime<Utc> {
        match &self.account {
            Account::Student(student) => student.created_at,
            Account::Lecturer(lecturer) => lecturer.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<AdminUser>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingResponse {
    pub pending_users: Vec<AdminUser>,
    pub total: usize,
    pub students: usize,
    pub lecturers: usize,
}

#[derive(Debug, Serialize)]
pub struct LecturerListResponse {
    pub lecturers: Vec<LecturerSummary>,
    pub count: usize,
}

/// Empty `data` object
#[derive(Debug, Serialize)]
pub struct Empty {}

// ============================================================================
// Validation
// ============================================================================

/// Validate an approve/reject body; `id_field` and `id_label` name the target
fn validate_approval(
    id: Option<&str>,
    action: Option<&str>,
    id_field: &str,
    id_label: &str,
) -> Result<(Uuid, ApprovalAction), ApiError> {
    let mut errors = ValidationErrors::new();
    errors.require(id, id_field, id_label);
    errors.require(action, "action", "Action");
    errors.into_result()?;

    let action = action
        .and_then(parse_enum::<ApprovalAction>)
        .ok_or_else(|| {
            let mut errors = ValidationErrors::new();
            errors.add("action", "Action must be approve or reject");
            ApiError::validation_with("Invalid action", errors)
        })?;

    let id = parse_id(id.unwrap_or_default(), id_label.trim_end_matches(" ID"))?;
    Ok((id, action))
}

fn validate_delete(request: &DeleteUserRequest) -> Result<(Uuid, UserType), ApiError> {
    let mut errors = ValidationErrors::new();
    errors.require(request.user_id.as_deref(), "userId", "User ID");
    errors.require(request.user_type.as_deref(), "userType", "User type");
    errors.into_result()?;

    let user_type = request
        .user_type
        .as_deref()
        .and_then(parse_enum::<UserType>)
        .ok_or_else(|| {
            let mut errors = ValidationErrors::new();
            errors.add("userType", "User type must be student or lecturer");
            ApiError::validation_with("Invalid user type", errors)
        })?;

    let id = parse_id(request.user_id.as_deref().unwrap_or_default(), "user")?;
    Ok((id, user_type))
}

// ============================================================================
// Router
// ============================================================================

/// Create the admin API router
pub fn admin_api_router(state: AdminApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/pending", get(list_pending))
        .route("/api/admin/users/approve", post(approve_lecturer))
        .route("/api/admin/users/approve-student", post(approve_student))
        .route("/api/admin/users/delete", delete(delete_user))
        .route("/api/admin/lecturers/list", get(list_lecturers))
        .with_state(state)
}

/// GET /api/admin/users?type=students|lecturers
async fn list_users(
    State(state): State<Arc<AdminApiState>>,
    headers: HeaderMap,
    Query(query): Query<UsersQuery>,
) -> ApiResult<UsersResponse> {
    require_superadmin(&state.jwt_service, &headers)?;

    let kind = query.user_type.as_deref().filter(|t| !t.is_empty());
    let mut users = Vec::new();

    if matches!(kind, None | Some("students")) {
        let students = state.students.list(&Default::default()).await?;
        users.extend(students.into_iter().map(AdminUser::student));
    }
    if matches!(kind, None | Some("lecturers")) {
        let lecturers = state.lecturers.list().await?;
        users.extend(lecturers.into_iter().map(AdminUser::lecturer));
    }

    let total = users.len();
    Ok(ApiResponse::ok(
        "Users retrieved successfully",
        UsersResponse { users, total },
    ))
}

/// GET /api/admin/users/pending
async fn list_pending(
    State(state): State<Arc<AdminApiState>>,
    headers: HeaderMap,
) -> ApiResult<PendingResponse> {
    require_superadmin(&state.jwt_service, &headers)?;

    let students = state.students.list_pending().await?;
    let lecturers = state.lecturers.list_pending().await?;
    let (student_count, lecturer_count) = (students.len(), lecturers.len());

    let mut pending_users: Vec<AdminUser> = students
        .into_iter()
        .map(AdminUser::student)
        .chain(lecturers.into_iter().map(AdminUser::lecturer))
        .collect();
    pending_users.sort_by_key(|u| std::cmp::Reverse(u.created_at()));

    Ok(ApiResponse::ok(
        "Pending approvals retrieved successfully",
        PendingResponse {
            total: pending_users.len(),
            pending_users,
            students: student_count,
            lecturers: lecturer_count,
        },
    ))
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ApprovalResult<T> {
    Approved(T),
    Rejected(Empty),
}

#[derive(Debug, Serialize)]
pub struct LecturerApproved {
    pub lecturer: Lecturer,
}

#[derive(Debug, Serialize)]
pub struct StudentApproved {
    pub student: Student,
}

/// POST /api/admin/users/approve
async fn approve_lecturer(
    State(state): State<Arc<AdminApiState>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<ApproveLecturerRequest>,
) -> ApiResult<ApprovalResult<LecturerApproved>> {
    require_superadmin(&state.jwt_service, &headers)?;

    let (id, action) = validate_approval(
        request.lecturer_id.as_deref(),
        request.action.as_deref(),
        "lecturerId",
        "Lecturer ID",
    )?;

    match action {
        ApprovalAction::Approve => {
            let lecturer = state.lecturers.approve(id).await?;
            tracing::info!("Lecturer {} approved", id);
            Ok(ApiResponse::ok(
                "Lecturer approved successfully",
                ApprovalResult::Approved(LecturerApproved { lecturer }),
            ))
        }
        ApprovalAction::Reject => {
            if !state.lecturers.delete(id).await? {
                return Err(LecturerRepositoryError::NotFound.into());
            }
            tracing::info!("Lecturer {} rejected and removed", id);
            Ok(ApiResponse::ok(
                "Lecturer rejected and removed",
                ApprovalResult::Rejected(Empty {}),
            ))
        }
    }
}

/// POST /api/admin/users/approve-student
async fn approve_student(
    State(state): State<Arc<AdminApiState>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<ApproveStudentRequest>,
) -> ApiResult<ApprovalResult<StudentApproved>> {
    require_superadmin(&state.jwt_service, &headers)?;

    let (id, action) = validate_approval(
        request.student_id.as_deref(),
        request.action.as_deref(),
        "studentId",
        "Student ID",
    )?;

    match action {
        ApprovalAction::Approve => {
            let student = state.students.approve(id).await?;
            tracing::info!("Student {} approved", id);
            Ok(ApiResponse::ok(
                "Student approved successfully",
                ApprovalResult::Approved(StudentApproved { student }),
            ))
        }
        ApprovalAction::Reject => {
            if !state.students.delete(id).await? {
                return Err(StudentRepositoryError::NotFound.into());
            }
            tracing::info!("Student {} rejected and removed", id);
            Ok(ApiResponse::ok(
                "Student rejected and removed",
                ApprovalResult::Rejected(Empty {}),
            ))
        }
    }
}

/// DELETE /api/admin/users/delete
async fn delete_user(
    State(state): State<Arc<AdminApiState>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<DeleteUserRequest>,
) -> ApiResult<Empty> {
    require_superadmin(&state.jwt_service, &headers)?;

    let (id, user_type) = validate_delete(&request)?;

    let deleted = match user_type {
        UserType::Student => state.students.delete(id).await?,
        UserType::Lecturer => state.lecturers.delete(id).await?,
    };

    if !deleted {
        return Err(ApiError::not_found("User not found"));
    }

    tracing::info!("Deleted {:?} {}", user_type, id);
    Ok(ApiResponse::ok("User deleted successfully", Empty {}))
}

/// GET /api/admin/lecturers/list
async fn list_lecturers(
    State(state): State<Arc<AdminApiState>>,
    headers: HeaderMap,
) -> ApiResult<LecturerListResponse> {
    require_superadmin(&state.jwt_service, &headers)?;

    let lecturers: Vec<LecturerSummary> = state
        .lecturers
        .list_verified()
        .await?
        .iter()
        .map(LecturerSummary::from)
        .collect();

    Ok(ApiResponse::ok(
        "Lecturers retrieved successfully",
        LecturerListResponse {
            count: lecturers.len(),
            lecturers,
        },
    ))
}
