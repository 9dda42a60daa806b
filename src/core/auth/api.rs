//! Auth API endpoints
//!
//! Provides REST API endpoints for authentication:
//! - POST /api/auth/login - Login as student, lecturer or superadmin
//! - POST /api/projects-and-tasks/auth/login - Same login for the projects area
//! - POST /api/auth/register/student - Register a student (awaits approval)
//! - POST /api/auth/register/lecturer - Register a lecturer
//! - GET /api/auth/verify - Resolve the current token's user

use axum::{
    Router,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
};
use std::sync::Arc;

use crate::core::auth::guard::authenticate;
use crate::core::auth::service::{
    AuthService, LecturerRegistered, LoginRequest, LoginResponse, RegisterLecturerRequest,
    RegisterStudentRequest, StudentRegistered, VerifyResponse,
};
use crate::core::response::{ApiJson, ApiResponse, ApiResult};

/// Auth API state containing the auth service
#[derive(Clone)]
pub struct AuthApiState {
    pub auth_service: AuthService,
}

/// Create the auth API router
pub fn auth_api_router(state: AuthApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/auth/login", post(login_handler))
        .route("/api/projects-and-tasks/auth/login", post(login_handler))
        .route("/api/auth/register/student", post(register_student_handler))
        .route("/api/auth/register/lecturer", post(register_lecturer_handler))
        .route("/api/auth/verify", get(verify_handler))
        .with_state(state)
}

/// POST /api/auth/login
async fn login_handler(
    State(state): State<Arc<AuthApiState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    tracing::info!(
        "Login attempt for email: {}",
        request.email.as_deref().unwrap_or_default()
    );

    let response = state.auth_service.login(request).await?;

    Ok(ApiResponse::ok("Login successful", response))
}

/// POST /api/auth/register/student
async fn register_student_handler(
    State(state): State<Arc<AuthApiState>>,
    ApiJson(request): ApiJson<RegisterStudentRequest>,
) -> ApiResult<StudentRegistered> {
    let registered = state.auth_service.register_student(request).await?;

    tracing::info!(
        "Student registered: {} ({})",
        registered.student.student_id_number,
        registered.student.id
    );

    Ok(ApiResponse::created(
        "Student registered successfully",
        registered,
    ))
}

/// POST /api/auth/register/lecturer
async fn register_lecturer_handler(
    State(state): State<Arc<AuthApiState>>,
    ApiJson(request): ApiJson<RegisterLecturerRequest>,
) -> ApiResult<LecturerRegistered> {
    let registered = state.auth_service.register_lecturer(request).await?;

    tracing::info!("Lecturer registered: {}", registered.lecturer.id);

    Ok(ApiResponse::created(
        "Lecturer registered successfully and verified",
        registered,
    ))
}

/// GET /api/auth/verify
async fn verify_handler(
    State(state): State<Arc<AuthApiState>>,
    headers: HeaderMap,
) -> ApiResult<VerifyResponse> {
    let claims = authenticate(state.auth_service.jwt_service(), &headers)?;
    let response = state.auth_service.verify(&claims).await?;

    Ok(ApiResponse::ok("User verified", response))
}
