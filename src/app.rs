//! HTTP application assembly
//!
//! Builds every module router from one shared set of services and merges
//! them with the health check and the outer layers.

use axum::{Router, extract::State, routing::get};
use serde::Serialize;
use tower_http::compression::{CompressionLayer, CompressionLevel};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::admin::{AdminApiState, admin_api_router};
use crate::core::auth::{AuthApiState, AuthService, JwtService, auth_api_router};
use crate::core::config::AdminCredentials;
use crate::core::courses::{CourseApiState, course_api_router};
use crate::core::db::{
    CodeAssignmentRepository, CourseRepository, LearningGoalRepository, LecturerRepository,
    NotificationRepository, PgPool, PredictionRepository, ProgressRepository, ProjectRepository,
    ReminderRepository, StudentRepository, TaskRepository, TemplateRepository, health_check,
};
use crate::core::goals::{GoalApiState, goal_api_router};
use crate::core::notifications::{
    NotificationApiState, ScheduleMode, SchedulerStatus, notification_api_router,
};
use crate::core::predictions::{PredictionApiState, prediction_api_router};
use crate::core::progress::{ProgressApiState, progress_api_router};
use crate::core::projects::{ProjectApiState, project_api_router};
use crate::core::response::{ApiError, ApiResponse, ApiResult};
use crate::core::storage::{ObjectStorage, UploadApiState, upload_api_router};
use crate::core::students::{StudentApiState, student_api_router};
use crate::core::templates::{TemplateApiState, template_api_router};

/// Shared services every router is built from
#[derive(Clone)]
pub struct AppContext {
    pub pool: PgPool,
    pub jwt_service: JwtService,
    pub storage: ObjectStorage,
    pub admin: Option<AdminCredentials>,
    pub schedule_mode: ScheduleMode,
    pub scheduler: SchedulerStatus,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

async fn health(State(pool): State<PgPool>) -> ApiResult<HealthResponse> {
    health_check(&pool).await.map_err(|e| {
        tracing::error!("Health check failed: {}", e);
        ApiError::internal("Database unavailable")
    })?;

    Ok(ApiResponse::ok(
        "Service healthy",
        HealthResponse {
            status: "ok",
            database: "connected",
        },
    ))
}

/// Every API route, without the outer layers
pub fn api_router(ctx: &AppContext) -> Router {
    let pool = &ctx.pool;
    let jwt = &ctx.jwt_service;

    let students = StudentRepository::new(pool.clone());
    let lecturers = LecturerRepository::new(pool.clone());
    let courses = CourseRepository::new(pool.clone());
    let projects = ProjectRepository::new(pool.clone());
    let tasks = TaskRepository::new(pool.clone());

    let auth = auth_api_router(AuthApiState {
        auth_service: AuthService::new(
            students.clone(),
            lecturers.clone(),
            jwt.clone(),
            ctx.admin.clone(),
        ),
    });

    let admin = admin_api_router(AdminApiState {
        students: students.clone(),
        lecturers: lecturers.clone(),
        jwt_service: jwt.clone(),
    });

    let course_routes = course_api_router(CourseApiState {
        courses: courses.clone(),
        lecturers: lecturers.clone(),
        students: students.clone(),
        jwt_service: jwt.clone(),
    });

    let student_routes = student_api_router(StudentApiState {
        students: students.clone(),
        courses: courses.clone(),
        lecturers,
        jwt_service: jwt.clone(),
    });

    let uploads = upload_api_router(UploadApiState {
        storage: ctx.storage.clone(),
        jwt_service: jwt.clone(),
    });

    let project_routes = project_api_router(ProjectApiState {
        projects: projects.clone(),
        tasks: tasks.clone(),
        code_assignments: CodeAssignmentRepository::new(pool.clone()),
        courses: courses.clone(),
        students: students.clone(),
        storage: ctx.storage.clone(),
        jwt_service: jwt.clone(),
    });

    let templates = template_api_router(TemplateApiState {
        templates: TemplateRepository::new(pool.clone()),
        courses,
        jwt_service: jwt.clone(),
    });

    let progress = progress_api_router(ProgressApiState {
        progress: ProgressRepository::new(pool.clone()),
        projects: projects.clone(),
        tasks: tasks.clone(),
        jwt_service: jwt.clone(),
    });

    let notifications = notification_api_router(NotificationApiState {
        reminders: ReminderRepository::new(pool.clone()),
        notifications: NotificationRepository::new(pool.clone()),
        projects,
        tasks,
        schedule_mode: ctx.schedule_mode,
        scheduler: ctx.scheduler.clone(),
        jwt_service: jwt.clone(),
    });

    let goals = goal_api_router(GoalApiState {
        goals: LearningGoalRepository::new(pool.clone()),
        jwt_service: jwt.clone(),
    });

    let predictions = prediction_api_router(PredictionApiState {
        predictions: PredictionRepository::new(pool.clone()),
        students,
        jwt_service: jwt.clone(),
    });

    Router::new()
        .route("/api/health", get(health).with_state(pool.clone()))
        .merge(auth)
        .merge(admin)
        .merge(course_routes)
        .merge(student_routes)
        .merge(uploads)
        .merge(project_routes)
        .merge(templates)
        .merge(progress)
        .merge(notifications)
        .merge(goals)
        .merge(predictions)
}

/// The full application: routes plus compression, CORS and request tracing
pub fn build_router(ctx: &AppContext) -> Router {
    api_router(ctx)
        .layer(
            CompressionLayer::new()
                .br(true)
                .gzip(true)
                .quality(CompressionLevel::Default),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
