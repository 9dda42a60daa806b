//! JSON response envelope shared by every endpoint
//!
//! Successful responses render as `{success: true, message, data}` and
//! failures as `{success: false, message, errors?}`.

use axum::{
    Json,
    extract::{
        FromRequest,
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::core::auth::{JwtError, PasswordError};
use crate::core::db::{
    CourseRepositoryError, LecturerRepositoryError, ProjectRepositoryError, StudentRepositoryError,
};
use crate::core::storage::StorageError;
use crate::core::validation::{FieldErrors, ValidationErrors};

/// Result type returned by handlers
pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// Response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(skip)]
    status: StatusCode,
}

impl<T> ApiResponse<T> {
    /// 200 OK with data
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::OK, message, data)
    }

    /// 201 Created with data
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::CREATED, message, data)
    }

    pub fn with_status(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
            status,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

/// JSON body extractor whose rejection renders as the failure envelope
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}

/// Failure envelope body
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
}

/// API error types
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        errors: ValidationErrors,
        status: StatusCode,
    },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// 400 "Validation failed" with field errors
    pub fn validation(errors: ValidationErrors) -> Self {
        Self::validation_with("Validation failed", errors)
    }

    /// 400 with a custom message and field errors
    pub fn validation_with(message: impl Into<String>, errors: ValidationErrors) -> Self {
        Self::Validation {
            message: message.into(),
            errors,
            status: StatusCode::BAD_REQUEST,
        }
    }

    /// Field errors with a non-400 status, as login uses for 401
    pub fn field_errors(
        status: StatusCode,
        message: impl Into<String>,
        errors: ValidationErrors,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            errors,
            status,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { status, .. } => *status,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::validation(errors)
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired | JwtError::InvalidToken | JwtError::DecodingError(_) => {
                ApiError::unauthorized("Invalid or expired token")
            }
            _ => ApiError::internal(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

fn registration_conflict(message: &str) -> ApiError {
    let mut errors = ValidationErrors::new();
    errors.add("email", message);
    ApiError::validation_with("Registration failed", errors)
}

impl From<StudentRepositoryError> for ApiError {
    fn from(err: StudentRepositoryError) -> Self {
        match err {
            StudentRepositoryError::NotFound => ApiError::not_found("Student not found"),
            StudentRepositoryError::AlreadyExists => {
                registration_conflict("Email is already registered")
            }
            StudentRepositoryError::DatabaseError(e) => e.into(),
        }
    }
}

impl From<LecturerRepositoryError> for ApiError {
    fn from(err: LecturerRepositoryError) -> Self {
        match err {
            LecturerRepositoryError::NotFound => ApiError::not_found("Lecturer not found"),
            LecturerRepositoryError::EmailAlreadyExists => {
                registration_conflict("This email is already registered")
            }
            LecturerRepositoryError::DatabaseError(e) => e.into(),
        }
    }
}

impl From<CourseRepositoryError> for ApiError {
    fn from(err: CourseRepositoryError) -> Self {
        match err {
            CourseRepositoryError::NotFound => ApiError::not_found("Course not found"),
            CourseRepositoryError::DatabaseError(e) => e.into(),
        }
    }
}

impl From<ProjectRepositoryError> for ApiError {
    fn from(err: ProjectRepositoryError) -> Self {
        match err {
            ProjectRepositoryError::ProjectNotFound => ApiError::not_found("Project not found"),
            ProjectRepositoryError::TaskNotFound => ApiError::not_found("Task not found"),
            ProjectRepositoryError::DatabaseError(e) => e.into(),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidUrl(url) => {
                ApiError::bad_request(format!("Invalid file URL: {}", url))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::bad_request(format!("Invalid form data: {}", err.body_text()))
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::bad_request(format!("Invalid form data: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            ApiError::Validation {
                message, errors, ..
            } => ErrorBody {
                success: false,
                message,
                errors: Some(errors.into_inner()),
            },
            ApiError::Internal(detail) => {
                tracing::error!("Request failed: {}", detail);
                ErrorBody {
                    success: false,
                    message: "Internal server error".to_string(),
                    errors: None,
                }
            }
            other => ErrorBody {
                success: false,
                message: other.to_string(),
                errors: None,
            },
        };

        (status, Json(body)).into_response()
    }
}
