//! Upload API endpoints
//!
//! - POST /api/projects-and-tasks/lecturer/upload - Store one image or document (lecturer)
//! - DELETE /api/projects-and-tasks/lecturer/upload - Remove a stored file by URL (lecturer)

use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    http::HeaderMap,
    routing::post,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::{FormData, ObjectStorage, extension, safe_name};
use crate::core::auth::{JwtService, require_lecturer};
use crate::core::response::{ApiError, ApiJson, ApiResponse, ApiResult};
use crate::core::validation::ValidationErrors;

/// Largest multipart body accepted by upload routes
pub const MAX_FORM_BYTES: usize = 64 * 1024 * 1024;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt"];

/// Upload API state
#[derive(Clone)]
pub struct UploadApiState {
    pub storage: ObjectStorage,
    pub jwt_service: JwtService,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Image,
    Document,
}

impl UploadKind {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "image" => Some(UploadKind::Image),
            "document" => Some(UploadKind::Document),
            _ => None,
        }
    }

    fn folder(self) -> &'static str {
        match self {
            UploadKind::Image => "images",
            UploadKind::Document => "documents",
        }
    }

    fn max_bytes(self) -> usize {
        match self {
            UploadKind::Image => 10 * 1024 * 1024,
            UploadKind::Document => 50 * 1024 * 1024,
        }
    }

    fn accepts(self, file_name: &str) -> bool {
        let allowed = match self {
            UploadKind::Image => IMAGE_EXTENSIONS,
            UploadKind::Document => DOCUMENT_EXTENSIONS,
        };
        extension(file_name).is_some_and(|ext| allowed.contains(&ext.as_str()))
    }

    fn format_error(self) -> &'static str {
        match self {
            UploadKind::Image => "Invalid image format. Allowed: jpg, png, gif, webp, svg",
            UploadKind::Document => {
                "Invalid document format. Allowed: pdf, doc, docx, xls, xlsx, ppt, pptx, txt"
            }
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub file_name: String,
    pub file_type: UploadKind,
    pub file_size: usize,
}

#[derive(Debug, Deserialize)]
pub struct DeleteUploadRequest {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteUploadResponse {
    pub url: String,
}

fn single_error(message: &str, field: &str, detail: impl Into<String>) -> ApiError {
    let mut errors = ValidationErrors::new();
    errors.add(field, detail);
    ApiError::validation_with(message, errors)
}

/// Create upload router
pub fn upload_api_router(state: UploadApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route(
            "/api/projects-and-tasks/lecturer/upload",
            post(upload_file).delete(delete_file),
        )
        .layer(DefaultBodyLimit::max(MAX_FORM_BYTES))
        .with_state(state)
}

/// Store one file under `{images|documents}/{courseId}/`
async fn upload_file(
    State(state): State<Arc<UploadApiState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<UploadResponse> {
    require_lecturer(&state.jwt_service, &headers)?;

    let mut form = FormData::read(multipart?).await?;
    let file = form.take_files("file").into_iter().next();
    let course_id = form.text("courseId").map(str::to_string);
    let kind = form.text("fileType").and_then(UploadKind::parse);

    let mut errors = ValidationErrors::new();
    errors.check(file.is_some(), "file", "File is required");
    errors.check(course_id.is_some(), "courseId", "Course ID is required");
    errors.check(kind.is_some(), "fileType", "File type must be image or document");

    let (Some(file), Some(course_id), Some(kind)) = (file, course_id, kind) else {
        return Err(ApiError::validation(errors));
    };

    if !kind.accepts(&file.file_name) {
        return Err(single_error(kind.format_error(), "file", "Invalid file format"));
    }

    if file.size() > kind.max_bytes() {
        let limit_mb = kind.max_bytes() / (1024 * 1024);
        return Err(single_error(
            &format!("File size exceeds {}MB limit", limit_mb),
            "file",
            format!("File size must be less than {}MB", limit_mb),
        ));
    }

    let unique = Uuid::new_v4().simple().to_string();
    let key = format!(
        "{}/{}/{}-{}-{}",
        kind.folder(),
        safe_name(&course_id),
        Utc::now().timestamp_millis(),
        &unique[..8],
        safe_name(&file.file_name)
    );

    let file_size = file.size();
    let url = state.storage.put(&key, file.bytes, &file.file_name).await?;

    tracing::info!("Uploaded {} ({} bytes) for course {}", key, file_size, course_id);

    Ok(ApiResponse::ok(
        "File uploaded successfully",
        UploadResponse {
            url,
            file_name: file.file_name,
            file_type: kind,
            file_size,
        },
    ))
}

async fn delete_file(
    State(state): State<Arc<UploadApiState>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<DeleteUploadRequest>,
) -> ApiResult<DeleteUploadResponse> {
    require_lecturer(&state.jwt_service, &headers)?;

    let Some(url) = request.url.filter(|u| !u.trim().is_empty()) else {
        return Err(single_error("Validation failed", "url", "File URL is required"));
    };

    state.storage.delete(&url).await?;

    Ok(ApiResponse::ok("File deleted successfully", DeleteUploadResponse { url }))
}
