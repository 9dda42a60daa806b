//! Prediction API endpoints
//!
//! - POST /api/predictions - Store a prediction (student)
//! - GET /api/predictions - Paginated list (students see their own)
//! - GET /api/predictions/latest - Newest prediction of the calling student
//! - GET/DELETE /api/predictions/{id}

use axum::{
    Router,
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::{OutcomePayload, PageRequest, Pagination, validate_outcome};
use crate::core::auth::{Claims, JwtService, UserRole, require_role, require_student, user_id};
use crate::core::db::models::{
    CreatePrediction, Prediction, PredictionFilter, PredictionInput, PredictionOutcome,
    Recommendations, RiskLevel,
};
use crate::core::db::repositories::{PredictionRepository, StudentRepository};
use crate::core::response::{ApiError, ApiJson, ApiResponse, ApiResult};
use crate::core::validation::{ValidationErrors, parse_enum, parse_id};

const ALL_ROLES: &[UserRole] = &[UserRole::Student, UserRole::Lecture, UserRole::Superadmin];

/// Prediction API state
#[derive(Clone)]
pub struct PredictionApiState {
    pub predictions: PredictionRepository,
    pub students: StudentRepository,
    pub jwt_service: JwtService,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PredictionRequest {
    pub student_id_number: Option<String>,
    pub input_data: Option<PredictionInput>,
    pub prediction: Option<OutcomePayload>,
    pub recommendations: Option<Recommendations>,
    pub api_timestamp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionQuery {
    pub student_id: Option<String>,
    pub risk_level: Option<String>,
    pub at_risk: Option<String>,
    pub limit: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub prediction: Prediction,
}

#[derive(Debug, Serialize)]
pub struct PredictionListResponse {
    pub predictions: Vec<Prediction>,
    pub pagination: Pagination,
}

/// Fields of a create request after validation, before the student check
#[derive(Debug)]
struct ValidPrediction {
    student_id_number: String,
    input_data: PredictionInput,
    prediction: PredictionOutcome,
    recommendations: Recommendations,
    api_timestamp: DateTime<Utc>,
}

fn validate_request(request: PredictionRequest) -> Result<ValidPrediction, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    errors.require(
        request.student_id_number.as_deref(),
        "studentIdNumber",
        "Student ID number",
    );
    if request.input_data.is_none() {
        errors.add("inputData", "Input data is required");
    }
    if request.recommendations.is_none() {
        errors.add("recommendations", "Recommendations are required");
    }

    let outcome = match request.prediction {
        Some(payload) => validate_outcome(payload, &mut errors),
        None => {
            errors.add("prediction", "Prediction data is required");
            None
        }
    };

    let api_timestamp = request
        .api_timestamp
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    match (
        request.student_id_number,
        request.input_data,
        outcome,
        request.recommendations,
    ) {
        (Some(number), Some(input_data), Some(prediction), Some(recommendations))
            if errors.is_empty() =>
        {
            Ok(ValidPrediction {
                student_id_number: number.trim().to_lowercase(),
                input_data,
                prediction,
                recommendations,
                api_timestamp,
            })
        }
        _ => Err(errors),
    }
}

fn prediction_filter(query: &PredictionQuery, claims: &Claims) -> Result<PredictionFilter, ApiError> {
    let student_id = if claims.user_role == UserRole::Student {
        Some(user_id(claims)?)
    } else {
        match query.student_id.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(parse_id(raw, "student")?),
            _ => None,
        }
    };

    let risk_level = match query.risk_level.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(
            parse_enum::<RiskLevel>(raw)
                .ok_or_else(|| ApiError::bad_request("Risk level must be low, medium or high"))?,
        ),
        _ => None,
    };

    let at_risk = query
        .at_risk
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.eq_ignore_ascii_case("true"));

    Ok(PredictionFilter {
        student_id,
        risk_level,
        at_risk,
    })
}

fn page_request(query: &PredictionQuery) -> PageRequest {
    let number = |raw: &Option<String>| raw.as_deref().and_then(|v| v.trim().parse::<i64>().ok());
    PageRequest::new(number(&query.page), number(&query.limit))
}

fn prediction_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::not_found("Invalid prediction ID"))
}

/// Create predictions router
pub fn prediction_api_router(state: PredictionApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route(
            "/api/predictions",
            get(list_predictions).post(create_prediction),
        )
        .route("/api/predictions/latest", get(latest_prediction))
        .route(
            "/api/predictions/{id}",
            get(get_prediction).delete(delete_prediction),
        )
        .with_state(state)
}

async fn create_prediction(
    State(state): State<Arc<PredictionApiState>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<PredictionRequest>,
) -> ApiResult<PredictionResponse> {
    let student_id = require_student(&state.jwt_service, &headers)?;
    let valid = validate_request(request)?;

    let student = state
        .students
        .find_by_id(student_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Student not found"))?;

    if !student
        .student_id_number
        .eq_ignore_ascii_case(&valid.student_id_number)
    {
        let mut errors = ValidationErrors::new();
        errors.add("studentIdNumber", "Student ID does not match");
        return Err(ApiError::field_errors(
            axum::http::StatusCode::FORBIDDEN,
            "Student ID mismatch",
            errors,
        ));
    }

    let prediction = state
        .predictions
        .create(&CreatePrediction {
            student_id,
            student_id_number: valid.student_id_number,
            input_data: valid.input_data,
            prediction: valid.prediction,
            recommendations: valid.recommendations,
            api_timestamp: Some(valid.api_timestamp),
            semester: Some(student.semester),
            academic_year: Some(student.academic_year),
            specialization: Some(student.specialization.to_string()),
        })
        .await?;

    Ok(ApiResponse::created(
        "Prediction saved successfully",
        PredictionResponse { prediction },
    ))
}

async fn list_predictions(
    State(state): State<Arc<PredictionApiState>>,
    headers: HeaderMap,
    Query(query): Query<PredictionQuery>,
) -> ApiResult<PredictionListResponse> {
    let claims = require_role(&state.jwt_service, &headers, ALL_ROLES)?;
    let filter = prediction_filter(&query, &claims)?;
    let page = page_request(&query);

    let predictions = state
        .predictions
        .list(&filter, page.limit, page.offset())
        .await?;
    let total = state.predictions.count(&filter).await?;

    Ok(ApiResponse::ok(
        "Predictions retrieved successfully",
        PredictionListResponse {
            predictions,
            pagination: page.pagination(total),
        },
    ))
}

async fn latest_prediction(
    State(state): State<Arc<PredictionApiState>>,
    headers: HeaderMap,
) -> ApiResult<PredictionResponse> {
    let student_id = require_student(&state.jwt_service, &headers)?;

    let prediction = state
        .predictions
        .latest_for_student(student_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No predictions found for this student"))?;

    Ok(ApiResponse::ok(
        "Latest prediction retrieved successfully",
        PredictionResponse { prediction },
    ))
}

/// Load a prediction; a student may only touch their own
async fn owned_prediction(
    state: &PredictionApiState,
    claims: &Claims,
    raw_id: &str,
    action: &str,
) -> Result<Prediction, ApiError> {
    let id = prediction_id(raw_id)?;
    let prediction = state
        .predictions
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Prediction not found"))?;

    if claims.user_role == UserRole::Student && prediction.student_id != user_id(claims)? {
        return Err(ApiError::unauthorized(format!(
            "You do not have permission to {} this prediction",
            action
        )));
    }

    Ok(prediction)
}

async fn get_prediction(
    State(state): State<Arc<PredictionApiState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<PredictionResponse> {
    let claims = require_role(&state.jwt_service, &headers, ALL_ROLES)?;
    let prediction = owned_prediction(&state, &claims, &id, "view").await?;

    Ok(ApiResponse::ok(
        "Prediction retrieved successfully",
        PredictionResponse { prediction },
    ))
}

async fn delete_prediction(
    State(state): State<Arc<PredictionApiState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let claims = require_role(
        &state.jwt_service,
        &headers,
        &[UserRole::Student, UserRole::Superadmin],
    )?;
    let prediction = owned_prediction(&state, &claims, &id, "delete").await?;

    if !state.predictions.delete(prediction.id).await? {
        return Err(ApiError::not_found("Prediction not found"));
    }

    tracing::info!("Prediction {} deleted by {}", prediction.id, claims.sub);

    Ok(ApiResponse::ok("Prediction deleted successfully", ()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::predictions::MAX_PAGE;
    use crate::core::testing::{jwt, lazy_pool, request, send, token_for};
    use axum::http::StatusCode;
    use serde_json::json;

    fn app() -> Router {
        let pool = lazy_pool();
        prediction_api_router(PredictionApiState {
            predictions: PredictionRepository::new(pool.clone()),
            students: StudentRepository::new(pool),
            jwt_service: jwt(),
        })
    }

    fn claims_for(role: UserRole) -> Claims {
        jwt().validate_token(&token_for(role)).unwrap()
    }

    fn full_request() -> PredictionRequest {
        serde_json::from_value(json!({
            "studentIdNumber": "IT22586766",
            "inputData": { "total_clicks": 1520.0, "avg_score": 61.5, "gender": "F" },
            "prediction": {
                "at_risk": false,
                "confidence": 0.91,
                "risk_level": "low",
                "risk_probability": 0.12,
                "risk_factors": []
            },
            "recommendations": {
                "explanation": "Engagement is steady",
                "motivation": "Keep going",
                "action_steps": ["Review week 4"]
            }
        }))
        .unwrap()
    }

    // ========================================================================
    // Validation
    // ========================================================================

    #[test]
    fn test_validate_request() {
        let valid = validate_request(full_request()).unwrap();

        assert_eq!(valid.student_id_number, "it22586766");
        assert_eq!(valid.prediction.risk_level, RiskLevel::Low);
        assert_eq!(valid.input_data.total_clicks, 1520.0);
    }

    #[test]
    fn test_validate_request_missing_fields() {
        let errors = validate_request(PredictionRequest::default()).unwrap_err();

        assert!(errors.contains("studentIdNumber"));
        assert!(errors.contains("inputData"));
        assert!(errors.contains("prediction"));
        assert!(errors.contains("recommendations"));
    }

    #[test]
    fn test_student_filter_is_forced() {
        let claims = claims_for(UserRole::Student);
        let query = PredictionQuery {
            student_id: Some(Uuid::new_v4().to_string()),
            ..Default::default()
        };

        let filter = prediction_filter(&query, &claims).unwrap();

        assert_eq!(filter.student_id, Some(user_id(&claims).unwrap()));
    }

    #[test]
    fn test_lecturer_filter() {
        let claims = claims_for(UserRole::Lecture);
        let student = Uuid::new_v4();
        let query = PredictionQuery {
            student_id: Some(student.to_string()),
            risk_level: Some("high".to_string()),
            at_risk: Some("true".to_string()),
            ..Default::default()
        };

        let filter = prediction_filter(&query, &claims).unwrap();

        assert_eq!(filter.student_id, Some(student));
        assert_eq!(filter.risk_level, Some(RiskLevel::High));
        assert_eq!(filter.at_risk, Some(true));

        let bad = PredictionQuery {
            risk_level: Some("extreme".to_string()),
            ..Default::default()
        };
        assert!(prediction_filter(&bad, &claims).is_err());
    }

    #[test]
    fn test_page_request_parsing() {
        let query = PredictionQuery {
            page: Some("2".to_string()),
            limit: Some("abc".to_string()),
            ..Default::default()
        };

        assert_eq!(page_request(&query), PageRequest { page: 2, limit: 10 });
    }

    // ========================================================================
    // Routes
    // ========================================================================

    #[tokio::test]
    async fn test_create_prediction_validation() {
        let token = token_for(UserRole::Student);
        let req = request(
            "POST",
            "/api/predictions",
            Some(&token),
            Some(json!({ "studentIdNumber": "it1" })),
        );

        let (status, body) = send(app(), req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"]["inputData"].is_array());
    }

    #[tokio::test]
    async fn test_create_prediction_requires_student() {
        let token = token_for(UserRole::Lecture);
        let req = request("POST", "/api/predictions", Some(&token), Some(json!({})));

        let (status, _) = send(app(), req).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_prediction_invalid_id() {
        let token = token_for(UserRole::Superadmin);
        let req = request("GET", "/api/predictions/not-an-id", Some(&token), None);

        let (status, body) = send(app(), req).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Invalid prediction ID");
    }

    #[tokio::test]
    async fn test_list_with_huge_page_does_not_overflow() {
        let token = token_for(UserRole::Lecture);
        let uri = format!("/api/predictions?page={}", i64::MAX);
        let req = request("GET", &uri, Some(&token), None);

        // The pool has no server behind it, so reaching the query means a 500
        let (status, body) = send(app(), req).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
    }

    #[test]
    fn test_page_request_huge_page() {
        let query = PredictionQuery {
            page: Some(i64::MAX.to_string()),
            ..Default::default()
        };

        let page = page_request(&query);

        assert_eq!(page.page, MAX_PAGE);
        assert!(page.offset() >= 0);
    }

    #[tokio::test]
    async fn test_lecturer_cannot_delete() {
        let token = token_for(UserRole::Lecture);
        let uri = format!("/api/predictions/{}", Uuid::new_v4());
        let req = request("DELETE", &uri, Some(&token), None);

        let (status, _) = send(app(), req).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
