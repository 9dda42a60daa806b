//! Course API endpoints
//!
//! Provides REST API endpoints for course management:
//! - GET /api/admin/courses - List courses with archive filter (superadmin)
//! - POST /api/admin/courses - Create a course (superadmin)
//! - PUT /api/admin/courses/{id} - Partially update a course (superadmin)
//! - DELETE /api/admin/courses/{id} - Delete a course (superadmin)
//! - GET /api/lecturer/courses - Courses the lecturer teaches
//! - GET /api/courses/{courseId} - Course with its eligible students

use axum::{
    Router,
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::auth::{JwtService, UserRole, require_lecturer, require_role, require_superadmin};
use crate::core::courses::view::{CourseView, populate, populate_one};
use crate::core::db::models::{CreateCourse, Specialization, Student, UpdateCourse};
use crate::core::db::repositories::{
    CourseRepository, CourseRepositoryError, CourseStats, LecturerRepository, StudentRepository,
};
use crate::core::response::{ApiError, ApiJson, ApiResponse, ApiResult};
use crate::core::validation::{ValidationErrors, parse_enum, string_or_number};

/// Course API state
#[derive(Clone)]
pub struct CourseApiState {
    pub courses: CourseRepository,
    pub lecturers: LecturerRepository,
    pub students: StudentRepository,
    pub jwt_service: JwtService,
}

// ============================================================================
// Request Types and Validation
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CourseListQuery {
    pub filter: Option<String>,
}

/// Body of create and update requests
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseRequest {
    pub course_name: Option<String>,
    #[serde(deserialize_with = "string_or_number::deserialize")]
    pub credits: Option<String>,
    #[serde(deserialize_with = "string_or_number::deserialize")]
    pub year: Option<String>,
    #[serde(deserialize_with = "string_or_number::deserialize")]
    pub semester: Option<String>,
    pub lecturer_in_charge: Option<String>,
    pub lecturers: Option<Vec<String>>,
    pub specializations: Option<Vec<String>>,
    pub is_archived: Option<bool>,
}

fn parse_in_range(value: &str, min: i32, max: i32) -> Option<i32> {
    value
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|v| (min..=max).contains(v))
}

/// Validate whichever fields are present
pub fn validate_course_update(request: &CourseRequest) -> Result<UpdateCourse, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut update = UpdateCourse {
        is_archived: request.is_archived,
        ..Default::default()
    };

    if let Some(name) = &request.course_name {
        let name = name.trim();
        if errors.require(Some(name), "courseName", "Course name") {
            update.course_name = Some(name.to_string());
        }
    }

    if let Some(credits) = &request.credits {
        update.credits = parse_in_range(credits, 1, 10);
        errors.check(
            update.credits.is_some(),
            "credits",
            "Credits must be between 1 and 10",
        );
    }

    if let Some(year) = &request.year {
        update.year = parse_in_range(year, 1, 4);
        errors.check(update.year.is_some(), "year", "Year must be between 1 and 4");
    }

    if let Some(semester) = &request.semester {
        update.semester = parse_in_range(semester, 1, 2);
        errors.check(update.semester.is_some(), "semester", "Semester must be 1 or 2");
    }

    if let Some(lic) = request.lecturer_in_charge.as_deref() {
        update.lecturer_in_charge = Uuid::parse_str(lic.trim()).ok();
        errors.check(
            update.lecturer_in_charge.is_some(),
            "lecturerInCharge",
            "Invalid lecturer ID",
        );
    }

    if let Some(lecturers) = &request.lecturers {
        let parsed: Option<Vec<Uuid>> = lecturers
            .iter()
            .map(|id| Uuid::parse_str(id.trim()).ok())
            .collect();
        errors.check(parsed.is_some(), "lecturers", "Invalid lecturer ID");
        update.lecturers = parsed;
    }

    if let Some(specializations) = &request.specializations {
        let parsed: Option<Vec<Specialization>> = specializations
            .iter()
            .map(|s| parse_enum::<Specialization>(s))
            .collect();
        errors.check(parsed.is_some(), "specializations", "Invalid specialization");
        update.specializations = parsed.map(|specs| {
            let mut codes: Vec<String> = Vec::with_capacity(specs.len());
            for spec in specs {
                let code = spec.to_string();
                if !codes.contains(&code) {
                    codes.push(code);
                }
            }
            codes
        });
    }

    errors.into_result()?;
    Ok(update)
}

/// Validate a full course; every scalar field is required
pub fn validate_course_create(request: &CourseRequest) -> Result<CreateCourse, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.require(request.course_name.as_deref(), "courseName", "Course name");
    errors.check(
        request.credits.is_some(),
        "credits",
        "Credits must be between 1 and 10",
    );
    errors.check(request.year.is_some(), "year", "Year must be between 1 and 4");
    errors.check(request.semester.is_some(), "semester", "Semester must be 1 or 2");
    errors.require(
        request.lecturer_in_charge.as_deref(),
        "lecturerInCharge",
        "Lecturer in charge",
    );

    let update = match validate_course_update(request) {
        Ok(update) => Some(update),
        Err(field_errors) => {
            for (field, messages) in field_errors.into_inner() {
                if !errors.contains(&field) {
                    for message in messages {
                        errors.add(field.clone(), message);
                    }
                }
            }
            None
        }
    };
    errors.into_result()?;

    match update {
        Some(UpdateCourse {
            course_name: Some(course_name),
            credits: Some(credits),
            year: Some(year),
            semester: Some(semester),
            lecturer_in_charge: Some(lecturer_in_charge),
            lecturers,
            specializations,
            ..
        }) => Ok(CreateCourse {
            course_name,
            credits,
            year,
            semester,
            lecturer_in_charge,
            lecturers: lecturers.unwrap_or_default(),
            specializations: specializations.unwrap_or_default(),
        }),
        _ => {
            let mut errors = ValidationErrors::new();
            errors.add("courseName", "Course name is required");
            Err(errors)
        }
    }
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct AdminCoursesResponse {
    pub courses: Vec<CourseView>,
    pub stats: CourseStats,
}

#[derive(Debug, Serialize)]
pub struct CourseResponse {
    pub course: CourseView,
}

#[derive(Debug, Serialize)]
pub struct LecturerCoursesResponse {
    pub courses: Vec<CourseView>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct Empty {}

/// Course header shown with its students
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: Uuid,
    pub course_name: String,
    pub year: i32,
    pub semester: i32,
    pub specializations: Vec<String>,
    pub credits: i32,
}

#[derive(Debug, Serialize)]
pub struct SpecializationCount {
    pub specialization: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseStudentsResponse {
    pub course: CourseSummary,
    pub total_students: usize,
    pub students_by_specialization: BTreeMap<String, Vec<Student>>,
    pub specialization_breakdown: Vec<SpecializationCount>,
    pub students: Vec<Student>,
}

/// Group students under each of the course's specializations, keeping every
/// specialization as a key even when it has no students
pub fn group_by_specialization(
    specializations: &[String],
    students: &[Student],
) -> (BTreeMap<String, Vec<Student>>, Vec<SpecializationCount>) {
    let mut grouped = BTreeMap::new();
    let mut breakdown = Vec::with_capacity(specializations.len());

    for spec in specializations {
        let members: Vec<Student> = students
            .iter()
            .filter(|s| s.specialization.to_string() == *spec)
            .cloned()
            .collect();
        breakdown.push(SpecializationCount {
            specialization: spec.clone(),
            count: members.len(),
        });
        grouped.insert(spec.clone(), members);
    }

    (grouped, breakdown)
}

// ============================================================================
// Router
// ============================================================================

/// Create the course API router
pub fn course_api_router(state: CourseApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/admin/courses", get(list_courses).post(create_course))
        .route(
            "/api/admin/courses/{id}",
            axum::routing::put(update_course).delete(delete_course),
        )
        .route("/api/lecturer/courses", get(lecturer_courses))
        .route("/api/courses/{course_id}", get(course_students))
        .with_state(state)
}

fn parse_course_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id.trim()).map_err(|_| ApiError::not_found("Invalid course ID"))
}

async fn ensure_lecturer_exists(state: &CourseApiState, id: Uuid) -> Result<(), ApiError> {
    if state.lecturers.find_by_id(id).await?.is_none() {
        let mut errors = ValidationErrors::new();
        errors.add("lecturerInCharge", "Lecturer in charge not found");
        return Err(ApiError::validation(errors));
    }
    Ok(())
}

/// GET /api/admin/courses?filter=archived|active|all
async fn list_courses(
    State(state): State<Arc<CourseApiState>>,
    headers: HeaderMap,
    Query(query): Query<CourseListQuery>,
) -> ApiResult<AdminCoursesResponse> {
    require_superadmin(&state.jwt_service, &headers)?;

    let archived = match query.filter.as_deref() {
        Some("archived") => Some(true),
        Some("active") => Some(false),
        _ => None,
    };

    let courses = state.courses.list(archived).await?;
    let stats = state.courses.stats().await?;
    let courses = populate(&state.lecturers, courses).await?;

    Ok(ApiResponse::ok(
        "Courses retrieved successfully",
        AdminCoursesResponse { courses, stats },
    ))
}

/// POST /api/admin/courses
async fn create_course(
    State(state): State<Arc<CourseApiState>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<CourseRequest>,
) -> ApiResult<CourseResponse> {
    require_superadmin(&state.jwt_service, &headers)?;

    let dto = validate_course_create(&request)?;
    ensure_lecturer_exists(&state, dto.lecturer_in_charge).await?;

    let course = state.courses.create(&dto).await?;
    let course = populate_one(&state.lecturers, course).await?;

    Ok(ApiResponse::created(
        "Course created successfully",
        CourseResponse { course },
    ))
}

/// PUT /api/admin/courses/{id}
async fn update_course(
    State(state): State<Arc<CourseApiState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<CourseRequest>,
) -> ApiResult<CourseResponse> {
    require_superadmin(&state.jwt_service, &headers)?;
    let id = parse_course_id(&id)?;

    let updates = validate_course_update(&request)?;
    if let Some(lic) = updates.lecturer_in_charge {
        ensure_lecturer_exists(&state, lic).await?;
    }

    let course = state.courses.update(id, &updates).await?;
    tracing::info!("Updated course {}", id);
    let course = populate_one(&state.lecturers, course).await?;

    Ok(ApiResponse::ok(
        "Course updated successfully",
        CourseResponse { course },
    ))
}

/// DELETE /api/admin/courses/{id}
async fn delete_course(
    State(state): State<Arc<CourseApiState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Empty> {
    require_superadmin(&state.jwt_service, &headers)?;
    let id = parse_course_id(&id)?;

    if !state.courses.delete(id).await? {
        return Err(CourseRepositoryError::NotFound.into());
    }

    tracing::info!("Deleted course {}", id);
    Ok(ApiResponse::ok("Course deleted successfully", Empty {}))
}

/// GET /api/lecturer/courses
async fn lecturer_courses(
    State(state): State<Arc<CourseApiState>>,
    headers: HeaderMap,
) -> ApiResult<LecturerCoursesResponse> {
    let lecturer_id = require_lecturer(&state.jwt_service, &headers)?;

    let courses = state.courses.list_for_lecturer(lecturer_id).await?;
    let courses = populate(&state.lecturers, courses).await?;

    Ok(ApiResponse::ok(
        "Courses retrieved successfully",
        LecturerCoursesResponse {
            count: courses.len(),
            courses,
        },
    ))
}

/// GET /api/courses/{courseId}
async fn course_students(
    State(state): State<Arc<CourseApiState>>,
    headers: HeaderMap,
    Path(course_id): Path<String>,
) -> ApiResult<CourseStudentsResponse> {
    require_role(
        &state.jwt_service,
        &headers,
        &[UserRole::Superadmin, UserRole::Lecture],
    )?;
    let course_id = parse_course_id(&course_id)?;

    let course = state
        .courses
        .find_by_id(course_id)
        .await?
        .ok_or(CourseRepositoryError::NotFound)?;

    let students = state
        .students
        .list_eligible(
            &course.year.to_string(),
            &course.semester.to_string(),
            &course.specializations,
        )
        .await?;

    let (students_by_specialization, specialization_breakdown) =
        group_by_specialization(&course.specializations, &students);

    Ok(ApiResponse::ok(
        "Students retrieved successfully",
        CourseStudentsResponse {
            course: CourseSummary {
                id: course.id,
                course_name: course.course_name,
                year: course.year,
                semester: course.semester,
                specializations: course.specializations,
                credits: course.credits,
            },
            total_students: students.len(),
            students_by_specialization,
            specialization_breakdown,
            students,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::models::Gender;
    use crate::core::testing::{jwt, lazy_pool, request, send, token_for};
    use axum::http::StatusCode;
    use chrono::{NaiveDate, Utc};
    use serde_json::json;

    fn app() -> Router {
        let pool = lazy_pool();
        course_api_router(CourseApiState {
            courses: CourseRepository::new(pool.clone()),
            lecturers: LecturerRepository::new(pool.clone()),
            students: StudentRepository::new(pool),
            jwt_service: jwt(),
        })
    }

    fn request_from(json: serde_json::Value) -> CourseRequest {
        serde_json::from_value(json).unwrap()
    }

    // ========================================================================
    // Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_create_valid_course() {
        let lic = Uuid::new_v4();
        let request = request_from(json!({
            "courseName": "  Software Engineering Process  ",
            "credits": 4,
            "year": "3",
            "semester": 1,
            "lecturerInCharge": lic.to_string(),
            "specializations": ["SE", "IT", "SE"]
        }));

        let dto = validate_course_create(&request).unwrap();
        assert_eq!(dto.course_name, "Software Engineering Process");
        assert_eq!(dto.credits, 4);
        assert_eq!(dto.year, 3);
        assert_eq!(dto.lecturer_in_charge, lic);
        assert_eq!(dto.specializations, vec!["SE", "IT"]);
        assert!(dto.lecturers.is_empty());
    }

    #[test]
    fn test_validate_create_missing_and_out_of_range() {
        let request = request_from(json!({"credits": 11, "year": 0, "semester": 3}));

        let errors = validate_course_create(&request).unwrap_err();
        assert_eq!(errors.get("courseName").unwrap(), ["Course name is required"]);
        assert_eq!(
            errors.get("credits").unwrap(),
            ["Credits must be between 1 and 10"]
        );
        assert_eq!(errors.get("year").unwrap(), ["Year must be between 1 and 4"]);
        assert_eq!(errors.get("semester").unwrap(), ["Semester must be 1 or 2"]);
        assert_eq!(
            errors.get("lecturerInCharge").unwrap(),
            ["Lecturer in charge is required"]
        );
    }

    #[test]
    fn test_validate_update_only_checks_present_fields() {
        let update = validate_course_update(&request_from(json!({"credits": 3}))).unwrap();
        assert_eq!(update.credits, Some(3));
        assert!(update.course_name.is_none());
        assert!(update.year.is_none());

        let errors =
            validate_course_update(&request_from(json!({"specializations": ["SE", "ME"]})))
                .unwrap_err();
        assert!(errors.contains("specializations"));
    }

    #[test]
    fn test_validate_update_rejects_bad_lecturer_ids() {
        let errors = validate_course_update(&request_from(json!({
            "lecturerInCharge": "not-a-uuid",
            "lecturers": [Uuid::new_v4().to_string(), "x"]
        })))
        .unwrap_err();

        assert!(errors.contains("lecturerInCharge"));
        assert!(errors.contains("lecturers"));
    }

    #[test]
    fn test_group_by_specialization_keeps_empty_groups() {
        let student = Student {
            id: Uuid::new_v4(),
            student_id_number: "it1".to_string(),
            name: "Amali".to_string(),
            email: "amali@example.com".to_string(),
            password_hash: String::new(),
            gender: Gender::Female,
            date_of_birth: NaiveDate::from_ymd_opt(2002, 2, 2).unwrap(),
            address: "Galle".to_string(),
            nic_number: "1".to_string(),
            academic_year: "3".to_string(),
            semester: "1".to_string(),
            specialization: Specialization::Se,
            is_verified: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let (grouped, breakdown) =
            group_by_specialization(&["SE".to_string(), "DS".to_string()], &[student]);

        assert_eq!(grouped["SE"].len(), 1);
        assert!(grouped["DS"].is_empty());
        assert_eq!(breakdown[0].count, 1);
        assert_eq!(breakdown[1].specialization, "DS");
        assert_eq!(breakdown[1].count, 0);
    }

    // ========================================================================
    // Router Tests
    // ========================================================================

    #[tokio::test]
    async fn test_admin_courses_require_superadmin() {
        let token = token_for(UserRole::Student);
        let (status, body) = send(
            app(),
            request("GET", "/api/admin/courses", Some(&token), None),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Unauthorized access");
    }

    #[tokio::test]
    async fn test_create_course_validation_error() {
        let token = token_for(UserRole::Superadmin);
        let (status, body) = send(
            app(),
            request(
                "POST",
                "/api/admin/courses",
                Some(&token),
                Some(json!({"courseName": "", "credits": 4})),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["errors"]["courseName"][0], "Course name is required");
    }

    #[tokio::test]
    async fn test_course_detail_invalid_id() {
        let token = token_for(UserRole::Lecture);
        let (status, body) = send(
            app(),
            request("GET", "/api/courses/not-an-id", Some(&token), None),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Invalid course ID");
    }

    #[tokio::test]
    async fn test_course_detail_rejects_students() {
        let token = token_for(UserRole::Student);
        let (status, _) = send(
            app(),
            request("GET", &format!("/api/courses/{}", Uuid::new_v4()), Some(&token), None),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
