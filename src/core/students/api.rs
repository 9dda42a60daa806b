//! Student API endpoints
//!
//! - GET /api/student - Filtered student directory (superadmin or lecturer)
//! - GET /api/student/{id} - One student (students may only read themselves)
//! - GET /api/student/by-student-id/{studentId} - Lookup by registration number
//! - GET /api/student/get-courses - The student's enrolled courses
//! - GET /api/student/get-courses/all - Course catalogue with eligibility flags
//! - GET /api/student/get-courses/{courseId} - One course with eligibility detail

use axum::{
    Router,
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::auth::{JwtService, UserRole, authenticate, require_role, require_student};
use crate::core::courses::eligibility::{
    CourseFilter, EligibilityReason, eligibility_reason, enrolled_courses, is_eligible,
    sort_catalogue,
};
use crate::core::courses::view::{CourseView, populate, populate_one};
use crate::core::db::models::{Specialization, Student, StudentFilter, StudentSummary};
use crate::core::db::repositories::{
    CourseRepository, CourseRepositoryError, LecturerRepository, StudentRepository,
    StudentRepositoryError,
};
use crate::core::response::{ApiError, ApiResponse, ApiResult};
use crate::core::validation::parse_enum;

/// Student API state
#[derive(Clone)]
pub struct StudentApiState {
    pub students: StudentRepository,
    pub courses: CourseRepository,
    pub lecturers: LecturerRepository,
    pub jwt_service: JwtService,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentListQuery {
    pub academic_year: Option<String>,
    pub semester: Option<String>,
    pub specialization: Option<String>,
    pub is_verified: Option<String>,
}

impl StudentListQuery {
    /// Empty values are ignored; an unknown specialization matches nobody
    pub fn into_filter(self) -> Option<StudentFilter> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let specialization = match non_empty(self.specialization) {
            Some(code) => Some(parse_enum::<Specialization>(&code)?),
            None => None,
        };

        Some(StudentFilter {
            academic_year: non_empty(self.academic_year),
            semester: non_empty(self.semester),
            specialization,
            is_verified: self.is_verified.map(|v| v == "true"),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogueQuery {
    pub filter: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StudentListResponse {
    pub students: Vec<Student>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct StudentResponse {
    pub student: Student,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyCoursesResponse {
    pub student: StudentSummary,
    pub courses: Vec<CourseView>,
    pub total_courses: usize,
}

/// A catalogue entry
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueCourse {
    #[serde(flatten)]
    pub course: CourseView,
    pub is_eligible: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueResponse {
    pub student: StudentSummary,
    pub courses: Vec<CatalogueCourse>,
    pub total_courses: usize,
    pub eligible_courses: usize,
    pub filter: CourseFilter,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseEligibilityResponse {
    pub course: CourseView,
    pub student: StudentSummary,
    pub is_eligible: bool,
    pub eligibility_reason: Option<EligibilityReason>,
}

/// Create the student API router
pub fn student_api_router(state: StudentApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/student", get(list_students))
        .route("/api/student/{id}", get(get_student))
        .route("/api/student/by-student-id/{student_id}", get(get_by_student_id))
        .route("/api/student/get-courses", get(my_courses))
        .route("/api/student/get-courses/all", get(course_catalogue))
        .route("/api/student/get-courses/{course_id}", get(course_eligibility))
        .with_state(state)
}

/// The student behind a student token
async fn current_student(state: &StudentApiState, headers: &HeaderMap) -> Result<Student, ApiError> {
    let student_id = require_student(&state.jwt_service, headers)?;
    Ok(state
        .students
        .find_by_id(student_id)
        .await?
        .ok_or(StudentRepositoryError::NotFound)?)
}

/// GET /api/student
async fn list_students(
    State(state): State<Arc<StudentApiState>>,
    headers: HeaderMap,
    Query(query): Query<StudentListQuery>,
) -> ApiResult<StudentListResponse> {
    require_role(
        &state.jwt_service,
        &headers,
        &[UserRole::Superadmin, UserRole::Lecture],
    )?;

    let mut students = match query.into_filter() {
        Some(filter) => state.students.list(&filter).await?,
        None => Vec::new(),
    };
    students.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(ApiResponse::ok(
        "Students retrieved successfully",
        StudentListResponse {
            total: students.len(),
            students,
        },
    ))
}

/// GET /api/student/{id}
async fn get_student(
    State(state): State<Arc<StudentApiState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<StudentResponse> {
    let claims = authenticate(&state.jwt_service, &headers)?;
    let id = Uuid::parse_str(id.trim())
        .map_err(|_| ApiError::not_found("Invalid student ID format"))?;

    if claims.is_student() && claims.user_id().ok() != Some(id) {
        return Err(ApiError::forbidden("You can only view your own profile"));
    }

    let student = state
        .students
        .find_by_id(id)
        .await?
        .ok_or(StudentRepositoryError::NotFound)?;

    Ok(ApiResponse::ok(
        "Student retrieved successfully",
        StudentResponse { student },
    ))
}

/// GET /api/student/by-student-id/{studentId}
async fn get_by_student_id(
    State(state): State<Arc<StudentApiState>>,
    headers: HeaderMap,
    Path(student_id): Path<String>,
) -> ApiResult<StudentResponse> {
    authenticate(&state.jwt_service, &headers)?;

    let student = state
        .students
        .find_by_student_id_number(&student_id)
        .await?
        .ok_or(StudentRepositoryError::NotFound)?;

    Ok(ApiResponse::ok(
        "Student retrieved successfully",
        StudentResponse { student },
    ))
}

/// GET /api/student/get-courses
async fn my_courses(
    State(state): State<Arc<StudentApiState>>,
    headers: HeaderMap,
) -> ApiResult<MyCoursesResponse> {
    let student = current_student(&state, &headers).await?;

    let courses = enrolled_courses(&state.courses, &student).await?;
    let courses = populate(&state.lecturers, courses).await?;

    Ok(ApiResponse::ok(
        "Courses retrieved successfully",
        MyCoursesResponse {
            student: StudentSummary::from(&student),
            total_courses: courses.len(),
            courses,
        },
    ))
}

/// GET /api/student/get-courses/all?filter=my-courses|other-year|other-semester|all
async fn course_catalogue(
    State(state): State<Arc<StudentApiState>>,
    headers: HeaderMap,
    Query(query): Query<CatalogueQuery>,
) -> ApiResult<CatalogueResponse> {
    let student = current_student(&state, &headers).await?;
    let filter = CourseFilter::parse(query.filter.as_deref());

    let mut courses: Vec<_> = state
        .courses
        .list(Some(false))
        .await?
        .into_iter()
        .filter(|course| filter.matches(&student, course))
        .collect();
    sort_catalogue(&mut courses);

    let flags: Vec<bool> = courses.iter().map(|c| is_eligible(&student, c)).collect();
    let courses: Vec<CatalogueCourse> = populate(&state.lecturers, courses)
        .await?
        .into_iter()
        .zip(flags)
        .map(|(course, is_eligible)| CatalogueCourse {
            course,
            is_eligible,
        })
        .collect();

    Ok(ApiResponse::ok(
        "Courses retrieved successfully",
        CatalogueResponse {
            student: StudentSummary::from(&student),
            total_courses: courses.len(),
            eligible_courses: courses.iter().filter(|c| c.is_eligible).count(),
            courses,
            filter,
        },
    ))
}

/// GET /api/student/get-courses/{courseId}
async fn course_eligibility(
    State(state): State<Arc<StudentApiState>>,
    headers: HeaderMap,
    Path(course_id): Path<String>,
) -> ApiResult<CourseEligibilityResponse> {
    require_student(&state.jwt_service, &headers)?;
    let course_id =
        Uuid::parse_str(course_id.trim()).map_err(|_| ApiError::not_found("Invalid course ID"))?;
    let student = current_student(&state, &headers).await?;

    let course = state
        .courses
        .find_by_id(course_id)
        .await?
        .ok_or(CourseRepositoryError::NotFound)?;

    let reason = eligibility_reason(&student, &course);
    let eligible = is_eligible(&student, &course);
    let course = populate_one(&state.lecturers, course).await?;

    Ok(ApiResponse::ok(
        "Course retrieved successfully",
        CourseEligibilityResponse {
            course,
            student: StudentSummary::from(&student),
            is_eligible: eligible,
            eligibility_reason: (!eligible).then_some(reason),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{jwt, lazy_pool, request, send, token_for};
    use axum::http::StatusCode;

    fn app() -> Router {
        let pool = lazy_pool();
        student_api_router(StudentApiState {
            students: StudentRepository::new(pool.clone()),
            courses: CourseRepository::new(pool.clone()),
            lecturers: LecturerRepository::new(pool),
            jwt_service: jwt(),
        })
    }

    #[test]
    fn test_list_query_into_filter() {
        let filter = StudentListQuery {
            academic_year: Some("3".to_string()),
            semester: Some(String::new()),
            specialization: Some("SE".to_string()),
            is_verified: Some("yes".to_string()),
        }
        .into_filter()
        .unwrap();

        assert_eq!(filter.academic_year.as_deref(), Some("3"));
        assert!(filter.semester.is_none());
        assert_eq!(filter.specialization, Some(Specialization::Se));
        assert_eq!(filter.is_verified, Some(false));
    }

    #[test]
    fn test_list_query_unknown_specialization() {
        let query = StudentListQuery {
            specialization: Some("ME".to_string()),
            ..Default::default()
        };
        assert!(query.into_filter().is_none());
    }

    #[tokio::test]
    async fn test_student_cannot_read_other_student() {
        let token = token_for(UserRole::Student);
        let uri = format!("/api/student/{}", Uuid::new_v4());
        let (status, body) = send(app(), request("GET", &uri, Some(&token), None)).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_get_student_invalid_id_format() {
        let token = token_for(UserRole::Lecture);
        let (status, body) =
            send(app(), request("GET", "/api/student/abc", Some(&token), None)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Invalid student ID format");
    }

    #[tokio::test]
    async fn test_directory_rejects_students() {
        let token = token_for(UserRole::Student);
        let (status, body) = send(app(), request("GET", "/api/student", Some(&token), None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Unauthorized access");
    }

    #[tokio::test]
    async fn test_get_courses_requires_student_role() {
        let token = token_for(UserRole::Lecture);
        for uri in [
            "/api/student/get-courses",
            "/api/student/get-courses/all",
        ] {
            let (status, _) = send(app(), request("GET", uri, Some(&token), None)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_course_eligibility_invalid_id() {
        let token = token_for(UserRole::Student);
        let (status, body) = send(
            app(),
            request("GET", "/api/student/get-courses/xyz", Some(&token), None),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Invalid course ID");
    }
}
