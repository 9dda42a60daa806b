//! Project and task API endpoints
//!
//! Lecturer endpoints under `/api/projects-and-tasks/lecturer/create-projects-and-tasks`:
//! - POST/GET /project - Create (multipart) or list a course's projects
//! - GET/PUT/DELETE /project/{projectId}
//! - POST/GET /task - Create (multipart) or list a course's tasks
//! - GET/PUT/DELETE /task/{taskId}
//! - POST/GET /code-assignment
//!
//! Student endpoint:
//! - GET /api/projects-and-tasks/student/tasks - Tasks and projects of the student's courses

use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State, multipart::MultipartRejection},
    http::HeaderMap,
    routing::{get, post},
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::input::{
    ItemFields, ProjectUpdateRequest, TaskUpdateRequest, validate_project_fields,
    validate_project_update, validate_task_fields, validate_task_update,
};
use crate::core::auth::{JwtService, require_lecturer, require_student};
use crate::core::courses::eligibility::enrolled_courses;
use crate::core::db::models::{
    CodeAssignment, CodeAssignmentOptions, Course, CreateCodeAssignment, CreateProject,
    CreateTask, DEFAULT_DEADLINE_TIME, FileAttachment, Project, RichText, StudentSummary, Task,
    TestCase,
};
use crate::core::db::repositories::{
    CodeAssignmentRepository, CourseRepository, ProjectRepository, ProjectRepositoryError,
    StudentRepository, StudentRepositoryError, TaskRepository,
};
use crate::core::response::{ApiError, ApiJson, ApiResponse, ApiResult};
use crate::core::storage::api::MAX_FORM_BYTES;
use crate::core::storage::{
    FormData, FormFile, IMAGE_CONTENT_TYPES, ObjectStorage, safe_name, validate_file,
};
use crate::core::validation::{ValidationErrors, parse_date, parse_id, parse_time, string_or_number};

const DOCUMENT_LIMIT_MB: u64 = 50;
const IMAGE_LIMIT_MB: u64 = 10;

/// Project API state
#[derive(Clone)]
pub struct ProjectApiState {
    pub projects: ProjectRepository,
    pub tasks: TaskRepository,
    pub code_assignments: CodeAssignmentRepository,
    pub courses: CourseRepository,
    pub students: StudentRepository,
    pub storage: ObjectStorage,
    pub jwt_service: JwtService,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub project: Project,
}

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<Project>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub task: Task,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CodeAssignmentResponse {
    pub assignment: CodeAssignment,
}

#[derive(Debug, Serialize)]
pub struct CodeAssignmentListResponse {
    pub assignments: Vec<CodeAssignment>,
}

/// Course fields attached to items shown to students
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseBrief {
    pub id: Uuid,
    pub course_name: String,
    pub year: i32,
    pub semester: i32,
}

impl From<&Course> for CourseBrief {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id,
            course_name: course.course_name.clone(),
            year: course.year,
            semester: course.semester,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WithCourse<T> {
    #[serde(flatten)]
    pub item: T,
    pub course: Option<CourseBrief>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentTasksResponse {
    pub student: StudentSummary,
    pub courses: Vec<CourseBrief>,
    pub tasks: Vec<WithCourse<Task>>,
    pub projects: Vec<WithCourse<Project>>,
    pub total_courses: usize,
    pub total_tasks: usize,
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseQuery {
    pub course_id: Option<String>,
    pub lecturer_id: Option<String>,
}

impl CourseQuery {
    fn course_id(&self) -> Result<Uuid, ApiError> {
        match self.course_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => parse_id(id, "course"),
            _ => Err(ApiError::bad_request("Course ID is required")),
        }
    }
}

/// Questions arrive either as plain text or as editor output
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QuestionInput {
    Text(String),
    Rich(RichText),
}

impl QuestionInput {
    fn into_rich_text(self) -> RichText {
        match self {
            QuestionInput::Text(text) => RichText {
                html: text.clone(),
                text,
            },
            QuestionInput::Rich(rich) => rich,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestCaseInput {
    #[serde(deserialize_with = "string_or_number::deserialize")]
    pub id: Option<String>,
    pub input: Option<String>,
    pub expected_output: Option<String>,
    pub is_hidden: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeAssignmentRequest {
    pub course_id: Option<String>,
    pub language: Option<String>,
    pub question: Option<QuestionInput>,
    pub deadline_date: Option<String>,
    pub deadline_time: Option<String>,
    pub options: Option<CodeAssignmentOptions>,
    pub test_cases: Option<Vec<TestCaseInput>>,
}

pub fn validate_code_assignment(
    request: CodeAssignmentRequest,
    lecturer_id: Uuid,
) -> Result<CreateCodeAssignment, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let course_id = request
        .course_id
        .as_deref()
        .and_then(|id| Uuid::parse_str(id.trim()).ok());
    errors.check(course_id.is_some(), "courseId", "Valid course ID is required");

    let language = request.language.unwrap_or_default().trim().to_string();
    errors.require(Some(&language), "language", "Language");

    let question = request
        .question
        .map(QuestionInput::into_rich_text)
        .unwrap_or_default();
    errors.check(
        !question.text.trim().is_empty() || !question.html.trim().is_empty(),
        "question",
        "Question description is required",
    );

    let deadline_date = match request.deadline_date.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            let date = parse_date(raw);
            errors.check(date.is_some(), "deadlineDate", "Invalid deadline date");
            date
        }
        _ => None,
    };
    let deadline_time = match request.deadline_time.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => match parse_time(raw) {
            Some(time) => time.format("%H:%M").to_string(),
            None => {
                errors.add("deadlineTime", "Deadline time must be HH:MM");
                DEFAULT_DEADLINE_TIME.to_string()
            }
        },
        _ => DEFAULT_DEADLINE_TIME.to_string(),
    };

    let inputs = request.test_cases.unwrap_or_default();
    errors.check(
        !inputs.is_empty(),
        "testCases",
        "At least one test case is required",
    );
    let test_cases: Vec<TestCase> = inputs
        .into_iter()
        .enumerate()
        .map(|(i, case)| {
            errors.require(
                case.input.as_deref(),
                &format!("testCases[{}].input", i),
                "Input",
            );
            errors.require(
                case.expected_output.as_deref(),
                &format!("testCases[{}].expectedOutput", i),
                "Expected output",
            );
            TestCase {
                id: case.id.unwrap_or_else(|| (i + 1).to_string()),
                input: case.input.unwrap_or_default(),
                expected_output: case.expected_output.unwrap_or_default(),
                is_hidden: case.is_hidden,
            }
        })
        .collect();

    match course_id {
        Some(course_id) if errors.is_empty() => Ok(CreateCodeAssignment {
            course_id,
            lecturer_id,
            language,
            question,
            deadline_date,
            deadline_time,
            options: request.options.unwrap_or_default(),
            test_cases,
        }),
        _ => Err(errors),
    }
}

// ============================================================================
// File Handling
// ============================================================================

/// Which form field a group of files came from and where it is stored
struct FileGroup {
    field: &'static str,
    label: &'static str,
    folder: &'static str,
    max_mb: u64,
    allowed: &'static [&'static str],
}

const FILE_GROUPS: [FileGroup; 3] = [
    FileGroup {
        field: "templateDocuments",
        label: "Template document",
        folder: "template-docs",
        max_mb: DOCUMENT_LIMIT_MB,
        allowed: &[],
    },
    FileGroup {
        field: "otherDocuments",
        label: "Document",
        folder: "documents",
        max_mb: DOCUMENT_LIMIT_MB,
        allowed: &[],
    },
    FileGroup {
        field: "images",
        label: "Image",
        folder: "images",
        max_mb: IMAGE_LIMIT_MB,
        allowed: IMAGE_CONTENT_TYPES,
    },
];

/// Stored files of one item, in `FILE_GROUPS` order
#[derive(Debug, Default)]
struct StoredFiles {
    template_documents: Vec<FileAttachment>,
    other_documents: Vec<FileAttachment>,
    images: Vec<FileAttachment>,
}

impl StoredFiles {
    fn urls(&self) -> impl Iterator<Item = &str> {
        self.template_documents
            .iter()
            .chain(&self.other_documents)
            .chain(&self.images)
            .map(|f| f.url.as_str())
    }
}

/// Check every file of the form before anything is uploaded
fn take_form_files(form: &mut FormData) -> Result<Vec<Vec<FormFile>>, ApiError> {
    let mut groups = Vec::with_capacity(FILE_GROUPS.len());

    for group in &FILE_GROUPS {
        let files = form.take_files(group.field);
        for file in &files {
            if let Err(rejection) =
                validate_file(&file.file_name, file.size(), group.max_mb, group.allowed)
            {
                let mut errors = ValidationErrors::new();
                errors.add(group.field, rejection.to_string());
                return Err(ApiError::validation_with(
                    format!("{} error: {}", group.label, rejection),
                    errors,
                ));
            }
        }
        groups.push(files);
    }

    Ok(groups)
}

async fn store_form_files(
    storage: &ObjectStorage,
    groups: Vec<Vec<FormFile>>,
    base_folder: &str,
) -> Result<StoredFiles, ApiError> {
    let mut stored = StoredFiles::default();

    for (group, files) in FILE_GROUPS.iter().zip(groups) {
        let folder = format!("{}/{}", base_folder, group.folder);
        for file in files {
            let attachment = storage.upload(file.bytes, &file.file_name, &folder).await;
            let attachment = match attachment {
                Ok(attachment) => attachment,
                Err(e) => {
                    discard_files(storage, &stored).await;
                    return Err(e.into());
                }
            };
            match group.field {
                "templateDocuments" => stored.template_documents.push(attachment),
                "otherDocuments" => stored.other_documents.push(attachment),
                _ => stored.images.push(attachment),
            }
        }
    }

    Ok(stored)
}

/// Best-effort removal of files whose item was never saved
async fn discard_files(storage: &ObjectStorage, stored: &StoredFiles) {
    let removals = stored.urls().map(|url| async move {
        if let Err(e) = storage.delete(url).await {
            tracing::warn!("Failed to remove orphaned upload {}: {}", url, e);
        }
    });
    join_all(removals).await;
}

fn item_fields<'a>(form: &'a FormData, name_field: &str, tree_field: &str) -> ItemFields<'a> {
    ItemFields {
        course_id: form.text("courseId"),
        name: form.text(name_field),
        project_type: form.text("projectType"),
        deadline_date: form.text("deadlineDate"),
        deadline_time: form.text("deadlineTime"),
        description: form.text("description"),
        special_notes: form.text("specialNotes"),
        tree: form.text(tree_field),
    }
}

async fn ensure_course(state: &ProjectApiState, course_id: Uuid) -> Result<(), ApiError> {
    match state.courses.find_by_id(course_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::not_found("Course not found")),
    }
}

// ============================================================================
// Router
// ============================================================================

const LECTURER_BASE: &str = "/api/projects-and-tasks/lecturer/create-projects-and-tasks";

/// Create project router
pub fn project_api_router(state: ProjectApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route(
            &format!("{}/project", LECTURER_BASE),
            post(create_project).get(list_projects),
        )
        .route(
            &format!("{}/project/{{project_id}}", LECTURER_BASE),
            get(get_project).put(update_project).delete(delete_project),
        )
        .route(
            &format!("{}/task", LECTURER_BASE),
            post(create_task).get(list_tasks),
        )
        .route(
            &format!("{}/task/{{task_id}}", LECTURER_BASE),
            get(get_task).put(update_task).delete(delete_task),
        )
        .route(
            &format!("{}/code-assignment", LECTURER_BASE),
            post(create_code_assignment).get(list_code_assignments),
        )
        .route("/api/projects-and-tasks/student/tasks", get(student_tasks))
        .layer(DefaultBodyLimit::max(MAX_FORM_BYTES))
        .with_state(state)
}

// ============================================================================
// Project Handlers
// ============================================================================

async fn create_project(
    State(state): State<Arc<ProjectApiState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ProjectResponse> {
    let lecturer_id = require_lecturer(&state.jwt_service, &headers)?;

    let mut form = FormData::read(multipart?).await?;
    let draft = validate_project_fields(&item_fields(&form, "projectName", "mainTasks"))?;
    let groups = take_form_files(&mut form)?;
    ensure_course(&state, draft.course_id).await?;

    let folder = format!("projects/{}/{}", draft.course_id, safe_name(&draft.project_name));
    let files = store_form_files(&state.storage, groups, &folder).await?;

    let dto = CreateProject {
        course_id: draft.course_id,
        lecturer_id,
        project_name: draft.project_name,
        description: draft.description,
        project_type: draft.project_type,
        deadline_date: draft.deadline_date,
        deadline_time: draft.deadline_time,
        special_notes: draft.special_notes,
        template_documents: files.template_documents.clone(),
        other_documents: files.other_documents.clone(),
        images: files.images.clone(),
        main_tasks: draft.main_tasks,
    };

    let project = match state.projects.create(&dto).await {
        Ok(project) => project,
        Err(e) => {
            discard_files(&state.storage, &files).await;
            return Err(e.into());
        }
    };

    Ok(ApiResponse::created(
        "Project created successfully",
        ProjectResponse { project },
    ))
}

async fn list_projects(
    State(state): State<Arc<ProjectApiState>>,
    headers: HeaderMap,
    Query(query): Query<CourseQuery>,
) -> ApiResult<ProjectListResponse> {
    let lecturer_id = require_lecturer(&state.jwt_service, &headers)?;
    let course_id = query.course_id()?;

    let projects = state.projects.list_for_course(course_id, lecturer_id).await?;

    Ok(ApiResponse::ok(
        "Projects fetched successfully",
        ProjectListResponse { projects },
    ))
}

async fn get_project(
    State(state): State<Arc<ProjectApiState>>,
    headers: HeaderMap,
    Path(project_id): Path<String>,
) -> ApiResult<ProjectResponse> {
    require_lecturer(&state.jwt_service, &headers)?;
    let project_id = parse_id(&project_id, "project")?;

    let project = state
        .projects
        .find_by_id(project_id)
        .await?
        .ok_or(ProjectRepositoryError::ProjectNotFound)?;

    Ok(ApiResponse::ok(
        "Project fetched successfully",
        ProjectResponse { project },
    ))
}

async fn update_project(
    State(state): State<Arc<ProjectApiState>>,
    headers: HeaderMap,
    Path(project_id): Path<String>,
    ApiJson(request): ApiJson<ProjectUpdateRequest>,
) -> ApiResult<ProjectResponse> {
    let lecturer_id = require_lecturer(&state.jwt_service, &headers)?;
    let project_id = parse_id(&project_id, "project")?;
    let update = validate_project_update(request)?;

    let project = state
        .projects
        .update(project_id, lecturer_id, &update)
        .await?;

    Ok(ApiResponse::ok(
        "Project updated successfully",
        ProjectResponse { project },
    ))
}

async fn delete_project(
    State(state): State<Arc<ProjectApiState>>,
    headers: HeaderMap,
    Path(project_id): Path<String>,
) -> ApiResult<DeletedResponse> {
    let lecturer_id = require_lecturer(&state.jwt_service, &headers)?;
    let project_id = parse_id(&project_id, "project")?;

    if !state.projects.delete(project_id, lecturer_id).await? {
        return Err(ProjectRepositoryError::ProjectNotFound.into());
    }

    Ok(ApiResponse::ok(
        "Project deleted successfully",
        DeletedResponse { id: project_id },
    ))
}

// ============================================================================
// Task Handlers
// ============================================================================

async fn create_task(
    State(state): State<Arc<ProjectApiState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<TaskResponse> {
    let lecturer_id = require_lecturer(&state.jwt_service, &headers)?;

    let mut form = FormData::read(multipart?).await?;
    let draft = validate_task_fields(&item_fields(&form, "taskName", "subtasks"))?;
    let groups = take_form_files(&mut form)?;
    ensure_course(&state, draft.course_id).await?;

    let folder = format!("tasks/{}/{}", draft.course_id, safe_name(&draft.task_name));
    let files = store_form_files(&state.storage, groups, &folder).await?;

    let dto = CreateTask {
        course_id: draft.course_id,
        lecturer_id,
        task_name: draft.task_name,
        description: draft.description,
        deadline_date: draft.deadline_date,
        deadline_time: draft.deadline_time,
        special_notes: draft.special_notes,
        template_documents: files.template_documents.clone(),
        other_documents: files.other_documents.clone(),
        images: files.images.clone(),
        subtasks: draft.subtasks,
    };

    let task = match state.tasks.create(&dto).await {
        Ok(task) => task,
        Err(e) => {
            discard_files(&state.storage, &files).await;
            return Err(e.into());
        }
    };

    Ok(ApiResponse::created(
        "Task created successfully",
        TaskResponse { task },
    ))
}

async fn list_tasks(
    State(state): State<Arc<ProjectApiState>>,
    headers: HeaderMap,
    Query(query): Query<CourseQuery>,
) -> ApiResult<TaskListResponse> {
    let lecturer_id = require_lecturer(&state.jwt_service, &headers)?;
    let course_id = query.course_id()?;

    let tasks = state.tasks.list_for_course(course_id, lecturer_id).await?;

    Ok(ApiResponse::ok("Tasks fetched successfully", TaskListResponse { tasks }))
}

async fn get_task(
    State(state): State<Arc<ProjectApiState>>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
) -> ApiResult<TaskResponse> {
    require_lecturer(&state.jwt_service, &headers)?;
    let task_id = parse_id(&task_id, "task")?;

    let task = state
        .tasks
        .find_by_id(task_id)
        .await?
        .ok_or(ProjectRepositoryError::TaskNotFound)?;

    Ok(ApiResponse::ok("Task fetched successfully", TaskResponse { task }))
}

async fn update_task(
    State(state): State<Arc<ProjectApiState>>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
    ApiJson(request): ApiJson<TaskUpdateRequest>,
) -> ApiResult<TaskResponse> {
    let lecturer_id = require_lecturer(&state.jwt_service, &headers)?;
    let task_id = parse_id(&task_id, "task")?;
    let update = validate_task_update(request)?;

    let task = state.tasks.update(task_id, lecturer_id, &update).await?;

    Ok(ApiResponse::ok("Task updated successfully", TaskResponse { task }))
}

async fn delete_task(
    State(state): State<Arc<ProjectApiState>>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
) -> ApiResult<DeletedResponse> {
    let lecturer_id = require_lecturer(&state.jwt_service, &headers)?;
    let task_id = parse_id(&task_id, "task")?;

    if !state.tasks.delete(task_id, lecturer_id).await? {
        return Err(ProjectRepositoryError::TaskNotFound.into());
    }

    Ok(ApiResponse::ok(
        "Task deleted successfully",
        DeletedResponse { id: task_id },
    ))
}

// ============================================================================
// Code Assignment Handlers
// ============================================================================

async fn create_code_assignment(
    State(state): State<Arc<ProjectApiState>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<CodeAssignmentRequest>,
) -> ApiResult<CodeAssignmentResponse> {
    let lecturer_id = require_lecturer(&state.jwt_service, &headers)?;
    let dto = validate_code_assignment(request, lecturer_id)?;
    ensure_course(&state, dto.course_id).await?;

    let assignment = state.code_assignments.create(&dto).await?;

    Ok(ApiResponse::created(
        "Code assignment created successfully",
        CodeAssignmentResponse { assignment },
    ))
}

async fn list_code_assignments(
    State(state): State<Arc<ProjectApiState>>,
    headers: HeaderMap,
    Query(query): Query<CourseQuery>,
) -> ApiResult<CodeAssignmentListResponse> {
    require_lecturer(&state.jwt_service, &headers)?;
    let course_id = query.course_id()?;
    let lecturer_id = match query.lecturer_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => Some(parse_id(id, "lecturer")?),
        _ => None,
    };

    let assignments = state.code_assignments.list(course_id, lecturer_id).await?;

    Ok(ApiResponse::ok(
        "Assignments fetched successfully",
        CodeAssignmentListResponse { assignments },
    ))
}

// ============================================================================
// Student Handlers
// ============================================================================

fn attach_course<T>(
    items: Vec<T>,
    course_of: impl Fn(&T) -> Uuid,
    courses: &HashMap<Uuid, CourseBrief>,
) -> Vec<WithCourse<T>> {
    items
        .into_iter()
        .map(|item| {
            let course = courses.get(&course_of(&item)).cloned();
            WithCourse { item, course }
        })
        .collect()
}

async fn student_tasks(
    State(state): State<Arc<ProjectApiState>>,
    headers: HeaderMap,
) -> ApiResult<StudentTasksResponse> {
    let student_id = require_student(&state.jwt_service, &headers)?;
    let student = state
        .students
        .find_by_id(student_id)
        .await?
        .ok_or(StudentRepositoryError::NotFound)?;

    let courses = enrolled_courses(&state.courses, &student).await?;
    let briefs: Vec<CourseBrief> = courses.iter().map(CourseBrief::from).collect();

    if courses.is_empty() {
        return Ok(ApiResponse::ok(
            "No courses assigned to this student",
            StudentTasksResponse {
                student: StudentSummary::from(&student),
                courses: briefs,
                tasks: Vec::new(),
                projects: Vec::new(),
                total_courses: 0,
                total_tasks: 0,
            },
        ));
    }

    let course_ids: Vec<Uuid> = courses.iter().map(|c| c.id).collect();
    let by_id: HashMap<Uuid, CourseBrief> = briefs.iter().map(|b| (b.id, b.clone())).collect();

    let (tasks, projects) = futures::try_join!(
        state.tasks.list_for_courses(&course_ids),
        state.projects.list_for_courses(&course_ids),
    )?;

    let tasks = attach_course(tasks, |t| t.course_id, &by_id);
    let projects = attach_course(projects, |p| p.course_id, &by_id);

    Ok(ApiResponse::ok(
        "Tasks retrieved successfully",
        StudentTasksResponse {
            student: StudentSummary::from(&student),
            total_courses: briefs.len(),
            total_tasks: tasks.len(),
            courses: briefs,
            tasks,
            projects,
        },
    ))
}
