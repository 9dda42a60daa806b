//! Project and task request parsing
//!
//! Creation arrives as multipart text fields (JSON-encoded where nested),
//! updates as plain JSON. Both paths end in the same checks so a project
//! saved either way has a trimmed name, a parsed deadline and a task tree
//! where every node has an id and a title.

use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::core::db::models::{
    DEFAULT_DEADLINE_TIME, MainTask, ProjectType, RichText, Subtask, UpdateProject, UpdateTask,
    double_option,
};
use crate::core::validation::{ValidationErrors, parse_date, parse_enum, parse_time};

pub const MAX_NAME_LENGTH: usize = 200;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubtaskInput {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MainTaskInput {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub subtasks: Vec<SubtaskInput>,
}

fn node_id(id: Option<String>) -> String {
    id.map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Subtasks with ids filled in; blank titles are reported under `{prefix}[i].title`
pub fn normalize_subtasks(
    inputs: Vec<SubtaskInput>,
    prefix: &str,
    errors: &mut ValidationErrors,
) -> Vec<Subtask> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(i, input)| {
            let title = non_blank(input.title).unwrap_or_default();
            errors.check(
                !title.is_empty(),
                &format!("{}[{}].title", prefix, i),
                "Subtask title is required",
            );
            Subtask {
                id: node_id(input.id),
                title,
                description: non_blank(input.description),
            }
        })
        .collect()
}

pub fn normalize_main_tasks(inputs: Vec<MainTaskInput>, errors: &mut ValidationErrors) -> Vec<MainTask> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(i, input)| {
            let title = non_blank(input.title).unwrap_or_default();
            errors.check(
                !title.is_empty(),
                &format!("mainTasks[{}].title", i),
                "Main task title is required",
            );
            MainTask {
                id: node_id(input.id),
                title,
                description: non_blank(input.description),
                subtasks: normalize_subtasks(
                    input.subtasks,
                    &format!("mainTasks[{}].subtasks", i),
                    errors,
                ),
            }
        })
        .collect()
}

/// Decode a JSON-encoded form field, falling back to the default when absent
pub fn json_field<T: DeserializeOwned + Default>(
    raw: Option<&str>,
    field: &str,
    errors: &mut ValidationErrors,
) -> T {
    match raw {
        None => T::default(),
        Some(raw) => serde_json::from_str(raw).unwrap_or_else(|_| {
            errors.add(field, format!("{} must be valid JSON", field));
            T::default()
        }),
    }
}

fn check_name(name: Option<&str>, field: &str, label: &str, errors: &mut ValidationErrors) -> String {
    let name = name.map(str::trim).unwrap_or_default();
    if errors.require(Some(name), field, label) {
        errors.check(
            name.chars().count() <= MAX_NAME_LENGTH,
            field,
            &format!("{} cannot exceed {} characters", label, MAX_NAME_LENGTH),
        );
    }
    name.to_string()
}

fn check_deadline_date(raw: &str, errors: &mut ValidationErrors) -> Option<NaiveDate> {
    let date = parse_date(raw);
    errors.check(date.is_some(), "deadlineDate", "Invalid deadline date");
    date
}

/// `HH:MM`, defaulting to 23:59 when absent
fn check_deadline_time(raw: Option<&str>, errors: &mut ValidationErrors) -> String {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => DEFAULT_DEADLINE_TIME.to_string(),
        Some(raw) => match parse_time(raw) {
            Some(time) => time.format("%H:%M").to_string(),
            None => {
                errors.add("deadlineTime", "Deadline time must be HH:MM");
                DEFAULT_DEADLINE_TIME.to_string()
            }
        },
    }
}

fn check_project_type(raw: Option<&str>, errors: &mut ValidationErrors) -> Option<ProjectType> {
    let parsed = raw.and_then(parse_enum::<ProjectType>);
    errors.check(
        parsed.is_some(),
        "projectType",
        "Valid project type is required (group or individual)",
    );
    parsed
}

// ============================================================================
// Creation (multipart text fields)
// ============================================================================

/// Text fields of a project or task creation form
#[derive(Debug, Clone, Default)]
pub struct ItemFields<'a> {
    pub course_id: Option<&'a str>,
    pub name: Option<&'a str>,
    pub project_type: Option<&'a str>,
    pub deadline_date: Option<&'a str>,
    pub deadline_time: Option<&'a str>,
    pub description: Option<&'a str>,
    pub special_notes: Option<&'a str>,
    /// `mainTasks` for projects, `subtasks` for tasks
    pub tree: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct ProjectDraft {
    pub course_id: Uuid,
    pub project_name: String,
    pub project_type: ProjectType,
    pub deadline_date: NaiveDate,
    pub deadline_time: String,
    pub description: RichText,
    pub special_notes: RichText,
    pub main_tasks: Vec<MainTask>,
}

#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub course_id: Uuid,
    pub task_name: String,
    pub deadline_date: Option<NaiveDate>,
    pub deadline_time: String,
    pub description: RichText,
    pub special_notes: RichText,
    pub subtasks: Vec<Subtask>,
}

fn check_course_id(raw: Option<&str>, errors: &mut ValidationErrors) -> Option<Uuid> {
    if !errors.require(raw, "courseId", "Course ID") {
        return None;
    }
    let id = raw.and_then(|v| Uuid::parse_str(v.trim()).ok());
    errors.check(id.is_some(), "courseId", "Invalid course ID");
    id
}

pub fn validate_project_fields(fields: &ItemFields<'_>) -> Result<ProjectDraft, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let course_id = check_course_id(fields.course_id, &mut errors);
    let project_name = check_name(fields.name, "projectName", "Project name", &mut errors);
    let project_type = check_project_type(fields.project_type, &mut errors);
    let deadline_date = if errors.require(fields.deadline_date, "deadlineDate", "Deadline date") {
        fields
            .deadline_date
            .and_then(|raw| check_deadline_date(raw, &mut errors))
    } else {
        None
    };
    let deadline_time = check_deadline_time(fields.deadline_time, &mut errors);
    let description = json_field(fields.description, "description", &mut errors);
    let special_notes = json_field(fields.special_notes, "specialNotes", &mut errors);
    let tree: Vec<MainTaskInput> = json_field(fields.tree, "mainTasks", &mut errors);
    let main_tasks = normalize_main_tasks(tree, &mut errors);

    match (course_id, project_type, deadline_date) {
        (Some(course_id), Some(project_type), Some(deadline_date)) if errors.is_empty() => {
            Ok(ProjectDraft {
                course_id,
                project_name,
                project_type,
                deadline_date,
                deadline_time,
                description,
                special_notes,
                main_tasks,
            })
        }
        _ => Err(errors),
    }
}

pub fn validate_task_fields(fields: &ItemFields<'_>) -> Result<TaskDraft, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let course_id = check_course_id(fields.course_id, &mut errors);
    let task_name = check_name(fields.name, "taskName", "Task name", &mut errors);
    let deadline_date = fields
        .deadline_date
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|raw| check_deadline_date(raw, &mut errors));
    let deadline_time = check_deadline_time(fields.deadline_time, &mut errors);
    let description = json_field(fields.description, "description", &mut errors);
    let special_notes = json_field(fields.special_notes, "specialNotes", &mut errors);
    let tree: Vec<SubtaskInput> = json_field(fields.tree, "subtasks", &mut errors);
    let subtasks = normalize_subtasks(tree, "subtasks", &mut errors);

    match course_id {
        Some(course_id) if errors.is_empty() => Ok(TaskDraft {
            course_id,
            task_name,
            deadline_date,
            deadline_time,
            description,
            special_notes,
            subtasks,
        }),
        _ => Err(errors),
    }
}

// ============================================================================
// Updates (JSON body)
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectUpdateRequest {
    pub project_name: Option<String>,
    pub project_type: Option<String>,
    pub deadline_date: Option<String>,
    pub deadline_time: Option<String>,
    pub description: Option<RichText>,
    pub special_notes: Option<RichText>,
    pub main_tasks: Option<Vec<MainTaskInput>>,
}

pub fn validate_project_update(request: ProjectUpdateRequest) -> Result<UpdateProject, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut update = UpdateProject {
        description: request.description,
        special_notes: request.special_notes,
        ..Default::default()
    };

    if let Some(name) = request.project_name.as_deref() {
        update.project_name = Some(check_name(Some(name), "projectName", "Project name", &mut errors));
    }
    if let Some(kind) = request.project_type.as_deref() {
        update.project_type = check_project_type(Some(kind), &mut errors);
    }
    if let Some(date) = request.deadline_date.as_deref() {
        update.deadline_date = check_deadline_date(date, &mut errors);
    }
    if request.deadline_time.is_some() {
        update.deadline_time = Some(check_deadline_time(request.deadline_time.as_deref(), &mut errors));
    }
    if let Some(tree) = request.main_tasks {
        update.main_tasks = Some(normalize_main_tasks(tree, &mut errors));
    }

    errors.into_result().map(|_| update)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskUpdateRequest {
    pub task_name: Option<String>,
    #[serde(deserialize_with = "double_option::deserialize")]
    pub deadline_date: Option<Option<String>>,
    pub deadline_time: Option<String>,
    pub description: Option<RichText>,
    pub special_notes: Option<RichText>,
    pub subtasks: Option<Vec<SubtaskInput>>,
}

pub fn validate_task_update(request: TaskUpdateRequest) -> Result<UpdateTask, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut update = UpdateTask {
        description: request.description,
        special_notes: request.special_notes,
        ..Default::default()
    };

    if let Some(name) = request.task_name.as_deref() {
        update.task_name = Some(check_name(Some(name), "taskName", "Task name", &mut errors));
    }
    match request.deadline_date {
        None => {}
        Some(None) => update.deadline_date = Some(None),
        Some(Some(date)) if date.trim().is_empty() => update.deadline_date = Some(None),
        Some(Some(date)) => update.deadline_date = Some(check_deadline_date(&date, &mut errors)),
    }
    if request.deadline_time.is_some() {
        update.deadline_time = Some(check_deadline_time(request.deadline_time.as_deref(), &mut errors));
    }
    if let Some(tree) = request.subtasks {
        update.subtasks = Some(normalize_subtasks(tree, "subtasks", &mut errors));
    }

    errors.into_result().map(|_| update)
}
