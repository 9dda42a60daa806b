//! Database models for SmartLMS
//!
//! This module defines the database entity structs that map to PostgreSQL tables.
//! Nested document-like fields (tasks, attachments, milestones, ...) are stored
//! as JSONB and wrapped in [`Json`].

use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

/// Default deadline time when none is supplied
pub const DEFAULT_DEADLINE_TIME: &str = "23:59";

/// Helper module for deserializing Option<Option<T>> where:
/// - Missing field -> None (don't update)
/// - Field with null -> Some(None) (set to null)
/// - Field with value -> Some(Some(value)) (set to value)
pub mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

// ============================================================================
// Shared Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[display("male")]
    Male,
    #[display("female")]
    Female,
    #[display("other")]
    Other,
}

/// Degree specialization a student is enrolled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Display)]
#[sqlx(type_name = "VARCHAR", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Specialization {
    #[display("IT")]
    It,
    #[display("SE")]
    Se,
    #[display("DS")]
    Ds,
    #[display("CSNE")]
    Csne,
    #[display("CS")]
    Cs,
    #[display("IM")]
    Im,
}

impl Specialization {
    pub const ALL: [Specialization; 6] = [
        Specialization::It,
        Specialization::Se,
        Specialization::Ds,
        Specialization::Csne,
        Specialization::Cs,
        Specialization::Im,
    ];
}

/// Lecturer position. `lecture` and `instructure` are the stored spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LecturerPosition {
    #[display("lecture")]
    Lecture,
    #[display("instructure")]
    Instructure,
    #[display("lic")]
    Lic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    #[display("group")]
    Group,
    #[display("individual")]
    Individual,
}

/// Student-side status of a project or task
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default, Display,
)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    #[default]
    #[display("todo")]
    Todo,
    #[display("inprogress")]
    InProgress,
    #[display("done")]
    Done,
}

// ============================================================================
// Student Model
// ============================================================================

/// Registered student
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub student_id_number: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    pub address: String,
    pub nic_number: String,
    /// "1".."4"
    pub academic_year: String,
    /// "1" or "2"
    pub semester: String,
    pub specialization: Specialization,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub fn year(&self) -> Option<i32> {
        self.academic_year.trim().parse().ok()
    }

    pub fn semester_number(&self) -> Option<i32> {
        self.semester.trim().parse().ok()
    }
}

/// Cohort fields of a student shown next to course listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub id: Uuid,
    pub name: String,
    pub student_id_number: String,
    pub academic_year: String,
    pub semester: String,
    pub specialization: Specialization,
}

impl From<&Student> for StudentSummary {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id,
            name: student.name.clone(),
            student_id_number: student.student_id_number.clone(),
            academic_year: student.academic_year.clone(),
            semester: student.semester.clone(),
            specialization: student.specialization,
        }
    }
}

/// Student data for creation (password already hashed)
#[derive(Debug, Clone)]
pub struct CreateStudent {
    pub student_id_number: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    pub address: String,
    pub nic_number: String,
    pub academic_year: String,
    pub semester: String,
    pub specialization: Specialization,
}

/// Filters for listing students
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub academic_year: Option<String>,
    pub semester: Option<String>,
    pub specialization: Option<Specialization>,
    pub is_verified: Option<bool>,
}

// ============================================================================
// Lecturer Model
// ============================================================================

/// Registered lecturer
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Lecturer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    pub position: LecturerPosition,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public lecturer fields embedded in course responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LecturerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub position: LecturerPosition,
}

impl From<&Lecturer> for LecturerSummary {
    fn from(lecturer: &Lecturer) -> Self {
        Self {
            id: lecturer.id,
            name: lecturer.name.clone(),
            email: lecturer.email.clone(),
            position: lecturer.position,
        }
    }
}

/// Lecturer data for creation (password already hashed)
#[derive(Debug, Clone)]
pub struct CreateLecturer {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    pub position: LecturerPosition,
    pub is_verified: bool,
}

// ============================================================================
// Course Model
// ============================================================================

/// Course offered in a given year and semester
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub course_name: String,
    pub credits: i32,
    pub year: i32,
    pub semester: i32,
    pub lecturer_in_charge: Uuid,
    pub lecturers: Vec<Uuid>,
    /// Specialization codes (`IT`, `SE`, ...)
    pub specializations: Vec<String>,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn offers(&self, specialization: Specialization) -> bool {
        let code = specialization.to_string();
        self.specializations.iter().any(|s| *s == code)
    }

    pub fn is_taught_by(&self, lecturer_id: Uuid) -> bool {
        self.lecturer_in_charge == lecturer_id || self.lecturers.contains(&lecturer_id)
    }
}

/// Course data for creation
#[derive(Debug, Clone)]
pub struct CreateCourse {
    pub course_name: String,
    pub credits: i32,
    pub year: i32,
    pub semester: i32,
    pub lecturer_in_charge: Uuid,
    pub lecturers: Vec<Uuid>,
    pub specializations: Vec<String>,
}

/// Course data for updates
#[derive(Debug, Clone, Default)]
pub struct UpdateCourse {
    pub course_name: Option<String>,
    pub credits: Option<i32>,
    pub year: Option<i32>,
    pub semester: Option<i32>,
    pub lecturer_in_charge: Option<Uuid>,
    pub lecturers: Option<Vec<Uuid>>,
    pub specializations: Option<Vec<String>>,
    pub is_archived: Option<bool>,
}

/// Make sure the lecturer in charge is part of the teaching list
pub fn with_lecturer_in_charge(mut lecturers: Vec<Uuid>, lic: Uuid) -> Vec<Uuid> {
    if !lecturers.contains(&lic) {
        lecturers.push(lic);
    }
    lecturers
}

// ============================================================================
// Project / Task Models
// ============================================================================

/// Rich text as edited in the browser: rendered HTML plus plain text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub text: String,
}

/// Uploaded file reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    pub url: String,
    pub name: String,
    pub file_size: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainTask {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

/// Project assigned to a course
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub course_id: Uuid,
    pub lecturer_id: Uuid,
    pub project_name: String,
    pub description: Json<RichText>,
    pub project_type: ProjectType,
    pub deadline_date: NaiveDate,
    pub deadline_time: String,
    pub special_notes: Json<RichText>,
    pub template_documents: Json<Vec<FileAttachment>>,
    pub other_documents: Json<Vec<FileAttachment>>,
    pub images: Json<Vec<FileAttachment>>,
    pub main_tasks: Json<Vec<MainTask>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateProject {
    pub course_id: Uuid,
    pub lecturer_id: Uuid,
    pub project_name: String,
    pub description: RichText,
    pub project_type: ProjectType,
    pub deadline_date: NaiveDate,
    pub deadline_time: String,
    pub special_notes: RichText,
    pub template_documents: Vec<FileAttachment>,
    pub other_documents: Vec<FileAttachment>,
    pub images: Vec<FileAttachment>,
    pub main_tasks: Vec<MainTask>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub project_name: Option<String>,
    pub description: Option<RichText>,
    pub project_type: Option<ProjectType>,
    pub deadline_date: Option<NaiveDate>,
    pub deadline_time: Option<String>,
    pub special_notes: Option<RichText>,
    pub main_tasks: Option<Vec<MainTask>>,
}

/// Stand-alone task assigned to a course
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub course_id: Uuid,
    pub lecturer_id: Uuid,
    pub task_name: String,
    pub description: Json<RichText>,
    pub deadline_date: Option<NaiveDate>,
    pub deadline_time: String,
    pub special_notes: Json<RichText>,
    pub template_documents: Json<Vec<FileAttachment>>,
    pub other_documents: Json<Vec<FileAttachment>>,
    pub images: Json<Vec<FileAttachment>>,
    pub subtasks: Json<Vec<Subtask>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTask {
    pub course_id: Uuid,
    pub lecturer_id: Uuid,
    pub task_name: String,
    pub description: RichText,
    pub deadline_date: Option<NaiveDate>,
    pub deadline_time: String,
    pub special_notes: RichText,
    pub template_documents: Vec<FileAttachment>,
    pub other_documents: Vec<FileAttachment>,
    pub images: Vec<FileAttachment>,
    pub subtasks: Vec<Subtask>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub task_name: Option<String>,
    pub description: Option<RichText>,
    /// None = keep, Some(None) = clear
    pub deadline_date: Option<Option<NaiveDate>>,
    pub deadline_time: Option<String>,
    pub special_notes: Option<RichText>,
    pub subtasks: Option<Vec<Subtask>>,
}

// ============================================================================
// Code Assignment Model
// ============================================================================

/// Editor restrictions for a code assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeAssignmentOptions {
    pub auto_complete: bool,
    pub external_copy_paste: bool,
    pub internal_copy_paste: bool,
    pub analytics: bool,
}

impl Default for CodeAssignmentOptions {
    fn default() -> Self {
        Self {
            auto_complete: false,
            external_copy_paste: false,
            internal_copy_paste: true,
            analytics: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub expected_output: String,
    #[serde(default)]
    pub is_hidden: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CodeAssignment {
    pub id: Uuid,
    pub course_id: Uuid,
    pub lecturer_id: Uuid,
    pub language: String,
    pub question: Json<RichText>,
    pub deadline_date: Option<NaiveDate>,
    pub deadline_time: String,
    pub options: Json<CodeAssignmentOptions>,
    pub test_cases: Json<Vec<TestCase>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateCodeAssignment {
    pub course_id: Uuid,
    pub lecturer_id: Uuid,
    pub language: String,
    pub question: RichText,
    pub deadline_date: Option<NaiveDate>,
    pub deadline_time: String,
    pub options: CodeAssignmentOptions,
    pub test_cases: Vec<TestCase>,
}

// ============================================================================
// Template Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateNotification {
    #[serde(default)]
    pub order: i32,
    pub message: String,
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateImage {
    #[serde(default)]
    pub order: i32,
    pub url: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemplateDocumentKind {
    #[default]
    Document,
    Template,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDocument {
    #[serde(default)]
    pub order: i32,
    pub name: String,
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: TemplateDocumentKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSubtask {
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateMainTask {
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<TemplateSubtask>,
}

/// Reusable project blueprint owned by a lecturer
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTemplate {
    pub id: Uuid,
    #[serde(rename = "course")]
    pub course_id: Uuid,
    #[serde(rename = "lecturer")]
    pub lecturer_id: Uuid,
    pub project_name: String,
    pub description: Option<String>,
    pub special_notes: Option<String>,
    pub notifications: Json<Vec<TemplateNotification>>,
    pub images: Json<Vec<TemplateImage>>,
    pub documents: Json<Vec<TemplateDocument>>,
    pub deadline_date: NaiveDate,
    pub deadline_time: String,
    pub marking_description: Option<String>,
    pub total_marks: Option<i32>,
    pub main_tasks: Json<Vec<TemplateMainTask>>,
    pub is_single_task_template: bool,
    pub subtasks: Json<Vec<TemplateSubtask>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reusable task blueprint owned by a lecturer
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskTemplate {
    pub id: Uuid,
    #[serde(rename = "course")]
    pub course_id: Uuid,
    #[serde(rename = "lecturer")]
    pub lecturer_id: Uuid,
    pub task_name: String,
    pub description: Option<String>,
    pub special_notes: Option<String>,
    pub notifications: Json<Vec<TemplateNotification>>,
    pub images: Json<Vec<TemplateImage>>,
    pub documents: Json<Vec<TemplateDocument>>,
    pub deadline_date: NaiveDate,
    pub deadline_time: String,
    pub marking_description: Option<String>,
    pub total_marks: Option<i32>,
    pub subtasks: Json<Vec<TemplateSubtask>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields shared by both template kinds on creation
#[derive(Debug, Clone)]
pub struct TemplateCommon {
    pub course_id: Uuid,
    pub lecturer_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub special_notes: Option<String>,
    pub notifications: Vec<TemplateNotification>,
    pub images: Vec<TemplateImage>,
    pub documents: Vec<TemplateDocument>,
    pub deadline_date: NaiveDate,
    pub deadline_time: String,
    pub marking_description: Option<String>,
    pub total_marks: Option<i32>,
    pub subtasks: Vec<TemplateSubtask>,
}

#[derive(Debug, Clone)]
pub struct CreateProjectTemplate {
    pub common: TemplateCommon,
    pub main_tasks: Vec<TemplateMainTask>,
    pub is_single_task_template: bool,
}

// ============================================================================
// Student Progress Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtaskProgress {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainTaskProgress {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub subtasks: Vec<SubtaskProgress>,
}

impl From<&Subtask> for SubtaskProgress {
    fn from(subtask: &Subtask) -> Self {
        Self {
            id: subtask.id.clone(),
            title: subtask.title.clone(),
            description: subtask.description.clone(),
            completed: false,
        }
    }
}

impl From<&MainTask> for MainTaskProgress {
    fn from(task: &MainTask) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            completed: false,
            subtasks: task.subtasks.iter().map(SubtaskProgress::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StudentProjectProgress {
    pub id: Uuid,
    pub student_id: Uuid,
    pub project_id: Uuid,
    pub status: ProgressStatus,
    pub main_tasks: Json<Vec<MainTaskProgress>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StudentTaskProgress {
    pub id: Uuid,
    pub student_id: Uuid,
    pub task_id: Uuid,
    pub status: ProgressStatus,
    pub subtasks: Json<Vec<SubtaskProgress>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Notification / Reminder Models
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Display)]
#[sqlx(type_name = "VARCHAR")]
pub enum ReminderType {
    #[serde(rename = "project_25")]
    #[sqlx(rename = "project_25")]
    #[display("project_25")]
    Project25,
    #[serde(rename = "project_50")]
    #[sqlx(rename = "project_50")]
    #[display("project_50")]
    Project50,
    #[serde(rename = "project_75")]
    #[sqlx(rename = "project_75")]
    #[display("project_75")]
    Project75,
    #[serde(rename = "project_deadline")]
    #[sqlx(rename = "project_deadline")]
    #[display("project_deadline")]
    ProjectDeadline,
    #[serde(rename = "task_25")]
    #[sqlx(rename = "task_25")]
    #[display("task_25")]
    Task25,
    #[serde(rename = "task_50")]
    #[sqlx(rename = "task_50")]
    #[display("task_50")]
    Task50,
    #[serde(rename = "task_75")]
    #[sqlx(rename = "task_75")]
    #[display("task_75")]
    Task75,
    #[serde(rename = "task_deadline")]
    #[sqlx(rename = "task_deadline")]
    #[display("task_deadline")]
    TaskDeadline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display)]
#[sqlx(type_name = "VARCHAR", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    #[display("project_reminder")]
    ProjectReminder,
    #[display("task_reminder")]
    TaskReminder,
    #[display("deadline_warning")]
    DeadlineWarning,
    #[display("overdue")]
    Overdue,
    #[display("progress_update")]
    ProgressUpdate,
}

/// Pending reminder checkpoint for one student and one project or task
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledReminder {
    pub id: Uuid,
    pub student_id: Uuid,
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub reminder_type: ReminderType,
    pub reminder_percentage: i32,
    pub deadline_date: DateTime<Utc>,
    pub is_processed: bool,
    pub scheduled_for: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateReminder {
    pub student_id: Uuid,
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub reminder_type: ReminderType,
    pub reminder_percentage: i32,
    pub deadline_date: DateTime<Utc>,
    pub scheduled_for: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSubtask {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

/// Progress snapshot embedded in a notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskProgressSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_task_title: Option<String>,
    pub subtasks: Vec<SnapshotSubtask>,
    pub completed: bool,
    pub total_tasks: i32,
    pub completed_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub student_id: Uuid,
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub reminder_percentage: Option<i32>,
    pub title: String,
    pub message: String,
    pub description: String,
    pub task_progress: Json<Vec<TaskProgressSnapshot>>,
    pub is_read: bool,
    pub is_sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub scheduled_for: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub student_id: Uuid,
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub notification_type: NotificationType,
    pub reminder_percentage: Option<i32>,
    pub title: String,
    pub message: String,
    pub description: String,
    pub task_progress: Vec<TaskProgressSnapshot>,
    pub sent_at: Option<DateTime<Utc>>,
    pub scheduled_for: DateTime<Utc>,
}

// ============================================================================
// Learning Goal Model
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GoalCategory {
    #[display("academic")]
    Academic,
    #[display("skill")]
    Skill,
    #[display("project")]
    Project,
    #[display("career")]
    Career,
    #[display("personal")]
    Personal,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default, Display,
)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GoalPriority {
    #[display("low")]
    Low,
    #[default]
    #[display("medium")]
    Medium,
    #[display("high")]
    High,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default, Display,
)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    #[display("active")]
    Active,
    #[display("completed")]
    Completed,
    #[display("overdue")]
    Overdue,
    #[display("cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LearningGoal {
    pub id: Uuid,
    pub student_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: GoalCategory,
    pub target_date: DateTime<Utc>,
    pub priority: GoalPriority,
    pub status: GoalStatus,
    pub progress: i32,
    pub milestones: Json<Vec<Milestone>>,
    pub tags: Vec<String>,
    pub course_id: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Goal fields as persisted on insert or full update
#[derive(Debug, Clone, PartialEq)]
pub struct GoalFields {
    pub title: String,
    pub description: Option<String>,
    pub category: GoalCategory,
    pub target_date: DateTime<Utc>,
    pub priority: GoalPriority,
    pub status: GoalStatus,
    pub progress: i32,
    pub milestones: Vec<Milestone>,
    pub tags: Vec<String>,
    pub course_id: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<LearningGoal> for GoalFields {
    fn from(goal: LearningGoal) -> Self {
        Self {
            title: goal.title,
            description: goal.description,
            category: goal.category,
            target_date: goal.target_date,
            priority: goal.priority,
            status: goal.status,
            progress: goal.progress,
            milestones: goal.milestones.0,
            tags: goal.tags,
            course_id: goal.course_id,
            completed_at: goal.completed_at,
        }
    }
}

/// Filters for listing goals; `None` means "any"
#[derive(Debug, Clone, Default)]
pub struct GoalFilter {
    pub status: Option<GoalStatus>,
    pub category: Option<GoalCategory>,
    pub priority: Option<GoalPriority>,
}

// ============================================================================
// Prediction Model
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[display("low")]
    Low,
    #[display("medium")]
    Medium,
    #[display("high")]
    High,
}

/// Engagement and assessment features sent to the risk model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PredictionInput {
    pub total_clicks: f64,
    pub avg_clicks_per_day: f64,
    pub clicks_std: f64,
    pub max_clicks_single_day: f64,
    pub days_active: f64,
    pub study_span_days: f64,
    pub engagement_regularity: f64,
    pub pre_course_clicks: f64,
    pub avg_score: f64,
    pub score_std: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub completion_rate: f64,
    pub first_score: f64,
    pub score_improvement: f64,
    pub late_submission_count: f64,
    pub num_of_prev_attempts: f64,
    pub studied_credits: f64,
    pub early_registration: f64,
    pub withdrawn: f64,
    pub gender: String,
    pub age_band: String,
    pub highest_education: String,
    pub disability: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionOutcome {
    pub at_risk: bool,
    pub confidence: f64,
    pub risk_level: RiskLevel,
    pub risk_probability: f64,
    #[serde(default)]
    pub risk_factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub motivation: String,
    #[serde(default)]
    pub action_steps: Vec<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub generated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub id: Uuid,
    pub student_id: Uuid,
    pub student_id_number: String,
    pub input_data: Json<PredictionInput>,
    pub prediction: Json<PredictionOutcome>,
    pub recommendations: Json<Recommendations>,
    pub risk_level: RiskLevel,
    pub at_risk: bool,
    pub api_timestamp: Option<DateTime<Utc>>,
    pub semester: Option<String>,
    pub academic_year: Option<String>,
    pub specialization: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreatePrediction {
    pub student_id: Uuid,
    pub student_id_number: String,
    pub input_data: PredictionInput,
    pub prediction: PredictionOutcome,
    pub recommendations: Recommendations,
    pub api_timestamp: Option<DateTime<Utc>>,
    pub semester: Option<String>,
    pub academic_year: Option<String>,
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PredictionFilter {
    pub student_id: Option<Uuid>,
    pub risk_level: Option<RiskLevel>,
    pub at_risk: Option<bool>,
}
