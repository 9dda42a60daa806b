//! Student progress repository
//!
//! One progress row exists per (student, project) and per (student, task);
//! writes are upserts on that pair.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::core::db::models::{
    MainTaskProgress, ProgressStatus, StudentProjectProgress, StudentTaskProgress,
    SubtaskProgress,
};

/// Project progress joined with the project and course names
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectProgressOverview {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub progress: StudentProjectProgress,
    pub project_name: String,
    pub course_name: String,
    pub deadline_date: NaiveDate,
}

/// Task progress joined with the task and course names
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskProgressOverview {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub progress: StudentTaskProgress,
    pub task_name: String,
    pub course_name: String,
    pub deadline_date: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct ProgressRepository {
    pool: PgPool,
}

impl ProgressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_project_progress(
        &self,
        student_id: Uuid,
        project_id: Uuid,
    ) -> Result<Option<StudentProjectProgress>, sqlx::Error> {
        sqlx::query_as::<_, StudentProjectProgress>(
            "SELECT * FROM student_project_progress WHERE student_id = $1 AND project_id = $2",
        )
        .bind(student_id)
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Insert or replace the student's progress on a project
    pub async fn upsert_project_progress(
        &self,
        student_id: Uuid,
        project_id: Uuid,
        status: ProgressStatus,
        main_tasks: &[MainTaskProgress],
    ) -> Result<StudentProjectProgress, sqlx::Error> {
        sqlx::query_as::<_, StudentProjectProgress>(
            r#"
            INSERT INTO student_project_progress (student_id, project_id, status, main_tasks)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (student_id, project_id)
            DO UPDATE SET status = EXCLUDED.status, main_tasks = EXCLUDED.main_tasks
            RETURNING *
            "#,
        )
        .bind(student_id)
        .bind(project_id)
        .bind(status)
        .bind(Json(main_tasks))
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_task_progress(
        &self,
        student_id: Uuid,
        task_id: Uuid,
    ) -> Result<Option<StudentTaskProgress>, sqlx::Error> {
        sqlx::query_as::<_, StudentTaskProgress>(
            "SELECT * FROM student_task_progress WHERE student_id = $1 AND task_id = $2",
        )
        .bind(student_id)
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Insert or replace the student's progress on a task
    pub async fn upsert_task_progress(
        &self,
        student_id: Uuid,
        task_id: Uuid,
        status: ProgressStatus,
        subtasks: &[SubtaskProgress],
    ) -> Result<StudentTaskProgress, sqlx::Error> {
        sqlx::query_as::<_, StudentTaskProgress>(
            r#"
            INSERT INTO student_task_progress (student_id, task_id, status, subtasks)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (student_id, task_id)
            DO UPDATE SET status = EXCLUDED.status, subtasks = EXCLUDED.subtasks
            RETURNING *
            "#,
        )
        .bind(student_id)
        .bind(task_id)
        .bind(status)
        .bind(Json(subtasks))
        .fetch_one(&self.pool)
        .await
    }

    /// All project progress of a student, most recently updated first
    pub async fn list_project_overview(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<ProjectProgressOverview>, sqlx::Error> {
        sqlx::query_as::<_, ProjectProgressOverview>(
            r#"
            SELECT
                spp.*,
                p.project_name,
                COALESCE(c.course_name, 'Unknown Course') AS course_name,
                p.deadline_date
            FROM student_project_progress spp
            JOIN projects p ON p.id = spp.project_id
            LEFT JOIN courses c ON c.id = p.course_id
            WHERE spp.student_id = $1
            ORDER BY spp.updated_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
    }

    /// All task progress of a student, most recently updated first
    pub async fn list_task_overview(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<TaskProgressOverview>, sqlx::Error> {
        sqlx::query_as::<_, TaskProgressOverview>(
            r#"
            SELECT
                stp.*,
                t.task_name,
                COALESCE(c.course_name, 'Unknown Course') AS course_name,
                t.deadline_date
            FROM student_task_progress stp
            JOIN tasks t ON t.id = stp.task_id
            LEFT JOIN courses c ON c.id = t.course_id
            WHERE stp.student_id = $1
            ORDER BY stp.updated_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_project_progress_overview_flattens() {
        let overview = ProjectProgressOverview {
            progress: StudentProjectProgress {
                id: Uuid::new_v4(),
                student_id: Uuid::new_v4(),
                project_id: Uuid::new_v4(),
                status: ProgressStatus::InProgress,
                main_tasks: Json(vec![]),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            project_name: "Library System".to_string(),
            course_name: "Unknown Course".to_string(),
            deadline_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        };

        let json = serde_json::to_value(&overview).unwrap();
        assert_eq!(json["status"], "inprogress");
        assert_eq!(json["projectName"], "Library System");
        assert_eq!(json["courseName"], "Unknown Course");
        assert_eq!(json["deadlineDate"], "2025-06-01");
        assert!(json["mainTasks"].as_array().unwrap().is_empty());
    }
}
