//! Project and task repositories
//!
//! Projects and stand-alone tasks share the same shape apart from the task
//! tree, so both live here.

use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::core::db::models::{CreateProject, CreateTask, Project, Task, UpdateProject, UpdateTask};

/// Project/task repository error types
#[derive(Debug, thiserror::Error)]
pub enum ProjectRepositoryError {
    #[error("Project not found")]
    ProjectNotFound,

    #[error("Task not found")]
    TaskNotFound,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Project repository for database operations
#[derive(Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, dto: &CreateProject) -> Result<Project, ProjectRepositoryError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (
                course_id, lecturer_id, project_name, description, project_type,
                deadline_date, deadline_time, special_notes, template_documents,
                other_documents, images, main_tasks
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(dto.course_id)
        .bind(dto.lecturer_id)
        .bind(&dto.project_name)
        .bind(Json(&dto.description))
        .bind(dto.project_type)
        .bind(dto.deadline_date)
        .bind(&dto.deadline_time)
        .bind(Json(&dto.special_notes))
        .bind(Json(&dto.template_documents))
        .bind(Json(&dto.other_documents))
        .bind(Json(&dto.images))
        .bind(Json(&dto.main_tasks))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created project {} for course {}", project.id, project.course_id);
        Ok(project)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>, ProjectRepositoryError> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(project)
    }

    /// A lecturer's projects for one course, newest first
    pub async fn list_for_course(
        &self,
        course_id: Uuid,
        lecturer_id: Uuid,
    ) -> Result<Vec<Project>, ProjectRepositoryError> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT * FROM projects
            WHERE course_id = $1 AND lecturer_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(course_id)
        .bind(lecturer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    /// All projects of the given courses, newest first
    pub async fn list_for_courses(
        &self,
        course_ids: &[Uuid],
    ) -> Result<Vec<Project>, ProjectRepositoryError> {
        let projects = sqlx::query_as::<_, Project>(
            "SELECT * FROM projects WHERE course_id = ANY($1) ORDER BY created_at DESC",
        )
        .bind(course_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    /// Update a project owned by `lecturer_id`
    pub async fn update(
        &self,
        id: Uuid,
        lecturer_id: Uuid,
        updates: &UpdateProject,
    ) -> Result<Project, ProjectRepositoryError> {
        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET
                project_name = COALESCE($3, project_name),
                description = COALESCE($4, description),
                project_type = COALESCE($5, project_type),
                deadline_date = COALESCE($6, deadline_date),
                deadline_time = COALESCE($7, deadline_time),
                special_notes = COALESCE($8, special_notes),
                main_tasks = COALESCE($9, main_tasks)
            WHERE id = $1 AND lecturer_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(lecturer_id)
        .bind(&updates.project_name)
        .bind(updates.description.as_ref().map(Json))
        .bind(updates.project_type)
        .bind(updates.deadline_date)
        .bind(&updates.deadline_time)
        .bind(updates.special_notes.as_ref().map(Json))
        .bind(updates.main_tasks.as_ref().map(Json))
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ProjectRepositoryError::ProjectNotFound)
    }

    /// Delete a project owned by `lecturer_id`
    pub async fn delete(&self, id: Uuid, lecturer_id: Uuid) -> Result<bool, ProjectRepositoryError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND lecturer_id = $2")
            .bind(id)
            .bind(lecturer_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Task repository for database operations
#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, dto: &CreateTask) -> Result<Task, ProjectRepositoryError> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (
                course_id, lecturer_id, task_name, description, deadline_date,
                deadline_time, special_notes, template_documents, other_documents,
                images, subtasks
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(dto.course_id)
        .bind(dto.lecturer_id)
        .bind(&dto.task_name)
        .bind(Json(&dto.description))
        .bind(dto.deadline_date)
        .bind(&dto.deadline_time)
        .bind(Json(&dto.special_notes))
        .bind(Json(&dto.template_documents))
        .bind(Json(&dto.other_documents))
        .bind(Json(&dto.images))
        .bind(Json(&dto.subtasks))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created task {} for course {}", task.id, task.course_id);
        Ok(task)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, ProjectRepositoryError> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    pub async fn list_for_course(
        &self,
        course_id: Uuid,
        lecturer_id: Uuid,
    ) -> Result<Vec<Task>, ProjectRepositoryError> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT * FROM tasks
            WHERE course_id = $1 AND lecturer_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(course_id)
        .bind(lecturer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    pub async fn list_for_courses(
        &self,
        course_ids: &[Uuid],
    ) -> Result<Vec<Task>, ProjectRepositoryError> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE course_id = ANY($1) ORDER BY created_at DESC",
        )
        .bind(course_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    /// Update a task owned by `lecturer_id`
    pub async fn update(
        &self,
        id: Uuid,
        lecturer_id: Uuid,
        updates: &UpdateTask,
    ) -> Result<Task, ProjectRepositoryError> {
        // $5 tells whether the deadline is being replaced, since NULL is a valid new value
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET
                task_name = COALESCE($3, task_name),
                description = COALESCE($4, description),
                deadline_date = CASE WHEN $5 THEN $6 ELSE deadline_date END,
                deadline_time = COALESCE($7, deadline_time),
                special_notes = COALESCE($8, special_notes),
                subtasks = COALESCE($9, subtasks)
            WHERE id = $1 AND lecturer_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(lecturer_id)
        .bind(&updates.task_name)
        .bind(updates.description.as_ref().map(Json))
        .bind(updates.deadline_date.is_some())
        .bind(updates.deadline_date.flatten())
        .bind(&updates.deadline_time)
        .bind(updates.special_notes.as_ref().map(Json))
        .bind(updates.subtasks.as_ref().map(Json))
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ProjectRepositoryError::TaskNotFound)
    }

    pub async fn delete(&self, id: Uuid, lecturer_id: Uuid) -> Result<bool, ProjectRepositoryError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND lecturer_id = $2")
            .bind(id)
            .bind(lecturer_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_repository_error_display() {
        assert_eq!(
            ProjectRepositoryError::ProjectNotFound.to_string(),
            "Project not found"
        );
        assert_eq!(ProjectRepositoryError::TaskNotFound.to_string(), "Task not found");
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_update_other_lecturers_project_is_not_found() {
        use crate::core::db::pool::{DbConfig, create_pool};

        let pool = create_pool(&DbConfig::from_env().unwrap()).await.unwrap();
        let repo = ProjectRepository::new(pool);

        let result = repo
            .update(Uuid::new_v4(), Uuid::new_v4(), &UpdateProject::default())
            .await;
        assert!(matches!(result, Err(ProjectRepositoryError::ProjectNotFound)));
    }
}
