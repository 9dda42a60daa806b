//! Project and task template repository

use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::core::db::models::{
    CreateProjectTemplate, ProjectTemplate, TaskTemplate, TemplateCommon,
};

#[derive(Clone)]
pub struct TemplateRepository {
    pool: PgPool,
}

impl TemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_project_template(
        &self,
        dto: &CreateProjectTemplate,
    ) -> Result<ProjectTemplate, sqlx::Error> {
        let common = &dto.common;
        let template = sqlx::query_as::<_, ProjectTemplate>(
            r#"
            INSERT INTO project_templates (
                course_id, lecturer_id, project_name, description, special_notes,
                notifications, images, documents, deadline_date, deadline_time,
                marking_description, total_marks, subtasks, main_tasks, is_single_task_template
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(common.course_id)
        .bind(common.lecturer_id)
        .bind(&common.name)
        .bind(&common.description)
        .bind(&common.special_notes)
        .bind(Json(&common.notifications))
        .bind(Json(&common.images))
        .bind(Json(&common.documents))
        .bind(common.deadline_date)
        .bind(&common.deadline_time)
        .bind(&common.marking_description)
        .bind(common.total_marks)
        .bind(Json(&common.subtasks))
        .bind(Json(&dto.main_tasks))
        .bind(dto.is_single_task_template)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created project template {}", template.id);
        Ok(template)
    }

    pub async fn create_task_template(
        &self,
        common: &TemplateCommon,
    ) -> Result<TaskTemplate, sqlx::Error> {
        let template = sqlx::query_as::<_, TaskTemplate>(
            r#"
            INSERT INTO task_templates (
                course_id, lecturer_id, task_name, description, special_notes,
                notifications, images, documents, deadline_date, deadline_time,
                marking_description, total_marks, subtasks
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(common.course_id)
        .bind(common.lecturer_id)
        .bind(&common.name)
        .bind(&common.description)
        .bind(&common.special_notes)
        .bind(Json(&common.notifications))
        .bind(Json(&common.images))
        .bind(Json(&common.documents))
        .bind(common.deadline_date)
        .bind(&common.deadline_time)
        .bind(&common.marking_description)
        .bind(common.total_marks)
        .bind(Json(&common.subtasks))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created task template {}", template.id);
        Ok(template)
    }

    /// A lecturer's active project templates, newest first
    pub async fn list_project_templates(
        &self,
        lecturer_id: Uuid,
        course_id: Option<Uuid>,
    ) -> Result<Vec<ProjectTemplate>, sqlx::Error> {
        sqlx::query_as::<_, ProjectTemplate>(
            r#"
            SELECT * FROM project_templates
            WHERE lecturer_id = $1
              AND is_active
              AND ($2::uuid IS NULL OR course_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(lecturer_id)
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
    }

    /// A lecturer's active task templates, newest first
    pub async fn list_task_templates(
        &self,
        lecturer_id: Uuid,
        course_id: Option<Uuid>,
    ) -> Result<Vec<TaskTemplate>, sqlx::Error> {
        sqlx::query_as::<_, TaskTemplate>(
            r#"
            SELECT * FROM task_templates
            WHERE lecturer_id = $1
              AND is_active
              AND ($2::uuid IS NULL OR course_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(lecturer_id)
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Soft-delete a project template owned by `lecturer_id`
    pub async fn deactivate_project_template(
        &self,
        id: Uuid,
        lecturer_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE project_templates SET is_active = FALSE WHERE id = $1 AND lecturer_id = $2 AND is_active",
        )
        .bind(id)
        .bind(lecturer_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete a task template owned by `lecturer_id`
    pub async fn deactivate_task_template(
        &self,
        id: Uuid,
        lecturer_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE task_templates SET is_active = FALSE WHERE id = $1 AND lecturer_id = $2 AND is_active",
        )
        .bind(id)
        .bind(lecturer_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
