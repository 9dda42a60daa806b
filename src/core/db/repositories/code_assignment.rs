//! Code assignment repository

use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::core::db::models::{CodeAssignment, CreateCodeAssignment};

#[derive(Clone)]
pub struct CodeAssignmentRepository {
    pool: PgPool,
}

impl CodeAssignmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, dto: &CreateCodeAssignment) -> Result<CodeAssignment, sqlx::Error> {
        let assignment = sqlx::query_as::<_, CodeAssignment>(
            r#"
            INSERT INTO code_assignments (
                course_id, lecturer_id, language, question, deadline_date,
                deadline_time, options, test_cases
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(dto.course_id)
        .bind(dto.lecturer_id)
        .bind(&dto.language)
        .bind(Json(&dto.question))
        .bind(dto.deadline_date)
        .bind(&dto.deadline_time)
        .bind(Json(dto.options))
        .bind(Json(&dto.test_cases))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            "Created {} code assignment {} for course {}",
            assignment.language,
            assignment.id,
            assignment.course_id
        );
        Ok(assignment)
    }

    /// Assignments of a course, optionally restricted to one lecturer, newest first
    pub async fn list(
        &self,
        course_id: Uuid,
        lecturer_id: Option<Uuid>,
    ) -> Result<Vec<CodeAssignment>, sqlx::Error> {
        sqlx::query_as::<_, CodeAssignment>(
            r#"
            SELECT * FROM code_assignments
            WHERE course_id = $1
              AND ($2::uuid IS NULL OR lecturer_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(course_id)
        .bind(lecturer_id)
        .fetch_all(&self.pool)
        .await
    }
}
