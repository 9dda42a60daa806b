//! Course repository for database operations

use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::{Course, CreateCourse, UpdateCourse, with_lecturer_in_charge};

/// Course repository error types
#[derive(Debug, thiserror::Error)]
pub enum CourseRepositoryError {
    #[error("Course not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Course counts for the admin listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, sqlx::FromRow)]
pub struct CourseStats {
    pub total: i64,
    pub active: i64,
    pub archived: i64,
}

/// Course repository for database operations
#[derive(Clone)]
pub struct CourseRepository {
    pool: PgPool,
}

impl CourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a course; the lecturer in charge is always part of `lecturers`
    pub async fn create(&self, dto: &CreateCourse) -> Result<Course, CourseRepositoryError> {
        let lecturers = with_lecturer_in_charge(dto.lecturers.clone(), dto.lecturer_in_charge);

        let course = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (course_name, credits, year, semester, lecturer_in_charge, lecturers, specializations)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&dto.course_name)
        .bind(dto.credits)
        .bind(dto.year)
        .bind(dto.semester)
        .bind(dto.lecturer_in_charge)
        .bind(&lecturers)
        .bind(&dto.specializations)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created course {} ({})", course.id, course.course_name);
        Ok(course)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Course>, CourseRepositoryError> {
        let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(course)
    }

    /// Fetch several courses at once (order unspecified)
    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Course>, CourseRepositoryError> {
        let courses = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(courses)
    }

    /// Apply a partial update. When the lecturer in charge or the teaching
    /// list changes, the lecturer in charge is merged back into the list.
    pub async fn update(
        &self,
        id: Uuid,
        updates: &UpdateCourse,
    ) -> Result<Course, CourseRepositoryError> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or(CourseRepositoryError::NotFound)?;

        let lic = updates.lecturer_in_charge.unwrap_or(existing.lecturer_in_charge);
        let lecturers = with_lecturer_in_charge(
            updates.lecturers.clone().unwrap_or(existing.lecturers),
            lic,
        );

        let course = sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
            SET
                course_name = COALESCE($2, course_name),
                credits = COALESCE($3, credits),
                year = COALESCE($4, year),
                semester = COALESCE($5, semester),
                lecturer_in_charge = $6,
                lecturers = $7,
                specializations = COALESCE($8, specializations),
                is_archived = COALESCE($9, is_archived)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&updates.course_name)
        .bind(updates.credits)
        .bind(updates.year)
        .bind(updates.semester)
        .bind(lic)
        .bind(&lecturers)
        .bind(&updates.specializations)
        .bind(updates.is_archived)
        .fetch_one(&self.pool)
        .await?;

        Ok(course)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, CourseRepositoryError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Courses newest first; `archived = None` returns all
    pub async fn list(&self, archived: Option<bool>) -> Result<Vec<Course>, CourseRepositoryError> {
        let courses = sqlx::query_as::<_, Course>(
            r#"
            SELECT * FROM courses
            WHERE ($1::boolean IS NULL OR is_archived = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(archived)
        .fetch_all(&self.pool)
        .await?;

        Ok(courses)
    }

    pub async fn stats(&self) -> Result<CourseStats, CourseRepositoryError> {
        let stats = sqlx::query_as::<_, CourseStats>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE NOT is_archived) AS active,
                COUNT(*) FILTER (WHERE is_archived) AS archived
            FROM courses
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    /// Active courses the lecturer is in charge of or teaches, by name
    pub async fn list_for_lecturer(
        &self,
        lecturer_id: Uuid,
    ) -> Result<Vec<Course>, CourseRepositoryError> {
        let courses = sqlx::query_as::<_, Course>(
            r#"
            SELECT * FROM courses
            WHERE NOT is_archived
              AND (lecturer_in_charge = $1 OR $1 = ANY(lecturers))
            ORDER BY course_name ASC
            "#,
        )
        .bind(lecturer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(courses)
    }

    /// Active courses for a year, semester and specialization code
    pub async fn list_for_cohort(
        &self,
        year: i32,
        semester: i32,
        specialization: &str,
    ) -> Result<Vec<Course>, CourseRepositoryError> {
        let courses = sqlx::query_as::<_, Course>(
            r#"
            SELECT * FROM courses
            WHERE NOT is_archived
              AND year = $1
              AND semester = $2
              AND $3 = ANY(specializations)
            ORDER BY course_name ASC
            "#,
        )
        .bind(year)
        .bind(semester)
        .bind(specialization)
        .fetch_all(&self.pool)
        .await?;

        Ok(courses)
    }
}
