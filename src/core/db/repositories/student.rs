//! Student repository for database operations

use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::{CreateStudent, Student, StudentFilter};

/// Student repository error types
#[derive(Debug, thiserror::Error)]
pub enum StudentRepositoryError {
    #[error("Student not found")]
    NotFound,

    #[error("Student already exists")]
    AlreadyExists,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Which unique student fields are already taken
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct StudentConflicts {
    pub email: bool,
    pub student_id_number: bool,
    pub nic_number: bool,
}

impl StudentConflicts {
    pub fn any(&self) -> bool {
        self.email || self.student_id_number || self.nic_number
    }
}

/// Student repository for database operations
#[derive(Clone)]
pub struct StudentRepository {
    pool: PgPool,
}

impl StudentRepository {
    /// Create a new student repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Check email, student id number and NIC against existing students
    pub async fn find_conflicts(
        &self,
        email: &str,
        student_id_number: &str,
        nic_number: &str,
    ) -> Result<StudentConflicts, StudentRepositoryError> {
        let conflicts = sqlx::query_as::<_, StudentConflicts>(
            r#"
            SELECT
                COALESCE(BOOL_OR(email = $1), FALSE) AS email,
                COALESCE(BOOL_OR(student_id_number = $2), FALSE) AS student_id_number,
                COALESCE(BOOL_OR(nic_number = $3), FALSE) AS nic_number
            FROM students
            WHERE email = $1 OR student_id_number = $2 OR nic_number = $3
            "#,
        )
        .bind(email)
        .bind(student_id_number)
        .bind(nic_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(conflicts)
    }

    /// Insert a new, unverified student
    pub async fn create(&self, dto: &CreateStudent) -> Result<Student, StudentRepositoryError> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (
                student_id_number, name, email, password_hash, gender, date_of_birth,
                address, nic_number, academic_year, semester, specialization
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(&dto.student_id_number)
        .bind(&dto.name)
        .bind(&dto.email)
        .bind(&dto.password_hash)
        .bind(dto.gender)
        .bind(dto.date_of_birth)
        .bind(&dto.address)
        .bind(&dto.nic_number)
        .bind(&dto.academic_year)
        .bind(&dto.semester)
        .bind(dto.specialization)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StudentRepositoryError::AlreadyExists
            }
            other => StudentRepositoryError::DatabaseError(other),
        })?;

        tracing::info!("Created student {} ({})", student.id, student.student_id_number);
        Ok(student)
    }

    /// Find a student by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Student>, StudentRepositoryError> {
        let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(student)
    }

    /// Find a student by (already lowercased) email
    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Student>, StudentRepositoryError> {
        let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(student)
    }

    /// Find a student by registration number; matching is case-insensitive
    pub async fn find_by_student_id_number(
        &self,
        student_id_number: &str,
    ) -> Result<Option<Student>, StudentRepositoryError> {
        let student =
            sqlx::query_as::<_, Student>("SELECT * FROM students WHERE student_id_number = $1")
                .bind(student_id_number.trim().to_lowercase())
                .fetch_optional(&self.pool)
                .await?;

        Ok(student)
    }

    /// List students matching the filter, newest first
    pub async fn list(&self, filter: &StudentFilter) -> Result<Vec<Student>, StudentRepositoryError> {
        let students = sqlx::query_as::<_, Student>(
            r#"
            SELECT * FROM students
            WHERE ($1::varchar IS NULL OR academic_year = $1)
              AND ($2::varchar IS NULL OR semester = $2)
              AND ($3::varchar IS NULL OR specialization = $3)
              AND ($4::boolean IS NULL OR is_verified = $4)
            ORDER BY created_at DESC
            "#,
        )
        .bind(&filter.academic_year)
        .bind(&filter.semester)
        .bind(filter.specialization)
        .bind(filter.is_verified)
        .fetch_all(&self.pool)
        .await?;

        Ok(students)
    }

    /// Unverified students, newest first
    pub async fn list_pending(&self) -> Result<Vec<Student>, StudentRepositoryError> {
        self.list(&StudentFilter {
            is_verified: Some(false),
            ..Default::default()
        })
        .await
    }

    /// Verified students of a cohort whose specialization is in `specializations`
    pub async fn list_eligible(
        &self,
        academic_year: &str,
        semester: &str,
        specializations: &[String],
    ) -> Result<Vec<Student>, StudentRepositoryError> {
        let students = sqlx::query_as::<_, Student>(
            r#"
            SELECT * FROM students
            WHERE is_verified
              AND academic_year = $1
              AND semester = $2
              AND specialization = ANY($3)
            ORDER BY name ASC
            "#,
        )
        .bind(academic_year)
        .bind(semester)
        .bind(specializations)
        .fetch_all(&self.pool)
        .await?;

        Ok(students)
    }

    /// Mark a student as verified
    pub async fn approve(&self, id: Uuid) -> Result<Student, StudentRepositoryError> {
        sqlx::query_as::<_, Student>(
            "UPDATE students SET is_verified = TRUE WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StudentRepositoryError::NotFound)
    }

    /// Delete a student by ID
    pub async fn delete(&self, id: Uuid) -> Result<bool, StudentRepositoryError> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
