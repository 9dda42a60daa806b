//! Lecturer repository for database operations

use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::{CreateLecturer, Lecturer};

/// Lecturer repository error types
#[derive(Debug, thiserror::Error)]
pub enum LecturerRepositoryError {
    #[error("Lecturer not found")]
    NotFound,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Lecturer repository for database operations
#[derive(Clone)]
pub struct LecturerRepository {
    pool: PgPool,
}

impl LecturerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a lecturer, rejecting a duplicate email
    pub async fn create(&self, dto: &CreateLecturer) -> Result<Lecturer, LecturerRepositoryError> {
        if self.find_by_email(&dto.email).await?.is_some() {
            return Err(LecturerRepositoryError::EmailAlreadyExists);
        }

        let lecturer = sqlx::query_as::<_, Lecturer>(
            r#"
            INSERT INTO lecturers (name, email, password_hash, gender, date_of_birth, position, is_verified)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&dto.name)
        .bind(&dto.email)
        .bind(&dto.password_hash)
        .bind(dto.gender)
        .bind(dto.date_of_birth)
        .bind(dto.position)
        .bind(dto.is_verified)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                LecturerRepositoryError::EmailAlreadyExists
            }
            other => LecturerRepositoryError::DatabaseError(other),
        })?;

        tracing::info!("Created lecturer {}", lecturer.id);
        Ok(lecturer)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Lecturer>, LecturerRepositoryError> {
        let lecturer = sqlx::query_as::<_, Lecturer>("SELECT * FROM lecturers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(lecturer)
    }

    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Lecturer>, LecturerRepositoryError> {
        let lecturers =
            sqlx::query_as::<_, Lecturer>("SELECT * FROM lecturers WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;

        Ok(lecturers)
    }

    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Lecturer>, LecturerRepositoryError> {
        let lecturer = sqlx::query_as::<_, Lecturer>("SELECT * FROM lecturers WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(lecturer)
    }

    /// All lecturers, newest first
    pub async fn list(&self) -> Result<Vec<Lecturer>, LecturerRepositoryError> {
        let lecturers =
            sqlx::query_as::<_, Lecturer>("SELECT * FROM lecturers ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;

        Ok(lecturers)
    }

    /// Lecturers awaiting approval, newest first
    pub async fn list_pending(&self) -> Result<Vec<Lecturer>, LecturerRepositoryError> {
        let lecturers = sqlx::query_as::<_, Lecturer>(
            "SELECT * FROM lecturers WHERE NOT is_verified ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(lecturers)
    }

    /// Verified lecturers, sorted by name
    pub async fn list_verified(&self) -> Result<Vec<Lecturer>, LecturerRepositoryError> {
        let lecturers = sqlx::query_as::<_, Lecturer>(
            "SELECT * FROM lecturers WHERE is_verified ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(lecturers)
    }

    /// Mark a lecturer as verified
    pub async fn approve(&self, id: Uuid) -> Result<Lecturer, LecturerRepositoryError> {
        sqlx::query_as::<_, Lecturer>(
            "UPDATE lecturers SET is_verified = TRUE WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(LecturerRepositoryError::NotFound)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, LecturerRepositoryError> {
        let result = sqlx::query("DELETE FROM lecturers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
