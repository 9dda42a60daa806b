//! Risk prediction repository

use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::core::db::models::{CreatePrediction, Prediction, PredictionFilter};

#[derive(Clone)]
pub struct PredictionRepository {
    pool: PgPool,
}

impl PredictionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, dto: &CreatePrediction) -> Result<Prediction, sqlx::Error> {
        let prediction = sqlx::query_as::<_, Prediction>(
            r#"
            INSERT INTO predictions (
                student_id, student_id_number, input_data, prediction, recommendations,
                risk_level, at_risk, api_timestamp, semester, academic_year, specialization
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(dto.student_id)
        .bind(&dto.student_id_number)
        .bind(Json(&dto.input_data))
        .bind(Json(&dto.prediction))
        .bind(Json(&dto.recommendations))
        .bind(dto.prediction.risk_level)
        .bind(dto.prediction.at_risk)
        .bind(dto.api_timestamp)
        .bind(&dto.semester)
        .bind(&dto.academic_year)
        .bind(&dto.specialization)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            "Stored prediction {} for student {} (risk: {})",
            prediction.id,
            prediction.student_id,
            prediction.risk_level
        );
        Ok(prediction)
    }

    /// One page of predictions matching the filter, newest first
    pub async fn list(
        &self,
        filter: &PredictionFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Prediction>, sqlx::Error> {
        sqlx::query_as::<_, Prediction>(
            r#"
            SELECT * FROM predictions
            WHERE ($1::uuid IS NULL OR student_id = $1)
              AND ($2::varchar IS NULL OR risk_level = $2)
              AND ($3::boolean IS NULL OR at_risk = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.student_id)
        .bind(filter.risk_level)
        .bind(filter.at_risk)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn count(&self, filter: &PredictionFilter) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM predictions
            WHERE ($1::uuid IS NULL OR student_id = $1)
              AND ($2::varchar IS NULL OR risk_level = $2)
              AND ($3::boolean IS NULL OR at_risk = $3)
            "#,
        )
        .bind(filter.student_id)
        .bind(filter.risk_level)
        .bind(filter.at_risk)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn latest_for_student(
        &self,
        student_id: Uuid,
    ) -> Result<Option<Prediction>, sqlx::Error> {
        sqlx::query_as::<_, Prediction>(
            "SELECT * FROM predictions WHERE student_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Prediction>, sqlx::Error> {
        sqlx::query_as::<_, Prediction>("SELECT * FROM predictions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM predictions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
