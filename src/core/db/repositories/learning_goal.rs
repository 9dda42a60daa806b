//! Learning goal repository; every query is scoped to the owning student

use serde::Serialize;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::core::db::models::{GoalFields, GoalFilter, LearningGoal};

/// Aggregates over all of a student's goals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GoalStats {
    pub total: i64,
    pub active: i64,
    pub completed: i64,
    pub overdue: i64,
    pub avg_progress: i64,
}

#[derive(Clone)]
pub struct LearningGoalRepository {
    pool: PgPool,
}

impl LearningGoalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Goals matching the filter, soonest target date first
    pub async fn list(
        &self,
        student_id: Uuid,
        filter: &GoalFilter,
    ) -> Result<Vec<LearningGoal>, sqlx::Error> {
        sqlx::query_as::<_, LearningGoal>(
            r#"
            SELECT * FROM learning_goals
            WHERE student_id = $1
              AND ($2::varchar IS NULL OR status = $2)
              AND ($3::varchar IS NULL OR category = $3)
              AND ($4::varchar IS NULL OR priority = $4)
            ORDER BY target_date ASC, created_at DESC
            "#,
        )
        .bind(student_id)
        .bind(filter.status)
        .bind(filter.category)
        .bind(filter.priority)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn stats(&self, student_id: Uuid) -> Result<GoalStats, sqlx::Error> {
        sqlx::query_as::<_, GoalStats>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'active') AS active,
                COUNT(*) FILTER (WHERE status = 'completed') AS completed,
                COUNT(*) FILTER (WHERE status = 'overdue') AS overdue,
                COALESCE(ROUND(AVG(progress)), 0)::bigint AS avg_progress
            FROM learning_goals
            WHERE student_id = $1
            "#,
        )
        .bind(student_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn create(
        &self,
        student_id: Uuid,
        fields: &GoalFields,
    ) -> Result<LearningGoal, sqlx::Error> {
        sqlx::query_as::<_, LearningGoal>(
            r#"
            INSERT INTO learning_goals (
                student_id, title, description, category, target_date, priority,
                status, progress, milestones, tags, course_id, completed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(student_id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.category)
        .bind(fields.target_date)
        .bind(fields.priority)
        .bind(fields.status)
        .bind(fields.progress)
        .bind(Json(&fields.milestones))
        .bind(&fields.tags)
        .bind(fields.course_id)
        .bind(fields.completed_at)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find(
        &self,
        id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<LearningGoal>, sqlx::Error> {
        sqlx::query_as::<_, LearningGoal>(
            "SELECT * FROM learning_goals WHERE id = $1 AND student_id = $2",
        )
        .bind(id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Overwrite every editable field of a goal
    pub async fn update(
        &self,
        id: Uuid,
        student_id: Uuid,
        fields: &GoalFields,
    ) -> Result<Option<LearningGoal>, sqlx::Error> {
        sqlx::query_as::<_, LearningGoal>(
            r#"
            UPDATE learning_goals
            SET
                title = $3,
                description = $4,
                category = $5,
                target_date = $6,
                priority = $7,
                status = $8,
                progress = $9,
                milestones = $10,
                tags = $11,
                course_id = $12,
                completed_at = $13
            WHERE id = $1 AND student_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(student_id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.category)
        .bind(fields.target_date)
        .bind(fields.priority)
        .bind(fields.status)
        .bind(fields.progress)
        .bind(Json(&fields.milestones))
        .bind(&fields.tags)
        .bind(fields.course_id)
        .bind(fields.completed_at)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete(&self, id: Uuid, student_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM learning_goals WHERE id = $1 AND student_id = $2")
            .bind(id)
            .bind(student_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_stats_serialization() {
        let stats = GoalStats {
            total: 4,
            active: 2,
            completed: 1,
            overdue: 1,
            avg_progress: 38,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["avgProgress"], 38);
        assert_eq!(json["overdue"], 1);
    }
}
