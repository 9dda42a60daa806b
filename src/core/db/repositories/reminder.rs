//! Scheduled reminder and notification repositories

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::core::db::models::{CreateNotification, CreateReminder, Notification, ScheduledReminder};

/// Maximum number of notifications returned to a student
pub const NOTIFICATION_LIST_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct ReminderRepository {
    pool: PgPool,
}

impl ReminderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Reminders already scheduled for a student and one project or task
    pub async fn list_for_item(
        &self,
        student_id: Uuid,
        project_id: Option<Uuid>,
        task_id: Option<Uuid>,
    ) -> Result<Vec<ScheduledReminder>, sqlx::Error> {
        sqlx::query_as::<_, ScheduledReminder>(
            r#"
            SELECT * FROM scheduled_reminders
            WHERE student_id = $1
              AND project_id IS NOT DISTINCT FROM $2
              AND task_id IS NOT DISTINCT FROM $3
            ORDER BY reminder_percentage ASC
            "#,
        )
        .bind(student_id)
        .bind(project_id)
        .bind(task_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Insert a batch of reminders in one transaction.
    ///
    /// Checkpoints that already exist for the student and item are skipped,
    /// so only the newly inserted rows are returned.
    pub async fn create_many(
        &self,
        reminders: &[CreateReminder],
    ) -> Result<Vec<ScheduledReminder>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(reminders.len());

        for reminder in reminders {
            let row = sqlx::query_as::<_, ScheduledReminder>(
                r#"
                INSERT INTO scheduled_reminders (
                    student_id, project_id, task_id, reminder_type,
                    reminder_percentage, deadline_date, scheduled_for
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT DO NOTHING
                RETURNING *
                "#,
            )
            .bind(reminder.student_id)
            .bind(reminder.project_id)
            .bind(reminder.task_id)
            .bind(reminder.reminder_type)
            .bind(reminder.reminder_percentage)
            .bind(reminder.deadline_date)
            .bind(reminder.scheduled_for)
            .fetch_optional(&mut *tx)
            .await?;
            created.extend(row);
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Unprocessed reminders due at or before `now`, oldest first
    pub async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ScheduledReminder>, sqlx::Error> {
        sqlx::query_as::<_, ScheduledReminder>(
            r#"
            SELECT * FROM scheduled_reminders
            WHERE NOT is_processed AND scheduled_for <= $1
            ORDER BY scheduled_for ASC
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn mark_processed(&self, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE scheduled_reminders SET is_processed = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, dto: &CreateNotification) -> Result<Notification, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (
                student_id, project_id, task_id, notification_type, reminder_percentage,
                title, message, description, task_progress, is_sent, sent_at, scheduled_for
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(dto.student_id)
        .bind(dto.project_id)
        .bind(dto.task_id)
        .bind(dto.notification_type)
        .bind(dto.reminder_percentage)
        .bind(&dto.title)
        .bind(&dto.message)
        .bind(&dto.description)
        .bind(Json(&dto.task_progress))
        .bind(dto.sent_at.is_some())
        .bind(dto.sent_at)
        .bind(dto.scheduled_for)
        .fetch_one(&self.pool)
        .await
    }

    /// Whether a reminder notification was already created for this checkpoint
    pub async fn exists_for_checkpoint(
        &self,
        student_id: Uuid,
        project_id: Option<Uuid>,
        task_id: Option<Uuid>,
        reminder_percentage: i32,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM notifications
                WHERE student_id = $1
                  AND project_id IS NOT DISTINCT FROM $2
                  AND task_id IS NOT DISTINCT FROM $3
                  AND reminder_percentage = $4
            )
            "#,
        )
        .bind(student_id)
        .bind(project_id)
        .bind(task_id)
        .bind(reminder_percentage)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Latest notifications of a student, newest first
    pub async fn list_recent(&self, student_id: Uuid) -> Result<Vec<Notification>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE student_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(student_id)
        .bind(NOTIFICATION_LIST_LIMIT)
        .fetch_all(&self.pool)
        .await
    }

    /// Mark one of the student's notifications as read
    pub async fn mark_read(
        &self,
        id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<Notification>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications SET is_read = TRUE
            WHERE id = $1 AND student_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::models::{
        CreateCourse, CreateLecturer, CreateStudent, CreateTask, Gender, LecturerPosition,
        ReminderType, RichText, Specialization,
    };
    use crate::core::db::repositories::{
        CourseRepository, LecturerRepository, StudentRepository, TaskRepository,
    };
    use chrono::{Duration, NaiveDate};

    // ========================================================================
    // Integration Tests (require database)
    // ========================================================================

    fn checkpoints(student_id: Uuid, task_id: Uuid) -> Vec<CreateReminder> {
        let deadline = Utc::now() + Duration::days(8);
        [
            (ReminderType::Task25, 25),
            (ReminderType::Task50, 50),
            (ReminderType::Task75, 75),
            (ReminderType::TaskDeadline, 100),
        ]
        .into_iter()
        .map(|(reminder_type, pct)| CreateReminder {
            student_id,
            project_id: None,
            task_id: Some(task_id),
            reminder_type,
            reminder_percentage: pct,
            deadline_date: deadline,
            scheduled_for: Utc::now() + Duration::days(i64::from(pct) / 25),
        })
        .collect()
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_create_many_skips_existing_checkpoints() {
        let pool = create_test_pool().await;
        let suffix = Uuid::new_v4().simple().to_string()[..8].to_string();

        let lecturer = LecturerRepository::new(pool.clone())
            .create(&CreateLecturer {
                name: "Reminder Lecturer".to_string(),
                email: format!("lecturer_{}@example.com", suffix),
                password_hash: "$2b$12$placeholder".to_string(),
                gender: Gender::Male,
                date_of_birth: NaiveDate::from_ymd_opt(1980, 3, 4).unwrap(),
                position: LecturerPosition::Lic,
                is_verified: true,
            })
            .await
            .unwrap();
        let course = CourseRepository::new(pool.clone())
            .create(&CreateCourse {
                course_name: format!("Course {}", suffix),
                credits: 3,
                year: 2,
                semester: 1,
                lecturer_in_charge: lecturer.id,
                lecturers: vec![],
                specializations: vec!["IT".to_string()],
            })
            .await
            .unwrap();
        let task = TaskRepository::new(pool.clone())
            .create(&CreateTask {
                course_id: course.id,
                lecturer_id: lecturer.id,
                task_name: "Lab sheet".to_string(),
                description: RichText::default(),
                deadline_date: Some(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()),
                deadline_time: "23:59".to_string(),
                special_notes: RichText::default(),
                template_documents: vec![],
                other_documents: vec![],
                images: vec![],
                subtasks: vec![],
            })
            .await
            .unwrap();
        let students = StudentRepository::new(pool.clone());
        let student = students
            .create(&CreateStudent {
                student_id_number: format!("it{}", suffix),
                name: "Reminder Student".to_string(),
                email: format!("student_{}@example.com", suffix),
                password_hash: "$2b$12$placeholder".to_string(),
                gender: Gender::Female,
                date_of_birth: NaiveDate::from_ymd_opt(2003, 1, 9).unwrap(),
                address: "Kandy".to_string(),
                nic_number: format!("nic{}", suffix),
                academic_year: "2".to_string(),
                semester: "1".to_string(),
                specialization: Specialization::It,
            })
            .await
            .unwrap();

        let repo = ReminderRepository::new(pool.clone());
        let first = repo.create_many(&checkpoints(student.id, task.id)).await.unwrap();
        let second = repo.create_many(&checkpoints(student.id, task.id)).await.unwrap();

        assert_eq!(first.len(), 4);
        assert!(second.is_empty());
        let stored = repo
            .list_for_item(student.id, None, Some(task.id))
            .await
            .unwrap();
        assert_eq!(stored.len(), 4);

        students.delete(student.id).await.unwrap();
        CourseRepository::new(pool.clone()).delete(course.id).await.unwrap();
        LecturerRepository::new(pool).delete(lecturer.id).await.unwrap();
    }

    async fn create_test_pool() -> PgPool {
        use crate::core::db::pool::{DbConfig, create_pool};

        let config = DbConfig::from_env().expect("DATABASE_URL must be set for tests");
        create_pool(&config)
            .await
            .expect("Failed to create test pool")
    }
}
