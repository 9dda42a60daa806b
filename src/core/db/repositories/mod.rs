//! Database repositories for SmartLMS
//!
//! Repositories encapsulate data access logic. Each one owns a clone of the
//! pool and exposes async methods returning model structs.

pub mod code_assignment;
pub mod course;
pub mod learning_goal;
pub mod lecturer;
pub mod prediction;
pub mod progress;
pub mod project;
pub mod reminder;
pub mod student;
pub mod template;

pub use code_assignment::CodeAssignmentRepository;
pub use course::{CourseRepository, CourseRepositoryError, CourseStats};
pub use learning_goal::{GoalStats, LearningGoalRepository};
pub use lecturer::{LecturerRepository, LecturerRepositoryError};
pub use prediction::PredictionRepository;
pub use progress::{ProgressRepository, ProjectProgressOverview, TaskProgressOverview};
pub use project::{ProjectRepository, ProjectRepositoryError, TaskRepository};
pub use reminder::{NOTIFICATION_LIST_LIMIT, NotificationRepository, ReminderRepository};
pub use student::{StudentConflicts, StudentRepository, StudentRepositoryError};
pub use template::TemplateRepository;
