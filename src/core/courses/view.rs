//! Course responses with lecturer details filled in

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::core::db::models::{Course, LecturerSummary};
use crate::core::db::repositories::{LecturerRepository, LecturerRepositoryError};

/// A lecturer reference: the summary when the lecturer still exists, the bare id otherwise
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LecturerRef {
    Populated(LecturerSummary),
    Missing(Uuid),
}

impl LecturerRef {
    fn resolve(id: Uuid, lecturers: &HashMap<Uuid, LecturerSummary>) -> Self {
        lecturers
            .get(&id)
            .cloned()
            .map_or(LecturerRef::Missing(id), LecturerRef::Populated)
    }
}

/// A course as returned to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseView {
    pub id: Uuid,
    pub course_name: String,
    pub credits: i32,
    pub year: i32,
    pub semester: i32,
    pub lecturer_in_charge: LecturerRef,
    pub lecturers: Vec<LecturerRef>,
    pub specializations: Vec<String>,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CourseView {
    pub fn new(course: Course, lecturers: &HashMap<Uuid, LecturerSummary>) -> Self {
        Self {
            id: course.id,
            lecturer_in_charge: LecturerRef::resolve(course.lecturer_in_charge, lecturers),
            lecturers: course
                .lecturers
                .iter()
                .map(|id| LecturerRef::resolve(*id, lecturers))
                .collect(),
            course_name: course.course_name,
            credits: course.credits,
            year: course.year,
            semester: course.semester,
            specializations: course.specializations,
            is_archived: course.is_archived,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

async fn lecturer_map(
    lecturers: &LecturerRepository,
    courses: &[Course],
) -> Result<HashMap<Uuid, LecturerSummary>, LecturerRepositoryError> {
    let mut ids: Vec<Uuid> = courses
        .iter()
        .flat_map(|c| std::iter::once(c.lecturer_in_charge).chain(c.lecturers.iter().copied()))
        .collect();
    ids.sort_unstable();
    ids.dedup();

    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    Ok(lecturers
        .find_by_ids(&ids)
        .await?
        .iter()
        .map(|l| (l.id, LecturerSummary::from(l)))
        .collect())
}

/// Load every lecturer referenced by `courses` in one query and build the views
pub async fn populate(
    lecturers: &LecturerRepository,
    courses: Vec<Course>,
) -> Result<Vec<CourseView>, LecturerRepositoryError> {
    let found = lecturer_map(lecturers, &courses).await?;

    Ok(courses
        .into_iter()
        .map(|course| CourseView::new(course, &found))
        .collect())
}

pub async fn populate_one(
    lecturers: &LecturerRepository,
    course: Course,
) -> Result<CourseView, LecturerRepositoryError> {
    let found = lecturer_map(lecturers, std::slice::from_ref(&course)).await?;
    Ok(CourseView::new(course, &found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::models::LecturerPosition;

    #[test]
    fn test_course_view_resolves_known_lecturers() {
        let lic = Uuid::new_v4();
        let gone = Uuid::new_v4();
        let mut known = HashMap::new();
        known.insert(
            lic,
            LecturerSummary {
                id: lic,
                name: "Dr. Perera".to_string(),
                email: "perera@uni.ac.lk".to_string(),
                position: LecturerPosition::Lic,
            },
        );

        let course = Course {
            id: Uuid::new_v4(),
            course_name: "Distributed Systems".to_string(),
            credits: 4,
            year: 3,
            semester: 2,
            lecturer_in_charge: lic,
            lecturers: vec![lic, gone],
            specializations: vec!["SE".to_string()],
            is_archived: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let view = CourseView::new(course, &known);
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["courseName"], "Distributed Systems");
        assert_eq!(json["lecturerInCharge"]["name"], "Dr. Perera");
        assert_eq!(json["lecturers"][0]["position"], "lic");
        assert_eq!(json["lecturers"][1], gone.to_string());
    }
}
