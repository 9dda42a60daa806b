//! Which courses a student belongs to
//!
//! A student is enrolled by cohort: a course is theirs when its year and
//! semester equal the student's and it is offered to their specialization.

use serde::{Deserialize, Serialize};

use crate::core::db::models::{Course, Student};
use crate::core::db::repositories::{CourseRepository, CourseRepositoryError};
use crate::core::validation::parse_enum;

/// Per-criterion match between a student and a course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityReason {
    pub year_match: bool,
    pub semester_match: bool,
    pub specialization_match: bool,
}

impl EligibilityReason {
    pub fn all(&self) -> bool {
        self.year_match && self.semester_match && self.specialization_match
    }
}

pub fn eligibility_reason(student: &Student, course: &Course) -> EligibilityReason {
    EligibilityReason {
        year_match: student.year() == Some(course.year),
        semester_match: student.semester_number() == Some(course.semester),
        specialization_match: course.offers(student.specialization),
    }
}

/// Whether the course is an active course of the student's cohort
pub fn is_eligible(student: &Student, course: &Course) -> bool {
    !course.is_archived && eligibility_reason(student, course).all()
}

/// Active courses of the student's cohort, by name; none when the cohort fields are unparseable
pub async fn enrolled_courses(
    courses: &CourseRepository,
    student: &Student,
) -> Result<Vec<Course>, CourseRepositoryError> {
    match (student.year(), student.semester_number()) {
        (Some(year), Some(semester)) => {
            courses
                .list_for_cohort(year, semester, &student.specialization.to_string())
                .await
        }
        _ => Ok(Vec::new()),
    }
}

/// Course catalogue views offered to students
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CourseFilter {
    MyCourses,
    OtherYear,
    OtherSemester,
    #[default]
    All,
}

impl CourseFilter {
    /// Unknown or missing values fall back to `All`
    pub fn parse(value: Option<&str>) -> Self {
        value
            .and_then(parse_enum::<CourseFilter>)
            .unwrap_or_default()
    }

    /// Whether an active course belongs in this view for the student.
    /// The "other" views keep the student's specialization and vary one of
    /// year or semester.
    pub fn matches(self, student: &Student, course: &Course) -> bool {
        if course.is_archived {
            return false;
        }

        let reason = eligibility_reason(student, course);
        match self {
            CourseFilter::MyCourses => reason.all(),
            CourseFilter::OtherYear => {
                !reason.year_match && reason.semester_match && reason.specialization_match
            }
            CourseFilter::OtherSemester => {
                reason.year_match && !reason.semester_match && reason.specialization_match
            }
            CourseFilter::All => true,
        }
    }
}

/// Order by year, then semester, then name
pub fn sort_catalogue(courses: &mut [Course]) {
    courses.sort_by(|a, b| {
        (a.year, a.semester, &a.course_name).cmp(&(b.year, b.semester, &b.course_name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::models::{Gender, Specialization};
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn student(year: &str, semester: &str, specialization: Specialization) -> Student {
        Student {
            id: Uuid::new_v4(),
            student_id_number: "it22000001".to_string(),
            name: "Kasun".to_string(),
            email: "kasun@example.com".to_string(),
            password_hash: String::new(),
            gender: Gender::Male,
            date_of_birth: NaiveDate::from_ymd_opt(2003, 1, 1).unwrap(),
            address: "Kandy".to_string(),
            nic_number: "200300100V".to_string(),
            academic_year: year.to_string(),
            semester: semester.to_string(),
            specialization,
            is_verified: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn course(name: &str, year: i32, semester: i32, specs: &[&str]) -> Course {
        Course {
            id: Uuid::new_v4(),
            course_name: name.to_string(),
            credits: 4,
            year,
            semester,
            lecturer_in_charge: Uuid::new_v4(),
            lecturers: vec![],
            specializations: specs.iter().map(|s| s.to_string()).collect(),
            is_archived: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    // ========================================================================
    // Eligibility Tests
    // ========================================================================

    #[test]
    fn test_is_eligible_requires_all_criteria() {
        let s = student("3", "1", Specialization::Se);

        assert!(is_eligible(&s, &course("SEP", 3, 1, &["SE", "IT"])));
        assert!(!is_eligible(&s, &course("SEP", 2, 1, &["SE"])));
        assert!(!is_eligible(&s, &course("SEP", 3, 2, &["SE"])));
        assert!(!is_eligible(&s, &course("SEP", 3, 1, &["IT"])));
    }

    #[test]
    fn test_archived_course_is_not_eligible() {
        let s = student("3", "1", Specialization::Se);
        let mut c = course("SEP", 3, 1, &["SE"]);
        c.is_archived = true;

        assert!(!is_eligible(&s, &c));
        assert!(eligibility_reason(&s, &c).all());
    }

    #[test]
    fn test_eligibility_reason_fields() {
        let s = student("2", "2", Specialization::Ds);
        let reason = eligibility_reason(&s, &course("ML", 2, 1, &["IT"]));

        assert!(reason.year_match);
        assert!(!reason.semester_match);
        assert!(!reason.specialization_match);

        let json = serde_json::to_value(reason).unwrap();
        assert_eq!(json["yearMatch"], true);
        assert_eq!(json["specializationMatch"], false);
    }

    #[test]
    fn test_unparseable_student_year_never_matches() {
        let s = student("first", "1", Specialization::It);
        assert!(!eligibility_reason(&s, &course("X", 1, 1, &["IT"])).year_match);
    }

    // ========================================================================
    // Filter Tests
    // ========================================================================

    #[test]
    fn test_course_filter_parse() {
        assert_eq!(CourseFilter::parse(Some("my-courses")), CourseFilter::MyCourses);
        assert_eq!(CourseFilter::parse(Some("other-year")), CourseFilter::OtherYear);
        assert_eq!(
            CourseFilter::parse(Some("other-semester")),
            CourseFilter::OtherSemester
        );
        assert_eq!(CourseFilter::parse(Some("bogus")), CourseFilter::All);
        assert_eq!(CourseFilter::parse(None), CourseFilter::All);
    }

    #[test]
    fn test_course_filter_views() {
        let s = student("3", "1", Specialization::Se);
        let mine = course("Mine", 3, 1, &["SE"]);
        let other_year = course("Year4", 4, 1, &["SE"]);
        let other_semester = course("Sem2", 3, 2, &["SE"]);
        let other_spec = course("DS only", 3, 1, &["DS"]);

        assert!(CourseFilter::MyCourses.matches(&s, &mine));
        assert!(!CourseFilter::MyCourses.matches(&s, &other_year));

        assert!(CourseFilter::OtherYear.matches(&s, &other_year));
        assert!(!CourseFilter::OtherYear.matches(&s, &other_semester));

        assert!(CourseFilter::OtherSemester.matches(&s, &other_semester));
        assert!(!CourseFilter::OtherSemester.matches(&s, &other_spec));

        for c in [&mine, &other_year, &other_semester, &other_spec] {
            assert!(CourseFilter::All.matches(&s, c));
        }
    }

    #[test]
    fn test_sort_catalogue() {
        let mut courses = vec![
            course("B", 2, 1, &[]),
            course("A", 2, 1, &[]),
            course("Z", 1, 2, &[]),
            course("C", 1, 1, &[]),
        ];
        sort_catalogue(&mut courses);

        let names: Vec<&str> = courses.iter().map(|c| c.course_name.as_str()).collect();
        assert_eq!(names, ["C", "Z", "A", "B"]);
    }
}
