use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::shared::enums::EnrollmentStatus;
use crate::core::shared::schema::{certificates, enrollments, lesson_progress};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = enrollments)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub status: EnrollmentStatus,
    pub progress_percentage: i32,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = lesson_progress)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LessonProgress {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub lesson_id: Uuid,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub watch_time_minutes: i32,
}

/// Whole percent of completed lessons, rounded down. A course without
/// lessons reports 0.
pub fn progress_percentage(completed: usize, total: usize) -> i32 {
    if total == 0 {
        return 0;
    }
    let percent = completed.min(total) * 100 / total;
    percent as i32
}

impl Enrollment {
    /// Recomputes the percentage from a fresh count and completes the
    /// enrollment once every lesson is done. Returns whether it is at 100.
    pub fn recount(&mut self, completed: usize, total: usize, at: DateTime<Utc>) -> bool {
        self.progress_percentage = progress_percentage(completed, total);
        if self.progress_percentage < 100 {
            return false;
        }
        if self.status == EnrollmentStatus::Active {
            self.status = EnrollmentStatus::Completed;
            self.completed_at = Some(at);
        }
        true
    }
}

impl LessonProgress {
    /// Folds one report into the row: watch time accumulates, completion
    /// is sticky and keeps its first timestamp.
    pub fn apply(existing: Option<LessonProgress>, entry: &ProgressEntry) -> LessonProgress {
        let mut row = existing.unwrap_or_else(|| LessonProgress {
            id: Uuid::new_v4(),
            enrollment_id: entry.enrollment_id,
            lesson_id: entry.lesson_id,
            is_completed: false,
            completed_at: None,
            watch_time_minutes: 0,
        });
        row.watch_time_minutes = row.watch_time_minutes.saturating_add(entry.watch_time_minutes);
        if entry.is_completed && !row.is_completed {
            row.is_completed = true;
            row.completed_at = Some(entry.recorded_at);
        }
        row
    }
}

/// One progress report, applied by the store while it holds the
/// enrollment, so concurrent reports never overwrite each other.
#[derive(Debug, Clone)]
pub struct ProgressEntry {
    pub enrollment_id: Uuid,
    pub lesson_id: Uuid,
    pub is_completed: bool,
    pub watch_time_minutes: i32,
    pub recorded_at: DateTime<Utc>,
    /// Issued only when this report completes the course and the
    /// enrollment has no certificate yet.
    pub certificate: Certificate,
}

#[derive(Debug, Clone)]
pub enum ProgressOutcome {
    Recorded(ProgressUpdate),
    EnrollmentDropped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = certificates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Certificate {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub certificate_number: String,
    pub certificate_url: String,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollRequest {
    #[serde(alias = "course_id")]
    pub course: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRequest {
    #[serde(alias = "lesson_id")]
    pub lesson: Uuid,
    #[serde(default)]
    pub is_completed: bool,
    /// Minutes watched in this session, added to the running total.
    #[serde(default)]
    pub watch_time_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentListItem {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    pub course_title: String,
    pub course_slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentDetail {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    pub course_title: String,
    pub course_slug: String,
    pub total_lessons: usize,
    pub lesson_progress: Vec<LessonProgress>,
    pub certificate: Option<Certificate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub progress: LessonProgress,
    pub enrollment: Enrollment,
    pub certificate: Option<Certificate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateVerification {
    pub is_valid: bool,
    pub certificate: Option<Certificate>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(is_completed: bool, minutes: i32, at: DateTime<Utc>) -> ProgressEntry {
        let enrollment_id = Uuid::new_v4();
        ProgressEntry {
            enrollment_id,
            lesson_id: Uuid::new_v4(),
            is_completed,
            watch_time_minutes: minutes,
            recorded_at: at,
            certificate: Certificate {
                id: Uuid::new_v4(),
                enrollment_id,
                certificate_number: "CH-20250101-00000000".to_string(),
                certificate_url: String::new(),
                issued_at: at,
            },
        }
    }

    #[test]
    fn test_progress_accumulates_and_completion_sticks() {
        let first = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap();
        let row = LessonProgress::apply(None, &entry(true, 7, first));
        assert_eq!(row.watch_time_minutes, 7);
        assert_eq!(row.completed_at, Some(first));

        let row = LessonProgress::apply(Some(row), &entry(false, 3, later));
        assert_eq!(row.watch_time_minutes, 10);
        assert!(row.is_completed);
        assert_eq!(row.completed_at, Some(first));
    }

    #[test]
    fn test_recount_completes_active_enrollments_only() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        let mut enrollment = Enrollment {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            status: EnrollmentStatus::Active,
            progress_percentage: 0,
            enrolled_at: at,
            completed_at: None,
        };
        assert!(!enrollment.recount(1, 2, at));
        assert_eq!(enrollment.progress_percentage, 50);
        assert_eq!(enrollment.status, EnrollmentStatus::Active);

        assert!(enrollment.recount(2, 2, at));
        assert_eq!(enrollment.status, EnrollmentStatus::Completed);
        assert_eq!(enrollment.completed_at, Some(at));
    }
}
