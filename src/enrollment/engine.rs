use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::types::{
    Certificate, CertificateVerification, EnrollRequest, Enrollment, EnrollmentDetail, EnrollmentListItem,
    ProgressEntry, ProgressOutcome, ProgressRequest, ProgressUpdate,
};
use crate::core::error::{CatalogError, CatalogResult};
use crate::core::shared::enums::{CourseStatus, EnrollmentStatus};
use crate::core::store::{CatalogStore, ENROLLMENTS_STUDENT_COURSE_KEY};

pub const CERTIFICATE_PREFIX: &str = "CH";

pub use super::types::progress_percentage;

/// `CH-YYYYMMDD-XXXXXXXX`, the suffix taken from a fresh random id.
pub fn certificate_number(issued_at: DateTime<Utc>, id: Uuid) -> String {
    let simple = id.simple().to_string().to_uppercase();
    format!(
        "{}-{}-{}",
        CERTIFICATE_PREFIX,
        issued_at.format("%Y%m%d"),
        &simple[..8]
    )
}

fn dropped() -> CatalogError {
    CatalogError::field("enrollment", "Progress cannot be recorded on a dropped enrollment.")
}

fn already_enrolled() -> CatalogError {
    CatalogError::Conflict("You are already enrolled in this course".to_string())
}

#[derive(Clone)]
pub struct EnrollmentEngine<S> {
    store: S,
}

impl<S: CatalogStore> EnrollmentEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn enroll(&self, student_id: Uuid, request: EnrollRequest) -> CatalogResult<Enrollment> {
        let course = self
            .store
            .get_course(request.course)
            .await?
            .ok_or_else(|| CatalogError::not_found("Course"))?;
        if course.status == CourseStatus::Archived {
            return Err(CatalogError::field("course", "Archived courses cannot be enrolled in."));
        }
        if self.store.find_enrollment(student_id, course.id).await?.is_some() {
            return Err(already_enrolled());
        }

        let enrollment = Enrollment {
            id: Uuid::new_v4(),
            student_id,
            course_id: course.id,
            status: EnrollmentStatus::Active,
            progress_percentage: 0,
            enrolled_at: Utc::now(),
            completed_at: None,
        };
        let saved = match self.store.insert_enrollment(enrollment, course.instructor_id).await {
            Ok(saved) => saved,
            Err(err) if err.is_conflict_on(ENROLLMENTS_STUDENT_COURSE_KEY) => return Err(already_enrolled()),
            Err(err) => return Err(err.into()),
        };
        log::info!("Student {} enrolled in course {}", student_id, course.slug);
        Ok(saved)
    }

    /// Enrollments of other students are reported as missing.
    async fn owned(&self, student_id: Uuid, id: Uuid) -> CatalogResult<Enrollment> {
        self.store
            .get_enrollment(id)
            .await?
            .filter(|e| e.student_id == student_id)
            .ok_or_else(|| CatalogError::not_found("Enrollment"))
    }

    pub async fn list_enrollments(&self, student_id: Uuid) -> CatalogResult<Vec<EnrollmentListItem>> {
        let mut items = Vec::new();
        for enrollment in self.store.list_student_enrollments(student_id).await? {
            let Some(course) = self.store.get_course(enrollment.course_id).await? else {
                continue;
            };
            items.push(EnrollmentListItem {
                enrollment,
                course_title: course.title,
                course_slug: course.slug,
            });
        }
        Ok(items)
    }

    pub async fn get_enrollment(&self, student_id: Uuid, id: Uuid) -> CatalogResult<EnrollmentDetail> {
        let enrollment = self.owned(student_id, id).await?;
        let course = self
            .store
            .get_course(enrollment.course_id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Course"))?;
        let total_lessons = self.store.list_course_lessons(course.id).await?.len();
        let lesson_progress = self.store.list_lesson_progress(enrollment.id).await?;
        let certificate = self.store.get_certificate_for_enrollment(enrollment.id).await?;
        Ok(EnrollmentDetail {
            enrollment,
            course_title: course.title,
            course_slug: course.slug,
            total_lessons,
            lesson_progress,
            certificate,
        })
    }

    pub async fn record_progress(
        &self,
        student_id: Uuid,
        id: Uuid,
        request: ProgressRequest,
    ) -> CatalogResult<ProgressUpdate> {
        let enrollment = self.owned(student_id, id).await?;
        if enrollment.status == EnrollmentStatus::Dropped {
            return Err(dropped());
        }
        if request.watch_time_minutes < 0 {
            return Err(CatalogError::field(
                "watch_time_minutes",
                "Watch time must be greater than or equal to 0.",
            ));
        }

        let course_lessons = self.store.list_course_lessons(enrollment.course_id).await?;
        if !course_lessons.iter().any(|l| l.id == request.lesson) {
            return match self.store.get_lesson(request.lesson).await? {
                Some(_) => Err(CatalogError::field("lesson", "Lesson does not belong to this course.")),
                None => Err(CatalogError::not_found("Lesson")),
            };
        }

        let now = Utc::now();
        let number = certificate_number(now, Uuid::new_v4());
        let entry = ProgressEntry {
            enrollment_id: enrollment.id,
            lesson_id: request.lesson,
            is_completed: request.is_completed,
            watch_time_minutes: request.watch_time_minutes,
            recorded_at: now,
            certificate: Certificate {
                id: Uuid::new_v4(),
                enrollment_id: enrollment.id,
                certificate_url: format!("/certificates/{}/verify/", number),
                certificate_number: number,
                issued_at: now,
            },
        };
        let update = match self.store.record_progress(entry).await? {
            ProgressOutcome::Recorded(update) => update,
            ProgressOutcome::EnrollmentDropped => return Err(dropped()),
        };
        if let Some(cert) = &update.certificate {
            log::info!(
                "Enrollment {} completed, issued certificate {}",
                enrollment.id,
                cert.certificate_number
            );
        }
        Ok(update)
    }

    pub async fn drop_enrollment(&self, student_id: Uuid, id: Uuid) -> CatalogResult<Enrollment> {
        let mut enrollment = self.owned(student_id, id).await?;
        match enrollment.status {
            EnrollmentStatus::Completed => Err(CatalogError::field(
                "status",
                "Completed enrollments cannot be dropped.",
            )),
            EnrollmentStatus::Dropped => Ok(enrollment),
            EnrollmentStatus::Active => {
                enrollment.status = EnrollmentStatus::Dropped;
                let saved = self.store.update_enrollment(enrollment).await?;
                log::info!("Student {} dropped enrollment {}", student_id, id);
                Ok(saved)
            }
        }
    }

    pub async fn certificate(&self, student_id: Uuid, id: Uuid) -> CatalogResult<Certificate> {
        let enrollment = self.owned(student_id, id).await?;
        self.store
            .get_certificate_for_enrollment(enrollment.id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Certificate"))
    }

    pub async fn verify_certificate(&self, number: &str) -> CatalogResult<CertificateVerification> {
        let found = self.store.get_certificate_by_number(number.trim()).await?;
        Ok(match found {
            Some(certificate) => CertificateVerification {
                is_valid: true,
                certificate: Some(certificate),
                message: "Certificate is valid".to_string(),
            },
            None => CertificateVerification {
                is_valid: false,
                certificate: None,
                message: "No certificate with this number was issued".to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_progress_percentage_floors() {
        assert_eq!(progress_percentage(0, 0), 0);
        assert_eq!(progress_percentage(1, 3), 33);
        assert_eq!(progress_percentage(2, 3), 66);
        assert_eq!(progress_percentage(3, 3), 100);
        assert_eq!(progress_percentage(5, 3), 100);
    }

    #[test]
    fn test_certificate_number_format() {
        let issued = Utc.with_ymd_and_hms(2025, 3, 7, 12, 0, 0).unwrap();
        let id = Uuid::parse_str("a1b2c3d4-0000-4000-8000-000000000000").unwrap();
        assert_eq!(certificate_number(issued, id), "CH-20250307-A1B2C3D4");
    }
}
