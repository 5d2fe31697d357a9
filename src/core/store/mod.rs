//! Persistence seam for the catalog, enrollment and feedback services.
//!
//! Both implementations honour the same contracts: the named unique
//! constraints below are enforced at write time and reported as
//! [`StoreError::Conflict`], and deleting a parent row removes its
//! dependents.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryCatalogStore;
pub use postgres::PgCatalogStore;

use std::future::Future;
use uuid::Uuid;

use crate::catalog::filter::CourseQuery;
use crate::catalog::types::{Category, Course, Instructor, Lesson, Section, User};
use crate::enrollment::types::{Certificate, Enrollment, LessonProgress, ProgressEntry, ProgressOutcome};
use crate::feedback::types::{Answer, CourseReview, Question};

pub const USERS_USERNAME_KEY: &str = "users_username_key";
pub const INSTRUCTORS_USER_KEY: &str = "instructors_user_id_key";
pub const CATEGORIES_SLUG_KEY: &str = "categories_slug_key";
pub const COURSES_SLUG_KEY: &str = "courses_slug_key";
pub const ENROLLMENTS_STUDENT_COURSE_KEY: &str = "enrollments_student_course_key";
pub const LESSON_PROGRESS_KEY: &str = "lesson_progress_enrollment_lesson_key";
pub const CERTIFICATES_ENROLLMENT_KEY: &str = "certificates_enrollment_id_key";
pub const CERTIFICATES_NUMBER_KEY: &str = "certificates_number_key";
pub const REVIEWS_COURSE_STUDENT_KEY: &str = "course_reviews_course_student_key";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("unique constraint {0} violated")]
    Conflict(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_conflict_on(&self, constraint: &str) -> bool {
        matches!(self, Self::Conflict(name) if name == constraint)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait CatalogStore: Clone + Send + Sync + 'static {
    // ----- identity -----
    /// Inserts the user and its instructor profile atomically.
    fn insert_instructor(
        &self,
        user: User,
        instructor: Instructor,
    ) -> impl Future<Output = StoreResult<Instructor>> + Send;
    fn get_user(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<User>>> + Send;
    fn get_instructor(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<Instructor>>> + Send;
    fn list_instructors(&self) -> impl Future<Output = StoreResult<Vec<Instructor>>> + Send;

    // ----- categories -----
    fn insert_category(&self, category: Category) -> impl Future<Output = StoreResult<Category>> + Send;
    fn get_category(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<Category>>> + Send;
    fn list_categories(&self) -> impl Future<Output = StoreResult<Vec<Category>>> + Send;
    fn update_category(&self, category: Category) -> impl Future<Output = StoreResult<Category>> + Send;

    // ----- courses -----
    fn insert_course(&self, course: Course) -> impl Future<Output = StoreResult<Course>> + Send;
    fn get_course(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<Course>>> + Send;
    fn get_course_by_slug(&self, slug: &str) -> impl Future<Output = StoreResult<Option<Course>>> + Send;
    /// Courses matching `query`, ordered by it, ties in insertion order.
    fn list_courses(&self, query: &CourseQuery) -> impl Future<Output = StoreResult<Vec<Course>>> + Send;
    /// Every course slug equal to `base` or starting with `base-`.
    fn slugs_with_prefix(&self, base: &str) -> impl Future<Output = StoreResult<Vec<String>>> + Send;
    fn update_course(&self, course: Course) -> impl Future<Output = StoreResult<Course>> + Send;
    fn delete_course(&self, id: Uuid) -> impl Future<Output = StoreResult<()>> + Send;

    // ----- sections & lessons -----
    fn insert_section(&self, section: Section) -> impl Future<Output = StoreResult<Section>> + Send;
    fn get_section(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<Section>>> + Send;
    /// Sections of a course by `order`.
    fn list_sections(&self, course_id: Uuid) -> impl Future<Output = StoreResult<Vec<Section>>> + Send;
    fn delete_section(&self, id: Uuid) -> impl Future<Output = StoreResult<()>> + Send;
    fn insert_lesson(&self, lesson: Lesson) -> impl Future<Output = StoreResult<Lesson>> + Send;
    fn get_lesson(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<Lesson>>> + Send;
    /// Lessons of a section by `order`.
    fn list_lessons(&self, section_id: Uuid) -> impl Future<Output = StoreResult<Vec<Lesson>>> + Send;
    /// Every lesson of every section of a course.
    fn list_course_lessons(&self, course_id: Uuid) -> impl Future<Output = StoreResult<Vec<Lesson>>> + Send;
    fn delete_lesson(&self, id: Uuid) -> impl Future<Output = StoreResult<()>> + Send;

    // ----- enrollments -----
    /// Inserts the enrollment and bumps the instructor's `total_students`.
    fn insert_enrollment(
        &self,
        enrollment: Enrollment,
        instructor_id: Uuid,
    ) -> impl Future<Output = StoreResult<Enrollment>> + Send;
    fn get_enrollment(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<Enrollment>>> + Send;
    fn find_enrollment(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> impl Future<Output = StoreResult<Option<Enrollment>>> + Send;
    fn list_student_enrollments(
        &self,
        student_id: Uuid,
    ) -> impl Future<Output = StoreResult<Vec<Enrollment>>> + Send;
    fn count_course_enrollments(&self, course_id: Uuid) -> impl Future<Output = StoreResult<i64>> + Send;
    fn update_enrollment(&self, enrollment: Enrollment) -> impl Future<Output = StoreResult<Enrollment>> + Send;
    /// Folds one progress report into its row, recounts the enrollment's
    /// completed lessons and issues the entry's certificate on first reaching
    /// 100%, all while holding the enrollment against concurrent reports.
    fn record_progress(
        &self,
        entry: ProgressEntry,
    ) -> impl Future<Output = StoreResult<ProgressOutcome>> + Send;
    fn list_lesson_progress(
        &self,
        enrollment_id: Uuid,
    ) -> impl Future<Output = StoreResult<Vec<LessonProgress>>> + Send;
    fn get_certificate_for_enrollment(
        &self,
        enrollment_id: Uuid,
    ) -> impl Future<Output = StoreResult<Option<Certificate>>> + Send;
    fn get_certificate_by_number(
        &self,
        number: &str,
    ) -> impl Future<Output = StoreResult<Option<Certificate>>> + Send;

    // ----- feedback -----
    fn insert_review(&self, review: CourseReview) -> impl Future<Output = StoreResult<CourseReview>> + Send;
    fn get_review(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<CourseReview>>> + Send;
    fn list_reviews(&self, course_id: Uuid) -> impl Future<Output = StoreResult<Vec<CourseReview>>> + Send;
    fn delete_review(&self, id: Uuid) -> impl Future<Output = StoreResult<()>> + Send;
    fn insert_question(&self, question: Question) -> impl Future<Output = StoreResult<Question>> + Send;
    fn get_question(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<Question>>> + Send;
    fn list_questions(&self, lesson_id: Uuid) -> impl Future<Output = StoreResult<Vec<Question>>> + Send;
    fn insert_answer(&self, answer: Answer) -> impl Future<Output = StoreResult<Answer>> + Send;
    fn list_answers(&self, question_id: Uuid) -> impl Future<Output = StoreResult<Vec<Answer>>> + Send;

    fn ping(&self) -> impl Future<Output = StoreResult<()>> + Send;
}
