use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use super::{CatalogStore, StoreError, StoreResult};
use crate::catalog::filter::CourseQuery;
use crate::catalog::types::{Category, Course, Instructor, Lesson, Section, User};
use crate::core::shared::schema::{
    answers, categories, certificates, course_reviews, courses, enrollments, instructors, lesson_progress,
    lessons, questions, sections, users,
};
use crate::core::shared::utils::DbPool;
use crate::core::shared::enums::EnrollmentStatus;
use crate::enrollment::types::{
    Certificate, Enrollment, LessonProgress, ProgressEntry, ProgressOutcome, ProgressUpdate,
};
use crate::feedback::types::{Answer, CourseReview, Question};

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound,
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::Conflict(info.constraint_name().unwrap_or("unknown").to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => Self::NotFound,
            other => Self::Backend(other.to_string()),
        }
    }
}

fn expect_affected(count: usize) -> Result<(), DieselError> {
    if count == 0 {
        Err(DieselError::NotFound)
    } else {
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgCatalogStore {
    pool: DbPool,
}

impl PgCatalogStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Runs blocking diesel work off the async runtime.
    async fn run<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, DieselError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| StoreError::Backend(format!("DB pool error: {}", e)))?;
            op(&mut conn).map_err(StoreError::from)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("Task join error: {}", e)))?
    }
}

impl CatalogStore for PgCatalogStore {
    async fn insert_instructor(&self, user: User, instructor: Instructor) -> StoreResult<Instructor> {
        self.run(move |conn| {
            conn.transaction::<_, DieselError, _>(|conn| {
                diesel::insert_into(users::table).values(&user).execute(conn)?;
                diesel::insert_into(instructors::table)
                    .values(&instructor)
                    .returning(Instructor::as_returning())
                    .get_result(conn)
            })
        })
        .await
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.run(move |conn| {
            users::table
                .find(id)
                .select(User::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn get_instructor(&self, id: Uuid) -> StoreResult<Option<Instructor>> {
        self.run(move |conn| {
            instructors::table
                .find(id)
                .select(Instructor::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn list_instructors(&self) -> StoreResult<Vec<Instructor>> {
        self.run(|conn| {
            instructors::table
                .order((instructors::created_at.asc(), instructors::id.asc()))
                .select(Instructor::as_select())
                .load(conn)
        })
        .await
    }

    async fn insert_category(&self, category: Category) -> StoreResult<Category> {
        self.run(move |conn| {
            diesel::insert_into(categories::table)
                .values(&category)
                .returning(Category::as_returning())
                .get_result(conn)
        })
        .await
    }

    async fn get_category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        self.run(move |conn| {
            categories::table
                .find(id)
                .select(Category::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        self.run(|conn| {
            categories::table
                .order((categories::name.asc(), categories::created_at.asc()))
                .select(Category::as_select())
                .load(conn)
        })
        .await
    }

    async fn update_category(&self, category: Category) -> StoreResult<Category> {
        self.run(move |conn| {
            diesel::update(categories::table.find(category.id))
                .set(&category)
                .returning(Category::as_returning())
                .get_result(conn)
        })
        .await
    }

    async fn insert_course(&self, course: Course) -> StoreResult<Course> {
        self.run(move |conn| {
            diesel::insert_into(courses::table)
                .values(&course)
                .returning(Course::as_returning())
                .get_result(conn)
        })
        .await
    }

    async fn get_course(&self, id: Uuid) -> StoreResult<Option<Course>> {
        self.run(move |conn| {
            courses::table
                .find(id)
                .select(Course::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn get_course_by_slug(&self, slug: &str) -> StoreResult<Option<Course>> {
        let slug = slug.to_string();
        self.run(move |conn| {
            courses::table
                .filter(courses::slug.eq(slug))
                .select(Course::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn list_courses(&self, query: &CourseQuery) -> StoreResult<Vec<Course>> {
        let query = query.clone();
        self.run(move |conn| {
            let mut sql = courses::table.select(Course::as_select()).into_boxed();
            if let Some(category) = query.category {
                sql = sql.filter(courses::category_id.eq(category));
            }
            if let Some(instructor) = query.instructor {
                sql = sql.filter(courses::instructor_id.eq(instructor));
            }
            if let Some(level) = query.level {
                sql = sql.filter(courses::level.eq(level));
            }
            if let Some(min) = query.min_price.clone() {
                sql = sql.filter(courses::price.ge(min));
            }
            if let Some(max) = query.max_price.clone() {
                sql = sql.filter(courses::price.le(max));
            }
            if let Some(featured) = query.is_featured {
                sql = sql.filter(courses::is_featured.eq(featured));
            }
            let rows = sql
                .order((courses::created_at.asc(), courses::id.asc()))
                .load(conn)?;
            // Title search and ordering share the in-memory semantics.
            Ok(query.apply(rows))
        })
        .await
    }

    async fn slugs_with_prefix(&self, base: &str) -> StoreResult<Vec<String>> {
        // Slugs only hold alphanumerics and '-', so no LIKE escaping is needed.
        let base = base.to_string();
        self.run(move |conn| {
            let pattern = format!("{}-%", base);
            courses::table
                .filter(courses::slug.eq(&base).or(courses::slug.like(pattern)))
                .select(courses::slug)
                .load::<String>(conn)
        })
        .await
    }

    async fn update_course(&self, course: Course) -> StoreResult<Course> {
        self.run(move |conn| {
            diesel::update(courses::table.find(course.id))
                .set(&course)
                .returning(Course::as_returning())
                .get_result(conn)
        })
        .await
    }

    async fn delete_course(&self, id: Uuid) -> StoreResult<()> {
        self.run(move |conn| expect_affected(diesel::delete(courses::table.find(id)).execute(conn)?))
            .await
    }

    async fn insert_section(&self, section: Section) -> StoreResult<Section> {
        self.run(move |conn| {
            diesel::insert_into(sections::table)
                .values(&section)
                .returning(Section::as_returning())
                .get_result(conn)
        })
        .await
    }

    async fn get_section(&self, id: Uuid) -> StoreResult<Option<Section>> {
        self.run(move |conn| {
            sections::table
                .find(id)
                .select(Section::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn list_sections(&self, course_id: Uuid) -> StoreResult<Vec<Section>> {
        self.run(move |conn| {
            sections::table
                .filter(sections::course_id.eq(course_id))
                .order((sections::position.asc(), sections::created_at.asc()))
                .select(Section::as_select())
                .load(conn)
        })
        .await
    }

    async fn delete_section(&self, id: Uuid) -> StoreResult<()> {
        self.run(move |conn| expect_affected(diesel::delete(sections::table.find(id)).execute(conn)?))
            .await
    }

    async fn insert_lesson(&self, lesson: Lesson) -> StoreResult<Lesson> {
        self.run(move |conn| {
            diesel::insert_into(lessons::table)
                .values(&lesson)
                .returning(Lesson::as_returning())
                .get_result(conn)
        })
        .await
    }

    async fn get_lesson(&self, id: Uuid) -> StoreResult<Option<Lesson>> {
        self.run(move |conn| {
            lessons::table
                .find(id)
                .select(Lesson::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn list_lessons(&self, section_id: Uuid) -> StoreResult<Vec<Lesson>> {
        self.run(move |conn| {
            lessons::table
                .filter(lessons::section_id.eq(section_id))
                .order((lessons::position.asc(), lessons::created_at.asc()))
                .select(Lesson::as_select())
                .load(conn)
        })
        .await
    }

    async fn list_course_lessons(&self, course_id: Uuid) -> StoreResult<Vec<Lesson>> {
        self.run(move |conn| {
            lessons::table
                .inner_join(sections::table)
                .filter(sections::course_id.eq(course_id))
                .order((sections::position.asc(), lessons::position.asc()))
                .select(Lesson::as_select())
                .load(conn)
        })
        .await
    }

    async fn delete_lesson(&self, id: Uuid) -> StoreResult<()> {
        self.run(move |conn| expect_affected(diesel::delete(lessons::table.find(id)).execute(conn)?))
            .await
    }

    async fn insert_enrollment(&self, enrollment: Enrollment, instructor_id: Uuid) -> StoreResult<Enrollment> {
        self.run(move |conn| {
            conn.transaction::<_, DieselError, _>(|conn| {
                let saved = diesel::insert_into(enrollments::table)
                    .values(&enrollment)
                    .returning(Enrollment::as_returning())
                    .get_result(conn)?;
                let bumped = diesel::update(instructors::table.find(instructor_id))
                    .set(instructors::total_students.eq(instructors::total_students + 1))
                    .execute(conn)?;
                expect_affected(bumped)?;
                Ok(saved)
            })
        })
        .await
    }

    async fn get_enrollment(&self, id: Uuid) -> StoreResult<Option<Enrollment>> {
        self.run(move |conn| {
            enrollments::table
                .find(id)
                .select(Enrollment::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn find_enrollment(&self, student_id: Uuid, course_id: Uuid) -> StoreResult<Option<Enrollment>> {
        self.run(move |conn| {
            enrollments::table
                .filter(enrollments::student_id.eq(student_id))
                .filter(enrollments::course_id.eq(course_id))
                .select(Enrollment::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn list_student_enrollments(&self, student_id: Uuid) -> StoreResult<Vec<Enrollment>> {
        self.run(move |conn| {
            enrollments::table
                .filter(enrollments::student_id.eq(student_id))
                .order(enrollments::enrolled_at.asc())
                .select(Enrollment::as_select())
                .load(conn)
        })
        .await
    }

    async fn count_course_enrollments(&self, course_id: Uuid) -> StoreResult<i64> {
        self.run(move |conn| {
            enrollments::table
                .filter(enrollments::course_id.eq(course_id))
                .count()
                .get_result(conn)
        })
        .await
    }

    async fn update_enrollment(&self, enrollment: Enrollment) -> StoreResult<Enrollment> {
        self.run(move |conn| {
            diesel::update(enrollments::table.find(enrollment.id))
                .set(&enrollment)
                .returning(Enrollment::as_returning())
                .get_result(conn)
        })
        .await
    }

    async fn record_progress(&self, entry: ProgressEntry) -> StoreResult<ProgressOutcome> {
        self.run(move |conn| {
            conn.transaction::<_, DieselError, _>(|conn| {
                // Row lock serializes reports on the same enrollment.
                let mut enrollment = enrollments::table
                    .find(entry.enrollment_id)
                    .select(Enrollment::as_select())
                    .for_update()
                    .first(conn)?;
                if enrollment.status == EnrollmentStatus::Dropped {
                    return Ok(ProgressOutcome::EnrollmentDropped);
                }

                let existing = lesson_progress::table
                    .filter(lesson_progress::enrollment_id.eq(entry.enrollment_id))
                    .filter(lesson_progress::lesson_id.eq(entry.lesson_id))
                    .select(LessonProgress::as_select())
                    .first(conn)
                    .optional()?;
                let merged = LessonProgress::apply(existing, &entry);
                let progress = diesel::insert_into(lesson_progress::table)
                    .values(&merged)
                    .on_conflict((lesson_progress::enrollment_id, lesson_progress::lesson_id))
                    .do_update()
                    .set((
                        lesson_progress::is_completed.eq(merged.is_completed),
                        lesson_progress::completed_at.eq(merged.completed_at),
                        lesson_progress::watch_time_minutes.eq(merged.watch_time_minutes),
                    ))
                    .returning(LessonProgress::as_returning())
                    .get_result(conn)?;

                let course_lessons: Vec<Uuid> = lessons::table
                    .inner_join(sections::table)
                    .filter(sections::course_id.eq(enrollment.course_id))
                    .select(lessons::id)
                    .load(conn)?;
                let completed: i64 = lesson_progress::table
                    .filter(lesson_progress::enrollment_id.eq(enrollment.id))
                    .filter(lesson_progress::is_completed.eq(true))
                    .filter(lesson_progress::lesson_id.eq_any(&course_lessons))
                    .count()
                    .get_result(conn)?;

                let finished = enrollment.recount(completed as usize, course_lessons.len(), entry.recorded_at);
                let updated = diesel::update(enrollments::table.find(enrollment.id))
                    .set(&enrollment)
                    .execute(conn)?;
                expect_affected(updated)?;

                let mut certificate = None;
                if finished {
                    let issued = diesel::insert_into(certificates::table)
                        .values(&entry.certificate)
                        .on_conflict(certificates::enrollment_id)
                        .do_nothing()
                        .execute(conn)?;
                    if issued > 0 {
                        certificate = Some(entry.certificate.clone());
                    }
                }
                Ok(ProgressOutcome::Recorded(ProgressUpdate {
                    progress,
                    enrollment,
                    certificate,
                }))
            })
        })
        .await
    }

    async fn list_lesson_progress(&self, enrollment_id: Uuid) -> StoreResult<Vec<LessonProgress>> {
        self.run(move |conn| {
            lesson_progress::table
                .filter(lesson_progress::enrollment_id.eq(enrollment_id))
                .select(LessonProgress::as_select())
                .load(conn)
        })
        .await
    }

    async fn get_certificate_for_enrollment(&self, enrollment_id: Uuid) -> StoreResult<Option<Certificate>> {
        self.run(move |conn| {
            certificates::table
                .filter(certificates::enrollment_id.eq(enrollment_id))
                .select(Certificate::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn get_certificate_by_number(&self, number: &str) -> StoreResult<Option<Certificate>> {
        let number = number.to_string();
        self.run(move |conn| {
            certificates::table
                .filter(certificates::certificate_number.eq(number))
                .select(Certificate::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn insert_review(&self, review: CourseReview) -> StoreResult<CourseReview> {
        self.run(move |conn| {
            diesel::insert_into(course_reviews::table)
                .values(&review)
                .returning(CourseReview::as_returning())
                .get_result(conn)
        })
        .await
    }

    async fn get_review(&self, id: Uuid) -> StoreResult<Option<CourseReview>> {
        self.run(move |conn| {
            course_reviews::table
                .find(id)
                .select(CourseReview::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn list_reviews(&self, course_id: Uuid) -> StoreResult<Vec<CourseReview>> {
        self.run(move |conn| {
            course_reviews::table
                .filter(course_reviews::course_id.eq(course_id))
                .order(course_reviews::created_at.desc())
                .select(CourseReview::as_select())
                .load(conn)
        })
        .await
    }

    async fn delete_review(&self, id: Uuid) -> StoreResult<()> {
        self.run(move |conn| expect_affected(diesel::delete(course_reviews::table.find(id)).execute(conn)?))
            .await
    }

    async fn insert_question(&self, question: Question) -> StoreResult<Question> {
        self.run(move |conn| {
            diesel::insert_into(questions::table)
                .values(&question)
                .returning(Question::as_returning())
                .get_result(conn)
        })
        .await
    }

    async fn get_question(&self, id: Uuid) -> StoreResult<Option<Question>> {
        self.run(move |conn| {
            questions::table
                .find(id)
                .select(Question::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    async fn list_questions(&self, lesson_id: Uuid) -> StoreResult<Vec<Question>> {
        self.run(move |conn| {
            questions::table
                .filter(questions::lesson_id.eq(lesson_id))
                .order(questions::created_at.desc())
                .select(Question::as_select())
                .load(conn)
        })
        .await
    }

    async fn insert_answer(&self, answer: Answer) -> StoreResult<Answer> {
        self.run(move |conn| {
            diesel::insert_into(answers::table)
                .values(&answer)
                .returning(Answer::as_returning())
                .get_result(conn)
        })
        .await
    }

    async fn list_answers(&self, question_id: Uuid) -> StoreResult<Vec<Answer>> {
        self.run(move |conn| {
            answers::table
                .filter(answers::question_id.eq(question_id))
                .order(answers::created_at.asc())
                .select(Answer::as_select())
                .load(conn)
        })
        .await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.run(|conn| diesel::sql_query("SELECT 1").execute(conn).map(|_| ()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diesel_error_mapping() {
        assert_eq!(StoreError::from(DieselError::NotFound), StoreError::NotFound);

        let unique = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value".to_string()),
        );
        assert!(matches!(StoreError::from(unique), StoreError::Conflict(_)));

        let fk = DieselError::DatabaseError(
            DatabaseErrorKind::ForeignKeyViolation,
            Box::new("violates foreign key".to_string()),
        );
        assert_eq!(StoreError::from(fk), StoreError::NotFound);

        assert!(matches!(
            StoreError::from(DieselError::RollbackTransaction),
            StoreError::Backend(_)
        ));
    }
}
