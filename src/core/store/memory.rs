use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CatalogStore, StoreError, StoreResult, CATEGORIES_SLUG_KEY,
    CERTIFICATES_NUMBER_KEY, COURSES_SLUG_KEY, ENROLLMENTS_STUDENT_COURSE_KEY, INSTRUCTORS_USER_KEY,
    REVIEWS_COURSE_STUDENT_KEY, USERS_USERNAME_KEY,
};
use crate::catalog::filter::CourseQuery;
use crate::catalog::types::{Category, Course, Instructor, Lesson, Section, User};
use crate::core::shared::enums::EnrollmentStatus;
use crate::enrollment::types::{
    Certificate, Enrollment, LessonProgress, ProgressEntry, ProgressOutcome, ProgressUpdate,
};
use crate::feedback::types::{Answer, CourseReview, Question};

/// Rows are kept in insertion order, which is what listings fall back on.
#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    instructors: Vec<Instructor>,
    categories: Vec<Category>,
    courses: Vec<Course>,
    sections: Vec<Section>,
    lessons: Vec<Lesson>,
    enrollments: Vec<Enrollment>,
    progress: Vec<LessonProgress>,
    certificates: Vec<Certificate>,
    reviews: Vec<CourseReview>,
    questions: Vec<Question>,
    answers: Vec<Answer>,
}

fn conflict(constraint: &str) -> StoreError {
    StoreError::Conflict(constraint.to_string())
}

impl Tables {
    fn course_exists(&self, id: Uuid) -> bool {
        self.courses.iter().any(|c| c.id == id)
    }

    fn remove_lessons(&mut self, ids: &HashSet<Uuid>) {
        if ids.is_empty() {
            return;
        }
        self.lessons.retain(|l| !ids.contains(&l.id));
        self.progress.retain(|p| !ids.contains(&p.lesson_id));
        let questions: HashSet<Uuid> = self
            .questions
            .iter()
            .filter(|q| ids.contains(&q.lesson_id))
            .map(|q| q.id)
            .collect();
        self.questions.retain(|q| !questions.contains(&q.id));
        self.answers.retain(|a| !questions.contains(&a.question_id));
    }

    fn remove_sections(&mut self, ids: &HashSet<Uuid>) {
        let lessons: HashSet<Uuid> = self
            .lessons
            .iter()
            .filter(|l| ids.contains(&l.section_id))
            .map(|l| l.id)
            .collect();
        self.sections.retain(|s| !ids.contains(&s.id));
        self.remove_lessons(&lessons);
    }

    fn remove_enrollments(&mut self, ids: &HashSet<Uuid>) {
        self.enrollments.retain(|e| !ids.contains(&e.id));
        self.progress.retain(|p| !ids.contains(&p.enrollment_id));
        self.certificates.retain(|c| !ids.contains(&c.enrollment_id));
    }

    fn remove_course(&mut self, id: Uuid) {
        self.courses.retain(|c| c.id != id);
        let sections: HashSet<Uuid> = self
            .sections
            .iter()
            .filter(|s| s.course_id == id)
            .map(|s| s.id)
            .collect();
        self.remove_sections(&sections);
        let enrollments: HashSet<Uuid> = self
            .enrollments
            .iter()
            .filter(|e| e.course_id == id)
            .map(|e| e.id)
            .collect();
        self.remove_enrollments(&enrollments);
        self.reviews.retain(|r| r.course_id != id);
    }

    fn check_course_slug(&self, course: &Course) -> StoreResult<()> {
        if self
            .courses
            .iter()
            .any(|c| c.slug == course.slug && c.id != course.id)
        {
            return Err(conflict(COURSES_SLUG_KEY));
        }
        Ok(())
    }

    fn check_course_refs(&self, course: &Course) -> StoreResult<()> {
        let instructor = self.instructors.iter().any(|i| i.id == course.instructor_id);
        let category = self.categories.iter().any(|c| c.id == course.category_id);
        if instructor && category {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }
}

/// Process-local store backing tests and `--in-memory` runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogStore for InMemoryCatalogStore {
    async fn insert_instructor(&self, user: User, instructor: Instructor) -> StoreResult<Instructor> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(conflict(USERS_USERNAME_KEY));
        }
        if tables.instructors.iter().any(|i| i.user_id == user.id) {
            return Err(conflict(INSTRUCTORS_USER_KEY));
        }
        tables.users.push(user);
        tables.instructors.push(instructor.clone());
        Ok(instructor)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_instructor(&self, id: Uuid) -> StoreResult<Option<Instructor>> {
        let tables = self.tables.read().await;
        Ok(tables.instructors.iter().find(|i| i.id == id).cloned())
    }

    async fn list_instructors(&self) -> StoreResult<Vec<Instructor>> {
        let tables = self.tables.read().await;
        Ok(tables.instructors.clone())
    }

    async fn insert_category(&self, category: Category) -> StoreResult<Category> {
        let mut tables = self.tables.write().await;
        if tables.categories.iter().any(|c| c.slug == category.slug) {
            return Err(conflict(CATEGORIES_SLUG_KEY));
        }
        if let Some(parent) = category.parent_id {
            if !tables.categories.iter().any(|c| c.id == parent) {
                return Err(StoreError::NotFound);
            }
        }
        tables.categories.push(category.clone());
        Ok(category)
    }

    async fn get_category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        let tables = self.tables.read().await;
        Ok(tables.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let tables = self.tables.read().await;
        let mut categories = tables.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn update_category(&self, category: Category) -> StoreResult<Category> {
        let mut tables = self.tables.write().await;
        if let Some(parent) = category.parent_id {
            if !tables.categories.iter().any(|c| c.id == parent) {
                return Err(StoreError::NotFound);
            }
        }
        let slot = tables
            .categories
            .iter_mut()
            .find(|c| c.id == category.id)
            .ok_or(StoreError::NotFound)?;
        *slot = category.clone();
        Ok(category)
    }

    async fn insert_course(&self, course: Course) -> StoreResult<Course> {
        let mut tables = self.tables.write().await;
        tables.check_course_slug(&course)?;
        tables.check_course_refs(&course)?;
        tables.courses.push(course.clone());
        Ok(course)
    }

    async fn get_course(&self, id: Uuid) -> StoreResult<Option<Course>> {
        let tables = self.tables.read().await;
        Ok(tables.courses.iter().find(|c| c.id == id).cloned())
    }

    async fn get_course_by_slug(&self, slug: &str) -> StoreResult<Option<Course>> {
        let tables = self.tables.read().await;
        Ok(tables.courses.iter().find(|c| c.slug == slug).cloned())
    }

    async fn list_courses(&self, query: &CourseQuery) -> StoreResult<Vec<Course>> {
        let snapshot = self.tables.read().await.courses.clone();
        Ok(query.apply(snapshot))
    }

    async fn slugs_with_prefix(&self, base: &str) -> StoreResult<Vec<String>> {
        let prefix = format!("{}-", base);
        let tables = self.tables.read().await;
        Ok(tables
            .courses
            .iter()
            .filter(|c| c.slug == base || c.slug.starts_with(&prefix))
            .map(|c| c.slug.clone())
            .collect())
    }

    async fn update_course(&self, course: Course) -> StoreResult<Course> {
        let mut tables = self.tables.write().await;
        if !tables.course_exists(course.id) {
            return Err(StoreError::NotFound);
        }
        tables.check_course_slug(&course)?;
        tables.check_course_refs(&course)?;
        if let Some(slot) = tables.courses.iter_mut().find(|c| c.id == course.id) {
            *slot = course.clone();
        }
        Ok(course)
    }

    async fn delete_course(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.course_exists(id) {
            return Err(StoreError::NotFound);
        }
        tables.remove_course(id);
        Ok(())
    }

    async fn insert_section(&self, section: Section) -> StoreResult<Section> {
        let mut tables = self.tables.write().await;
        if !tables.course_exists(section.course_id) {
            return Err(StoreError::NotFound);
        }
        tables.sections.push(section.clone());
        Ok(section)
    }

    async fn get_section(&self, id: Uuid) -> StoreResult<Option<Section>> {
        let tables = self.tables.read().await;
        Ok(tables.sections.iter().find(|s| s.id == id).cloned())
    }

    async fn list_sections(&self, course_id: Uuid) -> StoreResult<Vec<Section>> {
        let tables = self.tables.read().await;
        let mut sections: Vec<Section> = tables
            .sections
            .iter()
            .filter(|s| s.course_id == course_id)
            .cloned()
            .collect();
        sections.sort_by_key(|s| s.order);
        Ok(sections)
    }

    async fn delete_section(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.sections.iter().any(|s| s.id == id) {
            return Err(StoreError::NotFound);
        }
        tables.remove_sections(&HashSet::from([id]));
        Ok(())
    }

    async fn insert_lesson(&self, lesson: Lesson) -> StoreResult<Lesson> {
        let mut tables = self.tables.write().await;
        if !tables.sections.iter().any(|s| s.id == lesson.section_id) {
            return Err(StoreError::NotFound);
        }
        tables.lessons.push(lesson.clone());
        Ok(lesson)
    }

    async fn get_lesson(&self, id: Uuid) -> StoreResult<Option<Lesson>> {
        let tables = self.tables.read().await;
        Ok(tables.lessons.iter().find(|l| l.id == id).cloned())
    }

    async fn list_lessons(&self, section_id: Uuid) -> StoreResult<Vec<Lesson>> {
        let tables = self.tables.read().await;
        let mut lessons: Vec<Lesson> = tables
            .lessons
            .iter()
            .filter(|l| l.section_id == section_id)
            .cloned()
            .collect();
        lessons.sort_by_key(|l| l.order);
        Ok(lessons)
    }

    async fn list_course_lessons(&self, course_id: Uuid) -> StoreResult<Vec<Lesson>> {
        let tables = self.tables.read().await;
        let sections: HashSet<Uuid> = tables
            .sections
            .iter()
            .filter(|s| s.course_id == course_id)
            .map(|s| s.id)
            .collect();
        Ok(tables
            .lessons
            .iter()
            .filter(|l| sections.contains(&l.section_id))
            .cloned()
            .collect())
    }

    async fn delete_lesson(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.lessons.iter().any(|l| l.id == id) {
            return Err(StoreError::NotFound);
        }
        tables.remove_lessons(&HashSet::from([id]));
        Ok(())
    }

    async fn insert_enrollment(&self, enrollment: Enrollment, instructor_id: Uuid) -> StoreResult<Enrollment> {
        let mut tables = self.tables.write().await;
        if !tables.course_exists(enrollment.course_id) {
            return Err(StoreError::NotFound);
        }
        if tables
            .enrollments
            .iter()
            .any(|e| e.student_id == enrollment.student_id && e.course_id == enrollment.course_id)
        {
            return Err(conflict(ENROLLMENTS_STUDENT_COURSE_KEY));
        }
        let instructor = tables
            .instructors
            .iter_mut()
            .find(|i| i.id == instructor_id)
            .ok_or(StoreError::NotFound)?;
        instructor.total_students += 1;
        tables.enrollments.push(enrollment.clone());
        Ok(enrollment)
    }

    async fn get_enrollment(&self, id: Uuid) -> StoreResult<Option<Enrollment>> {
        let tables = self.tables.read().await;
        Ok(tables.enrollments.iter().find(|e| e.id == id).cloned())
    }

    async fn find_enrollment(&self, student_id: Uuid, course_id: Uuid) -> StoreResult<Option<Enrollment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .enrollments
            .iter()
            .find(|e| e.student_id == student_id && e.course_id == course_id)
            .cloned())
    }

    async fn list_student_enrollments(&self, student_id: Uuid) -> StoreResult<Vec<Enrollment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .enrollments
            .iter()
            .filter(|e| e.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn count_course_enrollments(&self, course_id: Uuid) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables.enrollments.iter().filter(|e| e.course_id == course_id).count() as i64)
    }

    async fn update_enrollment(&self, enrollment: Enrollment) -> StoreResult<Enrollment> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .enrollments
            .iter_mut()
            .find(|e| e.id == enrollment.id)
            .ok_or(StoreError::NotFound)?;
        *slot = enrollment.clone();
        Ok(enrollment)
    }

    async fn record_progress(&self, entry: ProgressEntry) -> StoreResult<ProgressOutcome> {
        let mut tables = self.tables.write().await;
        let Some(mut enrollment) = tables.enrollments.iter().find(|e| e.id == entry.enrollment_id).cloned() else {
            return Err(StoreError::NotFound);
        };
        if enrollment.status == EnrollmentStatus::Dropped {
            return Ok(ProgressOutcome::EnrollmentDropped);
        }
        if !tables.lessons.iter().any(|l| l.id == entry.lesson_id) {
            return Err(StoreError::NotFound);
        }

        let slot = tables
            .progress
            .iter()
            .position(|p| p.enrollment_id == entry.enrollment_id && p.lesson_id == entry.lesson_id);
        let progress = LessonProgress::apply(slot.map(|i| tables.progress[i].clone()), &entry);
        match slot {
            Some(i) => tables.progress[i] = progress.clone(),
            None => tables.progress.push(progress.clone()),
        }

        let sections: HashSet<Uuid> = tables
            .sections
            .iter()
            .filter(|s| s.course_id == enrollment.course_id)
            .map(|s| s.id)
            .collect();
        let lessons: HashSet<Uuid> = tables
            .lessons
            .iter()
            .filter(|l| sections.contains(&l.section_id))
            .map(|l| l.id)
            .collect();
        let completed = tables
            .progress
            .iter()
            .filter(|p| p.enrollment_id == enrollment.id && p.is_completed && lessons.contains(&p.lesson_id))
            .count();

        let mut certificate = None;
        if enrollment.recount(completed, lessons.len(), entry.recorded_at)
            && !tables.certificates.iter().any(|c| c.enrollment_id == enrollment.id)
        {
            if tables
                .certificates
                .iter()
                .any(|c| c.certificate_number == entry.certificate.certificate_number)
            {
                return Err(conflict(CERTIFICATES_NUMBER_KEY));
            }
            tables.certificates.push(entry.certificate.clone());
            certificate = Some(entry.certificate);
        }
        if let Some(row) = tables.enrollments.iter_mut().find(|e| e.id == enrollment.id) {
            *row = enrollment.clone();
        }
        Ok(ProgressOutcome::Recorded(ProgressUpdate {
            progress,
            enrollment,
            certificate,
        }))
    }

    async fn list_lesson_progress(&self, enrollment_id: Uuid) -> StoreResult<Vec<LessonProgress>> {
        let tables = self.tables.read().await;
        Ok(tables
            .progress
            .iter()
            .filter(|p| p.enrollment_id == enrollment_id)
            .cloned()
            .collect())
    }

    async fn get_certificate_for_enrollment(&self, enrollment_id: Uuid) -> StoreResult<Option<Certificate>> {
        let tables = self.tables.read().await;
        Ok(tables
            .certificates
            .iter()
            .find(|c| c.enrollment_id == enrollment_id)
            .cloned())
    }

    async fn get_certificate_by_number(&self, number: &str) -> StoreResult<Option<Certificate>> {
        let tables = self.tables.read().await;
        Ok(tables
            .certificates
            .iter()
            .find(|c| c.certificate_number == number)
            .cloned())
    }

    async fn insert_review(&self, review: CourseReview) -> StoreResult<CourseReview> {
        let mut tables = self.tables.write().await;
        if !tables.course_exists(review.course_id) {
            return Err(StoreError::NotFound);
        }
        if tables
            .reviews
            .iter()
            .any(|r| r.course_id == review.course_id && r.student_id == review.student_id)
        {
            return Err(conflict(REVIEWS_COURSE_STUDENT_KEY));
        }
        tables.reviews.push(review.clone());
        Ok(review)
    }

    async fn get_review(&self, id: Uuid) -> StoreResult<Option<CourseReview>> {
        let tables = self.tables.read().await;
        Ok(tables.reviews.iter().find(|r| r.id == id).cloned())
    }

    async fn list_reviews(&self, course_id: Uuid) -> StoreResult<Vec<CourseReview>> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .iter()
            .rev()
            .filter(|r| r.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn delete_review(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let before = tables.reviews.len();
        tables.reviews.retain(|r| r.id != id);
        if tables.reviews.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn insert_question(&self, question: Question) -> StoreResult<Question> {
        let mut tables = self.tables.write().await;
        if !tables.lessons.iter().any(|l| l.id == question.lesson_id) {
            return Err(StoreError::NotFound);
        }
        tables.questions.push(question.clone());
        Ok(question)
    }

    async fn get_question(&self, id: Uuid) -> StoreResult<Option<Question>> {
        let tables = self.tables.read().await;
        Ok(tables.questions.iter().find(|q| q.id == id).cloned())
    }

    async fn list_questions(&self, lesson_id: Uuid) -> StoreResult<Vec<Question>> {
        let tables = self.tables.read().await;
        Ok(tables
            .questions
            .iter()
            .rev()
            .filter(|q| q.lesson_id == lesson_id)
            .cloned()
            .collect())
    }

    async fn insert_answer(&self, answer: Answer) -> StoreResult<Answer> {
        let mut tables = self.tables.write().await;
        if !tables.questions.iter().any(|q| q.id == answer.question_id) {
            return Err(StoreError::NotFound);
        }
        tables.answers.push(answer.clone());
        Ok(answer)
    }

    async fn list_answers(&self, question_id: Uuid) -> StoreResult<Vec<Answer>> {
        let tables = self.tables.read().await;
        Ok(tables
            .answers
            .iter()
            .filter(|a| a.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shared::enums::{CourseLevel, CourseStatus};
    use bigdecimal::BigDecimal;
    use chrono::Utc;

    async fn seed(store: &InMemoryCatalogStore) -> (Instructor, Category) {
        let user = User {
            id: Uuid::new_v4(),
            username: "mentor".to_string(),
            email: "t@example.com".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            created_at: Utc::now(),
        };
        let instructor = Instructor {
            id: Uuid::new_v4(),
            user_id: user.id,
            bio: String::new(),
            profile_image: String::new(),
            expertise: "Rust".to_string(),
            total_students: 0,
            rating: BigDecimal::from(0),
            is_verified: false,
            is_active: true,
            created_at: Utc::now(),
        };
        let instructor = store.insert_instructor(user, instructor).await.unwrap();
        let category = Category {
            id: Uuid::new_v4(),
            name: "Programming".to_string(),
            slug: "programming-1".to_string(),
            description: String::new(),
            icon: String::new(),
            parent_id: None,
            is_active: true,
            created_at: Utc::now(),
        };
        let category = store.insert_category(category).await.unwrap();
        (instructor, category)
    }

    fn course(slug: &str, instructor: &Instructor, category: &Category) -> Course {
        Course {
            id: Uuid::new_v4(),
            title: slug.to_string(),
            slug: slug.to_string(),
            description: "d".repeat(50),
            instructor_id: instructor.id,
            category_id: category.id,
            thumbnail: String::new(),
            trailer_url: None,
            price: BigDecimal::from(10),
            discount_percentage: 0,
            level: CourseLevel::Beginner,
            status: CourseStatus::Published,
            duration_hours: BigDecimal::from(1),
            requirements: String::new(),
            what_you_learn: String::new(),
            language: "Uzbek".to_string(),
            is_featured: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_course_slug_is_unique() {
        let store = InMemoryCatalogStore::new();
        let (instructor, category) = seed(&store).await;
        store.insert_course(course("t1", &instructor, &category)).await.unwrap();
        let err = store
            .insert_course(course("t1", &instructor, &category))
            .await
            .unwrap_err();
        assert!(err.is_conflict_on(COURSES_SLUG_KEY));
    }

    #[tokio::test]
    async fn test_slugs_with_prefix() {
        let store = InMemoryCatalogStore::new();
        let (instructor, category) = seed(&store).await;
        for slug in ["rust", "rust-1", "rusty", "rust-basics"] {
            store.insert_course(course(slug, &instructor, &category)).await.unwrap();
        }
        let mut slugs = store.slugs_with_prefix("rust").await.unwrap();
        slugs.sort();
        assert_eq!(slugs, vec!["rust", "rust-1", "rust-basics"]);
    }

    #[tokio::test]
    async fn test_course_requires_existing_references() {
        let store = InMemoryCatalogStore::new();
        let (instructor, mut category) = seed(&store).await;
        category.id = Uuid::new_v4();
        let err = store
            .insert_course(course("x", &instructor, &category))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound);
    }

    fn section(course_id: Uuid) -> Section {
        Section {
            id: Uuid::new_v4(),
            course_id,
            title: "S".to_string(),
            description: String::new(),
            order: 1,
            created_at: Utc::now(),
        }
    }

    fn lesson(section_id: Uuid) -> Lesson {
        Lesson {
            id: Uuid::new_v4(),
            section_id,
            title: "L".to_string(),
            content: String::new(),
            video_url: String::new(),
            duration_minutes: 5,
            order: 1,
            is_preview: false,
            resources: serde_json::json!({}),
            created_at: Utc::now(),
        }
    }

    fn enrollment(course_id: Uuid) -> Enrollment {
        Enrollment {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            course_id,
            status: EnrollmentStatus::Active,
            progress_percentage: 0,
            enrolled_at: Utc::now(),
            completed_at: None,
        }
    }

    fn entry(enrollment_id: Uuid, lesson_id: Uuid, is_completed: bool, minutes: i32) -> ProgressEntry {
        let now = Utc::now();
        let id = Uuid::new_v4();
        ProgressEntry {
            enrollment_id,
            lesson_id,
            is_completed,
            watch_time_minutes: minutes,
            recorded_at: now,
            certificate: Certificate {
                id,
                enrollment_id,
                certificate_number: format!("CH-{}", id.simple()),
                certificate_url: String::new(),
                issued_at: now,
            },
        }
    }

    /// A course with two lessons and one active enrollment.
    async fn enrolled(store: &InMemoryCatalogStore) -> (Enrollment, Lesson, Lesson) {
        let (instructor, category) = seed(store).await;
        let course = store.insert_course(course("c", &instructor, &category)).await.unwrap();
        let section = store.insert_section(section(course.id)).await.unwrap();
        let first = store.insert_lesson(lesson(section.id)).await.unwrap();
        let second = store.insert_lesson(lesson(section.id)).await.unwrap();
        let enrollment = store
            .insert_enrollment(enrollment(course.id), instructor.id)
            .await
            .unwrap();
        (enrollment, first, second)
    }

    fn recorded(outcome: ProgressOutcome) -> ProgressUpdate {
        match outcome {
            ProgressOutcome::Recorded(update) => update,
            ProgressOutcome::EnrollmentDropped => panic!("enrollment unexpectedly dropped"),
        }
    }

    #[tokio::test]
    async fn test_delete_course_cascades() {
        let store = InMemoryCatalogStore::new();
        let (instructor, category) = seed(&store).await;
        let course = store.insert_course(course("c", &instructor, &category)).await.unwrap();
        let section = store.insert_section(section(course.id)).await.unwrap();
        let lesson = store.insert_lesson(lesson(section.id)).await.unwrap();
        let enrollment = store
            .insert_enrollment(enrollment(course.id), instructor.id)
            .await
            .unwrap();
        let review = store
            .insert_review(CourseReview {
                id: Uuid::new_v4(),
                course_id: course.id,
                student_id: enrollment.student_id,
                rating: 5,
                title: "Great".to_string(),
                comment: String::new(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();

        store.delete_course(course.id).await.unwrap();

        assert!(store.get_course(course.id).await.unwrap().is_none());
        assert!(store.get_section(section.id).await.unwrap().is_none());
        assert!(store.get_lesson(lesson.id).await.unwrap().is_none());
        assert!(store.get_enrollment(enrollment.id).await.unwrap().is_none());
        assert!(store.get_review(review.id).await.unwrap().is_none());
        assert_eq!(store.delete_review(review.id).await, Err(StoreError::NotFound));
        assert_eq!(store.delete_course(course.id).await, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_concurrent_reports_complete_the_enrollment() {
        let store = InMemoryCatalogStore::new();
        let (enrollment, first, second) = enrolled(&store).await;

        let (a, b) = tokio::join!(
            store.record_progress(entry(enrollment.id, first.id, true, 4)),
            store.record_progress(entry(enrollment.id, second.id, true, 6)),
        );
        let issued = [recorded(a.unwrap()), recorded(b.unwrap())]
            .into_iter()
            .filter_map(|update| update.certificate)
            .count();
        assert_eq!(issued, 1);

        let saved = store.get_enrollment(enrollment.id).await.unwrap().unwrap();
        assert_eq!(saved.progress_percentage, 100);
        assert_eq!(saved.status, EnrollmentStatus::Completed);
        assert!(store.get_certificate_for_enrollment(enrollment.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_watch_time_accumulates() {
        let store = InMemoryCatalogStore::new();
        let (enrollment, first, _) = enrolled(&store).await;

        let mut reports = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let store = store.clone();
            let report = entry(enrollment.id, first.id, false, 5);
            reports.spawn(async move { store.record_progress(report).await });
        }
        while let Some(outcome) = reports.join_next().await {
            recorded(outcome.unwrap().unwrap());
        }

        let rows = store.list_lesson_progress(enrollment.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].watch_time_minutes, 40);
        let saved = store.get_enrollment(enrollment.id).await.unwrap().unwrap();
        assert_eq!(saved.progress_percentage, 0);
    }

    #[tokio::test]
    async fn test_progress_on_dropped_enrollment_is_refused() {
        let store = InMemoryCatalogStore::new();
        let (mut enrollment, first, _) = enrolled(&store).await;
        enrollment.status = EnrollmentStatus::Dropped;
        store.update_enrollment(enrollment.clone()).await.unwrap();

        let outcome = store
            .record_progress(entry(enrollment.id, first.id, true, 1))
            .await
            .unwrap();
        assert!(matches!(outcome, ProgressOutcome::EnrollmentDropped));
        assert!(store.list_lesson_progress(enrollment.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_enrollment_bumps_instructor_students() {
        let store = InMemoryCatalogStore::new();
        let (instructor, category) = seed(&store).await;
        let course = store.insert_course(course("c", &instructor, &category)).await.unwrap();
        let enrollment = Enrollment {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            course_id: course.id,
            status: EnrollmentStatus::Active,
            progress_percentage: 0,
            enrolled_at: Utc::now(),
            completed_at: None,
        };
        store.insert_enrollment(enrollment.clone(), instructor.id).await.unwrap();
        let again = Enrollment {
            id: Uuid::new_v4(),
            ..enrollment
        };
        let err = store.insert_enrollment(again, instructor.id).await.unwrap_err();
        assert!(err.is_conflict_on(ENROLLMENTS_STUDENT_COURSE_KEY));

        let instructor = store.get_instructor(instructor.id).await.unwrap().unwrap();
        assert_eq!(instructor.total_students, 1);
    }
}
