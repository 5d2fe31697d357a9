use chrono::Utc;
use uuid::Uuid;

use super::types::{
    Answer, CourseReview, CreateAnswerRequest, CreateQuestionRequest, CreateReviewRequest, Question, QuestionView,
};
use crate::core::error::{CatalogError, CatalogResult, FieldErrors};
use crate::core::store::{CatalogStore, REVIEWS_COURSE_STUDENT_KEY};

const MAX_TITLE_CHARS: usize = 200;

fn already_reviewed() -> CatalogError {
    CatalogError::Conflict("You have already reviewed this course".to_string())
}

fn check_text(errors: &mut FieldErrors, field: &str, value: &str, max_chars: Option<usize>) {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, format!("{} must not be empty.", capitalize(field)));
    } else if let Some(max) = max_chars {
        if value.chars().count() > max {
            errors.add(field, format!("{} must be at most {} characters.", capitalize(field), max));
        }
    }
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Reviews and lesson Q&A.
#[derive(Clone)]
pub struct FeedbackEngine<S> {
    store: S,
}

impl<S: CatalogStore> FeedbackEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn create_review(
        &self,
        student_id: Uuid,
        course_id: Uuid,
        request: CreateReviewRequest,
    ) -> CatalogResult<CourseReview> {
        if self.store.get_course(course_id).await?.is_none() {
            return Err(CatalogError::not_found("Course"));
        }

        let mut errors = FieldErrors::new();
        if !(1..=5).contains(&request.rating) {
            errors.add("rating", "Rating must be between 1 and 5.");
        }
        check_text(&mut errors, "title", &request.title, Some(MAX_TITLE_CHARS));
        if !errors.is_empty() {
            return Err(CatalogError::Validation(errors));
        }

        if self.store.find_enrollment(student_id, course_id).await?.is_none() {
            return Err(CatalogError::field(
                "course",
                "You must be enrolled in this course to review it.",
            ));
        }

        let now = Utc::now();
        let review = CourseReview {
            id: Uuid::new_v4(),
            course_id,
            student_id,
            rating: request.rating,
            title: request.title.trim().to_string(),
            comment: request.comment,
            created_at: now,
            updated_at: now,
        };
        match self.store.insert_review(review).await {
            Ok(saved) => Ok(saved),
            Err(err) if err.is_conflict_on(REVIEWS_COURSE_STUDENT_KEY) => Err(already_reviewed()),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn list_reviews(&self, course_id: Uuid) -> CatalogResult<Vec<CourseReview>> {
        if self.store.get_course(course_id).await?.is_none() {
            return Err(CatalogError::not_found("Course"));
        }
        Ok(self.store.list_reviews(course_id).await?)
    }

    /// Only the author may delete; anyone else sees the review as missing.
    pub async fn delete_review(&self, user_id: Uuid, id: Uuid) -> CatalogResult<()> {
        let review = self
            .store
            .get_review(id)
            .await?
            .filter(|r| r.student_id == user_id)
            .ok_or_else(|| CatalogError::not_found("Review"))?;
        self.store.delete_review(review.id).await?;
        log::info!("Review {} deleted by its author", id);
        Ok(())
    }

    pub async fn ask_question(
        &self,
        student_id: Uuid,
        lesson_id: Uuid,
        request: CreateQuestionRequest,
    ) -> CatalogResult<Question> {
        if self.store.get_lesson(lesson_id).await?.is_none() {
            return Err(CatalogError::not_found("Lesson"));
        }
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "title", &request.title, Some(MAX_TITLE_CHARS));
        check_text(&mut errors, "content", &request.content, None);
        if !errors.is_empty() {
            return Err(CatalogError::Validation(errors));
        }

        let question = Question {
            id: Uuid::new_v4(),
            lesson_id,
            student_id,
            title: request.title.trim().to_string(),
            content: request.content,
            created_at: Utc::now(),
        };
        Ok(self.store.insert_question(question).await?)
    }

    pub async fn list_questions(&self, lesson_id: Uuid) -> CatalogResult<Vec<QuestionView>> {
        if self.store.get_lesson(lesson_id).await?.is_none() {
            return Err(CatalogError::not_found("Lesson"));
        }
        let mut views = Vec::new();
        for question in self.store.list_questions(lesson_id).await? {
            let answers_count = self.store.list_answers(question.id).await?.len();
            views.push(QuestionView {
                question,
                answers_count,
            });
        }
        Ok(views)
    }

    pub async fn answer(&self, user_id: Uuid, question_id: Uuid, request: CreateAnswerRequest) -> CatalogResult<Answer> {
        let question = self
            .store
            .get_question(question_id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Question"))?;
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "content", &request.content, None);
        if !errors.is_empty() {
            return Err(CatalogError::Validation(errors));
        }

        let is_instructor_answer = self.is_course_instructor(user_id, question.lesson_id).await?;
        let answer = Answer {
            id: Uuid::new_v4(),
            question_id,
            user_id,
            content: request.content,
            is_instructor_answer,
            created_at: Utc::now(),
        };
        Ok(self.store.insert_answer(answer).await?)
    }

    /// True when `user_id` is the user behind the instructor of the course
    /// the lesson belongs to.
    async fn is_course_instructor(&self, user_id: Uuid, lesson_id: Uuid) -> CatalogResult<bool> {
        let Some(lesson) = self.store.get_lesson(lesson_id).await? else {
            return Ok(false);
        };
        let Some(section) = self.store.get_section(lesson.section_id).await? else {
            return Ok(false);
        };
        let Some(course) = self.store.get_course(section.course_id).await? else {
            return Ok(false);
        };
        let instructor = self.store.get_instructor(course.instructor_id).await?;
        Ok(instructor.is_some_and(|i| i.user_id == user_id))
    }

    pub async fn list_answers(&self, question_id: Uuid) -> CatalogResult<Vec<Answer>> {
        if self.store.get_question(question_id).await?.is_none() {
            return Err(CatalogError::not_found("Question"));
        }
        Ok(self.store.list_answers(question_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_text_messages() {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "title", "  ", Some(10));
        check_text(&mut errors, "content", "fine", None);
        assert_eq!(errors.get("title"), Some(&["Title must not be empty.".to_string()][..]));
        assert!(!errors.contains("content"));

        let mut errors = FieldErrors::new();
        check_text(&mut errors, "title", &"x".repeat(11), Some(10));
        assert!(errors.contains("title"));
    }
}
