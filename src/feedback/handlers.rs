use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use super::types::{CreateAnswerRequest, CreateQuestionRequest, CreateReviewRequest};
use crate::core::error::{ApiResponse, CatalogError};
use crate::core::extract::{ApiJson, ApiPath, CurrentUser};
use crate::core::shared::state::AppState;
use crate::core::store::CatalogStore;

type Shared<S> = State<Arc<AppState<S>>>;

pub async fn create_review<S: CatalogStore>(
    State(state): Shared<S>,
    CurrentUser(student): CurrentUser,
    ApiPath(course_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CreateReviewRequest>,
) -> Result<impl IntoResponse, CatalogError> {
    let review = state.feedback.create_review(student, course_id, request).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(review)))
}

pub async fn list_reviews<S: CatalogStore>(
    State(state): Shared<S>,
    ApiPath(course_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, CatalogError> {
    Ok(ApiResponse::ok(state.feedback.list_reviews(course_id).await?))
}

pub async fn delete_review<S: CatalogStore>(
    State(state): Shared<S>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, CatalogError> {
    state.feedback.delete_review(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn ask_question<S: CatalogStore>(
    State(state): Shared<S>,
    CurrentUser(student): CurrentUser,
    ApiPath(lesson_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CreateQuestionRequest>,
) -> Result<impl IntoResponse, CatalogError> {
    let question = state.feedback.ask_question(student, lesson_id, request).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(question)))
}

pub async fn list_questions<S: CatalogStore>(
    State(state): Shared<S>,
    ApiPath(lesson_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, CatalogError> {
    Ok(ApiResponse::ok(state.feedback.list_questions(lesson_id).await?))
}

pub async fn answer_question<S: CatalogStore>(
    State(state): Shared<S>,
    CurrentUser(user): CurrentUser,
    ApiPath(question_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CreateAnswerRequest>,
) -> Result<impl IntoResponse, CatalogError> {
    let answer = state.feedback.answer(user, question_id, request).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(answer)))
}

pub async fn list_answers<S: CatalogStore>(
    State(state): Shared<S>,
    ApiPath(question_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, CatalogError> {
    Ok(ApiResponse::ok(state.feedback.list_answers(question_id).await?))
}
