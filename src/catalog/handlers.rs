use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use super::filter::CourseListParams;
use super::types::{
    CourseInput, CoursePatch, CreateCategoryRequest, CreateInstructorRequest, CreateLessonRequest,
    CreateSectionRequest, UpdateCategoryRequest,
};
use crate::core::error::{ApiResponse, CatalogError};
use crate::core::extract::{ApiJson, ApiPath};
use crate::core::shared::state::AppState;
use crate::core::store::CatalogStore;

type Shared<S> = State<Arc<AppState<S>>>;

// ----- courses -----

pub async fn list_courses<S: CatalogStore>(
    State(state): Shared<S>,
    Query(params): Query<CourseListParams>,
) -> Result<impl IntoResponse, CatalogError> {
    let courses = state.catalog.list_courses(params).await?;
    Ok(ApiResponse::ok(courses))
}

pub async fn create_course<S: CatalogStore>(
    State(state): Shared<S>,
    ApiJson(input): ApiJson<CourseInput>,
) -> Result<impl IntoResponse, CatalogError> {
    let view = state.catalog.create_course(input).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(view)))
}

pub async fn get_course<S: CatalogStore>(
    State(state): Shared<S>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, CatalogError> {
    Ok(ApiResponse::ok(state.catalog.course_detail(id).await?))
}

pub async fn get_course_by_slug<S: CatalogStore>(
    State(state): Shared<S>,
    ApiPath(slug): ApiPath<String>,
) -> Result<impl IntoResponse, CatalogError> {
    Ok(ApiResponse::ok(state.catalog.course_detail_by_slug(&slug).await?))
}

pub async fn replace_course<S: CatalogStore>(
    State(state): Shared<S>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<CourseInput>,
) -> Result<impl IntoResponse, CatalogError> {
    Ok(ApiResponse::ok(state.catalog.update_course(id, input).await?))
}

pub async fn patch_course<S: CatalogStore>(
    State(state): Shared<S>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<CoursePatch>,
) -> Result<impl IntoResponse, CatalogError> {
    Ok(ApiResponse::ok(state.catalog.patch_course(id, patch).await?))
}

pub async fn delete_course<S: CatalogStore>(
    State(state): Shared<S>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, CatalogError> {
    state.catalog.delete_course(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ----- categories -----

pub async fn list_categories<S: CatalogStore>(State(state): Shared<S>) -> Result<impl IntoResponse, CatalogError> {
    Ok(ApiResponse::ok(state.catalog.list_categories().await?))
}

pub async fn create_category<S: CatalogStore>(
    State(state): Shared<S>,
    ApiJson(request): ApiJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, CatalogError> {
    let category = state.catalog.create_category(request).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(category)))
}

pub async fn get_category<S: CatalogStore>(
    State(state): Shared<S>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, CatalogError> {
    Ok(ApiResponse::ok(state.catalog.get_category(id).await?))
}

pub async fn update_category<S: CatalogStore>(
    State(state): Shared<S>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, CatalogError> {
    Ok(ApiResponse::ok(state.catalog.update_category(id, request).await?))
}

// ----- instructors -----

pub async fn list_instructors<S: CatalogStore>(State(state): Shared<S>) -> Result<impl IntoResponse, CatalogError> {
    Ok(ApiResponse::ok(state.catalog.list_instructors().await?))
}

pub async fn create_instructor<S: CatalogStore>(
    State(state): Shared<S>,
    ApiJson(request): ApiJson<CreateInstructorRequest>,
) -> Result<impl IntoResponse, CatalogError> {
    let instructor = state.catalog.create_instructor(request).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(instructor)))
}

pub async fn get_instructor<S: CatalogStore>(
    State(state): Shared<S>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, CatalogError> {
    Ok(ApiResponse::ok(state.catalog.get_instructor(id).await?))
}

// ----- sections -----

pub async fn list_sections<S: CatalogStore>(
    State(state): Shared<S>,
    ApiPath(course_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, CatalogError> {
    Ok(ApiResponse::ok(state.catalog.list_sections(course_id).await?))
}

pub async fn create_section<S: CatalogStore>(
    State(state): Shared<S>,
    ApiPath(course_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CreateSectionRequest>,
) -> Result<impl IntoResponse, CatalogError> {
    let section = state.catalog.create_section(course_id, request).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(section)))
}

pub async fn get_section<S: CatalogStore>(
    State(state): Shared<S>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, CatalogError> {
    Ok(ApiResponse::ok(state.catalog.get_section(id).await?))
}

pub async fn delete_section<S: CatalogStore>(
    State(state): Shared<S>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, CatalogError> {
    state.catalog.delete_section(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ----- lessons -----

pub async fn list_lessons<S: CatalogStore>(
    State(state): Shared<S>,
    ApiPath(section_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, CatalogError> {
    Ok(ApiResponse::ok(state.catalog.list_lessons(section_id).await?))
}

pub async fn create_lesson<S: CatalogStore>(
    State(state): Shared<S>,
    ApiPath(section_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CreateLessonRequest>,
) -> Result<impl IntoResponse, CatalogError> {
    let lesson = state.catalog.create_lesson(section_id, request).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(lesson)))
}

pub async fn get_lesson<S: CatalogStore>(
    State(state): Shared<S>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, CatalogError> {
    Ok(ApiResponse::ok(state.catalog.get_lesson(id).await?))
}

pub async fn delete_lesson<S: CatalogStore>(
    State(state): Shared<S>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, CatalogError> {
    state.catalog.delete_lesson(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
