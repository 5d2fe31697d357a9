use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use super::types::{EnrollRequest, ProgressRequest};
use crate::core::error::{ApiResponse, CatalogError};
use crate::core::extract::{ApiJson, ApiPath, CurrentUser};
use crate::core::shared::state::AppState;
use crate::core::store::CatalogStore;

type Shared<S> = State<Arc<AppState<S>>>;

pub async fn enroll<S: CatalogStore>(
    State(state): Shared<S>,
    CurrentUser(student): CurrentUser,
    ApiJson(request): ApiJson<EnrollRequest>,
) -> Result<impl IntoResponse, CatalogError> {
    let enrollment = state.enrollment.enroll(student, request).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(enrollment)))
}

pub async fn list_enrollments<S: CatalogStore>(
    State(state): Shared<S>,
    CurrentUser(student): CurrentUser,
) -> Result<impl IntoResponse, CatalogError> {
    Ok(ApiResponse::ok(state.enrollment.list_enrollments(student).await?))
}

pub async fn get_enrollment<S: CatalogStore>(
    State(state): Shared<S>,
    CurrentUser(student): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, CatalogError> {
    Ok(ApiResponse::ok(state.enrollment.get_enrollment(student, id).await?))
}

pub async fn record_progress<S: CatalogStore>(
    State(state): Shared<S>,
    CurrentUser(student): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<ProgressRequest>,
) -> Result<impl IntoResponse, CatalogError> {
    Ok(ApiResponse::ok(
        state.enrollment.record_progress(student, id, request).await?,
    ))
}

pub async fn drop_enrollment<S: CatalogStore>(
    State(state): Shared<S>,
    CurrentUser(student): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, CatalogError> {
    Ok(ApiResponse::ok(state.enrollment.drop_enrollment(student, id).await?))
}

pub async fn get_certificate<S: CatalogStore>(
    State(state): Shared<S>,
    CurrentUser(student): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, CatalogError> {
    Ok(ApiResponse::ok(state.enrollment.certificate(student, id).await?))
}

pub async fn verify_certificate<S: CatalogStore>(
    State(state): Shared<S>,
    ApiPath(number): ApiPath<String>,
) -> Result<impl IntoResponse, CatalogError> {
    Ok(ApiResponse::ok(state.enrollment.verify_certificate(&number).await?))
}
