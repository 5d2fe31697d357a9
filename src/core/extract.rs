//! Request extractors shared by every handler.

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::core::error::{CatalogError, FieldErrors};

/// Header the identity provider uses to forward the authenticated user.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Id of the authenticated user, taken from the `X-User-Id` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = CatalogError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| CatalogError::Unauthorized("Authentication required".to_string()))?;
        Uuid::parse_str(raw.trim())
            .map(CurrentUser)
            .map_err(|_| CatalogError::Unauthorized("Malformed user id".to_string()))
    }
}

/// `Json` whose rejections use the API error envelope.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = CatalogError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                let message = match &rejection {
                    JsonRejection::JsonDataError(err) => err.body_text(),
                    other => other.body_text(),
                };
                let mut errors = FieldErrors::new();
                errors.add("body", message);
                Err(CatalogError::Validation(errors))
            }
        }
    }
}

/// `Path` whose rejections use the API error envelope.
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = CatalogError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(PathRejection::FailedToDeserializePathParams(err)) => {
                let mut errors = FieldErrors::new();
                errors.add("path", err.body_text());
                Err(CatalogError::Validation(errors))
            }
            Err(other) => {
                log::error!("Route is missing its path parameters: {}", other.body_text());
                Err(CatalogError::Store(other.body_text()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    async fn user_from(header: Option<&str>) -> Result<CurrentUser, CatalogError> {
        let mut builder = HttpRequest::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        CurrentUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_current_user_from_header() {
        let id = Uuid::new_v4();
        assert_eq!(user_from(Some(&id.to_string())).await.unwrap(), CurrentUser(id));
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header_is_unauthorized() {
        assert!(matches!(user_from(None).await, Err(CatalogError::Unauthorized(_))));
        assert!(matches!(user_from(Some("nope")).await, Err(CatalogError::Unauthorized(_))));
    }
}
