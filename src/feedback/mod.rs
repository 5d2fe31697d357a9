//! Course reviews and lesson questions & answers.

pub mod engine;
pub mod handlers;
pub mod types;

use axum::{
    routing::{delete, get},
    Router,
};
use std::sync::Arc;

pub use engine::FeedbackEngine;

use crate::core::shared::state::AppState;
use crate::core::store::CatalogStore;
use handlers::*;

pub fn configure_feedback_routes<S: CatalogStore>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route(
            "/courses/:id/reviews/",
            get(list_reviews::<S>).post(create_review::<S>),
        )
        .route("/reviews/:id/", delete(delete_review::<S>))
        .route(
            "/lessons/:id/questions/",
            get(list_questions::<S>).post(ask_question::<S>),
        )
        .route(
            "/questions/:id/answers/",
            get(list_answers::<S>).post(answer_question::<S>),
        )
}
