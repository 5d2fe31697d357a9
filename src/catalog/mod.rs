//! Course catalog: instructors, categories, courses, sections and lessons.

pub mod engine;
pub mod filter;
pub mod handlers;
pub mod slug;
pub mod types;
pub mod validation;

use axum::{routing::get, Router};
use std::sync::Arc;

pub use engine::CatalogEngine;

use crate::core::shared::state::AppState;
use crate::core::store::CatalogStore;
use handlers::*;

pub fn configure_catalog_routes<S: CatalogStore>() -> Router<Arc<AppState<S>>> {
    Router::new()
        // Course routes
        .route("/courses/", get(list_courses::<S>).post(create_course::<S>))
        .route(
            "/courses/:id/",
            get(get_course::<S>)
                .put(replace_course::<S>)
                .patch(patch_course::<S>)
                .delete(delete_course::<S>),
        )
        .route("/courses/slug/:slug/", get(get_course_by_slug::<S>))
        // Category routes
        .route(
            "/courses/categories/",
            get(list_categories::<S>).post(create_category::<S>),
        )
        .route(
            "/courses/categories/:id/",
            get(get_category::<S>).patch(update_category::<S>),
        )
        // Instructor routes
        .route(
            "/courses/instructors/",
            get(list_instructors::<S>).post(create_instructor::<S>),
        )
        .route("/courses/instructors/:id/", get(get_instructor::<S>))
        // Section routes
        .route(
            "/courses/:id/sections/",
            get(list_sections::<S>).post(create_section::<S>),
        )
        .route("/sections/:id/", get(get_section::<S>).delete(delete_section::<S>))
        // Lesson routes
        .route(
            "/sections/:id/lessons/",
            get(list_lessons::<S>).post(create_lesson::<S>),
        )
        .route("/lessons/:id/", get(get_lesson::<S>).delete(delete_lesson::<S>))
}
