//! Enrollments, lesson progress and completion certificates.

pub mod engine;
pub mod handlers;
pub mod types;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub use engine::EnrollmentEngine;

use crate::core::shared::state::AppState;
use crate::core::store::CatalogStore;
use handlers::*;

pub fn configure_enrollment_routes<S: CatalogStore>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route("/enrollments/", get(list_enrollments::<S>).post(enroll::<S>))
        .route("/enrollments/:id/", get(get_enrollment::<S>))
        .route("/enrollments/:id/progress/", post(record_progress::<S>))
        .route("/enrollments/:id/drop/", post(drop_enrollment::<S>))
        .route("/enrollments/:id/certificate/", get(get_certificate::<S>))
        .route("/certificates/:number/verify/", get(verify_certificate::<S>))
}
