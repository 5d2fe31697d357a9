use axum::{extract::Request, routing::get, Router};
use log::{error, info};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::catalog::configure_catalog_routes;
use crate::core::shared::state::AppState;
use crate::core::store::CatalogStore;
use crate::enrollment::configure_enrollment_routes;
use crate::feedback::configure_feedback_routes;

use super::{health_check, shutdown_signal};

pub fn build_router<S: CatalogStore>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check::<S>))
        .merge(configure_catalog_routes::<S>())
        .merge(configure_enrollment_routes::<S>())
        .merge(configure_feedback_routes::<S>())
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
            )
        }))
        .with_state(state)
}

pub async fn run_server<S: CatalogStore>(state: Arc<AppState<S>>) -> std::io::Result<()> {
    let addr = state.config.bind_address();
    let app = build_router(state);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {} - is another instance running?", addr, e);
            return Err(e);
        }
    };
    info!("coursehub listening on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(std::io::Error::other)
}
