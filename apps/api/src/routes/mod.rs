pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::cv::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/cv",
            post(handlers::handle_upload).get(handlers::handle_list),
        )
        .route("/api/v1/cv/:id/text", get(handlers::handle_get_text))
        .with_state(state)
}
