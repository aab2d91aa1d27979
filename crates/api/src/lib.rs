#![forbid(unsafe_code)]

pub mod error;
pub mod handlers;
pub mod session;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use services::AppServices;

pub use error::ApiError;
pub use session::SESSION_HEADER;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub services: AppServices,
}

/// Builds the full HTTP surface over the assembled services.
#[must_use]
pub fn router(services: AppServices) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/areas", get(handlers::catalog::list_areas))
        .route("/api/issuers", get(handlers::catalog::list_issuers))
        .route("/api/quiz/start", post(handlers::quiz::start))
        .route("/api/quiz/question/:index", get(handlers::quiz::question_at))
        .route("/api/quiz/answer", post(handlers::quiz::answer))
        .route("/api/quiz/finish", post(handlers::quiz::finish))
        .route("/api/essay/topics", get(handlers::essay::topics))
        .route("/api/essay/grade", post(handlers::essay::grade))
        .route("/api/dashboard/stats", get(handlers::stats::dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { services })
}
