use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use common::types::Health;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

use crate::startup::AppState;

pub mod users;

pub async fn health(State(state): State<AppState>) -> Json<Health> {
    let storage = state.storage.status().await;
    Json(Health { status: "ok", storage: storage.label().to_string() })
}

/// Answers every request no route matched.
pub async fn not_found(method: Method, uri: Uri) -> impl IntoResponse {
    warn!(%method, %uri, status = 404, "unhandled url");
    (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "Not found" })))
}

/// Build the full application router.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let users = Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/:user_id", get(users::get_user).delete(users::delete_user));

    Router::new()
        .route("/healthcheck", get(health))
        .route("/health", get(health))
        .merge(users)
        .fallback(not_found)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                        // 5xx responses are logged at ERROR
                        .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
                )
                .layer(cors),
        )
}
