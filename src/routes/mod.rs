//! HTTP surface of the shell.
//!
//! The browser opens one `/ws` session per tab and drives quiz generation and quiz taking
//! through it. The JSON API only carries a health check and a read-through of the
//! service's stored quizzes. Everything else falls through to the page bundle in `./static`.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    set_status::SetStatus,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_upgrade))
        .route("/api/v1/health", get(http::http_health))
        // Proxied so the page never needs the quiz service's own origin.
        .route("/api/v1/quizzes", get(http::http_list_quizzes))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .fallback_service(page_bundle("./static"))
}

/// Unknown paths get `index.html`, so client-side routes survive a reload.
fn page_bundle(dir: &str) -> ServeDir<SetStatus<ServeFile>> {
    ServeDir::new(dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(format!("{dir}/index.html")))
}
