//! IntelliQuiz · local shell for the Wikipedia quiz generator
//!
//! - Axum HTTP + WebSocket API; one quiz session per WebSocket connection
//! - Talks to the external quiz service (validate-url, generate-quiz, quizzes)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                    : u16 (default 3000)
//!   QUIZ_API_URL            : quiz service base URL (default "http://127.0.0.1:8000")
//!   INTELLIQUIZ_CONFIG_PATH : path to TOML config (see `config::ShellConfig`)
//!   LOG_LEVEL               : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT              : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod service;
mod controller;
mod presentation;
mod protocol;
mod session;
mod state;
mod routes;

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let config = config::load_from_env();
  let addr = config.listen_addr();

  let state = Arc::new(AppState::new(config)?);
  let app = build_router(state);

  let listener = TcpListener::bind(addr).await?;
  info!(target: "intelliquiz", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "intelliquiz", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "intelliquiz", "Shutdown signal received");
}
