//! Application state shared by every connection: configuration and the quiz service client.
//!
//! Per-user state (controller, open quiz, answers) is not here; it lives in each
//! WebSocket session and is never shared.

use tracing::{info, instrument};

use crate::config::ShellConfig;
use crate::service::{HttpQuizService, ServiceError};

#[derive(Clone)]
pub struct AppState {
    pub config: ShellConfig,
    pub service: HttpQuizService,
}

impl AppState {
    /// Build state from a loaded config and construct the HTTP client.
    #[instrument(level = "info", skip_all)]
    pub fn new(config: ShellConfig) -> Result<Self, ServiceError> {
        let service = HttpQuizService::from_config(&config)?;
        info!(
            target: "intelliquiz",
            api_url = %service.base_url,
            preview_timeout_secs = config.preview_timeout_secs,
            generated_mode = ?config.modes.generated,
            history_mode = ?config.modes.history,
            "Quiz service client ready"
        );
        Ok(Self { config, service })
    }
}
