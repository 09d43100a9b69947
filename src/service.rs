//! Client for the external quiz service.
//!
//! Three calls: title preview (`GET /validate-url/`), generation (`POST /generate-quiz/`)
//! and history (`GET /quizzes/`). Calls are instrumented and log latencies and sizes,
//! never article contents.

use std::{future::Future, time::Duration, time::Instant};

use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::ShellConfig;
use crate::domain::{Quiz, QuizRecord};
use crate::util::trunc_for_log;

#[derive(Error, Debug)]
pub enum ServiceError {
  #[error("HTTP request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("Quiz service returned {status}")]
  Status { status: u16, detail: Option<String> },
}

impl ServiceError {
  /// Human-readable detail supplied by the service, if any.
  pub fn detail(&self) -> Option<&str> {
    match self {
      ServiceError::Status { detail, .. } => detail.as_deref(),
      _ => None,
    }
  }
}

/// The operations the shell needs from the quiz service.
pub trait QuizService: Clone + Send + Sync + 'static {
  fn title_preview(&self, url: &str) -> impl Future<Output = Result<String, ServiceError>> + Send;
  fn generate_quiz(&self, url: &str) -> impl Future<Output = Result<Quiz, ServiceError>> + Send;
  fn list_quizzes(&self) -> impl Future<Output = Result<Vec<QuizRecord>, ServiceError>> + Send;
}

#[derive(Clone)]
pub struct HttpQuizService {
  client: reqwest::Client,
  pub base_url: String,
  user_agent: String,
  preview_timeout: Duration,
}

#[derive(Serialize)]
struct GenerateIn<'a> {
  url: &'a str,
}

#[derive(Deserialize)]
struct PreviewOut {
  title: String,
}

impl HttpQuizService {
  /// No client-wide timeout: generation may sit through a cold start for a long time.
  pub fn from_config(cfg: &ShellConfig) -> Result<Self, ServiceError> {
    let client = reqwest::Client::builder().build()?;
    Ok(Self {
      client,
      base_url: cfg.api_url.clone(),
      user_agent: cfg.user_agent.clone(),
      preview_timeout: Duration::from_secs(cfg.preview_timeout_secs),
    })
  }

  fn endpoint(&self, path: &str) -> String {
    format!("{}/{}", self.base_url, path)
  }

  /// The article URL travels as the `url` query parameter; reqwest does the encoding.
  fn preview_request(&self, article_url: &str) -> reqwest::RequestBuilder {
    self.client.get(self.endpoint("validate-url/"))
      .query(&[("url", article_url)])
      .header(USER_AGENT, &self.user_agent)
      .timeout(self.preview_timeout)
  }
}

/// Turn a non-2xx response into `ServiceError::Status`, pulling `detail` from the body.
async fn check_status(res: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
  if res.status().is_success() {
    return Ok(res);
  }
  let status = res.status().as_u16();
  let body = res.text().await.unwrap_or_default();
  let detail = extract_detail(&body);
  warn!(target: "intelliquiz", status, body = %trunc_for_log(&body, 200), "Quiz service error response");
  Err(ServiceError::Status { status, detail })
}

impl QuizService for HttpQuizService {
  #[instrument(level = "debug", skip(self), fields(url_len = url.len()))]
  async fn title_preview(&self, url: &str) -> Result<String, ServiceError> {
    let res = self.preview_request(url).send().await?;
    let out: PreviewOut = check_status(res).await?.json().await?;
    Ok(out.title)
  }

  #[instrument(level = "info", skip(self), fields(%url))]
  async fn generate_quiz(&self, url: &str) -> Result<Quiz, ServiceError> {
    let started = Instant::now();
    let res = self.client.post(self.endpoint("generate-quiz/"))
      .header(USER_AGENT, &self.user_agent)
      .header(CONTENT_TYPE, "application/json")
      .json(&GenerateIn { url })
      .send().await?;
    let quiz: Quiz = check_status(res).await?.json().await?;
    info!(target: "quiz", title = %quiz.title, questions = quiz.question_count(), elapsed_ms = started.elapsed().as_millis() as u64, "Quiz generated");
    Ok(quiz)
  }

  #[instrument(level = "info", skip(self))]
  async fn list_quizzes(&self) -> Result<Vec<QuizRecord>, ServiceError> {
    let res = self.client.get(self.endpoint("quizzes/"))
      .header(USER_AGENT, &self.user_agent)
      .send().await?;
    let list: Vec<QuizRecord> = check_status(res).await?.json().await?;
    info!(target: "quiz", count = list.len(), "Quiz history loaded");
    Ok(list)
  }
}

/// `{"detail": "..."}` only. Validation errors send `detail` as a list; treat that as absent.
fn extract_detail(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct DWrap { detail: serde_json::Value }
  match serde_json::from_str::<DWrap>(body) {
    Ok(DWrap { detail: serde_json::Value::String(s) }) if !s.trim().is_empty() => Some(s),
    _ => None,
  }
}
