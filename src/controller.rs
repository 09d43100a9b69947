//! Generation lifecycle controller: URL input, title preview, and the
//! Idle → Warming/Generating → Idle request cycle.
//!
//! The controller is sans-IO. Operations that need the network hand out a ticket
//! (`PreviewTicket`, `GenerationTicket`); the caller performs the call however it likes
//! and feeds the outcome back with the ticket. The WebSocket session does exactly that so
//! the socket keeps reading while a call is in flight.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::Quiz;
use crate::service::ServiceError;
use crate::util::is_article_url;

pub const INVALID_URL_MESSAGE: &str = "Please enter a valid Wikipedia URL";
pub const EMPTY_URL_MESSAGE: &str = "Please enter a Wikipedia URL";
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to generate quiz. Please try again.";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPhase {
  #[default]
  Idle,
  /// First request of the session; the service may be cold-starting.
  Warming,
  Generating,
}

impl RequestPhase {
  pub fn label(&self) -> &'static str {
    match self {
      RequestPhase::Idle => "Generate Quiz",
      RequestPhase::Warming => "Warming up the quiz service…",
      RequestPhase::Generating => "Generating…",
    }
  }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ControllerError {
  #[error("Please enter a Wikipedia URL")]
  EmptyUrl,

  #[error("A quiz is already being generated")]
  Busy,
}

/// Issued by `update_url` when a preview lookup should be made.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewTicket {
  pub seq: u64,
  pub url: String,
}

/// Issued by `begin_submit`; identifies the in-flight generation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationTicket {
  pub seq: u64,
  pub url: String,
}

/// Fired once per successful generation.
#[derive(Clone, Debug)]
pub struct QuizGenerated(pub Arc<Quiz>);

#[derive(Debug, Default)]
pub struct GenerationController {
  url: String,
  phase: RequestPhase,
  title_preview: Option<String>,
  error: Option<String>,
  result: Option<Arc<Quiz>>,
  has_completed_one_request: bool,
  preview_seq: u64,
  generation_seq: u64,
}

/// Serializable view of the controller for the frontend.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ControllerSnapshot {
  pub url: String,
  pub phase: RequestPhase,
  pub phase_label: &'static str,
  pub can_submit: bool,
  pub title_preview: Option<String>,
  pub error: Option<String>,
  pub has_result: bool,
}

impl GenerationController {
  pub fn new() -> Self {
    Self::default()
  }

  /// Replace the URL. Returns a ticket when a preview lookup should be issued.
  ///
  /// Any earlier ticket is invalidated, and the preview is cleared so a title never
  /// shows against a URL it was not fetched for.
  pub fn update_url(&mut self, new_url: &str) -> Option<PreviewTicket> {
    self.url = new_url.to_string();
    self.error = None;
    self.result = None;
    self.title_preview = None;
    self.preview_seq += 1;

    if is_article_url(new_url) {
      Some(PreviewTicket { seq: self.preview_seq, url: self.url.clone() })
    } else {
      self.error = Some(INVALID_URL_MESSAGE.to_string());
      None
    }
  }

  /// Apply a preview outcome. Returns false (and changes nothing) for a superseded ticket.
  pub fn apply_preview(&mut self, ticket: &PreviewTicket, outcome: Result<String, ServiceError>) -> bool {
    if ticket.seq != self.preview_seq || ticket.url != self.url {
      debug!(target: "quiz", seq = ticket.seq, current = self.preview_seq, "Discarding stale title preview");
      return false;
    }
    match outcome {
      Ok(title) => self.title_preview = Some(title),
      Err(e) => {
        debug!(target: "quiz", error = %e, "Title preview unavailable");
        self.title_preview = None;
      }
    }
    true
  }

  /// Validate and enter Warming/Generating. Nothing is sent on error.
  pub fn begin_submit(&mut self) -> Result<GenerationTicket, ControllerError> {
    if self.phase != RequestPhase::Idle {
      return Err(ControllerError::Busy);
    }
    if self.url.trim().is_empty() {
      self.error = Some(EMPTY_URL_MESSAGE.to_string());
      return Err(ControllerError::EmptyUrl);
    }
    self.phase = if self.has_completed_one_request {
      RequestPhase::Generating
    } else {
      RequestPhase::Warming
    };
    self.error = None;
    self.result = None;
    self.generation_seq += 1;
    info!(target: "quiz", url = %self.url, phase = ?self.phase, "Quiz generation requested");
    Ok(GenerationTicket { seq: self.generation_seq, url: self.url.clone() })
  }

  /// Resolve the in-flight generation. Always returns to Idle and latches the first-request flag.
  pub fn finish_submit(
    &mut self,
    ticket: &GenerationTicket,
    outcome: Result<Quiz, ServiceError>,
  ) -> Option<QuizGenerated> {
    if ticket.seq != self.generation_seq || self.phase == RequestPhase::Idle {
      warn!(target: "quiz", seq = ticket.seq, "Ignoring completion for unknown generation request");
      return None;
    }
    self.phase = RequestPhase::Idle;
    self.has_completed_one_request = true;

    match outcome {
      Ok(quiz) => {
        let quiz = Arc::new(quiz);
        self.result = Some(quiz.clone());
        Some(QuizGenerated(quiz))
      }
      Err(e) => {
        warn!(target: "quiz", url = %ticket.url, error = %e, "Quiz generation failed");
        self.error = Some(e.detail().unwrap_or(GENERIC_FAILURE_MESSAGE).to_string());
        None
      }
    }
  }

  pub fn dismiss_error(&mut self) {
    self.error = None;
  }

  pub fn snapshot(&self) -> ControllerSnapshot {
    ControllerSnapshot {
      url: self.url.clone(),
      phase: self.phase,
      phase_label: self.phase.label(),
      can_submit: self.phase == RequestPhase::Idle,
      title_preview: self.title_preview.clone(),
      error: self.error.clone(),
      has_result: self.result.is_some(),
    }
  }
}

// Accessors and awaited round trips for tests; the session only reads `snapshot()`.
#[cfg(test)]
impl GenerationController {
  pub fn phase(&self) -> RequestPhase { self.phase }
  pub fn title_preview(&self) -> Option<&str> { self.title_preview.as_deref() }
  pub fn error(&self) -> Option<&str> { self.error.as_deref() }
  pub fn result(&self) -> Option<&Arc<Quiz>> { self.result.as_ref() }
  pub fn has_completed_one_request(&self) -> bool { self.has_completed_one_request }

  pub async fn refresh_preview<S: crate::service::QuizService>(&mut self, service: &S, new_url: &str) {
    if let Some(ticket) = self.update_url(new_url) {
      let outcome = service.title_preview(&ticket.url).await;
      self.apply_preview(&ticket, outcome);
    }
  }

  pub async fn submit<S: crate::service::QuizService>(&mut self, service: &S) -> Result<Option<QuizGenerated>, ControllerError> {
    let ticket = self.begin_submit()?;
    let outcome = service.generate_quiz(&ticket.url).await;
    Ok(self.finish_submit(&ticket, outcome))
  }
}


#[cfg(test)]
mod tests {
  use super::fake::{status, FakeService};
  use super::*;
  use crate::domain::fixtures::turing_quiz;
  use crate::service::QuizService;

  const TURING: &str = "https://en.wikipedia.org/wiki/Turing";

  #[test]
  fn invalid_url_sets_error_without_ticket() {
    let mut c = GenerationController::new();
    assert!(c.update_url("https://example.com/Turing").is_none());
    assert_eq!(c.error(), Some(INVALID_URL_MESSAGE));
    assert_eq!(c.title_preview(), None);

    assert!(c.update_url(TURING).is_some());
    assert_eq!(c.error(), None);
  }

  #[test]
  fn stale_preview_is_discarded() {
    let mut c = GenerationController::new();
    let first = c.update_url("https://en.wikipedia.org/wiki/Tur").expect("ticket");
    let second = c.update_url(TURING).expect("ticket");

    assert!(c.apply_preview(&second, Ok("Alan Turing".into())));
    assert!(!c.apply_preview(&first, Ok("Tur".into())));
    assert_eq!(c.title_preview(), Some("Alan Turing"));
  }

  #[test]
  fn preview_superseded_by_invalid_input_is_discarded() {
    let mut c = GenerationController::new();
    let ticket = c.update_url(TURING).expect("ticket");
    c.update_url("not a url");
    assert!(!c.apply_preview(&ticket, Ok("Alan Turing".into())));
    assert_eq!(c.title_preview(), None);
  }

  #[test]
  fn preview_failure_is_silent() {
    let mut c = GenerationController::new();
    let ticket = c.update_url(TURING).expect("ticket");
    assert!(c.apply_preview(&ticket, Err(status(400, Some("Invalid or unreachable URL.")))));
    assert_eq!(c.title_preview(), None);
    assert_eq!(c.error(), None);
  }

  #[test]
  fn concurrent_submit_is_rejected() {
    let mut c = GenerationController::new();
    c.update_url(TURING);
    let ticket = c.begin_submit().expect("first submit");
    assert_eq!(c.phase(), RequestPhase::Warming);
    assert_eq!(c.begin_submit(), Err(ControllerError::Busy));

    c.finish_submit(&ticket, Err(status(500, None)));
    assert_eq!(c.phase(), RequestPhase::Idle);
    assert!(c.finish_submit(&ticket, Ok(turing_quiz())).is_none());
    assert!(c.result().is_none());
  }

  #[tokio::test]
  async fn empty_url_fails_fast() {
    let svc = FakeService::default();
    let mut c = GenerationController::new();
    assert_eq!(c.submit(&svc).await.unwrap_err(), ControllerError::EmptyUrl);
    assert_eq!(c.error(), Some(EMPTY_URL_MESSAGE));
    assert_eq!(c.phase(), RequestPhase::Idle);
    assert!(svc.calls().is_empty());
  }

  #[tokio::test]
  async fn invalid_url_never_calls_service() {
    let svc = FakeService::default();
    let mut c = GenerationController::new();
    c.refresh_preview(&svc, "wikipedia turing").await;
    assert_eq!(c.error(), Some(INVALID_URL_MESSAGE));
    assert!(svc.calls().is_empty());

    svc.push_preview(Ok("Alan Turing".into()));
    c.refresh_preview(&svc, TURING).await;
    assert_eq!(c.title_preview(), Some("Alan Turing"));
    assert_eq!(svc.calls(), vec![format!("preview {TURING}")]);
  }

  #[tokio::test]
  async fn warming_then_generating_and_latch_survives_failure() {
    let svc = FakeService::default();
    svc.push_generation(Ok(turing_quiz()));
    svc.push_generation(Err(status(422, Some("Could not extract enough content"))));

    let mut c = GenerationController::new();
    c.update_url(TURING);

    let ticket = c.begin_submit().unwrap();
    assert_eq!(c.phase(), RequestPhase::Warming);
    assert!(!c.has_completed_one_request());
    let outcome = svc.generate_quiz(&ticket.url).await;
    let generated = c.finish_submit(&ticket, outcome).expect("notification");
    assert_eq!(generated.0.title, "Alan Turing");
    assert_eq!(c.phase(), RequestPhase::Idle);
    assert!(c.has_completed_one_request());
    assert!(c.result().is_some());

    let ticket = c.begin_submit().unwrap();
    assert_eq!(c.phase(), RequestPhase::Generating);
    assert!(c.result().is_none());
    let outcome = svc.generate_quiz(&ticket.url).await;
    assert!(c.finish_submit(&ticket, outcome).is_none());
    assert_eq!(c.phase(), RequestPhase::Idle);
    assert!(c.has_completed_one_request());
    assert_eq!(c.error(), Some("Could not extract enough content"));
  }

  #[tokio::test]
  async fn failed_first_request_still_latches() {
    let svc = FakeService::default();
    let mut c = GenerationController::new();
    c.update_url(TURING);

    let generated = c.submit(&svc).await.expect("submitted");
    assert!(generated.is_none());
    assert_eq!(c.error(), Some(GENERIC_FAILURE_MESSAGE));
    assert!(c.has_completed_one_request());

    c.dismiss_error();
    assert_eq!(c.error(), None);

    svc.push_generation(Ok(turing_quiz()));
    let ticket = c.begin_submit().unwrap();
    assert_eq!(c.phase(), RequestPhase::Generating);
    let outcome = svc.generate_quiz(&ticket.url).await;
    assert!(c.finish_submit(&ticket, outcome).is_some());
  }

  #[test]
  fn snapshot_reflects_phase() {
    let mut c = GenerationController::new();
    c.update_url(TURING);
    c.begin_submit().unwrap();
    let snap = c.snapshot();
    assert_eq!(snap.phase, RequestPhase::Warming);
    assert!(!snap.can_submit);
    assert_eq!(snap.phase_label, "Warming up the quiz service…");
    let json = serde_json::to_value(&snap).unwrap();
    assert_eq!(json["phase"], "warming");
  }
}
