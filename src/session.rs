//! One viewing session: a generation controller plus at most one open quiz.
//!
//! The session is driven by two kinds of input:
//!   - client messages (`handle`), which mutate state synchronously and may request a
//!     network call as a `Command`;
//!   - finished network calls (`complete`), fed back as a `Completion`.
//!
//! The caller runs commands off the message loop (see `run_command`), so the user can
//! keep typing while a preview or generation is in flight.

use std::sync::Arc;

use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::config::InitialModes;
use crate::controller::{GenerationController, GenerationTicket, PreviewTicket, QuizGenerated};
use crate::domain::{Quiz, QuizRecord};
use crate::presentation::QuizEngine;
use crate::protocol::{ClientWsMessage, HistoryItem, ServerWsMessage};
use crate::service::{QuizService, ServiceError};

pub const HISTORY_FAILURE_MESSAGE: &str = "Failed to load quiz history.";

/// A network call the session wants made.
#[derive(Debug)]
pub enum Command {
  Preview(PreviewTicket),
  Generate(GenerationTicket),
  LoadHistory,
}

/// Outcome of a `Command`, returned to the session.
#[derive(Debug)]
pub enum Completion {
  Preview(PreviewTicket, Result<String, ServiceError>),
  Generated(GenerationTicket, Result<Quiz, ServiceError>),
  History(Result<Vec<QuizRecord>, ServiceError>),
}

#[derive(Debug, Default)]
pub struct Reply {
  pub messages: Vec<ServerWsMessage>,
  pub command: Option<Command>,
}

impl Reply {
  fn send(messages: Vec<ServerWsMessage>) -> Self {
    Self { messages, command: None }
  }
}

pub async fn run_command<S: QuizService>(service: &S, cmd: Command) -> Completion {
  match cmd {
    Command::Preview(ticket) => {
      let outcome = service.title_preview(&ticket.url).await;
      Completion::Preview(ticket, outcome)
    }
    Command::Generate(ticket) => {
      let outcome = service.generate_quiz(&ticket.url).await;
      Completion::Generated(ticket, outcome)
    }
    Command::LoadHistory => Completion::History(service.list_quizzes().await),
  }
}

/// Where the open quiz came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Source {
  /// The controller's current result; closed when the URL changes.
  Generated,
  History,
}

#[derive(Debug)]
pub struct Session {
  pub id: Uuid,
  controller: GenerationController,
  engine: Option<(Source, QuizEngine)>,
  history: Vec<QuizRecord>,
  modes: InitialModes,
}

impl Session {
  pub fn new(modes: InitialModes) -> Self {
    Self {
      id: Uuid::new_v4(),
      controller: GenerationController::new(),
      engine: None,
      history: Vec::new(),
      modes,
    }
  }

  fn controller_state(&self) -> ServerWsMessage {
    ServerWsMessage::Controller { state: self.controller.snapshot() }
  }

  fn quiz_view(&self) -> ServerWsMessage {
    match &self.engine {
      Some((_, engine)) => ServerWsMessage::Quiz { view: engine.view() },
      None => ServerWsMessage::QuizClosed,
    }
  }

  /// Run `f` against the open quiz, replying with the new view or a notice.
  fn with_engine<E: std::fmt::Display>(
    &mut self,
    f: impl FnOnce(&mut QuizEngine) -> Result<(), E>,
  ) -> Reply {
    let Some((_, engine)) = self.engine.as_mut() else {
      return Reply::send(vec![ServerWsMessage::Notice { message: "No quiz is open.".into() }]);
    };
    match f(engine) {
      Ok(()) => Reply::send(vec![self.quiz_view()]),
      Err(e) => Reply::send(vec![ServerWsMessage::Notice { message: e.to_string() }]),
    }
  }

  #[instrument(level = "debug", skip(self), fields(session = %self.id))]
  pub fn handle(&mut self, msg: ClientWsMessage) -> Reply {
    match msg {
      ClientWsMessage::Ping => Reply::send(vec![ServerWsMessage::Pong]),

      ClientWsMessage::UpdateUrl { url } => {
        let ticket = self.controller.update_url(&url);
        let mut messages = vec![self.controller_state()];
        if matches!(self.engine, Some((Source::Generated, _))) {
          self.engine = None;
          messages.push(ServerWsMessage::QuizClosed);
        }
        Reply { messages, command: ticket.map(Command::Preview) }
      }

      ClientWsMessage::Submit => match self.controller.begin_submit() {
        Ok(ticket) => {
          let mut messages = vec![self.controller_state()];
          if self.engine.take().is_some() {
            messages.push(ServerWsMessage::QuizClosed);
          }
          Reply { messages, command: Some(Command::Generate(ticket)) }
        }
        Err(e) => Reply::send(vec![
          self.controller_state(),
          ServerWsMessage::Notice { message: e.to_string() },
        ]),
      },

      ClientWsMessage::DismissError => {
        self.controller.dismiss_error();
        Reply::send(vec![self.controller_state()])
      }

      ClientWsMessage::SelectMode { mode } => self.with_engine(|e| {
        e.select_mode(mode);
        Ok::<_, std::convert::Infallible>(())
      }),

      ClientWsMessage::RecordAnswer { question_index, option } => {
        self.with_engine(|e| e.record_answer(question_index, &option))
      }

      ClientWsMessage::SubmitAnswers => self.with_engine(|e| e.submit_answers().map(|_| ())),

      ClientWsMessage::ResetForRetake => self.with_engine(|e| {
        e.reset_for_retake();
        Ok::<_, std::convert::Infallible>(())
      }),

      ClientWsMessage::LoadHistory => Reply { messages: vec![], command: Some(Command::LoadHistory) },

      ClientWsMessage::OpenQuiz { id } => match self.history.iter().find(|r| r.id == id) {
        Some(record) => {
          let engine = QuizEngine::new(Arc::new(record.quiz.clone()), self.modes.history);
          self.engine = Some((Source::History, engine));
          Reply::send(vec![self.quiz_view()])
        }
        None => Reply::send(vec![ServerWsMessage::Error { message: format!("Unknown quiz id: {}", id) }]),
      },

      ClientWsMessage::CloseQuiz => {
        self.engine = None;
        Reply::send(vec![ServerWsMessage::QuizClosed])
      }
    }
  }

  #[instrument(level = "debug", skip_all, fields(session = %self.id))]
  pub fn complete(&mut self, done: Completion) -> Vec<ServerWsMessage> {
    match done {
      Completion::Preview(ticket, outcome) => {
        if self.controller.apply_preview(&ticket, outcome) {
          vec![self.controller_state()]
        } else {
          vec![]
        }
      }

      Completion::Generated(ticket, outcome) => match self.controller.finish_submit(&ticket, outcome) {
        Some(QuizGenerated(quiz)) => {
          info!(target: "quiz", session = %self.id, title = %quiz.title, "Opening generated quiz");
          let title = quiz.title.clone();
          self.engine = Some((Source::Generated, QuizEngine::new(quiz, self.modes.generated)));
          vec![self.controller_state(), ServerWsMessage::QuizGenerated { title }, self.quiz_view()]
        }
        None => vec![self.controller_state()],
      },

      Completion::History(Ok(records)) => {
        let quizzes = records.iter().map(HistoryItem::from).collect();
        self.history = records;
        vec![ServerWsMessage::History { quizzes }]
      }

      Completion::History(Err(e)) => {
        error!(target: "quiz", session = %self.id, error = %e, "Quiz history failed to load");
        vec![ServerWsMessage::Error { message: HISTORY_FAILURE_MESSAGE.into() }]
      }
    }
  }
}
