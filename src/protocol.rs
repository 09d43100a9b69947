//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable so the frontend can evolve independently.

use serde::{Deserialize, Serialize};

use crate::controller::ControllerSnapshot;
use crate::domain::QuizRecord;
use crate::presentation::{Mode, QuizView};

/// Messages the frontend can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    UpdateUrl {
        url: String,
    },
    Submit,
    DismissError,
    SelectMode {
        mode: Mode,
    },
    RecordAnswer {
        #[serde(rename = "questionIndex")]
        question_index: usize,
        option: String,
    },
    SubmitAnswers,
    ResetForRetake,
    LoadHistory,
    OpenQuiz {
        id: i64,
    },
    CloseQuiz,
}

/// Messages the shell pushes back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Controller {
        state: ControllerSnapshot,
    },
    /// One-shot notification: a generation request succeeded.
    QuizGenerated {
        title: String,
    },
    Quiz {
        view: QuizView,
    },
    QuizClosed,
    History {
        quizzes: Vec<HistoryItem>,
    },
    /// Local validation condition (incomplete answers, already submitted, ...).
    Notice {
        message: String,
    },
    Error {
        message: String,
    },
}

/// One row of the history table.
#[derive(Debug, Serialize)]
pub struct HistoryItem {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub question_count: usize,
}

impl From<&QuizRecord> for HistoryItem {
    fn from(r: &QuizRecord) -> Self {
        Self {
            id: r.id,
            title: r.quiz.title.clone(),
            url: r.quiz.url.clone(),
            question_count: r.quiz.question_count(),
        }
    }
}

//
// HTTP response DTOs
//

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub message: String,
}
