//! Quiz presentation engine: Review/Take modes, answer capture, scoring, retake.
//!
//! The engine never touches the network. It owns one `AnswerSet` for the quiz it was
//! opened with and renders to serializable view models (`QuizView`). Correctness data
//! only appears in a Take view once the answers have been submitted.

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{Difficulty, KeyEntities, Quiz};

/// Selected option per 0-based question index.
pub type AnswerSet = BTreeMap<usize, String>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
  #[default]
  Review,
  Take,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Score {
  pub correct: usize,
  pub total: usize,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EngineError {
  #[error("Switch to Take mode to answer questions.")]
  NotTaking,

  #[error("Answers have already been submitted.")]
  AlreadySubmitted,

  #[error("Please answer all questions before submitting ({answered}/{total} answered).")]
  Incomplete { answered: usize, total: usize },

  #[error("Question {index} does not exist (quiz has {total}).")]
  NoSuchQuestion { index: usize, total: usize },

  #[error("'{option}' is not an option for question {index}.")]
  UnknownOption { index: usize, option: String },
}

/// Count of questions whose recorded answer equals the expected answer exactly.
pub fn score(quiz: &Quiz, answers: &AnswerSet) -> usize {
  quiz.questions
    .iter()
    .enumerate()
    .filter(|(i, q)| answers.get(i).is_some_and(|a| *a == q.answer))
    .count()
}

#[derive(Debug)]
pub struct QuizEngine {
  quiz: Arc<Quiz>,
  mode: Mode,
  answers: AnswerSet,
  submitted: bool,
}

impl QuizEngine {
  pub fn new(quiz: Arc<Quiz>, mode: Mode) -> Self {
    Self { quiz, mode, answers: AnswerSet::new(), submitted: false }
  }

  /// Mode-only switch; answers and submission state are left as they are.
  pub fn select_mode(&mut self, mode: Mode) {
    debug!(target: "quiz", from = ?self.mode, to = ?mode, "Mode selected");
    self.mode = mode;
  }

  /// Review is read-only; answers are only captured in Take mode.
  fn ensure_taking(&self) -> Result<(), EngineError> {
    match self.mode {
      Mode::Take => Ok(()),
      Mode::Review => Err(EngineError::NotTaking),
    }
  }

  pub fn record_answer(&mut self, index: usize, option: &str) -> Result<(), EngineError> {
    self.ensure_taking()?;
    if self.submitted {
      return Err(EngineError::AlreadySubmitted);
    }
    let total = self.quiz.question_count();
    let question = self.quiz.questions.get(index).ok_or(EngineError::NoSuchQuestion { index, total })?;
    if !question.options.iter().any(|o| o == option) {
      return Err(EngineError::UnknownOption { index, option: option.to_string() });
    }
    self.answers.insert(index, option.to_string());
    Ok(())
  }

  /// Every question must be answered; there is no partial submission.
  pub fn submit_answers(&mut self) -> Result<Score, EngineError> {
    self.ensure_taking()?;
    if self.submitted {
      return Err(EngineError::AlreadySubmitted);
    }
    let total = self.quiz.question_count();
    let answered = (0..total).filter(|i| self.answers.contains_key(i)).count();
    if answered < total {
      return Err(EngineError::Incomplete { answered, total });
    }
    self.submitted = true;
    let s = Score { correct: score(&self.quiz, &self.answers), total };
    info!(target: "quiz", title = %self.quiz.title, correct = s.correct, total = s.total, "Answers submitted");
    Ok(s)
  }

  /// `None` until answers are submitted.
  pub fn score(&self) -> Option<Score> {
    self.submitted.then(|| Score { correct: score(&self.quiz, &self.answers), total: self.quiz.question_count() })
  }

  pub fn reset_for_retake(&mut self) {
    self.answers.clear();
    self.submitted = false;
    self.mode = Mode::Take;
  }

  pub fn view(&self) -> QuizView {
    match self.mode {
      Mode::Review => QuizView::Review(self.review_view()),
      Mode::Take => QuizView::Take(self.take_view()),
    }
  }

  fn review_view(&self) -> ReviewView {
    let quiz = &self.quiz;
    ReviewView {
      title: quiz.title.clone(),
      summary: quiz.summary.clone(),
      url: quiz.url.clone(),
      questions: quiz.questions
        .iter()
        .enumerate()
        .map(|(i, q)| ReviewQuestion {
          number: i + 1,
          text: q.text.clone(),
          difficulty: q.difficulty,
          options: q.options
            .iter()
            .map(|o| ReviewOption { text: o.clone(), correct: *o == q.answer })
            .collect(),
          explanation: q.explanation.clone(),
        })
        .collect(),
      key_entities: (!quiz.key_entities.is_empty()).then(|| quiz.key_entities.clone()),
      sections: quiz.sections.clone(),
      related_topics: quiz.related_topics.iter().cloned().collect(),
    }
  }

  fn take_view(&self) -> TakeView {
    let submitted = self.submitted;
    let questions = self.quiz.questions
      .iter()
      .enumerate()
      .map(|(i, q)| {
        let chosen = self.answers.get(&i);
        let options = q.options
          .iter()
          .map(|o| {
            let selected = chosen == Some(o);
            let correct = *o == q.answer;
            TakeOption {
              text: o.clone(),
              selected,
              correct: submitted.then_some(correct),
              wrong_selection: submitted.then_some(selected && !correct),
            }
          })
          .collect();
        TakeQuestion { index: i, number: i + 1, text: q.text.clone(), options }
      })
      .collect();

    TakeView {
      title: self.quiz.title.clone(),
      question_count: self.quiz.question_count(),
      answered: self.answers.len(),
      submitted,
      score: self.score(),
      questions,
    }
  }
}

#[cfg(test)]
impl QuizEngine {
  pub fn mode(&self) -> Mode { self.mode }
  pub fn answers(&self) -> &AnswerSet { &self.answers }
  pub fn is_submitted(&self) -> bool { self.submitted }
}

/// Render model pushed to the frontend.
#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum QuizView {
  Review(ReviewView),
  Take(TakeView),
}

#[derive(Debug, Serialize)]
pub struct ReviewView {
  pub title: String,
  pub summary: String,
  pub url: String,
  pub questions: Vec<ReviewQuestion>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub key_entities: Option<KeyEntities>,
  pub sections: Vec<String>,
  /// Shown once, after the last question.
  pub related_topics: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewQuestion {
  pub number: usize,
  pub text: String,
  pub difficulty: Difficulty,
  pub options: Vec<ReviewOption>,
  pub explanation: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewOption {
  pub text: String,
  pub correct: bool,
}

#[derive(Debug, Serialize)]
pub struct TakeView {
  pub title: String,
  pub question_count: usize,
  pub answered: usize,
  pub submitted: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub score: Option<Score>,
  pub questions: Vec<TakeQuestion>,
}

#[derive(Debug, Serialize)]
pub struct TakeQuestion {
  pub index: usize,
  pub number: usize,
  pub text: String,
  pub options: Vec<TakeOption>,
}

#[derive(Debug, Serialize)]
pub struct TakeOption {
  pub text: String,
  pub selected: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub correct: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub wrong_selection: Option<bool>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::fixtures::turing_quiz;

  fn take_engine() -> QuizEngine {
    QuizEngine::new(Arc::new(turing_quiz()), Mode::Take)
  }

  #[test]
  fn two_of_three_correct_scores_two() {
    let mut engine = take_engine();
    engine.record_answer(0, "1936").unwrap();
    engine.record_answer(1, "Cambridge").unwrap();
    engine.record_answer(2, "Princeton").unwrap();
    assert_eq!(engine.score(), None);

    let s = engine.submit_answers().expect("complete");
    assert_eq!(s, Score { correct: 2, total: 3 });

    assert_eq!(engine.record_answer(1, "Bletchley Park"), Err(EngineError::AlreadySubmitted));
    assert_eq!(engine.answers().get(&1).map(String::as_str), Some("Cambridge"));
    assert_eq!(engine.score(), Some(Score { correct: 2, total: 3 }));
  }

  #[test]
  fn incomplete_submission_is_rejected() {
    let mut engine = take_engine();
    engine.record_answer(0, "1936").unwrap();
    engine.record_answer(2, "Oxford").unwrap();

    assert_eq!(engine.submit_answers(), Err(EngineError::Incomplete { answered: 2, total: 3 }));
    assert!(!engine.is_submitted());
    assert_eq!(engine.score(), None);
    assert_eq!(engine.answers().len(), 2);
  }

  #[test]
  fn later_choice_overwrites_earlier() {
    let mut engine = take_engine();
    engine.record_answer(0, "1945").unwrap();
    engine.record_answer(0, "1936").unwrap();
    assert_eq!(engine.answers().len(), 1);
    assert_eq!(engine.answers()[&0], "1936");
  }

  #[test]
  fn rejects_unknown_question_and_option() {
    let mut engine = take_engine();
    assert_eq!(engine.record_answer(3, "1936"), Err(EngineError::NoSuchQuestion { index: 3, total: 3 }));
    assert!(matches!(engine.record_answer(0, "1937"), Err(EngineError::UnknownOption { index: 0, .. })));
    assert!(engine.answers().is_empty());
  }

  #[test]
  fn reset_always_returns_to_fresh_take() {
    let mut engine = QuizEngine::new(Arc::new(turing_quiz()), Mode::Review);
    engine.reset_for_retake();
    assert_eq!(engine.mode(), Mode::Take);

    for (i, a) in ["1936", "Bletchley Park", "Princeton"].iter().enumerate() {
      engine.record_answer(i, a).unwrap();
    }
    engine.submit_answers().unwrap();
    engine.select_mode(Mode::Review);

    engine.reset_for_retake();
    assert!(engine.answers().is_empty());
    assert!(!engine.is_submitted());
    assert_eq!(engine.mode(), Mode::Take);
  }

  #[test]
  fn review_mode_is_read_only() {
    let mut engine = QuizEngine::new(Arc::new(turing_quiz()), Mode::Review);
    for (i, a) in ["1936", "Bletchley Park", "Princeton"].iter().enumerate() {
      assert_eq!(engine.record_answer(i, a), Err(EngineError::NotTaking));
    }
    assert_eq!(engine.submit_answers(), Err(EngineError::NotTaking));
    assert!(engine.answers().is_empty());
    assert!(!engine.is_submitted());

    // Nothing leaks into Take either.
    engine.select_mode(Mode::Take);
    let QuizView::Take(view) = engine.view() else { panic!("expected take view") };
    assert_eq!(view.answered, 0);
    assert!(view.score.is_none());
  }

  #[test]
  fn select_mode_keeps_answers() {
    let mut engine = take_engine();
    engine.record_answer(0, "1936").unwrap();
    engine.select_mode(Mode::Review);
    engine.select_mode(Mode::Take);
    assert_eq!(engine.answers().len(), 1);
  }

  #[test]
  fn pure_score_ignores_case_differences() {
    let quiz = turing_quiz();
    let mut answers = AnswerSet::new();
    answers.insert(1, "bletchley park".into());
    answers.insert(2, "Princeton".into());
    assert_eq!(score(&quiz, &answers), 1);
    assert_eq!(score(&quiz, &AnswerSet::new()), 0);
  }

  #[test]
  fn take_view_hides_correctness_until_submitted() {
    let mut engine = take_engine();
    engine.record_answer(0, "1945").unwrap();

    let before = serde_json::to_value(engine.view()).unwrap();
    assert_eq!(before["mode"], "take");
    assert!(before.get("score").is_none());
    let opt = &before["questions"][0]["options"][1];
    assert_eq!(opt["selected"], true);
    assert!(opt.get("correct").is_none());
    assert!(opt.get("wrong_selection").is_none());

    engine.record_answer(1, "Bletchley Park").unwrap();
    engine.record_answer(2, "Princeton").unwrap();
    engine.submit_answers().unwrap();

    let after = serde_json::to_value(engine.view()).unwrap();
    assert_eq!(after["score"]["correct"], 2);
    assert_eq!(after["questions"][0]["options"][1]["wrong_selection"], true);
    assert_eq!(after["questions"][0]["options"][0]["correct"], true);
    assert_eq!(after["questions"][0]["options"][0]["selected"], false);
  }

  #[test]
  fn review_view_flags_correct_option() {
    let engine = QuizEngine::new(Arc::new(turing_quiz()), Mode::Review);
    let QuizView::Review(view) = engine.view() else { panic!("expected review view") };
    assert_eq!(view.questions.len(), 3);
    assert_eq!(view.questions[1].number, 2);
    let correct: Vec<&str> = view.questions[1].options.iter().filter(|o| o.correct).map(|o| o.text.as_str()).collect();
    assert_eq!(correct, vec!["Bletchley Park"]);
    assert_eq!(view.questions[0].difficulty, Difficulty::Easy);
    assert_eq!(view.related_topics, vec!["Computability", "Enigma machine"]);
    assert!(view.key_entities.is_none());
  }
}
