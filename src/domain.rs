//! Domain models received from the quiz service: quiz, question, difficulty tier, stored record.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

/// Difficulty tier shown as a badge next to each question.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  #[default]
  Easy,
  Medium,
  Hard,
}

impl Difficulty {
  /// Map a raw producer value onto a tier. Case-insensitive; anything unrecognized is `Easy`.
  pub fn from_raw(raw: Option<&str>) -> Self {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
      Some("medium") => Difficulty::Medium,
      Some("hard") => Difficulty::Hard,
      _ => Difficulty::Easy,
    }
  }
}

// The producer is an LLM; accept null, numbers, or junk and fall back to easy.
fn lenient_difficulty<'de, D>(deserializer: D) -> Result<Difficulty, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
  Ok(Difficulty::from_raw(raw.as_ref().and_then(|v| v.as_str())))
}

/// One multiple-choice question. `answer` equals one of `options` (producer's invariant).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Question {
  #[serde(rename = "question")]
  pub text: String,
  pub options: Vec<String>,
  pub answer: String,
  #[serde(default)]
  pub explanation: String,
  #[serde(default, deserialize_with = "lenient_difficulty")]
  pub difficulty: Difficulty,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyEntities {
  #[serde(default)] pub people: Vec<String>,
  #[serde(default)] pub organizations: Vec<String>,
  #[serde(default)] pub locations: Vec<String>,
}

impl KeyEntities {
  pub fn is_empty(&self) -> bool {
    self.people.is_empty() && self.organizations.is_empty() && self.locations.is_empty()
  }
}

/// A generated quiz. Immutable once received.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
  pub title: String,
  #[serde(default)]
  pub summary: String,
  #[serde(rename = "quiz_data", default)]
  pub questions: Vec<Question>,
  #[serde(default)]
  pub related_topics: BTreeSet<String>,

  // Extra article metadata, present when the service returns it.
  #[serde(default)] pub url: String,
  #[serde(default)] pub key_entities: KeyEntities,
  #[serde(default)] pub sections: Vec<String>,
}

impl Quiz {
  pub fn question_count(&self) -> usize {
    self.questions.len()
  }
}

/// A quiz as stored by the service, with its stable identifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuizRecord {
  pub id: i64,
  #[serde(flatten)]
  pub quiz: Quiz,
}
