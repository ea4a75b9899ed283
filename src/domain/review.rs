use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::UNSORTED_TOPIC;

/// Recall quality on the SM-2 scale.
///
/// The scale is closed: anything outside 0..=5 is a caller error and is
/// rejected at construction, so the scheduler never sees an invalid grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReviewQuality {
  /// Complete blackout
  Blackout = 0,
  /// Wrong, but the answer looked familiar
  Wrong = 1,
  /// Wrong, but the answer felt easy once seen
  NearMiss = 2,
  /// Correct with serious difficulty
  Hard = 3,
  /// Correct after some hesitation
  Good = 4,
  /// Perfect recall
  Easy = 5,
}

impl ReviewQuality {
  pub fn from_u8(value: u8) -> Option<Self> {
    match value {
      0 => Some(Self::Blackout),
      1 => Some(Self::Wrong),
      2 => Some(Self::NearMiss),
      3 => Some(Self::Hard),
      4 => Some(Self::Good),
      5 => Some(Self::Easy),
      _ => None,
    }
  }

  pub fn value(self) -> u8 {
    self as u8
  }

  /// The SM-2 pass boundary: grades below 3 reset a card's progress.
  pub fn is_passing(self) -> bool {
    self.value() >= 3
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewLog {
  pub id: i64,
  pub card_id: i64,
  pub quality: u8,
  pub is_correct: bool,
  pub reviewed_at: DateTime<Utc>,
}

impl ReviewLog {
  pub fn new(card_id: i64, quality: ReviewQuality) -> Self {
    Self {
      id: 0,
      card_id,
      quality: quality.value(),
      is_correct: quality.is_passing(),
      reviewed_at: Utc::now(),
    }
  }
}

/// Which cards a study session draws from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudyScope {
  /// Cards whose next review is at or before now
  Due,
  /// The whole collection
  All,
  /// One topic label
  Topic(String),
}

impl StudyScope {
  pub fn from_query(scope: &str, topic: Option<String>) -> Option<Self> {
    match scope {
      "due" => Some(Self::Due),
      "all" => Some(Self::All),
      "topic" => Some(Self::Topic(
        topic.unwrap_or_else(|| UNSORTED_TOPIC.to_string()),
      )),
      _ => None,
    }
  }
}

/// Which face of a card is presented first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FrontSide {
  #[default]
  Expression,
  Translation,
}

impl FrontSide {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Expression => "expression",
      Self::Translation => "translation",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "expression" => Some(Self::Expression),
      "translation" => Some(Self::Translation),
      _ => None,
    }
  }

  pub fn toggled(self) -> Self {
    match self {
      Self::Expression => Self::Translation,
      Self::Translation => Self::Expression,
    }
  }
}
