use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Topic assigned to cards created without an explicit one.
pub const UNSORTED_TOPIC: &str = "unsorted";

/// Display-only learned-status buckets derived from the repetition count.
///
/// Carries no scheduling weight; the scheduler only ever reads the raw
/// repetition count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardStatus {
  New,
  LightlyLearned,
  NearlyLearned,
  Learned,
}

impl CardStatus {
  pub fn from_repetitions(repetitions: i64) -> Self {
    match repetitions {
      ..=0 => Self::New,
      1..=2 => Self::LightlyLearned,
      3..=5 => Self::NearlyLearned,
      _ => Self::Learned,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::New => "new",
      Self::LightlyLearned => "lightly_learned",
      Self::NearlyLearned => "nearly_learned",
      Self::Learned => "learned",
    }
  }

  /// Human-readable label for templates.
  pub fn label(&self) -> &'static str {
    match self {
      Self::New => "new",
      Self::LightlyLearned => "lightly learned",
      Self::NearlyLearned => "nearly learned",
      Self::Learned => "learned",
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
  pub id: i64,
  /// Japanese expression shown on the front by default
  pub expression: String,
  /// Kana reading, if the expression contains kanji
  pub reading: Option<String>,
  pub translation: String,
  pub topic: String,

  // SM-2 scheduling state
  pub ease_factor: f64,
  pub interval_days: i64,
  pub repetitions: i64,
  pub next_review: DateTime<Utc>,

  // Stats
  pub total_reviews: i64,
  pub correct_reviews: i64,
}

impl Card {
  pub fn new(
    expression: String,
    reading: Option<String>,
    translation: String,
    topic: Option<String>,
  ) -> Self {
    Self {
      id: 0,
      expression,
      reading,
      translation,
      topic: topic.unwrap_or_else(|| UNSORTED_TOPIC.to_string()),
      ease_factor: 2.5,
      interval_days: 0,
      repetitions: 0,
      next_review: Utc::now(),
      total_reviews: 0,
      correct_reviews: 0,
    }
  }

  pub fn status(&self) -> CardStatus {
    CardStatus::from_repetitions(self.repetitions)
  }

  /// A brand-new card is due immediately.
  pub fn is_due(&self, now: DateTime<Utc>) -> bool {
    self.next_review <= now
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // CardStatus tests

  #[test]
  fn test_status_zero_repetitions_is_new() {
    assert_eq!(CardStatus::from_repetitions(0), CardStatus::New);
  }

  #[test]
  fn test_status_lightly_learned_bounds() {
    assert_eq!(CardStatus::from_repetitions(1), CardStatus::LightlyLearned);
    assert_eq!(CardStatus::from_repetitions(2), CardStatus::LightlyLearned);
  }

  #[test]
  fn test_status_nearly_learned_bounds() {
    assert_eq!(CardStatus::from_repetitions(3), CardStatus::NearlyLearned);
    assert_eq!(CardStatus::from_repetitions(4), CardStatus::NearlyLearned);
    assert_eq!(CardStatus::from_repetitions(5), CardStatus::NearlyLearned);
  }

  #[test]
  fn test_status_learned_above_five() {
    assert_eq!(CardStatus::from_repetitions(6), CardStatus::Learned);
    assert_eq!(CardStatus::from_repetitions(100), CardStatus::Learned);
  }

  #[test]
  fn test_status_negative_repetitions_is_new() {
    // Repetitions never go negative, but the classifier is total anyway
    assert_eq!(CardStatus::from_repetitions(-1), CardStatus::New);
  }

  #[test]
  fn test_status_labels() {
    assert_eq!(CardStatus::New.label(), "new");
    assert_eq!(CardStatus::LightlyLearned.label(), "lightly learned");
    assert_eq!(CardStatus::NearlyLearned.label(), "nearly learned");
    assert_eq!(CardStatus::Learned.label(), "learned");
  }

  // Card constructor tests

  #[test]
  fn test_card_new_defaults() {
    let card = Card::new(
      "猫".to_string(),
      Some("ねこ".to_string()),
      "cat".to_string(),
      Some("animals".to_string()),
    );

    assert_eq!(card.id, 0);
    assert_eq!(card.expression, "猫");
    assert_eq!(card.reading, Some("ねこ".to_string()));
    assert_eq!(card.translation, "cat");
    assert_eq!(card.topic, "animals");
    assert!((card.ease_factor - 2.5).abs() < f64::EPSILON);
    assert_eq!(card.interval_days, 0);
    assert_eq!(card.repetitions, 0);
    assert_eq!(card.total_reviews, 0);
    assert_eq!(card.correct_reviews, 0);
    assert_eq!(card.status(), CardStatus::New);
  }

  #[test]
  fn test_card_new_without_topic_uses_sentinel() {
    let card = Card::new("水".to_string(), None, "water".to_string(), None);
    assert_eq!(card.topic, UNSORTED_TOPIC);
    assert!(card.reading.is_none());
  }

  #[test]
  fn test_card_new_is_due_immediately() {
    let card = Card::new("山".to_string(), Some("やま".to_string()), "mountain".to_string(), None);
    assert!(card.is_due(Utc::now()));
  }
}
