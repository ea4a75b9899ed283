//! Progress statistics
//!
//! Status buckets are folded in Rust over `CardStatus::from_repetitions` so
//! the classifier thresholds live in exactly one place.

use chrono::Utc;
use rusqlite::{Connection, Result};

use crate::domain::CardStatus;

/// Cards per learned-status bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusBreakdown {
  pub new_cards: i64,
  pub lightly_learned: i64,
  pub nearly_learned: i64,
  pub learned: i64,
}

impl StatusBreakdown {
  pub fn total(&self) -> i64 {
    self.new_cards + self.lightly_learned + self.nearly_learned + self.learned
  }
}

pub fn get_status_breakdown(conn: &Connection) -> Result<StatusBreakdown> {
  let mut stmt = conn.prepare("SELECT repetitions FROM cards")?;
  let repetitions = stmt
    .query_map([], |row| row.get::<_, i64>(0))?
    .collect::<Result<Vec<_>>>()?;

  let mut breakdown = StatusBreakdown::default();
  for reps in repetitions {
    match CardStatus::from_repetitions(reps) {
      CardStatus::New => breakdown.new_cards += 1,
      CardStatus::LightlyLearned => breakdown.lightly_learned += 1,
      CardStatus::NearlyLearned => breakdown.nearly_learned += 1,
      CardStatus::Learned => breakdown.learned += 1,
    }
  }
  Ok(breakdown)
}

#[derive(Debug, Clone)]
pub struct TopicProgress {
  pub topic: String,
  pub total: i64,
  pub due: i64,
  pub learned: i64,
}

pub fn get_progress_by_topic(conn: &Connection) -> Result<Vec<TopicProgress>> {
  let now = Utc::now();
  let mut stmt = conn.prepare("SELECT topic, repetitions, next_review FROM cards ORDER BY topic")?;

  let rows = stmt
    .query_map([], |row| {
      let topic: String = row.get(0)?;
      let repetitions: i64 = row.get(1)?;
      let next_review: String = row.get(2)?;
      Ok((topic, repetitions, next_review))
    })?
    .collect::<Result<Vec<_>>>()?;

  let mut progress: Vec<TopicProgress> = Vec::new();
  for (topic, repetitions, next_review) in rows {
    if progress.last().map(|p| p.topic.as_str()) != Some(topic.as_str()) {
      progress.push(TopicProgress { topic, total: 0, due: 0, learned: 0 });
    }
    let entry = progress.last_mut().expect("entry just pushed");

    entry.total += 1;
    if CardStatus::from_repetitions(repetitions) == CardStatus::Learned {
      entry.learned += 1;
    }
    let due = chrono::DateTime::parse_from_rfc3339(&next_review)
      .map(|dt| dt.with_timezone(&Utc) <= now)
      .unwrap_or(false);
    if due {
      entry.due += 1;
    }
  }

  Ok(progress)
}

/// (total cards, lifetime reviews)
pub fn get_total_stats(conn: &Connection) -> Result<(i64, i64)> {
  let total_cards: i64 = conn.query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))?;
  let total_reviews: i64 = conn.query_row(
    "SELECT COALESCE(SUM(total_reviews), 0) FROM cards",
    [],
    |row| row.get(0),
  )?;
  Ok((total_cards, total_reviews))
}
