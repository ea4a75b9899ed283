//! Card CRUD, scope queries and the review write path

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result};

use crate::domain::{Card, FrontSide, StudyScope};

pub fn insert_card(conn: &Connection, card: &Card) -> Result<i64> {
  conn.execute(
    r#"
    INSERT INTO cards (expression, reading, translation, topic, ease_factor,
                       interval_days, repetitions, next_review, total_reviews, correct_reviews)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
    "#,
    params![
      card.expression,
      card.reading,
      card.translation,
      card.topic,
      card.ease_factor,
      card.interval_days,
      card.repetitions,
      card.next_review.to_rfc3339(),
      card.total_reviews,
      card.correct_reviews,
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

pub fn get_card_by_id(conn: &Connection, id: i64) -> Result<Option<Card>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT id, expression, reading, translation, topic, ease_factor,
           interval_days, repetitions, next_review, total_reviews, correct_reviews
    FROM cards WHERE id = ?1
    "#,
  )?;

  let mut rows = stmt.query(params![id])?;
  if let Some(row) = rows.next()? {
    Ok(Some(row_to_card(row)?))
  } else {
    Ok(None)
  }
}

pub fn get_all_cards(conn: &Connection) -> Result<Vec<Card>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT id, expression, reading, translation, topic, ease_factor,
           interval_days, repetitions, next_review, total_reviews, correct_reviews
    FROM cards
    ORDER BY topic ASC, id ASC
    "#,
  )?;

  let cards = stmt
    .query_map([], |row| row_to_card(row))?
    .collect::<Result<Vec<_>>>()?;
  Ok(cards)
}

/// Card ids matching a study scope. Session queues are built from ids only;
/// the cards themselves are resolved one at a time while studying.
pub fn list_card_ids(conn: &Connection, scope: &StudyScope) -> Result<Vec<i64>> {
  match scope {
    StudyScope::Due => {
      let now = Utc::now().to_rfc3339();
      let mut stmt =
        conn.prepare("SELECT id FROM cards WHERE next_review <= ?1 ORDER BY next_review ASC")?;
      let ids = stmt
        .query_map(params![now], |row| row.get(0))?
        .collect::<Result<Vec<_>>>()?;
      Ok(ids)
    }
    StudyScope::All => {
      let mut stmt = conn.prepare("SELECT id FROM cards ORDER BY id ASC")?;
      let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>>>()?;
      Ok(ids)
    }
    StudyScope::Topic(topic) => {
      let mut stmt = conn.prepare("SELECT id FROM cards WHERE topic = ?1 ORDER BY id ASC")?;
      let ids = stmt
        .query_map(params![topic], |row| row.get(0))?
        .collect::<Result<Vec<_>>>()?;
      Ok(ids)
    }
  }
}

/// Oldest due cards, for the sessionless classic mode.
pub fn get_due_cards(conn: &Connection, limit: usize) -> Result<Vec<Card>> {
  let now = Utc::now().to_rfc3339();
  let mut stmt = conn.prepare(
    r#"
    SELECT id, expression, reading, translation, topic, ease_factor,
           interval_days, repetitions, next_review, total_reviews, correct_reviews
    FROM cards
    WHERE next_review <= ?1
    ORDER BY next_review ASC
    LIMIT ?2
    "#,
  )?;

  let cards = stmt
    .query_map(params![now, limit as i64], |row| row_to_card(row))?
    .collect::<Result<Vec<_>>>()?;
  Ok(cards)
}

pub fn get_due_count(conn: &Connection) -> Result<i64> {
  let now = Utc::now().to_rfc3339();
  conn.query_row(
    "SELECT COUNT(*) FROM cards WHERE next_review <= ?1",
    params![now],
    |row| row.get(0),
  )
}

/// Get the next scheduled review time (for cards not yet due)
pub fn get_next_review_time(conn: &Connection) -> Result<Option<DateTime<Utc>>> {
  let now = Utc::now().to_rfc3339();

  let result: std::result::Result<String, _> = conn.query_row(
    "SELECT next_review FROM cards WHERE next_review > ?1 ORDER BY next_review ASC LIMIT 1",
    params![now],
    |row| row.get(0),
  );

  match result {
    Ok(next_review_str) => {
      let dt = DateTime::parse_from_rfc3339(&next_review_str)
        .map(|dt| dt.with_timezone(&Utc))
        .ok();
      Ok(dt)
    }
    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
    Err(e) => Err(e),
  }
}

/// Persist a rescheduled card's new SM-2 state and bump its counters.
pub fn update_card_after_review(
  conn: &Connection,
  id: i64,
  ease_factor: f64,
  interval_days: i64,
  repetitions: i64,
  next_review: DateTime<Utc>,
  correct: bool,
) -> Result<()> {
  conn.execute(
    r#"
    UPDATE cards
    SET ease_factor = ?1, interval_days = ?2, repetitions = ?3, next_review = ?4,
        total_reviews = total_reviews + 1,
        correct_reviews = correct_reviews + ?5
    WHERE id = ?6
    "#,
    params![
      ease_factor,
      interval_days,
      repetitions,
      next_review.to_rfc3339(),
      if correct { 1 } else { 0 },
      id,
    ],
  )?;
  Ok(())
}

/// Bump review counters without touching scheduling state. Used when a card
/// is requeued within a session instead of being rescheduled.
pub fn bump_review_counters(conn: &Connection, id: i64, correct: bool) -> Result<()> {
  conn.execute(
    r#"
    UPDATE cards
    SET total_reviews = total_reviews + 1,
        correct_reviews = correct_reviews + ?1
    WHERE id = ?2
    "#,
    params![if correct { 1 } else { 0 }, id],
  )?;
  Ok(())
}

/// Delete a card. Returns false if the id was already gone.
pub fn delete_card(conn: &Connection, id: i64) -> Result<bool> {
  conn.execute("DELETE FROM review_logs WHERE card_id = ?1", params![id])?;
  let deleted = conn.execute("DELETE FROM cards WHERE id = ?1", params![id])?;
  Ok(deleted > 0)
}

pub fn list_topics(conn: &Connection) -> Result<Vec<String>> {
  let mut stmt = conn.prepare("SELECT DISTINCT topic FROM cards ORDER BY topic ASC")?;
  let topics = stmt
    .query_map([], |row| row.get(0))?
    .collect::<Result<Vec<_>>>()?;
  Ok(topics)
}

fn row_to_card(row: &rusqlite::Row) -> Result<Card> {
  let next_review_str: String = row.get(8)?;

  Ok(Card {
    id: row.get(0)?,
    expression: row.get(1)?,
    reading: row.get(2)?,
    translation: row.get(3)?,
    topic: row.get(4)?,
    ease_factor: row.get(5)?,
    interval_days: row.get(6)?,
    repetitions: row.get(7)?,
    next_review: DateTime::parse_from_rfc3339(&next_review_str)
      .map(|dt| dt.with_timezone(&Utc))
      .unwrap_or_else(|_| Utc::now()),
    total_reviews: row.get(9)?,
    correct_reviews: row.get(10)?,
  })
}

// Settings functions

fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
  let result: std::result::Result<String, _> = conn.query_row(
    "SELECT value FROM settings WHERE key = ?1",
    params![key],
    |row| row.get(0),
  );
  match result {
    Ok(value) => Ok(Some(value)),
    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
    Err(e) => Err(e),
  }
}

fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
  conn.execute(
    "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
    params![key, value],
  )?;
  Ok(())
}

pub fn get_front_side(conn: &Connection) -> Result<FrontSide> {
  Ok(
    get_setting(conn, "front_side")?
      .and_then(|v| FrontSide::from_str(&v))
      .unwrap_or_default(),
  )
}

pub fn set_front_side(conn: &Connection, side: FrontSide) -> Result<()> {
  set_setting(conn, "front_side", side.as_str())
}

pub fn get_show_reading(conn: &Connection) -> Result<bool> {
  Ok(
    get_setting(conn, "show_reading_immediately")?
      .map(|v| v == "true")
      .unwrap_or(false),
  )
}

pub fn set_show_reading(conn: &Connection, show: bool) -> Result<()> {
  set_setting(
    conn,
    "show_reading_immediately",
    if show { "true" } else { "false" },
  )
}
