//! Review logging

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result};

use crate::domain::ReviewLog;

pub fn insert_review_log(conn: &Connection, log: &ReviewLog) -> Result<i64> {
  conn.execute(
    "INSERT INTO review_logs (card_id, quality, is_correct, reviewed_at) VALUES (?1, ?2, ?3, ?4)",
    params![
      log.card_id,
      log.quality,
      if log.is_correct { 1 } else { 0 },
      log.reviewed_at.to_rfc3339(),
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

/// Number of reviews logged at or after the given instant.
pub fn count_reviews_since(conn: &Connection, since: DateTime<Utc>) -> Result<i64> {
  conn.query_row(
    "SELECT COUNT(*) FROM review_logs WHERE reviewed_at >= ?1",
    params![since.to_rfc3339()],
    |row| row.get(0),
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::{insert_card, test_conn};
  use crate::domain::{Card, ReviewQuality};
  use chrono::Duration;

  #[test]
  fn test_insert_and_count() {
    let conn = test_conn();
    let card = Card::new("本".to_string(), Some("ほん".to_string()), "book".to_string(), None);
    let card_id = insert_card(&conn, &card).unwrap();

    insert_review_log(&conn, &ReviewLog::new(card_id, ReviewQuality::Good)).unwrap();
    insert_review_log(&conn, &ReviewLog::new(card_id, ReviewQuality::Blackout)).unwrap();

    let today = count_reviews_since(&conn, Utc::now() - Duration::hours(1)).unwrap();
    assert_eq!(today, 2);

    let future = count_reviews_since(&conn, Utc::now() + Duration::hours(1)).unwrap();
    assert_eq!(future, 0);
  }
}
