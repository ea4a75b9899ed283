//! Daily due-card reminder.
//!
//! Once a day, at the configured local hour, count the cards that are due and
//! log a nudge. The task owns no scheduling state of its own; "due" is
//! entirely the card collection's judgement.

use chrono::{Local, NaiveTime};
use std::time::Duration;

use crate::config;
use crate::db::{self, DbPool};

pub fn spawn(pool: DbPool) {
  tokio::spawn(async move {
    loop {
      tokio::time::sleep(duration_until_next(config::REMINDER_HOUR)).await;

      let due = match db::try_lock(&pool) {
        Ok(conn) => db::get_due_count(&conn),
        Err(e) => {
          tracing::warn!("reminder skipped: {}", e);
          continue;
        }
      };

      match due {
        Ok(0) => tracing::debug!("no cards due, skipping reminder"),
        Ok(count) => tracing::info!(due = count, "cards are waiting for review"),
        Err(e) => tracing::warn!("due-count query failed: {}", e),
      }
    }
  });
}

/// Time until the next occurrence of `hour:00` local time.
fn duration_until_next(hour: u32) -> Duration {
  let now = Local::now().naive_local();
  let target_time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);

  let mut target = now.date().and_time(target_time);
  if target <= now {
    target += chrono::Duration::days(1);
  }

  (target - now).to_std().unwrap_or(Duration::from_secs(60 * 60))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_duration_until_next_is_within_a_day() {
    let wait = duration_until_next(9);
    assert!(wait > Duration::ZERO);
    assert!(wait <= Duration::from_secs(24 * 60 * 60));
  }

  #[test]
  fn test_invalid_hour_falls_back_to_midnight() {
    // NaiveTime::from_hms_opt(25, ..) is None; the fallback must still
    // produce a bounded wait
    let wait = duration_until_next(25);
    assert!(wait <= Duration::from_secs(24 * 60 * 60));
  }
}
