use chrono::{DateTime, Days, Utc};

use crate::domain::ReviewQuality;

const MIN_EASE_FACTOR: f64 = 1.3;

/// Hard ceiling on a single interval, to bound backlog growth.
const MAX_INTERVAL_DAYS: i64 = 365;

pub struct Sm2Result {
  pub ease_factor: f64,
  pub interval_days: i64,
  pub repetitions: i64,
  pub next_review: DateTime<Utc>,
}

/// SM-2 recurrence: map a graded recall onto the card's next scheduling state.
///
/// `now` is injected so callers (and tests) control the clock; the function
/// itself does no I/O.
pub fn calculate_sm2(
  quality: ReviewQuality,
  current_ease_factor: f64,
  current_interval: i64,
  current_repetitions: i64,
  now: DateTime<Utc>,
) -> Sm2Result {
  let (ease_factor, interval, repetitions) = if !quality.is_passing() {
    // Failed recall: reset progress, bring the card back tomorrow.
    // The ease factor stays where it was.
    (current_ease_factor, 1, 0)
  } else {
    let q = quality.value() as f64;

    // EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)), floored at 1.3
    let ease_delta = 0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02);
    let new_ease_factor = (current_ease_factor + ease_delta).max(MIN_EASE_FACTOR);

    // The interval branch is chosen on the pre-update repetition count
    let new_interval = match current_repetitions {
      0 => 1,
      1 => 6,
      _ => ((current_interval as f64) * new_ease_factor).round() as i64,
    };

    (new_ease_factor, new_interval, current_repetitions + 1)
  };

  let interval_days = interval.clamp(1, MAX_INTERVAL_DAYS);

  // Calendar-day addition, not a fixed 24h multiple
  let next_review = now
    .checked_add_days(Days::new(interval_days as u64))
    .unwrap_or(now);

  Sm2Result {
    ease_factor,
    interval_days,
    repetitions,
    next_review,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn q(value: u8) -> ReviewQuality {
    ReviewQuality::from_u8(value).unwrap()
  }

  #[test]
  fn test_first_review_good() {
    let result = calculate_sm2(q(4), 2.5, 0, 0, Utc::now());
    assert_eq!(result.repetitions, 1);
    assert_eq!(result.interval_days, 1);
    assert!((result.ease_factor - 2.5).abs() < 0.01);
  }

  #[test]
  fn test_second_review_good() {
    let result = calculate_sm2(q(4), 2.5, 1, 1, Utc::now());
    assert_eq!(result.repetitions, 2);
    assert_eq!(result.interval_days, 6);
  }

  #[test]
  fn test_third_review_multiplies_interval() {
    let result = calculate_sm2(q(4), 2.5, 6, 2, Utc::now());
    assert_eq!(result.repetitions, 3);
    // 6 * 2.5 = 15
    assert_eq!(result.interval_days, 15);
  }

  #[test]
  fn test_failed_review_resets_without_touching_ease() {
    for quality in 0..3u8 {
      let result = calculate_sm2(q(quality), 2.2, 15, 5, Utc::now());
      assert_eq!(result.repetitions, 0);
      assert_eq!(result.interval_days, 1);
      assert!((result.ease_factor - 2.2).abs() < f64::EPSILON);
    }
  }

  #[test]
  fn test_ease_factor_floor() {
    // Quality 3 carries a -0.14 delta; the floor must hold
    let result = calculate_sm2(q(3), 1.3, 10, 4, Utc::now());
    assert!((result.ease_factor - 1.3).abs() < f64::EPSILON);
  }

  #[test]
  fn test_ease_factor_floor_holds_under_repeated_hard_reviews() {
    let mut ef = 2.5;
    let mut interval = 1;
    let mut reps = 0;

    for _ in 0..20 {
      let result = calculate_sm2(q(3), ef, interval, reps, Utc::now());
      ef = result.ease_factor;
      interval = result.interval_days;
      reps = result.repetitions;
    }

    assert!(ef >= MIN_EASE_FACTOR);
  }

  #[test]
  fn test_interval_capped_at_one_year() {
    let result = calculate_sm2(q(5), 2.5, 300, 8, Utc::now());
    // 300 * 2.6 = 780, capped
    assert_eq!(result.interval_days, 365);
  }

  #[test]
  fn test_cap_applies_to_every_quality() {
    for quality in 0..=5u8 {
      let result = calculate_sm2(q(quality), 5.0, 10_000, 50, Utc::now());
      assert!(result.interval_days <= 365);
      assert!(result.interval_days >= 1);
    }
  }

  #[test]
  fn test_fresh_card_graded_easy_twice() {
    let now = Utc::now();
    let first = calculate_sm2(q(5), 2.5, 0, 0, now);
    assert_eq!(first.interval_days, 1);
    assert_eq!(first.repetitions, 1);

    let second = calculate_sm2(q(5), first.ease_factor, first.interval_days, first.repetitions, now);
    assert_eq!(second.interval_days, 6);
    assert_eq!(second.repetitions, 2);
  }

  #[test]
  fn test_quality_four_on_second_repetition() {
    // Quality 4 has a zero ease delta, so ef stays 2.5 and the third
    // interval is round(6 * 2.5) = 15
    let result = calculate_sm2(q(4), 2.5, 6, 1, Utc::now());
    assert!((result.ease_factor - 2.5).abs() < 1e-9);
    assert_eq!(result.interval_days, 6);
    assert_eq!(result.repetitions, 2);

    let next = calculate_sm2(q(4), result.ease_factor, result.interval_days, result.repetitions, Utc::now());
    assert_eq!(next.interval_days, 15);
    assert_eq!(next.repetitions, 3);
  }

  #[test]
  fn test_easy_review_increases_ease() {
    let result = calculate_sm2(q(5), 2.5, 1, 1, Utc::now());
    assert!(result.ease_factor > 2.5);
    assert_eq!(result.interval_days, 6);
  }

  #[test]
  fn test_next_review_is_calendar_days_ahead() {
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap();
    let result = calculate_sm2(q(4), 2.5, 1, 1, now);
    assert_eq!(result.interval_days, 6);
    assert_eq!(
      result.next_review,
      Utc.with_ymd_and_hms(2025, 3, 7, 12, 30, 0).unwrap()
    );
  }

  #[test]
  fn test_interval_grows_over_successive_good_reviews() {
    let mut ef = 2.5;
    let mut interval = 0;
    let mut reps = 0;

    for i in 0..5 {
      let result = calculate_sm2(q(4), ef, interval, reps, Utc::now());
      ef = result.ease_factor;
      interval = result.interval_days;
      reps = result.repetitions;

      match i {
        0 => assert_eq!(interval, 1),
        1 => assert_eq!(interval, 6),
        _ => assert!(interval > 6),
      }
    }

    assert!(interval > 30);
  }
}
