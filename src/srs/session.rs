//! Study-session queue: a shuffled worklist of card ids with a forward-only
//! cursor.
//!
//! Grading has two independent effects, decided per grade: whether the card
//! is rescheduled through SM-2, and whether it is re-appended to the queue
//! for another pass in the same session. The session itself never touches
//! storage; it hands the decision back to the caller, which owns the card
//! repository.

use rand::seq::SliceRandom;

use crate::domain::{Card, ReviewQuality};

/// Grades at or above this leave the session rotation and reschedule via
/// SM-2; lower grades re-append the card to the queue without rescheduling.
///
/// This is deliberately not the SM-2 pass boundary (3): a hesitant "correct
/// with difficulty" still earns another pass within the session.
pub const RESCHEDULE_MIN_QUALITY: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
  /// The candidate set for a new session was empty
  EmptySelection,
  /// The cursor has moved past the end of the queue
  Exhausted,
  /// The graded card id does not match the queue slot under the cursor
  Desync { expected: i64, got: i64 },
}

impl std::fmt::Display for SessionError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::EmptySelection => write!(f, "no cards to study"),
      Self::Exhausted => write!(f, "study session is exhausted"),
      Self::Desync { expected, got } => {
        write!(f, "graded card {} but the current card is {}", got, expected)
      }
    }
  }
}

impl std::error::Error for SessionError {}

/// What a grade does to the card, split into its two independent effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeDecision {
  /// Run the card through SM-2 and persist the new scheduling state
  pub reschedule: bool,
  /// Re-append the card id to this session's queue
  pub requeue: bool,
}

impl GradeDecision {
  pub fn for_quality(quality: ReviewQuality) -> Self {
    if quality.value() >= RESCHEDULE_MIN_QUALITY {
      Self { reschedule: true, requeue: false }
    } else {
      Self { reschedule: false, requeue: true }
    }
  }
}

/// One study run over a fixed selection of cards.
///
/// Holds only card ids, never card data: cards can be rescheduled or deleted
/// while the session runs, and the queue must not serve stale copies.
#[derive(Debug, Clone, Default)]
pub struct StudySession {
  queue: Vec<i64>,
  cursor: usize,
}

impl StudySession {
  pub fn start(card_ids: Vec<i64>, shuffle: bool) -> Result<Self, SessionError> {
    if card_ids.is_empty() {
      return Err(SessionError::EmptySelection);
    }

    let mut queue = card_ids;
    if shuffle {
      queue.shuffle(&mut rand::rng());
    }
    Ok(Self { queue, cursor: 0 })
  }

  /// Card id under the cursor.
  pub fn current_card_id(&self) -> Result<i64, SessionError> {
    self
      .queue
      .get(self.cursor)
      .copied()
      .ok_or(SessionError::Exhausted)
  }

  /// Resolve the cursor to a live card.
  ///
  /// Ids that stopped resolving (the card was deleted while the session ran)
  /// are skipped rather than surfaced; the queue heals itself and only
  /// signals `Exhausted` once nothing resolvable is left.
  pub fn current_card<F>(&mut self, mut get_card: F) -> Result<Card, SessionError>
  where
    F: FnMut(i64) -> Option<Card>,
  {
    loop {
      let id = self.current_card_id()?;
      match get_card(id) {
        Some(card) => return Ok(card),
        None => {
          tracing::debug!(card_id = id, "card no longer resolves, skipping queue slot");
          self.cursor += 1;
        }
      }
    }
  }

  /// Grade the card under the cursor and advance past it.
  ///
  /// `card_id` must be the id the cursor points at; anything else means the
  /// caller and the queue have diverged (double submit, stale form) and the
  /// session has to be abandoned, never silently corrected.
  pub fn grade(
    &mut self,
    card_id: i64,
    quality: ReviewQuality,
  ) -> Result<GradeDecision, SessionError> {
    let expected = self.current_card_id()?;
    if expected != card_id {
      return Err(SessionError::Desync { expected, got: card_id });
    }

    let decision = GradeDecision::for_quality(quality);
    if decision.requeue {
      self.queue.push(card_id);
    }
    self.cursor += 1;
    Ok(decision)
  }

  pub fn is_exhausted(&self) -> bool {
    self.cursor >= self.queue.len()
  }

  /// 1-based cursor position, for "card N of M" display.
  pub fn position(&self) -> usize {
    self.cursor + 1
  }

  pub fn queue_len(&self) -> usize {
    self.queue.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn q(value: u8) -> ReviewQuality {
    ReviewQuality::from_u8(value).unwrap()
  }

  fn card(id: i64) -> Card {
    let mut card = Card::new(format!("expr-{}", id), None, format!("trans-{}", id), None);
    card.id = id;
    card
  }

  #[test]
  fn test_start_with_empty_selection_fails() {
    assert_eq!(
      StudySession::start(vec![], true).unwrap_err(),
      SessionError::EmptySelection
    );
  }

  #[test]
  fn test_start_without_shuffle_keeps_order() {
    let session = StudySession::start(vec![3, 1, 2], false).unwrap();
    assert_eq!(session.current_card_id(), Ok(3));
    assert_eq!(session.queue_len(), 3);
  }

  #[test]
  fn test_shuffle_is_a_permutation() {
    let ids: Vec<i64> = (1..=50).collect();
    let session = StudySession::start(ids.clone(), true).unwrap();

    let mut seen = Vec::new();
    let mut probe = session.clone();
    while let Ok(id) = probe.current_card_id() {
      seen.push(id);
      // Drain by grading everything out of rotation
      probe.grade(id, q(5)).unwrap();
    }
    seen.sort_unstable();
    assert_eq!(seen, ids);
  }

  #[test]
  fn test_low_grade_requeues_without_reschedule() {
    // Queue [A, B], grade A with 2: queue becomes [A, B, A], cursor 1
    let mut session = StudySession::start(vec![10, 20], false).unwrap();

    let decision = session.grade(10, q(2)).unwrap();
    assert!(!decision.reschedule);
    assert!(decision.requeue);

    assert_eq!(session.queue_len(), 3);
    assert_eq!(session.position(), 2);
    assert!(!session.is_exhausted());
    assert_eq!(session.current_card_id(), Ok(20));
  }

  #[test]
  fn test_hard_grade_also_requeues() {
    // Quality 3 passes SM-2 but stays below the session exit boundary
    let mut session = StudySession::start(vec![10], false).unwrap();
    let decision = session.grade(10, q(3)).unwrap();
    assert!(!decision.reschedule);
    assert!(decision.requeue);
    assert!(!session.is_exhausted());
  }

  #[test]
  fn test_high_grade_reschedules_and_exits_rotation() {
    let mut session = StudySession::start(vec![10], false).unwrap();

    let decision = session.grade(10, q(5)).unwrap();
    assert!(decision.reschedule);
    assert!(!decision.requeue);

    assert!(session.is_exhausted());
    assert_eq!(session.current_card_id(), Err(SessionError::Exhausted));
  }

  #[test]
  fn test_grade_boundary_is_four() {
    let below = GradeDecision::for_quality(q(3));
    let at = GradeDecision::for_quality(q(4));
    assert!(below.requeue && !below.reschedule);
    assert!(at.reschedule && !at.requeue);
  }

  #[test]
  fn test_grade_wrong_card_is_desync() {
    let mut session = StudySession::start(vec![1, 2], false).unwrap();
    let err = session.grade(2, q(5)).unwrap_err();
    assert_eq!(err, SessionError::Desync { expected: 1, got: 2 });

    // The queue is untouched by a rejected grade
    assert_eq!(session.current_card_id(), Ok(1));
    assert_eq!(session.queue_len(), 2);
  }

  #[test]
  fn test_grade_after_exhaustion_signals_exhausted() {
    let mut session = StudySession::start(vec![1], false).unwrap();
    session.grade(1, q(5)).unwrap();
    assert_eq!(session.grade(1, q(5)).unwrap_err(), SessionError::Exhausted);
  }

  #[test]
  fn test_current_card_resolves_live_card() {
    let mut session = StudySession::start(vec![7], false).unwrap();
    let resolved = session.current_card(|id| Some(card(id))).unwrap();
    assert_eq!(resolved.id, 7);
    assert_eq!(session.position(), 1);
  }

  #[test]
  fn test_current_card_skips_deleted_ids() {
    let mut session = StudySession::start(vec![1, 2, 3], false).unwrap();

    // Cards 1 and 2 were deleted by the collection while the session ran
    let resolved = session
      .current_card(|id| if id == 3 { Some(card(id)) } else { None })
      .unwrap();

    assert_eq!(resolved.id, 3);
    assert_eq!(session.position(), 3);
  }

  #[test]
  fn test_current_card_exhausts_when_nothing_resolves() {
    let mut session = StudySession::start(vec![1, 2], false).unwrap();
    let err = session.current_card(|_| None).unwrap_err();
    assert_eq!(err, SessionError::Exhausted);
    assert!(session.is_exhausted());
  }

  #[test]
  fn test_requeued_card_comes_back_in_same_session() {
    let mut session = StudySession::start(vec![1, 2], false).unwrap();

    session.grade(1, q(0)).unwrap();
    session.grade(2, q(5)).unwrap();

    // The failed card recurs at the tail of the queue
    let resolved = session.current_card(|id| Some(card(id))).unwrap();
    assert_eq!(resolved.id, 1);

    session.grade(1, q(5)).unwrap();
    assert!(session.is_exhausted());
  }

  #[test]
  fn test_single_card_session_lifecycle() {
    let mut session = StudySession::start(vec![42], false).unwrap();
    assert!(!session.is_exhausted());

    let resolved = session.current_card(|id| Some(card(id))).unwrap();
    assert_eq!(resolved.id, 42);

    session.grade(42, q(5)).unwrap();
    assert!(session.is_exhausted());
    assert_eq!(
      session.current_card(|id| Some(card(id))).unwrap_err(),
      SessionError::Exhausted
    );
  }

  #[test]
  fn test_timestamps_untouched_by_session() {
    // The session never mutates card data, only ids
    let before = Utc::now();
    let mut session = StudySession::start(vec![5], false).unwrap();
    let resolved = session.current_card(|id| Some(card(id))).unwrap();
    assert!(resolved.next_review >= before);
    assert_eq!(resolved.repetitions, 0);
  }
}
