//! In-memory study-session storage, keyed by the browser session cookie.
//!
//! Sessions auto-expire after a configurable duration of inactivity; expired
//! entries are swept opportunistically on access.

use crate::config;
use crate::srs::StudySession;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

struct SessionEntry {
  session: StudySession,
  last_access: DateTime<Utc>,
}

static SESSIONS: LazyLock<Mutex<HashMap<String, SessionEntry>>> =
  LazyLock::new(|| Mutex::new(HashMap::new()));

/// Look up the active session for a cookie id, refreshing its access time.
///
/// Unlike card data, sessions are never created implicitly: a missing entry
/// means there is no study run in progress.
pub fn load_session(session_id: &str) -> Option<StudySession> {
  let mut sessions = SESSIONS.lock().expect("Session store lock poisoned");

  // Sweep expired sessions occasionally (~10% of accesses)
  if rand::random::<u8>() < config::SESSION_CLEANUP_THRESHOLD {
    cleanup_expired(&mut sessions);
  }

  sessions.get_mut(session_id).map(|entry| {
    entry.last_access = Utc::now();
    entry.session.clone()
  })
}

/// Write a session back after it advanced.
pub fn store_session(session_id: &str, session: StudySession) {
  let mut sessions = SESSIONS.lock().expect("Session store lock poisoned");
  sessions.insert(
    session_id.to_string(),
    SessionEntry {
      session,
      last_access: Utc::now(),
    },
  );
}

/// Drop a finished, aborted or abandoned session.
pub fn clear_session(session_id: &str) {
  let mut sessions = SESSIONS.lock().expect("Session store lock poisoned");
  sessions.remove(session_id);
}

fn cleanup_expired(sessions: &mut HashMap<String, SessionEntry>) {
  let expiry = Utc::now() - Duration::hours(config::SESSION_EXPIRY_HOURS);
  sessions.retain(|_, entry| entry.last_access > expiry);
}

/// Generate a new session cookie value.
pub fn generate_session_id() -> String {
  use rand::Rng;
  let mut rng = rand::rng();
  (0..32)
    .map(|_| {
      let idx = rng.random_range(0..36);
      if idx < 10 {
        (b'0' + idx) as char
      } else {
        (b'a' + idx - 10) as char
      }
    })
    .collect()
}
