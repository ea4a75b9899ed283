//! Study surfaces.
//!
//! Two review dialects on purpose:
//! - the session flow requeues low grades within the run and only feeds
//!   confident grades (>= 4) into SM-2;
//! - the classic flow is sessionless and reschedules every grade through
//!   SM-2, including failures.

use askama::Template;
use axum::{
  extract::{Query, State},
  response::{Html, IntoResponse},
  Form,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;

use crate::db::{self, DbPool, LogOnError};
use crate::domain::{Card, FrontSide, ReviewLog, ReviewQuality, StudyScope};
use crate::session;
use crate::srs::{self, SessionError, StudySession};

use super::{ensure_session_id, render_error, session_id};

#[derive(Template)]
#[template(path = "study_menu.html")]
pub struct StudyMenuTemplate {
  pub due_count: i64,
  pub total_cards: i64,
  pub topics: Vec<String>,
}

#[derive(Template)]
#[template(path = "card_front.html")]
pub struct CardFrontTemplate {
  pub card_id: i64,
  pub front: String,
  pub reading: Option<String>,
  pub status: &'static str,
  pub position: usize,
  pub total: usize,
}

#[derive(Template)]
#[template(path = "card_back.html")]
pub struct CardBackTemplate {
  pub card_id: i64,
  pub front: String,
  pub reading: Option<String>,
  pub back: String,
  pub status: &'static str,
  pub position: usize,
  pub total: usize,
}

#[derive(Template)]
#[template(path = "session_done.html")]
pub struct SessionDoneTemplate {}

#[derive(Template)]
#[template(path = "no_cards.html")]
pub struct NoCardsTemplate {}

/// Display settings resolved once per request
struct FaceConfig {
  front_side: FrontSide,
  show_reading: bool,
}

fn face_config(conn: &Connection) -> FaceConfig {
  FaceConfig {
    front_side: db::get_front_side(conn).log_warn_default("reading front_side setting"),
    show_reading: db::get_show_reading(conn).log_warn_default("reading show_reading setting"),
  }
}

fn front_faces(card: &Card, config: &FaceConfig) -> (String, Option<String>) {
  match config.front_side {
    FrontSide::Expression => {
      let reading = if config.show_reading {
        card.reading.clone()
      } else {
        None
      };
      (card.expression.clone(), reading)
    }
    FrontSide::Translation => (card.translation.clone(), None),
  }
}

fn resolve_card(conn: &Connection, id: i64) -> Option<Card> {
  db::get_card_by_id(conn, id)
    .log_warn("resolving session card")
    .flatten()
}

/// Render the current card's front, persisting the (possibly advanced)
/// session, or finish the run when the queue is drained.
fn render_session_front(conn: &Connection, sid: &str, mut session: StudySession) -> Html<String> {
  match session.current_card(|id| resolve_card(conn, id)) {
    Ok(card) => {
      let config = face_config(conn);
      let (front, reading) = front_faces(&card, &config);
      let template = CardFrontTemplate {
        card_id: card.id,
        front,
        reading,
        status: card.status().label(),
        position: session.position(),
        total: session.queue_len(),
      };
      let html = Html(template.render().unwrap_or_default());
      session::store_session(sid, session);
      html
    }
    Err(_) => {
      session::clear_session(sid);
      Html(SessionDoneTemplate {}.render().unwrap_or_default())
    }
  }
}

pub async fn study_menu(State(pool): State<DbPool>) -> Html<String> {
  let Ok(conn) = db::try_lock(&pool) else {
    return render_error("Database unavailable");
  };

  let template = StudyMenuTemplate {
    due_count: db::get_due_count(&conn).log_warn_default("counting due cards"),
    total_cards: db::get_total_stats(&conn)
      .log_warn_default("reading totals")
      .0,
    topics: db::list_topics(&conn).log_warn_default("listing topics"),
  };
  Html(template.render().unwrap_or_default())
}

#[derive(Deserialize)]
pub struct StartParams {
  pub scope: String,
  pub topic: Option<String>,
}

pub async fn study_start(
  State(pool): State<DbPool>,
  jar: CookieJar,
  Query(params): Query<StartParams>,
) -> impl IntoResponse {
  let (jar, sid) = ensure_session_id(jar);

  let Ok(conn) = db::try_lock(&pool) else {
    return (jar, render_error("Database unavailable"));
  };

  let Some(scope) = StudyScope::from_query(&params.scope, params.topic.clone()) else {
    return (jar, render_error("Unknown study scope"));
  };

  let ids = db::list_card_ids(&conn, &scope).log_warn_default("listing cards for new session");
  match StudySession::start(ids, true) {
    Ok(new_session) => (jar, render_session_front(&conn, &sid, new_session)),
    Err(SessionError::EmptySelection) => {
      (jar, Html(NoCardsTemplate {}.render().unwrap_or_default()))
    }
    Err(e) => (jar, render_error(&e.to_string())),
  }
}

#[derive(Deserialize)]
pub struct FlipForm {
  pub card_id: i64,
}

pub async fn flip_card(
  State(pool): State<DbPool>,
  jar: CookieJar,
  Form(form): Form<FlipForm>,
) -> Html<String> {
  let Some(sid) = session_id(&jar) else {
    return render_error("No active study session. Pick a study mode to begin.");
  };
  let Some(mut active) = session::load_session(&sid) else {
    return render_error("No active study session. Pick a study mode to begin.");
  };
  let Ok(conn) = db::try_lock(&pool) else {
    return render_error("Database unavailable");
  };

  match active.current_card(|id| resolve_card(&conn, id)) {
    Ok(card) => {
      if card.id != form.card_id {
        // Stale flip from an old tab; show the card the queue is actually at
        tracing::warn!(got = form.card_id, current = card.id, "flip for a non-current card");
      }
      let config = face_config(&conn);
      let (front, _) = front_faces(&card, &config);
      let back = match config.front_side {
        FrontSide::Expression => card.translation.clone(),
        FrontSide::Translation => card.expression.clone(),
      };
      let template = CardBackTemplate {
        card_id: card.id,
        front,
        reading: card.reading.clone(),
        back,
        status: card.status().label(),
        position: active.position(),
        total: active.queue_len(),
      };
      let html = Html(template.render().unwrap_or_default());
      session::store_session(&sid, active);
      html
    }
    Err(_) => {
      session::clear_session(&sid);
      Html(SessionDoneTemplate {}.render().unwrap_or_default())
    }
  }
}

#[derive(Deserialize)]
pub struct ReviewForm {
  pub card_id: i64,
  pub quality: u8,
}

pub async fn submit_review(
  State(pool): State<DbPool>,
  jar: CookieJar,
  Form(form): Form<ReviewForm>,
) -> Html<String> {
  let Some(quality) = ReviewQuality::from_u8(form.quality) else {
    return render_error("Invalid quality grade");
  };
  let Some(sid) = session_id(&jar) else {
    return render_error("No active study session. Pick a study mode to begin.");
  };
  let Some(mut active) = session::load_session(&sid) else {
    return render_error("No active study session. Pick a study mode to begin.");
  };
  let Ok(conn) = db::try_lock(&pool) else {
    return render_error("Database unavailable");
  };

  match active.grade(form.card_id, quality) {
    Ok(decision) => {
      if decision.reschedule {
        if let Some(card) = resolve_card(&conn, form.card_id) {
          let result = srs::calculate_sm2(
            quality,
            card.ease_factor,
            card.interval_days,
            card.repetitions,
            Utc::now(),
          );
          db::update_card_after_review(
            &conn,
            card.id,
            result.ease_factor,
            result.interval_days,
            result.repetitions,
            result.next_review,
            quality.is_passing(),
          )
          .log_warn("persisting rescheduled card");
        }
      } else {
        db::bump_review_counters(&conn, form.card_id, quality.is_passing())
          .log_warn("bumping review counters");
      }
      db::insert_review_log(&conn, &ReviewLog::new(form.card_id, quality))
        .log_warn("logging review");

      render_session_front(&conn, &sid, active)
    }
    Err(SessionError::Exhausted) => {
      session::clear_session(&sid);
      Html(SessionDoneTemplate {}.render().unwrap_or_default())
    }
    Err(e) => {
      // Desync: the grade referenced the wrong queue slot. Abort, never guess.
      tracing::error!("aborting study session: {}", e);
      session::clear_session(&sid);
      render_error("The study session got out of sync and was ended. Start a new one.")
    }
  }
}

// Classic mode: no queue, reveal and rate the oldest due card

#[derive(Template)]
#[template(path = "classic.html")]
pub struct ClassicTemplate {
  pub has_card: bool,
  pub card_id: i64,
  pub expression: String,
  pub reading: Option<String>,
  pub translation: String,
  pub status: &'static str,
  pub due_count: i64,
}

fn render_classic(conn: &Connection) -> Html<String> {
  let cards = db::get_due_cards(conn, 1).log_warn_default("fetching due cards");
  let due_count = db::get_due_count(conn).log_warn_default("counting due cards");

  let template = match cards.into_iter().next() {
    Some(card) => ClassicTemplate {
      has_card: true,
      card_id: card.id,
      expression: card.expression,
      reading: card.reading,
      translation: card.translation,
      status: crate::domain::CardStatus::from_repetitions(card.repetitions).label(),
      due_count,
    },
    None => ClassicTemplate {
      has_card: false,
      card_id: 0,
      expression: String::new(),
      reading: None,
      translation: String::new(),
      status: "",
      due_count: 0,
    },
  };
  Html(template.render().unwrap_or_default())
}

pub async fn classic_start(State(pool): State<DbPool>) -> Html<String> {
  let Ok(conn) = db::try_lock(&pool) else {
    return render_error("Database unavailable");
  };
  render_classic(&conn)
}

pub async fn submit_classic_review(
  State(pool): State<DbPool>,
  Form(form): Form<ReviewForm>,
) -> Html<String> {
  let Some(quality) = ReviewQuality::from_u8(form.quality) else {
    return render_error("Invalid quality grade");
  };
  let Ok(conn) = db::try_lock(&pool) else {
    return render_error("Database unavailable");
  };

  if let Some(card) = resolve_card(&conn, form.card_id) {
    let result = srs::calculate_sm2(
      quality,
      card.ease_factor,
      card.interval_days,
      card.repetitions,
      Utc::now(),
    );
    db::update_card_after_review(
      &conn,
      card.id,
      result.ease_factor,
      result.interval_days,
      result.repetitions,
      result.next_review,
      quality.is_passing(),
    )
    .log_warn("persisting classic review");
    db::insert_review_log(&conn, &ReviewLog::new(card.id, quality)).log_warn("logging review");
  }

  render_classic(&conn)
}
