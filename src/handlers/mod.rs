pub mod cards;
pub mod progress;
pub mod settings;
pub mod study;
pub mod transfer;

use askama::Template;
use axum::{
  extract::State,
  response::Html,
  routing::{get, post},
  Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{DateTime, Utc};
use tower_http::trace::TraceLayer;

use crate::db::{self, DbPool, LogOnError};

/// Cookie carrying the per-browser study-session id
pub const SESSION_COOKIE: &str = "kioku_session";

pub fn router(pool: DbPool) -> Router {
  Router::new()
    .route("/", get(index))
    .route("/study", get(study::study_menu))
    .route("/study/start", get(study::study_start))
    .route("/study/flip", post(study::flip_card))
    .route("/study/review", post(study::submit_review))
    .route("/classic", get(study::classic_start))
    .route("/classic/review", post(study::submit_classic_review))
    .route("/cards", get(cards::card_list).post(cards::create_card))
    .route("/cards/new", get(cards::new_card_form))
    .route("/cards/delete", post(cards::delete_card))
    .route("/export", get(transfer::export_csv))
    .route("/import", get(transfer::import_page))
    .route("/import/file", post(transfer::import_file))
    .route("/import/text", post(transfer::import_text))
    .route("/progress", get(progress::progress))
    .route(
      "/settings",
      get(settings::settings_page).post(settings::update_settings),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(pool)
}

/// Session id from the cookie, if the browser already has one
pub(crate) fn session_id(jar: &CookieJar) -> Option<String> {
  jar.get(SESSION_COOKIE).map(|c| c.value().to_string())
}

/// Session id, minting a new cookie when absent
pub(crate) fn ensure_session_id(jar: CookieJar) -> (CookieJar, String) {
  if let Some(id) = session_id(&jar) {
    return (jar, id);
  }
  let id = crate::session::generate_session_id();
  let cookie = Cookie::build((SESSION_COOKIE, id.clone())).path("/").build();
  (jar.add(cookie), id)
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
  pub message: String,
}

pub(crate) fn render_error(message: &str) -> Html<String> {
  let template = ErrorTemplate {
    message: message.to_string(),
  };
  Html(template.render().unwrap_or_default())
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
  pub due_count: i64,
  pub total_cards: i64,
  pub cards_learned: i64,
  pub next_review: Option<String>,
}

fn format_relative_time(dt: DateTime<Utc>) -> String {
  let now = Utc::now();
  let duration = dt.signed_duration_since(now);

  let minutes = duration.num_minutes();
  let hours = duration.num_hours();
  let days = duration.num_days();

  if minutes < 1 {
    "now".to_string()
  } else if minutes < 60 {
    format!("in {} minute{}", minutes, if minutes == 1 { "" } else { "s" })
  } else if hours < 24 {
    format!("in {} hour{}", hours, if hours == 1 { "" } else { "s" })
  } else if days == 1 {
    "tomorrow".to_string()
  } else {
    format!("in {} days", days)
  }
}

pub async fn index(State(pool): State<DbPool>) -> Html<String> {
  let Ok(conn) = db::try_lock(&pool) else {
    return render_error("Database unavailable");
  };

  let due_count = db::get_due_count(&conn).log_warn_default("counting due cards");
  let (total_cards, _) = db::get_total_stats(&conn).log_warn_default("reading totals");
  let breakdown = db::get_status_breakdown(&conn).log_warn_default("reading status breakdown");

  let next_review = if due_count == 0 {
    db::get_next_review_time(&conn)
      .ok()
      .flatten()
      .map(format_relative_time)
  } else {
    None
  };

  let template = IndexTemplate {
    due_count,
    total_cards,
    cards_learned: breakdown.learned,
    next_review,
  };

  Html(template.render().unwrap_or_default())
}
