use askama::Template;
use axum::{extract::State, response::Html};
use chrono::{Duration, Utc};

use crate::db::{self, DbPool, LogOnError, StatusBreakdown, TopicProgress};

use super::render_error;

#[derive(Template)]
#[template(path = "progress.html")]
pub struct ProgressTemplate {
  pub breakdown: StatusBreakdown,
  pub topics: Vec<TopicProgress>,
  pub total_cards: i64,
  pub total_reviews: i64,
  pub due_count: i64,
  pub reviews_24h: i64,
}

pub async fn progress(State(pool): State<DbPool>) -> Html<String> {
  let Ok(conn) = db::try_lock(&pool) else {
    return render_error("Database unavailable");
  };

  let (total_cards, total_reviews) =
    db::get_total_stats(&conn).log_warn_default("reading totals");

  let template = ProgressTemplate {
    breakdown: db::get_status_breakdown(&conn).log_warn_default("reading status breakdown"),
    topics: db::get_progress_by_topic(&conn).log_warn_default("reading topic progress"),
    total_cards,
    total_reviews,
    due_count: db::get_due_count(&conn).log_warn_default("counting due cards"),
    reviews_24h: db::count_reviews_since(&conn, Utc::now() - Duration::hours(24))
      .log_warn_default("counting recent reviews"),
  };

  Html(template.render().unwrap_or_default())
}
