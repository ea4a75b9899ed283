//! Card collection management: list, add, delete.

use askama::Template;
use axum::{
  extract::State,
  response::{Html, IntoResponse, Redirect, Response},
  Form,
};
use chrono::Utc;
use serde::Deserialize;

use crate::db::{self, DbPool, LogOnError};
use crate::domain::Card;

use super::render_error;

pub struct CardRow {
  pub id: i64,
  pub expression: String,
  pub reading: Option<String>,
  pub translation: String,
  pub topic: String,
  pub status: &'static str,
  pub due: bool,
}

#[derive(Template)]
#[template(path = "cards.html")]
pub struct CardListTemplate {
  pub cards: Vec<CardRow>,
}

pub async fn card_list(State(pool): State<DbPool>) -> Html<String> {
  let Ok(conn) = db::try_lock(&pool) else {
    return render_error("Database unavailable");
  };

  let now = Utc::now();
  let cards = db::get_all_cards(&conn)
    .log_warn_default("listing cards")
    .into_iter()
    .map(|card| CardRow {
      id: card.id,
      status: card.status().label(),
      due: card.is_due(now),
      expression: card.expression,
      reading: card.reading,
      translation: card.translation,
      topic: card.topic,
    })
    .collect();

  let template = CardListTemplate { cards };
  Html(template.render().unwrap_or_default())
}

#[derive(Template)]
#[template(path = "add_card.html")]
pub struct AddCardTemplate {}

pub async fn new_card_form() -> Html<String> {
  Html(AddCardTemplate {}.render().unwrap_or_default())
}

#[derive(Deserialize)]
pub struct NewCardForm {
  pub expression: String,
  #[serde(default)]
  pub reading: String,
  pub translation: String,
  #[serde(default)]
  pub topic: String,
}

pub async fn create_card(State(pool): State<DbPool>, Form(form): Form<NewCardForm>) -> Response {
  let expression = form.expression.trim().to_string();
  let translation = form.translation.trim().to_string();
  if expression.is_empty() || translation.is_empty() {
    return render_error("A card needs both an expression and a translation").into_response();
  }

  let reading = form.reading.trim();
  let topic = form.topic.trim();
  let card = Card::new(
    expression,
    (!reading.is_empty()).then(|| reading.to_string()),
    translation,
    (!topic.is_empty()).then(|| topic.to_string()),
  );

  let Ok(conn) = db::try_lock(&pool) else {
    return render_error("Database unavailable").into_response();
  };
  match db::insert_card(&conn, &card) {
    Ok(id) => {
      tracing::debug!(card_id = id, "card added");
      Redirect::to("/cards").into_response()
    }
    Err(e) => {
      tracing::warn!("inserting card failed: {}", e);
      render_error("Could not save the card").into_response()
    }
  }
}

#[derive(Deserialize)]
pub struct DeleteCardForm {
  pub card_id: i64,
}

pub async fn delete_card(
  State(pool): State<DbPool>,
  Form(form): Form<DeleteCardForm>,
) -> Response {
  let Ok(conn) = db::try_lock(&pool) else {
    return render_error("Database unavailable").into_response();
  };

  if !db::delete_card(&conn, form.card_id).log_warn_default("deleting card") {
    tracing::debug!(card_id = form.card_id, "delete for a card that was already gone");
  }
  Redirect::to("/cards").into_response()
}
