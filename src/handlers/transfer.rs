//! CSV import and export.
//!
//! Rows are headerless on the way in: `expression,translation`,
//! `expression,reading,translation` or `expression,reading,translation,topic`.
//! Export writes a header row, which import recognizes and skips, so a file
//! can round-trip.

use askama::Template;
use axum::{
  extract::{Multipart, State},
  http::header,
  response::{Html, IntoResponse, Response},
  Form,
};
use serde::Deserialize;

use crate::db::{self, DbPool, LogOnError};
use crate::domain::Card;

use super::render_error;

const EXPORT_HEADER: [&str; 4] = ["expression", "reading", "translation", "topic"];

pub async fn export_csv(State(pool): State<DbPool>) -> Response {
  let Ok(conn) = db::try_lock(&pool) else {
    return render_error("Database unavailable").into_response();
  };

  let cards = db::get_all_cards(&conn).log_warn_default("exporting cards");

  let mut writer = csv::Writer::from_writer(Vec::new());
  writer
    .write_record(EXPORT_HEADER)
    .log_warn("writing CSV header");
  for card in &cards {
    writer
      .write_record([
        card.expression.as_str(),
        card.reading.as_deref().unwrap_or(""),
        card.translation.as_str(),
        card.topic.as_str(),
      ])
      .log_warn("writing CSV row");
  }

  let data = match writer.into_inner() {
    Ok(data) => data,
    Err(e) => {
      tracing::warn!("finalizing CSV export failed: {}", e);
      return render_error("Export failed").into_response();
    }
  };

  (
    [
      (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
      (
        header::CONTENT_DISPOSITION,
        "attachment; filename=\"kioku_cards.csv\"",
      ),
    ],
    data,
  )
    .into_response()
}

#[derive(Template)]
#[template(path = "import.html")]
pub struct ImportTemplate {
  pub imported: Option<usize>,
}

pub async fn import_page() -> Html<String> {
  Html(ImportTemplate { imported: None }.render().unwrap_or_default())
}

pub async fn import_file(State(pool): State<DbPool>, mut multipart: Multipart) -> Html<String> {
  let mut data = Vec::new();
  while let Ok(Some(field)) = multipart.next_field().await {
    if field.name() == Some("file") {
      match field.bytes().await {
        Ok(bytes) => {
          data = bytes.to_vec();
          break;
        }
        Err(e) => tracing::warn!("reading uploaded file failed: {}", e),
      }
    }
  }

  if data.is_empty() {
    return render_error("No CSV file was uploaded");
  }
  import_records(&pool, &data)
}

#[derive(Deserialize)]
pub struct ImportTextForm {
  pub text: String,
}

pub async fn import_text(
  State(pool): State<DbPool>,
  Form(form): Form<ImportTextForm>,
) -> Html<String> {
  import_records(&pool, form.text.as_bytes())
}

fn import_records(pool: &DbPool, data: &[u8]) -> Html<String> {
  let Ok(conn) = db::try_lock(pool) else {
    return render_error("Database unavailable");
  };

  let cards = parse_cards(data);
  let mut imported = 0;
  for card in &cards {
    if db::insert_card(&conn, card).log_warn("importing card").is_some() {
      imported += 1;
    }
  }
  tracing::info!(imported, "CSV import finished");

  Html(
    ImportTemplate {
      imported: Some(imported),
    }
    .render()
    .unwrap_or_default(),
  )
}

fn parse_cards(data: &[u8]) -> Vec<Card> {
  let mut reader = csv::ReaderBuilder::new()
    .has_headers(false)
    .flexible(true)
    .trim(csv::Trim::All)
    .from_reader(data);

  let mut cards = Vec::new();
  for record in reader.records() {
    let record = match record {
      Ok(record) => record,
      Err(e) => {
        tracing::warn!("skipping malformed CSV row: {}", e);
        continue;
      }
    };

    let fields: Vec<&str> = record.iter().collect();
    let (expression, reading, translation, topic) = match fields.as_slice() {
      [expression, translation] => (*expression, "", *translation, ""),
      [expression, reading, translation] => (*expression, *reading, *translation, ""),
      [expression, reading, translation, topic, ..] => {
        (*expression, *reading, *translation, *topic)
      }
      _ => continue,
    };

    if expression.is_empty() || translation.is_empty() {
      continue;
    }
    // Header row from a previous export
    if expression == EXPORT_HEADER[0] && translation == EXPORT_HEADER[2] {
      continue;
    }

    cards.push(Card::new(
      expression.to_string(),
      (!reading.is_empty()).then(|| reading.to_string()),
      translation.to_string(),
      (!topic.is_empty()).then(|| topic.to_string()),
    ));
  }
  cards
}
