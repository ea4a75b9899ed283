use askama::Template;
use axum::{
  extract::State,
  response::{Html, IntoResponse, Redirect, Response},
  Form,
};
use serde::Deserialize;

use crate::db::{self, DbPool, LogOnError};
use crate::domain::FrontSide;

use super::render_error;

#[derive(Template)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
  pub front_side: &'static str,
  pub show_reading: bool,
}

pub async fn settings_page(State(pool): State<DbPool>) -> Html<String> {
  let Ok(conn) = db::try_lock(&pool) else {
    return render_error("Database unavailable");
  };

  let template = SettingsTemplate {
    front_side: db::get_front_side(&conn)
      .log_warn_default("reading front_side setting")
      .as_str(),
    show_reading: db::get_show_reading(&conn).log_warn_default("reading show_reading setting"),
  };
  Html(template.render().unwrap_or_default())
}

#[derive(Deserialize)]
pub struct SettingsForm {
  pub front_side: String,
  #[serde(default)]
  pub show_reading: Option<String>,
}

pub async fn update_settings(
  State(pool): State<DbPool>,
  Form(form): Form<SettingsForm>,
) -> Response {
  let Ok(conn) = db::try_lock(&pool) else {
    return render_error("Database unavailable").into_response();
  };

  let side = FrontSide::from_str(&form.front_side).unwrap_or_default();
  db::set_front_side(&conn, side).log_warn("saving front_side setting");
  db::set_show_reading(&conn, form.show_reading.is_some())
    .log_warn("saving show_reading setting");

  Redirect::to("/settings").into_response()
}
