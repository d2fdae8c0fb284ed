//! `POST /auth/signout`

use axum::{
  Json,
  extract::State,
  http::header,
  response::{IntoResponse, Response},
};
use gatehouse_core::{
  store::{AccountStore, VerificationStore},
  verification::Mailer,
};
use serde_json::json;

use crate::{AppState, auth, error::Error};

pub async fn handler<S, M>(State(state): State<AppState<S, M>>) -> Result<Response, Error>
where
  S: AccountStore + VerificationStore + Clone + 'static,
  M: Mailer + Clone + 'static,
{
  let clear = auth::clear_session_cookie(state.config.secure_cookies())?;
  Ok(
    (
      [(header::SET_COOKIE, clear)],
      Json(json!({ "url": state.settings.pages.sign_in })),
    )
      .into_response(),
  )
}
