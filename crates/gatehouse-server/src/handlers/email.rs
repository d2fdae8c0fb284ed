//! Email link sign-in: `POST /auth/signin/email` and
//! `GET /auth/callback/email`.

use axum::{
  Json,
  extract::{Query, State},
  http::header,
  response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use gatehouse_core::{
  store::{AccountStore, VerificationStore},
  verification::Mailer,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{AppState, auth, error::Error};

#[derive(Deserialize)]
pub struct LinkRequest {
  pub email: String,
}

#[derive(Deserialize)]
pub struct CallbackParams {
  pub token: String,
  pub email: String,
}

pub async fn request_link<S, M>(
  State(state): State<AppState<S, M>>,
  Json(body): Json<LinkRequest>,
) -> Result<Json<Value>, Error>
where
  S: AccountStore + VerificationStore + Clone + 'static,
  M: Mailer + Clone + 'static,
{
  let dispatcher = state.dispatcher.as_ref().ok_or(Error::NotFound)?;

  let email = body.email.trim();
  if email.is_empty() || !email.contains('@') {
    return Err(Error::BadRequest("a valid email address is required".into()));
  }

  let now = Utc::now();
  match state.store.purge_expired(now).await {
    Ok(0) => {}
    Ok(purged) => tracing::debug!(purged, "removed expired verification tokens"),
    Err(e) => tracing::warn!(error = %e, "failed to purge expired verification tokens"),
  }

  dispatcher.dispatch(email, now).await?;
  Ok(Json(json!({ "url": state.settings.pages.verify_request })))
}

pub async fn callback<S, M>(
  State(state): State<AppState<S, M>>,
  Query(params): Query<CallbackParams>,
) -> Result<Response, Error>
where
  S: AccountStore + VerificationStore + Clone + 'static,
  M: Mailer + Clone + 'static,
{
  let dispatcher = state.dispatcher.as_ref().ok_or(Error::NotFound)?;
  let now = Utc::now();

  let Some(account) = dispatcher.redeem(&params.email, &params.token, now).await? else {
    let target = format!("{}?error=Verification", state.settings.pages.sign_in);
    return Ok(Redirect::to(&target).into_response());
  };

  let token = state.lifecycle.issue(account, now).await?;
  let (jwt, _) = state.codec.encode(&token, now)?;
  let cookie = auth::session_cookie(&jwt, state.config.secure_cookies())?;
  tracing::info!(account_id = ?token.id, "signed in with email link");

  Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response())
}
