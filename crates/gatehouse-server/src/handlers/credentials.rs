//! `POST /auth/signin/credentials`

use axum::{Json, extract::State, response::Response};
use chrono::Utc;
use gatehouse_core::{
  store::{AccountStore, VerificationStore},
  verification::Mailer,
};
use serde::Deserialize;

use crate::{AppState, error::Error};

#[derive(Deserialize)]
pub struct CredentialsForm {
  /// Username, or a verified email when email sign-in is enabled.
  pub username: String,
  pub password: String,
}

pub async fn sign_in<S, M>(
  State(state): State<AppState<S, M>>,
  Json(form): Json<CredentialsForm>,
) -> Result<Response, Error>
where
  S: AccountStore + VerificationStore + Clone + 'static,
  M: Mailer + Clone + 'static,
{
  let account = state
    .verifier
    .verify(&form.username, &form.password)
    .await?
    .ok_or(Error::Unauthorized)?;

  let now = Utc::now();
  let token = state.lifecycle.issue(account, now).await?;
  tracing::info!(account_id = ?token.id, "signed in with credentials");
  state.session_response(&token, now)
}
