//! `GET /auth/session` (periodic refresh) and `POST /auth/session`
//! (explicit update).

use axum::{
  Json,
  extract::State,
  http::header,
  response::{IntoResponse, Response},
};
use chrono::Utc;
use gatehouse_core::{
  store::{AccountStore, VerificationStore},
  token::{SessionView, TokenRefreshEvent},
  verification::Mailer,
};

use crate::{
  AppState,
  auth::{self, SessionCookie},
  error::Error,
};

pub async fn read<S, M>(
  State(state): State<AppState<S, M>>,
  cookie: SessionCookie,
) -> Result<Response, Error>
where
  S: AccountStore + VerificationStore + Clone + 'static,
  M: Mailer + Clone + 'static,
{
  let claims = match cookie {
    SessionCookie::Valid(claims) => claims,
    SessionCookie::Missing => return Ok(Json(None::<SessionView>).into_response()),
    SessionCookie::Invalid => {
      let clear = auth::clear_session_cookie(state.config.secure_cookies())?;
      return Ok(([(header::SET_COOKIE, clear)], Json(None::<SessionView>)).into_response());
    }
  };

  let now = Utc::now();
  let token = state
    .lifecycle
    .refresh(claims.token, TokenRefreshEvent::PeriodicRefresh, now)
    .await?;
  state.session_response(&token, now)
}

pub async fn update<S, M>(
  State(state): State<AppState<S, M>>,
  cookie: SessionCookie,
) -> Result<Response, Error>
where
  S: AccountStore + VerificationStore + Clone + 'static,
  M: Mailer + Clone + 'static,
{
  let SessionCookie::Valid(claims) = cookie else {
    return Err(Error::Unauthorized);
  };

  let now = Utc::now();
  let token = state
    .lifecycle
    .refresh(claims.token, TokenRefreshEvent::ExplicitUpdate, now)
    .await?;
  tracing::debug!(account_id = ?token.id, "session explicitly refreshed");
  state.session_response(&token, now)
}
