//! Session cookie transport and the request extractor built on it.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, HeaderValue, header, request::Parts},
};
use chrono::Utc;
use gatehouse_core::{
  store::{AccountStore, VerificationStore},
  token::SESSION_MAX_AGE,
  verification::Mailer,
};

use crate::{
  AppState,
  session::{Claims, SessionError},
};

pub const SESSION_COOKIE: &str = "gatehouse.session-token";

/// Find a cookie by name in the request's `Cookie` headers.
pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|raw| raw.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(k, _)| *k == name)
    .map(|(_, v)| v.to_string())
}

/// `Set-Cookie` value carrying a freshly signed session.
pub fn session_cookie(jwt: &str, secure: bool) -> Result<HeaderValue, SessionError> {
  build_cookie(jwt, SESSION_MAX_AGE.num_seconds(), secure)
}

/// `Set-Cookie` value that removes the session from the browser.
pub fn clear_session_cookie(secure: bool) -> Result<HeaderValue, SessionError> {
  build_cookie("", 0, secure)
}

fn build_cookie(value: &str, max_age: i64, secure: bool) -> Result<HeaderValue, SessionError> {
  let mut cookie = format!(
    "{SESSION_COOKIE}={value}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age}"
  );
  if secure {
    cookie.push_str("; Secure");
  }
  Ok(HeaderValue::from_str(&cookie)?)
}

/// The session presented by the browser, if any.
pub enum SessionCookie {
  Missing,
  /// Present but forged, malformed, or expired.
  Invalid,
  Valid(Claims),
}

impl<S, M> FromRequestParts<AppState<S, M>> for SessionCookie
where
  S: AccountStore + VerificationStore + Clone + 'static,
  M: Mailer + Clone + 'static,
{
  type Rejection = std::convert::Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, M>,
  ) -> Result<Self, Self::Rejection> {
    let Some(raw) = parse_cookie(&parts.headers, SESSION_COOKIE).filter(|v| !v.is_empty()) else {
      return Ok(SessionCookie::Missing);
    };
    match state.codec.decode(&raw, Utc::now()) {
      Ok(claims) => Ok(SessionCookie::Valid(claims)),
      Err(e) => {
        tracing::debug!(error = %e, "discarding session cookie");
        Ok(SessionCookie::Invalid)
      }
    }
  }
}
