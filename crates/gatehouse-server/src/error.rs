//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  #[error("not found")]
  NotFound,
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error(transparent)]
  Auth(#[from] gatehouse_core::Error),
  #[error("session encoding error: {0}")]
  Session(#[from] SessionError),
}

impl Error {
  fn status(&self) -> StatusCode {
    use gatehouse_core::Error as Core;
    match self {
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::NotFound => StatusCode::NOT_FOUND,
      Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::Auth(Core::Billing(_) | Core::Mail(_)) => StatusCode::BAD_GATEWAY,
      Error::Auth(Core::Store(_) | Core::PasswordHash(_)) => StatusCode::INTERNAL_SERVER_ERROR,
      Error::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      Error::Unauthorized => "CredentialsSignin".to_string(),
      other => other.to_string(),
    };
    if status.is_server_error() {
      tracing::error!(error = %self, %status, "request failed");
    }
    (status, Json(json!({ "error": message }))).into_response()
  }
}
