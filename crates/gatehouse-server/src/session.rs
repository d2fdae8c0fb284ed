//! Signed transport for [`SessionToken`]s.
//!
//! Tokens travel as HS256 JWTs. Each encode stamps a fresh `iat`, `exp` and
//! `jti`, so a token's lifetime rolls forward every time it is refreshed.
//! Expiry is checked against the caller's clock, not the library's.

use chrono::{DateTime, Utc};
use gatehouse_core::token::{SESSION_MAX_AGE, SessionToken};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Everything inside the JWT: the session claims plus registered claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  #[serde(flatten)]
  pub token: SessionToken,
  pub iat:   i64,
  pub exp:   i64,
  pub jti:   String,
}

#[derive(Debug, Error)]
pub enum SessionError {
  #[error("malformed or forged session token: {0}")]
  Invalid(#[from] jsonwebtoken::errors::Error),
  #[error("session token expired at {0}")]
  Expired(i64),
  #[error("session cookie is not a valid header value: {0}")]
  Cookie(#[from] axum::http::header::InvalidHeaderValue),
}

pub struct SessionCodec {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  header:     Header,
  validation: Validation,
}

impl SessionCodec {
  pub fn new(secret: &str) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;

    Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
      header: Header::new(Algorithm::HS256),
      validation,
    }
  }

  /// Sign `token`. Returns the JWT and the moment it stops being accepted.
  pub fn encode(
    &self,
    token: &SessionToken,
    now: DateTime<Utc>,
  ) -> Result<(String, DateTime<Utc>), SessionError> {
    let expires = now + SESSION_MAX_AGE;
    let claims = Claims {
      token: token.clone(),
      iat:   now.timestamp(),
      exp:   expires.timestamp(),
      jti:   Uuid::new_v4().to_string(),
    };
    let jwt = encode(&self.header, &claims, &self.encoding)?;
    Ok((jwt, expires))
  }

  /// Verify the signature and expiry of `jwt` as of `now`.
  pub fn decode(&self, jwt: &str, now: DateTime<Utc>) -> Result<Claims, SessionError> {
    let claims = decode::<Claims>(jwt, &self.decoding, &self.validation)?.claims;
    if now.timestamp() >= claims.exp {
      return Err(SessionError::Expired(claims.exp));
    }
    Ok(claims)
  }
}
