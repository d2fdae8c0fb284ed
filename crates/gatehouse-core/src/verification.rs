//! Verification Dispatcher: single-use email sign-in links.
//!
//! A link carries a random token. Only `sha256(token ++ secret)` is stored,
//! alongside the address it was sent to and an expiry 1200 seconds after
//! issue. Redeeming a link deletes the stored row whether or not the link is
//! still valid.

use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::{
  Error, Result,
  account::Account,
  store::{AccountStore, VerificationStore},
};

/// Maximum age of a verification link.
pub const VERIFICATION_MAX_AGE: Duration = Duration::seconds(1200);

/// A stored, not yet redeemed verification token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationToken {
  pub identifier: String,
  pub token_hash: String,
  pub expires_at: DateTime<Utc>,
}

/// What the mailer is asked to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
  pub identifier: String,
  pub url:        String,
  pub expires_at: DateTime<Utc>,
}

/// Out-of-band delivery of verification links.
pub trait Mailer: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn send<'a>(
    &'a self,
    request: &'a VerificationRequest,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

pub struct VerificationDispatcher<S, M> {
  store:    S,
  mailer:   M,
  base_url: String,
  secret:   String,
}

impl<S, M> VerificationDispatcher<S, M>
where
  S: AccountStore + VerificationStore,
  M: Mailer,
{
  /// `base_url` is the public origin the callback route is served from;
  /// `secret` salts the stored token hashes.
  pub fn new(
    store: S,
    mailer: M,
    base_url: impl Into<String>,
    secret: impl Into<String>,
  ) -> Self {
    Self { store, mailer, base_url: base_url.into(), secret: secret.into() }
  }

  /// Issue a link for `email` and hand it to the mailer. Delivery is not
  /// retried; store and mailer failures propagate.
  ///
  /// Addresses no account holds get nothing: no token is stored and no mail
  /// is sent, but the call still succeeds.
  pub async fn dispatch(&self, email: &str, now: DateTime<Utc>) -> Result<()> {
    let identifier = email.trim().to_lowercase();

    let known = self
      .store
      .find_by_email(&identifier)
      .await
      .map_err(Error::store)?
      .is_some();
    if !known {
      tracing::debug!(%identifier, "no account for address; not sending a link");
      return Ok(());
    }

    let token      = generate_token();
    let expires_at = now + VERIFICATION_MAX_AGE;

    self
      .store
      .create_verification(VerificationToken {
        identifier: identifier.clone(),
        token_hash: self.hash_token(&token),
        expires_at,
      })
      .await
      .map_err(Error::store)?;

    let url = format!(
      "{}/auth/callback/email?token={}&email={}",
      self.base_url.trim_end_matches('/'),
      token,
      urlencoding::encode(&identifier),
    );

    let request = VerificationRequest { identifier, url, expires_at };
    self.mailer.send(&request).await.map_err(Error::mail)?;

    tracing::info!(identifier = %request.identifier, %expires_at, "verification link sent");
    Ok(())
  }

  /// Consume a link. Returns the account it proves ownership of, or `None`
  /// if the token is unknown, already used, expired, or no account holds
  /// the address.
  pub async fn redeem(
    &self,
    email: &str,
    token: &str,
    now: DateTime<Utc>,
  ) -> Result<Option<Account>> {
    let identifier = email.trim().to_lowercase();
    let token_hash = self.hash_token(token);

    let Some(stored) = self
      .store
      .use_verification(&identifier, &token_hash)
      .await
      .map_err(Error::store)?
    else {
      tracing::debug!(%identifier, "unknown or already used verification token");
      return Ok(None);
    };

    if now > stored.expires_at {
      tracing::debug!(%identifier, expired_at = %stored.expires_at, "verification token expired");
      return Ok(None);
    }

    let Some(mut account) = self
      .store
      .find_by_email(&identifier)
      .await
      .map_err(Error::store)?
    else {
      tracing::debug!(%identifier, "no account for verified address");
      return Ok(None);
    };

    if account.email_verified.is_none() {
      self
        .store
        .mark_email_verified(account.id, now)
        .await
        .map_err(Error::store)?;
      account.email_verified = Some(now);
    }

    Ok(Some(account))
  }

  fn hash_token(&self, token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.update(self.secret.as_bytes());
    hex::encode(hasher.finalize())
  }
}

fn generate_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}
