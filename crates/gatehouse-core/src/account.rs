//! The persisted identity record a session is minted for.
//!
//! Accounts are owned by the store. This crate only reads them, apart from
//! stamping the email-verification time when a magic link is redeemed.

use chrono::{DateTime, Utc};

pub type AccountId = i64;

/// An identity record as held by the account store.
///
/// `username` and `email` are always stored lowercase; lookups compare them
/// exactly, so callers normalise before querying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
  pub id:             AccountId,
  pub username:       String,
  pub name:           Option<String>,
  pub email:          Option<String>,
  pub email_verified: Option<DateTime<Utc>>,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`. `None` for
  /// accounts that only ever sign in by email link.
  pub password_hash:  Option<String>,
}

/// Input for creating an account. Identity fields are lowercased on
/// construction so every store sees the normalised form.
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub username:       String,
  pub name:           Option<String>,
  pub email:          Option<String>,
  pub email_verified: Option<DateTime<Utc>>,
  pub password_hash:  Option<String>,
}

impl NewAccount {
  pub fn new(username: &str) -> Self {
    Self {
      username:       username.to_lowercase(),
      name:           None,
      email:          None,
      email_verified: None,
      password_hash:  None,
    }
  }

  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  pub fn with_email(mut self, email: &str) -> Self {
    self.email = Some(email.to_lowercase());
    self
  }

  pub fn verified_at(mut self, at: DateTime<Utc>) -> Self {
    self.email_verified = Some(at);
    self
  }

  pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
    self.password_hash = Some(hash.into());
    self
  }
}
