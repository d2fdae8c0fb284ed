//! Session token claims, refresh events and the outward session view.
//!
//! The token is the only place entitlement is cached between requests. The
//! view is derived from it on every read and never stored.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::account::{Account, AccountId};

/// Fixed maximum age of a session token.
pub const SESSION_MAX_AGE: Duration = Duration::days(30);

// ─── Token ───────────────────────────────────────────────────────────────────

/// Claims carried inside the signed session token.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
  #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
  pub id:                       Option<AccountId>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub username:                 Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name:                     Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email:                    Option<String>,
  #[serde(default)]
  pub is_subscriber:            bool,
  /// Epoch seconds; present only while a cancellation is on record.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subscription_canceled_at: Option<i64>,
}

impl SessionToken {
  /// The default identity claims for a fresh sign-in, before the sign-in
  /// refresh stamps `id` and `username`.
  pub fn seeded(account: &Account) -> Self {
    Self {
      name: account.name.clone(),
      email: account.email.as_deref().map(str::to_lowercase),
      ..Self::default()
    }
  }
}

/// Accept the account id as either a JSON number or a numeric string.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<AccountId>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Raw {
    Number(AccountId),
    Text(String),
  }

  match Option::<Raw>::deserialize(deserializer)? {
    None => Ok(None),
    Some(Raw::Number(n)) => Ok(Some(n)),
    Some(Raw::Text(s)) => s
      .trim()
      .parse()
      .map(Some)
      .map_err(serde::de::Error::custom),
  }
}

// ─── Refresh events ──────────────────────────────────────────────────────────

/// Why the token is being refreshed.
#[derive(Debug, Clone)]
pub enum TokenRefreshEvent {
  /// A new sign-in for the freshly authenticated account.
  SignIn(Account),
  /// The client asked for its session to be reloaded (e.g. after a profile
  /// edit).
  ExplicitUpdate,
  /// An ordinary request carrying an existing token.
  PeriodicRefresh,
}

impl TokenRefreshEvent {
  /// Sign-in and update are explicit triggers; they always re-check
  /// entitlement when billing is configured.
  pub fn is_explicit(&self) -> bool { !matches!(self, Self::PeriodicRefresh) }

  pub fn kind(&self) -> &'static str {
    match self {
      Self::SignIn(_) => "sign_in",
      Self::ExplicitUpdate => "update",
      Self::PeriodicRefresh => "refresh",
    }
  }
}

// ─── Session view ────────────────────────────────────────────────────────────

/// The user half of a [`SessionView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
  pub id:            Option<AccountId>,
  pub username:      Option<String>,
  pub name:          Option<String>,
  pub email:         Option<String>,
  pub is_subscriber: bool,
}

/// The session as exposed to clients. Derived on every read, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
  pub user:    SessionUser,
  pub expires: DateTime<Utc>,
}

impl SessionView {
  /// Project `token` onto the outward session shape. Pure and total.
  pub fn project(token: &SessionToken, expires: DateTime<Utc>) -> Self {
    Self {
      user: SessionUser {
        id:            token.id,
        username:      token.username.clone(),
        name:          token.name.clone(),
        email:         token.email.clone(),
        is_subscriber: token.is_subscriber,
      },
      expires,
    }
  }
}
