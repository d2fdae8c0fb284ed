//! Persistence traits consumed by the authentication core.
//!
//! The traits are implemented by storage backends (e.g.
//! `gatehouse-store-sqlite`). Matching is exact and case-sensitive:
//! normalisation to lowercase is the caller's responsibility.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  account::{Account, AccountId},
  verification::VerificationToken,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`AccountStore::find_first`].
///
/// An account matches when `username == identifier`, or, with `match_email`
/// set, when `email == identifier`. With `require_verified_email` set the
/// account must additionally have a verification timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountQuery {
  pub identifier:             String,
  pub match_email:            bool,
  pub require_verified_email: bool,
}

impl AccountQuery {
  /// Plain username lookup with no verification requirement.
  pub fn username(identifier: impl Into<String>) -> Self {
    Self {
      identifier:             identifier.into(),
      match_email:            false,
      require_verified_email: false,
    }
  }

  /// Username-or-email lookup restricted to verified accounts.
  pub fn verified_login(identifier: impl Into<String>) -> Self {
    Self {
      identifier:             identifier.into(),
      match_email:            true,
      require_verified_email: true,
    }
  }

  /// Evaluate the query against an in-memory account. Backs the test store;
  /// SQL backends express the same predicate in their `WHERE` clause.
  #[cfg(test)]
  pub(crate) fn matches(&self, account: &Account) -> bool {
    let by_username = account.username == self.identifier;
    let by_email = self.match_email
      && account.email.as_deref() == Some(self.identifier.as_str());
    let verified =
      !self.require_verified_email || account.email_verified.is_some();
    (by_username || by_email) && verified
  }
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Read access to accounts, plus the one write the email flow needs.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait AccountStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return the first account matching `query`, if any.
  fn find_first<'a>(
    &'a self,
    query: &'a AccountQuery,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;

  /// Look an account up by primary key.
  fn find_unique(
    &self,
    id: AccountId,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  /// Look an account up by its (lowercase) email address.
  fn find_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;

  /// Record that the account's email address was proven reachable at `at`.
  fn mark_email_verified(
    &self,
    id: AccountId,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

/// Storage for outstanding email verification tokens.
pub trait VerificationStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a freshly issued token.
  fn create_verification(
    &self,
    token: VerificationToken,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Atomically remove and return the token, so it can be used only once.
  fn use_verification<'a>(
    &'a self,
    identifier: &'a str,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<Option<VerificationToken>, Self::Error>> + Send + 'a;

  /// Delete every token that expired before `now`. Returns the number removed.
  fn purge_expired(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
