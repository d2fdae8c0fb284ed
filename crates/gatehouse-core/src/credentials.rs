//! Credential Verifier: username/password sign-in against stored hashes.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use rand_core::OsRng;

use crate::{
  Error, Result,
  account::Account,
  store::{AccountQuery, AccountStore},
};

// ─── Hash comparison ─────────────────────────────────────────────────────────

/// Compares a plaintext secret with a stored hash. Implementations must be
/// constant-time with respect to the secret.
pub trait PasswordComparator: Send + Sync {
  fn compare(&self, plaintext: &str, hash: &str) -> bool;
}

/// Verifies argon2 PHC strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Comparator;

impl PasswordComparator for Argon2Comparator {
  fn compare(&self, plaintext: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
      Ok(parsed) => parsed,
      Err(e) => {
        tracing::warn!(error = %e, "stored password hash is malformed");
        return false;
      }
    };

    Argon2::default()
      .verify_password(plaintext.as_bytes(), &parsed)
      .is_ok()
  }
}

/// Hash `plaintext` into an argon2 PHC string with a fresh random salt.
pub fn hash_password(plaintext: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(plaintext.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::PasswordHash(e.to_string()))
}

// ─── Verifier ────────────────────────────────────────────────────────────────

/// Resolves a login identifier and secret to an account.
///
/// With the passwordless path enabled, the identifier may be a username or an
/// email address, but only accounts with a verified email are eligible.
/// Otherwise only usernames are matched and verification is not required.
pub struct CredentialVerifier<A, H = Argon2Comparator> {
  accounts:     A,
  comparator:   H,
  passwordless: bool,
}

impl<A: AccountStore> CredentialVerifier<A> {
  pub fn new(accounts: A, passwordless: bool) -> Self {
    Self::with_comparator(accounts, Argon2Comparator, passwordless)
  }
}

impl<A, H> CredentialVerifier<A, H>
where
  A: AccountStore,
  H: PasswordComparator,
{
  pub fn with_comparator(accounts: A, comparator: H, passwordless: bool) -> Self {
    Self { accounts, comparator, passwordless }
  }

  /// Return the matching account, or `None` when the identifier is unknown,
  /// the account has no stored hash, or the secret does not match.
  ///
  /// Only store failures are errors.
  pub async fn verify(&self, identifier: &str, secret: &str) -> Result<Option<Account>> {
    let identifier = identifier.to_lowercase();
    let query = if self.passwordless {
      AccountQuery::verified_login(identifier)
    } else {
      AccountQuery::username(identifier)
    };

    let Some(account) = self
      .accounts
      .find_first(&query)
      .await
      .map_err(Error::store)?
    else {
      tracing::debug!(identifier = %query.identifier, "no account matches login");
      return Ok(None);
    };

    // Email-only accounts can never authenticate on the password path.
    let Some(hash) = account.password_hash.as_deref() else {
      tracing::debug!(account_id = account.id, "account has no password set");
      return Ok(None);
    };

    if self.comparator.compare(secret, hash) {
      Ok(Some(account))
    } else {
      tracing::debug!(account_id = account.id, "password mismatch");
      Ok(None)
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;
  use crate::{account::NewAccount, testing::MemoryStore};

  /// Treats the stored "hash" as the plaintext itself.
  struct PlainComparator;

  impl PasswordComparator for PlainComparator {
    fn compare(&self, plaintext: &str, hash: &str) -> bool { plaintext == hash }
  }

  fn verified_at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
  }

  #[tokio::test]
  async fn username_login_is_case_insensitive() {
    let store = MemoryStore::default();
    let hash = hash_password("hunter2").unwrap();
    let alice = store.insert(NewAccount::new("alice").with_password_hash(hash));

    let verifier = CredentialVerifier::new(store, false);
    let found = verifier.verify("ALICE", "hunter2").await.unwrap();
    assert_eq!(found.map(|a| a.id), Some(alice.id));
  }

  #[tokio::test]
  async fn wrong_password_is_no_match() {
    let store = MemoryStore::default();
    let hash = hash_password("hunter2").unwrap();
    store.insert(NewAccount::new("alice").with_password_hash(hash));

    let verifier = CredentialVerifier::new(store, false);
    assert!(verifier.verify("alice", "hunter3").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn unknown_username_is_no_match() {
    let verifier = CredentialVerifier::new(MemoryStore::default(), false);
    assert!(verifier.verify("nobody", "x").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn account_without_hash_never_matches() {
    let store = MemoryStore::default();
    store.insert(NewAccount::new("mallory"));

    let verifier = CredentialVerifier::with_comparator(store, PlainComparator, false);
    for secret in ["", "password", "mallory", "\0"] {
      assert!(verifier.verify("mallory", secret).await.unwrap().is_none());
    }
  }

  #[tokio::test]
  async fn match_follows_comparator_verdict() {
    let store = MemoryStore::default();
    store.insert(NewAccount::new("bob").with_password_hash("s3cret"));

    let verifier = CredentialVerifier::with_comparator(store, PlainComparator, false);
    for secret in ["s3cret", "S3CRET", "s3cret ", ""] {
      let matched = verifier.verify("bob", secret).await.unwrap().is_some();
      assert_eq!(matched, secret == "s3cret", "secret {secret:?}");
    }
  }

  #[tokio::test]
  async fn email_login_only_when_passwordless_enabled() {
    let store = MemoryStore::default();
    store.insert(
      NewAccount::new("carol")
        .with_email("carol@example.com")
        .verified_at(verified_at())
        .with_password_hash("pw"),
    );

    let disabled =
      CredentialVerifier::with_comparator(store.clone(), PlainComparator, false);
    assert!(disabled.verify("carol@example.com", "pw").await.unwrap().is_none());

    let enabled = CredentialVerifier::with_comparator(store, PlainComparator, true);
    assert!(enabled.verify("Carol@Example.com", "pw").await.unwrap().is_some());
  }

  #[tokio::test]
  async fn unverified_email_is_rejected_when_passwordless_enabled() {
    let store = MemoryStore::default();
    store.insert(
      NewAccount::new("dave")
        .with_email("dave@example.com")
        .with_password_hash("pw"),
    );

    let verifier =
      CredentialVerifier::with_comparator(store, PlainComparator, true);
    assert!(verifier.verify("dave@example.com", "pw").await.unwrap().is_none());
    // The verification requirement applies to username logins as well.
    assert!(verifier.verify("dave", "pw").await.unwrap().is_none());
  }

  #[test]
  fn malformed_hash_compares_false() {
    assert!(!Argon2Comparator.compare("anything", "not-a-phc-string"));
  }
}
