//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, TimeZone, Utc};
use gatehouse_core::{
  account::NewAccount,
  store::{AccountQuery, AccountStore, VerificationStore},
  verification::VerificationToken,
};

use crate::{Error, ProfileUpdate, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn t0() -> chrono::DateTime<Utc> { Utc.with_ymd_and_hms(2024, 4, 1, 9, 30, 0).unwrap() }

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_find_unique() {
  let s = store().await;
  let created = s
    .create_account(NewAccount::new("Alice").with_name("Alice").with_password_hash("h"))
    .await
    .unwrap();
  assert_eq!(created.username, "alice");

  let fetched = s.find_unique(created.id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
}

#[tokio::test]
async fn find_unique_missing_returns_none() {
  let s = store().await;
  assert!(s.find_unique(12345).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
  let s = store().await;
  s.create_account(NewAccount::new("alice")).await.unwrap();
  let err = s.create_account(NewAccount::new("ALICE")).await.unwrap_err();
  assert!(matches!(err, Error::Duplicate(_)), "got {err:?}");
}

#[tokio::test]
async fn username_query_ignores_email_and_verification() {
  let s = store().await;
  let bob = s
    .create_account(NewAccount::new("bob").with_email("bob@example.com"))
    .await
    .unwrap();

  let by_name = s.find_first(&AccountQuery::username("bob")).await.unwrap();
  assert_eq!(by_name.map(|a| a.id), Some(bob.id));

  let by_email = s.find_first(&AccountQuery::username("bob@example.com")).await.unwrap();
  assert!(by_email.is_none());
}

#[tokio::test]
async fn verified_login_matches_username_or_email() {
  let s = store().await;
  let carol = s
    .create_account(
      NewAccount::new("carol")
        .with_email("carol@example.com")
        .verified_at(t0()),
    )
    .await
    .unwrap();

  for identifier in ["carol", "carol@example.com"] {
    let found = s.find_first(&AccountQuery::verified_login(identifier)).await.unwrap();
    assert_eq!(found.map(|a| a.id), Some(carol.id), "identifier {identifier}");
  }
  assert_eq!(
    s.find_unique(carol.id).await.unwrap().unwrap().email_verified,
    Some(t0())
  );
}

#[tokio::test]
async fn verified_login_skips_unverified_accounts() {
  let s = store().await;
  s.create_account(NewAccount::new("dave").with_email("dave@example.com"))
    .await
    .unwrap();

  assert!(s.find_first(&AccountQuery::verified_login("dave")).await.unwrap().is_none());
  assert!(
    s.find_first(&AccountQuery::verified_login("dave@example.com"))
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn lookups_are_case_sensitive() {
  let s = store().await;
  s.create_account(NewAccount::new("erin")).await.unwrap();
  assert!(s.find_first(&AccountQuery::username("Erin")).await.unwrap().is_none());
}

#[tokio::test]
async fn mark_email_verified_sets_timestamp() {
  let s = store().await;
  let acct = s
    .create_account(NewAccount::new("frank").with_email("frank@example.com"))
    .await
    .unwrap();

  s.mark_email_verified(acct.id, t0()).await.unwrap();
  let found = s.find_by_email("frank@example.com").await.unwrap().unwrap();
  assert_eq!(found.email_verified, Some(t0()));

  assert!(matches!(
    s.mark_email_verified(9999, t0()).await,
    Err(Error::AccountNotFound(9999))
  ));
}

#[tokio::test]
async fn update_profile_lowercases_and_keeps_unset_fields() {
  let s = store().await;
  let acct = s
    .create_account(NewAccount::new("grace").with_name("Grace").with_email("grace@example.com"))
    .await
    .unwrap();

  let updated = s
    .update_profile(acct.id, ProfileUpdate {
      username: Some("GHopper".into()),
      ..ProfileUpdate::default()
    })
    .await
    .unwrap();
  assert_eq!(updated.username, "ghopper");
  assert_eq!(updated.name.as_deref(), Some("Grace"));
  assert_eq!(updated.email.as_deref(), Some("grace@example.com"));
}

#[tokio::test]
async fn delete_account_removes_row() {
  let s = store().await;
  let acct = s.create_account(NewAccount::new("heidi")).await.unwrap();
  assert!(s.delete_account(acct.id).await.unwrap());
  assert!(!s.delete_account(acct.id).await.unwrap());
  assert!(s.find_unique(acct.id).await.unwrap().is_none());
}

// ─── Verification tokens ─────────────────────────────────────────────────────

fn token(hash: &str, expires_at: chrono::DateTime<Utc>) -> VerificationToken {
  VerificationToken {
    identifier: "ivan@example.com".into(),
    token_hash: hash.into(),
    expires_at,
  }
}

#[tokio::test]
async fn verification_token_is_single_use() {
  let s = store().await;
  let t = token("abc", t0());
  s.create_verification(t.clone()).await.unwrap();

  let used = s.use_verification("ivan@example.com", "abc").await.unwrap();
  assert_eq!(used, Some(t));
  assert!(s.use_verification("ivan@example.com", "abc").await.unwrap().is_none());
}

#[tokio::test]
async fn verification_token_requires_matching_identifier() {
  let s = store().await;
  s.create_verification(token("abc", t0())).await.unwrap();
  assert!(s.use_verification("judy@example.com", "abc").await.unwrap().is_none());
  assert!(s.use_verification("ivan@example.com", "abc").await.unwrap().is_some());
}

#[tokio::test]
async fn purge_expired_keeps_live_tokens() {
  let s = store().await;
  s.create_verification(token("old", t0() - Duration::seconds(1))).await.unwrap();
  s.create_verification(token("live", t0() + Duration::seconds(1200))).await.unwrap();

  assert_eq!(s.purge_expired(t0()).await.unwrap(), 1);
  assert!(s.use_verification("ivan@example.com", "old").await.unwrap().is_none());
  assert!(s.use_verification("ivan@example.com", "live").await.unwrap().is_some());
}
