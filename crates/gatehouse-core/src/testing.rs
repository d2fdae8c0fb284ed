//! In-memory collaborators shared by the unit tests.

use std::{
  convert::Infallible,
  io,
  sync::{Arc, Mutex},
};

use chrono::{DateTime, Utc};

use crate::{
  account::{Account, AccountId, NewAccount},
  entitlement::{BillingClient, SubscriptionStanding},
  store::{AccountQuery, AccountStore, VerificationStore},
  verification::{Mailer, VerificationRequest, VerificationToken},
};

// ─── Store ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct StoreInner {
  accounts: Vec<Account>,
  tokens:   Vec<VerificationToken>,
  lookups:  usize,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
  inner: Arc<Mutex<StoreInner>>,
}

impl MemoryStore {
  pub fn insert(&self, new: NewAccount) -> Account {
    let mut inner = self.inner.lock().unwrap();
    let account = Account {
      id:             inner.accounts.len() as AccountId + 1,
      username:       new.username,
      name:           new.name,
      email:          new.email,
      email_verified: new.email_verified,
      password_hash:  new.password_hash,
    };
    inner.accounts.push(account.clone());
    account
  }

  pub fn get(&self, id: AccountId) -> Option<Account> {
    let inner = self.inner.lock().unwrap();
    inner.accounts.iter().find(|a| a.id == id).cloned()
  }

  pub fn edit(&self, id: AccountId, f: impl FnOnce(&mut Account)) {
    let mut inner = self.inner.lock().unwrap();
    if let Some(account) = inner.accounts.iter_mut().find(|a| a.id == id) {
      f(account);
    }
  }

  /// Number of `find_unique` calls served.
  pub fn lookups(&self) -> usize { self.inner.lock().unwrap().lookups }

  pub fn verification_tokens(&self) -> Vec<VerificationToken> {
    self.inner.lock().unwrap().tokens.clone()
  }
}

impl AccountStore for MemoryStore {
  type Error = Infallible;

  async fn find_first(&self, query: &AccountQuery) -> Result<Option<Account>, Infallible> {
    let inner = self.inner.lock().unwrap();
    Ok(inner.accounts.iter().find(|a| query.matches(a)).cloned())
  }

  async fn find_unique(&self, id: AccountId) -> Result<Option<Account>, Infallible> {
    let mut inner = self.inner.lock().unwrap();
    inner.lookups += 1;
    Ok(inner.accounts.iter().find(|a| a.id == id).cloned())
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Infallible> {
    let inner = self.inner.lock().unwrap();
    Ok(inner.accounts.iter().find(|a| a.email.as_deref() == Some(email)).cloned())
  }

  async fn mark_email_verified(&self, id: AccountId, at: DateTime<Utc>) -> Result<(), Infallible> {
    self.edit(id, |a| a.email_verified = Some(at));
    Ok(())
  }
}

impl VerificationStore for MemoryStore {
  type Error = Infallible;

  async fn create_verification(&self, token: VerificationToken) -> Result<(), Infallible> {
    self.inner.lock().unwrap().tokens.push(token);
    Ok(())
  }

  async fn use_verification(
    &self,
    identifier: &str,
    token_hash: &str,
  ) -> Result<Option<VerificationToken>, Infallible> {
    let mut inner = self.inner.lock().unwrap();
    let pos = inner
      .tokens
      .iter()
      .position(|t| t.identifier == identifier && t.token_hash == token_hash);
    Ok(pos.map(|i| inner.tokens.remove(i)))
  }

  async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, Infallible> {
    let mut inner = self.inner.lock().unwrap();
    let before = inner.tokens.len();
    inner.tokens.retain(|t| t.expires_at >= now);
    Ok((before - inner.tokens.len()) as u64)
  }
}

// ─── Billing ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct BillingInner {
  calls:        usize,
  last_request: Option<(String, String)>,
}

#[derive(Clone, Default)]
pub struct FakeBilling {
  standing: SubscriptionStanding,
  fail:     bool,
  inner:    Arc<Mutex<BillingInner>>,
}

impl FakeBilling {
  pub fn returning(standing: SubscriptionStanding) -> Self {
    Self { standing, ..Self::default() }
  }

  pub fn failing() -> Self { Self { fail: true, ..Self::default() } }

  pub fn calls(&self) -> usize { self.inner.lock().unwrap().calls }

  pub fn last_request(&self) -> Option<(String, String)> {
    self.inner.lock().unwrap().last_request.clone()
  }
}

impl BillingClient for FakeBilling {
  type Error = io::Error;

  async fn fetch_subscription(
    &self,
    api_key: &str,
    email: &str,
  ) -> Result<SubscriptionStanding, io::Error> {
    {
      let mut inner = self.inner.lock().unwrap();
      inner.calls += 1;
      inner.last_request = Some((api_key.to_string(), email.to_string()));
    }
    if self.fail {
      return Err(io::Error::other("billing api unavailable"));
    }
    Ok(self.standing)
  }
}

// ─── Mailer ──────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingMailer {
  fail: bool,
  sent: Arc<Mutex<Vec<VerificationRequest>>>,
}

impl RecordingMailer {
  pub fn failing() -> Self { Self { fail: true, ..Self::default() } }

  pub fn sent(&self) -> Vec<VerificationRequest> { self.sent.lock().unwrap().clone() }
}

impl Mailer for RecordingMailer {
  type Error = io::Error;

  async fn send(&self, request: &VerificationRequest) -> Result<(), io::Error> {
    if self.fail {
      return Err(io::Error::other("relay refused message"));
    }
    self.sent.lock().unwrap().push(request.clone());
    Ok(())
  }
}
