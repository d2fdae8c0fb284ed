//! Session Token Lifecycle Manager.
//!
//! Every issuance and refresh of a session token passes through
//! [`SessionLifecycle::refresh`], which applies, in order:
//!
//! 1. the entitlement re-check gate,
//! 2. the sign-in stamp of `id` and `username`, or
//! 3. the explicit-update reload of identity fields from the account store.
//!
//! The clock is an argument; nothing here reads wall time.

use chrono::{DateTime, Utc};

use crate::{
  Error, Result,
  account::{Account, AccountId},
  entitlement::{self, BillingClient, GracePeriod},
  store::AccountStore,
  token::{SessionToken, TokenRefreshEvent},
};

pub struct SessionLifecycle<A, B> {
  accounts:     A,
  billing:      B,
  /// `None` disables the entitlement subsystem entirely.
  billing_key:  Option<String>,
  grace_period: GracePeriod,
}

impl<A, B> SessionLifecycle<A, B>
where
  A: AccountStore,
  B: BillingClient,
{
  pub fn new(
    accounts: A,
    billing: B,
    billing_key: Option<String>,
    grace_period: GracePeriod,
  ) -> Self {
    Self { accounts, billing, billing_key, grace_period }
  }

  /// Mint the token for a freshly authenticated account.
  pub async fn issue(&self, account: Account, now: DateTime<Utc>) -> Result<SessionToken> {
    let token = SessionToken::seeded(&account);
    self.refresh(token, TokenRefreshEvent::SignIn(account), now).await
  }

  /// Apply one refresh event to `token`.
  ///
  /// A billing failure aborts the refresh and is returned to the caller.
  pub async fn refresh(
    &self,
    mut token: SessionToken,
    event: TokenRefreshEvent,
    now: DateTime<Utc>,
  ) -> Result<SessionToken> {
    if let Some(api_key) = self.billing_key.as_deref()
      && self.needs_entitlement_check(&token, &event, now)
    {
      tracing::debug!(account_id = ?token.id, event = event.kind(), "re-checking entitlement");
      self.recheck_entitlement(&mut token, api_key).await?;
    }

    match event {
      TokenRefreshEvent::SignIn(account) => {
        token.id = Some(account.id);
        token.username = Some(account.username.to_lowercase());
      }
      TokenRefreshEvent::ExplicitUpdate => {
        if let Some(id) = token.id {
          self.reload_identity(&mut token, id).await?;
        }
      }
      TokenRefreshEvent::PeriodicRefresh => {}
    }

    Ok(token)
  }

  /// Whether the cached standing in `token` must be fetched again.
  pub fn needs_entitlement_check(
    &self,
    token: &SessionToken,
    event: &TokenRefreshEvent,
    now: DateTime<Utc>,
  ) -> bool {
    let lapsed = token
      .subscription_canceled_at
      .is_some_and(|at| self.grace_period.has_lapsed(at, now));

    event.is_explicit() || lapsed || !token.is_subscriber
  }

  async fn recheck_entitlement(&self, token: &mut SessionToken, api_key: &str) -> Result<()> {
    let Some(email) = token.email.as_deref() else {
      tracing::debug!(account_id = ?token.id, "token has no email; skipping entitlement check");
      return Ok(());
    };

    let standing = entitlement::check(&self.billing, api_key, email)
      .await
      .map_err(Error::billing)?;

    token.subscription_canceled_at = standing.subscription_canceled_at;
    token.is_subscriber = standing.is_subscriber;
    Ok(())
  }

  async fn reload_identity(&self, token: &mut SessionToken, id: AccountId) -> Result<()> {
    let account = self
      .accounts
      .find_unique(id)
      .await
      .map_err(Error::store)?;

    match account {
      Some(account) => {
        token.name = account.name;
        token.username = Some(account.username.to_lowercase());
        token.email = account.email.map(|e| e.to_lowercase());
      }
      None => {
        tracing::warn!(account_id = id, "session refers to a missing account; leaving claims unchanged");
      }
    }
    Ok(())
  }
}
