//! Billing API response shapes and their reduction to a standing.

use chrono::{DateTime, Utc};
use gatehouse_core::entitlement::{GracePeriod, SubscriptionStanding};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct List<T> {
  pub data: Vec<T>,
}

impl<T> Default for List<T> {
  fn default() -> Self { Self { data: Vec::new() } }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
  pub email:         Option<String>,
  #[serde(default)]
  pub subscriptions: Option<List<Subscription>>,
}

impl Customer {
  fn subscriptions(&self) -> &[Subscription] {
    self
      .subscriptions
      .as_ref()
      .map(|list| list.data.as_slice())
      .unwrap_or_default()
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
  pub canceled_at: Option<i64>,
  #[serde(default)]
  pub items:       List<SubscriptionItem>,
}

impl Subscription {
  /// A subscription counts only when its first item is attached to a plan.
  fn is_priced(&self) -> bool {
    self.items.data.first().is_some_and(|item| item.plan.is_some())
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionItem {
  pub plan: Option<serde_json::Value>,
}

/// Reduce the customers listed for `email` to a standing.
///
/// Only customers whose address matches `email` (case-insensitively) count.
/// A priced subscription grants entitlement unless it was cancelled more
/// than `grace` before `now`. The cancellation time reported is that of the
/// granting subscription, or of the last one examined if none grants.
pub fn evaluate(
  customers: &[Customer],
  email: &str,
  grace: GracePeriod,
  now: DateTime<Utc>,
) -> SubscriptionStanding {
  let mut standing = SubscriptionStanding::default();

  let subscriptions = customers
    .iter()
    .filter(|c| c.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email)))
    .flat_map(Customer::subscriptions);

  for subscription in subscriptions {
    standing.subscription_canceled_at = subscription.canceled_at;

    let lapsed = subscription
      .canceled_at
      .is_some_and(|at| grace.has_lapsed(at, now));

    if subscription.is_priced() && !lapsed {
      standing.is_subscriber = true;
      break;
    }
  }

  standing
}
