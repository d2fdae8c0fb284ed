//! Entitlement Checker: subscription standing from an external billing API.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subscription standing as reported by the billing system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStanding {
  pub is_subscriber:            bool,
  /// Epoch seconds at which the subscription was cancelled, if it was.
  pub subscription_canceled_at: Option<i64>,
}

/// A billing backend that can report the standing of a customer by email.
pub trait BillingClient: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn fetch_subscription<'a>(
    &'a self,
    api_key: &'a str,
    email: &'a str,
  ) -> impl Future<Output = Result<SubscriptionStanding, Self::Error>> + Send + 'a;
}

/// Query `client` for the current standing of `email`.
///
/// No caching happens here; the session token is the cache. Callers must not
/// invoke this without a configured API key.
pub async fn check<B: BillingClient>(
  client: &B,
  api_key: &str,
  email: &str,
) -> Result<SubscriptionStanding, B::Error> {
  let standing = client.fetch_subscription(api_key, email).await?;
  tracing::debug!(
    email,
    is_subscriber = standing.is_subscriber,
    canceled_at = ?standing.subscription_canceled_at,
    "fetched subscription standing"
  );
  Ok(standing)
}

// ─── Grace period ────────────────────────────────────────────────────────────

/// How long a cancelled subscriber keeps their entitlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GracePeriod {
  seconds: i64,
}

impl GracePeriod {
  pub const DEFAULT_SECONDS: i64 = 1_209_600;

  pub const fn from_seconds(seconds: i64) -> Self { Self { seconds } }

  pub const fn from_days(days: u32) -> Self {
    Self { seconds: days as i64 * 86_400 }
  }

  pub const fn as_seconds(self) -> i64 { self.seconds }

  /// `true` once `now` is strictly past `canceled_at + grace`.
  pub fn has_lapsed(self, canceled_at: i64, now: DateTime<Utc>) -> bool {
    now.timestamp() > canceled_at.saturating_add(self.seconds)
  }
}

impl Default for GracePeriod {
  fn default() -> Self { Self::from_seconds(Self::DEFAULT_SECONDS) }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

  #[test]
  fn default_is_fourteen_days() {
    assert_eq!(GracePeriod::default(), GracePeriod::from_days(14));
  }

  #[test]
  fn lapse_is_strictly_after_the_window() {
    let grace = GracePeriod::default();
    let canceled = 1_700_000_000;
    let edge = canceled + grace.as_seconds();

    assert!(!grace.has_lapsed(canceled, at(edge - 1)));
    assert!(!grace.has_lapsed(canceled, at(edge)));
    assert!(grace.has_lapsed(canceled, at(edge + 1)));
  }

  #[test]
  fn zero_day_grace_lapses_immediately_after_cancellation() {
    let grace = GracePeriod::from_days(0);
    assert!(!grace.has_lapsed(100, at(100)));
    assert!(grace.has_lapsed(100, at(101)));
  }
}
