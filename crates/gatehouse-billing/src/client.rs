//! Async HTTP client for the billing API.

use std::time::Duration;

use chrono::Utc;
use gatehouse_core::entitlement::{BillingClient, GracePeriod, SubscriptionStanding};
use reqwest::Client;

use crate::{
  error::{Error, Result},
  standing::{Customer, List, evaluate},
};

/// Client for a Stripe-compatible `/v1/customers` endpoint.
///
/// Clones share the inner [`reqwest::Client`] connection pool.
#[derive(Debug, Clone)]
pub struct StripeClient {
  http:         Client,
  base_url:     String,
  grace_period: GracePeriod,
}

impl StripeClient {
  pub const DEFAULT_BASE_URL: &'static str = "https://api.stripe.com";

  pub fn new(base_url: impl Into<String>, grace_period: GracePeriod) -> Result<Self> {
    let http = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self { http, base_url: base_url.into(), grace_period })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/v1{}", self.base_url.trim_end_matches('/'), path)
  }

  /// `GET /v1/customers?email=<email>&expand[]=data.subscriptions`
  pub async fn list_customers(&self, api_key: &str, email: &str) -> Result<Vec<Customer>> {
    let resp = self
      .http
      .get(self.url("/customers"))
      .bearer_auth(api_key)
      .query(&[("email", email), ("expand[]", "data.subscriptions")])
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      tracing::warn!(%status, "billing api rejected customer lookup");
      return Err(Error::Status { status: status.as_u16(), body });
    }

    let list: List<Customer> = resp.json().await?;
    Ok(list.data)
  }
}

impl BillingClient for StripeClient {
  type Error = Error;

  async fn fetch_subscription(&self, api_key: &str, email: &str) -> Result<SubscriptionStanding> {
    let email = email.to_lowercase();
    let customers = self.list_customers(api_key, &email).await?;
    Ok(evaluate(&customers, &email, self.grace_period, Utc::now()))
  }
}
