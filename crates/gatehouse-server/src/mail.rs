//! Verification mail delivered through an HTTP relay.
//!
//! The relay receives one JSON document per message and is responsible for
//! the actual SMTP hop.

use std::time::Duration;

use chrono::{DateTime, Utc};
use gatehouse_core::verification::{Mailer, VerificationRequest};
use reqwest::Client;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct WebhookMailer {
  http:     Client,
  endpoint: String,
  from:     String,
}

#[derive(Serialize)]
struct OutgoingMessage<'a> {
  from:       &'a str,
  to:         &'a str,
  subject:    &'a str,
  text:       String,
  url:        &'a str,
  expires_at: DateTime<Utc>,
}

impl WebhookMailer {
  pub fn new(endpoint: impl Into<String>, from: impl Into<String>) -> reqwest::Result<Self> {
    let http = Client::builder()
      .timeout(Duration::from_secs(15))
      .build()?;
    Ok(Self { http, endpoint: endpoint.into(), from: from.into() })
  }
}

impl Mailer for WebhookMailer {
  type Error = reqwest::Error;

  async fn send(&self, request: &VerificationRequest) -> Result<(), Self::Error> {
    let message = OutgoingMessage {
      from:       &self.from,
      to:         &request.identifier,
      subject:    "Sign in",
      text:       format!("Sign in by opening this link:\n\n{}\n", request.url),
      url:        &request.url,
      expires_at: request.expires_at,
    };

    self
      .http
      .post(&self.endpoint)
      .json(&message)
      .send()
      .await?
      .error_for_status()?;

    tracing::debug!(to = %request.identifier, "verification mail handed to relay");
    Ok(())
  }
}
