//! HTTP surface for Gatehouse.
//!
//! Exposes an axum [`Router`] serving credential and email-link sign-in plus
//! session read, update, and sign-out, backed by any store implementing the
//! core account and verification traits.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod mail;
pub mod session;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  http::header,
  response::{IntoResponse, Response},
  routing::{get, post},
};
use chrono::{DateTime, Utc};
use gatehouse_billing::StripeClient;
use gatehouse_core::{
  credentials::CredentialVerifier,
  lifecycle::SessionLifecycle,
  settings::{AuthEnv, AuthSettings},
  store::{AccountStore, VerificationStore},
  token::{SessionToken, SessionView},
  verification::{Mailer, VerificationDispatcher},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use handlers::{credentials, email, providers, session as session_routes, signout};
use session::SessionCodec;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `GATEHOUSE_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  /// Public origin; callback links are built from it.
  pub base_url:            String,
  pub store_path:          PathBuf,
  pub session_secret:      String,
  #[serde(default)]
  pub email_server:        Option<String>,
  #[serde(default)]
  pub email_from:          Option<String>,
  #[serde(default)]
  pub billing_api_key:     Option<String>,
  #[serde(default = "default_billing_base_url")]
  pub billing_base_url:    String,
  #[serde(default)]
  pub trial_period_days:   Option<u32>,
  #[serde(default)]
  pub sign_in_page:        Option<String>,
  #[serde(default)]
  pub verify_request_page: Option<String>,
}

fn default_billing_base_url() -> String { StripeClient::DEFAULT_BASE_URL.to_string() }

impl ServerConfig {
  /// The subset of configuration that decides which auth features are on.
  pub fn auth_env(&self) -> AuthEnv {
    AuthEnv {
      email_server:        self.email_server.clone(),
      email_from:          self.email_from.clone(),
      billing_api_key:     self.billing_api_key.clone(),
      trial_period_days:   self.trial_period_days,
      sign_in_page:        self.sign_in_page.clone(),
      verify_request_page: self.verify_request_page.clone(),
    }
  }

  pub fn secure_cookies(&self) -> bool { self.base_url.starts_with("https://") }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S, M> {
  pub store:      S,
  pub config:     Arc<ServerConfig>,
  pub settings:   Arc<AuthSettings>,
  pub codec:      Arc<SessionCodec>,
  pub verifier:   Arc<CredentialVerifier<S>>,
  /// `None` when email sign-in is not configured.
  pub dispatcher: Option<Arc<VerificationDispatcher<S, M>>>,
  pub lifecycle:  Arc<SessionLifecycle<S, StripeClient>>,
}

impl<S, M> AppState<S, M>
where
  S: AccountStore + VerificationStore + Clone + 'static,
  M: Mailer + Clone + 'static,
{
  /// Wire the auth components together. `mailer` is only used when
  /// `settings` enables email sign-in.
  pub fn new(
    store: S,
    mailer: Option<M>,
    config: ServerConfig,
    settings: AuthSettings,
  ) -> Result<Self, gatehouse_billing::Error> {
    let billing = StripeClient::new(config.billing_base_url.clone(), settings.grace_period)?;

    let dispatcher = match (settings.passwordless_enabled(), mailer) {
      (true, Some(mailer)) => Some(Arc::new(VerificationDispatcher::new(
        store.clone(),
        mailer,
        config.base_url.clone(),
        config.session_secret.clone(),
      ))),
      (true, None) => {
        tracing::warn!("email sign-in configured without a mailer; link requests will 404");
        None
      }
      (false, _) => None,
    };

    Ok(Self {
      verifier: Arc::new(CredentialVerifier::new(store.clone(), settings.passwordless_enabled())),
      lifecycle: Arc::new(SessionLifecycle::new(
        store.clone(),
        billing,
        settings.billing_api_key.clone(),
        settings.grace_period,
      )),
      codec: Arc::new(SessionCodec::new(&config.session_secret)),
      dispatcher,
      store,
      config: Arc::new(config),
      settings: Arc::new(settings),
    })
  }

  /// Sign `token`, set it as the session cookie and return its view.
  pub(crate) fn session_response(
    &self,
    token: &SessionToken,
    now: DateTime<Utc>,
  ) -> Result<Response, Error> {
    let (jwt, expires) = self.codec.encode(token, now)?;
    let cookie = auth::session_cookie(&jwt, self.config.secure_cookies())?;
    let view = SessionView::project(token, expires);
    Ok(([(header::SET_COOKIE, cookie)], Json(view)).into_response())
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the auth endpoints.
pub fn router<S, M>(state: AppState<S, M>) -> Router
where
  S: AccountStore + VerificationStore + Clone + 'static,
  M: Mailer + Clone + 'static,
{
  Router::new()
    .route("/auth/providers",           get(providers::handler::<S, M>))
    .route("/auth/signin/credentials",  post(credentials::sign_in::<S, M>))
    .route("/auth/signin/email",        post(email::request_link::<S, M>))
    .route("/auth/callback/email",      get(email::callback::<S, M>))
    .route("/auth/session",             get(session_routes::read::<S, M>).post(session_routes::update::<S, M>))
    .route("/auth/signout",             post(signout::handler::<S, M>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
