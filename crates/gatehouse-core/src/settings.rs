//! Authentication settings, resolved once at start-up.
//!
//! The set of enabled sign-in methods is computed from the environment a
//! single time and never mutated afterwards.

use serde::Serialize;

use crate::entitlement::GracePeriod;

/// Raw, optional inputs as read from configuration.
#[derive(Debug, Clone, Default)]
pub struct AuthEnv {
  pub email_server:        Option<String>,
  pub email_from:          Option<String>,
  pub billing_api_key:     Option<String>,
  pub trial_period_days:   Option<u32>,
  pub sign_in_page:        Option<String>,
  pub verify_request_page: Option<String>,
}

/// A sign-in method offered by this deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthMethod {
  Credentials,
  Email {
    #[serde(skip)]
    server: String,
    from:   String,
  },
}

impl AuthMethod {
  pub fn id(&self) -> &'static str {
    match self {
      Self::Credentials => "credentials",
      Self::Email { .. } => "email",
    }
  }
}

/// Where the browser is sent for sign-in and after requesting a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pages {
  pub sign_in:        String,
  pub verify_request: String,
}

impl Default for Pages {
  fn default() -> Self {
    Self { sign_in: "/login".to_string(), verify_request: "/confirmation".to_string() }
  }
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
  methods:             Vec<AuthMethod>,
  pub billing_api_key: Option<String>,
  pub grace_period:    GracePeriod,
  pub pages:           Pages,
}

impl AuthSettings {
  /// Resolve the enabled methods. Email sign-in requires both a mail server
  /// and a from-address; billing requires a non-empty key. Absent values
  /// switch a feature off rather than failing.
  pub fn resolve(env: &AuthEnv) -> Self {
    let mut methods = vec![AuthMethod::Credentials];
    if let (Some(server), Some(from)) = (non_empty(&env.email_server), non_empty(&env.email_from)) {
      methods.push(AuthMethod::Email { server, from });
    }

    let grace_period = env
      .trial_period_days
      .map(GracePeriod::from_days)
      .unwrap_or_default();

    let defaults = Pages::default();
    let pages = Pages {
      sign_in:        non_empty(&env.sign_in_page).unwrap_or(defaults.sign_in),
      verify_request: non_empty(&env.verify_request_page).unwrap_or(defaults.verify_request),
    };

    Self {
      methods,
      billing_api_key: non_empty(&env.billing_api_key),
      grace_period,
      pages,
    }
  }

  pub fn methods(&self) -> &[AuthMethod] { &self.methods }

  pub fn email_method(&self) -> Option<&AuthMethod> {
    self.methods.iter().find(|m| matches!(m, AuthMethod::Email { .. }))
  }

  pub fn passwordless_enabled(&self) -> bool { self.email_method().is_some() }

  pub fn billing_enabled(&self) -> bool { self.billing_api_key.is_some() }
}

fn non_empty(value: &Option<String>) -> Option<String> {
  value
    .as_deref()
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
}
