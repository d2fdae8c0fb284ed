//! `GET /auth/providers`

use axum::{Json, extract::State};
use gatehouse_core::{
  settings::{AuthMethod, Pages},
  store::{AccountStore, VerificationStore},
  verification::Mailer,
};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct Providers {
  pub providers: Vec<Provider>,
  pub pages:     Pages,
}

#[derive(Serialize)]
pub struct Provider {
  pub id:     &'static str,
  #[serde(flatten)]
  pub method: AuthMethod,
}

pub async fn handler<S, M>(State(state): State<AppState<S, M>>) -> Json<Providers>
where
  S: AccountStore + VerificationStore + Clone + 'static,
  M: Mailer + Clone + 'static,
{
  let providers = state
    .settings
    .methods()
    .iter()
    .map(|method| Provider { id: method.id(), method: method.clone() })
    .collect();

  Json(Providers { providers, pages: state.settings.pages.clone() })
}
