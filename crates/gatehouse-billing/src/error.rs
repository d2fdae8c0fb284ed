//! Error type for `gatehouse-billing`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("billing api returned {status}: {body}")]
  Status { status: u16, body: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
