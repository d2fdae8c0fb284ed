//! Error types for `gatehouse-core`.
//!
//! An authentication attempt that simply does not match is never an error;
//! these variants cover collaborator failures only.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("account store error: {0}")]
  Store(#[source] BoxError),

  #[error("billing error: {0}")]
  Billing(#[source] BoxError),

  #[error("mail delivery error: {0}")]
  Mail(#[source] BoxError),

  #[error("password hashing failed: {0}")]
  PasswordHash(String),
}

impl Error {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  pub(crate) fn billing(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Billing(Box::new(e))
  }

  pub(crate) fn mail(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Mail(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
