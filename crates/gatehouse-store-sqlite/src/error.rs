//! Error type for `gatehouse-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("account not found: {0}")]
  AccountNotFound(gatehouse_core::account::AccountId),

  /// A unique username or email constraint rejected the write.
  #[error("account already exists: {0}")]
  Duplicate(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
