//! Row types and conversions between SQLite columns and domain types.
//!
//! All timestamps are stored as fixed-width RFC 3339 UTC strings, so that
//! string comparison in SQL orders them chronologically.

use chrono::{DateTime, SecondsFormat, Utc};
use gatehouse_core::{account::Account, verification::VerificationToken};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

pub const ACCOUNT_COLUMNS: &str =
  "id, username, name, email, email_verified, password_hash";

/// An `accounts` row exactly as read from SQLite.
pub struct RawAccount {
  pub id:             i64,
  pub username:       String,
  pub name:           Option<String>,
  pub email:          Option<String>,
  pub email_verified: Option<String>,
  pub password_hash:  Option<String>,
}

impl RawAccount {
  /// Map a row selected with [`ACCOUNT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      username:       row.get(1)?,
      name:           row.get(2)?,
      email:          row.get(3)?,
      email_verified: row.get(4)?,
      password_hash:  row.get(5)?,
    })
  }

  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      id:             self.id,
      username:       self.username,
      name:           self.name,
      email:          self.email,
      email_verified: self.email_verified.as_deref().map(decode_dt).transpose()?,
      password_hash:  self.password_hash,
    })
  }
}

pub struct RawVerificationToken {
  pub identifier: String,
  pub token_hash: String,
  pub expires_at: String,
}

impl RawVerificationToken {
  pub fn into_token(self) -> Result<VerificationToken> {
    Ok(VerificationToken {
      identifier: self.identifier,
      token_hash: self.token_hash,
      expires_at: decode_dt(&self.expires_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_survive_encoding() {
    let dt = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();
    assert_eq!(decode_dt(&encode_dt(dt)).unwrap(), dt);
  }

  #[test]
  fn encoded_timestamps_sort_chronologically() {
    let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let b = a + chrono::Duration::milliseconds(1);
    assert!(encode_dt(a) < encode_dt(b));
  }

  #[test]
  fn bad_timestamp_is_a_parse_error() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }
}
