//! [`SqliteStore`]: accounts and verification tokens in SQLite.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;

use gatehouse_core::{
  account::{Account, AccountId, NewAccount},
  store::{AccountQuery, AccountStore, VerificationStore},
  verification::VerificationToken,
};

use crate::{
  Error, Result,
  encode::{ACCOUNT_COLUMNS, RawAccount, RawVerificationToken, encode_dt},
  schema::SCHEMA,
};

/// Fields of an account that an administrator may change. `None` leaves the
/// column as it is.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
  pub name:     Option<String>,
  pub username: Option<String>,
  pub email:    Option<String>,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Accounts and verification tokens in a single SQLite file.
///
/// Clones share one background connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a private in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Administration ────────────────────────────────────────────────────────

  /// Insert a new account and return it with its assigned id.
  pub async fn create_account(&self, input: NewAccount) -> Result<Account> {
    let username       = input.username.clone();
    let name           = input.name.clone();
    let email          = input.email.clone();
    let verified_str   = input.email_verified.map(encode_dt);
    let password_hash  = input.password_hash.clone();
    let created_at_str = encode_dt(Utc::now());

    let id: AccountId = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO accounts (username, name, email, email_verified, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![username, name, email, verified_str, password_hash, created_at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await
      .map_err(|e| constraint_to_duplicate(e, &input.username))?;

    tracing::info!(account_id = id, username = %input.username, "account created");

    Ok(Account {
      id,
      username:       input.username,
      name:           input.name,
      email:          input.email,
      email_verified: input.email_verified,
      password_hash:  input.password_hash,
    })
  }

  /// Change profile fields. Username and email are lowercased.
  pub async fn update_profile(&self, id: AccountId, update: ProfileUpdate) -> Result<Account> {
    let username = update.username.as_deref().map(str::to_lowercase);
    let email    = update.email.as_deref().map(str::to_lowercase);
    let name     = update.name;
    let label    = username.clone().unwrap_or_else(|| id.to_string());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE accounts SET
             name     = COALESCE(?2, name),
             username = COALESCE(?3, username),
             email    = COALESCE(?4, email)
           WHERE id = ?1",
          rusqlite::params![id, name, username, email],
        )?)
      })
      .await
      .map_err(|e| constraint_to_duplicate(e, &label))?;

    if changed == 0 {
      return Err(Error::AccountNotFound(id));
    }

    self.find_unique(id).await?.ok_or(Error::AccountNotFound(id))
  }

  /// Delete an account. Returns `false` if it did not exist.
  pub async fn delete_account(&self, id: AccountId) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute("DELETE FROM accounts WHERE id = ?1", [id])?))
      .await?;
    Ok(changed > 0)
  }

  async fn select_account(
    &self,
    clause: &'static str,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<Option<Account>> {
    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {clause} ORDER BY id LIMIT 1");
        Ok(conn
          .query_row(&sql, rusqlite::params_from_iter(params), RawAccount::from_row)
          .optional()?)
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }
}

/// Turn a UNIQUE violation into [`Error::Duplicate`].
fn constraint_to_duplicate(e: tokio_rusqlite::Error, what: &str) -> Error {
  match e {
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(failure, _))
      if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
    {
      Error::Duplicate(what.to_string())
    }
    other => Error::Database(other),
  }
}

// ─── AccountStore impl ───────────────────────────────────────────────────────

impl AccountStore for SqliteStore {
  type Error = Error;

  async fn find_first(&self, query: &AccountQuery) -> Result<Option<Account>> {
    use rusqlite::types::Value;

    self
      .select_account(
        "(username = ?1 OR (?2 AND email = ?1))
         AND (NOT ?3 OR email_verified IS NOT NULL)",
        vec![
          Value::Text(query.identifier.clone()),
          Value::Integer(query.match_email.into()),
          Value::Integer(query.require_verified_email.into()),
        ],
      )
      .await
  }

  async fn find_unique(&self, id: AccountId) -> Result<Option<Account>> {
    self
      .select_account("id = ?1", vec![rusqlite::types::Value::Integer(id)])
      .await
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
    self
      .select_account("email = ?1", vec![rusqlite::types::Value::Text(email.to_string())])
      .await
  }

  async fn mark_email_verified(&self, id: AccountId, at: DateTime<Utc>) -> Result<()> {
    let at_str = encode_dt(at);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE accounts SET email_verified = ?2 WHERE id = ?1",
          rusqlite::params![id, at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::AccountNotFound(id));
    }
    Ok(())
  }
}

// ─── VerificationStore impl ──────────────────────────────────────────────────

impl VerificationStore for SqliteStore {
  type Error = Error;

  async fn create_verification(&self, token: VerificationToken) -> Result<()> {
    let expires_str = encode_dt(token.expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO verification_tokens (identifier, token_hash, expires_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![token.identifier, token.token_hash, expires_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn use_verification(
    &self,
    identifier: &str,
    token_hash: &str,
  ) -> Result<Option<VerificationToken>> {
    let identifier = identifier.to_string();
    let token_hash = token_hash.to_string();

    let raw: Option<RawVerificationToken> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "DELETE FROM verification_tokens
             WHERE identifier = ?1 AND token_hash = ?2
             RETURNING identifier, token_hash, expires_at",
            rusqlite::params![identifier, token_hash],
            |row| {
              Ok(RawVerificationToken {
                identifier: row.get(0)?,
                token_hash: row.get(1)?,
                expires_at: row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawVerificationToken::into_token).transpose()
  }

  async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
    let now_str = encode_dt(now);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM verification_tokens WHERE expires_at < ?1",
          rusqlite::params![now_str],
        )?)
      })
      .await?;

    if removed > 0 {
      tracing::debug!(removed, "purged expired verification tokens");
    }
    Ok(removed as u64)
  }
}
