//! SQL schema for the Gatehouse SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- username and email are stored lowercase; lookups compare exactly.
CREATE TABLE IF NOT EXISTS accounts (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    username       TEXT NOT NULL UNIQUE,
    name           TEXT,
    email          TEXT UNIQUE,
    email_verified TEXT,             -- RFC 3339 UTC, NULL until proven
    password_hash  TEXT,             -- argon2 PHC string, NULL for link-only
    created_at     TEXT NOT NULL
);

-- Outstanding sign-in links. Rows are deleted when redeemed.
CREATE TABLE IF NOT EXISTS verification_tokens (
    identifier TEXT NOT NULL,
    token_hash TEXT NOT NULL UNIQUE,
    expires_at TEXT NOT NULL,
    PRIMARY KEY (identifier, token_hash)
);

CREATE INDEX IF NOT EXISTS verification_expires_idx ON verification_tokens(expires_at);

PRAGMA user_version = 1;
";
