//! gatehouse server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) overlaid with
//! `GATEHOUSE_*` environment variables, opens the SQLite account store, and
//! serves the auth endpoints over HTTP.
//!
//! # Creating an account
//!
//! ```
//! cargo run -p gatehouse-server --bin server -- add-account --username alice --email alice@example.com --verified
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::Utc;
use clap::{Parser, Subcommand};
use gatehouse_core::{
  account::NewAccount,
  credentials::hash_password,
  settings::{AuthMethod, AuthSettings},
};
use gatehouse_server::{AppState, ServerConfig, mail::WebhookMailer};
use gatehouse_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Gatehouse authentication server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve HTTP (the default).
  Serve,
  /// Print the argon2 hash for a password entered on stdin and exit.
  HashPassword,
  /// Create an account. The password is read from stdin; leave it empty
  /// for an email-link-only account.
  AddAccount {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email:    Option<String>,
    #[arg(long)]
    name:     Option<String>,
    /// Mark the email address as already verified.
    #[arg(long)]
    verified: bool,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  match cli.command.unwrap_or(Command::Serve) {
    Command::HashPassword => {
      let password = read_password()?;
      let hash = hash_password(&password).context("failed to hash password")?;
      println!("{hash}");
      Ok(())
    }
    Command::AddAccount { username, email, name, verified } => {
      let cfg = load_config(&cli.config)?;
      let store = open_store(&cfg).await?;

      let mut account = NewAccount::new(&username);
      if let Some(email) = email.as_deref() {
        account = account.with_email(email);
      }
      if let Some(name) = name {
        account = account.with_name(name);
      }
      if verified {
        account = account.verified_at(Utc::now());
      }
      let password = read_password()?;
      if !password.is_empty() {
        account = account.with_password_hash(hash_password(&password).context("failed to hash password")?);
      }

      let created = store.create_account(account).await.context("failed to create account")?;
      println!("created account {} ({})", created.id, created.username);
      Ok(())
    }
    Command::Serve => serve(load_config(&cli.config)?).await,
  }
}

async fn serve(cfg: ServerConfig) -> anyhow::Result<()> {
  let store = open_store(&cfg).await?;
  let settings = AuthSettings::resolve(&cfg.auth_env());

  let mailer = match settings.email_method() {
    Some(AuthMethod::Email { server, from }) => {
      Some(WebhookMailer::new(server.clone(), from.clone()).context("failed to build mail client")?)
    }
    _ => None,
  };

  tracing::info!(
    methods = ?settings.methods().iter().map(AuthMethod::id).collect::<Vec<_>>(),
    billing = settings.billing_enabled(),
    grace_period_secs = settings.grace_period.as_seconds(),
    "auth settings resolved"
  );

  let address = format!("{}:{}", cfg.host, cfg.port);
  let state = AppState::new(store, mailer, cfg, settings).context("failed to build billing client")?;
  let app = gatehouse_server::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<ServerConfig> {
  config::Config::builder()
    .add_source(config::File::from(path.to_path_buf()).required(false))
    .add_source(config::Environment::with_prefix("GATEHOUSE"))
    .build()
    .context("failed to read config file")?
    .try_deserialize()
    .context("failed to deserialise ServerConfig")
}

async fn open_store(cfg: &ServerConfig) -> anyhow::Result<SqliteStore> {
  let store_path = expand_tilde(&cfg.store_path);
  SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
