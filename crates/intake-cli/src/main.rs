//! `intake`: fill in a job application from the terminal and work the
//! staff side of the intake API.
//!
//! # Usage
//!
//! ```
//! intake set firstName Ada
//! intake next
//! intake upload ~/cv.pdf
//! intake --server https://jobs.example.com submit
//! intake --username alice --password secret admin list --status active
//! intake --config ~/.config/intake/config.toml admin export --format json
//! ```
//!
//! The draft is kept in `~/.intake/draft.json` (override with `--draft`)
//! and survives between invocations until it is submitted or reset.

mod admin;
mod client;
mod draft_file;
mod wizard;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use draft_file::FileStorage;
use intake_core::wizard::{DraftStorage, FormController};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "intake", about = "Apply for a remote position, or review applications")]
struct Args {
  /// Path to a TOML config file (server, username, password, draft).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the intake server (default: http://localhost:8080).
  #[arg(long, env = "INTAKE_SERVER")]
  server: Option<String>,

  /// Where the in-progress draft is kept (default: ~/.intake/draft.json).
  #[arg(long, env = "INTAKE_DRAFT")]
  draft: Option<PathBuf>,

  /// Staff username for `admin` commands.
  #[arg(long, env = "INTAKE_USER")]
  username: Option<String>,

  /// Staff password (plaintext).
  #[arg(long, env = "INTAKE_PASSWORD")]
  password: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  #[command(flatten)]
  Wizard(wizard::WizardCommand),
  /// Throw the saved draft away and start over.
  Reset,
  /// Staff commands; need `--username` and `--password`.
  Admin {
    #[command(subcommand)]
    command: admin::AdminCommand,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  server:   String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
  #[serde(default)]
  draft:    Option<PathBuf>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .server
      .or_else(|| (!file_cfg.server.is_empty()).then(|| file_cfg.server.clone()))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    username: args
      .username
      .or_else(|| (!file_cfg.username.is_empty()).then(|| file_cfg.username.clone()))
      .unwrap_or_default(),
    password: args
      .password
      .or_else(|| (!file_cfg.password.is_empty()).then(|| file_cfg.password.clone()))
      .unwrap_or_default(),
  };
  let draft_path = expand_tilde(
    &args
      .draft
      .or(file_cfg.draft)
      .unwrap_or_else(|| PathBuf::from("~/.intake/draft.json")),
  );

  let client = ApiClient::new(api_config)?;

  match args.command {
    Command::Wizard(command) => {
      let mut wizard = FormController::hydrate(FileStorage::new(draft_path));
      wizard::run(&mut wizard, &client, command).await
    }
    Command::Reset => {
      let mut storage = FileStorage::new(draft_path);
      storage.clear()?;
      println!("Cleared the draft at {}.", storage.path().display());
      Ok(())
    }
    Command::Admin { command } => admin::run(&client, command).await,
  }
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
