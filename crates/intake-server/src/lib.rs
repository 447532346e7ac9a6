//! HTTP server assembly for the application intake.
//!
//! Mounts the [`intake_api`] routers under `/api`, guards the staff routes
//! with HTTP Basic authentication, and adds the upload endpoint plus static
//! serving of uploaded files.

pub mod auth;
pub mod error;
pub mod upload;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, extract::DefaultBodyLimit, middleware, routing::post};
use intake_api::AppState;
use intake_core::store::ApplicationStore;
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};

use auth::StaffAccount;
use upload::UploadConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  /// Origin used for shareable links and upload URLs.
  pub public_base_url: String,
  pub store_path:      PathBuf,
  pub upload_dir:      PathBuf,
  #[serde(default)]
  pub staff:           Vec<StaffAccount>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete application router.
pub fn router<S>(store: S, config: &ServerConfig) -> Router
where
  S: ApplicationStore + Clone + 'static,
{
  let state = AppState::new(store, config.public_base_url.as_str());
  let accounts: Arc<[StaffAccount]> = config.staff.clone().into();
  let uploads = Arc::new(UploadConfig {
    dir:             config.upload_dir.clone(),
    public_base_url: config.public_base_url.clone(),
  });

  let admin = intake_api::admin_router(state.clone())
    .layer(middleware::from_fn_with_state(accounts, auth::require_staff));

  let upload = Router::new()
    .route("/uploads", post(upload::handler))
    .layer(DefaultBodyLimit::max(upload::BODY_LIMIT))
    .with_state(uploads);

  let api = intake_api::public_router(state).nest("/admin", admin).merge(upload);

  Router::new()
    .nest("/api", api)
    .nest_service("/uploads", ServeDir::new(&config.upload_dir))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────
