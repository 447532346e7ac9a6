//! JSON REST API for the application intake.
//!
//! Exposes two axum [`Router`]s backed by any
//! [`intake_core::store::ApplicationStore`]: the public surface (submission,
//! email check, shared views) and the staff surface. Authentication, TLS and
//! transport concerns are the caller's responsibility; admin handlers read
//! the authenticated [`StaffUser`] from a request extension.
//!
//! # Mounting
//!
//! ```rust,ignore
//! Router::new()
//!   .nest("/api", intake_api::public_router(state.clone()))
//!   .nest("/api/admin", intake_api::admin_router(state).layer(auth))
//! ```

pub mod applications;
pub mod error;
pub mod export;
pub mod favorites;
pub mod sharing;
pub mod submissions;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use intake_core::store::ApplicationStore;

pub use error::ApiError;

/// Shared state threaded through all handlers.
#[derive(Clone)]
pub struct AppState<S> {
  pub store:           Arc<S>,
  /// Origin used to build shareable links, e.g. `https://jobs.example.com`.
  pub public_base_url: Arc<str>,
}

impl<S> AppState<S> {
  pub fn new(store: S, public_base_url: impl Into<Arc<str>>) -> Self {
    Self { store: Arc::new(store), public_base_url: public_base_url.into() }
  }
}

/// The authenticated staff member, inserted by the caller's auth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffUser(pub String);

/// Routes reachable without authentication.
pub fn public_router<S>(state: AppState<S>) -> Router<()>
where
  S: ApplicationStore + Clone + 'static,
{
  Router::new()
    .route("/applications", post(submissions::submit::<S>))
    .route("/applications/email-available", get(submissions::email_available::<S>))
    .route("/public/{token}", get(sharing::public_view::<S>))
    .with_state(state)
}

/// Staff routes. Every handler expects a [`StaffUser`] extension.
pub fn admin_router<S>(state: AppState<S>) -> Router<()>
where
  S: ApplicationStore + Clone + 'static,
{
  Router::new()
    .route("/applications", get(applications::list::<S>))
    .route("/applications/{id}", get(applications::get_one::<S>))
    .route("/applications/{id}/public", post(sharing::set_public::<S>))
    .route(
      "/applications/{id}/favorite",
      get(favorites::status::<S>).post(favorites::toggle::<S>),
    )
    .route("/favorites", get(favorites::list::<S>))
    .route("/export", post(export::handler::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
