//! JSON REST API for medbay.
//!
//! Exposes an axum [`Router`] backed by any
//! [`medbay_core::store::InjuryStore`]. Every route requires HTTP Basic auth;
//! the authenticated username is recorded as the author of the injuries and
//! follow-ups written through it. TLS is the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = medbay_api::router(AppState::new(store, users));
//! ```

pub mod auth;
pub mod catalog;
pub mod error;
pub mod injuries;
pub mod reports;
pub mod roster;
pub mod transfer;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use medbay_core::store::InjuryStore;
use tower_http::trace::TraceLayer;

pub use auth::{AuthConfig, Authenticated};
pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store: Arc<S>,
  pub users: Arc<[AuthConfig]>,
}

impl<S> AppState<S> {
  pub fn new(store: S, users: Vec<AuthConfig>) -> Self {
    Self { store: Arc::new(store), users: users.into() }
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), users: Arc::clone(&self.users) }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: InjuryStore + 'static,
{
  Router::new()
    // Catalog and roster
    .route("/catalog", get(catalog::get::<S>))
    .route("/squads", get(roster::list_squads::<S>))
    .route("/players", get(roster::list_players::<S>).post(roster::upsert_player::<S>))
    .route("/players/{id}", get(roster::get_player::<S>))
    .route("/players/{id}/injuries", get(roster::player_injuries::<S>))
    // Injuries
    .route("/injuries", get(injuries::list::<S>).post(injuries::create::<S>))
    .route("/injuries/{id}", get(injuries::get_one::<S>))
    .route("/injuries/{id}/follow-ups", post(injuries::follow_up::<S>))
    // Reports
    .route("/reports/summary", get(reports::summary::<S>))
    .route("/reports/trends", get(reports::trends::<S>))
    .route("/reports/recent", get(reports::recent::<S>))
    .route("/reports/distribution", get(reports::distribution::<S>))
    // Import / export
    .route("/export", get(transfer::export::<S>))
    .route("/import", post(transfer::import::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
