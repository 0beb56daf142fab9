//! Web server module for handling nRF Cloud webhooks.
//!
//! This module provides the router the binary serves:
//! - `/` and `/webhooks/nrfcloud`: the webhook handler, for every method
//! - `/health`: liveness probe

pub mod handlers;
pub mod signature;

use axum::{
    routing::{any, get},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{health, nrfcloud_webhook, AppState, HealthResponse};
pub use signature::{compute_signature, verify_signature, SignatureCheck, SIGNATURE_HEADER};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", any(nrfcloud_webhook))
        .route("/webhooks/nrfcloud", any(nrfcloud_webhook))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
