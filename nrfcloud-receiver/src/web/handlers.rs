//! Webhook endpoint handlers.
//!
//! The nRF Cloud handler runs its gates in a fixed order, each of which can
//! end the request:
//! 1. Required configuration present (500)
//! 2. POST only (405)
//! 3. Signature header present and matching the raw body (401)
//! 4. Body is JSON (400)
//! 5. Verification handshake acknowledged (200)
//!
//! Past the gates the batch is persisted and the answer is always 200.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::payload::{classify, WebhookPayload};
use crate::persist::persist_messages;
use crate::store::StoreFactory;
use crate::web::signature::{verify_signature, SignatureCheck, SIGNATURE_HEADER};
use crate::Config;

pub const INTERNAL_ERROR: &str = "Internal Server Error";
pub const METHOD_NOT_ALLOWED: &str = "Method Not Allowed";
pub const MISSING_SIGNATURE: &str = "Unauthorized: Missing signature";
pub const INVALID_SIGNATURE: &str = "Unauthorized: Invalid signature";
pub const INVALID_JSON: &str = "Invalid JSON";
pub const VERIFICATION_ACKNOWLEDGED: &str = "Verification request acknowledged";
pub const PROCESSING_COMPLETE: &str = "Webhook processing complete";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub stores: Arc<dyn StoreFactory>,
}

impl AppState {
    pub fn new(config: Config, stores: impl StoreFactory + 'static) -> Self {
        Self {
            config: Arc::new(config),
            stores: Arc::new(stores),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// nRF Cloud Webhook
// =============================================================================

/// nRF Cloud webhook endpoint.
///
/// Mounted for every method so that non-POST requests get the plain-text
/// 405 below rather than axum's empty one.
pub async fn nrfcloud_webhook(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let config = state.config.as_ref();

    let Some(required) = config.required() else {
        error!(
            missing = ?config.missing_required(),
            "nrfcloud_config_missing"
        );
        return (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR);
    };

    if method != Method::POST {
        warn!(method = %method, "nrfcloud_method_not_allowed");
        return (StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED);
    }

    let Some(signature) = headers
        .get(SIGNATURE_HEADER)
        .filter(|v| !v.as_bytes().is_empty())
    else {
        warn!("nrfcloud_signature_missing");
        return (StatusCode::UNAUTHORIZED, MISSING_SIGNATURE);
    };
    let received = String::from_utf8_lossy(signature.as_bytes());

    match verify_signature(required.webhook_secret, &body, &received) {
        SignatureCheck::Valid => {
            info!(body_length = body.len(), "nrfcloud_signature_verified");
        }
        SignatureCheck::Mismatch { expected } => {
            warn!(
                expected = %expected,
                received = %received,
                "nrfcloud_signature_invalid"
            );
            return (StatusCode::UNAUTHORIZED, INVALID_SIGNATURE);
        }
        SignatureCheck::InvalidKey => {
            return (StatusCode::UNAUTHORIZED, INVALID_SIGNATURE);
        }
    }

    let payload = match classify(&body) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "nrfcloud_invalid_json");
            return (StatusCode::BAD_REQUEST, INVALID_JSON);
        }
    };

    match payload {
        WebhookPayload::Verification(verification) => {
            info!(
                token = verification.token.as_deref().unwrap_or_default(),
                has_token = verification.token.is_some(),
                "nrfcloud_verification_received"
            );
            return (StatusCode::OK, VERIFICATION_ACKNOWLEDGED);
        }
        WebhookPayload::Telemetry(batch) => {
            let store = state.stores.open(config);
            persist_messages(
                store.as_ref(),
                required.database_id,
                required.collection_id,
                &batch.messages,
            )
            .await;
        }
        WebhookPayload::Unrecognized => {
            info!("nrfcloud_no_messages");
        }
    }

    (StatusCode::OK, PROCESSING_COMPLETE)
}
