//! Errors returned by document store clients.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The request never produced a response (connect failure, timeout).
    #[error("request to document store failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("document store rejected request: HTTP {status}: {message}")]
    Rejected {
        status: u16,
        /// Appwrite error type, e.g. `document_invalid_structure`
        kind: Option<String>,
        message: String,
    },

    /// The store answered 2xx but the body was not a document.
    #[error("unexpected document store response: {0}")]
    InvalidResponse(String),
}

impl StoreError {
    /// HTTP status of a rejected request.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}
