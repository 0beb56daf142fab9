//! nRF Cloud webhook receiver.
//!
//! Authenticates nRF Cloud message webhooks and stores each device message as
//! a document in an Appwrite collection.
//!
//! ## Flow
//!
//! ```text
//! nRF Cloud → POST / → signature check → classify → persist_messages → Appwrite
//! ```

pub mod config;
pub mod payload;
pub mod persist;
pub mod store;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use payload::{classify, Message, WebhookPayload};
pub use persist::{persist_messages, BatchSummary};
pub use store::{
    AppwriteClient, AppwriteStoreFactory, CreatedDocument, DocumentStore,
    StoreError, StoreFactory, StoredRecord, UNIQUE_ID,
};
pub use web::{router, AppState};
