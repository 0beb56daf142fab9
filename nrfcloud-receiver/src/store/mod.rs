//! Document store abstraction.
//!
//! The webhook handler only needs one operation from the database: create a
//! document. The trait keeps the handler testable without an Appwrite
//! instance; `AppwriteClient` is the production implementation.
//!
//! ```text
//! Config → StoreFactory::open() → Box<dyn DocumentStore> → create_document()
//! ```

pub mod appwrite;
pub mod error;
pub mod record;

use async_trait::async_trait;
use serde::Deserialize;

use crate::Config;

pub use appwrite::{AppwriteClient, AppwriteStoreFactory};
pub use error::StoreError;
pub use record::StoredRecord;

/// Document id placeholder; the store replaces it with a generated id.
pub const UNIQUE_ID: &str = "unique()";

/// Identifiers of a document the store accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedDocument {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$collectionId", default)]
    pub collection_id: String,
    #[serde(rename = "$databaseId", default)]
    pub database_id: String,
}

/// A document database that can create records.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create one document in `database_id`/`collection_id`.
    ///
    /// Pass `UNIQUE_ID` as `document_id` to have the store pick the id.
    async fn create_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: &StoredRecord,
    ) -> Result<CreatedDocument, StoreError>;
}

/// Builds a request-scoped store client from configuration.
pub trait StoreFactory: Send + Sync {
    fn open(&self, config: &Config) -> Box<dyn DocumentStore>;
}
