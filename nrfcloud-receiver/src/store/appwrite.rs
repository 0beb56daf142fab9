//! Appwrite Databases REST client.
//!
//! Only document creation is implemented:
//! `POST {endpoint}/databases/{databaseId}/collections/{collectionId}/documents`
//! Reference: https://appwrite.io/docs/references/cloud/server-rest/databases#createDocument

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CreatedDocument, DocumentStore, StoreError, StoreFactory, StoredRecord};
use crate::Config;

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const KEY_HEADER: &str = "X-Appwrite-Key";

/// Request body of createDocument.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateDocumentBody<'a> {
    document_id: &'a str,
    data: &'a StoredRecord,
}

/// Error body Appwrite returns with non-2xx responses.
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

/// Appwrite client bound to one project.
#[derive(Clone)]
pub struct AppwriteClient {
    http: Client,
    endpoint: String,
    project_id: Option<String>,
    api_key: Option<String>,
}

impl AppwriteClient {
    /// Create a client over an existing connection pool.
    pub fn new(
        http: Client,
        endpoint: impl Into<String>,
        project_id: Option<String>,
        api_key: Option<String>,
    ) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self {
            http,
            endpoint,
            project_id,
            api_key,
        }
    }

    /// Create a client from the Appwrite settings in `config`.
    pub fn from_config(http: Client, config: &Config) -> Self {
        Self::new(
            http,
            config.appwrite_endpoint.clone(),
            config.appwrite_project_id.clone(),
            config.appwrite_api_key.clone(),
        )
    }

    fn documents_url(&self, database_id: &str, collection_id: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint, database_id, collection_id
        )
    }
}

#[async_trait]
impl DocumentStore for AppwriteClient {
    async fn create_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: &StoredRecord,
    ) -> Result<CreatedDocument, StoreError> {
        let url = self.documents_url(database_id, collection_id);

        let mut request = self.http.post(&url).json(&CreateDocumentBody {
            document_id,
            data,
        });
        if let Some(project_id) = &self.project_id {
            request = request.header(PROJECT_HEADER, project_id.as_str());
        }
        if let Some(api_key) = &self.api_key {
            request = request.header(KEY_HEADER, api_key.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        debug!(
            url = %url,
            status_code = status.as_u16(),
            body_length = body.len(),
            "appwrite_create_document_response"
        );

        if !status.is_success() {
            return Err(rejection(status, &body));
        }

        serde_json::from_slice(&body).map_err(|e| StoreError::InvalidResponse(e.to_string()))
    }
}

/// Turn a non-success response into a `StoreError`, keeping Appwrite's message.
fn rejection(status: StatusCode, body: &[u8]) -> StoreError {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(err) => StoreError::Rejected {
            status: status.as_u16(),
            kind: err.kind,
            message: err.message,
        },
        Err(_) => StoreError::Rejected {
            status: status.as_u16(),
            kind: None,
            message: String::from_utf8_lossy(body).into_owned(),
        },
    }
}

/// Hands out Appwrite clients that share one HTTP connection pool.
#[derive(Clone)]
pub struct AppwriteStoreFactory {
    http: Client,
}

impl AppwriteStoreFactory {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

impl StoreFactory for AppwriteStoreFactory {
    fn open(&self, config: &Config) -> Box<dyn DocumentStore> {
        Box::new(AppwriteClient::from_config(self.http.clone(), config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::UNIQUE_ID;

    #[test]
    fn test_documents_url_trims_slash() {
        let client = AppwriteClient::new(Client::new(), "https://appwrite.example.com/v1/", None, None);
        assert_eq!(
            client.documents_url("telemetry", "messages"),
            "https://appwrite.example.com/v1/databases/telemetry/collections/messages/documents"
        );
    }

    #[test]
    fn test_create_document_body() {
        let record = StoredRecord {
            device_id: Some("nrf-1".to_string()),
            app_id: None,
            timestamp: None,
            payload: Some("{}".to_string()),
        };
        let body = serde_json::to_value(CreateDocumentBody {
            document_id: UNIQUE_ID,
            data: &record,
        })
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "documentId": "unique()",
                "data": {"deviceId": "nrf-1", "payload": "{}"}
            })
        );
    }

    #[test]
    fn test_rejection_parses_appwrite_error() {
        let body = br#"{"message":"Invalid document structure","code":400,"type":"document_invalid_structure","version":"1.5.7"}"#;
        match rejection(StatusCode::BAD_REQUEST, body) {
            StoreError::Rejected { status, kind, message } => {
                assert_eq!(status, 400);
                assert_eq!(kind.as_deref(), Some("document_invalid_structure"));
                assert_eq!(message, "Invalid document structure");
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }
    }

    #[test]
    fn test_rejection_plain_body() {
        match rejection(StatusCode::BAD_GATEWAY, b"upstream down") {
            StoreError::Rejected { status, kind, message } => {
                assert_eq!(status, 502);
                assert!(kind.is_none());
                assert_eq!(message, "upstream down");
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }
    }
}
