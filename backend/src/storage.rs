//! Remote document library boundary.
//!
//! Uploads go to a SharePoint library through the Microsoft Graph API: a
//! client-credentials token from the tenant's OAuth2 endpoint, then a `PUT` of
//! the raw bytes to the drive path. The portal treats the whole exchange as an
//! opaque one-shot call: no retry and no compensating deletion; a failure
//! aborts the surrounding request as a dependency error.

use chrono::Utc;
use serde::Deserialize;

use crate::config::GraphConfig;
use crate::error::ApiError;

/// A document ready to be pushed to the remote library.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

/// Boundary trait so the consent flows can be exercised against an in-memory
/// store in tests. Returns the URL under which the stored document is
/// reachable.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    async fn upload(&self, file: FileUpload, document_id: &str) -> Result<String, ApiError>;
}

#[derive(Clone)]
pub struct SharePointStore {
    client: reqwest::Client,
    graph: GraphConfig,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct DriveItem {
    #[serde(rename = "webUrl", default)]
    web_url: String,
}

impl SharePointStore {
    pub fn new(graph: GraphConfig) -> SharePointStore {
        SharePointStore {
            client: reqwest::Client::new(),
            graph,
        }
    }

    /// Client-credentials token for the Graph default scope. Fetched per
    /// upload; tokens are not cached.
    async fn acquire_token(&self) -> Result<String, ApiError> {
        let url = format!(
            "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
            self.graph.tenant_id
        );
        let form = [
            ("client_id", self.graph.client_id.as_str()),
            ("client_secret", self.graph.client_secret.as_str()),
            ("scope", "https://graph.microsoft.com/.default"),
            ("grant_type", "client_credentials"),
        ];
        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| ApiError::Storage(format!("token request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(ApiError::Storage(format!(
                "token request failed with status {}",
                response.status()
            )));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Storage(format!("token response unreadable: {}", e)))?;
        Ok(token.access_token)
    }
}

impl DocumentStore for SharePointStore {
    async fn upload(&self, file: FileUpload, document_id: &str) -> Result<String, ApiError> {
        let token = self.acquire_token().await?;

        // Prefix with the patient document and upload time so repeated uploads
        // for the same patient never collide in the library.
        let stored_name = format!(
            "{}_{}_{}",
            document_id,
            Utc::now().timestamp_millis(),
            file.file_name
        );
        let url = format!(
            "https://graph.microsoft.com/v1.0/sites/{}/drive/root:/{}/{}:/content",
            self.graph.site_id, self.graph.library, stored_name
        );

        let response = self
            .client
            .put(&url)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, file.content_type)
            .body(file.bytes)
            .send()
            .await
            .map_err(|e| ApiError::Storage(format!("upload request failed: {}", e)))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Storage(format!(
                "upload failed with status {}: {}",
                status, body
            )));
        }

        let item: DriveItem = response
            .json()
            .await
            .map_err(|e| ApiError::Storage(format!("upload response unreadable: {}", e)))?;
        Ok(item.web_url)
    }
}
