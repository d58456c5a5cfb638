//! HTTP client for a remote document store.
//!
//! Endpoints:
//! - `GET    {base}/v1/users/{user}/{collection}` returns a JSON array
//! - `PUT    {base}/v1/users/{user}/{collection}/{id}` stores one document
//! - `DELETE {base}/v1/users/{user}/{collection}/{id}`

use super::{check_segment, Document, PersistenceError, PersistenceProvider};
use crate::config::RemoteSettings;
use crate::records::types::RecordId;
use async_trait::async_trait;

/// Remote document store client.
pub struct RemoteProvider {
    settings: RemoteSettings,
    client: reqwest::Client,
}

impl RemoteProvider {
    /// Create a new remote provider.
    pub fn new(settings: RemoteSettings) -> Result<Self, PersistenceError> {
        if settings.base_url.trim().is_empty() {
            return Err(PersistenceError::Config("remote base_url is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| PersistenceError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { settings, client })
    }

    /// URL of a user's collection.
    pub fn collection_url(&self, user_id: &str, collection: &str) -> Result<String, PersistenceError> {
        check_segment("user id", user_id)?;
        check_segment("collection", collection)?;
        Ok(format!(
            "{}/v1/users/{}/{}",
            self.settings.base_url.trim_end_matches('/'),
            user_id,
            collection
        ))
    }

    /// URL of a single document.
    pub fn record_url(
        &self,
        user_id: &str,
        collection: &str,
        id: RecordId,
    ) -> Result<String, PersistenceError> {
        Ok(format!("{}/{}", self.collection_url(user_id, collection)?, id))
    }

    /// Test connection to the store.
    pub async fn test_connection(&self) -> Result<bool, PersistenceError> {
        let url = format!("{}/health", self.settings.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PersistenceError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.settings.token)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, PersistenceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(PersistenceError::Server {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl PersistenceProvider for RemoteProvider {
    async fn load_collection(
        &self,
        user_id: &str,
        collection: &str,
    ) -> Result<Vec<Document>, PersistenceError> {
        let response = self
            .client
            .get(self.collection_url(user_id, collection)?)
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(|e| PersistenceError::Network(e.to_string()))?;

        check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| PersistenceError::Serialization(e.to_string()))
    }

    async fn save_record(
        &self,
        user_id: &str,
        collection: &str,
        id: RecordId,
        document: Document,
    ) -> Result<(), PersistenceError> {
        let response = self
            .client
            .put(self.record_url(user_id, collection, id)?)
            .header("Authorization", self.bearer())
            .json(&document)
            .send()
            .await
            .map_err(|e| PersistenceError::Network(e.to_string()))?;

        check_status(response).await.map(|_| ())
    }

    async fn delete_record(
        &self,
        user_id: &str,
        collection: &str,
        id: RecordId,
    ) -> Result<(), PersistenceError> {
        let response = self
            .client
            .delete(self.record_url(user_id, collection, id)?)
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(|e| PersistenceError::Network(e.to_string()))?;

        match check_status(response).await {
            Ok(_) | Err(PersistenceError::Server { status: 404, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
