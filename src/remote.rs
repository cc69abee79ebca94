use crate::error::RemoteDocumentError;
use async_trait::async_trait;
use parking_lot::RwLock;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Per-user document mirrored to a remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(default)]
    pub favorites: Vec<String>,
    #[serde(default)]
    pub history: Vec<String>,
}

#[async_trait]
pub trait RemoteDocumentStore: Send + Sync {
    async fn load(&self, user: &str) -> Result<Option<UserDocument>, RemoteDocumentError>;
    async fn save(&self, user: &str, document: &UserDocument) -> Result<(), RemoteDocumentError>;
}

/// Documents served as JSON at `{base}/users/{user}`.
pub struct HttpDocumentStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDocumentStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url_for(&self, user: &str) -> String {
        format!(
            "{}/users/{}",
            self.base_url.trim_end_matches('/'),
            utf8_percent_encode(user, NON_ALPHANUMERIC)
        )
    }
}

#[async_trait]
impl RemoteDocumentStore for HttpDocumentStore {
    async fn load(&self, user: &str) -> Result<Option<UserDocument>, RemoteDocumentError> {
        let response = self.client.get(self.url_for(user)).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(RemoteDocumentError::Status(status.as_u16()));
        }
        Ok(Some(response.json().await?))
    }

    async fn save(&self, user: &str, document: &UserDocument) -> Result<(), RemoteDocumentError> {
        let response = self
            .client
            .put(self.url_for(user))
            .json(document)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(RemoteDocumentError::Status(status.as_u16()))
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<String, UserDocument>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user: &str) -> Option<UserDocument> {
        self.documents.read().get(user).cloned()
    }
}

#[async_trait]
impl RemoteDocumentStore for MemoryDocumentStore {
    async fn load(&self, user: &str) -> Result<Option<UserDocument>, RemoteDocumentError> {
        Ok(self.get(user))
    }

    async fn save(&self, user: &str, document: &UserDocument) -> Result<(), RemoteDocumentError> {
        self.documents
            .write()
            .insert(user.to_string(), document.clone());
        Ok(())
    }
}

/// Reads the user's document (empty if absent), applies `update`, and writes it back.
pub async fn update_document(
    remote: &dyn RemoteDocumentStore,
    user: &str,
    update: impl FnOnce(&mut UserDocument) + Send,
) -> Result<UserDocument, RemoteDocumentError> {
    let mut document = remote.load(user).await?.unwrap_or_default();
    update(&mut document);
    remote.save(user, &document).await?;
    Ok(document)
}
