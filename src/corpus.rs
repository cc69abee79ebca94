use crate::error::CorpusError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Source of the base vocabulary.
#[async_trait]
pub trait CorpusSource: Send + Sync {
    async fn fetch_words(&self) -> Result<Arc<Vec<String>>, CorpusError>;
}

/// Static JSON document whose top-level keys are the word list.
pub struct RemoteCorpus {
    client: reqwest::Client,
    url: String,
}

impl RemoteCorpus {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl CorpusSource for RemoteCorpus {
    async fn fetch_words(&self) -> Result<Arc<Vec<String>>, CorpusError> {
        debug!(url = %self.url, "fetching word corpus");
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CorpusError::Status(status.as_u16()));
        }
        let bytes = response.bytes().await?;
        let words = corpus_keys(&bytes)?;
        info!(count = words.len(), "word corpus loaded");
        Ok(Arc::new(words))
    }
}

/// Extracts the top-level keys of a JSON object in document order.
pub fn corpus_keys(bytes: &[u8]) -> Result<Vec<String>, CorpusError> {
    match serde_json::from_slice::<Value>(bytes)? {
        Value::Object(map) => Ok(map.into_iter().map(|(key, _)| key).collect()),
        _ => Err(CorpusError::NotAnObject),
    }
}

/// Fetches the wrapped source at most once per session. Failures are not
/// remembered, so a later call tries again.
pub struct SessionCorpus<S> {
    source: S,
    words: OnceCell<Arc<Vec<String>>>,
}

impl<S: CorpusSource> SessionCorpus<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            words: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.words.initialized()
    }
}

#[async_trait]
impl<S: CorpusSource> CorpusSource for SessionCorpus<S> {
    async fn fetch_words(&self) -> Result<Arc<Vec<String>>, CorpusError> {
        self.words
            .get_or_try_init(|| self.source.fetch_words())
            .await
            .cloned()
    }
}

/// In-memory corpus for offline use.
#[derive(Debug, Clone, Default)]
pub struct StaticCorpus {
    words: Arc<Vec<String>>,
}

impl StaticCorpus {
    pub fn new<I, W>(words: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<String>,
    {
        Self {
            words: Arc::new(words.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl CorpusSource for StaticCorpus {
    async fn fetch_words(&self) -> Result<Arc<Vec<String>>, CorpusError> {
        Ok(self.words.clone())
    }
}
