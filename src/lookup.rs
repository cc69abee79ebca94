use crate::data::WordEntry;
use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use std::num::NonZeroUsize;
use std::time::Duration;
use tracing::{debug, warn};

/// Fetches full entries for a single word.
///
/// `None` means "no data": not found, HTTP failure, timeout or an
/// undecodable body all collapse into it.
#[async_trait]
pub trait WordLookup: Send + Sync {
    async fn lookup(&self, word: &str) -> Option<Vec<WordEntry>>;
}

/// Returns the first entry for `word`, or a placeholder when the lookup has nothing.
pub async fn lookup_first(lookup: &dyn WordLookup, word: &str) -> WordEntry {
    lookup
        .lookup(word)
        .await
        .and_then(|entries| entries.into_iter().next())
        .unwrap_or_else(|| WordEntry::placeholder(word))
}

pub struct DictionaryApiClient {
    client: reqwest::Client,
    base_url: String,
    cache: Mutex<LruCache<String, Vec<WordEntry>>>,
}

impl DictionaryApiClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        cache_capacity: usize,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, cache_capacity))
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        cache_capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            client,
            base_url: base_url.into(),
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn url_for(&self, word: &str) -> String {
        let encoded = utf8_percent_encode(word, NON_ALPHANUMERIC);
        if self.base_url.ends_with('/') {
            format!("{}{}", self.base_url, encoded)
        } else {
            format!("{}/{}", self.base_url, encoded)
        }
    }

    async fn fetch(&self, word: &str) -> Option<Vec<WordEntry>> {
        let url = self.url_for(word);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(word, %err, "dictionary lookup request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            debug!(word, status = response.status().as_u16(), "dictionary lookup miss");
            return None;
        }
        match response.json::<Vec<WordEntry>>().await {
            Ok(entries) if !entries.is_empty() => {
                Some(entries.into_iter().map(WordEntry::normalize).collect())
            }
            Ok(_) => None,
            Err(err) => {
                warn!(word, %err, "dictionary lookup returned an unreadable body");
                None
            }
        }
    }
}

#[async_trait]
impl WordLookup for DictionaryApiClient {
    async fn lookup(&self, word: &str) -> Option<Vec<WordEntry>> {
        let key = word.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }
        if let Some(hit) = self.cache.lock().get(&key).cloned() {
            return Some(hit);
        }
        let entries = self.fetch(&key).await?;
        self.cache.lock().put(key, entries.clone());
        Some(entries)
    }
}
