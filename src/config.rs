use crate::history::HistoryPolicy;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LOOKUP_BASE_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en/";
pub const DEFAULT_CORPUS_URL: &str =
    "https://raw.githubusercontent.com/dwyl/english-words/master/words_dictionary.json";
pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const DEFAULT_BATCH_SIZE: usize = 20;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_LOOKUP_CACHE_CAPACITY: usize = 512;

#[derive(Debug, Clone)]
pub struct Config {
    pub lookup_base_url: String,
    pub corpus_url: String,
    /// Base URL of the per-user document service; `None` keeps everything local.
    pub remote_documents_url: Option<String>,
    pub page_size: usize,
    pub batch_size: usize,
    pub request_timeout: Duration,
    pub lookup_cache_capacity: usize,
    pub data_dir: PathBuf,
    pub history_policy: HistoryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lookup_base_url: DEFAULT_LOOKUP_BASE_URL.to_string(),
            corpus_url: DEFAULT_CORPUS_URL.to_string(),
            remote_documents_url: None,
            page_size: DEFAULT_PAGE_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            lookup_cache_capacity: DEFAULT_LOOKUP_CACHE_CAPACITY,
            data_dir: PathBuf::from("wordbook-data"),
            history_policy: HistoryPolicy::default(),
        }
    }
}

impl Config {
    pub fn with_lookup_base_url(mut self, url: impl Into<String>) -> Self {
        self.lookup_base_url = url.into();
        self
    }

    pub fn with_corpus_url(mut self, url: impl Into<String>) -> Self {
        self.corpus_url = url.into();
        self
    }

    pub fn with_remote_documents_url(mut self, url: Option<String>) -> Self {
        self.remote_documents_url = url;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_history_policy(mut self, policy: HistoryPolicy) -> Self {
        self.history_policy = policy;
        self
    }
}
