use thiserror::Error;

/// Failures while fetching the remote word corpus. These are fatal to the fetch
/// that triggered them.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("corpus request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("corpus endpoint answered with HTTP {0}")]
    Status(u16),
    #[error("corpus document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("corpus document is not a JSON object")]
    NotAnObject,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("stored value for key {key} is not valid JSON: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum RemoteDocumentError {
    #[error("remote document request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("remote document endpoint answered with HTTP {0}")]
    Status(u16),
}

/// The only error a word list fetch surfaces; everything else is absorbed.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to load word corpus: {0}")]
    Corpus(#[from] CorpusError),
}
