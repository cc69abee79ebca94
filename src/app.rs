use crate::config::Config;
use crate::corpus::{CorpusSource, RemoteCorpus, SessionCorpus};
use crate::data::WordEntry;
use crate::favorites::FavoritesStore;
use crate::history::HistoryStore;
use crate::lookup::{DictionaryApiClient, WordLookup};
use crate::remote::{HttpDocumentStore, RemoteDocumentStore};
use crate::state::{AppStore, AuthAction};
use crate::storage::{FileStore, KeyValueStore};
use crate::sync::WordListSynchronizer;
use crate::user_words::UserWordStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Result of searching for a word to add to the user's list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SearchOutcome {
    Blank,
    NotFound { word: String },
    Added { entry: WordEntry },
    AlreadyKnown { entry: WordEntry },
}

/// Everything the application needs, wired around one shared [`AppStore`].
pub struct Dictionary {
    app: AppStore,
    lookup: Arc<dyn WordLookup>,
    user_words: Arc<UserWordStore>,
    synchronizer: WordListSynchronizer,
    favorites: FavoritesStore,
    history: HistoryStore,
}

/// Pluggable backends for [`Dictionary::with_parts`].
pub struct Parts {
    pub local: Arc<dyn KeyValueStore>,
    pub lookup: Arc<dyn WordLookup>,
    pub corpus: Arc<dyn CorpusSource>,
    pub remote: Option<Arc<dyn RemoteDocumentStore>>,
}

impl Dictionary {
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let lookup = DictionaryApiClient::new(
            config.lookup_base_url.clone(),
            config.request_timeout,
            config.lookup_cache_capacity,
        )?;
        let corpus = SessionCorpus::new(RemoteCorpus::new(
            config.corpus_url.clone(),
            config.request_timeout,
        )?);
        let remote: Option<Arc<dyn RemoteDocumentStore>> = match &config.remote_documents_url {
            Some(url) => Some(Arc::new(HttpDocumentStore::new(
                url.clone(),
                config.request_timeout,
            )?)),
            None => None,
        };
        info!(
            data_dir = %config.data_dir.display(),
            remote = remote.is_some(),
            "dictionary configured"
        );
        Ok(Self::with_parts(
            config,
            Parts {
                local: Arc::new(FileStore::new(config.data_dir.clone())),
                lookup: Arc::new(lookup),
                corpus: Arc::new(corpus),
                remote,
            },
        ))
    }

    pub fn with_parts(config: &Config, parts: Parts) -> Self {
        let app = AppStore::new();
        let user_words = Arc::new(UserWordStore::new(parts.local.clone()));
        let synchronizer = WordListSynchronizer::new(
            app.clone(),
            user_words.clone(),
            parts.corpus,
            parts.lookup.clone(),
            config.page_size,
            config.batch_size,
        );
        let favorites = FavoritesStore::new(app.clone(), parts.local.clone(), parts.remote.clone());
        let history = HistoryStore::new(
            app.clone(),
            parts.local,
            parts.remote,
            config.history_policy,
        );
        Self {
            app,
            lookup: parts.lookup,
            user_words,
            synchronizer,
            favorites,
            history,
        }
    }

    pub fn store(&self) -> &AppStore {
        &self.app
    }

    pub fn words(&self) -> &WordListSynchronizer {
        &self.synchronizer
    }

    pub fn user_words(&self) -> &UserWordStore {
        &self.user_words
    }

    pub fn favorites(&self) -> &FavoritesStore {
        &self.favorites
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Loads favorites and history into state.
    pub async fn restore(&self) {
        tokio::join!(self.favorites.load(), self.history.load());
    }

    /// Looks `term` up and, when the dictionary knows it, adds its canonical
    /// spelling to the user's word list.
    pub async fn search(&self, term: &str) -> SearchOutcome {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return SearchOutcome::Blank;
        }
        let Some(entry) = self
            .lookup
            .lookup(&term)
            .await
            .and_then(|entries| entries.into_iter().next())
        else {
            return SearchOutcome::NotFound { word: term };
        };
        if self.user_words.add(&entry.word) {
            SearchOutcome::Added { entry }
        } else {
            SearchOutcome::AlreadyKnown { entry }
        }
    }

    /// Looks `word` up and records the visit in history when it is found.
    pub async fn define(&self, word: &str) -> Option<Vec<WordEntry>> {
        let entries = self.lookup.lookup(word).await?;
        if let Some(first) = entries.first() {
            self.history.add(&first.word).await;
        }
        Some(entries)
    }

    pub fn sign_in(&self, user: impl Into<String>) {
        self.app.dispatch(AuthAction::SignedIn(user.into()));
    }

    pub fn sign_out(&self) {
        self.app.dispatch(AuthAction::SignedOut);
    }

    pub fn continue_as_guest(&self) {
        self.app.dispatch(AuthAction::ContinueAsGuest);
    }
}
