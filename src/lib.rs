mod app;
mod config;
mod corpus;
mod data;
mod error;
mod favorites;
mod history;
mod lookup;
mod remote;
mod state;
mod storage;
mod sync;
mod user_words;

#[cfg(feature = "web")]
pub mod web;

pub use app::{Dictionary, Parts, SearchOutcome};
pub use config::{
    Config, DEFAULT_BATCH_SIZE, DEFAULT_CORPUS_URL, DEFAULT_LOOKUP_BASE_URL, DEFAULT_PAGE_SIZE,
};
pub use corpus::{CorpusSource, RemoteCorpus, SessionCorpus, StaticCorpus, corpus_keys};
pub use data::{Definition, Meaning, Phonetic, WordEntry};
pub use error::{CorpusError, RemoteDocumentError, StorageError, SyncError};
pub use favorites::FavoritesStore;
pub use history::{HistoryPolicy, HistoryStore};
pub use lookup::{DictionaryApiClient, WordLookup, lookup_first};
pub use remote::{HttpDocumentStore, MemoryDocumentStore, RemoteDocumentStore, UserDocument};
pub use state::{
    Action, AppState, AppStore, AuthAction, AuthState, FavoritesAction, FavoritesState,
    FetchMode, HistoryAction, HistoryState, RequestId, Status, WordListAction, WordListState,
};
pub use storage::{
    FAVORITES_KEY, FileStore, HISTORY_KEY, KeyValueStore, LEGACY_USER_WORDS_KEY, MemoryStore,
    USER_WORDS_KEY, read_string_list, write_string_list,
};
pub use sync::{FetchOutcome, WordListSynchronizer, fetch_entries, merge_words, page_slice};
pub use user_words::UserWordStore;
