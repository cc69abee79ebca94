
use crate::data::WordEntry;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub type RequestId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "page", rename_all = "lowercase")]
pub enum FetchMode {
    Page(usize),
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InFlight {
    pub request: RequestId,
    pub mode: FetchMode,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WordListState {
    pub words: Vec<WordEntry>,
    pub status: Status,
    pub error: Option<String>,
    pub next_page: usize,
    /// Set once a page comes back empty or everything was loaded at once.
    pub exhausted: bool,
    pub in_flight: Option<InFlight>,
}

#[derive(Debug, Clone)]
pub enum WordListAction {
    Pending { request: RequestId, mode: FetchMode },
    Fulfilled { request: RequestId, entries: Vec<WordEntry> },
    NoMoreData { request: RequestId },
    Rejected { request: RequestId, message: String },
}

impl WordListState {
    pub fn is_loading(&self) -> bool {
        self.status == Status::Loading
    }

    pub fn reduce(&mut self, action: WordListAction) -> bool {
        match action {
            WordListAction::Pending { request, mode } => {
                self.status = Status::Loading;
                self.error = None;
                self.in_flight = Some(InFlight { request, mode });
                true
            }
            WordListAction::Fulfilled { request, entries } => {
                let Some(mode) = self.settle(request) else {
                    return false;
                };
                match mode {
                    FetchMode::Page(0) => {
                        self.words = entries;
                        self.next_page = 1;
                        self.exhausted = false;
                    }
                    FetchMode::Page(page) => {
                        self.words.extend(entries);
                        self.next_page = page + 1;
                    }
                    FetchMode::All => {
                        self.words = entries;
                        self.exhausted = true;
                    }
                }
                self.status = Status::Succeeded;
                true
            }
            WordListAction::NoMoreData { request } => {
                if self.settle(request).is_none() {
                    return false;
                }
                self.exhausted = true;
                self.status = Status::Succeeded;
                true
            }
            WordListAction::Rejected { request, message } => {
                if self.settle(request).is_none() {
                    return false;
                }
                self.status = Status::Failed;
                self.error = Some(message);
                true
            }
        }
    }

    /// Clears the in-flight marker if `request` is the current one.
    fn settle(&mut self, request: RequestId) -> Option<FetchMode> {
        match self.in_flight {
            Some(current) if current.request == request => {
                self.in_flight = None;
                Some(current.mode)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FavoritesState {
    pub favorites: Vec<String>,
    pub status: Status,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum FavoritesAction {
    LoadPending,
    Loaded(Vec<String>),
    LoadFailed(String),
    Add(String),
    Remove(String),
}

impl FavoritesState {
    pub fn contains(&self, word: &str) -> bool {
        self.favorites.iter().any(|w| w == word)
    }

    pub fn reduce(&mut self, action: FavoritesAction) -> bool {
        match action {
            FavoritesAction::LoadPending => {
                self.status = Status::Loading;
                true
            }
            FavoritesAction::Loaded(favorites) => {
                self.favorites = dedup_preserving_order(favorites);
                self.status = Status::Succeeded;
                self.error = None;
                true
            }
            FavoritesAction::LoadFailed(message) => {
                self.status = Status::Failed;
                self.error = Some(message);
                true
            }
            FavoritesAction::Add(word) => {
                if self.contains(&word) {
                    return false;
                }
                self.favorites.push(word);
                true
            }
            FavoritesAction::Remove(word) => {
                let before = self.favorites.len();
                self.favorites.retain(|w| *w != word);
                self.favorites.len() != before
            }
        }
    }
}

/// How a revisit of a word already in history is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryPolicy {
    /// Move the word to the front.
    #[default]
    MostRecentFirst,
    /// Keep the first visit and ignore repeats.
    RejectDuplicates,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HistoryState {
    pub history: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum HistoryAction {
    Set(Vec<String>),
    Visit { word: String, policy: HistoryPolicy },
    Clear,
}

impl HistoryState {
    pub fn reduce(&mut self, action: HistoryAction) -> bool {
        match action {
            HistoryAction::Set(history) => {
                self.history = dedup_preserving_order(history);
                true
            }
            HistoryAction::Visit { word, policy } => {
                let position = self.history.iter().position(|w| *w == word);
                match (position, policy) {
                    (Some(0), _) => false,
                    (Some(_), HistoryPolicy::RejectDuplicates) => false,
                    (Some(index), HistoryPolicy::MostRecentFirst) => {
                        let word = self.history.remove(index);
                        self.history.insert(0, word);
                        true
                    }
                    (None, _) => {
                        self.history.insert(0, word);
                        true
                    }
                }
            }
            HistoryAction::Clear => {
                let changed = !self.history.is_empty();
                self.history.clear();
                changed
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuthState {
    pub user: Option<String>,
    pub guest: bool,
}

#[derive(Debug, Clone)]
pub enum AuthAction {
    SignedIn(String),
    SignedOut,
    ContinueAsGuest,
}

impl AuthState {
    pub fn reduce(&mut self, action: AuthAction) -> bool {
        match action {
            AuthAction::SignedIn(user) => {
                self.user = Some(user);
                self.guest = false;
            }
            AuthAction::SignedOut => {
                self.user = None;
                self.guest = false;
            }
            AuthAction::ContinueAsGuest => {
                self.user = None;
                self.guest = true;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AppState {
    pub word_list: WordListState,
    pub favorites: FavoritesState,
    pub history: HistoryState,
    pub auth: AuthState,
}

#[derive(Debug, Clone)]
pub enum Action {
    WordList(WordListAction),
    Favorites(FavoritesAction),
    History(HistoryAction),
    Auth(AuthAction),
}

impl From<WordListAction> for Action {
    fn from(value: WordListAction) -> Self {
        Action::WordList(value)
    }
}

impl From<FavoritesAction> for Action {
    fn from(value: FavoritesAction) -> Self {
        Action::Favorites(value)
    }
}

impl From<HistoryAction> for Action {
    fn from(value: HistoryAction) -> Self {
        Action::History(value)
    }
}

impl From<AuthAction> for Action {
    fn from(value: AuthAction) -> Self {
        Action::Auth(value)
    }
}

impl AppState {
    pub fn reduce(&mut self, action: Action) -> bool {
        match action {
            Action::WordList(action) => self.word_list.reduce(action),
            Action::Favorites(action) => self.favorites.reduce(action),
            Action::History(action) => self.history.reduce(action),
            Action::Auth(action) => self.auth.reduce(action),
        }
    }
}

/// Shared handle to the application state.
#[derive(Clone, Default)]
pub struct AppStore {
    shared: Arc<AppStoreShared>,
}

#[derive(Default)]
struct AppStoreShared {
    state: RwLock<AppState>,
    next_request: AtomicU64,
}

impl AppStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&self, action: impl Into<Action>) -> bool {
        self.shared.state.write().reduce(action.into())
    }

    pub fn next_request_id(&self) -> RequestId {
        self.shared.next_request.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn snapshot(&self) -> AppState {
        self.shared.state.read().clone()
    }

    pub fn word_list(&self) -> WordListState {
        self.shared.state.read().word_list.clone()
    }

    pub fn favorites(&self) -> Vec<String> {
        self.shared.state.read().favorites.favorites.clone()
    }

    pub fn favorites_state(&self) -> FavoritesState {
        self.shared.state.read().favorites.clone()
    }

    pub fn is_favorite(&self, word: &str) -> bool {
        self.shared.state.read().favorites.contains(word)
    }

    pub fn history(&self) -> Vec<String> {
        self.shared.state.read().history.history.clone()
    }

    /// Signed-in user at the moment of the call.
    pub fn current_user(&self) -> Option<String> {
        self.shared.state.read().auth.user.clone()
    }

    /// Runs `f` against the word list slice under a single write lock.
    pub(crate) fn with_word_list<R>(&self, f: impl FnOnce(&mut WordListState) -> R) -> R {
        f(&mut self.shared.state.write().word_list)
    }
}

pub(crate) fn dedup_preserving_order(words: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::with_capacity(words.len());
    words
        .into_iter()
        .filter(|word| seen.insert(word.clone()))
        .collect()
}
