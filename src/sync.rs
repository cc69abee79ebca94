
use crate::corpus::CorpusSource;
use crate::data::WordEntry;
use crate::error::{CorpusError, SyncError};
use crate::lookup::{WordLookup, lookup_first};
use crate::state::{AppStore, FetchMode, RequestId, WordListAction};
use crate::user_words::UserWordStore;
use futures_util::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Concatenates `corpus` and `user`, keeping the first occurrence of each word.
pub fn merge_words(corpus: &[String], user: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(corpus.len() + user.len());
    corpus
        .iter()
        .chain(user.iter())
        .filter(|word| seen.insert(word.as_str()))
        .cloned()
        .collect()
}

/// Returns `words[page * page_size .. page * page_size + page_size]`, clamped;
/// empty past the end.
pub fn page_slice(words: &[String], page: usize, page_size: usize) -> &[String] {
    let Some(start) = page.checked_mul(page_size) else {
        return &[];
    };
    if start >= words.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(words.len());
    &words[start..end]
}

/// Looks up every word, `batch_size` at a time. Each batch runs concurrently
/// and completes before the next starts. Output order matches `words`; words
/// with no data become placeholders.
pub async fn fetch_entries(
    lookup: &dyn WordLookup,
    words: &[String],
    batch_size: usize,
) -> Vec<WordEntry> {
    let mut entries = Vec::with_capacity(words.len());
    for (index, batch) in words.chunks(batch_size.max(1)).enumerate() {
        debug!(batch = index, size = batch.len(), "fetching definition batch");
        let results = join_all(batch.iter().map(|word| lookup_first(lookup, word))).await;
        entries.extend(results);
    }
    entries
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "count", rename_all = "snake_case")]
pub enum FetchOutcome {
    Loaded(usize),
    NoMoreData,
    Superseded,
    Busy,
}

pub struct WordListSynchronizer {
    app: AppStore,
    user_words: Arc<UserWordStore>,
    corpus: Arc<dyn CorpusSource>,
    lookup: Arc<dyn WordLookup>,
    page_size: usize,
    batch_size: usize,
}

impl WordListSynchronizer {
    pub fn new(
        app: AppStore,
        user_words: Arc<UserWordStore>,
        corpus: Arc<dyn CorpusSource>,
        lookup: Arc<dyn WordLookup>,
        page_size: usize,
        batch_size: usize,
    ) -> Self {
        Self {
            app,
            user_words,
            corpus,
            lookup,
            page_size: page_size.max(1),
            batch_size: batch_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub async fn merged_words(&self) -> Result<Vec<String>, CorpusError> {
        let (user, corpus) = tokio::join!(
            async { self.user_words.load() },
            self.corpus.fetch_words()
        );
        Ok(merge_words(&corpus?, &user))
    }

    /// Fetches one page (`Some(page)`) or the whole list (`None`) into the
    /// word list state. A newer call supersedes an older one still in flight.
    pub async fn fetch(&self, page: Option<usize>) -> Result<FetchOutcome, SyncError> {
        let mode = page.map_or(FetchMode::All, FetchMode::Page);
        let request = self.app.next_request_id();
        self.app.dispatch(WordListAction::Pending { request, mode });
        self.run(request, mode).await
    }

    pub async fn fetch_next_page(&self) -> Result<FetchOutcome, SyncError> {
        let request = self.app.next_request_id();
        let started = self.app.with_word_list(|state| {
            if state.in_flight.is_some() {
                return Err(FetchOutcome::Busy);
            }
            if state.exhausted {
                return Err(FetchOutcome::NoMoreData);
            }
            let mode = FetchMode::Page(state.next_page);
            state.reduce(WordListAction::Pending { request, mode });
            Ok(mode)
        });
        match started {
            Ok(mode) => self.run(request, mode).await,
            Err(outcome) => Ok(outcome),
        }
    }

    async fn run(&self, request: RequestId, mode: FetchMode) -> Result<FetchOutcome, SyncError> {
        debug!(request, ?mode, "word list fetch started");
        let words = match self.merged_words().await {
            Ok(words) => words,
            Err(err) => {
                let rejected = WordListAction::Rejected {
                    request,
                    message: err.to_string(),
                };
                if !self.app.dispatch(rejected) {
                    debug!(request, %err, "discarding failure of superseded word list fetch");
                    return Ok(FetchOutcome::Superseded);
                }
                warn!(request, %err, "word list fetch failed");
                return Err(err.into());
            }
        };

        let selected = match mode {
            FetchMode::Page(page) => {
                let slice = page_slice(&words, page, self.page_size);
                if slice.is_empty() {
                    debug!(request, page, "no more words");
                    return Ok(self.settle(
                        WordListAction::NoMoreData { request },
                        FetchOutcome::NoMoreData,
                    ));
                }
                slice
            }
            FetchMode::All => &words[..],
        };

        let entries = fetch_entries(self.lookup.as_ref(), selected, self.batch_size).await;
        let count = entries.len();
        debug!(request, count, "word list fetch finished");
        Ok(self.settle(
            WordListAction::Fulfilled { request, entries },
            FetchOutcome::Loaded(count),
        ))
    }

    fn settle(&self, action: WordListAction, outcome: FetchOutcome) -> FetchOutcome {
        if self.app.dispatch(action) {
            outcome
        } else {
            debug!("discarding superseded word list response");
            FetchOutcome::Superseded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::StaticCorpus;
    use crate::state::Status;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn strings(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    /// Knows every word except those starting with "xyz"; later words in a
    /// batch answer sooner so completion order differs from input order.
    #[derive(Default)]
    struct FakeLookup {
        active: AtomicUsize,
        peak: AtomicUsize,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl WordLookup for FakeLookup {
        async fn lookup(&self, word: &str) -> Option<Vec<WordEntry>> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.lock().push(word.to_string());
            let delay = 30u64.saturating_sub(word.len() as u64 * 3);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            if word.starts_with("xyz") {
                return None;
            }
            let entry: WordEntry = serde_json::from_value(serde_json::json!({
                "word": word,
                "phonetics": [{"text": format!("/{word}/")}],
                "meanings": [{"definitions": [{"definition": format!("meaning of {word}")}]}]
            }))
            .unwrap();
            Some(vec![entry])
        }
    }

    struct FailingCorpus;

    #[async_trait]
    impl CorpusSource for FailingCorpus {
        async fn fetch_words(&self) -> Result<Arc<Vec<String>>, CorpusError> {
            Err(CorpusError::Status(502))
        }
    }

    struct SlowFailingCorpus;

    #[async_trait]
    impl CorpusSource for SlowFailingCorpus {
        async fn fetch_words(&self) -> Result<Arc<Vec<String>>, CorpusError> {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Err(CorpusError::Status(503))
        }
    }

    fn synchronizer(
        corpus: Arc<dyn CorpusSource>,
        user: &[&str],
        page_size: usize,
        batch_size: usize,
    ) -> (WordListSynchronizer, AppStore, Arc<FakeLookup>) {
        let app = AppStore::new();
        let user_words = Arc::new(UserWordStore::new(Arc::new(MemoryStore::new())));
        for word in user {
            user_words.add(word);
        }
        let lookup = Arc::new(FakeLookup::default());
        let sync = WordListSynchronizer::new(
            app.clone(),
            user_words,
            corpus,
            lookup.clone(),
            page_size,
            batch_size,
        );
        (sync, app, lookup)
    }

    #[test]
    fn merge_keeps_corpus_order_then_new_user_words() {
        let merged = merge_words(
            &strings(&["apple", "banana", "cherry"]),
            &strings(&["banana", "date"]),
        );
        assert_eq!(merged, strings(&["apple", "banana", "cherry", "date"]));
        assert_eq!(page_slice(&merged, 0, 2), &merged[0..2]);
    }

    #[test]
    fn merge_dedups_within_each_source() {
        let merged = merge_words(&strings(&["a", "a", "b"]), &strings(&["b", "c", "c"]));
        assert_eq!(merged, strings(&["a", "b", "c"]));
    }

    #[test]
    fn every_page_matches_the_flat_slice() {
        let words: Vec<String> = (0..123).map(|i| format!("w{i}")).collect();
        for page in 0..4 {
            let start = (page * 50).min(words.len());
            let end = (page * 50 + 50).min(words.len());
            assert_eq!(page_slice(&words, page, 50), &words[start..end]);
        }
        assert!(page_slice(&words, 3, 50).is_empty());
        assert!(page_slice(&words, usize::MAX, 50).is_empty());
    }

    #[tokio::test]
    async fn batches_preserve_order_and_bound_concurrency() {
        let lookup = FakeLookup::default();
        let words: Vec<String> = (0..45).map(|i| format!("word{i}")).collect();
        let entries = fetch_entries(&lookup, &words, 20).await;
        let returned: Vec<_> = entries.iter().map(|e| e.word.clone()).collect();
        assert_eq!(returned, words);
        assert!(lookup.peak.load(Ordering::SeqCst) <= 20);
        assert_eq!(lookup.calls.lock().len(), 45);
    }

    #[tokio::test]
    async fn failed_lookup_becomes_placeholder() {
        let lookup = FakeLookup::default();
        let words = strings(&["apple", "xyzzynotaword", "banana"]);
        let entries = fetch_entries(&lookup, &words, 2).await;
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1], WordEntry::placeholder("xyzzynotaword"));
        assert!(!entries[0].is_placeholder());
        assert!(!entries[2].is_placeholder());
    }

    #[tokio::test]
    async fn first_page_of_merged_scenario() {
        let corpus = Arc::new(StaticCorpus::new(["apple", "banana", "cherry"]));
        let (sync, app, _) = synchronizer(corpus, &["banana", "date"], 2, 20);
        assert_eq!(
            sync.merged_words().await.unwrap(),
            strings(&["apple", "banana", "cherry", "date"])
        );
        assert_eq!(sync.fetch(Some(0)).await.unwrap(), FetchOutcome::Loaded(2));
        let state = app.word_list();
        let words: Vec<_> = state.words.iter().map(|e| e.word.as_str()).collect();
        assert_eq!(words, vec!["apple", "banana"]);
        assert_eq!(state.status, Status::Succeeded);
    }

    #[tokio::test]
    async fn next_page_walks_until_exhausted() {
        let corpus = Arc::new(StaticCorpus::new(["apple", "banana", "cherry"]));
        let (sync, app, _) = synchronizer(corpus, &["date", "elderberry"], 2, 1);
        assert_eq!(sync.fetch_next_page().await.unwrap(), FetchOutcome::Loaded(2));
        assert_eq!(sync.fetch_next_page().await.unwrap(), FetchOutcome::Loaded(2));
        assert_eq!(sync.fetch_next_page().await.unwrap(), FetchOutcome::Loaded(1));
        assert_eq!(sync.fetch_next_page().await.unwrap(), FetchOutcome::NoMoreData);
        assert_eq!(sync.fetch_next_page().await.unwrap(), FetchOutcome::NoMoreData);
        let state = app.word_list();
        assert_eq!(state.words.len(), 5);
        assert!(state.exhausted);
        assert_eq!(state.status, Status::Succeeded);
    }

    #[tokio::test]
    async fn page_past_end_is_not_an_error() {
        let corpus = Arc::new(StaticCorpus::new(["apple"]));
        let (sync, app, lookup) = synchronizer(corpus, &[], 50, 20);
        assert_eq!(sync.fetch(Some(4)).await.unwrap(), FetchOutcome::NoMoreData);
        assert!(lookup.calls.lock().is_empty());
        assert_eq!(app.word_list().status, Status::Succeeded);
        assert!(app.word_list().error.is_none());
    }

    #[tokio::test]
    async fn load_all_replaces_existing_words() {
        let corpus = Arc::new(StaticCorpus::new(["apple", "banana"]));
        let (sync, app, _) = synchronizer(corpus, &["xyzword"], 1, 20);
        sync.fetch(Some(0)).await.unwrap();
        assert_eq!(sync.fetch(None).await.unwrap(), FetchOutcome::Loaded(3));
        let state = app.word_list();
        assert_eq!(state.words.len(), 3);
        assert!(state.words[2].is_placeholder());
    }

    #[tokio::test]
    async fn corpus_failure_marks_state_failed() {
        let (sync, app, _) = synchronizer(Arc::new(FailingCorpus), &["date"], 50, 20);
        let err = sync.fetch(Some(0)).await.unwrap_err();
        assert!(matches!(err, SyncError::Corpus(CorpusError::Status(502))));
        let state = app.word_list();
        assert_eq!(state.status, Status::Failed);
        assert!(state.error.unwrap().contains("502"));
        assert!(state.in_flight.is_none());
    }

    #[tokio::test]
    async fn overlapping_next_page_calls_do_not_double_fetch() {
        let corpus = Arc::new(StaticCorpus::new(["apple", "banana", "cherry"]));
        let (sync, app, lookup) = synchronizer(corpus, &[], 2, 20);
        let (first, second) = tokio::join!(sync.fetch_next_page(), sync.fetch_next_page());
        let mut outcomes = vec![first.unwrap(), second.unwrap()];
        outcomes.sort_by_key(|o| matches!(o, FetchOutcome::Busy));
        assert_eq!(outcomes, vec![FetchOutcome::Loaded(2), FetchOutcome::Busy]);
        assert_eq!(lookup.calls.lock().len(), 2);
        assert_eq!(app.word_list().next_page, 1);
    }

    #[tokio::test]
    async fn newer_request_supersedes_older_one() {
        let corpus = Arc::new(StaticCorpus::new(["apple", "banana", "cherry", "date"]));
        let (sync, app, _) = synchronizer(corpus, &[], 2, 20);
        let (older, newer) = tokio::join!(sync.fetch(Some(0)), async {
            tokio::task::yield_now().await;
            sync.fetch(Some(1)).await
        });
        assert_eq!(older.unwrap(), FetchOutcome::Superseded);
        assert_eq!(newer.unwrap(), FetchOutcome::Loaded(2));
        let words: Vec<_> = app
            .word_list()
            .words
            .iter()
            .map(|e| e.word.clone())
            .collect();
        assert_eq!(words, strings(&["cherry", "date"]));
    }

    #[tokio::test]
    async fn failure_of_superseded_request_is_not_an_error() {
        let (sync, app, _) = synchronizer(Arc::new(SlowFailingCorpus), &[], 2, 20);
        let (older, newer) = tokio::join!(sync.fetch(Some(0)), async {
            tokio::task::yield_now().await;
            let request = app.next_request_id();
            app.dispatch(WordListAction::Pending {
                request,
                mode: FetchMode::Page(0),
            });
            request
        });
        assert_eq!(older.unwrap(), FetchOutcome::Superseded);
        let state = app.word_list();
        assert_eq!(state.status, Status::Loading);
        assert!(state.error.is_none());
        assert_eq!(state.in_flight.map(|f| f.request), Some(newer));
    }

    #[tokio::test]
    async fn corpus_timeout_marks_state_failed() {
        use crate::corpus::RemoteCorpus;
        use axum::{Router, routing::get};

        let router = Router::new().route(
            "/words.json",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                r#"{"apple": 1}"#
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        let corpus = RemoteCorpus::new(
            format!("http://{addr}/words.json"),
            Duration::from_millis(200),
        )
        .unwrap();
        let (sync, app, lookup) = synchronizer(Arc::new(corpus), &["date"], 50, 20);
        let err = sync.fetch(Some(0)).await.unwrap_err();
        assert!(matches!(err, SyncError::Corpus(CorpusError::Network(_))));
        assert_eq!(app.word_list().status, Status::Failed);
        assert!(lookup.calls.lock().is_empty());
    }
}
