use crate::storage::{
    KeyValueStore, LEGACY_USER_WORDS_KEY, USER_WORDS_KEY, read_string_list, try_read_string_list,
    write_string_list,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

/// Words the user explicitly added, persisted in insertion order without duplicates.
pub struct UserWordStore {
    store: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl UserWordStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the stored words, or an empty list when nothing readable is stored.
    pub fn load(&self) -> Vec<String> {
        match try_read_string_list(self.store.as_ref(), USER_WORDS_KEY) {
            Ok(Some(words)) => words,
            Ok(None) => read_string_list(self.store.as_ref(), LEGACY_USER_WORDS_KEY),
            Err(err) => {
                warn!(%err, "user word list unreadable, starting empty");
                Vec::new()
            }
        }
    }

    /// Appends `word` unless it is blank or already stored. Returns whether it was added.
    pub fn add(&self, word: &str) -> bool {
        let word = word.trim();
        if word.is_empty() {
            return false;
        }
        let _guard = self.write_lock.lock();
        let mut words = self.load();
        if words.iter().any(|w| w == word) {
            debug!(word, "user word already stored");
            return false;
        }
        words.push(word.to_string());
        write_string_list(self.store.as_ref(), USER_WORDS_KEY, &words);
        true
    }

    pub fn contains(&self, word: &str) -> bool {
        let word = word.trim();
        self.load().iter().any(|w| w == word)
    }
}
