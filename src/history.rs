use crate::remote::{RemoteDocumentStore, update_document};
use crate::state::{AppStore, HistoryAction, HistoryState};
use crate::storage::{HISTORY_KEY, KeyValueStore, read_string_list, write_string_list};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::warn;

pub use crate::state::HistoryPolicy;

/// Visited words, newest first. Persistence follows the same per-call
/// remote-or-local rule as favorites.
pub struct HistoryStore {
    app: AppStore,
    local: Arc<dyn KeyValueStore>,
    remote: Option<Arc<dyn RemoteDocumentStore>>,
    policy: HistoryPolicy,
    write_lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(
        app: AppStore,
        local: Arc<dyn KeyValueStore>,
        remote: Option<Arc<dyn RemoteDocumentStore>>,
        policy: HistoryPolicy,
    ) -> Self {
        Self {
            app,
            local,
            remote,
            policy,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn load(&self) -> Vec<String> {
        let history = match self.remote_target() {
            Some((user, remote)) => match remote.load(&user).await {
                Ok(document) => document.map(|d| d.history).unwrap_or_default(),
                Err(err) => {
                    warn!(%user, %err, "remote history unavailable, using local copy");
                    read_string_list(self.local.as_ref(), HISTORY_KEY)
                }
            },
            None => read_string_list(self.local.as_ref(), HISTORY_KEY),
        };
        self.app.dispatch(HistoryAction::Set(history));
        self.app.history()
    }

    pub fn list(&self) -> Vec<String> {
        self.app.history()
    }

    /// Records a visit to `word`. Returns whether the history changed.
    pub async fn add(&self, word: &str) -> bool {
        let word = word.trim();
        if word.is_empty() {
            return false;
        }
        let visit = HistoryAction::Visit {
            word: word.to_string(),
            policy: self.policy,
        };
        if !self.app.dispatch(visit.clone()) {
            return false;
        }
        self.persist(visit).await;
        true
    }

    /// Empties history in state and in whichever store backs it, even when
    /// nothing was loaded into state.
    pub async fn clear(&self) {
        self.app.dispatch(HistoryAction::Clear);
        self.persist(HistoryAction::Clear).await;
    }

    fn remote_target(&self) -> Option<(String, &dyn RemoteDocumentStore)> {
        let remote = self.remote.as_deref()?;
        let user = self.app.current_user()?;
        Some((user, remote))
    }

    async fn persist(&self, action: HistoryAction) {
        if let Some((user, remote)) = self.remote_target() {
            let remote_action = action.clone();
            let result = update_document(remote, &user, |document| {
                let stored = std::mem::take(&mut document.history);
                document.history = apply_action(stored, remote_action);
            })
            .await;
            match result {
                Ok(_) => return,
                Err(err) => warn!(%user, %err, "remote history update failed, saving locally"),
            }
        }
        self.save_local(action);
    }

    fn save_local(&self, action: HistoryAction) {
        let _guard = self.write_lock.lock();
        let stored = read_string_list(self.local.as_ref(), HISTORY_KEY);
        write_string_list(self.local.as_ref(), HISTORY_KEY, &apply_action(stored, action));
    }
}

fn apply_action(history: Vec<String>, action: HistoryAction) -> Vec<String> {
    let mut state = HistoryState { history };
    state.reduce(action);
    state.history
}
