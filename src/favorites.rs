use crate::remote::{RemoteDocumentStore, update_document};
use crate::state::{AppStore, FavoritesAction, FavoritesState};
use crate::storage::{
    FAVORITES_KEY, KeyValueStore, read_string_list, try_read_string_list, write_string_list,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::warn;

/// Favorites kept in application state and persisted either to the signed-in
/// user's remote document or to local storage. The choice is made on every
/// call from the auth state at that moment.
pub struct FavoritesStore {
    app: AppStore,
    local: Arc<dyn KeyValueStore>,
    remote: Option<Arc<dyn RemoteDocumentStore>>,
    write_lock: Mutex<()>,
}

impl FavoritesStore {
    pub fn new(
        app: AppStore,
        local: Arc<dyn KeyValueStore>,
        remote: Option<Arc<dyn RemoteDocumentStore>>,
    ) -> Self {
        Self {
            app,
            local,
            remote,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn load(&self) -> Vec<String> {
        self.app.dispatch(FavoritesAction::LoadPending);
        if let Some((user, remote)) = self.remote_target() {
            match remote.load(&user).await {
                Ok(document) => {
                    let favorites = document.map(|d| d.favorites).unwrap_or_default();
                    self.app.dispatch(FavoritesAction::Loaded(favorites));
                    return self.app.favorites();
                }
                Err(err) => warn!(%user, %err, "remote favorites unavailable, using local copy"),
            }
        }
        match try_read_string_list(self.local.as_ref(), FAVORITES_KEY) {
            Ok(stored) => {
                self.app
                    .dispatch(FavoritesAction::Loaded(stored.unwrap_or_default()));
            }
            Err(err) => {
                warn!(%err, "failed to load favorites");
                self.app
                    .dispatch(FavoritesAction::LoadFailed(err.to_string()));
            }
        }
        self.app.favorites()
    }

    pub fn list(&self) -> Vec<String> {
        self.app.favorites()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.app.is_favorite(word.trim())
    }

    pub async fn add(&self, word: &str) -> bool {
        let word = word.trim();
        let add = FavoritesAction::Add(word.to_string());
        if word.is_empty() || !self.app.dispatch(add.clone()) {
            return false;
        }
        self.persist(add).await;
        true
    }

    pub async fn remove(&self, word: &str) -> bool {
        let word = word.trim();
        let remove = FavoritesAction::Remove(word.to_string());
        if !self.app.dispatch(remove.clone()) {
            return false;
        }
        self.persist(remove).await;
        true
    }

    /// Flips membership and returns whether `word` is now a favorite.
    pub async fn toggle(&self, word: &str) -> bool {
        if self.contains(word) {
            self.remove(word).await;
            false
        } else {
            self.add(word).await
        }
    }

    fn remote_target(&self) -> Option<(String, &dyn RemoteDocumentStore)> {
        let remote = self.remote.as_deref()?;
        let user = self.app.current_user()?;
        Some((user, remote))
    }

    async fn persist(&self, change: FavoritesAction) {
        if let Some((user, remote)) = self.remote_target() {
            let remote_change = change.clone();
            let result = update_document(remote, &user, |document| {
                document.favorites =
                    apply_change(std::mem::take(&mut document.favorites), remote_change);
            })
            .await;
            match result {
                Ok(_) => return,
                Err(err) => warn!(%user, %err, "remote favorites update failed, saving locally"),
            }
        }
        self.save_local(change);
    }

    // State may not be loaded yet, so apply the change to what is stored.
    fn save_local(&self, change: FavoritesAction) {
        let _guard = self.write_lock.lock();
        let stored = read_string_list(self.local.as_ref(), FAVORITES_KEY);
        write_string_list(self.local.as_ref(), FAVORITES_KEY, &apply_change(stored, change));
    }
}

fn apply_change(favorites: Vec<String>, change: FavoritesAction) -> Vec<String> {
    let mut state = FavoritesState {
        favorites,
        ..FavoritesState::default()
    };
    state.reduce(change);
    state.favorites
}
