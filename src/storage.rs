use crate::error::StorageError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use tracing::warn;

pub const USER_WORDS_KEY: &str = "customWordList";
pub const LEGACY_USER_WORDS_KEY: &str = "userWords";
pub const FAVORITES_KEY: &str = "favoritesList";
pub const HISTORY_KEY: &str = "historyList";

/// String key-value persistence that survives process restarts.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

fn io_error(key: &str, source: std::io::Error) -> StorageError {
    StorageError::Io {
        key: key.to_string(),
        source,
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(key, err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|e| io_error(key, e))?;
        let path = self.path_for(key);
        let temp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path).map_err(|e| io_error(key, e))?;
            file.write_all(value.as_bytes())
                .map_err(|e| io_error(key, e))?;
            file.sync_all().map_err(|e| io_error(key, e))?;
        }
        fs::rename(&temp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            io_error(key, e)
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(key, err)),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.write().remove(key);
        Ok(())
    }
}

/// Reads a JSON string array. `Ok(None)` when nothing is stored under `key`.
pub fn try_read_string_list(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<Vec<String>>, StorageError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StorageError::Json {
            key: key.to_string(),
            source,
        })
}

/// Reads a JSON string array, treating absent or unreadable values as empty.
pub fn read_string_list(store: &dyn KeyValueStore, key: &str) -> Vec<String> {
    match try_read_string_list(store, key) {
        Ok(list) => list.unwrap_or_default(),
        Err(err) => {
            warn!(key, %err, "discarding unreadable stored list");
            Vec::new()
        }
    }
}

/// Persists a string array. Failures are logged and reported as `false`.
pub fn write_string_list(store: &dyn KeyValueStore, key: &str, values: &[String]) -> bool {
    let encoded = match serde_json::to_string(values) {
        Ok(encoded) => encoded,
        Err(err) => {
            warn!(key, %err, "failed to encode list for storage");
            return false;
        }
    };
    match store.set(key, &encoded) {
        Ok(()) => true,
        Err(err) => {
            warn!(key, %err, "failed to persist list");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_store_round_trips_and_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("nested"));
        assert_eq!(store.get(FAVORITES_KEY).unwrap(), None);
        assert!(write_string_list(&store, FAVORITES_KEY, &["apple".to_string()]));

        let reopened = FileStore::new(temp_dir.path().join("nested"));
        assert_eq!(read_string_list(&reopened, FAVORITES_KEY), vec!["apple"]);
        assert!(!temp_dir.path().join("nested/favoritesList.tmp").exists());

        reopened.remove(FAVORITES_KEY).unwrap();
        reopened.remove(FAVORITES_KEY).unwrap();
        assert!(read_string_list(&reopened, FAVORITES_KEY).is_empty());
    }

    #[test]
    fn corrupt_value_reads_as_empty() {
        let store = MemoryStore::new();
        store.set(HISTORY_KEY, "{not json").unwrap();
        assert!(read_string_list(&store, HISTORY_KEY).is_empty());
        assert!(matches!(
            try_read_string_list(&store, HISTORY_KEY),
            Err(StorageError::Json { .. })
        ));
    }

    #[test]
    fn keys_are_sanitized_into_file_names() {
        let store = FileStore::new("/data");
        assert_eq!(store.path_for("../etc"), PathBuf::from("/data/___etc.json"));
    }

    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(io_error(key, std::io::Error::from(ErrorKind::PermissionDenied)))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_is_reported_not_raised() {
        assert!(!write_string_list(&ReadOnlyStore, USER_WORDS_KEY, &[]));
    }
}
