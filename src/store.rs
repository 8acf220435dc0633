//! Local key-value persistence for the user profile, tab list and post list.
//!
//! Values are JSON text. Dates go through chrono's serde support, so they are
//! written as RFC 3339 strings and parsed back into `DateTime<Utc>` on load.

use crate::feed::types::{Post, Tab, User};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const USER_KEY: &str = "user";
pub const TABS_KEY: &str = "tabs";
pub const POSTS_KEY: &str = "posts";

pub trait KvStore: Send + Sync {
    /// `None` when the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
}

/// One `<key>.json` file per key inside `dir`.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create store directory: {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            anyhow::bail!("invalid store key: {:?}", key);
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        // Write-then-rename so a crash never leaves a half-written value.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| anyhow::anyhow!("store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| anyhow::anyhow!("store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| anyhow::anyhow!("store lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

pub fn save<T: Serialize + ?Sized>(store: &dyn KvStore, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", key))?;
    store.set(key, &json)
}

/// Absent, unreadable and corrupt values all come back as `None`; the last two
/// are logged.
pub fn load<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %format!("{:#}", e), "failed to read stored value");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding corrupt stored value");
            None
        }
    }
}

/// Whatever was persisted by a previous session.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub user: Option<User>,
    pub tabs: Option<Vec<Tab>>,
    pub posts: Option<Vec<Post>>,
}

pub fn load_snapshot(store: &dyn KvStore) -> Snapshot {
    Snapshot {
        user: load(store, USER_KEY),
        // An empty tab list is not a usable state; treat it as absent.
        tabs: load::<Vec<Tab>>(store, TABS_KEY).filter(|t| !t.is_empty()),
        posts: load(store, POSTS_KEY),
    }
}

pub fn clear(store: &dyn KvStore) -> Result<()> {
    for key in [USER_KEY, TABS_KEY, POSTS_KEY] {
        store.delete(key)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::mock::MockFeed;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_memory_store_get_set_delete() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.delete("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.set(TABS_KEY, "[]").unwrap();
        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get(TABS_KEY).unwrap().as_deref(), Some("[]"));
        reopened.delete(TABS_KEY).unwrap();
        reopened.delete(TABS_KEY).unwrap();
        assert_eq!(reopened.get(TABS_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(store.set("../escape", "x").is_err());
        assert!(store.get("").is_err());
    }

    #[test]
    fn test_posts_keep_their_dates() {
        let store = MemoryStore::new();
        let posts = MockFeed::new(Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap()).posts();
        save(&store, POSTS_KEY, &posts).unwrap();
        let loaded: Vec<Post> = load(&store, POSTS_KEY).unwrap();
        assert_eq!(loaded, posts);
        assert_eq!(loaded[0].date, Utc.with_ymd_and_hms(2025, 3, 1, 7, 30, 0).unwrap());
    }

    #[test]
    fn test_corrupt_value_is_treated_as_absent() {
        let store = MemoryStore::new();
        store.set(POSTS_KEY, "{not json").unwrap();
        assert!(load::<Vec<Post>>(&store, POSTS_KEY).is_none());
    }

    #[test]
    fn test_empty_tab_list_is_ignored() {
        let store = MemoryStore::new();
        save(&store, TABS_KEY, &Vec::<Tab>::new()).unwrap();
        assert!(load_snapshot(&store).tabs.is_none());
    }

    #[test]
    fn test_clear_removes_everything() {
        let store = MemoryStore::new();
        save(&store, TABS_KEY, &MockFeed::tabs()).unwrap();
        clear(&store).unwrap();
        let snapshot = load_snapshot(&store);
        assert!(snapshot.user.is_none() && snapshot.tabs.is_none() && snapshot.posts.is_none());
    }
}
