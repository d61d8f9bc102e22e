//! Favorites list persisted to a key-value store
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::collection::{CollectionItemDetail, ItemRef};

/// Key the favorites payload lives under.
pub const FAVORITES_KEY: &str = "favorites";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid store key: {0}")]
    InvalidKey(String),
    #[error("Store lock poisoned")]
    Poisoned,
}

/// Synchronous string store with whole-value reads and writes.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Process-local store. Contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// reader never sees a half-written value.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;

        std::fs::create_dir_all(&self.dir)?;
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, value)?;
        std::fs::rename(&tmp_path, &path)?;
        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

/// Favorited item snapshots, unique by id, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoriteSet {
    items: Vec<CollectionItemDetail>,
}

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a list, keeping the first entry for each id.
    pub fn from_items(items: Vec<CollectionItemDetail>) -> Self {
        let mut seen = HashSet::new();
        let items = items
            .into_iter()
            .filter(|item| seen.insert(item.id))
            .collect();
        Self { items }
    }

    pub fn contains(&self, id: ItemRef) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    /// Append `item` unless its id is already present. Returns whether it was added.
    pub fn insert(&mut self, item: CollectionItemDetail) -> bool {
        if self.contains(item.id) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Remove the entry with `id`, returning it and its former position.
    pub fn remove(&mut self, id: ItemRef) -> Option<(usize, CollectionItemDetail)> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some((index, self.items.remove(index)))
    }

    pub fn items(&self) -> &[CollectionItemDetail] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

/// The favorites list, loaded once and written back in full on every change.
pub struct FavoritesStore {
    store: Arc<dyn KeyValueStore>,
    set: FavoriteSet,
}

impl FavoritesStore {
    /// Load the persisted set. Missing or unreadable data yields an empty set.
    pub fn open(store: Arc<dyn KeyValueStore>) -> Self {
        let set = load(store.as_ref());
        Self { store, set }
    }

    pub fn set(&self) -> &FavoriteSet {
        &self.set
    }

    pub fn items(&self) -> &[CollectionItemDetail] {
        self.set.items()
    }

    pub fn contains(&self, id: ItemRef) -> bool {
        self.set.contains(id)
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Add a snapshot of `item`. Nothing is written if the id is already present.
    pub fn add(&mut self, item: CollectionItemDetail) -> Result<AddOutcome, StoreError> {
        let id = item.id;
        if !self.set.insert(item) {
            debug!("Item {} is already a favorite", id);
            return Ok(AddOutcome::AlreadyPresent);
        }

        if let Err(e) = self.persist() {
            self.set.remove(id);
            return Err(e);
        }
        info!("Added item {} to favorites ({} total)", id, self.set.len());
        Ok(AddOutcome::Added)
    }

    /// Remove the favorite with `id`. Returns false, writing nothing, if absent.
    pub fn remove(&mut self, id: ItemRef) -> Result<bool, StoreError> {
        let Some((index, removed)) = self.set.remove(id) else {
            return Ok(false);
        };

        if let Err(e) = self.persist() {
            self.set.items.insert(index, removed);
            return Err(e);
        }
        info!("Removed item {} from favorites ({} left)", id, self.set.len());
        Ok(true)
    }

    fn persist(&self) -> Result<(), StoreError> {
        let payload = serde_json::to_string(self.set.items())?;
        self.store.set(FAVORITES_KEY, &payload)
    }
}

/// Read the favorites payload from `store`, failing soft to an empty set.
pub fn load(store: &dyn KeyValueStore) -> FavoriteSet {
    let raw = match store.get(FAVORITES_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return FavoriteSet::new(),
        Err(e) => {
            warn!("Failed to read favorites, starting empty: {}", e);
            return FavoriteSet::new();
        }
    };

    match serde_json::from_str::<Vec<CollectionItemDetail>>(&raw) {
        Ok(items) => FavoriteSet::from_items(items),
        Err(e) => {
            warn!("Stored favorites are unreadable, starting empty: {}", e);
            FavoriteSet::new()
        }
    }
}
