//! crates/kidsmart_core/src/store.rs
//!
//! The local content store: ordered, id-keyed collections persisted as whole
//! JSON snapshots through the `KeyValueStore` port.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

use crate::domain::{ExternalLink, FlashcardSet, LinkKind, Story};
use crate::ports::{KeyValueStore, PortError, PortResult};

pub const SAVED_STORIES_KEY: &str = "kidSmart_savedStories";
pub const SAVED_FLASHCARDS_KEY: &str = "kidSmart_savedFlashcards";
pub const LOCAL_STORY_LINKS_KEY: &str = "kidSmart_externalStories";
pub const LOCAL_GAME_LINKS_KEY: &str = "kidSmart_externalGames";

/// Storage key for the locally bookmarked links of `kind`.
pub fn link_key(kind: LinkKind) -> &'static str {
    match kind {
        LinkKind::Story => LOCAL_STORY_LINKS_KEY,
        LinkKind::Game => LOCAL_GAME_LINKS_KEY,
    }
}

/// Anything stored in a `ContentStore` is deduplicated by this id.
pub trait Keyed {
    fn id(&self) -> &str;
}

impl Keyed for Story {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Keyed for FlashcardSet {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Keyed for ExternalLink {
    fn id(&self) -> &str {
        &self.id
    }
}

/// One content kind living under one storage key.
pub struct ContentStore<T> {
    kv: Arc<dyn KeyValueStore>,
    key: &'static str,
    _items: PhantomData<fn() -> T>,
}

impl<T> Clone for ContentStore<T> {
    fn clone(&self) -> Self {
        Self {
            kv: self.kv.clone(),
            key: self.key,
            _items: PhantomData,
        }
    }
}

impl<T> ContentStore<T>
where
    T: Keyed + Serialize + DeserializeOwned + Clone,
{
    pub fn new(kv: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            kv,
            key,
            _items: PhantomData,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// True when something was ever written under this key.
    pub fn is_initialized(&self) -> PortResult<bool> {
        Ok(self.kv.get(self.key)?.is_some())
    }

    /// All items, most recent first. A corrupt snapshot reads as empty.
    pub fn list_all(&self) -> PortResult<Vec<T>> {
        let Some(raw) = self.kv.get(self.key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(items) => Ok(items),
            Err(e) => {
                error!(key = self.key, error = %e, "stored snapshot is corrupt, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    pub fn contains(&self, id: &str) -> PortResult<bool> {
        Ok(self.list_all()?.iter().any(|item| item.id() == id))
    }

    /// Prepends `item`. Fails with `AlreadyExists` if the id is taken.
    pub fn save(&self, item: T) -> PortResult<Vec<T>> {
        let mut items = self.list_all()?;
        if items.iter().any(|existing| existing.id() == item.id()) {
            return Err(PortError::AlreadyExists(item.id().to_string()));
        }
        items.insert(0, item);
        self.write(&items)?;
        Ok(items)
    }

    /// Overwrites the stored copy of `item` in place. Returns `false` (and
    /// writes nothing) when the id has never been saved.
    pub fn checkpoint(&self, item: &T) -> PortResult<bool> {
        let mut items = self.list_all()?;
        let Some(slot) = items.iter_mut().find(|existing| existing.id() == item.id()) else {
            return Ok(false);
        };
        *slot = item.clone();
        self.write(&items)?;
        debug!(key = self.key, id = item.id(), "checkpoint written");
        Ok(true)
    }

    /// Removes `id`. Absent ids are ignored.
    pub fn delete(&self, id: &str) -> PortResult<Vec<T>> {
        let mut items = self.list_all()?;
        let before = items.len();
        items.retain(|item| item.id() != id);
        if items.len() != before {
            self.write(&items)?;
        }
        Ok(items)
    }

    /// Prepends every default whose id is not stored yet, keeping the order
    /// of both the defaults and the existing items.
    pub fn merge_seed_defaults(&self, defaults: &[T]) -> PortResult<Vec<T>> {
        let existing = self.list_all()?;
        let fresh: Vec<T> = defaults
            .iter()
            .filter(|seed| !existing.iter().any(|item| item.id() == seed.id()))
            .cloned()
            .collect();
        if fresh.is_empty() {
            return Ok(existing);
        }
        let merged: Vec<T> = fresh.into_iter().chain(existing).collect();
        self.write(&merged)?;
        Ok(merged)
    }

    /// Replaces the whole collection.
    pub fn replace_all(&self, items: &[T]) -> PortResult<()> {
        self.write(items)
    }

    fn write(&self, items: &[T]) -> PortResult<()> {
        let json = serde_json::to_string(items).map_err(|e| PortError::Storage(e.to_string()))?;
        self.kv.put(self.key, &json)
    }
}

/// A process-local `KeyValueStore`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> PortResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| PortError::Storage("memory store poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> PortResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| PortError::Storage("memory store poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
