use crate::error::StoreError;
use crate::traits::BlobStore;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::warn;

pub const HISTORY_KEY: &str = "searchHistory";
pub const MAX_HISTORY_ENTRIES: usize = 10;

/// Most-recent-first list of committed text searches.
///
/// Storage failures are logged and otherwise ignored; the in-memory list stays
/// authoritative for the session.
pub struct SearchHistory<S: BlobStore> {
    store: S,
    entries: Mutex<Vec<String>>,
}

impl<S: BlobStore> SearchHistory<S> {
    pub fn load(store: S) -> Self {
        let entries = match read_entries(&store) {
            Ok(entries) => entries,
            Err(error) => {
                warn!(%error, key = HISTORY_KEY, "unable to read search history, starting empty");
                Vec::new()
            }
        };

        Self {
            store,
            entries: Mutex::new(entries),
        }
    }

    pub fn record(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let mut entries = self.lock();
        entries.retain(|entry| entry != text);
        entries.insert(0, text.to_string());
        entries.truncate(MAX_HISTORY_ENTRIES);

        // persisted while still holding the lock, one writer at a time
        if let Err(error) = write_entries(&self.store, &entries) {
            warn!(%error, key = HISTORY_KEY, "unable to persist search history");
        }
    }

    pub fn list(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.clear();
        if let Err(error) = self.store.remove(HISTORY_KEY) {
            warn!(%error, key = HISTORY_KEY, "unable to clear stored search history");
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_entries(store: &impl BlobStore) -> Result<Vec<String>, StoreError> {
    let Some(raw) = store.get(HISTORY_KEY)? else {
        return Ok(Vec::new());
    };

    let mut entries: Vec<String> = serde_json::from_str(&raw)?;
    entries.retain(|entry| !entry.trim().is_empty());
    entries.truncate(MAX_HISTORY_ENTRIES);
    Ok(entries)
}

fn write_entries(store: &impl BlobStore, entries: &[String]) -> Result<(), StoreError> {
    let raw = serde_json::to_string(entries)?;
    store.set(HISTORY_KEY, &raw)
}
