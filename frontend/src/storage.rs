use shared::storage::{KeyValueStore, MemoryStore};
use web_sys::Storage;

/// `localStorage`-backed store. Falls back to memory when the browser refuses
/// storage access, so the page keeps working for the current visit.
pub enum LocalStore {
    Browser(Storage),
    Memory(MemoryStore),
}

impl LocalStore {
    pub fn open() -> Self {
        match gloo_utils::window().local_storage() {
            Ok(Some(storage)) => Self::Browser(storage),
            Ok(None) => {
                log::warn!("localStorage unavailable, progress will not persist");
                Self::Memory(MemoryStore::new())
            }
            Err(e) => {
                log::warn!("localStorage blocked: {:?}", e);
                Self::Memory(MemoryStore::new())
            }
        }
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        match self {
            Self::Browser(storage) => storage.get_item(key).ok().flatten(),
            Self::Memory(store) => store.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        match self {
            Self::Browser(storage) => {
                if let Err(e) = storage.set_item(key, value) {
                    log::warn!("Failed to write {}: {:?}", key, e);
                }
            }
            Self::Memory(store) => store.set(key, value),
        }
    }
}
