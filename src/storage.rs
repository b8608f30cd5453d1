//! Client-side key/value storage for remembered selections.

use std::cell::RefCell;
use std::collections::BTreeMap;

/// Key/value persistence for remembered UI choices. The browser build uses
/// local storage; tests and native callers use [`MemoryStorage`].
pub trait ClientStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

pub fn selected_image_key(library_id: &str) -> String {
    format!("{}-selected-image", library_id.trim())
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl ClientStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

impl<S: ClientStorage + ?Sized> ClientStorage for &S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_per_library() {
        assert_eq!(
            selected_image_key("mov-library_movies"),
            "mov-library_movies-selected-image"
        );
        assert_ne!(
            selected_image_key("mov-library_movies"),
            selected_image_key("sho-library_tv")
        );
    }

    #[test]
    fn memory_storage_round_trips() {
        let storage = MemoryStorage::new();
        storage.set("a", "1");
        assert_eq!(storage.get("a").as_deref(), Some("1"));
        storage.remove("a");
        assert!(storage.is_empty());
    }
}
