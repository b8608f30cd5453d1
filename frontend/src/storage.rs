use gloo_storage::{LocalStorage, Storage};
use quickstart_wizard::storage::ClientStorage;
use tracing::warn;

/// `localStorage`, holding plain strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStorage;

impl ClientStorage for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        LocalStorage::get::<String>(key).ok()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(err) = LocalStorage::set(key, value) {
            warn!("storing {key} failed: {err}");
        }
    }

    fn remove(&self, key: &str) {
        LocalStorage::delete(key);
    }
}
