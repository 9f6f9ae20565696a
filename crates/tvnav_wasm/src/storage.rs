//! `KeyValueStore` over `window.localStorage`.

use tvnav_core::error::{NavError, Result};
use tvnav_core::port::KeyValueStore;
use web_sys::{Storage, Window};

use crate::dom::js_error;

/// The browser's `localStorage`, when the page is allowed to use it.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    storage: Option<Storage>,
}

impl LocalStorage {
    /// Open `window.localStorage`. Private browsing modes and sandboxed frames
    /// may deny access; every operation then fails with a storage error.
    pub fn from_window(window: &Window) -> Self {
        let storage = match window.local_storage() {
            Ok(storage) => storage,
            Err(e) => {
                log::warn!("LocalStorage: access denied: {}", js_error(&e));
                None
            }
        };
        Self { storage }
    }

    fn storage(&self) -> Result<&Storage> {
        self.storage
            .as_ref()
            .ok_or_else(|| NavError::Storage("localStorage is unavailable".to_string()))
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage()?
            .get_item(key)
            .map_err(|e| NavError::Storage(js_error(&e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| NavError::Storage(js_error(&e)))
    }
}
