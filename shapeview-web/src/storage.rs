/// Browser `localStorage` as the shape store
use shapeview_core::{KeyValueStore, StoreError};
use wasm_bindgen::JsValue;

pub struct LocalStorageStore {
    storage: web_sys::Storage,
}

impl LocalStorageStore {
    /// The current window's `localStorage`
    pub fn from_window() -> Result<Self, StoreError> {
        let window = web_sys::window().ok_or_else(|| StoreError::Backend("no window".into()))?;
        let storage = window
            .local_storage()
            .map_err(js_error)?
            .ok_or_else(|| StoreError::Backend("localStorage unavailable".into()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorageStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage.get_item(key).map_err(js_error)
    }

    /// Fails with the browser's exception, e.g. `QuotaExceededError`
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage.set_item(key, value).map_err(js_error)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        self.storage.remove_item(key).map_err(js_error)
    }
}

pub(crate) fn js_error(value: JsValue) -> StoreError {
    StoreError::Backend(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}
