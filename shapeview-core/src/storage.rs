//! Persistence for the shape collection
//!
//! The collection lives under a single key of a string key-value store as a
//! JSON array. Any backend implementing [`KeyValueStore`] can hold it: the
//! in-memory map used by tests, a directory of JSON files on native targets,
//! or browser `localStorage` in the web crate.
//!
//! [`ShapeRepository`] never propagates backend failures. Reads degrade to an
//! empty collection and writes degrade to a no-op; both are logged.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::shape::{ShapeId, ShapeRecord};

/// Key under which the shape collection is stored
pub const SHAPES_KEY: &str = "shapes";

/// String key-value storage port
pub trait KeyValueStore {
    /// Read the value stored under `key`, `None` when absent
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Create or overwrite the value stored under `key`
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`; removing an absent key succeeds
    fn remove_item(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store, optionally bounded by a total byte quota
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes that would grow the stored bytes past `limit`
    pub fn with_quota(limit: usize) -> Self {
        Self {
            items: HashMap::new(),
            quota: Some(limit),
        }
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(limit) = self.quota {
            let attempted = self.used_bytes_without(key) + key.len() + value.len();
            if attempted > limit {
                return Err(StoreError::QuotaExceeded { limit, attempted });
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        self.items.remove(key);
        Ok(())
    }
}

/// Directory-backed store: each key is a `<key>.json` file under `base_dir`
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.resolve(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes a sibling temp file and renames it over the target, so readers
    /// see either the old value or the new one
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.base_dir)?;
        let path = self.resolve(key);
        let tmp = self.base_dir.join(format!(".{key}.json.tmp"));
        std::fs::write(&tmp, value)?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.resolve(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Whole-collection access to the stored shapes
#[derive(Debug)]
pub struct ShapeRepository<S> {
    store: S,
}

impl<S: KeyValueStore> ShapeRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Read the stored collection. Absent, empty, or unparseable data reads
    /// as an empty collection.
    pub fn get_shapes(&self) -> Vec<ShapeRecord> {
        let raw = match self.store.get_item(SHAPES_KEY) {
            Ok(Some(raw)) if !raw.trim().is_empty() => raw,
            Ok(_) => return Vec::new(),
            Err(e) => {
                log::error!("error retrieving shapes from storage: {e}");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(shapes) => shapes,
            Err(e) => {
                log::warn!("stored shapes are not a valid collection, ignoring: {e}");
                Vec::new()
            }
        }
    }

    /// Overwrite the stored collection
    pub fn save_shapes(&mut self, shapes: &[ShapeRecord]) {
        if let Err(e) = self.try_save(shapes) {
            log::error!("error saving shapes to storage: {e}");
        }
    }

    fn try_save(&mut self, shapes: &[ShapeRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string(shapes)?;
        self.store.set_item(SHAPES_KEY, &json)
    }

    /// Append one shape to the stored collection
    pub fn add_shape(&mut self, shape: ShapeRecord) {
        let mut shapes = self.get_shapes();
        shapes.push(shape);
        self.save_shapes(&shapes);
    }

    /// Remove every stored shape with `id`; unknown ids leave the store untouched
    pub fn delete_shape(&mut self, id: ShapeId) {
        let mut shapes = self.get_shapes();
        let before = shapes.len();
        shapes.retain(|shape| shape.id != id);
        if shapes.len() != before {
            self.save_shapes(&shapes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeKind;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn arb_record() -> impl Strategy<Value = ShapeRecord> {
        (
            any::<u64>(),
            "\\PC{0,16}",
            prop::sample::select(ShapeKind::ALL.to_vec()),
        )
            .prop_map(|(id, name, kind)| ShapeRecord::new(id, name, kind))
    }

    proptest! {
        #[test]
        fn test_save_then_get_returns_same_sequence(
            shapes in prop::collection::vec(arb_record(), 0..12)
        ) {
            let mut repo = ShapeRepository::new(MemoryStore::new());
            repo.save_shapes(&shapes);
            prop_assert_eq!(repo.get_shapes(), shapes);
        }
    }

    fn sample() -> Vec<ShapeRecord> {
        vec![
            ShapeRecord::new(10, "b", ShapeKind::Cone),
            ShapeRecord::new(2, "a", ShapeKind::Sphere),
            ShapeRecord::new(7, "c", ShapeKind::Cylinder),
        ]
    }

    #[test]
    fn test_missing_key_reads_empty() {
        let repo = ShapeRepository::new(MemoryStore::new());
        assert!(repo.get_shapes().is_empty());
    }

    #[test]
    fn test_save_then_get_preserves_order() {
        let mut repo = ShapeRepository::new(MemoryStore::new());
        repo.save_shapes(&sample());
        assert_eq!(repo.get_shapes(), sample());
    }

    #[test]
    fn test_garbage_reads_empty() {
        let mut store = MemoryStore::new();
        store.set_item(SHAPES_KEY, "{not json").unwrap();
        let repo = ShapeRepository::new(store);
        assert!(repo.get_shapes().is_empty());
    }

    #[test]
    fn test_add_and_delete() {
        let mut repo = ShapeRepository::new(MemoryStore::new());
        repo.add_shape(ShapeRecord::new(1, "one", ShapeKind::Cube));
        repo.add_shape(ShapeRecord::new(2, "two", ShapeKind::Cone));
        repo.delete_shape(1);
        assert_eq!(repo.get_shapes(), vec![ShapeRecord::new(2, "two", ShapeKind::Cone)]);
    }

    #[test]
    fn test_delete_unknown_id_is_noop() {
        let mut repo = ShapeRepository::new(MemoryStore::new());
        repo.save_shapes(&sample());
        let before = repo.store().get_item(SHAPES_KEY).unwrap();
        repo.delete_shape(999);
        assert_eq!(repo.store().get_item(SHAPES_KEY).unwrap(), before);
        assert_eq!(repo.get_shapes(), sample());
    }

    #[test]
    fn test_quota_exceeded_is_swallowed() {
        let mut repo = ShapeRepository::new(MemoryStore::with_quota(16));
        repo.save_shapes(&sample());
        assert!(repo.get_shapes().is_empty());
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut repo = ShapeRepository::new(FileStore::new(dir.path().join("nested")));
        repo.save_shapes(&sample());

        let reopened = ShapeRepository::new(FileStore::new(dir.path().join("nested")));
        assert_eq!(reopened.get_shapes(), sample());
    }

    #[test]
    fn test_file_store_overwrite_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::new(dir.path());
        store.set_item(SHAPES_KEY, "[]").unwrap();
        store.set_item(SHAPES_KEY, r#"[{"id":1,"name":"é","type":"Cone"}]"#).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("shapes.json")]);
        assert_eq!(
            store.get_item(SHAPES_KEY).unwrap().as_deref(),
            Some(r#"[{"id":1,"name":"é","type":"Cone"}]"#)
        );
    }

    #[test]
    fn test_file_store_remove_missing_is_ok() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::new(dir.path());
        assert!(store.remove_item(SHAPES_KEY).is_ok());
        assert_eq!(store.get_item(SHAPES_KEY).unwrap(), None);
    }
}
