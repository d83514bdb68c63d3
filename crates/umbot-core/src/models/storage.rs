//! Storage backends: JSON file per table, or one sled tree per collection.
//! Both behind the [`Storage`] trait so models never know which one is active.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::config::{StorageConfig, StorageMode};
use crate::error::StorageError;

/// Field equality filter for `select`. An empty query matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<(String, Value)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn matches(&self, record: &Value) -> bool {
        self.filters
            .iter()
            .all(|(field, value)| record.get(field) == Some(value))
    }
}

/// Record store keyed by table and primary key. Records are JSON objects.
pub trait Storage: Send + Sync {
    fn get(&self, table: &str, key: &str) -> Result<Option<Value>, StorageError>;

    fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, StorageError>;

    /// Insert or overwrite.
    fn insert(&self, table: &str, key: &str, record: Value) -> Result<(), StorageError>;

    /// Overwrite an existing record; `false` when the key is absent.
    fn update(&self, table: &str, key: &str, record: Value) -> Result<bool, StorageError>;

    /// `false` when the key is absent.
    fn remove(&self, table: &str, key: &str) -> Result<bool, StorageError>;
}

/// Open the backend selected in configuration.
pub fn open_storage(config: &StorageConfig) -> Result<Arc<dyn Storage>, StorageError> {
    let storage: Arc<dyn Storage> = match config.mode {
        StorageMode::File => Arc::new(FileStorage::open(&config.path)?),
        StorageMode::Embedded => Arc::new(SledStorage::open(&config.path)?),
    };
    tracing::info!(
        target: "umbot::storage",
        "storage ready: {:?} at {}",
        config.mode,
        config.path.display()
    );
    Ok(storage)
}

/// `<dir>/<table>.json` holding `{key: record}`. Writes are serialized by a lock
/// so concurrent requests cannot clobber each other's read-modify-write.
pub struct FileStorage {
    dir: PathBuf,
    lock: Mutex<()>,
}

type Table = BTreeMap<String, Value>;

impl FileStorage {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.json"))
    }

    fn read_table(&self, table: &str) -> Result<Table, StorageError> {
        let path = self.table_path(table);
        if !path.exists() {
            return Ok(Table::new());
        }
        let raw = fs::read_to_string(&path)?;
        if raw.trim().is_empty() {
            return Ok(Table::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_table(&self, table: &str, rows: &Table) -> Result<(), StorageError> {
        let path = self.table_path(table);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(rows)?)?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    fn with_table<T>(
        &self,
        table: &str,
        f: impl FnOnce(&mut Table) -> (T, bool),
    ) -> Result<T, StorageError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StorageError::Poisoned(table.to_string()))?;
        let mut rows = self.read_table(table)?;
        let (out, dirty) = f(&mut rows);
        if dirty {
            self.write_table(table, &rows)?;
        }
        Ok(out)
    }
}

impl Storage for FileStorage {
    fn get(&self, table: &str, key: &str) -> Result<Option<Value>, StorageError> {
        self.with_table(table, |rows| (rows.get(key).cloned(), false))
    }

    fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, StorageError> {
        self.with_table(table, |rows| {
            let hits = rows.values().filter(|r| query.matches(r)).cloned().collect();
            (hits, false)
        })
    }

    fn insert(&self, table: &str, key: &str, record: Value) -> Result<(), StorageError> {
        self.with_table(table, |rows| {
            rows.insert(key.to_string(), record);
            ((), true)
        })
    }

    fn update(&self, table: &str, key: &str, record: Value) -> Result<bool, StorageError> {
        self.with_table(table, |rows| match rows.get_mut(key) {
            Some(slot) => {
                *slot = record;
                (true, true)
            }
            None => (false, false),
        })
    }

    fn remove(&self, table: &str, key: &str) -> Result<bool, StorageError> {
        self.with_table(table, |rows| {
            let removed = rows.remove(key).is_some();
            (removed, removed)
        })
    }
}

/// One sled tree per table, records stored as JSON bytes.
pub struct SledStorage {
    db: sled::Db,
}

impl SledStorage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Temporary database removed on drop.
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }
}

fn decode(bytes: &[u8]) -> Result<Value, StorageError> {
    Ok(serde_json::from_slice(bytes)?)
}

impl Storage for SledStorage {
    fn get(&self, table: &str, key: &str) -> Result<Option<Value>, StorageError> {
        let tree = self.db.open_tree(table)?;
        tree.get(key.as_bytes())?.map(|v| decode(&v)).transpose()
    }

    fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, StorageError> {
        let tree = self.db.open_tree(table)?;
        let mut out = Vec::new();
        for entry in tree.iter() {
            let (_, v) = entry?;
            let record = decode(&v)?;
            if query.matches(&record) {
                out.push(record);
            }
        }
        Ok(out)
    }

    fn insert(&self, table: &str, key: &str, record: Value) -> Result<(), StorageError> {
        let tree = self.db.open_tree(table)?;
        tree.insert(key.as_bytes(), serde_json::to_vec(&record)?)?;
        tree.flush()?;
        Ok(())
    }

    fn update(&self, table: &str, key: &str, record: Value) -> Result<bool, StorageError> {
        let tree = self.db.open_tree(table)?;
        if !tree.contains_key(key.as_bytes())? {
            return Ok(false);
        }
        tree.insert(key.as_bytes(), serde_json::to_vec(&record)?)?;
        tree.flush()?;
        Ok(true)
    }

    fn remove(&self, table: &str, key: &str) -> Result<bool, StorageError> {
        let tree = self.db.open_tree(table)?;
        let removed = tree.remove(key.as_bytes())?.is_some();
        if removed {
            tree.flush()?;
        }
        Ok(removed)
    }
}

/// Records are stored as objects; anything else is wrapped under `value`.
pub(crate) fn as_object(record: Value) -> Value {
    match record {
        Value::Object(_) => record,
        other => {
            let mut map = Map::new();
            map.insert("value".into(), other);
            Value::Object(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn exercise(storage: &dyn Storage) {
        storage.insert("users", "a", json!({"user_id": "a", "n": 1})).unwrap();
        storage.insert("users", "b", json!({"user_id": "b", "n": 2})).unwrap();
        assert_eq!(storage.get("users", "a").unwrap(), Some(json!({"user_id": "a", "n": 1})));

        let hits = storage.select("users", &Query::new().eq("n", 2)).unwrap();
        assert_eq!(hits, vec![json!({"user_id": "b", "n": 2})]);
        assert_eq!(storage.select("users", &Query::new()).unwrap().len(), 2);

        assert!(storage.update("users", "a", json!({"user_id": "a", "n": 3})).unwrap());
        assert!(!storage.update("users", "zzz", json!({})).unwrap());
        assert!(storage.remove("users", "a").unwrap());
        assert!(!storage.remove("users", "a").unwrap());
        assert_eq!(storage.get("users", "a").unwrap(), None);
    }

    #[test]
    fn file_backend_crud() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        exercise(&storage);
        assert!(dir.path().join("users.json").exists());
    }

    #[test]
    fn sled_backend_crud() {
        let storage = SledStorage::temporary().unwrap();
        exercise(&storage);
    }

    #[test]
    fn open_storage_follows_mode() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            mode: StorageMode::Embedded,
            path: dir.path().join("db"),
        };
        let storage = open_storage(&config).unwrap();
        storage.insert("t", "k", json!({"x": 1})).unwrap();
        assert!(dir.path().join("db").exists());
    }
}
