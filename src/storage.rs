use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage quota exceeded writing {key}")]
    QuotaExceeded { key: String },
    #[error("storage io error on {key}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
    #[error("corrupt value under {key}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot serialize value for {key}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// String-keyed blob storage, the shape of browser `localStorage`.
///
/// Reads return `Ok(None)` for a missing key so callers can tell "no data"
/// apart from a failing backend.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory backend with an optional byte quota over keys and values.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
    quota: Cell<Option<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(bytes: usize) -> Self {
        let store = Self::default();
        store.quota.set(Some(bytes));
        store
    }

    /// Changes the quota in place; existing entries are kept even if they no
    /// longer fit, only later writes are checked.
    pub fn set_quota(&self, bytes: Option<usize>) {
        self.quota.set(bytes);
    }

    pub fn usage(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(limit) = self.quota.get() {
            let replaced = self
                .entries
                .borrow()
                .get(key)
                .map(|old| key.len() + old.len())
                .unwrap_or(0);
            let needed = self.usage() - replaced + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded { key: key.to_string() });
            }
        }
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// One JSON file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|source| StorageError::Io {
            key: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.root.join(format!("{file}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { key: key.to_string(), source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|source| StorageError::Io { key: key.to_string(), source })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { key: key.to_string(), source }),
        }
    }
}

/// The window's `localStorage`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct BrowserStore {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl BrowserStore {
    pub fn open() -> Result<Self, StorageError> {
        let storage = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window object".into()))?
            .local_storage()
            .map_err(|_| StorageError::Unavailable("localStorage access denied".into()))?
            .ok_or_else(|| StorageError::Unavailable("no localStorage".into()))?;
        Ok(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(key)
            .map_err(|_| StorageError::Unavailable(format!("getItem({key}) failed")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // setItem only throws for QuotaExceededError or a disabled store.
        self.storage
            .set_item(key, value)
            .map_err(|_| StorageError::QuotaExceeded { key: key.to_string() })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.storage
            .remove_item(key)
            .map_err(|_| StorageError::Unavailable(format!("removeItem({key}) failed")))
    }
}

/// Typed JSON view over a [`KeyValueStore`], with every key namespaced by a
/// common prefix.
#[derive(Clone)]
pub struct JsonStore {
    backend: Rc<dyn KeyValueStore>,
    prefix: String,
}

impl JsonStore {
    pub fn new(backend: Rc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StorageError> {
        let key = self.key(name);
        let raw = match self.backend.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(None),
            Err(e) => {
                error!(error = %e, %key, "storage read failed");
                return Err(e);
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(%key, bytes = raw.len(), "storage read");
                Ok(Some(value))
            }
            Err(source) => {
                error!(error = %source, %key, "stored value is not valid json");
                Err(StorageError::Corrupt { key, source })
            }
        }
    }

    pub fn set<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<(), StorageError> {
        let key = self.key(name);
        let raw = serde_json::to_string(value).map_err(|source| {
            error!(error = %source, %key, "serialize failed");
            StorageError::Serialize {
                key: key.clone(),
                source,
            }
        })?;
        self.backend.set(&key, &raw).map_err(|e| {
            error!(error = %e, %key, "storage write failed");
            e
        })?;
        debug!(%key, bytes = raw.len(), "storage write");
        Ok(())
    }

    pub fn remove(&self, name: &str) -> Result<(), StorageError> {
        let key = self.key(name);
        self.backend.remove(&key).map_err(|e| {
            error!(error = %e, %key, "storage remove failed");
            e
        })
    }
}

/// Outcome of a mutation that has already been applied in memory, paired
/// with the result of writing it back to the store.
///
/// A failed write does not undo the in-memory change: memory and storage
/// disagree until the next successful write.
#[derive(Debug)]
#[must_use]
pub struct Persisted<T> {
    pub value: T,
    pub persist_error: Option<StorageError>,
}

impl<T> Persisted<T> {
    pub fn from_write(value: T, write: Result<(), StorageError>) -> Self {
        Self {
            value,
            persist_error: write.err(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.persist_error.is_none()
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Persisted<U> {
        Persisted {
            value: f(self.value),
            persist_error: self.persist_error,
        }
    }
}
