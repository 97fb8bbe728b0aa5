//! Durable key/value backends.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

/// Failure of a durable store call.
#[derive(Debug)]
pub enum StoreError {
    /// The store is switched off or inaccessible (private browsing, disabled storage, ...).
    Unavailable(String),
    /// The store refused the write because it is full.
    QuotaExceeded { key: String },
    Io(io::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(reason) => write!(f, "storage unavailable: {reason}"),
            StoreError::QuotaExceeded { key } => write!(f, "storage quota exceeded writing {key}"),
            StoreError::Io(err) => write!(f, "storage i/o error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        StoreError::Io(err)
    }
}

/// A key/value store whose contents survive page reloads.
///
/// Any method may fail; callers are expected to degrade rather than propagate.
pub trait DurableStore {
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StoreError>;
    /// All keys currently stored.
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// In-process model of the browser's storage partition.
///
/// Clones share the same map, so a store handed to a new session after a simulated reload
/// sees everything written by the previous one.
#[derive(Clone, Debug, Default)]
pub struct LocalStorage {
    items: Rc<RefCell<BTreeMap<String, String>>>,
    quota: Option<usize>,
}

impl LocalStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that refuses writes of new keys once `max_entries` keys exist.
    pub fn with_quota(max_entries: usize) -> Self {
        Self {
            items: Rc::default(),
            quota: Some(max_entries),
        }
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Raw stored value, bypassing any adapter.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }
}

impl DurableStore for LocalStorage {
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut items = self.items.borrow_mut();
        if let Some(max) = self.quota
            && !items.contains_key(key)
            && items.len() >= max
        {
            return Err(StoreError::QuotaExceeded {
                key: key.to_string(),
            });
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.items.borrow().keys().cloned().collect())
    }
}

/// A store that is switched off: every call fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledStore;

impl DurableStore for DisabledStore {
    fn set_item(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("storage disabled".to_string()))
    }

    fn get_item(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("storage disabled".to_string()))
    }

    fn remove_item(&mut self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("storage disabled".to_string()))
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Err(StoreError::Unavailable("storage disabled".to_string()))
    }
}

/// One `<encoded key>.json` file per key under a base directory.
///
/// Keys contain `/` and `:` (page paths), so file names percent-encode every byte outside
/// `[A-Za-z0-9_.-]`.
#[derive(Clone, Debug)]
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", encode_key(key)))
    }
}

impl DurableStore for FileStore {
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base_path)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.base_path) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut keys = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            if let Some(key) = decode_key(stem) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

fn decode_key(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = name.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_storage_clones_share_contents() {
        let mut a = LocalStorage::new();
        let b = a.clone();
        a.set_item("k", "v").unwrap();
        assert_eq!(b.get_item("k").unwrap().as_deref(), Some("v"));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn local_storage_quota_rejects_new_keys_only() {
        let mut store = LocalStorage::with_quota(1);
        store.set_item("a", "1").unwrap();
        store.set_item("a", "2").unwrap();
        assert!(matches!(
            store.set_item("b", "1"),
            Err(StoreError::QuotaExceeded { .. })
        ));
        assert_eq!(store.raw("a").as_deref(), Some("2"));
    }

    #[test]
    fn disabled_store_fails_every_call() {
        let mut store = DisabledStore;
        assert!(store.set_item("k", "v").is_err());
        assert!(store.get_item("k").is_err());
        assert!(store.remove_item("k").is_err());
        assert!(store.keys().is_err());
    }

    #[test]
    fn key_encoding_round_trips() {
        for key in ["/guide/loops::choice_1", "plain", "ação::x", "100%"] {
            let encoded = encode_key(key);
            assert!(!encoded.contains('/'));
            assert_eq!(decode_key(&encoded).as_deref(), Some(key));
        }
        assert_eq!(decode_key("%Z1"), None);
    }
}
