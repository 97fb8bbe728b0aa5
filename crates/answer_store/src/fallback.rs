//! Durable store adapter with in-memory fallback.

use crate::durable::DurableStore;
use crate::record::{PersistedAnswerRecord, RecordError};
use log::{debug, warn};
use std::collections::{BTreeSet, HashMap};

/// Write/remove counters, for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub durable_writes: usize,
    pub fallback_writes: usize,
    pub removals: usize,
}

impl StoreStats {
    pub fn writes(&self) -> usize {
        self.durable_writes + self.fallback_writes
    }
}

/// Key/value store that prefers a [`DurableStore`] and falls back to an in-process map.
///
/// - [`init`](Self::init) probes the durable store once with a write/delete pair. A failing
///   probe marks the durable store unavailable for the rest of the session.
/// - Every later `set`/`get` that hits a durable failure demotes the store the same way.
/// - `set` keeps the value in memory whenever the durable write did not succeed.
/// - `remove` always clears the memory copy, whatever the durable store does.
/// - `get` prefers a present durable value, then the memory copy.
///
/// No method panics or returns a storage error; failures are logged with `warn!`.
///
/// # Example
///
/// ```
/// use answer_store::{AnswerStore, DisabledStore};
///
/// let mut store = AnswerStore::new(DisabledStore);
/// assert!(!store.init());
/// assert!(!store.set("k", "v"));
/// assert_eq!(store.get("k").as_deref(), Some("v"));
/// ```
#[derive(Debug)]
pub struct AnswerStore<D: DurableStore> {
    durable: D,
    memory: HashMap<String, String>,
    available: bool,
    keep_fallback: bool,
    probes: u64,
    stats: StoreStats,
}

impl<D: DurableStore> AnswerStore<D> {
    /// Wraps `durable`. The durable store is not used until [`init`](Self::init) succeeds.
    pub fn new(durable: D) -> Self {
        Self {
            durable,
            memory: HashMap::new(),
            available: false,
            keep_fallback: true,
            probes: 0,
            stats: StoreStats::default(),
        }
    }

    /// When disabled, values whose durable write failed are dropped instead of kept in memory.
    pub fn with_fallback(mut self, keep_fallback: bool) -> Self {
        self.keep_fallback = keep_fallback;
        self
    }

    /// Probes the durable store and returns whether it is available.
    pub fn init(&mut self) -> bool {
        self.probes += 1;
        let probe = format!("__quiz_probe_{}", self.probes);
        let result = self
            .durable
            .set_item(&probe, &probe)
            .and_then(|()| self.durable.remove_item(&probe));
        match result {
            Ok(()) => {
                self.available = true;
                debug!("durable storage is available");
            }
            Err(err) => {
                self.available = false;
                warn!("durable storage not available, using memory storage: {err}");
            }
        }
        self.available
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn stats(&self) -> StoreStats {
        self.stats
    }

    /// Stores `value`; returns `true` if it reached the durable store.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        if self.available {
            match self.durable.set_item(key, value) {
                Ok(()) => {
                    self.stats.durable_writes += 1;
                    return true;
                }
                Err(err) => {
                    warn!("durable set of {key} failed, using memory storage: {err}");
                    self.available = false;
                }
            }
        }

        if self.keep_fallback {
            self.memory.insert(key.to_string(), value.to_string());
            self.stats.fallback_writes += 1;
        } else {
            debug!("fallback storage disabled, dropping write of {key}");
        }
        false
    }

    pub fn get(&mut self, key: &str) -> Option<String> {
        if self.available {
            match self.durable.get_item(key) {
                Ok(Some(value)) => return Some(value),
                Ok(None) => {}
                Err(err) => {
                    warn!("durable get of {key} failed, using memory storage: {err}");
                    self.available = false;
                }
            }
        }
        self.memory.get(key).cloned()
    }

    pub fn remove(&mut self, key: &str) {
        if self.available
            && let Err(err) = self.durable.remove_item(key)
        {
            warn!("durable remove of {key} failed: {err}");
        }
        self.memory.remove(key);
        self.stats.removals += 1;
    }

    /// Keys starting with `prefix`, from both the durable store (when available) and memory.
    pub fn keys_with_prefix(&mut self, prefix: &str) -> Vec<String> {
        let mut keys: BTreeSet<String> = BTreeSet::new();
        if self.available {
            match self.durable.keys() {
                Ok(durable) => keys.extend(durable.into_iter().filter(|k| k.starts_with(prefix))),
                Err(err) => {
                    warn!("durable key listing failed, using memory storage: {err}");
                    self.available = false;
                }
            }
        }
        keys.extend(
            self.memory
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned(),
        );
        keys.into_iter().collect()
    }

    /// Number of keys held only in the in-memory fallback.
    pub fn fallback_len(&self) -> usize {
        self.memory.len()
    }

    /// Loads and parses the record stored under `key`.
    ///
    /// `Ok(None)` when absent; parse failures are returned so the caller can quarantine.
    pub fn load_record(&mut self, key: &str) -> Result<Option<PersistedAnswerRecord>, RecordError> {
        match self.get(key) {
            Some(raw) => PersistedAnswerRecord::parse(&raw).map(Some),
            None => Ok(None),
        }
    }

    /// Serializes and stores `record`; returns `true` if it reached the durable store.
    pub fn save_record(&mut self, key: &str, record: &PersistedAnswerRecord) -> bool {
        match record.encode() {
            Ok(json) => self.set(key, &json),
            Err(err) => {
                warn!("could not encode record for {key}: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::durable::{DisabledStore, LocalStorage, StoreError};
    use std::cell::Cell;
    use std::rc::Rc;

    /// Works until `fail` is flipped, then fails every call.
    struct Switchable {
        inner: LocalStorage,
        fail: Rc<Cell<bool>>,
    }

    impl Switchable {
        fn check(&self) -> Result<(), StoreError> {
            if self.fail.get() {
                Err(StoreError::Unavailable("switched off".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl DurableStore for Switchable {
        fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            self.check()?;
            self.inner.set_item(key, value)
        }
        fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.check()?;
            self.inner.get_item(key)
        }
        fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
            self.check()?;
            self.inner.remove_item(key)
        }
        fn keys(&self) -> Result<Vec<String>, StoreError> {
            self.check()?;
            self.inner.keys()
        }
    }

    #[test]
    fn init_probe_leaves_no_trace() {
        let local = LocalStorage::new();
        let mut store = AnswerStore::new(local.clone());
        assert!(store.init());
        assert!(local.is_empty());
    }

    #[test]
    fn durable_writes_are_not_mirrored() {
        let local = LocalStorage::new();
        let mut store = AnswerStore::new(local.clone());
        store.init();
        assert!(store.set("a", "1"));
        assert_eq!(local.raw("a").as_deref(), Some("1"));
        assert_eq!(store.fallback_len(), 0);
        assert_eq!(store.get("a").as_deref(), Some("1"));
    }

    #[test]
    fn unavailable_store_uses_memory_only() {
        let mut store = AnswerStore::new(DisabledStore);
        assert!(!store.init());
        assert!(!store.set("a", "1"));
        assert_eq!(store.get("a").as_deref(), Some("1"));
        store.remove("a");
        assert_eq!(store.get("a"), None);
        assert_eq!(
            store.stats(),
            StoreStats {
                durable_writes: 0,
                fallback_writes: 1,
                removals: 1
            }
        );
    }

    #[test]
    fn failure_after_init_demotes_for_the_session() {
        let fail = Rc::new(Cell::new(false));
        let mut store = AnswerStore::new(Switchable {
            inner: LocalStorage::new(),
            fail: fail.clone(),
        });
        assert!(store.init());
        assert!(store.set("before", "1"));

        fail.set(true);
        assert!(!store.set("after", "2"));
        assert!(!store.is_available());
        assert_eq!(store.get("after").as_deref(), Some("2"));

        // Recovering durable storage is not re-probed opportunistically.
        fail.set(false);
        assert!(!store.set("later", "3"));
        assert_eq!(store.fallback_len(), 2);
    }

    #[test]
    fn demoted_store_reads_from_memory_only() {
        let local = LocalStorage::new();
        let mut store = AnswerStore::new(Switchable {
            inner: local.clone(),
            fail: Rc::new(Cell::new(true)),
        });
        store.init();
        store.set("k", "memory");
        let mut direct = local.clone();
        direct.set_item("k", "durable").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("memory"));
    }

    #[test]
    fn disabled_fallback_drops_failed_writes() {
        let mut store = AnswerStore::new(DisabledStore).with_fallback(false);
        store.init();
        assert!(!store.set("a", "1"));
        assert_eq!(store.get("a"), None);
    }

    #[test]
    fn keys_with_prefix_merges_sources() {
        let mut local = LocalStorage::new();
        local.set_item("/a::x", "{}").unwrap();
        local.set_item("/b::x", "{}").unwrap();
        let mut store = AnswerStore::new(local);
        store.init();
        assert_eq!(store.keys_with_prefix("/a::"), vec!["/a::x".to_string()]);
    }

    #[test]
    fn record_helpers_round_trip_and_report_corruption() {
        let mut store = AnswerStore::new(LocalStorage::new());
        store.init();
        let rec = PersistedAnswerRecord::submitted_text("abc", 5);
        assert!(store.save_record("k", &rec));
        assert_eq!(store.load_record("k").unwrap(), Some(rec));
        assert_eq!(store.load_record("missing").unwrap(), None);

        store.set("bad", "{oops");
        assert!(matches!(
            store.load_record("bad"),
            Err(RecordError::Malformed(_))
        ));
    }
}
