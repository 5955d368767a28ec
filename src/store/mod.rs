//! Key-value store seam consumed by the contract.
//!
//! The contract never owns a store. Every operation is handed a
//! `&mut dyn LedgerStore` for the duration of a single invocation and reads
//! each key when it needs it.

use std::collections::BTreeMap;

use crate::error::StoreError;

mod file;

pub use file::FileStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Account-name keyed byte store backing the ledger.
pub trait LedgerStore {
    /// Returns the value stored under `key`, `None` when the key is absent.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    fn put(&mut self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Removes `key`. Removing an absent key is not an error.
    fn delete(&mut self, key: &str) -> StoreResult<()>;
}

/// In-process store, used by tests and as the reference backend.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LedgerStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_get_put_delete() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("alice").unwrap(), None);

        store.put("alice", b"100").unwrap();
        assert_eq!(store.get("alice").unwrap(), Some(b"100".to_vec()));
        assert_eq!(store.len(), 1);

        store.delete("alice").unwrap();
        store.delete("alice").unwrap();
        assert!(store.is_empty());
    }
}
