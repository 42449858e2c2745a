//! # Key-Value Store Seam
//!
//! The storage engine is owned by the host chain. The core only needs
//! `get`/`set` by byte key, plus JSON codecs for the entities it persists.
//! Values are written as canonical bytes so two validators persisting the
//! same entity write the same bytes.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::canonical::CanonicalBytes;
use crate::error::StoreError;

/// Append/overwrite key-value store addressed by byte keys.
pub trait KvStore {
    /// Read the value at `key`.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Write `value` at `key`, replacing any previous value.
    fn set(&mut self, key: &[u8], value: Vec<u8>);

    /// True if a value exists at `key`.
    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }
}

/// Read and decode a JSON value.
pub fn get_json<T: DeserializeOwned>(
    store: &(impl KvStore + ?Sized),
    key: &[u8],
) -> Result<Option<T>, StoreError> {
    match store.get(key) {
        None => Ok(None),
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Decode {
                key: String::from_utf8_lossy(key).into_owned(),
                source,
            }),
    }
}

/// Encode a value canonically and write it.
pub fn set_json<T: Serialize>(
    store: &mut (impl KvStore + ?Sized),
    key: &[u8],
    value: &T,
) -> Result<(), StoreError> {
    let bytes = CanonicalBytes::new(value).map_err(|source| StoreError::Encode {
        key: String::from_utf8_lossy(key).into_owned(),
        source,
    })?;
    store.set(key, bytes.into_bytes());
    Ok(())
}

/// Ordered in-memory store for tests and the CLI.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys beginning with `prefix`, in byte order.
    pub fn keys_with_prefix<'a>(&'a self, prefix: &'a [u8]) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.entries
            .range(prefix.to_vec()..)
            .take_while(move |(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.as_slice())
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        self.entries.insert(key.to_vec(), value);
    }
}
