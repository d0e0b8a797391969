//! Store boundary: a keyed byte-buffer source that can be listed cheaply.
//!
//! The store is a collaborator. It owns no paginator state and answers each
//! call with a snapshot that was consistent at some instant; nothing is
//! atomic across calls.
//!
//! # Contract
//!
//! - `list_keys` returns every `(key, buffer)` of a collection. A
//!   [`ByteSlice`] truncates each returned buffer to the window (shorter or
//!   empty when the buffer ends inside or before it). A [`PrefixFilter`] keeps
//!   only buffers whose bytes at `offset` equal `bytes` exactly.
//! - `get_many` returns one entry per requested key, in request order;
//!   `None` marks a key with no buffer.

pub mod memory;

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use crate::error::{StoreError, StoreResult};
pub use memory::MemoryStore;

/// Length of a record address.
pub const KEY_LEN: usize = 32;

/// Opaque address of one record buffer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey([u8; KEY_LEN]);

impl RecordKey {
    pub const fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive an address from seeds (e.g., author key and title).
    ///
    /// Seeds are length-prefixed before hashing so `["ab", "c"]` and
    /// `["a", "bc"]` map to different keys.
    pub fn derive(seeds: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for seed in seeds {
            hasher.update((seed.len() as u32).to_le_bytes());
            hasher.update(seed);
        }
        let digest = hasher.finalize();
        let mut out = [0u8; KEY_LEN];
        out.copy_from_slice(&digest);
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordKey({})", self)
    }
}

impl FromStr for RecordKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = [0u8; KEY_LEN];
        hex::decode_to_slice(s, &mut out).map_err(|e| StoreError::InvalidResponse {
            message: format!("invalid record key '{}': {}", s, e),
        })?;
        Ok(Self(out))
    }
}

/// Identifies the collection (owning program) whose buffers are listed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(String);

impl CollectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Partial-read window applied to every listed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSlice {
    pub offset: usize,
    pub length: usize,
}

impl ByteSlice {
    pub const fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// Index range this window covers in a buffer of `len` bytes.
    pub fn range(&self, len: usize) -> Range<usize> {
        let start = self.offset.min(len);
        let end = self.offset.saturating_add(self.length).min(len);
        start..end
    }

    /// The part of `buf` this window covers.
    pub fn apply<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.range(buf.len())]
    }
}

/// Exact-bytes-at-offset predicate evaluated by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixFilter {
    pub offset: usize,
    pub bytes: Vec<u8>,
}

impl PrefixFilter {
    pub fn new(offset: usize, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            offset,
            bytes: bytes.into(),
        }
    }

    /// Whether `buf` holds `bytes` at `offset`.
    pub fn matches(&self, buf: &[u8]) -> bool {
        match self.offset.checked_add(self.bytes.len()) {
            Some(end) if end <= buf.len() => buf[self.offset..end] == self.bytes[..],
            _ => false,
        }
    }
}

/// One listed entry: a key and its (possibly sliced) buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedBuffer {
    pub key: RecordKey,
    pub data: Bytes,
}

/// Read side of the store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// List keys of a collection with their buffers, optionally sliced and filtered.
    async fn list_keys(
        &self,
        collection: &CollectionId,
        slice: Option<ByteSlice>,
        filter: Option<&PrefixFilter>,
    ) -> StoreResult<Vec<KeyedBuffer>>;

    /// Fetch full buffers for `keys`, one entry per key, same order.
    async fn get_many(&self, keys: &[RecordKey]) -> StoreResult<Vec<Option<Bytes>>>;
}

/// Write side of the store: submit a pre-encoded buffer.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn submit(&self, collection: &CollectionId, key: RecordKey, buffer: Bytes)
        -> StoreResult<()>;
}
