//! In-process implementation of the store contract.
//!
//! Useful for tests and for embedding. Listing order is key order, which is
//! as arbitrary as a real ledger's from the paginator's point of view.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use super::{
    ByteSlice, CollectionId, KeyedBuffer, PrefixFilter, RecordKey, RecordSink, RecordStore,
    StoreError, StoreResult,
};

type Collections = HashMap<CollectionId, BTreeMap<RecordKey, Bytes>>;

/// Store backed by a map per collection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
    fail_next_list: AtomicBool,
    fail_next_get: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw buffer, replacing any previous one.
    pub fn insert(&self, collection: &CollectionId, key: RecordKey, buffer: impl Into<Bytes>) {
        self.lock()
            .entry(collection.clone())
            .or_default()
            .insert(key, buffer.into());
    }

    /// Remove a buffer. Returns whether it existed.
    pub fn remove(&self, collection: &CollectionId, key: &RecordKey) -> bool {
        self.lock()
            .get_mut(collection)
            .map(|c| c.remove(key).is_some())
            .unwrap_or(false)
    }

    /// Number of buffers in a collection.
    pub fn len(&self, collection: &CollectionId) -> usize {
        self.lock().get(collection).map(BTreeMap::len).unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &CollectionId) -> bool {
        self.len(collection) == 0
    }

    /// Number of `list_keys` calls answered so far (including failed ones).
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of `get_many` calls answered so far (including failed ones).
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Make the next `list_keys` call fail with a network error.
    pub fn fail_next_list(&self) {
        self.fail_next_list.store(true, Ordering::SeqCst);
    }

    /// Make the next `get_many` call fail with a network error.
    pub fn fail_next_get(&self) {
        self.fail_next_get.store(true, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, Collections> {
        self.collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn injected_failure(flag: &AtomicBool, operation: &str) -> StoreResult<()> {
        if flag.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Network {
                message: format!("injected failure in {}", operation),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_keys(
        &self,
        collection: &CollectionId,
        slice: Option<ByteSlice>,
        filter: Option<&PrefixFilter>,
    ) -> StoreResult<Vec<KeyedBuffer>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Self::injected_failure(&self.fail_next_list, "list_keys")?;

        let collections = self.lock();
        let Some(entries) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let listed: Vec<KeyedBuffer> = entries
            .iter()
            .filter(|(_, buf)| filter.map_or(true, |f| f.matches(buf)))
            .map(|(key, buf)| {
                let data = match slice {
                    Some(window) => buf.slice(window.range(buf.len())),
                    None => buf.clone(),
                };
                KeyedBuffer { key: *key, data }
            })
            .collect();

        debug!(
            collection = %collection,
            listed = listed.len(),
            total = entries.len(),
            "listed keys"
        );
        Ok(listed)
    }

    async fn get_many(&self, keys: &[RecordKey]) -> StoreResult<Vec<Option<Bytes>>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Self::injected_failure(&self.fail_next_get, "get_many")?;

        let collections = self.lock();
        Ok(keys
            .iter()
            .map(|key| {
                collections
                    .values()
                    .find_map(|entries| entries.get(key).cloned())
            })
            .collect())
    }
}

#[async_trait]
impl RecordSink for MemoryStore {
    async fn submit(
        &self,
        collection: &CollectionId,
        key: RecordKey,
        buffer: Bytes,
    ) -> StoreResult<()> {
        debug!(collection = %collection, key = %key, len = buffer.len(), "submitted buffer");
        self.insert(collection, key, buffer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u8) -> RecordKey {
        RecordKey::new([n; 32])
    }

    fn reviews() -> CollectionId {
        CollectionId::new("reviews")
    }

    #[tokio::test]
    async fn test_list_applies_slice_and_filter() {
        let store = MemoryStore::new();
        store.insert(&reviews(), key(1), b"xxAmelie".to_vec());
        store.insert(&reviews(), key(2), b"xxBatman".to_vec());
        store.insert(&reviews(), key(3), b"x".to_vec());

        let all = store.list_keys(&reviews(), None, None).await.unwrap();
        assert_eq!(all.len(), 3);

        let sliced = store
            .list_keys(&reviews(), Some(ByteSlice::new(2, 3)), None)
            .await
            .unwrap();
        let parts: Vec<&[u8]> = sliced.iter().map(|e| e.data.as_ref()).collect();
        assert_eq!(parts, vec![&b"Ame"[..], &b"Bat"[..], &b""[..]]);

        let filter = PrefixFilter::new(2, b"Am".to_vec());
        let filtered = store
            .list_keys(&reviews(), None, Some(&filter))
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].key, key(1));
        assert_eq!(store.list_calls(), 3);
    }

    #[tokio::test]
    async fn test_list_unknown_collection_is_empty() {
        let store = MemoryStore::new();
        let listed = store
            .list_keys(&CollectionId::new("nope"), None, None)
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_get_many_preserves_order_and_absence() {
        let store = MemoryStore::new();
        store.insert(&reviews(), key(1), b"one".to_vec());
        store.insert(&reviews(), key(2), b"two".to_vec());

        let got = store.get_many(&[key(2), key(9), key(1)]).await.unwrap();
        assert_eq!(
            got,
            vec![
                Some(Bytes::from_static(b"two")),
                None,
                Some(Bytes::from_static(b"one"))
            ]
        );
        assert_eq!(store.get_calls(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures_are_one_shot() {
        let store = MemoryStore::new();
        store.fail_next_list();
        store.fail_next_get();

        let err = store.list_keys(&reviews(), None, None).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(store.list_keys(&reviews(), None, None).await.is_ok());

        assert!(store.get_many(&[key(1)]).await.is_err());
        assert!(store.get_many(&[key(1)]).await.is_ok());
    }

    #[tokio::test]
    async fn test_submit_and_remove() {
        let store = MemoryStore::new();
        store
            .submit(&reviews(), key(4), Bytes::from_static(b"buf"))
            .await
            .unwrap();
        assert_eq!(store.len(&reviews()), 1);
        assert!(store.remove(&reviews(), &key(4)));
        assert!(!store.remove(&reviews(), &key(4)));
        assert!(store.is_empty(&reviews()));
    }
}
