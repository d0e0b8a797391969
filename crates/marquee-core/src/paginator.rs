//! Paginated, searchable retrieval of records.
//!
//! A query resolves in two phases:
//!
//! 1. **Order** (only on cache miss, term change or forced reload): list every
//!    key of the collection with an 18-byte partial read, filtered server-side
//!    to titles starting with the search term, and sort by the visible title
//!    bytes. The resulting key order is cached.
//! 2. **Page**: slice the cached order to the requested window and fetch full
//!    buffers for those keys only, in one `get_many` call.
//!
//! Store failures fail the call and leave cached state untouched. Buffers that
//! fail to decode are skipped, as are records whose decoded title does not
//! start with the search, so a page may hold fewer records than asked for.

use std::ops::Range;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::codec::{decode_batch, encode_record};
use crate::config::PaginatorConfig;
use crate::error::{MarqueeError, MarqueeResult, StoreError};
use crate::index::{IndexCache, IndexStats};
use crate::ordering::{sort_listed, title_filter, SORT_WINDOW};
use crate::record::Record;
use crate::store::{RecordKey, RecordSink, RecordStore};

/// A 1-based page of `per_page` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: usize,
    pub per_page: usize,
}

impl PageWindow {
    /// Validate a page request.
    pub fn new(page: usize, per_page: usize) -> MarqueeResult<Self> {
        if page == 0 || per_page == 0 {
            return Err(MarqueeError::InvalidPage { page, per_page });
        }
        Ok(Self { page, per_page })
    }

    /// Index range of this page within `total` entries, clamped.
    ///
    /// A page past the end yields an empty range.
    pub fn range(&self, total: usize) -> Range<usize> {
        let start = (self.page - 1).saturating_mul(self.per_page).min(total);
        let end = self.page.saturating_mul(self.per_page).min(total);
        start..end
    }
}

/// Paginator over one collection of a store.
///
/// Owns its index cache; independent paginators never share cached orders.
pub struct Paginator<S: ?Sized> {
    store: Arc<S>,
    config: PaginatorConfig,
    index: Mutex<IndexCache>,
}

impl<S: RecordStore + ?Sized> Paginator<S> {
    pub fn new(store: Arc<S>, config: PaginatorConfig) -> Self {
        let index = IndexCache::with_slots(config.index_slots);
        Self {
            store,
            config,
            index: Mutex::new(index),
        }
    }

    pub fn config(&self) -> &PaginatorConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Records on `page` for `search`, sorted by title.
    ///
    /// Rebuilds the key order first if none is cached for `search` or if
    /// `force_reload` is set. A page past the end is empty and costs no
    /// store call.
    pub async fn query(
        &self,
        search: &str,
        page: usize,
        per_page: usize,
        force_reload: bool,
    ) -> MarqueeResult<Vec<Record>> {
        let window = PageWindow::new(page, per_page)?;
        let order = self.ordered_keys(search, force_reload).await?;

        let range = window.range(order.len());
        if range.is_empty() {
            debug!(search, page, per_page, total = order.len(), "page out of range");
            return Ok(Vec::new());
        }

        let keys = &order[range];
        let buffers = self.fetch_exact(keys).await?;
        let mut records = decode_batch(
            keys.iter().zip(buffers.iter().map(|b| b.as_deref())),
            self.config.accepted_tag,
        );
        // The store filter compares raw bytes and can match past a short title.
        records.retain(|r| r.title.starts_with(search));

        debug!(
            search,
            page,
            per_page,
            requested = keys.len(),
            decoded = records.len(),
            "resolved page"
        );
        Ok(records)
    }

    /// [`query`](Self::query) with the configured page size and no reload.
    pub async fn page(&self, search: &str, page: usize) -> MarqueeResult<Vec<Record>> {
        self.query(search, page, self.config.default_per_page, false)
            .await
    }

    /// List, sort and cache the key order for `search`.
    ///
    /// All-or-nothing: on store failure the previous order stays cached. If a
    /// newer rebuild has committed meanwhile, the result is returned but not
    /// cached.
    pub async fn rebuild(&self, search: &str) -> MarqueeResult<Arc<[RecordKey]>> {
        let ticket = self.index.lock().await.begin_rebuild(search);
        let generation = ticket.generation();

        let filter = title_filter(search);
        let listed = self
            .store
            .list_keys(&self.config.collection, Some(SORT_WINDOW), filter.as_ref())
            .await;
        let mut listed = match listed {
            Ok(listed) => listed,
            Err(e) => {
                self.index.lock().await.abort(ticket);
                warn!(search, generation, error = %e, "index rebuild failed");
                return Err(e.into());
            }
        };
        let malformed = sort_listed(&mut listed);
        let keys: Arc<[RecordKey]> = listed.into_iter().map(|e| e.key).collect();

        let committed = self.index.lock().await.commit(ticket, Arc::clone(&keys));
        if committed {
            debug!(search, generation, keys = keys.len(), malformed, "rebuilt index");
        } else {
            debug!(search, generation, "discarded stale index rebuild");
        }
        Ok(keys)
    }

    /// Every decodable record of the collection in store order.
    ///
    /// Fetches full buffers; does not read or modify the index cache.
    pub async fn scan_all(&self) -> MarqueeResult<Vec<Record>> {
        let listed = self
            .store
            .list_keys(&self.config.collection, None, None)
            .await?;
        let records = decode_batch(
            listed.iter().map(|e| (&e.key, Some(&e.data[..]))),
            self.config.accepted_tag,
        );
        debug!(listed = listed.len(), decoded = records.len(), "scanned collection");
        Ok(records)
    }

    /// Drop every cached order.
    pub async fn reset(&self) {
        self.index.lock().await.clear();
    }

    /// Length of the cached order for `search`, without any store call.
    pub async fn cached_total(&self, search: &str) -> Option<usize> {
        self.index.lock().await.peek(search).map(|keys| keys.len())
    }

    pub async fn stats(&self) -> IndexStats {
        self.index.lock().await.stats()
    }

    async fn ordered_keys(
        &self,
        search: &str,
        force_reload: bool,
    ) -> MarqueeResult<Arc<[RecordKey]>> {
        if !force_reload {
            if let Some(keys) = self.index.lock().await.lookup(search) {
                return Ok(keys);
            }
        }
        self.rebuild(search).await
    }

    async fn fetch_exact(&self, keys: &[RecordKey]) -> MarqueeResult<Vec<Option<Bytes>>> {
        let buffers = self.store.get_many(keys).await?;
        if buffers.len() != keys.len() {
            warn!(
                requested = keys.len(),
                returned = buffers.len(),
                "store returned wrong number of buffers"
            );
            return Err(StoreError::InvalidResponse {
                message: format!(
                    "get_many returned {} entries for {} keys",
                    buffers.len(),
                    keys.len()
                ),
            }
            .into());
        }
        Ok(buffers)
    }
}

impl<S: RecordStore + RecordSink + ?Sized> Paginator<S> {
    /// Encode `record` and submit it under `key`.
    ///
    /// Cached orders are not updated; a reload picks the record up.
    pub async fn publish(&self, key: RecordKey, record: &Record) -> MarqueeResult<()> {
        let buffer = encode_record(record)?;
        let len = buffer.len();
        self.store
            .submit(&self.config.collection, key, Bytes::from(buffer))
            .await?;
        debug!(key = %key, title = %record.title, len, "published record");
        Ok(())
    }
}
