//! Cache of sorted key orders, one per search term.
//!
//! With one slot (the default) the cache holds the order for exactly one
//! search term and any rebuild for another term replaces it. With more slots
//! it keeps several terms and evicts the least recently used.
//!
//! Orders are never patched in place: a rebuild produces a fresh
//! `Arc<[RecordKey]>` which [`IndexCache::commit`] swaps in whole, so a reader
//! holding the previous order keeps a complete one.
//!
//! Every rebuild takes a [`RebuildTicket`] before it calls the store. A
//! ticket commits only if
//! - no newer rebuild of the same term has committed already, and
//! - with a single slot, its term is still the most recently requested one.
//!
//! A discarded ticket is not an error; its caller still answers from the
//! order it fetched. A rebuild whose store call fails hands its ticket back
//! through [`IndexCache::abort`], which restores the request it superseded.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::Serialize;

use crate::store::RecordKey;

/// Counters for cache behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that found no order for the term.
    pub misses: u64,
    /// Rebuilds committed.
    pub rebuilds: u64,
    /// Rebuilds discarded as stale.
    pub discarded: u64,
}

/// Most recent rebuild request.
#[derive(Debug, Clone)]
struct Request {
    search: String,
    generation: u64,
}

/// Permission to commit one rebuild.
#[derive(Debug)]
pub struct RebuildTicket {
    search: String,
    generation: u64,
    superseded: Option<Request>,
}

impl RebuildTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug)]
struct KeyOrder {
    search: String,
    keys: Arc<[RecordKey]>,
    generation: u64,
}

#[derive(Debug)]
pub struct IndexCache {
    slots: usize,
    /// Most recently used first.
    entries: VecDeque<KeyOrder>,
    next_generation: u64,
    latest_request: Option<Request>,
    stats: IndexStats,
}

impl IndexCache {
    /// Single-slot cache.
    pub fn new() -> Self {
        Self::with_slots(1)
    }

    /// Cache holding up to `slots` search terms (at least one).
    pub fn with_slots(slots: usize) -> Self {
        let slots = slots.max(1);
        Self {
            slots,
            entries: VecDeque::with_capacity(slots),
            next_generation: 0,
            latest_request: None,
            stats: IndexStats::default(),
        }
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        self.stats
    }

    /// Search term of the most recently used order.
    pub fn active_search(&self) -> Option<&str> {
        self.entries.front().map(|e| e.search.as_str())
    }

    /// Cached order for `search`, marking it most recently used.
    pub fn lookup(&mut self, search: &str) -> Option<Arc<[RecordKey]>> {
        match self.position(search) {
            Some(pos) => {
                self.stats.hits += 1;
                if pos != 0 {
                    if let Some(entry) = self.entries.remove(pos) {
                        self.entries.push_front(entry);
                    }
                }
                self.entries.front().map(|e| Arc::clone(&e.keys))
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Cached order for `search` without touching recency or stats.
    pub fn peek(&self, search: &str) -> Option<&Arc<[RecordKey]>> {
        self.position(search).map(|pos| &self.entries[pos].keys)
    }

    /// Register a rebuild of `search` about to start.
    pub fn begin_rebuild(&mut self, search: &str) -> RebuildTicket {
        self.next_generation += 1;
        let request = Request {
            search: search.to_string(),
            generation: self.next_generation,
        };
        let superseded = self.latest_request.replace(request);
        RebuildTicket {
            search: search.to_string(),
            generation: self.next_generation,
            superseded,
        }
    }

    /// Give back the ticket of a rebuild that failed.
    ///
    /// If no later request was made, the request it superseded becomes the
    /// latest again, so an older rebuild of that term can still commit.
    pub fn abort(&mut self, ticket: RebuildTicket) {
        let still_latest = self
            .latest_request
            .as_ref()
            .map(|r| r.generation == ticket.generation)
            .unwrap_or(false);
        if still_latest {
            self.latest_request = ticket.superseded;
        }
    }

    /// Swap in a rebuilt order. Returns `false` if the ticket was stale.
    pub fn commit(&mut self, ticket: RebuildTicket, keys: Arc<[RecordKey]>) -> bool {
        if self.is_stale(&ticket) {
            self.stats.discarded += 1;
            return false;
        }

        if let Some(pos) = self.position(&ticket.search) {
            self.entries.remove(pos);
        }
        self.entries.push_front(KeyOrder {
            search: ticket.search,
            keys,
            generation: ticket.generation,
        });
        self.entries.truncate(self.slots);
        self.stats.rebuilds += 1;
        true
    }

    /// Drop every cached order. Stats are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.latest_request = None;
    }

    fn is_stale(&self, ticket: &RebuildTicket) -> bool {
        let superseded_same_term = self
            .position(&ticket.search)
            .map(|pos| self.entries[pos].generation > ticket.generation)
            .unwrap_or(false);
        let superseded_other_term =
            self.slots == 1
                && self.latest_request.as_ref().map(|r| r.search.as_str())
                    != Some(ticket.search.as_str());
        superseded_same_term || superseded_other_term
    }

    fn position(&self, search: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.search == search)
    }
}

impl Default for IndexCache {
    fn default() -> Self {
        Self::new()
    }
}
