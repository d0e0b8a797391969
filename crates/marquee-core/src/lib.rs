//! Paginated, searchable view over review records stored as raw buffers.
//!
//! This crate provides:
//!
//! - A byte-exact codec for the variable-length review record
//! - A cache of sorted key orders, built from cheap partial reads
//! - Page retrieval that fetches full buffers for one page only
//! - A store seam ([`RecordStore`], [`RecordSink`]) with an in-memory implementation
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use marquee_core::{MemoryStore, Paginator, PaginatorConfig, Record, RecordKey};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let paginator = Paginator::new(store, PaginatorConfig::from_env());
//!
//! let review = Record::new("Alien", 5, "In space no one can hear you scream.");
//! let key = RecordKey::derive(&[b"reviewer", review.title.as_bytes()]);
//! paginator.publish(key, &review).await?;
//!
//! // First page of titles starting with "Al", reloading the cached order.
//! let records = paginator.query("Al", 1, 10, true).await?;
//! for record in records {
//!     println!("{} ({}/5)", record.title, record.rating);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `MARQUEE_COLLECTION` | Collection to list (default: `marquee-reviews`) |
//! | `MARQUEE_PER_PAGE` | Default page size (default: 10) |
//! | `MARQUEE_INDEX_SLOTS` | Search terms kept in the index cache (default: 1) |
//! | `MARQUEE_RECORD_TAG` | Accepted record tag, or `any` (default: 1) |

pub mod codec;
pub mod config;
pub mod error;
pub mod index;
pub mod ordering;
pub mod paginator;
pub mod record;
pub mod store;

// Re-export main types
pub use codec::{decode_batch, decode_expecting, decode_record, encode_record};
pub use config::PaginatorConfig;
pub use error::{
    DecodeError, EncodeError, MarqueeError, MarqueeResult, StoreError, StoreResult,
};
pub use index::{IndexCache, IndexStats, RebuildTicket};
pub use ordering::{
    compare_windows, sort_listed, title_filter, visible_title, TitleOrdering, SORT_WINDOW,
    SORT_WINDOW_LEN, VISIBLE_TITLE_BYTES,
};
pub use paginator::{PageWindow, Paginator};
pub use record::{Record, MAX_RECORD_LEN, RECORD_TAG};
pub use store::{
    ByteSlice, CollectionId, KeyedBuffer, MemoryStore, PrefixFilter, RecordKey, RecordSink,
    RecordStore,
};
