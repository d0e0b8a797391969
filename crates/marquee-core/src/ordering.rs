//! Ordering of listed keys by the title bytes visible in a partial read.
//!
//! Listing fetches only [`SORT_WINDOW`] (18 bytes starting at the title length
//! prefix) of each buffer, so at most [`VISIBLE_TITLE_BYTES`] title bytes take
//! part in the comparison. Titles that agree on those bytes keep store order.
//!
//! A window that cannot yield a title (fewer than 4 bytes, or a declared
//! length the record itself does not hold) is malformed. Comparisons that
//! involve a malformed window are [`TitleOrdering::Incomparable`]; the sort
//! resolves them by placing malformed entries after every well-formed one,
//! keeping their relative store order. This keeps the comparator a total order.

use std::cmp::Ordering;

use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

use crate::record::{LEN_PREFIX, TITLE_LEN_OFFSET, TITLE_OFFSET};
use crate::store::{ByteSlice, KeyedBuffer, PrefixFilter};

/// Bytes fetched per key when listing.
pub const SORT_WINDOW_LEN: usize = 18;

/// Partial-read window used for ordering: title length prefix plus the head of the title.
pub const SORT_WINDOW: ByteSlice = ByteSlice::new(TITLE_LEN_OFFSET, SORT_WINDOW_LEN);

/// Title bytes that take part in ordering.
pub const VISIBLE_TITLE_BYTES: usize = SORT_WINDOW_LEN - LEN_PREFIX;

/// Result of comparing two partial windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleOrdering {
    Less,
    Equal,
    Greater,
    /// At least one side is malformed.
    Incomparable,
}

impl From<Ordering> for TitleOrdering {
    fn from(ord: Ordering) -> Self {
        match ord {
            Ordering::Less => Self::Less,
            Ordering::Equal => Self::Equal,
            Ordering::Greater => Self::Greater,
        }
    }
}

impl TitleOrdering {
    /// The ordering, if both sides were comparable.
    pub fn as_ordering(self) -> Option<Ordering> {
        match self {
            Self::Less => Some(Ordering::Less),
            Self::Equal => Some(Ordering::Equal),
            Self::Greater => Some(Ordering::Greater),
            Self::Incomparable => None,
        }
    }
}

/// Server-side filter for titles starting with `search`; `None` for an empty search.
///
/// This is an exact byte-prefix match: no case folding, no substring search.
pub fn title_filter(search: &str) -> Option<PrefixFilter> {
    if search.is_empty() {
        None
    } else {
        Some(PrefixFilter::new(TITLE_OFFSET, search.as_bytes()))
    }
}

/// Title bytes visible in a partial window, or `None` if it is malformed.
///
/// A window longer than [`SORT_WINDOW_LEN`] (a store that ignored the slice)
/// is cut down first, so ordering does not depend on the store honouring it.
pub fn visible_title(window: &[u8]) -> Option<&[u8]> {
    let window = &window[..window.len().min(SORT_WINDOW_LEN)];
    if window.len() < LEN_PREFIX {
        return None;
    }
    let declared = LittleEndian::read_u32(&window[..LEN_PREFIX]) as usize;
    let title = &window[LEN_PREFIX..];
    if declared <= title.len() {
        Some(&title[..declared])
    } else if window.len() == SORT_WINDOW_LEN {
        // Cut by the read window, not by the record.
        Some(title)
    } else {
        None
    }
}

/// Compare two partial windows by visible title bytes.
pub fn compare_windows(a: &[u8], b: &[u8]) -> TitleOrdering {
    match (visible_title(a), visible_title(b)) {
        (Some(a), Some(b)) => a.cmp(b).into(),
        _ => TitleOrdering::Incomparable,
    }
}

/// Stable-sort listed entries by visible title; returns how many were malformed.
pub fn sort_listed(entries: &mut [KeyedBuffer]) -> usize {
    let malformed = entries
        .iter()
        .filter(|e| visible_title(&e.data).is_none())
        .count();

    entries.sort_by(|a, b| {
        compare_windows(&a.data, &b.data)
            .as_ordering()
            .unwrap_or_else(|| malformed_last(&a.data, &b.data))
    });

    if malformed > 0 {
        debug!(
            malformed,
            total = entries.len(),
            "malformed sort windows placed last"
        );
    }
    malformed
}

fn malformed_last(a: &[u8], b: &[u8]) -> Ordering {
    let a_ok = visible_title(a).is_some();
    let b_ok = visible_title(b).is_some();
    b_ok.cmp(&a_ok)
}
