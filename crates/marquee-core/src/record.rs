//! The decoded review record and its wire constants.
//!
//! # Wire Layout
//!
//! ```text
//! offset 0       tag               u8
//! offset 1       rating            u8
//! offset 2       title_len         u32 LE
//! offset 6       title             title_len bytes, UTF-8
//! offset 6+L     description_len   u32 LE
//! offset 10+L    description       description_len bytes, UTF-8
//! ```

use serde::{Deserialize, Serialize};

/// Tag written by the review program for an initialized review account.
pub const RECORD_TAG: u8 = 1;

/// Bytes before the title: tag, rating, title length.
pub const HEADER_LEN: usize = 6;

/// Width of a length prefix.
pub const LEN_PREFIX: usize = 4;

/// Offset of the title length prefix.
pub const TITLE_LEN_OFFSET: usize = 2;

/// Offset of the first title byte.
pub const TITLE_OFFSET: usize = HEADER_LEN;

/// Smallest possible encoded record (both strings empty).
pub const MIN_RECORD_LEN: usize = HEADER_LEN + LEN_PREFIX;

/// Upper bound on an encoded record accepted for writing (10 KiB).
pub const MAX_RECORD_LEN: usize = 10 * 1024;

/// Valid ratings.
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// A review record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Account shape discriminator.
    pub tag: u8,

    /// Rating, 1 to 5. Not checked on decode.
    pub rating: u8,

    /// Title (e.g., "Alien").
    pub title: String,

    /// Free-form review text.
    pub description: String,
}

impl Record {
    /// Create a record with the current tag.
    pub fn new(title: impl Into<String>, rating: u8, description: impl Into<String>) -> Self {
        Self {
            tag: RECORD_TAG,
            rating,
            title: title.into(),
            description: description.into(),
        }
    }

    /// Set the tag.
    pub fn with_tag(mut self, tag: u8) -> Self {
        self.tag = tag;
        self
    }

    /// Length of this record once encoded.
    pub fn encoded_len(&self) -> usize {
        MIN_RECORD_LEN + self.title.len() + self.description.len()
    }

    /// Whether the rating is within `[1, 5]`.
    pub fn has_valid_rating(&self) -> bool {
        RATING_RANGE.contains(&self.rating)
    }
}
