//! Paginator configuration.

use serde::{Deserialize, Serialize};

use crate::record::RECORD_TAG;
use crate::store::CollectionId;

/// Paginator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatorConfig {
    /// Collection whose buffers are listed.
    #[serde(default = "default_collection")]
    pub collection: CollectionId,

    /// Page size used by [`Paginator::page`](crate::Paginator::page).
    #[serde(default = "default_per_page")]
    pub default_per_page: usize,

    /// Number of search terms whose order is kept (1 = single slot).
    #[serde(default = "default_index_slots")]
    pub index_slots: usize,

    /// Only records with this tag are returned; `None` accepts any tag.
    #[serde(default = "default_accepted_tag")]
    pub accepted_tag: Option<u8>,
}

fn default_collection() -> CollectionId {
    CollectionId::new("marquee-reviews")
}

fn default_per_page() -> usize {
    10
}

fn default_index_slots() -> usize {
    1
}

fn default_accepted_tag() -> Option<u8> {
    Some(RECORD_TAG)
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            default_per_page: default_per_page(),
            index_slots: default_index_slots(),
            accepted_tag: default_accepted_tag(),
        }
    }
}

impl PaginatorConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `MARQUEE_COLLECTION` | Collection to list |
    /// | `MARQUEE_PER_PAGE` | Default page size |
    /// | `MARQUEE_INDEX_SLOTS` | Cached search terms |
    /// | `MARQUEE_RECORD_TAG` | Accepted record tag, or `any` |
    ///
    /// Unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        Self {
            collection: std::env::var("MARQUEE_COLLECTION")
                .ok()
                .filter(|v| !v.is_empty())
                .map(CollectionId::new)
                .unwrap_or_else(default_collection),
            default_per_page: std::env::var("MARQUEE_PER_PAGE")
                .ok()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or_else(default_per_page)
                .max(1),
            index_slots: std::env::var("MARQUEE_INDEX_SLOTS")
                .ok()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or_else(default_index_slots)
                .max(1),
            accepted_tag: match std::env::var("MARQUEE_RECORD_TAG") {
                Ok(v) if v.trim().eq_ignore_ascii_case("any") => None,
                Ok(v) => v
                    .trim()
                    .parse::<u8>()
                    .map(Some)
                    .unwrap_or_else(|_| default_accepted_tag()),
                Err(_) => default_accepted_tag(),
            },
        }
    }

    /// Set the collection.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = CollectionId::new(collection);
        self
    }

    /// Set the default page size (at least 1).
    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.default_per_page = per_page.max(1);
        self
    }

    /// Set the number of cached search terms (at least 1).
    pub fn with_index_slots(mut self, slots: usize) -> Self {
        self.index_slots = slots.max(1);
        self
    }

    /// Set the accepted record tag.
    pub fn with_accepted_tag(mut self, tag: Option<u8>) -> Self {
        self.accepted_tag = tag;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for var in [
            "MARQUEE_COLLECTION",
            "MARQUEE_PER_PAGE",
            "MARQUEE_INDEX_SLOTS",
            "MARQUEE_RECORD_TAG",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_config_from_env_defaults() {
        clear_env();
        let config = PaginatorConfig::from_env();
        assert_eq!(config, PaginatorConfig::default());
        assert_eq!(config.collection.as_str(), "marquee-reviews");
        assert_eq!(config.accepted_tag, Some(RECORD_TAG));
    }

    #[test]
    #[serial]
    fn test_config_from_env_overrides() {
        clear_env();
        std::env::set_var("MARQUEE_COLLECTION", "movie-reviews-devnet");
        std::env::set_var("MARQUEE_PER_PAGE", "25");
        std::env::set_var("MARQUEE_INDEX_SLOTS", "4");
        std::env::set_var("MARQUEE_RECORD_TAG", "any");

        let config = PaginatorConfig::from_env();
        assert_eq!(config.collection.as_str(), "movie-reviews-devnet");
        assert_eq!(config.default_per_page, 25);
        assert_eq!(config.index_slots, 4);
        assert_eq!(config.accepted_tag, None);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_from_env_invalid_values_fall_back() {
        clear_env();
        std::env::set_var("MARQUEE_PER_PAGE", "lots");
        std::env::set_var("MARQUEE_INDEX_SLOTS", "0");
        std::env::set_var("MARQUEE_RECORD_TAG", "300");

        let config = PaginatorConfig::from_env();
        assert_eq!(config.default_per_page, 10);
        assert_eq!(config.index_slots, 1);
        assert_eq!(config.accepted_tag, Some(RECORD_TAG));
        clear_env();
    }

    #[test]
    fn test_config_builder() {
        let config = PaginatorConfig::default()
            .with_collection("reviews")
            .with_per_page(0)
            .with_index_slots(8)
            .with_accepted_tag(Some(2));
        assert_eq!(config.collection.as_str(), "reviews");
        assert_eq!(config.default_per_page, 1);
        assert_eq!(config.index_slots, 8);
        assert_eq!(config.accepted_tag, Some(2));
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: PaginatorConfig =
            serde_json::from_str(r#"{"collection": "reviews", "index_slots": 3}"#).unwrap();
        assert_eq!(config.collection.as_str(), "reviews");
        assert_eq!(config.index_slots, 3);
        assert_eq!(config.default_per_page, 10);
        assert_eq!(config.accepted_tag, Some(RECORD_TAG));

        let config: PaginatorConfig = serde_json::from_str(r#"{"accepted_tag": null}"#).unwrap();
        assert_eq!(config.accepted_tag, None);
    }
}
