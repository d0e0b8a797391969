//! Error types for the codec, the store boundary and the paginator.

/// Failure to decode one record buffer.
///
/// Local to a single record: the paginator skips the buffer and carries on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The buffer ends before a declared field does.
    #[error("buffer too short: need {needed} bytes, have {available}")]
    TooShort { needed: usize, available: usize },

    /// A text region is not valid UTF-8.
    #[error("invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    /// The record carries a tag the caller does not accept.
    #[error("unexpected record tag {found} (expected {expected})")]
    UnexpectedTag { found: u8, expected: u8 },
}

/// Failure to build a buffer for writing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// The encoded record would exceed the store's size bound.
    #[error("record too large: {len} bytes (max {max})")]
    RecordTooLarge { len: usize, max: usize },

    /// Rating is outside `[1, 5]`.
    #[error("rating out of range: {rating} (expected 1..=5)")]
    RatingOutOfRange { rating: u8 },

    /// Title is empty.
    #[error("title must not be empty")]
    EmptyTitle,
}

/// Errors surfaced by a store collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Transport failure (connection refused, timeout, reset).
    #[error("network error: {message}")]
    Network { message: String },

    /// The store answered but refused the request.
    #[error("request rejected: {message}")]
    Rejected { message: String },

    /// The store answered with something that does not match the contract.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Other errors.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    /// Whether the call may succeed if repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by [`Paginator`](crate::Paginator) operations.
#[derive(Debug, thiserror::Error)]
pub enum MarqueeError {
    /// Page numbers are 1-based and pages hold at least one record.
    #[error("invalid page request: page {page}, per_page {per_page}")]
    InvalidPage { page: usize, per_page: usize },

    /// The record could not be encoded for publishing.
    #[error("encode failed: {0}")]
    Encode(#[from] EncodeError),

    /// The store call failed; cached state is left as it was.
    #[error("store failed: {0}")]
    Store(#[from] StoreError),
}

impl MarqueeError {
    /// Exit code for command-line consumers.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidPage { .. } => 1,
            Self::Encode(_) => 2,
            Self::Store(_) => 5,
        }
    }

    /// Whether the error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Result type for paginator operations.
pub type MarqueeResult<T> = Result<T, MarqueeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let network = MarqueeError::Store(StoreError::Network {
            message: "connection reset".into(),
        });
        assert!(network.is_retryable());
        assert_eq!(network.exit_code(), 5);

        let rejected = MarqueeError::Store(StoreError::Rejected {
            message: "filter too long".into(),
        });
        assert!(!rejected.is_retryable());

        let invalid = MarqueeError::InvalidPage {
            page: 0,
            per_page: 10,
        };
        assert!(!invalid.is_retryable());
        assert_eq!(invalid.exit_code(), 1);
    }

    #[test]
    fn test_error_messages() {
        let err = DecodeError::TooShort {
            needed: 10,
            available: 4,
        };
        assert_eq!(err.to_string(), "buffer too short: need 10 bytes, have 4");

        let err = MarqueeError::from(EncodeError::RatingOutOfRange { rating: 9 });
        assert_eq!(
            err.to_string(),
            "encode failed: rating out of range: 9 (expected 1..=5)"
        );
    }

    #[test]
    fn test_anyhow_passthrough() {
        let err: StoreError = anyhow::anyhow!("rpc node unavailable").into();
        assert_eq!(err.to_string(), "rpc node unavailable");
        assert!(!err.is_retryable());
    }
}
