use thiserror::Error;

/// Errors returned by chain operations.
///
/// All variants are recoverable; the HTTP layer maps them to responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("wallet address must not be empty")]
    EmptyAddress,
    #[error("verification message must not be empty")]
    EmptyMessage,
    #[error("signature must not be empty")]
    EmptySignature,
    #[error("malformed verification message: {0}")]
    MalformedMessage(String),
    #[error("invalid timestamp: message is {seconds}s in the future")]
    FutureTimestamp { seconds: i64 },
    #[error("verification message is outdated ({age}s old)")]
    OutdatedMessage { age: i64 },
    #[error("signature does not match message")]
    InvalidSignature,
    #[error("invalid height: {requested} (chain height is {height})")]
    InvalidHeight { requested: u64, height: u64 },
    #[error("hash must be exactly 32 bytes, got {0}")]
    InvalidHashLength(usize),
    #[error("block not found")]
    BlockNotFound,
}

impl ChainError {
    /// Whether the error means the requested block does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::InvalidHeight { .. } | Self::BlockNotFound)
    }
}
