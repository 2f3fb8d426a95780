use thiserror::Error;

/// Result type for id generation and parsing.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by generator construction, shard resolution and id parsing.
///
/// Only [`Error::Parse`] is expected to be handled at runtime. The other
/// variants describe a misconfigured process that should not keep minting ids.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid sequence bits {bits}; expected {min}..={max}")]
    InvalidSequenceBits { bits: u32, min: u32, max: u32 },
    #[error("invalid shard bits {bits}; expected 0..={max}")]
    InvalidShardBits { bits: u32, max: u32 },
    #[error("shard bits ({shard_bits}) + sequence bits ({sequence_bits}) must be less than {limit}")]
    BitBudgetExceeded {
        shard_bits: u32,
        sequence_bits: u32,
        limit: u32,
    },
    #[error("failed to resolve shard id from network address: {0}")]
    ShardResolution(String),
    #[error("parse error")]
    Parse,
}
