//! Error types for the codec and the block store.
//!
//! ## Error Categories
//!
//! - `Corrupt`: the compressed data is malformed. Never recovered from, since
//!   the output buffer may already be partially overwritten.
//! - `Verification`: a freshly compressed block did not expand back to its
//!   input. Fatal for a build; the block is never persisted.
//! - `Io`: reading or writing a container failed. Surfaced unmodified.
//! - `BufferTooSmall`, `KeyOutOfRange`, `Config`: caller mistakes.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("corrupt data: {0}")]
    Corrupt(#[from] FormatError),

    #[error("verification failed for key {key} at position {position}: expected {expected}, got {actual}")]
    Verification {
        key: usize,
        position: usize,
        expected: i32,
        actual: i32,
    },

    #[error("buffer too small: need {needed} words, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("key {key} out of range (store holds {count} blocks)")]
    KeyOutOfRange { key: usize, count: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for errors caused by malformed compressed data.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Error::Corrupt(_))
    }
}

/// Ways in which a block or a container can be malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("literal run of {count} words at block position {position} runs past the block end")]
    TruncatedBlock { position: usize, count: usize },

    #[error("back-reference distance {distance} at output position {position} reaches before the start")]
    BadReference { position: usize, distance: usize },

    #[error("instruction at block position {position} writes {count} words past output length {capacity}")]
    OutputOverrun {
        position: usize,
        count: usize,
        capacity: usize,
    },

    #[error("decoded {actual} words, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("container ends inside block {key}")]
    TruncatedContainer { key: usize },

    #[error("container holds {actual} blocks, expected {expected}")]
    KeyCount { expected: usize, actual: usize },
}
