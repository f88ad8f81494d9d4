//! Error types for sarani.

use thiserror::Error;

/// sarani error type.
#[derive(Error, Debug)]
pub enum Error {
    /// The arena (or a single payload) would outgrow 32-bit addressing.
    /// Fatal to the write; the caller must split the data.
    #[error("Capacity exceeded: {requested} bytes requested, limit is {limit}")]
    CapacityExceeded { requested: u64, limit: u64 },

    /// A frame's length prefix points past the end of the arena, or a
    /// persisted file has a bad header or truncated segment.
    #[error("Corrupt frame: {0}")]
    CorruptFrame(String),

    /// Row, column, or byte index beyond the addressed bounds. Never
    /// clamped; strict accessors surface this immediately.
    #[error("Index out of range: {index} >= {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Cell/column mismatch while writing: unknown column, wrong width for
    /// a fixed column, missing or duplicated cell in an open row.
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for sarani operations.
pub type Result<T> = std::result::Result<T, Error>;
