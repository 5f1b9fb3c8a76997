use std::io;
use std::path::PathBuf;

/// Errors from appending a block to the durable log.
///
/// Every variant is fatal to the block assembler: a block that was not
/// persisted must never become the chain tip.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// The log file could not be opened for appending.
    #[error("cannot open ledger {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    /// Writing or flushing the record failed; the tail may hold a partial record.
    #[error("write to ledger {path} failed: {source}")]
    Write { path: PathBuf, source: io::Error },

    /// `sync_data` after the flush failed.
    #[error("sync of ledger {path} failed: {source}")]
    Sync { path: PathBuf, source: io::Error },

    /// The block contains an entry that cannot be stored as a single line.
    #[error("entry {position} of block {index} contains a line break")]
    Unrepresentable { index: u64, position: usize },
}

/// Errors from reading the durable log back.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A record line could not be parsed.
    #[error("malformed record {index} at line {line}: {reason}")]
    Malformed {
        index: u64,
        line: u64,
        reason: String,
    },

    /// The file ends part-way through a record (torn final write).
    #[error("record {index} is truncated at line {line}")]
    Truncated { index: u64, line: u64 },
}
