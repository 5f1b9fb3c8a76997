use std::io;

use seal_crypto::{ChainError, MerkleError};
use seal_ledger::{LedgerError, WriteError};
use thiserror::Error;

/// Errors that stop the block assembler.
///
/// Apart from `Cancelled`, every variant is fatal: the process must exit
/// rather than continue with a chain tip that is not backed by the ledger.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A batch of the wrong size reached the Merkle stage.
    #[error("fatal: invalid batch: {0}")]
    InvalidBatch(#[from] MerkleError),

    /// The sealed block could not be appended to the ledger.
    #[error("fatal: could not persist block {index}: {source}")]
    Persist { index: u64, source: WriteError },

    #[error("cannot open ledger: {0}")]
    LedgerOpen(WriteError),

    #[error("ledger recovery failed: {0}")]
    Recovery(#[from] LedgerError),

    #[error("existing ledger does not form a valid chain: {0}")]
    CorruptChain(#[from] ChainError),

    #[error("nonce search cancelled")]
    Cancelled,

    #[error("failed to spawn block assembler: {0}")]
    Spawn(io::Error),

    #[error("block assembler exited without reporting")]
    WorkerLost,
}

/// Errors returned to producers submitting entries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    /// The entry holds a `\n` byte and cannot be stored as one ledger line.
    #[error("entry contains a line break")]
    LineBreak,

    /// The block assembler has stopped; no further entries are accepted.
    #[error("block assembler is not running")]
    Closed,
}

pub type NodeResult<T> = Result<T, NodeError>;
