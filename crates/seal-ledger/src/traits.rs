use seal_types::Block;

use crate::error::{LedgerError, WriteError};

/// Storage boundary for the block ledger.
///
/// Implementations are append-only: a successful `append` is permanent and
/// previously written records are never rewritten. `read_all` returns what
/// this ledger already holds, so a restarted node resumes from the same
/// storage it will append to.
pub trait LedgerWriter: Send {
    fn append(&mut self, block: &Block) -> Result<(), WriteError>;

    /// Every stored block in append order. Records carry no entry count, so
    /// readers need `block_size`.
    fn read_all(&self, block_size: usize) -> Result<Vec<Block>, LedgerError>;
}

impl<W: LedgerWriter + ?Sized> LedgerWriter for Box<W> {
    fn append(&mut self, block: &Block) -> Result<(), WriteError> {
        (**self).append(block)
    }

    fn read_all(&self, block_size: usize) -> Result<Vec<Block>, LedgerError> {
        (**self).read_all(block_size)
    }
}
