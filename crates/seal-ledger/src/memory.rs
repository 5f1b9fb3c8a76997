use std::sync::{Arc, Mutex};

use seal_types::Block;

use crate::error::{LedgerError, WriteError};
use crate::traits::LedgerWriter;

/// In-memory ledger for tests, local demos, and embedding.
///
/// Clones share the same underlying record list, so a test can hand one
/// clone to the block assembler and inspect the other.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    blocks: Arc<Mutex<Vec<Block>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all appended blocks, in append order.
    pub fn blocks(&self) -> Vec<Block> {
        self.blocks.lock().expect("ledger mutex poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.blocks.lock().expect("ledger mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LedgerWriter for InMemoryLedger {
    fn append(&mut self, block: &Block) -> Result<(), WriteError> {
        self.blocks
            .lock()
            .expect("ledger mutex poisoned")
            .push(block.clone());
        Ok(())
    }

    fn read_all(&self, _block_size: usize) -> Result<Vec<Block>, LedgerError> {
        Ok(self.blocks())
    }
}
