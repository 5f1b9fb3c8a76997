use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use seal_crypto::VerifyDepth;
use seal_ledger::LedgerWriter;
use seal_types::{Block, Digest};
use tracing::info;

use crate::config::NodeConfig;
use crate::error::NodeResult;

/// Linkage anchor for the next block. Owned by the block assembler alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainTip {
    /// `prev_hash` of the next block.
    pub prev_hash: Digest,
    /// Number of blocks sealed so far; also the index of the next block.
    pub block_number: u64,
}

impl ChainTip {
    /// Tip of an empty chain.
    pub fn genesis(seed: Digest) -> Self {
        Self {
            prev_hash: seed,
            block_number: 0,
        }
    }

    /// Tip after `block` has been persisted.
    pub fn after(block: &Block) -> Self {
        Self {
            prev_hash: block.block_hash(),
            block_number: block.index() + 1,
        }
    }

    /// Reconstruct the tip from the records already in `ledger`.
    ///
    /// With `resume` off, or with an empty ledger, this is the genesis tip.
    /// Otherwise every record is read and checked for links and Merkle
    /// roots, and the chain continues after the last one. Block hashes are
    /// not held to the configured difficulty, which may differ from the one
    /// the ledger was sealed under.
    pub fn recover<W>(config: &NodeConfig, ledger: &W) -> NodeResult<Self>
    where
        W: LedgerWriter + ?Sized,
    {
        let genesis = Self::genesis(config.hasher().genesis_seed());
        if !config.resume {
            return Ok(genesis);
        }

        let blocks = ledger.read_all(config.block_size)?;
        let Some(last) = blocks.last() else {
            return Ok(genesis);
        };

        config
            .verifier()?
            .verify_chain(&blocks, VerifyDepth::Structure)?;
        let tip = Self::after(last);
        info!(
            blocks = tip.block_number,
            tip = %tip.prev_hash.short_hex(),
            "resuming chain from ledger"
        );
        Ok(tip)
    }
}

/// Read-only view of the chain tip shared with producers.
///
/// Updated by the assembler only after a block is persisted. Reads are
/// best-effort: a producer that just submitted an entry may observe a block
/// number whose block does not (yet) contain that entry.
#[derive(Debug)]
pub struct TipView {
    block_number: AtomicU64,
    tip_hash: RwLock<Digest>,
}

impl TipView {
    pub fn new(tip: ChainTip) -> Self {
        Self {
            block_number: AtomicU64::new(tip.block_number),
            tip_hash: RwLock::new(tip.prev_hash),
        }
    }

    /// Blocks sealed so far. Possibly stale.
    pub fn block_number(&self) -> u64 {
        self.block_number.load(Ordering::Acquire)
    }

    /// Hash of the most recently sealed block (or the genesis seed).
    pub fn tip_hash(&self) -> Digest {
        *self.tip_hash.read().expect("tip lock poisoned")
    }

    pub(crate) fn publish(&self, tip: ChainTip) {
        *self.tip_hash.write().expect("tip lock poisoned") = tip.prev_hash;
        self.block_number.store(tip.block_number, Ordering::Release);
    }
}
