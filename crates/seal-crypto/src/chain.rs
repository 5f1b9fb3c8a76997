use seal_types::{Block, Digest};

use crate::merkle::{MerkleAccumulator, MerkleError};
use crate::pow::{seed_material, ProofOfWork};

/// How much work [`ChainVerifier::verify_chain`] performs per block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VerifyDepth {
    /// Links and Merkle roots only. Difficulty is a per-run setting, so a
    /// ledger sealed under another difficulty still passes.
    Structure,
    /// Links, Merkle roots, and the difficulty predicate on each block hash.
    #[default]
    Links,
    /// Everything in `Links`, plus re-running the nonce search to confirm the
    /// recorded block hash is the first winning candidate.
    Full,
}

/// Hash chain integrity verifier for sealed blocks.
///
/// Checks, in order, for every block:
/// 1. Block 0 links to the genesis seed; block `i` links to block `i - 1`
/// 2. The Merkle root recomputes from the entries
/// 3. (not `Structure`) the block hash meets the difficulty predicate
/// 4. (`Full` only) the block hash is the first winning nonce's digest
pub struct ChainVerifier {
    genesis: Digest,
    merkle: MerkleAccumulator,
    pow: ProofOfWork,
}

impl ChainVerifier {
    pub fn new(genesis: Digest, merkle: MerkleAccumulator, pow: ProofOfWork) -> Self {
        Self {
            genesis,
            merkle,
            pow,
        }
    }

    /// Verify a chain starting at block 0.
    pub fn verify_chain(&self, blocks: &[Block], depth: VerifyDepth) -> Result<(), ChainError> {
        let mut expected_prev = self.genesis;
        for (i, block) in blocks.iter().enumerate() {
            let index = i as u64;
            if block.prev_hash() != expected_prev {
                return Err(if index == 0 {
                    ChainError::GenesisMismatch
                } else {
                    ChainError::BrokenLink { index }
                });
            }
            self.verify_block(block, index, depth)?;
            expected_prev = block.block_hash();
        }
        Ok(())
    }

    /// Verify a single block's contents, ignoring its link to the chain.
    pub fn verify_block(
        &self,
        block: &Block,
        index: u64,
        depth: VerifyDepth,
    ) -> Result<(), ChainError> {
        let root = self
            .merkle
            .compute_root(block.entries())
            .map_err(|source| ChainError::Batch { index, source })?;
        if root != block.merkle_root() {
            return Err(ChainError::MerkleMismatch { index });
        }

        if depth != VerifyDepth::Structure && !self.pow.meets_target(&block.block_hash()) {
            return Err(ChainError::TargetNotMet { index });
        }

        if depth == VerifyDepth::Full {
            let seed = seed_material(&block.prev_hash(), &root, block.timestamp());
            let solution = self.pow.mine(&seed);
            if solution.digest != block.block_hash() {
                return Err(ChainError::HashMismatch { index });
            }
        }

        Ok(())
    }
}

/// Errors from chain verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("first block does not link to the genesis seed")]
    GenesisMismatch,

    #[error("broken link at block {index}: prev_hash does not match")]
    BrokenLink { index: u64 },

    #[error("block {index} has a malformed batch: {source}")]
    Batch { index: u64, source: MerkleError },

    #[error("merkle root mismatch at block {index}")]
    MerkleMismatch { index: u64 },

    #[error("block hash at block {index} does not meet the difficulty target")]
    TargetNotMet { index: u64 },

    #[error("block hash at block {index} is not the first proof-of-work solution")]
    HashMismatch { index: u64 },
}
