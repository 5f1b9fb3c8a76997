use std::path::PathBuf;

use seal_crypto::{
    ChainVerifier, DifficultyRule, DoubleHasher, HashAlgorithm, MerkleAccumulator, ProofOfWork,
};
use seal_ledger::SyncMode;
use serde::{Deserialize, Serialize};

use crate::error::{NodeError, NodeResult};

/// Chain parameters and ledger location, fixed for the life of the process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Entries per block. Must be a non-zero power of two.
    pub block_size: usize,
    /// Capacity of the intake conduit.
    pub buffer_size: usize,
    /// Proof-of-work strength, in positions matched by `difficulty_rule`.
    pub difficulty: u32,
    pub difficulty_rule: DifficultyRule,
    pub hash_algorithm: HashAlgorithm,
    pub ledger_path: PathBuf,
    pub sync_mode: SyncMode,
    /// Continue from the last record of an existing ledger instead of
    /// starting a fresh chain at the genesis seed.
    pub resume: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            block_size: 4,
            buffer_size: 4096,
            difficulty: 2,
            difficulty_rule: DifficultyRule::default(),
            hash_algorithm: HashAlgorithm::default(),
            ledger_path: PathBuf::from("blockchain.dat"),
            sync_mode: SyncMode::default(),
            resume: true,
        }
    }
}

impl NodeConfig {
    /// Check every constant; returns the first violation.
    pub fn validate(&self) -> NodeResult<()> {
        if self.buffer_size == 0 {
            return Err(NodeError::Config("buffer_size must be at least 1".into()));
        }
        self.merkle()?;
        self.proof_of_work()?;
        Ok(())
    }

    pub fn hasher(&self) -> DoubleHasher {
        DoubleHasher::new(self.hash_algorithm)
    }

    pub fn merkle(&self) -> NodeResult<MerkleAccumulator> {
        MerkleAccumulator::new(self.hasher(), self.block_size)
            .map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn proof_of_work(&self) -> NodeResult<ProofOfWork> {
        ProofOfWork::new(self.hasher(), self.difficulty, self.difficulty_rule)
            .map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Verifier matching these parameters, anchored at the genesis seed.
    pub fn verifier(&self) -> NodeResult<ChainVerifier> {
        Ok(ChainVerifier::new(
            self.hasher().genesis_seed(),
            self.merkle()?,
            self.proof_of_work()?,
        ))
    }
}
