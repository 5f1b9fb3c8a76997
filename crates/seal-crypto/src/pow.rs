use std::sync::atomic::{AtomicBool, Ordering};

use seal_types::{Digest, DIGEST_LEN};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::hasher::DoubleHasher;

/// How `difficulty` positions are matched against a candidate digest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DifficultyRule {
    /// The lowercase hex encoding must start with `difficulty` `'0'` characters
    /// (4 bits per position).
    #[default]
    HexZeros,
    /// The first `difficulty` raw bytes must be `0x00` (8 bits per position).
    ZeroBytes,
}

impl DifficultyRule {
    /// Largest difficulty that a 32-byte digest can satisfy under this rule.
    pub fn max_difficulty(&self) -> u32 {
        match self {
            Self::HexZeros => (DIGEST_LEN * 2) as u32,
            Self::ZeroBytes => DIGEST_LEN as u32,
        }
    }

    /// Returns `true` if `digest` meets `difficulty` under this rule.
    pub fn is_met(&self, digest: &Digest, difficulty: u32) -> bool {
        match self {
            Self::HexZeros => digest.leading_zero_nibbles() >= difficulty,
            Self::ZeroBytes => digest.leading_zero_bytes() >= difficulty,
        }
    }
}

/// Errors from proof-of-work configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PowError {
    #[error("difficulty {difficulty} exceeds the maximum of {max} for rule {rule:?}")]
    DifficultyTooHigh {
        difficulty: u32,
        max: u32,
        rule: DifficultyRule,
    },
}

/// A winning nonce and the digest it produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Solution {
    /// Digest of `nonce ‖ seed`; becomes the block hash.
    pub digest: Digest,
    /// The winning nonce.
    pub nonce: u64,
    /// Number of candidates evaluated, including the winner.
    pub attempts: u64,
}

/// Build the seed material for a block: `prev_hash ‖ merkle_root ‖ timestamp`,
/// with the digests as raw bytes and the timestamp as decimal ASCII.
pub fn seed_material(prev_hash: &Digest, merkle_root: &Digest, timestamp: i64) -> Vec<u8> {
    let ts = timestamp.to_string();
    let mut seed = Vec::with_capacity(DIGEST_LEN * 2 + ts.len());
    seed.extend_from_slice(prev_hash.as_bytes());
    seed.extend_from_slice(merkle_root.as_bytes());
    seed.extend_from_slice(ts.as_bytes());
    seed
}

/// Deterministic nonce search.
///
/// Candidate `n` is `hash(decimal(n) ‖ seed)`. Nonces are tried from 0 in
/// increasing order and the first candidate meeting the difficulty predicate
/// wins. There is no iteration cap.
#[derive(Clone, Copy, Debug)]
pub struct ProofOfWork {
    hasher: DoubleHasher,
    difficulty: u32,
    rule: DifficultyRule,
}

impl ProofOfWork {
    pub fn new(
        hasher: DoubleHasher,
        difficulty: u32,
        rule: DifficultyRule,
    ) -> Result<Self, PowError> {
        let max = rule.max_difficulty();
        if difficulty > max {
            return Err(PowError::DifficultyTooHigh {
                difficulty,
                max,
                rule,
            });
        }
        Ok(Self {
            hasher,
            difficulty,
            rule,
        })
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn rule(&self) -> DifficultyRule {
        self.rule
    }

    /// Digest of a single candidate.
    pub fn candidate(&self, nonce: u64, seed: &[u8]) -> Digest {
        let n = nonce.to_string();
        self.hasher.hash_concat(&[n.as_bytes(), seed])
    }

    /// Returns `true` if `digest` satisfies the configured difficulty.
    pub fn meets_target(&self, digest: &Digest) -> bool {
        self.rule.is_met(digest, self.difficulty)
    }

    /// Search until a winning nonce is found. Never gives up.
    pub fn mine(&self, seed: &[u8]) -> Solution {
        let never = AtomicBool::new(false);
        match self.search(seed, &never) {
            Some(solution) => solution,
            // The cancel flag is local and never set, and the nonce space is
            // exhausted only after 2^64 attempts.
            None => unreachable!("uncancellable search returned without a solution"),
        }
    }

    /// Search until a winning nonce is found or `cancel` is set.
    ///
    /// The flag is checked before each attempt; nonce order is identical to
    /// [`ProofOfWork::mine`].
    pub fn mine_until(&self, seed: &[u8], cancel: &AtomicBool) -> Option<Solution> {
        self.search(seed, cancel)
    }

    fn search(&self, seed: &[u8], cancel: &AtomicBool) -> Option<Solution> {
        for nonce in 0..=u64::MAX {
            if cancel.load(Ordering::Relaxed) {
                debug!(attempts = nonce, "nonce search cancelled");
                return None;
            }
            let digest = self.candidate(nonce, seed);
            if self.meets_target(&digest) {
                return Some(Solution {
                    digest,
                    nonce,
                    attempts: nonce.saturating_add(1),
                });
            }
        }
        None
    }
}
