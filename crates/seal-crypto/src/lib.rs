//! Cryptographic primitives for Seal Chain.
//!
//! Provides the double-hash primitive, the fixed-size Merkle accumulator,
//! the proof-of-work nonce search, and hash chain verification over sealed
//! blocks.
//!
//! All crypto operations wrap established libraries; no custom cryptography.

pub mod chain;
pub mod hasher;
pub mod merkle;
pub mod pow;

pub use chain::{ChainError, ChainVerifier, VerifyDepth};
pub use hasher::{DoubleHasher, HashAlgorithm, GENESIS_SEED_MATERIAL};
pub use merkle::{MerkleAccumulator, MerkleError};
pub use pow::{seed_material, DifficultyRule, PowError, ProofOfWork, Solution};
