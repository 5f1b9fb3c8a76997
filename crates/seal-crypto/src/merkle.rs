use seal_types::Digest;

use crate::hasher::DoubleHasher;

/// Errors from Merkle root computation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MerkleError {
    #[error("invalid batch size: expected {expected} entries, got {actual}")]
    InvalidBatchSize { expected: usize, actual: usize },

    #[error("block size {0} is not a power of two")]
    BlockSizeNotPowerOfTwo(usize),
}

/// Reduces a fixed-size ordered batch to a single root digest.
///
/// Each leaf is hashed on its own, then the working array is halved in place
/// each round: `next[i] = hash(prev[2i] ‖ prev[2i + 1])`, left operand first,
/// until one digest remains.
#[derive(Clone, Copy, Debug)]
pub struct MerkleAccumulator {
    hasher: DoubleHasher,
    block_size: usize,
}

impl MerkleAccumulator {
    /// Build an accumulator for batches of exactly `block_size` leaves.
    ///
    /// `block_size` must be a non-zero power of two.
    pub fn new(hasher: DoubleHasher, block_size: usize) -> Result<Self, MerkleError> {
        if !block_size.is_power_of_two() {
            return Err(MerkleError::BlockSizeNotPowerOfTwo(block_size));
        }
        Ok(Self { hasher, block_size })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Compute the Merkle root of `batch`.
    pub fn compute_root<T: AsRef<[u8]>>(&self, batch: &[T]) -> Result<Digest, MerkleError> {
        if batch.len() != self.block_size {
            return Err(MerkleError::InvalidBatchSize {
                expected: self.block_size,
                actual: batch.len(),
            });
        }

        let mut work: Vec<Digest> = batch
            .iter()
            .map(|leaf| self.hasher.hash(leaf.as_ref()))
            .collect();

        let mut len = work.len();
        while len > 1 {
            for i in 0..len / 2 {
                work[i] = self.hash_pair(&work[2 * i], &work[2 * i + 1]);
            }
            len /= 2;
        }

        Ok(work[0])
    }

    fn hash_pair(&self, left: &Digest, right: &Digest) -> Digest {
        self.hasher
            .hash_concat(&[left.as_bytes().as_slice(), right.as_bytes().as_slice()])
    }
}
