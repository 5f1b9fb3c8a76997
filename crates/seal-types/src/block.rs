use crate::digest::Digest;
use crate::entry::Entry;

/// An immutable sealed block.
///
/// Created exactly once by the block assembler after a successful
/// proof-of-work search. Fields are private; there is no way to mutate a
/// block after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    index: u64,
    block_hash: Digest,
    prev_hash: Digest,
    merkle_root: Digest,
    timestamp: i64,
    entries: Vec<Entry>,
}

impl Block {
    pub fn new(
        index: u64,
        block_hash: Digest,
        prev_hash: Digest,
        merkle_root: Digest,
        timestamp: i64,
        entries: Vec<Entry>,
    ) -> Self {
        Self {
            index,
            block_hash,
            prev_hash,
            merkle_root,
            timestamp,
            entries,
        }
    }

    /// Position of the block in the chain, starting at 0.
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn block_hash(&self) -> Digest {
        self.block_hash
    }

    pub fn prev_hash(&self) -> Digest {
        self.prev_hash
    }

    pub fn merkle_root(&self) -> Digest {
        self.merkle_root
    }

    /// Seconds since the Unix epoch at which the batch was sealed.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
}
