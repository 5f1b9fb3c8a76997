use seal_types::{Digest, DIGEST_LEN};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

/// Constant hashed to produce the genesis `prev_hash`.
pub const GENESIS_SEED_MATERIAL: &[u8] = b"seed";

/// Compression function applied twice by [`DoubleHasher`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashAlgorithm {
    /// SHA-256 applied twice (Bitcoin-style).
    #[default]
    Sha256d,
    /// BLAKE3 applied twice.
    Blake3d,
}

/// The single hash primitive used for entries, Merkle pairs, and
/// proof-of-work candidates.
///
/// `hash(x) = H(H(x))`. Multiple inputs are joined by plain byte
/// concatenation with no length prefix or separator, in argument order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DoubleHasher {
    algorithm: HashAlgorithm,
}

impl DoubleHasher {
    pub const SHA256D: Self = Self {
        algorithm: HashAlgorithm::Sha256d,
    };
    pub const BLAKE3D: Self = Self {
        algorithm: HashAlgorithm::Blake3d,
    };

    pub const fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Double-hash a single byte string.
    pub fn hash(&self, data: &[u8]) -> Digest {
        self.hash_concat(&[data])
    }

    /// Double-hash the concatenation of `parts` without materializing it.
    pub fn hash_concat(&self, parts: &[&[u8]]) -> Digest {
        let once = match self.algorithm {
            HashAlgorithm::Sha256d => {
                let mut hasher = <Sha256 as sha2::Digest>::new();
                for part in parts {
                    sha2::Digest::update(&mut hasher, *part);
                }
                to_array(&sha2::Digest::finalize(hasher))
            }
            HashAlgorithm::Blake3d => {
                let mut hasher = blake3::Hasher::new();
                for part in parts {
                    hasher.update(*part);
                }
                *hasher.finalize().as_bytes()
            }
        };
        Digest::from_hash(self.single(&once))
    }

    /// The fixed `prev_hash` of block 0.
    pub fn genesis_seed(&self) -> Digest {
        self.hash(GENESIS_SEED_MATERIAL)
    }

    fn single(&self, data: &[u8]) -> [u8; DIGEST_LEN] {
        match self.algorithm {
            HashAlgorithm::Sha256d => to_array(&<Sha256 as sha2::Digest>::digest(data)),
            HashAlgorithm::Blake3d => *blake3::hash(data).as_bytes(),
        }
    }
}

fn to_array(bytes: &[u8]) -> [u8; DIGEST_LEN] {
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(bytes);
    out
}
