use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Width of every digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// Output of the double-hash primitive: block hashes, Merkle roots, the
/// genesis seed.
///
/// The ledger stores digests as 64 lowercase hex characters per line, and
/// seed material embeds them as raw bytes. Proof of work only ever looks at
/// how many leading zero nibbles or bytes a digest has.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    pub const fn from_hash(hash: [u8; DIGEST_LEN]) -> Self {
        Self(hash)
    }

    pub const fn zero() -> Self {
        Self([0u8; DIGEST_LEN])
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Count of leading `0` characters in the hex encoding.
    pub fn leading_zero_nibbles(&self) -> u32 {
        let mut count = 0;
        for byte in self.0 {
            if byte != 0 {
                return count + u32::from(byte.leading_zeros() >= 4);
            }
            count += 2;
        }
        count
    }

    /// Count of leading `0x00` bytes.
    pub fn leading_zero_bytes(&self) -> u32 {
        self.0.iter().take_while(|b| **b == 0).count() as u32
    }

    /// The form written to a ledger line.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First four bytes in hex, for logs and `seal log` output.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse a ledger line. Exactly 64 hex characters; either case.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if s.len() != DIGEST_LEN * 2 {
            return Err(TypeError::InvalidLength {
                expected: DIGEST_LEN * 2,
                actual: s.len(),
            });
        }
        let mut out = [0u8; DIGEST_LEN];
        hex::decode_to_slice(s, &mut out).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Ok(Self(out))
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({}..)", self.short_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
