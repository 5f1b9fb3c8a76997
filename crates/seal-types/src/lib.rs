//! Foundation types for Seal Chain.
//!
//! Every other Seal crate depends on `seal-types`.
//!
//! # Key Types
//!
//! - [`Digest`]: 32-byte output of the double-hash primitive
//! - [`Entry`]: Opaque byte sequence submitted for inclusion in the chain
//! - [`Block`]: Immutable sealed record committing to a batch of entries

pub mod block;
pub mod digest;
pub mod entry;
pub mod error;

pub use block::Block;
pub use digest::{Digest, DIGEST_LEN};
pub use entry::Entry;
pub use error::TypeError;
