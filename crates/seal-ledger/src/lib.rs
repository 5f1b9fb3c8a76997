//! Append-only block ledger for Seal Chain.
//!
//! This crate provides:
//! - The `LedgerWriter` trait boundary used by the block assembler
//! - `FileLedger`, the durable append-only log file
//! - `BlockReader`, a sequential parser for the on-disk record layout
//! - `InMemoryLedger` for tests and embedding

pub mod codec;
pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use codec::{encode_block, BlockReader};
pub use error::{LedgerError, WriteError};
pub use file::{read_blocks, FileLedger, SyncMode};
pub use memory::InMemoryLedger;
pub use traits::LedgerWriter;
