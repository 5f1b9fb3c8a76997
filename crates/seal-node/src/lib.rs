//! Block assembly for Seal Chain.
//!
//! Producers push entries into a bounded FIFO intake; a single worker thread
//! drains exactly `block_size` entries per cycle, computes the Merkle root,
//! searches for a proof-of-work nonce, appends the sealed block to the
//! ledger, and only then advances the chain tip.
//!
//! The worker is the only writer of chain-tip state. Producers see it
//! through [`TipView`], whose block number is eventually consistent.

pub mod assembler;
pub mod config;
pub mod error;
pub mod intake;
pub mod node;
pub mod tip;

pub use assembler::{AssemblerReport, BlockAssembler, Clock, SystemClock};
pub use config::NodeConfig;
pub use error::{IntakeError, NodeError, NodeResult};
pub use intake::{Batch, EntryStream, IntakeHandle};
pub use node::{Canceller, Node, NodeHandle};
pub use tip::{ChainTip, TipView};
