use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use seal_crypto::{seed_material, MerkleAccumulator, ProofOfWork};
use seal_ledger::LedgerWriter;
use seal_types::{Block, Entry};
use tracing::{info, warn};

use crate::config::NodeConfig;
use crate::error::{NodeError, NodeResult};
use crate::intake::{Batch, EntryStream};
use crate::tip::{ChainTip, TipView};

/// Source of block timestamps, in seconds since the Unix epoch.
pub trait Clock: Send {
    fn now_secs(&self) -> i64;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Summary of a worker run that ended without a fatal error.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssemblerReport {
    /// Blocks sealed and persisted during this run.
    pub blocks_sealed: u64,
    /// Entries that arrived after the last full batch and were never sealed.
    pub unsealed_entries: usize,
}

/// Owner of the block-construction cycle and of the chain tip.
///
/// One cycle seals one block: collect a full batch, compute its Merkle root,
/// search for a nonce over `prev_hash ‖ root ‖ timestamp`, append the block
/// to the ledger, and only then advance the tip.
pub struct BlockAssembler<W, C = SystemClock> {
    merkle: MerkleAccumulator,
    pow: ProofOfWork,
    ledger: W,
    clock: C,
    tip: ChainTip,
    view: Arc<TipView>,
    cancel: Arc<AtomicBool>,
}

impl<W: LedgerWriter, C: Clock> BlockAssembler<W, C> {
    pub fn new(
        config: &NodeConfig,
        ledger: W,
        clock: C,
        tip: ChainTip,
        view: Arc<TipView>,
        cancel: Arc<AtomicBool>,
    ) -> NodeResult<Self> {
        Ok(Self {
            merkle: config.merkle()?,
            pow: config.proof_of_work()?,
            ledger,
            clock,
            tip,
            view,
            cancel,
        })
    }

    pub fn tip(&self) -> ChainTip {
        self.tip
    }

    /// Run cycles until every producer is gone, cancellation, or a fatal error.
    ///
    /// The cancel flag is honoured between cycles, while waiting for entries
    /// (once the stream is woken), and inside the nonce search. A block that
    /// has been sealed is always committed before the flag is looked at again.
    pub fn run(mut self, entries: &mut EntryStream) -> NodeResult<AssemblerReport> {
        let mut report = AssemblerReport::default();
        loop {
            if self.cancel.load(Ordering::Relaxed) {
                return Err(NodeError::Cancelled);
            }

            info!(block = self.tip.block_number, "starting new block");
            let batch = match entries.take_batch(self.merkle.block_size(), &self.cancel) {
                Batch::Full(batch) => batch,
                Batch::Cancelled(_) => return Err(NodeError::Cancelled),
                Batch::Closed(partial) => {
                    if !partial.is_empty() {
                        warn!(
                            count = partial.len(),
                            "intake closed with a partial batch; entries not sealed"
                        );
                    }
                    report.unsealed_entries = partial.len();
                    return Ok(report);
                }
            };

            let block = self.seal(batch)?;
            self.commit(&block)?;
            report.blocks_sealed += 1;
        }
    }

    /// Build the next block from a batch without persisting it.
    pub fn seal(&self, batch: Vec<Entry>) -> NodeResult<Block> {
        let timestamp = self.clock.now_secs();
        let root = self.merkle.compute_root(&batch)?;
        let seed = seed_material(&self.tip.prev_hash, &root, timestamp);

        let solution = self
            .pow
            .mine_until(&seed, &self.cancel)
            .ok_or(NodeError::Cancelled)?;
        info!(
            block = self.tip.block_number,
            attempts = solution.attempts,
            hash = %solution.digest,
            "found block hash"
        );

        Ok(Block::new(
            self.tip.block_number,
            solution.digest,
            self.tip.prev_hash,
            root,
            timestamp,
            batch,
        ))
    }

    /// Persist `block`, then advance the tip to it.
    pub fn commit(&mut self, block: &Block) -> NodeResult<()> {
        self.ledger
            .append(block)
            .map_err(|source| NodeError::Persist {
                index: block.index(),
                source,
            })?;
        info!(block = block.index(), "wrote block to ledger");

        self.tip = ChainTip::after(block);
        self.view.publish(self.tip);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seal_crypto::DoubleHasher;
    use seal_ledger::{InMemoryLedger, LedgerError, WriteError};
    use seal_types::Digest;

    use crate::intake::channel;

    struct FixedClock(i64);

    impl Clock for FixedClock {
        fn now_secs(&self) -> i64 {
            self.0
        }
    }

    struct BrokenLedger;

    impl LedgerWriter for BrokenLedger {
        fn append(&mut self, _block: &Block) -> Result<(), WriteError> {
            Err(WriteError::Write {
                path: "broken.dat".into(),
                source: std::io::Error::other("disk full"),
            })
        }

        fn read_all(&self, _block_size: usize) -> Result<Vec<Block>, LedgerError> {
            Ok(Vec::new())
        }
    }

    fn config(block_size: usize) -> NodeConfig {
        NodeConfig {
            block_size,
            buffer_size: 4,
            difficulty: 1,
            ..Default::default()
        }
    }

    fn assembler<W: LedgerWriter>(
        config: &NodeConfig,
        ledger: W,
    ) -> (BlockAssembler<W, FixedClock>, Arc<TipView>, Arc<AtomicBool>) {
        let tip = ChainTip::genesis(config.hasher().genesis_seed());
        let view = Arc::new(TipView::new(tip));
        let cancel = Arc::new(AtomicBool::new(false));
        let a = BlockAssembler::new(
            config,
            ledger,
            FixedClock(1_700_000_000),
            tip,
            view.clone(),
            cancel.clone(),
        )
        .unwrap();
        (a, view, cancel)
    }

    #[test]
    fn two_entries_seal_one_block() {
        let c = config(2);
        let ledger = InMemoryLedger::new();
        let (a, view, _) = assembler(&c, ledger.clone());
        let (handle, mut stream) = channel(c.buffer_size);
        handle.blocking_submit(Entry::from("x")).unwrap();
        handle.blocking_submit(Entry::from("y")).unwrap();
        drop(handle);

        let report = a.run(&mut stream).unwrap();
        assert_eq!(report.blocks_sealed, 1);

        let blocks = ledger.blocks();
        assert_eq!(blocks.len(), 1);
        let b = &blocks[0];
        let h = DoubleHasher::default();
        let (hx, hy) = (h.hash(b"x"), h.hash(b"y"));
        assert_eq!(
            b.merkle_root(),
            h.hash_concat(&[hx.as_bytes().as_slice(), hy.as_bytes().as_slice()])
        );
        assert_eq!(b.entries(), &[Entry::from("x"), Entry::from("y")]);
        assert_eq!(b.prev_hash(), h.genesis_seed());
        assert_eq!(b.timestamp(), 1_700_000_000);
        assert!(b.block_hash().to_hex().starts_with('0'));
        assert_eq!(view.block_number(), 1);
        assert_eq!(view.tip_hash(), b.block_hash());
    }

    #[test]
    fn blocks_link_to_predecessors() {
        let c = config(2);
        let ledger = InMemoryLedger::new();
        let (a, _, _) = assembler(&c, ledger.clone());
        let (handle, mut stream) = channel(c.buffer_size);
        let producer = std::thread::spawn(move || {
            for i in 0..8 {
                handle.blocking_submit(Entry::from(format!("e{i}"))).unwrap();
            }
        });

        let report = a.run(&mut stream).unwrap();
        producer.join().unwrap();
        assert_eq!(report.blocks_sealed, 4);

        let blocks = ledger.blocks();
        assert_eq!(blocks[0].prev_hash(), c.hasher().genesis_seed());
        for i in 1..blocks.len() {
            assert_eq!(blocks[i].prev_hash(), blocks[i - 1].block_hash());
            assert_eq!(blocks[i].index(), i as u64);
        }
        assert!(c
            .verifier()
            .unwrap()
            .verify_chain(&blocks, seal_crypto::VerifyDepth::Full)
            .is_ok());
    }

    #[test]
    fn partial_batch_is_reported_not_sealed() {
        let c = config(4);
        let ledger = InMemoryLedger::new();
        let (a, view, _) = assembler(&c, ledger.clone());
        let (handle, mut stream) = channel(c.buffer_size);
        for e in ["a", "b", "c"] {
            handle.blocking_submit(Entry::from(e)).unwrap();
        }
        drop(handle);

        let report = a.run(&mut stream).unwrap();
        assert_eq!(report, AssemblerReport { blocks_sealed: 0, unsealed_entries: 3 });
        assert!(ledger.is_empty());
        assert_eq!(view.block_number(), 0);
    }

    #[test]
    fn write_failure_is_fatal_and_tip_does_not_advance() {
        let c = config(2);
        let (a, view, _) = assembler(&c, BrokenLedger);
        let (handle, mut stream) = channel(c.buffer_size);
        handle.blocking_submit(Entry::from("a")).unwrap();
        handle.blocking_submit(Entry::from("b")).unwrap();

        let err = a.run(&mut stream).unwrap_err();
        assert!(matches!(err, NodeError::Persist { index: 0, .. }));
        assert_eq!(view.block_number(), 0);
        assert_eq!(view.tip_hash(), c.hasher().genesis_seed());
    }

    #[test]
    fn wrong_batch_size_is_rejected_by_seal() {
        let c = config(2);
        let (a, _, _) = assembler(&c, InMemoryLedger::new());
        let err = a.seal(vec![Entry::from("lonely")]).unwrap_err();
        assert!(matches!(err, NodeError::InvalidBatch(_)));
    }

    #[test]
    fn cancel_interrupts_search() {
        let c = NodeConfig {
            difficulty: 64,
            ..config(2)
        };
        let ledger = InMemoryLedger::new();
        let (a, view, cancel) = assembler(&c, ledger.clone());
        let (handle, mut stream) = channel(c.buffer_size);
        handle.blocking_submit(Entry::from("a")).unwrap();
        handle.blocking_submit(Entry::from("b")).unwrap();

        let worker = std::thread::spawn(move || a.run(&mut stream));
        std::thread::sleep(std::time::Duration::from_millis(50));
        cancel.store(true, Ordering::Relaxed);

        let result = worker.join().unwrap();
        assert!(matches!(result, Err(NodeError::Cancelled)));
        assert!(ledger.is_empty());
        assert_eq!(view.block_number(), 0);
        drop(handle);
    }

    #[test]
    fn commit_advances_tip_after_persist() {
        let c = config(2);
        let ledger = InMemoryLedger::new();
        let (mut a, view, _) = assembler(&c, ledger.clone());
        let block = a.seal(vec![Entry::from("p"), Entry::from("q")]).unwrap();
        assert_eq!(a.tip().block_number, 0);
        a.commit(&block).unwrap();
        assert_eq!(a.tip().block_number, 1);
        assert_eq!(a.tip().prev_hash, block.block_hash());
        assert_eq!(view.block_number(), 1);
        assert_ne!(view.tip_hash(), Digest::zero());
        assert_eq!(ledger.blocks(), vec![block]);
    }
}
