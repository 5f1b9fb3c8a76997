use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use seal_ledger::LedgerWriter;
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::assembler::{AssemblerReport, BlockAssembler, Clock, SystemClock};
use crate::config::NodeConfig;
use crate::error::{NodeError, NodeResult};
use crate::intake::{self, IntakeHandle, StreamWaker};
use crate::tip::{ChainTip, TipView};

/// Entry point that wires intake, tip recovery, and the assembler worker.
pub struct Node;

impl Node {
    /// Validate `config`, recover the chain tip, and start the block
    /// assembler on a dedicated thread.
    pub fn start<W>(config: NodeConfig, ledger: W) -> NodeResult<NodeHandle>
    where
        W: LedgerWriter + 'static,
    {
        Self::start_with_clock(config, ledger, SystemClock)
    }

    pub fn start_with_clock<W, C>(config: NodeConfig, ledger: W, clock: C) -> NodeResult<NodeHandle>
    where
        W: LedgerWriter + 'static,
        C: Clock + 'static,
    {
        config.validate()?;
        let tip = ChainTip::recover(&config, &ledger)?;
        let view = Arc::new(TipView::new(tip));
        let cancel = Arc::new(AtomicBool::new(false));
        let assembler = BlockAssembler::new(&config, ledger, clock, tip, view.clone(), cancel.clone())?;

        let (intake, mut stream) = intake::channel(config.buffer_size);
        let (outcome_tx, outcome_rx) = oneshot::channel();

        thread::Builder::new()
            .name("block-assembler".into())
            .spawn(move || {
                let outcome = assembler.run(&mut stream);
                drop(stream);
                match &outcome {
                    Ok(report) => info!(
                        sealed = report.blocks_sealed,
                        unsealed = report.unsealed_entries,
                        "block assembler stopped"
                    ),
                    Err(e) => error!(error = %e, "block assembler failed"),
                }
                let _ = outcome_tx.send(outcome);
            })
            .map_err(NodeError::Spawn)?;

        info!(
            block_size = config.block_size,
            buffer_size = config.buffer_size,
            difficulty = config.difficulty,
            next_block = tip.block_number,
            "node started"
        );

        let cancel = Canceller {
            flag: cancel,
            waker: intake.waker(),
        };
        Ok(NodeHandle {
            intake,
            view,
            cancel,
            outcome: outcome_rx,
        })
    }
}

/// Stops the block assembler from any thread.
#[derive(Clone, Debug)]
pub struct Canceller {
    flag: Arc<AtomicBool>,
    waker: StreamWaker,
}

impl Canceller {
    /// Raise the cancel flag and wake the worker if it is waiting for
    /// entries. A nonce search in progress stops before its next attempt;
    /// a block already being appended is finished first.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
        self.waker.wake();
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Handle to a running node.
pub struct NodeHandle {
    intake: IntakeHandle,
    view: Arc<TipView>,
    cancel: Canceller,
    outcome: oneshot::Receiver<NodeResult<AssemblerReport>>,
}

impl NodeHandle {
    /// A producer handle for submitting entries.
    pub fn intake(&self) -> IntakeHandle {
        self.intake.clone()
    }

    /// Shared read-only view of the chain tip.
    pub fn tip(&self) -> Arc<TipView> {
        self.view.clone()
    }

    pub fn canceller(&self) -> Canceller {
        self.cancel.clone()
    }

    /// Wait for the worker to stop.
    ///
    /// Drops this handle's own producer first, so the worker exits cleanly
    /// once every other [`IntakeHandle`] is gone.
    pub async fn finished(self) -> NodeResult<AssemblerReport> {
        let Self { intake, outcome, .. } = self;
        drop(intake);
        outcome.await.map_err(|_| NodeError::WorkerLost)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seal_ledger::{read_blocks, FileLedger, InMemoryLedger};
    use seal_types::Entry;

    fn config(block_size: usize, buffer_size: usize) -> NodeConfig {
        NodeConfig {
            block_size,
            buffer_size,
            difficulty: 1,
            resume: false,
            ..Default::default()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_producers_fill_blocks_in_enqueue_order() {
        let ledger = InMemoryLedger::new();
        let node = Node::start(config(2, 4), ledger.clone()).unwrap();
        let enqueued = Arc::new(tokio::sync::Mutex::new(Vec::new()));

        let mut tasks = Vec::new();
        for e in ["a", "b", "c", "d", "e", "f", "g", "h"] {
            let intake = node.intake();
            let enqueued = enqueued.clone();
            tasks.push(tokio::spawn(async move {
                let mut order = enqueued.lock().await;
                intake.submit(Entry::from(e)).await.unwrap();
                order.push(Entry::from(e));
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }

        let report = node.finished().await.unwrap();
        assert_eq!(report.blocks_sealed, 4);

        let blocks = ledger.blocks();
        assert!(blocks.iter().all(|b| b.entries().len() == 2));
        let sealed: Vec<Entry> = blocks.iter().flat_map(|b| b.entries().to_vec()).collect();
        assert_eq!(sealed, *enqueued.lock().await);
    }

    #[tokio::test]
    async fn per_producer_order_is_preserved_across_blocks() {
        let ledger = InMemoryLedger::new();
        let node = Node::start(config(2, 4), ledger.clone()).unwrap();

        let mut tasks = Vec::new();
        for p in 0..3 {
            let intake = node.intake();
            tasks.push(tokio::spawn(async move {
                for i in 0..4 {
                    intake.submit(Entry::from(format!("p{p}-{i}"))).await.unwrap();
                }
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }

        let report = node.finished().await.unwrap();
        assert_eq!(report.blocks_sealed, 6);

        let sealed: Vec<String> = ledger
            .blocks()
            .iter()
            .flat_map(|b| b.entries().iter().map(|e| e.to_string_lossy()))
            .collect();
        assert_eq!(sealed.len(), 12);
        for p in 0..3 {
            let mine: Vec<&String> = sealed.iter().filter(|s| s.starts_with(&format!("p{p}-"))).collect();
            let expected: Vec<String> = (0..4).map(|i| format!("p{p}-{i}")).collect();
            assert_eq!(mine, expected.iter().collect::<Vec<_>>());
        }
    }

    #[tokio::test]
    async fn sequential_submissions_keep_global_order() {
        let ledger = InMemoryLedger::new();
        let node = Node::start(config(2, 4), ledger.clone()).unwrap();
        let intake = node.intake();
        for e in ["a", "b", "c", "d"] {
            intake.submit(Entry::from(e)).await.unwrap();
        }
        drop(intake);
        node.finished().await.unwrap();

        let blocks = ledger.blocks();
        assert_eq!(blocks[0].entries(), &[Entry::from("a"), Entry::from("b")]);
        assert_eq!(blocks[1].entries(), &[Entry::from("c"), Entry::from("d")]);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_start() {
        let result = Node::start(config(3, 4), InMemoryLedger::new());
        assert!(matches!(result, Err(NodeError::Config(_))));
    }

    #[tokio::test]
    async fn restart_continues_chain_in_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = NodeConfig {
            resume: true,
            ledger_path: dir.path().join("chain.dat"),
            ..config(2, 4)
        };

        for round in 0..2 {
            let ledger = FileLedger::open(&cfg.ledger_path, cfg.sync_mode).unwrap();
            let node = Node::start(cfg.clone(), ledger).unwrap();
            assert_eq!(node.tip().block_number(), round);
            let intake = node.intake();
            intake.submit(Entry::from(format!("r{round}a"))).await.unwrap();
            intake.submit(Entry::from(format!("r{round}b"))).await.unwrap();
            drop(intake);
            node.finished().await.unwrap();
        }

        let blocks = read_blocks(&cfg.ledger_path, 2).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].prev_hash(), blocks[0].block_hash());
        assert!(cfg
            .verifier()
            .unwrap()
            .verify_chain(&blocks, seal_crypto::VerifyDepth::Full)
            .is_ok());
    }

    #[tokio::test]
    async fn cancelled_worker_reports_cancellation() {
        let cfg = NodeConfig {
            difficulty: 64,
            ..config(2, 4)
        };
        let node = Node::start(cfg, InMemoryLedger::new()).unwrap();
        let intake = node.intake();
        intake.submit(Entry::from("a")).await.unwrap();
        intake.submit(Entry::from("b")).await.unwrap();
        node.canceller().cancel();
        assert!(matches!(node.finished().await, Err(NodeError::Cancelled)));
        assert!(intake.is_closed());
    }

    #[tokio::test]
    async fn injected_ledger_decides_where_the_chain_resumes() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = NodeConfig {
            resume: true,
            ledger_path: dir.path().join("chain.dat"),
            ..config(2, 4)
        };
        let file = FileLedger::open(&cfg.ledger_path, cfg.sync_mode).unwrap();
        let node = Node::start(cfg.clone(), file).unwrap();
        let intake = node.intake();
        intake.submit(Entry::from("old-a")).await.unwrap();
        intake.submit(Entry::from("old-b")).await.unwrap();
        drop(intake);
        node.finished().await.unwrap();

        let fresh = InMemoryLedger::new();
        let node = Node::start(cfg.clone(), fresh.clone()).unwrap();
        assert_eq!(node.tip().block_number(), 0);
        let intake = node.intake();
        intake.submit(Entry::from("x")).await.unwrap();
        intake.submit(Entry::from("y")).await.unwrap();
        drop(intake);
        node.finished().await.unwrap();

        let blocks = fresh.blocks();
        assert_eq!(blocks[0].index(), 0);
        assert_eq!(blocks[0].prev_hash(), cfg.hasher().genesis_seed());
        assert!(cfg
            .verifier()
            .unwrap()
            .verify_chain(&blocks, seal_crypto::VerifyDepth::Full)
            .is_ok());
    }

    #[tokio::test]
    async fn restart_with_higher_difficulty_resumes() {
        let dir = tempfile::tempdir().unwrap();
        let easy = NodeConfig {
            resume: true,
            ledger_path: dir.path().join("chain.dat"),
            ..config(2, 4)
        };
        let file = FileLedger::open(&easy.ledger_path, easy.sync_mode).unwrap();
        let node = Node::start(easy.clone(), file).unwrap();
        let intake = node.intake();
        for e in ["a", "b", "c", "d"] {
            intake.submit(Entry::from(e)).await.unwrap();
        }
        drop(intake);
        node.finished().await.unwrap();

        let hard = NodeConfig {
            difficulty: 3,
            ..easy.clone()
        };
        let file = FileLedger::open(&hard.ledger_path, hard.sync_mode).unwrap();
        let node = Node::start(hard, file).unwrap();
        assert_eq!(node.tip().block_number(), 2);
        node.canceller().cancel();
        assert!(matches!(node.finished().await, Err(NodeError::Cancelled)));
    }

    #[tokio::test]
    async fn cancel_wakes_idle_worker_while_producers_remain() {
        let node = Node::start(config(2, 4), InMemoryLedger::new()).unwrap();
        let intake = node.intake();
        intake.submit(Entry::from("lonely")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        node.canceller().cancel();
        let outcome = tokio::time::timeout(std::time::Duration::from_secs(5), node.finished())
            .await
            .expect("worker ignored cancellation while waiting for entries");
        assert!(matches!(outcome, Err(NodeError::Cancelled)));
        assert!(intake.is_closed());
    }
}
