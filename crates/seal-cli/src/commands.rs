use std::future::Future;
use std::time::Duration;

use anyhow::{bail, Context};
use colored::Colorize;
use seal_crypto::VerifyDepth;
use seal_ledger::{read_blocks, FileLedger};
use seal_node::{AssemblerReport, Canceller, Node, NodeError, NodeResult};
use seal_server::{AppState, SealServer};
use seal_types::Block;
use serde_json::json;
use tracing::info;

use crate::cli::*;
use crate::config::AppConfig;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    match cli.command {
        Command::Serve(args) => cmd_serve(config, args).await,
        Command::Verify(args) => cmd_verify(config, args),
        Command::Log(args) => cmd_log(config, args),
        Command::Hash(args) => cmd_hash(config, args),
        Command::Config => cmd_config(config),
    }
}

async fn cmd_serve(mut config: AppConfig, args: ServeArgs) -> anyhow::Result<()> {
    config.apply_overrides(&args);
    config.node.validate()?;

    let ledger = FileLedger::open(&config.node.ledger_path, config.node.sync_mode)
        .map_err(NodeError::LedgerOpen)?;
    let node = Node::start(config.node.clone(), ledger)?;
    let canceller = node.canceller();
    let state = AppState {
        intake: node.intake(),
        tip: node.tip(),
    };

    println!(
        "{} Seal node on {} (ledger: {}, block size {}, difficulty {})",
        "✓".green().bold(),
        config.server.bind_addr.to_string().bold(),
        config.node.ledger_path.display(),
        config.node.block_size,
        config.node.difficulty,
    );

    let server = SealServer::new(config.server.clone());
    let finished = node.finished();
    tokio::pin!(finished);
    tokio::select! {
        served = server.serve(state) => {
            served?;
            bail!("server stopped unexpectedly")
        }
        outcome = &mut finished => {
            let report = outcome.context("block assembler failed")?;
            bail!(
                "block assembler stopped after sealing {} blocks",
                report.blocks_sealed
            )
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("cannot listen for shutdown signal")?;
        }
    }

    info!("shutdown requested");
    stop_node(&canceller, finished, SHUTDOWN_GRACE).await
}

/// Cancel the block assembler and wait up to `grace` for it to stop, so an
/// append in progress is not cut short by process exit.
async fn stop_node<F>(canceller: &Canceller, finished: F, grace: Duration) -> anyhow::Result<()>
where
    F: Future<Output = NodeResult<AssemblerReport>>,
{
    canceller.cancel();
    match tokio::time::timeout(grace, finished).await {
        Ok(Ok(report)) => {
            info!(sealed = report.blocks_sealed, "block assembler stopped");
            Ok(())
        }
        Ok(Err(NodeError::Cancelled)) => {
            info!("block assembler cancelled");
            Ok(())
        }
        Ok(Err(e)) => Err(e).context("block assembler failed during shutdown"),
        Err(_) => bail!("block assembler did not stop within {grace:?}"),
    }
}

fn cmd_verify(config: AppConfig, args: VerifyArgs) -> anyhow::Result<()> {
    let path = args.ledger.unwrap_or(config.node.ledger_path.clone());
    let blocks = read_blocks(&path, config.node.block_size)
        .with_context(|| format!("cannot read ledger {}", path.display()))?;
    let depth = if args.full {
        VerifyDepth::Full
    } else {
        VerifyDepth::Links
    };

    match config.node.verifier()?.verify_chain(&blocks, depth) {
        Ok(()) => {
            println!("{} Chain integrity verified", "✓".green().bold());
            println!("  Blocks: {}", blocks.len().to_string().bold());
            println!("  Hash chain: {}", "valid".green());
            println!("  Merkle roots: {}", "valid".green());
            let pow = if args.full { "re-mined" } else { "target met" };
            println!("  Proof of work: {}", pow.green());
            if let Some(last) = blocks.last() {
                println!("  Tip: {}", last.block_hash().to_string().cyan());
            }
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "✗".red().bold(), e);
            bail!("ledger {} failed verification", path.display())
        }
    }
}

fn cmd_log(config: AppConfig, args: LogArgs) -> anyhow::Result<()> {
    let path = args.ledger.unwrap_or(config.node.ledger_path.clone());
    let blocks = read_blocks(&path, config.node.block_size)
        .with_context(|| format!("cannot read ledger {}", path.display()))?;
    let shown = blocks.iter().rev().take(args.limit);

    match args.format {
        OutputFormat::Json => {
            let out: Vec<serde_json::Value> = shown.map(block_json).collect();
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            if blocks.is_empty() {
                println!("No blocks sealed.");
            }
            for block in shown {
                println!(
                    "{}  {}  ({})",
                    format!("#{}", block.index()).yellow().bold(),
                    block.block_hash().to_string().dimmed(),
                    block.timestamp()
                );
                println!("  prev:   {}", block.prev_hash().short_hex());
                println!("  merkle: {}", block.merkle_root().short_hex());
                for entry in block.entries() {
                    println!("  - {}", entry.to_string_lossy());
                }
            }
        }
    }
    Ok(())
}

fn block_json(block: &Block) -> serde_json::Value {
    json!({
        "index": block.index(),
        "block_hash": block.block_hash().to_hex(),
        "prev_hash": block.prev_hash().to_hex(),
        "merkle_root": block.merkle_root().to_hex(),
        "timestamp": block.timestamp(),
        "entries": block.entries().iter().map(|e| e.to_string_lossy()).collect::<Vec<_>>(),
    })
}

fn cmd_hash(config: AppConfig, args: HashArgs) -> anyhow::Result<()> {
    println!("{}", config.node.hasher().hash(args.data.as_bytes()));
    Ok(())
}

fn cmd_config(config: AppConfig) -> anyhow::Result<()> {
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
